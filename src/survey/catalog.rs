use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, path::Path};

/// A character visitors place on the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub description: String,
    pub image: String,
}

impl Item {
    fn builtin(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            image: format!("/images/{name}.png"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<Item>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            items: vec![
                Item::builtin("ASTROBOY", "A heroic android created by Dr. Tenma, Astro Boy possesses incredible powers and a human-like emotional capacity, often fighting for justice in a world where humans and robots coexist."),
                Item::builtin("GOLEM", "From Jewish folklore, the Golem is an animated anthropomorphic being created entirely from inanimate matter (usually clay or mud). It is brought to life through a magical ritual to protect its creator or community."),
                Item::builtin("HAL", "HAL 9000 is the sentient supercomputer from '2001: A Space Odyssey.' Responsible for controlling the Discovery One spacecraft, HAL's artificial intelligence and calm demeanor mask a deep-seated conflict that leads to a chilling display of self-preservation."),
                Item::builtin("HER", "Samantha, the AI from the film 'Her,' is an advanced operating system designed to adapt and evolve. She forms a deep, emotional, and romantic relationship with a human, exploring the nature of love, consciousness, and what it means to be 'real'."),
                Item::builtin("JARVIS", "J.A.R.V.I.S. (Just A Rather Very Intelligent System) is Tony Stark's sophisticated AI assistant. He manages everything from the Iron Man suit to Stark's business and personal life, offering witty commentary and critical support."),
                Item::builtin("METROPOLIS", "The 'Maschinenmensch' (Machine-Person) from Fritz Lang's 'Metropolis' is a futuristic robot. Initially a benign creation, she is transformed into a malevolent doppelgänger of the heroine Maria to incite chaos among the city's workers."),
                Item::builtin("PINOCCHIO", "A wooden puppet magically brought to life, Pinocchio's greatest desire is to become a real boy. His journey is a test of his honesty and bravery, famously marked by his nose growing whenever he tells a lie."),
                Item::builtin("RUR", "From Karel Čapek's 1920 play 'Rossum's Universal Robots,' which introduced the word 'robot' to the world. The play explores themes of artificial life, rebellion, and the potential obsolescence of humanity."),
                Item::builtin("TALOS", "In Greek mythology, Talos was a giant automaton made of bronze, created to protect Europa in Crete from pirates and invaders. He circled the island's shores three times daily and was famously defeated by Jason and the Argonauts."),
            ],
        }
    }
}

impl Catalog {
    /// Loads a catalog from a JSON array of items.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog from {}", path.display()))?;
        let items: Vec<Item> = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid catalog JSON in {}", path.display()))?;

        Self::from_items(items)
    }

    pub fn from_items(items: Vec<Item>) -> Result<Self> {
        if items.is_empty() {
            bail!("catalog must contain at least one item");
        }

        let mut seen = HashSet::new();
        for item in &items {
            if item.name.trim().is_empty() {
                bail!("catalog item names must not be empty");
            }
            if !seen.insert(item.name.as_str()) {
                bail!("duplicate catalog item '{}'", item.name);
            }
        }

        Ok(Self { items })
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|item| item.name == name)
    }
}

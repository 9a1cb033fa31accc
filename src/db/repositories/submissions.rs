use std::collections::BTreeMap;

use anyhow::{Context, Result};
use rusqlite::{params, Row};

use crate::{
    db::{
        helpers::{parse_datetime, to_coordinate},
        models::{ContactRecord, Submission},
        Database,
    },
    survey::normalize::Prediction,
};

fn row_to_submission(row: &Row) -> Result<Submission> {
    let predictions: String = row.get("predictions")?;
    let created_at: String = row.get("created_at")?;

    let predictions: BTreeMap<String, Prediction> =
        serde_json::from_str(&predictions).context("failed to decode predictions column")?;

    Ok(Submission {
        id: row.get("id")?,
        predictions,
        average_prediction: Prediction {
            x: to_coordinate(row.get("average_x")?, "average_x")?,
            y: to_coordinate(row.get("average_y")?, "average_y")?,
        },
        email: row.get("email")?,
        join_community: row.get("join_community")?,
        anonymize: row.get("anonymize")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

fn row_to_contact(row: &Row) -> Result<ContactRecord> {
    let created_at: String = row.get("created_at")?;

    Ok(ContactRecord {
        id: row.get("id")?,
        email: row.get("email")?,
        marketing_opt_in: row.get("marketing_opt_in")?,
        data_opt_out: row.get("data_opt_out")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    /// Stores a submission and its optional contact row in one transaction.
    pub async fn insert_submission(
        &self,
        submission: &Submission,
        contact: Option<&ContactRecord>,
    ) -> Result<()> {
        let record = submission.clone();
        let contact = contact.cloned();

        self.execute(move |conn| {
            let predictions = serde_json::to_string(&record.predictions)
                .context("failed to encode predictions")?;

            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO visitor_predictions
                    (id, predictions, average_x, average_y, email, join_community, anonymize, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id,
                    predictions,
                    record.average_prediction.x,
                    record.average_prediction.y,
                    record.email,
                    record.join_community,
                    record.anonymize,
                    record.created_at.to_rfc3339(),
                ],
            )
            .with_context(|| "failed to insert submission")?;

            if let Some(contact) = contact {
                tx.execute(
                    "INSERT INTO visitor_emails (id, email, marketing_opt_in, data_opt_out, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        contact.id,
                        contact.email,
                        contact.marketing_opt_in,
                        contact.data_opt_out,
                        contact.created_at.to_rfc3339(),
                    ],
                )
                .with_context(|| "failed to insert contact record")?;
            }

            tx.commit().context("failed to commit submission")?;
            Ok(())
        })
        .await
    }

    /// Every stored submission, oldest first.
    pub async fn get_all_submissions(&self) -> Result<Vec<Submission>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, predictions, average_x, average_y, email, join_community, anonymize, created_at
                 FROM visitor_predictions
                 ORDER BY seq ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut submissions = Vec::new();
            while let Some(row) = rows.next()? {
                submissions.push(row_to_submission(row)?);
            }

            Ok(submissions)
        })
        .await
    }

    pub async fn get_all_contacts(&self) -> Result<Vec<ContactRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, email, marketing_opt_in, data_opt_out, created_at
                 FROM visitor_emails
                 ORDER BY seq ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut contacts = Vec::new();
            while let Some(row) = rows.next()? {
                contacts.push(row_to_contact(row)?);
            }

            Ok(contacts)
        })
        .await
    }
}

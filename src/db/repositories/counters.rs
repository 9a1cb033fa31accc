use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, TransactionBehavior};

use crate::db::{
    helpers::{to_i64, to_u64},
    models::CounterValues,
    Database,
};

impl Database {
    /// Adds one to `field` of the `counter` document and returns the new value.
    /// A missing field starts at 1.
    pub async fn increment_counter(&self, counter: &str, field: &str) -> Result<u64> {
        let counter = counter.to_string();
        let field = field.to_string();

        self.execute(move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .context("failed to open counter transaction")?;

            let current: Option<i64> = tx
                .query_row(
                    "SELECT value FROM visitor_counts WHERE counter = ?1 AND field = ?2",
                    params![counter, field],
                    |row| row.get(0),
                )
                .optional()?;

            let next = match current {
                None => {
                    tx.execute(
                        "INSERT INTO visitor_counts (counter, field, value) VALUES (?1, ?2, 1)",
                        params![counter, field],
                    )?;
                    1
                }
                Some(value) => {
                    let next = to_u64(value, "visitor_counts.value")? + 1;
                    tx.execute(
                        "UPDATE visitor_counts SET value = ?1 WHERE counter = ?2 AND field = ?3",
                        params![to_i64(next)?, counter, field],
                    )?;
                    next
                }
            };

            tx.commit()
                .with_context(|| format!("failed to commit increment of {counter}.{field}"))?;
            Ok(next)
        })
        .await
    }

    pub async fn get_counter(&self, counter: &str) -> Result<CounterValues> {
        let counter = counter.to_string();

        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT field, value FROM visitor_counts WHERE counter = ?1 ORDER BY field ASC",
            )?;

            let mut rows = stmt.query(params![counter])?;
            let mut values = CounterValues::new();
            while let Some(row) = rows.next()? {
                let field: String = row.get(0)?;
                let value = to_u64(row.get(1)?, &field)?;
                values.insert(field, value);
            }

            Ok(values)
        })
        .await
    }
}

//! Calendar schema steps.
//!
//! Definitions come first because configurations reference them. A step's
//! version is what `PRAGMA user_version` reads once the step has committed.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "calendar_definitions",
        sql: include_str!("0001_calendar_definitions.sql"),
    },
    SchemaStep {
        version: 2,
        name: "calendar_configurations",
        sql: include_str!("0002_calendar_configurations.sql"),
    },
];

/// Calendar schema version this build writes.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Reads the calendar schema version recorded in `conn`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Brings `conn` up to [`latest_version`] in one transaction.
///
/// A failing step rolls back the earlier steps of the same run too, so the
/// recorded version never points past a half-built calendar schema.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version = schema_version(conn)?;
    let latest = latest_version();
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let mut pending = SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > from_version)
        .peekable();
    if pending.peek().is_none() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in pending {
        let applied = tx
            .execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version));
        if let Err(source) = applied {
            error!(
                "event=db_migrate module=db status=error version={} step={} error={source}",
                step.version, step.name
            );
            return Err(DbError::Migration {
                version: step.version,
                name: step.name,
                source,
            });
        }
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={from_version} to_version={latest}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::SCHEMA_STEPS;

    #[test]
    fn schema_steps_are_numbered_from_one_without_gaps() {
        for (index, step) in SCHEMA_STEPS.iter().enumerate() {
            assert_eq!(step.version as usize, index + 1, "step {}", step.name);
        }
    }
}

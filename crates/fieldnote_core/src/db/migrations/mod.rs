//! Ordered schema history for the fieldnote database.
//!
//! | version | name              | adds                                  |
//! |---------|-------------------|---------------------------------------|
//! | 1       | `notes_and_nodes` | categories, node tree, notes          |
//! | 2       | `issue_evidence`  | evidence rows linking issues to nodes |
//! | 3       | `change_history`  | activity feed, note text versions     |
//!
//! # Invariants
//! - Versions start at 1 and increase by one.
//! - All pending steps run in one transaction. A failing step rolls the whole
//!   run back and `PRAGMA user_version` keeps its previous value.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "notes_and_nodes",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "issue_evidence",
        sql: include_str!("0002_evidence.sql"),
    },
    Migration {
        version: 3,
        name: "change_history",
        sql: include_str!("0003_history.sql"),
    },
];

/// Latest schema version this build can open.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Schema version recorded in the database file.
pub fn current_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Names of the schema steps already applied to `conn`, oldest first.
pub fn applied_migrations(conn: &Connection) -> DbResult<Vec<&'static str>> {
    let current = current_version(conn)?;
    Ok(MIGRATIONS
        .iter()
        .take_while(|migration| migration.version <= current)
        .map(|migration| migration.name)
        .collect())
}

/// Brings `conn` up to [`latest_version`].
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current = current_version(conn)?;
    let latest = latest_version();
    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|step| step.version > current) {
        tx.execute_batch(migration.sql)
            .and_then(|()| {
                tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
            })
            .map_err(|source| DbError::Migration {
                version: migration.version,
                name: migration.name,
                source,
            })?;
        debug!(
            "event=db_migrate module=db status=step version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from={current} to={latest}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{latest_version, MIGRATIONS};
    use std::collections::HashSet;

    #[test]
    fn versions_are_contiguous_from_one() {
        for (index, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version as usize, index + 1);
        }
        assert_eq!(latest_version() as usize, MIGRATIONS.len());
    }

    #[test]
    fn step_names_are_unique() {
        let names: HashSet<_> = MIGRATIONS.iter().map(|migration| migration.name).collect();
        assert_eq!(names.len(), MIGRATIONS.len());
    }
}

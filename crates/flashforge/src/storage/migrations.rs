//! Schema versioning for the slot database.
//!
//! Each migration is a function registered against the version it produces.
//! Pending migrations run in order inside one transaction, and the stored
//! version is bumped only when all of them succeed.

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// The current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

type Migration = fn(&Connection) -> Result<()>;

/// Registered migrations, ordered by the version they produce.
const MIGRATIONS: &[(u32, Migration)] = &[(1, migrate_v1)];

/// Create the base tables and bring the schema up to [`CURRENT_VERSION`].
///
/// # Errors
///
/// Returns an error if table creation fails, the stored version is
/// unreadable or newer than this build, or a migration fails.
pub fn initialize_schema(conn: &mut Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let version = schema_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {version} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }
    if version < CURRENT_VERSION {
        run_migrations(conn, version)?;
    }

    Ok(())
}

/// Read the schema version, treating a missing record as 0.
fn schema_version(conn: &Connection) -> Result<u32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        None => Ok(0),
        Some(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
    }
}

fn set_schema_version(conn: &Connection, version: u32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

fn run_migrations(conn: &mut Connection, from_version: u32) -> Result<()> {
    let tx = conn.transaction()?;

    for version in (from_version + 1)..=CURRENT_VERSION {
        debug!("Applying slot database migration v{}", version);
        run_migration(&tx, version)?;
    }
    set_schema_version(&tx, CURRENT_VERSION)?;

    tx.commit()?;
    info!(
        "Slot database migrated from v{} to v{}",
        from_version, CURRENT_VERSION
    );
    Ok(())
}

/// Run a single migration by target version.
fn run_migration(conn: &Connection, version: u32) -> Result<()> {
    let migration = MIGRATIONS
        .iter()
        .find(|(v, _)| *v == version)
        .map(|(_, m)| *m)
        .ok_or_else(|| Error::DatabaseMigration {
            message: format!("unknown migration version: {version}"),
        })?;
    migration(conn)
}

/// Version 1 is the base schema created by `SCHEMA_STATEMENTS`.
#[allow(clippy::unnecessary_wraps)]
fn migrate_v1(_conn: &Connection) -> Result<()> {
    Ok(())
}

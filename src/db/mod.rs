pub mod migrations;
pub mod queries;

use std::time::Duration;

use anyhow::Context;
use rusqlite::Connection;

const IN_MEMORY: &str = ":memory:";

// `":memory:"` yields a private throwaway database, as used by the tests.
pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = if path == IN_MEMORY {
        Connection::open_in_memory().context("failed to open in-memory database")?
    } else {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("failed to enable WAL")?;
        conn.busy_timeout(Duration::from_secs(5))
            .context("failed to set busy timeout")?;
        conn
    };

    // Bookings reference users and services.
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign keys")?;

    migrations::run_migrations(&conn)?;

    tracing::debug!(path, "database ready");
    Ok(conn)
}

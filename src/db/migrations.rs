use anyhow::Context;
use rusqlite::Connection;

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_create_users.sql",
        include_str!("../../migrations/001_create_users.sql"),
    ),
    (
        "002_create_services.sql",
        include_str!("../../migrations/002_create_services.sql"),
    ),
    (
        "003_create_bookings.sql",
        include_str!("../../migrations/003_create_bookings.sql"),
    ),
];

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;

        if already_applied {
            continue;
        }

        // Schema change and its record land together or not at all.
        let tx = conn
            .unchecked_transaction()
            .context("failed to start migration transaction")?;
        tx.execute_batch(sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;
        tx.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
            .with_context(|| format!("failed to record migration: {name}"))?;
        tx.commit()
            .with_context(|| format!("failed to commit migration: {name}"))?;

        tracing::info!(migration = name, "applied migration");
    }

    Ok(())
}

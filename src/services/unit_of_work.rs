use rusqlite::{Connection, Transaction};

use crate::errors::AppError;
use crate::services::notifier::Notice;

// Dropping a unit of work without calling `commit` rolls
// the transaction back and discards the queued notices.
pub struct UnitOfWork<'c> {
    tx: Transaction<'c>,
    outbox: Vec<Notice>,
}

impl<'c> UnitOfWork<'c> {
    pub fn begin(conn: &'c mut Connection) -> Result<Self, AppError> {
        Ok(Self {
            tx: conn.transaction()?,
            outbox: Vec::new(),
        })
    }

    pub fn conn(&self) -> &Connection {
        &self.tx
    }

    pub fn enqueue(&mut self, notices: impl IntoIterator<Item = Notice>) {
        self.outbox.extend(notices);
    }

    pub fn commit(self) -> Result<Vec<Notice>, AppError> {
        let UnitOfWork { tx, outbox } = self;
        tx.commit()?;
        Ok(outbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn user_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap()
    }

    fn insert_user(conn: &Connection) {
        conn.execute(
            "INSERT INTO users (email, username, first_name, last_name) VALUES ('u@x.test', 'u', 'U', 'U')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn test_commit_persists_and_returns_outbox() {
        let mut conn = db::init_db(":memory:").unwrap();
        let mut uow = UnitOfWork::begin(&mut conn).unwrap();
        insert_user(uow.conn());
        uow.enqueue([Notice {
            to_email: "u@x.test".into(),
            to_name: None,
            subject: "hi".into(),
            text: "hi".into(),
            html: "<p>hi</p>".into(),
        }]);

        let notices = uow.commit().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(user_count(&conn), 1);
    }

    #[test]
    fn test_drop_rolls_back() {
        let mut conn = db::init_db(":memory:").unwrap();
        {
            let mut uow = UnitOfWork::begin(&mut conn).unwrap();
            insert_user(uow.conn());
            uow.enqueue([Notice {
                to_email: "u@x.test".into(),
                to_name: None,
                subject: "hi".into(),
                text: "hi".into(),
                html: "<p>hi</p>".into(),
            }]);
        }
        assert_eq!(user_count(&conn), 0);

        // A fresh unit starts with an empty outbox.
        let uow = UnitOfWork::begin(&mut conn).unwrap();
        assert!(uow.commit().unwrap().is_empty());
    }
}

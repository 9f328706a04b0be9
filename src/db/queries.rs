use anyhow::{anyhow, Context};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{
    Booking, BookingDraft, BookingStatus, BookingView, NewService, NewUser, PartySummary,
    ServiceRef, ServiceSummary, ALLOWED_DURATIONS,
};

// Fixed-width so that lexical order in SQLite matches time order.
const DB_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const BOOKING_COLUMNS: &str =
    "b.id, b.client_id, b.service_id, b.provider_id, b.status, b.time_booked, b.created_at, b.updated_at";

const VIEW_COLUMNS: &str = "b.id, b.client_id, b.service_id, b.provider_id, b.status, b.time_booked, b.created_at, b.updated_at, \
     c.username, c.avatar_url, c.email, c.first_name, c.last_name, \
     p.username, p.avatar_url, p.email, p.first_name, p.last_name, \
     s.name";

const VIEW_JOINS: &str = "FROM bookings b \
     LEFT JOIN users c ON c.id = b.client_id \
     LEFT JOIN users p ON p.id = b.provider_id \
     LEFT JOIN services s ON s.id = b.service_id";

pub fn to_db_time(dt: &DateTime<Utc>) -> String {
    dt.format(DB_TIME_FORMAT).to_string()
}

pub fn from_db_time(s: &str) -> anyhow::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .map(|dt| dt.and_utc())
        .with_context(|| format!("invalid stored timestamp: {s}"))
}

// ── Bookings ──

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub client_id: Option<i64>,
    pub provider_id: Option<i64>,
    pub service_id: Option<i64>,
    // Exact match against the stored literal.
    pub status: Option<String>,
    pub status_in: Vec<BookingStatus>,
    pub time_from: Option<DateTime<Utc>>,
    pub time_to: Option<DateTime<Utc>>,
}

impl BookingFilter {
    fn where_clause(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut clauses: Vec<String> = vec![];
        let mut params_vec: Vec<Box<dyn ToSql>> = vec![];

        let mut push = |column: &str, value: Box<dyn ToSql>, op: &str| {
            params_vec.push(value);
            clauses.push(format!("{column} {op} ?{}", params_vec.len()));
        };

        if let Some(id) = self.client_id {
            push("b.client_id", Box::new(id), "=");
        }
        if let Some(id) = self.provider_id {
            push("b.provider_id", Box::new(id), "=");
        }
        if let Some(id) = self.service_id {
            push("b.service_id", Box::new(id), "=");
        }
        if let Some(status) = &self.status {
            push("b.status", Box::new(status.clone()), "=");
        }
        if let Some(from) = &self.time_from {
            push("b.time_booked", Box::new(to_db_time(from)), ">=");
        }
        if let Some(to) = &self.time_to {
            push("b.time_booked", Box::new(to_db_time(to)), "<=");
        }

        if !self.status_in.is_empty() {
            let start = params_vec.len();
            let placeholders: Vec<String> = self
                .status_in
                .iter()
                .enumerate()
                .map(|(i, _)| format!("?{}", start + i + 1))
                .collect();
            for status in &self.status_in {
                params_vec.push(Box::new(status.as_str()));
            }
            clauses.push(format!("b.status IN ({})", placeholders.join(", ")));
        }

        if clauses.is_empty() {
            (String::new(), params_vec)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), params_vec)
        }
    }
}

// Earliest first; id breaks ties between bookings for the same instant.
const ORDER_BY: &str = "ORDER BY b.time_booked ASC, b.id ASC";

pub fn create_booking(
    conn: &Connection,
    draft: &BookingDraft,
    now: DateTime<Utc>,
) -> anyhow::Result<Booking> {
    let now_str = to_db_time(&now);

    conn.execute(
        "INSERT INTO bookings (client_id, service_id, provider_id, status, time_booked, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            draft.client_id,
            draft.service_id,
            draft.provider_id,
            draft.status.as_str(),
            to_db_time(&draft.time_booked),
            now_str,
            now_str,
        ],
    )?;

    get_booking(conn, conn.last_insert_rowid())?
        .ok_or_else(|| anyhow!("booking vanished after insert"))
}

pub fn get_booking(conn: &Connection, id: i64) -> anyhow::Result<Option<Booking>> {
    let result = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = ?1"),
            params![id],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;

    result.transpose()
}

// Writes status, time and updated_at. Returns false if the row is gone.
pub fn update_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, time_booked = ?2, updated_at = ?3 WHERE id = ?4",
        params![
            booking.status.as_str(),
            to_db_time(&booking.time_booked),
            to_db_time(&booking.updated_at),
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_booking(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn count_bookings(conn: &Connection, filter: &BookingFilter) -> anyhow::Result<u64> {
    let (where_sql, params_vec) = filter.where_clause();
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM bookings b {where_sql}"),
        params_refs.as_slice(),
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

// `window` is `(limit, offset)`; `None` returns every match.
pub fn find_bookings(
    conn: &Connection,
    filter: &BookingFilter,
    window: Option<(i64, i64)>,
) -> anyhow::Result<Vec<Booking>> {
    let (where_sql, params_vec) = filter.where_clause();
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings b {where_sql} {ORDER_BY} {}",
        limit_clause(window)
    );

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_booking_view(conn: &Connection, id: i64) -> anyhow::Result<Option<BookingView>> {
    let result = conn
        .query_row(
            &format!("SELECT {VIEW_COLUMNS} {VIEW_JOINS} WHERE b.id = ?1"),
            params![id],
            |row| Ok(parse_view_row(row)),
        )
        .optional()?;

    result.transpose()
}

pub fn find_booking_views(
    conn: &Connection,
    filter: &BookingFilter,
    window: Option<(i64, i64)>,
) -> anyhow::Result<Vec<BookingView>> {
    let (where_sql, params_vec) = filter.where_clause();
    let sql = format!(
        "SELECT {VIEW_COLUMNS} {VIEW_JOINS} {where_sql} {ORDER_BY} {}",
        limit_clause(window)
    );

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_view_row(row)))?;

    let mut views = vec![];
    for row in rows {
        views.push(row??);
    }
    Ok(views)
}

fn limit_clause(window: Option<(i64, i64)>) -> String {
    match window {
        Some((limit, offset)) => format!("LIMIT {} OFFSET {}", limit.max(0), offset.max(0)),
        None => String::new(),
    }
}

fn parse_booking_row(row: &Row) -> anyhow::Result<Booking> {
    let status_str: String = row.get(4)?;
    let time_booked_str: String = row.get(5)?;
    let created_at_str: String = row.get(6)?;
    let updated_at_str: String = row.get(7)?;

    Ok(Booking {
        id: row.get(0)?,
        client_id: row.get(1)?,
        service_id: row.get(2)?,
        provider_id: row.get(3)?,
        status: BookingStatus::parse(&status_str)
            .ok_or_else(|| anyhow!("unknown booking status in store: {status_str}"))?,
        time_booked: from_db_time(&time_booked_str)?,
        created_at: from_db_time(&created_at_str)?,
        updated_at: from_db_time(&updated_at_str)?,
    })
}

fn parse_party(row: &Row, id: i64, offset: usize) -> anyhow::Result<PartySummary> {
    let username: Option<String> = row.get(offset)?;
    let avatar_url: Option<String> = row.get(offset + 1)?;
    let email: Option<String> = row.get(offset + 2)?;
    let first_name: Option<String> = row.get(offset + 3)?;
    let last_name: Option<String> = row.get(offset + 4)?;

    let full_name = match (&first_name, &last_name) {
        (Some(first), Some(last)) => Some(format!("{first} {last}")),
        _ => None,
    };

    Ok(PartySummary {
        id,
        username,
        avatar_url,
        email,
        first_name,
        last_name,
        full_name,
    })
}

fn parse_view_row(row: &Row) -> anyhow::Result<BookingView> {
    let booking = parse_booking_row(row)?;
    let client = parse_party(row, booking.client_id, 8)?;
    let provider = parse_party(row, booking.provider_id, 13)?;
    let service_name: Option<String> = row.get(18)?;

    Ok(BookingView {
        id: booking.id,
        client_id: booking.client_id,
        provider_id: booking.provider_id,
        service_id: booking.service_id,
        client,
        provider,
        service: ServiceSummary {
            id: booking.service_id,
            name: service_name,
        },
        status: booking.status,
        time_booked: booking.time_booked,
        created_at: booking.created_at,
        updated_at: booking.updated_at,
    })
}

// ── Catalog ──

pub fn get_service_ref(conn: &Connection, id: i64) -> anyhow::Result<Option<ServiceRef>> {
    let service = conn
        .query_row(
            "SELECT id, user_id, name FROM services WHERE id = ?1",
            params![id],
            |row| {
                Ok(ServiceRef {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(service)
}

pub fn create_service(conn: &Connection, service: &NewService) -> anyhow::Result<i64> {
    if !ALLOWED_DURATIONS.contains(&service.duration_minutes) {
        anyhow::bail!(
            "duration {} is not one of {:?} minutes",
            service.duration_minutes,
            ALLOWED_DURATIONS
        );
    }

    conn.execute(
        "INSERT INTO services (user_id, name, duration_minutes, price, description)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            service.user_id,
            service.name,
            service.duration_minutes,
            service.price,
            service.description,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

// ── Users ──

pub fn create_user(conn: &Connection, user: &NewUser) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO users (email, username, first_name, last_name) VALUES (?1, ?2, ?3, ?4)",
        params![user.email, user.username, user.first_name, user.last_name],
    )?;
    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, 0, 0).unwrap()
    }

    fn setup() -> (Connection, i64, i64, i64) {
        let conn = db::init_db(":memory:").unwrap();
        let provider = create_user(
            &conn,
            &NewUser {
                email: "pat@example.com".into(),
                username: "pat".into(),
                first_name: "Pat".into(),
                last_name: "Provider".into(),
            },
        )
        .unwrap();
        let client = create_user(
            &conn,
            &NewUser {
                email: "cam@example.com".into(),
                username: "cam".into(),
                first_name: "Cam".into(),
                last_name: "Client".into(),
            },
        )
        .unwrap();
        let service = create_service(
            &conn,
            &NewService {
                user_id: provider,
                name: "Haircut".into(),
                duration_minutes: 60,
                price: "25.00".into(),
                description: None,
            },
        )
        .unwrap();
        (conn, provider, client, service)
    }

    fn insert(conn: &Connection, client: i64, provider: i64, service: i64, status: BookingStatus, hour: u32) -> Booking {
        create_booking(
            conn,
            &BookingDraft {
                client_id: client,
                provider_id: provider,
                service_id: service,
                status,
                time_booked: at(hour),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_create_and_get_booking() {
        let (conn, provider, client, service) = setup();
        let booking = insert(&conn, client, provider, service, BookingStatus::Pending, 9);

        let loaded = get_booking(&conn, booking.id).unwrap().unwrap();
        assert_eq!(loaded, booking);
        assert_eq!(loaded.time_booked, at(9));
        assert!(get_booking(&conn, booking.id + 100).unwrap().is_none());
    }

    #[test]
    fn test_filter_and_sort() {
        let (conn, provider, client, service) = setup();
        insert(&conn, client, provider, service, BookingStatus::Accepted, 15);
        insert(&conn, client, provider, service, BookingStatus::Rejected, 9);
        insert(&conn, client, provider, service, BookingStatus::Pending, 11);

        let filter = BookingFilter {
            provider_id: Some(provider),
            status_in: BookingStatus::OCCUPYING.to_vec(),
            ..Default::default()
        };
        let found = find_bookings(&conn, &filter, None).unwrap();
        let hours: Vec<_> = found.iter().map(|b| b.time_booked).collect();
        assert_eq!(hours, vec![at(11), at(15)]);
        assert_eq!(count_bookings(&conn, &filter).unwrap(), 2);

    }

    #[test]
    fn test_create_service_rejects_unlisted_duration() {
        let (conn, provider, _, _) = setup();
        let result = create_service(
            &conn,
            &NewService {
                user_id: provider,
                name: "Long cut".into(),
                duration_minutes: 90,
                price: "40.00".into(),
                description: None,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_time_window_is_inclusive() {
        let (conn, provider, client, service) = setup();
        insert(&conn, client, provider, service, BookingStatus::Pending, 8);
        insert(&conn, client, provider, service, BookingStatus::Pending, 10);
        insert(&conn, client, provider, service, BookingStatus::Pending, 12);

        let filter = BookingFilter {
            time_from: Some(at(10)),
            time_to: Some(at(12)),
            ..Default::default()
        };
        assert_eq!(count_bookings(&conn, &filter).unwrap(), 2);
    }

    #[test]
    fn test_window_limit_offset() {
        let (conn, provider, client, service) = setup();
        for h in 8..13 {
            insert(&conn, client, provider, service, BookingStatus::Pending, h);
        }
        let page = find_bookings(&conn, &BookingFilter::default(), Some((2, 2))).unwrap();
        let hours: Vec<_> = page.iter().map(|b| b.time_booked).collect();
        assert_eq!(hours, vec![at(10), at(11)]);
    }

    #[test]
    fn test_view_joins_parties_and_service() {
        let (conn, provider, client, service) = setup();
        let booking = insert(&conn, client, provider, service, BookingStatus::Pending, 9);

        let view = get_booking_view(&conn, booking.id).unwrap().unwrap();
        assert_eq!(view.client.username.as_deref(), Some("cam"));
        assert_eq!(view.provider.full_name.as_deref(), Some("Pat Provider"));
        assert_eq!(view.service.name.as_deref(), Some("Haircut"));
    }

    #[test]
    fn test_update_and_delete() {
        let (conn, provider, client, service) = setup();
        let mut booking = insert(&conn, client, provider, service, BookingStatus::Pending, 9);

        booking.status = BookingStatus::Canceled;
        assert!(update_booking(&conn, &booking).unwrap());
        assert_eq!(get_booking(&conn, booking.id).unwrap().unwrap().status, BookingStatus::Canceled);

        assert!(delete_booking(&conn, booking.id).unwrap());
        assert!(!delete_booking(&conn, booking.id).unwrap());
    }
}

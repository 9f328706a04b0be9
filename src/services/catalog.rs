use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::ServiceRef;

// Resolves a service by id; its `user_id` is the owner at this moment.
pub fn get_service(conn: &Connection, id: i64) -> Result<ServiceRef, AppError> {
    queries::get_service_ref(conn, id)?.ok_or(AppError::ServiceNotFound)
}

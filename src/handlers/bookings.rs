use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::errors::AppError;
use crate::handlers::extract::{CurrentUser, JsonBody};
use crate::models::PageRequest;
use crate::services::lifecycle::{self, ListQuery, Role, SlotQuery};
use crate::services::notifier;
use crate::services::unit_of_work::UnitOfWork;
use crate::state::AppState;

// Path ids that are not integers cannot name a booking.
fn parse_booking_id(raw: &str) -> Result<i64, AppError> {
    raw.parse().map_err(|_| AppError::BookingNotFound)
}

// Query values are parsed leniently: junk falls back to the default.
fn lenient_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse().ok())
}

// GET /bookings
#[derive(Deserialize)]
pub struct ListParams {
    pub role: Option<String>,
    pub status: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let query = ListQuery {
        role: params.role.as_deref().map(Role::parse).unwrap_or_default(),
        status: params.status,
        page: PageRequest::new(
            lenient_int(params.page.as_deref()),
            lenient_int(params.per_page.as_deref()),
        ),
    };

    let page = {
        let db = state.lock_db()?;
        lifecycle::list_bookings(&db, caller, &query)?
    };

    Ok(Json(json!({
        "data": {
            "bookings": page.items,
            "pagination": page.pagination,
        },
        "message": "Bookings retrieved successfully",
    })))
}

// POST /bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    JsonBody(payload): JsonBody,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let (view, notices) = {
        let mut db = state.lock_db()?;
        let mut uow = UnitOfWork::begin(&mut db)?;
        let view = lifecycle::create_booking(&mut uow, caller, &payload)?;
        (view, uow.commit()?)
    };

    notifier::dispatch(Arc::clone(&state.notifier), notices);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": view, "message": "Booking created successfully" })),
    ))
}

// GET /bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    CurrentUser(_caller): CurrentUser,
    Path(raw_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking_id = parse_booking_id(&raw_id)?;

    let view = {
        let db = state.lock_db()?;
        lifecycle::get_booking(&db, booking_id)?
    };

    Ok(Json(json!({ "data": view, "message": "Booking retrieved successfully" })))
}

// PUT|PATCH /bookings/:id
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path(raw_id): Path<String>,
    JsonBody(payload): JsonBody,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking_id = parse_booking_id(&raw_id)?;

    let (view, notices) = {
        let mut db = state.lock_db()?;
        let mut uow = UnitOfWork::begin(&mut db)?;
        let view = lifecycle::update_booking(&mut uow, caller, booking_id, &payload)?;
        (view, uow.commit()?)
    };

    notifier::dispatch(Arc::clone(&state.notifier), notices);

    Ok(Json(json!({ "data": view, "message": "Booking updated successfully" })))
}

// DELETE /bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path(raw_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking_id = parse_booking_id(&raw_id)?;

    {
        let mut db = state.lock_db()?;
        let mut uow = UnitOfWork::begin(&mut db)?;
        lifecycle::delete_booking(&mut uow, caller, booking_id)?;
        uow.commit()?;
    }

    Ok(Json(json!({ "message": "Booking deleted successfully" })))
}

// GET /bookings/slots
#[derive(Deserialize)]
pub struct SlotParams {
    pub service_id: Option<String>,
    pub provider_id: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

pub async fn occupied_slots(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SlotParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    // Zero or non-numeric ids mean "no filter".
    let query = SlotQuery {
        service_id: lenient_int(params.service_id.as_deref()).filter(|id| *id != 0),
        provider_id: lenient_int(params.provider_id.as_deref()).filter(|id| *id != 0),
        start: params.start,
        end: params.end,
    };

    let slots = {
        let db = state.lock_db()?;
        lifecycle::occupied_slots(&db, &query)?
    };

    Ok(Json(json!({
        "data": { "count": slots.len(), "slots": slots },
        "message": "Booked slots retrieved successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_int() {
        assert_eq!(lenient_int(Some("3")), Some(3));
        assert_eq!(lenient_int(Some(" 12 ")), Some(12));
        assert_eq!(lenient_int(Some("abc")), None);
        assert_eq!(lenient_int(None), None);
    }

    #[test]
    fn test_non_numeric_booking_id_is_not_found() {
        assert!(matches!(parse_booking_id("abc"), Err(AppError::BookingNotFound)));
        assert_eq!(parse_booking_id("17").unwrap(), 17);
    }
}

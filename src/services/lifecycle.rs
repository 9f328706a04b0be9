use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::db::queries::{self, BookingFilter};
use crate::errors::AppError;
use crate::models::{
    format_instant, parse_instant, BookingDraft, BookingPatch, BookingStatus, BookingView,
    NewBooking, Page, PageRequest, Pagination, PartySummary, Payload, SlotView,
};
use crate::services::catalog;
use crate::services::notifier::Notice;
use crate::services::unit_of_work::UnitOfWork;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Role {
    Client,
    #[default]
    Provider,
}

impl Role {
    // Anything other than "client" means provider.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("client") {
            Role::Client
        } else {
            Role::Provider
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub role: Role,
    pub status: Option<String>,
    pub page: PageRequest,
}

#[derive(Debug, Clone, Default)]
pub struct SlotQuery {
    pub service_id: Option<i64>,
    pub provider_id: Option<i64>,
    pub start: Option<String>,
    pub end: Option<String>,
}

pub fn create_booking(
    uow: &mut UnitOfWork<'_>,
    caller_id: i64,
    payload: &Payload,
) -> Result<BookingView, AppError> {
    let input = NewBooking::from_payload(payload)?;
    let service = catalog::get_service(uow.conn(), input.service_id)?;

    // provider_id is a snapshot of the owner at creation time.
    let draft = BookingDraft {
        client_id: caller_id,
        provider_id: service.user_id,
        service_id: service.id,
        status: input.status,
        time_booked: input.time_booked,
    };
    let booking = queries::create_booking(uow.conn(), &draft, Utc::now())?;
    let view = load_view(uow.conn(), booking.id)?;

    tracing::info!(
        booking_id = booking.id,
        client_id = booking.client_id,
        provider_id = booking.provider_id,
        "booking created"
    );

    uow.enqueue(created_notices(&view));
    Ok(view)
}

pub fn get_booking(conn: &Connection, booking_id: i64) -> Result<BookingView, AppError> {
    load_view(conn, booking_id)
}

pub fn update_booking(
    uow: &mut UnitOfWork<'_>,
    caller_id: i64,
    booking_id: i64,
    payload: &Payload,
) -> Result<BookingView, AppError> {
    let mut booking =
        queries::get_booking(uow.conn(), booking_id)?.ok_or(AppError::BookingNotFound)?;

    if !booking.is_party(caller_id) {
        return Err(AppError::Forbidden(
            "You do not have permission to update this booking".to_string(),
        ));
    }

    let patch = BookingPatch::from_payload(payload)?;
    let before = booking.clone();

    if let Some(status) = patch.status {
        booking.status = status;
    }
    if let Some(time_booked) = patch.time_booked {
        booking.time_booked = time_booked;
    }

    // Values equal to the stored ones leave the row, updated_at included, untouched.
    let changed = before.status != booking.status || before.time_booked != booking.time_booked;
    if changed {
        booking.updated_at = Utc::now();
        if !queries::update_booking(uow.conn(), &booking)? {
            return Err(AppError::BookingNotFound);
        }
    }

    let view = load_view(uow.conn(), booking.id)?;

    if changed {
        tracing::info!(
            booking_id = booking.id,
            caller_id,
            status = booking.status.as_str(),
            "booking updated"
        );
        uow.enqueue(updated_notices(&view));
    }

    Ok(view)
}

// Hard delete. No notices are sent.
pub fn delete_booking(
    uow: &mut UnitOfWork<'_>,
    caller_id: i64,
    booking_id: i64,
) -> Result<(), AppError> {
    let booking =
        queries::get_booking(uow.conn(), booking_id)?.ok_or(AppError::BookingNotFound)?;

    if !booking.is_party(caller_id) {
        return Err(AppError::Forbidden(
            "You do not have permission to delete this booking".to_string(),
        ));
    }

    queries::delete_booking(uow.conn(), booking.id)?;
    tracing::info!(booking_id = booking.id, caller_id, "booking deleted");
    Ok(())
}

pub fn list_bookings(
    conn: &Connection,
    caller_id: i64,
    query: &ListQuery,
) -> Result<Page<BookingView>, AppError> {
    let mut filter = BookingFilter::default();
    match query.role {
        Role::Client => filter.client_id = Some(caller_id),
        Role::Provider => filter.provider_id = Some(caller_id),
    }
    filter.status = query
        .status
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let total = queries::count_bookings(conn, &filter)?;
    let items = queries::find_booking_views(
        conn,
        &filter,
        Some((query.page.limit(), query.page.offset())),
    )?;

    Ok(Page {
        items,
        pagination: Pagination::new(query.page, total),
    })
}

// Slots held by pending or accepted bookings, earliest first. Public read.
pub fn occupied_slots(conn: &Connection, query: &SlotQuery) -> Result<Vec<SlotView>, AppError> {
    let filter = BookingFilter {
        service_id: query.service_id,
        provider_id: query.provider_id,
        status_in: BookingStatus::OCCUPYING.to_vec(),
        time_from: parse_bound("start", query.start.as_deref())?,
        time_to: parse_bound("end", query.end.as_deref())?,
        ..Default::default()
    };

    let bookings = queries::find_bookings(conn, &filter, None)?;
    Ok(bookings.iter().map(SlotView::from).collect())
}

fn parse_bound(field: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    parse_instant(raw)
        .map(Some)
        .ok_or_else(|| AppError::field(field, format!("Invalid {field} datetime")))
}

fn load_view(conn: &Connection, booking_id: i64) -> Result<BookingView, AppError> {
    queries::get_booking_view(conn, booking_id)?.ok_or(AppError::BookingNotFound)
}

// ── Notices ──

fn service_name(view: &BookingView) -> &str {
    view.service.name.as_deref().unwrap_or("a service")
}

fn notice_for(party: &PartySummary, subject: String, text: String, html: String) -> Option<Notice> {
    let email = party.email.as_deref().filter(|e| !e.is_empty())?;
    Some(Notice {
        to_email: email.to_string(),
        to_name: party.full_name.clone(),
        subject,
        text,
        html,
    })
}

fn created_notices(view: &BookingView) -> Vec<Notice> {
    let service = service_name(view);
    let when = format_instant(&view.time_booked);
    let client_name = view
        .client
        .display_name()
        .unwrap_or_else(|| "a client".to_string());

    let to_provider = notice_for(
        &view.provider,
        format!("New booking request for {service}"),
        format!("You have a new booking request on {when} from {client_name}."),
        format!(
            "<p>You have a new booking request for <strong>{service}</strong> on <strong>{when}</strong> from <strong>{client_name}</strong>.</p>"
        ),
    );
    let to_client = notice_for(
        &view.client,
        format!("Your booking request for {service} was submitted"),
        format!("Your booking request on {when} has been submitted to the provider."),
        format!(
            "<p>Your booking request for <strong>{service}</strong> on <strong>{when}</strong> has been submitted to the provider.</p>"
        ),
    );

    to_provider.into_iter().chain(to_client).collect()
}

fn updated_notices(view: &BookingView) -> Vec<Notice> {
    let service = service_name(view);
    let when = format_instant(&view.time_booked);
    let status = view.status.as_str();
    let text = format!("Status: {status}. Time: {when}");
    let details = format!("<p><strong>Status:</strong> {status}<br/><strong>Time:</strong> {when}</p>");

    let to_client = notice_for(
        &view.client,
        format!("Your booking for {service} was updated"),
        text.clone(),
        format!("<p>Your booking for <strong>{service}</strong> was updated.</p>{details}"),
    );
    let to_provider = notice_for(
        &view.provider,
        format!("Booking for {service} was updated"),
        text,
        format!("<p>A booking for <strong>{service}</strong> was updated.</p>{details}"),
    );

    to_client.into_iter().chain(to_provider).collect()
}

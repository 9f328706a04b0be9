pub mod booking;
pub mod page;
pub mod service;
pub mod user;
pub mod view;

pub use booking::{
    format_instant, parse_instant, Booking, BookingDraft, BookingPatch, BookingStatus, NewBooking,
    Payload,
};
pub use page::{Page, PageRequest, Pagination};
pub use service::{NewService, ServiceRef, ALLOWED_DURATIONS};
pub use user::NewUser;
pub use view::{BookingView, PartySummary, ServiceSummary, SlotView};

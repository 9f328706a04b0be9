pub mod catalog;
pub mod identity;
pub mod lifecycle;
pub mod notifier;
pub mod unit_of_work;

//! API Routes
//!
//! Route handlers organized by functionality.

pub mod achievements;
pub mod auth;
pub mod catalogue;
pub mod certificate;
pub mod challenge;
pub mod health;
pub mod journal;
pub mod profile;
pub mod progress;

use chrono::NaiveDate;

/// The server's calendar date
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub mod categories;
pub mod health;
pub mod moods;
pub mod stats;
pub mod ws;

use chrono::{Local, NaiveDate};

/// The user's calendar day, from the device clock.
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

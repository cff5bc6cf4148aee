//! A configurable in-game calendar clock.
//!
//! [`CalendarClock`] tracks a year / month / day / hour / minute position on a
//! custom calendar (any week layout, any list of months), advances one in-game
//! minute per tick of an attached [`TickSource`], and notifies listeners each
//! time a unit rolls over.
//!
//! ```
//! use game_calendar::{CalendarClock, CalendarConfiguration, CalendarEvent, EventKind};
//!
//! let clock = CalendarClock::new(CalendarConfiguration::default());
//! clock.subscribe(EventKind::Day, |event| {
//!     if let CalendarEvent::DayUpdated { month_name, day } = event {
//!         println!("{month_name} {day}");
//!     }
//! });
//!
//! clock.advance(0, 12, 0).unwrap();
//! assert_eq!(clock.formatted_time(), "00:00");
//! assert_eq!(clock.day_name(), "Mon");
//! ```

mod clock;
mod consts;
mod events;
mod prelude;
mod state;
mod tick;
mod types;

pub use clock::CalendarClock;
pub use consts::*;
pub use events::{CalendarEvent, EventBus, EventKind, Listener, ListenerId};
pub use state::CalendarState;
pub use tick::{ManualTickSource, SubscriptionHandle, TickCallback, TickSource, TokioTickSource};
pub use types::{CalendarConfiguration, MonthDefinition};

/// Errors raised by calendar configuration and clock mutation.
///
/// Name lookups never fail; they fall back to [`UNKNOWN`] or [`INVALID_DAY`].
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    /// No months are configured, so days cannot be carried.
    #[error("Calendar has no months configured")]
    EmptyCalendar,

    /// The current month index does not name a configured month.
    #[error("Month index {index} is out of range for {len} months")]
    MonthIndexOutOfRange { index: usize, len: usize },

    /// The clock only moves forward.
    #[error("Cannot advance by a negative amount ({days}d {hours}h {minutes}m)")]
    NegativeDelta { days: i32, hours: i32, minutes: i32 },

    /// A calendar field left its integer range.
    #[error("Calendar field overflowed")]
    Overflow,

    /// A month must have at least one day.
    #[error("Invalid month {name:?}: {days} days (must be at least 1)")]
    InvalidMonth { name: String, days: u32 },

    /// Real seconds per game hour must be finite and positive.
    #[error("Invalid real seconds per game hour: {0}")]
    InvalidTickRate(f64),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CalendarError::EmptyCalendar.to_string(),
            "Calendar has no months configured"
        );
        assert_eq!(
            CalendarError::MonthIndexOutOfRange { index: 12, len: 12 }.to_string(),
            "Month index 12 is out of range for 12 months"
        );
        assert_eq!(
            CalendarError::NegativeDelta {
                days: 0,
                hours: -2,
                minutes: 0
            }
            .to_string(),
            "Cannot advance by a negative amount (0d -2h 0m)"
        );
        assert_eq!(
            CalendarError::InvalidMonth {
                name: "Void".to_owned(),
                days: 0
            }
            .to_string(),
            r#"Invalid month "Void": 0 days (must be at least 1)"#
        );
    }

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_START_YEAR, 2025);
        assert_eq!(DEFAULT_DAYS_OF_WEEK.len(), DEFAULT_WEEK_LENGTH);
        assert_eq!(DEFAULT_MONTHS.len(), 12);
        assert_eq!(INVALID_DAY, "Invalid Day");
        assert_eq!(UNKNOWN, "Unknown");
    }

    #[test]
    fn test_full_year_through_public_api() {
        let clock = CalendarClock::new(CalendarConfiguration::default());
        let mut months_seen = Vec::new();
        for _ in 0..12 {
            months_seen.push(clock.month_name());
            let days = clock.configuration().months[clock.month_index()].days_in_month();
            clock.advance(i32::try_from(days).unwrap(), 0, 0).unwrap();
        }
        assert_eq!(months_seen.first().map(String::as_str), Some("January"));
        assert_eq!(months_seen.last().map(String::as_str), Some("December"));
        assert_eq!(clock.year(), 2026);
        assert_eq!(clock.month_name(), "January");
        assert_eq!(clock.day(), 1);
    }
}

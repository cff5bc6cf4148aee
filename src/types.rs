use crate::CalendarError;
use crate::consts::{
    DEFAULT_DAYS_OF_WEEK, DEFAULT_MONTHS, DEFAULT_REAL_SECONDS_PER_GAME_HOUR, DEFAULT_START_YEAR,
    DEFAULT_WEEK_LENGTH, MINUTES_PER_HOUR,
};
use crate::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A named month and its length in days.
/// The day count is guaranteed to be non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize)]
#[display(fmt = "{} ({} days)", name, days_in_month)]
pub struct MonthDefinition {
    name: String,
    days_in_month: u32,
}

#[derive(Deserialize)]
struct RawMonth {
    name: String,
    days_in_month: u32,
}

impl MonthDefinition {
    /// Creates a new month, validating that it has at least one day
    ///
    /// # Errors
    /// Returns `CalendarError::InvalidMonth` if `days_in_month` is 0.
    pub fn new(name: impl Into<String>, days_in_month: u32) -> Result<Self, CalendarError> {
        let name = name.into();
        if days_in_month == 0 {
            return Err(CalendarError::InvalidMonth {
                name,
                days: days_in_month,
            });
        }
        Ok(Self {
            name,
            days_in_month,
        })
    }

    /// Returns the month name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of days in this month
    #[inline]
    pub const fn days_in_month(&self) -> u32 {
        self.days_in_month
    }
}

impl<'de> Deserialize<'de> for MonthDefinition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawMonth::deserialize(deserializer)?;
        Self::new(raw.name, raw.days_in_month).map_err(serde::de::Error::custom)
    }
}

/// Week layout, month list and pacing of a calendar clock.
///
/// `week_length` drives the weekday modulus while `days_of_week` is only used
/// for the name lookup, so the two may disagree under a custom calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfiguration {
    /// Replace the week and month layout with the built-in calendar at initialization
    pub use_default_calendar: bool,
    /// Weekday names in week order
    pub days_of_week: Vec<String>,
    /// Number of weekdays used by the day-name modulus
    pub week_length: usize,
    /// Months in year order
    pub months: Vec<MonthDefinition>,
    /// Year the clock starts at
    pub start_year: i32,
    /// Wall-clock seconds that make up one in-game hour
    pub real_seconds_per_game_hour: f64,
    /// Log boundary crossings at info level instead of debug
    pub print_debug: bool,
}

impl Default for CalendarConfiguration {
    fn default() -> Self {
        Self {
            use_default_calendar: true,
            days_of_week: Vec::new(),
            week_length: 0,
            months: Vec::new(),
            start_year: DEFAULT_START_YEAR,
            real_seconds_per_game_hour: DEFAULT_REAL_SECONDS_PER_GAME_HOUR,
            print_debug: false,
        }
    }
}

impl CalendarConfiguration {
    /// The built-in calendar as an explicit custom configuration
    /// (`use_default_calendar` cleared).
    pub fn gregorian() -> Self {
        let mut config = Self {
            use_default_calendar: false,
            ..Self::default()
        };
        config.apply_default_calendar();
        config
    }

    /// Creates a custom calendar from its week and month layout
    pub fn custom(
        days_of_week: Vec<String>,
        week_length: usize,
        months: Vec<MonthDefinition>,
    ) -> Self {
        Self {
            use_default_calendar: false,
            days_of_week,
            week_length,
            months,
            ..Self::default()
        }
    }

    /// Loads a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns `CalendarError::Config` if the JSON is malformed or a month is invalid.
    pub fn from_json(json: &str) -> Result<Self, CalendarError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Overwrites the week and month layout with the built-in calendar
    pub(crate) fn apply_default_calendar(&mut self) {
        self.days_of_week = DEFAULT_DAYS_OF_WEEK
            .iter()
            .map(|day| (*day).to_owned())
            .collect();
        self.week_length = DEFAULT_WEEK_LENGTH;
        self.months = DEFAULT_MONTHS
            .iter()
            .map(|(name, days)| MonthDefinition {
                name: (*name).to_owned(),
                days_in_month: *days,
            })
            .collect();
    }

    /// Real time between two ticks: one in-game minute.
    ///
    /// # Errors
    /// Returns `CalendarError::InvalidTickRate` unless `real_seconds_per_game_hour`
    /// is finite and positive.
    pub fn tick_interval(&self) -> Result<Duration, CalendarError> {
        tick_interval_for(self.real_seconds_per_game_hour)
    }
}

pub(crate) fn tick_interval_for(real_seconds_per_game_hour: f64) -> Result<Duration, CalendarError> {
    if !real_seconds_per_game_hour.is_finite() || real_seconds_per_game_hour <= 0.0 {
        return Err(CalendarError::InvalidTickRate(real_seconds_per_game_hour));
    }
    let seconds = real_seconds_per_game_hour / f64::from(MINUTES_PER_HOUR);
    match Duration::try_from_secs_f64(seconds) {
        Ok(interval) if !interval.is_zero() => Ok(interval),
        _ => Err(CalendarError::InvalidTickRate(real_seconds_per_game_hour)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_new_valid() {
        let month = MonthDefinition::new("Frostfall", 40).unwrap();
        assert_eq!(month.name(), "Frostfall");
        assert_eq!(month.days_in_month(), 40);
    }

    #[test]
    fn test_month_new_invalid_zero() {
        let result = MonthDefinition::new("Void", 0);
        assert!(matches!(
            result,
            Err(CalendarError::InvalidMonth { days: 0, .. })
        ));
    }

    #[test]
    fn test_month_display() {
        let month = MonthDefinition::new("April", 30).unwrap();
        assert_eq!(month.to_string(), "April (30 days)");
    }

    #[test]
    fn test_month_serde_rejects_zero_days() {
        let json = r#"{"name":"Void","days_in_month":0}"#;
        let result: Result<MonthDefinition, _> = serde_json::from_str(json);
        assert!(result.is_err());

        let json = r#"{"name":"Harvest","days_in_month":36}"#;
        let month: MonthDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(month.days_in_month(), 36);
    }

    #[test]
    fn test_default_configuration() {
        let config = CalendarConfiguration::default();
        assert!(config.use_default_calendar);
        assert!(config.months.is_empty());
        assert!(config.days_of_week.is_empty());
        assert_eq!(config.start_year, 2025);
        assert!((config.real_seconds_per_game_hour - 60.0).abs() < f64::EPSILON);
        assert!(!config.print_debug);
    }

    #[test]
    fn test_gregorian_layout() {
        let config = CalendarConfiguration::gregorian();
        assert!(!config.use_default_calendar);
        assert_eq!(config.week_length, 7);
        assert_eq!(config.days_of_week.first().map(String::as_str), Some("Sun"));
        assert_eq!(config.days_of_week.last().map(String::as_str), Some("Sat"));

        let days: Vec<u32> = config
            .months
            .iter()
            .map(MonthDefinition::days_in_month)
            .collect();
        assert_eq!(days, [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]);
        assert_eq!(days.iter().sum::<u32>(), 365);
        assert_eq!(config.months[1].name(), "February");
    }

    #[test]
    fn test_from_json_partial() {
        let json = r#"{
            "use_default_calendar": false,
            "days_of_week": ["Moonday", "Starday", "Sunday"],
            "week_length": 3,
            "months": [
                {"name": "Dawn", "days_in_month": 10},
                {"name": "Dusk", "days_in_month": 12}
            ],
            "start_year": 1
        }"#;
        let config = CalendarConfiguration::from_json(json).unwrap();
        assert!(!config.use_default_calendar);
        assert_eq!(config.week_length, 3);
        assert_eq!(config.months.len(), 2);
        assert_eq!(config.start_year, 1);
        // Unspecified fields fall back to defaults
        assert!((config.real_seconds_per_game_hour - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_json_invalid() {
        let result = CalendarConfiguration::from_json("{ not json");
        assert!(matches!(result, Err(CalendarError::Config(_))));

        let json = r#"{"months": [{"name": "Void", "days_in_month": 0}]}"#;
        let result = CalendarConfiguration::from_json(json);
        assert!(matches!(result, Err(CalendarError::Config(_))));
    }

    #[test]
    fn test_tick_interval() {
        let config = CalendarConfiguration::default();
        assert_eq!(config.tick_interval().unwrap(), Duration::from_secs(1));

        let config = CalendarConfiguration {
            real_seconds_per_game_hour: 3.0,
            ..CalendarConfiguration::default()
        };
        assert_eq!(config.tick_interval().unwrap(), Duration::from_millis(50));
    }

    #[test]
    fn test_tick_interval_invalid_rates() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = tick_interval_for(rate);
            assert!(
                matches!(result, Err(CalendarError::InvalidTickRate(_))),
                "rate {rate} should be rejected"
            );
        }
    }
}

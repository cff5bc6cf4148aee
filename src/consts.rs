/// Minutes in one in-game hour
pub const MINUTES_PER_HOUR: u32 = 60;

/// Hours in one in-game day
pub const HOURS_PER_DAY: u32 = 24;

/// First day of a month (days are 1-based)
pub const MIN_DAY: u32 = 1;

/// Year the clock starts at unless configured otherwise
pub const DEFAULT_START_YEAR: i32 = 2025;

/// Hour a freshly reset calendar starts at (noon)
pub const DEFAULT_START_HOUR: u32 = 12;

/// Real seconds per in-game hour unless configured otherwise
pub const DEFAULT_REAL_SECONDS_PER_GAME_HOUR: f64 = 60.0;

/// Number of named weekdays in the default calendar
pub const DEFAULT_WEEK_LENGTH: usize = 7;

/// Weekday abbreviations of the default calendar, in week order
pub const DEFAULT_DAYS_OF_WEEK: [&str; DEFAULT_WEEK_LENGTH] =
    ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Months of the default calendar with their day counts.
/// February is fixed at 28 days, there is no leap-year rule.
pub const DEFAULT_MONTHS: [(&str, u32); 12] = [
    ("January", 31),
    ("February", 28),
    ("March", 31),
    ("April", 30),
    ("May", 31),
    ("June", 30),
    ("July", 31),
    ("August", 31),
    ("September", 30),
    ("October", 31),
    ("November", 30),
    ("December", 31),
];

/// Returned by day-name lookups when no weekdays are configured
pub const INVALID_DAY: &str = "Invalid Day";

/// Returned by lookups whose index falls outside the configured names
pub const UNKNOWN: &str = "Unknown";

/// Time format separator (`HH:MM`)
pub const TIME_SEPARATOR: char = ':';

use crate::CalendarError;
use crate::consts::{DEFAULT_START_HOUR, HOURS_PER_DAY, MIN_DAY, MINUTES_PER_HOUR};
use crate::events::CalendarEvent;
use crate::prelude::*;
use crate::types::MonthDefinition;

/// Current position of a calendar clock.
///
/// Once normalized: `minute < 60`, `hour < 24`, `1 <= day <= days_in_month`
/// and `month_index < months.len()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display(
    fmt = "{year}/{}/{day} {hour:02}:{minute:02}",
    "month_index + 1"
)]
pub struct CalendarState {
    pub year: i32,
    pub month_index: usize,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

impl Default for CalendarState {
    fn default() -> Self {
        Self::starting_at(crate::consts::DEFAULT_START_YEAR)
    }
}

impl CalendarState {
    /// Noon on the first day of the first month of `year`
    pub const fn starting_at(year: i32) -> Self {
        Self {
            year,
            month_index: 0,
            day: MIN_DAY,
            hour: DEFAULT_START_HOUR,
            minute: 0,
        }
    }

    /// Where this state ends up after adding the deltas and carrying overflow
    /// minute -> hour -> day -> month -> year. `self` is not modified.
    ///
    /// # Errors
    /// - `CalendarError::NegativeDelta` if any delta is negative
    /// - `CalendarError::EmptyCalendar` if `months` is empty
    /// - `CalendarError::MonthIndexOutOfRange` if the state points past `months`
    /// - `CalendarError::Overflow` if a field would leave its integer range
    pub fn advanced(
        &self,
        months: &[MonthDefinition],
        days: i32,
        hours: i32,
        minutes: i32,
    ) -> Result<Self, CalendarError> {
        let mut next = *self;
        next.carry(months, days, hours, minutes, &mut |_| {})?;
        Ok(next)
    }

    /// Adds the deltas, carries overflow and hands every boundary crossed to
    /// `on_event` as it happens, in chronological order.
    ///
    /// The deltas are checked in full before the first event is emitted, so on
    /// error the state is untouched and `on_event` is never called.
    ///
    /// # Errors
    /// Same as [`advanced`](Self::advanced).
    pub fn advance(
        &mut self,
        months: &[MonthDefinition],
        days: i32,
        hours: i32,
        minutes: i32,
        mut on_event: impl FnMut(CalendarEvent),
    ) -> Result<(), CalendarError> {
        let end = self.advanced(months, days, hours, minutes)?;
        self.carry(months, days, hours, minutes, &mut on_event)?;
        debug_assert_eq!(*self, end);
        Ok(())
    }

    fn carry(
        &mut self,
        months: &[MonthDefinition],
        days: i32,
        hours: i32,
        minutes: i32,
        on_event: &mut dyn FnMut(CalendarEvent),
    ) -> Result<(), CalendarError> {
        let (Ok(d), Ok(h), Ok(m)) = (
            u32::try_from(days),
            u32::try_from(hours),
            u32::try_from(minutes),
        ) else {
            return Err(CalendarError::NegativeDelta {
                days,
                hours,
                minutes,
            });
        };
        if months.is_empty() {
            return Err(CalendarError::EmptyCalendar);
        }
        if self.month_index >= months.len() {
            return Err(CalendarError::MonthIndexOutOfRange {
                index: self.month_index,
                len: months.len(),
            });
        }

        let mut next = *self;
        next.minute = next.minute.checked_add(m).ok_or(CalendarError::Overflow)?;
        next.hour = next.hour.checked_add(h).ok_or(CalendarError::Overflow)?;
        next.day = next.day.checked_add(d).ok_or(CalendarError::Overflow)?;
        next.normalize(months, on_event)?;
        *self = next;
        Ok(())
    }

    fn normalize(
        &mut self,
        months: &[MonthDefinition],
        on_event: &mut dyn FnMut(CalendarEvent),
    ) -> Result<(), CalendarError> {
        while self.minute >= MINUTES_PER_HOUR {
            self.minute -= MINUTES_PER_HOUR;
            self.hour = self.hour.checked_add(1).ok_or(CalendarError::Overflow)?;
            on_event(CalendarEvent::HourUpdated {
                hour: self.hour % HOURS_PER_DAY,
            });
        }

        while self.hour >= HOURS_PER_DAY {
            self.hour -= HOURS_PER_DAY;
            self.day = self.day.checked_add(1).ok_or(CalendarError::Overflow)?;
            on_event(CalendarEvent::DayUpdated {
                month_name: months[self.month_index].name().to_owned(),
                day: self.day,
            });
        }

        while self.day > months[self.month_index].days_in_month() {
            let previous_month_index = self.month_index;
            self.day -= months[previous_month_index].days_in_month();
            self.month_index += 1;

            let new_year = self.month_index >= months.len();
            if new_year {
                self.month_index = 0;
                self.year = self.year.checked_add(1).ok_or(CalendarError::Overflow)?;
            }

            on_event(CalendarEvent::MonthUpdated {
                month_name: months[self.month_index].name().to_owned(),
                previous_month_index,
            });
            if new_year {
                on_event(CalendarEvent::YearUpdated { year: self.year });
            }
        }
        Ok(())
    }

    /// Whether every field is within range for `months`
    pub fn is_normalized(&self, months: &[MonthDefinition]) -> bool {
        self.minute < MINUTES_PER_HOUR
            && self.hour < HOURS_PER_DAY
            && months
                .get(self.month_index)
                .is_some_and(|month| (MIN_DAY..=month.days_in_month()).contains(&self.day))
    }
}

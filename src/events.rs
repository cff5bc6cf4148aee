use crate::prelude::*;
use std::collections::BTreeMap;

/// A unit rollover (or tick) reported by the calendar clock.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum CalendarEvent {
    /// A tick advanced the clock; carries the minute after the advance
    #[display(fmt = "minute {minute:02}")]
    MinuteUpdated { minute: u32 },
    /// The minute counter carried into the hour; carries the hour on the 24-hour dial
    #[display(fmt = "hour {hour:02}")]
    HourUpdated { hour: u32 },
    /// The hour counter carried into the day; `month_name` is the month the day was counted against
    #[display(fmt = "day {day} of {month_name}")]
    DayUpdated { month_name: String, day: u32 },
    /// A month was entered. The name is the new month's, the index is the month just left.
    #[display(fmt = "month {month_name} (left index {previous_month_index})")]
    MonthUpdated {
        month_name: String,
        previous_month_index: usize,
    },
    /// The month list wrapped around
    #[display(fmt = "year {year}")]
    YearUpdated { year: i32 },
}

impl CalendarEvent {
    /// The kind listeners subscribe to
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::MinuteUpdated { .. } => EventKind::Minute,
            Self::HourUpdated { .. } => EventKind::Hour,
            Self::DayUpdated { .. } => EventKind::Day,
            Self::MonthUpdated { .. } => EventKind::Month,
            Self::YearUpdated { .. } => EventKind::Year,
        }
    }
}

/// Event kinds, one per calendar unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum EventKind {
    #[display(fmt = "minute")]
    Minute,
    #[display(fmt = "hour")]
    Hour,
    #[display(fmt = "day")]
    Day,
    #[display(fmt = "month")]
    Month,
    #[display(fmt = "year")]
    Year,
}

/// Identifies a registered listener so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into)]
pub struct ListenerId(u64);

/// Callback invoked with each event of the kind it was registered for
pub type Listener = Box<dyn FnMut(&CalendarEvent) + Send>;

/// Observer list keyed by event kind.
///
/// Listeners of one kind are invoked synchronously in registration order.
#[derive(Default)]
pub struct EventBus {
    listeners: BTreeMap<EventKind, Vec<(ListenerId, Listener)>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for events of `kind`
    pub fn subscribe(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.entry(kind).or_default().push((id, listener));
        id
    }

    /// Removes a listener. Returns false if the id was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        for listeners in self.listeners.values_mut() {
            if let Some(pos) = listeners.iter().position(|(lid, _)| *lid == id) {
                listeners.remove(pos);
                return true;
            }
        }
        false
    }

    /// Number of listeners registered for `kind`
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Delivers `event` to every listener of its kind
    pub fn publish(&mut self, event: &CalendarEvent) {
        if let Some(listeners) = self.listeners.get_mut(&event.kind()) {
            for (_, listener) in listeners.iter_mut() {
                listener(event);
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: BTreeMap<EventKind, usize> = self
            .listeners
            .iter()
            .map(|(kind, listeners)| (*kind, listeners.len()))
            .collect();
        f.debug_struct("EventBus")
            .field("listeners", &counts)
            .field("next_id", &self.next_id)
            .finish()
    }
}

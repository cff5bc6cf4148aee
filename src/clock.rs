use crate::CalendarError;
use crate::consts::{INVALID_DAY, MIN_DAY, TIME_SEPARATOR, UNKNOWN};
use crate::events::{CalendarEvent, EventBus, EventKind, ListenerId};
use crate::state::CalendarState;
use crate::tick::{SubscriptionHandle, TickSource};
use crate::types::{CalendarConfiguration, tick_interval_for};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

/// Layout and position, kept behind one lock so a reader never sees a
/// half-normalized state.
#[derive(Debug, Default)]
struct ClockCore {
    config: CalendarConfiguration,
    state: CalendarState,
}

impl ClockCore {
    fn day_name(&self) -> String {
        let days = &self.config.days_of_week;
        if days.is_empty() {
            return INVALID_DAY.to_owned();
        }
        self.state
            .day
            .checked_sub(MIN_DAY)
            .zip(u32::try_from(self.config.week_length).ok())
            .and_then(|(offset, week)| offset.checked_rem(week))
            .and_then(|index| days.get(usize::try_from(index).ok()?))
            .map_or_else(|| UNKNOWN.to_owned(), Clone::clone)
    }

    fn month_name(&self) -> String {
        self.config
            .months
            .get(self.state.month_index)
            .map_or_else(|| UNKNOWN.to_owned(), |month| month.name().to_owned())
    }
}

/// State shared between a clock and its tick callback.
///
/// Lock order is `bus` then `core`. The bus lock is held for a whole dispatch
/// so listeners see events in commit order; `core` is only held while
/// reading or committing.
#[derive(Debug, Default)]
struct ClockShared {
    core: Mutex<ClockCore>,
    bus: Mutex<EventBus>,
}

impl ClockShared {
    fn core(&self) -> MutexGuard<'_, ClockCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bus(&self) -> MutexGuard<'_, EventBus> {
        self.bus.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Commits the advanced state, then replays the carry from the old state
    /// and publishes each boundary as it is crossed. Returns the new state.
    fn advance(
        &self,
        bus: &mut EventBus,
        days: i32,
        hours: i32,
        minutes: i32,
    ) -> Result<CalendarState, CalendarError> {
        let (mut replay, to, config) = {
            let mut core = self.core();
            let to = core.state.advanced(&core.config.months, days, hours, minutes)?;
            if to == core.state {
                return Ok(to);
            }
            let from = std::mem::replace(&mut core.state, to);
            (from, to, core.config.clone())
        };
        replay.advance(&config.months, days, hours, minutes, |event| {
            report(&config, &event, &to);
            bus.publish(&event);
        })?;
        Ok(to)
    }

    fn tick(&self) -> Result<(), CalendarError> {
        let mut bus = self.bus();
        let state = self.advance(&mut bus, 0, 0, 1)?;
        let event = CalendarEvent::MinuteUpdated {
            minute: state.minute,
        };
        report(&self.core().config, &event, &state);
        bus.publish(&event);
        Ok(())
    }
}

fn report(config: &CalendarConfiguration, event: &CalendarEvent, state: &CalendarState) {
    if config.print_debug {
        log::info!("[Calendar] {event} at {state}");
    } else {
        log::debug!("[Calendar] {event} at {state}");
    }
}

/// In-game calendar clock.
///
/// Holds the calendar layout and the current date/time, advances on ticks
/// from an attached [`TickSource`] (one in-game minute per tick) and notifies
/// listeners whenever a unit rolls over.
///
/// Listeners run after the new position is committed and may query the clock.
/// They must not advance it or (un)subscribe from inside a notification.
pub struct CalendarClock {
    shared: Arc<ClockShared>,
    tick_source: Option<Arc<dyn TickSource>>,
    subscription: Option<SubscriptionHandle>,
}

impl Default for CalendarClock {
    /// A clock with no calendar; queries return sentinels and `advance` fails
    /// until [`initialize`](Self::initialize) is called.
    fn default() -> Self {
        let core = ClockCore {
            config: CalendarConfiguration {
                use_default_calendar: false,
                ..CalendarConfiguration::default()
            },
            ..ClockCore::default()
        };
        Self {
            shared: Arc::new(ClockShared {
                core: Mutex::new(core),
                bus: Mutex::default(),
            }),
            tick_source: None,
            subscription: None,
        }
    }
}
impl CalendarClock {
    /// Creates a clock and initializes it from `config`
    pub fn new(config: CalendarConfiguration) -> Self {
        let mut clock = Self::default();
        clock.core().state = CalendarState::starting_at(config.start_year);
        clock.initialize(config);
        clock
    }

    /// Creates a clock positioned at `state`.
    /// A configuration with `use_default_calendar` set still resets the state.
    pub fn with_state(config: CalendarConfiguration, state: CalendarState) -> Self {
        let mut clock = Self::default();
        clock.core().state = state;
        clock.initialize(config);
        clock
    }

    /// Attaches the tick source used by [`start`](Self::start)
    #[must_use]
    pub fn with_tick_source(mut self, source: Arc<dyn TickSource>) -> Self {
        self.set_tick_source(source);
        self
    }

    /// Replaces the tick source. A running clock is stopped first.
    pub fn set_tick_source(&mut self, source: Arc<dyn TickSource>) {
        self.stop();
        self.tick_source = Some(source);
    }

    /// Applies `config`.
    ///
    /// With `use_default_calendar` the week and months are replaced by the
    /// built-in calendar and the clock is reset to noon on the first of the
    /// first month of `start_year`. Otherwise the layout is taken as given and
    /// the current state is kept. No events are published.
    pub fn initialize(&mut self, mut config: CalendarConfiguration) {
        let mut core = self.core();
        if config.use_default_calendar {
            config.apply_default_calendar();
            core.state = CalendarState::starting_at(config.start_year);
        }
        log::debug!(
            "[Calendar] Initialized with {} months, {} weekdays at {}",
            config.months.len(),
            config.days_of_week.len(),
            core.state
        );
        core.config = config;
    }

    /// Moves the clock forward and publishes every boundary crossed, in order.
    ///
    /// # Errors
    /// - `CalendarError::NegativeDelta` if any delta is negative
    /// - `CalendarError::EmptyCalendar` if no months are configured
    /// - `CalendarError::MonthIndexOutOfRange` if the state points past the month list
    /// - `CalendarError::Overflow` if a field would leave its integer range
    ///
    /// The state is unchanged and nothing is published when an error is returned.
    pub fn advance(&self, days: i32, hours: i32, minutes: i32) -> Result<(), CalendarError> {
        let mut bus = self.shared.bus();
        self.shared.advance(&mut bus, days, hours, minutes)?;
        Ok(())
    }

    /// Does what one tick does: advance one minute, then publish `MinuteUpdated`.
    ///
    /// # Errors
    /// Same as [`advance`](Self::advance).
    pub fn tick(&self) -> Result<(), CalendarError> {
        self.shared.tick()
    }

    /// Starts ticking at one in-game minute per `real_seconds_per_game_hour / 60`.
    ///
    /// No-op if already running or if no tick source is attached (or it refuses
    /// the registration).
    ///
    /// # Errors
    /// Returns `CalendarError::InvalidTickRate` if the configured rate cannot
    /// produce a tick interval.
    pub fn start(&mut self) -> Result<(), CalendarError> {
        if self.subscription.is_some() {
            return Ok(());
        }
        let Some(source) = &self.tick_source else {
            log::warn!("[Calendar] No tick source attached, clock not started");
            return Ok(());
        };
        let interval = self.core().config.tick_interval()?;

        let shared = Arc::downgrade(&self.shared);
        self.subscription = source.register_repeating(interval, Box::new(move || on_tick(&shared)));
        match self.subscription {
            Some(handle) => log::debug!("[Calendar] Started ({handle}, every {interval:?})"),
            None => log::warn!("[Calendar] Tick source refused registration"),
        }
        Ok(())
    }

    /// Cancels the tick subscription. No-op if not running.
    pub fn stop(&mut self) {
        if let Some(handle) = self.subscription.take() {
            if let Some(source) = &self.tick_source {
                source.cancel(handle);
            }
            log::debug!("[Calendar] Stopped ({handle})");
        }
    }

    pub const fn is_running(&self) -> bool {
        self.subscription.is_some()
    }

    /// Registers `listener` for events of `kind`
    pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&CalendarEvent) + Send + 'static,
    {
        self.shared.bus().subscribe(kind, Box::new(listener))
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.shared.bus().unsubscribe(id)
    }

    /// Name of the current weekday, `"Invalid Day"` without weekdays,
    /// `"Unknown"` if the weekday index misses the name list.
    pub fn day_name(&self) -> String {
        self.core().day_name()
    }

    /// Name of the current month, `"Unknown"` if the month index is invalid
    pub fn month_name(&self) -> String {
        self.core().month_name()
    }

    /// Current time as `HH:MM` on the 24-hour dial
    pub fn formatted_time(&self) -> String {
        let core = self.core();
        format!(
            "{:02}{TIME_SEPARATOR}{:02}",
            core.state.hour, core.state.minute
        )
    }

    /// Snapshot of the current date and time
    pub fn state(&self) -> CalendarState {
        self.core().state
    }

    pub fn year(&self) -> i32 {
        self.core().state.year
    }

    pub fn month_index(&self) -> usize {
        self.core().state.month_index
    }

    pub fn day(&self) -> u32 {
        self.core().state.day
    }

    pub fn hour(&self) -> u32 {
        self.core().state.hour
    }

    pub fn minute(&self) -> u32 {
        self.core().state.minute
    }

    /// Copy of the active configuration
    pub fn configuration(&self) -> CalendarConfiguration {
        self.core().config.clone()
    }

    pub fn real_seconds_per_game_hour(&self) -> f64 {
        self.core().config.real_seconds_per_game_hour
    }

    /// Changes the pace. A running clock keeps its old pace until restarted.
    ///
    /// # Errors
    /// Returns `CalendarError::InvalidTickRate` unless `seconds` is finite and positive.
    pub fn set_real_seconds_per_game_hour(&self, seconds: f64) -> Result<(), CalendarError> {
        tick_interval_for(seconds)?;
        self.core().config.real_seconds_per_game_hour = seconds;
        Ok(())
    }

    /// Real time between two ticks
    ///
    /// # Errors
    /// Returns `CalendarError::InvalidTickRate` if the configured rate is invalid.
    pub fn tick_interval(&self) -> Result<Duration, CalendarError> {
        self.core().config.tick_interval()
    }

    fn core(&self) -> MutexGuard<'_, ClockCore> {
        self.shared.core()
    }
}

fn on_tick(shared: &Weak<ClockShared>) {
    // The clock is gone; the source has not processed the cancel yet.
    let Some(shared) = shared.upgrade() else {
        return;
    };
    if let Err(err) = shared.tick() {
        log::error!("[Calendar] Tick failed: {err}");
    }
}

impl Drop for CalendarClock {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for CalendarClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = f.debug_struct("CalendarClock");
        out.field("core", &*self.core());
        // Busy while a dispatch is running, possibly on this thread.
        if let Ok(bus) = self.shared.bus.try_lock() {
            out.field("bus", &*bus);
        }
        out.field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Source of the current local time. Date answers with missing parts fall
/// back to today; uploads are stamped with the current moment.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always reports the same moment. Used by tests and replays.
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Midnight on `date`.
    pub fn on(date: NaiveDate) -> Self {
        Self(date.and_time(chrono::NaiveTime::MIN))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

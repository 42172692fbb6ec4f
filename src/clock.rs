//! Civil time for every date-keyed read and write.
//!
//! All "today" computations (task-log dates, question-cache dates, the page header)
//! go through `TimeProvider`, which converts the current instant into one configured
//! IANA timezone. The host's local clock setting is never consulted.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests.
#[cfg(test)]
pub struct FixedClock(std::sync::Mutex<DateTime<Utc>>);

#[cfg(test)]
impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(std::sync::Mutex::new(at))
    }

    pub fn set(&self, at: DateTime<Utc>) {
        if let Ok(mut g) = self.0.lock() {
            *g = at;
        }
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0.lock().map(|g| *g).unwrap_or_else(|p| *p.into_inner())
    }
}

#[derive(Clone)]
pub struct TimeProvider {
    tz: Tz,
    clock: Arc<dyn Clock>,
}

impl TimeProvider {
    pub fn new(tz: Tz, clock: Arc<dyn Clock>) -> Self {
        Self { tz, clock }
    }

    pub fn system(tz: Tz) -> Self {
        Self::new(tz, Arc::new(SystemClock))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn now(&self) -> DateTime<Tz> {
        self.clock.now_utc().with_timezone(&self.tz)
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Current time of day as `HH:MM:SS`.
    pub fn time_of_day(&self) -> String {
        self.now().format(TIME_FORMAT).to_string()
    }

    /// `YYYY-MM-DD HH:MM:SS`; lexicographic order equals chronological order.
    pub fn timestamp(&self) -> String {
        self.now().format(TIMESTAMP_FORMAT).to_string()
    }

    /// Long form used for the page header, e.g. `Friday, October 16, 2026`.
    pub fn today_header(&self) -> String {
        self.now().format("%A, %B %d, %Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Offset, TimeZone};

    fn provider_at(y: i32, m: u32, d: u32, h: u32) -> TimeProvider {
        let at = Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap();
        TimeProvider::new(chrono_tz::America::Los_Angeles, Arc::new(FixedClock::new(at)))
    }

    #[test]
    fn follows_standard_and_daylight_offsets() {
        let winter = provider_at(2026, 1, 15, 12);
        let summer = provider_at(2026, 7, 15, 12);
        assert_eq!(winter.now().offset().fix().local_minus_utc(), -8 * 3600);
        assert_eq!(summer.now().offset().fix().local_minus_utc(), -7 * 3600);
        assert_eq!(winter.time_of_day(), "04:00:00");
        assert_eq!(summer.time_of_day(), "05:00:00");
    }

    #[test]
    fn civil_date_lags_utc_in_the_evening() {
        // 03:00 UTC on Saturday is still Friday evening in Los Angeles.
        let p = provider_at(2026, 10, 17, 3);
        assert_eq!(p.today().to_string(), "2026-10-16");
        assert_eq!(p.today().weekday(), chrono::Weekday::Fri);
        assert_eq!(p.timestamp(), "2026-10-16 20:00:00");
        assert_eq!(p.today_header(), "Friday, October 16, 2026");
    }

    #[test]
    fn fixed_clock_can_advance() {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 20, 0, 0).unwrap()));
        let p = TimeProvider::new(chrono_tz::America::Los_Angeles, clock.clone());
        assert_eq!(p.today().to_string(), "2026-03-02");
        clock.set(Utc.with_ymd_and_hms(2026, 3, 3, 20, 0, 0).unwrap());
        assert_eq!(p.today().to_string(), "2026-03-03");
    }
}

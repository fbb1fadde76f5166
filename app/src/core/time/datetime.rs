use std::ops::{Add, Sub};

use tokio::task_local;

use super::Duration;

task_local! {
    pub static FIXED_NOW: DateTime;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DateTime {
    delegate: chrono::DateTime<chrono::Local>,
}

impl DateTime {
    fn new<T: chrono::TimeZone>(delegate: chrono::DateTime<T>) -> Self {
        Self {
            delegate: delegate.with_timezone(&chrono::Local),
        }
    }

    pub fn now() -> Self {
        FIXED_NOW
            .try_with(|t| *t)
            .unwrap_or_else(|_| chrono::Local::now().into())
    }

    pub fn from_iso(iso8601: &str) -> anyhow::Result<Self> {
        Ok(chrono::DateTime::parse_from_rfc3339(iso8601)?.into())
    }

    pub fn millis(&self) -> i64 {
        self.delegate.timestamp_millis()
    }

    pub fn elapsed_since(&self, since: Self) -> Duration {
        Duration::new(self.delegate - since.delegate)
    }
}

impl Add<Duration> for DateTime {
    type Output = DateTime;

    fn add(self, rhs: Duration) -> Self::Output {
        Self::new(self.delegate + rhs.delegate)
    }
}

impl Sub<Duration> for DateTime {
    type Output = DateTime;

    fn sub(self, rhs: Duration) -> Self::Output {
        Self::new(self.delegate - rhs.delegate)
    }
}

impl<T: chrono::TimeZone> From<chrono::DateTime<T>> for DateTime {
    fn from(val: chrono::DateTime<T>) -> Self {
        DateTime::new(val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::t;

    #[test]
    fn millis_since_epoch() {
        let dt = DateTime::from_iso("1970-01-01T01:00:01.250+01:00").unwrap();

        assert_eq!(dt.millis(), 1_250);
    }

    #[test]
    fn elapsed_since_is_signed() {
        let start = DateTime::from_iso("2024-07-01T14:00:00Z").unwrap();
        let end = DateTime::from_iso("2024-07-01T14:10:00Z").unwrap();

        assert_eq!(end.elapsed_since(start), t!(10 minutes));
        assert_eq!(start.elapsed_since(end).as_minutes_f64(), -10.0);
    }

    #[tokio::test]
    async fn now_can_be_fixed_per_task() {
        let fixed = DateTime::from_iso("2024-07-01T14:00:00Z").unwrap();

        let now = FIXED_NOW.scope(fixed, async { DateTime::now() }).await;

        assert_eq!(now, fixed);
    }
}

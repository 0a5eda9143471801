use chrono::{NaiveDate, Utc};

#[cfg(any(test, feature = "mocks"))]
use mockall::automock;

/// Source of the processing date used to partition log objects.
#[cfg_attr(any(test, feature = "mocks"), automock)]
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Current calendar date in UTC.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

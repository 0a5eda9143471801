use std::fmt;

use chrono::NaiveDate;

pub const DEFAULT_PREFIX: &str = "website-data";
pub const LOG_FILE_NAME: &str = "traffic.log";

/// Strips leading and trailing `/` from a configured key prefix. A prefix
/// that is empty after trimming means "use the default".
pub fn normalize_prefix(raw: &str) -> Option<String> {
    let trimmed = raw.trim_matches('/');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Object key of the daily traffic log: `<prefix>/<YYYY-MM-DD>/traffic.log`.
///
/// Every invocation on the same date maps to the same key, so a later write
/// replaces the earlier object.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LogKey(String);

impl LogKey {
    pub fn for_date(date: NaiveDate) -> Self {
        Self::with_prefix(DEFAULT_PREFIX, date)
    }

    pub fn with_prefix(prefix: &str, date: NaiveDate) -> Self {
        LogKey(format!(
            "{}/{}/{}",
            prefix,
            date.format("%Y-%m-%d"),
            LOG_FILE_NAME
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

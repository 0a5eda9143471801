use std::env;

use crate::{
    traffic::{normalize_prefix, DEFAULT_PREFIX},
    Error,
};

pub const BUCKET_NAME_VAR: &str = "BUCKET_NAME";
pub const KEY_PREFIX_VAR: &str = "LOG_KEY_PREFIX";

/// Consumer settings, read from the function environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub bucket_name: String,
    pub key_prefix: String,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bucket_name = lookup(BUCKET_NAME_VAR)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::MissingConfig {
                name: BUCKET_NAME_VAR.to_string(),
            })?;

        let key_prefix = lookup(KEY_PREFIX_VAR)
            .and_then(|v| normalize_prefix(&v))
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());

        Ok(Config {
            bucket_name,
            key_prefix,
        })
    }
}

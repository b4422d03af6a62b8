#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::NaiveDate;
use fuel_dashboard::models::DateRange;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Access to the process environment is serialized across tests and the
/// previous values are restored on drop, including on panic.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

/// Every variable the configuration loader reads, cleared.
pub const CLEAN_CONFIG_ENV: &[(&str, Option<&str>)] = &[
    ("DASHBOARD_CONFIG", None),
    ("REPOSITORY_TYPE", None),
    ("SYNTHETIC_SEED", None),
    ("WAREHOUSE_HOST", None),
    ("WAREHOUSE_PORT", None),
    ("WAREHOUSE_DATABASE", None),
    ("WAREHOUSE_USER", None),
    ("WAREHOUSE_AUTH", None),
    ("WAREHOUSE_PROFILE", None),
    ("WAREHOUSE_TOKEN", None),
    ("WAREHOUSE_MAX_RETRIES", None),
    ("DASHBOARD_HOSTED", None),
    ("AUTO_REFRESH_SECS", None),
];

/// `CLEAN_CONFIG_ENV` with `overrides` applied on top.
pub fn config_env<'a>(overrides: &[(&'a str, Option<&'a str>)]) -> Vec<(&'a str, Option<&'a str>)> {
    let mut changes: Vec<(&str, Option<&str>)> = CLEAN_CONFIG_ENV
        .iter()
        .filter(|(k, _)| !overrides.iter().any(|(o, _)| o == k))
        .copied()
        .collect();
    changes.extend_from_slice(overrides);
    changes
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The first week of 2024.
pub fn first_week() -> DateRange {
    DateRange::new(date(2024, 1, 1), date(2024, 1, 7)).unwrap()
}

struct ScopedEnv {
    previous: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let previous = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { previous }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.previous.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

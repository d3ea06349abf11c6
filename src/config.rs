use std::{env, path::PathBuf, str::FromStr, time::Duration};
use tracing::warn;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/varakalar.json";
const DEFAULT_DEBOUNCE_MS: u64 = 250;
const DEFAULT_PAGE_SIZE: usize = 25;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    /// Change notifications arriving within this window collapse into one refetch.
    pub refetch_debounce: Duration,
    pub export_page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            refetch_debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            export_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let data_path = lookup("APP_DATA_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_path);
        let debounce_ms = parse_or("REFETCH_DEBOUNCE_MS", &lookup, DEFAULT_DEBOUNCE_MS);
        let page_size = parse_or("EXPORT_PAGE_SIZE", &lookup, DEFAULT_PAGE_SIZE).max(1);

        Self {
            port: parse_or("PORT", &lookup, defaults.port),
            data_path,
            refetch_debounce: Duration::from_millis(debounce_ms),
            export_page_size: page_size,
        }
    }
}

fn parse_or<T: FromStr>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring invalid {key}={raw:?}");
            default
        }),
        None => default,
    }
}

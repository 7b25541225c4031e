use std::{env, fmt::Display, path::PathBuf, str::FromStr};
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/state.json";
const DEFAULT_SESSION_IDLE_SECS: u64 = 60 * 60 * 24;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    /// Sessions expire after this many seconds without a request.
    pub session_idle_secs: u64,
    pub secure_cookies: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
            secure_cookies: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parse_or("PORT", defaults.port),
            data_path: resolve_data_path(),
            session_idle_secs: parse_or("SESSION_IDLE_SECS", defaults.session_idle_secs),
            secure_cookies: parse_or("SESSION_SECURE", defaults.secure_cookies),
        }
    }
}

pub fn resolve_data_path() -> PathBuf {
    match env::var("APP_DATA_PATH") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_DATA_PATH),
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|err| {
            warn!("invalid {key} value {raw:?}: {err}, using default {default}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_on_garbage() {
        // Unique key so parallel tests never observe it.
        let key = "GOAL_TRACKER_TEST_PARSE_OR";
        unsafe { env::set_var(key, "not-a-number") };
        assert_eq!(parse_or(key, 42u16), 42);
        unsafe { env::set_var(key, " 9000 ") };
        assert_eq!(parse_or(key, 42u16), 9000);
        unsafe { env::remove_var(key) };
        assert_eq!(parse_or(key, 7u16), 7);
    }
}

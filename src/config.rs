use crate::error::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_WORDS_FILE: &str = "words/starter.csv";
pub const DEFAULT_LOG_FILE: &str = "vocab_drill.log";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_COUNTDOWN_SECS: u32 = 30;
pub const DEFAULT_AUTO_ADVANCE_SECS: u32 = 5;
pub const DEFAULT_LOW_TIME_SECS: u32 = 10;

/// Timer settings for one exercise session, in one-second ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub countdown_secs: u32,
    pub auto_advance_secs: u32,
    pub low_time_secs: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            auto_advance_secs: DEFAULT_AUTO_ADVANCE_SECS,
            low_time_secs: DEFAULT_LOW_TIME_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceBackend {
    Http { base_url: String },
    Local { words_file: PathBuf },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: ServiceBackend,
    pub request_timeout: Duration,
    pub session: SessionConfig,
    pub log_file: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("VOCAB_DRILL_API_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => ServiceBackend::Http {
                base_url: url.trim().trim_end_matches('/').to_string(),
            },
            None => ServiceBackend::Local {
                words_file: lookup("VOCAB_DRILL_WORDS")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_WORDS_FILE)),
            },
        };

        let timeout_secs =
            parse_positive(&lookup, "VOCAB_DRILL_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let session = SessionConfig {
            countdown_secs: parse_positive(
                &lookup,
                "VOCAB_DRILL_COUNTDOWN_SECS",
                DEFAULT_COUNTDOWN_SECS,
            )?,
            auto_advance_secs: parse_positive(
                &lookup,
                "VOCAB_DRILL_AUTO_ADVANCE_SECS",
                DEFAULT_AUTO_ADVANCE_SECS,
            )?,
            low_time_secs: parse_positive(
                &lookup,
                "VOCAB_DRILL_LOW_TIME_SECS",
                DEFAULT_LOW_TIME_SECS,
            )?,
        };

        let log_file = lookup("VOCAB_DRILL_LOG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));

        Ok(Self {
            backend,
            request_timeout: Duration::from_secs(timeout_secs),
            session,
            log_file,
        })
    }
}

fn parse_positive<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialEq + Default,
{
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    let value = raw
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidNumber {
            var,
            value: raw.clone(),
        })?;
    if value == T::default() {
        return Err(ConfigError::ZeroDuration { var });
    }
    Ok(value)
}

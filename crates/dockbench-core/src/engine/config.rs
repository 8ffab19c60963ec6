use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Concurrency cap applied when the configuration does not set one.
pub const DEFAULT_CONCURRENT: usize = 10;

/// Docking runs take minutes to hours, so a coarse polling cadence is enough.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for {parameter}: {message}")]
    InvalidValue {
        parameter: &'static str,
        message: String,
    },
}

/// Submission order of the job list, fixed once before the first pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortPolicy {
    /// Ascending total input size.
    #[default]
    SmallestFirst,
    /// Descending total input size.
    LargestFirst,
    /// Lexicographic by job name.
    Alphabetical,
}

impl SortPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortPolicy::SmallestFirst => "smallest-first",
            SortPolicy::LargestFirst => "largest-first",
            SortPolicy::Alphabetical => "alphabetical",
        }
    }
}

impl std::fmt::Display for SortPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "smallest-first" => Ok(SortPolicy::SmallestFirst),
            "largest-first" => Ok(SortPolicy::LargestFirst),
            "alphabetical" => Ok(SortPolicy::Alphabetical),
            other => Err(ConfigError::InvalidValue {
                parameter: "sort_jobs",
                message: format!(
                    "'{}' is not one of smallest-first, largest-first, alphabetical",
                    other
                ),
            }),
        }
    }
}

/// Tunables of the polling queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    pub concurrent: usize,
    pub poll_interval: Duration,
    pub sort_policy: SortPolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrent: DEFAULT_CONCURRENT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            sort_policy: SortPolicy::default(),
        }
    }
}

#[derive(Default)]
pub struct BatchConfigBuilder {
    concurrent: Option<usize>,
    poll_interval: Option<Duration>,
    sort_policy: Option<SortPolicy>,
}

impl BatchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn concurrent(mut self, n: usize) -> Self {
        self.concurrent = Some(n);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn sort_policy(mut self, policy: SortPolicy) -> Self {
        self.sort_policy = Some(policy);
        self
    }

    pub fn build(self) -> Result<BatchConfig, ConfigError> {
        let concurrent = self.concurrent.unwrap_or(DEFAULT_CONCURRENT);
        if concurrent == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "concurrent_jobs",
                message: "must be a positive integer".to_string(),
            });
        }
        Ok(BatchConfig {
            concurrent,
            poll_interval: self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            sort_policy: self.sort_policy.unwrap_or_default(),
        })
    }
}

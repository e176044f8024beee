use crate::poll::PollPolicy;
use crate::stream::ReadPolicy;

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {other}")),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ConfigFile {
    #[validate(custom = "validate_stream_name")]
    pub stream_name: Option<String>,
    pub output: Option<OutputFormat>,
    #[validate]
    pub polling: Option<PollingSection>,
    #[validate]
    pub reading: Option<ReadingSection>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Validate)]
#[validate(schema(function = "validate_delays"))]
pub struct PollingSection {
    #[validate(range(min = 1))]
    pub min_delay_ms: Option<u64>,
    #[validate(range(min = 1))]
    pub max_delay_ms: Option<u64>,
    #[validate(range(min = 1))]
    pub max_attempts: Option<usize>,
    #[validate(range(min = 1))]
    pub deadline_secs: Option<u64>,
    pub jitter: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Validate)]
pub struct ReadingSection {
    #[validate(range(min = 1))]
    pub max_batches_per_shard: Option<usize>,
    // GetRecords allows five calls per second per shard.
    #[validate(range(min = 200))]
    pub idle_interval_ms: Option<u64>,
}

impl ConfigFile {
    pub fn new<P: AsRef<Path>>(path: Option<P>) -> Self {
        path.map(read_config).unwrap_or_default()
    }

    pub fn poll_policy(&self) -> PollPolicy {
        let default = PollPolicy::default();
        let section = self.polling.clone().unwrap_or_default();

        PollPolicy {
            min_delay: section
                .min_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(default.min_delay),
            max_delay: section
                .max_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(default.max_delay),
            max_attempts: section.max_attempts.unwrap_or(default.max_attempts),
            deadline: section
                .deadline_secs
                .map(Duration::from_secs)
                .or(default.deadline),
            jitter: section.jitter.unwrap_or(default.jitter),
        }
    }

    pub fn read_policy(&self) -> ReadPolicy {
        let default = ReadPolicy::default();
        let section = self.reading.clone().unwrap_or_default();

        ReadPolicy {
            max_batches_per_shard: section
                .max_batches_per_shard
                .unwrap_or(default.max_batches_per_shard),
            idle_interval: section
                .idle_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(default.idle_interval),
        }
    }
}

pub(super) fn validate_stream_name(name: &str) -> Result<(), ValidationError> {
    let valid = !name.is_empty()
        && name.len() <= 128
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("stream_name");
        err.message = Some("must be 1-128 characters of [a-zA-Z0-9_.-]".into());
        Err(err)
    }
}

fn validate_delays(section: &PollingSection) -> Result<(), ValidationError> {
    match (section.min_delay_ms, section.max_delay_ms) {
        (Some(min), Some(max)) if min > max => {
            let mut err = ValidationError::new("delays");
            err.message = Some("min_delay_ms must not exceed max_delay_ms".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

fn read_config<P: AsRef<Path>>(path: P) -> ConfigFile {
    _read_config(path).unwrap_or_else(|err| {
        warn!("{err}");
        warn!("Skip reading config file.");
        ConfigFile::default()
    })
}

fn _read_config<P: AsRef<Path>>(path: P) -> Result<ConfigFile, String> {
    let content = fs::read_to_string(&path)
        .map_err(|err| format!("Failed to read: {}. {err}", path.as_ref().to_string_lossy()))?;
    let config: ConfigFile = serde_yaml::from_str(&content)
        .map_err(|err| format!("Failed to deserialize config file: {err}"))?;
    config
        .validate()
        .map_err(|errors| format!("Invalid config file: {}", describe(&errors)))?;
    Ok(config)
}

fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = vec![];
    reduce(errors, "", &mut messages);
    messages.sort();
    messages.join(", ")
}

fn reduce(errors: &ValidationErrors, prefix: &str, acc: &mut Vec<String>) {
    for (key, val) in errors.errors() {
        match val {
            ValidationErrorsKind::Struct(e) => {
                let p = format!("{}{}.", prefix, key);
                reduce(e, &p, acc);
            }
            ValidationErrorsKind::List(m) => {
                for (n, e) in m {
                    let p = format!("{}{}[{}].", prefix, key, n);
                    reduce(e, &p, acc);
                }
            }
            ValidationErrorsKind::Field(e) => {
                for err in e {
                    let message = match err.message.as_ref() {
                        Some(message) => message.to_string(),
                        None => format!("invalid ({})", err.code),
                    };
                    acc.push(format!("{}{}: {}", prefix, key, message));
                }
            }
        }
    }
}

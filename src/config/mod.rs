use crate::poll::PollPolicy;
use crate::stream::ReadPolicy;
use crate::{Error, Result};
use crate::{ENV_CONFIG_PATH, ENV_KINESIS_ENDPOINT_URL, ENV_OUTPUT_FORMAT, ENV_STREAM_NAME};

use std::env;
use tracing::warn;

mod file;

use file::{validate_stream_name, ConfigFile};
pub use file::OutputFormat;

pub const DEFAULT_STREAM_NAME: &str = "persistence-test";

#[derive(Debug)]
pub struct Config {
    endpoint_url: Option<String>,
    stream_name: String,
    output: OutputFormat,
    polling: PollPolicy,
    reading: ReadPolicy,
}

impl Config {
    pub fn new() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Environment variables win over the config file, which wins over defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = ConfigFile::new(lookup(ENV_CONFIG_PATH));

        let endpoint_url = lookup(ENV_KINESIS_ENDPOINT_URL);
        let stream_name = lookup(ENV_STREAM_NAME)
            .or_else(|| file.stream_name.clone())
            .unwrap_or_else(|| DEFAULT_STREAM_NAME.to_string());
        let output = lookup(ENV_OUTPUT_FORMAT)
            .and_then(|value| {
                value
                    .parse::<OutputFormat>()
                    .map_err(|err| warn!("{err}, falling back"))
                    .ok()
            })
            .or(file.output)
            .unwrap_or_default();

        Self {
            endpoint_url,
            stream_name,
            output,
            polling: file.poll_policy(),
            reading: file.read_policy(),
        }
    }

    /// Checks what the environment supplied; the file is validated on load.
    pub fn validate(&self) -> Result<()> {
        validate_stream_name(&self.stream_name).map_err(|err| {
            let message = err.message.unwrap_or_default();
            Error::Config(format!("{ENV_STREAM_NAME} `{}` {message}", self.stream_name))
        })
    }

    pub fn endpoint_url(&self) -> Option<String> {
        self.endpoint_url.clone()
    }

    pub fn stream_name(&self) -> &str {
        self.stream_name.as_str()
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.polling.clone()
    }

    pub fn read_policy(&self) -> ReadPolicy {
        self.reading.clone()
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}

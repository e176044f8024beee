pub mod client;
pub mod config;
mod error;
pub mod harness;
pub mod poll;
pub mod stream;
pub mod types;

pub use client::{Client, KinesisClient};
pub use config::Config;
pub use error::{Error, Result};
pub use harness::Harness;

pub const ENV_KINESIS_ENDPOINT_URL: &str = "KINESIS_ENDPOINT_URL";
pub const ENV_STREAM_NAME: &str = "STREAM_NAME";
pub const ENV_OUTPUT_FORMAT: &str = "OUTPUT_FORMAT";
pub const ENV_CONFIG_PATH: &str = "CONFIG_PATH";

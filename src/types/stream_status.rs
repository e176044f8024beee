use aws_sdk_kinesis::types;
use serde::Serialize;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum StreamStatus {
    Creating,
    Active,
    Updating,
    Deleting,
    Unknown,
}

impl StreamStatus {
    pub fn is_creating(&self) -> bool {
        *self == StreamStatus::Creating
    }

    pub fn is_deleting(&self) -> bool {
        *self == StreamStatus::Deleting
    }

    /// `CREATING` and `DELETING` reject writes and reads; `UPDATING` does not.
    pub fn is_settled(&self) -> bool {
        !(self.is_creating() || self.is_deleting())
    }
}

impl From<types::StreamStatus> for StreamStatus {
    fn from(status: types::StreamStatus) -> StreamStatus {
        match status {
            types::StreamStatus::Creating => StreamStatus::Creating,
            types::StreamStatus::Active => StreamStatus::Active,
            types::StreamStatus::Updating => StreamStatus::Updating,
            types::StreamStatus::Deleting => StreamStatus::Deleting,
            _ => StreamStatus::Unknown,
        }
    }
}

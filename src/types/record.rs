use aws_sdk_kinesis::{primitives, types};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Records {
    records: Vec<Record>,
}

impl Records {
    pub fn new() -> Self {
        Self { records: vec![] }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn append(&mut self, other: &mut Records) {
        self.records.append(&mut other.records);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn partition_keys(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.partition_key()).collect()
    }
}

impl From<Vec<Record>> for Records {
    fn from(records: Vec<Record>) -> Self {
        Self { records }
    }
}

/// One record as read back from a shard.
///
/// `index` is the record's position within the `GetRecords` batch it arrived in,
/// not its position in the shard.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    shard_id: String,
    index: usize,
    partition_key: String,
    #[serde(serialize_with = "as_lossy_str")]
    data: Vec<u8>,
    sequence_number: String,
    approximate_arrival_timestamp: Option<DateTime<Utc>>,
}

impl Record {
    pub fn new<K, D>(shard_id: &str, index: usize, partition_key: K, data: D) -> Self
    where
        K: Into<String>,
        D: Into<Vec<u8>>,
    {
        Self {
            shard_id: shard_id.into(),
            index,
            partition_key: partition_key.into(),
            data: data.into(),
            sequence_number: String::new(),
            approximate_arrival_timestamp: None,
        }
    }

    /// Build from an SDK record at position `index` of a batch read from `shard_id`.
    pub fn from_sdk(shard_id: &str, index: usize, value: types::Record) -> Self {
        Self {
            shard_id: shard_id.into(),
            index,
            partition_key: value.partition_key.unwrap_or_default(),
            data: value.data.into_inner(),
            sequence_number: value.sequence_number,
            approximate_arrival_timestamp: value
                .approximate_arrival_timestamp
                .and_then(into_chrono),
        }
    }

    pub fn with_sequence_number<T: Into<String>>(self, sequence_number: T) -> Self {
        Self {
            sequence_number: sequence_number.into(),
            ..self
        }
    }

    pub fn shard_id(&self) -> &str {
        self.shard_id.as_str()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn partition_key(&self) -> &str {
        self.partition_key.as_str()
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn data_lossy(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    pub fn sequence_number(&self) -> &str {
        self.sequence_number.as_str()
    }

    pub fn approximate_arrival_timestamp(&self) -> Option<&DateTime<Utc>> {
        self.approximate_arrival_timestamp.as_ref()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ITEM: {} - {} {}",
            self.index,
            self.partition_key,
            self.data_lossy()
        )
    }
}

fn as_lossy_str<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(data))
}

fn into_chrono(datetime: primitives::DateTime) -> Option<DateTime<Utc>> {
    let secs = datetime.secs();
    let nsecs = datetime.subsec_nanos();
    DateTime::<Utc>::from_timestamp(secs, nsecs)
}

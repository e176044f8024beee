use super::{
    Client, DescribeStreamOutput, GetIteratorOutput, GetRecordsOutput, GetShardsOutput,
    PutRecordOutput,
};
use crate::stream::Shard;
use crate::types::{Record, Records, StreamStatus};
use crate::{Error, Result};

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory stand-in for the stream service.
///
/// Streams stay in `CREATING` for a configurable number of describe calls and
/// in `DELETING` likewise before they disappear. Iterators are plain strings
/// of the form `stream/shard/position`.
#[derive(Debug, Clone, Default)]
pub struct MockClient {
    source: Arc<Mutex<StreamSource>>,
}

#[derive(Debug)]
struct StreamSource {
    streams: BTreeMap<String, MockStream>,
    batch_size: usize,
    shard_page_size: usize,
    describes_while_creating: usize,
    describes_while_deleting: usize,
    never_caught_up: bool,
    reject_creates: bool,
    fail_put_at: Option<usize>,
    sequence: u64,
    put_calls: usize,
    get_records_calls: usize,
    get_records_log: Vec<String>,
}

impl Default for StreamSource {
    fn default() -> Self {
        Self {
            streams: BTreeMap::new(),
            batch_size: 3,
            shard_page_size: 100,
            describes_while_creating: 2,
            describes_while_deleting: 2,
            never_caught_up: false,
            reject_creates: false,
            fail_put_at: None,
            sequence: 0,
            put_calls: 0,
            get_records_calls: 0,
            get_records_log: vec![],
        }
    }
}

#[derive(Debug)]
struct MockStream {
    arn: String,
    status: StreamStatus,
    pending_describes: usize,
    shards: Vec<MockShard>,
}

#[derive(Debug)]
struct MockShard {
    id: String,
    parent: Option<String>,
    adjacent_parent: Option<String>,
    closed: bool,
    records: Vec<(String, Vec<u8>, String)>,
}

impl MockShard {
    fn new(id: &str, parent: Option<&str>) -> Self {
        Self {
            id: id.into(),
            parent: parent.map(String::from),
            adjacent_parent: None,
            closed: false,
            records: vec![],
        }
    }
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_active_stream(stream_name: &str, shard_ids: &[&str]) -> Self {
        let client = Self::new();
        {
            let mut source = client.source();
            let shards = shard_ids.iter().map(|id| MockShard::new(id, None)).collect();
            source.streams.insert(
                stream_name.into(),
                MockStream {
                    arn: arn(stream_name),
                    status: StreamStatus::Active,
                    pending_describes: 0,
                    shards,
                },
            );
        }
        client
    }

    pub fn batch_size(self, size: usize) -> Self {
        self.source().batch_size = size;
        self
    }

    pub fn shard_page_size(self, size: usize) -> Self {
        self.source().shard_page_size = size;
        self
    }

    pub fn creating_for(self, describes: usize) -> Self {
        self.source().describes_while_creating = describes;
        self
    }

    pub fn deleting_for(self, describes: usize) -> Self {
        self.source().describes_while_deleting = describes;
        self
    }

    pub fn never_caught_up(self) -> Self {
        self.source().never_caught_up = true;
        self
    }

    /// Every create fails as if the name were taken by another account.
    pub fn reject_creates(self) -> Self {
        self.source().reject_creates = true;
        self
    }

    /// The n-th (0-based) put fails.
    pub fn fail_put_at(self, n: usize) -> Self {
        self.source().fail_put_at = Some(n);
        self
    }

    pub fn push_records<I, T>(&self, stream_name: &str, shard_id: &str, keys: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut source = self.source();
        let mut sequence = source.sequence;
        let shard = source
            .streams
            .get_mut(stream_name)
            .and_then(|stream| stream.shards.iter_mut().find(|s| s.id == shard_id))
            .expect("unknown shard");

        for key in keys {
            let key: String = key.into();
            sequence += 1;
            shard
                .records
                .push((key.clone(), key.into_bytes(), sequence.to_string()));
        }
        source.sequence = sequence;
    }

    pub fn close_shard(&self, stream_name: &str, shard_id: &str) {
        let mut source = self.source();
        if let Some(shard) = source
            .streams
            .get_mut(stream_name)
            .and_then(|stream| stream.shards.iter_mut().find(|s| s.id == shard_id))
        {
            shard.closed = true;
        }
    }

    pub fn add_shard(&self, stream_name: &str, shard_id: &str, parent: Option<&str>) {
        let mut source = self.source();
        if let Some(stream) = source.streams.get_mut(stream_name) {
            stream.shards.push(MockShard::new(shard_id, parent));
        }
    }

    /// Closes both parents and opens the merged shard.
    pub fn merge_shards(&self, stream_name: &str, shard_id: &str, parent: &str, adjacent: &str) {
        let mut source = self.source();
        if let Some(stream) = source.streams.get_mut(stream_name) {
            for shard in stream.shards.iter_mut() {
                if shard.id == parent || shard.id == adjacent {
                    shard.closed = true;
                }
            }
            let mut merged = MockShard::new(shard_id, Some(parent));
            merged.adjacent_parent = Some(adjacent.into());
            stream.shards.push(merged);
        }
    }

    pub fn stream_arn(&self, stream_name: &str) -> Option<String> {
        self.source()
            .streams
            .get(stream_name)
            .map(|stream| stream.arn.clone())
    }

    pub fn status(&self, stream_name: &str) -> Option<StreamStatus> {
        self.source()
            .streams
            .get(stream_name)
            .map(|stream| stream.status)
    }

    pub fn put_calls(&self) -> usize {
        self.source().put_calls
    }

    pub fn get_records_calls(&self) -> usize {
        self.source().get_records_calls
    }

    /// Shard ids of every `GetRecords` call, in call order.
    pub fn get_records_log(&self) -> Vec<String> {
        self.source().get_records_log.clone()
    }

    fn source(&self) -> MutexGuard<'_, StreamSource> {
        self.source.lock().unwrap()
    }
}

fn arn(stream_name: &str) -> String {
    format!("arn:aws:kinesis:us-east-1:000000000000:stream/{stream_name}")
}

fn shard_id(n: usize) -> String {
    format!("shardId-{n:012}")
}

fn parse_iterator(iterator: &str) -> Option<(&str, &str, usize)> {
    let mut parts = iterator.rsplitn(3, '/');
    let position = parts.next()?.parse::<usize>().ok()?;
    let shard_id = parts.next()?;
    let stream_name = parts.next()?;
    Some((stream_name, shard_id, position))
}

#[async_trait]
impl Client for MockClient {
    async fn create_stream(&self, stream_name: &str, shard_count: i32) -> Result<()> {
        let mut source = self.source();

        if source.reject_creates {
            return Err(Error::fatal(format!(
                "AccessDeniedException: `{stream_name}` belongs to another account"
            )));
        }

        if source.streams.contains_key(stream_name) {
            return Err(Error::AlreadyExists(stream_name.into()));
        }

        let shards = (0..shard_count.max(0) as usize)
            .map(|n| MockShard::new(&shard_id(n), None))
            .collect();
        let pending_describes = source.describes_while_creating;

        source.streams.insert(
            stream_name.into(),
            MockStream {
                arn: arn(stream_name),
                status: StreamStatus::Creating,
                pending_describes,
                shards,
            },
        );
        Ok(())
    }

    async fn describe_stream(&self, stream_name: &str) -> Result<DescribeStreamOutput> {
        let mut source = self.source();

        let deleted = {
            let stream = source
                .streams
                .get_mut(stream_name)
                .ok_or(Error::NotFound(stream_name.into()))?;

            if stream.pending_describes > 0 {
                stream.pending_describes -= 1;
                false
            } else {
                match stream.status {
                    StreamStatus::Creating => {
                        stream.status = StreamStatus::Active;
                        false
                    }
                    StreamStatus::Deleting => true,
                    _ => false,
                }
            }
        };

        if deleted {
            source.streams.remove(stream_name);
            return Err(Error::NotFound(stream_name.into()));
        }

        let stream = &source.streams[stream_name];
        Ok(DescribeStreamOutput {
            stream_arn: stream.arn.clone(),
            status: stream.status,
            open_shard_count: stream.shards.iter().filter(|s| !s.closed).count() as i32,
        })
    }

    async fn delete_stream(&self, stream_name: &str, stream_arn: &str) -> Result<()> {
        let mut source = self.source();
        let pending_describes = source.describes_while_deleting;

        let stream = source
            .streams
            .get_mut(stream_name)
            .ok_or(Error::NotFound(stream_name.into()))?;
        assert_eq!(stream.arn.as_str(), stream_arn);

        stream.status = StreamStatus::Deleting;
        stream.pending_describes = pending_describes;
        Ok(())
    }

    async fn put_record(
        &self,
        stream_name: &str,
        stream_arn: &str,
        partition_key: &str,
        data: Vec<u8>,
    ) -> Result<PutRecordOutput> {
        let mut source = self.source();
        let call = source.put_calls;
        source.put_calls += 1;

        if source.fail_put_at == Some(call) {
            return Err(Error::fatal("InternalFailure"));
        }

        source.sequence += 1;
        let sequence_number = source.sequence.to_string();

        let stream = source
            .streams
            .get_mut(stream_name)
            .filter(|stream| stream.status == StreamStatus::Active)
            .ok_or(Error::fatal(format!(
                "ResourceNotFoundException: `{stream_name}` is not active"
            )))?;
        assert_eq!(stream.arn.as_str(), stream_arn);

        let open: Vec<&mut MockShard> = stream.shards.iter_mut().filter(|s| !s.closed).collect();
        if open.is_empty() {
            return Err(Error::fatal("no open shard"));
        }
        let hash = partition_key.bytes().map(usize::from).sum::<usize>();
        let index = hash % open.len();
        let shard = open.into_iter().nth(index).expect("index within bounds");

        shard.records.push((
            partition_key.to_string(),
            data,
            sequence_number.clone(),
        ));

        Ok(PutRecordOutput {
            shard_id: shard.id.clone(),
            sequence_number,
        })
    }

    async fn get_shards(
        &self,
        stream_name: &str,
        stream_arn: &str,
        next_token: Option<String>,
    ) -> Result<GetShardsOutput> {
        let source = self.source();

        let (name, offset) = match next_token.as_deref() {
            Some(token) => {
                let (name, offset) = token.rsplit_once('#').expect("malformed token");
                (name.to_string(), offset.parse::<usize>().expect("malformed token"))
            }
            None => (stream_name.to_string(), 0),
        };

        let stream = source
            .streams
            .get(&name)
            .ok_or(Error::NotFound(name.clone()))?;
        assert_eq!(stream.arn.as_str(), stream_arn);

        let shards = stream
            .shards
            .iter()
            .skip(offset)
            .take(source.shard_page_size)
            .map(|s| {
                Shard::new(&s.id, s.parent.as_deref())
                    .with_adjacent_parent(s.adjacent_parent.as_deref())
            })
            .collect::<Vec<Shard>>();

        let end = offset + shards.len();
        let next_token = (end < stream.shards.len()).then(|| format!("{name}#{end}"));

        Ok(GetShardsOutput { shards, next_token })
    }

    async fn get_iterator(
        &self,
        stream_name: &str,
        stream_arn: &str,
        shard_id: &str,
    ) -> Result<GetIteratorOutput> {
        let source = self.source();

        let stream = source
            .streams
            .get(stream_name)
            .ok_or(Error::NotFound(stream_name.into()))?;
        assert_eq!(stream.arn.as_str(), stream_arn);

        stream
            .shards
            .iter()
            .find(|s| s.id == shard_id)
            .map(|s| GetIteratorOutput {
                iterator: Some(format!("{stream_name}/{}/0", s.id)),
            })
            .ok_or(Error::NotFound(shard_id.into()))
    }

    async fn get_records(
        &self,
        stream_arn: &str,
        shard_id: &str,
        iterator: &str,
    ) -> Result<GetRecordsOutput> {
        let mut source = self.source();
        source.get_records_calls += 1;
        source.get_records_log.push(shard_id.to_string());

        let (stream_name, iterator_shard, position) =
            parse_iterator(iterator).ok_or(Error::fatal("InvalidArgumentException"))?;
        assert_eq!(iterator_shard, shard_id);

        let batch_size = source.batch_size;
        let never_caught_up = source.never_caught_up;

        let stream = source
            .streams
            .get(stream_name)
            .ok_or(Error::NotFound(stream_name.into()))?;
        assert_eq!(stream.arn.as_str(), stream_arn);

        let shard = stream
            .shards
            .iter()
            .find(|s| s.id == shard_id)
            .ok_or(Error::NotFound(shard_id.into()))?;

        let end = (position + batch_size).min(shard.records.len());
        let records = shard.records[position.min(end)..end]
            .iter()
            .enumerate()
            .map(|(index, (key, data, sequence))| {
                Record::new(shard_id, index, key.as_str(), data.clone())
                    .with_sequence_number(sequence.as_str())
            })
            .collect::<Vec<Record>>();

        let remaining = shard.records.len() - end;
        let next_iterator = if shard.closed && remaining == 0 {
            None
        } else {
            Some(format!("{stream_name}/{shard_id}/{end}"))
        };
        let millis_behind_latest = if never_caught_up {
            Some(1_000)
        } else {
            Some(remaining as i64 * 1_000)
        };

        Ok(GetRecordsOutput {
            records: Records::from(records),
            next_iterator,
            millis_behind_latest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_iterators() {
        assert_eq!(
            parse_iterator("stream/shardId-000000000000/12"),
            Some(("stream", "shardId-000000000000", 12))
        );
        assert_eq!(parse_iterator("garbage"), None);
    }

    #[tokio::test]
    async fn it_walks_the_stream_lifecycle() {
        let client = MockClient::new().creating_for(1).deleting_for(1);

        client.create_stream("s", 1).await.unwrap();
        assert_eq!(client.status("s"), Some(StreamStatus::Creating));

        let output = client.describe_stream("s").await.unwrap();
        assert_eq!(output.status, StreamStatus::Creating);
        let output = client.describe_stream("s").await.unwrap();
        assert_eq!(output.status, StreamStatus::Active);
        assert_eq!(output.open_shard_count, 1);

        client.delete_stream("s", &output.stream_arn).await.unwrap();
        let output = client.describe_stream("s").await.unwrap();
        assert_eq!(output.status, StreamStatus::Deleting);
        let err = client.describe_stream("s").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(client.status("s").is_none());
    }

    #[tokio::test]
    async fn it_pages_shards() {
        let client = MockClient::with_active_stream("s", &["a", "b", "c"]).shard_page_size(2);
        let arn = client.stream_arn("s").unwrap();

        let first = client.get_shards("s", &arn, None).await.unwrap();
        assert_eq!(first.shards.len(), 2);
        assert!(first.next_token.is_some());

        let second = client.get_shards("s", &arn, first.next_token).await.unwrap();
        assert_eq!(second.shards.len(), 1);
        assert_eq!(second.shards[0].id(), "c");
        assert!(second.next_token.is_none());
    }
}

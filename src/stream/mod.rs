mod completion;
mod decommissioner;
mod lineage;
mod lineages;
mod provisioner;
mod reader;
mod shard;
mod writer;

use crate::client::Client;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub use completion::Completion;
pub use decommissioner::StreamDecommissioner;
pub use lineages::Lineages;
pub use provisioner::{StreamProvisioner, SHARD_COUNT};
pub use reader::RecordReader;
pub use shard::{ReadPolicy, Shard};
pub use writer::{RecordWriter, RECORD_COUNT};

/// Everything a shard-reading task needs.
#[derive(Clone)]
pub struct ReadContext {
    pub client: Arc<dyn Client>,
    pub stream_name: String,
    pub stream_arn: String,
    pub policy: ReadPolicy,
    pub token: CancellationToken,
}

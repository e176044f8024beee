use crate::client::Client;
use crate::config::{Config, OutputFormat};
use crate::stream::{RecordReader, RecordWriter, StreamDecommissioner, StreamProvisioner};
use crate::types::Records;
use crate::Result;

use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Runs create, write, read and delete against one stream, one phase after
/// the other, and narrates the run to `out`.
///
/// The first error aborts the run. Nothing created so far is cleaned up.
pub struct Harness {
    provisioner: StreamProvisioner,
    writer: RecordWriter,
    reader: RecordReader,
    decommissioner: StreamDecommissioner,
    output: OutputFormat,
}

impl Harness {
    pub fn new(client: Arc<dyn Client>, config: &Config) -> Self {
        Self {
            provisioner: StreamProvisioner::new(Arc::clone(&client), config.poll_policy()),
            writer: RecordWriter::new(Arc::clone(&client)),
            reader: RecordReader::new(Arc::clone(&client), config.read_policy()),
            decommissioner: StreamDecommissioner::new(client, config.poll_policy()),
            output: config.output(),
        }
    }

    pub async fn run<W: Write>(
        &self,
        stream_name: &str,
        token: &CancellationToken,
        out: &mut W,
    ) -> Result<Records> {
        let arn = self.provisioner.ensure(stream_name, token).await?;
        writeln!(out, "CREATED: {arn}").map_err(anyhow::Error::from)?;

        self.writer.write_batch(stream_name, &arn).await?;

        let records = self.reader.read_all(stream_name, &arn, token).await?;
        self.print(&records, out)?;

        self.decommissioner.tear_down(stream_name, &arn, token).await?;
        writeln!(out, "DELETED").map_err(anyhow::Error::from)?;
        writeln!(out, "============").map_err(anyhow::Error::from)?;

        info!("Finished run against {stream_name}");
        Ok(records)
    }

    fn print<W: Write>(&self, records: &Records, out: &mut W) -> Result<()> {
        for record in records.iter() {
            match self.output {
                OutputFormat::Text => writeln!(out, "{record}").map_err(anyhow::Error::from)?,
                OutputFormat::Json => {
                    let line = serde_json::to_string(record).map_err(anyhow::Error::from)?;
                    writeln!(out, "{line}").map_err(anyhow::Error::from)?;
                }
            }
        }
        Ok(())
    }
}

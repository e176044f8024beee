use super::{
    lineage::{Drained, Lineage},
    Completion, ReadContext, Shard,
};
use crate::types::Records;
use crate::Result;

use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug)]
pub struct Lineages {
    shard_len: usize,
    lineages: Vec<Lineage>,
    completion: Completion,
}

impl Lineages {
    pub fn len(&self) -> usize {
        self.lineages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lineages.is_empty()
    }

    pub fn has(&self, shard_id: &str) -> bool {
        self.lineages
            .iter()
            .any(|lineage| lineage.has(Some(shard_id)))
    }

    /// Drain every lineage on its own task and join the results.
    ///
    /// Records are grouped per shard, shards ordered by id. The first failing
    /// shard cancels the others and its error is returned.
    pub async fn drain(self, context: ReadContext) -> Result<Records> {
        let (tx, mut rx) = mpsc::channel::<Drained>(self.shard_len.max(1));

        for lineage in self.lineages {
            let context = context.clone();
            let completion = self.completion.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                lineage.drain(context, completion, tx).await;
            });
        }

        drop(tx);

        let mut drained: Vec<(String, Records)> = vec![];
        while let Some(result) = rx.recv().await {
            match result {
                Ok((shard_id, records)) => {
                    debug!("Finished shard {shard_id}");
                    drained.push((shard_id, records));
                }
                Err(err) => {
                    context.token.cancel();
                    return Err(err);
                }
            }
        }

        drained.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut records = Records::new();
        for (_, mut shard_records) in drained {
            records.append(&mut shard_records);
        }
        Ok(records)
    }
}

impl From<Vec<Shard>> for Lineages {
    fn from(shards: Vec<Shard>) -> Self {
        Self {
            shard_len: shards.len(),
            completion: Completion::new(shards.iter().map(|shard| shard.id())),
            lineages: shards_to_lineages(shards),
        }
    }
}

fn shards_to_lineages(shards: Vec<Shard>) -> Vec<Lineage> {
    let mut lineages: Vec<Lineage> = vec![];

    for shard in shards {
        push_shard_to_lineages(&mut lineages, shard);
    }

    lineages
}

fn push_shard_to_lineages(lineages: &mut Vec<Lineage>, shard: Shard) {
    // Lineages rooted at a child of this shard move under it.
    let (children, remains): (Vec<Lineage>, Vec<Lineage>) = lineages
        .clone()
        .into_iter()
        .partition(|lineage| lineage.is_child(shard.id()));

    *lineages = remains;

    let mut lineage = Lineage::new(shard.clone());
    lineage.set_children(children);

    if let Some(ancestor) = lineages
        .iter_mut()
        .find(|lineage| lineage.has(shard.parent()))
    {
        ancestor.set_descendant(&lineage);
    } else {
        lineages.push(lineage);
    }
}

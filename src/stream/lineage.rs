use super::{Completion, ReadContext, Shard};
use crate::types::Records;
use crate::Result;

use async_recursion::async_recursion;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tracing::{debug, error};

pub type Drained = Result<(String, Records)>;

/// A shard together with the shards split from it.
#[derive(Debug, Clone)]
pub struct Lineage {
    shard: Shard,

    #[cfg(test)]
    pub children: Vec<Lineage>,

    #[cfg(not(test))]
    children: Vec<Lineage>,
}

impl Lineage {
    pub fn new(shard: Shard) -> Self {
        Self {
            shard,
            children: vec![],
        }
    }

    pub fn shard_id(&self) -> &str {
        self.shard.id()
    }

    pub fn parent(&self) -> Option<&str> {
        self.shard.parent()
    }

    pub fn set_children(&mut self, children: Vec<Lineage>) {
        self.children = children;
    }

    pub fn has(&self, shard_id: Option<&str>) -> bool {
        if let Some(id) = shard_id {
            if self.shard_id() == id {
                true
            } else {
                self.children.iter().any(|child| child.has(shard_id))
            }
        } else {
            false
        }
    }

    pub fn is_child(&self, shard_id: &str) -> bool {
        if let Some(parent_id) = self.parent() {
            parent_id == shard_id
        } else {
            false
        }
    }

    pub fn set_descendant(&mut self, desc: &Lineage) {
        if let Some(parent_id) = desc.parent() {
            if self.shard_id() == parent_id {
                self.children.push(desc.clone());
            } else {
                for lineage in self.children.iter_mut() {
                    lineage.set_descendant(desc);
                }
            }
        }
    }

    /// Drain this shard, then its children concurrently. A parent is always
    /// read to its end before any of its children start. A merged shard also
    /// waits for its adjacent parent, which lives in another branch.
    #[async_recursion]
    pub async fn drain(self, context: ReadContext, completion: Completion, tx: Sender<Drained>) {
        let Lineage { mut shard, children } = self;
        let shard_id = shard.id().to_string();

        let result = match prepare(&mut shard, &context, &completion).await {
            Ok(()) => shard
                .drain(
                    Arc::clone(&context.client),
                    &context.stream_arn,
                    &context.policy,
                    &context.token,
                )
                .await
                .map(|records| (shard_id.clone(), records)),
            Err(err) => Err(err),
        };

        let failed = result.is_err();
        if !failed {
            completion.finish(&shard_id);
        }

        if let Err(err) = tx.send(result).await {
            error!("Failed to send records of {shard_id}: {err}");
            return;
        }

        if failed {
            return;
        }

        for child in children {
            let context = context.clone();
            let completion = completion.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                child.drain(context, completion, tx).await;
            });
        }
    }
}

async fn prepare(shard: &mut Shard, context: &ReadContext, completion: &Completion) -> Result<()> {
    if let Some(adjacent) = shard.adjacent_parent() {
        debug!("Shard {} waits for its adjacent parent {adjacent}", shard.id());
        completion.wait_for(adjacent, &context.token).await?;
    }

    shard
        .set_iterator(
            Arc::clone(&context.client),
            &context.stream_name,
            &context.stream_arn,
        )
        .await
}

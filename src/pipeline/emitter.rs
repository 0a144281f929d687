//! Sync emitter - pushes a tag decision to the remote account
//!
//! Pocket's `tags_replace` overwrites the item's tags, so the decision must
//! already hold the complete tag set (existing plus predicted).

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::pocket::types::ReplaceTagsAction;
use crate::tags::TagDecision;

use super::TagSink;

/// What the emitter did with one decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Replace request accepted by the sink
    Sent,
    /// Empty tag set, nothing to send
    Skipped,
    /// Request built but not sent
    DryRun,
}

pub struct SyncEmitter<S> {
    sink: S,
    dry_run: bool,
}

impl<S: TagSink> SyncEmitter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Build the replace action for a decision, `None` when there is
    /// nothing to set
    pub fn action_for(item_id: &str, decision: &TagDecision) -> Option<ReplaceTagsAction> {
        if decision.is_empty() {
            return None;
        }
        Some(ReplaceTagsAction::new(item_id, decision.joined()))
    }

    pub async fn emit(&self, item_id: &str, decision: &TagDecision) -> Result<SyncStatus> {
        let Some(action) = Self::action_for(item_id, decision) else {
            debug!(item_id, "Empty tag set, skipping sync");
            return Ok(SyncStatus::Skipped);
        };

        if self.dry_run {
            debug!(item_id, tags = %action.tags, "Dry run, not sending");
            return Ok(SyncStatus::DryRun);
        }

        self.sink.replace_tags(action).await?;
        Ok(SyncStatus::Sent)
    }
}

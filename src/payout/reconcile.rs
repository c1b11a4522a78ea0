use colored::Colorize;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    clock::Clock,
    error::{PayoutError, Result},
    paypal::{provider::PayoutProvider, types::BatchStatus},
    payout::engine::PayoutEngine,
};

/// What reconciling one provider batch did locally.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// `sent_at` was stamped on this many rows.
    Sent(usize),
    /// This many rows went back to the submission pool.
    Denied(usize),
    /// No terminal status yet; nothing changed.
    Pending(BatchStatus),
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct ReconcileSummary {
    pub batches_checked: usize,
    pub batches_succeeded: usize,
    pub batches_denied: usize,
    pub batches_pending: usize,
    pub records_sent: usize,
    pub records_reset: usize,
}

impl ReconcileSummary {
    pub fn print_summary(&self) {
        println!("\n{}", "=== Payout Reconciliation Summary ===".cyan().bold());
        println!("Batches Checked:  {}", self.batches_checked);
        println!("Succeeded:        {} ✓", self.batches_succeeded.to_string().green());
        println!("Denied:           {} ✗", self.batches_denied.to_string().red());
        println!("Still Pending:    {}", self.batches_pending.to_string().yellow());
        println!("Cash Outs Sent:   {}", self.records_sent);
        println!("Cash Outs Reset:  {}", self.records_reset);
        println!("{}", "=====================================".cyan());
    }
}

impl<P: PayoutProvider, C: Clock> PayoutEngine<P, C> {
    /// Poll every outstanding batch and move its rows to a terminal state.
    pub async fn reconcile_outstanding_batches(&self) -> Result<ReconcileSummary> {
        let batch_ids = self.db.outstanding_batch_ids(&self.kind)?;
        let mut summary = ReconcileSummary::default();

        if batch_ids.is_empty() {
            info!("No outstanding payout batches");
            return Ok(summary);
        }

        info!("Checking {} outstanding payout batch(es)", batch_ids.len());

        for batch_id in &batch_ids {
            summary.batches_checked += 1;
            match self.reconcile_batch(batch_id).await? {
                BatchOutcome::Sent(n) => {
                    summary.batches_succeeded += 1;
                    summary.records_sent += n;
                }
                BatchOutcome::Denied(n) => {
                    summary.batches_denied += 1;
                    summary.records_reset += n;
                }
                BatchOutcome::Pending(_) => summary.batches_pending += 1,
            }
        }

        info!(
            "Reconciliation complete: {} sent, {} reset, {} batch(es) still pending",
            summary.records_sent, summary.records_reset, summary.batches_pending
        );

        Ok(summary)
    }

    pub async fn reconcile_batch(&self, batch_id: &str) -> Result<BatchOutcome> {
        let batch = self.provider.get_batch(batch_id).await?;
        let ids = batch
            .sender_item_ids()
            .map_err(PayoutError::MalformedResponse)?;
        let status = batch.batch_header.batch_status;

        debug!("Batch {} is {} with {} items", batch_id, status, ids.len());

        if matches!(status, BatchStatus::Success | BatchStatus::Denied) {
            let missing: Vec<i64> = self
                .db
                .unsent_ids_in_batch(&self.kind, batch_id)?
                .into_iter()
                .filter(|id| !ids.contains(id))
                .collect();
            if !missing.is_empty() {
                warn!(
                    "Batch {} is {} but does not list cash outs {:?}; they stay outstanding",
                    batch_id, status, missing
                );
            }
        }

        let outcome = match status {
            BatchStatus::Success => {
                let n = self
                    .db
                    .mark_sent(&self.kind, batch_id, &ids, self.clock.now())?;
                info!("Batch {} succeeded, marked {} cash outs sent", batch_id, n);
                BatchOutcome::Sent(n)
            }
            BatchStatus::Denied => {
                let n = self.db.reset_batch(&self.kind, batch_id, &ids)?;
                warn!(
                    "Batch {} was denied, returned {} cash outs to the queue",
                    batch_id, n
                );
                BatchOutcome::Denied(n)
            }
            other => {
                debug!("Batch {} still {}, leaving for a later pass", batch_id, other);
                BatchOutcome::Pending(other)
            }
        };

        Ok(outcome)
    }
}

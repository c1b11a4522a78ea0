use colored::Colorize;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    clock::Clock,
    error::Result,
    paypal::provider::PayoutProvider,
    payout::{
        batch::{build_batch_request, generate_sender_batch_id, plan_chunks, PlannedChunk},
        engine::PayoutEngine,
    },
};

/// Placeholder label shown for chunks in a submission preview.
pub const UNASSIGNED_LABEL: &str = "(new)";

/// Outcome of one `submit_approved_payouts` run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SubmissionSummary {
    pub eligible: usize,
    pub chunks_submitted: usize,
    pub chunks_not_found: usize,
    pub records_batched: usize,
    pub batch_ids: Vec<String>,
}

impl SubmissionSummary {
    pub fn print_summary(&self) {
        println!("\n{}", "=== Payout Submission Summary ===".cyan().bold());
        println!("Eligible Cash Outs: {}", self.eligible);
        println!("Batches Created:    {} ✓", self.chunks_submitted.to_string().green());
        println!("Chunks Skipped:     {}", self.chunks_not_found.to_string().yellow());
        println!("Records Batched:    {}", self.records_batched);
        for batch_id in &self.batch_ids {
            println!("  {}", batch_id);
        }
        println!("{}", "=================================".cyan());
    }
}

impl<P: PayoutProvider, C: Clock> PayoutEngine<P, C> {
    /// Send every approved, unsent, unbatched cash out to the provider.
    ///
    /// A "not found" rejection skips that chunk, leaving its rows unbatched for
    /// the next run. Any other provider error aborts the remaining chunks.
    pub async fn submit_approved_payouts(&self) -> Result<SubmissionSummary> {
        let eligible = self.db.submission_eligible(&self.kind)?;
        let mut summary = SubmissionSummary {
            eligible: eligible.len(),
            ..Default::default()
        };

        if eligible.is_empty() {
            info!("No approved cash outs waiting to be sent");
            return Ok(summary);
        }

        let chunks = plan_chunks(eligible, self.batch_size, generate_sender_batch_id);
        info!(
            "Submitting {} cash outs in {} batch(es) of up to {}",
            summary.eligible,
            chunks.len(),
            self.batch_size
        );

        for (n, chunk) in chunks.iter().enumerate() {
            info!(
                "Submitting batch {}/{} ({} items, sender batch {}{})",
                n + 1,
                chunks.len(),
                chunk.cash_outs.len(),
                chunk.sender_batch_id,
                if chunk.resumed { ", resumed" } else { "" }
            );

            match self.submit_chunk(chunk).await? {
                Some((batch_id, updated)) => {
                    summary.chunks_submitted += 1;
                    summary.records_batched += updated;
                    summary.batch_ids.push(batch_id);
                }
                None => summary.chunks_not_found += 1,
            }
        }

        Ok(summary)
    }

    /// Chunks the next submission would send, without writing or calling out.
    ///
    /// Resumed chunks carry their stored label. New chunks are labelled
    /// [`UNASSIGNED_LABEL`] since their real label is only drawn at submission.
    pub fn preview_submission(&self) -> Result<Vec<PlannedChunk>> {
        let eligible = self.db.submission_eligible(&self.kind)?;
        Ok(plan_chunks(eligible, self.batch_size, || {
            UNASSIGNED_LABEL.to_string()
        }))
    }

    /// Returns the provider batch id and the number of rows updated, or `None`
    /// when the provider answered "not found".
    async fn submit_chunk(&self, chunk: &PlannedChunk) -> Result<Option<(String, usize)>> {
        let ids = chunk.ids();

        if !chunk.resumed {
            self.db
                .assign_sender_batch_id(&self.kind, &ids, &chunk.sender_batch_id)?;
        }

        let request = build_batch_request(&chunk.sender_batch_id, &chunk.cash_outs);

        let header = match self.provider.create_batch(&request).await {
            Ok(header) => header,
            Err(e) if e.is_not_found() => {
                error!(
                    "Payout batch {} rejected as not found, leaving {} cash outs for retry: {}",
                    chunk.sender_batch_id,
                    ids.len(),
                    e
                );
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        info!("Created Payout: {}", header.payout_batch_id);

        let updated = self
            .db
            .assign_batch_id(&self.kind, &ids, &header.payout_batch_id)?;
        if updated != ids.len() {
            warn!(
                "Payout batch {} covers {} cash outs but only {} were updated",
                header.payout_batch_id,
                ids.len(),
                updated
            );
        }

        Ok(Some((header.payout_batch_id, updated)))
    }
}

pub mod batch;
pub mod engine;
pub mod reconcile;
pub mod submit;

pub use batch::{build_batch_request, generate_sender_batch_id, plan_chunks, PlannedChunk};
pub use engine::PayoutEngine;
pub use reconcile::{BatchOutcome, ReconcileSummary};
pub use submit::{SubmissionSummary, UNASSIGNED_LABEL};

/// PayPal accepts at most this many items per payout request.
pub const PROVIDER_MAX_BATCH_SIZE: usize = 500;

/// All cash outs are paid in US dollars.
pub const PAYOUT_CURRENCY: &str = "USD";

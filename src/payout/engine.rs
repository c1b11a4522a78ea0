use crate::{
    clock::{Clock, SystemClock},
    paypal::provider::PayoutProvider,
    payout::PROVIDER_MAX_BATCH_SIZE,
    storage::{models::PAYPAL_KIND, Database},
};

/// Drives cash outs through the payout provider.
///
/// Submission and reconciliation live in `submit.rs` and `reconcile.rs`.
/// Both are meant to be invoked one at a time by an external scheduler; the
/// database is the only shared state.
pub struct PayoutEngine<P, C = SystemClock> {
    pub(crate) db: Database,
    pub(crate) provider: P,
    pub(crate) clock: C,
    pub(crate) kind: String,
    pub(crate) batch_size: usize,
}

impl<P: PayoutProvider> PayoutEngine<P, SystemClock> {
    pub fn new(db: Database, provider: P) -> Self {
        Self::with_clock(db, provider, SystemClock)
    }
}

impl<P: PayoutProvider, C: Clock> PayoutEngine<P, C> {
    pub fn with_clock(db: Database, provider: P, clock: C) -> Self {
        Self {
            db,
            provider,
            clock,
            kind: PAYPAL_KIND.to_string(),
            batch_size: PROVIDER_MAX_BATCH_SIZE,
        }
    }

    /// Chunk size for submissions, capped at the provider limit.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, PROVIDER_MAX_BATCH_SIZE);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

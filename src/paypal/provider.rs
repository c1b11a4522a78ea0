use async_trait::async_trait;

use crate::{
    error::ProviderError,
    paypal::types::{BatchHeader, PayoutBatch, PayoutBatchRequest},
};

/// The two payout API calls the batch engine depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PayoutProvider: Send + Sync {
    /// Create a payout batch. The request's `sender_batch_id` is the
    /// idempotency key: resubmitting the same one must not create a second
    /// batch.
    async fn create_batch(
        &self,
        request: &PayoutBatchRequest,
    ) -> std::result::Result<BatchHeader, ProviderError>;

    async fn get_batch(
        &self,
        payout_batch_id: &str,
    ) -> std::result::Result<PayoutBatch, ProviderError>;
}

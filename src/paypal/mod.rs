pub mod client;
pub mod provider;
pub mod types;

pub use client::PaypalClient;
pub use provider::PayoutProvider;
pub use types::{
    Amount, BatchHeader, BatchStatus, PayoutBatch, PayoutBatchItem, PayoutBatchRequest,
    PayoutItem, PayoutItemDetail, RecipientType, SenderBatchHeader,
};

#[cfg(test)]
pub use provider::MockPayoutProvider;

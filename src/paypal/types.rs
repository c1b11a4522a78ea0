use serde::{Deserialize, Serialize};

/// Body of `POST /v1/payments/payouts`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutBatchRequest {
    pub sender_batch_header: SenderBatchHeader,
    pub items: Vec<PayoutItem>,
}

impl PayoutBatchRequest {
    /// Client-side label, also used as the idempotency key.
    pub fn sender_batch_id(&self) -> &str {
        &self.sender_batch_header.sender_batch_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SenderBatchHeader {
    pub sender_batch_id: String,
    pub email_subject: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutItem {
    pub recipient_type: RecipientType,
    pub amount: Amount,
    pub note: String,
    pub receiver: String,
    pub sender_item_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipientType {
    Email,
    Phone,
    PaypalId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Amount {
    pub value: String,
    pub currency: String,
}

impl Amount {
    pub fn new(cents: i64, currency: &str) -> Self {
        let sign = if cents < 0 { "-" } else { "" };
        let abs = cents.unsigned_abs();
        Self {
            value: format!("{}{}.{:02}", sign, abs / 100, abs % 100),
            currency: currency.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Denied,
    Pending,
    Processing,
    Success,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchStatus::Denied => write!(f, "DENIED"),
            BatchStatus::Pending => write!(f, "PENDING"),
            BatchStatus::Processing => write!(f, "PROCESSING"),
            BatchStatus::Success => write!(f, "SUCCESS"),
            BatchStatus::Canceled => write!(f, "CANCELED"),
            BatchStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchHeader {
    pub payout_batch_id: String,
    pub batch_status: BatchStatus,
}

/// Response of `POST /v1/payments/payouts`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePayoutResponse {
    pub batch_header: BatchHeader,
}

/// Response of `GET /v1/payments/payouts/{payout_batch_id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PayoutBatch {
    pub batch_header: BatchHeader,
    #[serde(default)]
    pub items: Vec<PayoutBatchItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PayoutBatchItem {
    pub payout_item_id: Option<String>,
    pub transaction_status: Option<String>,
    pub payout_item: PayoutItemDetail,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PayoutItemDetail {
    pub sender_item_id: Option<String>,
}

impl PayoutBatch {
    /// Local cash out ids echoed back in the batch items.
    ///
    /// Fails on the first item whose sender item id is missing or not an integer.
    pub fn sender_item_ids(&self) -> std::result::Result<Vec<i64>, String> {
        self.items
            .iter()
            .map(|item| {
                let raw = item.payout_item.sender_item_id.as_deref().ok_or_else(|| {
                    format!(
                        "batch {} has an item without sender_item_id",
                        self.batch_header.payout_batch_id
                    )
                })?;
                raw.trim().parse::<i64>().map_err(|_| {
                    format!(
                        "batch {} has non-numeric sender_item_id {:?}",
                        self.batch_header.payout_batch_id, raw
                    )
                })
            })
            .collect()
    }
}

/// Error body shared by the REST endpoints and the OAuth endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub name: Option<String>,
    pub message: Option<String>,
    pub debug_id: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AccessTokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_formats_cents_as_major_units() {
        assert_eq!(Amount::new(1000, "USD").value, "10.00");
        assert_eq!(Amount::new(505, "USD").value, "5.05");
        assert_eq!(Amount::new(7, "USD").value, "0.07");
        assert_eq!(Amount::new(-250, "USD").value, "-2.50");
    }

    #[test]
    fn request_serializes_to_payouts_wire_shape() {
        let request = PayoutBatchRequest {
            sender_batch_header: SenderBatchHeader {
                sender_batch_id: "a1b2c3d4e5f60718".to_string(),
                email_subject: "Sending Batch Payment a1b2c3d4e5f60718".to_string(),
            },
            items: vec![PayoutItem {
                recipient_type: RecipientType::Email,
                amount: Amount::new(1000, "USD"),
                note: "Your cash out has been processed. Ref: 7".to_string(),
                receiver: "user@example.com".to_string(),
                sender_item_id: "7".to_string(),
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "sender_batch_header": {
                    "sender_batch_id": "a1b2c3d4e5f60718",
                    "email_subject": "Sending Batch Payment a1b2c3d4e5f60718"
                },
                "items": [{
                    "recipient_type": "EMAIL",
                    "amount": { "value": "10.00", "currency": "USD" },
                    "note": "Your cash out has been processed. Ref: 7",
                    "receiver": "user@example.com",
                    "sender_item_id": "7"
                }]
            })
        );
    }

    #[test]
    fn batch_response_parses_items_and_unknown_status() {
        let body = r#"{
            "batch_header": {
                "payout_batch_id": "FYXMPQTX4JC9N",
                "batch_status": "NEW_STATUS",
                "sender_batch_header": { "sender_batch_id": "abc" }
            },
            "items": [
                { "payout_item_id": "8AELMXH8UB2P8", "transaction_status": "SUCCESS",
                  "payout_item": { "sender_item_id": "12", "receiver": "a@example.com" } },
                { "payout_item_id": "9AELMXH8UB2P8", "transaction_status": "SUCCESS",
                  "payout_item": { "sender_item_id": "13" } }
            ],
            "links": []
        }"#;

        let batch: PayoutBatch = serde_json::from_str(body).unwrap();
        assert_eq!(batch.batch_header.batch_status, BatchStatus::Unknown);
        assert_eq!(batch.sender_item_ids().unwrap(), vec![12, 13]);
    }

    #[test]
    fn sender_item_ids_reject_malformed_items() {
        let body = r#"{
            "batch_header": { "payout_batch_id": "B", "batch_status": "SUCCESS" },
            "items": [ { "payout_item": { "sender_item_id": "abc" } } ]
        }"#;
        let batch: PayoutBatch = serde_json::from_str(body).unwrap();
        assert!(batch.sender_item_ids().is_err());

        let body = r#"{
            "batch_header": { "payout_batch_id": "B", "batch_status": "SUCCESS" },
            "items": [ { "payout_item": {} } ]
        }"#;
        let batch: PayoutBatch = serde_json::from_str(body).unwrap();
        assert!(batch.sender_item_ids().is_err());
    }
}

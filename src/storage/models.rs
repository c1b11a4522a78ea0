use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Subtype stored in the `type` column for PayPal cash outs.
pub const PAYPAL_KIND: &str = "CashOut::Paypal";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashOut {
    pub id: i64,
    pub kind: String,
    pub amount_cents: i64,
    pub paypal_address: String,
    pub approved_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub batch_id: Option<String>,
    pub sender_batch_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Where a cash out sits in the approve -> batch -> send lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CashOutState {
    AwaitingApproval,
    ReadyToSubmit,
    Batched,
    Sent,
}

impl std::fmt::Display for CashOutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CashOutState::AwaitingApproval => write!(f, "AwaitingApproval"),
            CashOutState::ReadyToSubmit => write!(f, "ReadyToSubmit"),
            CashOutState::Batched => write!(f, "Batched"),
            CashOutState::Sent => write!(f, "Sent"),
        }
    }
}

impl CashOut {
    pub(crate) const COLUMNS: &'static str = "id, type, amount_cents, paypal_address, approved_at, \
         sent_at, batch_id, sender_batch_id, created_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            kind: row.get(1)?,
            amount_cents: row.get(2)?,
            paypal_address: row.get(3)?,
            approved_at: row.get(4)?,
            sent_at: row.get(5)?,
            batch_id: row.get(6)?,
            sender_batch_id: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    pub fn state(&self) -> CashOutState {
        if self.sent_at.is_some() {
            CashOutState::Sent
        } else if self.batch_id.is_some() {
            CashOutState::Batched
        } else if self.approved_at.is_some() {
            CashOutState::ReadyToSubmit
        } else {
            CashOutState::AwaitingApproval
        }
    }

    pub fn is_submission_eligible(&self) -> bool {
        self.approved_at.is_some() && self.sent_at.is_none() && self.batch_id.is_none()
    }

    pub fn is_reconciliation_eligible(&self) -> bool {
        self.batch_id.is_some() && self.sent_at.is_none()
    }
}

/// Values for inserting a cash out row.
#[derive(Debug, Clone)]
pub struct NewCashOut {
    pub kind: String,
    pub amount_cents: i64,
    pub paypal_address: String,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl NewCashOut {
    pub fn paypal(amount_cents: i64, paypal_address: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            kind: PAYPAL_KIND.to_string(),
            amount_cents,
            paypal_address: paypal_address.to_string(),
            approved_at: None,
            created_at,
        }
    }

    pub fn approved(mut self, at: DateTime<Utc>) -> Self {
        self.approved_at = Some(at);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DatabaseStats {
    pub total_cash_outs: usize,
    pub awaiting_approval: usize,
    pub ready_to_submit: usize,
    pub in_flight: usize,
    pub sent: usize,
    pub total_sent_cents: i64,
    pub outstanding_batches: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cash_out() -> CashOut {
        CashOut {
            id: 1,
            kind: PAYPAL_KIND.to_string(),
            amount_cents: 1000,
            paypal_address: "a@example.com".to_string(),
            approved_at: None,
            sent_at: None,
            batch_id: None,
            sender_batch_id: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn state_follows_lifecycle_columns() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let mut c = cash_out();
        assert_eq!(c.state(), CashOutState::AwaitingApproval);
        assert!(!c.is_submission_eligible());

        c.approved_at = Some(now);
        assert_eq!(c.state(), CashOutState::ReadyToSubmit);
        assert!(c.is_submission_eligible());

        c.batch_id = Some("X".to_string());
        assert_eq!(c.state(), CashOutState::Batched);
        assert!(!c.is_submission_eligible());
        assert!(c.is_reconciliation_eligible());

        c.sent_at = Some(now);
        assert_eq!(c.state(), CashOutState::Sent);
        assert!(!c.is_reconciliation_eligible());
    }
}

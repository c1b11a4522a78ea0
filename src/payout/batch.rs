use crate::{
    paypal::types::{Amount, PayoutBatchRequest, PayoutItem, RecipientType, SenderBatchHeader},
    payout::PAYOUT_CURRENCY,
    storage::models::CashOut,
};

/// One provider request worth of cash outs.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChunk {
    pub sender_batch_id: String,
    /// The rows already carried this label from an earlier, unfinished attempt.
    pub resumed: bool,
    pub cash_outs: Vec<CashOut>,
}

impl PlannedChunk {
    pub fn ids(&self) -> Vec<i64> {
        self.cash_outs.iter().map(|c| c.id).collect()
    }
}

/// Random 16 hex character label for a submission.
pub fn generate_sender_batch_id() -> String {
    hex::encode(rand::random::<[u8; 8]>())
}

pub fn build_batch_request(sender_batch_id: &str, cash_outs: &[CashOut]) -> PayoutBatchRequest {
    let items = cash_outs
        .iter()
        .map(|cash_out| PayoutItem {
            recipient_type: RecipientType::Email,
            amount: Amount::new(cash_out.amount_cents, PAYOUT_CURRENCY),
            note: format!("Your cash out has been processed. Ref: {}", cash_out.id),
            receiver: cash_out.paypal_address.clone(),
            sender_item_id: cash_out.id.to_string(),
        })
        .collect();

    PayoutBatchRequest {
        sender_batch_header: SenderBatchHeader {
            sender_batch_id: sender_batch_id.to_string(),
            email_subject: format!("Sending Batch Payment {}", sender_batch_id),
        },
        items,
    }
}

/// Split eligible rows into chunks of at most `batch_size`.
///
/// Rows already labelled by an interrupted attempt are regrouped under their
/// label and come first so the same idempotency key is replayed. Every row
/// lands in exactly one chunk.
pub fn plan_chunks<F>(eligible: Vec<CashOut>, batch_size: usize, mut new_label: F) -> Vec<PlannedChunk>
where
    F: FnMut() -> String,
{
    let batch_size = batch_size.max(1);
    let mut labelled: Vec<(String, Vec<CashOut>)> = Vec::new();
    let mut fresh = Vec::new();

    for cash_out in eligible {
        match cash_out.sender_batch_id.clone() {
            Some(label) => match labelled.iter_mut().find(|(l, _)| *l == label) {
                Some((_, group)) => group.push(cash_out),
                None => labelled.push((label, vec![cash_out])),
            },
            None => fresh.push(cash_out),
        }
    }

    let mut chunks = Vec::new();

    for (label, group) in labelled {
        for (i, piece) in group.chunks(batch_size).enumerate() {
            // A label can only be replayed for the exact rows it was first sent with.
            let (sender_batch_id, resumed) = if i == 0 {
                (label.clone(), true)
            } else {
                (new_label(), false)
            };
            chunks.push(PlannedChunk {
                sender_batch_id,
                resumed,
                cash_outs: piece.to_vec(),
            });
        }
    }

    for piece in fresh.chunks(batch_size) {
        chunks.push(PlannedChunk {
            sender_batch_id: new_label(),
            resumed: false,
            cash_outs: piece.to_vec(),
        });
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::PAYPAL_KIND;
    use chrono::{TimeZone, Utc};

    fn cash_out(id: i64, label: Option<&str>) -> CashOut {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        CashOut {
            id,
            kind: PAYPAL_KIND.to_string(),
            amount_cents: 100 * id,
            paypal_address: format!("user{}@example.com", id),
            approved_at: Some(at),
            sent_at: None,
            batch_id: None,
            sender_batch_id: label.map(str::to_string),
            created_at: at,
        }
    }

    fn counter() -> impl FnMut() -> String {
        let mut n = 0;
        move || {
            n += 1;
            format!("new-{}", n)
        }
    }

    #[test]
    fn generated_labels_are_sixteen_hex_chars() {
        let label = generate_sender_batch_id();
        assert_eq!(label.len(), 16);
        assert!(label.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(label, generate_sender_batch_id());
    }

    #[test]
    fn request_has_one_item_per_cash_out() {
        let rows = vec![cash_out(1, None), cash_out(2, None)];
        let request = build_batch_request("abc", &rows);

        assert_eq!(request.sender_batch_id(), "abc");
        assert_eq!(request.sender_batch_header.email_subject, "Sending Batch Payment abc");
        assert_eq!(request.items.len(), 2);

        let item = &request.items[1];
        assert_eq!(item.recipient_type, RecipientType::Email);
        assert_eq!(item.amount.value, "2.00");
        assert_eq!(item.amount.currency, "USD");
        assert_eq!(item.note, "Your cash out has been processed. Ref: 2");
        assert_eq!(item.receiver, "user2@example.com");
        assert_eq!(item.sender_item_id, "2");
    }

    #[test]
    fn fresh_rows_split_into_consecutive_chunks() {
        let rows: Vec<CashOut> = (1..=1_001).map(|id| cash_out(id, None)).collect();
        let chunks = plan_chunks(rows, 500, counter());

        let sizes: Vec<usize> = chunks.iter().map(|c| c.cash_outs.len()).collect();
        assert_eq!(sizes, vec![500, 500, 1]);
        assert_eq!(chunks[0].ids()[0], 1);
        assert_eq!(chunks[1].ids()[0], 501);
        assert_eq!(chunks[2].ids(), vec![1_001]);
        assert_eq!(
            chunks.iter().map(|c| c.sender_batch_id.as_str()).collect::<Vec<_>>(),
            vec!["new-1", "new-2", "new-3"]
        );
        assert!(chunks.iter().all(|c| !c.resumed));
    }

    #[test]
    fn labelled_rows_are_resumed_first_under_their_label() {
        let rows = vec![
            cash_out(1, None),
            cash_out(2, Some("old-b")),
            cash_out(3, Some("old-a")),
            cash_out(4, Some("old-b")),
            cash_out(5, None),
        ];
        let chunks = plan_chunks(rows, 500, counter());

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].sender_batch_id, "old-b");
        assert!(chunks[0].resumed);
        assert_eq!(chunks[0].ids(), vec![2, 4]);
        assert_eq!(chunks[1].sender_batch_id, "old-a");
        assert_eq!(chunks[1].ids(), vec![3]);
        assert_eq!(chunks[2].sender_batch_id, "new-1");
        assert_eq!(chunks[2].ids(), vec![1, 5]);
    }

    #[test]
    fn oversized_labelled_group_keeps_label_only_on_first_piece() {
        let rows: Vec<CashOut> = (1..=5).map(|id| cash_out(id, Some("old"))).collect();
        let chunks = plan_chunks(rows, 2, counter());

        let labels: Vec<(&str, bool)> = chunks
            .iter()
            .map(|c| (c.sender_batch_id.as_str(), c.resumed))
            .collect();
        assert_eq!(labels, vec![("old", true), ("new-1", false), ("new-2", false)]);

        let mut all: Vec<i64> = chunks.iter().flat_map(|c| c.ids()).collect();
        all.sort();
        assert_eq!(all, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn empty_input_plans_nothing() {
        assert!(plan_chunks(Vec::new(), 500, counter()).is_empty());
    }
}

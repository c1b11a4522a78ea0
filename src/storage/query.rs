//! Query shaping for cash out listings.
//!
//! A [`CashOutScope`] describes which rows to read and in what order. It never
//! touches storage itself; [`crate::storage::Database::cash_outs`] runs it.

use serde::Deserialize;
use tracing::debug;

use crate::storage::models::PAYPAL_KIND;

/// Listing parameters as they arrive from a query string or the CLI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub sent: Option<String>,
    pub order: Option<String>,
}

/// Parse a boolean-like parameter. Unrecognised values are treated as absent.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    SentAt,
    CreatedAt,
}

impl SortColumn {
    pub fn from_field(field: &str) -> Option<Self> {
        match field {
            "sent" => Some(SortColumn::SentAt),
            "created" => Some(SortColumn::CreatedAt),
            _ => None,
        }
    }

    fn as_sql(&self) -> &'static str {
        match self {
            SortColumn::SentAt => "sent_at",
            SortColumn::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: SortColumn,
    pub direction: Direction,
}

impl OrderBy {
    /// Parse `[-]field`. A leading `-` sorts descending.
    pub fn parse(value: &str) -> Option<Self> {
        let (direction, field) = match value.strip_prefix('-') {
            Some(rest) => (Direction::Desc, rest),
            None => (Direction::Asc, value),
        };

        SortColumn::from_field(field).map(|column| OrderBy { column, direction })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Kind(String),
    Sent,
    Pending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CashOutScope {
    predicates: Vec<Predicate>,
    order: Option<OrderBy>,
    limit: Option<usize>,
}

impl CashOutScope {
    /// Every cash out regardless of subtype.
    pub fn all() -> Self {
        Self {
            predicates: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn paypal() -> Self {
        Self::all().kind(PAYPAL_KIND)
    }

    pub fn kind(mut self, kind: &str) -> Self {
        self.predicates.push(Predicate::Kind(kind.to_string()));
        self
    }

    /// Restrict to sent (`true`) or pending (`false`) rows.
    pub fn sent(mut self, sent: bool) -> Self {
        self.predicates
            .push(if sent { Predicate::Sent } else { Predicate::Pending });
        self
    }

    /// Replace the current ordering.
    pub fn reorder(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn ordering(&self) -> Option<OrderBy> {
        self.order
    }

    /// Apply the `sent` parameter.
    pub fn filter(self, params: &ListParams) -> Self {
        match params.sent.as_deref().map(|raw| (raw, parse_flag(raw))) {
            Some((_, Some(sent))) => self.sent(sent),
            Some((raw, None)) => {
                debug!("Ignoring unrecognised sent parameter: {:?}", raw);
                self
            }
            None => self,
        }
    }

    /// Apply the `order` parameter.
    pub fn order(self, params: &ListParams) -> Self {
        let Some(raw) = params.order.as_deref() else {
            return self;
        };

        match OrderBy::parse(raw) {
            Some(order) => self.reorder(order),
            None => {
                debug!("Ignoring unrecognised order parameter: {:?}", raw);
                self
            }
        }
    }

    pub(crate) fn to_sql(&self, columns: &str) -> (String, Vec<String>) {
        let mut sql = format!("SELECT {} FROM cash_outs", columns);
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        for predicate in &self.predicates {
            match predicate {
                Predicate::Kind(kind) => {
                    values.push(kind.clone());
                    clauses.push(format!("type = ?{}", values.len()));
                }
                Predicate::Sent => clauses.push("sent_at IS NOT NULL".to_string()),
                Predicate::Pending => clauses.push("sent_at IS NULL".to_string()),
            }
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        match self.order {
            Some(order) => sql.push_str(&format!(
                " ORDER BY {} {}, id ASC",
                order.column.as_sql(),
                order.direction.as_sql()
            )),
            None => sql.push_str(" ORDER BY id ASC"),
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        (sql, values)
    }
}

impl Default for CashOutScope {
    fn default() -> Self {
        Self::all()
    }
}

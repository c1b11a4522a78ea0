pub mod db;
pub mod models;
pub mod query;

pub use db::Database;
pub use models::{CashOut, CashOutState, DatabaseStats, NewCashOut, PAYPAL_KIND};
pub use query::{CashOutScope, Direction, ListParams, OrderBy, SortColumn};

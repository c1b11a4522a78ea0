pub mod clock;
pub mod config;
pub mod error;
pub mod payout;
pub mod paypal;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use error::{PayoutError, ProviderError, Result};

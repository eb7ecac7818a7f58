pub mod error;
pub mod types;

mod checked;

pub mod consumption;
pub mod costs;
pub mod generation;
pub mod project_fee;
pub mod returns;
pub mod settings;
pub mod tariff;

pub mod proposal;
pub mod quote;

pub use error::QuoteError;
pub use types::*;

/// Standard result type for all solar-quote operations
pub type QuoteCalcResult<T> = Result<T, QuoteError>;

pub mod energy;
pub mod pricing;
pub mod quote;

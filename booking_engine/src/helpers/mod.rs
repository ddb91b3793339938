pub mod pricing;

pub use pricing::{nights_between, quote_price};

mod rupees;
mod secret;

pub mod helpers;

pub use rupees::{Rupees, RupeesConversionError, INR_CURRENCY_CODE};
pub use secret::Secret;

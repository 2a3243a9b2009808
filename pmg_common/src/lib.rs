mod tiyin;

pub mod op;

pub use tiyin::{Tiyin, TiyinConversionError, UZS_CURRENCY_CODE, UZS_CURRENCY_CODE_LOWER};

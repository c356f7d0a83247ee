//! cf-core: shared building blocks for fire scenario decks.
//!
//! Contains:
//! - number (integer/decimal tokens that keep their written form)
//! - value (dynamically typed field values used by keyed access and the parser)
//! - ident (identifier rules and sentinels)
//! - record (namelist record builder)
//! - error (shared error types)

pub mod error;
pub mod ident;
pub mod number;
pub mod record;
pub mod value;

pub use error::{CoreError, CoreResult};
pub use ident::*;
pub use number::Number;
pub use record::{Record, RecordStyle};
pub use value::Value;

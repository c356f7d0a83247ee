//! cf-deck: reads fire scenario input decks back into a [`cf_model::CfastModel`].
//!
//! Contains:
//! - scanner (record state machine: quotes, comments, separators)
//! - reader (typed field access that reports unread fields)
//! - parser (record to entity mapping, reference resolution, fire assembly)
//! - error (parse errors with line and record keyword)

pub mod error;
pub mod parser;
mod reader;
pub mod scanner;

pub use error::{DeckError, DeckResult};
pub use parser::{parse_file, parse_str};
pub use scanner::{RawRecord, scan};

//! Text helpers shared by the chat and document rooms.

pub mod mentions;
pub mod sanitize;
pub mod validation;

pub use mentions::extract_mentions;
pub use sanitize::{HtmlSanitizer, TextSanitizer};
pub use validation::Validator;

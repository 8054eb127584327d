//! Parsing of generation output.
//!
//! Models answer with text. The text has to become a JSON object carrying
//! `json_logic`, `explanation` and `used_keys` before it reaches a caller;
//! anything else is an [`OutputParseError`], never a partial rule.

mod parser;

pub use parser::{parse_generated_rule, strip_code_fence, OutputParseError};

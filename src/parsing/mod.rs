//! HTML and body parsing. Everything here is pure.

pub mod encoding;
pub mod forms;
pub mod post_parser;

pub use encoding::decode_body;
pub use forms::{input_value, textarea_value, FormTokens};
pub use post_parser::{extract, page_count, parse_timestamp, posts_for_page, ThreadPage};

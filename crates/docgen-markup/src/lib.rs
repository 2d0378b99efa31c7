//! Markup tokenizer for docgen.
//!
//! Parses standard markdown (tables and strikethrough enabled) plus a few
//! document-layout extensions:
//!
//! - `:text:`, `::text::`, `:::text:::` justify text left, center or right
//! - `!text!` renders text with a hanging indent
//! - `\\*text*\\` hides text from the rendered page
//! - `\page` on its own line forces a page break
//! - `\thead <options>` configures the next table
//!
//! # Example
//!
//! ```
//! use docgen_markup::{Alignment, Custom, Token, tokenize};
//!
//! let tokens = tokenize("::Title::\n");
//! assert_eq!(tokens[1], Token::CustomOpen(Custom::Justify(Alignment::Center)));
//! ```

mod block;
mod delimiter;
mod extension;
mod fence;
mod hide;
mod skip;
mod token;
mod tokenizer;
mod util;

pub use block::{
    BlockMarker, LineMatch, PAGE_BREAK_MARKER, SettingsError, SizeMode, TABLE_SETTINGS_MARKER,
    TableHeaderSettings, match_line,
};
pub use delimiter::{CharClass, DelimiterRun, is_punctuation};
pub use extension::{Extension, MatchOutcome, SpanMatch, match_span};
pub use hide::{HIDE_CLOSE, HIDE_OPEN};
pub use token::{Alignment, Block, Custom, Inline, Token};
pub use tokenizer::Tokenizer;

/// Tokenize markup with the default [`Tokenizer`].
#[must_use]
pub fn tokenize(src: &str) -> Vec<Token> {
    Tokenizer::new().tokenize(src)
}

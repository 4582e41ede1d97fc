pub mod fixture;
pub mod player;
pub mod table;

use thiserror::Error;

pub use fixture::{parse_fixture, parse_fixtures, split_spans, FixtureTokenizer, TokenizerState};
pub use player::{parse_page_count, parse_player_summary};
pub use table::{parse_decimal, parse_int, parse_money, CellKind, RowReader};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{table}: expected {expected} columns, found {actual}")]
    ColumnCount {
        table: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{field}: cannot read a number from {value:?}")]
    InvalidNumber { field: String, value: String },

    #[error("fixture text has no closing `)`: {0:?}")]
    MissingTerminator(String),

    #[error("malformed fixture {span:?}: {reason}")]
    MalformedFixture { span: String, reason: String },

    #[error("player summary has {actual} lines, expected at least {expected}")]
    TooFewLines { expected: usize, actual: usize },

    #[error("cannot read page count from {0:?}")]
    PageCount(String),
}

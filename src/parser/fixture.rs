//! Tokenizer for the fixtures tab.
//!
//! The tab renders every fixture of a player as one run of text with no
//! separator between records. Each record ends with a parenthesised
//! home/away marker followed by a single difficulty digit, e.g.
//!
//! ```text
//! Sat 19 Oct 15:009ARS (H)3Sat 26 Oct 12:3010CHE (A)2TBCLIV (A)4
//! ```
//!
//! so the text is first cut into spans at each `)` (plus the digit after
//! it) and every span is then classified and tokenized on its own.

use super::ParseError;
use crate::model::{FixtureRecord, HomeAway};

pub const NBSP: char = '\u{a0}';

const TBC_MARKER: &str = "TBC";
const BLANK_MARKER: &str = "None";
const TBC_PREFIX_WIDTH: usize = 3;
const TIME_WIDTH: usize = 5;
const GAMEWEEK_WIDTH: usize = 2;
const DATE_SPACES: usize = 3;
const TAIL_SPACES: usize = 4;

/// Cuts the fixture text into raw spans, one per closing parenthesis.
///
/// A span runs from the end of the previous one up to and including the
/// character that follows the `)`. Trailing text with no `)` is dropped.
pub fn split_spans(text: &str) -> Result<Vec<&str>, ParseError> {
    if !text.contains(')') {
        return Err(ParseError::MissingTerminator(text.to_string()));
    }

    let mut spans = Vec::new();
    let mut start = 0;

    while let Some(offset) = text[start..].find(')') {
        let after_paren = start + offset + 1;
        let end = text[after_paren..]
            .chars()
            .next()
            .map(|c| after_paren + c.len_utf8())
            .unwrap_or(after_paren);

        spans.push(&text[start..end]);
        start = end;
    }

    Ok(spans)
}

pub fn parse_fixtures(text: &str) -> Result<Vec<FixtureRecord>, ParseError> {
    let mut fixtures = Vec::new();
    for span in split_spans(text)? {
        fixtures.extend(parse_fixture(span)?);
    }
    Ok(fixtures)
}

/// Parses one span. A double-match span yields a blank placeholder followed
/// by the real fixture; every other span yields exactly one record.
pub fn parse_fixture(span: &str) -> Result<Vec<FixtureRecord>, ParseError> {
    if let Some((head, rest)) = span.split_once(NBSP) {
        let mut records = vec![parse_blank(span, head)?];
        let rest = rest.trim_matches(|c: char| c == ' ' || c == NBSP);
        if rest.is_empty() {
            return Err(malformed(span, "nothing follows the blank gameweek"));
        }
        records.extend(parse_fixture(rest)?);
        return Ok(records);
    }

    if span.contains(TBC_MARKER) {
        return Ok(vec![parse_unscheduled(span)?]);
    }

    Ok(vec![FixtureTokenizer::tokenize(span)?])
}

fn malformed(span: &str, reason: impl Into<String>) -> ParseError {
    ParseError::MalformedFixture {
        span: span.to_string(),
        reason: reason.into(),
    }
}

fn parse_blank(span: &str, head: &str) -> Result<FixtureRecord, ParseError> {
    let marker = head
        .find(BLANK_MARKER)
        .ok_or_else(|| malformed(span, "blank gameweek without `None`"))?;

    let before = head[..marker].trim_end();
    let digits_start = before
        .rfind(|c: char| !c.is_ascii_digit())
        .map(|idx| idx + 1)
        .unwrap_or(0);

    let gameweek = before[digits_start..]
        .parse::<u8>()
        .map_err(|_| malformed(span, "blank gameweek has no number"))?;

    Ok(FixtureRecord::Blank { gameweek })
}

fn parse_difficulty(span: &str, digit: char) -> Result<u8, ParseError> {
    match digit.to_digit(10) {
        Some(value @ 1..=5) => Ok(value as u8),
        _ => Err(malformed(span, format!("difficulty {:?} outside 1-5", digit))),
    }
}

fn parse_home_away(span: &str, marker: char) -> Result<HomeAway, ParseError> {
    HomeAway::from_marker(marker)
        .ok_or_else(|| malformed(span, format!("unknown home/away marker {:?}", marker)))
}

fn parse_unscheduled(span: &str) -> Result<FixtureRecord, ParseError> {
    let trimmed = span.trim();
    let tokens: Vec<&str> = trimmed.split(' ').collect();
    let (opponent_token, details) = match tokens.as_slice() {
        [opponent, details] => (*opponent, *details),
        _ => return Err(malformed(span, "expected a single space in an unscheduled fixture")),
    };

    let opponent: String = opponent_token.chars().skip(TBC_PREFIX_WIDTH).collect();
    if opponent.is_empty() {
        return Err(malformed(span, "missing opponent"));
    }

    let marker = details
        .chars()
        .nth(1)
        .ok_or_else(|| malformed(span, "missing home/away marker"))?;
    let digit = details
        .chars()
        .last()
        .ok_or_else(|| malformed(span, "missing difficulty"))?;

    Ok(FixtureRecord::Unscheduled {
        opponent,
        home_away: parse_home_away(span, marker)?,
        difficulty: parse_difficulty(span, digit)?,
    })
}

/// States of the dated-fixture tokenizer, keyed off the running space count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerState {
    /// Before the 3rd space: everything, spaces included, is the date.
    InDate,
    /// Between the 3rd and 4th space: time, then gameweek, then opponent.
    InTimeOrGameweekOrOpponent,
    /// After the 4th space: the `(H)3` style tail.
    InDifficultyTail,
}

/// Character router for dated fixtures such as `Sat 19 Oct 15:009ARS (H)3`.
///
/// Transition table:
///
/// | state                        | input           | action                      | next                         |
/// |------------------------------|-----------------|-----------------------------|------------------------------|
/// | `InDate`                     | 3rd space       | drop                        | `InTimeOrGameweekOrOpponent` |
/// | `InDate`                     | any other       | append to date              | `InDate`                     |
/// | `InTimeOrGameweekOrOpponent` | 4th space       | drop                        | `InDifficultyTail`           |
/// | `InTimeOrGameweekOrOpponent` | any             | time while shorter than 5   | same                         |
/// |                              | digit           | else gameweek while < 2     | same                         |
/// |                              | any             | else opponent               | same                         |
/// | `InDifficultyTail`           | space, `(`, `)` | drop                        | same                         |
/// |                              | non-digit       | home/away marker            | same                         |
/// |                              | digit           | difficulty                  | same                         |
///
/// Fields have no stable delimiters, so the row order inside each state is
/// what separates them: time before gameweek before opponent, and home/away
/// before difficulty.
#[derive(Debug, Clone)]
pub struct FixtureTokenizer {
    state: TokenizerState,
    spaces: usize,
    date: String,
    time: String,
    gameweek: String,
    opponent: String,
    home_away: Option<char>,
    difficulty: Option<char>,
}

impl Default for FixtureTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureTokenizer {
    pub fn new() -> Self {
        Self {
            state: TokenizerState::InDate,
            spaces: 0,
            date: String::new(),
            time: String::new(),
            gameweek: String::new(),
            opponent: String::new(),
            home_away: None,
            difficulty: None,
        }
    }

    pub fn tokenize(span: &str) -> Result<FixtureRecord, ParseError> {
        let mut tokenizer = Self::new();
        span.chars().for_each(|c| tokenizer.feed(c));
        tokenizer.finish(span)
    }

    pub fn state(&self) -> TokenizerState {
        self.state
    }

    pub fn feed(&mut self, c: char) {
        if c == ' ' {
            self.spaces += 1;
        }

        match self.state {
            TokenizerState::InDate => {
                if c == ' ' && self.spaces == DATE_SPACES {
                    self.state = TokenizerState::InTimeOrGameweekOrOpponent;
                } else {
                    self.date.push(c);
                }
            }
            TokenizerState::InTimeOrGameweekOrOpponent => {
                if c == ' ' {
                    if self.spaces >= TAIL_SPACES {
                        self.state = TokenizerState::InDifficultyTail;
                    }
                } else if self.time.chars().count() < TIME_WIDTH {
                    self.time.push(c);
                } else if c.is_ascii_digit() && self.gameweek.len() < GAMEWEEK_WIDTH {
                    self.gameweek.push(c);
                } else {
                    self.opponent.push(c);
                }
            }
            TokenizerState::InDifficultyTail => match c {
                ' ' | '(' | ')' => {}
                c if c.is_ascii_digit() => self.difficulty = Some(c),
                c => self.home_away = Some(c),
            },
        }
    }

    pub fn finish(self, span: &str) -> Result<FixtureRecord, ParseError> {
        if self.state != TokenizerState::InDifficultyTail {
            return Err(malformed(span, "fixture ended before the home/away marker"));
        }
        if self.date.is_empty() || self.time.is_empty() {
            return Err(malformed(span, "missing kickoff date or time"));
        }
        let gameweek = self
            .gameweek
            .parse::<u8>()
            .map_err(|_| malformed(span, "missing gameweek"))?;
        if self.opponent.is_empty() {
            return Err(malformed(span, "missing opponent"));
        }
        let marker = self
            .home_away
            .ok_or_else(|| malformed(span, "missing home/away marker"))?;
        let digit = self
            .difficulty
            .ok_or_else(|| malformed(span, "missing difficulty"))?;

        Ok(FixtureRecord::Dated {
            date: self.date,
            time: self.time,
            gameweek,
            opponent: self.opponent,
            home_away: parse_home_away(span, marker)?,
            difficulty: parse_difficulty(span, digit)?,
        })
    }
}

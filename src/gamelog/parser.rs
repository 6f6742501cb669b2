//! Match segmentation over a stream of log lines
//!
//! The parser is a two-state machine. Outside a match it waits for
//! `InitGame:`; inside one it feeds kills into a [`Session`] until a
//! `ShutdownGame:` or `---` divider closes it. A divider is accepted as a
//! terminator because some logs end a match with one instead of a shutdown.

use std::borrow::Cow;
use std::io::BufRead;
use tracing::{debug, warn};

use super::classifier::{LineEvent, LinePatterns};
use super::error::ParseError;
use super::schema::Matches;
use super::session::Session;

/// Where the parser is between two lines
#[derive(Debug, Default)]
pub enum ParserState {
    #[default]
    LookingForMatch,
    MatchOpen(Session),
}

/// Incremental log parser.
///
/// Feed lines in order and call [`LogParser::finish`] at end of input.
#[derive(Debug)]
pub struct LogParser<'p> {
    patterns: &'p LinePatterns,
    state: ParserState,
    matches: Matches,
}

impl Default for LogParser<'static> {
    fn default() -> Self {
        Self::new(LinePatterns::global())
    }
}

impl<'p> LogParser<'p> {
    pub fn new(patterns: &'p LinePatterns) -> Self {
        Self {
            patterns,
            state: ParserState::LookingForMatch,
            matches: Matches::new(),
        }
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    pub fn is_match_open(&self) -> bool {
        matches!(self.state, ParserState::MatchOpen(_))
    }

    /// Matches closed so far
    pub fn matches(&self) -> &Matches {
        &self.matches
    }

    /// Classify and apply a raw line. `line_no` is 1-indexed.
    pub fn feed_line(&mut self, line_no: usize, line: &str) -> Result<(), ParseError> {
        match self.patterns.classify(line) {
            LineEvent::Malformed => Err(ParseError::Malformed { line: line_no }),
            event => {
                self.apply(event);
                Ok(())
            }
        }
    }

    /// Apply an event payload whose time header was already stripped
    pub fn feed_event(&mut self, payload: &str) {
        let event = self.patterns.classify_payload(payload);
        self.apply(event);
    }

    /// Apply a classified event to the state machine
    pub fn apply(&mut self, event: LineEvent<'_>) {
        let state = std::mem::take(&mut self.state);
        self.state = self.transition(state, event);
    }

    fn transition(&mut self, state: ParserState, event: LineEvent<'_>) -> ParserState {
        match (state, event) {
            (ParserState::LookingForMatch, LineEvent::MatchStart) => {
                debug!(game = self.matches.len() + 1, "Match opened");
                ParserState::MatchOpen(Session::new())
            }
            (ParserState::LookingForMatch, _) => ParserState::LookingForMatch,

            (ParserState::MatchOpen(mut session), LineEvent::Kill(kill)) => {
                session.register_kill(&kill);
                ParserState::MatchOpen(session)
            }
            (ParserState::MatchOpen(session), LineEvent::MatchEnd) => {
                let finished = session.finish();
                debug!(
                    game = self.matches.len() + 1,
                    total_kills = finished.total_kills,
                    players = finished.players.len(),
                    "Match closed"
                );
                self.matches.push(finished);
                ParserState::LookingForMatch
            }
            (ParserState::MatchOpen(session), LineEvent::MatchStart) => {
                warn!(
                    game = self.matches.len() + 1,
                    kills_so_far = session.total_kills(),
                    "InitGame while a match is open, continuing current match"
                );
                ParserState::MatchOpen(session)
            }
            (state @ ParserState::MatchOpen(_), LineEvent::Irrelevant | LineEvent::Malformed) => {
                state
            }
        }
    }

    /// End of input. Fails if a match is still open.
    pub fn finish(self) -> Result<Matches, ParseError> {
        match self.state {
            ParserState::MatchOpen(_) => Err(ParseError::UnterminatedMatch),
            ParserState::LookingForMatch => Ok(self.matches),
        }
    }
}

/// Parse a whole log using the shared default patterns
pub fn parse_log<R: BufRead>(reader: R) -> Result<Matches, ParseError> {
    parse_log_with(LinePatterns::global(), reader)
}

/// Parse a whole log with caller-supplied patterns.
///
/// Lines are decoded lossily, so a stray Latin-1 byte in a player name
/// doesn't abort the parse. [`ParseError::Read`] is reserved for the reader
/// itself failing.
pub fn parse_log_with<R: BufRead>(
    patterns: &LinePatterns,
    mut reader: R,
) -> Result<Matches, ParseError> {
    let mut parser = LogParser::new(patterns);
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| ParseError::Read {
                line: line_no + 1,
                source,
            })?;
        if read == 0 {
            break;
        }
        line_no += 1;
        parser.feed_line(line_no, &decode_line(&buf))?;
    }

    let matches = parser.finish()?;
    debug!(matches = matches.len(), "Log parsed");
    Ok(matches)
}

/// Strip the line terminator (`\n` or `\r\n`) and decode as UTF-8
fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw)
}

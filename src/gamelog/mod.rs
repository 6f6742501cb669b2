//! Quake III Arena game log interpretation
//!
//! Splits a server log into matches and tallies kills per match, ready to be
//! rendered as an ordered JSON report.

pub mod classifier;
pub mod error;
pub mod parser;
pub mod schema;
pub mod session;

pub use classifier::{KillEvent, LineEvent, LinePatterns, WORLD_ACTOR};
pub use error::ParseError;
pub use parser::{parse_log, parse_log_with, LogParser, ParserState};
pub use schema::{Match, Matches};
pub use session::Session;

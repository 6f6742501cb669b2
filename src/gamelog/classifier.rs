//! Per-line classification of raw server log lines
//!
//! Every line starts with a time header (`  0:00 `). The header is stripped
//! and the remaining payload is matched against the event patterns we care
//! about. Some logs contain divider lines preceded by stray numbers, e.g.
//!
//! ```text
//!  26  0:00 ------------------------------------------------------------
//! ```
//!
//! which the second header alternative accepts.

use regex::Regex;
use std::sync::LazyLock;

/// Actor name the server uses for environment kills
pub const WORLD_ACTOR: &str = "<world>";

// `\d` and `\s` match ASCII only
const HEADER_PATTERN: &str = r"(?-u)^\s*\d+:\d+\s|^\s*[\d\s:]+";
const KILL_PATTERN: &str =
    r"Kill:(?-u:\s\d+\s\d+\s\d+:\s)(.+)(?-u:\s)killed(?-u:\s)(.+)(?-u:\s)by(?-u:\s)(.+)";

const INIT_GAME: &str = "InitGame:";
const SHUTDOWN_GAME: &str = "ShutdownGame:";
const DIVIDER: &str = "---";

static DEFAULT_PATTERNS: LazyLock<LinePatterns> = LazyLock::new(LinePatterns::new);

/// A kill extracted from a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KillEvent<'a> {
    pub killer: &'a str,
    pub victim: &'a str,
    pub cause: &'a str,
}

impl KillEvent<'_> {
    /// Whether the environment, not a player, did the killing
    pub fn is_world_kill(&self) -> bool {
        self.killer == WORLD_ACTOR
    }
}

/// What a single line means to the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent<'a> {
    /// `InitGame:`
    MatchStart,
    /// `ShutdownGame:` or a `---` divider
    MatchEnd,
    Kill(KillEvent<'a>),
    /// Well-formed line carrying an event we don't track
    Irrelevant,
    /// No time header at all
    Malformed,
}

/// Compiled line patterns.
///
/// Immutable once built; share one instance across as many parses as needed.
#[derive(Debug, Clone)]
pub struct LinePatterns {
    header: Regex,
    kill: Regex,
}

impl Default for LinePatterns {
    fn default() -> Self {
        Self::new()
    }
}

impl LinePatterns {
    pub fn new() -> Self {
        Self {
            header: Regex::new(HEADER_PATTERN).expect("header pattern is valid"),
            kill: Regex::new(KILL_PATTERN).expect("kill pattern is valid"),
        }
    }

    /// Process-wide instance used by [`crate::gamelog::parse_log`]
    pub fn global() -> &'static LinePatterns {
        &DEFAULT_PATTERNS
    }

    /// Split a raw line into its event payload, or `None` if it has no header
    pub fn strip_header<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.header.find(line).map(|m| &line[m.end()..])
    }

    /// Classify a full raw line (header included)
    pub fn classify<'a>(&self, line: &'a str) -> LineEvent<'a> {
        match self.strip_header(line) {
            Some(payload) => self.classify_payload(payload),
            None => LineEvent::Malformed,
        }
    }

    /// Classify an event payload whose header was already stripped
    pub fn classify_payload<'a>(&self, payload: &'a str) -> LineEvent<'a> {
        if payload.starts_with(INIT_GAME) {
            return LineEvent::MatchStart;
        }

        if payload.starts_with(SHUTDOWN_GAME) || payload.starts_with(DIVIDER) {
            return LineEvent::MatchEnd;
        }

        match self.kill.captures(payload) {
            Some(caps) => {
                let (Some(killer), Some(victim), Some(cause)) =
                    (caps.get(1), caps.get(2), caps.get(3))
                else {
                    return LineEvent::Irrelevant;
                };
                LineEvent::Kill(KillEvent {
                    killer: killer.as_str(),
                    victim: victim.as_str(),
                    cause: cause.as_str().trim_end(),
                })
            }
            None => LineEvent::Irrelevant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> &'static LinePatterns {
        LinePatterns::global()
    }

    #[test]
    fn test_strip_timestamp_header() {
        assert_eq!(
            patterns().strip_header("  0:00 InitGame: \\sv_floodProtect\\1"),
            Some("InitGame: \\sv_floodProtect\\1")
        );
        assert_eq!(
            patterns().strip_header(" 20:37 ShutdownGame:"),
            Some("ShutdownGame:")
        );
        assert_eq!(
            patterns().strip_header("1:47 Kill: 1 2 3: a killed b by MOD_GAUNTLET"),
            Some("Kill: 1 2 3: a killed b by MOD_GAUNTLET")
        );
    }

    #[test]
    fn test_strip_divider_with_stray_numbers() {
        let line = " 26  0:00 ------------------------------------------------------------";
        assert_eq!(
            patterns().strip_header(line),
            Some("------------------------------------------------------------")
        );
        assert_eq!(patterns().classify(line), LineEvent::MatchEnd);
    }

    #[test]
    fn test_missing_header_is_malformed() {
        assert_eq!(patterns().classify("BadLine"), LineEvent::Malformed);
        assert_eq!(patterns().classify("InitGame:"), LineEvent::Malformed);
        assert_eq!(patterns().classify(""), LineEvent::Malformed);
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(patterns().classify("  0:00 InitGame: \\g_gametype\\0"), LineEvent::MatchStart);
        assert_eq!(patterns().classify(" 15:00 ShutdownGame:"), LineEvent::MatchEnd);
        assert_eq!(patterns().classify_payload("---"), LineEvent::MatchEnd);
    }

    #[test]
    fn test_kill_with_spaced_names() {
        let line = "  2:11 Kill: 2 4 6: Dono da Bola killed Zeh by MOD_ROCKET";
        assert_eq!(
            patterns().classify(line),
            LineEvent::Kill(KillEvent {
                killer: "Dono da Bola",
                victim: "Zeh",
                cause: "MOD_ROCKET",
            })
        );
    }

    #[test]
    fn test_world_kill() {
        let event = patterns()
            .classify_payload("Kill: 1022 2 22: <world> killed Isgalamido by MOD_TRIGGER_HURT");
        let LineEvent::Kill(kill) = event else {
            panic!("expected kill, got {:?}", event);
        };
        assert!(kill.is_world_kill());
        assert_eq!(kill.victim, "Isgalamido");
        assert_eq!(kill.cause, "MOD_TRIGGER_HURT");
    }

    #[test]
    fn test_cause_trailing_whitespace_trimmed() {
        let event =
            patterns().classify_payload("Kill: 3 3 7: Zeh killed Zeh by MOD_ROCKET_SPLASH\r");
        assert_eq!(
            event,
            LineEvent::Kill(KillEvent {
                killer: "Zeh",
                victim: "Zeh",
                cause: "MOD_ROCKET_SPLASH",
            })
        );
    }

    #[test]
    fn test_other_events_are_irrelevant() {
        for line in [
            " 20:34 ClientConnect: 2",
            "  0:25 ClientUserinfoChanged: 2 n\\Dono da Bola\\t\\0",
            "  1:05 Item: 2 weapon_rocketlauncher",
            "   ",
        ] {
            assert_eq!(patterns().classify(line), LineEvent::Irrelevant, "{:?}", line);
        }
    }

    #[test]
    fn test_non_ascii_digits_are_not_a_header() {
        // Arabic-Indic digits
        let line = "\u{0663}:\u{0664}\u{0665} InitGame:";
        assert_eq!(patterns().strip_header(line), None);
        assert_eq!(patterns().classify(line), LineEvent::Malformed);
    }

    #[test]
    fn test_non_ascii_space_does_not_separate_kill_fields() {
        // ideographic space between the kill ids
        let payload = "Kill: 1\u{3000}2 3: Zeh killed Mocinha by MOD_ROCKET";
        assert_eq!(patterns().classify_payload(payload), LineEvent::Irrelevant);
    }
}

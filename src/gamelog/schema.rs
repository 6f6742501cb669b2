//! Match statistics and their JSON report shape

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

const GAME_KEY_PREFIX: &str = "game_";

/// Statistics for one finished match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Every kill in the match, world kills included
    pub total_kills: u32,
    /// Human players seen as killer or victim, sorted
    pub players: Vec<String>,
    /// Net kills per player; world kills subtract from the victim
    pub kills: BTreeMap<String, i32>,
    /// Kill count per cause of death
    pub kills_by_means: BTreeMap<String, u32>,
}

/// Matches in the order they appear in the log.
///
/// Serializes as `{"game_1": {...}, "game_2": {...}}` with keys emitted in
/// that order, so the report preserves log order regardless of how the
/// consumer's map type orders keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matches(pub Vec<Match>);

impl Matches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, game: Match) {
        self.0.push(game);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Match> {
        self.0.iter()
    }

    /// Report key for the match at `index` (0-based in, 1-based out)
    pub fn key_for(index: usize) -> String {
        format!("{}{}", GAME_KEY_PREFIX, index + 1)
    }

    /// Write the report as JSON.
    ///
    /// `indent` of `None` writes a single line.
    pub fn write_json<W: Write>(&self, writer: W, indent: Option<usize>) -> serde_json::Result<()> {
        match indent {
            None => serde_json::to_writer(writer, self),
            Some(width) => {
                let indent = " ".repeat(width);
                let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
                let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
                self.serialize(&mut ser)
            }
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl std::ops::Index<usize> for Matches {
    type Output = Match;

    fn index(&self, index: usize) -> &Match {
        &self.0[index]
    }
}

impl IntoIterator for Matches {
    type Item = Match;
    type IntoIter = std::vec::IntoIter<Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<Vec<Match>> for Matches {
    fn from(games: Vec<Match>) -> Self {
        Self(games)
    }
}

impl Serialize for Matches {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (i, game) in self.0.iter().enumerate() {
            map.serialize_entry(&Self::key_for(i), game)?;
        }
        map.end()
    }
}

/// Parse `game_N` into a 0-based index
fn index_from_key(key: &str) -> Option<usize> {
    let n: usize = key.strip_prefix(GAME_KEY_PREFIX)?.parse().ok()?;
    // reject "game_0" and zero-padded forms like "game_01"
    if n == 0 || Matches::key_for(n - 1) != key {
        return None;
    }
    Some(n - 1)
}

struct MatchesVisitor;

impl<'de> Visitor<'de> for MatchesVisitor {
    type Value = Matches;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object keyed game_1..game_N")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Matches, A::Error> {
        let mut by_index: BTreeMap<usize, Match> = BTreeMap::new();

        while let Some(key) = access.next_key::<String>()? {
            let index = index_from_key(&key).ok_or_else(|| {
                <A::Error as de::Error>::custom(format!("unexpected key {:?}", key))
            })?;
            let game: Match = access.next_value()?;
            if by_index.insert(index, game).is_some() {
                return Err(de::Error::custom(format!("duplicate key {:?}", key)));
            }
        }

        // keys must be exactly 0..len once sorted
        if let Some((&last, _)) = by_index.iter().next_back() {
            if last + 1 != by_index.len() {
                let missing = (0..last).find(|i| !by_index.contains_key(i)).unwrap_or(last);
                return Err(de::Error::custom(format!(
                    "missing key {:?}",
                    Matches::key_for(missing)
                )));
            }
        }

        Ok(Matches(by_index.into_values().collect()))
    }
}

impl<'de> Deserialize<'de> for Matches {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(MatchesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(total_kills: u32, players: &[(&str, i32)], means: &[(&str, u32)]) -> Match {
        Match {
            total_kills,
            players: players.iter().map(|(p, _)| p.to_string()).collect(),
            kills: players.iter().map(|(p, k)| (p.to_string(), *k)).collect(),
            kills_by_means: means.iter().map(|(m, n)| (m.to_string(), *n)).collect(),
        }
    }

    #[test]
    fn test_match_field_names() {
        let m = game(1, &[("Isgalamido", 1), ("Mocinha", 0)], &[("MOD_ROCKET", 1)]);
        let value = serde_json::to_value(&m).unwrap();

        assert_eq!(value["total_kills"], 1);
        assert_eq!(value["players"], serde_json::json!(["Isgalamido", "Mocinha"]));
        assert_eq!(value["kills"]["Mocinha"], 0);
        assert_eq!(value["kills_by_means"]["MOD_ROCKET"], 1);
    }

    #[test]
    fn test_keys_follow_log_order() {
        let matches: Matches = (0..12).map(|n| game(n, &[], &[])).collect::<Vec<_>>().into();
        let json = serde_json::to_string(&matches).unwrap();

        // string ordering would put game_10 before game_2
        let positions: Vec<usize> = (0..12)
            .map(|i| json.find(&format!("\"{}\":", Matches::key_for(i))).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_keys_round_trip_without_gaps() {
        let matches: Matches = (0..5).map(|n| game(n, &[], &[])).collect::<Vec<_>>().into();
        let json = matches.to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 5);
        for i in 0..5 {
            assert!(value.get(Matches::key_for(i)).is_some());
        }
    }

    #[test]
    fn test_empty_matches_is_empty_object() {
        let json = serde_json::to_string(&Matches::new()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_deserialize_out_of_order_keys() {
        let json = r#"{
            "game_2": {"total_kills": 2, "players": [], "kills": {}, "kills_by_means": {}},
            "game_1": {"total_kills": 1, "players": [], "kills": {}, "kills_by_means": {}}
        }"#;
        let matches: Matches = serde_json::from_str(json).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].total_kills, 1);
        assert_eq!(matches[1].total_kills, 2);
    }

    #[test]
    fn test_deserialize_rejects_gap() {
        let json = r#"{
            "game_1": {"total_kills": 1, "players": [], "kills": {}, "kills_by_means": {}},
            "game_3": {"total_kills": 3, "players": [], "kills": {}, "kills_by_means": {}}
        }"#;
        let err = serde_json::from_str::<Matches>(json).unwrap_err();
        assert!(err.to_string().contains("game_2"));
    }

    #[test]
    fn test_deserialize_rejects_foreign_keys() {
        for key in ["game_0", "game_01", "match_1", "game_x"] {
            let game = r#"{"total_kills": 0, "players": [], "kills": {}, "kills_by_means": {}}"#;
            let json = format!(r#"{{"{}": {}}}"#, key, game);
            assert!(serde_json::from_str::<Matches>(&json).is_err(), "accepted {}", key);
        }
    }

    #[test]
    fn test_report_round_trip() {
        let matches = Matches(vec![
            game(0, &[], &[]),
            game(
                4,
                &[("Dono da Bola", -1), ("Isgalamido", 1), ("Mocinha", 0), ("Zeh", -2)],
                &[("MOD_FALLING", 1), ("MOD_ROCKET", 1), ("MOD_TRIGGER_HURT", 2)],
            ),
        ]);
        let mut out = Vec::new();
        matches.write_json(&mut out, None).unwrap();
        let back: Matches = serde_json::from_slice(&out).unwrap();
        assert_eq!(back, matches);
    }

    #[test]
    fn test_write_json_indent() {
        let matches = Matches(vec![game(0, &[], &[])]);
        let mut out = Vec::new();
        matches.write_json(&mut out, Some(4)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("{\n    \"game_1\": {\n        \"total_kills\": 0"));
    }
}

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HomeAway {
    Home,
    Away,
}

impl HomeAway {
    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            'H' => Some(HomeAway::Home),
            'A' => Some(HomeAway::Away),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gameweek {
    Week(u8),
    Tbc,
}

const TBC: &str = "TBC";

impl fmt::Display for Gameweek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gameweek::Week(week) => write!(f, "{}", week),
            Gameweek::Tbc => write!(f, "{}", TBC),
        }
    }
}

/// Stored as the week number, or the string `"TBC"`.
impl Serialize for Gameweek {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Gameweek::Week(week) => serializer.serialize_u8(*week),
            Gameweek::Tbc => serializer.serialize_str(TBC),
        }
    }
}

impl<'de> Deserialize<'de> for Gameweek {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Week(u8),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Week(week) => Ok(Gameweek::Week(week)),
            Raw::Text(text) if text == TBC => Ok(Gameweek::Tbc),
            Raw::Text(text) => Err(D::Error::custom(format!("invalid gameweek {:?}", text))),
        }
    }
}

/// One upcoming fixture of a player's team.
///
/// Every shape is stored with `gameweek` and `opponent`, so readers can
/// treat the three alike: unscheduled fixtures carry `"TBC"` and blank
/// gameweeks carry the `"None"` opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "FixtureDocument", try_from = "FixtureDocument")]
pub enum FixtureRecord {
    Dated {
        date: String,
        time: String,
        gameweek: u8,
        opponent: String,
        home_away: HomeAway,
        difficulty: u8,
    },
    /// Kickoff not confirmed yet.
    Unscheduled {
        opponent: String,
        home_away: HomeAway,
        difficulty: u8,
    },
    /// Gameweek in which the team has no match.
    Blank { gameweek: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum FixtureKind {
    Dated,
    Unscheduled,
    Blank,
}

/// Stored form of a [`FixtureRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FixtureDocument {
    kind: FixtureKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time: Option<String>,
    gameweek: Gameweek,
    opponent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    home_away: Option<HomeAway>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    difficulty: Option<u8>,
}

impl From<FixtureRecord> for FixtureDocument {
    fn from(record: FixtureRecord) -> Self {
        match record {
            FixtureRecord::Dated {
                date,
                time,
                gameweek,
                opponent,
                home_away,
                difficulty,
            } => FixtureDocument {
                kind: FixtureKind::Dated,
                date: Some(date),
                time: Some(time),
                gameweek: Gameweek::Week(gameweek),
                opponent,
                home_away: Some(home_away),
                difficulty: Some(difficulty),
            },
            FixtureRecord::Unscheduled {
                opponent,
                home_away,
                difficulty,
            } => FixtureDocument {
                kind: FixtureKind::Unscheduled,
                date: None,
                time: None,
                gameweek: Gameweek::Tbc,
                opponent,
                home_away: Some(home_away),
                difficulty: Some(difficulty),
            },
            FixtureRecord::Blank { gameweek } => FixtureDocument {
                kind: FixtureKind::Blank,
                date: None,
                time: None,
                gameweek: Gameweek::Week(gameweek),
                opponent: FixtureRecord::BLANK_OPPONENT.to_string(),
                home_away: None,
                difficulty: None,
            },
        }
    }
}

impl TryFrom<FixtureDocument> for FixtureRecord {
    type Error = String;

    fn try_from(doc: FixtureDocument) -> Result<Self, Self::Error> {
        let missing = |field: &str| format!("{:?} fixture without {}", doc.kind, field);

        match (doc.kind, doc.gameweek) {
            (FixtureKind::Dated, Gameweek::Week(gameweek)) => Ok(FixtureRecord::Dated {
                date: doc.date.clone().ok_or_else(|| missing("date"))?,
                time: doc.time.clone().ok_or_else(|| missing("time"))?,
                gameweek,
                opponent: doc.opponent.clone(),
                home_away: doc.home_away.ok_or_else(|| missing("home_away"))?,
                difficulty: doc.difficulty.ok_or_else(|| missing("difficulty"))?,
            }),
            (FixtureKind::Unscheduled, Gameweek::Tbc) => Ok(FixtureRecord::Unscheduled {
                opponent: doc.opponent.clone(),
                home_away: doc.home_away.ok_or_else(|| missing("home_away"))?,
                difficulty: doc.difficulty.ok_or_else(|| missing("difficulty"))?,
            }),
            (FixtureKind::Blank, Gameweek::Week(gameweek)) => Ok(FixtureRecord::Blank { gameweek }),
            (kind, gameweek) => Err(format!("{:?} fixture with gameweek {}", kind, gameweek)),
        }
    }
}

impl FixtureRecord {
    pub const BLANK_OPPONENT: &'static str = "None";

    pub fn gameweek(&self) -> Gameweek {
        match self {
            FixtureRecord::Dated { gameweek, .. } | FixtureRecord::Blank { gameweek } => {
                Gameweek::Week(*gameweek)
            }
            FixtureRecord::Unscheduled { .. } => Gameweek::Tbc,
        }
    }

    pub fn opponent(&self) -> &str {
        match self {
            FixtureRecord::Dated { opponent, .. } | FixtureRecord::Unscheduled { opponent, .. } => {
                opponent
            }
            FixtureRecord::Blank { .. } => Self::BLANK_OPPONENT,
        }
    }

    pub fn home_away(&self) -> Option<HomeAway> {
        match self {
            FixtureRecord::Dated { home_away, .. }
            | FixtureRecord::Unscheduled { home_away, .. } => Some(*home_away),
            FixtureRecord::Blank { .. } => None,
        }
    }

    pub fn difficulty(&self) -> Option<u8> {
        match self {
            FixtureRecord::Dated { difficulty, .. }
            | FixtureRecord::Unscheduled { difficulty, .. } => Some(*difficulty),
            FixtureRecord::Blank { .. } => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, FixtureRecord::Blank { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialized_shape() {
        let dated = FixtureRecord::Dated {
            date: "Sat 19 Oct".to_string(),
            time: "15:00".to_string(),
            gameweek: 9,
            opponent: "ARS".to_string(),
            home_away: HomeAway::Home,
            difficulty: 3,
        };
        assert_eq!(
            serde_json::to_value(&dated).unwrap(),
            json!({
                "kind": "dated",
                "date": "Sat 19 Oct",
                "time": "15:00",
                "gameweek": 9,
                "opponent": "ARS",
                "home_away": "home",
                "difficulty": 3
            })
        );
    }

    #[test]
    fn test_blank_is_stored_with_none_opponent() {
        let value = serde_json::to_value(FixtureRecord::Blank { gameweek: 11 }).unwrap();
        assert_eq!(
            value,
            json!({ "kind": "blank", "gameweek": 11, "opponent": "None" })
        );

        let back: FixtureRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, FixtureRecord::Blank { gameweek: 11 });
    }

    #[test]
    fn test_unscheduled_is_stored_with_tbc_gameweek() {
        let unscheduled = FixtureRecord::Unscheduled {
            opponent: "LIV".to_string(),
            home_away: HomeAway::Away,
            difficulty: 4,
        };
        let value = serde_json::to_value(&unscheduled).unwrap();
        assert_eq!(
            value,
            json!({
                "kind": "unscheduled",
                "gameweek": "TBC",
                "opponent": "LIV",
                "home_away": "away",
                "difficulty": 4
            })
        );

        let back: FixtureRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, unscheduled);
    }

    #[test]
    fn test_mismatched_gameweek_is_rejected() {
        let doc = json!({
            "kind": "unscheduled",
            "gameweek": 12,
            "opponent": "LIV",
            "home_away": "away",
            "difficulty": 4
        });
        assert!(serde_json::from_value::<FixtureRecord>(doc).is_err());
        assert!(serde_json::from_value::<Gameweek>(json!("soon")).is_err());
    }

    #[test]
    fn test_blank_accessors() {
        let blank = FixtureRecord::Blank { gameweek: 11 };
        assert_eq!(blank.opponent(), FixtureRecord::BLANK_OPPONENT);
        assert_eq!(blank.gameweek().to_string(), "11");
        assert_eq!(blank.home_away(), None);
        assert_eq!(Gameweek::Tbc.to_string(), "TBC");
    }
}

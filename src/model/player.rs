use super::fixture::FixtureRecord;
use super::stats::{HistoryRecord, SeasonStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "Goalkeeper",
            Position::Defender => "Defender",
            Position::Midfielder => "Midfielder",
            Position::Forward => "Forward",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Position {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::ALL
            .into_iter()
            .find(|position| position.label() == s.trim())
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Yellow,
    Red,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "flag", rename_all = "lowercase")]
pub enum PlayerStatus {
    Active,
    Flagged { severity: Severity, reason: String },
}

/// Header block of the detail dialog, before any table is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub status: PlayerStatus,
    pub position: Position,
    pub name: String,
    pub team: String,
    pub price: f64,
    pub form: f64,
    pub points_per_match: f64,
    pub gameweek_points: i32,
    pub total_points: i32,
    pub total_bonus: i32,
    pub ict_index: f64,
    #[serde(rename = "tsb")]
    pub selected_by_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(flatten)]
    pub summary: PlayerSummary,
    pub season_stats: SeasonStats,
    pub history: Vec<HistoryRecord>,
    pub fixtures: Vec<FixtureRecord>,
    pub last_updated: DateTime<Utc>,
}

impl PlayerRecord {
    pub fn new(
        summary: PlayerSummary,
        season_stats: SeasonStats,
        history: Vec<HistoryRecord>,
        fixtures: Vec<FixtureRecord>,
    ) -> Self {
        Self {
            summary,
            season_stats,
            history,
            fixtures,
            last_updated: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.summary.name
    }

    pub fn is_flagged(&self) -> bool {
        matches!(self.summary.status, PlayerStatus::Flagged { .. })
    }
}

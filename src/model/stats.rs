use crate::parser::table::{CellKind, RowReader};
use crate::parser::ParseError;
use serde::{Deserialize, Serialize};

/// Declares a flat stats record together with its column schema.
///
/// Field order is column order; each field names the coercion applied to
/// its cell. `from_cells` rejects rows whose length differs from the schema.
macro_rules! stat_table {
    (
        $(#[$meta:meta])*
        $name:ident => $table:literal {
            $( $(#[$fmeta:meta])* $field:ident: $ty:ty => $kind:ident ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty ),+
        }

        impl $name {
            pub const TABLE: &'static str = $table;
            pub const COLUMNS: &'static [(&'static str, CellKind)] =
                &[$( (stringify!($field), CellKind::$kind) ),+];

            pub fn from_cells(cells: &[String]) -> Result<Self, ParseError> {
                let mut row = RowReader::new(Self::TABLE, Self::COLUMNS, cells)?;
                Ok(Self {
                    $( $field: row.next()? ),+
                })
            }
        }
    };
}

stat_table! {
    /// One row of the current season's per-gameweek table.
    GameweekStatRecord => "gameweek_stats" {
        gameweek: i32 => Int,
        opponent: String => Text,
        outcome: String => Text,
        points: i32 => Int,
        start: i32 => Int,
        minutes_played: i32 => Int,
        goals_scored: i32 => Int,
        assists: i32 => Int,
        expected_goals: f64 => Decimal,
        expected_assists: f64 => Decimal,
        expected_goal_involvements: f64 => Decimal,
        clean_sheets: i32 => Int,
        goals_conceded: i32 => Int,
        expected_goals_conceded: f64 => Decimal,
        own_goals: i32 => Int,
        penalties_saved: i32 => Int,
        penalties_missed: i32 => Int,
        yellow_cards: i32 => Int,
        red_cards: i32 => Int,
        saves: i32 => Int,
        bonus_points: i32 => Int,
        bonus_points_system: i32 => Int,
        influence: f64 => Decimal,
        creativity: f64 => Decimal,
        threat: f64 => Decimal,
        ict_index: f64 => Decimal,
        #[serde(rename = "nt")]
        net_transfers: i32 => Int,
        #[serde(rename = "sb")]
        selected_by: i32 => Int,
        price: f64 => Money,
    }
}

stat_table! {
    SeasonTotals => "season_totals" {
        points: i32 => Int,
        starts: i32 => Int,
        minutes: i32 => Int,
        goals_scored: i32 => Int,
        assists: i32 => Int,
        expected_goals: f64 => Decimal,
        expected_assists: f64 => Decimal,
        expected_goal_involvements: f64 => Decimal,
        clean_sheets: i32 => Int,
        goals_conceded: i32 => Int,
        expected_goals_conceded: f64 => Decimal,
        own_goals: i32 => Int,
        penalties_saved: i32 => Int,
        penalties_missed: i32 => Int,
        yellow_cards: i32 => Int,
        red_cards: i32 => Int,
        saves: i32 => Int,
        bonus_points: i32 => Int,
        bonus_point_system: i32 => Int,
        influence: f64 => Decimal,
        creativity: f64 => Decimal,
        threat: f64 => Decimal,
        ict_index: f64 => Decimal,
    }
}

stat_table! {
    PerNinetyStats => "per_ninety" {
        expected_goals: f64 => Decimal,
        expected_assists: f64 => Decimal,
        expected_goal_involvements: f64 => Decimal,
        clean_sheets: f64 => Decimal,
        goals_conceded: f64 => Decimal,
        expected_goals_conceded: f64 => Decimal,
        saves: f64 => Decimal,
    }
}

stat_table! {
    /// One previous season from the player's history table.
    HistoryRecord => "history" {
        season: String => Text,
        points: i32 => Int,
        games_started: i32 => Int,
        minutes_played: i32 => Int,
        goals_scored: i32 => Int,
        assists: i32 => Int,
        expected_goals: f64 => Decimal,
        expected_assists: f64 => Decimal,
        expected_goal_involvements: f64 => Decimal,
        clean_sheets: i32 => Int,
        goals_conceded: i32 => Int,
        expected_goals_conceded: f64 => Decimal,
        own_goals: i32 => Int,
        penalties_saved: i32 => Int,
        penalties_missed: i32 => Int,
        yellow_cards: i32 => Int,
        red_cards: i32 => Int,
        saves: i32 => Int,
        bonus_points: i32 => Int,
        bonus_points_system: i32 => Int,
        influence: f64 => Decimal,
        creativity: f64 => Decimal,
        threat: f64 => Decimal,
        ict_index: f64 => Decimal,
        season_start_price: f64 => Money,
        season_end_price: f64 => Money,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub season_totals: Option<SeasonTotals>,
    #[serde(rename = "stats_per_ninety")]
    pub per_ninety: Option<PerNinetyStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonStats {
    pub gameweek_stats: Vec<GameweekStatRecord>,
    pub aggregate_stats: AggregateStats,
}

pub mod fixture;
pub mod player;
pub mod stats;

pub use fixture::{FixtureRecord, Gameweek, HomeAway};
pub use player::{PlayerRecord, PlayerStatus, PlayerSummary, Position, Severity};
pub use stats::{
    AggregateStats, GameweekStatRecord, HistoryRecord, PerNinetyStats, SeasonStats, SeasonTotals,
};

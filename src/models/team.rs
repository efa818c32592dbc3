//! Team standings models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Prime League team tracked by the sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamConfig {
    /// Store key (e.g. "prime")
    pub key: String,

    /// PrimeBot team id
    pub id: String,

    /// Division label used when the upstream has none
    #[serde(default)]
    pub division: Option<String>,
}

impl TeamConfig {
    pub fn new(key: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            id: id.into(),
            division: None,
        }
    }

    pub fn with_division(mut self, division: impl Into<String>) -> Self {
        self.division = Some(division.into());
        self
    }
}

/// Outcome of a played match from the team's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    W,
    D,
    L,
}

impl Outcome {
    /// Compare the team's score against the opponent's.
    pub fn from_scores(own: u32, opponent: u32) -> Self {
        match own.cmp(&opponent) {
            std::cmp::Ordering::Greater => Outcome::W,
            std::cmp::Ordering::Less => Outcome::L,
            std::cmp::Ordering::Equal => Outcome::D,
        }
    }

    /// Long label shown on the last-match card.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::W => "WIN",
            Outcome::D => "DRAW",
            Outcome::L => "LOSS",
        }
    }
}

/// How league points are derived from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PointsPolicy {
    /// wins * 3
    #[default]
    ThreePerWin,
    /// wins * 3 + draws
    ThreePerWinPlusDraw,
    /// wins only ("map points")
    WinsOnly,
}

impl PointsPolicy {
    pub fn points(&self, wins: u32, draws: u32) -> u32 {
        match self {
            PointsPolicy::ThreePerWin => wins * 3,
            PointsPolicy::ThreePerWinPlusDraw => wins * 3 + draws,
            PointsPolicy::WinsOnly => wins,
        }
    }
}

/// Aggregated record over the played matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub points: u32,
    pub games: u32,

    /// Percentage, 0-100
    pub win_rate: u32,

    /// Recent outcomes, most recent last
    pub form: Vec<Outcome>,
}

impl DerivedStats {
    /// Build stats from raw tallies, filling in games, win rate and points.
    pub fn new(wins: u32, losses: u32, draws: u32, form: Vec<Outcome>, policy: PointsPolicy) -> Self {
        let games = wins + losses + draws;
        Self {
            wins,
            losses,
            draws,
            points: policy.points(wins, draws),
            games,
            win_rate: win_rate_percent(wins, games),
            form,
        }
    }
}

/// `round(100 * wins / games)`, or 0 without games.
pub fn win_rate_percent(wins: u32, games: u32) -> u32 {
    if games == 0 {
        0
    } else {
        (100.0 * wins as f64 / games as f64).round() as u32
    }
}

/// The nearest upcoming match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextMatch {
    /// Opponent tag
    pub tag: String,
    pub date: DateTime<Utc>,
    pub link: Option<String>,
}

/// The most recent played match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMatch {
    /// Opponent tag
    pub tag: String,

    /// Score normalized to "<own>:<opponent>", e.g. "2:0"
    pub score: String,

    /// "WIN", "LOSS" or "DRAW"
    pub outcome: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub summoner: String,
    pub is_captain: bool,
}

/// Display metadata for a team card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMeta {
    pub name: String,
    pub div: String,
}

/// One team's entry in `prime_stats.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub meta: TeamMeta,

    /// Place in the division table, if the league reports one
    #[serde(default)]
    pub position: Option<u32>,
    pub logo: Option<String>,
    pub team_link: Option<String>,
    pub stats: DerivedStats,
    pub next_match: Option<NextMatch>,
    pub last_match: Option<LastMatch>,
    #[serde(default)]
    pub roster: Vec<RosterEntry>,
    pub last_updated: DateTime<Utc>,
}

//! Ranked player models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Queue used as the player's primary ranked statistic.
pub const SOLO_QUEUE: &str = "RANKED_SOLO_5x5";

/// A player tracked by Riot ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Store key, `<team>_<role>`
    pub key: String,
    pub game_name: String,
    pub tag_line: String,
}

impl PlayerConfig {
    pub fn new(key: impl Into<String>, game_name: impl Into<String>, tag_line: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            game_name: game_name.into(),
            tag_line: tag_line.into(),
        }
    }

    /// Placeholder slots carry an empty Riot ID.
    pub fn is_placeholder(&self) -> bool {
        self.game_name.trim().is_empty()
    }

    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.game_name, self.tag_line)
    }
}

/// One player's entry in `data.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub level: u32,

    /// "UNRANKED" or "<TIER> <DIVISION>"
    pub rank: String,
    pub league_points: u32,

    /// "<wins>/<losses>"
    pub wl: String,
    pub icon: String,
    pub last_updated: DateTime<Utc>,
}

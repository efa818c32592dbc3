//! Configuration loading and validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{PlayerConfig, PointsPolicy, TeamConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("{0} is not set; it is required to sync player ranks")]
    MissingCredential(String),
}

/// Roles assigned to roster slots in order.
pub const ROLES: [&str; 6] = ["top", "jgl", "mid", "bot", "sup", "coach"];

/// Request pacing shared by every source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Delay between sequential entity fetches
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,

    /// Timeout for a single HTTP request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_request_delay() -> u64 {
    1200
}

fn default_request_timeout() -> u64 {
    20
}

fn default_user_agent() -> String {
    format!("uic-sync/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay(),
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// PrimeBot (Prime League) API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimeBotConfig {
    #[serde(default = "default_primebot_url")]
    pub base_url: String,
}

fn default_primebot_url() -> String {
    "https://primebot.me/api/v1".to_string()
}

impl Default for PrimeBotConfig {
    fn default() -> Self {
        Self {
            base_url: default_primebot_url(),
        }
    }
}

/// Riot Games API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiotConfig {
    /// Regional routing host for account-v1
    #[serde(default = "default_account_url")]
    pub account_base_url: String,

    /// Platform host for summoner-v4 and league-v4
    #[serde(default = "default_platform_url")]
    pub platform_base_url: String,

    /// Data Dragon version used for profile icon URLs
    #[serde(default = "default_ddragon_version")]
    pub ddragon_version: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_account_url() -> String {
    "https://europe.api.riotgames.com".to_string()
}

fn default_platform_url() -> String {
    "https://euw1.api.riotgames.com".to_string()
}

fn default_ddragon_version() -> String {
    "13.24.1".to_string()
}

fn default_api_key_env() -> String {
    "RIOT_API_KEY".to_string()
}

impl Default for RiotConfig {
    fn default() -> Self {
        Self {
            account_base_url: default_account_url(),
            platform_base_url: default_platform_url(),
            ddragon_version: default_ddragon_version(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Rules for turning a match history into standings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRules {
    #[serde(default)]
    pub points_policy: PointsPolicy,

    /// Count every match type, not just league matches
    #[serde(default)]
    pub count_all_match_types: bool,

    #[serde(default = "default_league_match_type")]
    pub league_match_type: String,

    /// Matches before this instant are ignored entirely
    #[serde(default)]
    pub season_start: Option<DateTime<Utc>>,

    /// How far back a lineup appearance keeps a member on the roster
    #[serde(default = "default_roster_window")]
    pub roster_window_days: u32,

    #[serde(default = "default_form_length")]
    pub form_length: usize,
}

fn default_league_match_type() -> String {
    "league".to_string()
}

fn default_roster_window() -> u32 {
    120
}

fn default_form_length() -> usize {
    5
}

impl Default for TeamRules {
    fn default() -> Self {
        Self {
            points_policy: PointsPolicy::default(),
            count_all_match_types: false,
            league_match_type: default_league_match_type(),
            season_start: None,
            roster_window_days: default_roster_window(),
            form_length: default_form_length(),
        }
    }
}

impl TeamRules {
    /// Whether a match with this type tag counts towards the record.
    /// Untagged matches always count.
    pub fn counts_match_type(&self, match_type: Option<&str>) -> bool {
        match match_type {
            Some(t) if !self.count_all_match_types => t.eq_ignore_ascii_case(&self.league_match_type),
            _ => true,
        }
    }
}

/// A Riot ID as written in the config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiotId {
    pub game_name: String,
    pub tag_line: String,
}

impl RiotId {
    fn new(game_name: &str, tag_line: &str) -> Self {
        Self {
            game_name: game_name.to_string(),
            tag_line: tag_line.to_string(),
        }
    }
}

/// The players of one team, in role order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRoster {
    pub team: String,
    pub players: Vec<RiotId>,
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory the JSON caches are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_teams_output")]
    pub teams_output: String,

    #[serde(default = "default_players_output")]
    pub players_output: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub sync: SyncSettings,

    #[serde(default)]
    pub primebot: PrimeBotConfig,

    #[serde(default)]
    pub riot: RiotConfig,

    #[serde(default)]
    pub rules: TeamRules,

    #[serde(default = "default_teams")]
    pub teams: Vec<TeamConfig>,

    #[serde(default = "default_rosters")]
    pub rosters: Vec<TeamRoster>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_teams_output() -> String {
    "prime_stats.json".to_string()
}

fn default_players_output() -> String {
    "data.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_teams() -> Vec<TeamConfig> {
    [
        ("prime", "116908"),
        ("spark", "208694"),
        ("ember", "211165"),
        ("nova", "203447"),
        ("abyss", "204924"),
        ("night", "212047"),
        ("freezer", "131594"),
    ]
    .into_iter()
    .map(|(key, id)| TeamConfig::new(key, id))
    .collect()
}

fn default_rosters() -> Vec<TeamRoster> {
    let roster = |team: &str, players: &[(&str, &str)]| TeamRoster {
        team: team.to_string(),
        players: players.iter().map(|(n, t)| RiotId::new(n, t)).collect(),
    };

    vec![
        roster(
            "prime",
            &[
                ("UIC Speedy", "EUW"),
                ("UIC Niki", "AMB"),
                ("UIC Shenycrane", "Vugel"),
                ("UIC Giani", "999"),
                ("UIC Baguetto", "R3kt"),
            ],
        ),
        roster(
            "spark",
            &[
                ("skanpy", "3005"),
                ("UIC Lenno", "UIC"),
                ("UIC Rhinoshield", "RIN"),
                ("UIC Flare", "JND"),
                ("", ""),
                ("soulrender", "fent"),
            ],
        ),
        roster(
            "ember",
            &[
                ("SilasX", "EUWde"),
                ("UIC Shederen", "Ger"),
                ("ResetHoe", "Kata"),
                ("UIC DontMethWith", "AMB"),
                ("UIC Envy", "UIC"),
                ("RatHairedShanks", "NoPie"),
            ],
        ),
        roster(
            "nova",
            &[
                ("TAS Kaetaya", "XwX"),
                ("UIC Rubix Qube", "MÖP"),
                ("UIC adedier", "EUWE"),
                ("UIC Simply", "666"),
                ("UIC Excellent C", "1997"),
            ],
        ),
        roster(
            "abyss",
            &[
                ("Dany", "RFA40"),
                ("UIC Keygasza", "1337"),
                ("UIC Goku", "UIC"),
                ("UIC N1ghtm4reX", "H96"),
                ("TheEigeeen", "EIGI"),
            ],
        ),
        roster(
            "night",
            &[
                ("UIC proStarII", "UIC"),
                ("Shekar", "5ONiT"),
                ("RatHairedShanks", "NoPie"),
                ("Cedopanya", "EUW"),
                ("UIC ReCord", "Cedo"),
            ],
        ),
        roster(
            "freezer",
            &[
                ("Rayando07", "grag"),
                ("BlauerKlaus", "Qvy心"),
                ("UIC FrozenHands", "MID"),
                ("RG AutumnLeaf", "Moo"),
                ("UIC Ryu Copeland", "117"),
                ("UIC Loonz", "Coach"),
            ],
        ),
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            teams_output: default_teams_output(),
            players_output: default_players_output(),
            log_level: default_log_level(),
            sync: SyncSettings::default(),
            primebot: PrimeBotConfig::default(),
            riot: RiotConfig::default(),
            rules: TeamRules::default(),
            teams: default_teams(),
            rosters: default_rosters(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to the built-in tables.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.rules.form_length == 0 || self.rules.form_length > 5 {
            return Err(ConfigError::ValidationError(
                "Form length must be between 1 and 5".to_string(),
            ));
        }

        if self.teams_output.is_empty() || self.players_output.is_empty() {
            return Err(ConfigError::ValidationError(
                "Output file names must not be empty".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for team in &self.teams {
            if team.key.is_empty() || team.id.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "Team entry needs both key and id: {:?}",
                    team
                )));
            }
            if !seen.insert(team.key.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate team key: {}",
                    team.key
                )));
            }
        }

        let mut seen_rosters = std::collections::HashSet::new();
        for roster in &self.rosters {
            if !seen_rosters.insert(roster.team.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate roster team: {}",
                    roster.team
                )));
            }
            if roster.players.len() > ROLES.len() {
                return Err(ConfigError::ValidationError(format!(
                    "Roster {} has {} players, at most {} roles exist",
                    roster.team,
                    roster.players.len(),
                    ROLES.len()
                )));
            }
        }

        Ok(())
    }

    /// Flatten rosters into player entries keyed `<team>_<role>`.
    pub fn player_configs(&self) -> Vec<PlayerConfig> {
        self.rosters
            .iter()
            .flat_map(|roster| {
                roster.players.iter().zip(ROLES).map(|(id, role)| {
                    PlayerConfig::new(
                        format!("{}_{}", roster.team, role),
                        id.game_name.clone(),
                        id.tag_line.clone(),
                    )
                })
            })
            .collect()
    }

    /// Resolve the Riot API key when the player sync will run.
    ///
    /// Returns `None` when players are not selected or every roster slot is a
    /// placeholder. A missing or blank key is an error so the run stops
    /// before any request is made.
    pub fn riot_api_key<F>(&self, players_selected: bool, lookup: F) -> Result<Option<String>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let needs_key = players_selected && self.player_configs().iter().any(|p| !p.is_placeholder());
        if !needs_key {
            return Ok(None);
        }

        match lookup(&self.riot.api_key_env) {
            Some(key) if !key.trim().is_empty() => Ok(Some(key)),
            _ => Err(ConfigError::MissingCredential(self.riot.api_key_env.clone())),
        }
    }

    pub fn teams_output_path(&self) -> PathBuf {
        self.output_dir.join(&self.teams_output)
    }

    pub fn players_output_path(&self) -> PathBuf {
        self.output_dir.join(&self.players_output)
    }
}

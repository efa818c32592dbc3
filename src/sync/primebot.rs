//! PrimeBot (Prime League) API client.
//!
//! Fetches team details and match history from the PrimeBot v1 API and turns
//! them into `TeamRecord`s. All PrimeBot specifics live in this module.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::{RunContext, SyncEntity, SyncSource, UpstreamError};
use crate::calculate::summarize_matches;
use crate::config::TeamRules;
use crate::fetch::{endpoint, Fetcher};
use crate::models::{TeamConfig, TeamMeta, TeamRecord};

/// Shown when neither the upstream nor the config knows the division.
pub const UNKNOWN_DIVISION: &str = "N/A";

// ── PrimeBot API response types ─────────────────────────────────────────────

/// The opposing team of a match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrimeEnemy {
    pub name: Option<String>,

    #[serde(alias = "tag")]
    pub team_tag: Option<String>,
}

/// A player listed in a match lineup.
#[derive(Debug, Clone, Deserialize)]
pub struct PrimeLineupPlayer {
    #[serde(alias = "summoner", alias = "name", default)]
    pub summoner_name: String,

    #[serde(alias = "is_captain", default)]
    pub is_leader: bool,
}

/// A match from a team's history.
#[derive(Debug, Clone, Deserialize)]
pub struct PrimeMatch {
    /// Scheduled start (ISO 8601)
    #[serde(alias = "date", alias = "begin_at")]
    pub begin: Option<String>,

    /// Score from the team's point of view, e.g. "2:0"
    pub result: Option<String>,

    #[serde(alias = "enemy")]
    pub enemy_team: Option<PrimeEnemy>,

    #[serde(alias = "lineup")]
    pub team_lineup: Option<Vec<PrimeLineupPlayer>>,

    /// "league", "calibration", ...
    pub match_type: Option<String>,

    #[serde(alias = "link")]
    pub prime_league_link: Option<String>,
}

impl PrimeMatch {
    /// Parse `begin` as UTC. Accepts RFC 3339 or a naive timestamp.
    pub fn begin_at(&self) -> Option<DateTime<Utc>> {
        let s = self.begin.as_deref()?.trim();
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    pub fn has_result(&self) -> bool {
        self.result.as_deref().is_some_and(|r| !r.trim().is_empty())
    }

    /// Opponent tag, falling back to the name, then "TBD".
    pub fn opponent_tag(&self) -> String {
        self.enemy_team
            .as_ref()
            .and_then(|e| {
                e.team_tag
                    .as_deref()
                    .filter(|t| !t.is_empty())
                    .or(e.name.as_deref().filter(|n| !n.is_empty()))
            })
            .unwrap_or("TBD")
            .to_string()
    }

    pub fn lineup(&self) -> &[PrimeLineupPlayer] {
        self.team_lineup.as_deref().unwrap_or_default()
    }
}

/// Response of `GET /team/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrimeTeam {
    pub name: Option<String>,

    #[serde(alias = "division_name")]
    pub division: Option<String>,

    /// Place in the division table
    #[serde(alias = "rank")]
    pub position: Option<u32>,

    #[serde(alias = "logo")]
    pub logo_url: Option<String>,

    #[serde(alias = "team_link", alias = "link")]
    pub prime_league_link: Option<String>,

    /// Absent or null means no history yet
    #[serde(default)]
    pub matches: Option<Vec<PrimeMatch>>,
}

/// Build the stored record for a team from its PrimeBot payload.
pub fn build_team_record(
    team: &TeamConfig,
    payload: &PrimeTeam,
    rules: &TeamRules,
    ctx: &RunContext,
) -> TeamRecord {
    let matches = payload.matches.as_deref().unwrap_or_default();
    let summary = summarize_matches(matches, rules, ctx.now);

    let div = payload
        .division
        .clone()
        .filter(|d| !d.trim().is_empty())
        .or_else(|| team.division.clone())
        .unwrap_or_else(|| UNKNOWN_DIVISION.to_string());

    let mut next_match = summary.next_match;
    if let Some(next) = next_match.as_mut() {
        if next.link.is_none() {
            next.link = payload.prime_league_link.clone();
        }
    }

    TeamRecord {
        meta: TeamMeta {
            name: payload.name.clone().unwrap_or_else(|| team.key.clone()),
            div,
        },
        position: payload.position,
        logo: payload.logo_url.clone(),
        team_link: payload.prime_league_link.clone(),
        stats: summary.stats,
        next_match,
        last_match: summary.last_match,
        roster: summary.roster,
        last_updated: ctx.now,
    }
}

impl SyncEntity for TeamConfig {
    fn key(&self) -> &str {
        &self.key
    }
}

/// Team standings source backed by the PrimeBot API.
pub struct PrimeBotSource {
    fetcher: Fetcher,
    base_url: String,
    rules: TeamRules,
}

impl PrimeBotSource {
    pub fn new(fetcher: Fetcher, base_url: impl Into<String>, rules: TeamRules) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
            rules,
        }
    }

    /// Fetch the raw team payload.
    pub async fn get_team(&self, team_id: &str) -> Result<PrimeTeam, UpstreamError> {
        let url = endpoint(&self.base_url, &["team", team_id])?;
        Ok(self.fetcher.get_json(&url).await?)
    }
}

#[async_trait]
impl SyncSource for PrimeBotSource {
    type Entity = TeamConfig;
    type Record = TeamRecord;

    fn name(&self) -> &'static str {
        "primebot"
    }

    async fn fetch(&self, team: &TeamConfig, ctx: &RunContext) -> Result<TeamRecord, UpstreamError> {
        let payload = self.get_team(&team.id).await?;
        debug!(
            "PrimeBot team {} returned {} matches",
            team.id,
            payload.matches.as_ref().map_or(0, Vec::len)
        );
        Ok(build_team_record(team, &payload, &self.rules, ctx))
    }
}

//! Riot Games API client.
//!
//! Resolves each player's Riot ID to a PUUID, then reads their summoner
//! profile and ranked entries. Only the solo queue entry is kept.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::{RunContext, SyncEntity, SyncSource, UpstreamError};
use crate::fetch::{endpoint, Fetcher, FetcherConfig};
use crate::models::{PlayerConfig, PlayerRecord, SOLO_QUEUE};

/// Header carrying the API key.
pub const RIOT_TOKEN_HEADER: &str = "X-Riot-Token";

/// Rank label for players without a solo queue entry.
pub const UNRANKED: &str = "UNRANKED";

// ── Riot API response types ─────────────────────────────────────────────────

/// account-v1 `by-riot-id` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiotAccount {
    pub puuid: Option<String>,
    pub game_name: Option<String>,
    pub tag_line: Option<String>,
}

/// summoner-v4 `by-puuid` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiotSummoner {
    #[serde(default)]
    pub summoner_level: u32,

    #[serde(default)]
    pub profile_icon_id: u32,
}

/// One league-v4 entry; a player has one per ranked queue.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntry {
    pub queue_type: String,

    #[serde(default)]
    pub tier: String,

    #[serde(default)]
    pub rank: String,

    #[serde(default)]
    pub league_points: u32,

    #[serde(default)]
    pub wins: u32,

    #[serde(default)]
    pub losses: u32,
}

/// Pick the solo queue entry out of a player's league entries.
pub fn solo_queue_entry(entries: &[LeagueEntry]) -> Option<&LeagueEntry> {
    entries.iter().find(|e| e.queue_type == SOLO_QUEUE)
}

/// Build the stored record for a player.
pub fn build_player_record(
    player: &PlayerConfig,
    summoner: &RiotSummoner,
    entries: &[LeagueEntry],
    ddragon_version: &str,
    ctx: &RunContext,
) -> PlayerRecord {
    let solo = solo_queue_entry(entries);

    let rank = match solo {
        Some(e) if !e.tier.is_empty() => format!("{} {}", e.tier, e.rank).trim().to_string(),
        _ => UNRANKED.to_string(),
    };
    let (wins, losses, lp) = solo.map_or((0, 0, 0), |e| (e.wins, e.losses, e.league_points));

    PlayerRecord {
        name: player.game_name.clone(),
        level: summoner.summoner_level,
        rank,
        league_points: lp,
        wl: format!("{}/{}", wins, losses),
        icon: format!(
            "https://ddragon.leagueoflegends.com/cdn/{}/img/profileicon/{}.png",
            ddragon_version, summoner.profile_icon_id
        ),
        last_updated: ctx.now,
    }
}

impl SyncEntity for PlayerConfig {
    fn key(&self) -> &str {
        &self.key
    }

    fn is_syncable(&self) -> bool {
        !self.is_placeholder()
    }
}

/// Endpoints and presentation settings for the Riot source.
#[derive(Debug, Clone)]
pub struct RiotEndpoints {
    pub account_base_url: String,
    pub platform_base_url: String,
    pub ddragon_version: String,
}

/// Ranked player source backed by the Riot Games API.
pub struct RiotSource {
    fetcher: Fetcher,
    endpoints: RiotEndpoints,
}

impl RiotSource {
    /// Create a source that authenticates with `api_key`.
    pub fn new(
        config: FetcherConfig,
        api_key: &str,
        endpoints: RiotEndpoints,
    ) -> Result<Self, UpstreamError> {
        let fetcher = Fetcher::new(config.with_header(RIOT_TOKEN_HEADER, api_key))?;
        Ok(Self { fetcher, endpoints })
    }

    pub async fn get_account(&self, game_name: &str, tag_line: &str) -> Result<RiotAccount, UpstreamError> {
        let url = endpoint(
            &self.endpoints.account_base_url,
            &["riot", "account", "v1", "accounts", "by-riot-id", game_name, tag_line],
        )?;
        Ok(self.fetcher.get_json(&url).await?)
    }

    pub async fn get_summoner(&self, puuid: &str) -> Result<RiotSummoner, UpstreamError> {
        let url = endpoint(
            &self.endpoints.platform_base_url,
            &["lol", "summoner", "v4", "summoners", "by-puuid", puuid],
        )?;
        Ok(self.fetcher.get_json(&url).await?)
    }

    pub async fn get_league_entries(&self, puuid: &str) -> Result<Vec<LeagueEntry>, UpstreamError> {
        let url = endpoint(
            &self.endpoints.platform_base_url,
            &["lol", "league", "v4", "entries", "by-puuid", puuid],
        )?;
        Ok(self.fetcher.get_json(&url).await?)
    }
}

#[async_trait]
impl SyncSource for RiotSource {
    type Entity = PlayerConfig;
    type Record = PlayerRecord;

    fn name(&self) -> &'static str {
        "riot"
    }

    async fn fetch(&self, player: &PlayerConfig, ctx: &RunContext) -> Result<PlayerRecord, UpstreamError> {
        let account = self.get_account(&player.game_name, &player.tag_line).await?;
        let puuid = account
            .puuid
            .filter(|p| !p.is_empty())
            .ok_or(UpstreamError::MissingField("puuid"))?;

        let summoner = self.get_summoner(&puuid).await?;
        let entries = self.get_league_entries(&puuid).await?;

        if solo_queue_entry(&entries).is_none() {
            info!(
                "{} has no solo queue entry ({} other queues)",
                player.riot_id(),
                entries.len()
            );
        }
        debug!("{} is level {}", player.riot_id(), summoner.summoner_level);

        Ok(build_player_record(
            player,
            &summoner,
            &entries,
            &self.endpoints.ddragon_version,
            ctx,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;

    fn ctx() -> RunContext {
        RunContext::at(
            DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        )
    }

    const ENTRIES_JSON: &str = r#"[
        {"leagueId": "a", "queueType": "RANKED_FLEX_SR", "tier": "GOLD", "rank": "I",
         "leaguePoints": 10, "wins": 5, "losses": 5},
        {"leagueId": "b", "queueType": "RANKED_SOLO_5x5", "tier": "EMERALD", "rank": "III",
         "leaguePoints": 42, "wins": 61, "losses": 55}
    ]"#;

    #[test]
    fn test_solo_queue_selected() {
        let entries: Vec<LeagueEntry> = serde_json::from_str(ENTRIES_JSON).unwrap();
        let solo = solo_queue_entry(&entries).unwrap();

        assert_eq!(solo.tier, "EMERALD");
        assert_eq!(solo.league_points, 42);
    }

    #[test]
    fn test_build_player_record_ranked() {
        let entries: Vec<LeagueEntry> = serde_json::from_str(ENTRIES_JSON).unwrap();
        let summoner: RiotSummoner =
            serde_json::from_str(r#"{"id": "x", "summonerLevel": 312, "profileIconId": 4568}"#).unwrap();
        let player = PlayerConfig::new("prime_top", "UIC Speedy", "EUW");

        let record = build_player_record(&player, &summoner, &entries, "13.24.1", &ctx());

        assert_eq!(
            record,
            PlayerRecord {
                name: "UIC Speedy".to_string(),
                level: 312,
                rank: "EMERALD III".to_string(),
                league_points: 42,
                wl: "61/55".to_string(),
                icon: "https://ddragon.leagueoflegends.com/cdn/13.24.1/img/profileicon/4568.png".to_string(),
                last_updated: ctx().now,
            }
        );
    }

    #[test]
    fn test_build_player_record_unranked() {
        let entries: Vec<LeagueEntry> = serde_json::from_str(
            r#"[{"queueType": "CHERRY", "tier": "", "rank": "", "wins": 3, "losses": 1}]"#,
        )
        .unwrap();
        let player = PlayerConfig::new("abyss_mid", "UIC Goku", "UIC");

        let record = build_player_record(&player, &RiotSummoner::default(), &entries, "13.24.1", &ctx());

        assert_eq!(record.rank, UNRANKED);
        assert_eq!(record.wl, "0/0");
        assert_eq!(record.league_points, 0);
        assert!(record.icon.ends_with("/0.png"));
    }

    #[test]
    fn test_master_tier_without_division() {
        let entries: Vec<LeagueEntry> = serde_json::from_str(
            r#"[{"queueType": "RANKED_SOLO_5x5", "tier": "MASTER", "rank": "", "leaguePoints": 120}]"#,
        )
        .unwrap();
        let player = PlayerConfig::new("nova_bot", "UIC Simply", "666");

        let record = build_player_record(&player, &RiotSummoner::default(), &entries, "13.24.1", &ctx());
        assert_eq!(record.rank, "MASTER");
    }

    #[test]
    fn test_account_without_puuid_parses() {
        let account: RiotAccount = serde_json::from_str(r#"{"status": {"status_code": 404}}"#).unwrap();
        assert!(account.puuid.is_none());
    }

    #[test]
    fn test_placeholder_players_not_syncable() {
        assert!(!PlayerConfig::new("spark_sup", "", "").is_syncable());
        assert!(PlayerConfig::new("spark_top", "skanpy", "3005").is_syncable());
    }
}

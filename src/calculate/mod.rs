//! Statistics calculation engine.
//!
//! Reduces a team's match history into the values shown on its card:
//! - Win/loss/draw record, points and win rate
//! - Recent form
//! - Next and last match
//! - Active roster

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use crate::config::TeamRules;
use crate::models::{DerivedStats, LastMatch, NextMatch, Outcome, RosterEntry};
use crate::sync::primebot::PrimeMatch;

/// Most roster members kept per team.
pub const ROSTER_LIMIT: usize = 7;

static SCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*[:\-]\s*(\d+)\s*$").expect("score pattern is valid"));

/// Everything derived from one team's match list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchSummary {
    pub stats: DerivedStats,
    pub next_match: Option<NextMatch>,
    pub last_match: Option<LastMatch>,
    pub roster: Vec<RosterEntry>,
}

/// Parse a result string such as "2:0" into (own, opponent).
pub fn parse_score(result: &str) -> Option<(u32, u32)> {
    let caps = SCORE_RE.captures(result)?;
    let own = caps[1].parse().ok()?;
    let opponent = caps[2].parse().ok()?;
    Some((own, opponent))
}

/// Keep the last `len` entries of the form history.
pub fn truncate_form(form: &mut Vec<Outcome>, len: usize) {
    if form.len() > len {
        form.drain(..form.len() - len);
    }
}

/// Add lineup members to the roster, upgrading captains but never downgrading.
fn merge_lineup(roster: &mut Vec<RosterEntry>, m: &PrimeMatch) {
    for member in m.lineup() {
        let name = member.summoner_name.trim();
        if name.is_empty() {
            continue;
        }

        if let Some(existing) = roster.iter_mut().find(|r| r.summoner == name) {
            existing.is_captain |= member.is_leader;
        } else if roster.len() < ROSTER_LIMIT {
            roster.push(RosterEntry {
                summoner: name.to_string(),
                is_captain: member.is_leader,
            });
        }
    }
}

/// Summarize a match history relative to `now`.
///
/// Matches are sorted oldest first before scanning, so the form keeps the
/// most recent results, the last match is the latest played one and the
/// next match is the nearest future one.
pub fn summarize_matches(matches: &[PrimeMatch], rules: &TeamRules, now: DateTime<Utc>) -> MatchSummary {
    let mut dated: Vec<(DateTime<Utc>, &PrimeMatch)> = matches
        .iter()
        .filter_map(|m| m.begin_at().map(|at| (at, m)))
        .collect();
    dated.sort_by_key(|(at, _)| *at);

    let roster_cutoff = now - Duration::days(i64::from(rules.roster_window_days));

    let (mut wins, mut losses, mut draws) = (0u32, 0u32, 0u32);
    let mut form = Vec::new();
    let mut next_match = None;
    let mut last_match = None;
    let mut roster = Vec::new();

    for (at, m) in dated {
        if rules.season_start.is_some_and(|start| at < start) {
            continue;
        }

        if at >= roster_cutoff {
            merge_lineup(&mut roster, m);
        }

        if at < now {
            if !rules.counts_match_type(m.match_type.as_deref()) {
                continue;
            }
            let Some((own, opponent)) = m.result.as_deref().and_then(parse_score) else {
                continue;
            };

            let outcome = Outcome::from_scores(own, opponent);
            match outcome {
                Outcome::W => wins += 1,
                Outcome::L => losses += 1,
                Outcome::D => draws += 1,
            }
            form.push(outcome);

            last_match = Some(LastMatch {
                tag: m.opponent_tag(),
                score: format!("{}:{}", own, opponent),
                outcome: outcome.label().to_string(),
                date: at,
            });
        } else if at > now && next_match.is_none() && !m.has_result() {
            next_match = Some(NextMatch {
                tag: m.opponent_tag(),
                date: at,
                link: m.prime_league_link.clone(),
            });
        }
    }

    truncate_form(&mut form, rules.form_length);

    MatchSummary {
        stats: DerivedStats::new(wins, losses, draws, form, rules.points_policy),
        next_match,
        last_match,
        roster,
    }
}

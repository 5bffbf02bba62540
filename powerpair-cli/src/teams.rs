/// Standings input: a JSON array of team records, already in ranked order.
///
/// Only `name` and `score` are required. Missing optional fields mean the team
/// does not expose that capability, and an option needing it will fail the draw.
use std::collections::HashSet;

use powerpair_core::Team;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeamRecord {
    pub name: String,
    pub score: f64,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default, alias = "affs")]
    pub aff_count: Option<u32>,
    /// Names of previous opponents, repeated for repeat meetings.
    #[serde(default)]
    pub opponents: Option<Vec<String>>,
}

impl TeamRecord {
    fn meetings_with(&self, other: &TeamRecord) -> Option<u32> {
        self.opponents
            .as_ref()
            .map(|opps| opps.iter().filter(|name| **name == other.name).count() as u32)
    }
}

impl Team for TeamRecord {
    type Institution = String;

    fn score(&self) -> f64 {
        self.score
    }

    fn prior_aff_count(&self) -> Option<u32> {
        self.aff_count
    }

    fn institution(&self) -> Option<&String> {
        self.institution.as_ref()
    }

    /// Either side's record counts; if both list the meeting, the larger count wins.
    fn times_met(&self, other: &Self) -> Option<u32> {
        match (self.meetings_with(other), other.meetings_with(self)) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0).max(b.unwrap_or(0))),
        }
    }
}

/// Parse standings. Names must be unique.
pub fn parse_teams(content: &str) -> Result<Vec<TeamRecord>, String> {
    let teams: Vec<TeamRecord> =
        serde_json::from_str(content).map_err(|e| format!("Failed to parse standings JSON: {e}"))?;

    let mut names = HashSet::with_capacity(teams.len());
    for team in &teams {
        if !names.insert(team.name.as_str()) {
            return Err(format!("Duplicate team name: {}", team.name));
        }
        if !team.score.is_finite() {
            return Err(format!("Team {} has a non-finite score", team.name));
        }
    }
    Ok(teams)
}

/// Draw orchestrator.
///
/// Pure computation: no IO, no shared state. The caller supplies ranked teams
/// and gets back a complete draw or an error, never a partial draw.
///
/// Ownership moves forward through the stages: brackets are consumed by
/// odd-bracket resolution, the resolved brackets are only read by pairing
/// generation, and from then on the engine exclusively owns the pairings it
/// mutates. Caller teams are borrowed read-only and mapped in at the end.
use std::fmt;

use rand::RngCore;
use tracing::{debug, warn};

use crate::brackets::make_brackets;
use crate::conflicts::count_conflicts;
use crate::constants::RANDOM_DRAW_BRACKET;
use crate::error::{DrawError, Result};
use crate::odd_brackets::check_parity;
use crate::options::DrawOptions;
use crate::pairing::{generate_pairings, PairingMethod};
use crate::sides::balance_sides;
use crate::types::{Bracket, Draw, Pairing, Team, TeamPool};

/// Kind of draw to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DrawKind {
    /// All teams in one bracket, paired at random. Used when there are no
    /// results to rank by yet.
    Random,
    /// Bracketed by score, odd brackets resolved, paired within brackets.
    #[default]
    PowerPaired,
}

impl DrawKind {
    /// Whether this kind of draw makes sense before any results exist.
    pub fn can_be_first_round(self) -> bool {
        matches!(self, DrawKind::Random)
    }
}

impl fmt::Display for DrawKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawKind::Random => f.write_str("random"),
            DrawKind::PowerPaired => f.write_str("power_paired"),
        }
    }
}

impl std::str::FromStr for DrawKind {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "random" => Ok(DrawKind::Random),
            "power_paired" | "powerpaired" => Ok(DrawKind::PowerPaired),
            other => Err(DrawError::config(format!("Unknown draw type: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DrawEngine {
    kind: DrawKind,
    options: DrawOptions,
}

impl DrawEngine {
    pub fn new(kind: DrawKind, options: DrawOptions) -> Self {
        DrawEngine { kind, options }
    }

    pub fn power_paired(options: DrawOptions) -> Self {
        DrawEngine::new(DrawKind::PowerPaired, options)
    }

    /// Random draw. The `odd_bracket` and `pairing_method` options do not
    /// apply; conflict avoidance and side balancing do.
    pub fn random(options: DrawOptions) -> Self {
        DrawEngine::new(DrawKind::Random, options)
    }

    pub fn kind(&self) -> DrawKind {
        self.kind
    }

    pub fn options(&self) -> &DrawOptions {
        &self.options
    }

    /// Generate a draw using the thread-local random source.
    pub fn generate<'a, T: Team>(&self, teams: &'a [T]) -> Result<Draw<'a, T>> {
        self.generate_with_rng(teams, &mut rand::rng())
    }

    /// Generate a draw. Pass a seeded source for a reproducible draw.
    ///
    /// `teams` must be sorted by score, highest first.
    pub fn generate_with_rng<'a, T: Team>(&self, teams: &'a [T], rng: &mut dyn RngCore) -> Result<Draw<'a, T>> {
        let pool = TeamPool::new(teams);
        debug!(kind = %self.kind, teams = pool.len(), "generating draw");

        let brackets = self.resolved_brackets(&pool, rng)?;

        let random = PairingMethod::Random;
        let pairing_method = match self.kind {
            DrawKind::Random => &random,
            DrawKind::PowerPaired => &self.options.pairing_method,
        };
        let mut by_bracket = generate_pairings(&brackets, pairing_method, rng)?;

        let settings = self.options.conflict_settings();
        let avoid = &self.options.avoid_conflicts;
        for debates in &mut by_bracket {
            let before = team_set(debates);
            avoid.avoid(debates, &pool, &settings, rng)?;
            check_same_teams(debates, &before, avoid.name())?;
        }

        let mut pairings: Vec<Pairing<usize>> = by_bracket.into_iter().flatten().collect();
        balance_sides(&mut pairings, &pool, self.options.balance_sides, rng)?;
        check_coverage(&pairings, pool.len())?;

        let unresolved_conflicts = if avoid.is_enabled() {
            count_conflicts(&pairings, &pool, &settings)?
        } else {
            0
        };
        if unresolved_conflicts > 0 {
            warn!(unresolved_conflicts, "draw still contains conflicted debates");
        }

        debug!(debates = pairings.len(), "draw complete");
        Ok(Draw {
            pairings: pairings.into_iter().map(|p| pool.resolve(p)).collect(),
            unresolved_conflicts,
        })
    }

    /// Stages 1 and 2: bracket the teams and make every bracket even.
    pub fn resolved_brackets<T: Team>(&self, pool: &TeamPool<'_, T>, rng: &mut dyn RngCore) -> Result<Vec<Bracket>> {
        match self.kind {
            DrawKind::PowerPaired => {
                let raw = make_brackets(&pool.scores());
                let resolved = self.options.odd_bracket.resolve(raw, rng)?;
                check_membership(&resolved, pool.len(), self.options.odd_bracket.name())?;
                Ok(resolved)
            }
            DrawKind::Random => {
                let all = vec![Bracket::new(RANDOM_DRAW_BRACKET, (0..pool.len()).collect())];
                check_parity(&all)?;
                Ok(all)
            }
        }
    }
}

fn team_set(pairings: &[Pairing<usize>]) -> Vec<usize> {
    let mut teams: Vec<usize> = pairings.iter().flat_map(|p| p.teams).collect();
    teams.sort_unstable();
    teams
}

/// Resolved brackets must hold every team index exactly once.
fn check_membership(brackets: &[Bracket], num_teams: usize, method: &str) -> Result<()> {
    let mut seen = vec![false; num_teams];
    for &idx in brackets.iter().flat_map(|b| &b.teams) {
        match seen.get_mut(idx) {
            Some(placed) if !*placed => *placed = true,
            Some(_) => {
                return Err(DrawError::config(format!(
                    "odd_bracket '{method}' placed team {idx} in more than one slot"
                )))
            }
            None => {
                return Err(DrawError::config(format!(
                    "odd_bracket '{method}' returned team index {idx}, but there are only {num_teams} teams"
                )))
            }
        }
    }
    if let Some(missing) = seen.iter().position(|placed| !placed) {
        return Err(DrawError::config(format!("odd_bracket '{method}' dropped team {missing}")));
    }
    Ok(())
}

/// Conflict avoidance may only move teams between a bracket's own pairings.
fn check_same_teams(pairings: &[Pairing<usize>], before: &[usize], method: &str) -> Result<()> {
    let self_paired = pairings.iter().any(|p| p.teams[0] == p.teams[1]);
    if self_paired || team_set(pairings) != before {
        return Err(DrawError::config(format!(
            "avoid_conflicts '{method}' changed which teams are in a bracket"
        )));
    }
    Ok(())
}

/// Every team in exactly one pairing.
fn check_coverage(pairings: &[Pairing<usize>], num_teams: usize) -> Result<()> {
    if team_set(pairings) != (0..num_teams).collect::<Vec<_>>() {
        return Err(DrawError::config(
            "odd_bracket strategy lost or duplicated teams; the draw does not cover every team exactly once",
        ));
    }
    Ok(())
}

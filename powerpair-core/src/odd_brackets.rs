/// Odd-bracket resolution.
///
/// Every strategy consumes the raw brackets and returns brackets that all hold
/// an even number of teams, or fails with `UnresolvedOddBracket` when a surplus
/// team reaches the bottom with nowhere to go.
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rand::{Rng, RngCore};
use tracing::debug;

use crate::constants::INTERMEDIATE_BUBBLE_OFFSET;
use crate::error::{DrawError, Result};
use crate::types::Bracket;

/// A caller-supplied odd-bracket strategy.
///
/// Implemented for any `Fn(Vec<Bracket>, &mut dyn RngCore) -> Result<Vec<Bracket>>`.
pub trait ResolveOddBrackets: Send + Sync {
    fn resolve(&self, brackets: Vec<Bracket>, rng: &mut dyn RngCore) -> Result<Vec<Bracket>>;
}

impl<F> ResolveOddBrackets for F
where
    F: Fn(Vec<Bracket>, &mut dyn RngCore) -> Result<Vec<Bracket>> + Send + Sync,
{
    fn resolve(&self, brackets: Vec<Bracket>, rng: &mut dyn RngCore) -> Result<Vec<Bracket>> {
        self(brackets, rng)
    }
}

#[derive(Clone, Default)]
pub enum OddBracketMethod {
    /// The odd bracket pulls up the top team of the bracket below.
    #[default]
    PullupTop,
    /// The odd bracket pulls up the bottom team of the bracket below.
    PullupBottom,
    /// The odd bracket pulls up a uniformly random team of the bracket below.
    PullupRandom,
    /// Odd teams from adjacent brackets form half-point bubbles between them.
    Intermediate,
    Custom(Arc<dyn ResolveOddBrackets>),
}

impl OddBracketMethod {
    pub fn custom(resolver: impl ResolveOddBrackets + 'static) -> Self {
        OddBracketMethod::Custom(Arc::new(resolver))
    }

    pub fn name(&self) -> &'static str {
        match self {
            OddBracketMethod::PullupTop => "pullup_top",
            OddBracketMethod::PullupBottom => "pullup_bottom",
            OddBracketMethod::PullupRandom => "pullup_random",
            OddBracketMethod::Intermediate => "intermediate",
            OddBracketMethod::Custom(_) => "custom",
        }
    }

    /// Resolve odd brackets. The result is checked for parity whichever
    /// strategy produced it.
    pub fn resolve(&self, brackets: Vec<Bracket>, rng: &mut dyn RngCore) -> Result<Vec<Bracket>> {
        let resolved = match self {
            OddBracketMethod::PullupTop => pullup(brackets, |_| 0)?,
            OddBracketMethod::PullupBottom => pullup(brackets, |len| len - 1)?,
            OddBracketMethod::PullupRandom => pullup(brackets, |len| rng.random_range(0..len))?,
            OddBracketMethod::Intermediate => intermediate_bubbles(brackets)?,
            OddBracketMethod::Custom(resolver) => resolver.resolve(brackets, rng)?,
        };
        check_parity(&resolved)?;

        debug!(
            method = self.name(),
            sizes = ?resolved.iter().map(|b| (b.key, b.len())).collect::<Vec<_>>(),
            "resolved odd brackets"
        );
        Ok(resolved)
    }
}

impl fmt::Debug for OddBracketMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OddBracketMethod {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pullup_top" => Ok(OddBracketMethod::PullupTop),
            "pullup_bottom" => Ok(OddBracketMethod::PullupBottom),
            "pullup_random" => Ok(OddBracketMethod::PullupRandom),
            "intermediate" => Ok(OddBracketMethod::Intermediate),
            other => Err(DrawError::config(format!("Invalid option for odd_bracket: {other}"))),
        }
    }
}

pub(crate) fn check_parity(brackets: &[Bracket]) -> Result<()> {
    match brackets.iter().find(|b| b.is_odd()) {
        Some(odd) => Err(DrawError::UnresolvedOddBracket { bracket: odd.key }),
        None => Ok(()),
    }
}

/// Chain pull-ups downward. `pick(len)` chooses which of the `len` teams in the
/// bracket below moves up; the pulled-up team joins the bottom of the odd
/// bracket. Brackets emptied by a pull-up are dropped.
fn pullup(mut brackets: Vec<Bracket>, mut pick: impl FnMut(usize) -> usize) -> Result<Vec<Bracket>> {
    let mut needs_pullup: Option<usize> = None;

    for i in 0..brackets.len() {
        if brackets[i].is_empty() {
            continue;
        }
        if let Some(odd) = needs_pullup.take() {
            let pos = pick(brackets[i].len());
            let team = brackets[i].teams.remove(pos);
            brackets[odd].teams.push(team);
            debug!(team, from = brackets[i].key, to = brackets[odd].key, "pulled up team");
        }
        if brackets[i].is_odd() {
            needs_pullup = Some(i);
        }
    }

    if let Some(odd) = needs_pullup {
        return Err(DrawError::UnresolvedOddBracket { bracket: brackets[odd].key });
    }

    brackets.retain(|b| !b.is_empty());
    Ok(brackets)
}

fn intermediate_bubbles(brackets: Vec<Bracket>) -> Result<Vec<Bracket>> {
    let mut resolved = Vec::with_capacity(brackets.len() * 2);
    // (team, key of the bracket it came from)
    let mut odd_team: Option<(usize, f64)> = None;

    for Bracket { key, mut teams } in brackets {
        if teams.is_empty() {
            continue;
        }
        if let Some((team, _)) = odd_team.take() {
            let partner = teams.remove(0);
            resolved.push(Bracket::new(key + INTERMEDIATE_BUBBLE_OFFSET, vec![team, partner]));
        }
        if teams.len() % 2 != 0 {
            odd_team = teams.pop().map(|team| (team, key));
        }
        if !teams.is_empty() {
            resolved.push(Bracket::new(key, teams));
        }
    }

    match odd_team {
        Some((_, key)) => Err(DrawError::UnresolvedOddBracket { bracket: key }),
        None => Ok(resolved),
    }
}

/// Pairing strategies: split each even bracket into a top and bottom half and
/// meet them position for position.
///
/// Room ranks are assigned in generation order and keep counting across
/// brackets, so the first debate of a bracket follows the last of the one above.
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::RngCore;
use tracing::debug;

use crate::error::{DrawError, Result};
use crate::types::{Bracket, Pairing};

/// A caller-supplied pairing strategy.
///
/// `split` receives one even bracket (strongest first) and returns the top and
/// bottom halves; `top[i]` meets `bottom[i]`. Implemented for any
/// `Fn(&[usize], &mut dyn RngCore) -> (Vec<usize>, Vec<usize>)`.
pub trait PairBracket: Send + Sync {
    fn split(&self, teams: &[usize], rng: &mut dyn RngCore) -> (Vec<usize>, Vec<usize>);
}

impl<F> PairBracket for F
where
    F: Fn(&[usize], &mut dyn RngCore) -> (Vec<usize>, Vec<usize>) + Send + Sync,
{
    fn split(&self, teams: &[usize], rng: &mut dyn RngCore) -> (Vec<usize>, Vec<usize>) {
        self(teams, rng)
    }
}

#[derive(Clone, Default)]
pub enum PairingMethod {
    /// Strongest meets weakest: 1 v N, 2 v N-1, ...
    Fold,
    /// Top half meets bottom half in order: 1 v N/2+1, 2 v N/2+2, ...
    #[default]
    Slide,
    /// Shuffle the bracket, then slide.
    Random,
    Custom(Arc<dyn PairBracket>),
}

impl PairingMethod {
    pub fn custom(pairer: impl PairBracket + 'static) -> Self {
        PairingMethod::Custom(Arc::new(pairer))
    }

    pub fn name(&self) -> &'static str {
        match self {
            PairingMethod::Fold => "fold",
            PairingMethod::Slide => "slide",
            PairingMethod::Random => "random",
            PairingMethod::Custom(_) => "custom",
        }
    }

    pub fn split(&self, teams: &[usize], rng: &mut dyn RngCore) -> (Vec<usize>, Vec<usize>) {
        match self {
            PairingMethod::Slide => halves(teams.to_vec()),
            PairingMethod::Fold => {
                let (top, mut bottom) = halves(teams.to_vec());
                bottom.reverse();
                (top, bottom)
            }
            PairingMethod::Random => {
                let mut shuffled = teams.to_vec();
                shuffled.shuffle(rng);
                halves(shuffled)
            }
            PairingMethod::Custom(pairer) => pairer.split(teams, rng),
        }
    }
}

impl fmt::Debug for PairingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PairingMethod {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fold" => Ok(PairingMethod::Fold),
            "slide" => Ok(PairingMethod::Slide),
            "random" => Ok(PairingMethod::Random),
            other => Err(DrawError::config(format!("Invalid option for pairing_method: {other}"))),
        }
    }
}

fn halves(mut teams: Vec<usize>) -> (Vec<usize>, Vec<usize>) {
    let bottom = teams.split_off(teams.len() / 2);
    (teams, bottom)
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Pair every bracket. Returns one list of pairings per bracket, in bracket
/// order, with room ranks 1..=N across the whole draw.
pub fn generate_pairings(
    brackets: &[Bracket],
    method: &PairingMethod,
    rng: &mut dyn RngCore,
) -> Result<Vec<Vec<Pairing<usize>>>> {
    let mut room_rank = 1;
    let mut pairings = Vec::with_capacity(brackets.len());

    for bracket in brackets {
        if bracket.is_odd() {
            return Err(DrawError::UnresolvedOddBracket { bracket: bracket.key });
        }

        let (top, bottom) = method.split(&bracket.teams, rng);
        check_split(bracket, &top, &bottom, method)?;

        let debates: Vec<Pairing<usize>> = top
            .into_iter()
            .zip(bottom)
            .map(|(a, b)| {
                let pairing = Pairing::new([a, b], bracket.key, room_rank);
                room_rank += 1;
                pairing
            })
            .collect();
        pairings.push(debates);
    }

    debug!(method = method.name(), debates = room_rank - 1, "generated pairings");
    Ok(pairings)
}

/// The halves must be equal and hold exactly the bracket's teams.
fn check_split(bracket: &Bracket, top: &[usize], bottom: &[usize], method: &PairingMethod) -> Result<()> {
    let mut split: Vec<usize> = top.iter().chain(bottom).copied().collect();
    split.sort_unstable();
    let mut expected = bracket.teams.clone();
    expected.sort_unstable();

    if top.len() != bottom.len() || split != expected {
        return Err(DrawError::config(format!(
            "pairing_method '{}' did not split bracket {} into two halves of its own teams",
            method.name(),
            bracket.key
        )));
    }
    Ok(())
}

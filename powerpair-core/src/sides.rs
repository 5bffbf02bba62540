/// Side allocation: decide which team of each pairing is affirmative.
use rand::{Rng, RngCore};
use tracing::debug;

use crate::error::Result;
use crate::types::{Pairing, Team, TeamPool};

/// Orient every pairing so `teams[0]` is the affirmative.
///
/// When `balance` is on, the team that has affirmed less goes affirmative and
/// equal counts are settled by a coin flip. When off, every pairing is
/// oriented by a coin flip and prior counts are never read.
pub fn balance_sides<T: Team>(
    pairings: &mut [Pairing<usize>],
    pool: &TeamPool<'_, T>,
    balance: bool,
    rng: &mut dyn RngCore,
) -> Result<()> {
    let mut flips = 0;

    for pairing in pairings.iter_mut() {
        let swap = if balance {
            let first = pool.prior_aff_count(pairing.teams[0])?;
            let second = pool.prior_aff_count(pairing.teams[1])?;
            first > second || (first == second && rng.random_bool(0.5))
        } else {
            rng.random_bool(0.5)
        };

        if swap {
            pairing.swap_sides();
            flips += 1;
        }
    }

    debug!(balance, debates = pairings.len(), flips, "allocated sides");
    Ok(())
}

/// Conflict avoidance within brackets.
///
/// A pairing is conflicted when its teams share an institution or have met
/// before (each predicate can be switched off). The one-up-one-down method
/// repairs conflicts by exchanging the second team of a conflicted pairing with
/// the second team of the pairing directly above or below it in the same
/// bracket. Bracket membership never changes.
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rand::RngCore;
use tracing::debug;

use crate::constants::{
    DEFAULT_HISTORY_PENALTY, DEFAULT_INSTITUTION_PENALTY, FLAG_HISTORY, FLAG_INSTITUTION, FLAG_OTHER,
};
use crate::error::{DrawError, Result};
use crate::types::{Pairing, Team, TeamPool};

/// Which conflicts to detect and what each one costs.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConflictSettings {
    pub avoid_history: bool,
    pub avoid_institution: bool,
    /// Cost per previous meeting of the two teams.
    pub history_penalty: f64,
    pub institution_penalty: f64,
}

impl ConflictSettings {
    /// False when both predicates are off, making avoidance a no-op.
    pub fn is_active(&self) -> bool {
        self.avoid_history || self.avoid_institution
    }
}

impl Default for ConflictSettings {
    fn default() -> Self {
        ConflictSettings {
            avoid_history: true,
            avoid_institution: true,
            history_penalty: DEFAULT_HISTORY_PENALTY,
            institution_penalty: DEFAULT_INSTITUTION_PENALTY,
        }
    }
}

/// Conflict predicates over team indices.
pub trait ConflictCheck {
    fn same_institution(&self, a: usize, b: usize) -> Result<bool>;
    fn times_met(&self, a: usize, b: usize) -> Result<u32>;
}

impl<T: Team> ConflictCheck for TeamPool<'_, T> {
    fn same_institution(&self, a: usize, b: usize) -> Result<bool> {
        TeamPool::same_institution(self, a, b)
    }

    fn times_met(&self, a: usize, b: usize) -> Result<u32> {
        TeamPool::times_met(self, a, b)
    }
}

/// Conflict status of one pairing under the enabled predicates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairConflict {
    /// Previous meetings; 0 when history avoidance is off.
    pub history: u32,
    /// Always false when institution avoidance is off.
    pub institution: bool,
}

impl PairConflict {
    /// Only the enabled predicates are queried, so a team lacking a disabled
    /// capability is never an error.
    pub fn evaluate(teams: [usize; 2], check: &dyn ConflictCheck, settings: &ConflictSettings) -> Result<Self> {
        let [a, b] = teams;
        let history = if settings.avoid_history { check.times_met(a, b)? } else { 0 };
        let institution = settings.avoid_institution && check.same_institution(a, b)?;
        Ok(PairConflict { history, institution })
    }

    pub fn is_conflicted(&self) -> bool {
        self.history > 0 || self.institution
    }

    pub fn cost(&self, settings: &ConflictSettings) -> f64 {
        let history = f64::from(self.history) * settings.history_penalty;
        let institution = if self.institution { settings.institution_penalty } else { 0.0 };
        history + institution
    }
}

/// A caller-supplied conflict avoidance strategy, run once per bracket.
///
/// It may reorder teams between the bracket's pairings and add flags, but must
/// leave every pairing with two distinct teams from the same bracket.
pub trait AvoidConflicts: Send + Sync {
    fn avoid(
        &self,
        bracket: &mut [Pairing<usize>],
        check: &dyn ConflictCheck,
        settings: &ConflictSettings,
        rng: &mut dyn RngCore,
    ) -> Result<()>;
}

impl<F> AvoidConflicts for F
where
    F: Fn(&mut [Pairing<usize>], &dyn ConflictCheck, &ConflictSettings, &mut dyn RngCore) -> Result<()>
        + Send
        + Sync,
{
    fn avoid(
        &self,
        bracket: &mut [Pairing<usize>],
        check: &dyn ConflictCheck,
        settings: &ConflictSettings,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        self(bracket, check, settings, rng)
    }
}

#[derive(Clone, Default)]
pub enum ConflictMethod {
    #[default]
    OneUpOneDown,
    /// Conflict avoidance disabled.
    None,
    Custom(Arc<dyn AvoidConflicts>),
}

impl ConflictMethod {
    pub fn custom(avoider: impl AvoidConflicts + 'static) -> Self {
        ConflictMethod::Custom(Arc::new(avoider))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConflictMethod::OneUpOneDown => "one_up_one_down",
            ConflictMethod::None => "none",
            ConflictMethod::Custom(_) => "custom",
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, ConflictMethod::None)
    }

    pub fn avoid(
        &self,
        bracket: &mut [Pairing<usize>],
        check: &dyn ConflictCheck,
        settings: &ConflictSettings,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        match self {
            ConflictMethod::OneUpOneDown => one_up_one_down(bracket, check, settings),
            ConflictMethod::None => Ok(()),
            ConflictMethod::Custom(avoider) => avoider.avoid(bracket, check, settings, rng),
        }
    }
}

impl fmt::Debug for ConflictMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConflictMethod {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "one_up_one_down" => Ok(ConflictMethod::OneUpOneDown),
            "none" => Ok(ConflictMethod::None),
            other => Err(DrawError::config(format!("Invalid option for avoid_conflicts: {other}"))),
        }
    }
}

/// Number of pairings conflicted under the enabled predicates.
pub fn count_conflicts(pairings: &[Pairing<usize>], check: &dyn ConflictCheck, settings: &ConflictSettings) -> Result<usize> {
    if !settings.is_active() {
        return Ok(0);
    }
    let mut count = 0;
    for pairing in pairings {
        if PairConflict::evaluate(pairing.teams, check, settings)?.is_conflicted() {
            count += 1;
        }
    }
    Ok(count)
}

// ---------------------------------------------------------------------------
// One-up-one-down
// ---------------------------------------------------------------------------

/// Single best-effort pass over one bracket's pairings (in room-rank order).
///
/// Each conflicted pairing not yet touched by a swap tries exchanging its second
/// team with the untouched pairing above, then below. The direction with the
/// lowest combined cost for the two pairings wins (ties go up), and the swap only
/// happens if it lowers that combined cost. A pairing at either end of the
/// bracket has only one direction to try, and is left alone when that swap
/// would not help. A pairing takes part in at most one swap, so a conflict
/// created at a neighbour is left alone.
///
/// Every changed pairing is flagged from its status *before* the pass:
/// `1u1d_history` and/or `1u1d_institution`, or `1u1d_other` if it was only the
/// passive side of a neighbour's swap.
pub fn one_up_one_down(bracket: &mut [Pairing<usize>], check: &dyn ConflictCheck, settings: &ConflictSettings) -> Result<()> {
    if !settings.is_active() {
        return Ok(());
    }

    let original: Vec<PairConflict> = bracket
        .iter()
        .map(|p| PairConflict::evaluate(p.teams, check, settings))
        .collect::<Result<_>>()?;
    let mut swapped = vec![false; bracket.len()];

    for i in 0..bracket.len() {
        if swapped[i] || !original[i].is_conflicted() {
            continue;
        }

        let up = i.checked_sub(1);
        let down = Some(i + 1).filter(|&j| j < bracket.len());
        let mut best: Option<(usize, f64)> = None;

        for j in [up, down].into_iter().flatten() {
            if swapped[j] {
                continue;
            }
            let (first, second) = exchanged(bracket[i].teams, bracket[j].teams);
            let before = original[i].cost(settings) + original[j].cost(settings);
            let after = PairConflict::evaluate(first, check, settings)?.cost(settings)
                + PairConflict::evaluate(second, check, settings)?.cost(settings);

            if after < before && best.map_or(true, |(_, lowest)| after < lowest) {
                best = Some((j, after));
            }
        }

        match best {
            Some((j, cost)) => {
                let (first, second) = exchanged(bracket[i].teams, bracket[j].teams);
                bracket[i].teams = first;
                bracket[j].teams = second;
                swapped[i] = true;
                swapped[j] = true;
                debug!(
                    room_rank = bracket[i].room_rank,
                    direction = if j < i { "up" } else { "down" },
                    cost,
                    "one-up-one-down swap"
                );
            }
            None => debug!(room_rank = bracket[i].room_rank, "no improving swap for conflicted pairing"),
        }
    }

    for ((pairing, conflict), changed) in bracket.iter_mut().zip(&original).zip(&swapped) {
        if !changed {
            continue;
        }
        if conflict.history > 0 {
            pairing.add_flag(FLAG_HISTORY);
        }
        if conflict.institution {
            pairing.add_flag(FLAG_INSTITUTION);
        }
        if !conflict.is_conflicted() {
            pairing.add_flag(FLAG_OTHER);
        }
    }

    Ok(())
}

/// Exchange the second teams of two pairings.
fn exchanged(a: [usize; 2], b: [usize; 2]) -> ([usize; 2], [usize; 2]) {
    ([a[0], b[1]], [b[0], a[1]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::{BareTeam, TestTeam};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    type Row = ((u32, char, &'static [u32]), (u32, char, &'static [u32]));

    /// Build teams and one bracket of pairings from (id, institution, met) rows.
    fn setup(rows: &[Row]) -> (Vec<TestTeam>, Vec<Pairing<usize>>) {
        let mut teams = Vec::new();
        let mut pairings = Vec::new();
        for (rank, &((id1, inst1, met1), (id2, inst2, met2))) in rows.iter().enumerate() {
            teams.push(TestTeam::new(id1, inst1).met(met1));
            teams.push(TestTeam::new(id2, inst2).met(met2));
            pairings.push(Pairing::new([teams.len() - 2, teams.len() - 1], 0.0, rank + 1));
        }
        (teams, pairings)
    }

    fn run(rows: &[Row], settings: ConflictSettings) -> Vec<((u32, u32), Vec<String>)> {
        let (teams, mut pairings) = setup(rows);
        let pool = TeamPool::new(&teams);
        let mut rng = StdRng::seed_from_u64(0);
        ConflictMethod::OneUpOneDown.avoid(&mut pairings, &pool, &settings, &mut rng).unwrap();
        pairings
            .into_iter()
            .map(|p| ((teams[p.teams[0]].id, teams[p.teams[1]].id), p.flags))
            .collect()
    }

    fn unchanged(rows: &[Row]) -> Vec<((u32, u32), Vec<String>)> {
        rows.iter().map(|((a, _, _), (b, _, _))| ((*a, *b), Vec::new())).collect()
    }

    fn flags(f: &[&str]) -> Vec<String> {
        f.iter().map(|s| s.to_string()).collect()
    }

    const NO_CONFLICT: [Row; 4] = [
        ((1, 'A', &[]), (5, 'B', &[])),
        ((2, 'C', &[]), (6, 'A', &[])),
        ((3, 'B', &[]), (7, 'D', &[])),
        ((4, 'C', &[]), (8, 'A', &[])),
    ];

    const INSTITUTION_CONFLICT: [Row; 4] = [
        ((1, 'A', &[]), (5, 'A', &[])),
        ((2, 'C', &[]), (6, 'B', &[])),
        ((3, 'B', &[]), (7, 'D', &[])),
        ((4, 'C', &[]), (8, 'A', &[])),
    ];

    const HISTORY_CONFLICT: [Row; 4] = [
        ((1, 'A', &[5]), (5, 'B', &[])),
        ((2, 'C', &[]), (6, 'A', &[])),
        ((3, 'B', &[]), (7, 'D', &[])),
        ((4, 'C', &[]), (8, 'A', &[])),
    ];

    const LAST_CONFLICT: [Row; 4] = [
        ((1, 'A', &[]), (5, 'B', &[])),
        ((2, 'C', &[]), (6, 'A', &[])),
        ((3, 'B', &[]), (7, 'D', &[])),
        ((4, 'C', &[8]), (8, 'A', &[])),
    ];

    #[test]
    fn test_no_swap() {
        assert_eq!(run(&NO_CONFLICT, ConflictSettings::default()), unchanged(&NO_CONFLICT));
    }

    #[test]
    fn test_swap_institution() {
        assert_eq!(
            run(&INSTITUTION_CONFLICT, ConflictSettings::default()),
            vec![
                ((1, 6), flags(&[FLAG_INSTITUTION])),
                ((2, 5), flags(&[FLAG_OTHER])),
                ((3, 7), vec![]),
                ((4, 8), vec![]),
            ]
        );
    }

    #[test]
    fn test_no_swap_institution_when_disabled() {
        let settings = ConflictSettings { avoid_institution: false, ..Default::default() };
        assert_eq!(run(&INSTITUTION_CONFLICT, settings), unchanged(&INSTITUTION_CONFLICT));
    }

    #[test]
    fn test_swap_history() {
        assert_eq!(
            run(&HISTORY_CONFLICT, ConflictSettings::default()),
            vec![
                ((1, 6), flags(&[FLAG_HISTORY])),
                ((2, 5), flags(&[FLAG_OTHER])),
                ((3, 7), vec![]),
                ((4, 8), vec![]),
            ]
        );
    }

    #[test]
    fn test_no_swap_history_when_disabled() {
        let settings = ConflictSettings { avoid_history: false, ..Default::default() };
        assert_eq!(run(&HISTORY_CONFLICT, settings), unchanged(&HISTORY_CONFLICT));
    }

    #[test]
    fn test_last_pairing_swaps_up() {
        assert_eq!(
            run(&LAST_CONFLICT, ConflictSettings::default()),
            vec![
                ((1, 5), vec![]),
                ((2, 6), vec![]),
                ((3, 8), flags(&[FLAG_OTHER])),
                ((4, 7), flags(&[FLAG_HISTORY])),
            ]
        );
    }

    #[test]
    fn test_both_predicates_off_is_noop() {
        let settings = ConflictSettings { avoid_history: false, avoid_institution: false, ..Default::default() };
        assert_eq!(run(&LAST_CONFLICT, settings), unchanged(&LAST_CONFLICT));
    }

    #[test]
    fn test_interior_prefers_cheaper_direction() {
        // 6 v 2 clash on institution 'B'. Swapping up would put 1 against 2
        // (met before), swapping down is clean, so down wins.
        let rows: [Row; 3] = [
            ((1, 'A', &[2]), (5, 'C', &[])),
            ((6, 'B', &[]), (2, 'B', &[])),
            ((3, 'D', &[]), (7, 'E', &[])),
        ];
        assert_eq!(
            run(&rows, ConflictSettings::default()),
            vec![
                ((1, 5), vec![]),
                ((6, 7), flags(&[FLAG_INSTITUTION])),
                ((3, 2), flags(&[FLAG_OTHER])),
            ]
        );
    }

    #[test]
    fn test_interior_tie_prefers_up() {
        let rows: [Row; 3] = [
            ((1, 'A', &[]), (5, 'C', &[])),
            ((6, 'B', &[]), (2, 'B', &[])),
            ((3, 'D', &[]), (7, 'E', &[])),
        ];
        assert_eq!(
            run(&rows, ConflictSettings::default()),
            vec![
                ((1, 2), flags(&[FLAG_OTHER])),
                ((6, 5), flags(&[FLAG_INSTITUTION])),
                ((3, 7), vec![]),
            ]
        );
    }

    #[test]
    fn test_both_flags_on_double_conflict() {
        let rows: [Row; 2] = [((1, 'A', &[5]), (5, 'A', &[])), ((2, 'B', &[]), (6, 'C', &[]))];
        assert_eq!(
            run(&rows, ConflictSettings::default()),
            vec![
                ((1, 6), flags(&[FLAG_HISTORY, FLAG_INSTITUTION])),
                ((2, 5), flags(&[FLAG_OTHER])),
            ]
        );
    }

    #[test]
    fn test_team_swaps_at_most_once() {
        // Pairing 0 swaps down with pairing 1, locking both. Pairing 2 is
        // conflicted but its only neighbour is locked, so it stays as is.
        let rows: [Row; 3] = [
            ((1, 'A', &[]), (5, 'A', &[])),
            ((2, 'C', &[]), (6, 'B', &[])),
            ((3, 'C', &[]), (7, 'C', &[])),
        ];
        let result = run(&rows, ConflictSettings::default());
        assert_eq!(result[0], ((1, 6), flags(&[FLAG_INSTITUTION])));
        assert_eq!(result[1], ((2, 5), flags(&[FLAG_OTHER])));
        assert_eq!(result[2], ((3, 7), vec![]));
    }

    #[test]
    fn test_no_swap_when_it_does_not_help() {
        // Everyone is from the same institution, so no exchange lowers the cost.
        let rows: [Row; 2] = [((1, 'A', &[]), (5, 'A', &[])), ((2, 'A', &[]), (6, 'A', &[]))];
        assert_eq!(run(&rows, ConflictSettings::default()), unchanged(&rows));
    }

    #[test]
    fn test_last_pairing_kept_when_up_swap_does_not_help() {
        // Only "up" is available, and it moves the C v C clash into room 1.
        let rows: [Row; 2] = [((1, 'C', &[]), (5, 'B', &[])), ((2, 'C', &[]), (6, 'C', &[]))];
        assert_eq!(run(&rows, ConflictSettings::default()), unchanged(&rows));
    }

    #[test]
    fn test_repeat_meetings_scale_penalty() {
        // 1 met 5 twice; the down swap trades that for 1 v 6 (met once) and
        // 2 v 5 (clean).
        let rows: [Row; 2] = [((1, 'A', &[5, 5, 6]), (5, 'B', &[])), ((2, 'C', &[]), (6, 'D', &[]))];
        let (teams, mut pairings) = setup(&rows);
        let pool = TeamPool::new(&teams);
        let settings = ConflictSettings::default();
        assert_eq!(PairConflict::evaluate(pairings[0].teams, &pool, &settings).unwrap().cost(&settings), 200.0);

        one_up_one_down(&mut pairings, &pool, &settings).unwrap();
        assert_eq!(teams[pairings[0].teams[1]].id, 6);
        assert_eq!(count_conflicts(&pairings, &pool, &settings).unwrap(), 1);
    }

    #[test]
    fn test_missing_capability() {
        let teams = vec![BareTeam(1.0), BareTeam(1.0), BareTeam(1.0), BareTeam(1.0)];
        let pool = TeamPool::new(&teams);
        let mut pairings = vec![Pairing::new([0, 1], 1.0, 1), Pairing::new([2, 3], 1.0, 2)];

        let err = one_up_one_down(&mut pairings, &pool, &ConflictSettings::default()).unwrap_err();
        assert!(matches!(err, DrawError::Capability(_)));

        let off = ConflictSettings { avoid_history: false, avoid_institution: false, ..Default::default() };
        assert!(one_up_one_down(&mut pairings, &pool, &off).is_ok());
    }

    #[test]
    fn test_method_names() {
        assert!(matches!("one_up_one_down".parse::<ConflictMethod>(), Ok(ConflictMethod::OneUpOneDown)));
        assert!(!"none".parse::<ConflictMethod>().unwrap().is_enabled());
        assert!(matches!("two_up".parse::<ConflictMethod>(), Err(DrawError::Configuration(_))));
    }
}

/// powerpair-core: Pure-computation debate draw engine.
///
/// Ranked teams in → brackets → even brackets → pairings → conflict swaps →
/// sides → one complete draw. No IO, no persistence, no standings. Bring your own
/// tab.
///
/// Teams are any type implementing [`Team`]. Stages work on `usize` indices
/// into the caller's slice; the finished draw borrows the caller's teams back.
///
/// # Quick start
///
/// ```rust
/// use powerpair_core::{DrawEngine, DrawOptions, Team};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// struct Entry { name: &'static str, wins: f64, affs: u32, school: &'static str, met: Vec<&'static str> }
///
/// impl Team for Entry {
///     type Institution = &'static str;
///     fn score(&self) -> f64 { self.wins }
///     fn prior_aff_count(&self) -> Option<u32> { Some(self.affs) }
///     fn institution(&self) -> Option<&&'static str> { Some(&self.school) }
///     fn times_met(&self, other: &Self) -> Option<u32> {
///         Some(self.met.iter().filter(|&&n| n == other.name).count() as u32)
///     }
/// }
///
/// let teams = vec![
///     Entry { name: "Alpha", wins: 2.0, affs: 1, school: "North", met: vec![] },
///     Entry { name: "Bravo", wins: 2.0, affs: 0, school: "South", met: vec![] },
///     Entry { name: "Delta", wins: 1.0, affs: 1, school: "North", met: vec![] },
///     Entry { name: "Gamma", wins: 1.0, affs: 1, school: "East", met: vec![] },
/// ];
///
/// let options = DrawOptions::from_overrides([("pairing_method", "fold")]).unwrap();
/// let draw = DrawEngine::power_paired(options)
///     .generate_with_rng(&teams, &mut StdRng::seed_from_u64(1))
///     .unwrap();
///
/// assert_eq!(draw.len(), 2);
/// assert_eq!(draw.pairings[0].aff().name, "Bravo");
/// for debate in &draw {
///     println!("{} vs {} (room {})", debate.aff().name, debate.neg().name, debate.room_rank);
/// }
/// ```

pub mod brackets;
pub mod conflicts;
pub mod constants;
pub mod engine;
pub mod error;
pub mod odd_brackets;
pub mod options;
pub mod pairing;
pub mod sides;
pub mod types;

// Re-export primary public API at crate root.
pub use brackets::make_brackets;
pub use conflicts::{
    count_conflicts, one_up_one_down, AvoidConflicts, ConflictCheck, ConflictMethod, ConflictSettings,
    PairConflict,
};
pub use engine::{DrawEngine, DrawKind};
pub use error::{DrawError, Result};
pub use odd_brackets::{OddBracketMethod, ResolveOddBrackets};
pub use options::{DrawOptions, OPTION_NAMES};
pub use pairing::{generate_pairings, PairBracket, PairingMethod};
pub use sides::balance_sides;
pub use types::{Bracket, Draw, Pairing, Side, Team, TeamPool};

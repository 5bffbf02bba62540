use std::fmt;
use std::str::FromStr;

use crate::error::{DrawError, Result};

/// A team as supplied by the caller.
///
/// Only `score()` is mandatory. The other methods are capabilities a team may
/// or may not expose; they default to `None` ("not exposed"). An option that
/// needs a capability the teams lack fails the draw with
/// [`DrawError::Capability`].
pub trait Team {
    /// Institution identifier, compared for equality only.
    type Institution: PartialEq;

    /// Ranking score. Teams must be passed in non-increasing score order.
    fn score(&self) -> f64;

    /// Number of times this team has previously been affirmative.
    fn prior_aff_count(&self) -> Option<u32> {
        None
    }

    /// Institution the team represents. `None` means the team does not report one.
    fn institution(&self) -> Option<&Self::Institution> {
        None
    }

    /// Number of times this team has met `other` in earlier rounds.
    /// `Some(0)` means "never met"; `None` means history is not tracked.
    fn times_met(&self, _other: &Self) -> Option<u32> {
        None
    }

    /// Whether this team has met `other`. Implement this instead of
    /// `times_met` when only a yes/no answer is available.
    fn has_met(&self, other: &Self) -> Option<bool> {
        self.times_met(other).map(|n| n > 0)
    }
}

/// Borrowed view of the caller's teams, addressed by `usize` index.
///
/// Every pipeline stage works on indices into this pool; the caller's teams
/// are only mapped back in when the finished draw is handed out.
pub struct TeamPool<'a, T> {
    teams: &'a [T],
}

impl<'a, T: Team> TeamPool<'a, T> {
    pub fn new(teams: &'a [T]) -> Self {
        TeamPool { teams }
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn get(&self, idx: usize) -> &'a T {
        &self.teams[idx]
    }

    pub fn scores(&self) -> Vec<f64> {
        self.teams.iter().map(Team::score).collect()
    }

    pub fn prior_aff_count(&self, idx: usize) -> Result<u32> {
        self.teams[idx].prior_aff_count().ok_or_else(|| {
            DrawError::capability("For side balancing, teams must report their prior affirmative count.")
        })
    }

    pub fn same_institution(&self, a: usize, b: usize) -> Result<bool> {
        match (self.teams[a].institution(), self.teams[b].institution()) {
            (Some(x), Some(y)) => Ok(x == y),
            _ => Err(DrawError::capability(
                "For conflict avoidance, teams must report an institution.",
            )),
        }
    }

    /// Meetings between two teams; a bare yes/no history counts as one meeting.
    pub fn times_met(&self, a: usize, b: usize) -> Result<u32> {
        let (ta, tb) = (&self.teams[a], &self.teams[b]);
        ta.times_met(tb)
            .or_else(|| ta.has_met(tb).map(u32::from))
            .ok_or_else(|| {
                DrawError::capability("For conflict avoidance, teams must report whether they have met.")
            })
    }

    /// Map an index pairing back onto the caller's teams.
    pub fn resolve(&self, pairing: Pairing<usize>) -> Pairing<&'a T> {
        let teams = self.teams;
        pairing.map(|idx| &teams[idx])
    }
}

/// A group of teams processed as a unit, keyed by score.
///
/// Intermediate bubbles use a synthetic half-point key.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bracket {
    pub key: f64,
    /// Team indices, strongest first.
    pub teams: Vec<usize>,
}

impl Bracket {
    pub fn new(key: f64, teams: Vec<usize>) -> Self {
        Bracket { key, teams }
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn is_odd(&self) -> bool {
        self.teams.len() % 2 != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Aff,
    Neg,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Side::Aff => 0,
            Side::Neg => 1,
        }
    }
}

impl FromStr for Side {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "aff" => Ok(Side::Aff),
            "neg" => Ok(Side::Neg),
            _ => Err(DrawError::capability("side must be 'aff' or 'neg'")),
        }
    }
}

/// Two teams meeting in one room.
///
/// `teams[0]` is the affirmative once sides have been balanced; before that it
/// is only the affirmative-designate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pairing<T> {
    pub teams: [T; 2],
    /// Key of the bracket this pairing was generated from.
    pub bracket: f64,
    /// 1-based position of this pairing in the whole draw.
    pub room_rank: usize,
    pub flags: Vec<String>,
}

impl<T> Pairing<T> {
    pub fn new(teams: [T; 2], bracket: f64, room_rank: usize) -> Self {
        Pairing { teams, bracket, room_rank, flags: Vec::new() }
    }

    pub fn aff(&self) -> &T {
        &self.teams[0]
    }

    pub fn neg(&self) -> &T {
        &self.teams[1]
    }

    pub fn team_on(&self, side: Side) -> &T {
        &self.teams[side.index()]
    }

    /// Side-indexed accessor. Only "aff" and "neg" are valid selectors.
    pub fn team(&self, side: &str) -> Result<&T> {
        Ok(self.team_on(side.parse()?))
    }

    pub fn add_flag(&mut self, flag: impl Into<String>) {
        let flag = flag.into();
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    pub fn swap_sides(&mut self) {
        self.teams.swap(0, 1);
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Pairing<U> {
        let [a, b] = self.teams;
        Pairing {
            teams: [f(a), f(b)],
            bracket: self.bracket,
            room_rank: self.room_rank,
            flags: self.flags,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Pairing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {} ({}/{})", self.teams[0], self.teams[1], self.bracket, self.room_rank)
    }
}

/// The finished draw: every input team in exactly one pairing, ordered by
/// room rank.
#[derive(Debug, Clone)]
pub struct Draw<'a, T> {
    pub pairings: Vec<Pairing<&'a T>>,
    /// Pairings still conflicted (by the enabled predicates) after avoidance.
    /// Always 0 when conflict avoidance is off.
    pub unresolved_conflicts: usize,
}

impl<'a, T> Draw<'a, T> {
    pub fn len(&self) -> usize {
        self.pairings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pairing<&'a T>> {
        self.pairings.iter()
    }

    pub fn into_pairings(self) -> Vec<Pairing<&'a T>> {
        self.pairings
    }
}

impl<'d, 'a, T> IntoIterator for &'d Draw<'a, T> {
    type Item = &'d Pairing<&'a T>;
    type IntoIter = std::slice::Iter<'d, Pairing<&'a T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairings.iter()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Team;

    /// Minimal team for unit tests: id, institution, score, teams met, aff count.
    #[derive(Debug, Clone, PartialEq)]
    pub struct TestTeam {
        pub id: u32,
        pub institution: char,
        pub score: f64,
        pub met: Vec<u32>,
        pub aff_count: u32,
    }

    impl TestTeam {
        pub fn new(id: u32, institution: char) -> Self {
            TestTeam { id, institution, score: 0.0, met: Vec::new(), aff_count: 0 }
        }

        pub fn scored(id: u32, institution: char, score: f64) -> Self {
            TestTeam { score, ..TestTeam::new(id, institution) }
        }

        pub fn met(mut self, ids: &[u32]) -> Self {
            self.met.extend_from_slice(ids);
            self
        }

        pub fn affs(mut self, aff_count: u32) -> Self {
            self.aff_count = aff_count;
            self
        }
    }

    impl Team for TestTeam {
        type Institution = char;

        fn score(&self) -> f64 {
            self.score
        }

        fn prior_aff_count(&self) -> Option<u32> {
            Some(self.aff_count)
        }

        fn institution(&self) -> Option<&char> {
            Some(&self.institution)
        }

        fn times_met(&self, other: &Self) -> Option<u32> {
            let mine = self.met.iter().filter(|&&id| id == other.id).count();
            let theirs = other.met.iter().filter(|&&id| id == self.id).count();
            Some(mine.max(theirs) as u32)
        }
    }

    /// A team that exposes nothing but its score.
    #[derive(Debug, Clone)]
    pub struct BareTeam(pub f64);

    impl Team for BareTeam {
        type Institution = ();

        fn score(&self) -> f64 {
            self.0
        }
    }
}

/// Default weight of a history conflict in the one-up-one-down swap cost.
/// Multiplied by the number of previous meetings when teams report it.
pub const DEFAULT_HISTORY_PENALTY: f64 = 100.0;

/// Default weight of an institution conflict in the swap cost.
pub const DEFAULT_INSTITUTION_PENALTY: f64 = 1.0;

/// Offset added to a bracket's score to key the intermediate bubble formed
/// just above it.
pub const INTERMEDIATE_BUBBLE_OFFSET: f64 = 0.5;

/// Bracket key used by the random (first-round) draw, which puts every team
/// into a single bracket.
pub const RANDOM_DRAW_BRACKET: f64 = 0.0;

/// Flag on a swapped pairing whose teams had met before the swap.
pub const FLAG_HISTORY: &str = "1u1d_history";

/// Flag on a swapped pairing whose teams shared an institution before the swap.
pub const FLAG_INSTITUTION: &str = "1u1d_institution";

/// Flag on a pairing changed only as the passive side of a neighbour's swap.
pub const FLAG_OTHER: &str = "1u1d_other";

/// Bracket construction: group an already-ranked team list into contiguous
/// same-score brackets, highest first.
use tracing::{debug, warn};

use crate::types::Bracket;

/// Group team indices `0..scores.len()` into brackets of equal consecutive score.
///
/// `scores[i]` is the score of team `i`. The list is expected to be sorted
/// descending and is never re-sorted here; an out-of-order score simply starts
/// a new bracket.
pub fn make_brackets(scores: &[f64]) -> Vec<Bracket> {
    let mut brackets: Vec<Bracket> = Vec::new();

    for (idx, &score) in scores.iter().enumerate() {
        if let Some(current) = brackets.last_mut() {
            if current.key == score {
                current.teams.push(idx);
                continue;
            }
            if score > current.key {
                warn!(team = idx, score, previous = current.key, "teams are not sorted by score");
            }
        }
        brackets.push(Bracket::new(score, vec![idx]));
    }

    debug!(teams = scores.len(), brackets = brackets.len(), "built raw brackets");
    brackets
}

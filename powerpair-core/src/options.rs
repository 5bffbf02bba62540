/// Draw options.
///
/// Every option has a default and can be overridden on its own, either through
/// the public fields or by name with [`DrawOptions::set`], which is how config
/// files and command-line overrides reach the engine.
use crate::conflicts::{ConflictMethod, ConflictSettings};
use crate::constants::{DEFAULT_HISTORY_PENALTY, DEFAULT_INSTITUTION_PENALTY};
use crate::error::{DrawError, Result};
use crate::odd_brackets::OddBracketMethod;
use crate::pairing::PairingMethod;

/// Option names accepted by [`DrawOptions::set`].
pub const OPTION_NAMES: &[&str] = &[
    "balance_sides",
    "avoid_history",
    "avoid_institution",
    "history_penalty",
    "institution_penalty",
    "odd_bracket",
    "pairing_method",
    "avoid_conflicts",
];

#[derive(Debug, Clone)]
pub struct DrawOptions {
    /// Give the affirmative to the team that has affirmed less. Off: sides are random.
    pub balance_sides: bool,
    pub avoid_history: bool,
    pub avoid_institution: bool,
    pub history_penalty: f64,
    pub institution_penalty: f64,
    pub odd_bracket: OddBracketMethod,
    pub pairing_method: PairingMethod,
    pub avoid_conflicts: ConflictMethod,
}

impl Default for DrawOptions {
    fn default() -> Self {
        DrawOptions {
            balance_sides: true,
            avoid_history: true,
            avoid_institution: true,
            history_penalty: DEFAULT_HISTORY_PENALTY,
            institution_penalty: DEFAULT_INSTITUTION_PENALTY,
            odd_bracket: OddBracketMethod::PullupTop,
            pairing_method: PairingMethod::Slide,
            avoid_conflicts: ConflictMethod::OneUpOneDown,
        }
    }
}

impl DrawOptions {
    /// Defaults with each `(name, value)` override applied in order.
    pub fn from_overrides<'a, I>(overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut options = DrawOptions::default();
        for (key, value) in overrides {
            options.set(key, value)?;
        }
        Ok(options)
    }

    /// Override one option by name. Unknown names and unparsable values are
    /// configuration errors.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "balance_sides" => self.balance_sides = parse_bool(key, value)?,
            "avoid_history" => self.avoid_history = parse_bool(key, value)?,
            "avoid_institution" => self.avoid_institution = parse_bool(key, value)?,
            "history_penalty" => self.history_penalty = parse_penalty(key, value)?,
            "institution_penalty" => self.institution_penalty = parse_penalty(key, value)?,
            "odd_bracket" => self.odd_bracket = value.parse()?,
            "pairing_method" => self.pairing_method = value.parse()?,
            "avoid_conflicts" | "avoid_conflict" => self.avoid_conflicts = value.parse()?,
            _ => return Err(DrawError::config(format!("Unrecognized option: {key}"))),
        }
        Ok(())
    }

    pub fn conflict_settings(&self) -> ConflictSettings {
        ConflictSettings {
            avoid_history: self.avoid_history,
            avoid_institution: self.avoid_institution,
            history_penalty: self.history_penalty,
            institution_penalty: self.institution_penalty,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(DrawError::config(format!("{key} must be true or false, got \"{value}\""))),
    }
}

fn parse_penalty(key: &str, value: &str) -> Result<f64> {
    match value.parse::<f64>() {
        Ok(penalty) if penalty.is_finite() && penalty >= 0.0 => Ok(penalty),
        _ => Err(DrawError::config(format!(
            "{key} must be a non-negative number, got \"{value}\""
        ))),
    }
}

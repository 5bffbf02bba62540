mod config;
mod output;
mod teams;

use clap::Parser;
use powerpair_core::{DrawEngine, DrawKind, OPTION_NAMES};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::teams::{parse_teams, TeamRecord};

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "powerpair", version, about = "Preview power-paired debate draws from ranked standings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Generate one draw from a standings file
    Draw(DrawArgs),
    /// Create a default config file at ~/.config/powerpair/config.toml
    Init,
}

#[derive(Parser)]
struct DrawArgs {
    /// JSON array of teams, highest ranked first (reads stdin if omitted)
    #[arg(long)]
    teams: Option<PathBuf>,

    /// Draw type: "power_paired" or "random"
    #[arg(long)]
    kind: Option<String>,

    /// Draw option override, e.g. --set odd_bracket=intermediate (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Fixed random seed for a reproducible draw
    #[arg(long)]
    seed: Option<u64>,

    /// Output JSON instead of table
    #[arg(long)]
    json: bool,

    /// Show progress during execution
    #[arg(short, long)]
    verbose: bool,

    /// Path to config file (default: ~/.config/powerpair/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Split a `--set` argument into its key and value.
fn parse_override(raw: &str) -> (&str, &str) {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => (key.trim(), value.trim()),
        _ => bail(format!(
            "Invalid --set \"{raw}\". Expected KEY=VALUE with KEY one of: {}",
            OPTION_NAMES.join(", ")
        )),
    }
}

/// Load standings from --teams or stdin.
fn load_teams(args: &DrawArgs) -> Vec<TeamRecord> {
    let content = match args.teams {
        Some(ref path) => std::fs::read_to_string(path)
            .unwrap_or_else(|e| bail(format!("Failed to read teams file {}: {e}", path.display()))),
        None => {
            let mut stdin = io::stdin();
            if stdin.is_terminal() {
                bail("No teams provided. Use --teams <file> or pipe a JSON array via stdin.");
            }
            let mut content = String::new();
            stdin
                .read_to_string(&mut content)
                .unwrap_or_else(|e| bail(format!("Failed to read from stdin: {e}")));
            content
        }
    };

    parse_teams(&content).unwrap_or_else(|e| bail(e))
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Draw(args) => run_draw(args),
        Commands::Init => {
            let path = config::create_default_config();
            println!("Created config at {}", path.display());
            println!("Edit it to set your default draw options.");
        }
    }
}

fn run_draw(args: DrawArgs) {
    init_tracing(args.verbose);

    // Load config file, merge with CLI args (CLI wins)
    let config_path = args.config.clone().unwrap_or_else(config::config_path);
    let cfg = config::load_config(&config_path);

    let kind: DrawKind = args
        .kind
        .as_deref()
        .or(cfg.kind.as_deref())
        .map(|k| k.parse().unwrap_or_else(|e| bail(e)))
        .unwrap_or_default();

    let mut options = cfg.options;
    for raw in &args.overrides {
        let (key, value) = parse_override(raw);
        options.set(key, value).unwrap_or_else(|e| bail(e));
    }

    let teams = load_teams(&args);
    let json = args.json || cfg.json.unwrap_or(false);
    let seed = args.seed.or(cfg.seed);

    info!(teams = teams.len(), %kind, ?seed, "loaded standings");
    info!(
        odd_bracket = options.odd_bracket.name(),
        pairing_method = options.pairing_method.name(),
        avoid_conflicts = options.avoid_conflicts.name(),
        balance_sides = options.balance_sides,
        "draw options"
    );

    let engine = DrawEngine::new(kind, options);
    let result = match seed {
        Some(seed) => engine.generate_with_rng(&teams, &mut StdRng::seed_from_u64(seed)),
        None => engine.generate(&teams),
    };
    let draw = result.unwrap_or_else(|e| bail(e));

    if json {
        output::print_json(&draw, kind);
    } else {
        output::print_table(&draw, kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powerpair_core::DrawOptions;

    #[test]
    fn test_parse_override_trims() {
        assert_eq!(parse_override(" odd_bracket = intermediate"), ("odd_bracket", "intermediate"));
        assert_eq!(parse_override("history_penalty=0"), ("history_penalty", "0"));
    }

    #[test]
    fn test_cli_parses_draw_args() {
        let cli = Cli::parse_from([
            "powerpair", "draw", "--teams", "standings.json", "--set", "pairing_method=fold", "--set",
            "balance_sides=off", "--seed", "9", "--json",
        ]);
        let Commands::Draw(args) = cli.command else {
            panic!("expected draw subcommand");
        };
        assert_eq!(args.overrides, vec!["pairing_method=fold", "balance_sides=off"]);
        assert_eq!(args.seed, Some(9));
        assert!(args.json);
        assert!(!args.verbose);
    }

    #[test]
    fn test_end_to_end_fold_draw() {
        let teams = parse_teams(
            r#"[
                {"name": "Alpha", "score": 2, "institution": "North", "affs": 1},
                {"name": "Bravo", "score": 2, "institution": "South", "affs": 0},
                {"name": "Delta", "score": 1, "institution": "North", "affs": 1},
                {"name": "Gamma", "score": 1, "institution": "East", "affs": 1}
            ]"#,
        )
        .unwrap();
        let options = DrawOptions::from_overrides([("pairing_method", "fold"), ("avoid_history", "no")]).unwrap();
        let draw = DrawEngine::power_paired(options)
            .generate_with_rng(&teams, &mut StdRng::seed_from_u64(3))
            .unwrap();

        assert_eq!(draw.len(), 2);
        assert_eq!(draw.pairings[0].aff().name, "Bravo");
        assert_eq!(draw.pairings[0].neg().name, "Alpha");
        assert_eq!(draw.unresolved_conflicts, 0);
    }

    #[test]
    fn test_history_needs_opponents() {
        let teams = parse_teams(r#"[{"name": "A", "score": 1, "affs": 0}, {"name": "B", "score": 1, "affs": 0}]"#).unwrap();
        let err = DrawEngine::default()
            .generate_with_rng(&teams, &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(err, powerpair_core::DrawError::Capability(_)));
    }
}

/// Output formatting: terminal table and JSON.
use powerpair_core::{Draw, DrawKind};
use serde::Serialize;

use crate::teams::TeamRecord;

#[derive(Serialize)]
struct JsonDebate<'a> {
    room_rank: usize,
    bracket: f64,
    aff: &'a str,
    neg: &'a str,
    flags: &'a [String],
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    kind: DrawKind,
    debates: Vec<JsonDebate<'a>>,
    unresolved_conflicts: usize,
}

/// Print the draw as a formatted terminal table.
pub fn print_table(draw: &Draw<'_, TeamRecord>, kind: DrawKind) {
    let name_width = draw
        .iter()
        .flat_map(|p| p.teams.iter().map(|t| t.name.len()))
        .max()
        .unwrap_or(3)
        .max(3); // at least "Aff"

    println!("Room | Bracket | {:<name_width$} | {:<name_width$} | Flags", "Aff", "Neg");
    println!("-----|---------|-{}-|-{}-|------", "-".repeat(name_width), "-".repeat(name_width));

    for p in draw {
        println!(
            "{:>4} | {:>7} | {:<name_width$} | {:<name_width$} | {}",
            p.room_rank,
            p.bracket,
            p.aff().name,
            p.neg().name,
            p.flags.join(", "),
        );
    }

    println!("\n{} debates ({kind} draw)", draw.len());
    if draw.unresolved_conflicts > 0 {
        println!("{} debates still conflicted after avoidance", draw.unresolved_conflicts);
    }
}

/// Print the draw as JSON.
pub fn print_json(draw: &Draw<'_, TeamRecord>, kind: DrawKind) {
    let debates = draw
        .iter()
        .map(|p| JsonDebate {
            room_rank: p.room_rank,
            bracket: p.bracket,
            aff: &p.aff().name,
            neg: &p.neg().name,
            flags: &p.flags,
        })
        .collect();

    let output = JsonOutput {
        kind,
        debates,
        unresolved_conflicts: draw.unresolved_conflicts,
    };

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{json}"),
        Err(e) => crate::bail(format!("Failed to serialize draw: {e}")),
    }
}

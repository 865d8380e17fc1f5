//! Start G-code assembly.
//!
//! The user's start G-code is wrapped in automatically generated commands:
//! units, fan, bed and extruder heating before it, tool selection and
//! coordinate modes after it. A generated command is dropped whenever the
//! user's own start G-code already has a line beginning with the same
//! command, so hand-written sequences are never doubled up.

use super::engine::{unescape_newlines, MappingContext};
use super::number::format_number;
use super::rules::MappingTable;

const HEAT_BEFORE_HOMING_KEY: &str = "heat_extruder_before_homing";

/// Build the complete start G-code for the setting `canonical`.
pub(crate) fn build(
    table: &MappingTable,
    canonical: &str,
    escape_newlines: bool,
    ctx: &MappingContext<'_>,
) -> String {
    let raw = ctx.settings.resolve(canonical);
    let existing = existing_lines(&raw);

    let mut start_gcode = String::new();
    for line in pre_start_gcode(ctx, &existing) {
        start_gcode.push_str(&line);
        start_gcode.push('\n');
    }

    start_gcode.push_str(&table.replace_macro_values_nested(&unescape_newlines(&raw), ctx));

    for line in post_start_gcode(ctx, &existing) {
        start_gcode.push('\n');
        start_gcode.push_str(&line);
    }

    if escape_newlines {
        start_gcode.replace('\n', "\\n")
    } else {
        start_gcode
    }
}

/// Non-empty lines of the user's start G-code, split on escaped and real
/// newlines alike.
fn existing_lines(raw: &str) -> Vec<&str> {
    raw.split("\\n")
        .flat_map(|chunk| chunk.split('\n'))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Commands emitted before the user's start G-code.
fn pre_start_gcode(ctx: &MappingContext<'_>, existing: &[&str]) -> Vec<String> {
    let settings = ctx.settings;
    let mut lines = vec!["; automatic settings before start_gcode".to_string()];

    add_default_if_not_present(&mut lines, "G21", existing, "set units to millimeters");
    add_default_if_not_present(&mut lines, "M107", existing, "fan off");

    let bed_temperature = settings.resolve_as::<f64>("bed_temperature", 0.0);
    if bed_temperature > 0.0 {
        add_default_if_not_present(
            &mut lines,
            &format!("M190 S{}", format_number(bed_temperature)),
            existing,
            "wait for bed temperature to be reached",
        );
    }

    // Start heating every extruder we are going to use.
    for (index, temperature) in heated_extruders(ctx) {
        add_default_if_not_present(
            &mut lines,
            &format!("M104 T{} S{}", index, temperature),
            existing,
            &format!("start heating extruder {}", index + 1),
        );
    }

    // Heat and wait now if the printer must be hot before homing.
    if heat_before_homing(ctx) {
        for (index, temperature) in heated_extruders(ctx) {
            add_default_if_not_present(
                &mut lines,
                &format!("M109 T{} S{}", index, temperature),
                existing,
                &format!("wait for extruder {}", index + 1),
            );
        }
    }

    switch_to_first_active_extruder(&mut lines, ctx.extruders_used, existing);
    lines.push("; settings from start_gcode".to_string());

    lines
}

/// Commands emitted after the user's start G-code.
fn post_start_gcode(ctx: &MappingContext<'_>, existing: &[&str]) -> Vec<String> {
    let mut lines = vec!["; automatic settings after start_gcode".to_string()];

    // Already waited before homing; don't wait again.
    if !heat_before_homing(ctx) {
        for (index, temperature) in heated_extruders(ctx) {
            add_default_if_not_present(
                &mut lines,
                &format!("M109 T{} S{}", index, temperature),
                existing,
                &format!("wait for extruder {} to reach temperature", index + 1),
            );
        }
    }

    switch_to_first_active_extruder(&mut lines, ctx.extruders_used, existing);
    add_default_if_not_present(&mut lines, "G90", existing, "use absolute coordinates");
    add_default_if_not_present(
        &mut lines,
        "G92 E0",
        existing,
        "reset the expected extruder position",
    );
    add_default_if_not_present(&mut lines, "M82", existing, "use absolute distance for extrusion");

    lines
}

fn heat_before_homing(ctx: &MappingContext<'_>) -> bool {
    ctx.settings.resolve(HEAT_BEFORE_HOMING_KEY) == "1"
}

/// `(index, temperature)` for each used extruder with a temperature set.
fn heated_extruders(ctx: &MappingContext<'_>) -> Vec<(usize, String)> {
    // Flags past the end are unused, so they bound the scan too.
    let extruder_count = ctx
        .settings
        .resolve_as::<usize>("extruder_count", 1)
        .min(ctx.extruders_used.len());

    (0..extruder_count)
        .filter(|&index| ctx.extruders_used.get(index).copied().unwrap_or(false))
        .filter_map(|index| {
            let temperature = ctx.settings.extruder_temperature(index);
            let temperature = temperature.trim();
            if temperature.is_empty() || temperature == "0" {
                None
            } else {
                Some((index, temperature.to_string()))
            }
        })
        .collect()
}

fn switch_to_first_active_extruder(lines: &mut Vec<String>, extruders_used: &[bool], existing: &[&str]) {
    if let Some(index) = extruders_used.iter().position(|&used| used) {
        add_default_if_not_present(
            lines,
            &format!("T{}", index),
            existing,
            &format!("set the active extruder to {}", index),
        );
    }
}

/// Append `command ; comment` unless a line of `existing` starts with the
/// same command token.
fn add_default_if_not_present(lines: &mut Vec<String>, command: &str, existing: &[&str], comment: &str) {
    let token = command_token(command);
    let present = existing.iter().any(|line| command_token(line) == token);

    if !present {
        lines.push(format!("{} ; {}", command, comment));
    }
}

/// First whitespace-delimited token of a G-code line.
fn command_token(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or("")
}

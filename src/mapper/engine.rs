//! Rule evaluation and macro substitution.
//!
//! Every call takes a [`MappingContext`] carrying the active cascade and the
//! per-extruder usage flags, so the same table can be evaluated against any
//! set of layers.

use tracing::{debug, warn};

use super::number::{first_value, format_number, percent_or_number};
use super::rules::MappingTable;
use super::start_gcode;
use super::types::{MappedSetting, Transform};
use crate::settings::{parse_or, Cascade};

/// Everything a mapping rule may read while computing its value.
#[derive(Debug, Clone)]
pub struct MappingContext<'a> {
    /// Active settings, most specific layer first.
    pub settings: &'a Cascade<'a>,
    /// Which extruders the current print uses, by 0-based index.
    pub extruders_used: &'a [bool],
}

impl<'a> MappingContext<'a> {
    pub fn new(settings: &'a Cascade<'a>, extruders_used: &'a [bool]) -> Self {
        Self {
            settings,
            extruders_used,
        }
    }
}

impl MappingTable {
    /// Compute the engine value for one rule.
    ///
    /// Returns `None` only for settings that are not passed to the engine.
    /// Malformed numbers degrade to their fallback; this never fails.
    pub fn compute(&self, rule: &MappedSetting, ctx: &MappingContext<'_>) -> Option<String> {
        let raw = ctx.settings.resolve(&rule.canonical);

        let value = match &rule.transform {
            Transform::Direct => raw,
            Transform::FirstValue => first_value(&raw).to_string(),
            Transform::UnescapeNewlines => unescape_newlines(&raw),
            Transform::BoolString => {
                if raw == "1" {
                    "True".to_string()
                } else {
                    "False".to_string()
                }
            }
            Transform::ScaledNumber { scale } => {
                format_number(percent_or_number(first_value(&raw)) * scale)
            }
            Transform::PercentOfReferenceOrDirect { reference, scale } => {
                let reference_value = parse_or(&ctx.settings.resolve(reference), 0.0);
                let mut value = if raw.contains('%') {
                    percent_or_number(&raw) * reference_value
                } else {
                    parse_or(&raw, 0.0)
                };
                if value == 0.0 {
                    value = reference_value;
                }
                format_number(value * scale)
            }
            Transform::CountOrDistance { denominator } => match raw.trim().strip_suffix("mm") {
                Some(distance) => {
                    let mut per_count: f64 = parse_or(&ctx.settings.resolve(denominator), 1.0);
                    if per_count <= 0.0 {
                        warn!(
                            "{:?} is {} and cannot divide {:?}; using 1",
                            denominator, per_count, rule.canonical
                        );
                        per_count = 1.0;
                    }
                    let count = (parse_or(distance, 0.0) / per_count).round() as i64;
                    count.to_string()
                }
                None => raw,
            },
            Transform::StartGcode { escape_newlines } => {
                start_gcode::build(self, &rule.canonical, *escape_newlines, ctx)
            }
            Transform::VisibleNotMapped => return None,
        };

        Some(value)
    }

    /// Replace every `{name}` and `[name]` placeholder in `text` with the
    /// computed value of the matching rule, in table order.
    pub fn replace_macro_values(&self, text: &str, ctx: &MappingContext<'_>) -> String {
        self.substitute(text, ctx, true)
    }

    /// Substitution used inside start G-code, where injection rules are left
    /// alone so a template cannot include itself.
    pub(crate) fn replace_macro_values_nested(
        &self,
        text: &str,
        ctx: &MappingContext<'_>,
    ) -> String {
        self.substitute(text, ctx, false)
    }

    fn substitute(&self, text: &str, ctx: &MappingContext<'_>, allow_injection: bool) -> String {
        let mut result = text.to_string();

        for rule in self.rules() {
            if !allow_injection && matches!(rule.transform, Transform::StartGcode { .. }) {
                continue;
            }

            let name = rule.placeholder_name();
            // {} for our own templates, [] for Slic3r style ones
            let curly = format!("{{{}}}", name);
            let square = format!("[{}]", name);
            if !result.contains(&curly) && !result.contains(&square) {
                continue;
            }

            let value = self.compute(rule, ctx).unwrap_or_default();
            result = result.replace(&curly, &value).replace(&square, &value);
        }

        result
    }

    /// The engine-facing settings: every exported rule with its value, in
    /// table order. A repeated name keeps its first position and the last
    /// value.
    pub fn export_settings(&self, ctx: &MappingContext<'_>) -> Vec<(String, String)> {
        let mut exported: Vec<(String, String)> = Vec::new();

        for rule in self.rules().iter().filter(|r| r.is_exported()) {
            let Some(value) = self.compute(rule, ctx) else {
                continue;
            };
            match exported.iter_mut().find(|(name, _)| name == &rule.exported) {
                Some(entry) => entry.1 = value,
                None => exported.push((rule.exported.clone(), value)),
            }
        }

        debug!("Exported {} engine settings", exported.len());
        exported
    }
}

/// Turn literal `\n` sequences into newlines.
pub fn unescape_newlines(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

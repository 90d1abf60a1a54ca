//! Presentation Adapter
//!
//! Splits prompt text into display segments around `{{name}}`
//! placeholders without touching the template itself.
//!
//! Only placeholders whose name is declared by the prompt are treated as
//! variables; anything else in braces is plain text.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_-]*)\s*\}\}").expect("placeholder pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Text,
    Filled,
    Unfilled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub text: String,
}

impl Segment {
    fn new(kind: SegmentKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    match segments.last_mut() {
        Some(last) if last.kind == SegmentKind::Text => last.text.push_str(text),
        _ => segments.push(Segment::new(SegmentKind::Text, text)),
    }
}

/// Segment `text`, substituting non-blank values for declared names
pub fn segment(
    text: &str,
    variable_names: &[&str],
    values: &HashMap<String, String>,
) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for caps in PLACEHOLDER.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if !variable_names.contains(&name.as_str()) {
            continue;
        }

        push_text(&mut segments, &text[cursor..whole.start()]);

        match values
            .get(name.as_str())
            .filter(|value| !value.trim().is_empty())
        {
            Some(value) => segments.push(Segment::new(SegmentKind::Filled, value.as_str())),
            None => segments.push(Segment::new(SegmentKind::Unfilled, whole.as_str())),
        }

        cursor = whole.end();
    }

    push_text(&mut segments, &text[cursor..]);
    segments
}

/// Concatenated segments: the text to copy or run
pub fn render(text: &str, variable_names: &[&str], values: &HashMap<String, String>) -> String {
    segment(text, variable_names, values)
        .into_iter()
        .map(|s| s.text)
        .collect()
}

/// Distinct placeholder names in order of first appearance
pub fn extract_variables(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(text) {
        if let Some(name) = caps.get(1)
            && !names.iter().any(|n| n == name.as_str())
        {
            names.push(name.as_str().to_string());
        }
    }
    names
}

/// Declared names that have no usable value
pub fn missing_variables<'a>(
    variable_names: &[&'a str],
    values: &HashMap<String, String>,
) -> Vec<&'a str> {
    variable_names
        .iter()
        .copied()
        .filter(|name| values.get(*name).is_none_or(|v| v.trim().is_empty()))
        .collect()
}

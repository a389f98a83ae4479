//! Scanner for `qmims` authoring directives embedded in markdown comments.
//!
//! Recognized markers, each alone on its own line:
//!
//! ```text
//! <!-- qmims: <free text> -->
//! <!-- qmims-target-start -->
//! <!-- qmims-target-end -->
//! ```
//!
//! Association between an instruction and a target block is positional: the
//! block must start on the first non-blank line after the instruction.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static INSTRUCTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<!--\s*qmims:(.*?)-->$").expect("instruction regex"));
static TARGET_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<!--\s*qmims-target-start\s*-->$").expect("target-start regex"));
static TARGET_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<!--\s*qmims-target-end\s*-->$").expect("target-end regex"));

/// An authoring directive found in a markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    /// Directive text with surrounding whitespace removed.
    pub instruction: String,
    /// 1-based line of the comment carrying the directive.
    pub line_number: usize,
    /// Explicit target block, when one directly follows the directive.
    #[serde(flatten)]
    pub target: Option<TargetSpan>,
}

/// 1-based line span of a target block.
///
/// `start` is the start-marker line; `end` is the last enclosed content line,
/// so the end marker sits on `end + 1`. Always `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpan {
    #[serde(rename = "targetStart")]
    pub start: usize,
    #[serde(rename = "targetEnd")]
    pub end: usize,
}

/// Which marker, if any, a single line carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Marker<'a> {
    Instruction(&'a str),
    TargetStart,
    TargetEnd,
}

/// Classify one line of markdown.
pub(crate) fn marker(line: &str) -> Option<Marker<'_>> {
    let line = line.trim();
    if !line.starts_with("<!--") {
        return None;
    }
    if TARGET_START_RE.is_match(line) {
        return Some(Marker::TargetStart);
    }
    if TARGET_END_RE.is_match(line) {
        return Some(Marker::TargetEnd);
    }
    INSTRUCTION_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|text| Marker::Instruction(text.as_str().trim()))
}

/// Split text into lines, tolerating CRLF endings.
pub(crate) fn split_lines(content: &str) -> Vec<&str> {
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

pub(crate) fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Scan markdown for instructions, in document order.
///
/// Missing or empty input yields an empty list. Malformed marker pairs never
/// cause an error; an instruction without a well-formed block directly after
/// it simply has no target.
pub fn parse_instructions(content: Option<&str>) -> Vec<Instruction> {
    let Some(content) = content.filter(|c| !c.is_empty()) else {
        return Vec::new();
    };
    let lines = split_lines(content);

    lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| match marker(line) {
            Some(Marker::Instruction(text)) if !text.is_empty() => Some(Instruction {
                instruction: text.to_string(),
                line_number: idx + 1,
                target: find_target(&lines, idx + 1),
            }),
            _ => None,
        })
        .collect()
}

/// Look for a target block starting at the first non-blank line at or after `from`.
fn find_target(lines: &[&str], from: usize) -> Option<TargetSpan> {
    let start_idx = (from..lines.len()).find(|&idx| !is_blank(lines[idx]))?;
    if marker(lines[start_idx]) != Some(Marker::TargetStart) {
        return None;
    }
    let end_idx = (start_idx + 1..lines.len())
        .find(|&idx| marker(lines[idx]) == Some(Marker::TargetEnd))?;

    // 1-based: start marker is start_idx + 1, last content line is end_idx.
    let span = TargetSpan {
        start: start_idx + 1,
        end: end_idx,
    };
    (span.start < span.end).then_some(span)
}

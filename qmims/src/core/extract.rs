//! Resolve the text an instruction governs.

use super::instructions::{Instruction, Marker, TargetSpan, is_blank, marker, split_lines};

/// Extract the text targeted by `instruction` from `content`.
///
/// - With an instruction whose target span fits the current content, returns
///   the lines strictly between the markers, verbatim.
/// - Without an instruction, returns the body of the first target block in the
///   document, or `None` if the first marker seen is an end marker, or the
///   start marker is never closed.
/// - Otherwise falls back to the first paragraph after the instruction line.
///
/// `None` means nothing extractable; it is not an error.
pub fn extract_target_content(
    content: Option<&str>,
    instruction: Option<&Instruction>,
) -> Option<String> {
    let content = content.filter(|c| !c.is_empty())?;
    let lines = split_lines(content);

    let Some(instruction) = instruction else {
        return first_marked_block(&lines);
    };

    if let Some(span) = instruction.target
        && let Some(block) = span_block(&lines, span)
    {
        return Some(block);
    }
    paragraph_after(&lines, instruction.line_number)
}

fn span_block(lines: &[&str], span: TargetSpan) -> Option<String> {
    if span.start == 0 || span.start >= span.end || span.end > lines.len() {
        return None;
    }
    // 1-based `start + 1 ..= end` is 0-based `start..end`.
    Some(lines[span.start..span.end].join("\n"))
}

fn first_marked_block(lines: &[&str]) -> Option<String> {
    let (start_idx, first) = lines
        .iter()
        .enumerate()
        .find_map(|(idx, line)| match marker(line) {
            Some(m @ (Marker::TargetStart | Marker::TargetEnd)) => Some((idx, m)),
            _ => None,
        })?;
    if first == Marker::TargetEnd {
        return None;
    }
    let end_idx = (start_idx + 1..lines.len())
        .find(|&idx| marker(lines[idx]) == Some(Marker::TargetEnd))?;
    Some(lines[start_idx + 1..end_idx].join("\n"))
}

/// The single paragraph rule: skip blank lines after `line_number`, then take
/// contiguous non-blank lines.
fn paragraph_after(lines: &[&str], line_number: usize) -> Option<String> {
    if line_number == 0 || line_number > lines.len() {
        return None;
    }
    let paragraph: Vec<&str> = lines[line_number..]
        .iter()
        .skip_while(|line| is_blank(line))
        .take_while(|line| !is_blank(line))
        .copied()
        .collect();
    if paragraph.is_empty() {
        return None;
    }
    Some(paragraph.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instructions::parse_instructions;

    const SAMPLE: &str = "# Test Document\n\
\n\
<!-- qmims: Summarize this content -->\n\
<!-- qmims-target-start -->\n\
This is the content to summarize.\n\
It has multiple lines.\n\
<!-- qmims-target-end -->\n\
\n\
Some other content.";

    fn instruction(line_number: usize, target: Option<TargetSpan>) -> Instruction {
        Instruction {
            instruction: "rewrite".to_string(),
            line_number,
            target,
        }
    }

    #[test]
    fn empty_content_extracts_nothing() {
        let instr = instruction(1, None);
        assert_eq!(extract_target_content(None, None), None);
        assert_eq!(extract_target_content(Some(""), Some(&instr)), None);
    }

    #[test]
    fn scanned_span_returns_enclosed_lines() {
        let found = parse_instructions(Some(SAMPLE));
        let extracted = extract_target_content(Some(SAMPLE), Some(&found[0]));
        assert_eq!(
            extracted.as_deref(),
            Some("This is the content to summarize.\nIt has multiple lines.")
        );
    }

    #[test]
    fn span_content_is_not_trimmed() {
        let doc = "<!-- qmims: keep -->\n<!-- qmims-target-start -->\n  indented  \n\n- item\n<!-- qmims-target-end -->";
        let found = parse_instructions(Some(doc));
        let extracted = extract_target_content(Some(doc), Some(&found[0]));
        assert_eq!(extracted.as_deref(), Some("  indented  \n\n- item"));
    }

    #[test]
    fn direct_scan_returns_first_block() {
        assert_eq!(
            extract_target_content(Some(SAMPLE), None).as_deref(),
            Some("This is the content to summarize.\nIt has multiple lines.")
        );
    }

    #[test]
    fn direct_scan_rejects_reversed_markers() {
        let doc = "intro\n<!-- qmims-target-end -->\nbody\n<!-- qmims-target-start -->\ntail";
        assert_eq!(extract_target_content(Some(doc), None), None);
    }

    #[test]
    fn direct_scan_requires_both_markers() {
        assert_eq!(extract_target_content(Some("no markers here"), None), None);
        let unclosed = "<!-- qmims-target-start -->\nbody";
        assert_eq!(extract_target_content(Some(unclosed), None), None);
    }

    #[test]
    fn out_of_range_span_falls_back_to_paragraph() {
        let doc = "# Doc\n\
<!-- qmims: expand -->\n\
\n\
Para one\n\
line two\n\
\n\
Other";
        let stale = instruction(2, Some(TargetSpan { start: 10, end: 20 }));
        assert_eq!(
            extract_target_content(Some(doc), Some(&stale)).as_deref(),
            Some("Para one\nline two")
        );
    }

    #[test]
    fn bare_instruction_takes_next_paragraph() {
        let doc = "<!-- qmims: shorten -->\nFirst paragraph.\nStill first.\n\nSecond.";
        let found = parse_instructions(Some(doc));
        assert_eq!(
            extract_target_content(Some(doc), Some(&found[0])).as_deref(),
            Some("First paragraph.\nStill first.")
        );
    }

    #[test]
    fn paragraph_missing_at_end_of_document() {
        let doc = "text\n<!-- qmims: add footer -->\n\n";
        let found = parse_instructions(Some(doc));
        assert_eq!(extract_target_content(Some(doc), Some(&found[0])), None);

        let beyond = instruction(42, None);
        assert_eq!(extract_target_content(Some(doc), Some(&beyond)), None);
    }
}

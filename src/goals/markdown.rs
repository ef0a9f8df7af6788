//! Clipboard codec: a week's goal forest maps to a line-oriented markdown
//! list and back. Encoding is exact; decoding is permissive and silently
//! skips anything that is not a recognizable list item, so a paste can never
//! fail, only come back empty.

use chrono::{Datelike, NaiveDate};

use super::data::{Goal, PastedGoal, PastedSub, SubItem, SubKind};
use crate::week;

/// Renders the forest for the week starting at `monday`. One header line, a
/// blank line, then the goals, with a blank line between top-level goals.
pub fn encode_week(monday: NaiveDate, goals: &[Goal]) -> String {
    let (monday, sunday) = week::week_range(monday, 0);
    let mut text = format!(
        "# {} 第 {} 週目標（{} — {}）\n\n",
        monday.year(),
        week::iso_week_number(monday),
        week::short_date(monday),
        week::short_date(sunday),
    );

    if goals.is_empty() {
        text.push_str("（尚無目標）");
        return text;
    }

    for (i, goal) in goals.iter().enumerate() {
        text.push_str(&format!(
            "- [{}] {}\n",
            if goal.checked { 'x' } else { ' ' },
            goal.text
        ));
        encode_subs(&mut text, &goal.subs, 1);
        if i + 1 < goals.len() {
            text.push('\n');
        }
    }
    text
}

fn encode_subs(out: &mut String, subs: &[SubItem], depth: usize) {
    let prefix = "  ".repeat(depth);
    for sub in subs {
        match sub.kind {
            SubKind::Checkbox => out.push_str(&format!(
                "{}- [{}] {}\n",
                prefix,
                if sub.checked { 'x' } else { ' ' },
                sub.text
            )),
            SubKind::List => out.push_str(&format!("{}- {}\n", prefix, sub.text)),
        }
        encode_subs(out, &sub.subs, depth + 1);
    }
}

/// Parses pasted markdown into a forest. Only list-item lines participate;
/// a checkbox line at zero indentation opens a new goal, deeper lines attach
/// to the nearest parent one level up. Checked state is preserved.
pub fn decode(markdown: &str) -> Vec<PastedGoal> {
    let lines: Vec<&str> = markdown.lines().filter(|l| is_list_item(l)).collect();

    let mut goals = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if indent_of(line) != 0 {
            i += 1;
            continue;
        }
        match parse_item_body(item_body(line)) {
            Some((SubKind::Checkbox, checked, text)) => {
                i += 1;
                let (subs, next) = parse_subs(&lines, i, 0);
                goals.push(PastedGoal {
                    text: text.to_string(),
                    checked,
                    subs,
                });
                i = next;
            }
            _ => i += 1,
        }
    }
    goals
}

fn parse_subs(lines: &[&str], start: usize, parent_indent: usize) -> (Vec<PastedSub>, usize) {
    let mut subs = Vec::new();
    let mut i = start;
    while i < lines.len() {
        let line = lines[i];
        let indent = indent_of(line);
        if indent <= parent_indent {
            break;
        }
        // A line that skips a level is dropped, never reparented.
        if indent != parent_indent + 1 {
            i += 1;
            continue;
        }
        let Some((kind, checked, text)) = parse_item_body(item_body(line)) else {
            i += 1;
            continue;
        };
        i += 1;
        let (children, next) = parse_subs(lines, i, indent);
        subs.push(PastedSub {
            text: text.to_string(),
            kind,
            checked,
            subs: children,
        });
        i = next;
    }
    (subs, i)
}

fn is_list_item(line: &str) -> bool {
    line.trim_start().starts_with("- ")
}

/// Indentation level in units of two spaces.
fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count() / 2
}

/// Text after the `- ` list marker.
fn item_body(line: &str) -> &str {
    &line.trim_start()[2..]
}

/// Classifies an item body: `[ ] `/`[x] ` plus text is a checkbox, any other
/// non-empty body is a plain list entry.
fn parse_item_body(body: &str) -> Option<(SubKind, bool, &str)> {
    for (marker, checked) in [("[ ] ", false), ("[x] ", true)] {
        if let Some(text) = body.strip_prefix(marker) {
            if !text.is_empty() {
                return Some((SubKind::Checkbox, checked, text));
            }
        }
    }
    if body.is_empty() {
        None
    } else {
        Some((SubKind::List, false, body))
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure predicates and extractors over captured pane text.
//!
//! Everything here is a deterministic function of its input; this module
//! owns no state and is the only place regular expressions live. The
//! vocabulary is Claude Code's rendered terminal surface: usage-limit
//! notices, tool-approval dialogs, the idle input prompt, and spinner
//! chrome.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// SGR parameters that render text dim/grey. A dialog line carrying any of
/// these is pasted history or disabled chrome, not a live prompt.
const DIM_SGR: [u32; 3] = [2, 8, 90];

/// Glyph Claude Code renders in front of the currently selected option.
const SELECTION_MARKER: char = '\u{276f}';

#[allow(clippy::expect_used)]
fn pattern(src: &str) -> Regex {
    Regex::new(src).expect("static pattern")
}

static LIMIT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)limit reached|usage limit|limit[^\n]*resets"));

static ACTIVE_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)continue this conversation|you can continue|your limit (will )?reset")
});

static APPROVAL_QUESTION: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"Do you want to (make this edit to|create|proceed)\s*([^?\n]*)\??"));

static NUMBERED_OPTION: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^\s*(?:\u{276f}\s*)?(\d+)\.\s+(.+?)\s*$"));

static YES_OPTION: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\s*(?:\u{276f}\s*)?\d+\.\s*Yes"));

static RESET_TIME: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?i)(?:resets at|resets|available again at|ready at)\s+(\d{1,2}(?::\d{2})?\s*(?:am|pm)?)",
    )
});

static WAITING_INPUT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?m)^>\s*$|^>.*\u{21b5}\s*send"));

static PROCESSING: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?i)[\u{25d0}\u{25d1}\u{25d2}\u{25d3}\u{280b}\u{2819}\u{2839}\u{2838}]|processing|analyzing|running|executing|working|loading",
    )
});

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| pattern(r"\d{4}-\d{2}-\d{2}"));

/// A usage-limit notice is visible somewhere on screen.
pub fn limit_present(text: &str) -> bool {
    LIMIT.is_match(text)
}

/// First line carrying limit text, for event payloads.
pub fn limit_line(text: &str) -> Option<&str> {
    text.lines().find(|line| LIMIT.is_match(line)).map(str::trim)
}

/// The screen shows an input affordance: a bare `>` at the start of a line,
/// an input-box frame containing `>`, or one of the continue/reset phrases.
///
/// Distinguishes a live session hitting its limit from limit text quoted in
/// scrollback or a sessions-list summary row.
pub fn active_terminal(text: &str) -> bool {
    if ACTIVE_PHRASE.is_match(text) {
        return true;
    }
    text.lines().any(line_is_input_affordance)
}

fn line_is_input_affordance(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.starts_with('>') {
        return true;
    }
    // Input-box frame: `│ > ...`
    match trimmed.strip_prefix('\u{2502}') {
        Some(rest) => rest.trim_start().starts_with('>'),
        None => false,
    }
}

/// All three parts of a modal approval dialog are on screen: a question
/// line, a numbered `N. Yes` option, and the selection marker glyph.
/// Short-circuits as soon as the last part is seen.
pub fn approval_dialog_present(text: &str) -> bool {
    let mut question = false;
    let mut yes_option = false;
    let mut marker = false;
    for line in text.lines() {
        question = question || APPROVAL_QUESTION.is_match(line);
        yes_option = yes_option || YES_OPTION.is_match(line);
        marker = marker || line.contains(SELECTION_MARKER);
        if question && yes_option && marker {
            return true;
        }
    }
    false
}

/// Whether a color-annotated capture shows a *live* approval dialog.
///
/// A dialog is interactive iff at least one line carrying approval content
/// has a non-dim color escape and no dim/grey escape. Pasted dialog text
/// loses its colors or renders dim. A capture with no escapes at all is
/// assumed interactive (the binding may strip colors).
pub fn interactive_approval(colored: &str) -> bool {
    if !colored.contains('\u{1b}') {
        return true;
    }
    for line in colored.lines() {
        let plain = strip_ansi(line);
        if !is_approval_content(&plain) {
            continue;
        }
        let params = sgr_params(line);
        let has_dim = params.iter().any(|p| DIM_SGR.contains(p));
        let has_color = params.iter().any(|p| *p != 0 && !DIM_SGR.contains(p));
        if has_color && !has_dim {
            return true;
        }
    }
    false
}

fn is_approval_content(line: &str) -> bool {
    APPROVAL_QUESTION.is_match(line)
        || NUMBERED_OPTION.is_match(line)
        || line.contains(SELECTION_MARKER)
}

/// First reset-time phrase on screen, e.g. `resets at 3:45pm` → `3:45pm`.
pub fn extract_reset_time(text: &str) -> Option<String> {
    RESET_TIME.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str().trim().to_string())
}

/// One numbered option parsed from a dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalOption {
    pub number: u32,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
}

/// Structured contents of an approval dialog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalInfo {
    /// Tool classification: `Edit`, `Write`, `Bash`, or `Tool`.
    pub tool: String,
    /// Human-readable action, e.g. `Edit tmux.ts`.
    pub action: String,
    /// The full question line; dedup key for announcements.
    pub question: String,
    pub options: Vec<ApprovalOption>,
}

/// Parse tool, action, question, and numbered options out of a dialog.
///
/// Returns `None` when no question line is found.
pub fn extract_approval_info(text: &str) -> Option<ApprovalInfo> {
    let lines: Vec<&str> = text.lines().collect();
    let (question_idx, caps) = lines
        .iter()
        .enumerate()
        .find_map(|(i, line)| APPROVAL_QUESTION.captures(deboxed(line)).map(|c| (i, c)))?;

    let question = deboxed(lines[question_idx]).trim().to_string();
    let verb = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let target = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();

    let (tool, action) = match verb {
        "make this edit to" if !target.is_empty() => {
            ("Edit".to_string(), format!("Edit {target}"))
        }
        "create" if !target.is_empty() => ("Write".to_string(), format!("Write {target}")),
        "proceed" => match bash_command_line(&lines) {
            Some(cmd) => ("Bash".to_string(), format!("Bash: {cmd}")),
            None => ("Tool".to_string(), "Proceed with operation".to_string()),
        },
        _ => ("Tool".to_string(), "Proceed with operation".to_string()),
    };

    let mut options: Vec<ApprovalOption> = Vec::new();
    for line in &lines {
        if let Some(caps) = NUMBERED_OPTION.captures(deboxed(line)) {
            let number: u32 = match caps.get(1).and_then(|m| m.as_str().parse().ok()) {
                Some(n) => n,
                None => continue,
            };
            let (label, shortcut) = split_shortcut(caps.get(2).map_or("", |m| m.as_str()));
            options.push(ApprovalOption { number, label, shortcut });
        }
    }
    options.sort_by_key(|o| o.number);

    Some(ApprovalInfo { tool, action, question, options })
}

/// Split a trailing parenthesized shortcut off an option label:
/// `Yes, allow all edits during this session (shift+tab)` → label + `shift+tab`.
fn split_shortcut(label: &str) -> (String, Option<String>) {
    let trimmed = label.trim();
    if let Some(open) = trimmed.rfind('(') {
        if trimmed.ends_with(')') && open > 0 {
            let inner = &trimmed[open + 1..trimmed.len() - 1];
            if !inner.is_empty() && !inner.contains('(') {
                return (trimmed[..open].trim_end().to_string(), Some(inner.to_string()));
            }
        }
    }
    (trimmed.to_string(), None)
}

/// Find the command under a `Bash command` header: the first following line
/// that is not chrome (blank, separator, hint, question, option, marker).
fn bash_command_line(lines: &[&str]) -> Option<String> {
    let header = lines.iter().position(|line| line.contains("Bash command"))?;
    lines[header + 1..]
        .iter()
        .map(|line| deboxed(line).trim())
        .find(|t| {
            !t.is_empty()
                && !is_separator_line(t)
                && !is_hint_line(t)
                && !APPROVAL_QUESTION.is_match(t)
                && !NUMBERED_OPTION.is_match(t)
                && !t.contains(SELECTION_MARKER)
        })
        .map(str::to_string)
}

/// The input line is empty and ready: `> ` alone, or the `↵ send` hint.
pub fn waiting_for_input(text: &str) -> bool {
    WAITING_INPUT.is_match(text)
}

/// The last non-empty line carries no spinner glyph or busy word.
///
/// Deliberately some-line semantics: output above the prompt may still
/// mention "running"; only the live bottom line decides.
pub fn not_processing(text: &str) -> bool {
    match text.lines().rev().find(|line| !line.trim().is_empty()) {
        Some(last) => !PROCESSING.is_match(last),
        None => true,
    }
}

/// The part of `current` not already seen in `last`: if `current` contains
/// `last`, the suffix after it; otherwise all of `current` (the pane
/// scrolled or redrew).
pub fn new_slice<'a>(current: &'a str, last: &str) -> &'a str {
    match current.find(last) {
        Some(pos) => &current[pos + last.len()..],
        None => current,
    }
}

/// The last `n` lines of `text`.
pub fn last_lines(text: &str, n: usize) -> &str {
    let count = text.lines().count();
    if count <= n {
        return text;
    }
    let mut remaining = count - n;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if remaining == 0 {
            break;
        }
        offset += line.len();
        remaining -= 1;
    }
    &text[offset..]
}

/// Replace every `YYYY-MM-DD` occurrence in `text` with `date`.
pub fn refresh_dates(text: &str, date: &str) -> String {
    ISO_DATE.replace_all(text, date).into_owned()
}

/// Strip the box-drawing frame from a dialog line.
fn deboxed(line: &str) -> &str {
    line.trim().trim_matches(|c| matches!(c, '\u{2502}' | '|' | '\u{2503}')).trim()
}

fn is_separator_line(line: &str) -> bool {
    !line.is_empty()
        && line.chars().all(|c| {
            c.is_whitespace()
                || matches!(
                    c,
                    '\u{2500}' | '\u{2501}' | '\u{2550}' | '-' | '_' | '\u{2502}' | '\u{256d}'
                        | '\u{256e}' | '\u{256f}' | '\u{2570}' | '\u{00b7}'
                )
        })
}

fn is_hint_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("esc to cancel")
        || lower.contains("tab to amend")
        || lower.contains("enter to confirm")
        || lower.contains("ctrl+e to explain")
}

/// Remove escape sequences, keeping printable text.
fn strip_ansi(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\u{1b}' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'[') {
            chars.next();
            // CSI: parameter/intermediate bytes end at a final byte @..~
            for n in chars.by_ref() {
                if ('@'..='~').contains(&n) {
                    break;
                }
            }
        } else {
            chars.next();
        }
    }
    out
}

/// Collect all SGR parameters (`ESC [ ... m`) on a line.
fn sgr_params(line: &str) -> Vec<u32> {
    let mut params = Vec::new();
    let mut rest = line;
    while let Some(pos) = rest.find("\u{1b}[") {
        rest = &rest[pos + 2..];
        let Some(end) = rest.find(|c: char| ('@'..='~').contains(&c)) else {
            break;
        };
        let body = &rest[..end];
        let is_sgr = rest[end..].starts_with('m');
        if is_sgr {
            for part in body.split(|c| c == ';' || c == ':') {
                if part.is_empty() {
                    // `ESC [ m` is shorthand for reset
                    params.push(0);
                } else if let Ok(v) = part.parse::<u32>() {
                    params.push(v);
                }
            }
        }
        rest = &rest[end + 1..];
    }
    params
}

#[cfg(test)]
#[path = "patterns_tests.rs"]
mod tests;

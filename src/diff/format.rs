//! Human-readable renderings of a diff

use super::Diff;

// The console render is part of the crate's stable output; these sequences
// are deliberately spelled out rather than produced by a styling library.
const RED: &str = "\x1b[0;31m";
const GREEN: &str = "\x1b[0;32m";
const RESET: &str = "\x1b[m";

/// Render a diff as an HTML fragment.
///
/// Deletions are wrapped in `<del>`, insertions in `<ins>`, equalities in
/// `<span>`; newlines show as a pilcrow followed by `<br>`.
pub fn pretty_html(diffs: &[Diff]) -> String {
    let mut html = String::new();
    for diff in diffs {
        let text = diff
            .text_lossy()
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('\n', "&para;<br>");
        match diff {
            Diff::Insert(_) => {
                html.push_str("<ins style=\"background:#e6ffe6;\">");
                html.push_str(&text);
                html.push_str("</ins>");
            }
            Diff::Delete(_) => {
                html.push_str("<del style=\"background:#ffe6e6;\">");
                html.push_str(&text);
                html.push_str("</del>");
            }
            Diff::Equal(_) => {
                html.push_str("<span>");
                html.push_str(&text);
                html.push_str("</span>");
            }
        }
    }
    html
}

/// Render a diff for an ANSI console, red for deletions and green for
/// insertions, with a pilcrow marking each line end.
pub fn pretty_console(diffs: &[Diff]) -> String {
    let mut out = String::new();
    for diff in diffs {
        let text = diff.text_lossy().replace('\n', "\u{b6}\n");
        match diff {
            Diff::Insert(_) => {
                out.push_str(GREEN);
                out.push_str(&text);
                out.push_str(RESET);
            }
            Diff::Delete(_) => {
                out.push_str(RED);
                out.push_str(&text);
                out.push_str(RESET);
            }
            Diff::Equal(_) => out.push_str(&text),
        }
    }
    out
}

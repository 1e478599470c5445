use serde::{Deserialize, Serialize};

pub const NO_BINDING_SITE: &str = "No binding site found.";
pub const DEFAULT_FLANK: usize = 25;

const ELLIPSIS: &str = "...";

/// Bounded excerpt of a template around one match: the windowed text with
/// any ellipsis markers already attached, and where the match sits inside
/// that text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceWindow {
    pub text: String,
    pub match_offset: usize,
    pub match_len: usize,
}

/// First exact occurrence of the primer on the template, if any.
pub fn find_binding_site(template: &str, primer: &str) -> Option<usize> {
    template.find(primer)
}

/// Cuts `template` down to `flank` bases on either side of the match.
/// Clamped edges get an ellipsis marker; the left marker's literal length
/// is added to the match offset since it is textually prepended.
pub fn window_sequence(
    template: &str,
    position: Option<usize>,
    match_len: usize,
    flank: usize,
) -> Option<SequenceWindow> {
    let position = position?;
    let start = position.saturating_sub(flank);
    let end = (position + match_len + flank).min(template.len());

    let mut text = template[start..end].to_string();
    let mut match_offset = position - start;
    if start > 0 {
        text.insert_str(0, ELLIPSIS);
        match_offset += ELLIPSIS.len();
    }
    if end < template.len() {
        text.push_str(ELLIPSIS);
    }

    Some(SequenceWindow {
        text,
        match_offset,
        match_len,
    })
}

/// Match span verbatim, everything else as dots. `None` renders the
/// no-binding-site message.
pub fn render_windowed_line(window: Option<&SequenceWindow>) -> String {
    let Some(window) = window else {
        return NO_BINDING_SITE.to_string();
    };
    let left = ".".repeat(window.match_offset);
    let right = ".".repeat(window.text.len() - window.match_offset - window.match_len);
    let span = &window.text[window.match_offset..window.match_offset + window.match_len];
    format!("{left}{span}{right}")
}

/// Full-length variant: the primer at its position, dots elsewhere.
pub fn render_binding_line(template: &str, primer: &str, position: Option<usize>) -> String {
    let Some(position) = position else {
        return NO_BINDING_SITE.to_string();
    };
    let left = ".".repeat(position);
    let right = ".".repeat(template.len() - position - primer.len());
    format!("{left}{primer}{right}")
}

/// Window text with the match span wrapped in brackets, flanks verbatim.
pub fn highlight_binding(window: &SequenceWindow) -> String {
    let before = &window.text[..window.match_offset];
    let bound = &window.text[window.match_offset..window.match_offset + window.match_len];
    let after = &window.text[window.match_offset + window.match_len..];
    format!("{before}[{bound}]{after}")
}

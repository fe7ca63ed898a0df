use std::sync::LazyLock;

use regex::Regex;

use super::extract::{ContentItem, ExtractedDocument, ItemKind};
use crate::error::RenderError;

pub const PANEL_MARKER: &str = "➕";
const PANEL_TITLE_LEVEL: usize = 3;

static EXCESS_BLANKS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{4,}").unwrap());

#[derive(Default)]
struct RenderState {
    previous: Option<ItemKind>,
    inside_list: bool,
}

/// Markdown-flavoured flow text: preamble, then one block per item.
pub fn render(doc: &ExtractedDocument) -> Result<String, RenderError> {
    let mut lines: Vec<String> = Vec::with_capacity(doc.items.len() + 4);

    lines.push(format!("# {}\n", doc.title));
    lines.push(format!("**URL:** {}\n", doc.url));
    if !doc.description.is_empty() {
        lines.push(format!("**Description:** {}\n", doc.description));
    }
    lines.push("\n---\n".to_string());

    let mut state = RenderState::default();
    for (index, item) in doc.items.iter().enumerate() {
        check_item(index, item)?;
        let text = &item.text;

        match item.kind {
            ItemKind::Heading { level } => {
                if state.previous.is_some_and(|k| !k.is_heading()) {
                    lines.push(String::new());
                }
                lines.push(format!("\n{} {}\n", "#".repeat(level as usize), text));
                state.inside_list = false;
            }
            ItemKind::PanelTitle => {
                if state.previous.is_some_and(|k| k != ItemKind::PanelTitle) {
                    lines.push(String::new());
                }
                lines.push(format!(
                    "\n{} {} {}\n",
                    "#".repeat(PANEL_TITLE_LEVEL),
                    PANEL_MARKER,
                    text
                ));
                state.inside_list = false;
            }
            ItemKind::Paragraph | ItemKind::PanelBody => {
                if state.inside_list {
                    lines.push(String::new());
                    state.inside_list = false;
                }
                lines.push(format!("{}\n", text));
            }
            ItemKind::ListItem => {
                lines.push(format!("- {}", text));
                state.inside_list = true;
            }
        }
        state.previous = Some(item.kind);
    }

    let joined = lines.join("\n");
    Ok(EXCESS_BLANKS_RE.replace_all(&joined, "\n\n\n").into_owned())
}

fn check_item(index: usize, item: &ContentItem) -> Result<(), RenderError> {
    if item.text.trim().is_empty() {
        return Err(RenderError::MalformedItem { index, reason: "empty text" });
    }
    if let ItemKind::Heading { level } = item.kind {
        if !(1..=6).contains(&level) {
            return Err(RenderError::MalformedItem { index, reason: "heading rank out of range" });
        }
    }
    Ok(())
}

// ── Tests ──

use super::{Collector, ExtractionConfig, ItemKind};
use crate::parser::dom::{class_name, find_all, find_first, has_attr, joined_text_of, Element};
use crate::parser::text::clean;

pub const PANEL_ATTR: &str = "data-accordion";

const TITLE_HINT: &str = "title";
const BODY_HINTS: &[&str] = &["content", "text", "descr"];

/// Accordion widgets: the title row and the (usually collapsed) body.
pub fn collect(region: Element<'_>, config: &ExtractionConfig, out: &mut Collector<'_>) {
    for panel in find_all(region, |el| has_attr(el, PANEL_ATTR)) {
        if let Some(title) = find_first(panel, |el| class_name(el).contains(TITLE_HINT)) {
            out.push(ItemKind::PanelTitle, &joined_text_of(title));
        }

        let body = find_first(panel, |el| {
            let name = class_name(el);
            BODY_HINTS.iter().any(|hint| name.contains(hint))
        });
        if let Some(body) = body {
            let text = clean(&joined_text_of(body));
            if text.chars().count() > config.min_block_len {
                out.push(ItemKind::PanelBody, &text);
            }
        }
    }
}

// ── Tests ──

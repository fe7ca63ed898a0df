use super::{Collector, ExtractionConfig, ItemKind};
use crate::parser::dom::{find_all, find_by_tags, has_ancestor_tag, joined_text_of, tag, Element, HEADING_TAGS};

pub fn headings(region: Element<'_>, _config: &ExtractionConfig, out: &mut Collector<'_>) {
    for el in find_by_tags(region, HEADING_TAGS) {
        if let Some(level) = heading_level(tag(el)) {
            out.push(ItemKind::Heading { level }, &joined_text_of(el));
        }
    }
}

pub fn paragraphs(region: Element<'_>, _config: &ExtractionConfig, out: &mut Collector<'_>) {
    for el in find_all(region, |el| tag(el) == "p") {
        out.push(ItemKind::Paragraph, &joined_text_of(el));
    }
}

/// Top-level items only; a nested item's text is already part of its parent.
pub fn list_items(region: Element<'_>, _config: &ExtractionConfig, out: &mut Collector<'_>) {
    for el in find_all(region, |el| tag(el) == "li" && !has_ancestor_tag(el, "li")) {
        out.push(ItemKind::ListItem, &joined_text_of(el));
    }
}

fn heading_level(name: &str) -> Option<u8> {
    name.strip_prefix('h')?
        .parse()
        .ok()
        .filter(|level| (1..=6).contains(level))
}

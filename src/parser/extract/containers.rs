use super::{Collector, ExtractionConfig, ItemKind};
use crate::parser::dom::{
    attr, classes, contains_any_tag, count_tag, find_all, joined_text_of, tag, Element,
    STRUCTURAL_TAGS,
};
use crate::parser::text::clean;

/// Class tokens the page builder puts on plain text blocks.
pub const BUILDER_TEXT_CLASSES: &[&str] = &[
    "tn-atom",
    "t-descr",
    "t491__content",
    "t-card__descr",
    "t-text",
    "t-section__descr",
];

/// Builder text blocks, grouped by class token in table order.
pub fn builder_text(region: Element<'_>, config: &ExtractionConfig, out: &mut Collector<'_>) {
    for token in BUILDER_TEXT_CLASSES {
        let blocks = find_all(region, |el| {
            tag(el) == "div" && classes(el).any(|c| c.contains(token))
        });
        for el in blocks {
            if contains_any_tag(el, STRUCTURAL_TAGS) {
                continue;
            }
            push_block(el, config, out);
        }
    }
}

/// Near-leaf divs holding prose directly, for templates that skip <p>.
pub fn leaf_containers(region: Element<'_>, config: &ExtractionConfig, out: &mut Collector<'_>) {
    for el in find_all(region, |el| tag(el) == "div") {
        if is_builder_text_block(el)
            || contains_any_tag(el, STRUCTURAL_TAGS)
            || count_tag(el, "div") > config.max_nested_containers
        {
            continue;
        }
        push_block(el, config, out);
    }
}

fn is_builder_text_block(el: Element<'_>) -> bool {
    let name = attr(el, "class").unwrap_or_default();
    BUILDER_TEXT_CLASSES.iter().any(|token| name.contains(token))
}

fn push_block(el: Element<'_>, config: &ExtractionConfig, out: &mut Collector<'_>) {
    let text = clean(&joined_text_of(el));
    if text.chars().count() > config.min_block_len {
        out.push(ItemKind::Paragraph, &text);
    }
}

use crate::parser::dom::{attr, find_first, tag, text_of, Dom};
use crate::parser::text::clean;

pub const UNTITLED: &str = "Untitled";

pub struct PageMeta {
    pub title: String,
    pub description: String,
}

/// `<title>` and `<meta name="description">`, read before any pruning.
pub fn read(dom: &Dom) -> PageMeta {
    let title = find_first(dom.root(), |el| tag(el) == "title")
        .map(|el| clean(&text_of(el)))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let description = find_first(dom.root(), |el| {
        tag(el) == "meta" && attr(el, "name") == Some("description")
    })
    .and_then(|el| attr(el, "content"))
    .map(clean)
    .unwrap_or_default();

    PageMeta { title, description }
}

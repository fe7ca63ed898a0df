//! Minimal tree capabilities the extractor needs: find by predicate, text of
//! a subtree, remove a subtree. Everything that touches `scraper` directly
//! lives here.

use scraper::{ElementRef, Html};

use crate::error::ParseError;

pub type Element<'a> = ElementRef<'a>;

pub const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
pub const STRUCTURAL_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "p", "ul", "ol"];

pub struct Dom {
    html: Html,
}

impl Dom {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        if raw.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        let html = Html::parse_document(raw);
        let has_root = html
            .tree
            .root()
            .children()
            .any(|child| child.value().is_element());
        if !has_root {
            return Err(ParseError::NoRoot);
        }
        Ok(Dom { html })
    }

    /// The `<html>` element. Presence is checked in [`Dom::parse`].
    pub fn root(&self) -> Element<'_> {
        self.html.root_element()
    }

    pub fn body(&self) -> Option<Element<'_>> {
        find_first(self.root(), |el| tag(el) == "body")
    }

    /// Detach every element below the root that matches `pred`. Returns the
    /// number of matches (nested matches count separately).
    pub fn remove_where<F>(&mut self, pred: F) -> usize
    where
        F: Fn(Element<'_>) -> bool,
    {
        let ids: Vec<_> = find_all(self.root(), |el| pred(el))
            .map(|el| el.id())
            .collect();
        for id in &ids {
            if let Some(mut node) = self.html.tree.get_mut(*id) {
                node.detach();
            }
        }
        ids.len()
    }
}

/// Elements strictly below `scope`, in document order.
pub fn find_all<'a, F>(scope: Element<'a>, pred: F) -> impl Iterator<Item = Element<'a>>
where
    F: Fn(Element<'a>) -> bool,
{
    scope
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(move |el| pred(*el))
}

pub fn find_first<'a, F>(scope: Element<'a>, pred: F) -> Option<Element<'a>>
where
    F: Fn(Element<'a>) -> bool,
{
    find_all(scope, pred).next()
}

pub fn find_by_tags<'a>(scope: Element<'a>, tags: &'a [&'a str]) -> impl Iterator<Item = Element<'a>> {
    find_all(scope, move |el| tags.contains(&tag(el)))
}

pub fn contains_any_tag(scope: Element<'_>, tags: &[&str]) -> bool {
    find_first(scope, |el| tags.contains(&tag(el))).is_some()
}

pub fn count_tag(scope: Element<'_>, name: &str) -> usize {
    find_all(scope, |el| tag(el) == name).count()
}

pub fn has_ancestor_tag(el: Element<'_>, name: &str) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| tag(a) == name)
}

pub fn tag<'a>(el: Element<'a>) -> &'a str {
    el.value().name()
}

pub fn attr<'a>(el: Element<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name)
}

pub fn has_attr(el: Element<'_>, name: &str) -> bool {
    el.value().attr(name).is_some()
}

pub fn classes<'a>(el: Element<'a>) -> impl Iterator<Item = &'a str> {
    el.value().classes()
}

/// Whole class attribute, lower-cased.
pub fn class_name(el: Element<'_>) -> String {
    attr(el, "class").unwrap_or_default().to_lowercase()
}

/// Concatenated text nodes, as they appear in the source.
pub fn text_of(el: Element<'_>) -> String {
    el.text().collect()
}

/// Trimmed, non-empty text nodes joined by a single space.
pub fn joined_text_of(el: Element<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Tests ──

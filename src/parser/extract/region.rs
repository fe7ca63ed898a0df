use crate::parser::dom::{attr, classes, find_first, tag, Dom, Element};

/// Zero-block canvas (`t396`) or its atoms (`tn-elem`, `tn-atom`, ...).
pub fn is_page_builder(dom: &Dom) -> bool {
    find_first(dom.root(), |el| {
        classes(el).any(|c| c.contains("t396") || c.starts_with("tn-"))
    })
    .is_some()
}

/// Page-builder content is spread over many sibling sections, so the whole
/// body is used. Otherwise the first of main, article, `div#content*`, body.
pub fn select(dom: &Dom, page_builder: bool) -> Element<'_> {
    let root = dom.root();
    if page_builder {
        return dom.body().unwrap_or(root);
    }

    find_first(root, |el| tag(el) == "main")
        .or_else(|| find_first(root, |el| tag(el) == "article"))
        .or_else(|| find_first(root, is_content_div))
        .or_else(|| dom.body())
        .unwrap_or(root)
}

fn is_content_div(el: Element<'_>) -> bool {
    tag(el) == "div"
        && attr(el, "id")
            .map(|id| id.to_lowercase().starts_with("content"))
            .unwrap_or(false)
}

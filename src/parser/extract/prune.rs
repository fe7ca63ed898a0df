use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::parser::dom::{classes, tag, Dom, Element};

/// Removed with their whole subtree, unconditionally.
const CARRIER_TAGS: &[&str] = &[
    "script", "style", "noscript", "svg", "iframe", "nav", "header", "footer",
];

static CHROME_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)header|footer|menu|nav").unwrap());
// Page-builder block classes (t585__header, t228__menu, ...) must survive:
// collapsible panels reuse "header" for their title row.
static BUILDER_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^t\d+__").unwrap());

/// Strip script/style/navigation carriers, then site chrome identified by
/// class name. Returns the number of removed elements.
pub fn strip_noise_carriers(dom: &mut Dom) -> usize {
    let by_tag = dom.remove_where(|el| CARRIER_TAGS.contains(&tag(el)));
    let by_class = dom.remove_where(is_chrome_container);
    trace!(by_tag, by_class, "pruned noise carriers");
    by_tag + by_class
}

fn is_chrome_container(el: Element<'_>) -> bool {
    let mut chrome = false;
    for class in classes(el) {
        if BUILDER_BLOCK_RE.is_match(class) {
            return false;
        }
        chrome |= CHROME_CLASS_RE.is_match(class);
    }
    chrome
}

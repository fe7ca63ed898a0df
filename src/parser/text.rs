use std::sync::LazyLock;

use regex::Regex;

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#?\w+;").unwrap());
static QP_PAD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*=3D\s*").unwrap());

/// Collapse whitespace, drop leftover `&xxx;` entities and `=3D` padding.
///
/// Stripping runs to a fixed point before whitespace is collapsed, so that
/// `clean(clean(x)) == clean(x)` holds even for nested debris like `&am&amp;p;`.
pub fn clean(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut out = text.to_string();
    loop {
        let stripped = ENTITY_RE.replace_all(&out, "");
        let stripped = QP_PAD_RE.replace_all(&stripped, "").into_owned();
        if stripped == out {
            break;
        }
        out = stripped;
    }

    WS_RE.replace_all(&out, " ").trim().to_string()
}

/// Lower-cased alphanumeric characters only, whitespace included in what is
/// dropped, so word splitting never changes the key. Only used for duplicate
/// comparison, never displayed.
pub fn canonical_key(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Coarse similarity: one text contains the other and their lengths are
/// within 80% of each other. Compared on alphanumeric-only lower-cased forms.
pub fn is_near_duplicate(a: &str, b: &str) -> bool {
    let a = canonical_key(a);
    let b = canonical_key(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }

    let (la, lb) = (a.chars().count(), b.chars().count());
    let ratio = la.min(lb) as f64 / la.max(lb) as f64;
    ratio > 0.8 && (a.contains(&b) || b.contains(&a))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        assert_eq!(clean("  Hello \n\t  world  "), "Hello world");
    }

    #[test]
    fn empty_input() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("   \n "), "");
    }

    #[test]
    fn strips_entities() {
        assert_eq!(clean("Fish &amp; chips"), "Fish chips");
        assert_eq!(clean("a&#160;b"), "ab");
    }

    #[test]
    fn strips_qp_padding() {
        assert_eq!(clean("class =3D \"x\""), "class\"x\"");
        assert_eq!(clean("price=3D100"), "price100");
    }

    #[test]
    fn idempotent() {
        let inputs = [
            "  Hello \n world ",
            "a &amp; b",
            "&am&amp;p; tail",
            "=3=3DD",
            "x =3D  &nbsp; y",
            "Доставка   по всей  России",
            "",
        ];
        for input in inputs {
            let once = clean(input);
            assert_eq!(clean(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn canonical_key_ignores_case_and_punctuation() {
        assert_eq!(canonical_key("Contact us, for a FREE quote!"), "contactusforafreequote");
        assert_eq!(canonical_key("contact   us for a free quote"), "contactusforafreequote");
        assert_eq!(canonical_key("Доставка по России"), "доставкапороссии");
        assert_eq!(canonical_key("—"), "");
    }

    #[test]
    fn canonical_key_ignores_word_splitting() {
        assert_eq!(
            canonical_key("We ship worldwidein 3 days"),
            canonical_key("We ship worldwide in 3 days")
        );
    }

    #[test]
    fn near_duplicate_requires_containment_and_ratio() {
        assert!(is_near_duplicate("We ship worldwide", "We ship worldwide!"));
        assert!(is_near_duplicate("Free shipping on all orders", "free shipping on all orders."));
        assert!(!is_near_duplicate("Free shipping", "Free shipping on all orders over fifty"));
        assert!(!is_near_duplicate("Completely different text", "Nothing alike here at all"));
        assert!(!is_near_duplicate("", "anything"));
    }
}

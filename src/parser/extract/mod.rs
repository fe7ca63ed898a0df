pub mod containers;
pub mod meta;
pub mod panels;
pub mod prune;
pub mod region;
pub mod semantic;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::dom::{Dom, Element};
use super::noise::NoiseClassifier;
use super::text::{canonical_key, clean, is_near_duplicate};
use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemKind {
    Heading { level: u8 },
    Paragraph,
    ListItem,
    PanelTitle,
    PanelBody,
}

impl ItemKind {
    pub fn is_heading(self) -> bool {
        matches!(self, ItemKind::Heading { .. })
    }

    /// Headings and panel titles are allowed to be short.
    fn needs_min_len(self) -> bool {
        !matches!(self, ItemKind::Heading { .. } | ItemKind::PanelTitle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentItem {
    #[serde(flatten)]
    pub kind: ItemKind,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractedDocument {
    pub title: String,
    pub url: String,
    pub description: String,
    pub items: Vec<ContentItem>,
}

/// Length thresholds and optional extras. Defaults give the standard
/// behaviour; the container thresholds are empirical.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum chars for any item except headings and panel titles.
    pub min_item_len: usize,
    /// Panel bodies and container text must be longer than this.
    pub min_block_len: usize,
    /// Leaf containers may hold at most this many nested divs.
    pub max_nested_containers: usize,
    pub extra_noise_patterns: Vec<String>,
    /// Also drop candidates that are near-duplicates of earlier items.
    pub near_duplicate_dedup: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            min_item_len: 10,
            min_block_len: 15,
            max_nested_containers: 1,
            extra_noise_patterns: Vec::new(),
            near_duplicate_dedup: false,
        }
    }
}

type Rule = fn(Element<'_>, &ExtractionConfig, &mut Collector<'_>);

/// Items are appended in rule order, so this list is also the priority
/// order: panels before anything that could capture their text again,
/// semantic tags before container heuristics.
const RULES: &[(&str, Rule)] = &[
    ("panels", panels::collect as Rule),
    ("headings", semantic::headings as Rule),
    ("paragraphs", semantic::paragraphs as Rule),
    ("list_items", semantic::list_items as Rule),
    ("builder_text", containers::builder_text as Rule),
    ("leaf_containers", containers::leaf_containers as Rule),
];

/// Filters candidates and owns the seen-text set for one document.
pub struct Collector<'c> {
    noise: &'c NoiseClassifier,
    config: &'c ExtractionConfig,
    seen: HashSet<String>,
    seen_keys: Vec<String>,
    items: Vec<ContentItem>,
}

impl<'c> Collector<'c> {
    pub fn new(noise: &'c NoiseClassifier, config: &'c ExtractionConfig) -> Self {
        Collector {
            noise,
            config,
            seen: HashSet::new(),
            seen_keys: Vec::new(),
            items: Vec::new(),
        }
    }

    /// normalize → noise → min length → exact duplicate → append.
    /// Returns whether the candidate was kept.
    pub fn push(&mut self, kind: ItemKind, raw: &str) -> bool {
        let text = clean(raw);
        if self.noise.is_noise(&text) {
            return false;
        }
        if kind.needs_min_len() && text.chars().count() < self.config.min_item_len {
            return false;
        }

        let key = canonical_key(&text);
        if self.seen.contains(&key) {
            return false;
        }
        if self.config.near_duplicate_dedup {
            if self.seen_keys.iter().any(|k| is_near_duplicate(k, &key)) {
                return false;
            }
            self.seen_keys.push(key.clone());
        }
        self.seen.insert(key);

        self.items.push(ContentItem { kind, text });
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn into_items(self) -> Vec<ContentItem> {
        self.items
    }
}

pub struct Extractor {
    config: ExtractionConfig,
    noise: NoiseClassifier,
}

impl Extractor {
    pub fn new(config: ExtractionConfig) -> Result<Self, regex::Error> {
        let noise = NoiseClassifier::with_extra(&config.extra_noise_patterns)?;
        Ok(Extractor { config, noise })
    }

    pub fn extract_html(&self, raw: &str, url: &str) -> Result<ExtractedDocument, ParseError> {
        let mut dom = Dom::parse(raw)?;
        Ok(self.extract(&mut dom, url))
    }

    /// Prunes `dom` in place, then runs every rule over the content region.
    pub fn extract(&self, dom: &mut Dom, url: &str) -> ExtractedDocument {
        let page = meta::read(dom);
        let removed = prune::strip_noise_carriers(dom);

        let page_builder = region::is_page_builder(dom);
        let scope = region::select(dom, page_builder);
        debug!(url, removed, page_builder, region = scope.value().name(), "content region selected");

        let mut collector = Collector::new(&self.noise, &self.config);
        for (name, rule) in RULES {
            let before = collector.len();
            rule(scope, &self.config, &mut collector);
            debug!(url, rule = *name, added = collector.len() - before);
        }

        ExtractedDocument {
            title: page.title,
            url: url.to_string(),
            description: page.description,
            items: collector.into_items(),
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> ExtractedDocument {
        Extractor::new(ExtractionConfig::default())
            .unwrap()
            .extract_html(html, "https://example.com/page")
            .unwrap()
    }

    fn fixture(name: &str) -> ExtractedDocument {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap();
        extract(&html)
    }

    fn texts(doc: &ExtractedDocument) -> Vec<&str> {
        doc.items.iter().map(|i| i.text.as_str()).collect()
    }

    #[test]
    fn empty_document_is_error() {
        let extractor = Extractor::new(ExtractionConfig::default()).unwrap();
        assert_eq!(extractor.extract_html("", "u").err(), Some(ParseError::Empty));
    }

    #[test]
    fn metadata_defaults() {
        let doc = extract("<body><p>Some paragraph text here</p></body>");
        assert_eq!(doc.title, "Untitled");
        assert_eq!(doc.description, "");
        assert_eq!(doc.url, "https://example.com/page");
    }

    #[test]
    fn exact_duplicate_kept_once() {
        let doc = extract(
            "<main><p>Contact us for a free quote</p><p>Contact us for a free quote</p></main>",
        );
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].kind, ItemKind::Paragraph);
        assert_eq!(doc.items[0].text, "Contact us for a free quote");
    }

    #[test]
    fn duplicate_key_ignores_case_and_punctuation() {
        let doc = extract(
            "<main><h2>Delivery and returns policy</h2><p>Delivery and returns policy.</p></main>",
        );
        assert_eq!(doc.items.len(), 1);
        assert!(doc.items[0].kind.is_heading());
    }

    #[test]
    fn short_paragraph_dropped_but_short_heading_kept() {
        let doc = extract("<main><h1>Services</h1><p>Too short</p></main>");
        assert_eq!(texts(&doc), vec!["Services"]);
        assert_eq!(doc.items[0].kind, ItemKind::Heading { level: 1 });
    }

    #[test]
    fn headings_keep_rank_and_order() {
        let doc = extract("<main><h3>Step 3 of the process</h3><h1>Welcome to Example Logistics</h1><h2>Second</h2></main>");
        let levels: Vec<_> = doc
            .items
            .iter()
            .map(|i| match i.kind {
                ItemKind::Heading { level } => level,
                _ => 0,
            })
            .collect();
        assert_eq!(levels, vec![3, 1, 2]);
        assert_eq!(texts(&doc), vec!["Step 3 of the process", "Welcome to Example Logistics", "Second"]);
    }

    #[test]
    fn nested_list_items_not_repeated() {
        let doc = extract(
            "<main><ul><li>Outer item text <ul><li>Inner item text</li></ul></li><li>Second outer list item</li></ul></main>",
        );
        let kinds: Vec<_> = doc.items.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![ItemKind::ListItem, ItemKind::ListItem]);
        assert_eq!(texts(&doc), vec!["Outer item text Inner item text", "Second outer list item"]);
    }

    #[test]
    fn panel_items_precede_and_suppress_fallbacks() {
        let doc = extract(
            r#"<body><div class="t396"></div>
            <div class="t585__accordion" data-accordion="true">
              <div class="t585__header"><span class="t585__title">FAQ</span></div>
              <div class="t585__content"><div class="t585__text t-descr">We ship worldwide in 3 days</div></div>
            </div></body>"#,
        );
        assert_eq!(doc.items.len(), 2);
        assert_eq!(doc.items[0].kind, ItemKind::PanelTitle);
        assert_eq!(doc.items[0].text, "FAQ");
        assert_eq!(doc.items[1].kind, ItemKind::PanelBody);
        assert_eq!(doc.items[1].text, "We ship worldwide in 3 days");
    }

    #[test]
    fn panel_body_with_line_break_not_repeated() {
        let doc = extract(
            r#"<body><div class="t396"></div>
            <div class="t585__accordion" data-accordion="true">
              <div class="t585__header"><span class="t585__title">FAQ</span></div>
              <div class="t585__content"><div class="t585__text">We ship worldwide<br>in 3 days</div></div>
            </div></body>"#,
        );
        assert_eq!(texts(&doc), vec!["FAQ", "We ship worldwide in 3 days"]);
        assert_eq!(doc.items[1].kind, ItemKind::PanelBody);
    }

    #[test]
    fn near_duplicate_dedup_is_opt_in() {
        let html = "<main><p>Free shipping on all orders</p><p>Free shipping on all orders today</p></main>";
        assert_eq!(extract(html).items.len(), 2);

        let config = ExtractionConfig {
            near_duplicate_dedup: true,
            ..ExtractionConfig::default()
        };
        let doc = Extractor::new(config).unwrap().extract_html(html, "u").unwrap();
        assert_eq!(texts(&doc), vec!["Free shipping on all orders"]);
    }

    #[test]
    fn extra_noise_patterns_apply() {
        let config = ExtractionConfig {
            extra_noise_patterns: vec!["all rights reserved".to_string()],
            ..ExtractionConfig::default()
        };
        let doc = Extractor::new(config)
            .unwrap()
            .extract_html("<main><p>2024 Acme. All Rights Reserved.</p><p>This paragraph is real content</p></main>", "u")
            .unwrap();
        assert_eq!(texts(&doc), vec!["This paragraph is real content"]);
    }

    #[test]
    fn invalid_extra_pattern_is_error() {
        let config = ExtractionConfig {
            extra_noise_patterns: vec!["(unclosed".to_string()],
            ..ExtractionConfig::default()
        };
        assert!(Extractor::new(config).is_err());
    }

    #[test]
    fn tilda_fixture() {
        let doc = fixture("tilda_landing");
        assert_eq!(doc.title, "Utrace Hub — трекинг грузов");
        assert_eq!(doc.description, "Платформа для отслеживания грузов");

        let t = texts(&doc);
        // panels first, in panel order
        assert_eq!(doc.items[0].kind, ItemKind::PanelTitle);
        assert_eq!(t[0], "Как подключиться?");
        assert_eq!(doc.items[1].kind, ItemKind::PanelBody);
        assert_eq!(t[1], "Оставьте заявку, и менеджер свяжется с вами в течение дня.");
        assert_eq!(t[2], "Сколько это стоит?");

        assert!(t.contains(&"Отслеживание грузов в реальном времени"));
        assert!(t.contains(&"Мы собираем данные от перевозчиков и показываем их в одном окне."));

        // nothing from chrome, scripts or builder debris
        assert!(!t.iter().any(|x| x.contains("Меню")));
        assert!(!t.iter().any(|x| x.contains("tildacdn")));
        assert!(!t.iter().any(|x| x.contains("Made on")));
        assert!(!t.iter().any(|x| x.contains("2024")));
        assert!(!t.iter().any(|x| x.contains("Content Oriented")));

        // every panel text survives exactly once
        let body = "Оставьте заявку, и менеджер свяжется с вами в течение дня.";
        assert_eq!(t.iter().filter(|x| **x == body).count(), 1);
    }

    #[test]
    fn conventional_fixture_uses_main() {
        let doc = fixture("conventional_article");
        let t = texts(&doc);
        assert_eq!(doc.title, "Shipping guide | Example Logistics");
        assert_eq!(t[0], "Shipping guide for international orders");
        assert!(t.contains(&"We ship worldwide from our three regional warehouses."));
        assert!(t.contains(&"Tracking numbers are sent by email"));
        // outside <main>
        assert!(!t.iter().any(|x| x.contains("Related articles elsewhere")));
        // chrome removed by tag and class
        assert!(!t.iter().any(|x| x.contains("Subscribe to newsletter")));
        assert!(!t.iter().any(|x| x.contains("Skip to navigation")));
        // generic prose container captured as a paragraph
        assert!(t.contains(&"Orders placed before noon leave the warehouse the same day."));
    }
}

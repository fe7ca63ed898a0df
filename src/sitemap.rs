use anyhow::{Context, Result};
use tracing::info;

use crate::fetch::Fetcher;
use crate::store::{PageEntry, SiteStructure};

/// Fetch a sitemap and turn its `<loc>` entries into a work list, keeping
/// only URLs under `prefix` when one is given. Order is preserved and
/// repeated URLs are kept once.
pub async fn build_structure(
    fetcher: &dyn Fetcher,
    sitemap_url: &str,
    prefix: Option<&str>,
) -> Result<SiteStructure> {
    info!("Fetching sitemap: {}", sitemap_url);
    let xml = fetcher
        .fetch(sitemap_url)
        .await
        .with_context(|| format!("Failed to fetch sitemap {}", sitemap_url))?;

    let all_urls = parse_urlset(&xml)?;
    info!("Total URLs in sitemap: {}", all_urls.len());

    let mut seen = std::collections::HashSet::new();
    let pages: Vec<PageEntry> = all_urls
        .into_iter()
        .filter(|url| prefix.map_or(true, |p| url.starts_with(p)))
        .filter(|url| seen.insert(url.clone()))
        .map(|url| PageEntry { url, title: None })
        .collect();

    info!("Pages after filtering: {}", pages.len());
    Ok(SiteStructure { pages })
}

/// Parse a urlset XML and return all <loc> URLs.
fn parse_urlset(xml: &str) -> Result<Vec<String>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut urls = Vec::new();
    let mut in_url = false;
    let mut in_loc = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => match e.local_name().as_ref() {
                b"url" => in_url = true,
                b"loc" if in_url => in_loc = true,
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(e)) if in_loc => {
                let url = e.unescape()?.trim().to_string();
                if !url.is_empty() {
                    urls.push(url);
                }
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"loc" => in_loc = false,
                b"url" => in_url = false,
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }
    Ok(urls)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::fake::FakeFetcher;

    const SITEMAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://utrace.ru/</loc><lastmod>2024-05-01</lastmod></url>
  <url><loc>https://utrace.ru/utrace-hub</loc></url>
  <url><loc>https://utrace.ru/blog/tracking?a=1&amp;b=2</loc></url>
  <url><loc>https://utrace.ru/utrace-hub</loc></url>
</urlset>"#;

    #[test]
    fn parses_locs_in_order() {
        let urls = parse_urlset(SITEMAP).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://utrace.ru/",
                "https://utrace.ru/utrace-hub",
                "https://utrace.ru/blog/tracking?a=1&b=2",
                "https://utrace.ru/utrace-hub",
            ]
        );
    }

    #[tokio::test]
    async fn prefix_filter_and_dedup() {
        let fetcher = FakeFetcher::new().page("https://utrace.ru/sitemap.xml", SITEMAP);
        let all = build_structure(&fetcher, "https://utrace.ru/sitemap.xml", None).await.unwrap();
        assert_eq!(all.pages.len(), 3);

        let blog = build_structure(&fetcher, "https://utrace.ru/sitemap.xml", Some("https://utrace.ru/blog"))
            .await
            .unwrap();
        assert_eq!(blog.pages.len(), 1);
        assert_eq!(blog.pages[0].url, "https://utrace.ru/blog/tracking?a=1&b=2");
    }

    #[tokio::test]
    async fn fetch_failure_is_error() {
        let fetcher = FakeFetcher::new().fail("https://utrace.ru/sitemap.xml", "HTTP 500");
        let err = build_structure(&fetcher, "https://utrace.ru/sitemap.xml", None).await.unwrap_err();
        assert!(format!("{:#}", err).contains("HTTP 500"));
    }
}

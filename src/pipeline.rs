use tracing::debug;

use crate::error::PageError;
use crate::fetch::Fetcher;
use crate::parser::{self, ExtractedDocument, Extractor};

/// One page's result: rendered flow text plus the model it came from.
#[derive(Debug)]
pub struct RenderedPage {
    pub url: String,
    pub text: String,
    pub document: ExtractedDocument,
}

/// fetch → extract → render for a single URL. Holds no per-page state, so
/// one instance is shared by every concurrent task.
pub struct PagePipeline {
    extractor: Extractor,
}

impl PagePipeline {
    pub fn new(extractor: Extractor) -> Self {
        PagePipeline { extractor }
    }

    /// A fetch failure is returned as-is; retrying is the caller's call.
    pub async fn process(&self, url: &str, fetcher: &dyn Fetcher) -> Result<RenderedPage, PageError> {
        let html = fetcher.fetch(url).await?;
        self.process_html(url, &html)
    }

    pub fn process_html(&self, url: &str, html: &str) -> Result<RenderedPage, PageError> {
        let (document, text) = parser::to_flow_text(&self.extractor, html, url)?;
        debug!(url, items = document.items.len(), "page rendered");
        Ok(RenderedPage {
            url: url.to_string(),
            text,
            document,
        })
    }
}

// ── Tests ──

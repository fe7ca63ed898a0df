pub mod dom;
pub mod extract;
pub mod noise;
pub mod render;
pub mod text;

pub use extract::{ExtractedDocument, ExtractionConfig, Extractor};
pub use render::render;

use crate::error::PageError;

/// Three-pass pipeline: raw html → pruned tree → content items → flow text.
pub fn to_flow_text(extractor: &Extractor, html: &str, url: &str) -> Result<(ExtractedDocument, String), PageError> {
    let doc = extractor.extract_html(html, url)?;
    let text = render(&doc)?;
    Ok((doc, text))
}

use thiserror::Error;

/// Failure reported by the fetch capability, carried verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct FetchError(pub String);

impl FetchError {
    pub fn new(reason: impl Into<String>) -> Self {
        FetchError(reason.into())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("document is empty")]
    Empty,
    #[error("document has no root element")]
    NoRoot,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("malformed item #{index}: {reason}")]
    MalformedItem { index: usize, reason: &'static str },
}

/// Everything that can stop one page from producing a document.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("{0}")]
    Fetch(#[from] FetchError),
    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

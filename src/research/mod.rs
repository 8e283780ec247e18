//! Research sources used by the static (non-MCP) tool variant.

mod arxiv;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

pub use arxiv::ArxivSource;

/// A single piece of research content from any source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchItem {
    pub title: String,
    pub summary: String,
    pub url: String,
    /// Source identifier, e.g. "arxiv".
    pub source_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
}

/// A searchable research corpus.
#[async_trait]
pub trait ResearchSource: Send + Sync {
    /// Identifier for this source type.
    fn source_type(&self) -> &str;

    /// Search for content matching `query`, newest first.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<ResearchItem>>;
}

//! arXiv research source (Atom API).

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, instrument};
use url::Url;

use super::{ResearchItem, ResearchSource};
use crate::error::{PodcraftError, Result};

const BASE_URL: &str = "https://export.arxiv.org/api/query";
const SOURCE_TYPE: &str = "arxiv";

static ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<entry[^>]*>(.*?)</entry>").expect("Invalid regex"));
static AUTHOR_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<author[^>]*>.*?<name[^>]*>(.*?)</name>.*?</author>").expect("Invalid regex")
});
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

/// Searches arXiv through its public export API.
pub struct ArxivSource {
    client: reqwest::Client,
    base_url: String,
}

impl ArxivSource {
    pub fn new() -> Result<Self> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("podcraft/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    fn query_url(&self, query: &str, max_results: usize) -> Result<Url> {
        Url::parse_with_params(
            &self.base_url,
            &[
                ("search_query", format!("all:{query}")),
                ("start", "0".to_string()),
                ("max_results", max_results.to_string()),
                ("sortBy", "submittedDate".to_string()),
                ("sortOrder", "descending".to_string()),
            ],
        )
        .map_err(|e| PodcraftError::Config(format!("Invalid arXiv URL '{}': {}", self.base_url, e)))
    }
}

#[async_trait]
impl ResearchSource for ArxivSource {
    fn source_type(&self) -> &str {
        SOURCE_TYPE
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<ResearchItem>> {
        let url = self.query_url(query, max_results)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(PodcraftError::Research(format!(
                "arXiv returned {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let items = parse_feed(&body);
        debug!(count = items.len(), "Parsed arXiv feed");
        Ok(items)
    }
}

/// Parse an arXiv Atom feed into research items.
pub(crate) fn parse_feed(xml: &str) -> Vec<ResearchItem> {
    ENTRY
        .captures_iter(xml)
        .filter_map(|cap| cap.get(1))
        .map(|entry| parse_entry(entry.as_str()))
        .collect()
}

fn parse_entry(entry: &str) -> ResearchItem {
    let authors = AUTHOR_NAME
        .captures_iter(entry)
        .filter_map(|cap| cap.get(1))
        .map(|name| clean_text(name.as_str()))
        .filter(|name| !name.is_empty())
        .collect();

    ResearchItem {
        title: element(entry, "title").map(clean_text).unwrap_or_default(),
        summary: element(entry, "summary").map(clean_text).unwrap_or_default(),
        url: element(entry, "id")
            .map(|id| unescape(id.trim()))
            .unwrap_or_default(),
        source_type: SOURCE_TYPE.to_string(),
        authors,
        published_date: element(entry, "published")
            .map(str::trim)
            .map(|date| date.chars().take(10).collect()),
    }
}

/// Inner text of the first `<tag>` element directly in `entry`.
fn element<'a>(entry: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let mut search_from = 0;
    while let Some(offset) = entry[search_from..].find(&open) {
        let start = search_from + offset;
        let after_name = start + open.len();
        // Reject prefixes such as <titles> or namespaced <arxiv:title>.
        match entry[after_name..].chars().next() {
            Some('>') | Some(' ') | Some('\t') | Some('\n') | Some('\r') => {}
            Some('/') => return Some(""),
            _ => {
                search_from = after_name;
                continue;
            }
        }
        let body_start = after_name + entry[after_name..].find('>')? + 1;
        let body_end = body_start + entry[body_start..].find(&close)?;
        return Some(&entry[body_start..body_end]);
    }
    None
}

fn clean_text(text: &str) -> String {
    unescape(WHITESPACE.replace_all(text.trim(), " ").as_ref())
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=all:graph neural networks</title>
  <id>http://arxiv.org/api/abc</id>
  <entry>
    <id>http://arxiv.org/abs/2401.01234v1</id>
    <published>2024-01-03T18:59:59Z</published>
    <title>Graph Neural Networks
      for   Molecules</title>
    <summary>  We study message passing &amp; pooling
      on molecular graphs.
    </summary>
    <author>
      <name>Ada Lovelace</name>
    </author>
    <author>
      <name>Alan Turing</name>
      <arxiv:affiliation xmlns:arxiv="http://arxiv.org/schemas/atom">Bletchley</arxiv:affiliation>
    </author>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schemas/atom" term="cs.LG"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2312.09999v2</id>
    <title>Over-smoothing in GNNs</title>
    <summary>A short note.</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_feed_entries() {
        let items = parse_feed(FEED);
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.title, "Graph Neural Networks for Molecules");
        assert_eq!(
            first.summary,
            "We study message passing & pooling on molecular graphs."
        );
        assert_eq!(first.url, "http://arxiv.org/abs/2401.01234v1");
        assert_eq!(first.source_type, "arxiv");
        assert_eq!(first.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(first.published_date.as_deref(), Some("2024-01-03"));
    }

    #[test]
    fn test_missing_fields_default() {
        let items = parse_feed(FEED);
        let second = &items[1];
        assert!(second.authors.is_empty());
        assert_eq!(second.published_date, None);
        assert_eq!(second.title, "Over-smoothing in GNNs");
    }

    #[test]
    fn test_feed_without_entries() {
        assert!(parse_feed("<feed><title>empty</title></feed>").is_empty());
    }

    #[test]
    fn test_query_url() {
        let source = ArxivSource::new().unwrap();
        let url = source.query_url("graph neural networks", 5).unwrap();
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("export.arxiv.org"));
        assert!(query.contains(&("search_query".into(), "all:graph neural networks".into())));
        assert!(query.contains(&("max_results".into(), "5".into())));
        assert!(query.contains(&("sortBy".into(), "submittedDate".into())));
        assert!(query.contains(&("sortOrder".into(), "descending".into())));
    }
}

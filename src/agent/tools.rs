//! Statically declared research tool, dispatched in-process.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::executor::{InvokeError, ToolExecutor};
use super::registry::{ToolDescriptor, ToolRegistry};
use crate::research::ResearchSource;

/// Name of the single static tool.
pub const SEARCH_TOOL: &str = "search";

/// Default cap on results per search.
pub const DEFAULT_MAX_RESULTS_CAP: usize = 10;

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default = "default_max_results")]
    max_results: usize,
}

fn default_max_results() -> usize {
    5
}

/// Declaration of the `search` tool.
pub fn search_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        SEARCH_TOOL,
        "Search research papers on a topic. Returns titles, summaries, authors, \
         publication dates and links, newest first.",
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search terms"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of papers to return",
                    "default": 5
                }
            },
            "required": ["query"]
        }),
    )
}

/// Executor exposing one `search` tool backed by a [`ResearchSource`].
pub struct StaticToolExecutor {
    source: Arc<dyn ResearchSource>,
    registry: ToolRegistry,
    max_results_cap: usize,
}

impl StaticToolExecutor {
    pub fn new(source: Arc<dyn ResearchSource>) -> Self {
        Self {
            source,
            registry: ToolRegistry::from_descriptors(vec![search_tool()]),
            max_results_cap: DEFAULT_MAX_RESULTS_CAP,
        }
    }

    pub fn with_max_results_cap(mut self, cap: usize) -> Self {
        self.max_results_cap = cap.max(1);
        self
    }

    async fn execute_search(&self, args: SearchArgs) -> Result<String, InvokeError> {
        let capped = args.max_results.min(self.max_results_cap);
        let items = self
            .source
            .search(&args.query, capped)
            .await
            .map_err(|e| InvokeError::Recoverable(format!("Search failed: {e}")))?;

        let listing = serde_json::to_string_pretty(&items)
            .map_err(|e| InvokeError::Recoverable(format!("Failed to encode results: {e}")))?;

        if args.max_results > self.max_results_cap {
            Ok(format!(
                "Note: max_results was capped at {} (requested {}).\n{}",
                self.max_results_cap, args.max_results, listing
            ))
        } else {
            Ok(listing)
        }
    }
}

#[async_trait]
impl ToolExecutor for StaticToolExecutor {
    fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<String, InvokeError> {
        match name {
            SEARCH_TOOL => {
                let args: SearchArgs = serde_json::from_value(Value::Object(arguments.clone()))
                    .map_err(|e| {
                        InvokeError::Recoverable(format!("Invalid arguments for search: {e}"))
                    })?;
                self.execute_search(args).await
            }
            other => Err(InvokeError::Recoverable(format!("Unknown tool: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PodcraftError;
    use crate::research::ResearchItem;
    use std::sync::Mutex;

    /// Source returning `n` canned items and recording requested limits.
    struct CannedSource {
        limits: Mutex<Vec<usize>>,
        fail: bool,
    }

    impl CannedSource {
        fn new() -> Self {
            Self {
                limits: Mutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl ResearchSource for CannedSource {
        fn source_type(&self) -> &str {
            "canned"
        }

        async fn search(
            &self,
            query: &str,
            max_results: usize,
        ) -> crate::Result<Vec<ResearchItem>> {
            self.limits.lock().unwrap().push(max_results);
            if self.fail {
                return Err(PodcraftError::Research("arXiv returned 503".into()));
            }
            Ok((0..max_results.min(3))
                .map(|i| ResearchItem {
                    title: format!("{query} paper {i}"),
                    summary: "summary".into(),
                    url: format!("http://arxiv.org/abs/2401.0000{i}"),
                    source_type: "canned".into(),
                    authors: vec![],
                    published_date: None,
                })
                .collect())
        }
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_search_returns_items() {
        let source = Arc::new(CannedSource::new());
        let executor = StaticToolExecutor::new(source.clone());

        let text = executor
            .invoke("search", &args(json!({"query": "gnn"})))
            .await
            .unwrap();

        let items: Vec<Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["title"], "gnn paper 0");
        assert_eq!(*source.limits.lock().unwrap(), vec![5]);
    }

    #[tokio::test]
    async fn test_cap_is_reported() {
        let source = Arc::new(CannedSource::new());
        let executor = StaticToolExecutor::new(source.clone());

        let text = executor
            .invoke("search", &args(json!({"query": "gnn", "max_results": 25})))
            .await
            .unwrap();

        assert!(text.starts_with("Note: max_results was capped at 10 (requested 25)."));
        assert_eq!(*source.limits.lock().unwrap(), vec![10]);
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_recoverable() {
        let executor = StaticToolExecutor::new(Arc::new(CannedSource::new()));
        let err = executor
            .invoke("search", &args(json!({"max_results": 2})))
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Recoverable(ref m) if m.contains("query")));
    }

    #[tokio::test]
    async fn test_source_failure_is_recoverable() {
        let source = Arc::new(CannedSource {
            limits: Mutex::new(Vec::new()),
            fail: true,
        });
        let executor = StaticToolExecutor::new(source);
        let err = executor
            .invoke("search", &args(json!({"query": "gnn"})))
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Recoverable(ref m) if m.contains("503")));
    }

    #[test]
    fn test_registry_declares_search_only() {
        let executor = StaticToolExecutor::new(Arc::new(CannedSource::new()));
        assert_eq!(executor.registry().names(), vec!["search"]);
        assert_eq!(
            executor.registry().declarations()[0].input_schema["required"][0],
            "query"
        );
    }
}

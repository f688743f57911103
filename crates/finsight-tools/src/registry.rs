//! The set of tools available to one analysis run

use crate::{
    Calculator, Capability, FilingForm, Result, SecFilingSearch, StockMetrics, Tool, ToolError,
    WebSearch,
};
use finsight_utils::AppConfig;
use std::sync::Arc;
use tracing::{debug, info};

/// Ordered, name-addressable set of tools
///
/// Built once per run and shared read-only afterwards.
#[derive(Default, Clone)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    /// Create an empty tool set
    pub fn new() -> Self {
        Self::default()
    }

    /// Tools that need no credentials or network
    pub fn offline() -> Self {
        let mut set = Self::new();
        set.register(Arc::new(Calculator::new()));
        set.register(Arc::new(StockMetrics::new()));
        set
    }

    /// Build the tool set the configuration allows
    ///
    /// The calculator and metrics tools are always present. Web search needs
    /// a Serper key; both SEC filing tools need an sec-api.io key.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut set = Self::offline();

        if let Some(key) = &config.serper_api_key {
            set.register(Arc::new(WebSearch::new(key.clone(), config.request_timeout)?));
        } else {
            info!("SERPER_API_KEY not set; web search disabled");
        }

        if let Some(key) = &config.sec_api_key {
            for form in [FilingForm::Form10K, FilingForm::Form10Q] {
                set.register(Arc::new(SecFilingSearch::new(
                    form,
                    key.clone(),
                    config.sec_user_agent.clone(),
                    config.request_timeout,
                )?));
            }
        } else {
            info!("SEC_API_API_KEY not set; SEC filing search disabled");
        }

        debug!(tools = ?set.names(), "Tool set ready");
        Ok(set)
    }

    /// Add a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        if let Some(existing) = self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            *existing = tool;
        } else {
            self.tools.push(tool);
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    /// First tool providing the capability
    pub fn by_capability(&self, capability: Capability) -> Option<Arc<dyn Tool>> {
        self.tools
            .iter()
            .find(|t| t.capability() == capability)
            .cloned()
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.tools.iter().any(|t| t.capability() == capability)
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool by name
    pub async fn invoke(&self, name: &str, input: &str) -> Result<String> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        debug!(tool = name, "Invoking tool");
        tool.invoke(input).await
    }

    /// Run the offline tools on fixed inputs and check their answers
    pub async fn self_test(&self) -> SelfTestReport {
        let mut report = SelfTestReport::default();

        for (name, input, expected) in [
            (Calculator::NAME, "100 * 0.15 + (50 - 20) / 3", "= 25"),
            (
                StockMetrics::NAME,
                "price=100,volume=1000000,market_cap=5000000000,earnings_per_share=4",
                "P/E Ratio: 25.00",
            ),
        ] {
            let verdict = match self.invoke(name, input).await {
                Ok(output) if output.contains(expected) => Ok(output),
                Ok(output) => Err(format!("unexpected output: {output}")),
                Err(e) => Err(e.to_string()),
            };
            report.checks.push((name.to_string(), verdict));
        }

        report
    }
}

/// Result of [`ToolSet::self_test`]
#[derive(Debug, Default, Clone)]
pub struct SelfTestReport {
    /// Tool name and either its output or the failure
    pub checks: Vec<(String, std::result::Result<String, String>)>,
}

impl SelfTestReport {
    pub fn passed(&self) -> bool {
        !self.checks.is_empty() && self.checks.iter().all(|(_, verdict)| verdict.is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Shout;

    #[async_trait]
    impl Tool for Shout {
        fn capability(&self) -> Capability {
            Capability::WebSearch
        }

        fn name(&self) -> &str {
            "Search the internet"
        }

        fn description(&self) -> &str {
            "Uppercases the query"
        }

        async fn invoke(&self, input: &str) -> Result<String> {
            Ok(input.to_uppercase())
        }
    }

    fn config(serper: Option<&str>, sec: Option<&str>) -> AppConfig {
        let mut builder = AppConfig::builder().google_api_key("g-key");
        if let Some(key) = serper {
            builder = builder.serper_api_key(key);
        }
        if let Some(key) = sec {
            builder = builder.sec_api_key(key);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_offline_set() {
        let set = ToolSet::from_config(&config(None, None)).unwrap();
        assert_eq!(set.names(), vec!["Financial Calculator", "Stock Price Analysis"]);
        assert!(!set.has(Capability::WebSearch));
        assert!(!set.has(Capability::SecFilings));
    }

    #[test]
    fn test_full_set() {
        let set = ToolSet::from_config(&config(Some("s-key"), Some("sec-key"))).unwrap();
        assert_eq!(
            set.names(),
            vec![
                "Financial Calculator",
                "Stock Price Analysis",
                "Search the internet",
                "Search SEC 10-K Filing",
                "Search SEC 10-Q Filing",
            ]
        );
        assert_eq!(set.len(), 5);
        assert!(set.by_capability(Capability::SecFilings).is_some());
    }

    #[tokio::test]
    async fn test_invoke_by_name() {
        let mut set = ToolSet::offline();
        set.register(Arc::new(Shout));

        assert_eq!(set.invoke("Search the internet", "aapl").await.unwrap(), "AAPL");
        let err = set.invoke("Crystal Ball", "x").await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(_)));
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut set = ToolSet::new();
        set.register(Arc::new(Calculator::new()));
        set.register(Arc::new(Calculator::new()));
        assert_eq!(set.len(), 1);
    }

    #[tokio::test]
    async fn test_self_test_passes() {
        let report = ToolSet::offline().self_test().await;
        assert!(report.passed(), "{report:?}");
        assert_eq!(report.checks.len(), 2);
    }

    #[tokio::test]
    async fn test_self_test_fails_without_tools() {
        let report = ToolSet::new().self_test().await;
        assert!(!report.passed());
        assert!(report.checks.iter().all(|(_, v)| v.is_err()));
    }
}

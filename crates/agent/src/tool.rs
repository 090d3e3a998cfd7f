use async_trait::async_trait;
use defraud_core::{Result, SourceRef};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// What a tool hands back to the loop: observation text plus citable sources.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub content: String,
    pub sources: Vec<SourceRef>,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn invoke(&self, input: &str) -> Result<ToolOutput>;
}

/// A tool resolved from the registry. Compares, prints and serializes as its name.
#[derive(Clone)]
pub struct ToolHandle(Arc<dyn Tool>);

impl ToolHandle {
    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn tool(&self) -> &Arc<dyn Tool> {
        &self.0
    }
}

impl PartialEq for ToolHandle {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for ToolHandle {}

impl fmt::Debug for ToolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.name())
    }
}

impl Serialize for ToolHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Tools keyed by name. Reasoning output is only ever resolved through here.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    /// Look up `name` ignoring ASCII case.
    pub fn resolve(&self, name: &str) -> Option<ToolHandle> {
        self.tools
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, tool)| ToolHandle(tool.clone()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn tools(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

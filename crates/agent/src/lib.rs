//! Answer synthesis and the tool-routing agent loop.

pub mod agent_loop;
pub mod parser;
pub mod prompts;
pub mod response;
pub mod synthesizer;
pub mod tool;
pub mod tools;

pub use agent_loop::{AgentEvent, AgentLoop, AgentMetrics, AgentOutcome, AgentStep};
pub use parser::{parse_step, Action, ParseFailure, ParsedStep};
pub use response::QueryResponse;
pub use synthesizer::{AnswerSynthesizer, Synthesis};
pub use tool::{Tool, ToolHandle, ToolOutput, ToolRegistry};
pub use tools::{QaTool, WebSearchTool};

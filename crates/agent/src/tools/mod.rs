pub mod qa;
pub mod web_search;

pub use qa::QaTool;
pub use web_search::WebSearchTool;

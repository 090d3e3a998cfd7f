//! Turns free-form reasoning output into a strict [`Action`].
//!
//! Two reply shapes are understood: ReAct lines (`Thought:`, `Action:`,
//! `Action Input:`, `Final Answer:`) and a single JSON object
//! `{"thought", "action", "args"}` where `action = "final_answer"` ends the
//! run. Anything else becomes a [`ParseFailure`]; nothing unvalidated leaves
//! this module.

use crate::tool::{ToolHandle, ToolRegistry};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Invoke { tool: ToolHandle, input: String },
    Final { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStep {
    pub thought: String,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("the reply was empty")]
    Empty,
    #[error("no `Action:` or `Final Answer:` found")]
    MissingAction,
    #[error("'{0}' was given no input")]
    MissingInput(String),
    #[error("'{0}' is not one of the available tools")]
    UnknownTool(String),
    #[error("malformed reply: {0}")]
    Malformed(String),
}

pub fn parse_step(text: &str, tools: &ToolRegistry) -> Result<ParsedStep, ParseFailure> {
    let body = strip_fence(text.trim());
    if body.is_empty() {
        return Err(ParseFailure::Empty);
    }
    if body.starts_with('{') {
        parse_json(body, tools)
    } else {
        parse_react(body, tools)
    }
}

fn strip_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the info string (```json)
    let rest = rest.split_once('\n').map(|(_, r)| r).unwrap_or("");
    rest.trim_end().trim_end_matches("```").trim()
}

fn is_final_name(name: &str) -> bool {
    name.eq_ignore_ascii_case("final_answer") || name.eq_ignore_ascii_case("final answer")
}

fn invoke(
    tools: &ToolRegistry,
    name: &str,
    input: String,
    thought: String,
) -> Result<ParsedStep, ParseFailure> {
    let tool = tools
        .resolve(name)
        .ok_or_else(|| ParseFailure::UnknownTool(name.to_string()))?;
    if input.is_empty() {
        return Err(ParseFailure::MissingInput(tool.name().to_string()));
    }
    Ok(ParsedStep {
        thought,
        action: Action::Invoke { tool, input },
    })
}

fn finish(answer: String, thought: String) -> Result<ParsedStep, ParseFailure> {
    if answer.is_empty() {
        return Err(ParseFailure::MissingInput("Final Answer".to_string()));
    }
    Ok(ParsedStep {
        thought,
        action: Action::Final { text: answer },
    })
}

fn parse_json(body: &str, tools: &ToolRegistry) -> Result<ParsedStep, ParseFailure> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ParseFailure::Malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(ParseFailure::Malformed("expected a JSON object".to_string()));
    }

    let thought = value["thought"].as_str().unwrap_or_default().trim().to_string();
    let action = value["action"]
        .as_str()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or(ParseFailure::MissingAction)?;
    let args = &value["args"];

    if is_final_name(action) {
        let answer = match args {
            Value::String(s) => s.clone(),
            Value::Object(_) => match &args["answer"] {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => serde_json::to_string_pretty(other).unwrap_or_default(),
            },
            _ => String::new(),
        };
        return finish(answer.trim().to_string(), thought);
    }

    let input = match args {
        Value::String(s) => s.as_str(),
        Value::Object(_) => args["input"]
            .as_str()
            .or_else(|| args["query"].as_str())
            .unwrap_or_default(),
        _ => "",
    };
    invoke(tools, action, input.trim().to_string(), thought)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Thought = 0,
    Action = 1,
    Input = 2,
    Final = 3,
}

const MARKERS: [(&str, Section); 4] = [
    ("Thought:", Section::Thought),
    ("Action Input:", Section::Input),
    ("Action:", Section::Action),
    ("Final Answer:", Section::Final),
];

fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &line[prefix.len()..])
}

fn marker(line: &str) -> Option<(Section, &str)> {
    let line = line.trim_start();
    MARKERS
        .iter()
        .find_map(|(prefix, section)| strip_prefix_ci(line, prefix).map(|rest| (*section, rest)))
}

fn parse_react(body: &str, tools: &ToolRegistry) -> Result<ParsedStep, ParseFailure> {
    let mut parts: [Option<String>; 4] = Default::default();
    let mut current = Section::Thought;

    for line in body.lines() {
        // the model sometimes writes its own observation; ignore everything after it
        if strip_prefix_ci(line.trim_start(), "Observation:").is_some() {
            break;
        }
        if let Some((section, rest)) = marker(line) {
            let acted = parts[Section::Action as usize].is_some()
                || parts[Section::Final as usize].is_some();
            let repeated = match section {
                Section::Thought => acted,
                other => parts[other as usize].is_some(),
            };
            if repeated {
                break;
            }
            current = section;
            append(&mut parts[section as usize], rest);
        } else {
            append(&mut parts[current as usize], line);
        }
    }

    let [thought, action, input, answer] = parts.map(|p| p.map(|s| s.trim().to_string()));
    let thought = thought.unwrap_or_default();

    match (action, answer) {
        (Some(_), Some(_)) => Err(ParseFailure::Malformed(
            "reply contains both an action and a final answer".to_string(),
        )),
        (Some(action), None) => {
            let name = clean_name(&action);
            if name.is_empty() {
                return Err(ParseFailure::MissingAction);
            }
            let input = clean_input(input.as_deref().unwrap_or_default());
            if is_final_name(name) {
                return finish(input, thought);
            }
            invoke(tools, name, input, thought)
        }
        (None, Some(answer)) => finish(answer, thought),
        (None, None) => Err(ParseFailure::MissingAction),
    }
}

fn append(slot: &mut Option<String>, text: &str) {
    match slot {
        Some(buf) => {
            buf.push('\n');
            buf.push_str(text);
        }
        None => *slot = Some(text.to_string()),
    }
}

fn clean_name(raw: &str) -> &str {
    raw.lines()
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches(|c| matches!(c, '[' | ']' | '`' | '"' | '\'' | '*'))
        .trim()
}

fn clean_input(raw: &str) -> String {
    let s = raw.trim();
    let unquoted = s
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(s);
    unquoted.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{Tool, ToolOutput};
    use async_trait::async_trait;
    use defraud_core::Result;
    use std::sync::Arc;

    struct Named(&'static str);

    #[async_trait]
    impl Tool for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "test tool"
        }
        async fn invoke(&self, _input: &str) -> Result<ToolOutput> {
            Ok(ToolOutput::default())
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new()
            .with(Arc::new(Named("News RAG QA")))
            .with(Arc::new(Named("Web Search")))
    }

    #[test]
    fn test_react_action() {
        let reply = "Thought: check the corpus first\nAction: News RAG QA\nAction Input: \"Was the election certified?\"";
        let step = parse_step(reply, &registry()).unwrap();
        assert_eq!(step.thought, "check the corpus first");
        match step.action {
            Action::Invoke { tool, input } => {
                assert_eq!(tool.name(), "News RAG QA");
                assert_eq!(input, "Was the election certified?");
            }
            other => panic!("expected a tool call, got {other:?}"),
        }
    }

    #[test]
    fn test_react_final_answer_spans_lines() {
        let reply = "Thought: I now know the final answer\nFinal Answer: The claim is false.\nSeveral outlets debunked it.";
        let step = parse_step(reply, &registry()).unwrap();
        assert_eq!(
            step.action,
            Action::Final {
                text: "The claim is false.\nSeveral outlets debunked it.".to_string()
            }
        );
    }

    #[test]
    fn test_react_tool_name_is_case_insensitive_and_bracketed() {
        let reply = "Action: [web search]\nAction Input: moon landing";
        let step = parse_step(reply, &registry()).unwrap();
        assert!(matches!(step.action, Action::Invoke { ref tool, .. } if tool.name() == "Web Search"));
    }

    #[test]
    fn test_hallucinated_observation_is_ignored() {
        let reply = "Thought: search\nAction: Web Search\nAction Input: vaccine microchip\nObservation: made up\nThought: done\nFinal Answer: nope";
        let step = parse_step(reply, &registry()).unwrap();
        assert!(matches!(step.action, Action::Invoke { .. }));
    }

    #[test]
    fn test_unknown_tool() {
        let reply = "Thought: hmm\nAction: Lookup\nAction Input: anything";
        assert_eq!(
            parse_step(reply, &registry()).unwrap_err(),
            ParseFailure::UnknownTool("Lookup".to_string())
        );
    }

    #[test]
    fn test_failures() {
        let tools = registry();
        assert_eq!(parse_step("   ", &tools).unwrap_err(), ParseFailure::Empty);
        assert_eq!(
            parse_step("I think it is fake.", &tools).unwrap_err(),
            ParseFailure::MissingAction
        );
        assert_eq!(
            parse_step("Action: Web Search", &tools).unwrap_err(),
            ParseFailure::MissingInput("Web Search".to_string())
        );
        assert!(matches!(
            parse_step("Action: Web Search\nAction Input: x\nFinal Answer: y", &tools),
            Err(ParseFailure::Malformed(_))
        ));
        assert!(matches!(
            parse_step("{\"thought\": ", &tools),
            Err(ParseFailure::Malformed(_))
        ));
    }

    #[test]
    fn test_json_invoke_and_final() {
        let tools = registry();
        let reply = r#"{"thought": "look it up", "action": "News RAG QA", "args": {"input": "moon landing"}}"#;
        let step = parse_step(reply, &tools).unwrap();
        assert_eq!(step.thought, "look it up");
        assert!(matches!(step.action, Action::Invoke { ref input, .. } if input == "moon landing"));

        let reply = "```json\n{\"thought\": \"done\", \"action\": \"final_answer\", \"args\": {\"answer\": \"Fake.\"}}\n```";
        let step = parse_step(reply, &tools).unwrap();
        assert_eq!(step.action, Action::Final { text: "Fake.".to_string() });
    }

    #[test]
    fn test_json_missing_action() {
        let reply = r#"{"thought": "no idea", "args": {}}"#;
        assert_eq!(
            parse_step(reply, &registry()).unwrap_err(),
            ParseFailure::MissingAction
        );
    }
}

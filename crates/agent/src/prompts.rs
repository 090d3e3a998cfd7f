use crate::tool::ToolRegistry;

pub const SYNTHESIS_PROMPT: &str = r#"You check news claims against a labeled news corpus.
Each context passage is shown as [id] (label: fake|real|unknown) text.
Use only the passages. State whether the claim is supported, contradicted,
or not covered, and cite the passages you relied on by their [id].
Be brief."#;

pub const NO_EVIDENCE_VERDICT: &str =
    "No supporting evidence was found in the indexed corpus for this claim.";

const REACT_TEMPLATE: &str = r#"Answer the following question as best you can. You have access to the following tools:

{tools}

Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question

You may instead reply with one JSON object per step:
{"thought": "...", "action": "<tool name>", "args": {"input": "..."}}
or, to finish:
{"thought": "...", "action": "final_answer", "args": {"answer": "..."}}

Produce exactly one action per reply and stop; the system supplies the Observation."#;

pub fn system_prompt(tools: &ToolRegistry) -> String {
    let listing = tools
        .tools()
        .map(|t| format!("{}: {}", t.name(), t.description()))
        .collect::<Vec<_>>()
        .join("\n");
    REACT_TEMPLATE
        .replace("{tools}", &listing)
        .replace("{tool_names}", &tools.names().join(", "))
}

pub fn question_prompt(question: &str) -> String {
    format!("Question: {question}")
}

pub fn observation_prompt(observation: &str) -> String {
    format!("Observation: {observation}")
}

/// Sent after an unparseable reply, naming the problem and the valid tools.
pub fn corrective_prompt(problem: &str, tools: &ToolRegistry) -> String {
    format!(
        "Your last reply could not be used: {problem}.\n\
         Reply with either `Action:` naming one of [{}] followed by `Action Input:`, \
         or with `Final Answer:`.",
        tools.names().join(", ")
    )
}

pub const LAST_STEP_NOTICE: &str =
    "No tool calls remain. Reply now with `Final Answer:` based on what you have.";

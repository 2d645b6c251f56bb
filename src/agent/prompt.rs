//! Prompt assembly
//!
//! Renders loop state into the text sent to the model. Rendering is a pure
//! function of its inputs: the same context always yields the same prompt.

use serde_json::{Map, Value};

use crate::memory::MemorySnapshot;
use crate::tools::{Observation, ToolDescriptor};

use super::parser::ParseFailure;

const FORMAT_INSTRUCTIONS: &str = r#"Respond with a single JSON object and nothing else:
{
  "thought": "your reasoning for this step",
  "actions": [{"tool": "tool_name", "args": {"arg": "value"}}],
  "summary": "one sentence describing what this step did",
  "state": "anything you need to remember for the next step",
  "store": {"key": "value to keep"},
  "retrieve": ["key"],
  "delete": ["key"],
  "final_answer": "only when the task is complete"
}
"store", "retrieve", "delete" and "final_answer" are optional.
Every step must either request at least one action or give a final_answer.
Use the exact argument names listed for each tool."#;

const PLAN_INSTRUCTIONS: &str = r#"Before acting, write a short plan for the task.
Respond with a single JSON object: {"plan": "numbered steps you intend to follow"}"#;

/// Everything the assembler needs to render one step prompt
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    pub persistent_prompt: &'a str,
    pub task: &'a str,
    pub plan: Option<&'a str>,
    pub memory: &'a MemorySnapshot,
    /// Values fetched by the previous step's retrieve directive
    pub retrieved: &'a Map<String, Value>,
    /// Observations from the previous step
    pub observations: &'a [Observation],
    /// Set when the previous response was rejected
    pub parse_failure: Option<&'a ParseFailure>,
    pub catalogue: &'a [&'a ToolDescriptor],
    pub step: usize,
    pub max_steps: usize,
}

/// Stateless prompt renderer
pub struct PromptAssembler;

impl PromptAssembler {
    /// Render the prompt for one step
    pub fn render(ctx: &PromptContext<'_>) -> String {
        let mut sections = vec![Self::header(ctx.persistent_prompt, ctx.task)];

        if let Some(plan) = ctx.plan {
            sections.push(format!("## Plan\n{}", plan));
        }

        sections.push(Self::memory_section(ctx.memory));

        if !ctx.retrieved.is_empty() {
            let lines: Vec<String> = ctx
                .retrieved
                .iter()
                .map(|(key, value)| format!("- {}: {}", key, value))
                .collect();
            sections.push(format!("## Retrieved Values\n{}", lines.join("\n")));
        }

        if !ctx.observations.is_empty() {
            let lines: Vec<String> = ctx.observations.iter().map(Observation::render).collect();
            sections.push(format!("## Results Of Last Step\n{}", lines.join("\n")));
        }

        if let Some(failure) = ctx.parse_failure {
            sections.push(Self::corrective_note(failure));
        }

        sections.push(Self::tools_section(ctx.catalogue));
        sections.push(format!("## Response Format\n{}", FORMAT_INSTRUCTIONS));
        sections.push(format!("Step {} of {}", ctx.step, ctx.max_steps));

        sections.join("\n\n")
    }

    /// Render the one-time planning prompt
    pub fn render_planning(
        persistent_prompt: &str,
        task: &str,
        catalogue: &[&ToolDescriptor],
        parse_failure: Option<&ParseFailure>,
    ) -> String {
        let mut sections = vec![
            Self::header(persistent_prompt, task),
            Self::tools_section(catalogue),
        ];
        if let Some(failure) = parse_failure {
            sections.push(Self::corrective_note(failure));
        }
        sections.push(PLAN_INSTRUCTIONS.to_string());
        sections.join("\n\n")
    }

    fn header(persistent_prompt: &str, task: &str) -> String {
        format!("{}\n\n## Task\n{}", persistent_prompt.trim_end(), task.trim())
    }

    fn memory_section(memory: &MemorySnapshot) -> String {
        let mut out = String::from("## Memory\n");

        if memory.is_truncated() {
            out.push_str(&format!(
                "(earlier history truncated, {} steps omitted)\n",
                memory.evicted
            ));
        }

        if memory.summaries.is_empty() {
            out.push_str("No steps taken yet.\n");
        } else {
            let first = memory.evicted + 1;
            for (offset, summary) in memory.summaries.iter().enumerate() {
                out.push_str(&format!("Step {}: {}\n", first + offset, summary));
            }
        }

        if !memory.state.is_empty() {
            out.push_str(&format!("State: {}\n", memory.state));
        }

        if !memory.known_keys.is_empty() {
            out.push_str(&format!(
                "Stored keys (use \"retrieve\" to read): {}\n",
                memory.known_keys.join(", ")
            ));
        }

        out.trim_end().to_string()
    }

    fn tools_section(catalogue: &[&ToolDescriptor]) -> String {
        if catalogue.is_empty() {
            return "## Tools\nNo tools are available.".to_string();
        }
        let rendered: Vec<String> = catalogue.iter().map(|d| d.render()).collect();
        format!("## Tools\n{}", rendered.join("\n\n"))
    }

    fn corrective_note(failure: &ParseFailure) -> String {
        format!(
            "## Correction\nYour previous response was rejected ({}). \
             Reply again with a single valid JSON object in the format below.",
            failure
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::parser::ParseFailureKind;
    use crate::tools::{ParameterSpec, ParamKind, ToolErrorKind};
    use serde_json::json;

    fn descriptor() -> ToolDescriptor {
        ToolDescriptor {
            name: "echo".into(),
            description: "Echo text back".into(),
            parameters: vec![ParameterSpec::required("text", ParamKind::String)],
        }
    }

    fn snapshot() -> MemorySnapshot {
        MemorySnapshot {
            summaries: vec![],
            evicted: 0,
            state: String::new(),
            known_keys: vec![],
        }
    }

    #[test]
    fn test_first_step_prompt() {
        let tool = descriptor();
        let catalogue = [&tool];
        let memory = snapshot();
        let retrieved = Map::new();
        let ctx = PromptContext {
            persistent_prompt: "You are a helpful agent.",
            task: "Say hi",
            plan: None,
            memory: &memory,
            retrieved: &retrieved,
            observations: &[],
            parse_failure: None,
            catalogue: &catalogue,
            step: 1,
            max_steps: 5,
        };

        let prompt = PromptAssembler::render(&ctx);
        assert!(prompt.starts_with("You are a helpful agent.\n\n## Task\nSay hi"));
        assert!(prompt.contains("No steps taken yet."));
        assert!(prompt.contains("Tool Name: echo"));
        assert!(prompt.ends_with("Step 1 of 5"));
        assert!(!prompt.contains("## Correction"));
        assert!(!prompt.contains("## Plan"));
    }

    #[test]
    fn test_prompt_includes_memory_results_and_correction() {
        let tool = descriptor();
        let catalogue = [&tool];
        let memory = MemorySnapshot {
            summaries: vec!["Looked up Tokyo.".into(), "Stored forecast.".into()],
            evicted: 3,
            state: "need umbrella advice".into(),
            known_keys: vec!["forecast".into()],
        };
        let mut retrieved = Map::new();
        retrieved.insert("forecast".into(), json!({"rain": true}));
        let observations = vec![
            Observation::success(0, "echo", json!("hi")),
            Observation::error(1, "nope", ToolErrorKind::UnknownTool, "not registered"),
        ];
        let failure = ParseFailure::new(ParseFailureKind::MalformedPayload, "no json");

        let ctx = PromptContext {
            persistent_prompt: "Agent",
            task: "Weather",
            plan: Some("1. check\n2. answer"),
            memory: &memory,
            retrieved: &retrieved,
            observations: &observations,
            parse_failure: Some(&failure),
            catalogue: &catalogue,
            step: 6,
            max_steps: 10,
        };

        let prompt = PromptAssembler::render(&ctx);
        assert!(prompt.contains("## Plan\n1. check\n2. answer"));
        assert!(prompt.contains("(earlier history truncated, 3 steps omitted)"));
        assert!(prompt.contains("Step 4: Looked up Tokyo."));
        assert!(prompt.contains("Step 5: Stored forecast."));
        assert!(prompt.contains("State: need umbrella advice"));
        assert!(prompt.contains("Stored keys (use \"retrieve\" to read): forecast"));
        assert!(prompt.contains(r#"- forecast: {"rain":true}"#));
        assert!(prompt.contains("[0] echo: hi"));
        assert!(prompt.contains("[1] nope: ERROR (unknown_tool)"));
        assert!(prompt.contains("rejected (MalformedPayload: no json)"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let tool = descriptor();
        let catalogue = [&tool];
        let memory = snapshot();
        let retrieved = Map::new();
        let ctx = PromptContext {
            persistent_prompt: "p",
            task: "t",
            plan: None,
            memory: &memory,
            retrieved: &retrieved,
            observations: &[],
            parse_failure: None,
            catalogue: &catalogue,
            step: 1,
            max_steps: 1,
        };
        assert_eq!(PromptAssembler::render(&ctx), PromptAssembler::render(&ctx));
    }

    #[test]
    fn test_planning_prompt() {
        let tool = descriptor();
        let prompt = PromptAssembler::render_planning("Agent", "Do it", &[&tool], None);
        assert!(prompt.contains("## Task\nDo it"));
        assert!(prompt.contains("Tool Name: echo"));
        assert!(prompt.contains(r#"{"plan":"#));
    }
}

use colored::*;

use crate::agent::{LoopOutcome, LoopResult};
use crate::tools::{Action, Observation};

/// Longest tool result printed before truncation
const MAX_RESULT_CHARS: usize = 500;

/// Console renders a run to the terminal with colored formatting
pub struct Console {
    thought_color: Color,
    tool_color: Color,
    result_color: Color,
}

impl Console {
    /// Create a new Console with default colors
    pub fn new() -> Self {
        Self {
            thought_color: Color::Magenta,
            tool_color: Color::Green,
            result_color: Color::Cyan,
        }
    }

    /// Create a new Console with custom colors
    pub fn with_colors(thought_color: Color, tool_color: Color, result_color: Color) -> Self {
        Self {
            thought_color,
            tool_color,
            result_color,
        }
    }

    /// Print a banner with the agent name
    pub fn print_banner(&self, name: &str, description: Option<&str>, logo: Option<&str>) {
        if let Some(logo) = logo {
            for line in logo_lines(logo) {
                println!("{}", line.bright_cyan());
            }
        }
        println!("{}", "=".repeat(60).bright_blue());
        println!("{}", format!("  {}", name).bright_blue().bold());
        if let Some(description) = description {
            println!("  {}", description.bright_black());
        }
        println!("{}", "=".repeat(60).bright_blue());
        println!();
    }

    /// Print a step header such as `THINKING (step 2/10)`
    pub fn print_step_header(&self, label: &str, step: Option<(usize, usize)>) {
        let header = match step {
            Some((current, max)) => format!(" {} (step {}/{}) ", label, current, max),
            None => format!(" {} ", label),
        };
        println!();
        println!("{}", header.on_blue().white().bold());
    }

    /// Print the plan produced by the planning phase
    pub fn print_plan(&self, plan: &str) {
        println!("{}", "PLAN:".bright_green().bold());
        println!("{}", indent(plan, 2));
    }

    /// Print the model's thought for a step
    pub fn print_thought(&self, thought: &str) {
        println!("{}", "THINKING:".color(self.thought_color).bold());
        println!("{}", indent(thought, 2).color(self.thought_color));
    }

    /// Print a tool call
    pub fn print_action(&self, action: &Action) {
        println!(
            "{} {}",
            "CALLING:".color(self.tool_color).bold(),
            action.signature().color(self.tool_color)
        );
    }

    /// Print a tool result
    pub fn print_observation(&self, observation: &Observation) {
        if observation.is_error() {
            println!("{} {}", "Tool Error:".red().bold(), observation.render());
        } else {
            println!("{}", "RESULT:".color(self.result_color).bold());
            println!(
                "{}",
                indent(&truncate(&observation.render()), 2).color(self.result_color)
            );
        }
    }

    /// Print a rejected model response
    pub fn print_parse_failure(&self, message: &str) {
        println!("{} {}", "Unparseable response:".red().bold(), message);
    }

    /// Print the final outcome of a run
    pub fn print_outcome(&self, outcome: &LoopOutcome) {
        match &outcome.result {
            LoopResult::FinalAnswer { answer } => {
                self.print_step_header("FINAL ANSWER", None);
                println!("{}", answer.green());
            }
            LoopResult::Failed { failure } => {
                println!();
                println!("{} {}", "Run ended:".red().bold(), failure.to_string().red());
            }
        }
        println!(
            "{}",
            format!("{} step(s), run {}", outcome.steps(), outcome.run_id).bright_black()
        );
    }

    /// Print an error message
    pub fn print_error(&self, error: &str) {
        eprintln!("{} {}", "Error:".red().bold(), error);
    }

    /// Print a separator line
    pub fn print_separator(&self) {
        println!("{}", "-".repeat(60).bright_black());
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

fn indent(text: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    text.lines()
        .map(|line| format!("{}{}", pad, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Logo art without the blank lines YAML block scalars tend to leave around it
fn logo_lines(logo: &str) -> Vec<&str> {
    let lines: Vec<&str> = logo.lines().map(str::trim_end).collect();
    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);
    lines[start..end].to_vec()
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_RESULT_CHARS) {
        Some((cut, _)) => format!("{}...\n(output truncated)", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_multiline() {
        assert_eq!(indent("a\nb", 2), "  a\n  b");
    }

    #[test]
    fn test_logo_lines_drop_surrounding_blank_lines() {
        assert_eq!(logo_lines("\n /\\_/\\  \n( o.o )\n\n"), vec![" /\\_/\\", "( o.o )"]);
        assert!(logo_lines("\n  \n").is_empty());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let short = "é".repeat(10);
        assert_eq!(truncate(&short), short);

        let long = "é".repeat(MAX_RESULT_CHARS + 5);
        let cut = truncate(&long);
        assert!(cut.ends_with("(output truncated)"));
        assert!(cut.starts_with(&"é".repeat(MAX_RESULT_CHARS)));
    }
}

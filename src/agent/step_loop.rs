//! Step Loop
//!
//! Drives one agent run through the thought → action → observation cycle:
//! - Optional one-time planning request
//! - Prompt assembly from memory, last results and the tool catalogue
//! - Model call under a deadline with bounded retries
//! - Response parsing with bounded consecutive failures
//! - Memory directives, then sequential tool dispatch
//! - Step recording and the continue/stop decision
//!
//! A run always produces a `LoopOutcome`. Tool failures and rejected
//! responses become data in the history; only the conditions listed on
//! `LoopFailure` end a run early.

use std::sync::Arc;

use serde_json::Map;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cli::Console;
use crate::core::{AgentResult, LoopState};
use crate::helpers::Debugger;
use crate::llm::{LlmProvider, ModelConfig};
use crate::memory::MemoryStore;
use crate::tools::{Observation, ToolRegistry};

use super::config::AgentConfig;
use super::history::{LoopFailure, LoopOutcome, LoopResult, StepRecord};
use super::parser::{ParseFailure, ResponseParser};
use super::prompt::{PromptAssembler, PromptContext};

/// Why a single model attempt failed
enum AttemptError {
    Timeout,
    Transport(String),
}

/// What a run has produced so far
#[derive(Default)]
struct RunProgress {
    plan: Option<String>,
    history: Vec<StepRecord>,
    /// Planning rejections, never attached to a step
    unattached: Vec<ParseFailure>,
    /// Step rejections waiting for the next accepted response
    pending: Vec<ParseFailure>,
}

/// Agent core that owns memory and history for one run at a time
///
/// # Example
///
/// ```ignore
/// let config = AgentConfig::new("You are a weather assistant.", 10);
/// let mut step_loop = StepLoop::new(config, llm, Arc::new(tools))?;
///
/// let outcome = step_loop.run("What's the weather in Tokyo?").await;
/// println!("{:?}", outcome.result);
/// ```
pub struct StepLoop {
    config: AgentConfig,
    llm: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    memory: MemoryStore,
    state: LoopState,
    cancel: CancellationToken,
    console: Option<Console>,
}

impl StepLoop {
    /// Create a new step loop
    ///
    /// Fails with `AgentError::InvalidConfig` before any model call when the
    /// configuration cannot produce a meaningful run.
    pub fn new(
        config: AgentConfig,
        llm: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
    ) -> AgentResult<Self> {
        config.validate()?;

        let memory = match &config.memory_path {
            Some(path) => MemoryStore::open(path, config.summary_capacity)?,
            None => MemoryStore::with_capacity(config.summary_capacity),
        };
        let console = config.verbose.then(Console::new);

        tracing::info!(
            "[StepLoop] Created with {} tools, max_steps={}, provider={} ({})",
            tools.len(),
            config.max_steps,
            llm.provider_name(),
            llm.model()
        );

        Ok(Self {
            config,
            llm,
            tools,
            memory,
            state: LoopState::Idle,
            cancel: CancellationToken::new(),
            console,
        })
    }

    /// Use an external cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Replace the memory store (e.g. one pre-seeded with values)
    ///
    /// The store's current entries become the starting point of every run.
    /// Summaries, scratch state and entries stored during a run do not carry
    /// over to the next one unless the store is file-backed.
    pub fn with_memory(mut self, mut memory: MemoryStore) -> Self {
        memory.mark_baseline();
        self.memory = memory;
        self
    }

    /// Token that cancels the current run when triggered
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run the loop on a task until a final answer or a terminal failure
    ///
    /// Each run starts from fresh memory: only persisted (or seeded) key-value
    /// entries are visible to it.
    pub async fn run(&mut self, task: &str) -> LoopOutcome {
        let run_id = Uuid::new_v4();
        tracing::info!("[StepLoop] Run {} started", run_id);

        if let Err(e) = self.memory.begin_run() {
            tracing::warn!("[StepLoop] Failed to reload memory, keeping current entries: {}", e);
        }

        let debugger = match &self.config.debug_dir {
            Some(dir) => Debugger::new(dir, run_id).unwrap_or_else(|e| {
                tracing::warn!("[StepLoop] Failed to initialize debugger: {}", e);
                Debugger::disabled()
            }),
            None => Debugger::disabled(),
        };

        let tools = Arc::clone(&self.tools);
        let catalogue = tools.catalogue();
        let max_steps = self.config.max_steps;
        let max_failures = self.config.max_consecutive_parse_failures;

        let mut progress = RunProgress::default();
        let mut consecutive_failures = 0usize;

        if self.config.planning {
            self.state = LoopState::Planning;

            loop {
                if self.cancel.is_cancelled() {
                    return self.finish(run_id, progress, LoopFailure::Cancelled.into());
                }

                let prompt = PromptAssembler::render_planning(
                    &self.config.persistent_prompt,
                    task,
                    &catalogue,
                    progress.unattached.last(),
                );
                log_debug(debugger.log_prompt(0, &prompt));

                let raw = match self.call_model(&prompt).await {
                    Ok(raw) => raw,
                    Err(failure) => return self.finish(run_id, progress, failure.into()),
                };
                log_debug(debugger.log_response(0, &raw));

                match ResponseParser::parse_plan(&raw) {
                    Ok(text) => {
                        tracing::info!("[StepLoop] Plan accepted");
                        if let Some(console) = &self.console {
                            console.print_step_header("PLANNING", None);
                            console.print_plan(&text);
                        }
                        progress.plan = Some(text);
                        break;
                    }
                    Err(failure) => {
                        consecutive_failures += 1;
                        tracing::warn!(
                            "[StepLoop] Unparseable plan ({}/{}): {}",
                            consecutive_failures,
                            max_failures,
                            failure
                        );
                        progress.unattached.push(failure.clone());
                        if consecutive_failures >= max_failures {
                            let result = LoopFailure::ParseFailuresExceeded {
                                attempts: consecutive_failures,
                                last: failure,
                            };
                            return self.finish(run_id, progress, result.into());
                        }
                    }
                }
            }
            consecutive_failures = 0;
        }

        let mut last_observations: Vec<Observation> = Vec::new();
        let mut retrieved = Map::new();

        while progress.history.len() < max_steps {
            if self.cancel.is_cancelled() {
                tracing::info!(
                    "[StepLoop] Cancelled before step {}",
                    progress.history.len() + 1
                );
                return self.finish(run_id, progress, LoopFailure::Cancelled.into());
            }

            let index = progress.history.len() + 1;
            self.state = LoopState::Thinking { step: index };

            let snapshot = self.memory.snapshot_for_prompt();
            let prompt = PromptAssembler::render(&PromptContext {
                persistent_prompt: &self.config.persistent_prompt,
                task,
                plan: progress.plan.as_deref(),
                memory: &snapshot,
                retrieved: &retrieved,
                observations: &last_observations,
                parse_failure: progress.pending.last(),
                catalogue: &catalogue,
                step: index,
                max_steps,
            });
            log_debug(debugger.log_prompt(index, &prompt));

            let raw = match self.call_model(&prompt).await {
                Ok(raw) => raw,
                Err(failure) => return self.finish(run_id, progress, failure.into()),
            };
            log_debug(debugger.log_response(index, &raw));

            let parsed = match ResponseParser::parse(&raw) {
                Ok(parsed) => parsed,
                Err(failure) => {
                    consecutive_failures += 1;
                    tracing::warn!(
                        "[StepLoop] Step {} response rejected ({}/{}): {}",
                        index,
                        consecutive_failures,
                        max_failures,
                        failure
                    );
                    if let Some(console) = &self.console {
                        console.print_parse_failure(&failure.to_string());
                    }
                    progress.pending.push(failure.clone());
                    if consecutive_failures >= max_failures {
                        let result = LoopFailure::ParseFailuresExceeded {
                            attempts: consecutive_failures,
                            last: failure,
                        };
                        return self.finish(run_id, progress, result.into());
                    }
                    continue;
                }
            };
            consecutive_failures = 0;

            if let Some(console) = &self.console {
                console.print_step_header("THINKING", Some((index, max_steps)));
                console.print_thought(&parsed.thought);
            }

            self.state = LoopState::Acting { step: index };

            let directives = &parsed.directives;
            for (key, value) in &directives.store {
                self.memory.store(key.clone(), value.clone());
            }
            self.memory.delete(&directives.delete);
            let next_retrieved = self.memory.retrieve(&directives.retrieve);

            let console = self.console.as_ref();
            if let Some(console) = console {
                if !parsed.actions.is_empty() {
                    console.print_step_header("ACTION", Some((index, max_steps)));
                }
            }

            let observations = tools
                .dispatch_all(&parsed.actions, self.config.tool_timeout, |action, observation| {
                    log_debug(debugger.log_tool_call(index, action, observation.index));
                    log_debug(debugger.log_tool_result(index, observation));
                    if let Some(console) = console {
                        console.print_action(action);
                        console.print_observation(observation);
                    }
                })
                .await;

            self.state = LoopState::Observing { step: index };

            self.memory.record_summary(parsed.summary.clone());
            self.memory.set_state(parsed.state.clone());

            tracing::info!(
                "[StepLoop] Step {}/{} done: {} action(s), {} error(s)",
                index,
                max_steps,
                observations.len(),
                observations.iter().filter(|o| o.is_error()).count()
            );

            progress.history.push(StepRecord {
                index,
                thought: parsed.thought,
                summary: parsed.summary,
                state: parsed.state,
                actions: parsed.actions,
                observations: observations.clone(),
                parse_failures: std::mem::take(&mut progress.pending),
                retrieved: next_retrieved.keys().cloned().collect(),
            });

            if let Some(answer) = parsed.final_answer {
                return self.finish(run_id, progress, LoopResult::FinalAnswer { answer });
            }

            last_observations = observations;
            retrieved = next_retrieved;
        }

        tracing::warn!("[StepLoop] Max steps ({}) reached without a final answer", max_steps);
        tracing::debug!("[StepLoop] Memory dump: {}", self.memory.dump());

        self.finish(
            run_id,
            progress,
            LoopFailure::StepBudgetExhausted { max_steps }.into(),
        )
    }

    /// Call the model under its deadline, retrying timeouts and transport errors
    async fn call_model(&self, prompt: &str) -> Result<String, LoopFailure> {
        let model_config = ModelConfig::new(self.config.max_steps, self.config.verbose);
        let attempts = self.config.max_model_retries + 1;
        let mut last_error = AttemptError::Transport(String::new());

        for attempt in 1..=attempts {
            if self.cancel.is_cancelled() {
                return Err(LoopFailure::Cancelled);
            }

            let call = self.llm.complete(prompt, &model_config);
            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => return Err(LoopFailure::Cancelled),
                outcome = async {
                    match self.config.model_timeout {
                        Some(limit) => match timeout(limit, call).await {
                            Ok(result) => result.map_err(|e| AttemptError::Transport(format!("{:#}", e))),
                            Err(_) => Err(AttemptError::Timeout),
                        },
                        None => call.await.map_err(|e| AttemptError::Transport(format!("{:#}", e))),
                    }
                } => outcome,
            };

            match outcome {
                Ok(text) => return Ok(text),
                Err(AttemptError::Timeout) => {
                    tracing::warn!(
                        "[StepLoop] Model call timed out (attempt {}/{})",
                        attempt,
                        attempts
                    );
                    last_error = AttemptError::Timeout;
                }
                Err(AttemptError::Transport(message)) => {
                    tracing::warn!(
                        "[StepLoop] Model call failed (attempt {}/{}): {}",
                        attempt,
                        attempts,
                        message
                    );
                    last_error = AttemptError::Transport(message);
                }
            }
        }

        Err(match last_error {
            AttemptError::Timeout => LoopFailure::ModelTimeout { attempts },
            AttemptError::Transport(message) => LoopFailure::ModelUnavailable { attempts, message },
        })
    }

    fn finish(&mut self, run_id: Uuid, progress: RunProgress, result: LoopResult) -> LoopOutcome {
        self.state = LoopState::Terminal;

        let RunProgress {
            plan,
            history,
            mut unattached,
            pending,
        } = progress;
        unattached.extend(pending);

        match &result {
            LoopResult::FinalAnswer { .. } => {
                tracing::info!("[StepLoop] Run {} finished after {} step(s)", run_id, history.len())
            }
            LoopResult::Failed { failure } => {
                tracing::warn!(
                    "[StepLoop] Run {} ended after {} step(s) with {} unattached rejection(s): {}",
                    run_id,
                    history.len(),
                    unattached.len(),
                    failure
                )
            }
        }

        LoopOutcome {
            run_id,
            plan,
            result,
            history,
            rejected: unattached,
        }
    }
}

fn log_debug(result: anyhow::Result<()>) {
    if let Err(e) = result {
        tracing::warn!("[StepLoop] Failed to write debug trace: {}", e);
    }
}

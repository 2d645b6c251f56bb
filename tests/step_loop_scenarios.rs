//! End-to-end step loop scenarios driven by scripted model output

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use agentica::agent::{
    AgentConfig, AgentDefinition, LoopFailure, ParseFailureKind, StepLoop, StepRecord,
};
use agentica::llm::ScriptedProvider;
use agentica::tools::{EchoTool, FnTool, ParamKind, ParameterSpec, ToolErrorKind, ToolRegistry};

fn echo_registry() -> Arc<ToolRegistry> {
    let mut tools = ToolRegistry::new();
    tools.register(EchoTool::new()).unwrap();
    Arc::new(tools)
}

fn step(actions: Value, extra: Value) -> String {
    let mut body = json!({
        "thought": "working",
        "actions": actions,
        "summary": "Did something.",
        "state": ""
    });
    if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            body.insert(k.clone(), v.clone());
        }
    }
    body.to_string()
}

fn echo(text: &str) -> Value {
    json!([{"tool": "echo", "args": {"text": text}}])
}

fn final_answer(text: &str) -> String {
    step(json!([]), json!({"final_answer": text}))
}

fn run_loop(config: AgentConfig, provider: Arc<ScriptedProvider>) -> StepLoop {
    StepLoop::new(config, provider, echo_registry()).unwrap()
}

#[tokio::test]
async fn single_step_budget_with_echo() {
    let provider = Arc::new(ScriptedProvider::new([step(echo("hi"), json!({}))]));
    let mut step_loop = run_loop(AgentConfig::new("You echo things.", 1), provider);

    let outcome = step_loop.run("Say hi").await;

    assert_eq!(
        outcome.result.failure(),
        Some(&LoopFailure::StepBudgetExhausted { max_steps: 1 })
    );
    assert_eq!(outcome.history.len(), 1);
    assert_eq!(outcome.history[0].index, 1);
    assert_eq!(outcome.history[0].observations.len(), 1);
    assert_eq!(outcome.history[0].observations[0].value(), Some(&json!("hi")));
}

#[tokio::test]
async fn malformed_then_valid_output_is_one_step() {
    let provider = Arc::new(ScriptedProvider::new([
        "I think I should call echo now.".to_string(),
        step(echo("hi"), json!({})),
    ]));
    let mut step_loop = run_loop(AgentConfig::new("p", 1), provider.clone());

    let outcome = step_loop.run("Say hi").await;

    assert_eq!(outcome.history.len(), 1);
    let record = &outcome.history[0];
    assert_eq!(record.parse_failures.len(), 1);
    assert_eq!(record.parse_failures[0].kind, ParseFailureKind::MalformedPayload);

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("## Correction"));
    assert!(prompts[1].contains("Step 1 of 1"));
}

#[tokio::test]
async fn retrieve_returns_only_present_keys() {
    let provider = Arc::new(ScriptedProvider::new([
        step(echo("storing"), json!({"store": {"a": 1}})),
        step(echo("reading"), json!({"retrieve": ["a", "b"]})),
        final_answer("done"),
    ]));
    let mut step_loop = run_loop(AgentConfig::new("p", 5), provider.clone());

    let outcome = step_loop.run("Remember a").await;

    assert_eq!(outcome.result.final_answer(), Some("done"));
    assert_eq!(outcome.history[1].retrieved, vec!["a".to_string()]);

    let third_prompt = &provider.prompts()[2];
    assert!(third_prompt.contains("## Retrieved Values\n- a: 1"));
    assert!(!third_prompt.contains("- b:"));
    assert!(provider.prompts()[1].contains("Stored keys (use \"retrieve\" to read): a"));
}

#[tokio::test]
async fn delete_removes_value_before_retrieve() {
    let provider = Arc::new(ScriptedProvider::new([
        step(echo("x"), json!({"store": {"a": 1, "b": 2}})),
        step(echo("y"), json!({"delete": ["a"], "retrieve": ["a", "b"]})),
    ]));
    let mut step_loop = run_loop(AgentConfig::new("p", 2), provider);

    let outcome = step_loop.run("task").await;

    assert_eq!(outcome.history[1].retrieved, vec!["b".to_string()]);
    assert!(!step_loop.memory().contains_key("a"));
    assert!(step_loop.memory().contains_key("b"));
}

#[tokio::test]
async fn unknown_tool_never_invokes_a_capability() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let mut tools = ToolRegistry::new();
    tools
        .register(FnTool::from_fn(
            "get_weather",
            "Weather for a city",
            vec![ParameterSpec::required("location", ParamKind::String)],
            move |_args| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(json!("sunny"))
            },
        ))
        .unwrap();

    let provider = Arc::new(ScriptedProvider::new([
        step(
            json!([
                {"tool": "get_wether", "args": {"location": "Tokyo"}},
                {"tool": "get_weather", "args": {"city": "Tokyo"}},
                {"tool": "get_weather", "args": {"location": "Tokyo"}}
            ]),
            json!({}),
        ),
        final_answer("sunny"),
    ]));
    let mut step_loop =
        StepLoop::new(AgentConfig::new("p", 3), provider, Arc::new(tools)).unwrap();

    let outcome = step_loop.run("Weather in Tokyo?").await;

    let observations = &outcome.history[0].observations;
    assert_eq!(observations.len(), 3);
    assert_eq!(observations[0].error_kind(), Some(ToolErrorKind::UnknownTool));
    assert_eq!(
        observations[1].error_kind(),
        Some(ToolErrorKind::InvalidArguments)
    );
    assert_eq!(observations[2].value(), Some(&json!("sunny")));
    assert_eq!(
        observations.iter().map(|o| o.index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.result.final_answer(), Some("sunny"));
}

#[tokio::test]
async fn empty_actions_without_answer_is_rejected() {
    let provider = Arc::new(ScriptedProvider::new([
        step(json!([]), json!({})),
        final_answer("ok"),
    ]));
    let mut step_loop = run_loop(AgentConfig::new("p", 2), provider);

    let outcome = step_loop.run("task").await;

    assert_eq!(outcome.history.len(), 1);
    assert_eq!(
        outcome.history[0].parse_failures[0].kind,
        ParseFailureKind::NoActionOrAnswer
    );
    assert_eq!(outcome.result.final_answer(), Some("ok"));
}

#[tokio::test]
async fn summaries_are_truncated_in_prompts() {
    let provider = Arc::new(ScriptedProvider::new([
        step(echo("1"), json!({"summary": "first"})),
        step(echo("2"), json!({"summary": "second"})),
        step(echo("3"), json!({"summary": "third"})),
    ]));
    let config = AgentConfig::new("p", 3).with_summary_capacity(1);
    let mut step_loop = run_loop(config, provider.clone());

    step_loop.run("task").await;

    let last_prompt = &provider.prompts()[2];
    assert!(last_prompt.contains("(earlier history truncated, 1 steps omitted)"));
    assert!(last_prompt.contains("Step 2: second"));
    assert!(!last_prompt.contains("first"));
}

#[tokio::test]
async fn identical_inputs_produce_identical_histories() {
    let script = vec![
        "garbage".to_string(),
        step(echo("a"), json!({"store": {"k": [1, 2]}})),
        step(echo("b"), json!({"retrieve": ["k"]})),
        final_answer("finished"),
    ];

    let mut histories: Vec<Vec<StepRecord>> = Vec::new();
    let mut prompts: Vec<Vec<String>> = Vec::new();
    for _ in 0..2 {
        let provider = Arc::new(ScriptedProvider::new(script.clone()));
        let mut step_loop = run_loop(AgentConfig::new("p", 5), provider.clone());
        histories.push(step_loop.run("task").await.history);
        prompts.push(provider.prompts());
    }

    assert_eq!(histories[0], histories[1]);
    assert_eq!(prompts[0], prompts[1]);
}

#[tokio::test]
async fn same_loop_runs_are_independent() {
    let script = vec![
        "garbage".to_string(),
        step(
            echo("a"),
            json!({"store": {"secret": 1}, "summary": "RUN SUMMARY", "state": "half way"}),
        ),
        step(echo("b"), json!({"retrieve": ["secret"]})),
        final_answer("finished"),
    ];
    let provider = Arc::new(ScriptedProvider::new(
        script.iter().chain(script.iter()).cloned(),
    ));
    let mut step_loop = run_loop(AgentConfig::new("p", 5), provider.clone());

    let first = step_loop.run("task").await;
    let second = step_loop.run("task").await;

    assert_eq!(first.result.final_answer(), Some("finished"));
    assert_eq!(first.history, second.history);
    assert_ne!(first.run_id, second.run_id);

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 2 * script.len());
    let (run_one, run_two) = prompts.split_at(script.len());
    assert_eq!(run_one, run_two);
    assert!(!run_two[0].contains("RUN SUMMARY"));
    assert!(!run_two[0].contains("secret"));
}

#[tokio::test]
async fn concurrent_runs_share_a_registry() {
    let tools = echo_registry();
    let make = |text: &str| {
        let provider = Arc::new(ScriptedProvider::new([
            step(echo(text), json!({})),
            final_answer(text),
        ]));
        StepLoop::new(AgentConfig::new("p", 3), provider, tools.clone()).unwrap()
    };
    let mut left = make("left");
    let mut right = make("right");

    let (a, b) = tokio::join!(left.run("one"), right.run("two"));

    assert_eq!(a.result.final_answer(), Some("left"));
    assert_eq!(b.result.final_answer(), Some("right"));
    assert_ne!(a.run_id, b.run_id);
}

#[tokio::test]
async fn persisted_memory_survives_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.json");

    let first = Arc::new(ScriptedProvider::new([step(
        echo("x"),
        json!({"store": {"city": "Tokyo"}, "final_answer": "stored"}),
    )]));
    let config = AgentConfig::new("p", 2).with_memory_path(&path);
    run_loop(config.clone(), first).run("remember").await;

    let second = Arc::new(ScriptedProvider::new([
        step(echo("y"), json!({"retrieve": ["city"]})),
        final_answer("Tokyo"),
    ]));
    let mut step_loop = run_loop(config, second.clone());
    let outcome = step_loop.run("recall").await;

    assert!(second.prompts()[0].contains("Stored keys (use \"retrieve\" to read): city"));
    assert_eq!(outcome.history[0].retrieved, vec!["city".to_string()]);
    assert!(second.prompts()[1].contains(r#"- city: "Tokyo""#));
}

#[tokio::test]
async fn definition_drives_a_run() {
    let definition = AgentDefinition::from_yaml_str(
        "name: echo_agent\npersistent prompt: You echo.\nmax steps: 2\ntools: [echo, clock]\n",
    )
    .unwrap();
    let tools = Arc::new(definition.builtin_registry().unwrap());
    let provider = Arc::new(ScriptedProvider::new([
        step(echo("hello"), json!({})),
        final_answer("hello"),
    ]));

    let mut step_loop =
        StepLoop::new(definition.to_config().unwrap(), provider.clone(), tools).unwrap();
    let outcome = step_loop.run("Echo hello").await;

    assert_eq!(outcome.result.final_answer(), Some("hello"));
    let first_prompt = &provider.prompts()[0];
    assert!(first_prompt.starts_with("You echo."));
    let echo_at = first_prompt.find("Tool Name: echo").unwrap();
    let clock_at = first_prompt.find("Tool Name: clock").unwrap();
    assert!(echo_at < clock_at);
}

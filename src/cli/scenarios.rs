//! Demo scenarios and the mock components they are built from
//!
//! The chat model here is a stand-in: it answers from a fixed table of
//! keyword responses so the chains can be run without network access.

use crate::cli::commands::{BasicCommand, ChainCommand, ParallelCommand};
use crate::cli::output::{print_header, print_result, print_section, style, CHECK, CROSS, INFO};
use crate::compose::{Branch, Lambda, Parallel, Passthrough, RunnableExt, Sequence};
use crate::core::{Accumulate, Error, Result, RunContext, RunStream, Runnable};
use crate::execution::run_blocking;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

/// Doubles an integer
#[derive(Debug, Clone, Copy, Default)]
pub struct Doubler;

impl Runnable for Doubler {
    type Input = i64;
    type Output = i64;

    fn invoke(&self, input: i64, ctx: &RunContext) -> Result<i64> {
        ctx.scope("Doubler", |_| Ok(input * 2))
    }
}

/// Adds ten to an integer
#[derive(Debug, Clone, Copy, Default)]
pub struct AddTen;

impl Runnable for AddTen {
    type Input = i64;
    type Output = i64;

    fn invoke(&self, input: i64, ctx: &RunContext) -> Result<i64> {
        ctx.scope("AddTen", |_| Ok(input + 10))
    }
}

/// Fails its first `failures` calls, then adds one
#[derive(Debug, Default)]
pub struct Flaky {
    failures: usize,
    calls: AtomicUsize,
}

impl Flaky {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Runnable for Flaky {
    type Input = i64;
    type Output = i64;

    fn invoke(&self, input: i64, ctx: &RunContext) -> Result<i64> {
        ctx.scope("Flaky", |_| {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(Error::component(format!("transient failure on call {}", call)))
            } else {
                Ok(input + 1)
            }
        })
    }
}

/// Doubles non-negative integers and rejects negative ones
pub fn checked_double() -> Lambda<i64, i64> {
    Lambda::try_new(|x: i64| -> Result<i64> {
        if x < 0 {
            Err(Error::invalid_input(
                "checked_double",
                format!("negative input {}", x),
            ))
        } else {
            Ok(x * 2)
        }
    })
    .named("checked_double")
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

impl Accumulate for ChatMessage {
    fn accumulate(mut self, next: Self) -> Self {
        self.content.push_str(&next.content);
        self
    }
}

/// Chat model that answers from canned responses
///
/// `stream` yields the answer one word at a time.
#[derive(Debug, Clone, Default)]
pub struct MockChatModel {
    latency: Duration,
}

impl MockChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long per response, or per token when streaming
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The canned response for a prompt
    pub fn respond(prompt: &str) -> String {
        let lower = prompt.to_lowercase();
        if lower.contains("joke") {
            "Why did the programmer quit? Because they didn't get arrays!".to_string()
        } else if lower.contains("translate") {
            "Bonjour le monde!".to_string()
        } else if lower.contains("summarize") {
            "This is a concise summary of the content.".to_string()
        } else {
            format!("I received your message: {}", prompt)
        }
    }

    fn pause(latency: Duration) {
        if !latency.is_zero() {
            thread::sleep(latency);
        }
    }
}

impl Runnable for MockChatModel {
    type Input = String;
    type Output = ChatMessage;

    fn invoke(&self, prompt: String, ctx: &RunContext) -> Result<ChatMessage> {
        ctx.scope("MockChatModel", |_| {
            Self::pause(self.latency);
            Ok(ChatMessage::assistant(Self::respond(&prompt)))
        })
    }

    fn stream<'a>(&'a self, prompt: String, ctx: RunContext) -> RunStream<'a, ChatMessage> {
        let latency = self.latency;
        ctx.stream_scope("MockChatModel", move |_| {
            let tokens: Vec<String> = Self::respond(&prompt)
                .split_inclusive(' ')
                .map(str::to_string)
                .collect();
            Box::new(tokens.into_iter().map(move |token| {
                Self::pause(latency);
                Ok(ChatMessage::assistant(token))
            }))
        })
    }
}

/// Fill `{name}` placeholders from a JSON object of variables
pub fn render_template(template: &str, variables: &Value) -> Result<String> {
    let object = variables.as_object().ok_or_else(|| {
        Error::invalid_input(
            "PromptTemplate",
            format!("expected an object of variables, got {}", variables),
        )
    })?;

    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| Error::invalid_input("PromptTemplate", "unclosed '{' in template"))?;
        let key = &after[..end];
        match object.get(key) {
            Some(Value::String(text)) => rendered.push_str(text),
            Some(other) => rendered.push_str(&other.to_string()),
            None => {
                return Err(Error::invalid_input(
                    "PromptTemplate",
                    format!("missing variable '{}'", key),
                ))
            }
        }
        rest = &after[end + 1..];
    }
    rendered.push_str(rest);
    Ok(rendered)
}

pub fn prompt_template(template: impl Into<String>) -> Lambda<Value, String> {
    let template = template.into();
    Lambda::try_new(move |variables: Value| render_template(&template, &variables))
        .named("PromptTemplate")
}

/// Extracts the trimmed text of a chat message
pub fn output_parser() -> Lambda<ChatMessage, String> {
    Lambda::new(|message: ChatMessage| message.content.trim().to_string()).named("StrOutputParser")
}

/// `prompt | model | parser`
pub fn llm_chain(template: &str) -> Sequence<Value, String> {
    prompt_template(template)
        .then(MockChatModel::new())
        .then(output_parser())
}

pub fn joke_chain() -> Sequence<Value, String> {
    llm_chain("Tell me a joke about {topic}")
}

/// Joke and translation for the same topic, side by side
pub fn joke_and_translation() -> Result<Parallel<Value, String>> {
    Parallel::builder()
        .branch("joke", joke_chain())
        .branch(
            "translation",
            llm_chain("Translate 'Hello world, let us talk about {topic}' to French"),
        )
        .build()
}

/// prepare, then summary and statistics in parallel, then combine
pub fn analysis_pipeline() -> Result<Sequence<String, String>> {
    let prepare = Lambda::new(|text: String| {
        let word_count = text.split_whitespace().count();
        json!({ "text": text, "word_count": word_count })
    })
    .named("prepare");

    let analyze = Parallel::builder()
        .branch("summary", llm_chain("Please summarize: {text}"))
        .branch(
            "stats",
            Lambda::new(|prepared: Value| format!("{} words", prepared["word_count"])).named("stats"),
        )
        .named("analyze")
        .build()?;

    let combine = Lambda::new(|parts: BTreeMap<String, String>| {
        let field = |key: &str| parts.get(key).map(String::as_str).unwrap_or_default().to_string();
        format!("{} ({})", field("summary"), field("stats"))
    })
    .named("combine");

    Ok(prepare.then(analyze).then(combine))
}

/// Routes text by length: short and medium texts are described locally,
/// long texts go to the model for a summary
pub fn length_router() -> Result<Branch<String, String>> {
    let summarize = Lambda::new(|text: String| json!({ "text": text }))
        .named("wrap")
        .then(llm_chain("Please summarize: {text}"));

    Branch::builder()
        .when(
            |text: &String| text.len() < 10,
            Lambda::new(|text: String| format!("Short text: {}", text)).named("short"),
        )
        .when(
            |text: &String| text.len() < 50,
            Lambda::new(|text: String| {
                format!("Medium text with {} words", text.split_whitespace().count())
            })
            .named("medium"),
        )
        .otherwise(summarize)
}

const KNOWLEDGE_BASE: &[(&str, &str)] = &[
    (
        "rust",
        "Rust is a systems programming language focused on safety and speed.",
    ),
    (
        "runnable",
        "A runnable is a component with a uniform invoke, batch and stream interface.",
    ),
    (
        "parallel",
        "Parallel runs several components on the same input concurrently.",
    ),
];

/// Documents whose keyword appears in the question
pub fn retrieve(question: &str) -> Vec<&'static str> {
    let lower = question.to_lowercase();
    let docs: Vec<&'static str> = KNOWLEDGE_BASE
        .iter()
        .filter(|(keyword, _)| lower.contains(keyword))
        .map(|(_, doc)| *doc)
        .collect();
    if docs.is_empty() {
        vec!["No relevant documents found."]
    } else {
        docs
    }
}

/// Retrieval augmented answer: fetch context and keep the question, then ask
pub fn rag_chain() -> Result<Sequence<String, String>> {
    let gather = Parallel::builder()
        .branch(
            "context",
            Lambda::new(|question: String| retrieve(&question).join("\n")).named("retriever"),
        )
        .branch("question", Passthrough::new())
        .build()?;

    Ok(gather
        .then_fn(|inputs: BTreeMap<String, String>| json!(inputs))
        .then(llm_chain(
            "Answer from the context.\nContext: {context}\nQuestion: {question}",
        )))
}

/// doubled, tripled and squared
pub fn numeric_fan_out() -> Result<Parallel<i64, i64>> {
    Parallel::builder()
        .branch_fn("doubled", |x: i64| x * 2)
        .branch_fn("tripled", |x: i64| x * 3)
        .branch_fn("squared", |x: i64| x * x)
        .build()
}

/// Sum of `x + 1` and `x * 2`
pub fn fan_out_then_sum() -> Result<Sequence<i64, i64>> {
    let fan_out = Parallel::builder()
        .branch_fn("plus_one", |x: i64| x + 1)
        .branch_fn("times_two", |x: i64| x * 2)
        .build()?;
    Ok(fan_out.then_fn(|outputs: BTreeMap<String, i64>| outputs.values().sum::<i64>()))
}

/// A fan-out with another fan-out as one of its branches
pub fn nested_fan_out() -> Result<Parallel<i64, Value>> {
    let inner = numeric_fan_out()?.then_fn(|outputs: BTreeMap<String, i64>| json!(outputs));
    Parallel::builder()
        .branch("fan_out", inner)
        .branch_fn("negated", |x: i64| json!(-x))
        .build()
}

/// Keeps the original input next to values computed from it
pub fn passthrough_fan_out() -> Result<Parallel<Value, Value>> {
    Parallel::builder()
        .branch("original", Passthrough::new())
        .branch(
            "doubled",
            Lambda::new(|value: Value| json!(value.as_i64().unwrap_or_default() * 2)),
        )
        .branch(
            "info",
            Lambda::new(|value: Value| json!(format!("received {}", value))),
        )
        .build()
}

/// Statistics, even/odd split and count of a list of numbers
pub fn number_analysis() -> Result<Parallel<Vec<i64>, Value>> {
    Parallel::builder()
        .branch(
            "statistics",
            Lambda::new(|numbers: Vec<i64>| {
                let sum: i64 = numbers.iter().sum();
                let mean = if numbers.is_empty() {
                    0.0
                } else {
                    sum as f64 / numbers.len() as f64
                };
                json!({
                    "sum": sum,
                    "mean": mean,
                    "min": numbers.iter().min(),
                    "max": numbers.iter().max(),
                })
            })
            .named("statistics"),
        )
        .branch(
            "categories",
            Lambda::new(|numbers: Vec<i64>| {
                let (even, odd): (Vec<i64>, Vec<i64>) = numbers.iter().partition(|n| *n % 2 == 0);
                json!({ "even": even, "odd": odd })
            })
            .named("categories"),
        )
        .branch(
            "count",
            Lambda::new(|numbers: Vec<i64>| json!(numbers.len())).named("count"),
        )
        .build()
}

pub async fn run_basic(cmd: &BasicCommand, ctx: &RunContext) -> anyhow::Result<()> {
    info!("Running basic demo");
    print_header("Basic components");

    print_section(1, "Single invoke");
    print_result("Doubler(5)", Doubler.invoke(5, ctx)?);

    print_section(2, "Chaining");
    let chain = Doubler.then(AddTen);
    print_result("Doubler | AddTen (5)", chain.invoke(5, ctx)?);

    print_section(3, "Batch");
    let doubled = Doubler.batch(cmd.numbers.clone(), ctx)?;
    print_result(&format!("batch {:?}", cmd.numbers), format!("{:?}", doubled));

    print_section(4, "Async");
    print_result("ainvoke(7)", Arc::new(Doubler).ainvoke(7, ctx.clone()).await?);
    let chained = Arc::new(chain)
        .abatch(cmd.numbers.clone(), ctx.clone())
        .await?;
    print_result("abatch through the chain", format!("{:?}", chained));

    print_section(5, "Partial failures");
    let checked = checked_double();
    for (input, result) in [4, -1, 9]
        .into_iter()
        .zip(checked.batch_continue_on_error(vec![4, -1, 9], ctx))
    {
        match result {
            Ok(value) => println!("  {}{} -> {}", CHECK, input, value),
            Err(e) => println!("  {}{} -> {}", CROSS, input, style(e).red()),
        }
    }
    if let Err(e) = checked.batch(vec![4, -1, 9], ctx) {
        print_result("batch without continue_on_error", style(e).red());
    }

    print_section(6, "Retry and fallbacks");
    let retried = Flaky::new(2).with_retry(3);
    print_result("Flaky(2) with 3 attempts", retried.invoke(1, ctx)?);
    let recovered = Lambda::try_new(|_: i64| -> Result<i64> {
        Err(Error::component("primary unavailable"))
    })
    .named("primary")
    .with_fallbacks(vec![Lambda::new(|x: i64| x * 100).named("backup").boxed()]);
    print_result("primary or backup (3)", recovered.invoke(3, ctx)?);

    Ok(())
}

pub async fn run_parallel(cmd: &ParallelCommand, ctx: &RunContext) -> anyhow::Result<()> {
    info!("Running parallel demo");
    print_header("Parallel fan-out");

    print_section(1, "Basic fan-out");
    let fan_out = numeric_fan_out()?;
    print_result(
        &format!("fan_out({})", cmd.value),
        json!(fan_out.invoke(cmd.value, ctx)?),
    );

    print_section(2, "Fan-out inside a chain");
    print_result(
        &format!("(x + 1) + (x * 2) for x = {}", cmd.value),
        fan_out_then_sum()?.invoke(cmd.value, ctx)?,
    );

    print_section(3, "Nested fan-out");
    print_result("nested", json!(nested_fan_out()?.invoke(cmd.value, ctx)?));

    print_section(4, "Passthrough branch");
    print_result(
        "passthrough",
        json!(passthrough_fan_out()?.invoke(json!(cmd.value), ctx)?),
    );

    print_section(5, "Number analysis");
    let numbers: Vec<i64> = (1..=cmd.value.max(1)).collect();
    print_result(
        &format!("analysis of {:?}", numbers),
        json!(number_analysis()?.invoke(numbers, ctx)?),
    );

    print_section(6, "Async fan-out");
    let outputs = Arc::new(fan_out).ainvoke(cmd.value, ctx.clone()).await?;
    print_result("ainvoke", json!(outputs));

    Ok(())
}

pub async fn run_chain(cmd: &ChainCommand, ctx: &RunContext) -> anyhow::Result<()> {
    info!("Running chain demo");
    print_header("Prompt, model and parser chains");
    let topic = json!({ "topic": cmd.topic });

    print_section(1, "prompt | model | parser");
    print_result("joke", joke_chain().invoke(topic.clone(), ctx)?);

    print_section(2, "Parallel chains");
    let both = Arc::new(joke_and_translation()?)
        .ainvoke(topic.clone(), ctx.clone())
        .await?;
    for (name, answer) in &both {
        print_result(name, answer);
    }

    print_section(3, "Multi-stage analysis");
    let text = "Composable components let small pieces of logic combine into larger pipelines.";
    print_result("analysis", analysis_pipeline()?.invoke(text.to_string(), ctx)?);

    print_section(4, "Routing by length");
    let router = length_router()?;
    for text in [
        "Hi!",
        "This is a medium length sentence.",
        "This text is long enough that the router hands it to the model for a summary.",
    ] {
        print_result(&format!("{:?}", text), router.invoke(text.to_string(), ctx)?);
    }

    print_section(5, "Retrieval augmented answer");
    println!("  {}{}", INFO, style(&cmd.question).dim());
    print_result("answer", rag_chain()?.invoke(cmd.question.clone(), ctx)?);

    if cmd.stream {
        print_section(6, "Streaming tokens");
        let chain = prompt_template("Tell me a joke about {topic}")
            .then(MockChatModel::new().with_latency(Duration::from_millis(40)));
        let stream_ctx = ctx.clone();
        let full = run_blocking(move || {
            let mut full = ChatMessage::assistant("");
            print!("  ");
            for chunk in chain.stream(topic, stream_ctx) {
                let chunk = chunk?;
                print!("{}", chunk.content);
                let _ = std::io::stdout().flush();
                full = full.accumulate(chunk);
            }
            println!();
            Ok(full)
        })
        .await?;
        print_result("tokens joined", full.content);
    }

    Ok(())
}

pub async fn run_all(ctx: &RunContext) -> anyhow::Result<()> {
    run_basic(&BasicCommand::new(vec![1, 2, 3, 4, 5]), ctx).await?;
    run_parallel(&ParallelCommand { value: 5 }, ctx).await?;
    run_chain(&ChainCommand::new("programming", "What is Rust?"), ctx).await
}

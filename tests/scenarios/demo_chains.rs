//! Test: the demo chains behind the CLI

use crate::helpers::*;
use runnable::cli::scenarios::{
    analysis_pipeline, fan_out_then_sum, joke_and_translation, joke_chain, nested_fan_out,
    number_analysis, passthrough_fan_out, rag_chain, Doubler, AddTen,
};
use runnable::{RunContext, Runnable, RunnableExt};
use serde_json::json;

#[test]
fn test_doubler_then_add_ten() {
    let chain = Doubler.then(AddTen);
    assert_eq!(chain.invoke(5, &RunContext::new()).unwrap(), 20);
    assert_eq!(
        Doubler.batch(vec![1, 2, 3, 4, 5], &RunContext::new()).unwrap(),
        vec![2, 4, 6, 8, 10]
    );
}

#[test]
fn test_joke_chain() {
    let joke = joke_chain()
        .invoke(json!({"topic": "cats"}), &RunContext::new())
        .unwrap();
    assert_eq!(joke, "Why did the programmer quit? Because they didn't get arrays!");
}

#[test]
fn test_joke_chain_traces_three_steps() {
    let (ctx, collector) = traced();
    joke_chain().invoke(json!({"topic": "cats"}), &ctx).unwrap();

    let root = collector.roots().remove(0);
    let names: Vec<String> = collector
        .children_of(root.run_id)
        .into_iter()
        .map(|span| span.name)
        .collect();
    assert_eq!(names, vec!["PromptTemplate", "MockChatModel", "StrOutputParser"]);
}

#[test]
fn test_missing_prompt_variable_fails() {
    assert!(joke_chain()
        .invoke(json!({"subject": "cats"}), &RunContext::new())
        .is_err());
}

#[test]
fn test_joke_and_translation() {
    let outputs = joke_and_translation()
        .unwrap()
        .invoke(json!({"topic": "rust"}), &RunContext::new())
        .unwrap();
    assert_eq!(outputs["translation"], "Bonjour le monde!");
    assert!(outputs["joke"].contains("arrays"));
}

#[test]
fn test_analysis_pipeline() {
    let report = analysis_pipeline()
        .unwrap()
        .invoke("one two three".to_string(), &RunContext::new())
        .unwrap();
    assert_eq!(report, "This is a concise summary of the content. (3 words)");
}

#[test]
fn test_rag_chain_includes_context() {
    let answer = rag_chain()
        .unwrap()
        .invoke("What is Rust?".to_string(), &RunContext::new())
        .unwrap();
    assert!(answer.starts_with("I received your message:"));
    assert!(answer.contains("systems programming language"));
    assert!(answer.contains("Question: What is Rust?"));
}

#[test]
fn test_numeric_demos() {
    let ctx = RunContext::new();
    assert_eq!(fan_out_then_sum().unwrap().invoke(5, &ctx).unwrap(), 16);

    let nested = nested_fan_out().unwrap().invoke(5, &ctx).unwrap();
    assert_eq!(nested["negated"], json!(-5));
    assert_eq!(nested["fan_out"]["squared"], json!(25));

    let kept = passthrough_fan_out().unwrap().invoke(json!(4), &ctx).unwrap();
    assert_eq!(kept["original"], json!(4));
    assert_eq!(kept["doubled"], json!(8));

    let analysis = number_analysis().unwrap().invoke(vec![1, 2, 3, 4], &ctx).unwrap();
    assert_eq!(analysis["count"], json!(4));
    assert_eq!(analysis["statistics"]["sum"], json!(10));
    assert_eq!(analysis["categories"]["even"], json!([2, 4]));
}

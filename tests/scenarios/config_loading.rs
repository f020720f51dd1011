//! Test: run configuration files and bound configuration

use crate::helpers::*;
use runnable::{RunConfig, RunContext, Runnable, RunnableExt};
use std::path::PathBuf;
use uuid::Uuid;

fn temp_file(extension: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("runnable-{}.{}", Uuid::new_v4(), extension));
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_yaml_file() {
    let path = temp_file(
        "yaml",
        r#"
tags: [demo, nightly]
metadata:
  owner: docs
max_concurrency: 2
recursion_limit: 10
run_name: translate
"#,
    );
    let config = RunConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.tags, vec!["demo", "nightly"]);
    assert_eq!(config.metadata["owner"], "docs");
    assert_eq!(config.max_concurrency, Some(2));
    assert_eq!(config.recursion_limit, Some(10));
    assert_eq!(config.run_name.as_deref(), Some("translate"));
}

#[test]
fn test_load_json_file() {
    let path = temp_file("json", r#"{"tags": ["json"], "max_concurrency": 4}"#);
    let config = RunConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.tags, vec!["json"]);
    assert_eq!(config.max_concurrency, Some(4));
    assert!(config.run_name.is_none());
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(RunConfig::from_file("/definitely/not/here.yaml").is_err());
}

#[test]
fn test_zero_concurrency_is_rejected() {
    assert!(RunConfig::from_yaml("max_concurrency: 0").is_err());
}

#[test]
fn test_invalid_file_is_rejected_on_load() {
    let path = temp_file("yaml", "max_concurrency: 0\nrun_name: nightly");
    let result = RunConfig::from_file(&path);
    std::fs::remove_file(&path).unwrap();
    assert!(result.is_err());

    let path = temp_file("json", r#"{"run_name": "  "}"#);
    let result = RunConfig::from_file(&path);
    std::fs::remove_file(&path).unwrap();
    assert!(result.is_err());
}

#[test]
fn test_config_becomes_context() {
    let config = RunConfig::from_yaml("tags: [a]\nrecursion_limit: 7").unwrap();
    let ctx = RunContext::from_config(&config);
    assert!(ctx.has_tag("a"));
    assert_eq!(ctx.recursion_limit(), 7);
}

#[test]
fn test_bound_config_applies_to_spans() {
    let (ctx, collector) = traced();
    let bound = times(2).with_tags(["bound"]).with_name("doubling");
    assert_eq!(bound.invoke(4, &ctx).unwrap(), 8);

    let root = collector.roots().remove(0);
    assert_eq!(root.name, "doubling");
    assert!(root.tags.contains(&"bound".to_string()));
}

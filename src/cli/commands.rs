//! CLI command definitions

use clap::Args;

/// Run the basic invoke/batch/async demo
#[derive(Debug, Args, Clone, Default)]
pub struct BasicCommand {
    /// Numbers to feed through the batch demo
    #[arg(long, value_delimiter = ',', default_values_t = vec![1, 2, 3, 4, 5])]
    pub numbers: Vec<i64>,
}

/// Run the parallel fan-out demo
#[derive(Debug, Args, Clone, Default)]
pub struct ParallelCommand {
    /// Input value for the numeric fan-out
    #[arg(long, default_value_t = 5)]
    pub value: i64,
}

/// Run the mock prompt/model/parser chain demo
#[derive(Debug, Args, Clone, Default)]
pub struct ChainCommand {
    /// Topic for the joke chain
    #[arg(long, default_value = "programming")]
    pub topic: String,

    /// Question for the retrieval demo
    #[arg(long, default_value = "What is Rust?")]
    pub question: String,

    /// Stream model tokens as they are produced
    #[arg(long)]
    pub stream: bool,
}

impl BasicCommand {
    pub fn new(numbers: Vec<i64>) -> Self {
        Self { numbers }
    }
}

impl ChainCommand {
    pub fn new(topic: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            question: question.into(),
            stream: false,
        }
    }
}

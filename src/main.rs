use anyhow::{Context, Result};
use runnable::cli::output::{format_trace, print_header, style, INFO, WARN};
use runnable::cli::scenarios::{run_all, run_basic, run_chain, run_parallel};
use runnable::cli::terminal_output::TerminalListener;
use runnable::cli::{Cli, Command};
use runnable::{LoggingListener, RunConfig, RunContext, TraceCollector};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Load run configuration
    let config = match &cli.config {
        Some(path) => {
            let config = RunConfig::from_file(path)
                .with_context(|| format!("Failed to load run config from {}", path))?;
            println!("{} Loaded run config: {}", INFO, style(path).bold());
            config
        }
        None => RunConfig::default(),
    };

    let collector = Arc::new(TraceCollector::new());
    let mut ctx = RunContext::from_config(&config);
    if cli.verbose {
        ctx = ctx.with_listener(Arc::new(LoggingListener::new()));
    }
    if cli.trace {
        ctx = ctx.with_listener(collector.clone());
    }
    if cli.live {
        ctx = ctx.with_listener(Arc::new(TerminalListener::new()));
    }

    // Execute command
    let outcome = match &cli.command {
        Command::Basic(cmd) => run_basic(cmd, &ctx).await,
        Command::Parallel(cmd) => run_parallel(cmd, &ctx).await,
        Command::Chain(cmd) => run_chain(cmd, &ctx).await,
        Command::All => run_all(&ctx).await,
    };

    if cli.trace {
        print_trace(&collector);
    }

    outcome
}

fn print_trace(collector: &TraceCollector) {
    print_header("Trace");
    let spans = collector.spans();
    if spans.is_empty() {
        println!("{} No spans were recorded", WARN);
        return;
    }
    println!("{}", format_trace(&spans));
    let failed = spans.iter().filter(|span| span.is_error()).count();
    println!(
        "\n{} {} spans, {} failed",
        INFO,
        style(spans.len()).bold(),
        style(failed).bold()
    );
}

//! async-demo: a polling host driven by an `AsyncResolver`
//!
//! Runs render passes against one binding: once on start, then every time
//! the resolver reports a change. Each pass prints what the binding
//! resolved to.
//!
//! Usage:
//!   async-demo [--source interval|promise|none] [--initial V] [--error-value V]
//!              [--passes N] [--json] [-v]
//!
//! Fallback values (V): `nothing` (fail instead), `default`, `none`, or an
//! integer.

use clap::{Parser, ValueEnum};
use extended_async::{
    AsyncResolver, Failure, Fallback, Promise, ResolveError, ResolverConfig, SourceRef, Subject,
};
use serde::Serialize;
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(
    name = "async-demo",
    version,
    about = "Render loop over an asynchronous source"
)]
struct Cli {
    /// Which source the binding reads
    #[arg(long, value_enum, default_value = "interval")]
    source: SourceKind,
    /// Value shown before the source produced anything
    #[arg(long, default_value = "default", value_parser = parse_fallback)]
    initial: Fallback<i64>,
    /// Value shown after the source failed
    #[arg(long = "error-value", default_value = "nothing", value_parser = parse_fallback)]
    error_value: Fallback<i64>,
    /// Interval period in milliseconds
    #[arg(long, default_value_t = 1000)]
    period_ms: u64,
    /// Interval fails once it reaches this value
    #[arg(long, default_value_t = 10)]
    limit: i64,
    /// Promise settle delay in milliseconds
    #[arg(long, default_value_t = 5000)]
    delay_ms: u64,
    /// Reject the promise instead of resolving it
    #[arg(long)]
    reject: bool,
    /// Stop after this many render passes
    #[arg(long, default_value_t = 15)]
    passes: usize,
    /// Stop when no change arrives for this long (milliseconds)
    #[arg(long, default_value_t = 10_000)]
    idle_ms: u64,
    /// Print one JSON object per render pass
    #[arg(long)]
    json: bool,
    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceKind {
    Interval,
    Promise,
    None,
}

impl SourceKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Interval => "interval",
            Self::Promise => "promise",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Error)]
#[error("Value is too high!")]
struct ValueTooHigh;

fn parse_fallback(raw: &str) -> Result<Fallback<i64>, String> {
    match raw {
        "nothing" => Ok(Fallback::Sentinel),
        "default" => Ok(Fallback::UseDefault),
        "none" => Ok(Fallback::none()),
        other => other
            .parse::<i64>()
            .map(Fallback::value)
            .map_err(|_| format!("expected nothing, default, none or an integer, got '{}'", other)),
    }
}

/// One render pass as printed.
#[derive(Serialize)]
struct RenderPass {
    pass: usize,
    state: &'static str,
    value: Option<i64>,
    error: Option<String>,
}

impl RenderPass {
    fn print(&self, json: bool) {
        if json {
            match serde_json::to_string(self) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("Error: cannot encode render pass: {}", e),
            }
            return;
        }
        let shown = match (&self.error, self.value) {
            (Some(err), _) => format!("error: {}", err),
            (None, Some(v)) => v.to_string(),
            (None, None) => "-".to_string(),
        };
        println!("pass {:>3}  [{:<8}]  {}", self.pass, self.state, shown);
    }
}

fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Emits 0, 1, 2, ... every `period`, then fails once `limit` is reached.
fn spawn_interval(subject: Subject<i64>, period: Duration, limit: i64) {
    tokio::task::spawn_local(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately
        ticker.tick().await;
        for value in 0i64.. {
            ticker.tick().await;
            if value < limit {
                subject.next(value);
            } else {
                subject.error(Failure::error(ValueTooHigh));
                break;
            }
        }
    });
}

fn build_source(cli: &Cli) -> Option<SourceRef<i64>> {
    match cli.source {
        SourceKind::Interval => {
            let subject = Subject::new();
            spawn_interval(subject.clone(), Duration::from_millis(cli.period_ms), cli.limit);
            Some(Rc::new(subject))
        }
        SourceKind::Promise => {
            let delay = Duration::from_millis(cli.delay_ms);
            let reject = cli.reject;
            let promise = Promise::from_future(async move {
                tokio::time::sleep(delay).await;
                if reject {
                    Err(Failure::payload("Promise rejected!"))
                } else {
                    Ok(epoch_millis())
                }
            });
            Some(Rc::new(promise))
        }
        SourceKind::None => None,
    }
}

async fn run(cli: Cli) -> i32 {
    let (changed_tx, mut changed_rx) = mpsc::unbounded_channel::<()>();
    let config = ResolverConfig::new().with_label(format!("demo.{}", cli.source.as_str()));
    let mut resolver = AsyncResolver::with_config(
        move || {
            // Schedule the next pass; never read from inside the notifier
            let _ = changed_tx.send(());
        },
        config,
    );

    let source = build_source(&cli);
    let idle = Duration::from_millis(cli.idle_ms);
    let mut failed_passes = 0usize;

    for pass in 1..=cli.passes {
        let outcome: Result<Option<i64>, ResolveError> =
            resolver.read(source.as_ref(), cli.initial.clone(), cli.error_value.clone());
        let record = match &outcome {
            Ok(value) => RenderPass {
                pass,
                state: resolver.state().kind(),
                value: *value,
                error: None,
            },
            Err(e) => RenderPass {
                pass,
                state: resolver.state().kind(),
                value: None,
                error: Some(e.to_string()),
            },
        };
        record.print(cli.json);
        if outcome.is_err() {
            failed_passes += 1;
        }

        if pass == cli.passes {
            break;
        }
        match tokio::time::timeout(idle, changed_rx.recv()).await {
            Ok(Some(())) => {
                // Coalesce notifications that arrived together
                while changed_rx.try_recv().is_ok() {}
            }
            Ok(None) => break,
            Err(_) => {
                tracing::info!("no change for {:?}, stopping", idle);
                break;
            }
        }
    }

    resolver.dispose();
    if failed_passes > 0 {
        eprintln!("Error: {} render pass(es) failed", failed_passes);
        1
    } else {
        0
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    let local = tokio::task::LocalSet::new();
    let code = local.block_on(&rt, run(cli));
    std::process::exit(code);
}

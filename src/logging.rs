//! Structured logging for the orchestrator and reconciler: human-readable
//! console output plus a JSON file per process for post-hoc analysis of
//! concurrent runs.

use std::path::Path;
use std::sync::OnceLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();

/// Initialize logging once per process. `RUST_LOG` overrides the
/// environment-derived default level; when the log directory cannot be
/// created the file layer is skipped and console output still works.
pub fn init_structured_logging() {
    INIT.get_or_init(|| {
        let environment = detect_environment();
        let default_level = default_level_for(&environment);
        let filter = || {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level))
        };

        let console = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_filter(filter());

        let file = json_file_layer(&environment).map(|layer| layer.with_filter(filter()));

        if tracing_subscriber::registry()
            .with(console)
            .with(file)
            .try_init()
            .is_err()
        {
            // A host process already installed a subscriber; use it as-is
            return;
        }

        tracing::info!(
            environment = %environment,
            pid = std::process::id(),
            "🔧 LOGGING: Structured logging initialized"
        );
    });
}

/// JSON layer writing to `log/fleetops.<env>.<pid>.log`, or `None` when the
/// directory cannot be created (read-only deployments)
fn json_file_layer<S>(environment: &str) -> Option<impl Layer<S>>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let log_dir = Path::new("log");
    if std::fs::create_dir_all(log_dir).is_err() {
        return None;
    }

    let filename = format!("fleetops.{environment}.{}.log", std::process::id());
    let appender = tracing_appender::rolling::never(log_dir, filename);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    // The writer thread lives for the whole process
    std::mem::forget(guard);

    Some(
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .json(),
    )
}

fn detect_environment() -> String {
    std::env::var("FLEETOPS_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

fn default_level_for(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

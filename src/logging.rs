use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

const DEFAULT_DIRECTIVE: &str = "docchat=info";

/// Logs go to a daily file: the terminal belongs to the chat UI. Keep the
/// returned guard alive until exit or buffered lines are lost.
pub fn setup(log_dir: &Path) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "docchat.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_DIRECTIVE))?;

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::Layer::new()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_thread_names(true),
    );
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}

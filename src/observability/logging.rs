use std::fs;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "job_salary_scraper=info";
const LOG_FILE_NAME: &str = "job_salary_scraper.log";

/// Console layer on stderr, plus a daily-rotated JSON file layer when
/// `log_dir` is given.
fn subscriber(
    filter: EnvFilter,
    log_dir: Option<&str>,
) -> (impl Subscriber + Send + Sync + 'static, Option<WorkerGuard>) {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            (Some(fmt::layer().json().with_writer(non_blocking_writer)), Some(guard))
        }
        None => (None, None),
    };
    let console_layer = fmt::layer().with_writer(std::io::stderr);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer);
    (subscriber, guard)
}

/// Initializes logging with console output and a daily-rotated JSON file
/// under `log_dir`.
///
/// The returned guard flushes the file writer when dropped, so keep it alive
/// for the whole run. If `log_dir` cannot be created only the console is used.
pub fn init_logging(log_dir: &str) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let dir_ready = fs::create_dir_all(log_dir);

    let (subscriber, guard) = subscriber(filter, dir_ready.is_ok().then_some(log_dir));
    subscriber.init();

    if let Err(e) = dir_ready {
        tracing::warn!("File logging disabled, cannot create '{}': {}", log_dir, e);
    }
    guard
}

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable naming an extra log file.
pub const LOG_FILE_ENV: &str = "SHAREKIT_LOG";

/// Initialize tracing.
///
/// Events go to stderr, filtered by `RUST_LOG` (default `info`). When
/// `SHAREKIT_LOG` names a path, a plain-text copy is also written to
/// `{path}.{timestamp}.{pid}` so concurrent runs do not collide.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    let file_layer = log_file_path().and_then(|path| match std::fs::File::create(&path) {
        Ok(file) => Some(
            fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_level(true),
        ),
        Err(err) => {
            eprintln!("Warning: Failed to create log file {}: {}", path, err);
            None
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
}

fn log_file_path() -> Option<String> {
    let base = std::env::var(LOG_FILE_ENV).ok()?;
    Some(unique_log_path(&base))
}

fn unique_log_path(base: &str) -> String {
    let pid = std::process::id();
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{}.{}.{}", base, timestamp, pid)
}

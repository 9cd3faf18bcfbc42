// Copyright (c) 2026 rezky_nightky

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "katarain=info";

/// Installs a file-backed subscriber when `path` is given. The terminal
/// belongs to the rain, so without a path tracing events are dropped.
///
/// Keep the returned guard alive until exit so buffered lines get flushed.
pub fn init(path: Option<&Path>) -> io::Result<Option<WorkerGuard>> {
    let Some(path) = path else {
        return Ok(None);
    };

    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("not a file path: {}", path.display()),
        )
    })?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .try_init()
        .map_err(io::Error::other)?;

    Ok(Some(guard))
}

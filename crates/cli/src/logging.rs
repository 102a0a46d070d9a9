// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing setup driven by `--log-level`/`--log-file`, falling back to
//! `RUST_LOG` when set.

use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Holds the file-appender's worker guard alive for the process lifetime;
/// dropping it would stop flushing to the log file.
pub struct LoggingGuard(#[allow(dead_code)] Option<tracing_appender::non_blocking::WorkerGuard>);

pub fn init(log_level: &str, log_file: Option<&Path>) -> LoggingGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    match log_file {
        Some(path) => {
            let (dir, file_name) = split_log_path(path);
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
                .init();
            LoggingGuard(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
            LoggingGuard(None)
        }
    }
}

fn split_log_path(path: &Path) -> (std::path::PathBuf, std::ffi::OsString) {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let dir = dir.map(Path::to_path_buf).unwrap_or_else(|| std::path::PathBuf::from("."));
    let file_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "relayq.log".into());
    (dir, file_name)
}

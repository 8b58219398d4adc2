mod cloud;
mod config;
mod core;
mod error;
mod render;
mod schedule;
mod sentiment;
mod share;
mod spatial;
mod store;
mod types;
mod ui;
mod words;

use std::{fs::OpenOptions, path::Path, sync::Mutex};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let settings = config::Settings::parse();
    init_tracing(&settings.log)?;
    ui::run(settings)
}

/// Logs go to a file; the terminal is owned by the UI.
fn init_tracing(path: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
        .context("installing tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    mod init_tracing_fn {
        use super::*;

        #[test]
        fn second_install_reports_an_error() {
            let dir = tempfile::tempdir().expect("tempdir");
            init_tracing(&dir.path().join("first.log")).expect("first install");
            let err = init_tracing(&dir.path().join("second.log")).expect_err("already installed");
            assert!(err.to_string().contains("tracing subscriber"));
        }

        #[test]
        fn unopenable_log_file_is_an_error() {
            let dir = tempfile::tempdir().expect("tempdir");
            let err = init_tracing(&dir.path().join("missing").join("x.log")).expect_err("no dir");
            assert!(err.to_string().contains("opening log file"));
        }
    }
}

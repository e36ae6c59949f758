// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! lineage: per-file lifelines of a git repository, following renames

use clap::Parser;
use lineage_cli::config::Config;

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Logs go to stderr, the report to stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .init();

    let stdout = std::io::stdout();
    lineage_cli::run(&config, &mut stdout.lock())?;
    Ok(())
}

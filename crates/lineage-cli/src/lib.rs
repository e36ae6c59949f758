// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! lineage-cli: replay a repository's history through the default pipeline
//!
//! The default pipeline diffs each commit against its first parent, loads the
//! touched blobs, folds moves back into renames and tracks per-file
//! lifelines. The lifeline report is written once the walk completes.

pub mod config;

use std::io::Write;

use anyhow::Context;
use lineage_core::{ConfigurationOption, Pipeline, PipelineItem, Registry, RepositoryHandle};
use tracing::info;

use crate::config::Config;

/// Stages of the default pipeline, in any order
pub const DEFAULT_PIPELINE: &[&str] = &["TreeDiff", "BlobCache", "RenameAnalysis", "FileHistory"];

/// Registry with every stage this binary knows
#[must_use]
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    lineage_plumbing::register(&mut registry);
    lineage_leaves::register(&mut registry);
    registry
}

/// Instantiate and wire the default pipeline
///
/// # Errors
///
/// Returns an error if a stage is not registered or the wiring is invalid.
pub fn build_pipeline(registry: &Registry) -> anyhow::Result<Pipeline> {
    let mut items: Vec<Box<dyn PipelineItem>> = Vec::with_capacity(DEFAULT_PIPELINE.len());
    for name in DEFAULT_PIPELINE {
        let summoned = registry.summon(name);
        anyhow::ensure!(!summoned.is_empty(), "stage {name} is not registered");
        items.extend(summoned);
    }
    Ok(Pipeline::new(items)?)
}

/// Write every stage option, grouped by stage
///
/// # Errors
///
/// Returns the I/O error if the sink fails.
pub fn list_options(registry: &Registry, sink: &mut dyn Write) -> std::io::Result<()> {
    for (item, options) in registry.configuration_options() {
        if options.is_empty() {
            continue;
        }
        writeln!(sink, "{item}:")?;
        for option in options {
            writeln!(sink, "  {}", option.help_line())?;
        }
    }
    Ok(())
}

/// Run according to `config`, writing the report or option list to `sink`
///
/// Returns the number of commits replayed.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the repository cannot
/// be opened or walked, or a stage fails.
pub fn run(config: &Config, sink: &mut dyn Write) -> anyhow::Result<usize> {
    let registry = registry();
    if config.list_options {
        list_options(&registry, sink)?;
        return Ok(0);
    }
    config.validate()?;

    let path = config
        .repository_path()
        .context("cannot determine the repository path")?;
    let repository = RepositoryHandle::discover(&path)?;
    let mut options = config.load_options()?;
    let known: Vec<ConfigurationOption> = registry
        .configuration_options()
        .into_iter()
        .flat_map(|(_, options)| options)
        .collect();
    config.apply_overrides(&mut options, &known)?;

    let mut pipeline = build_pipeline(&registry)?;
    pipeline.configure(&options)?;
    pipeline.initialize(&repository)?;

    let commits = repository
        .walk_commits(&config.walk_options())
        .context("failed to walk commits")?;
    info!(commits = commits.len(), repository = %path.display(), "replaying history");
    let replayed = pipeline.run(&commits)?;
    pipeline.report(config.binary, sink)?;
    sink.flush()?;
    Ok(replayed)
}

// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Ordered execution of pipeline items over a sequence of commits
//!
//! The execution order is resolved once, when the pipeline is built, from the
//! items' `provides` / `requires` declarations. For every fact key the
//! providers form a chain: items that only provide the key come first, then
//! items that both require and provide it (refiners such as rename analysis)
//! in insertion order. Each refiner reads the previous link's output. A plain
//! consumer reads the newest link that does not itself depend on the
//! consumer, and runs before the link after that.

use std::collections::HashMap;
use std::io::Write;

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, info};

use crate::commit::Commit;
use crate::config::Options;
use crate::error::PipelineError;
use crate::facts::{FactKey, FactMap};
use crate::item::{Branching, PipelineItem};
use crate::repository::RepositoryHandle;

/// Items in dependency order
pub struct Pipeline {
    items: Vec<Box<dyn PipelineItem>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("items", &self.names())
            .finish()
    }
}

impl Pipeline {
    /// Validate the wiring of `items` and order them
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::UnsatisfiedDependency` if a required fact has
    /// no provider, or `PipelineError::DependencyCycle` if the items depend
    /// on each other circularly.
    pub fn new(items: Vec<Box<dyn PipelineItem>>) -> Result<Self, PipelineError> {
        let order = resolve_order(&items)?;
        let mut slots: Vec<Option<Box<dyn PipelineItem>>> = items.into_iter().map(Some).collect();
        let items: Vec<Box<dyn PipelineItem>> = order
            .into_iter()
            .filter_map(|index| slots[index].take())
            .collect();
        debug!(order = ?items.iter().map(|i| i.name()).collect::<Vec<_>>(), "resolved pipeline");
        Ok(Self { items })
    }

    /// Item names in execution order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.items.iter().map(|item| item.name()).collect()
    }

    /// Number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the pipeline has no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Access an item by name
    #[must_use]
    pub fn item(&self, name: &str) -> Option<&dyn PipelineItem> {
        self.items
            .iter()
            .find(|item| item.name() == name)
            .map(|item| item.as_ref())
    }

    /// Configure every item with the same options
    ///
    /// # Errors
    ///
    /// Propagates the first configuration error.
    pub fn configure(&mut self, options: &Options) -> Result<(), PipelineError> {
        for item in &mut self.items {
            item.configure(options)?;
        }
        Ok(())
    }

    /// Initialize every item for a fresh walk
    ///
    /// # Errors
    ///
    /// Propagates the first initialization error.
    pub fn initialize(&mut self, repository: &RepositoryHandle) -> Result<(), PipelineError> {
        for item in &mut self.items {
            item.initialize(repository)?;
        }
        Ok(())
    }

    /// Run every item on one commit and return the accumulated facts
    ///
    /// # Errors
    ///
    /// The first item error aborts the commit.
    pub fn consume(&mut self, commit: Commit) -> Result<FactMap, PipelineError> {
        let mut facts = FactMap::new().with(commit);
        for item in &mut self.items {
            let produced = item.consume(&facts)?;
            facts.extend(produced);
        }
        Ok(facts)
    }

    /// Replay a linear sequence of commits
    ///
    /// # Errors
    ///
    /// Stops at the first failing commit.
    pub fn run(&mut self, commits: &[Commit]) -> Result<usize, PipelineError> {
        for (index, commit) in commits.iter().enumerate() {
            debug!(sha = commit.short_sha(), subject = commit.subject(), index, "consuming commit");
            self.consume(commit.clone())?;
        }
        info!(commits = commits.len(), items = self.items.len(), "pipeline finished");
        Ok(commits.len())
    }

    /// Split into `n` pipelines for diverging branches
    #[must_use]
    pub fn fork(&self, n: usize) -> Vec<Pipeline> {
        let mut branches: Vec<Vec<Box<dyn PipelineItem>>> =
            (0..n).map(|_| Vec::with_capacity(self.items.len())).collect();
        for item in &self.items {
            for (branch, forked) in branches.iter_mut().zip(item.fork(n)) {
                branch.push(forked);
            }
        }
        branches
            .into_iter()
            .map(|items| Pipeline { items })
            .collect()
    }

    /// Merge pipelines forked from this one back into it
    ///
    /// Only stateful items are merged; stateless items are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::PipelineShapeMismatch` if a branch has a
    /// different item layout, or the first item merge error.
    pub fn merge(&mut self, branches: Vec<Pipeline>) -> Result<(), PipelineError> {
        let names = self.names();
        if branches.iter().any(|branch| branch.names() != names) {
            return Err(PipelineError::PipelineShapeMismatch);
        }
        let mut columns: Vec<Vec<Box<dyn PipelineItem>>> =
            (0..self.items.len()).map(|_| Vec::new()).collect();
        for branch in branches {
            for (column, item) in columns.iter_mut().zip(branch.items) {
                column.push(item);
            }
        }
        for (item, column) in self.items.iter_mut().zip(columns) {
            if item.branching() == Branching::Stateful {
                item.merge(column)?;
            }
        }
        Ok(())
    }

    /// Finalize and serialize every leaf, returning how many reported
    ///
    /// # Errors
    ///
    /// Propagates the first serialization error.
    pub fn report(&self, binary: bool, sink: &mut dyn Write) -> Result<usize, PipelineError> {
        let mut reported = 0;
        for item in &self.items {
            if let Some(reporter) = item.as_reporter() {
                if !binary {
                    writeln!(sink, "{}:", item.name())?;
                }
                reporter.report(binary, sink)?;
                reported += 1;
            }
        }
        Ok(reported)
    }
}

fn resolve_order(items: &[Box<dyn PipelineItem>]) -> Result<Vec<usize>, PipelineError> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let nodes: Vec<NodeIndex> = (0..items.len()).map(|index| graph.add_node(index)).collect();

    let mut chains: HashMap<FactKey, Vec<usize>> = HashMap::new();
    for key in FactKey::ALL {
        let (refiners, producers): (Vec<usize>, Vec<usize>) = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.provides().contains(&key))
            .map(|(index, _)| index)
            .partition(|&index| items[index].requires().contains(&key));
        let chain: Vec<usize> = producers.into_iter().chain(refiners).collect();
        for pair in chain.windows(2) {
            graph.add_edge(nodes[pair[0]], nodes[pair[1]], ());
        }
        chains.insert(key, chain);
    }

    let mut consumers = Vec::new();
    for (index, item) in items.iter().enumerate() {
        for &key in item.requires() {
            if key.is_scheduler_provided() {
                continue;
            }
            let chain = chains.get(&key).map(Vec::as_slice).unwrap_or_default();
            match chain.iter().position(|&link| link == index) {
                // a refiner reads the link before it
                Some(position) => {
                    if position == 0 {
                        return Err(PipelineError::UnsatisfiedDependency {
                            item: item.name().to_string(),
                            key,
                        });
                    }
                }
                None if chain.is_empty() => {
                    return Err(PipelineError::UnsatisfiedDependency {
                        item: item.name().to_string(),
                        key,
                    });
                }
                None => consumers.push((index, chain)),
            }
        }
    }

    // a consumer reads the newest link that does not depend on it
    for (index, chain) in consumers {
        let mut placed = false;
        for position in (0..chain.len()).rev() {
            let mut added = vec![graph.add_edge(nodes[chain[position]], nodes[index], ())];
            if let Some(&next) = chain.get(position + 1) {
                added.push(graph.add_edge(nodes[index], nodes[next], ()));
            }
            if !is_cyclic_directed(&graph) {
                placed = true;
                break;
            }
            for edge in added.into_iter().rev() {
                graph.remove_edge(edge);
            }
        }
        if !placed {
            return Err(PipelineError::DependencyCycle {
                item: items[index].name().to_string(),
            });
        }
    }

    toposort(&graph, None)
        .map(|sorted| sorted.into_iter().map(|node| graph[node]).collect())
        .map_err(|cycle| PipelineError::DependencyCycle {
            item: items[graph[cycle.node_id()]].name().to_string(),
        })
}

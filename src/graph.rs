// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Walks dependencies through the sync databases and answers which packages are affected
//! by a change to one of them.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use tracing::debug;

use crate::alpm::Library;
use crate::package::{Dependency, Package};
use crate::query::{Query, QueryResult};

/// Directed edges between package names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Graph {
    links: BTreeMap<String, BTreeSet<String>>,
}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node without edges. Existing edges are kept.
    pub fn add_node(&mut self, name: &str) {
        self.links.entry(name.to_string()).or_default();
    }

    /// Add an edge. Self-edges are ignored.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        self.links
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
    }

    /// Targets of `from`, in name order.
    pub fn edges<'a>(&'a self, from: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.links
            .get(from)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Number of nodes with an entry of their own.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// The same graph with every edge reversed.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let mut inverse = Self::new();
        for (from, targets) in &self.links {
            for to in targets {
                inverse.add_edge(to, from);
            }
        }
        inverse
    }

    /// Group everything reachable from `origin` by its longest distance from `origin`.
    ///
    /// Generation 0 is `[origin]`. A node only appears once, in the generation after the
    /// last of its predecessors. Edges closing a cycle are ignored.
    #[must_use]
    pub fn generations(&self, origin: &str) -> Vec<Vec<String>> {
        #[derive(PartialEq)]
        enum Visit {
            Active,
            Done,
        }

        let mut visits: HashMap<&str, Visit> = HashMap::from([(origin, Visit::Active)]);
        let mut kept: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut finished: Vec<&str> = Vec::new();
        let mut stack: Vec<(&str, Vec<&str>, usize)> =
            vec![(origin, self.edges(origin).collect(), 0)];

        while let Some((node, children, next)) = stack.last_mut() {
            let node = *node;
            let child = children.get(*next).copied();
            *next += 1;
            match child {
                // Back into the current path.
                Some(child) if visits.get(child) == Some(&Visit::Active) => {
                    debug!(from = node, to = child, "ignoring cyclic edge");
                }
                Some(child) => {
                    kept.entry(node).or_default().push(child);
                    if !visits.contains_key(child) {
                        visits.insert(child, Visit::Active);
                        stack.push((child, self.edges(child).collect(), 0));
                    }
                }
                None => {
                    visits.insert(node, Visit::Done);
                    finished.push(node);
                    stack.pop();
                }
            }
        }

        // Reverse finishing order is a topological order of the kept edges.
        let mut depths: HashMap<&str, usize> = HashMap::from([(origin, 0)]);
        for node in finished.iter().rev() {
            let depth = depths.get(node).copied().unwrap_or_default();
            for &child in kept.get(node).into_iter().flatten() {
                let entry = depths.entry(child).or_default();
                *entry = (*entry).max(depth + 1);
            }
        }

        let last = depths.values().copied().max().unwrap_or_default();
        let mut generations = vec![Vec::new(); last + 1];
        for (node, depth) in depths {
            generations[depth].push(node.to_string());
        }
        for generation in &mut generations {
            generation.sort();
        }
        generations
    }
}

/// The dependency closure of a set of packages.
///
/// Nodes are keyed by the constraint-free name they were requested under, so a provided
/// name such as `sh` is a node of its own that holds the providing package.
#[derive(Debug, Default, Serialize)]
pub struct Resolution {
    roots: Vec<String>,
    packages: BTreeMap<String, Package>,
    dependencies: Graph,
    unresolved: BTreeSet<String>,
}

impl Resolution {
    /// Resolve `roots` and, breadth first, everything they depend on.
    ///
    /// Names no sync database satisfies are recorded as unresolved and the walk continues.
    ///
    /// # Errors
    /// Returns the first lookup failure other than [`crate::QueryError::NotFound`].
    pub fn resolve<L, I, S>(query: &Query<'_, L>, roots: I) -> QueryResult<Self>
    where
        L: Library,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut resolution = Self {
            roots: roots.into_iter().map(|r| strip(r.as_ref())).collect(),
            ..Self::default()
        };
        let mut queue: VecDeque<String> = resolution.roots.iter().cloned().collect();

        while let Some(name) = queue.pop_front() {
            if resolution.packages.contains_key(&name) || resolution.unresolved.contains(&name) {
                continue;
            }
            match query.find_package(&name) {
                Ok(package) => {
                    resolution.dependencies.add_node(&name);
                    for spec in package.depends() {
                        let dependency = strip(spec);
                        resolution.dependencies.add_edge(&name, &dependency);
                        queue.push_back(dependency);
                    }
                    resolution.packages.insert(name, package);
                }
                Err(e) if e.is_not_found() => {
                    resolution.unresolved.insert(name);
                }
                Err(e) => return Err(e),
            }
            debug!(
                resolved = resolution.packages.len(),
                queued = queue.len(),
                "resolving dependencies"
            );
        }
        Ok(resolution)
    }

    /// Constraint-free names the walk started from.
    #[must_use]
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    #[must_use]
    pub fn packages(&self) -> &BTreeMap<String, Package> {
        &self.packages
    }

    /// Edges from each package to the names it depends on.
    #[must_use]
    pub fn dependencies(&self) -> &Graph {
        &self.dependencies
    }

    /// Edges from each name to the packages that depend on it.
    #[must_use]
    pub fn dependents(&self) -> Graph {
        self.dependencies.inverse()
    }

    #[must_use]
    pub fn unresolved(&self) -> &BTreeSet<String> {
        &self.unresolved
    }

    /// Roots that no sync database satisfies.
    #[must_use]
    pub fn missing_roots(&self) -> Vec<&str> {
        self.roots
            .iter()
            .filter(|root| self.unresolved.contains(*root))
            .map(String::as_str)
            .collect()
    }
}

// Unparseable entries are kept verbatim.
fn strip(spec: &str) -> String {
    match spec.parse::<Dependency>() {
        Ok(dependency) => dependency.name().to_string(),
        Err(e) => {
            debug!("{e}");
            spec.to_string()
        }
    }
}

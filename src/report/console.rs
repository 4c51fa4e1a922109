// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Formats and prints package summaries to the console.

use comfy_table::{Cell, Table};

use crate::graph::Resolution;
use crate::package::{Dependency, Package};

/// Summarize a package to the console.
///
/// Prints the package identity followed by a table of its direct dependencies.
pub fn summarize_package(requested: &str, package: &Package) {
    println!("{}\n", package_table(requested, package));
    if package.depends().is_empty() {
        println!("No dependencies\n");
    } else {
        println!("{}\n", dependency_table(package));
    }
}

/// Summarize a dependency closure: one row per resolved name, then the names nothing
/// satisfies.
pub fn summarize_resolution(resolution: &Resolution) {
    println!("Roots: {}", resolution.roots().join(", "));
    println!("Total packages: {}\n", resolution.packages().len());
    println!("{}\n", resolution_table(resolution));

    let unresolved = resolution.unresolved();
    if !unresolved.is_empty() {
        let names: Vec<&str> = unresolved.iter().map(String::as_str).collect();
        println!("Unresolved: {}", names.join(", "));
        println!("\nTotal: {} unresolved dependency name(s)", unresolved.len());
    }
}

/// Summarize which packages a change to `origin` affects, one row per generation.
pub fn summarize_generations(origin: &str, generations: &[Vec<String>]) {
    println!("Packages affected by {origin}:\n");
    println!("{}", generations_table(generations));
}

/// Create a table with the default preset styling.
fn default_table_preset() -> Table {
    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL_CONDENSED)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
    table
}

fn package_table(requested: &str, package: &Package) -> Table {
    let mut table = default_table_preset();
    table
        .set_header(vec![
            Cell::new("Package").add_attribute(comfy_table::Attribute::Bold),
            Cell::new(package.name()).add_attribute(comfy_table::Attribute::Bold),
        ])
        .add_row(vec![Cell::new("Version"), Cell::new(package.version())])
        .add_row(vec![
            Cell::new("Repository"),
            Cell::new(package.repository().unwrap_or("-")),
        ]);
    if requested != package.name() {
        table.add_row(vec![Cell::new("Satisfies"), Cell::new(requested)]);
    }
    table.add_row(vec![
        Cell::new("Dependencies").add_attribute(comfy_table::Attribute::Bold),
        Cell::new(package.depends().len()).add_attribute(comfy_table::Attribute::Bold),
    ]);
    table
}

/// Create a table with one row per direct dependency, in library order.
fn dependency_table(package: &Package) -> Table {
    let mut table = default_table_preset();
    table.set_header(vec![
        Cell::new("Dependency").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Version").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Description").add_attribute(comfy_table::Attribute::Bold),
    ]);

    for spec in package.depends() {
        // Entries the grammar does not cover are shown verbatim.
        let row = match spec.parse::<Dependency>() {
            Ok(dependency) => vec![
                Cell::new(dependency.name()),
                Cell::new(dependency.constraint().map_or_else(String::new, |c| {
                    format!("{}{}", c.comparison.as_str(), c.version)
                })),
                Cell::new(dependency.description().unwrap_or_default()),
            ],
            Err(_) => vec![Cell::new(spec), Cell::new(""), Cell::new("")],
        };
        table.add_row(row);
    }
    table
}

fn resolution_table(resolution: &Resolution) -> Table {
    let mut table = default_table_preset();
    table.set_header(vec![
        Cell::new("Name").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Package").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Version").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Repository").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Depends On").add_attribute(comfy_table::Attribute::Bold),
    ]);
    for (name, package) in resolution.packages() {
        let depends: Vec<&str> = resolution.dependencies().edges(name).collect();
        table.add_row(vec![
            Cell::new(name),
            Cell::new(package.name()),
            Cell::new(package.version()),
            Cell::new(package.repository().unwrap_or("-")),
            Cell::new(depends.join(", ")),
        ]);
    }
    table
}

fn generations_table(generations: &[Vec<String>]) -> Table {
    let mut table = default_table_preset();
    table.set_header(vec![
        Cell::new("Generation").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Packages").add_attribute(comfy_table::Attribute::Bold),
    ]);
    for (index, generation) in generations.iter().enumerate() {
        table.add_row(vec![Cell::new(index), Cell::new(generation.join(" "))]);
    }
    table
}

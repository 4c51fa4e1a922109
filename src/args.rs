// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "alai")]
#[command(version)]
#[command(about = "Looks up packages in the pacman sync databases and lists their dependencies")]
pub(crate) struct Args {
    /// Package names, provided names or version constraints to look up.
    #[arg(required = true)]
    pub packages: Vec<String>,

    #[arg(
        long,
        long_help = "Path to a pacman.conf to read the root directory, database path\n\
                and sync repositories from. Without it, core and extra are searched\n\
                below /var/lib/pacman/."
    )]
    pub config: Option<PathBuf>,

    /// Root directory of the system to inspect.
    #[arg(long)]
    pub root_dir: Option<PathBuf>,

    /// Database directory containing sync/<repo>.db.
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Print JSON instead of tables.
    #[arg(long)]
    pub json: bool,

    /// Resolve the packages and everything they depend on, transitively.
    #[arg(long)]
    pub graph: bool,

    #[arg(
        long,
        value_name = "PACKAGE",
        long_help = "Resolve the dependency graph of the given packages and list the\n\
                packages in it that depend on PACKAGE, grouped into generations\n\
                by their longest dependency distance from PACKAGE."
    )]
    pub affected_by: Option<String>,

    /// Log filter, e.g. `debug` or `alai=trace`.
    #[arg(long, env = "ALAI_LOG", default_value = "warn")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["alai", "bash"]).unwrap();
        assert_eq!(args.packages, ["bash"]);
        assert!(args.config.is_none());
        assert!(args.root_dir.is_none());
        assert!(!args.json);
        assert!(!args.graph);
        assert!(args.affected_by.is_none());
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "alai",
            "--db-path",
            "/tmp/db",
            "--root-dir",
            "/mnt",
            "--json",
            "git",
            "sh",
        ])
        .unwrap();
        assert_eq!(args.packages, ["git", "sh"]);
        assert_eq!(args.db_path, Some(PathBuf::from("/tmp/db")));
        assert_eq!(args.root_dir, Some(PathBuf::from("/mnt")));
        assert!(args.json);
    }

    #[test]
    fn test_graph_modes() {
        let args = Args::try_parse_from(["alai", "--affected-by", "glibc", "bash", "git"]).unwrap();
        assert_eq!(args.affected_by.as_deref(), Some("glibc"));
        assert_eq!(args.packages, ["bash", "git"]);

        let args = Args::try_parse_from(["alai", "--graph", "bash"]).unwrap();
        assert!(args.graph);
    }

    #[test]
    fn test_package_is_required() {
        assert!(Args::try_parse_from(["alai"]).is_err());
    }
}

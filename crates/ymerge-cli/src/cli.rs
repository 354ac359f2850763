use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use ymerge_types::{AnchorConflictMode, AoHMergeMode, ArrayMergeMode, HashMergeMode};

#[derive(Debug, Parser)]
#[command(
    name = "ymerge",
    about = "Merge YAML and JSON documents, folding every FILE into the first",
    version,
)]
pub struct Cli {
    /// Documents to merge, in order; `-` reads standard input
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<String>,

    /// Anchor conflict handling: rename, left, right, stop
    #[arg(short = 'a', long, value_name = "MODE")]
    pub anchors: Option<AnchorConflictMode>,

    /// Default merge of simple lists: left, right, unique, all
    #[arg(short = 'A', long, value_name = "MODE")]
    pub arrays: Option<ArrayMergeMode>,

    /// Default merge of mappings: left, right, deep
    #[arg(short = 'H', long, value_name = "MODE")]
    pub hashes: Option<HashMergeMode>,

    /// Default merge of arrays-of-hashes: left, right, unique, deep, all
    #[arg(short = 'O', long, value_name = "MODE")]
    pub aoh: Option<AoHMergeMode>,

    /// TOML file with defaults, per-path rules, and identity keys
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path in the first document that receives every other document
    #[arg(short, long, value_name = "PATH", default_value = "/")]
    pub mergeat: String,

    /// Write the result here instead of standard output
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Allow --output to replace an existing file
    #[arg(long, requires = "output")]
    pub overwrite: bool,

    #[arg(long, value_enum, default_value = "yaml")]
    pub format: OutputFormat,

    #[arg(short, long, conflicts_with_all = ["debug", "quiet"])]
    pub verbose: bool,

    #[arg(short, long, conflicts_with = "quiet")]
    pub debug: bool,

    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

impl Cli {
    /// Most verbose level to log at.
    pub fn log_level(&self) -> Level {
        if self.debug {
            Level::DEBUG
        } else if self.verbose {
            Level::INFO
        } else if self.quiet {
            Level::ERROR
        } else {
            Level::WARN
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_files() {
        let cli = Cli::try_parse_from(["ymerge", "a.yaml", "b.yaml", "-"]).unwrap();
        assert_eq!(cli.files, vec!["a.yaml", "b.yaml", "-"]);
        assert_eq!(cli.mergeat, "/");
        assert_eq!(cli.format, OutputFormat::Yaml);
        assert!(cli.anchors.is_none());
    }

    #[test]
    fn parse_requires_a_file() {
        assert!(Cli::try_parse_from(["ymerge"]).is_err());
    }

    #[test]
    fn parse_modes() {
        let cli = Cli::try_parse_from([
            "ymerge", "-a", "rename", "-A", "unique", "-H", "left", "-O", "deep", "x.yaml",
        ])
        .unwrap();
        assert_eq!(cli.anchors, Some(AnchorConflictMode::Rename));
        assert_eq!(cli.arrays, Some(ArrayMergeMode::Unique));
        assert_eq!(cli.hashes, Some(HashMergeMode::Left));
        assert_eq!(cli.aoh, Some(AoHMergeMode::Deep));
    }

    #[test]
    fn parse_mode_aliases_and_case() {
        let cli = Cli::try_parse_from(["ymerge", "--anchors", "KEEP_LEFT", "x.yaml"]).unwrap();
        assert_eq!(cli.anchors, Some(AnchorConflictMode::Left));
    }

    #[test]
    fn parse_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["ymerge", "--arrays", "deep", "x.yaml"]).is_err());
    }

    #[test]
    fn parse_output_options() {
        let cli = Cli::try_parse_from([
            "ymerge", "-o", "out.json", "--overwrite", "--format", "json", "-m", "/a", "x.yaml",
        ])
        .unwrap();
        assert_eq!(cli.output, Some(PathBuf::from("out.json")));
        assert!(cli.overwrite);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.mergeat, "/a");
    }

    #[test]
    fn parse_overwrite_needs_output() {
        assert!(Cli::try_parse_from(["ymerge", "--overwrite", "x.yaml"]).is_err());
    }

    #[test]
    fn parse_config() {
        let cli = Cli::try_parse_from(["ymerge", "-c", "rules.toml", "x.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("rules.toml")));
    }

    #[test]
    fn log_levels() {
        let level = |args: &[&str]| {
            let mut argv = vec!["ymerge"];
            argv.extend_from_slice(args);
            argv.push("x.yaml");
            Cli::try_parse_from(argv).unwrap().log_level()
        };
        assert_eq!(level(&[]), Level::WARN);
        assert_eq!(level(&["-v"]), Level::INFO);
        assert_eq!(level(&["-d"]), Level::DEBUG);
        assert_eq!(level(&["-q"]), Level::ERROR);
    }

    #[test]
    fn verbosity_flags_conflict() {
        assert!(Cli::try_parse_from(["ymerge", "-v", "-q", "x.yaml"]).is_err());
    }
}

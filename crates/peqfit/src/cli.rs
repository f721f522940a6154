//! peqfit - A library for fitting parametric equalizers to frequency responses
//! Command-line interface definitions shared with the binary
//!
//! Copyright (C) 2025 Pierre Aubert pierre(at)spinorama(dot)org
//!
//! This program is free software: you can redistribute it and/or modify
//! it under the terms of the GNU General Public License as published by
//! the Free Software Foundation, either version 3 of the License, or
//! (at your option) any later version.
//!
//! This program is distributed in the hope that it will be useful,
//! but WITHOUT ANY WARRANTY; without even the implied warranty of
//! MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//! GNU General Public License for more details.
//!
//! You should have received a copy of the GNU General Public License
//! along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::config::PipelineConfig;
use crate::constraints::BUILTIN_CONSTRAINT_SETS;
use crate::error::{PeqfitError, Result};
use crate::read::EdgeMode;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fmt;
use std::path::PathBuf;

/// Default sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Fit parametric EQ presets to measured frequency responses
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fit one preset from a JSON request read on stdin (or --input)
    Run(RunArgs),
    /// Fit every measured x target x constraint set combination of a catalog
    Golden(GoldenArgs),
}

/// Edge handling of the smoothing window
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EdgeArg {
    /// Shrink the window near the ends
    #[value(name = "taper")]
    Taper,
    /// Mirror samples about the ends
    #[value(name = "reflect")]
    Reflect,
}

impl fmt::Display for EdgeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeArg::Taper => write!(f, "taper"),
            EdgeArg::Reflect => write!(f, "reflect"),
        }
    }
}

impl From<EdgeArg> for EdgeMode {
    fn from(edge: EdgeArg) -> Self {
        match edge {
            EdgeArg::Taper => EdgeMode::Taper,
            EdgeArg::Reflect => EdgeMode::Reflect,
        }
    }
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Sample rate in Hz
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE, value_parser = clap::value_parser!(u32).range(1..))]
    pub sample_rate: u32,

    /// Pipeline configuration JSON (missing fields take their defaults)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Edge handling of the smoothing window (overrides the config file)
    #[arg(long, value_enum)]
    pub edge: Option<EdgeArg>,

    /// Seed of the optimizer restarts (overrides the config file)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Safety margin below full scale in dB (overrides the config file)
    #[arg(long)]
    pub headroom: Option<f64>,
}

impl PipelineArgs {
    /// Build the pipeline configuration: defaults, then the config file,
    /// then command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns `PeqfitError::FileOperation` or `PeqfitError::Json` when the
    /// config file cannot be read or parsed, and `PeqfitError::InvalidConfig`
    /// when the result is inconsistent.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|e| PeqfitError::FileOperation {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    })?;
                serde_json::from_str(&content)?
            }
            None => PipelineConfig::default(),
        };
        if let Some(edge) = self.edge {
            config.smoothing.edge = edge.into();
        }
        if let Some(seed) = self.seed {
            config.optimizer.seed = seed;
        }
        if let Some(headroom) = self.headroom {
            config.score.headroom_db = headroom;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Arguments of `peqfit run`
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Request JSON file; stdin when absent
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Write the preset to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print the preset
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Arguments of `peqfit golden`
#[derive(Args, Debug, Clone)]
pub struct GoldenArgs {
    /// Directory of measured curves (`<name>.json`)
    #[arg(long)]
    pub fr_dir: PathBuf,

    /// Directory of target curves (`<name>.json`)
    #[arg(long)]
    pub target_dir: PathBuf,

    /// Output directory for the records
    #[arg(long)]
    pub out_dir: PathBuf,

    /// Measured curve names (default: every file of --fr-dir)
    #[arg(long = "iem", value_delimiter = ',')]
    pub iems: Vec<String>,

    /// Target names (default: every file of --target-dir)
    #[arg(long = "target", value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Constraint sets: built-in names or JSON files
    #[arg(long = "constraint", value_delimiter = ',', default_values_t = BUILTIN_CONSTRAINT_SETS.map(String::from))]
    pub constraints: Vec<String>,

    /// Recompute records that already exist
    #[arg(long)]
    pub force: bool,

    /// Worker threads (default: all cores)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_defaults() {
        let cli = Cli::try_parse_from(["peqfit", "run"]).unwrap();
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.pipeline.sample_rate, DEFAULT_SAMPLE_RATE);
                assert!(args.input.is_none());
                let config = args.pipeline.pipeline_config().unwrap();
                assert_eq!(config, PipelineConfig::default());
            }
            Command::Golden(_) => panic!("expected run"),
        }
    }

    #[test]
    fn parses_golden_with_overrides() {
        let cli = Cli::try_parse_from([
            "peqfit",
            "golden",
            "--fr-dir",
            "fr",
            "--target-dir",
            "targets",
            "--out-dir",
            "out",
            "--constraint",
            "standard,restricted",
            "--force",
            "--jobs",
            "2",
            "--edge",
            "reflect",
            "--seed",
            "9",
        ])
        .unwrap();
        let Command::Golden(args) = cli.command else {
            panic!("expected golden");
        };
        assert_eq!(args.constraints, vec!["standard", "restricted"]);
        assert!(args.force);
        assert_eq!(args.jobs, Some(2));
        assert!(args.iems.is_empty());
        let config = args.pipeline.pipeline_config().unwrap();
        assert_eq!(config.smoothing.edge, EdgeMode::Reflect);
        assert_eq!(config.optimizer.seed, 9);
    }

    #[test]
    fn default_constraints_are_the_builtins() {
        let cli = Cli::try_parse_from([
            "peqfit", "golden", "--fr-dir", "a", "--target-dir", "b", "--out-dir", "c",
        ])
        .unwrap();
        let Command::Golden(args) = cli.command else {
            panic!("expected golden");
        };
        assert_eq!(args.constraints.len(), BUILTIN_CONSTRAINT_SETS.len());
    }

    #[test]
    fn rejects_zero_sample_rate_and_bad_headroom() {
        assert!(Cli::try_parse_from(["peqfit", "run", "--sample-rate", "0"]).is_err());
        let cli = Cli::try_parse_from(["peqfit", "run", "--headroom=-1"]).unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(args.pipeline.pipeline_config().is_err());
    }
}

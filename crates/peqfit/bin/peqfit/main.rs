//! peqfit - Fit parametric EQ presets to measured frequency responses
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

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{debug, info};
use peqfit::batch::{BatchConfig, Catalog, run_batch};
use peqfit::cli::{Cli, Command, GoldenArgs, RunArgs};
use peqfit::workflow::RunRequest;
use std::io::Read;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(&args),
        Command::Golden(args) => golden(&args),
    }
}

fn run(args: &RunArgs) -> Result<()> {
    let config = args
        .pipeline
        .pipeline_config()
        .context("Invalid pipeline configuration")?;

    let input = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file: {:?}", path))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read request from stdin")?;
            buffer
        }
    };
    let request: RunRequest =
        serde_json::from_str(&input).context("Failed to parse request JSON")?;
    debug!(
        "request: {} measured points, {} target points, {} filters",
        request.fr.len(),
        request.target.len(),
        request.config.len()
    );

    let preset = request
        .run(args.pipeline.sample_rate, &config)
        .context("Pipeline failed")?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&preset)?
    } else {
        serde_json::to_string(&preset)?
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write preset: {:?}", path))?;
            info!("Preset written to {:?}", path);
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn golden(args: &GoldenArgs) -> Result<()> {
    let pipeline = args
        .pipeline
        .pipeline_config()
        .context("Invalid pipeline configuration")?;

    let catalog = Catalog::load(
        &args.fr_dir,
        &args.target_dir,
        &args.iems,
        &args.targets,
        &args.constraints,
    )
    .context("Failed to load catalog")?;

    let config = BatchConfig {
        out_dir: args.out_dir.clone(),
        force: args.force,
        jobs: args.jobs,
        sample_rate: args.pipeline.sample_rate,
        pipeline,
    };
    let (_, summary) = run_batch(&catalog, &config).context("Batch run failed")?;

    if summary.has_failures() {
        bail!("{} of {} triples failed", summary.failed, summary.total);
    }
    Ok(())
}

//! Batch driver over catalogs of measured curves, targets and constraint sets
//!
//! Every (measured, target, constraint set) triple is an independent job.
//! Jobs run on a rayon pool; an existing output file is treated as a cache
//! unless `force` is set, and a failing job never affects the others.

use crate::config::PipelineConfig;
use crate::constraints::FilterBank;
use crate::curve::Curve;
use crate::error::{PeqfitError, Result};
use crate::read::{load_constraint_set, read_curve};
use crate::workflow::{PresetFilter, RunLabel, run_pipeline};
use log::{error, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A catalog entry: its name and the loaded value, or the load error message
#[derive(Debug, Clone)]
pub struct Entry<T> {
    /// Name used in labels and output file names
    pub name: String,
    /// Loaded value or why loading failed
    pub value: std::result::Result<T, String>,
}

impl<T> Entry<T> {
    /// Entry holding a loaded value
    pub fn ok(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            value: Ok(value),
        }
    }
}

/// Inputs of a batch run
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Measured curves
    pub measured: Vec<Entry<Curve>>,
    /// Target curves
    pub targets: Vec<Entry<Curve>>,
    /// Constraint sets
    pub constraints: Vec<Entry<FilterBank>>,
}

/// Sorted stems of the `.json` files in `dir`
pub fn list_json_stems(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| PeqfitError::FileOperation {
        path: dir.display().to_string(),
        message: e.to_string(),
    })?;
    let mut stems: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    stems.sort();
    Ok(stems)
}

fn load_curves(dir: &Path, names: &[String]) -> Result<Vec<Entry<Curve>>> {
    let names = if names.is_empty() {
        list_json_stems(dir)?
    } else {
        names.to_vec()
    };
    Ok(names
        .into_iter()
        .map(|name| {
            let value = read_curve(&dir.join(format!("{name}.json"))).map_err(|e| e.to_string());
            Entry { name, value }
        })
        .collect())
}

fn constraint_name(name_or_path: &str) -> String {
    let path = Path::new(name_or_path);
    if path.is_file() {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name_or_path.to_string())
    } else {
        name_or_path.to_string()
    }
}

impl Catalog {
    /// Load a catalog from disk.
    ///
    /// Measured curves are `<fr_dir>/<name>.json`, targets
    /// `<target_dir>/<name>.json`; an empty name list means every `.json`
    /// file of the directory. Constraint sets are built-in names or JSON
    /// files. Entries that fail to load are kept with their error so that
    /// only their jobs fail.
    ///
    /// # Errors
    ///
    /// Returns `PeqfitError::FileOperation` when a directory cannot be listed.
    pub fn load(
        fr_dir: &Path,
        target_dir: &Path,
        measured: &[String],
        targets: &[String],
        constraints: &[String],
    ) -> Result<Self> {
        let catalog = Self {
            measured: load_curves(fr_dir, measured)?,
            targets: load_curves(target_dir, targets)?,
            constraints: constraints
                .iter()
                .map(|c| Entry {
                    name: constraint_name(c),
                    value: load_constraint_set(c).map_err(|e| e.to_string()),
                })
                .collect(),
        };
        info!(
            "catalog: {} measured, {} targets, {} constraint sets",
            catalog.measured.len(),
            catalog.targets.len(),
            catalog.constraints.len()
        );
        Ok(catalog)
    }

    /// Every triple of the catalog, as indices into its lists
    pub fn jobs(&self) -> Vec<Job> {
        let mut jobs =
            Vec::with_capacity(self.measured.len() * self.targets.len() * self.constraints.len());
        for measured in 0..self.measured.len() {
            for target in 0..self.targets.len() {
                for constraint in 0..self.constraints.len() {
                    jobs.push(Job {
                        measured,
                        target,
                        constraint,
                    });
                }
            }
        }
        jobs
    }

    /// Label of a job
    pub fn label(&self, job: &Job) -> RunLabel {
        RunLabel::new(
            &self.measured[job.measured].name,
            &self.targets[job.target].name,
            &self.constraints[job.constraint].name,
        )
    }
}

/// One triple, as indices into a [`Catalog`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    /// Index of the measured curve
    pub measured: usize,
    /// Index of the target
    pub target: usize,
    /// Index of the constraint set
    pub constraint: usize,
}

/// Batch settings
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Directory receiving one JSON record per triple
    pub out_dir: PathBuf,
    /// Recompute triples whose output already exists
    pub force: bool,
    /// Worker threads; `None` uses every core
    pub jobs: Option<usize>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Stage settings
    pub pipeline: PipelineConfig,
}

impl BatchConfig {
    /// Settings with defaults for everything but the output directory
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            force: false,
            jobs: None,
            sample_rate: 44100,
            pipeline: PipelineConfig::default(),
        }
    }
}

/// Output record of one triple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldenRecord {
    /// Name of the measured curve
    pub iem: String,
    /// Name of the target
    pub target: String,
    /// Name of the constraint set
    pub constraint: String,
    /// Sample rate in Hz
    pub fs: u32,
    /// Pregain in dB
    pub pregain: f64,
    /// Fitted filters
    pub filters: Vec<PresetFilter>,
    /// Residual error in dB
    pub rmse: f64,
}

/// What happened to one triple
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The pipeline ran and its record was written
    Computed {
        /// Names of the triple
        label: RunLabel,
        /// Written file
        path: PathBuf,
        /// Residual error in dB
        rmse: f64,
    },
    /// The record already existed
    Skipped {
        /// Names of the triple
        label: RunLabel,
        /// Existing file
        path: PathBuf,
    },
    /// Loading, the pipeline or writing failed
    Failed {
        /// Names of the triple
        label: RunLabel,
        /// Error message
        message: String,
    },
}

/// Aggregated outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of triples
    pub total: usize,
    /// Triples computed in this run
    pub computed: usize,
    /// Triples whose output already existed
    pub skipped: usize,
    /// Triples that failed
    pub failed: usize,
}

impl BatchSummary {
    /// Count outcomes
    pub fn from_outcomes(outcomes: &[JobOutcome]) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome {
                JobOutcome::Computed { .. } => summary.computed += 1,
                JobOutcome::Skipped { .. } => summary.skipped += 1,
                JobOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }

    /// True when at least one triple failed
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Output file of a triple: `<out_dir>/<measured>_<target>_<constraint>.json`
pub fn output_path(out_dir: &Path, label: &RunLabel) -> PathBuf {
    out_dir.join(format!(
        "{}_{}_{}.json",
        label.measured, label.target, label.constraint
    ))
}

fn compute_record(catalog: &Catalog, job: &Job, config: &BatchConfig) -> std::result::Result<GoldenRecord, String> {
    let label = catalog.label(job);
    let measured = catalog.measured[job.measured].value.as_ref().map_err(Clone::clone)?;
    let target = catalog.targets[job.target].value.as_ref().map_err(Clone::clone)?;
    let bank = catalog.constraints[job.constraint]
        .value
        .as_ref()
        .map_err(Clone::clone)?;

    let result = run_pipeline(measured, target, bank, config.sample_rate, &config.pipeline, &label)
        .map_err(|e| e.to_string())?;
    let preset = result.to_preset();
    Ok(GoldenRecord {
        iem: label.measured,
        target: label.target,
        constraint: label.constraint,
        fs: config.sample_rate,
        pregain: preset.pregain,
        filters: preset.filters,
        rmse: preset.rmse,
    })
}

fn write_record(path: &Path, record: &GoldenRecord) -> Result<()> {
    let json = serde_json::to_string_pretty(record)?;
    fs::write(path, json).map_err(|e| PeqfitError::FileOperation {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Run a single triple, honoring the output cache.
pub fn run_job(catalog: &Catalog, job: &Job, config: &BatchConfig) -> JobOutcome {
    let label = catalog.label(job);
    let path = output_path(&config.out_dir, &label);

    if path.exists() && !config.force {
        info!("skip {}", path.display());
        return JobOutcome::Skipped { label, path };
    }

    let written = compute_record(catalog, job, config)
        .and_then(|record| write_record(&path, &record).map(|_| record).map_err(|e| e.to_string()));
    match written {
        Ok(record) => {
            info!(
                "wrote {} (rmse={:.3} dB, {} filters, pregain={:.1} dB)",
                path.display(),
                record.rmse,
                record.filters.len(),
                record.pregain
            );
            JobOutcome::Computed {
                label,
                path,
                rmse: record.rmse,
            }
        }
        Err(message) => {
            error!("{label}: {message}");
            JobOutcome::Failed { label, message }
        }
    }
}

/// Run every triple of the catalog.
///
/// Outcomes come back in job order, whatever order the workers finished in.
///
/// # Errors
///
/// Returns `PeqfitError::FileOperation` if the output directory cannot be
/// created and `PeqfitError::InvalidConfig` if the worker pool cannot be
/// built. Per-triple failures are reported as [`JobOutcome::Failed`].
pub fn run_batch(catalog: &Catalog, config: &BatchConfig) -> Result<(Vec<JobOutcome>, BatchSummary)> {
    fs::create_dir_all(&config.out_dir).map_err(|e| PeqfitError::FileOperation {
        path: config.out_dir.display().to_string(),
        message: e.to_string(),
    })?;

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = config.jobs {
        builder = builder.num_threads(n.max(1));
    }
    let pool = builder.build().map_err(|e| PeqfitError::InvalidConfig {
        reason: format!("cannot build worker pool: {e}"),
    })?;

    let jobs = catalog.jobs();
    info!("running {} jobs on {} threads", jobs.len(), pool.current_num_threads());
    let outcomes: Vec<JobOutcome> = pool.install(|| {
        jobs.par_iter()
            .map(|job| run_job(catalog, job, config))
            .collect()
    });

    let summary = BatchSummary::from_outcomes(&outcomes);
    info!(
        "{}/{} done ({} skipped, {} errors)",
        summary.computed + summary.skipped,
        summary.total,
        summary.skipped,
        summary.failed
    );
    Ok((outcomes, summary))
}

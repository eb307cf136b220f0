//! Pantheon+ distance-modulus tables.
//!
//! The release files are whitespace-delimited with a single header line.
//! Only the Hubble-diagram redshift, the SH0ES-calibrated distance modulus and
//! its diagonal uncertainty are read.
use std::io::BufRead;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Redshift column.
pub const REDSHIFT_COLUMN: &str = "zHD";
/// Observed distance-modulus column.
pub const MODULUS_COLUMN: &str = "MU_SH0ES";
/// Diagonal 1-sigma uncertainty column.
pub const MODULUS_ERROR_COLUMN: &str = "MU_SH0ES_ERR_DIAG";

/// Errors raised while reading a distance-modulus table.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read table: {0}")]
    Read(#[from] std::io::Error),

    #[error("table has no header line")]
    MissingHeader,

    #[error("missing column `{0}`")]
    MissingColumn(&'static str),

    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: cannot parse `{value}` in column `{column}`")]
    Parse {
        line: usize,
        column: &'static str,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    #[error("line {line}: uncertainty must be positive, got {value}")]
    NonPositiveError { line: usize, value: f64 },

    #[error("table contains no observations")]
    Empty,
}

/// One supernova: redshift, observed distance modulus and its uncertainty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceModulusObservation {
    pub z: f64,
    pub mu_obs: f64,
    pub mu_err: f64,
}

/// Column-oriented view of a set of observations.
///
/// The three columns always have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    redshifts: Vec<f64>,
    mu_obs: Vec<f64>,
    mu_err: Vec<f64>,
}

impl Dataset {
    pub fn from_observations(
        observations: impl IntoIterator<Item = DistanceModulusObservation>,
    ) -> Self {
        let mut dataset = Self::default();
        for obs in observations {
            dataset.push(obs);
        }
        dataset
    }

    /// Read a Pantheon+ table from disk.
    pub fn from_path(path: &Path) -> Result<Self, DataError> {
        let file = std::fs::File::open(path).map_err(|e| DataError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;
        let dataset = Self::from_reader(std::io::BufReader::new(file))?;
        log::info!(
            "loaded {} supernovae from {}",
            dataset.len(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn from_pantheon_str(content: &str) -> Result<Self, DataError> {
        Self::from_reader(content.as_bytes())
    }

    /// Parse a whitespace-delimited table with a header line.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, DataError> {
        let mut columns: Option<(usize, [usize; 3])> = None;
        let mut dataset = Self::default();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let fields = trimmed.split_whitespace().collect::<Vec<_>>();

            let Some((width, [z_idx, mu_idx, err_idx])) = columns else {
                let find = |name: &'static str| {
                    fields
                        .iter()
                        .position(|f| *f == name)
                        .ok_or(DataError::MissingColumn(name))
                };
                columns = Some((
                    fields.len(),
                    [
                        find(REDSHIFT_COLUMN)?,
                        find(MODULUS_COLUMN)?,
                        find(MODULUS_ERROR_COLUMN)?,
                    ],
                ));
                continue;
            };

            if fields.len() != width {
                return Err(DataError::FieldCount {
                    line: line_no,
                    expected: width,
                    found: fields.len(),
                });
            }

            let parse = |i: usize, column: &'static str| {
                fields[i].parse::<f64>().map_err(|e| DataError::Parse {
                    line: line_no,
                    column,
                    value: fields[i].to_string(),
                    source: e,
                })
            };

            let obs = DistanceModulusObservation {
                z: parse(z_idx, REDSHIFT_COLUMN)?,
                mu_obs: parse(mu_idx, MODULUS_COLUMN)?,
                mu_err: parse(err_idx, MODULUS_ERROR_COLUMN)?,
            };

            // also rejects NaN
            if !(obs.mu_err > 0.0) {
                return Err(DataError::NonPositiveError {
                    line: line_no,
                    value: obs.mu_err,
                });
            }

            dataset.push(obs);
        }

        if columns.is_none() {
            return Err(DataError::MissingHeader);
        }
        if dataset.is_empty() {
            return Err(DataError::Empty);
        }

        Ok(dataset)
    }

    fn push(&mut self, obs: DistanceModulusObservation) {
        self.redshifts.push(obs.z);
        self.mu_obs.push(obs.mu_obs);
        self.mu_err.push(obs.mu_err);
    }

    pub fn len(&self) -> usize {
        self.redshifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.redshifts.is_empty()
    }

    pub fn redshifts(&self) -> &[f64] {
        &self.redshifts
    }

    pub fn mu_obs(&self) -> &[f64] {
        &self.mu_obs
    }

    pub fn mu_err(&self) -> &[f64] {
        &self.mu_err
    }

    pub fn iter(&self) -> impl Iterator<Item = DistanceModulusObservation> + '_ {
        self.redshifts
            .iter()
            .zip(&self.mu_obs)
            .zip(&self.mu_err)
            .map(|((&z, &mu_obs), &mu_err)| DistanceModulusObservation { z, mu_obs, mu_err })
    }

    /// Keep the observations matching `predicate`, e.g. a low-redshift cut.
    pub fn filter(&self, predicate: impl Fn(&DistanceModulusObservation) -> bool) -> Self {
        Self::from_observations(self.iter().filter(|obs| predicate(obs)))
    }

    /// Smallest and largest redshift, `None` when empty.
    pub fn redshift_range(&self) -> Option<(f64, f64)> {
        if self.is_empty() {
            return None;
        }
        Some(
            self.redshifts
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), z| {
                    (min.min(*z), max.max(*z))
                }),
        )
    }
}

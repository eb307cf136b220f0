//! Crate-level error type.
use thiserror::Error;

use crate::config::ConfigError;
use crate::data::DataError;
use crate::sampler::SamplingError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sampling(#[from] SamplingError),
}

pub type Result<T> = std::result::Result<T, Error>;

//! Fit Lambda-CDM parameters to Pantheon+ supernova distance moduli.
//!
//! The forward model lives in [`cosmology`]: Hubble parameter, comoving
//! distance by fixed-step quadrature, curvature-dependent luminosity distance
//! and distance modulus. [`model::SupernovaModel`] wraps it in a Gaussian
//! likelihood for the NUTS sampler of `nuts-rs`, and [`simulate::Simulator`]
//! produces noisy catalogues for simulation-based inference.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use cosmo_nuts_rs::{fit, Config, Dataset};
//!
//! let dataset = Dataset::from_path(Path::new("Pantheon+SH0ES.dat"))?
//!     .filter(|obs| obs.z > 0.01);
//! let chains = fit(dataset, &Config::default())?;
//! for p in chains.summary() {
//!     println!("{}: {:.3} +/- {:.3}", p.name, p.mean, p.std);
//! }
//! # Ok::<(), cosmo_nuts_rs::Error>(())
//! ```
pub mod chain;
pub mod config;
pub mod cosmology;
pub mod data;
mod error;
pub mod model;
pub mod plot;
pub mod sampler;
pub mod simulate;

pub use chain::{Chains, Model, ParameterSummary};
pub use config::{Config, ConfigError, IntegrationConfig, SamplerConfig};
pub use cosmology::{CosmologicalParameters, Cosmology, DistanceModel, FlatLambdaCdm, RedshiftGrid};
pub use data::{DataError, Dataset, DistanceModulusObservation};
pub use error::{Error, Result};
pub use model::{Bounds, PriorBounds, SupernovaModel, Variant};
pub use plot::HubbleDiagram;
pub use sampler::SamplingError;
pub use simulate::{SimulationBatch, Simulator};

/// Sample the posterior of `config.variant` given `dataset`.
pub fn fit(dataset: Dataset, config: &Config) -> Result<Chains> {
    config.validate()?;
    if dataset.is_empty() {
        return Err(DataError::Empty.into());
    }

    log::info!(
        "fitting {:?} model to {} supernovae with {} chains",
        config.variant,
        dataset.len(),
        config.sampler.chains
    );

    let model = SupernovaModel::new(
        dataset,
        config.variant,
        &config.priors,
        config.distance_model(),
    );
    let chains = Chains::run(model, &config.sampler)?;

    for p in chains.summary() {
        log::info!("{}: mean={:.4} std={:.4}", p.name, p.mean, p.std);
    }

    Ok(chains)
}

//! Interface to the sampler
use nuts_rs::{new_sampler, Chain, CpuLogpFunc, SampleStats, SamplerArgs};

use rand::rngs::SmallRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::config::SamplerConfig;

/// Sampling failures. Recoverable density errors are handled inside NUTS as
/// divergences and never reach this type.
#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("chain {chain}: initial position has {found} coordinates, model has {expected}")]
    Dimension {
        chain: u64,
        expected: usize,
        found: usize,
    },

    #[error("chain {chain}: cannot start at the initial position: {reason}")]
    Initialization { chain: u64, reason: String },

    #[error("chain {chain}: draw {draw} failed: {reason}")]
    Draw { chain: u64, draw: u64, reason: String },
}

/// Where a trajectory diverged, in unconstrained coordinates.
#[derive(Debug, Clone)]
pub struct DivergenceRecord {
    /// Index of the kept draw that reported the divergence.
    pub draw: u64,
    pub start_location: Option<Box<[f64]>>,
    pub end_location: Option<Box<[f64]>>,
    pub energy_error: Option<f64>,
}

impl DivergenceRecord {
    fn new(draw: u64, div_info: &nuts_rs::DivergenceInfo) -> Self {
        Self {
            draw,
            start_location: div_info.start_location.clone(),
            end_location: div_info.end_location.clone(),
            energy_error: div_info.energy_error,
        }
    }
}

/// Draws of one chain, in unconstrained coordinates.
pub struct ChainDraws {
    pub draws: Vec<Box<[f64]>>,
    pub divergences: Vec<DivergenceRecord>,
}

/// Run the sampler
///
/// The first `config.tuning` draws adapt step size and mass matrix and are
/// discarded; the next `config.samples` draws are kept.
pub fn be_nuts<F>(
    logp_func: F,
    config: &SamplerConfig,
    initial_position: &[f64],
    chain: u64,
    seed: u64,
) -> Result<ChainDraws, SamplingError>
where
    F: CpuLogpFunc,
{
    let dim = logp_func.dim();
    if initial_position.len() != dim {
        return Err(SamplingError::Dimension {
            chain,
            expected: dim,
            found: initial_position.len(),
        });
    }

    // We get the default sampler arguments
    let mut sampler_args = SamplerArgs::default();
    sampler_args.num_tune = config.tuning;

    let mut rng = SmallRng::seed_from_u64(seed);
    let mut sampler = new_sampler(logp_func, sampler_args, chain, &mut rng);

    sampler
        .set_position(initial_position)
        .map_err(|e| SamplingError::Initialization {
            chain,
            reason: e.to_string(),
        })?;

    log::debug!("chain {chain}: {} tuning draws", config.tuning);
    for draw in 0..config.tuning {
        sampler.draw().map_err(|e| SamplingError::Draw {
            chain,
            draw,
            reason: e.to_string(),
        })?;
    }

    let mut draws = Vec::with_capacity(config.samples as usize);
    let mut divergences = vec![];
    for draw in 0..config.samples {
        let (position, info) = sampler.draw().map_err(|e| SamplingError::Draw {
            chain,
            draw: config.tuning + draw,
            reason: e.to_string(),
        })?;
        draws.push(position);
        if let Some(div_info) = info.divergence_info() {
            divergences.push(DivergenceRecord::new(draw, div_info));
        }
    }

    if !divergences.is_empty() {
        log::warn!(
            "chain {chain}: {} divergent transitions in {} draws",
            divergences.len(),
            config.samples
        );
    }

    Ok(ChainDraws { draws, divergences })
}

#[cfg(test)]
mod tests {
    use nuts_rs::LogpError;

    use super::*;

    #[derive(Debug, Clone)]
    struct StandardNormal {
        dim: usize,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("unreachable")]
    struct NeverFails;

    impl LogpError for NeverFails {
        fn is_recoverable(&self) -> bool {
            true
        }
    }

    impl CpuLogpFunc for StandardNormal {
        type Err = NeverFails;

        fn dim(&self) -> usize {
            self.dim
        }

        fn logp(&mut self, position: &[f64], grad: &mut [f64]) -> Result<f64, Self::Err> {
            for (g, x) in grad.iter_mut().zip(position) {
                *g = -x;
            }
            Ok(-0.5 * position.iter().map(|x| x * x).sum::<f64>())
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("density failed")]
    struct Fatal;

    impl LogpError for Fatal {
        fn is_recoverable(&self) -> bool {
            false
        }
    }

    /// Normal centred on 1 that only evaluates at its starting point.
    #[derive(Debug, Clone)]
    struct PinnedNormal {
        nan_gradient: bool,
    }

    impl CpuLogpFunc for PinnedNormal {
        type Err = Fatal;

        fn dim(&self) -> usize {
            1
        }

        fn logp(&mut self, position: &[f64], grad: &mut [f64]) -> Result<f64, Self::Err> {
            if position[0] != 0.0 {
                return Err(Fatal);
            }
            grad[0] = if self.nan_gradient {
                f64::NAN
            } else {
                1.0 - position[0]
            };
            Ok(-0.5 * (position[0] - 1.0).powi(2))
        }
    }

    fn config(tuning: u64, samples: u64) -> SamplerConfig {
        SamplerConfig {
            chains: 1,
            tuning,
            samples,
            seed: 0,
        }
    }

    #[test]
    fn test_draw_count_and_moments() {
        let out =
            be_nuts(StandardNormal { dim: 2 }, &config(300, 2000), &[1.0, -1.0], 0, 3).unwrap();
        assert_eq!(out.draws.len(), 2000);
        assert!(out.draws.iter().all(|d| d.len() == 2));

        let mean = out.draws.iter().map(|d| d[0]).sum::<f64>() / 2000.0;
        let var = out.draws.iter().map(|d| (d[0] - mean).powi(2)).sum::<f64>() / 2000.0;
        assert!(mean.abs() < 0.2, "mean = {mean}");
        assert!((var - 1.0).abs() < 0.3, "var = {var}");
    }

    #[test]
    fn test_same_seed_same_draws() {
        let a = be_nuts(StandardNormal { dim: 1 }, &config(50, 20), &[0.5], 0, 9).unwrap();
        let b = be_nuts(StandardNormal { dim: 1 }, &config(50, 20), &[0.5], 0, 9).unwrap();
        assert_eq!(a.draws, b.draws);
    }

    #[test]
    fn test_non_finite_initial_gradient() {
        let err = be_nuts(PinnedNormal { nan_gradient: true }, &config(1, 1), &[0.0], 2, 0)
            .err()
            .unwrap();
        assert!(matches!(err, SamplingError::Initialization { chain: 2, .. }), "{err}");
    }

    #[test]
    fn test_fatal_density_error_stops_the_chain() {
        let err = be_nuts(PinnedNormal { nan_gradient: false }, &config(5, 5), &[0.0], 1, 0)
            .err()
            .unwrap();
        assert!(matches!(err, SamplingError::Draw { chain: 1, draw: 0, .. }), "{err}");
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = be_nuts(StandardNormal { dim: 2 }, &config(1, 1), &[0.0], 4, 0)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            SamplingError::Dimension {
                chain: 4,
                expected: 2,
                found: 1
            }
        ));
    }
}

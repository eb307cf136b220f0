//! # supernova
use std::f64::consts::{LN_10, PI};

use nuts_rs::{CpuLogpFunc, LogpError};
use thiserror::Error;

use super::{Bounds, PriorBounds, Variant};
use crate::chain::Model;
use crate::cosmology::{CosmologicalParameters, DistanceModel, FlatLambdaCdm};
use crate::data::Dataset;

/// Relative step of the central differences in `Om` and `Ok`.
const FD_STEP: f64 = 1e-6;

const H0: usize = 0;
const OM: usize = 1;
const OK: usize = 2;

/// Errors reported to the sampler.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The density or its gradient is not finite at this position.
    #[error("non-finite log density at {position:?}")]
    NonFinite { position: Vec<f64> },
}

impl LogpError for ModelError {
    fn is_recoverable(&self) -> bool {
        true
    }
}

/// Distance moduli of a Pantheon+ sample with a Gaussian likelihood.
///
/// `mu_obs_i ~ Normal(mu(z_i; H0, Om, Ok), mu_err_i)` with independent uniform
/// priors. Positions handed to [`CpuLogpFunc::logp`] are unconstrained and the
/// log density includes the Jacobian of the sigmoid map.
#[derive(Debug, Clone)]
pub struct SupernovaModel {
    dataset: Dataset,
    variant: Variant,
    bounds: Vec<Bounds>,
    distance: DistanceModel,
    log_norm: f64,
}

impl SupernovaModel {
    pub fn new(
        dataset: Dataset,
        variant: Variant,
        priors: &PriorBounds,
        distance: DistanceModel,
    ) -> Self {
        let log_norm = -dataset
            .mu_err()
            .iter()
            .map(|err| (err * (2.0 * PI).sqrt()).ln())
            .sum::<f64>();

        Self {
            bounds: priors.for_variant(variant),
            dataset,
            variant,
            distance,
            log_norm,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn bounds(&self) -> &[Bounds] {
        &self.bounds
    }

    /// Map an unconstrained position onto the prior box.
    pub fn to_constrained(&self, position: &[f64]) -> Vec<f64> {
        self.bounds
            .iter()
            .zip(position)
            .map(|(b, &u)| b.constrain(u))
            .collect()
    }

    /// Inverse of [`SupernovaModel::to_constrained`].
    pub fn to_unconstrained(&self, theta: &[f64]) -> Vec<f64> {
        self.bounds
            .iter()
            .zip(theta)
            .map(|(b, &t)| b.unconstrain(t))
            .collect()
    }

    /// Predicted distance moduli for constrained parameters `theta`.
    pub fn predict(&self, theta: &[f64]) -> Vec<f64> {
        predict(&self.distance, self.variant, theta, self.dataset.redshifts())
    }

    /// Gaussian log likelihood of the observed moduli.
    pub fn log_likelihood(&self, theta: &[f64]) -> f64 {
        self.residual_weights(&self.predict(theta)).0
    }

    /// Log likelihood and `d logL / d mu_i = (obs - mu) / err^2`.
    fn residual_weights(&self, predicted: &[f64]) -> (f64, Vec<f64>) {
        let mut log_like = self.log_norm;
        let weights = predicted
            .iter()
            .zip(self.dataset.mu_obs())
            .zip(self.dataset.mu_err())
            .map(|((mu, obs), err)| {
                let diff = obs - mu;
                let w = diff / (err * err);
                log_like -= 0.5 * diff * w;
                w
            })
            .collect();
        (log_like, weights)
    }

    /// Gradient of the log likelihood with respect to constrained parameters.
    fn grad_log_likelihood(&self, theta: &[f64], predicted: &[f64], weights: &[f64]) -> Vec<f64> {
        let mut grad = vec![0.0; theta.len()];

        // every distance scales as 1/H0, so d mu / d H0 = -5 / (H0 ln 10),
        // except where dL sits on the epsilon floor and mu is constant
        let floor = self.distance.modulus_from_luminosity_distance(self.distance.epsilon);
        let scaling = predicted
            .iter()
            .zip(weights)
            .filter(|(mu, _)| **mu > floor)
            .map(|(_, w)| w)
            .sum::<f64>();
        grad[H0] = -5.0 / (theta[H0] * LN_10) * scaling;

        for j in [OM, OK].into_iter().filter(|&j| j < theta.len()) {
            let h = FD_STEP * theta[j].abs().max(1.0);
            let mut up = theta.to_vec();
            up[j] += h;
            let mut down = theta.to_vec();
            down[j] -= h;

            let mu_up = self.predict(&up);
            let mu_down = self.predict(&down);
            grad[j] = weights
                .iter()
                .zip(mu_up.iter().zip(&mu_down))
                .map(|(w, (u, d))| w * (u - d))
                .sum::<f64>()
                / (2.0 * h);
        }

        grad
    }
}

/// Distance moduli at `redshifts` for a parameter vector of `variant`.
pub(crate) fn predict(
    distance: &DistanceModel,
    variant: Variant,
    theta: &[f64],
    redshifts: &[f64],
) -> Vec<f64> {
    match variant {
        Variant::Flat => {
            distance.distance_moduli(&FlatLambdaCdm::new(theta[H0], theta[OM]), redshifts)
        }
        Variant::Curved => distance.distance_moduli(
            &CosmologicalParameters::new(theta[H0], theta[OM], theta[OK]),
            redshifts,
        ),
    }
}

impl CpuLogpFunc for SupernovaModel {
    type Err = ModelError;

    fn dim(&self) -> usize {
        self.variant.dim()
    }

    fn logp(&mut self, position: &[f64], grad: &mut [f64]) -> Result<f64, Self::Err> {
        assert_eq!(position.len(), self.dim());

        let theta = self.to_constrained(position);
        let predicted = self.predict(&theta);
        let (log_like, weights) = self.residual_weights(&predicted);
        let d_theta = self.grad_log_likelihood(&theta, &predicted, &weights);

        // uniform priors are flat inside the box; only the Jacobian remains
        let mut logp = log_like;
        for (j, bounds) in self.bounds.iter().enumerate() {
            let u = position[j];
            logp += bounds.log_jacobian(u);
            grad[j] = d_theta[j] * bounds.jacobian(u) + bounds.grad_log_jacobian(u);
        }

        if !logp.is_finite() || grad.iter().any(|g| !g.is_finite()) {
            return Err(ModelError::NonFinite {
                position: position.to_vec(),
            });
        }

        Ok(logp)
    }
}

impl Model for SupernovaModel {
    fn parameters(&self) -> Vec<String> {
        self.variant.parameters()
    }

    fn constrain(&self, position: &[f64]) -> Vec<f64> {
        self.to_constrained(position)
    }

    fn initial_position(&self) -> Vec<f64> {
        vec![0.0; self.dim()]
    }
}

//! Priors, parameter transforms and the supernova likelihood.
//!
//! Parameters have independent uniform priors. The sampler moves in an
//! unconstrained space and each coordinate is mapped onto its prior interval
//! with `theta = lower + (upper - lower) * sigmoid(u)`.
use serde::{Deserialize, Serialize};

pub mod supernova;

pub use supernova::{ModelError, SupernovaModel};

/// Which cosmological parameters are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// `H0, Om` with `Ok = 0`.
    #[default]
    Flat,
    /// `H0, Om, Ok`.
    Curved,
}

impl Variant {
    pub fn dim(&self) -> usize {
        match self {
            Variant::Flat => 2,
            Variant::Curved => 3,
        }
    }

    /// Parameter names in position order.
    pub fn parameters(&self) -> Vec<String> {
        let names: &[&str] = match self {
            Variant::Flat => &["H0", "Om"],
            Variant::Curved => &["H0", "Om", "Ok"],
        };
        names.iter().map(|x| x.to_string()).collect()
    }
}

/// Closed interval of a uniform prior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn center(&self) -> f64 {
        0.5 * (self.lower + self.upper)
    }

    pub fn contains(&self, x: f64) -> bool {
        (self.lower..=self.upper).contains(&x)
    }

    /// `(-inf, inf) -> (lower, upper)`.
    #[inline]
    pub fn constrain(&self, u: f64) -> f64 {
        self.lower + self.width() * sigmoid(u)
    }

    /// Inverse of [`Bounds::constrain`]; values on or outside the edges map
    /// to large finite numbers.
    #[inline]
    pub fn unconstrain(&self, theta: f64) -> f64 {
        let p = ((theta - self.lower) / self.width()).clamp(1e-15, 1.0 - 1e-15);
        (p / (1.0 - p)).ln()
    }

    /// `log |d theta / d u|`.
    #[inline]
    pub fn log_jacobian(&self, u: f64) -> f64 {
        self.width().ln() + log_sigmoid(u) + log_sigmoid(-u)
    }

    /// `d theta / d u`.
    #[inline]
    pub fn jacobian(&self, u: f64) -> f64 {
        let s = sigmoid(u);
        self.width() * s * (1.0 - s)
    }

    /// `d/du log |d theta / d u|`.
    #[inline]
    pub fn grad_log_jacobian(&self, u: f64) -> f64 {
        1.0 - 2.0 * sigmoid(u)
    }
}

/// Uniform prior intervals for every cosmological parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorBounds {
    #[serde(default = "default_h0")]
    pub h0: Bounds,
    #[serde(default = "default_om")]
    pub om: Bounds,
    #[serde(default = "default_ok")]
    pub ok: Bounds,
}

fn default_h0() -> Bounds {
    Bounds::new(60.0, 80.0)
}

fn default_om() -> Bounds {
    Bounds::new(0.1, 0.9)
}

fn default_ok() -> Bounds {
    Bounds::new(-0.1, 0.1)
}

impl Default for PriorBounds {
    fn default() -> Self {
        Self {
            h0: default_h0(),
            om: default_om(),
            ok: default_ok(),
        }
    }
}

impl PriorBounds {
    /// Bounds of the sampled parameters, in position order.
    pub fn for_variant(&self, variant: Variant) -> Vec<Bounds> {
        match variant {
            Variant::Flat => vec![self.h0, self.om],
            Variant::Curved => vec![self.h0, self.om, self.ok],
        }
    }
}

#[inline]
pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

#[inline]
pub(crate) fn log_sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        -(-x).exp().ln_1p()
    } else {
        x - x.exp().ln_1p()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_variant_names() {
        assert_eq!(Variant::Flat.parameters(), vec!["H0", "Om"]);
        assert_eq!(Variant::Curved.parameters(), vec!["H0", "Om", "Ok"]);
        assert_eq!(Variant::Curved.dim(), 3);
    }

    #[test]
    fn test_constrain_roundtrip() {
        let bounds = Bounds::new(60.0, 80.0);
        assert_relative_eq!(bounds.constrain(0.0), 70.0);
        for theta in [60.5, 65.0, 70.0, 79.9] {
            assert_relative_eq!(
                bounds.constrain(bounds.unconstrain(theta)),
                theta,
                max_relative = 1e-10
            );
        }
        assert!(bounds.unconstrain(80.0).is_finite());
        assert!(bounds.contains(bounds.constrain(-50.0)));
        assert!(bounds.contains(bounds.constrain(50.0)));
    }

    #[test]
    fn test_jacobian_matches_finite_difference() {
        let bounds = Bounds::new(0.1, 0.9);
        let h = 1e-6;
        for u in [-3.0, -0.4, 0.0, 1.2] {
            let numeric = (bounds.constrain(u + h) - bounds.constrain(u - h)) / (2.0 * h);
            assert_relative_eq!(bounds.jacobian(u), numeric, max_relative = 1e-6);
            assert_relative_eq!(
                bounds.log_jacobian(u),
                bounds.jacobian(u).ln(),
                max_relative = 1e-10
            );

            let numeric = (bounds.log_jacobian(u + h) - bounds.log_jacobian(u - h)) / (2.0 * h);
            approx::assert_abs_diff_eq!(bounds.grad_log_jacobian(u), numeric, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_default_priors() {
        let priors = PriorBounds::default();
        assert_eq!(priors.for_variant(Variant::Flat).len(), 2);
        assert_eq!(priors.for_variant(Variant::Curved)[2], Bounds::new(-0.1, 0.1));
    }
}

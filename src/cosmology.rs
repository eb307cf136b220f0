//! Background cosmology for a Lambda-CDM universe.
//!
//! The expansion rate, comoving distance, luminosity distance and distance
//! modulus are computed by [`DistanceModel`]. Parameter sets implement
//! [`Cosmology`]; [`FlatLambdaCdm`] is the `Ok = 0` specialization and
//! [`CosmologicalParameters`] the general curved one.
//!
//! Every quantity is clamped rather than rejected: unphysical draws from a
//! sampler or simulator produce finite numbers instead of errors.

mod distance;
mod grid;

pub use distance::{select, DistanceModel};
pub use grid::RedshiftGrid;

/// Speed of light in km/s.
pub const SPEED_OF_LIGHT: f64 = 299_792.458;

/// Floor for the expansion radicand and for distances fed to `log10`.
pub const EPSILON: f64 = 1e-10;

/// `|Ok|` below this is treated as exactly flat.
pub const FLAT_TOLERANCE: f64 = 1e-10;

/// Quadrature points spanning `[0, z]`.
pub const GRID_POINTS: usize = 1000;

/// A set of density parameters and a Hubble constant.
pub trait Cosmology: Copy + Send + Sync {
    /// Hubble constant in km/s/Mpc.
    fn h0(&self) -> f64;

    /// Matter density.
    fn om(&self) -> f64;

    /// Curvature density.
    fn ok(&self) -> f64;

    /// Dark-energy density.
    fn ol(&self) -> f64 {
        1.0 - self.om() - self.ok()
    }

    /// `(H(z) / H0)^2` before clamping.
    fn radicand(&self, z: f64) -> f64;
}

/// Spatially flat Lambda-CDM: `OL = 1 - Om`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatLambdaCdm {
    pub h0: f64,
    pub om: f64,
}

impl FlatLambdaCdm {
    pub fn new(h0: f64, om: f64) -> Self {
        Self { h0, om }
    }
}

impl Cosmology for FlatLambdaCdm {
    fn h0(&self) -> f64 {
        self.h0
    }

    fn om(&self) -> f64 {
        self.om
    }

    fn ok(&self) -> f64 {
        0.0
    }

    fn ol(&self) -> f64 {
        1.0 - self.om
    }

    #[inline]
    fn radicand(&self, z: f64) -> f64 {
        self.om * (1.0 + z).powi(3) + (1.0 - self.om)
    }
}

/// Lambda-CDM with free curvature: `OL = 1 - Om - Ok`.
///
/// No constraint is placed on `Om + Ok`; callers choose sensible priors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CosmologicalParameters {
    pub h0: f64,
    pub om: f64,
    pub ok: f64,
}

impl CosmologicalParameters {
    pub fn new(h0: f64, om: f64, ok: f64) -> Self {
        Self { h0, om, ok }
    }
}

impl From<FlatLambdaCdm> for CosmologicalParameters {
    fn from(flat: FlatLambdaCdm) -> Self {
        Self::new(flat.h0, flat.om, 0.0)
    }
}

impl Cosmology for CosmologicalParameters {
    fn h0(&self) -> f64 {
        self.h0
    }

    fn om(&self) -> f64 {
        self.om
    }

    fn ok(&self) -> f64 {
        self.ok
    }

    #[inline]
    fn radicand(&self, z: f64) -> f64 {
        let zp1 = 1.0 + z;
        self.om * zp1.powi(3) + self.ok * zp1.powi(2) + self.ol()
    }
}

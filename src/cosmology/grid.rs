//! Uniform redshift grids for fixed-step quadrature.

/// `n` uniformly spaced redshifts spanning `[0, z]`.
///
/// The first point is exactly `0.0` and the last exactly `z`. Negative
/// targets are clamped to `0`, which yields a degenerate grid of zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct RedshiftGrid {
    points: Vec<f64>,
    step: f64,
}

impl RedshiftGrid {
    /// Build a grid of `n` points on `[0, z]`. At least two points are used.
    pub fn new(z: f64, n: usize) -> Self {
        let n = n.max(2);
        let z = z.max(0.0);
        let step = z / (n - 1) as f64;

        let mut points = (0..n).map(|k| k as f64 * step).collect::<Vec<_>>();
        points[n - 1] = z;

        Self { points, step }
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Spacing `z / (n - 1)`.
    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Last grid point.
    pub fn upper(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    /// Insertion index of `z`, clamped to `[1, n - 1]`.
    pub fn bracket(&self, z: f64) -> usize {
        self.points
            .partition_point(|&p| p < z)
            .clamp(1, self.points.len() - 1)
    }

    /// Linearly interpolate `values` (one per grid point) at `z`.
    pub fn interpolate(&self, values: &[f64], z: f64) -> f64 {
        assert_eq!(values.len(), self.points.len(), "Dimension mismatch");

        let idx = self.bracket(z);
        let (lo, hi) = (self.points[idx - 1], self.points[idx]);
        let span = hi - lo;
        if span <= 0.0 {
            return values[idx - 1];
        }

        let w = (z - lo) / span;
        values[idx - 1] * (1.0 - w) + values[idx] * w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_are_exact() {
        let grid = RedshiftGrid::new(1.7, 1000);
        assert_eq!(grid.len(), 1000);
        assert_eq!(grid.points()[0], 0.0);
        assert_eq!(grid.upper(), 1.7);
        assert!(grid.points().windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_bracket_is_clamped() {
        let grid = RedshiftGrid::new(1.0, 11);
        assert_eq!(grid.bracket(0.0), 1);
        assert_eq!(grid.bracket(-3.0), 1);
        assert_eq!(grid.bracket(1.0), 10);
        assert_eq!(grid.bracket(5.0), 10);
        assert_eq!(grid.bracket(0.55), 6);
    }

    #[test]
    fn test_interpolate_linear_function() {
        let grid = RedshiftGrid::new(2.0, 21);
        let values = grid.points().iter().map(|z| 3.0 * z + 1.0).collect::<Vec<_>>();
        for z in [0.0, 0.03, 0.77, 1.999, 2.0] {
            approx::assert_abs_diff_eq!(
                grid.interpolate(&values, z),
                3.0 * z + 1.0,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_degenerate_grid() {
        let grid = RedshiftGrid::new(-1.0, 5);
        assert!(grid.points().iter().all(|&z| z == 0.0));
        assert_eq!(grid.step(), 0.0);
        assert_eq!(grid.interpolate(&[4.0; 5], 0.0), 4.0);

        let grid = RedshiftGrid::new(1.0, 0);
        assert_eq!(grid.len(), 2);
    }
}

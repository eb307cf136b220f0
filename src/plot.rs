//! Plot data
use std::error::Error;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::cosmology::DistanceModel;
use crate::data::Dataset;
use crate::model::{supernova::predict, Variant};

/// Points of each model curve.
const CURVE_POINTS: usize = 200;

/// Distance modulus as a function of redshift
pub struct HubbleDiagram<'a> {
    dataset: &'a Dataset,
    variant: Variant,
    distance: DistanceModel,
    curves: Vec<Vec<f64>>,
}

impl<'a> HubbleDiagram<'a> {
    /// Create a new plot
    pub fn new(dataset: &'a Dataset, variant: Variant, distance: DistanceModel) -> Self {
        Self {
            dataset,
            variant,
            distance,
            curves: vec![],
        }
    }

    /// Overlay the model for each parameter vector, e.g. posterior draws.
    pub fn with_curves<I, P>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[f64]>,
    {
        let dim = self.variant.dim();
        self.curves = parameters
            .into_iter()
            .map(|p| p.as_ref().to_vec())
            .filter(|p| p.len() == dim)
            .collect();
        self
    }

    /// Model curves evaluated on a uniform redshift grid.
    pub fn model_curves(&self) -> Vec<Vec<(f64, f64)>> {
        let Some((_, z_max)) = self.dataset.redshift_range() else {
            return vec![];
        };
        let z = (1..=CURVE_POINTS)
            .map(|k| z_max * k as f64 / CURVE_POINTS as f64)
            .collect::<Vec<_>>();

        self.curves
            .iter()
            .map(|theta| {
                let mu = predict(&self.distance, self.variant, theta, &z);
                z.iter().copied().zip(mu).collect()
            })
            .collect()
    }

    /// Plot the data
    pub fn plot<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<(), Box<dyn Error>>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let (z_min, z_max) = self.dataset.redshift_range().unwrap_or((0.0, 1.0));

        let (mu_min, mu_max) = self
            .dataset
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), obs| {
                (min.min(obs.mu_obs - obs.mu_err), max.max(obs.mu_obs + obs.mu_err))
            });
        let (mu_min, mu_max) = if mu_min < mu_max {
            (mu_min.floor(), mu_max.ceil())
        } else {
            (30.0, 46.0)
        };

        let mut chart = ChartBuilder::on(root)
            .margin(5)
            .caption("Hubble diagram", ("sans-serif", 30))
            .x_label_area_size(30)
            .y_label_area_size(50)
            .set_label_area_size(LabelAreaPosition::Right, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 30)
            .build_cartesian_2d(0.0..z_max.max(z_min + 1e-3), mu_min..mu_max)?;

        chart
            .configure_mesh()
            .x_labels(5)
            .y_labels(5)
            .x_desc("z")
            .y_desc("mu")
            .x_label_style(TextStyle::from(("sans-serif", 20)).color(&BLACK))
            .y_label_style(TextStyle::from(("sans-serif", 20)).color(&BLACK))
            .draw()?;

        chart
            .draw_series(self.dataset.iter().map(|obs| {
                ErrorBar::new_vertical(
                    obs.z,
                    obs.mu_obs - obs.mu_err,
                    obs.mu_obs,
                    obs.mu_obs + obs.mu_err,
                    RED.mix(0.5).filled(),
                    2,
                )
            }))?
            .label("Pantheon+")
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], RED.filled()));

        let mut first = true;
        for curve in self.model_curves() {
            let c = chart.draw_series(LineSeries::new(
                curve,
                Into::<ShapeStyle>::into(BLUE.mix(0.3)).stroke_width(1),
            ))?;

            if first {
                c.label("Model").legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], BLUE.filled())
                });
                first = false;
            }
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}

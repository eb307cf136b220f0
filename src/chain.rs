//! Core logic

use std::error::Error;

use nuts_rs::CpuLogpFunc;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::config::SamplerConfig;
use crate::sampler::{be_nuts, DivergenceRecord, SamplingError};

#[derive(Default)]
pub struct Run {}

/// A model
pub trait Model: CpuLogpFunc {
    /// Return the names of the parameters
    fn parameters(&self) -> Vec<String>;

    /// Map a sampler position to the reported parameter values.
    fn constrain(&self, position: &[f64]) -> Vec<f64> {
        position.to_vec()
    }

    /// Where every chain starts.
    fn initial_position(&self) -> Vec<f64> {
        vec![0.0; self.dim()]
    }
}

impl Run {
    fn run(
        &self,
        model: impl Model + Clone,
        config: &SamplerConfig,
        chain: u64,
        initial_position: &[f64],
    ) -> Result<ChainRun, SamplingError> {
        let seed = config.seed + chain;
        log::info!("chain {chain}: seed={seed}");

        let out = be_nuts(model.clone(), config, initial_position, chain, seed)?;
        let trace = out
            .draws
            .iter()
            .map(|position| model.constrain(position))
            .collect();

        Ok(ChainRun {
            trace,
            divergences: out.divergences,
        })
    }
}

/// A single chain run.
struct ChainRun {
    trace: Vec<Vec<f64>>,
    divergences: Vec<DivergenceRecord>,
}

impl ChainRun {
    /// Return the trace for a given parameter.
    pub fn trace(&self, parameter_idx: usize) -> Vec<f64> {
        self.trace
            .iter()
            .map(|x| x[parameter_idx])
            .collect::<Vec<_>>()
    }
}

/// Posterior summary of one parameter across all chains.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSummary {
    pub name: String,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// A collection of chains
pub struct Chains {
    chains: Vec<ChainRun>,
    dim: usize,
    samples: u64,
    pub parameters: Vec<String>,
}

impl Chains {
    /// Runs a collection of chains - sequentially.
    pub fn run(model: impl Model + Clone, config: &SamplerConfig) -> Result<Self, SamplingError> {
        let initial_position = model.initial_position();
        Self::run_from(model, config, &initial_position)
    }

    /// Runs a collection of chains from an explicit unconstrained start.
    pub fn run_from(
        model: impl Model + Clone,
        config: &SamplerConfig,
        initial_position: &[f64],
    ) -> Result<Self, SamplingError> {
        let chains = (0..config.chains)
            .map(|chain| Run::default().run(model.clone(), config, chain, initial_position))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Chains {
            chains,
            dim: model.dim(),
            samples: config.samples,
            parameters: model.parameters(),
        })
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Returns the extrema for a given parameter - across all chains.
    pub fn extrema(&self, parameter_idx: usize) -> (f64, f64) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for chain in &self.chains {
            let (min_, max_) = chain
                .trace(parameter_idx)
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), x| {
                    (min.min(*x), max.max(*x))
                });

            min = min.min(min_);
            max = max.max(max_);
        }

        (min, max)
    }

    /// Returns the traces for a given parameter
    pub fn traces(&self, i: usize) -> Vec<Vec<f64>> {
        self.chains.iter().map(|x| x.trace(i)).collect()
    }

    /// All draws of all chains, one parameter vector each.
    pub fn draws(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.chains
            .iter()
            .flat_map(|chain| chain.trace.iter().map(|x| x.as_slice()))
    }

    /// Divergences of every chain, tagged with the chain index.
    pub fn divergences(&self) -> Vec<(usize, &DivergenceRecord)> {
        self.chains
            .iter()
            .enumerate()
            .flat_map(|(chain, run)| run.divergences.iter().map(move |d| (chain, d)))
            .collect()
    }

    /// Mean, standard deviation and extrema of every parameter.
    pub fn summary(&self) -> Vec<ParameterSummary> {
        (0..self.dim)
            .map(|parameter_idx| {
                let values = self.traces(parameter_idx).concat();
                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                let var =
                    values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0).max(1.0);
                let (min, max) = self.extrema(parameter_idx);

                ParameterSummary {
                    name: self.parameters[parameter_idx].clone(),
                    mean,
                    std: var.sqrt(),
                    min,
                    max,
                }
            })
            .collect()
    }

    /// Posterior histogram and trace of every parameter, one row each.
    pub fn plot<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<(), Box<dyn Error>>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        // split into DIMS horizontal subplots and 2 vertical subplots
        let subplots = root.split_evenly((self.dim, 2));

        let colors = [RED, GREEN, BLUE, MAGENTA, CYAN, YELLOW];

        for (parameter_idx, parameter) in self.parameters.iter().enumerate() {
            let (min_, max_) = self.extrema(parameter_idx);

            let param_traces = self.traces(parameter_idx);

            // ceil and floor at the nearest 0.1
            let (min_, mut max_) = ((min_ * 10.).floor() / 10., (max_ * 10.).ceil() / 10.);
            if max_ <= min_ {
                max_ = min_ + 0.1;
            }

            // step size - about 10 bins between min_ and max_ - closest power of 10
            let step = 10.0f64.powf((max_ - min_).log10().floor() - 1.);

            // compute the height of the largest bin in the histogram
            let bins = (((max_ - min_) / step) as usize).max(1);
            let max_height = param_traces
                .iter()
                .map(|x| {
                    let mut counts = vec![0u32; bins];
                    for x in x.iter() {
                        let idx = usize::min(((x - min_) / step) as usize, bins - 1);
                        counts[idx] += 1;
                    }
                    counts.iter().copied().max().unwrap_or(0)
                })
                .max()
                .unwrap_or(0)
                .max(1);

            // plot the histogram
            let area = &subplots[2 * parameter_idx];

            let mut chart = ChartBuilder::on(area)
                .margin(5)
                .caption(format!("{parameter} (posterior)"), ("sans-serif", 30))
                .set_label_area_size(LabelAreaPosition::Left, 60)
                .set_label_area_size(LabelAreaPosition::Bottom, 30)
                .set_label_area_size(LabelAreaPosition::Right, 60)
                .build_cartesian_2d((min_..max_).step(step).use_round(), 0..max_height)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .y_desc("Count")
                .y_label_style(TextStyle::from(("sans-serif", 20)).color(&BLACK))
                .x_label_style(TextStyle::from(("sans-serif", 20)).color(&BLACK))
                .draw()?;

            for (chain, param_trace) in param_traces.iter().enumerate() {
                let color = colors[chain % colors.len()];
                let style = color.mix(0.2).filled();

                let actual = Histogram::vertical(&chart)
                    .style(style)
                    .data(param_trace.iter().map(|x| (*x, 1)));

                chart
                    .draw_series(actual)?
                    .label(format!("Chain {chain}"))
                    .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], style));
            }
            chart.configure_series_labels().draw()?;

            // plot the trace
            let mut chart = ChartBuilder::on(&subplots[2 * parameter_idx + 1])
                .margin(5)
                .caption(format!("{parameter} (trace)"), ("sans-serif", 30))
                .x_label_area_size(30)
                .y_label_area_size(30)
                .set_label_area_size(LabelAreaPosition::Right, 60)
                .set_label_area_size(LabelAreaPosition::Bottom, 30)
                .build_cartesian_2d(0f64..self.samples as f64, min_..max_)?;

            chart
                .configure_mesh()
                .x_labels(3)
                .y_labels(3)
                .x_label_style(TextStyle::from(("sans-serif", 20)).color(&BLACK))
                .y_label_style(TextStyle::from(("sans-serif", 20)).color(&BLACK))
                .draw()?;

            for (chain, param_trace) in param_traces.iter().enumerate() {
                let color = colors[chain % colors.len()];

                chart
                    .draw_series(LineSeries::new(
                        param_trace
                            .iter()
                            .enumerate()
                            .map(|(i, x)| (i as f64, *x)),
                        Into::<ShapeStyle>::into(color).stroke_width(1),
                    ))?
                    .label(format!("Chain {chain}"))
                    .legend(move |(x, y)| {
                        Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                    });
            }

            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }

        root.present()?;
        Ok(())
    }
}

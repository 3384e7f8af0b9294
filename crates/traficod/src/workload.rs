//! Skewed workload synthesis and sequential replay
//!
//! The generator assigns skew to an index into the population list, so the
//! population is shuffled once up front; otherwise whichever ids happen to
//! sort first would soak up the skewed mass. The same shuffled population
//! and sample sequence are reused for the replay and for the run artifacts.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, Normal, Zeta};
use serde::{Deserialize, Serialize};
use tracing::warn;
use traficostore::RecordKind;

use crate::lookup::LookupService;
use crate::metrics::{MetricsCollector, MetricsReport};

/// Access-skew models over population indices
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkewModel {
    /// Every index equally likely
    Uniform,
    /// Gaussian centered on the middle of the list; stddev is a fraction
    /// of the population size. Values are rounded and clipped into range.
    Normal {
        /// Standard deviation as a fraction of the population size
        stddev_frac: f64,
    },
    /// Zeta-law rank `r >= 1` aliased into range as `(r - 1) mod n`.
    /// Ranks beyond the population size wrap back to the front of the
    /// list instead of being rejected.
    Zipf {
        /// Shape parameter `a > 1`
        exponent: f64,
    },
}

/// One request to replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSample {
    /// Record kind to query
    #[serde(rename = "tipo")]
    pub kind: RecordKind,
    /// Raw id, as the caller would supply it
    #[serde(rename = "uuid")]
    pub id: String,
}

/// Builds reproducible skewed request sequences over a fixed population
pub struct WorkloadGenerator {
    population: Vec<WorkloadSample>,
    rng: ChaCha8Rng,
}

impl WorkloadGenerator {
    /// Snapshot the id population from the service's listing capability,
    /// shuffled once with the seeded RNG
    pub fn from_service(service: &LookupService, seed: u64) -> Result<Self> {
        let mut population = Vec::new();
        for kind in RecordKind::ALL {
            for id in service
                .list_ids(kind)
                .with_context(|| format!("listing {} ids", kind))?
            {
                population.push(WorkloadSample {
                    kind,
                    id: id.to_string(),
                });
            }
        }
        Ok(Self::from_population(population, seed))
    }

    /// Build over an explicit population, shuffled once
    pub fn from_population(mut population: Vec<WorkloadSample>, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        population.shuffle(&mut rng);
        Self { population, rng }
    }

    /// The shuffled population, immutable for the generator's lifetime
    pub fn population(&self) -> &[WorkloadSample] {
        &self.population
    }

    /// Draw `count` population indices under the given skew model
    pub fn sample_indices(&mut self, model: SkewModel, count: usize) -> Result<Vec<usize>> {
        let n = self.population.len();
        if n == 0 {
            return Err(anyhow!("population is empty"));
        }

        let indices = match model {
            SkewModel::Uniform => (0..count).map(|_| self.rng.gen_range(0..n)).collect(),

            SkewModel::Normal { stddev_frac } => {
                let dist = Normal::new(n as f64 / 2.0, stddev_frac * n as f64)
                    .map_err(|e| anyhow!("bad normal parameters: {}", e))?;
                (0..count)
                    .map(|_| {
                        let v = dist.sample(&mut self.rng).round();
                        v.clamp(0.0, (n - 1) as f64) as usize
                    })
                    .collect()
            }

            SkewModel::Zipf { exponent } => {
                let dist = Zeta::new(exponent)
                    .map_err(|e| anyhow!("bad zipf exponent {}: {}", exponent, e))?;
                (0..count)
                    .map(|_| {
                        let r = dist.sample(&mut self.rng);
                        // Unbounded rank, aliased back into the list
                        let rank = if r.is_finite() { r as u64 } else { u64::MAX };
                        ((rank - 1) % n as u64) as usize
                    })
                    .collect()
            }
        };

        Ok(indices)
    }

    /// Materialize a request sequence under the given skew model
    pub fn generate(&mut self, model: SkewModel, count: usize) -> Result<Vec<WorkloadSample>> {
        let indices = self.sample_indices(model, count)?;
        Ok(indices
            .into_iter()
            .map(|i| self.population[i].clone())
            .collect())
    }

    /// Replay samples sequentially against the lookup path
    ///
    /// One outstanding request at a time. A failed request is recorded as
    /// an error and the run continues. With `delay_mean_ms > 0`, an
    /// exponentially distributed pause is slept between requests.
    pub fn replay(
        &mut self,
        service: &LookupService,
        samples: &[WorkloadSample],
        delay_mean_ms: f64,
    ) -> Result<MetricsReport> {
        let delay = if delay_mean_ms > 0.0 {
            Some(
                Exp::new(1.0 / delay_mean_ms)
                    .map_err(|e| anyhow!("bad delay mean {}: {}", delay_mean_ms, e))?,
            )
        } else {
            None
        };

        let mut metrics = MetricsCollector::new();

        for sample in samples {
            match service.lookup(sample.kind, &sample.id) {
                Ok(outcome) => metrics.record(&outcome),
                Err(e) => {
                    warn!("lookup of {}:{} failed: {}", sample.kind, sample.id, e);
                    metrics.record_error();
                }
            }

            if let Some(dist) = &delay {
                let ms = dist.sample(&mut self.rng);
                std::thread::sleep(Duration::from_secs_f64(ms / 1000.0));
            }
        }

        Ok(metrics.finish())
    }
}

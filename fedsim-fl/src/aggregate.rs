//! Sample-weighted parameter aggregation.

use fedsim_model::{ParamError, ParameterSet};
use ndarray::{ArrayD, IxDyn};
use thiserror::Error;
use tracing::debug;

/// Failures that abort a round's aggregation.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// No contributions were collected.
    #[error("no contributions to aggregate")]
    NoContributions,

    /// The combined sample count is zero; weights would be undefined.
    #[error("total sample count is zero")]
    ZeroSamples,

    /// A contribution's manifest disagrees with the first contribution's.
    #[error("contribution {index} has an incompatible layout: {source}")]
    IncompatibleLayout {
        /// Position of the offending contribution.
        index: usize,
        /// The manifest disagreement.
        #[source]
        source: ParamError,
    },

    /// The aggregated arrays violate the common layout.
    #[error("aggregation produced an invalid parameter set: {0}")]
    Layout(#[from] ParamError),
}

/// Combines parameter snapshots into one, weighting each contribution by
/// its sample count.
///
/// For each positional array `i`, the result is
/// `sum_j arrays_j[i] * samples_j / total_samples`: a client with more
/// local data has proportionally more influence; this is not an arithmetic
/// mean across clients. The sum is commutative, so the result does not
/// depend on the order of `results`. Inputs are never mutated.
///
/// # Errors
/// - [`AggregationError::NoContributions`] when `results` is empty,
/// - [`AggregationError::ZeroSamples`] when `total_samples` is zero,
/// - [`AggregationError::IncompatibleLayout`] when the contributions do not
///   share one manifest.
pub fn aggregate(
    results: &[(ParameterSet, usize)],
    total_samples: usize,
) -> Result<ParameterSet, AggregationError> {
    let (first, _) = results.first().ok_or(AggregationError::NoContributions)?;
    if total_samples == 0 {
        return Err(AggregationError::ZeroSamples);
    }

    let layout = first.layout().clone();
    for (index, (set, _)) in results.iter().enumerate().skip(1) {
        layout
            .ensure_matches(set.layout())
            .map_err(|source| AggregationError::IncompatibleLayout { index, source })?;
    }

    let mut accumulators: Vec<ArrayD<f32>> = layout
        .specs()
        .iter()
        .map(|spec| ArrayD::zeros(IxDyn(&spec.shape)))
        .collect();

    for (set, samples) in results {
        let weight = *samples as f32;
        for (accumulator, array) in accumulators.iter_mut().zip(set.arrays()) {
            accumulator.scaled_add(weight, array);
        }
    }
    let total = total_samples as f32;
    for accumulator in &mut accumulators {
        accumulator.mapv_inplace(|x| x / total);
    }

    debug!(
        contributions = results.len(),
        total_samples, "aggregated parameter snapshots"
    );

    Ok(ParameterSet::new(layout, accumulators)?)
}

//! Parameter exchange format: ordered named arrays behind a shape manifest.
//!
//! Clients and the coordinator exchange full parameter snapshots and nothing
//! else. Positional correspondence between arrays is load-bearing, so the
//! sequence is wrapped in a value type that carries an explicit name/shape
//! manifest and validates it on construction and on every load: a silent
//! mismatch becomes a testable precondition failure instead of a crash deep
//! in numeric code.

use std::fmt;

use ndarray::{Array1, Array2, ArrayD, Ix1, Ix2};
use thiserror::Error;

/// Errors raised when a parameter sequence disagrees with its manifest.
#[derive(Debug, Error)]
pub enum ParamError {
    /// The number of arrays differs from the manifest.
    #[error("parameter count mismatch: expected {expected}, got {got}")]
    ArityMismatch {
        /// Number of entries the manifest promises.
        expected: usize,
        /// Number of arrays actually present.
        got: usize,
    },

    /// One positional entry has the wrong name or shape.
    #[error("parameter {index} mismatch: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Position of the offending entry.
        index: usize,
        /// Manifest entry at that position.
        expected: ParamSpec,
        /// Observed entry at that position.
        got: ParamSpec,
    },

    /// A typed accessor was used on an entry of different rank.
    #[error("parameter '{name}' has rank {got}, expected rank {expected}")]
    Rank {
        /// Name of the entry.
        name: String,
        /// Rank the accessor requires.
        expected: usize,
        /// Rank recorded in the manifest.
        got: usize,
    },
}

/// One manifest entry: the name and shape of a parameter array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    /// Parameter name, matching the model's state ordering.
    pub name: String,
    /// Array shape.
    pub shape: Vec<usize>,
}

impl ParamSpec {
    /// Creates a manifest entry.
    pub fn new(name: impl Into<String>, shape: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }
}

impl fmt::Display for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.name, self.shape)
    }
}

/// The ordered name/shape manifest of a model's trainable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterLayout {
    specs: Vec<ParamSpec>,
}

impl ParameterLayout {
    /// Creates a layout from ordered manifest entries.
    pub fn new(specs: Vec<ParamSpec>) -> Self {
        Self { specs }
    }

    /// Returns the manifest entries.
    pub fn specs(&self) -> &[ParamSpec] {
        &self.specs
    }

    /// Returns the number of parameter arrays.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns true if the layout holds no entries.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Returns the total number of scalar parameters.
    pub fn total_elements(&self) -> usize {
        self.specs
            .iter()
            .map(|s| s.shape.iter().product::<usize>())
            .sum()
    }

    /// Checks that `other` is positionally identical to this layout.
    ///
    /// # Errors
    /// Returns the first arity or per-entry mismatch.
    pub fn ensure_matches(&self, other: &ParameterLayout) -> Result<(), ParamError> {
        if self.specs.len() != other.specs.len() {
            return Err(ParamError::ArityMismatch {
                expected: self.specs.len(),
                got: other.specs.len(),
            });
        }
        for (index, (expected, got)) in self.specs.iter().zip(&other.specs).enumerate() {
            if expected != got {
                return Err(ParamError::ShapeMismatch {
                    index,
                    expected: expected.clone(),
                    got: got.clone(),
                });
            }
        }
        Ok(())
    }

    /// Checks that `arrays` matches this manifest entry by entry.
    ///
    /// # Errors
    /// Returns the first arity or shape mismatch.
    pub fn validate(&self, arrays: &[ArrayD<f32>]) -> Result<(), ParamError> {
        if arrays.len() != self.specs.len() {
            return Err(ParamError::ArityMismatch {
                expected: self.specs.len(),
                got: arrays.len(),
            });
        }
        for (index, (spec, array)) in self.specs.iter().zip(arrays).enumerate() {
            if array.shape() != spec.shape.as_slice() {
                return Err(ParamError::ShapeMismatch {
                    index,
                    expected: spec.clone(),
                    got: ParamSpec::new(spec.name.clone(), array.shape().to_vec()),
                });
            }
        }
        Ok(())
    }
}

/// An immutable, ordered sequence of named parameter arrays.
///
/// Invariant: array count, shapes and name order are identical across every
/// client and the global model at all times; construction through
/// [`ParameterSet::new`] is the only way to obtain one.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    layout: ParameterLayout,
    arrays: Vec<ArrayD<f32>>,
}

impl ParameterSet {
    /// Creates a parameter set, validating `arrays` against `layout`.
    ///
    /// # Errors
    /// Returns [`ParamError`] when the arrays disagree with the manifest.
    pub fn new(layout: ParameterLayout, arrays: Vec<ArrayD<f32>>) -> Result<Self, ParamError> {
        layout.validate(&arrays)?;
        Ok(Self { layout, arrays })
    }

    /// Returns the manifest.
    pub fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    /// Returns the arrays in manifest order.
    pub fn arrays(&self) -> &[ArrayD<f32>] {
        &self.arrays
    }

    /// Returns the number of parameter arrays.
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    /// Returns true if the set holds no arrays.
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Looks up an array by parameter name.
    pub fn get(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.layout
            .specs
            .iter()
            .position(|s| s.name == name)
            .map(|i| &self.arrays[i])
    }

    /// Returns the entry at `index` as a matrix.
    ///
    /// # Errors
    /// Returns [`ParamError::Rank`] when the entry is not 2-dimensional, or
    /// an arity error when `index` is out of bounds.
    pub fn matrix(&self, index: usize) -> Result<Array2<f32>, ParamError> {
        let (spec, array) = self.entry(index)?;
        array
            .view()
            .into_dimensionality::<Ix2>()
            .map(|v| v.to_owned())
            .map_err(|_| ParamError::Rank {
                name: spec.name.clone(),
                expected: 2,
                got: spec.shape.len(),
            })
    }

    /// Returns the entry at `index` as a vector.
    ///
    /// # Errors
    /// Returns [`ParamError::Rank`] when the entry is not 1-dimensional, or
    /// an arity error when `index` is out of bounds.
    pub fn vector(&self, index: usize) -> Result<Array1<f32>, ParamError> {
        let (spec, array) = self.entry(index)?;
        array
            .view()
            .into_dimensionality::<Ix1>()
            .map(|v| v.to_owned())
            .map_err(|_| ParamError::Rank {
                name: spec.name.clone(),
                expected: 1,
                got: spec.shape.len(),
            })
    }

    fn entry(&self, index: usize) -> Result<(&ParamSpec, &ArrayD<f32>), ParamError> {
        match (self.layout.specs.get(index), self.arrays.get(index)) {
            (Some(spec), Some(array)) => Ok((spec, array)),
            _ => Err(ParamError::ArityMismatch {
                expected: index + 1,
                got: self.arrays.len(),
            }),
        }
    }
}

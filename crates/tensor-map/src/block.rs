// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Blocks: one array with labeled axes, plus named gradient sub-blocks.
//!
//! # Builder
//!
//! Gradients are attached before a block is sealed:
//!
//! ```text
//! BlockBuilder           values + axes validated, gradients accumulate.
//!       │  .build()
//!       ▼
//! Block                  immutable, safe to share across tensor maps.
//! ```
//!
//! `add_gradient` takes `&mut self`, so the single-writer rule holds at
//! compile time and a sealed block can never change under an alias.

use crate::{Labels, TensorMapError};
use array_core::{Array, ArrayData, ArrayError};
use std::fmt;
use tracing::debug;

/// Name of the gradient sample column pointing back at parent sample rows.
pub const GRADIENT_SAMPLE: &str = "sample";

/// One array with labeled samples, components and properties axes.
///
/// Cloning a block shares the value and gradient storage; [`Block::copy`]
/// produces an independent deep copy.
#[derive(Debug, Clone)]
pub struct Block {
    values: Array,
    samples: Labels,
    components: Vec<Labels>,
    properties: Labels,
    /// Gradient sub-blocks in insertion order.
    gradients: Vec<(String, Block)>,
}

impl Block {
    /// Creates a block without gradients.
    ///
    /// # Errors
    /// Returns [`TensorMapError::ShapeMismatch`] if the array rank is not
    /// `2 + components.len()` or any extent differs from the length of its
    /// label set.
    pub fn new(
        values: impl Into<Array>,
        samples: Labels,
        components: Vec<Labels>,
        properties: Labels,
    ) -> Result<Self, TensorMapError> {
        let values = values.into();
        let shape = values.shape();
        let expected: Vec<usize> = std::iter::once(samples.len())
            .chain(components.iter().map(Labels::len))
            .chain(std::iter::once(properties.len()))
            .collect();
        if shape != expected.as_slice() {
            return Err(TensorMapError::ShapeMismatch(format!(
                "values have shape {shape:?} but the labels describe {expected:?}"
            )));
        }
        Ok(Self {
            values,
            samples,
            components,
            properties,
            gradients: Vec::new(),
        })
    }

    /// Starts building a block that will carry gradients.
    pub fn builder(
        values: impl Into<Array>,
        samples: Labels,
        components: Vec<Labels>,
        properties: Labels,
    ) -> Result<BlockBuilder, TensorMapError> {
        Ok(BlockBuilder {
            block: Self::new(values, samples, components, properties)?,
        })
    }

    /// Reopens the block to attach further gradients.
    pub fn into_builder(self) -> BlockBuilder {
        BlockBuilder { block: self }
    }

    /// A block with the same axes and new values, without gradients.
    pub fn with_values(&self, values: impl Into<Array>) -> Result<Block, TensorMapError> {
        Self::new(
            values,
            self.samples.clone(),
            self.components.clone(),
            self.properties.clone(),
        )
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn values(&self) -> &Array {
        &self.values
    }

    pub fn samples(&self) -> &Labels {
        &self.samples
    }

    pub fn components(&self) -> &[Labels] {
        &self.components
    }

    pub fn properties(&self) -> &Labels {
        &self.properties
    }

    /// Mutable access to the concrete value array.
    ///
    /// # Errors
    /// - [`TensorMapError::Aliased`] if another block shares the storage.
    /// - [`TensorMapError::Array`] if the values are not of type `T`.
    pub fn values_mut<T: ArrayData>(&mut self) -> Result<&mut T, TensorMapError> {
        if self.values.is_shared() {
            return Err(TensorMapError::Aliased);
        }
        let origin = self.values.type_name();
        self.values.get_mut::<T>().ok_or_else(|| {
            ArrayError::UnsupportedBackend {
                op: "values_mut",
                origin: origin.to_string(),
            }
            .into()
        })
    }

    /// The gradient with respect to `parameter`.
    pub fn gradient(&self, parameter: &str) -> Result<&Block, TensorMapError> {
        self.gradients
            .iter()
            .find(|(name, _)| name == parameter)
            .map(|(_, gradient)| gradient)
            .ok_or_else(|| TensorMapError::GradientNotFound(parameter.to_string()))
    }

    /// Iterates over `(parameter, gradient)` pairs in insertion order.
    pub fn gradients(&self) -> impl ExactSizeIterator<Item = (&str, &Block)> + '_ {
        self.gradients.iter().map(|(name, block)| (name.as_str(), block))
    }

    pub fn has_gradient(&self, parameter: &str) -> bool {
        self.gradients.iter().any(|(name, _)| name == parameter)
    }

    pub fn gradient_names(&self) -> Vec<&str> {
        self.gradients.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// The same block with every gradient removed; storage is shared.
    pub fn without_gradients(&self) -> Block {
        Block {
            gradients: Vec::new(),
            ..self.clone()
        }
    }

    // ── Storage ──────────────────────────────────────────────────

    /// Deep copy of the values and every gradient.
    pub fn copy(&self) -> Result<Block, TensorMapError> {
        let gradients = self
            .gradients
            .iter()
            .map(|(name, gradient)| Ok((name.clone(), gradient.copy()?)))
            .collect::<Result<_, TensorMapError>>()?;
        Ok(Block {
            values: self.values.copy()?,
            samples: self.samples.clone(),
            components: self.components.clone(),
            properties: self.properties.clone(),
            gradients,
        })
    }

    /// Whether the values and every gradient are stored contiguously.
    pub fn is_contiguous(&self) -> Result<bool, TensorMapError> {
        if !self.values.is_contiguous()? {
            return Ok(false);
        }
        for (_, gradient) in &self.gradients {
            if !gradient.is_contiguous()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// A block whose values and gradients are all contiguous.
    pub fn to_contiguous(&self) -> Result<Block, TensorMapError> {
        let gradients = self
            .gradients
            .iter()
            .map(|(name, gradient)| Ok((name.clone(), gradient.to_contiguous()?)))
            .collect::<Result<_, TensorMapError>>()?;
        Ok(Block {
            values: self.values.make_contiguous()?,
            gradients,
            ..self.without_gradients()
        })
    }

    /// Renders this block as the gradient `parameter` of some parent.
    pub fn gradient_summary(&self, parameter: &str) -> String {
        format!(
            "Gradient TensorBlock\nparameter: '{parameter}'\n{}\n{}\n{}",
            axis_summary("samples", &[&self.samples]),
            self.components_summary(),
            axis_summary("properties", &[&self.properties]),
        )
    }

    fn components_summary(&self) -> String {
        let refs: Vec<&Labels> = self.components.iter().collect();
        axis_summary("components", &refs)
    }
}

/// `"{role} ({len, ...}): ['name', ...]"`
fn axis_summary(role: &str, labels: &[&Labels]) -> String {
    let lens: Vec<String> = labels.iter().map(|l| l.len().to_string()).collect();
    let names: Vec<String> = labels
        .iter()
        .flat_map(|l| l.names().iter().map(|n| format!("'{n}'")))
        .collect();
    format!("{role} ({}): [{}]", lens.join(", "), names.join(", "))
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TensorBlock")?;
        writeln!(f, "    {}", axis_summary("samples", &[&self.samples]))?;
        writeln!(f, "    {}", self.components_summary())?;
        writeln!(f, "    {}", axis_summary("properties", &[&self.properties]))?;
        if self.gradients.is_empty() {
            write!(f, "    gradients: no")
        } else {
            let names: Vec<String> = self.gradients.iter().map(|(n, _)| format!("'{n}'")).collect();
            write!(f, "    gradients: [{}]", names.join(", "))
        }
    }
}

// ── BlockBuilder ───────────────────────────────────────────────────

/// Accumulates gradients before sealing a [`Block`].
#[derive(Debug)]
pub struct BlockBuilder {
    block: Block,
}

impl BlockBuilder {
    /// Attaches the gradient with respect to `parameter`.
    ///
    /// # Checks
    /// - No gradient called `parameter` exists yet.
    /// - The gradient has no gradients of its own.
    /// - Its first sample column is `sample`, and every value of that column
    ///   is a valid row of the parent samples.
    /// - Its properties are identical to the parent's, and its components
    ///   end with the parent's components. Extra leading components (e.g. a
    ///   Cartesian direction) are allowed.
    pub fn add_gradient(
        &mut self,
        parameter: &str,
        gradient: Block,
    ) -> Result<&mut Self, TensorMapError> {
        let parent = &self.block;
        if parent.has_gradient(parameter) {
            return Err(TensorMapError::DuplicateGradient(parameter.to_string()));
        }
        if !gradient.gradients.is_empty() {
            return Err(TensorMapError::InvalidGradient {
                parameter: parameter.to_string(),
                detail: "gradient blocks cannot have gradients of their own".into(),
            });
        }

        let samples = gradient.samples();
        match samples.names().first() {
            Some(first) if first == GRADIENT_SAMPLE => {}
            Some(first) => {
                return Err(TensorMapError::InvalidGradientSamples {
                    parameter: parameter.to_string(),
                    detail: format!(
                        "first dimension must be named '{GRADIENT_SAMPLE}', we got '{first}'"
                    ),
                })
            }
            None => {
                return Err(TensorMapError::InvalidGradientSamples {
                    parameter: parameter.to_string(),
                    detail: format!(
                        "must have at least one dimension named '{GRADIENT_SAMPLE}', we got none"
                    ),
                })
            }
        }
        let n_parent = parent.samples.len();
        if let Some(row) = samples
            .iter()
            .find(|row| usize::try_from(row[0]).map_or(true, |s| s >= n_parent))
        {
            return Err(TensorMapError::InvalidGradientSamples {
                parameter: parameter.to_string(),
                detail: format!(
                    "sample {} is out of range for a parent with {n_parent} samples",
                    row[0]
                ),
            });
        }

        if !gradient.properties.is_identical(&parent.properties) {
            return Err(TensorMapError::SchemaMismatch(format!(
                "gradient '{parameter}' properties differ from the block properties"
            )));
        }
        let extra = gradient.components.len().checked_sub(parent.components.len());
        let components_match = extra.is_some_and(|extra| {
            gradient.components[extra..]
                .iter()
                .zip(&parent.components)
                .all(|(g, p)| g.is_identical(p))
        });
        if !components_match {
            return Err(TensorMapError::SchemaMismatch(format!(
                "gradient '{parameter}' components must end with the block components"
            )));
        }

        debug!(parameter, rows = samples.len(), "attaching gradient");
        self.block.gradients.push((parameter.to_string(), gradient));
        Ok(self)
    }

    /// Seals the block.
    pub fn build(self) -> Block {
        self.block
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Metadata equality with a structured mismatch report.
//!
//! Comparisons are order-sensitive, since block values are positionally
//! aligned to their labels, but a reordering is reported as
//! [`LabelsComparison::Permuted`] rather than as a plain difference.

use crate::OpsError;
use std::fmt;
use tensor_map::{Block, Labels, LabelsComparison, TensorMap};

/// One aspect of block metadata to compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataCheck {
    Samples,
    Components,
    Properties,
    /// Gradient names, and the samples, components and properties of every
    /// gradient.
    Gradients,
}

impl MetadataCheck {
    pub const ALL: [MetadataCheck; 4] = [
        MetadataCheck::Samples,
        MetadataCheck::Components,
        MetadataCheck::Properties,
        MetadataCheck::Gradients,
    ];
}

/// What differs for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchKind {
    /// The two maps do not use the same key names.
    KeyNames,
    /// The key exists only in the second map.
    MissingInFirst,
    /// The key exists only in the first map.
    MissingInSecond,
    Samples(LabelsComparison),
    /// Component axes differ; a different number of axes is `Different`.
    Components(LabelsComparison),
    Properties(LabelsComparison),
    /// The blocks have different sets of gradients.
    GradientNames,
}

/// A single mismatch, located by key and optionally by gradient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Key of the block; empty when comparing bare blocks or key names.
    pub key: Vec<i32>,
    /// Gradient parameter, when the mismatch is inside a gradient.
    pub gradient: Option<String>,
    pub kind: MismatchKind,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key {:?}", self.key)?;
        if let Some(parameter) = &self.gradient {
            write!(f, " gradient '{parameter}'")?;
        }
        match &self.kind {
            MismatchKind::KeyNames => write!(f, ": key names differ"),
            MismatchKind::MissingInFirst => write!(f, ": missing in the first tensor map"),
            MismatchKind::MissingInSecond => write!(f, ": missing in the second tensor map"),
            MismatchKind::Samples(c) => write!(f, ": samples are {}", describe(*c)),
            MismatchKind::Components(c) => write!(f, ": components are {}", describe(*c)),
            MismatchKind::Properties(c) => write!(f, ": properties are {}", describe(*c)),
            MismatchKind::GradientNames => write!(f, ": gradient names differ"),
        }
    }
}

fn describe(comparison: LabelsComparison) -> &'static str {
    match comparison {
        LabelsComparison::Identical => "identical",
        LabelsComparison::Permuted => "the same rows in a different order",
        LabelsComparison::Different => "different",
    }
}

/// Every metadata mismatch found by [`equal_metadata`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataReport {
    mismatches: Vec<Mismatch>,
}

impl MetadataReport {
    /// Whether no mismatch was found.
    pub fn is_empty(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    /// Keys with at least one mismatch, each listed once, in report order.
    pub fn keys(&self) -> Vec<&[i32]> {
        let mut keys: Vec<&[i32]> = Vec::new();
        for m in &self.mismatches {
            if !keys.contains(&m.key.as_slice()) {
                keys.push(&m.key);
            }
        }
        keys
    }

    fn push(&mut self, key: &[i32], gradient: Option<&str>, kind: MismatchKind) {
        self.mismatches.push(Mismatch {
            key: key.to_vec(),
            gradient: gradient.map(str::to_string),
            kind,
        });
    }
}

impl fmt::Display for MetadataReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "no mismatch");
        }
        let lines: Vec<String> = self.mismatches.iter().map(Mismatch::to_string).collect();
        write!(f, "{}", lines.join("; "))
    }
}

fn compare_components(first: &[Labels], second: &[Labels]) -> LabelsComparison {
    if first.len() != second.len() {
        return LabelsComparison::Different;
    }
    first
        .iter()
        .zip(second)
        .map(|(a, b)| a.compare(b))
        .fold(LabelsComparison::Identical, |acc, c| match (acc, c) {
            (LabelsComparison::Different, _) | (_, LabelsComparison::Different) => {
                LabelsComparison::Different
            }
            (LabelsComparison::Permuted, _) | (_, LabelsComparison::Permuted) => {
                LabelsComparison::Permuted
            }
            _ => LabelsComparison::Identical,
        })
}

/// Which axes [`compare_axes`] looks at.
#[derive(Clone, Copy)]
struct Axes {
    samples: bool,
    components: bool,
    properties: bool,
}

/// Compares the axes of two blocks, without looking at gradients.
fn compare_axes(
    report: &mut MetadataReport,
    key: &[i32],
    gradient: Option<&str>,
    (first, second): (&Block, &Block),
    axes: Axes,
) {
    if axes.samples {
        let c = first.samples().compare(second.samples());
        if c != LabelsComparison::Identical {
            report.push(key, gradient, MismatchKind::Samples(c));
        }
    }
    if axes.components {
        let c = compare_components(first.components(), second.components());
        if c != LabelsComparison::Identical {
            report.push(key, gradient, MismatchKind::Components(c));
        }
    }
    if axes.properties {
        let c = first.properties().compare(second.properties());
        if c != LabelsComparison::Identical {
            report.push(key, gradient, MismatchKind::Properties(c));
        }
    }
}

fn compare_blocks(
    report: &mut MetadataReport,
    key: &[i32],
    first: &Block,
    second: &Block,
    checks: &[MetadataCheck],
) {
    let axes = Axes {
        samples: checks.contains(&MetadataCheck::Samples),
        components: checks.contains(&MetadataCheck::Components),
        properties: checks.contains(&MetadataCheck::Properties),
    };
    compare_axes(report, key, None, (first, second), axes);

    if !checks.contains(&MetadataCheck::Gradients) {
        return;
    }
    let mut a = first.gradient_names();
    let mut b = second.gradient_names();
    a.sort_unstable();
    b.sort_unstable();
    if a != b {
        report.push(key, None, MismatchKind::GradientNames);
        return;
    }
    for (parameter, gradient) in first.gradients() {
        if let Ok(other) = second.gradient(parameter) {
            let all = Axes {
                samples: true,
                components: true,
                properties: true,
            };
            compare_axes(report, key, Some(parameter), (gradient, other), all);
        }
    }
}

/// Compares the metadata of every key present in either map.
///
/// Keys missing from one side are reported, not skipped. Only the aspects
/// listed in `checks` are compared.
pub fn equal_metadata(
    first: &TensorMap,
    second: &TensorMap,
    checks: &[MetadataCheck],
) -> MetadataReport {
    let mut report = MetadataReport::default();
    if first.keys().names() != second.keys().names() {
        report.push(&[], None, MismatchKind::KeyNames);
        return report;
    }

    for (key, block) in first.iter() {
        match second.block(key) {
            Ok(other) => compare_blocks(&mut report, key, block, other, checks),
            Err(_) => report.push(key, None, MismatchKind::MissingInSecond),
        }
    }
    for key in second.keys().iter() {
        if !first.keys().contains(key) {
            report.push(key, None, MismatchKind::MissingInFirst);
        }
    }
    report
}

/// Like [`equal_metadata`], failing with [`OpsError::MetadataMismatch`].
pub fn equal_metadata_raise(
    first: &TensorMap,
    second: &TensorMap,
    checks: &[MetadataCheck],
) -> Result<(), OpsError> {
    let report = equal_metadata(first, second, checks);
    if report.is_empty() {
        Ok(())
    } else {
        Err(OpsError::MetadataMismatch(report))
    }
}

/// Compares the metadata of two blocks. Mismatches carry an empty key.
pub fn equal_metadata_block(first: &Block, second: &Block, checks: &[MetadataCheck]) -> MetadataReport {
    let mut report = MetadataReport::default();
    compare_blocks(&mut report, &[], first, second, checks);
    report
}

/// Like [`equal_metadata_block`], failing with [`OpsError::MetadataMismatch`].
pub fn equal_metadata_block_raise(
    first: &Block,
    second: &Block,
    checks: &[MetadataCheck],
) -> Result<(), OpsError> {
    let report = equal_metadata_block(first, second, checks);
    if report.is_empty() {
        Ok(())
    } else {
        Err(OpsError::MetadataMismatch(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use array_core::ndarray::{ArrayD, IxDyn};

    fn labels(name: &str, values: &[i32]) -> Labels {
        Labels::new([name], values.to_vec()).unwrap()
    }

    fn block(samples: &[i32], properties: &[i32]) -> Block {
        Block::new(
            ArrayD::<f64>::zeros(IxDyn(&[samples.len(), properties.len()])),
            labels("s", samples),
            vec![],
            labels("p", properties),
        )
        .unwrap()
    }

    #[test]
    fn test_identical_blocks() {
        let a = block(&[0, 1], &[0]);
        assert!(equal_metadata_block(&a, &a.clone(), &MetadataCheck::ALL).is_empty());
    }

    #[test]
    fn test_permuted_samples_reported() {
        let a = block(&[0, 1], &[0]);
        let b = block(&[1, 0], &[0]);
        let report = equal_metadata_block(&a, &b, &[MetadataCheck::Samples]);
        assert_eq!(
            report.mismatches()[0].kind,
            MismatchKind::Samples(LabelsComparison::Permuted)
        );
        assert!(equal_metadata_block(&a, &b, &[MetadataCheck::Properties]).is_empty());
    }

    #[test]
    fn test_missing_keys_reported() {
        let a = TensorMap::new(labels("k", &[0, 1]), vec![block(&[0], &[0]), block(&[0], &[0])])
            .unwrap();
        let b = TensorMap::new(labels("k", &[1, 2]), vec![block(&[0], &[0]), block(&[0], &[0])])
            .unwrap();
        let report = equal_metadata(&a, &b, &MetadataCheck::ALL);
        assert_eq!(report.keys(), vec![&[0][..], &[2][..]]);
        assert_eq!(report.mismatches()[0].kind, MismatchKind::MissingInSecond);
        assert_eq!(report.mismatches()[1].kind, MismatchKind::MissingInFirst);
    }

    #[test]
    fn test_key_names_differ() {
        let a = TensorMap::new(labels("k", &[0]), vec![block(&[0], &[0])]).unwrap();
        let b = TensorMap::new(labels("q", &[0]), vec![block(&[0], &[0])]).unwrap();
        let err = equal_metadata_raise(&a, &b, &MetadataCheck::ALL).unwrap_err();
        match err {
            OpsError::MetadataMismatch(report) => {
                assert_eq!(report.mismatches()[0].kind, MismatchKind::KeyNames)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_gradient_names_differ() {
        let mut builder = block(&[0], &[0]).into_builder();
        builder
            .add_gradient(
                "g",
                Block::new(
                    ArrayD::<f64>::zeros(IxDyn(&[1, 1])),
                    labels("sample", &[0]),
                    vec![],
                    labels("p", &[0]),
                )
                .unwrap(),
            )
            .unwrap();
        let with = builder.build();
        let without = block(&[0], &[0]);

        let report = equal_metadata_block(&with, &without, &MetadataCheck::ALL);
        assert_eq!(report.mismatches()[0].kind, MismatchKind::GradientNames);
        assert!(equal_metadata_block(&with, &without, &[MetadataCheck::Samples]).is_empty());
    }

    #[test]
    fn test_report_display() {
        let a = block(&[0, 1], &[0]);
        let b = block(&[0, 2], &[0]);
        let report = equal_metadata_block(&a, &b, &[MetadataCheck::Samples]);
        assert_eq!(report.to_string(), "key []: samples are different");
    }
}

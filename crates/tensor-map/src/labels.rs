// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Label sets: named columns of unique integer tuples indexing one axis.
//!
//! A [`Labels`] value is immutable. Operations that change an axis always
//! build a new label set, and clones share the same storage.
//!
//! # Equality
//!
//! There is deliberately no `PartialEq` on [`Labels`]. Call sites choose
//! between order-sensitive ([`Labels::is_identical`]) and set-wise
//! ([`Labels::is_same_set`]) equality, or use [`Labels::compare`] to tell
//! "same rows in another order" apart from "different rows".

use crate::TensorMapError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Outcome of comparing two label sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelsComparison {
    /// Same names and same rows in the same order.
    Identical,
    /// Same names and same rows, in a different order.
    Permuted,
    /// Different names, lengths, or rows.
    Different,
}

#[derive(Debug)]
struct Inner {
    names: Vec<String>,
    /// Row-major `count x names.len()` values.
    values: Vec<i32>,
    count: usize,
    positions: HashMap<Vec<i32>, usize>,
}

/// An ordered set of unique, fixed-arity `i32` tuples with named columns.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawLabels", into = "RawLabels")]
pub struct Labels {
    inner: Arc<Inner>,
}

/// Serialized form: names plus one array per row.
#[derive(serde::Serialize, serde::Deserialize)]
struct RawLabels {
    names: Vec<String>,
    values: Vec<Vec<i32>>,
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate_names<I>(names: I) -> Result<Vec<String>, TensorMapError>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    for (i, name) in names.iter().enumerate() {
        if !is_identifier(name) || names[..i].contains(name) {
            return Err(TensorMapError::InvalidName(name.clone()));
        }
    }
    Ok(names)
}

impl Labels {
    fn build(names: Vec<String>, values: Vec<i32>, count: usize) -> Result<Self, TensorMapError> {
        let size = names.len();
        let mut positions = HashMap::with_capacity(count);
        for i in 0..count {
            let row = values[i * size..(i + 1) * size].to_vec();
            if positions.contains_key(&row) {
                return Err(TensorMapError::DuplicateLabel { names, row });
            }
            positions.insert(row, i);
        }
        Ok(Self {
            inner: Arc::new(Inner {
                names,
                values,
                count,
                positions,
            }),
        })
    }

    /// Creates a label set from column names and row-major values.
    ///
    /// # Errors
    /// - [`TensorMapError::InvalidName`] on an empty, non-identifier, or
    ///   repeated name.
    /// - [`TensorMapError::ArityMismatch`] if `values.len()` is not a multiple
    ///   of the number of names.
    /// - [`TensorMapError::DuplicateLabel`] if a row appears twice.
    ///
    /// # Examples
    /// ```
    /// use tensor_map::Labels;
    /// let labels = Labels::new(["structure", "atom"], vec![0, 1, 0, 2]).unwrap();
    /// assert_eq!(labels.len(), 2);
    /// assert_eq!(labels.position(&[0, 2]), Some(1));
    /// ```
    pub fn new<I>(names: I, values: Vec<i32>) -> Result<Self, TensorMapError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let names = validate_names(names)?;
        let size = names.len();
        let count = match size {
            0 if values.is_empty() => 0,
            0 => {
                return Err(TensorMapError::ArityMismatch(format!(
                    "{} values for zero names",
                    values.len()
                )))
            }
            _ if values.len() % size != 0 => {
                return Err(TensorMapError::ArityMismatch(format!(
                    "{} values do not fit rows of {size} names",
                    values.len()
                )))
            }
            _ => values.len() / size,
        };
        Self::build(names, values, count)
    }

    /// Creates a label set from column names and one vector per row.
    pub fn from_rows<I>(names: I, rows: Vec<Vec<i32>>) -> Result<Self, TensorMapError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let names = validate_names(names)?;
        let size = names.len();
        let count = rows.len();
        let mut values = Vec::with_capacity(count * size);
        for row in rows {
            if row.len() != size {
                return Err(TensorMapError::ArityMismatch(format!(
                    "row {row:?} has {} values, expected {size}",
                    row.len()
                )));
            }
            values.extend(row);
        }
        Self::build(names, values, count)
    }

    /// Creates a label set with the given names and no rows.
    pub fn empty<I>(names: I) -> Result<Self, TensorMapError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::new(names, Vec::new())
    }

    /// The label set used for an axis that has been collapsed: one `_` column
    /// with the single row `[0]`.
    pub fn single() -> Self {
        let mut positions = HashMap::with_capacity(1);
        positions.insert(vec![0], 0);
        Self {
            inner: Arc::new(Inner {
                names: vec!["_".to_string()],
                values: vec![0],
                count: 1,
                positions,
            }),
        }
    }

    /// Creates a one-column label set with rows `0..n`.
    pub fn range(name: &str, n: usize) -> Result<Self, TensorMapError> {
        let end = i32::try_from(n).map_err(|_| {
            TensorMapError::ArityMismatch(format!("range of {n} does not fit in i32"))
        })?;
        Self::new([name], (0..end).collect())
    }

    // ── Queries ──────────────────────────────────────────────────

    pub fn names(&self) -> &[String] {
        &self.inner.names
    }

    /// Number of columns.
    pub fn size(&self) -> usize {
        self.inner.names.len()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.inner.count
    }

    pub fn is_empty(&self) -> bool {
        self.inner.count == 0
    }

    /// Returns row `i`.
    ///
    /// # Panics
    /// Panics if `i >= self.len()`.
    pub fn row(&self, i: usize) -> &[i32] {
        assert!(i < self.len(), "row {i} out of range for {} labels", self.len());
        let size = self.size();
        &self.inner.values[i * size..(i + 1) * size]
    }

    /// Returns row `i`, or `None` if out of range.
    pub fn get(&self, i: usize) -> Option<&[i32]> {
        (i < self.len()).then(|| self.row(i))
    }

    /// Iterates over rows in order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[i32]> + '_ {
        (0..self.len()).map(move |i| self.row(i))
    }

    /// Position of `row`, if present.
    pub fn position(&self, row: &[i32]) -> Option<usize> {
        self.inner.positions.get(row).copied()
    }

    pub fn contains(&self, row: &[i32]) -> bool {
        self.inner.positions.contains_key(row)
    }

    /// Index of the column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.inner.names.iter().position(|n| n == name)
    }

    /// Indices of several columns.
    ///
    /// # Errors
    /// Returns [`TensorMapError::SchemaMismatch`] for an unknown name.
    pub fn column_indices<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>, TensorMapError> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.column_index(name).ok_or_else(|| {
                    TensorMapError::SchemaMismatch(format!(
                        "'{name}' is not one of the label names {:?}",
                        self.names()
                    ))
                })
            })
            .collect()
    }

    /// Values of the column called `name`, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<i32>, TensorMapError> {
        let index = self.column_indices(&[name])?[0];
        Ok(self.iter().map(|row| row[index]).collect())
    }

    /// Rows restricted to the given columns, in row order. The result may
    /// contain repeated tuples.
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Vec<i32>>, TensorMapError> {
        let indices = self.column_indices(names)?;
        Ok(self
            .iter()
            .map(|row| indices.iter().map(|&i| row[i]).collect())
            .collect())
    }

    /// All rows as owned vectors.
    pub fn to_rows(&self) -> Vec<Vec<i32>> {
        self.iter().map(<[i32]>::to_vec).collect()
    }

    // ── Derived label sets ───────────────────────────────────────

    fn same_names(&self, op: &str, other: &Labels) -> Result<(), TensorMapError> {
        if self.names() != other.names() {
            return Err(TensorMapError::SchemaMismatch(format!(
                "cannot take the {op} of labels with names {:?} and {:?}",
                self.names(),
                other.names()
            )));
        }
        Ok(())
    }

    fn with_rows<'a>(&self, rows: impl Iterator<Item = &'a [i32]>) -> Self {
        let mut values = Vec::new();
        let mut count = 0;
        let mut positions = HashMap::new();
        for row in rows {
            if !positions.contains_key(row) {
                positions.insert(row.to_vec(), count);
                values.extend_from_slice(row);
                count += 1;
            }
        }
        Self {
            inner: Arc::new(Inner {
                names: self.inner.names.clone(),
                values,
                count,
                positions,
            }),
        }
    }

    /// Rows of `self` that are not in `other`, in the order of `self`.
    pub fn difference(&self, other: &Labels) -> Result<Labels, TensorMapError> {
        self.same_names("difference", other)?;
        Ok(self.with_rows(self.iter().filter(|row| !other.contains(row))))
    }

    /// Rows of `self` that are also in `other`, in the order of `self`.
    pub fn intersection(&self, other: &Labels) -> Result<Labels, TensorMapError> {
        self.same_names("intersection", other)?;
        Ok(self.with_rows(self.iter().filter(|row| other.contains(row))))
    }

    /// Rows of `self` followed by the rows of `other` not already present.
    pub fn union(&self, other: &Labels) -> Result<Labels, TensorMapError> {
        self.same_names("union", other)?;
        Ok(self.with_rows(self.iter().chain(other.iter())))
    }

    /// Sub-selection by row positions.
    ///
    /// # Errors
    /// - [`TensorMapError::ShapeMismatch`] for an out-of-range position.
    /// - [`TensorMapError::DuplicateLabel`] if a position is repeated.
    pub fn select(&self, positions: &[usize]) -> Result<Labels, TensorMapError> {
        let size = self.size();
        let mut values = Vec::with_capacity(positions.len() * size);
        for &i in positions {
            let row = self.get(i).ok_or_else(|| {
                TensorMapError::ShapeMismatch(format!(
                    "position {i} is out of range for {} labels",
                    self.len()
                ))
            })?;
            values.extend_from_slice(row);
        }
        Self::build(self.inner.names.clone(), values, positions.len())
    }

    /// The same rows in lexicographic order.
    pub fn sorted(&self) -> Labels {
        let mut rows: Vec<&[i32]> = self.iter().collect();
        rows.sort_unstable();
        self.with_rows(rows.into_iter())
    }

    /// Adds a leading column called `name` with one value per row.
    pub fn prepend_column(&self, name: &str, values: &[i32]) -> Result<Labels, TensorMapError> {
        if values.len() != self.len() {
            return Err(TensorMapError::ArityMismatch(format!(
                "{} values for a new column over {} rows",
                values.len(),
                self.len()
            )));
        }
        let names = std::iter::once(name.to_string()).chain(self.inner.names.iter().cloned());
        let rows = self
            .iter()
            .zip(values)
            .map(|(row, &v)| std::iter::once(v).chain(row.iter().copied()).collect())
            .collect();
        Self::from_rows(names, rows)
    }

    // ── Comparison ───────────────────────────────────────────────

    /// Compares names and rows, distinguishing a reordering from a real
    /// difference.
    pub fn compare(&self, other: &Labels) -> LabelsComparison {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return LabelsComparison::Identical;
        }
        if self.names() != other.names() || self.len() != other.len() {
            return LabelsComparison::Different;
        }
        if self.inner.values == other.inner.values {
            return LabelsComparison::Identical;
        }
        // Rows are unique and lengths match, so inclusion means equal sets.
        if self.iter().all(|row| other.contains(row)) {
            LabelsComparison::Permuted
        } else {
            LabelsComparison::Different
        }
    }

    /// Same names and same rows in the same order.
    pub fn is_identical(&self, other: &Labels) -> bool {
        self.compare(other) == LabelsComparison::Identical
    }

    /// Same names and same rows, in any order.
    pub fn is_same_set(&self, other: &Labels) -> bool {
        self.compare(other) != LabelsComparison::Different
    }
}

impl TryFrom<RawLabels> for Labels {
    type Error = TensorMapError;

    fn try_from(raw: RawLabels) -> Result<Self, Self::Error> {
        Labels::from_rows(raw.names, raw.values)
    }
}

impl From<Labels> for RawLabels {
    fn from(labels: Labels) -> Self {
        RawLabels {
            names: labels.names().to_vec(),
            values: labels.to_rows(),
        }
    }
}

impl fmt::Debug for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Labels")
            .field("names", &self.inner.names)
            .field("rows", &self.to_rows())
            .finish()
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths: Vec<usize> = self
            .names()
            .iter()
            .enumerate()
            .map(|(c, name)| {
                self.iter()
                    .map(|row| row[c].to_string().len())
                    .chain(std::iter::once(name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        writeln!(f, "Labels(")?;
        let header: Vec<String> = self
            .names()
            .iter()
            .zip(&widths)
            .map(|(name, &w)| format!("{name:>w$}"))
            .collect();
        writeln!(f, "    {}", header.join("  "))?;
        for row in self.iter() {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(v, &w)| format!("{v:>w$}"))
                .collect();
            writeln!(f, "    {}", cells.join("  "))?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn labels(names: &[&str], rows: &[&[i32]]) -> Labels {
        Labels::from_rows(names.iter().copied(), rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    #[test]
    fn test_construction_and_lookup() {
        let l = labels(&["structure", "atom"], &[&[0, 1], &[0, 2], &[1, 0]]);
        assert_eq!(l.names(), &["structure", "atom"]);
        assert_eq!(l.size(), 2);
        assert_eq!(l.len(), 3);
        assert_eq!(l.row(1), &[0, 2]);
        assert_eq!(l.position(&[1, 0]), Some(2));
        assert_eq!(l.position(&[3, 3]), None);
        assert!(l.contains(&[0, 1]));
        assert_eq!(l.column("atom").unwrap(), vec![1, 2, 0]);
    }

    #[test]
    fn test_duplicate_row_rejected() {
        let err = Labels::new(["a"], vec![1, 2, 1]).unwrap_err();
        assert!(matches!(err, TensorMapError::DuplicateLabel { row, .. } if row == vec![1]));
    }

    #[test]
    fn test_arity_mismatch() {
        assert!(matches!(
            Labels::new(["a", "b"], vec![1, 2, 3]),
            Err(TensorMapError::ArityMismatch(_))
        ));
        assert!(matches!(
            Labels::from_rows(["a", "b"], vec![vec![1]]),
            Err(TensorMapError::ArityMismatch(_))
        ));
    }

    #[test]
    fn test_invalid_names() {
        assert!(matches!(Labels::empty([""]), Err(TensorMapError::InvalidName(_))));
        assert!(matches!(Labels::empty(["1abc"]), Err(TensorMapError::InvalidName(_))));
        assert!(matches!(
            Labels::empty(["a", "a"]),
            Err(TensorMapError::InvalidName(n)) if n == "a"
        ));
        assert!(Labels::empty(["_private", "x1"]).is_ok());
    }

    #[test]
    fn test_zero_columns() {
        let l = Labels::empty(Vec::<String>::new()).unwrap();
        assert_eq!(l.size(), 0);
        assert!(l.is_empty());

        let one = Labels::from_rows(Vec::<String>::new(), vec![vec![]]).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one.row(0), &[] as &[i32]);
    }

    #[test]
    fn test_single_and_range() {
        let s = Labels::single();
        assert_eq!(s.names(), &["_"]);
        assert_eq!(s.to_rows(), vec![vec![0]]);

        let r = Labels::range("sample", 3).unwrap();
        assert_eq!(r.column("sample").unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_unknown_column() {
        let l = labels(&["a"], &[&[0]]);
        assert!(matches!(l.column("b"), Err(TensorMapError::SchemaMismatch(_))));
    }

    #[test]
    fn test_set_operations() {
        let a = labels(&["x"], &[&[0], &[1], &[2], &[3]]);
        let b = labels(&["x"], &[&[3], &[1], &[7]]);

        assert_eq!(a.difference(&b).unwrap().to_rows(), vec![vec![0], vec![2]]);
        assert_eq!(a.intersection(&b).unwrap().to_rows(), vec![vec![1], vec![3]]);
        assert_eq!(
            a.union(&b).unwrap().to_rows(),
            vec![vec![0], vec![1], vec![2], vec![3], vec![7]]
        );
    }

    #[test]
    fn test_set_operations_require_same_names() {
        let a = labels(&["x"], &[&[0]]);
        let b = labels(&["y"], &[&[0]]);
        assert!(matches!(a.difference(&b), Err(TensorMapError::SchemaMismatch(_))));
        assert!(matches!(a.intersection(&b), Err(TensorMapError::SchemaMismatch(_))));
        assert!(matches!(a.union(&b), Err(TensorMapError::SchemaMismatch(_))));
    }

    #[test]
    fn test_reversed_rows_are_permuted() {
        let a = labels(&["x", "y"], &[&[0, 1], &[1, 0]]);
        let b = labels(&["x", "y"], &[&[1, 0], &[0, 1]]);
        assert_eq!(a.compare(&b), LabelsComparison::Permuted);
        assert!(!a.is_identical(&b));
        assert!(a.is_same_set(&b));
        assert!(a.is_identical(&a.clone()));
    }

    #[test]
    fn test_compare_different() {
        let a = labels(&["x"], &[&[0], &[1]]);
        let b = labels(&["x"], &[&[0], &[2]]);
        let c = labels(&["z"], &[&[0], &[1]]);
        assert_eq!(a.compare(&b), LabelsComparison::Different);
        assert_eq!(a.compare(&c), LabelsComparison::Different);
    }

    #[test]
    fn test_select_sorted_project() {
        let l = labels(&["a", "b"], &[&[2, 0], &[0, 1], &[1, 1]]);
        assert_eq!(l.select(&[2, 0]).unwrap().to_rows(), vec![vec![1, 1], vec![2, 0]]);
        assert!(matches!(l.select(&[0, 0]), Err(TensorMapError::DuplicateLabel { .. })));
        assert!(matches!(l.select(&[5]), Err(TensorMapError::ShapeMismatch(_))));
        assert_eq!(
            l.sorted().to_rows(),
            vec![vec![0, 1], vec![1, 1], vec![2, 0]]
        );
        assert_eq!(l.project(&["b"]).unwrap(), vec![vec![0], vec![1], vec![1]]);
    }

    #[test]
    fn test_prepend_column() {
        let l = labels(&["a"], &[&[5], &[6]]);
        let p = l.prepend_column("tensor", &[0, 1]).unwrap();
        assert_eq!(p.names(), &["tensor", "a"]);
        assert_eq!(p.to_rows(), vec![vec![0, 5], vec![1, 6]]);
        assert!(matches!(
            l.prepend_column("a", &[0, 1]),
            Err(TensorMapError::InvalidName(_))
        ));
    }

    #[test]
    fn test_serde_validates() {
        let l = labels(&["a", "b"], &[&[0, 1], &[2, 3]]);
        let json = serde_json::to_string(&l).unwrap();
        let back: Labels = serde_json::from_str(&json).unwrap();
        assert!(back.is_identical(&l));

        let bad = r#"{"names":["a"],"values":[[1],[1]]}"#;
        assert!(serde_json::from_str::<Labels>(bad).is_err());
    }

    #[test]
    fn test_display() {
        let l = labels(&["a", "bb"], &[&[0, 10], &[1, 2]]);
        let expected = "Labels(\n    a  bb\n    0  10\n    1   2\n)";
        assert_eq!(l.to_string(), expected);
    }

    fn unique_rows() -> impl Strategy<Value = Vec<Vec<i32>>> {
        prop::collection::hash_set((-50i32..50, -50i32..50), 0..40)
            .prop_map(|set| set.into_iter().map(|(a, b)| vec![a, b]).collect())
    }

    proptest! {
        #[test]
        fn prop_reversal_is_a_permutation(rows in unique_rows()) {
            let a = Labels::from_rows(["a", "b"], rows.clone()).unwrap();
            let mut reversed = rows;
            reversed.reverse();
            let b = Labels::from_rows(["a", "b"], reversed).unwrap();

            prop_assert!(a.is_same_set(&b));
            if a.len() > 1 {
                prop_assert_eq!(a.compare(&b), LabelsComparison::Permuted);
            } else {
                prop_assert_eq!(a.compare(&b), LabelsComparison::Identical);
            }
        }

        #[test]
        fn prop_difference_and_intersection_partition(rows in unique_rows(), split in 0usize..40) {
            let all = Labels::from_rows(["a", "b"], rows.clone()).unwrap();
            let cut = split.min(rows.len());
            let part = Labels::from_rows(["a", "b"], rows[..cut].to_vec()).unwrap();

            let diff = all.difference(&part).unwrap();
            let inter = all.intersection(&part).unwrap();
            prop_assert_eq!(diff.len() + inter.len(), all.len());
            prop_assert!(inter.is_identical(&part));
            prop_assert!(diff.union(&inter).unwrap().is_same_set(&all));
        }

        #[test]
        fn prop_position_inverts_row(rows in unique_rows()) {
            let l = Labels::from_rows(["a", "b"], rows).unwrap();
            for i in 0..l.len() {
                prop_assert_eq!(l.position(l.row(i)), Some(i));
            }
        }
    }
}

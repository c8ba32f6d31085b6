// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Full equality (metadata and values) of tensor maps and blocks.

use super::metadata::{equal_metadata, equal_metadata_block, MetadataCheck};
use crate::OpsError;
use array_core::Array;
use tensor_map::{Block, TensorMap};

/// How two value arrays are compared.
#[derive(Clone, Copy)]
enum Tolerance {
    Exact,
    Close { rtol: f64, atol: f64 },
}

impl Tolerance {
    fn same(self, first: &Array, second: &Array) -> Result<bool, OpsError> {
        Ok(match self {
            Tolerance::Exact => first.equal(second)?,
            Tolerance::Close { rtol, atol } => first.allclose(second, rtol, atol)?,
        })
    }
}

/// Compares the values of two blocks with matching metadata, returning a
/// description of the first difference.
fn block_values(first: &Block, second: &Block, tolerance: Tolerance) -> Result<Option<String>, OpsError> {
    if !tolerance.same(first.values(), second.values())? {
        return Ok(Some("values differ".to_string()));
    }
    for (parameter, gradient) in first.gradients() {
        let other = second.gradient(parameter)?;
        if !tolerance.same(gradient.values(), other.values())? {
            return Ok(Some(format!("values of gradient '{parameter}' differ")));
        }
    }
    Ok(None)
}

fn tensor_raise(first: &TensorMap, second: &TensorMap, tolerance: Tolerance) -> Result<(), OpsError> {
    let report = equal_metadata(first, second, &MetadataCheck::ALL);
    if !report.is_empty() {
        return Err(OpsError::MetadataMismatch(report));
    }
    for (key, block) in first.iter() {
        if let Some(detail) = block_values(block, second.block(key)?, tolerance)? {
            return Err(OpsError::NotEqual(format!("{detail} for key {key:?}")));
        }
    }
    Ok(())
}

fn block_raise(first: &Block, second: &Block, tolerance: Tolerance) -> Result<(), OpsError> {
    let report = equal_metadata_block(first, second, &MetadataCheck::ALL);
    if !report.is_empty() {
        return Err(OpsError::MetadataMismatch(report));
    }
    match block_values(first, second, tolerance)? {
        Some(detail) => Err(OpsError::NotEqual(detail)),
        None => Ok(()),
    }
}

/// Turns a `_raise` result into a boolean, keeping errors that are not
/// about equality.
fn to_bool(result: Result<(), OpsError>) -> Result<bool, OpsError> {
    match result {
        Ok(()) => Ok(true),
        Err(OpsError::MetadataMismatch(_) | OpsError::NotEqual(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Whether two tensor maps have the same metadata and exactly the same
/// values, gradients included.
pub fn equal(first: &TensorMap, second: &TensorMap) -> Result<bool, OpsError> {
    to_bool(equal_raise(first, second))
}

/// Like [`equal`], failing with [`OpsError::MetadataMismatch`] or
/// [`OpsError::NotEqual`].
pub fn equal_raise(first: &TensorMap, second: &TensorMap) -> Result<(), OpsError> {
    tensor_raise(first, second, Tolerance::Exact)
}

pub fn equal_block(first: &Block, second: &Block) -> Result<bool, OpsError> {
    to_bool(equal_block_raise(first, second))
}

pub fn equal_block_raise(first: &Block, second: &Block) -> Result<(), OpsError> {
    block_raise(first, second, Tolerance::Exact)
}

/// Whether two tensor maps have the same metadata and values within
/// `atol + rtol * |second|`.
pub fn allclose(first: &TensorMap, second: &TensorMap, rtol: f64, atol: f64) -> Result<bool, OpsError> {
    to_bool(allclose_raise(first, second, rtol, atol))
}

pub fn allclose_raise(first: &TensorMap, second: &TensorMap, rtol: f64, atol: f64) -> Result<(), OpsError> {
    tensor_raise(first, second, Tolerance::Close { rtol, atol })
}

pub fn allclose_block(first: &Block, second: &Block, rtol: f64, atol: f64) -> Result<bool, OpsError> {
    to_bool(allclose_block_raise(first, second, rtol, atol))
}

pub fn allclose_block_raise(first: &Block, second: &Block, rtol: f64, atol: f64) -> Result<(), OpsError> {
    block_raise(first, second, Tolerance::Close { rtol, atol })
}

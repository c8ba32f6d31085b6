// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Element-wise arithmetic with analytic gradient propagation.
//!
//! The right operand is either a tensor map with the same keys and
//! metadata, or a scalar. For two tensor maps the gradients of both sides
//! must cover the same parameters at the same gradient samples.

use super::{
    assemble, gather_rows, gradient_parents, paired_blocks, require_identical,
    require_identical_components, require_same_gradients,
};
use crate::OpsError;
use array_core::{Array, BinaryOp, UnaryOp};
use tensor_map::{Block, TensorMap};
use tracing::debug;

/// Right-hand side of an element-wise operation.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Tensor(&'a TensorMap),
    Scalar(f64),
}

impl<'a> From<&'a TensorMap> for Operand<'a> {
    fn from(tensor: &'a TensorMap) -> Self {
        Operand::Tensor(tensor)
    }
}

impl From<f64> for Operand<'_> {
    fn from(value: f64) -> Self {
        Operand::Scalar(value)
    }
}

fn op_name(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "add",
        BinaryOp::Sub => "subtract",
        BinaryOp::Mul => "multiply",
        BinaryOp::Div => "divide",
        BinaryOp::Pow => "pow",
    }
}

fn validate(op: BinaryOp, first: &Block, second: &Block) -> Result<(), OpsError> {
    let name = op_name(op);
    require_identical(name, "samples", first.samples(), second.samples())?;
    require_identical_components(name, "components", first.components(), second.components())?;
    require_identical(name, "properties", first.properties(), second.properties())?;

    if op == BinaryOp::Pow {
        if second.gradients().len() > 0 {
            return Err(OpsError::invalid(
                name,
                "gradients with respect to the exponent are not supported",
            ));
        }
        return Ok(());
    }

    require_same_gradients(name, first, second)?;
    for (parameter, gradient) in first.gradients() {
        let other = second.gradient(parameter)?;
        require_identical(name, "gradient samples", gradient.samples(), other.samples())?;
        require_identical_components(
            name,
            "gradient components",
            gradient.components(),
            other.components(),
        )?;
    }
    Ok(())
}

fn tensor_block(op: BinaryOp, first: &Block, second: &Block) -> Result<Block, OpsError> {
    let (a, b) = (first.values(), second.values());
    let values = a.binary(op, b)?;

    let mut gradients = Vec::new();
    for (parameter, gradient) in first.gradients() {
        let parents = gradient_parents(gradient)?;
        let da = gradient.values();
        let rank = da.rank();
        let at = |x: &Array| gather_rows(x, &parents, rank);
        let db = || second.gradient(parameter).map(Block::values);

        let new = match op {
            BinaryOp::Add | BinaryOp::Sub => da.binary(op, db()?)?,
            // a db + b da
            BinaryOp::Mul => da
                .binary(BinaryOp::Mul, &at(b)?)?
                .binary(BinaryOp::Add, &at(a)?.binary(BinaryOp::Mul, db()?)?)?,
            // da / b - a db / b²
            BinaryOp::Div => {
                let bp = at(b)?;
                let correction = at(a)?
                    .binary(BinaryOp::Mul, db()?)?
                    .binary(BinaryOp::Div, &bp.unary(UnaryOp::Square)?)?;
                da.binary(BinaryOp::Div, &bp)?.binary(BinaryOp::Sub, &correction)?
            }
            // b a^(b - 1) da
            BinaryOp::Pow => {
                let bp = at(b)?;
                let power = at(a)?.binary(BinaryOp::Pow, &bp.scalar(BinaryOp::Sub, 1.0)?)?;
                bp.binary(BinaryOp::Mul, &power)?.binary(BinaryOp::Mul, da)?
            }
        };
        gradients.push((parameter.to_string(), gradient.with_values(new)?));
    }

    assemble(
        values,
        first.samples().clone(),
        first.components().to_vec(),
        first.properties().clone(),
        gradients,
    )
}

fn scalar_block(op: BinaryOp, block: &Block, value: f64) -> Result<Block, OpsError> {
    let a = block.values();
    let mut gradients = Vec::new();
    for (parameter, gradient) in block.gradients() {
        let da = gradient.values();
        let new = match op {
            BinaryOp::Add | BinaryOp::Sub => gradient.clone(),
            BinaryOp::Mul | BinaryOp::Div => gradient.with_values(da.scalar(op, value)?)?,
            // s a^(s - 1) da
            BinaryOp::Pow => {
                let parents = gradient_parents(gradient)?;
                let factor = gather_rows(a, &parents, da.rank())?
                    .scalar(BinaryOp::Pow, value - 1.0)?
                    .scalar(BinaryOp::Mul, value)?;
                gradient.with_values(factor.binary(BinaryOp::Mul, da)?)?
            }
        };
        gradients.push((parameter.to_string(), new));
    }

    assemble(
        a.scalar(op, value)?,
        block.samples().clone(),
        block.components().to_vec(),
        block.properties().clone(),
        gradients,
    )
}

fn elementwise(op: BinaryOp, first: &TensorMap, second: Operand<'_>) -> Result<TensorMap, OpsError> {
    let blocks = match second {
        Operand::Scalar(value) => first
            .blocks()
            .iter()
            .map(|block| scalar_block(op, block, value))
            .collect::<Result<Vec<_>, _>>()?,
        Operand::Tensor(tensor) => {
            let pairs = paired_blocks(op_name(op), first, tensor)?;
            for (a, b) in &pairs {
                validate(op, a, b)?;
            }
            pairs
                .into_iter()
                .map(|(a, b)| tensor_block(op, a, b))
                .collect::<Result<Vec<_>, _>>()?
        }
    };
    debug!(op = op_name(op), blocks = blocks.len(), "applied element-wise operation");
    Ok(TensorMap::new(first.keys().clone(), blocks)?)
}

/// `first + second`.
///
/// # Errors
/// For a tensor operand: [`OpsError::KeyMismatch`] if the keys differ and
/// [`OpsError::SchemaMismatch`] if block metadata or gradients differ.
pub fn add<'a>(first: &TensorMap, second: impl Into<Operand<'a>>) -> Result<TensorMap, OpsError> {
    elementwise(BinaryOp::Add, first, second.into())
}

/// `first - second`.
pub fn subtract<'a>(
    first: &TensorMap,
    second: impl Into<Operand<'a>>,
) -> Result<TensorMap, OpsError> {
    elementwise(BinaryOp::Sub, first, second.into())
}

/// `first * second`, gradients by the product rule.
pub fn multiply<'a>(
    first: &TensorMap,
    second: impl Into<Operand<'a>>,
) -> Result<TensorMap, OpsError> {
    elementwise(BinaryOp::Mul, first, second.into())
}

/// `first / second`, gradients by the quotient rule.
pub fn divide<'a>(first: &TensorMap, second: impl Into<Operand<'a>>) -> Result<TensorMap, OpsError> {
    elementwise(BinaryOp::Div, first, second.into())
}

/// `first ^ second`, gradients by the power rule.
///
/// A tensor exponent must not carry gradients of its own
/// ([`OpsError::InvalidArgument`]).
pub fn pow<'a>(first: &TensorMap, second: impl Into<Operand<'a>>) -> Result<TensorMap, OpsError> {
    elementwise(BinaryOp::Pow, first, second.into())
}

/// Element-wise absolute value; gradients are multiplied by the sign of
/// the values.
pub fn abs(tensor: &TensorMap) -> Result<TensorMap, OpsError> {
    let blocks = tensor
        .blocks()
        .iter()
        .map(|block| {
            let sign = block.values().unary(UnaryOp::Sign)?;
            let mut gradients = Vec::new();
            for (parameter, gradient) in block.gradients() {
                let parents = gradient_parents(gradient)?;
                let da = gradient.values();
                let factor = gather_rows(&sign, &parents, da.rank())?;
                gradients.push((
                    parameter.to_string(),
                    gradient.with_values(factor.binary(BinaryOp::Mul, da)?)?,
                ));
            }
            assemble(
                block.values().unary(UnaryOp::Abs)?,
                block.samples().clone(),
                block.components().to_vec(),
                block.properties().clone(),
                gradients,
            )
        })
        .collect::<Result<Vec<_>, OpsError>>()?;
    Ok(TensorMap::new(tensor.keys().clone(), blocks)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use array_core::ndarray::{arr2, arr3, ArrayD};
    use tensor_map::Labels;

    /// Two samples, one property; gradient with a 2-long leading component.
    fn tensor(values: [f64; 2], gradient: [[f64; 2]; 2]) -> TensorMap {
        let properties = Labels::range("p", 1).unwrap();
        let mut builder = Block::builder(
            arr2(&[[values[0]], [values[1]]]).into_dyn(),
            Labels::range("s", 2).unwrap(),
            vec![],
            properties.clone(),
        )
        .unwrap();
        let g: ArrayD<f64> = arr3(&[
            [[gradient[0][0]], [gradient[0][1]]],
            [[gradient[1][0]], [gradient[1][1]]],
        ])
        .into_dyn();
        let gradient = Block::new(
            g,
            Labels::from_rows(["sample"], vec![vec![0], vec![1]]).unwrap(),
            vec![Labels::range("xyz", 2).unwrap()],
            properties,
        )
        .unwrap();
        builder.add_gradient("positions", gradient).unwrap();
        TensorMap::new(Labels::new(["k"], vec![0]).unwrap(), vec![builder.build()]).unwrap()
    }

    fn values(t: &TensorMap) -> Vec<f64> {
        t.block(&[0]).unwrap().values().to_vec().unwrap()
    }

    fn gradient(t: &TensorMap) -> Vec<f64> {
        t.block(&[0])
            .unwrap()
            .gradient("positions")
            .unwrap()
            .values()
            .to_vec()
            .unwrap()
    }

    #[test]
    fn test_add_subtract() {
        let a = tensor([1.0, 2.0], [[1.0, 0.0], [0.0, 1.0]]);
        let b = tensor([10.0, 20.0], [[2.0, 2.0], [3.0, 3.0]]);
        let sum = add(&a, &b).unwrap();
        assert_eq!(values(&sum), vec![11.0, 22.0]);
        assert_eq!(gradient(&sum), vec![3.0, 2.0, 3.0, 4.0]);

        let diff = subtract(&b, &a).unwrap();
        assert_eq!(values(&diff), vec![9.0, 18.0]);
        assert_eq!(gradient(&diff), vec![1.0, 2.0, 3.0, 2.0]);

        let shifted = add(&a, 5.0).unwrap();
        assert_eq!(values(&shifted), vec![6.0, 7.0]);
        assert_eq!(gradient(&shifted), gradient(&a));
    }

    #[test]
    fn test_multiply_product_rule() {
        let a = tensor([2.0, 3.0], [[1.0, 0.0], [0.0, 1.0]]);
        let b = tensor([5.0, 7.0], [[1.0, 1.0], [2.0, 0.0]]);
        let product = multiply(&a, &b).unwrap();
        assert_eq!(values(&product), vec![10.0, 21.0]);
        // sample 0: da*b + a*db = [5, 0] + [2, 2]; sample 1: [0, 7] + [6, 0].
        assert_eq!(gradient(&product), vec![7.0, 2.0, 6.0, 7.0]);

        let scaled = multiply(&a, 2.0).unwrap();
        assert_eq!(gradient(&scaled), vec![2.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn test_divide_quotient_rule() {
        let a = tensor([2.0, 3.0], [[1.0, 0.0], [0.0, 1.0]]);
        let b = tensor([4.0, 1.0], [[1.0, 0.0], [0.0, 0.0]]);
        let quotient = divide(&a, &b).unwrap();
        assert_eq!(values(&quotient), vec![0.5, 3.0]);
        let g = gradient(&quotient);
        // sample 0: da/b - a db/b² = [0.25, 0] - [0.125, 0].
        assert_abs_diff_eq!(g[0], 0.125);
        assert_abs_diff_eq!(g[1], 0.0);
        assert_abs_diff_eq!(g[2], 0.0);
        assert_abs_diff_eq!(g[3], 1.0);
    }

    #[test]
    fn test_pow_scalar_and_tensor() {
        let a = tensor([2.0, 3.0], [[1.0, 0.0], [0.0, 1.0]]);
        let squared = pow(&a, 2.0).unwrap();
        assert_eq!(values(&squared), vec![4.0, 9.0]);
        assert_eq!(gradient(&squared), vec![4.0, 0.0, 0.0, 6.0]);

        let exponent = TensorMap::new(
            Labels::new(["k"], vec![0]).unwrap(),
            vec![Block::new(
                arr2(&[[3.0], [1.0]]).into_dyn(),
                Labels::range("s", 2).unwrap(),
                vec![],
                Labels::range("p", 1).unwrap(),
            )
            .unwrap()],
        )
        .unwrap();
        let powered = pow(&a, &exponent).unwrap();
        assert_eq!(values(&powered), vec![8.0, 3.0]);
        assert_eq!(gradient(&powered), vec![12.0, 0.0, 0.0, 1.0]);

        let with_gradients = tensor([1.0, 1.0], [[0.0, 0.0], [0.0, 0.0]]);
        assert!(matches!(
            pow(&a, &with_gradients),
            Err(OpsError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_abs() {
        let a = tensor([-2.0, 3.0], [[1.0, 2.0], [3.0, 4.0]]);
        let result = abs(&a).unwrap();
        assert_eq!(values(&result), vec![2.0, 3.0]);
        assert_eq!(gradient(&result), vec![-1.0, -2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_metadata_mismatch() {
        let a = tensor([1.0, 2.0], [[0.0, 0.0], [0.0, 0.0]]);
        let b = TensorMap::new(
            Labels::new(["k"], vec![0]).unwrap(),
            vec![Block::new(
                arr2(&[[1.0], [2.0]]).into_dyn(),
                Labels::range("other", 2).unwrap(),
                vec![],
                Labels::range("p", 1).unwrap(),
            )
            .unwrap()],
        )
        .unwrap();
        assert!(matches!(add(&a, &b), Err(OpsError::SchemaMismatch { .. })));
    }
}

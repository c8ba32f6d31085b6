// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Process-wide backend registry keyed by concrete array type.
//!
//! The built-in backends (`ndarray::ArrayD<f64>` and [`DenseArray`]) are
//! registered the first time the registry is touched. Additional backends
//! can be added at any point with [`register_backend`].

use crate::{Array, ArrayData, ArrayError, Backend, DenseArray, DenseBackend, NdArrayBackend};
use ndarray::ArrayD;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use tracing::debug;

type Registry = RwLock<HashMap<TypeId, Arc<dyn Backend>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut table: HashMap<TypeId, Arc<dyn Backend>> = HashMap::new();
        table.insert(TypeId::of::<ArrayD<f64>>(), Arc::new(NdArrayBackend));
        table.insert(TypeId::of::<DenseArray>(), Arc::new(DenseBackend));
        RwLock::new(table)
    })
}

/// Registers `backend` for arrays of concrete type `T`, replacing any
/// previous registration.
pub fn register_backend<T: ArrayData>(backend: impl Backend + 'static) {
    debug!(
        backend = backend.name(),
        array_type = std::any::type_name::<T>(),
        "registering array backend"
    );
    let mut table = registry().write().unwrap_or_else(|e| e.into_inner());
    table.insert(TypeId::of::<T>(), Arc::new(backend));
}

/// Returns the backend registered for the concrete type of `array`.
///
/// # Errors
/// Returns [`ArrayError::UnsupportedBackend`] if nothing is registered.
pub fn backend_for(array: &Array) -> Result<Arc<dyn Backend>, ArrayError> {
    let table = registry().read().unwrap_or_else(|e| e.into_inner());
    table
        .get(&array.data_type_id())
        .cloned()
        .ok_or_else(|| ArrayError::UnsupportedBackend {
            op: "dispatch",
            origin: array.type_name().to_string(),
        })
}

/// Names of every registered backend, sorted.
pub fn registered_backends() -> Vec<String> {
    let table = registry().read().unwrap_or_else(|e| e.into_inner());
    let mut names: Vec<String> = table.values().map(|b| b.name().to_string()).collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shape;

    #[test]
    fn test_builtins_registered() {
        let names = registered_backends();
        assert!(names.contains(&"ndarray".to_string()));
        assert!(names.contains(&"dense".to_string()));
    }

    #[test]
    fn test_lookup_by_type() {
        let dense = Array::new(DenseArray::zeros(Shape::vector(2)));
        assert_eq!(backend_for(&dense).unwrap().name(), "dense");

        let nd = Array::new(ArrayD::<f64>::zeros(ndarray::IxDyn(&[2])));
        assert_eq!(backend_for(&nd).unwrap().name(), "ndarray");
    }
}

//! Typed per-run metadata.
//!
//! A [`RunContext`] carries values from early stages to later, non-adjacent
//! ones. Every key is written at most once per run; a second write is a wiring
//! bug and fails with [`ContextError::DuplicateKey`].

use crate::account::Signer;
use crate::processes::SimulationResult;
use crate::transaction::TransactionEnvelope;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

/// The signers the caller handed to the pipeline.
pub const SIGNERS: ContextKey<Vec<Arc<dyn Signer>>> = ContextKey::new("signers");

/// The envelope as produced by the build stage.
pub const BUILT_ENVELOPE: ContextKey<TransactionEnvelope> = ContextKey::new("built_envelope");

/// The classified simulation of the built envelope.
pub const SIMULATION: ContextKey<SimulationResult> = ContextKey::new("simulation");

/// Errors reading or writing a [`RunContext`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The key was already written in this run
    #[error("context key '{key}' was already set")]
    DuplicateKey {
        /// The key
        key: &'static str,
    },

    /// The key was never written in this run
    #[error("context key '{key}' is not set")]
    MissingKey {
        /// The key
        key: &'static str,
    },

    /// The stored value has a different type than the key
    #[error("context key '{key}' does not hold a {expected}")]
    TypeMismatch {
        /// The key
        key: &'static str,
        /// The type the key names
        expected: &'static str,
    },
}

/// A name bound to the type of the value stored under it.
pub struct ContextKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    /// Creates a key.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// The key name.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ContextKey<T> {}

impl<T> fmt::Debug for ContextKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContextKey").field(&self.name).finish()
    }
}

/// Write-once storage owned by a single pipeline run.
#[derive(Default)]
pub struct RunContext {
    values: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl RunContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::DuplicateKey`] if the key is already set.
    pub fn insert<T: Any + Send + Sync>(
        &mut self,
        key: ContextKey<T>,
        value: T,
    ) -> Result<(), ContextError> {
        if self.values.contains_key(key.name) {
            return Err(ContextError::DuplicateKey { key: key.name });
        }
        self.values.insert(key.name, Box::new(value));
        Ok(())
    }

    /// Reads the value under `key`, if set.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::TypeMismatch`] if another key with the same name
    /// stored a value of a different type.
    pub fn get<T: Any>(&self, key: ContextKey<T>) -> Result<Option<&T>, ContextError> {
        match self.values.get(key.name) {
            None => Ok(None),
            Some(value) => value
                .downcast_ref::<T>()
                .map(Some)
                .ok_or(ContextError::TypeMismatch {
                    key: key.name,
                    expected: type_name::<T>(),
                }),
        }
    }

    /// Reads the value under `key`, failing if it is not set.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::MissingKey`] if the key is not set, or
    /// [`ContextError::TypeMismatch`] if it holds another type.
    pub fn require<T: Any>(&self, key: ContextKey<T>) -> Result<&T, ContextError> {
        self.get(key)?
            .ok_or(ContextError::MissingKey { key: key.name })
    }

    /// Returns true if `key` is set.
    pub fn contains<T>(&self, key: ContextKey<T>) -> bool {
        self.values.contains_key(key.name)
    }

    /// Number of keys set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no key is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("RunContext").field("keys", &keys).finish()
    }
}

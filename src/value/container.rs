use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::scalar::{BaseType, Scalar};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("Container of baseType {expected} cannot hold a {found} value")]
    BaseTypeMismatch { expected: BaseType, found: BaseType },
}

/// Elements of a multiple or ordered container.
///
/// All non-null elements share the container's baseType; construction rejects
/// anything else so the evaluators never have to re-check it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    base_type: BaseType,
    items: Vec<Option<Scalar>>,
}

impl Container {
    pub fn new(base_type: BaseType, items: Vec<Option<Scalar>>) -> Result<Self, ValueError> {
        for item in items.iter().flatten() {
            if item.base_type() != base_type {
                return Err(ValueError::BaseTypeMismatch {
                    expected: base_type,
                    found: item.base_type(),
                });
            }
        }
        // empty strings are null inside containers too
        let items = items
            .into_iter()
            .map(|item| item.filter(|scalar| !scalar.is_null()))
            .collect();
        Ok(Self { base_type, items })
    }

    pub fn from_scalars(
        base_type: BaseType,
        scalars: impl IntoIterator<Item = Scalar>,
    ) -> Result<Self, ValueError> {
        Self::new(base_type, scalars.into_iter().map(Some).collect())
    }

    pub fn empty(base_type: BaseType) -> Self {
        Self {
            base_type,
            items: Vec::new(),
        }
    }

    pub fn base_type(&self) -> BaseType {
        self.base_type
    }

    pub fn items(&self) -> &[Option<Scalar>] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Option<Scalar>> {
        self.items
    }

    /// Iterates over the non-null elements.
    pub fn scalars(&self) -> impl Iterator<Item = &Scalar> {
        self.items.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Scalar> {
        self.items.get(index).and_then(|item| item.as_ref())
    }

    pub fn contains(&self, scalar: &Scalar) -> bool {
        self.scalars().any(|item| item == scalar)
    }

    /// Appends an element; a mismatching baseType is rejected.
    pub fn push(&mut self, item: Option<Scalar>) -> Result<(), ValueError> {
        if let Some(scalar) = &item {
            if scalar.base_type() != self.base_type {
                return Err(ValueError::BaseTypeMismatch {
                    expected: self.base_type,
                    found: scalar.base_type(),
                });
            }
        }
        self.items.push(item.filter(|scalar| !scalar.is_null()));
        Ok(())
    }

    pub(crate) fn map_items(&self, base_type: BaseType, f: impl Fn(&Scalar) -> Scalar) -> Self {
        Self {
            base_type,
            items: self
                .items
                .iter()
                .map(|item| item.as_ref().map(&f))
                .collect(),
        }
    }

    /// Positional equality, used for ordered containers.
    pub fn sequence_eq(&self, other: &Container) -> bool {
        self.base_type == other.base_type && self.items == other.items
    }

    /// Multiset equality, used for multiple containers: every element must be
    /// matched exactly once, duplicates counted.
    pub fn multiset_eq(&self, other: &Container) -> bool {
        if self.base_type != other.base_type || self.items.len() != other.items.len() {
            return false;
        }
        let mut used = vec![false; other.items.len()];
        'outer: for item in &self.items {
            for (i, candidate) in other.items.iter().enumerate() {
                if !used[i] && candidate == item {
                    used[i] = true;
                    continue 'outer;
                }
            }
            return false;
        }
        true
    }

    /// Multiset inclusion: every element of `other` is matched by a distinct
    /// element of `self`.
    pub fn includes_multiset(&self, other: &Container) -> bool {
        let mut used = vec![false; self.items.len()];
        'outer: for item in &other.items {
            for (i, candidate) in self.items.iter().enumerate() {
                if !used[i] && candidate == item {
                    used[i] = true;
                    continue 'outer;
                }
            }
            return false;
        }
        true
    }

    /// Contiguous subsequence test, used for ordered containers.
    pub fn includes_sequence(&self, other: &Container) -> bool {
        if other.items.is_empty() {
            return true;
        }
        self.items
            .windows(other.items.len())
            .any(|window| window == other.items.as_slice())
    }
}

/// A record maps field identifiers to heterogeneous scalars; it has no
/// baseType of its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    fields: HashMap<String, Option<Scalar>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Option<Scalar>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<Scalar>) {
        self.fields
            .insert(name.into(), value.filter(|scalar| !scalar.is_null()));
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.fields.get(name).and_then(|value| value.as_ref())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Option<Scalar>)> {
        self.fields.iter()
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Error;
use crate::ser;
use crate::value::Value;

/// Root data bag handed to a render call.
///
/// The context is borrowed for the duration of rendering only; nothing from
/// it is retained by compiled templates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    vars: BTreeMap<String, Value>,
}

impl Context {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from any serializable value whose top level is a map
    /// or a struct. `()`/`None` yield an empty context.
    pub fn from_serialize<T: Serialize + ?Sized>(data: &T) -> Result<Self, Error> {
        match ser::to_value(data)? {
            Value::Nil => Ok(Self::default()),
            Value::Map(vars) => Ok(Self { vars }),
            Value::Record(record) => Ok(record
                .fields()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect()),
            other => Err(Error::data(format!(
                "template data must be a map or a struct, got {}",
                other.type_name()
            ))),
        }
    }

    /// Sets a root variable and returns the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.vars.insert(key.into(), value.into())
    }

    /// Builder-style variant of [`Context::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Root variable by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    /// Number of root variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether no root variables are set.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl From<BTreeMap<String, Value>> for Context {
    fn from(vars: BTreeMap<String, Value>) -> Self {
        Self { vars }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Lookup chain used while rendering.
///
/// A root scope reads from a [`Context`]; each derived scope layers one local
/// binding on top of its parent without touching it, so loop and switch
/// bindings disappear as soon as the derived scope is dropped.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    parent: Option<&'a Scope<'a>>,
    data: Option<&'a Context>,
    binding: Option<(&'a str, &'a Value)>,
}

impl<'a> Scope<'a> {
    /// Root scope over `data`.
    pub fn new(data: &'a Context) -> Self {
        Self {
            parent: None,
            data: Some(data),
            binding: None,
        }
    }

    /// Derived scope in which `name` resolves to `value`.
    pub fn bind(&'a self, name: &'a str, value: &'a Value) -> Scope<'a> {
        Self {
            parent: Some(self),
            data: None,
            binding: Some((name, value)),
        }
    }

    /// Resolves a bare name: innermost binding first, then the root context.
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        if let Some((key, value)) = self.binding {
            if key == name {
                return Some(value);
            }
        }
        if let Some(data) = self.data {
            return data.get(name);
        }
        self.parent.and_then(|parent| parent.get(name))
    }

    /// Resolves a dotted path such as `user.address.city`.
    pub fn lookup_path(&self, path: &str) -> Option<&'a Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.get(first)?;
        for segment in segments {
            current = current.member(segment)?;
        }
        Some(current)
    }
}

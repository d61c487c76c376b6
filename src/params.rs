use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ParamError;

/// A scalar or small-enum parameter value, as carried by the command bus and snapshots.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ParamValue {
    Float(f32),
    Int(i64),
    Bool(bool),
    Choice(String),
}

impl ParamValue {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Choice(v.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    Float,
    Int,
    Bool,
    Choice(&'static [&'static str]),
}

impl ParamKind {
    /// Parse a raw command-bus string into a value of this kind.
    pub fn parse(&self, name: &str, raw: &str) -> Result<ParamValue, ParamError> {
        let raw = raw.trim();
        let unparsable = || ParamError::Unparsable {
            name: name.to_string(),
            raw: raw.to_string(),
        };
        match self {
            ParamKind::Float => raw
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .map(ParamValue::Float)
                .ok_or_else(unparsable),
            ParamKind::Int => raw.parse::<i64>().map(ParamValue::Int).map_err(|_| unparsable()),
            ParamKind::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Ok(ParamValue::Bool(true)),
                "false" | "0" | "off" | "no" => Ok(ParamValue::Bool(false)),
                _ => Err(unparsable()),
            },
            ParamKind::Choice(options) => options
                .iter()
                .find(|o| o.eq_ignore_ascii_case(raw))
                .map(|o| ParamValue::Choice(o.to_string()))
                .ok_or_else(|| ParamError::InvalidChoice {
                    name: name.to_string(),
                    value: raw.to_string(),
                }),
        }
    }
}

enum Accessor<T> {
    Float(fn(&T) -> f32, fn(&mut T, f32)),
    Int(fn(&T) -> i64, fn(&mut T, i64)),
    Bool(fn(&T) -> bool, fn(&mut T, bool)),
    Choice(
        &'static [&'static str],
        fn(&T) -> &'static str,
        fn(&mut T, &str),
    ),
}

struct ParamEntry<T> {
    name: &'static str,
    snapshot: bool,
    accessor: Accessor<T>,
}

impl<T> ParamEntry<T> {
    fn kind(&self) -> ParamKind {
        match self.accessor {
            Accessor::Float(..) => ParamKind::Float,
            Accessor::Int(..) => ParamKind::Int,
            Accessor::Bool(..) => ParamKind::Bool,
            Accessor::Choice(options, ..) => ParamKind::Choice(options),
        }
    }
}

/// Explicit name to accessor mapping for one component type.
///
/// Built once per type (usually in a `once_cell::sync::Lazy` static) and shared by every
/// instance. Entries keep registration order, which is also the order of `names()` and of
/// snapshot capture. Entries registered with `snapshot = true` are the fields a `Snapshot`
/// captures and restores.
pub struct ParamTable<T> {
    entries: Vec<ParamEntry<T>>,
}

impl<T> Default for ParamTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ParamTable<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn float(
        mut self,
        name: &'static str,
        snapshot: bool,
        get: fn(&T) -> f32,
        set: fn(&mut T, f32),
    ) -> Self {
        self.push(name, snapshot, Accessor::Float(get, set));
        self
    }

    pub fn int(
        mut self,
        name: &'static str,
        snapshot: bool,
        get: fn(&T) -> i64,
        set: fn(&mut T, i64),
    ) -> Self {
        self.push(name, snapshot, Accessor::Int(get, set));
        self
    }

    pub fn boolean(
        mut self,
        name: &'static str,
        snapshot: bool,
        get: fn(&T) -> bool,
        set: fn(&mut T, bool),
    ) -> Self {
        self.push(name, snapshot, Accessor::Bool(get, set));
        self
    }

    pub fn choice(
        mut self,
        name: &'static str,
        options: &'static [&'static str],
        snapshot: bool,
        get: fn(&T) -> &'static str,
        set: fn(&mut T, &str),
    ) -> Self {
        self.push(name, snapshot, Accessor::Choice(options, get, set));
        self
    }

    fn push(&mut self, name: &'static str, snapshot: bool, accessor: Accessor<T>) {
        // Later registrations override earlier ones so a layer can refine a common param.
        self.entries.retain(|e| e.name != name);
        self.entries.push(ParamEntry {
            name,
            snapshot,
            accessor,
        });
    }

    fn entry(&self, name: &str) -> Result<&ParamEntry<T>, ParamError> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| ParamError::Unknown(name.to_string()))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    pub fn snapshot_keys(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|e| e.snapshot)
            .map(|e| e.name)
            .collect()
    }

    pub fn kind(&self, name: &str) -> Option<ParamKind> {
        self.entry(name).ok().map(|e| e.kind())
    }

    pub fn get(&self, target: &T, name: &str) -> Result<ParamValue, ParamError> {
        let entry = self.entry(name)?;
        Ok(match &entry.accessor {
            Accessor::Float(get, _) => ParamValue::Float(get(target)),
            Accessor::Int(get, _) => ParamValue::Int(get(target)),
            Accessor::Bool(get, _) => ParamValue::Bool(get(target)),
            Accessor::Choice(_, get, _) => ParamValue::Choice(get(target).to_string()),
        })
    }

    pub fn set(&self, target: &mut T, name: &str, value: &ParamValue) -> Result<(), ParamError> {
        let entry = self.entry(name)?;
        let mismatch = || ParamError::TypeMismatch {
            name: name.to_string(),
            expected: entry.kind(),
        };
        match (&entry.accessor, value) {
            (Accessor::Float(_, set), ParamValue::Float(v)) if v.is_finite() => set(target, *v),
            (Accessor::Float(_, set), ParamValue::Int(v)) => set(target, *v as f32),
            (Accessor::Int(_, set), ParamValue::Int(v)) => set(target, *v),
            (Accessor::Bool(_, set), ParamValue::Bool(v)) => set(target, *v),
            (Accessor::Choice(options, _, set), ParamValue::Choice(v)) => {
                let option = options
                    .iter()
                    .find(|o| o.eq_ignore_ascii_case(v))
                    .ok_or_else(|| ParamError::InvalidChoice {
                        name: name.to_string(),
                        value: v.clone(),
                    })?;
                set(target, option);
            }
            _ => return Err(mismatch()),
        }
        Ok(())
    }

    pub fn set_str(&self, target: &mut T, name: &str, raw: &str) -> Result<(), ParamError> {
        let value = self.entry(name)?.kind().parse(name, raw)?;
        self.set(target, name, &value)
    }
}

/// Named parameter access, shared by the command bus and snapshot capture/restore.
pub trait Parameterized {
    fn param_names(&self) -> Vec<&'static str>;
    fn param_kind(&self, name: &str) -> Option<ParamKind>;
    fn get_param(&self, name: &str) -> Result<ParamValue, ParamError>;
    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<(), ParamError>;
    fn snapshot_keys(&self) -> Vec<&'static str>;

    fn set_param_str(&mut self, name: &str, raw: &str) -> Result<(), ParamError> {
        let kind = self
            .param_kind(name)
            .ok_or_else(|| ParamError::Unknown(name.to_string()))?;
        let value = kind.parse(name, raw)?;
        self.set_param(name, &value)
    }

    /// Current values of every snapshot-marked parameter.
    fn snapshot_values(&self) -> BTreeMap<String, ParamValue> {
        self.snapshot_keys()
            .into_iter()
            .filter_map(|key| {
                self.get_param(key)
                    .ok()
                    .map(|value| (key.to_string(), value))
            })
            .collect()
    }
}

/// Types whose parameters are described by a static `ParamTable`.
pub trait ParamSchema: Sized + 'static {
    fn param_table() -> &'static ParamTable<Self>;
}

impl<T: ParamSchema> Parameterized for T {
    fn param_names(&self) -> Vec<&'static str> {
        T::param_table().names()
    }

    fn param_kind(&self, name: &str) -> Option<ParamKind> {
        T::param_table().kind(name)
    }

    fn get_param(&self, name: &str) -> Result<ParamValue, ParamError> {
        T::param_table().get(self, name)
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<(), ParamError> {
        T::param_table().set(self, name, value)
    }

    fn snapshot_keys(&self) -> Vec<&'static str> {
        T::param_table().snapshot_keys()
    }
}

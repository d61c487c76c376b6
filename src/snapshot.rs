use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::compositor::LayerGroup;
use crate::params::{ParamValue, Parameterized};

/// Named capture of the snapshot-marked parameters of a layer or a whole group.
///
/// Group captures hold the group's own keys plus `layer/param` keys for each member
/// layer. Restoring writes back exactly the captured keys; anything unmarked, and any
/// runtime state such as a sweep's phase, is left alone.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub name: String,
    pub values: BTreeMap<String, ParamValue>,
}

impl Snapshot {
    pub fn capture<T: Parameterized + ?Sized>(name: impl Into<String>, target: &T) -> Self {
        Self {
            name: name.into(),
            values: target.snapshot_values(),
        }
    }

    /// Returns how many values were written back.
    pub fn restore<T: Parameterized + ?Sized>(&self, target: &mut T) -> usize {
        self.values
            .iter()
            .filter(|(key, value)| apply(target, key, value, &self.name))
            .count()
    }

    pub fn capture_group(name: impl Into<String>, group: &LayerGroup) -> Self {
        let mut values = group.snapshot_values();
        for (layer_name, layer) in group.layers() {
            for (key, value) in layer.snapshot_values() {
                values.insert(format!("{}/{}", layer_name, key), value);
            }
        }
        Self {
            name: name.into(),
            values,
        }
    }

    /// Restore a group capture. Keys for layers the group no longer has are skipped.
    pub fn restore_group(&self, group: &mut LayerGroup) -> usize {
        let mut restored = 0;
        for (key, value) in &self.values {
            let applied = match key.split_once('/') {
                None => apply(group, key, value, &self.name),
                Some((layer_name, param)) => match group.layer_mut(layer_name) {
                    Some(layer) => apply(layer, param, value, &self.name),
                    None => {
                        warn!(
                            "[params] snapshot '{}' names missing layer '{}'",
                            self.name, layer_name
                        );
                        false
                    }
                },
            };
            if applied {
                restored += 1;
            }
        }
        restored
    }
}

fn apply<T: Parameterized + ?Sized>(
    target: &mut T,
    key: &str,
    value: &ParamValue,
    snapshot: &str,
) -> bool {
    match target.set_param(key, value) {
        Ok(()) => true,
        Err(err) => {
            warn!("[params] snapshot '{}' skipped {}: {}", snapshot, key, err);
            false
        }
    }
}

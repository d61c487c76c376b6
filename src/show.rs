//! Show context
//!
//! The one explicitly initialised owner of process-wide state: settings, fixture layout,
//! published registry, color buffer and layer groups. Fields are declared in init order
//! and dropped in reverse.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};

use crate::compositor::{ColorBuffer, LayerGroup};
use crate::engine::{generate_dmx, output_triples};
use crate::error::{LayoutError, ParamError, PrairieError, PrairieResult};
use crate::fixtures::{load_layout, save_layout, FixtureLayout, PointRegistry, RegistryHandle};
use crate::models::{DmxFrame, LayoutFile, PointOutput};
use crate::params::{ParamValue, Parameterized};
use crate::settings::ShowSettings;
use crate::snapshot::Snapshot;

enum ParamPath<'a> {
    Group { group: &'a str, param: &'a str },
    Layer {
        group: &'a str,
        layer: &'a str,
        param: &'a str,
    },
}

#[derive(Clone, Copy)]
enum ParamWrite<'a> {
    Value(&'a ParamValue),
    Raw(&'a str),
}

impl ParamWrite<'_> {
    fn apply<T: Parameterized + ?Sized>(
        self,
        target: &mut T,
        param: &str,
    ) -> Result<(), ParamError> {
        match self {
            ParamWrite::Value(value) => target.set_param(param, value),
            ParamWrite::Raw(raw) => target.set_param_str(param, raw),
        }
    }
}

impl std::fmt::Display for ParamWrite<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamWrite::Value(value) => write!(f, "{:?}", value),
            ParamWrite::Raw(raw) => f.write_str(raw),
        }
    }
}

fn parse_path(path: &str) -> Result<ParamPath<'_>, ParamError> {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ParamError::BadPath(path.to_string()));
    }
    match parts[..] {
        [group, param] => Ok(ParamPath::Group { group, param }),
        [group, layer, param] => Ok(ParamPath::Layer {
            group,
            layer,
            param,
        }),
        _ => Err(ParamError::BadPath(path.to_string())),
    }
}

pub struct Show {
    settings: ShowSettings,
    layout: FixtureLayout,
    registry: RegistryHandle,
    colors: ColorBuffer,
    groups: Vec<LayerGroup>,
    seen_generation: u64,
}

impl Show {
    pub fn new(settings: ShowSettings) -> Self {
        let layout = FixtureLayout::new(&settings);
        let registry = RegistryHandle::new(settings.channels_per_point);
        let colors = ColorBuffer::new(0);
        info!(
            "[layout] show ready: {} points per fixture, {} channels per fixture",
            settings.points_per_fixture,
            settings.channels_per_fixture()
        );
        Self {
            settings,
            layout,
            registry,
            colors,
            groups: Vec::new(),
            seen_generation: 0,
        }
    }

    pub fn settings(&self) -> &ShowSettings {
        &self.settings
    }

    pub fn layout(&self) -> &FixtureLayout {
        &self.layout
    }

    /// Layout edits take effect once `request_rebuild` is called and the next tick runs.
    pub fn layout_mut(&mut self) -> &mut FixtureLayout {
        &mut self.layout
    }

    pub fn request_rebuild(&self) {
        self.registry
            .request_rebuild(self.layout.fixtures().to_vec(), self.settings.origin);
    }

    /// The registry the last tick rendered against.
    pub fn registry(&self) -> Arc<PointRegistry> {
        self.registry.current()
    }

    pub fn registry_handle(&self) -> &RegistryHandle {
        &self.registry
    }

    pub fn colors(&self) -> &ColorBuffer {
        &self.colors
    }

    /// Replace the layout with a saved file and queue a rebuild.
    pub fn load_layout_file(&mut self, path: &Path) -> PrairieResult<()> {
        let file = load_layout(path)?;
        info!(
            "[layout] loading '{}' ({} fixtures)",
            file.label,
            file.fixtures.len()
        );
        self.layout.import_records(&file.fixtures);
        self.request_rebuild();
        Ok(())
    }

    pub fn save_layout_file(&self, path: &Path, label: &str) -> Result<(), LayoutError> {
        save_layout(path, &LayoutFile::new(label, self.layout.export_records()))
    }

    /// Register a group. Anything it cached against another registry is dropped.
    pub fn add_group(&mut self, mut group: LayerGroup) -> PrairieResult<()> {
        if self.groups.iter().any(|g| g.name() == group.name()) {
            return Err(PrairieError::DuplicateName(group.name().to_string()));
        }
        debug!("[compositor] add group '{}'", group.name());
        group.notify_layout_changed();
        self.groups.push(group);
        Ok(())
    }

    pub fn remove_group(&mut self, name: &str) -> PrairieResult<LayerGroup> {
        let index = self
            .groups
            .iter()
            .position(|g| g.name() == name)
            .ok_or_else(|| PrairieError::UnknownGroup(name.to_string()))?;
        Ok(self.groups.remove(index))
    }

    pub fn group(&self, name: &str) -> Option<&LayerGroup> {
        self.groups.iter().find(|g| g.name() == name)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut LayerGroup> {
        self.groups.iter_mut().find(|g| g.name() == name)
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.name()).collect()
    }

    /// Run one frame. A queued rebuild is published first, so the whole frame sees a
    /// single registry.
    pub fn tick(&mut self, dt: f32) {
        self.registry.publish_pending();
        let registry = self.registry.current();

        if registry.generation() != self.seen_generation {
            self.seen_generation = registry.generation();
            self.colors.reset(registry.len());
            for group in &mut self.groups {
                group.notify_layout_changed();
            }
        }

        if self.settings.clear_each_frame {
            self.colors.clear();
        }

        for group in &mut self.groups {
            group.run_frame(dt, &registry, &mut self.colors);
        }
    }

    fn group_or_err(&self, name: &str) -> PrairieResult<&LayerGroup> {
        self.group(name)
            .ok_or_else(|| PrairieError::UnknownGroup(name.to_string()))
    }

    fn group_mut_or_err(&mut self, name: &str) -> PrairieResult<&mut LayerGroup> {
        self.group_mut(name)
            .ok_or_else(|| PrairieError::UnknownGroup(name.to_string()))
    }

    pub fn get_param(&self, path: &str) -> PrairieResult<ParamValue> {
        match parse_path(path)? {
            ParamPath::Group { group, param } => {
                Ok(self.group_or_err(group)?.get_param(param)?)
            }
            ParamPath::Layer {
                group,
                layer,
                param,
            } => {
                let g = self.group_or_err(group)?;
                let l = g.layer(layer).ok_or_else(|| PrairieError::UnknownLayer {
                    group: group.to_string(),
                    layer: layer.to_string(),
                })?;
                Ok(l.get_param(param)?)
            }
        }
    }

    fn write_param(&mut self, path: &str, value: ParamWrite<'_>) -> PrairieResult<()> {
        match parse_path(path)? {
            ParamPath::Group { group, param } => {
                value.apply(self.group_mut_or_err(group)?, param)?;
            }
            ParamPath::Layer {
                group,
                layer,
                param,
            } => {
                let g = self.group_mut_or_err(group)?;
                let l = g.layer_mut(layer).ok_or_else(|| PrairieError::UnknownLayer {
                    group: group.to_string(),
                    layer: layer.to_string(),
                })?;
                value.apply(l, param)?;
            }
        }
        debug!("[params] {} = {}", path, value);
        Ok(())
    }

    /// Set a parameter by `group/param` or `group/layer/param`.
    pub fn set_param(&mut self, path: &str, value: &ParamValue) -> PrairieResult<()> {
        self.write_param(path, ParamWrite::Value(value))
    }

    /// Command-bus form of `set_param`; the raw text is parsed by the parameter's kind.
    pub fn set_param_str(&mut self, path: &str, raw: &str) -> PrairieResult<()> {
        self.write_param(path, ParamWrite::Raw(raw))
    }

    pub fn capture_group(&self, group: &str, name: &str) -> PrairieResult<Snapshot> {
        Ok(Snapshot::capture_group(name, self.group_or_err(group)?))
    }

    pub fn restore_group(&mut self, group: &str, snapshot: &Snapshot) -> PrairieResult<usize> {
        Ok(snapshot.restore_group(self.group_mut_or_err(group)?))
    }

    /// Addressed RGB triples for the transport, in global index order.
    pub fn output_triples(&self) -> Vec<PointOutput> {
        output_triples(
            &self.registry.current(),
            &self.colors,
            self.settings.max_dimmer,
        )
    }

    pub fn dmx_frames(&self) -> BTreeMap<u32, DmxFrame> {
        generate_dmx(
            &self.registry.current(),
            &self.colors,
            self.settings.max_dimmer,
        )
    }
}

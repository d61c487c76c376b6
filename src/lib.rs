//! Address allocation and layered pattern compositing for spatial light-point installations.
//!
//! Fixtures are placed into a [`fixtures::FixtureLayout`], which hands every point a global
//! index and a `(universe, channel)` address. A [`show::Show`] publishes the layout as an
//! immutable [`fixtures::PointRegistry`], composites its layer groups onto a
//! [`compositor::ColorBuffer`] once per tick, and exposes the result as addressed RGB
//! triples for the output transport.

pub mod blend;
pub mod compositor;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod models;
pub mod palette;
pub mod params;
pub mod patterns;
pub mod settings;
pub mod show;
pub mod snapshot;

pub use blend::{BlendMode, BlendSettings};
pub use compositor::{ColorBuffer, LayerGroup};
pub use error::{LayoutError, ParamError, PrairieError, PrairieResult};
pub use models::{Fixture, FixturePlacement, Rgba, SpatialPoint};
pub use params::{ParamValue, Parameterized};
pub use patterns::PatternLayer;
pub use settings::ShowSettings;
pub use show::Show;
pub use snapshot::Snapshot;

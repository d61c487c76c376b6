use std::path::PathBuf;

use crate::params::ParamKind;

pub type PrairieResult<T> = Result<T, PrairieError>;

#[derive(thiserror::Error, Debug)]
pub enum PrairieError {
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("parameter error: {0}")]
    Param(#[from] ParamError),

    #[error("no layer group named '{0}'")]
    UnknownGroup(String),

    #[error("group '{group}' has no layer named '{layer}'")]
    UnknownLayer { group: String, layer: String },

    #[error("name '{0}' is already registered")]
    DuplicateName(String),
}

/// Errors raised at the layout/placement boundary. Address allocation itself never fails.
#[derive(thiserror::Error, Debug)]
pub enum LayoutError {
    #[error("fixture at ({x:.2}, {z:.2}) is within {min_spacing}m of fixture {existing}")]
    TooClose {
        x: f32,
        z: f32,
        min_spacing: f32,
        existing: u32,
    },

    #[error("no fixture with id {0}")]
    UnknownFixture(u32),

    #[error("unsupported layout file version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("failed to parse layout: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to access layout file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("unknown parameter '{0}'")]
    Unknown(String),

    #[error("parameter '{name}' expects {expected:?}")]
    TypeMismatch { name: String, expected: ParamKind },

    #[error("cannot parse '{raw}' for parameter '{name}'")]
    Unparsable { name: String, raw: String },

    #[error("'{value}' is not a valid choice for '{name}'")]
    InvalidChoice { name: String, value: String },

    #[error("malformed parameter path '{0}'")]
    BadPath(String),
}

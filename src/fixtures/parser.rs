use log::warn;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::LayoutError;
use crate::models::{LayoutFile, LAYOUT_FILE_VERSION};

/// A layout file found on disk, for pickers that list saved layouts.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEntry {
    pub label: String,
    pub fixture_count: usize,
    pub path: PathBuf,
}

pub fn parse_layout(content: &str) -> Result<LayoutFile, LayoutError> {
    let file: LayoutFile = serde_json::from_str(content)?;
    if file.version != LAYOUT_FILE_VERSION {
        return Err(LayoutError::UnsupportedVersion {
            found: file.version,
            expected: LAYOUT_FILE_VERSION,
        });
    }
    Ok(file)
}

pub fn load_layout(path: &Path) -> Result<LayoutFile, LayoutError> {
    let content = fs::read_to_string(path).map_err(|source| LayoutError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_layout(&content)
}

pub fn save_layout(path: &Path, layout: &LayoutFile) -> Result<(), LayoutError> {
    let json = serde_json::to_string_pretty(layout)?;
    fs::write(path, json).map_err(|source| LayoutError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Every readable `.json` layout directly inside `root`, sorted by label.
/// Files that fail to parse are skipped with a warning.
pub fn list_layouts(root: &Path) -> Vec<LayoutEntry> {
    let mut entries: Vec<LayoutEntry> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .filter_map(|e| match load_layout(e.path()) {
            Ok(file) => Some(LayoutEntry {
                label: if file.label.is_empty() {
                    e.path()
                        .file_stem()
                        .unwrap_or_default()
                        .to_string_lossy()
                        .to_string()
                } else {
                    file.label
                },
                fixture_count: file.fixtures.len(),
                path: e.path().to_path_buf(),
            }),
            Err(err) => {
                warn!("[layout] skipping {}: {}", e.path().display(), err);
                None
            }
        })
        .collect();

    entries.sort_by(|a, b| a.label.cmp(&b.label).then(a.path.cmp(&b.path)));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_record_uses_defaults() {
        let json = r#"{
            "version": 1,
            "fixtures": [
                { "x": 1.0, "z": -2.0, "pointCount": 7 },
                { "x": 4.0, "y": 0.5, "z": 0.0, "pointCount": 7,
                  "address": { "universe": 3, "channel": 42 }, "tags": ["ring"] }
            ]
        }"#;
        let file = parse_layout(json).unwrap();

        assert_eq!(file.label, "");
        assert_eq!(file.fixtures[0].y, 0.0);
        assert!(file.fixtures[0].address.is_none());
        assert_eq!(file.fixtures[1].address.map(|a| a.channel), Some(42));
        assert_eq!(file.fixtures[1].tags, vec!["ring".to_string()]);
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let err = parse_layout(r#"{ "version": 9, "fixtures": [] }"#).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::UnsupportedVersion { found: 9, expected: 1 }
        ));
        assert!(matches!(
            parse_layout("not json").unwrap_err(),
            LayoutError::Parse(_)
        ));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_layout(Path::new("/nonexistent/prairie.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/prairie.json"));
    }
}

//! Reading and normalizing scene list files.
//!
//! Three layouts are accepted: a plain array of scenes, an object wrapping
//! the array under `"scenes"`, and the legacy object keyed by scene index
//! (`{"1": {...}, "2": {...}}`). Everything is normalized to the array form.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::scenes::domain::scene::Scene;
use crate::scenes::domain::scene_timeline::SceneTimeline;

const WRAPPER_KEY: &str = "scenes";

#[derive(Error, Debug)]
pub enum SceneFileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unexpected scene file layout in {path}: {detail}")]
    UnexpectedShape { path: PathBuf, detail: String },
}

/// Loads a scene file into a timeline.
///
/// Entries that do not describe a scene are logged and skipped so one bad
/// record does not hide the rest of the movie.
pub fn load(path: &Path) -> Result<SceneTimeline, SceneFileError> {
    let raw = read_value(path)?;
    let entries = normalize(raw).map_err(|detail| SceneFileError::UnexpectedShape {
        path: path.to_path_buf(),
        detail,
    })?;

    let mut scenes = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<Scene>(entry) {
            Ok(scene) => scenes.push(scene),
            Err(e) => log::warn!("Skipping scene entry #{} in {}: {e}", i + 1, path.display()),
        }
    }

    let timeline = SceneTimeline::new(scenes);
    for warning in timeline.validate() {
        log::warn!("{}: {warning}", path.display());
    }
    Ok(timeline)
}

pub fn read_value(path: &Path) -> Result<Value, SceneFileError> {
    let text = fs::read_to_string(path).map_err(|e| SceneFileError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| SceneFileError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Converts any accepted layout into the list of raw scene entries.
///
/// Legacy keyed objects are ordered by their integer keys; if any key is
/// not an integer the entries keep their order of appearance in the file.
pub fn normalize(value: Value) -> Result<Vec<Value>, String> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            if let Some(wrapped) = map.remove(WRAPPER_KEY) {
                return match wrapped {
                    Value::Array(items) => Ok(items),
                    other => Err(format!(
                        "\"{WRAPPER_KEY}\" must be an array, found {}",
                        kind(&other)
                    )),
                };
            }
            Ok(order_keyed(map))
        }
        other => Err(format!(
            "expected an array or object of scenes, found {}",
            kind(&other)
        )),
    }
}

/// Rewrites a scene file in normalized array form.
///
/// `src` and `dst` may be the same file. Unknown fields inside each scene
/// are carried through untouched. Returns the number of scenes written.
pub fn convert(src: &Path, dst: &Path) -> Result<usize, SceneFileError> {
    let raw = read_value(src)?;
    let entries = normalize(raw).map_err(|detail| SceneFileError::UnexpectedShape {
        path: src.to_path_buf(),
        detail,
    })?;
    let count = entries.len();
    write_entries(dst, &entries)?;
    Ok(count)
}

fn write_entries(path: &Path, entries: &[Value]) -> Result<(), SceneFileError> {
    let json = serde_json::to_string_pretty(entries).map_err(|e| SceneFileError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SceneFileError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    fs::write(path, json).map_err(|e| SceneFileError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

fn order_keyed(map: Map<String, Value>) -> Vec<Value> {
    let keys: Option<Vec<i64>> = map.keys().map(|k| k.trim().parse().ok()).collect();
    let values = map.into_iter().map(|(_, v)| v);
    match keys {
        Some(keys) => {
            let mut keyed: Vec<(i64, Value)> = keys.into_iter().zip(values).collect();
            keyed.sort_by_key(|(k, _)| *k);
            keyed.into_iter().map(|(_, v)| v).collect()
        }
        None => values.collect(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_json(dir: &TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    fn numbers(entries: &[Value]) -> Vec<Value> {
        entries.iter().map(|e| e["number"].clone()).collect()
    }

    #[test]
    fn test_normalize_array_passes_through() {
        let entries = normalize(json!([{"number": 2}, {"number": 1}])).unwrap();
        assert_eq!(numbers(&entries), vec![json!(2), json!(1)]);
    }

    #[test]
    fn test_normalize_unwraps_scenes_key() {
        let entries = normalize(json!({"scenes": [{"number": 1}]})).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_normalize_wrapped_non_array_is_error() {
        let err = normalize(json!({"scenes": {"1": {}}})).unwrap_err();
        assert!(err.contains("must be an array"));
    }

    #[test]
    fn test_normalize_sorts_keyed_map_numerically() {
        let entries = normalize(json!({
            "10": {"number": 10},
            "2": {"number": 2},
            "1": {"number": 1}
        }))
        .unwrap();
        assert_eq!(numbers(&entries), vec![json!(1), json!(2), json!(10)]);
    }

    #[test]
    fn test_normalize_non_integer_keys_keep_file_order() {
        let entries = normalize(json!({
            "b": {"number": "b"},
            "10": {"number": 10},
            "a": {"number": "a"}
        }))
        .unwrap();
        assert_eq!(numbers(&entries), vec![json!("b"), json!(10), json!("a")]);
    }

    #[test]
    fn test_normalize_rejects_scalars() {
        assert!(normalize(json!(42)).unwrap_err().contains("a number"));
    }

    #[test]
    fn test_convert_rewrites_in_place() {
        let dir = TempDir::new().unwrap();
        let path = write_json(
            &dir,
            "scenes.json",
            r#"{"2": {"number": 2, "description": "Палаты"}, "1": {"number": 1, "extra": true}}"#,
        );

        let count = convert(&path, &path).unwrap();
        assert_eq!(count, 2);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("Палаты"), "non-ASCII must not be escaped");
        assert!(text.starts_with("[\n  {"), "two-space indented array");
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["number"], json!(1));
        assert_eq!(value[0]["extra"], json!(true));
        assert_eq!(value[1]["number"], json!(2));
    }

    #[test]
    fn test_convert_to_new_file_creates_parents() {
        let dir = TempDir::new().unwrap();
        let src = write_json(&dir, "in.json", r#"[{"number": 1}]"#);
        let dst = dir.path().join("out").join("scenes_list.json");
        assert_eq!(convert(&src, &dst).unwrap(), 1);
        assert!(dst.exists());
    }

    #[test]
    fn test_convert_missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.json");
        let err = convert(&missing, &missing).unwrap_err();
        assert!(matches!(err, SceneFileError::Read { .. }));
    }

    #[test]
    fn test_load_invalid_json_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_json(&dir, "bad.json", "[{");
        assert!(matches!(load(&path), Err(SceneFileError::Parse { .. })));
    }

    #[test]
    fn test_load_skips_bad_entries() {
        let dir = TempDir::new().unwrap();
        let path = write_json(
            &dir,
            "scenes.json",
            r#"[{"number": 1, "start": 0, "end": 5}, 7, {"number": 2, "start": "x"}, {"number": 3}]"#,
        );
        let timeline = load(&path).unwrap();
        let labels: Vec<String> = timeline.scenes().iter().map(|s| s.label()).collect();
        assert_eq!(labels, vec!["1", "3"]);
    }

    #[test]
    fn test_load_accepts_all_layouts() {
        let dir = TempDir::new().unwrap();
        let layouts = [
            r#"[{"number": 1}]"#,
            r#"{"scenes": [{"number": 1}]}"#,
            r#"{"0": {"number": 1}}"#,
        ];
        for (i, text) in layouts.iter().enumerate() {
            let path = write_json(&dir, &format!("s{i}.json"), text);
            assert_eq!(load(&path).unwrap().len(), 1, "layout {text}");
        }
    }

    #[test]
    fn test_unusual_scalar_values_keep_the_scene() {
        let dir = TempDir::new().unwrap();
        let path = write_json(
            &dir,
            "scenes.json",
            r#"[
                {"number": 2.5, "start": 0, "end": 5, "description": 42},
                {"number": 18446744073709551615, "start": 5, "end": 9, "image_link": 7}
            ]"#,
        );

        let timeline = load(&path).unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.scenes()[0].label(), "2.5");
        assert_eq!(timeline.scenes()[0].description, "42");
        assert_eq!(timeline.scenes()[1].label(), "18446744073709551615");
        assert_eq!(timeline.scenes()[1].image_link, "7");
    }
}

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::shared::constants::UNKNOWN_SCENE_LABEL;

/// Scene identifier as authored: usually an integer, sometimes a label.
///
/// Fractional or out-of-range numbers are kept as the JSON number they were
/// written as.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SceneNumber {
    Index(i64),
    Number(serde_json::Number),
    Label(String),
}

impl fmt::Display for SceneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneNumber::Index(n) => write!(f, "{n}"),
            SceneNumber::Number(n) => write!(f, "{n}"),
            SceneNumber::Label(s) => f.write_str(s),
        }
    }
}

/// A labeled time interval of the movie.
///
/// Deserialization is lenient the way hand-edited scene files need it to
/// be: absent fields fall back to empty values, times may be numeric
/// strings, and a single actor image may be given as a bare string.
/// `start <= end` is expected but not enforced; see
/// [`SceneTimeline::validate`](super::scene_timeline::SceneTimeline::validate).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<SceneNumber>,
    #[serde(default, deserialize_with = "seconds")]
    pub start: f64,
    #[serde(default, deserialize_with = "seconds")]
    pub end: f64,
    #[serde(default, deserialize_with = "text")]
    pub description: String,
    #[serde(default, deserialize_with = "text")]
    pub image_link: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub image_act_link: Vec<String>,
}

impl Scene {
    /// Scene number for display and output records, `"?"` when absent.
    pub fn label(&self) -> String {
        self.number
            .as_ref()
            .map(|n| n.to_string())
            .unwrap_or_else(|| UNKNOWN_SCENE_LABEL.to_string())
    }

    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Half-open containment: `start <= t < end`.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }

    /// Thumbnail location under `data_dir`, `None` when the scene has none.
    pub fn thumbnail_path(&self, data_dir: &Path) -> Option<PathBuf> {
        if self.image_link.trim().is_empty() {
            return None;
        }
        Some(data_dir.join(&self.image_link))
    }

    /// Actor image locations under `data_dir`, paired with the raw link.
    pub fn actor_images(&self, data_dir: &Path) -> Vec<(String, PathBuf)> {
        self.image_act_link
            .iter()
            .filter(|link| !link.trim().is_empty())
            .map(|link| (link.clone(), data_dir.join(link)))
            .collect()
    }

    /// Display name of an actor image: its file stem.
    pub fn actor_name(link: &str) -> String {
        Path::new(link)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| link.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Seconds {
    Number(f64),
    Text(String),
}

fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Option::<Seconds>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(Seconds::Number(v)) => Ok(v),
        Some(Seconds::Text(s)) if s.trim().is_empty() => Ok(0.0),
        Some(Seconds::Text(s)) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid time value: {s:?}"))),
    }
}

/// Strings as-is; any other JSON value as its JSON text.
fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) if s.is_empty() => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Scene {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_full_scene_parses() {
        let scene = parse(json!({
            "number": 4,
            "start": 12.5,
            "end": 30,
            "description": "Квартира Тимофеева",
            "image_link": "thumbs/4.jpg",
            "image_act_link": ["actors/Бунша.jpg", "actors/Жорж.jpg"]
        }));
        assert_eq!(scene.number, Some(SceneNumber::Index(4)));
        assert_relative_eq!(scene.start, 12.5);
        assert_relative_eq!(scene.end, 30.0);
        assert_eq!(scene.description, "Квартира Тимофеева");
        assert_eq!(scene.image_act_link.len(), 2);
    }

    #[test]
    fn test_missing_fields_default() {
        let scene = parse(json!({}));
        assert_eq!(scene.number, None);
        assert_eq!(scene.start, 0.0);
        assert_eq!(scene.end, 0.0);
        assert!(scene.description.is_empty());
        assert!(scene.image_act_link.is_empty());
        assert_eq!(scene.label(), "?");
    }

    #[test]
    fn test_null_fields_default() {
        let scene = parse(json!({
            "start": null, "description": null, "image_act_link": null
        }));
        assert_eq!(scene.start, 0.0);
        assert!(scene.description.is_empty());
        assert!(scene.image_act_link.is_empty());
    }

    #[rstest]
    #[case(json!("12.25"), 12.25)]
    #[case(json!(" 7 "), 7.0)]
    #[case(json!(3), 3.0)]
    #[case(json!(""), 0.0)]
    fn test_start_accepts_numbers_and_numeric_strings(
        #[case] start: serde_json::Value,
        #[case] expected: f64,
    ) {
        let scene = parse(json!({ "start": start }));
        assert_relative_eq!(scene.start, expected);
    }

    #[test]
    fn test_non_numeric_time_is_rejected() {
        let result = serde_json::from_value::<Scene>(json!({ "start": "soon" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_single_actor_string_becomes_list() {
        let scene = parse(json!({ "image_act_link": "actors/Шпак.jpg" }));
        assert_eq!(scene.image_act_link, vec!["actors/Шпак.jpg".to_string()]);
    }

    #[rstest]
    #[case::label(json!("12a"), "12a")]
    #[case::integer(json!(7), "7")]
    #[case::fractional(json!(2.5), "2.5")]
    #[case::beyond_i64(json!(18446744073709551615u64), "18446744073709551615")]
    fn test_number_label(#[case] number: serde_json::Value, #[case] expected: &str) {
        let scene = parse(json!({ "number": number }));
        assert_eq!(scene.label(), expected);
    }

    #[rstest]
    #[case::integer(json!(5), "5")]
    #[case::float(json!(1.5), "1.5")]
    #[case::boolean(json!(true), "true")]
    #[case::text(json!("Палата"), "Палата")]
    fn test_text_fields_accept_any_scalar(
        #[case] value: serde_json::Value,
        #[case] expected: &str,
    ) {
        let scene = parse(json!({ "description": value.clone(), "image_link": value }));
        assert_eq!(scene.description, expected);
        assert_eq!(scene.image_link, expected);
    }

    #[test]
    fn test_fractional_number_round_trips() {
        let scene = parse(json!({ "number": 2.5 }));
        assert_eq!(serde_json::to_value(&scene).unwrap()["number"], json!(2.5));
    }

    #[rstest]
    #[case(10.0, true)]
    #[case(15.0, true)]
    #[case(20.0, false)]
    #[case(9.99, false)]
    fn test_contains_is_half_open(#[case] t: f64, #[case] expected: bool) {
        let scene = Scene {
            start: 10.0,
            end: 20.0,
            ..Scene::default()
        };
        assert_eq!(scene.contains(t), expected);
    }

    #[test]
    fn test_inverted_scene_has_zero_duration() {
        let scene = Scene {
            start: 20.0,
            end: 10.0,
            ..Scene::default()
        };
        assert_eq!(scene.duration(), 0.0);
        assert!(!scene.contains(15.0));
    }

    #[test]
    fn test_paths_resolve_under_data_dir() {
        let scene = parse(json!({
            "image_link": "thumbs/1.jpg",
            "image_act_link": ["actors/Иван.jpg", "  "]
        }));
        let dir = Path::new("/movie/data");
        assert_eq!(
            scene.thumbnail_path(dir),
            Some(PathBuf::from("/movie/data/thumbs/1.jpg"))
        );
        let actors = scene.actor_images(dir);
        assert_eq!(actors.len(), 1);
        assert_eq!(actors[0].1, PathBuf::from("/movie/data/actors/Иван.jpg"));
    }

    #[test]
    fn test_empty_image_link_has_no_thumbnail() {
        assert_eq!(Scene::default().thumbnail_path(Path::new("/data")), None);
    }

    #[test]
    fn test_actor_name_is_file_stem() {
        assert_eq!(Scene::actor_name("actors/Жорж Милославский.png"), "Жорж Милославский");
        assert_eq!(Scene::actor_name("Иван"), "Иван");
    }

    #[test]
    fn test_serialize_omits_missing_number() {
        let value = serde_json::to_value(Scene::default()).unwrap();
        assert!(value.get("number").is_none());
        assert_eq!(value["image_act_link"], json!([]));
    }
}

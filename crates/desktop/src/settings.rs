use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cinescope_core::shared::constants::APP_DIR_NAME;

/// Overrides the configured data directory when set.
pub const DATA_DIR_ENV: &str = "CINESCOPE_DATA_DIR";

const DEFAULT_DATA_DIR: &str = "data";

const DEFAULT_MOVIE_TITLE: &str = "Иван Васильевич меняет профессию";

const DEFAULT_MOVIE_DESCRIPTION: &str = "Инженер-изобретатель Тимофеев сконструировал машину \
времени, которая соединила его квартиру с XVI веком, точнее, с палатами государя Ивана \
Грозного. Туда-то и попадают тёзка царя пенсионер-общественник Иван Васильевич Бунша и \
квартирный вор Жорж Милославский, а сам великий государь оказывается в квартире Тимофеева.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    System,
    Dark,
    Light,
}

impl Appearance {
    pub const ALL: &[Appearance] = &[Appearance::System, Appearance::Dark, Appearance::Light];
}

impl std::fmt::Display for Appearance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Appearance::System => write!(f, "System"),
            Appearance::Dark => write!(f, "Dark"),
            Appearance::Light => write!(f, "Light"),
        }
    }
}

/// Viewer configuration, persisted as JSON between runs.
///
/// File names are relative to the data directory; scene thumbnails and
/// actor images inside the scene list are relative to it too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: Option<PathBuf>,
    pub scenes_file: String,
    pub video_file: String,
    pub banner_file: String,
    pub movie_title: String,
    pub movie_description: String,
    pub appearance: Appearance,
    pub high_contrast: bool,
    pub font_scale: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            scenes_file: "scenes_wrapped_fixed_jpg.json".into(),
            video_file: "movie.mp4".into(),
            banner_file: "banner.jpg".into(),
            movie_title: DEFAULT_MOVIE_TITLE.into(),
            movie_description: DEFAULT_MOVIE_DESCRIPTION.into(),
            appearance: Appearance::Dark,
            high_contrast: false,
            font_scale: 1.0,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("viewer.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Missing or unreadable files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(json) = fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed settings {}: {e}", path.display());
            Self::default()
        })
    }

    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            return;
        };
        if let Err(e) = self.save_to(&path) {
            log::warn!("Cannot save settings to {}: {e}", path.display());
        }
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, json)
    }

    /// The data directory, honoring [`DATA_DIR_ENV`].
    pub fn data_dir(&self) -> PathBuf {
        resolve_data_dir(std::env::var_os(DATA_DIR_ENV), self.data_dir.as_deref())
    }

    pub fn scenes_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.scenes_file)
    }

    pub fn video_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.video_file)
    }

    pub fn banner_path(&self, data_dir: &Path) -> Option<PathBuf> {
        if self.banner_file.trim().is_empty() {
            return None;
        }
        Some(data_dir.join(&self.banner_file))
    }
}

fn resolve_data_dir(env: Option<OsString>, configured: Option<&Path>) -> PathBuf {
    match env {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => configured
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("viewer.json");

        let settings = Settings {
            data_dir: Some(PathBuf::from("/movies/ivan")),
            font_scale: 1.25,
            appearance: Appearance::Light,
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(
            Settings::load_from(&tmp.path().join("absent.json")),
            Settings::default()
        );
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("viewer.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("viewer.json");
        fs::write(&path, r#"{"video_file": "film.mkv", "appearance": "light"}"#).unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.video_file, "film.mkv");
        assert_eq!(settings.appearance, Appearance::Light);
        assert_eq!(settings.scenes_file, Settings::default().scenes_file);
    }

    #[test]
    fn test_data_dir_resolution() {
        let configured = Path::new("/configured");
        assert_eq!(
            resolve_data_dir(Some("/from/env".into()), Some(configured)),
            PathBuf::from("/from/env")
        );
        assert_eq!(
            resolve_data_dir(Some("".into()), Some(configured)),
            PathBuf::from("/configured")
        );
        assert_eq!(resolve_data_dir(None, None), PathBuf::from("data"));
    }

    #[test]
    fn test_paths_are_relative_to_data_dir() {
        let settings = Settings::default();
        let dir = Path::new("/d");
        assert_eq!(settings.video_path(dir), PathBuf::from("/d/movie.mp4"));
        assert_eq!(
            settings.scenes_path(dir),
            PathBuf::from("/d/scenes_wrapped_fixed_jpg.json")
        );

        let no_banner = Settings {
            banner_file: String::new(),
            ..Settings::default()
        };
        assert!(no_banner.banner_path(dir).is_none());
    }
}

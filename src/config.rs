use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::photo::{DEFAULT_MAX_BYTES, DEFAULT_MAX_PIXELS, PhotoResolver};
use crate::theme::Theme;

const CANVAS_WIDTH: u32 = 800;
const CANVAS_HEIGHT: u32 = 1200;
const RENDER_TIMEOUT_MS: u64 = 5000;
const THEME: &str = "classic";

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Base for relative `allowed_roots`, and the one fallback directory tried
    /// for relative photo references that do not exist from the working
    /// directory.
    pub project_root: PathBuf,
    pub allowed_roots: Vec<PathBuf>,
    pub max_photo_bytes: u64,
    pub max_photo_pixels: u64,
    pub render_timeout_ms: u64,
    pub theme: String,
    pub theme_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            project_root: PathBuf::from("."),
            allowed_roots: vec![PathBuf::from("player_photos"), PathBuf::from("player_cards")],
            max_photo_bytes: DEFAULT_MAX_BYTES,
            max_photo_pixels: DEFAULT_MAX_PIXELS,
            render_timeout_ms: RENDER_TIMEOUT_MS,
            theme: THEME.to_string(),
            theme_file: None,
        }
    }
}

impl Settings {
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse settings TOML: {}", e))
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read settings file {}: {}", path.display(), e))?;
        Self::from_toml(&content)
    }

    /// Allowed photo roots with relative entries anchored at `project_root`.
    pub fn resolved_roots(&self) -> Vec<PathBuf> {
        self.allowed_roots
            .iter()
            .map(|root| {
                if root.is_absolute() {
                    root.clone()
                } else {
                    self.project_root.join(root)
                }
            })
            .collect()
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    /// `theme_file` wins over the built-in `theme` name.
    pub fn load_theme(&self) -> Result<Theme, String> {
        match &self.theme_file {
            Some(path) => Theme::from_file(path),
            None => Theme::from_builtin(&self.theme),
        }
    }

    pub fn photo_resolver(&self) -> PhotoResolver {
        PhotoResolver::new(self.resolved_roots(), Some(self.project_root.clone()))
            .with_limits(self.max_photo_bytes, self.max_photo_pixels)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(format!(
                "Canvas must be non-empty, got {}x{}",
                self.canvas_width, self.canvas_height
            ));
        }
        if self.render_timeout_ms == 0 {
            return Err("render_timeout_ms must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_means_defaults() {
        let settings = Settings::from_toml("").expect("empty toml");
        assert_eq!((settings.canvas_width, settings.canvas_height), (800, 1200));
        assert_eq!(settings.max_photo_bytes, 10 * 1024 * 1024);
        assert_eq!(settings.render_timeout(), Duration::from_secs(5));
        assert_eq!(settings.theme, "classic");
        settings.validate().expect("defaults are valid");
    }

    #[test]
    fn relative_roots_hang_off_project_root() {
        let settings = Settings::from_toml(
            r#"
project_root = "/srv/bot"
allowed_roots = ["player_photos", "/var/uploads"]
canvas_width = 1000
canvas_height = 1000
"#,
        )
        .expect("toml");
        assert_eq!(
            settings.resolved_roots(),
            vec![PathBuf::from("/srv/bot/player_photos"), PathBuf::from("/var/uploads")]
        );
        assert_eq!(settings.canvas_width, 1000);
    }

    #[test]
    fn theme_selection() {
        let settings = Settings {
            theme: "ember".to_string(),
            ..Settings::default()
        };
        assert!(settings.load_theme().is_ok());

        let missing = Settings {
            theme_file: Some(PathBuf::from("/definitely/not/here.toml")),
            ..Settings::default()
        };
        assert!(missing.load_theme().is_err());
    }

    #[test]
    fn rejects_degenerate_values() {
        let settings = Settings {
            canvas_width: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
        assert!(Settings::from_toml("canvas_width = \"wide\"").is_err());
    }
}

use serde::{Deserialize, Serialize};

use crate::model::StatKind;

const BUILTIN_THEMES: &[(&str, &str)] = &[
    ("classic", include_str!("../themes/classic.toml")),
    ("ember", include_str!("../themes/ember.toml")),
];

const DEFAULT_THEME: &str = "classic";

const FONT_FAMILY: &str = "sans-serif";
const TITLE_FONT_SIZE: f32 = 52.0;
const NICKNAME_FONT_SIZE: f32 = 42.0;
const NICKNAME_MIN_FONT_SIZE: f32 = 22.0;
const INFO_FONT_SIZE: f32 = 28.0;
const RATING_FONT_SIZE: f32 = 24.0;
const STATS_TITLE_FONT_SIZE: f32 = 28.0;
const STAT_LABEL_FONT_SIZE: f32 = 26.0;
const FOOTER_FONT_SIZE: f32 = 18.0;
const TEXT_STROKE_WIDTH: f32 = 3.0;

const MARGIN: f32 = 40.0;
const HEADER_FRACTION: f32 = 0.15;
const HEADER_PADDING: f32 = 20.0;
const PANEL_GAP: f32 = 20.0;
const INFO_PANEL_HEIGHT: f32 = 120.0;
const PANEL_PADDING: f32 = 20.0;
const PANEL_RADIUS: f32 = 10.0;
const STATS_TITLE_HEIGHT: f32 = 58.0;
const FOOTER_RESERVE: f32 = 80.0;
const FOOTER_OFFSET: f32 = 30.0;
const STAT_LABEL_HEIGHT: f32 = 36.0;
const LABEL_BAR_GAP: f32 = 10.0;
const BAR_HEIGHT: f32 = 30.0;
const AVATAR_GAP: f32 = 16.0;

/// Everything visual about a card: colors, type, captions and layout metrics.
///
/// Built once at startup and shared read-only by the layout engine and the
/// renderer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub palette: Palette,
    pub typography: Typography,
    pub captions: Captions,
    pub photo: PhotoPlacement,
    pub layout: LayoutMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub background_start: String,
    pub background_end: String,
    pub overlay: String,
    pub overlay_opacity: f32,
    pub header_fill: String,
    pub header_opacity: f32,
    pub panel_fill: String,
    pub info_panel_opacity: f32,
    pub stats_panel_opacity: f32,
    pub title: String,
    pub nickname: String,
    pub text: String,
    pub experience: String,
    pub rank: String,
    pub rating: String,
    pub streak: String,
    pub stat_value: String,
    pub track_fill: String,
    pub track_stroke: String,
    pub footer: String,
    pub text_stroke: String,
    pub avatar_ring: String,
    pub band_high: String,
    pub band_good: String,
    pub band_mid: String,
    pub band_low: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background_start: "#1e1e2e".to_string(),
            background_end: "#2d2d44".to_string(),
            overlay: "#000000".to_string(),
            overlay_opacity: 0.6,
            header_fill: "#000000".to_string(),
            header_opacity: 0.8,
            panel_fill: "#000000".to_string(),
            info_panel_opacity: 0.7,
            stats_panel_opacity: 0.75,
            title: "#ffd700".to_string(),
            nickname: "#ffffff".to_string(),
            text: "#ffffff".to_string(),
            experience: "#ff8c00".to_string(),
            rank: "#ffd700".to_string(),
            rating: "#b0c4de".to_string(),
            streak: "#ff8c00".to_string(),
            stat_value: "#ffd700".to_string(),
            track_fill: "#1e1e1e".to_string(),
            track_stroke: "#b0c4de".to_string(),
            footer: "#999999".to_string(),
            text_stroke: "#000000".to_string(),
            avatar_ring: "#ffd700".to_string(),
            band_high: "#4ade80".to_string(),
            band_good: "#60a5fa".to_string(),
            band_mid: "#fbbf24".to_string(),
            band_low: "#f87171".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Typography {
    pub font_family: String,
    pub title_size: f32,
    pub nickname_size: f32,
    pub nickname_min_size: f32,
    pub info_size: f32,
    pub rating_size: f32,
    pub stats_title_size: f32,
    pub stat_label_size: f32,
    pub footer_size: f32,
    pub text_stroke_width: f32,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_family: FONT_FAMILY.to_string(),
            title_size: TITLE_FONT_SIZE,
            nickname_size: NICKNAME_FONT_SIZE,
            nickname_min_size: NICKNAME_MIN_FONT_SIZE,
            info_size: INFO_FONT_SIZE,
            rating_size: RATING_FONT_SIZE,
            stats_title_size: STATS_TITLE_FONT_SIZE,
            stat_label_size: STAT_LABEL_FONT_SIZE,
            footer_size: FOOTER_FONT_SIZE,
            text_stroke_width: TEXT_STROKE_WIDTH,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Captions {
    pub title: String,
    pub stats_title: String,
    pub footer: String,
    pub level: String,
    pub rank: String,
    pub experience_suffix: String,
    pub streak: String,
    pub streak_suffix: String,
    pub strength: String,
    pub agility: String,
    pub endurance: String,
    pub intelligence: String,
    pub charisma: String,
}

impl Default for Captions {
    fn default() -> Self {
        Self {
            title: "ИГРОВАЯ КАРТОЧКА".to_string(),
            stats_title: "ХАРАКТЕРИСТИКИ".to_string(),
            footer: "© Motivation Bot".to_string(),
            level: "Уровень".to_string(),
            rank: "Ранг".to_string(),
            experience_suffix: "XP".to_string(),
            streak: "Серия".to_string(),
            streak_suffix: "дн.".to_string(),
            strength: "Сила".to_string(),
            agility: "Ловкость".to_string(),
            endurance: "Выносливость".to_string(),
            intelligence: "Интеллект".to_string(),
            charisma: "Харизма".to_string(),
        }
    }
}

impl Captions {
    pub fn stat_label(&self, kind: StatKind) -> &str {
        match kind {
            StatKind::Strength => &self.strength,
            StatKind::Agility => &self.agility,
            StatKind::Endurance => &self.endurance,
            StatKind::Intelligence => &self.intelligence,
            StatKind::Charisma => &self.charisma,
        }
    }
}

/// Where the player photo goes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoPlacement {
    /// Cover-fit across the whole canvas, under a dark overlay.
    #[default]
    Background,
    /// A circle of fixed radius centered under the title.
    Inset { radius: f32 },
}

/// Fixed distances the layout engine works from. Pixel units, except
/// `header_fraction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutMetrics {
    pub margin: f32,
    /// Share of the canvas height taken by the header band.
    pub header_fraction: f32,
    /// Minimum space above and below the title/nickname block in the header.
    pub header_padding: f32,
    pub panel_gap: f32,
    pub info_panel_height: f32,
    pub panel_padding: f32,
    pub panel_radius: f32,
    pub stats_title_height: f32,
    pub footer_reserve: f32,
    pub footer_offset: f32,
    pub stat_label_height: f32,
    pub label_bar_gap: f32,
    pub bar_height: f32,
    pub avatar_gap: f32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            margin: MARGIN,
            header_fraction: HEADER_FRACTION,
            header_padding: HEADER_PADDING,
            panel_gap: PANEL_GAP,
            info_panel_height: INFO_PANEL_HEIGHT,
            panel_padding: PANEL_PADDING,
            panel_radius: PANEL_RADIUS,
            stats_title_height: STATS_TITLE_HEIGHT,
            footer_reserve: FOOTER_RESERVE,
            footer_offset: FOOTER_OFFSET,
            stat_label_height: STAT_LABEL_HEIGHT,
            label_bar_gap: LABEL_BAR_GAP,
            bar_height: BAR_HEIGHT,
            avatar_gap: AVATAR_GAP,
        }
    }
}

impl Theme {
    pub fn from_builtin(name: &str) -> Result<Self, String> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        let content = BUILTIN_THEMES
            .iter()
            .find(|(n, _)| *n == normalized)
            .map(|(_, c)| *c)
            .ok_or_else(|| {
                format!(
                    "Unknown built-in theme '{}'. Available: {}",
                    name,
                    Self::list_builtins().join(", ")
                )
            })?;
        Self::from_toml(content)
    }

    pub fn list_builtins() -> Vec<&'static str> {
        BUILTIN_THEMES.iter().map(|(n, _)| *n).collect()
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse theme TOML: {}", e))
    }

    pub fn from_yaml(content: &str) -> Result<Self, String> {
        serde_yaml::from_str(content).map_err(|e| format!("Failed to parse theme YAML: {}", e))
    }

    /// Loads a theme file, trying TOML first and then YAML.
    pub fn from_file(path: &std::path::Path) -> Result<Self, String> {
        if !path.is_file() {
            return Err(format!("Theme file not found: {}", path.display()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read theme file: {}", e))?;

        if let Ok(theme) = Self::from_toml(&content) {
            Ok(theme)
        } else if let Ok(theme) = Self::from_yaml(&content) {
            Ok(theme)
        } else {
            Err("Failed to parse theme file as TOML or YAML".to_string())
        }
    }

    pub fn builtin_default() -> Self {
        Self::from_builtin(DEFAULT_THEME).expect("built-in classic theme must parse")
    }
}

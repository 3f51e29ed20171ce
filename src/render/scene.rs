use std::f32::consts::PI;
use std::fmt::Write as _;

use crate::fonts::{TextMeasure, fit_font_size};
use crate::layout::{Geometry, PhotoRegion, Point, Rect, StatRow};
use crate::model::{CardModel, StatKind};
use crate::theme::Theme;

use super::{StatBand, TRACK_BORDER, bar_fill};

const NICKNAME_STEP: f32 = 2.0;
const GLYPH_GAP: f32 = 12.0;
const AVATAR_RING_WIDTH: f32 = 4.0;
const SUMMARY_GAP: f32 = 12.0;
const STREAK_MIN_SCALE: f32 = 0.6;

/// SVG layers for one card.
///
/// `backdrop` is painted first and covers the whole canvas, then the photo,
/// then `overlay`. A photo with transparent areas shows the backdrop through.
#[derive(Debug, Clone, PartialEq)]
pub struct CardScene {
    pub backdrop: String,
    pub overlay: String,
}

#[derive(Clone, Copy)]
enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

struct TextStyle<'a> {
    size: f32,
    fill: &'a str,
    bold: bool,
    anchor: Anchor,
    stroke: bool,
}

impl CardScene {
    pub fn compose(
        theme: &Theme,
        model: &CardModel,
        geometry: &Geometry,
        has_photo: bool,
        measure: &mut dyn TextMeasure,
    ) -> Self {
        let backdrop = Self::backdrop(theme, geometry);

        let mut svg = SceneWriter::new(theme);
        svg.photo_layer(geometry, has_photo, model.nickname());
        svg.header(geometry, model.nickname(), measure);
        svg.summary(geometry, model, measure);
        svg.stats(geometry, model);
        svg.footer(geometry);

        Self {
            backdrop,
            overlay: svg.finish(geometry),
        }
    }

    fn backdrop(theme: &Theme, geometry: &Geometry) -> String {
        format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
                r#"<defs><linearGradient id="bg" x1="0" y1="0" x2="1" y2="1">"#,
                r#"<stop offset="0" stop-color="{start}"/><stop offset="1" stop-color="{end}"/>"#,
                r#"</linearGradient></defs>"#,
                r#"<rect id="background" width="{w}" height="{h}" fill="url(#bg)"/></svg>"#
            ),
            w = geometry.width,
            h = geometry.height,
            start = theme.palette.background_start,
            end = theme.palette.background_end,
        )
    }
}

struct SceneWriter<'t> {
    theme: &'t Theme,
    body: String,
}

impl<'t> SceneWriter<'t> {
    fn new(theme: &'t Theme) -> Self {
        Self {
            theme,
            body: String::new(),
        }
    }

    fn finish(self, geometry: &Geometry) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">{body}</svg>"#,
            w = geometry.width,
            h = geometry.height,
            body = self.body,
        )
    }

    fn photo_layer(&mut self, geometry: &Geometry, has_photo: bool, nickname: &str) {
        let theme = self.theme;
        let palette = &theme.palette;
        match geometry.photo {
            PhotoRegion::Fill(rect) => {
                if has_photo {
                    self.rect("photo-overlay", &rect, 0.0, &palette.overlay, palette.overlay_opacity);
                }
            }
            PhotoRegion::Circle { center, radius } => {
                if has_photo {
                    let _ = write!(
                        self.body,
                        r#"<circle id="photo-overlay" cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}" fill-opacity="{:.2}"/>"#,
                        center.x, center.y, radius, palette.overlay, palette.overlay_opacity,
                    );
                } else {
                    self.avatar_placeholder(center, radius, nickname);
                }
                let _ = write!(
                    self.body,
                    r#"<circle id="avatar-ring" cx="{:.2}" cy="{:.2}" r="{:.2}" fill="none" stroke="{}" stroke-width="{:.1}"/>"#,
                    center.x, center.y, radius, palette.avatar_ring, AVATAR_RING_WIDTH,
                );
            }
        }
    }

    fn avatar_placeholder(&mut self, center: Point, radius: f32, nickname: &str) {
        let theme = self.theme;
        let palette = &theme.palette;
        let _ = write!(
            self.body,
            r#"<circle id="avatar-placeholder" cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}" fill-opacity="{:.2}"/>"#,
            center.x, center.y, radius, palette.panel_fill, palette.info_panel_opacity,
        );
        let initial: String = nickname.chars().take(1).flat_map(char::to_uppercase).collect();
        let style = TextStyle {
            size: radius,
            fill: &palette.title,
            bold: true,
            anchor: Anchor::Middle,
            stroke: false,
        };
        self.text(None, center.x, center.y + radius * 0.35, &initial, &style);
    }

    fn header(&mut self, geometry: &Geometry, nickname: &str, measure: &mut dyn TextMeasure) {
        let theme = self.theme;
        let palette = &theme.palette;
        let typo = &theme.typography;

        self.rect("header", &geometry.header, 0.0, &palette.header_fill, palette.header_opacity);

        let title = TextStyle {
            size: typo.title_size,
            fill: &palette.title,
            bold: true,
            anchor: Anchor::Middle,
            stroke: true,
        };
        self.text(
            Some("title"),
            geometry.title_baseline.x,
            geometry.title_baseline.y,
            &theme.captions.title,
            &title,
        );

        let max_width = geometry.nickname_max_width;
        let size = fit_font_size(
            measure,
            nickname,
            typo.nickname_size,
            typo.nickname_min_size,
            NICKNAME_STEP,
            max_width,
        );
        let style = TextStyle {
            size,
            fill: &palette.nickname,
            bold: true,
            anchor: Anchor::Middle,
            stroke: true,
        };
        // Still too wide at the minimum size: squeeze the glyphs.
        let squeeze = measure.text_width(nickname, size, true) > max_width;
        self.text_with(
            Some("nickname"),
            geometry.nickname_baseline.x,
            geometry.nickname_baseline.y,
            nickname,
            &style,
            squeeze.then_some(max_width),
        );
    }

    fn summary(&mut self, geometry: &Geometry, model: &CardModel, measure: &mut dyn TextMeasure) {
        let theme = self.theme;
        let palette = &theme.palette;
        let captions = &theme.captions;
        let info = &geometry.info;
        let radius = theme.layout.panel_radius;

        self.rect("summary", &info.bounds, radius, &palette.panel_fill, palette.info_panel_opacity);

        let style = |fill: &'t str| TextStyle {
            size: theme.typography.info_size,
            fill,
            bold: false,
            anchor: Anchor::Start,
            stroke: false,
        };

        let level = format!("{}: {}", captions.level, model.level());
        self.text(Some("level"), info.left_x, info.first_baseline, &level, &style(&palette.text));

        let experience = format!("{} {}", model.experience(), captions.experience_suffix);
        let mut xp = style(&palette.experience);
        xp.anchor = Anchor::End;
        self.text(Some("experience"), info.right_x, info.first_baseline, &experience, &xp);

        let rank = format!("{}: {}", captions.rank, model.rank());
        self.text(Some("rank"), info.left_x, info.second_baseline, &rank, &style(&palette.rank));

        let info_size = theme.typography.info_size;
        let rating_size = theme.typography.rating_size;
        let rank_right = info.left_x + measure.text_width(&rank, info_size, false);
        let rating = model.rating_position().map(|position| format!("#{position}"));
        let free_right = match &rating {
            Some(text) => info.right_x - measure.text_width(text, rating_size, true),
            None => info.right_x,
        };

        if let Some(streak) = model.days_streak() {
            let text = format!("{}: {} {}", captions.streak, streak, captions.streak_suffix);
            let span = (rank_right + SUMMARY_GAP, free_right - SUMMARY_GAP);
            self.streak(info.center_x, info.second_baseline, span, &text, measure);
        }

        if let Some(text) = rating {
            let style = TextStyle {
                size: rating_size,
                fill: &palette.rating,
                bold: true,
                anchor: Anchor::End,
                stroke: false,
            };
            self.text(Some("rating-position"), info.right_x, info.second_baseline, &text, &style);
        }
    }

    /// Streak text in the free span between rank and rating on the second
    /// line. Centered on the panel when it fits there, shrunk and then
    /// squeezed when the span is narrow, dropped when there is no span at all.
    fn streak(
        &mut self,
        center_x: f32,
        baseline: f32,
        (left, right): (f32, f32),
        text: &str,
        measure: &mut dyn TextMeasure,
    ) {
        let available = right - left;
        if available <= 0.0 {
            return;
        }

        let theme = self.theme;
        let info_size = theme.typography.info_size;
        let size = fit_font_size(
            measure,
            text,
            info_size,
            info_size * STREAK_MIN_SCALE,
            1.0,
            available,
        );
        let natural = measure.text_width(text, size, false);
        let width = natural.min(available);
        let x = center_x.max(left + width / 2.0).min(right - width / 2.0);

        let style = TextStyle {
            size,
            fill: &theme.palette.streak,
            bold: false,
            anchor: Anchor::Middle,
            stroke: false,
        };
        let squeeze = natural > available;
        self.text_with(Some("days-streak"), x, baseline, text, &style, squeeze.then_some(available));
    }

    fn stats(&mut self, geometry: &Geometry, model: &CardModel) {
        let theme = self.theme;
        let palette = &theme.palette;
        let radius = theme.layout.panel_radius;

        self.rect("stats", &geometry.stats_panel, radius, &palette.panel_fill, palette.stats_panel_opacity);

        let heading = TextStyle {
            size: theme.typography.stats_title_size,
            fill: &palette.title,
            bold: true,
            anchor: Anchor::Middle,
            stroke: false,
        };
        self.text(
            Some("stats-title"),
            geometry.stats_title_baseline.x,
            geometry.stats_title_baseline.y,
            &theme.captions.stats_title,
            &heading,
        );

        for ((kind, value), row) in model.stats().iter().zip(&geometry.rows) {
            self.stat_row(kind, value, row);
        }
    }

    fn stat_row(&mut self, kind: StatKind, value: u8, row: &StatRow) {
        let theme = self.theme;
        let palette = &theme.palette;
        let size = theme.typography.stat_label_size;
        let band_color = StatBand::from_value(value).color(palette);
        let key = kind.key();

        let _ = write!(self.body, r#"<g id="stat-{key}">"#);

        let glyph_radius = size * 0.4;
        let glyph_center = Point {
            x: row.label_x + glyph_radius,
            y: row.label_baseline - size * 0.35,
        };
        let _ = write!(
            self.body,
            r#"<path d="{}" fill="{}"/>"#,
            glyph_path(kind, glyph_center, glyph_radius),
            band_color,
        );

        let label = TextStyle {
            size,
            fill: &palette.text,
            bold: false,
            anchor: Anchor::Start,
            stroke: false,
        };
        self.text(
            None,
            row.label_x + glyph_radius * 2.0 + GLYPH_GAP,
            row.label_baseline,
            theme.captions.stat_label(kind),
            &label,
        );

        let value_style = TextStyle {
            size,
            fill: &palette.stat_value,
            bold: true,
            anchor: Anchor::End,
            stroke: false,
        };
        self.text(None, row.value_x, row.label_baseline, &format!("{value}/100"), &value_style);

        let track = &row.track;
        let _ = write!(
            self.body,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{:.2}" fill="{}" stroke="{}" stroke-width="{:.1}"/>"#,
            track.x + TRACK_BORDER / 2.0,
            track.y + TRACK_BORDER / 2.0,
            track.width - TRACK_BORDER,
            track.height - TRACK_BORDER,
            (track.height - TRACK_BORDER) / 2.0,
            palette.track_fill,
            palette.track_stroke,
            TRACK_BORDER,
        );

        let fill = bar_fill(track, value);
        if fill.width > 0.0 {
            let _ = write!(
                self.body,
                r#"<rect id="stat-{key}-fill" x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{:.2}" fill="{}"/>"#,
                fill.x,
                fill.y,
                fill.width,
                fill.height,
                (fill.height / 2.0).min(fill.width / 2.0),
                band_color,
            );
        }

        self.body.push_str("</g>");
    }

    fn footer(&mut self, geometry: &Geometry) {
        let theme = self.theme;
        let style = TextStyle {
            size: theme.typography.footer_size,
            fill: &theme.palette.footer,
            bold: false,
            anchor: Anchor::Middle,
            stroke: false,
        };
        self.text(
            Some("footer"),
            geometry.footer_baseline.x,
            geometry.footer_baseline.y,
            &theme.captions.footer,
            &style,
        );
    }

    fn rect(&mut self, id: &str, rect: &Rect, radius: f32, fill: &str, opacity: f32) {
        let _ = write!(
            self.body,
            r#"<rect id="{}" x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{:.2}" fill="{}" fill-opacity="{:.2}"/>"#,
            id, rect.x, rect.y, rect.width, rect.height, radius, fill, opacity,
        );
    }

    fn text(&mut self, id: Option<&str>, x: f32, y: f32, text: &str, style: &TextStyle) {
        self.text_with(id, x, y, text, style, None);
    }

    fn text_with(
        &mut self,
        id: Option<&str>,
        x: f32,
        y: f32,
        text: &str,
        style: &TextStyle,
        squeeze_to: Option<f32>,
    ) {
        let typo = &self.theme.typography;
        let id_attr = id.map(|id| format!(r#" id="{id}""#)).unwrap_or_default();
        let weight_attr = if style.bold { r#" font-weight="700""# } else { "" };
        let stroke_attr = if style.stroke {
            format!(
                r#" stroke="{}" stroke-width="{:.1}" stroke-linejoin="round" paint-order="stroke""#,
                self.theme.palette.text_stroke, typo.text_stroke_width,
            )
        } else {
            String::new()
        };
        let squeeze_attr = squeeze_to
            .map(|w| format!(r#" textLength="{w:.2}" lengthAdjust="spacingAndGlyphs""#))
            .unwrap_or_default();

        let _ = write!(
            self.body,
            r#"<text{} x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.2}" fill="{}" text-anchor="{}"{}{}{}>{}</text>"#,
            id_attr,
            x,
            y,
            escape_xml(&typo.font_family),
            style.size,
            style.fill,
            style.anchor.as_str(),
            weight_attr,
            stroke_attr,
            squeeze_attr,
            escape_xml(text),
        );
    }
}

/// Small vector icon for each stat, centered on `c`.
fn glyph_path(kind: StatKind, c: Point, r: f32) -> String {
    let points: Vec<(f32, f32)> = match kind {
        // Square
        StatKind::Strength => vec![
            (c.x - r * 0.8, c.y - r * 0.8),
            (c.x + r * 0.8, c.y - r * 0.8),
            (c.x + r * 0.8, c.y + r * 0.8),
            (c.x - r * 0.8, c.y + r * 0.8),
        ],
        // Arrow head pointing right
        StatKind::Agility => vec![(c.x - r, c.y - r), (c.x + r, c.y), (c.x - r, c.y + r)],
        // Hexagon
        StatKind::Endurance => regular_polygon(c, r, 6, 0.0),
        // Diamond
        StatKind::Intelligence => vec![(c.x, c.y - r), (c.x + r, c.y), (c.x, c.y + r), (c.x - r, c.y)],
        // Five-point star
        StatKind::Charisma => (0..10)
            .map(|i| {
                let radius = if i % 2 == 0 { r } else { r * 0.45 };
                let angle = -PI / 2.0 + i as f32 * PI / 5.0;
                (c.x + radius * angle.cos(), c.y + radius * angle.sin())
            })
            .collect(),
    };

    let mut d = String::new();
    for (i, (x, y)) in points.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{cmd}{x:.2},{y:.2} ");
    }
    d.push('Z');
    d
}

fn regular_polygon(c: Point, r: f32, sides: usize, rotation: f32) -> Vec<(f32, f32)> {
    (0..sides)
        .map(|i| {
            let angle = rotation + i as f32 * 2.0 * PI / sides as f32;
            (c.x + r * angle.cos(), c.y + r * angle.sin())
        })
        .collect()
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            // XML 1.0 forbids most C0 controls even when escaped.
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            '\u{FFFE}' | '\u{FFFF}' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}

//! Pure card geometry.
//!
//! The engine only looks at the canvas size, the number of stat rows and the
//! theme metrics. Same inputs, same [`Geometry`], on every call.

use crate::error::LayoutError;
use crate::theme::{LayoutMetrics, PhotoPlacement, Theme, Typography};

/// Approximate ascent as a fraction of the font size, used to turn a text box
/// top into a baseline.
const ASCENT: f32 = 0.8;
const TITLE_NICKNAME_GAP: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// True when the interiors share any area. Touching edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn within(&self, width: f32, height: f32) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.right() <= width && self.bottom() <= height
    }

    pub fn inset(&self, by: f32) -> Rect {
        Rect::new(
            self.x + by,
            self.y + by,
            (self.width - by * 2.0).max(0.0),
            (self.height - by * 2.0).max(0.0),
        )
    }
}

/// Area the player photo is painted into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhotoRegion {
    Fill(Rect),
    Circle { center: Point, radius: f32 },
}

impl PhotoRegion {
    pub fn bounds(&self) -> Rect {
        match *self {
            PhotoRegion::Fill(rect) => rect,
            PhotoRegion::Circle { center, radius } => Rect::new(
                center.x - radius,
                center.y - radius,
                radius * 2.0,
                radius * 2.0,
            ),
        }
    }
}

/// One stat line: label and value on top, progress track underneath.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatRow {
    pub bounds: Rect,
    pub label_baseline: f32,
    pub label_x: f32,
    pub value_x: f32,
    pub track: Rect,
}

/// Summary panel with two text lines, each with left/center/right anchors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfoPanel {
    pub bounds: Rect,
    pub first_baseline: f32,
    pub second_baseline: f32,
    pub left_x: f32,
    pub center_x: f32,
    pub right_x: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub width: f32,
    pub height: f32,
    pub header: Rect,
    pub title_baseline: Point,
    pub nickname_baseline: Point,
    pub nickname_max_width: f32,
    pub photo: PhotoRegion,
    pub info: InfoPanel,
    pub stats_panel: Rect,
    pub stats_title_baseline: Point,
    pub rows: Vec<StatRow>,
    pub footer_baseline: Point,
}

impl Geometry {
    /// Every laid-out rectangle, for bounds checks.
    pub fn rects(&self) -> Vec<Rect> {
        let mut rects = vec![
            self.header,
            self.photo.bounds(),
            self.info.bounds,
            self.stats_panel,
        ];
        for row in &self.rows {
            rects.push(row.bounds);
            rects.push(row.track);
        }
        rects
    }
}

#[derive(Debug, Clone)]
pub struct LayoutEngine {
    metrics: LayoutMetrics,
    typography: Typography,
    placement: PhotoPlacement,
}

impl LayoutEngine {
    pub fn new(theme: &Theme) -> Self {
        Self {
            metrics: theme.layout.clone(),
            typography: theme.typography.clone(),
            placement: theme.photo,
        }
    }

    pub fn compute(
        &self,
        stat_count: usize,
        canvas_width: u32,
        canvas_height: u32,
    ) -> Result<Geometry, LayoutError> {
        if stat_count == 0 {
            return Err(LayoutError::NoStats);
        }

        let m = &self.metrics;
        let t = &self.typography;
        let width = canvas_width as f32;
        let height = canvas_height as f32;
        let content_width = width - m.margin * 2.0;
        if content_width <= m.panel_padding * 2.0
            || !(m.header_fraction > 0.0 && m.header_fraction < 1.0)
        {
            return Err(LayoutError::CanvasTooSmall {
                width: canvas_width,
                height: canvas_height,
            });
        }

        // A fixed share of the height, but never less than the text needs.
        let text_block = t.title_size + TITLE_NICKNAME_GAP + t.nickname_size;
        let header_height = (height * m.header_fraction).max(text_block + m.header_padding * 2.0);
        if header_height > height {
            return Err(LayoutError::Overflow {
                needed: header_height,
                available: height,
            });
        }
        let header = Rect::new(0.0, 0.0, width, header_height);
        let text_top = header.y + (header.height - text_block) / 2.0;
        let title_baseline = Point {
            x: header.center_x(),
            y: text_top + t.title_size * ASCENT,
        };
        let nickname_baseline = Point {
            x: header.center_x(),
            y: text_top + t.title_size + TITLE_NICKNAME_GAP + t.nickname_size * ASCENT,
        };

        let (photo, below_header) = match self.placement {
            PhotoPlacement::Background => (
                PhotoRegion::Fill(Rect::new(0.0, 0.0, width, height)),
                header.bottom() + m.panel_gap,
            ),
            PhotoPlacement::Inset { radius } => {
                let center = Point {
                    x: width / 2.0,
                    y: header.bottom() + m.avatar_gap + radius,
                };
                (
                    PhotoRegion::Circle { center, radius },
                    center.y + radius + m.avatar_gap,
                )
            }
        };

        let info_bounds = Rect::new(m.margin, below_header, content_width, m.info_panel_height);
        let line_height = (info_bounds.height - m.panel_padding * 2.0) / 2.0;
        let info = InfoPanel {
            bounds: info_bounds,
            first_baseline: info_bounds.y
                + m.panel_padding
                + (line_height + t.info_size * ASCENT) / 2.0,
            second_baseline: info_bounds.y
                + m.panel_padding
                + line_height
                + (line_height + t.info_size * ASCENT) / 2.0,
            left_x: info_bounds.x + m.panel_padding,
            center_x: info_bounds.center_x(),
            right_x: info_bounds.right() - m.panel_padding,
        };

        let stats_top = info_bounds.bottom() + m.panel_gap;
        let stats_bottom = height - m.footer_reserve;
        let stats_panel = Rect::new(m.margin, stats_top, content_width, stats_bottom - stats_top);
        let stats_title_baseline = Point {
            x: stats_panel.center_x(),
            y: stats_top + m.panel_padding + t.stats_title_size * ASCENT,
        };

        let rows_top = stats_top + m.panel_padding + m.stats_title_height;
        let rows_bottom = stats_bottom - m.panel_padding;
        let available = rows_bottom - rows_top;
        let row_height = m.stat_label_height + m.label_bar_gap + m.bar_height;
        let needed = row_height * stat_count as f32;
        if available <= 0.0 || needed > available {
            return Err(LayoutError::Overflow {
                needed,
                available: available.max(0.0),
            });
        }

        // Rows sit at the top of equal slots; the spare space in each slot is
        // the gap to the next row.
        let slot = available / stat_count as f32;
        let inner_x = stats_panel.x + m.panel_padding;
        let inner_width = stats_panel.width - m.panel_padding * 2.0;
        let rows = (0..stat_count)
            .map(|index| {
                let top = rows_top + slot * index as f32;
                let bounds = Rect::new(inner_x, top, inner_width, row_height);
                StatRow {
                    bounds,
                    label_baseline: top + (m.stat_label_height + t.stat_label_size * ASCENT) / 2.0,
                    label_x: inner_x,
                    value_x: bounds.right(),
                    track: Rect::new(
                        inner_x,
                        top + m.stat_label_height + m.label_bar_gap,
                        inner_width,
                        m.bar_height,
                    ),
                }
            })
            .collect();

        let footer_baseline = Point {
            x: width / 2.0,
            y: height - m.footer_offset,
        };

        let geometry = Geometry {
            width,
            height,
            header,
            title_baseline,
            nickname_baseline,
            nickname_max_width: content_width,
            photo,
            info,
            stats_panel,
            stats_title_baseline,
            rows,
            footer_baseline,
        };

        if let Some(outside) = geometry.rects().into_iter().find(|r| !r.within(width, height)) {
            return Err(LayoutError::Overflow {
                needed: outside.bottom().max(outside.right()),
                available: height.min(width),
            });
        }
        if footer_baseline.y - t.footer_size * ASCENT < stats_panel.bottom() {
            return Err(LayoutError::Overflow {
                needed: stats_panel.bottom() + t.footer_size,
                available: height,
            });
        }

        Ok(geometry)
    }
}

//! Card painting.
//!
//! [`CardRenderer`] is the seam: a visual theme or drawing backend is a new
//! implementation of it. The shipped backend, [`SvgCardRenderer`], builds an
//! SVG scene for everything vector (panels, text, bars) and composites the
//! photo directly into the raster surface.

mod raster;
mod scene;

use std::sync::Arc;

use parking_lot::Mutex;
use resvg::usvg;
use tiny_skia::Pixmap;
use tracing::debug;

use crate::error::RenderError;
use crate::fonts::TextMeasure;
use crate::layout::{Geometry, Rect};
use crate::model::CardModel;
use crate::photo::ResolvedPhoto;
use crate::theme::{Palette, Theme};

pub use raster::{cover_fit, load_font_database};
pub use scene::CardScene;

/// Raster output of a render, premultiplied RGBA.
pub type RasterSurface = Pixmap;

/// Paints one card. Implementations hold only read-only state between calls.
pub trait CardRenderer: Send + Sync {
    fn render(
        &self,
        model: &CardModel,
        photo: ResolvedPhoto,
        geometry: &Geometry,
    ) -> Result<RasterSurface, RenderError>;
}

/// Color category for a stat value. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatBand {
    /// 80..=100
    Green,
    /// 60..=79
    Blue,
    /// 40..=59
    Amber,
    /// 0..=39
    Red,
}

impl StatBand {
    pub fn from_value(value: u8) -> Self {
        match value {
            80.. => StatBand::Green,
            60..=79 => StatBand::Blue,
            40..=59 => StatBand::Amber,
            _ => StatBand::Red,
        }
    }

    pub fn color(self, palette: &Palette) -> &str {
        match self {
            StatBand::Green => &palette.band_high,
            StatBand::Blue => &palette.band_good,
            StatBand::Amber => &palette.band_mid,
            StatBand::Red => &palette.band_low,
        }
    }
}

/// Track border width; the fill sits inside it.
pub const TRACK_BORDER: f32 = 2.0;

/// Filled part of a progress track for `value` out of 100.
pub fn bar_fill(track: &Rect, value: u8) -> Rect {
    let inner = track.inset(TRACK_BORDER);
    let ratio = f32::from(value.min(100)) / 100.0;
    Rect::new(inner.x, inner.y, inner.width * ratio, inner.height)
}

/// SVG scene + raster photo backend.
///
/// Text measurers are not shareable, so the renderer keeps a small pool of
/// idle ones. A render takes one out for the duration of scene building and
/// returns it afterwards; concurrent renders each get their own.
pub struct SvgCardRenderer<M> {
    theme: Theme,
    fontdb: Arc<usvg::fontdb::Database>,
    new_measure: Box<dyn Fn() -> M + Send + Sync>,
    idle_measures: Mutex<Vec<M>>,
}

impl<M: TextMeasure + Send> SvgCardRenderer<M> {
    pub fn new<F>(theme: Theme, new_measure: F) -> Self
    where
        F: Fn() -> M + Send + Sync + 'static,
    {
        Self::with_fonts(theme, new_measure, load_font_database())
    }

    pub fn with_fonts<F>(theme: Theme, new_measure: F, fontdb: Arc<usvg::fontdb::Database>) -> Self
    where
        F: Fn() -> M + Send + Sync + 'static,
    {
        Self {
            theme,
            fontdb,
            new_measure: Box::new(new_measure),
            idle_measures: Mutex::new(Vec::new()),
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Measurers created so far and currently idle.
    pub fn idle_measures(&self) -> usize {
        self.idle_measures.lock().len()
    }

    /// Builds the vector layers without rasterizing them.
    pub fn scene(&self, model: &CardModel, has_photo: bool, geometry: &Geometry) -> CardScene {
        let mut measure = self.checkout_measure();
        let scene = CardScene::compose(&self.theme, model, geometry, has_photo, &mut measure);
        self.idle_measures.lock().push(measure);
        scene
    }

    fn checkout_measure(&self) -> M {
        let idle = self.idle_measures.lock().pop();
        idle.unwrap_or_else(|| {
            debug!("creating text measurer");
            (self.new_measure)()
        })
    }

    fn rasterize(&self, svg: &str, pixmap: &mut Pixmap) -> Result<(), RenderError> {
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(svg, &opts).map_err(|e| RenderError::Svg(e.to_string()))?;
        resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
        Ok(())
    }
}

impl<M: TextMeasure + Send> CardRenderer for SvgCardRenderer<M> {
    fn render(
        &self,
        model: &CardModel,
        photo: ResolvedPhoto,
        geometry: &Geometry,
    ) -> Result<RasterSurface, RenderError> {
        let width = geometry.width.round() as u32;
        let height = geometry.height.round() as u32;
        let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::Surface(width, height))?;

        let scene = self.scene(model, !photo.is_absent(), geometry);
        self.rasterize(&scene.backdrop, &mut pixmap)?;
        if let ResolvedPhoto::Image(photo) = photo {
            raster::paint_photo(&mut pixmap, &photo, &geometry.photo);
            debug!("photo composited");
        }
        self.rasterize(&scene.overlay, &mut pixmap)?;

        Ok(pixmap)
    }
}

//! Request in, PNG out.
//!
//! normalize -> resolve photo -> paint over precomputed geometry -> encode.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{error, info};

use crate::compositor::encode_png;
use crate::config::Settings;
use crate::error::{CardError, RenderError};
use crate::fonts::CosmicTextMeasure;
use crate::layout::{Geometry, LayoutEngine};
use crate::model::{StatKind, normalize};
use crate::photo::PhotoResolver;
use crate::render::{CardRenderer, SvgCardRenderer};
use crate::theme::Theme;

/// Everything needed to turn requests into cards. Holds no per-request state,
/// so one pipeline can serve concurrent callers.
pub struct CardPipeline {
    resolver: PhotoResolver,
    geometry: Geometry,
    renderer: Box<dyn CardRenderer>,
}

impl CardPipeline {
    /// Computes the layout up front; a theme that does not fit the canvas
    /// fails here rather than on the first request.
    pub fn new(
        settings: &Settings,
        theme: &Theme,
        resolver: PhotoResolver,
        renderer: Box<dyn CardRenderer>,
    ) -> Result<Self, CardError> {
        let geometry = LayoutEngine::new(theme)
            .compute(StatKind::ALL.len(), settings.canvas_width, settings.canvas_height)
            .inspect_err(|e| error!(error = %e, "card layout does not fit the canvas"))?;

        Ok(Self {
            resolver,
            geometry,
            renderer,
        })
    }

    /// Default stack: settings-selected theme, system fonts, SVG renderer.
    pub fn from_settings(settings: &Settings) -> Result<Self, String> {
        settings.validate()?;
        let theme = settings.load_theme()?;
        let renderer = SvgCardRenderer::new(theme.clone(), CosmicTextMeasure::new);
        Self::new(settings, &theme, settings.photo_resolver(), Box::new(renderer))
            .map_err(|e| e.to_string())
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn generate(&self, raw: &Value) -> Result<Vec<u8>, CardError> {
        let started = Instant::now();
        let model = normalize(raw)?;
        info!(nickname_chars = model.nickname().chars().count(), "rendering card");

        let photo = self.resolver.resolve(model.photo_reference());
        let surface = self
            .renderer
            .render(&model, photo, &self.geometry)
            .inspect_err(|e| error!(error = %e, "card render failed"))?;
        let png = encode_png(&surface).inspect_err(|e| error!(error = %e, "PNG encode failed"))?;

        info!(
            bytes = png.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "card rendered"
        );
        Ok(png)
    }

    /// Runs [`generate`](Self::generate) on a worker thread and gives up after
    /// `timeout`. An abandoned worker finishes in the background and its
    /// result is dropped.
    pub fn generate_with_timeout(
        self: &Arc<Self>,
        raw: Value,
        timeout: Duration,
    ) -> Result<Vec<u8>, CardError> {
        let (tx, rx) = mpsc::sync_channel(1);
        let pipeline = Arc::clone(self);

        thread::Builder::new()
            .name("card-render".to_string())
            .spawn(move || {
                // The receiver may already be gone after a timeout.
                let _ = tx.send(pipeline.generate(&raw));
            })
            .map_err(|e| RenderError::RendererUnavailable(e.to_string()))?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                error!(timeout_ms = timeout.as_millis() as u64, "card render timed out");
                Err(CardError::Timeout(timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(RenderError::RendererUnavailable(
                "render worker exited without a result".to_string(),
            )
            .into()),
        }
    }
}

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Weight};

/// Measures rendered text width, used to shrink long nicknames.
pub trait TextMeasure {
    fn text_width(&mut self, text: &str, font_size: f32, bold: bool) -> f32;
}

/// Shapes text against the system fonts.
pub struct CosmicTextMeasure {
    font_system: FontSystem,
}

impl CosmicTextMeasure {
    pub fn new() -> Self {
        Self {
            font_system: FontSystem::new(),
        }
    }
}

impl Default for CosmicTextMeasure {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasure for CosmicTextMeasure {
    fn text_width(&mut self, text: &str, font_size: f32, bold: bool) -> f32 {
        let mut buffer = Buffer::new(
            &mut self.font_system,
            Metrics {
                font_size,
                line_height: font_size * 1.2,
            },
        );
        buffer.set_size(&mut self.font_system, None, None);

        let attrs = Attrs::new()
            .family(Family::SansSerif)
            .weight(if bold { Weight::BOLD } else { Weight::NORMAL });
        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced, None);

        buffer
            .layout_runs()
            .fold(0.0_f32, |width, run| width.max(run.line_w))
    }
}

/// Font-independent estimate: every character advances by a fixed fraction
/// of the font size.
#[derive(Debug, Clone, Copy)]
pub struct ApproxMeasure {
    pub advance_em: f32,
}

impl Default for ApproxMeasure {
    fn default() -> Self {
        Self { advance_em: 0.6 }
    }
}

impl TextMeasure for ApproxMeasure {
    fn text_width(&mut self, text: &str, font_size: f32, bold: bool) -> f32 {
        let weight = if bold { 1.1 } else { 1.0 };
        text.chars().count() as f32 * font_size * self.advance_em * weight
    }
}

/// Largest size from `start` down to `min` (in `step` decrements) at which
/// `text` fits in `max_width`. Returns `min` when nothing fits.
pub fn fit_font_size(
    measure: &mut dyn TextMeasure,
    text: &str,
    start: f32,
    min: f32,
    step: f32,
    max_width: f32,
) -> f32 {
    let mut size = start;
    loop {
        if size <= min {
            return min;
        }
        if measure.text_width(text, size, true) <= max_width {
            return size;
        }
        size -= step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_keeps_start_size() {
        let mut measure = ApproxMeasure::default();
        assert_eq!(fit_font_size(&mut measure, "Shadow", 42.0, 22.0, 2.0, 720.0), 42.0);
    }

    #[test]
    fn long_text_shrinks_until_it_fits() {
        let mut measure = ApproxMeasure { advance_em: 0.5 };
        let text = "x".repeat(40);
        // 40 * 0.5 * 1.1 = 22 px per point of font size
        let size = fit_font_size(&mut measure, &text, 42.0, 22.0, 2.0, 720.0);
        assert_eq!(size, 32.0);
        assert!(measure.text_width(&text, size, true) <= 720.0);
    }

    #[test]
    fn floor_is_respected() {
        let mut measure = ApproxMeasure::default();
        let text = "W".repeat(100);
        assert_eq!(fit_font_size(&mut measure, &text, 42.0, 22.0, 2.0, 720.0), 22.0);
    }
}

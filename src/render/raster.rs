use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use image::imageops::{self, FilterType};
use resvg::usvg;
use tiny_skia::{
    ColorU8, FillRule, IntSize, Mask, PathBuilder, Pixmap, PixmapPaint, Transform,
};
use tracing::{debug, warn};

use crate::layout::PhotoRegion;
use crate::photo::Photo;

/// System fonts plus anything under `./fonts`, with generic families mapped
/// to whatever is installed.
pub fn load_font_database() -> Arc<usvg::fontdb::Database> {
    let mut fontdb = usvg::fontdb::Database::new();
    fontdb.load_system_fonts();

    let local_fonts = Path::new("fonts");
    if local_fonts.is_dir() {
        fontdb.load_fonts_dir(local_fonts);
    }

    configure_font_fallbacks(&mut fontdb);
    debug!(faces = fontdb.len(), "font database loaded");
    Arc::new(fontdb)
}

fn configure_font_fallbacks(fontdb: &mut usvg::fontdb::Database) {
    let mut sans_family: Option<String> = None;
    let mut first_family: Option<String> = None;

    for face in fontdb.faces() {
        for (family, _) in &face.families {
            if first_family.is_none() {
                first_family = Some(family.clone());
            }
            let lower = family.to_ascii_lowercase();
            if sans_family.is_none() && lower.contains("sans") {
                sans_family = Some(family.clone());
            }
        }
    }

    if let Some(family) = sans_family.or(first_family) {
        fontdb.set_sans_serif_family(family.as_str());
        fontdb.set_serif_family(family.as_str());
    }
}

/// Scales `image` to cover `width`x`height`, keeping its aspect ratio and
/// cropping the overflow evenly from both sides.
pub fn cover_fit(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (src_w, src_h) = image.dimensions();
    if src_w == 0 || src_h == 0 || width == 0 || height == 0 {
        return RgbaImage::new(width, height);
    }

    let scale = f64::max(
        f64::from(width) / f64::from(src_w),
        f64::from(height) / f64::from(src_h),
    );
    let scaled_w = ((f64::from(src_w) * scale).ceil() as u32).max(width);
    let scaled_h = ((f64::from(src_h) * scale).ceil() as u32).max(height);
    let scaled = imageops::resize(image, scaled_w, scaled_h, FilterType::Triangle);

    let crop_x = (scaled_w - width) / 2;
    let crop_y = (scaled_h - height) / 2;
    imageops::crop_imm(&scaled, crop_x, crop_y, width, height).to_image()
}

fn to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())?;
    let mut data = Vec::with_capacity(image.as_raw().len());
    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        let premultiplied = ColorU8::from_rgba(r, g, b, a).premultiply();
        data.extend_from_slice(&[
            premultiplied.red(),
            premultiplied.green(),
            premultiplied.blue(),
            premultiplied.alpha(),
        ]);
    }
    Pixmap::from_vec(data, size)
}

/// Draws the photo into its region. A photo that cannot be placed is skipped.
pub(super) fn paint_photo(target: &mut Pixmap, photo: &Photo, region: &PhotoRegion) {
    let bounds = region.bounds();
    let width = bounds.width.round() as u32;
    let height = bounds.height.round() as u32;

    let fitted = cover_fit(&photo.pixels, width, height);
    let Some(source) = to_pixmap(&fitted) else {
        warn!(width, height, "photo region is empty, skipping photo");
        return;
    };

    let mask = match *region {
        PhotoRegion::Fill(_) => None,
        PhotoRegion::Circle { center, radius } => {
            let clip = Mask::new(target.width(), target.height()).and_then(|mut mask| {
                let circle = PathBuilder::from_circle(center.x, center.y, radius)?;
                mask.fill_path(&circle, FillRule::Winding, true, Transform::identity());
                Some(mask)
            });
            if clip.is_none() {
                warn!(radius, "could not build avatar clip, skipping photo");
                return;
            }
            clip
        }
    };

    target.draw_pixmap(
        bounds.x.round() as i32,
        bounds.y.round() as i32,
        source.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        mask.as_ref(),
    );
}

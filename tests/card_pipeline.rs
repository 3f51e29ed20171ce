use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use image::{Rgba, RgbaImage};
use playercard::error::ValidationKind;
use playercard::fonts::ApproxMeasure;
use playercard::model::normalize;
use playercard::photo::PhotoResolver;
use playercard::render::{SvgCardRenderer, bar_fill};
use playercard::{CardError, CardPipeline, Settings, Theme};
use resvg::usvg;
use serde_json::{Value, json};

struct Scratch(PathBuf);

impl Scratch {
    fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let dir = std::env::temp_dir().join(format!(
            "playercard-it-{}-{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(&dir).expect("scratch dir");
        Self(dir)
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn shadow() -> Value {
    json!({
        "nickname": "Shadow",
        "stats": {
            "strength": 75,
            "agility": 60,
            "endurance": 80,
            "intelligence": 50,
            "charisma": 50
        },
        "level": 10,
        "rank": "A",
        "experience": 1200,
        "ratingPosition": 42,
        "photoPath": null
    })
}

fn renderer(theme: &Theme) -> SvgCardRenderer<ApproxMeasure> {
    SvgCardRenderer::with_fonts(
        theme.clone(),
        ApproxMeasure::default,
        Arc::new(usvg::fontdb::Database::new()),
    )
}

fn pipeline_with(settings: &Settings, resolver: PhotoResolver) -> CardPipeline {
    let theme = settings.load_theme().expect("theme");
    CardPipeline::new(settings, &theme, resolver, Box::new(renderer(&theme))).expect("pipeline")
}

fn pipeline() -> CardPipeline {
    pipeline_with(&Settings::default(), PhotoResolver::new(Vec::<PathBuf>::new(), None))
}

fn hex(color: &str) -> [u8; 3] {
    let channel = |i: usize| u8::from_str_radix(&color[i..i + 2], 16).expect("hex");
    [channel(1), channel(3), channel(5)]
}

fn distance(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| u32::from(x.abs_diff(y)))
        .max()
        .unwrap_or(0)
}

#[test]
fn shadow_card_end_to_end() {
    let pipeline = pipeline();
    let png = pipeline.generate(&shadow()).expect("card");

    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    let card = image::load_from_memory(&png).expect("decodes").to_rgba8();
    assert_eq!(card.dimensions(), (800, 1200));

    let palette = Theme::builtin_default().palette;
    let expected = [
        (75, &palette.band_good),
        (60, &palette.band_good),
        (80, &palette.band_high),
        (50, &palette.band_mid),
        (50, &palette.band_mid),
    ];

    let geometry = pipeline.geometry();
    assert_eq!(geometry.rows.len(), 5);
    for (row, (value, color)) in geometry.rows.iter().zip(expected) {
        let fill = bar_fill(&row.track, value);
        let y = (fill.y + fill.height / 2.0).round() as u32;
        let band = hex(color);

        let inside = (fill.right() - 4.0).round() as u32;
        let [r, g, b, _] = card.get_pixel(inside, y).0;
        assert!(distance([r, g, b], band) <= 3, "value {value}: got {:?}", [r, g, b]);

        let start = (fill.x + 15.0).round() as u32;
        let [r, g, b, _] = card.get_pixel(start, y).0;
        assert!(distance([r, g, b], band) <= 3, "value {value} start");

        let outside = (fill.right() + 4.0).round() as u32;
        let [r, g, b, _] = card.get_pixel(outside, y).0;
        assert!(distance([r, g, b], band) > 20, "value {value} bar overran its width");
    }
}

#[test]
fn shadow_scene_has_header_and_rating() {
    let theme = Theme::builtin_default();
    let pipeline = pipeline();
    let model = normalize(&shadow()).expect("valid");
    let scene = renderer(&theme).scene(&model, false, pipeline.geometry());

    assert!(scene.overlay.contains(">Shadow</text>"));
    assert!(scene.overlay.contains(r#"id="rating-position""#));
    assert!(scene.overlay.contains(">#42</text>"));
    assert!(scene.overlay.contains("1200"));
    for key in ["strength", "agility", "endurance", "intelligence", "charisma"] {
        assert!(scene.overlay.contains(&format!(r#"id="stat-{key}-fill""#)), "{key}");
    }

    let mut without = shadow();
    without["ratingPosition"] = Value::Null;
    let model = normalize(&without).expect("valid");
    let scene = renderer(&theme).scene(&model, false, pipeline.geometry());
    assert!(!scene.overlay.contains("rating-position"));
}

#[test]
fn rendering_is_deterministic() {
    let pipeline = pipeline();
    let first = pipeline.generate(&shadow()).expect("first");
    let second = pipeline.generate(&shadow()).expect("second");
    assert_eq!(first, second);
}

#[test]
fn rendering_with_a_photo_is_deterministic() {
    let scratch = Scratch::new();
    let photos = scratch.path().join("player_photos");
    std::fs::create_dir_all(&photos).expect("photo dir");
    let photo = RgbaImage::from_fn(120, 90, |x, y| {
        Rgba([(x * 2) as u8, (y * 2) as u8, 90, if x < 60 { 255 } else { 0 }])
    });
    photo.save(photos.join("me.png")).expect("save photo");

    let settings = Settings {
        project_root: scratch.path().to_path_buf(),
        ..Settings::default()
    };
    let pipeline = pipeline_with(&settings, settings.photo_resolver());

    let mut record = shadow();
    record["photoPath"] = json!("player_photos/me.png");
    let first = pipeline.generate(&record).expect("first");
    let second = pipeline.generate(&record).expect("second");
    assert_eq!(first, second);

    // Half the photo is fully transparent; the card must still be opaque.
    let card = image::load_from_memory(&first).expect("decodes").to_rgba8();
    assert!(card.pixels().all(|p| p.0[3] == 255));
}

#[test]
fn invalid_records_are_client_errors() {
    let pipeline = pipeline();

    let err = pipeline.generate(&json!({"stats": {}})).unwrap_err();
    match &err {
        CardError::Validation(v) => {
            assert_eq!(v.field, "nickname");
            assert_eq!(v.kind, ValidationKind::MissingField);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.is_client_error());

    let err = pipeline
        .generate(&json!({"nickname": "X", "stats": {"strength": 101}}))
        .unwrap_err();
    assert!(matches!(&err, CardError::Validation(v) if v.kind == ValidationKind::OutOfRange));

    let err = pipeline
        .generate(&json!({"nickname": "X", "stats": [1, 2, 3]}))
        .unwrap_err();
    assert!(matches!(&err, CardError::Validation(v) if v.kind == ValidationKind::InvalidType));
}

#[test]
fn photo_outside_allowed_roots_is_ignored() {
    let scratch = Scratch::new();
    let allowed = scratch.path().join("player_photos");
    let elsewhere = scratch.path().join("private");
    std::fs::create_dir_all(&allowed).expect("allowed dir");
    std::fs::create_dir_all(&elsewhere).expect("private dir");

    let photo = RgbaImage::from_pixel(64, 96, Rgba([200, 30, 180, 255]));
    photo.save(allowed.join("me.png")).expect("save allowed");
    photo.save(elsewhere.join("me.png")).expect("save private");

    let settings = Settings {
        project_root: scratch.path().to_path_buf(),
        ..Settings::default()
    };
    let pipeline = pipeline_with(&settings, settings.photo_resolver());

    let mut record = shadow();
    let baseline = pipeline.generate(&record).expect("no photo");

    record["photoPath"] = json!(elsewhere.join("me.png").to_string_lossy());
    let escaped = pipeline.generate(&record).expect("escaped photo degrades");
    assert_eq!(escaped, baseline);

    record["photoPath"] = json!("player_photos/../private/me.png");
    let traversal = pipeline.generate(&record).expect("traversal degrades");
    assert_eq!(traversal, baseline);

    record["photoPath"] = json!("player_photos/missing.png");
    let missing = pipeline.generate(&record).expect("missing degrades");
    assert_eq!(missing, baseline);

    record["photoPath"] = json!("player_photos/me.png");
    let with_photo = pipeline.generate(&record).expect("allowed photo");
    assert_ne!(with_photo, baseline);
}

#[test]
fn concurrent_requests_share_one_pipeline() {
    let pipeline = Arc::new(pipeline());
    let expected = pipeline.generate(&shadow()).expect("reference");

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            std::thread::spawn(move || {
                pipeline.generate_with_timeout(shadow(), Duration::from_secs(30))
            })
        })
        .collect();

    for handle in handles {
        let png = handle.join().expect("worker").expect("card");
        assert_eq!(png, expected);
    }
}

#[test]
fn ember_theme_renders_at_custom_size() {
    let settings = Settings {
        canvas_width: 1000,
        canvas_height: 1400,
        theme: "ember".to_string(),
        ..Settings::default()
    };
    let pipeline = pipeline_with(&settings, PhotoResolver::new(Vec::<PathBuf>::new(), None));
    let png = pipeline.generate(&shadow()).expect("card");
    let card = image::load_from_memory(&png).expect("decodes");
    assert_eq!((card.width(), card.height()), (1000, 1400));
}

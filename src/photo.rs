//! Safe ingestion of user-supplied photos.
//!
//! A photo reference is an untrusted string. It is only opened when it
//! canonicalizes to a file under one of the allowed roots, carries an image
//! extension and stays under the byte and pixel caps. Every failure degrades
//! to [`ResolvedPhoto::Absent`]; nothing here returns an error to the caller.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader, Limits, RgbaImage};
use thiserror::Error;
use tracing::{debug, warn};

pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_MAX_PIXELS: u64 = 40_000_000;

/// A decoded photo, owned by a single render.
#[derive(Debug, Clone)]
pub struct Photo {
    pub pixels: RgbaImage,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

#[derive(Debug, Clone)]
pub enum ResolvedPhoto {
    Absent,
    Image(Photo),
}

impl ResolvedPhoto {
    pub fn is_absent(&self) -> bool {
        matches!(self, ResolvedPhoto::Absent)
    }

    pub fn as_photo(&self) -> Option<&Photo> {
        match self {
            ResolvedPhoto::Image(photo) => Some(photo),
            ResolvedPhoto::Absent => None,
        }
    }
}

/// Why a photo was dropped. Logged, never surfaced.
#[derive(Error, Debug)]
pub enum PhotoDegraded {
    #[error("photo not found")]
    NotFound,

    #[error("photo is outside the allowed directories")]
    OutsideAllowedRoots,

    #[error("unsupported photo extension")]
    UnsupportedExtension,

    #[error("photo is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("photo is {width}x{height}, over the pixel limit")]
    TooManyPixels { width: u64, height: u64 },

    #[error("photo content is not a recognized image format")]
    UnknownFormat,

    #[error("photo could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("photo could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
}

#[derive(Debug, Clone)]
pub struct PhotoResolver {
    allowed_roots: Vec<PathBuf>,
    project_root: Option<PathBuf>,
    max_bytes: u64,
    max_pixels: u64,
}

impl PhotoResolver {
    /// Builds a resolver. Roots that do not exist are dropped with a warning,
    /// the rest are canonicalized once here.
    pub fn new<I, P>(allowed_roots: I, project_root: Option<PathBuf>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let allowed_roots = allowed_roots
            .into_iter()
            .filter_map(|root| match root.as_ref().canonicalize() {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(root = %root.as_ref().display(), error = %e, "skipping photo root");
                    None
                }
            })
            .collect();

        Self {
            allowed_roots,
            project_root,
            max_bytes: DEFAULT_MAX_BYTES,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }

    pub fn with_limits(mut self, max_bytes: u64, max_pixels: u64) -> Self {
        self.max_bytes = max_bytes;
        self.max_pixels = max_pixels;
        self
    }

    pub fn allowed_roots(&self) -> &[PathBuf] {
        &self.allowed_roots
    }

    pub fn resolve(&self, reference: Option<&str>) -> ResolvedPhoto {
        let Some(reference) = reference.map(str::trim).filter(|r| !r.is_empty()) else {
            return ResolvedPhoto::Absent;
        };

        match self.load(reference) {
            Ok(photo) => {
                debug!(width = photo.width, height = photo.height, "photo resolved");
                ResolvedPhoto::Image(photo)
            }
            Err(reason) => {
                warn!(%reason, "photo dropped, rendering without it");
                debug!(reference, "dropped photo reference");
                ResolvedPhoto::Absent
            }
        }
    }

    fn load(&self, reference: &str) -> Result<Photo, PhotoDegraded> {
        let path = self.locate(reference)?;

        if !self.allowed_roots.iter().any(|root| path.starts_with(root)) {
            return Err(PhotoDegraded::OutsideAllowedRoots);
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(PhotoDegraded::UnsupportedExtension);
        }

        let size = std::fs::metadata(&path)?.len();
        if size > self.max_bytes {
            return Err(PhotoDegraded::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        // Header-declared dimensions first, so a small file that claims a huge
        // canvas never reaches the decoder.
        if let Ok(dims) = imagesize::size(&path) {
            self.check_pixels(dims.width as u64, dims.height as u64)?;
        }

        let mut bytes = Vec::with_capacity(size as usize);
        File::open(&path)?
            .take(self.max_bytes + 1)
            .read_to_end(&mut bytes)?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(PhotoDegraded::TooLarge {
                size: bytes.len() as u64,
                limit: self.max_bytes,
            });
        }

        self.decode(bytes)
    }

    /// Absolute path for a reference. A relative reference that does not exist
    /// from the working directory gets one more try against the project root.
    fn locate(&self, reference: &str) -> Result<PathBuf, PhotoDegraded> {
        let candidate = Path::new(reference);
        if let Ok(path) = candidate.canonicalize() {
            return Ok(path);
        }
        if candidate.is_relative() {
            if let Some(root) = &self.project_root {
                if let Ok(path) = root.join(candidate).canonicalize() {
                    return Ok(path);
                }
            }
        }
        Err(PhotoDegraded::NotFound)
    }

    fn check_pixels(&self, width: u64, height: u64) -> Result<(), PhotoDegraded> {
        if width.saturating_mul(height) > self.max_pixels {
            return Err(PhotoDegraded::TooManyPixels { width, height });
        }
        Ok(())
    }

    fn decode(&self, bytes: Vec<u8>) -> Result<Photo, PhotoDegraded> {
        let mut reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        let Some(format) = reader.format() else {
            return Err(PhotoDegraded::UnknownFormat);
        };

        let mut limits = Limits::default();
        limits.max_alloc = Some(self.max_pixels.saturating_mul(4));
        reader.limits(limits);

        let decoded = reader.decode()?;
        self.check_pixels(decoded.width() as u64, decoded.height() as u64)?;

        let pixels = decoded.to_rgba8();
        Ok(Photo {
            width: pixels.width(),
            height: pixels.height(),
            pixels,
            format,
        })
    }
}

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::SurfaceError;

use super::Bitmap;
use super::codec;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// What a group surface keeps when it is popped.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Content {
    /// Color only; alpha is forced opaque.
    Color,
    /// Alpha only; color channels are dropped.
    Alpha,
    /// Color and alpha.
    #[default]
    ColorAlpha,
}

/// Off-screen bitmap with an explicit lifecycle.
///
/// A `Surface` is a cheap, clonable handle. All clones refer to the same
/// backing bitmap; [`destroy`](Self::destroy) releases it for every holder.
///
/// Lifecycle:
/// - dimensions are fixed at creation, clamped to `1..=MAX_DIMENSION`
/// - `destroy` is idempotent
/// - after destruction, bitmap accessors return `None` and draws through any
///   context bound to the surface are no-ops
#[derive(Clone)]
pub struct Surface {
    inner: Arc<SurfaceInner>,
}

struct SurfaceInner {
    id: u64,
    width: u32,
    height: u32,
    content: Content,
    bitmap: Mutex<Option<Bitmap>>,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("id", &self.inner.id)
            .field("width", &self.inner.width)
            .field("height", &self.inner.height)
            .field("content", &self.inner.content)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl Surface {
    /// Creates a transparent `width` × `height` surface.
    pub fn new(width: i32, height: i32) -> Self {
        Self::with_content(width, height, Content::ColorAlpha)
    }

    pub fn with_content(width: i32, height: i32, content: Content) -> Self {
        let width = width.max(1) as u32;
        let height = height.max(1) as u32;
        // Bitmap::new clamps the upper bound.
        Self::from_parts(Bitmap::new(width, height), content)
    }

    /// Takes ownership of an existing bitmap.
    pub fn from_bitmap(bitmap: Bitmap) -> Self {
        Self::from_parts(bitmap, Content::ColorAlpha)
    }

    fn from_parts(bitmap: Bitmap, content: Content) -> Self {
        let id = NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed);
        let (width, height) = (bitmap.width(), bitmap.height());
        log::debug!("surface {id}: created {width}x{height} ({content:?})");
        Self {
            inner: Arc::new(SurfaceInner {
                id,
                width,
                height,
                content,
                bitmap: Mutex::new(Some(bitmap)),
            }),
        }
    }

    /// Process-unique identifier, stable across clones.
    #[inline]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    #[inline]
    pub fn content(&self) -> Content {
        self.inner.content
    }

    /// True when both handles refer to the same surface.
    #[inline]
    pub fn ptr_eq(&self, other: &Surface) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_destroyed(&self) -> bool {
        self.lock().is_none()
    }

    /// Releases the backing bitmap. Calling it again has no further effect.
    pub fn destroy(&self) {
        if self.lock().take().is_some() {
            log::debug!("surface {}: destroyed", self.inner.id);
        }
    }

    /// Snapshot of the current pixels; `None` once destroyed.
    pub fn image(&self) -> Option<Bitmap> {
        self.lock().clone()
    }

    /// Runs `f` against the live bitmap; `None` once destroyed.
    pub fn with_bitmap<R>(&self, f: impl FnOnce(&Bitmap) -> R) -> Option<R> {
        self.lock().as_ref().map(f)
    }

    /// Runs `f` against the live bitmap mutably; `None` once destroyed.
    pub fn with_bitmap_mut<R>(&self, f: impl FnOnce(&mut Bitmap) -> R) -> Option<R> {
        self.lock().as_mut().map(f)
    }

    /// Encodes the current pixels as PNG bytes.
    pub fn encode_png(&self) -> Result<Vec<u8>, SurfaceError> {
        let guard = self.lock();
        let bitmap = guard.as_ref().ok_or(SurfaceError::Destroyed)?;
        codec::encode_png(bitmap)
    }

    /// Writes the current pixels to `path` as PNG.
    pub fn write_to_png(&self, path: impl AsRef<Path>) -> Result<(), SurfaceError> {
        let path = path.as_ref();
        let bytes = self.encode_png()?;
        std::fs::write(path, bytes).map_err(|source| SurfaceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("surface {}: wrote {}", self.inner.id, path.display());
        Ok(())
    }

    /// Decodes PNG bytes into a new surface with the image's exact dimensions.
    pub fn decode_png(bytes: &[u8]) -> Result<Surface, SurfaceError> {
        Ok(Self::from_bitmap(codec::decode_png(bytes)?))
    }

    /// Loads a PNG file into a new surface.
    pub fn from_png(path: impl AsRef<Path>) -> Result<Surface, SurfaceError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| SurfaceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode_png(&bytes)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Bitmap>> {
        self.inner.bitmap.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Color;
    use crate::surface::MAX_DIMENSION;

    fn temp_png(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "hudpaint-{tag}-{}-{}.png",
            std::process::id(),
            NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed)
        ))
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn non_positive_dimensions_clamp_to_one() {
        let s = Surface::new(0, 0);
        assert_eq!((s.width(), s.height()), (1, 1));
        let s = Surface::new(-5, 7);
        assert_eq!((s.width(), s.height()), (1, 7));
        assert_eq!(s.image().map(|b| (b.width(), b.height())), Some((1, 7)));
    }

    #[test]
    fn destroy_is_idempotent_and_shared_by_clones() {
        let s = Surface::new(4, 4);
        let alias = s.clone();
        s.destroy();
        assert!(alias.is_destroyed());
        assert!(alias.image().is_none());
        s.destroy();
        assert!(s.is_destroyed());
        assert!(s.with_bitmap_mut(|b| b.fill(Color::white())).is_none());
        assert_eq!((s.width(), s.height()), (4, 4));
    }

    #[test]
    fn ids_identify_handles() {
        let a = Surface::new(1, 1);
        let b = Surface::new(1, 1);
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
        assert_ne!(a.id(), b.id());
    }

    // ── png ───────────────────────────────────────────────────────────────

    #[test]
    fn png_round_trip_preserves_dimensions_and_pixels() {
        for (w, h) in [(1, 1), (3, 7), (64, 5), (17, 33)] {
            let s = Surface::new(w, h);
            s.with_bitmap_mut(|b| {
                b.set_pixel(0, 0, Color::from_rgba8(12, 34, 56, 78));
                b.set_pixel(w as u32 - 1, h as u32 - 1, Color::from_rgba8(255, 0, 128, 255));
            });
            let bytes = s.encode_png().unwrap();
            let back = Surface::decode_png(&bytes).unwrap();
            assert_eq!((back.width(), back.height()), (w as u32, h as u32));
            assert_eq!(back.image(), s.image());
        }
    }

    #[test]
    fn png_file_round_trip() {
        let path = temp_png("file");
        let s = Surface::new(9, 4);
        s.write_to_png(&path).unwrap();
        let back = Surface::from_png(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!((back.width(), back.height()), (9, 4));
    }

    #[test]
    fn encode_destroyed_surface_fails() {
        let s = Surface::new(2, 2);
        s.destroy();
        assert!(matches!(s.encode_png(), Err(SurfaceError::Destroyed)));
        assert!(matches!(s.write_to_png(temp_png("destroyed")), Err(SurfaceError::Destroyed)));
    }

    #[test]
    fn corrupt_and_missing_files_fail() {
        assert!(matches!(
            Surface::decode_png(b"definitely not a png"),
            Err(SurfaceError::Decode(_))
        ));
        let missing = std::env::temp_dir().join("hudpaint-no-such-dir").join("x.png");
        assert!(matches!(Surface::from_png(&missing), Err(SurfaceError::Io { .. })));
        assert!(matches!(Surface::new(1, 1).write_to_png(&missing), Err(SurfaceError::Io { .. })));
    }

    #[test]
    fn oversized_png_is_refused_by_dimensions() {
        let wide = image::RgbaImage::new(MAX_DIMENSION + 1, 1);
        let mut bytes = std::io::Cursor::new(Vec::new());
        wide.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        let err = Surface::decode_png(&bytes.into_inner()).unwrap_err();
        assert!(matches!(
            err,
            SurfaceError::InvalidDimensions { width, height: 1 } if width == MAX_DIMENSION + 1
        ));
    }

    #[test]
    fn huge_requests_clamp_to_the_maximum() {
        let s = Surface::new(i32::MAX, 2);
        assert_eq!((s.width(), s.height()), (MAX_DIMENSION, 2));
    }
}

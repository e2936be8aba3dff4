use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;
use ttf_parser::{Face, name_id};

use crate::error::FontLoadError;

/// Ink extent of a rendered string, in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextExtent {
    pub width: i32,
    pub height: i32,
}

/// Measures strings at an integer font size.
pub trait TextMeasure {
    fn measure(&self, text: &str, size: u32) -> TextExtent;
}

/// A parsed font face. Cloning shares the underlying bytes.
#[derive(Clone)]
pub struct FontFace {
    data: Arc<Vec<u8>>,
    face_index: u32,
    units_per_em: u16,
    ascender: i16,
    space_advance: u16,
    family: Option<String>,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("face_index", &self.face_index)
            .field("units_per_em", &self.units_per_em)
            .finish()
    }
}

impl FontFace {
    pub fn load(path: &Path) -> Result<Self, FontLoadError> {
        let data = std::fs::read(path).map_err(|source| FontLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(data)
            .map_err(|err| FontLoadError::Parse(format!("{} ({})", path.display(), err)))
    }

    /// Uses the first face of a collection that parses.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, FontLoadError> {
        let count = ttf_parser::fonts_in_collection(&data).unwrap_or(1);
        for index in 0..count {
            let Ok(face) = Face::parse(&data, index) else {
                continue;
            };
            let units_per_em = face.units_per_em().max(1);
            let space_advance = face
                .glyph_index(' ')
                .and_then(|id| face.glyph_hor_advance(id))
                .unwrap_or(units_per_em / 2);
            let ascender = face.ascender();
            let family = extract_family_name(&face);
            return Ok(Self {
                data: Arc::new(data),
                face_index: index,
                units_per_em,
                ascender,
                space_advance,
                family,
            });
        }
        Err(FontLoadError::Parse("no usable face in font data".to_string()))
    }

    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// Distance from the top of the line box to the baseline.
    pub fn ascent_px(&self, size: u32) -> f32 {
        self.ascender as f32 * self.scale(size)
    }

    fn scale(&self, size: u32) -> f32 {
        size as f32 / self.units_per_em as f32
    }
}

impl TextMeasure for FontFace {
    fn measure(&self, text: &str, size: u32) -> TextExtent {
        let Ok(face) = Face::parse(&self.data, self.face_index) else {
            return TextExtent::default();
        };
        let mut pen = 0i32;
        let mut ink: Option<(i32, i32, i32, i32)> = None;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            let Some(glyph) = face.glyph_index(ch) else {
                pen = pen.saturating_add(self.space_advance as i32);
                continue;
            };
            if let Some(rect) = face.glyph_bounding_box(glyph) {
                let x0 = pen + rect.x_min as i32;
                let x1 = pen + rect.x_max as i32;
                let (y0, y1) = (rect.y_min as i32, rect.y_max as i32);
                ink = Some(match ink {
                    Some((ax0, ay0, ax1, ay1)) => {
                        (ax0.min(x0), ay0.min(y0), ax1.max(x1), ay1.max(y1))
                    }
                    None => (x0, y0, x1, y1),
                });
            }
            let advance = face
                .glyph_hor_advance(glyph)
                .unwrap_or(self.space_advance);
            pen = pen.saturating_add(advance as i32);
        }

        let scale = self.scale(size);
        match ink {
            Some((x0, y0, x1, y1)) => {
                let left = x0.min(0);
                let right = x1.max(pen);
                TextExtent {
                    width: ((right - left) as f32 * scale).ceil() as i32,
                    height: ((y1 - y0) as f32 * scale).ceil() as i32,
                }
            }
            None => TextExtent {
                width: (pen as f32 * scale).ceil() as i32,
                height: 0,
            },
        }
    }
}

/// Loads each font path once and hands out shared faces.
#[derive(Default)]
pub struct FontCache {
    faces: Mutex<HashMap<PathBuf, FontFace>>,
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, path: &Path) -> Result<FontFace, FontLoadError> {
        if let Ok(faces) = self.faces.lock()
            && let Some(face) = faces.get(path)
        {
            return Ok(face.clone());
        }
        let face = FontFace::load(path)?;
        debug!(
            "loaded font {} ({})",
            path.display(),
            face.family().unwrap_or("unnamed")
        );
        if let Ok(mut faces) = self.faces.lock() {
            faces.insert(path.to_path_buf(), face.clone());
        }
        Ok(face)
    }

    pub fn len(&self) -> usize {
        self.faces.lock().map(|faces| faces.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_font_is_a_read_error() {
        let dir = tempdir().expect("tempdir");
        let err = FontFace::load(&dir.path().join("absent.ttf")).unwrap_err();
        assert!(matches!(err, FontLoadError::Read { .. }));
    }

    #[test]
    fn garbage_font_is_a_parse_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"definitely not a font").expect("write font");
        let err = FontFace::load(&path).unwrap_err();
        assert!(matches!(err, FontLoadError::Parse(_)));
        assert!(err.to_string().contains("broken.ttf"));
    }

    fn dejavu() -> FontFace {
        FontFace::load(&crate::fit::testing::fixture_font_path()).expect("fixture font")
    }

    #[test]
    fn fixture_font_metadata() {
        let font = dejavu();
        assert_eq!(font.family(), Some("DejaVu Sans"));
        assert_eq!(font.units_per_em, 2048);
        let ascent = font.ascent_px(100);
        assert!(ascent > 80.0 && ascent < 100.0, "{}", ascent);
    }

    #[test]
    fn measure_grows_with_size() {
        let font = dejavu();
        let mut previous = TextExtent::default();
        for size in 4..=100 {
            let extent = font.measure("Hallo Welt", size);
            assert!(extent.width >= previous.width, "width shrank at {}", size);
            assert!(extent.height >= previous.height, "height shrank at {}", size);
            previous = extent;
        }
        assert!(previous.width > 0 && previous.height > 0);
    }

    #[test]
    fn whitespace_has_advance_but_no_ink() {
        let font = dejavu();
        let blank = font.measure("   ", 40);
        assert_eq!(blank.height, 0);
        assert!(blank.width > 0);
        assert!(font.measure("x", 40).height > 0);
        assert!(font.measure("Ag", 40).height > font.measure("a", 40).height);
    }

    #[test]
    fn width_reaches_the_pen_position() {
        let font = dejavu();
        let size = 100;
        let face = Face::parse(font.data(), font.face_index).expect("face");
        let pen: u32 = "ox"
            .chars()
            .filter_map(|ch| face.glyph_index(ch))
            .filter_map(|glyph| face.glyph_hor_advance(glyph))
            .map(u32::from)
            .sum();
        let pen_px = pen as f32 * size as f32 / 2048.0;
        assert!(font.measure("ox", size).width as f32 >= pen_px.floor());

        // a leading space shifts both ink and pen right by one space advance
        let space_px = font.space_advance as f32 * size as f32 / 2048.0;
        let plain = font.measure("ox", size).width as f32;
        let spaced = font.measure(" ox", size).width as f32;
        assert!((spaced - plain - space_px).abs() <= 1.0, "{} {} {}", spaced, plain, space_px);
    }

    #[test]
    fn cache_hands_out_one_face_per_path() {
        let cache = FontCache::new();
        let path = crate::fit::testing::fixture_font_path();
        let first = cache.load(&path).expect("load");
        let second = cache.load(&path).expect("load again");
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&first.data, &second.data));
    }

    #[test]
    fn cache_does_not_remember_failures() {
        let dir = tempdir().expect("tempdir");
        let cache = FontCache::new();
        assert!(cache.load(&dir.path().join("absent.ttf")).is_err());
        assert!(cache.is_empty());
    }
}

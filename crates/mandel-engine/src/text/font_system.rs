use std::fmt;
use std::path::Path;

/// Error returned by [`FontSystem::load_font`] and [`FontSystem::load_first_available`].
#[derive(Debug, Clone)]
pub struct FontLoadError(pub String);

impl fmt::Display for FontLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "font load error: {}", self.0)
    }
}

impl std::error::Error for FontLoadError {}

/// Well-known locations of a sans-serif TrueType font on common desktops.
pub const SYSTEM_FONT_PATHS: [&str; 8] = [
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Opaque handle to a font loaded into a [`FontSystem`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FontId(pub(crate) usize);

/// Owns a collection of loaded fonts.
///
/// Fonts are immutable after loading. The system is passed to
/// [`TextRenderer::render`](crate::render::TextRenderer::render) each frame so
/// new glyphs can be rasterized on demand.
pub struct FontSystem {
    fonts: Vec<fontdue::Font>,
}

impl FontSystem {
    pub fn new() -> Self {
        Self { fonts: Vec::new() }
    }

    /// Parses and stores a TrueType or OpenType font from raw bytes.
    pub fn load_font(&mut self, bytes: &[u8]) -> Result<FontId, FontLoadError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError(e.to_string()))?;
        let id = FontId(self.fonts.len());
        self.fonts.push(font);
        Ok(id)
    }

    /// Loads the first font in `paths` that exists and parses.
    pub fn load_first_available<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
    ) -> Result<FontId, FontLoadError> {
        for path in paths {
            let path = path.as_ref();
            let Ok(bytes) = std::fs::read(path) else { continue };
            match self.load_font(&bytes) {
                Ok(id) => {
                    log::debug!("loaded font {}", path.display());
                    return Ok(id);
                }
                Err(e) => log::debug!("skipping {}: {e}", path.display()),
            }
        }
        Err(FontLoadError(format!("none of {} candidate fonts could be loaded", paths.len())))
    }

    /// Returns a reference to the underlying `fontdue::Font`, if `id` is valid.
    pub(crate) fn get(&self, id: FontId) -> Option<&fontdue::Font> {
        self.fonts.get(id.0)
    }
}

impl Default for FontSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_rejected() {
        let mut fonts = FontSystem::new();
        assert!(fonts.load_font(b"definitely not a font").is_err());
        assert!(fonts.fonts.is_empty());
    }

    #[test]
    fn missing_paths_report_an_error() {
        let mut fonts = FontSystem::new();
        let err = fonts
            .load_first_available(&["/nonexistent/a.ttf", "/nonexistent/b.ttf"])
            .unwrap_err();
        assert!(err.to_string().contains("2 candidate fonts"));
    }
}

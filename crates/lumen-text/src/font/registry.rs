use std::path::{Path, PathBuf};
use std::sync::Arc;

use hashbrown::HashMap;

use crate::font::{FontError, FontFace, Result};
use crate::model::FontId;

/// Key identifying a loaded face at a given pixel size.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub path: PathBuf,
    /// Face index within the file (for collections).
    pub index: u32,
    /// Pixel size, stored as bits so the key stays hashable.
    pub size_bits: u32,
}

impl FontKey {
    pub fn new(path: impl AsRef<Path>, index: usize, size: f32) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            index: index as u32,
            size_bits: size.to_bits(),
        }
    }
}

/// A face registered at one pixel size.
#[derive(Debug, Clone)]
pub struct RegisteredFont {
    pub face: Arc<FontFace>,
    pub size: f32,
}

/// Hands out [`FontId`]s for (face, size) pairs.
///
/// Ids start at 1; 0 never names a font. The registry is passed explicitly
/// to the shaper and the font client.
#[derive(Debug, Default)]
pub struct FontRegistry {
    fonts: Vec<RegisteredFont>,
    by_key: HashMap<FontKey, FontId>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already loaded face. Registering twice yields two ids.
    pub fn register(&mut self, face: Arc<FontFace>, size: f32) -> FontId {
        self.fonts.push(RegisteredFont { face, size });
        self.fonts.len() as FontId
    }

    /// Load a face from disk once per (path, index, size).
    pub fn load(&mut self, path: impl AsRef<Path>, index: usize, size: f32) -> Result<FontId> {
        let key = FontKey::new(&path, index, size);
        if let Some(&id) = self.by_key.get(&key) {
            return Ok(id);
        }

        let face = Arc::new(FontFace::from_path(&key.path, index)?);
        let id = self.register(face, size);
        tracing::debug!(path = %key.path.display(), index, size, font_id = id, "registered font");
        self.by_key.insert(key, id);
        Ok(id)
    }

    pub fn get(&self, font_id: FontId) -> Result<&RegisteredFont> {
        (font_id as usize)
            .checked_sub(1)
            .and_then(|slot| self.fonts.get(slot))
            .ok_or(FontError::UnknownFont(font_id))
    }

    /// Ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = FontId> + '_ {
        (1..=self.fonts.len()).map(|id| id as FontId)
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

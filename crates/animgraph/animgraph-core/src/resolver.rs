//! Animation clip lookup.
//!
//! The core never searches for assets itself. Hosts implement
//! [`AnimationResolver`] and pass it into decode/materialize; a miss is a soft
//! failure that leaves the clip unset.

use serde::{Deserialize, Serialize};

/// Opaque reference to a clip owned by the host.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ClipRef {
    pub name: String,
    /// Host-specific location (asset path, URL, ...).
    pub location: String,
}

impl ClipRef {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }
}

/// Resolve clip names to host clips.
pub trait AnimationResolver {
    fn find(&mut self, name: &str, search_scope: &str) -> Option<ClipRef>;
}

/// Resolves nothing. Useful for decoding without asset access.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullResolver;

impl AnimationResolver for NullResolver {
    fn find(&mut self, _name: &str, _search_scope: &str) -> Option<ClipRef> {
        None
    }
}

const PREVIEW_MARKER: &str = "__preview__";

/// Name is a path rather than a bare clip name.
pub fn is_path_like(name: &str) -> bool {
    name.contains('/') || name.contains('\\') || name.ends_with(".anim")
}

/// In-memory clip catalog.
///
/// Bare names match case-insensitively among clips located under the search
/// scope; path-like names match a clip's location exactly. Preview clips are
/// never returned.
#[derive(Clone, Debug, Default)]
pub struct ClipCatalog {
    clips: Vec<ClipRef>,
    /// Lookups that found nothing, in call order.
    pub misses: Vec<String>,
}

impl ClipCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, clip: ClipRef) {
        self.clips.push(clip);
    }

    pub fn with_clip(mut self, name: &str, location: &str) -> Self {
        self.insert(ClipRef::new(name, location));
        self
    }

    /// Clip names visible under `scope`, preview clips excluded.
    pub fn names_in_scope(&self, scope: &str) -> Vec<String> {
        self.clips
            .iter()
            .filter(|c| !c.name.contains(PREVIEW_MARKER) && c.location.starts_with(scope))
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

impl AnimationResolver for ClipCatalog {
    fn find(&mut self, name: &str, search_scope: &str) -> Option<ClipRef> {
        if name.is_empty() {
            return None;
        }
        let found = if is_path_like(name) {
            let location = name.replace('\\', "/");
            self.clips
                .iter()
                .find(|c| c.location == location && !c.name.contains(PREVIEW_MARKER))
        } else {
            self.clips.iter().find(|c| {
                !c.name.contains(PREVIEW_MARKER)
                    && c.location.starts_with(search_scope)
                    && c.name.eq_ignore_ascii_case(name)
            })
        };
        match found {
            Some(clip) => Some(clip.clone()),
            None => {
                log::debug!("clip '{name}' not found under '{search_scope}'");
                self.misses.push(name.to_string());
                None
            }
        }
    }
}

//! Host asset storage seam.

use hashbrown::HashMap;

use crate::error::StoreError;
use crate::model::Graph;

/// Text files and persistent graph objects owned by the host.
pub trait AssetStore {
    /// Handle to a created persistent object.
    type Handle;

    fn read_text(&self, location: &str) -> Result<String, StoreError>;
    fn write_text(&mut self, location: &str, text: &str) -> Result<(), StoreError>;
    /// Persist `graph` at `location`, replacing whatever was there.
    fn create_persistent_object(
        &mut self,
        location: &str,
        graph: &Graph,
    ) -> Result<Self::Handle, StoreError>;
}

/// Store backed by two in-memory maps. Handles are the locations.
#[derive(Clone, Debug, Default)]
pub struct MemoryAssetStore {
    texts: HashMap<String, String>,
    objects: HashMap<String, Graph>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, location: &str, text: &str) -> Self {
        self.texts.insert(location.to_string(), text.to_string());
        self
    }

    pub fn object(&self, handle: &str) -> Option<&Graph> {
        self.objects.get(handle)
    }

    pub fn contains_text(&self, location: &str) -> bool {
        self.texts.contains_key(location)
    }
}

impl AssetStore for MemoryAssetStore {
    type Handle = String;

    fn read_text(&self, location: &str) -> Result<String, StoreError> {
        self.texts
            .get(location)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(location.to_string()))
    }

    fn write_text(&mut self, location: &str, text: &str) -> Result<(), StoreError> {
        if location.trim().is_empty() {
            return Err(StoreError::Io("empty asset location".to_string()));
        }
        self.texts.insert(location.to_string(), text.to_string());
        Ok(())
    }

    fn create_persistent_object(
        &mut self,
        location: &str,
        graph: &Graph,
    ) -> Result<String, StoreError> {
        if location.trim().is_empty() {
            return Err(StoreError::Io("empty asset location".to_string()));
        }
        if self.objects.insert(location.to_string(), graph.clone()).is_some() {
            log::debug!("replaced persistent graph at {location}");
        }
        Ok(location.to_string())
    }
}

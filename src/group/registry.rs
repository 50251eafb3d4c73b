//! Group Registry
//!
//! Process-wide table of groups by name, passed explicitly to whatever needs
//! to look groups up (the peer protocol handlers in particular).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::error::{CacheError, Result};
use crate::group::{Group, Loader};

#[derive(Clone, Default)]
pub struct Registry {
    groups: Arc<RwLock<HashMap<String, Group>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and registers a group. Names are unique: registering a name
    /// twice fails instead of replacing the live group.
    ///
    /// Names must be non-empty and free of `/`, since the peer protocol uses
    /// the first `/` after the base path to separate group and key.
    pub fn create_group(
        &self,
        name: &str,
        cache_bytes: usize,
        loader: impl Loader + 'static,
    ) -> Result<Group> {
        if name.is_empty() || name.contains('/') {
            return Err(CacheError::InvalidArgument(format!(
                "group name {name:?} must be non-empty and contain no '/'"
            )));
        }
        let mut groups = self.groups.write();
        if groups.contains_key(name) {
            return Err(CacheError::Configuration(format!(
                "group {name} already exists"
            )));
        }
        let group = Group::new(name, cache_bytes, loader);
        groups.insert(name.to_string(), group.clone());
        info!(group = name, cache_bytes, "group registered");
        Ok(group)
    }

    /// Looks up a group by name.
    pub fn get_group(&self, name: &str) -> Option<Group> {
        self.groups.read().get(name).cloned()
    }

    /// Registered group names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

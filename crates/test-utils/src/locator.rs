use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use benchrunner::command::BinaryLocator;

/// Locator with a fixed name → path table that records every lookup.
#[derive(Debug, Clone, Default)]
pub struct StaticLocator {
    known: HashMap<String, PathBuf>,
    lookups: Arc<Mutex<Vec<String>>>,
}

impl StaticLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.known.insert(name.to_string(), path.into());
        self
    }

    /// Names looked up so far, in order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

impl BinaryLocator for StaticLocator {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        self.lookups.lock().unwrap().push(name.to_string());
        self.known.get(name).cloned()
    }
}

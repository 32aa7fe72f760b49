use crate::common::RouteRecord;
use crate::error::AppError;
use crate::intake::payload::CodePayload;
use indexmap::IndexMap;
use std::path::Path;

const BUNDLED_ROUTES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/routes.json"));

/// Static route reference data keyed by normalized line id.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: IndexMap<String, RouteRecord>,
}

impl RouteTable {
    /// Lines shipped with the server.
    pub fn bundled() -> Result<Self, AppError> {
        Self::from_json(BUNDLED_ROUTES)
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AppError::RouteTable(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let records: Vec<RouteRecord> =
            serde_json::from_str(json).map_err(|e| AppError::RouteTable(e.to_string()))?;
        let mut table = Self::default();
        for record in records {
            table.insert(record);
        }
        Ok(table)
    }

    /// Adds or replaces a line, keyed by its normalized id.
    pub fn insert(&mut self, mut record: RouteRecord) {
        record.found = true;
        record.raw_payload = None;
        let key = CodePayload::classify(&record.id).lookup_key();
        self.routes.insert(key, record);
    }

    pub fn get(&self, key: &str) -> Option<&RouteRecord> {
        self.routes.get(key)
    }

    pub fn all(&self) -> Vec<RouteRecord> {
        self.routes.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

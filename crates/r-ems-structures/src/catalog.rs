//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Structural risk and failure models for grid assets."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::sync::Arc;

use indexmap::IndexMap;

use crate::configuration::PoleConfiguration;
use crate::errors::{Result, StructuresError};
use crate::weather::WeatherHandle;

/// Named object a pole may reference.
#[derive(Debug, Clone)]
pub enum CatalogEntry {
    Configuration(Arc<PoleConfiguration>),
    Weather(WeatherHandle),
}

impl CatalogEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogEntry::Configuration(_) => "pole_configuration",
            CatalogEntry::Weather(_) => "weather",
        }
    }
}

/// Name-indexed registry of the shared objects poles bind to at initialisation.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: IndexMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a configuration after validating it.
    pub fn insert_configuration(
        &mut self,
        name: impl Into<String>,
        configuration: PoleConfiguration,
    ) -> Result<Arc<PoleConfiguration>> {
        let name = name.into();
        configuration.validate(&name)?;
        let configuration = Arc::new(configuration);
        self.insert(name, CatalogEntry::Configuration(Arc::clone(&configuration)))?;
        Ok(configuration)
    }

    pub fn insert_weather(&mut self, name: impl Into<String>, feed: WeatherHandle) -> Result<()> {
        self.insert(name.into(), CatalogEntry::Weather(feed))
    }

    fn insert(&mut self, name: String, entry: CatalogEntry) -> Result<()> {
        if self.entries.contains_key(&name) {
            return Err(StructuresError::DuplicateObject(name));
        }
        self.entries.insert(name, entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    pub fn configuration(&self, name: &str) -> Result<Arc<PoleConfiguration>> {
        match self.lookup(name)? {
            CatalogEntry::Configuration(configuration) => Ok(Arc::clone(configuration)),
            other => Err(StructuresError::WrongObjectKind {
                name: name.to_owned(),
                expected: "pole_configuration",
                found: other.kind(),
            }),
        }
    }

    pub fn weather(&self, name: &str) -> Result<WeatherHandle> {
        match self.lookup(name)? {
            CatalogEntry::Weather(feed) => Ok(Arc::clone(feed)),
            other => Err(StructuresError::WrongObjectKind {
                name: name.to_owned(),
                expected: "weather",
                found: other.kind(),
            }),
        }
    }

    fn lookup(&self, name: &str) -> Result<&CatalogEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| StructuresError::UnknownObject {
                name: name.to_owned(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Structural risk and failure models for grid assets."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

/// Read side of a weather object: named numeric fields looked up in constant time.
pub trait WeatherFeed: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;
    fn field(&self, field: &str) -> Option<f64>;
}

pub type WeatherHandle = Arc<dyn WeatherFeed>;

/// In-memory weather object updated by the host between timesteps.
#[derive(Debug)]
pub struct WeatherStation {
    name: String,
    fields: RwLock<IndexMap<String, f64>>,
}

impl WeatherStation {
    pub fn new<I, K>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            name: name.into(),
            fields: RwLock::new(fields.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    pub fn set(&self, field: &str, value: f64) {
        self.fields.write().insert(field.to_owned(), value);
    }

    /// Publish several fields under one write lock.
    pub fn publish<'a, I>(&self, values: I)
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut fields = self.fields.write();
        for (field, value) in values {
            fields.insert(field.to_owned(), value);
        }
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.read().keys().cloned().collect()
    }
}

impl WeatherFeed for WeatherStation {
    fn name(&self) -> &str {
        &self.name
    }

    fn field(&self, field: &str) -> Option<f64> {
        self.fields.read().get(field).copied()
    }
}

/// Where a pole input comes from, fixed at initialisation.
#[derive(Debug, Clone)]
pub enum InputSource {
    Local,
    Bound { feed: WeatherHandle, field: String },
}

/// A time-varying pole input that is either set locally or mirrored from a weather feed.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    value: f64,
    source: InputSource,
}

/// Result of trying to bind an input to a weather field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingOutcome {
    /// No weather object was configured.
    Unbound,
    /// The weather object lacks the field; the local value is kept.
    FieldMissing,
    /// Bound, and the non-zero local value will be overwritten.
    OverridesLocal,
    Bound,
}

impl ResolvedInput {
    pub fn local(value: f64) -> Self {
        Self {
            value,
            source: InputSource::Local,
        }
    }

    /// Resolve `field` on `feed`, falling back to the local value when it is absent.
    pub fn resolve(value: f64, feed: Option<&WeatherHandle>, field: &str) -> (Self, BindingOutcome) {
        let Some(feed) = feed else {
            return (Self::local(value), BindingOutcome::Unbound);
        };
        if feed.field(field).is_none() {
            return (Self::local(value), BindingOutcome::FieldMissing);
        }
        let outcome = if value != 0.0 {
            BindingOutcome::OverridesLocal
        } else {
            BindingOutcome::Bound
        };
        let input = Self {
            value,
            source: InputSource::Bound {
                feed: Arc::clone(feed),
                field: field.to_owned(),
            },
        };
        (input, outcome)
    }

    /// Pull the latest feed value, keeping the previous one if the field went away.
    pub fn refresh(&mut self) -> f64 {
        if let InputSource::Bound { feed, field } = &self.source {
            if let Some(value) = feed.field(field) {
                self.value = value;
            }
        }
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.source, InputSource::Bound { .. })
    }

    pub fn source(&self) -> &InputSource {
        &self.source
    }
}

//! GSTIN and supplier registration status.

use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// Placeholder values suppliers put in the GSTIN field when they have none.
const UNREGISTERED_MARKERS: [&str; 4] = ["", "unregistered", "na", "n/a"];

/// A supplier's GST identification number, as written on the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gstin(String);

impl ValueObject for Gstin {}

impl Gstin {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn registration(&self) -> Registration {
        let lowered = self.0.to_lowercase();
        if UNREGISTERED_MARKERS.contains(&lowered.as_str()) {
            Registration::Unregistered
        } else {
            Registration::Registered
        }
    }
}

/// GST registration status of a supplier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Registration {
    Registered,
    Unregistered,
}

impl Registration {
    /// Classify an optional GSTIN; a missing GSTIN is unregistered.
    pub fn of(gstin: Option<&Gstin>) -> Self {
        gstin.map_or(Registration::Unregistered, Gstin::registration)
    }

    pub fn is_registered(self) -> bool {
        self == Registration::Registered
    }
}

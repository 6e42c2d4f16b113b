//! Hazard classes and chemical catalog entries

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse category of a released substance, driving plume size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardClass {
    Gas,
    Liquid,
    #[default]
    Other,
}

impl HazardClass {
    /// Map a catalog `hazard_type` string to a class. Unknown strings are `Other`.
    #[must_use]
    pub fn from_hazard_type(hazard_type: &str) -> Self {
        let hazard_type = hazard_type.trim();
        if hazard_type.eq_ignore_ascii_case("gas") {
            HazardClass::Gas
        } else if hazard_type.eq_ignore_ascii_case("liquid") {
            HazardClass::Liquid
        } else {
            HazardClass::Other
        }
    }

    /// Scale applied to the plume's major axis
    #[must_use]
    pub fn major_axis_multiplier(self) -> f64 {
        match self {
            HazardClass::Gas => 2.0,
            HazardClass::Liquid | HazardClass::Other => 1.0,
        }
    }
}

impl fmt::Display for HazardClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HazardClass::Gas => write!(f, "gas"),
            HazardClass::Liquid => write!(f, "liquid"),
            HazardClass::Other => write!(f, "other"),
        }
    }
}

/// A chemical as listed by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chemical {
    pub id: u32,
    pub name: String,
    /// Free-form hazard type as stored upstream, e.g. "gas"
    pub hazard_type: String,
}

impl Chemical {
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, hazard_type: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            hazard_type: hazard_type.into(),
        }
    }

    #[must_use]
    pub fn hazard_class(&self) -> HazardClass {
        HazardClass::from_hazard_type(&self.hazard_type)
    }

    /// Descriptor attached to prediction results
    #[must_use]
    pub fn descriptor(&self) -> ChemicalDescriptor {
        ChemicalDescriptor {
            id: self.id,
            name: self.name.clone(),
            hazard_type: self.hazard_type.clone(),
        }
    }
}

/// Chemical identity carried in prediction properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChemicalDescriptor {
    pub id: u32,
    pub name: String,
    pub hazard_type: String,
}

impl ChemicalDescriptor {
    #[must_use]
    pub fn hazard_class(&self) -> HazardClass {
        HazardClass::from_hazard_type(&self.hazard_type)
    }
}

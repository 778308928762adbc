//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Structural risk and failure models for grid assets."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::errors::{Result, StructuresError};

fn default_fiber_strength() -> f64 {
    8000.0
}

fn default_strength_factor() -> f64 {
    0.85
}

fn default_material_density() -> f64 {
    52.0
}

fn default_overload_factor() -> f64 {
    2.0
}

/// Static geometry and material constants shared by every pole of one type.
///
/// Lengths are in feet, diameters in inches, strengths in psi, density in
/// lb/ft³ and the degradation rate in inches of hollow growth per year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoleConfiguration {
    pub pole_length: f64,
    pub pole_depth: f64,
    pub ground_diameter: f64,
    pub top_diameter: f64,
    #[serde(default = "default_fiber_strength")]
    pub fiber_strength: f64,
    #[serde(default = "default_strength_factor")]
    pub strength_factor_250b_wood: f64,
    #[serde(default = "default_material_density")]
    pub material_density: f64,
    #[serde(default)]
    pub degradation_rate: f64,
    #[serde(default = "default_overload_factor")]
    pub overload_factor_transverse_general: f64,
    /// Typical repair time in hours for poles of this type.
    #[serde(default)]
    pub repair_time: Option<f64>,
}

impl PoleConfiguration {
    /// Length of the pole above the ground line.
    pub fn above_ground_length(&self) -> f64 {
        self.pole_length - self.pole_depth
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        let invalid = |reason: String| StructuresError::InvalidConfiguration {
            name: name.to_owned(),
            reason,
        };
        let positive = [
            ("pole_length", self.pole_length),
            ("ground_diameter", self.ground_diameter),
            ("top_diameter", self.top_diameter),
            ("fiber_strength", self.fiber_strength),
            ("strength_factor_250b_wood", self.strength_factor_250b_wood),
            (
                "overload_factor_transverse_general",
                self.overload_factor_transverse_general,
            ),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(format!("{} must be positive (got {})", field, value)));
            }
        }
        let non_negative = [
            ("pole_depth", self.pole_depth),
            ("material_density", self.material_density),
            ("degradation_rate", self.degradation_rate),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(format!(
                    "{} must be non-negative (got {})",
                    field, value
                )));
            }
        }
        if self.above_ground_length() <= 0.0 {
            return Err(invalid(format!(
                "pole_depth {} ft must be less than pole_length {} ft",
                self.pole_depth, self.pole_length
            )));
        }
        if self.top_diameter > self.ground_diameter {
            return Err(invalid(format!(
                "top_diameter {} in exceeds ground_diameter {} in",
                self.top_diameter, self.ground_diameter
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_2_45ft() -> PoleConfiguration {
        PoleConfiguration {
            pole_length: 45.0,
            pole_depth: 6.5,
            ground_diameter: 11.5,
            top_diameter: 8.6,
            fiber_strength: 8000.0,
            strength_factor_250b_wood: 0.85,
            material_density: 52.0,
            degradation_rate: 0.02,
            overload_factor_transverse_general: 2.0,
            repair_time: None,
        }
    }

    #[test]
    fn toml_defaults_fill_material_constants() {
        let config: PoleConfiguration = toml::from_str(
            r#"
            pole_length = 40.0
            pole_depth = 6.0
            ground_diameter = 20.74
            top_diameter = 9.87
            "#,
        )
        .unwrap();
        assert_eq!(config.fiber_strength, 8000.0);
        assert_eq!(config.strength_factor_250b_wood, 0.85);
        assert_eq!(config.degradation_rate, 0.0);
        assert_eq!(config.repair_time, None);
        config.validate("WOOD-40").unwrap();
    }

    #[test]
    fn rejects_depth_beyond_length() {
        let mut config = class_2_45ft();
        config.pole_depth = 45.0;
        let err = config.validate("bad").unwrap_err();
        assert!(err.to_string().contains("pole_depth"));
    }

    #[test]
    fn rejects_inverted_taper() {
        let mut config = class_2_45ft();
        config.top_diameter = 12.0;
        assert!(config.validate("bad").is_err());
    }

    #[test]
    fn rejects_negative_degradation() {
        let mut config = class_2_45ft();
        config.degradation_rate = -0.1;
        assert!(config.validate("bad").is_err());
        config.degradation_rate = f64::NAN;
        assert!(config.validate("bad").is_err());
    }
}

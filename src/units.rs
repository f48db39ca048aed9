use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display units for total leaf area. Factors are cm² per unit.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
pub enum AreaUnit {
    #[default]
    #[serde(rename = "cm²")]
    SquareCentimeter,
    #[serde(rename = "mm²")]
    SquareMillimeter,
    #[serde(rename = "m²")]
    SquareMeter,
}

/// Display units for absorbed CO₂ mass. Factors are unit per µg.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
pub enum Co2Unit {
    #[default]
    #[serde(rename = "µg")]
    Microgram,
    #[serde(rename = "mg")]
    Milligram,
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "kg")]
    Kilogram,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("unknown area unit '{0}' (expected cm², mm² or m²)")]
    UnknownArea(String),
    #[error("unknown CO₂ unit '{0}' (expected µg, mg, g or kg)")]
    UnknownCo2(String),
}

impl AreaUnit {
    pub const ALL: [AreaUnit; 3] = [
        AreaUnit::SquareCentimeter,
        AreaUnit::SquareMillimeter,
        AreaUnit::SquareMeter,
    ];

    /// cm² per one of this unit; divide a cm² value by this to convert.
    pub fn factor(self) -> f64 {
        match self {
            AreaUnit::SquareCentimeter => 1.0,
            AreaUnit::SquareMillimeter => 0.01,
            AreaUnit::SquareMeter => 10_000.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AreaUnit::SquareCentimeter => "cm²",
            AreaUnit::SquareMillimeter => "mm²",
            AreaUnit::SquareMeter => "m²",
        }
    }

    pub fn from_cm2(self, area_cm2: f64) -> f64 {
        area_cm2 / self.factor()
    }

    pub fn to_cm2(self, area: f64) -> f64 {
        area * self.factor()
    }
}

impl Co2Unit {
    pub const ALL: [Co2Unit; 4] = [
        Co2Unit::Microgram,
        Co2Unit::Milligram,
        Co2Unit::Gram,
        Co2Unit::Kilogram,
    ];

    /// Units per µg; multiply a µg value by this to convert.
    pub fn factor(self) -> f64 {
        match self {
            Co2Unit::Microgram => 1.0,
            Co2Unit::Milligram => 1e-3,
            Co2Unit::Gram => 1e-6,
            Co2Unit::Kilogram => 1e-9,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Co2Unit::Microgram => "µg",
            Co2Unit::Milligram => "mg",
            Co2Unit::Gram => "g",
            Co2Unit::Kilogram => "kg",
        }
    }

    pub fn from_micrograms(self, mass_ug: f64) -> f64 {
        mass_ug * self.factor()
    }
}

impl fmt::Display for AreaUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Co2Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ASCII spellings are accepted so the units can be typed on any keyboard.
impl FromStr for AreaUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cm²" | "cm2" | "cm^2" => Ok(AreaUnit::SquareCentimeter),
            "mm²" | "mm2" | "mm^2" => Ok(AreaUnit::SquareMillimeter),
            "m²" | "m2" | "m^2" => Ok(AreaUnit::SquareMeter),
            other => Err(UnitError::UnknownArea(other.to_string())),
        }
    }
}

impl FromStr for Co2Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // U+00B5 MICRO SIGN and U+03BC GREEK SMALL LETTER MU both occur in the wild.
        match s.trim() {
            "µg" | "μg" | "ug" => Ok(Co2Unit::Microgram),
            "mg" => Ok(Co2Unit::Milligram),
            "g" => Ok(Co2Unit::Gram),
            "kg" => Ok(Co2Unit::Kilogram),
            other => Err(UnitError::UnknownCo2(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_factors_are_cm2_per_unit() {
        assert_eq!(AreaUnit::SquareMeter.from_cm2(10_000.0), 1.0);
        assert_eq!(AreaUnit::SquareMillimeter.from_cm2(1.0), 100.0);
        assert_eq!(AreaUnit::SquareCentimeter.from_cm2(6.0), 6.0);
    }

    #[test]
    fn co2_factors_scale_from_micrograms() {
        assert_eq!(Co2Unit::Microgram.from_micrograms(2.5), 2.5);
        assert!((Co2Unit::Milligram.from_micrograms(8816.16) - 8.81616).abs() < 1e-12);
        assert!((Co2Unit::Kilogram.from_micrograms(1e9) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn parse_accepts_labels_and_ascii_spellings() {
        for unit in AreaUnit::ALL {
            assert_eq!(unit.label().parse::<AreaUnit>(), Ok(unit));
        }
        for unit in Co2Unit::ALL {
            assert_eq!(unit.label().parse::<Co2Unit>(), Ok(unit));
        }
        assert_eq!("m2".parse::<AreaUnit>(), Ok(AreaUnit::SquareMeter));
        assert_eq!("ug".parse::<Co2Unit>(), Ok(Co2Unit::Microgram));
        assert_eq!("\u{3bc}g".parse::<Co2Unit>(), Ok(Co2Unit::Microgram));
    }

    #[test]
    fn parse_rejects_unknown_units() {
        assert_eq!(
            "ft2".parse::<AreaUnit>(),
            Err(UnitError::UnknownArea("ft2".into()))
        );
        assert!("ton".parse::<Co2Unit>().is_err());
    }

    #[test]
    fn defaults_match_form_defaults() {
        assert_eq!(AreaUnit::default(), AreaUnit::SquareCentimeter);
        assert_eq!(Co2Unit::default(), Co2Unit::Microgram);
    }
}

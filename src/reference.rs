use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daily CO₂ uptake of a single stoma, in µg.
pub const PER_STOMA_DAILY_ABSORPTION_UG: f64 = 0.05;

/// National CO₂ emissions for one year, in kg (600 million tonnes).
///
/// The estimator spreads this over the population and reads the share as a
/// *daily* figure. The unit mismatch is kept as-is; dividing by 365 here
/// would change every published result.
pub const NATIONAL_ANNUAL_CO2_KG: f64 = 600_000_000_000.0;

/// Stomatal density per species, stomata per cm². Illustrative values.
const BUILTIN_SPECIES: &[(&str, f64)] = &[
    ("단풍잎", 72111.6),
    ("테이블야자", 23041.5),
    ("깻잎", 29387.2),
    ("고무나무", 42760.7),
    ("몬스테라", 12694.6),
    ("스투키", 8675.1),
];

/// Measured correction factors; species not listed absorb at 1.0.
const BUILTIN_MULTIPLIERS: &[(&str, f64)] = &[("스투키", 4.0)];

/// Population per city, persons.
const BUILTIN_CITIES: &[(&str, u64)] = &[
    ("서울", 9_765_000),
    ("부산", 3_400_000),
    ("대구", 2_500_000),
    ("인천", 3_000_000),
    ("광주", 1_500_000),
    ("대전", 1_500_000),
    ("울산", 1_200_000),
    ("세종", 350_000),
    ("경기", 13_000_000),
    ("강원", 1_600_000),
    ("충북", 1_600_000),
    ("충남", 2_200_000),
    ("전북", 1_800_000),
    ("전남", 1_900_000),
    ("경북", 2_600_000),
    ("경남", 3_300_000),
    ("제주", 700_000),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesEntry {
    pub name: String,
    /// Stomata per cm².
    pub density: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityEntry {
    pub name: String,
    pub population: u64,
}

/// Closed lookup sets and scalar constants the estimator runs against.
///
/// Entries keep their declaration order; the first city is the default
/// selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub per_stoma_daily_absorption_ug: f64,
    pub national_annual_co2_kg: f64,
    pub species: Vec<SpeciesEntry>,
    #[serde(default)]
    pub multipliers: BTreeMap<String, f64>,
    pub cities: Vec<CityEntry>,
}

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("failed to read reference file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed reference data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid reference data: {0}")]
    Invalid(String),
}

impl ReferenceData {
    /// Built-in tables.
    pub fn builtin() -> Self {
        ReferenceData {
            per_stoma_daily_absorption_ug: PER_STOMA_DAILY_ABSORPTION_UG,
            national_annual_co2_kg: NATIONAL_ANNUAL_CO2_KG,
            species: BUILTIN_SPECIES
                .iter()
                .map(|&(name, density)| SpeciesEntry {
                    name: name.to_string(),
                    density,
                })
                .collect(),
            multipliers: BUILTIN_MULTIPLIERS
                .iter()
                .map(|&(name, m)| (name.to_string(), m))
                .collect(),
            cities: BUILTIN_CITIES
                .iter()
                .map(|&(name, population)| CityEntry {
                    name: name.to_string(),
                    population,
                })
                .collect(),
        }
    }

    /// Process-wide built-in tables, initialised on first access and never
    /// written afterwards.
    pub fn global() -> &'static ReferenceData {
        static INSTANCE: OnceLock<ReferenceData> = OnceLock::new();
        INSTANCE.get_or_init(ReferenceData::builtin)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ReferenceError> {
        let data: ReferenceData = serde_json::from_str(json)?;
        data.validate()?;
        Ok(data)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ReferenceError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Rejects tables the estimator cannot run against.
    pub fn validate(&self) -> Result<(), ReferenceError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        let non_negative = |v: f64| v.is_finite() && v >= 0.0;

        if !positive(self.per_stoma_daily_absorption_ug) {
            return Err(ReferenceError::Invalid(
                "per_stoma_daily_absorption_ug must be positive".into(),
            ));
        }
        if !positive(self.national_annual_co2_kg) {
            return Err(ReferenceError::Invalid(
                "national_annual_co2_kg must be positive".into(),
            ));
        }
        if self.species.is_empty() {
            return Err(ReferenceError::Invalid("species table is empty".into()));
        }
        if self.cities.is_empty() {
            return Err(ReferenceError::Invalid("city table is empty".into()));
        }
        for s in &self.species {
            if !non_negative(s.density) {
                return Err(ReferenceError::Invalid(format!(
                    "density for '{}' must be a non-negative number",
                    s.name
                )));
            }
        }
        for (name, m) in &self.multipliers {
            if !non_negative(*m) {
                return Err(ReferenceError::Invalid(format!(
                    "multiplier for '{name}' must be a non-negative number"
                )));
            }
        }
        match self.checked_total_population() {
            None => {
                return Err(ReferenceError::Invalid(
                    "total population overflows u64".into(),
                ))
            }
            Some(0) => {
                return Err(ReferenceError::Invalid(
                    "total population must be positive".into(),
                ))
            }
            Some(_) => {}
        }
        Ok(())
    }

    pub fn density(&self, species: &str) -> Option<f64> {
        self.species
            .iter()
            .find(|s| s.name == species)
            .map(|s| s.density)
    }

    /// Correction factor for a species; 1.0 unless the table says otherwise.
    pub fn multiplier(&self, species: &str) -> f64 {
        self.multipliers.get(species).copied().unwrap_or(1.0)
    }

    pub fn population(&self, city: &str) -> Option<u64> {
        self.cities
            .iter()
            .find(|c| c.name == city)
            .map(|c| c.population)
    }

    /// Sum over the full city set, whichever city is selected.
    ///
    /// Saturates at `u64::MAX`; [`ReferenceData::validate`] rejects tables
    /// where that happens.
    pub fn total_population(&self) -> u64 {
        self.cities
            .iter()
            .fold(0u64, |acc, c| acc.saturating_add(c.population))
    }

    /// `None` when the populations do not fit in a `u64`.
    pub fn checked_total_population(&self) -> Option<u64> {
        self.cities
            .iter()
            .try_fold(0u64, |acc, c| acc.checked_add(c.population))
    }

    pub fn species_names(&self) -> impl Iterator<Item = &str> {
        self.species.iter().map(|s| s.name.as_str())
    }

    pub fn city_names(&self) -> impl Iterator<Item = &str> {
        self.cities.iter().map(|c| c.name.as_str())
    }

    pub fn default_city(&self) -> Option<&str> {
        self.cities.first().map(|c| c.name.as_str())
    }

    pub fn default_species(&self) -> Option<&str> {
        self.species.first().map(|s| s.name.as_str())
    }
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self::builtin()
    }
}

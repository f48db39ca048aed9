#![forbid(unsafe_code)]

//! Leaf stomata CO₂ absorption estimator.
//!
//! Given a leaf species, leaf dimensions, a leaf count and a city, estimates
//! how many leaves of that species would absorb the city's population share
//! of national CO₂ emissions for one day.

pub mod estimator;
pub mod reference;
pub mod report;
pub mod units;

pub use estimator::{
    estimate, estimate_builtin, EstimateError, Estimation, EstimationInput, LeavesNeeded,
};
pub use reference::{CityEntry, ReferenceData, ReferenceError, SpeciesEntry};
pub use report::{Language, LanguageError, Report, ReportField};
pub use units::{AreaUnit, Co2Unit, UnitError};

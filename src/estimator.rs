use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::reference::ReferenceData;
use crate::units::{AreaUnit, Co2Unit};

/// kg → µg.
const MICROGRAMS_PER_KG: f64 = 1e9;

/// Raw form values as entered by the user. Numbers stay text until
/// [`estimate`] validates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimationInput {
    pub species: String,
    pub width: String,
    pub height: String,
    pub count: String,
    #[serde(default)]
    pub area_unit: AreaUnit,
    #[serde(default)]
    pub co2_unit: Co2Unit,
    pub city: String,
}

/// Either a leaf count or the sentinel for zero absorption.
///
/// The count is a whole-valued `f64`: realistic small leaves push it past
/// `u64::MAX`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeavesNeeded {
    Count(f64),
    NotComputable,
}

/// All computed and echoed values for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimation {
    pub species: String,
    pub width_cm: f64,
    pub height_cm: f64,
    pub leaf_count: u64,
    pub area_per_leaf_cm2: f64,
    pub total_area_cm2: f64,
    pub area_unit: AreaUnit,
    /// `total_area_cm2` expressed in `area_unit`.
    pub total_area: f64,
    /// Multiplier already applied.
    pub total_stomata: f64,
    /// µg/day, multiplier already applied.
    pub co2_absorbed_ug: f64,
    pub co2_unit: Co2Unit,
    /// `co2_absorbed_ug` expressed in `co2_unit`.
    pub co2_absorbed: f64,
    pub city: String,
    pub city_population: u64,
    pub total_population: u64,
    pub city_daily_co2_kg: f64,
    pub leaves_needed: LeavesNeeded,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EstimateError {
    #[error("please enter valid numbers")]
    InvalidNumericInput,
    #[error("unknown leaf species")]
    UnknownSpecies(String),
    #[error("unknown city")]
    UnknownCity(String),
}

/// Leaf dimensions in cm and count, parsed from form text.
///
/// Width and height must be finite and positive; the count must be an
/// integer from 1 up to `u64::MAX`, larger counts are rejected.
pub fn parse_dimensions(
    width: &str,
    height: &str,
    count: &str,
) -> Result<(f64, f64, u64), EstimateError> {
    let parse_len = |raw: &str| -> Result<f64, EstimateError> {
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
            _ => Err(EstimateError::InvalidNumericInput),
        }
    };
    let width = parse_len(width)?;
    let height = parse_len(height)?;
    let count = match count.trim().parse::<u64>() {
        Ok(n) if n >= 1 => n,
        _ => return Err(EstimateError::InvalidNumericInput),
    };
    Ok((width, height, count))
}

/// Total leaf area A = w * h * n, in cm².
pub fn compute_total_area_cm2(width_cm: f64, height_cm: f64, count: u64) -> f64 {
    width_cm * height_cm * count as f64
}

/// Population share of national emissions, kg/day.
///
/// The national figure is annual but is used here unscaled as a daily
/// amount. Kept literal until the source figure is restated per day.
pub fn city_daily_co2_kg(reference: &ReferenceData, city_population: u64) -> f64 {
    let total = reference.total_population() as f64;
    (reference.national_annual_co2_kg / total) * city_population as f64
}

/// ceil(demand / uptake), or the sentinel when nothing is absorbed.
pub fn leaves_needed(city_daily_co2_ug: f64, co2_absorbed_ug: f64) -> LeavesNeeded {
    if co2_absorbed_ug > 0.0 {
        LeavesNeeded::Count((city_daily_co2_ug / co2_absorbed_ug).ceil())
    } else {
        LeavesNeeded::NotComputable
    }
}

/// Validate the form, then run the whole estimate against `reference`.
///
/// Validation order is numbers, species, city; the first failure is
/// returned and nothing is computed. Totals that overflow `f64` are
/// rejected as invalid numbers rather than reported.
pub fn estimate(
    reference: &ReferenceData,
    input: &EstimationInput,
) -> Result<Estimation, EstimateError> {
    let (width_cm, height_cm, leaf_count) =
        parse_dimensions(&input.width, &input.height, &input.count).inspect_err(|_| {
            warn!(
                width = %input.width,
                height = %input.height,
                count = %input.count,
                "rejected non-numeric leaf dimensions"
            )
        })?;

    let density = reference.density(&input.species).ok_or_else(|| {
        warn!(species = %input.species, "unknown leaf species");
        EstimateError::UnknownSpecies(input.species.clone())
    })?;

    let city_population = reference.population(&input.city).ok_or_else(|| {
        warn!(city = %input.city, "unknown city");
        EstimateError::UnknownCity(input.city.clone())
    })?;

    let area_per_leaf_cm2 = width_cm * height_cm;
    let total_area_cm2 = compute_total_area_cm2(width_cm, height_cm, leaf_count);

    let multiplier = reference.multiplier(&input.species);
    let mut total_stomata = total_area_cm2 * density;
    let mut co2_absorbed_ug = total_stomata * reference.per_stoma_daily_absorption_ug;
    total_stomata *= multiplier;
    co2_absorbed_ug *= multiplier;

    let total_area = input.area_unit.from_cm2(total_area_cm2);
    let co2_absorbed = input.co2_unit.from_micrograms(co2_absorbed_ug);

    let daily_kg = city_daily_co2_kg(reference, city_population);
    let daily_ug = daily_kg * MICROGRAMS_PER_KG;
    let leaves = leaves_needed(daily_ug, co2_absorbed_ug);

    // Finite inputs can still overflow once multiplied or divided.
    let leaves_finite = match leaves {
        LeavesNeeded::Count(n) => n.is_finite(),
        LeavesNeeded::NotComputable => true,
    };
    if !leaves_finite
        || ![total_area_cm2, total_area, total_stomata, co2_absorbed_ug]
            .iter()
            .all(|v| v.is_finite())
    {
        warn!(
            width = %input.width,
            height = %input.height,
            count = %input.count,
            "leaf totals overflow"
        );
        return Err(EstimateError::InvalidNumericInput);
    }

    debug!(
        species = %input.species,
        city = %input.city,
        total_area_cm2,
        total_stomata,
        co2_absorbed_ug,
        city_daily_co2_kg = daily_kg,
        ?leaves,
        "estimate computed"
    );

    Ok(Estimation {
        species: input.species.clone(),
        width_cm,
        height_cm,
        leaf_count,
        area_per_leaf_cm2,
        total_area_cm2,
        area_unit: input.area_unit,
        total_area,
        total_stomata,
        co2_absorbed_ug,
        co2_unit: input.co2_unit,
        co2_absorbed,
        city: input.city.clone(),
        city_population,
        total_population: reference.total_population(),
        city_daily_co2_kg: daily_kg,
        leaves_needed: leaves,
    })
}

/// [`estimate`] against the built-in tables.
pub fn estimate_builtin(input: &EstimationInput) -> Result<Estimation, EstimateError> {
    estimate(ReferenceData::global(), input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(species: &str, w: &str, h: &str, n: &str, city: &str) -> EstimationInput {
        EstimationInput {
            species: species.into(),
            width: w.into(),
            height: h.into(),
            count: n.into(),
            area_unit: AreaUnit::default(),
            co2_unit: Co2Unit::default(),
            city: city.into(),
        }
    }

    #[test]
    fn perilla_leaf_for_sejong() {
        let est = estimate_builtin(&input("깻잎", "2", "3", "1", "세종")).unwrap();
        assert_eq!(est.area_per_leaf_cm2, 6.0);
        assert_eq!(est.total_area_cm2, 6.0);
        assert!((est.total_stomata - 176_323.2).abs() < 1e-6);
        assert!((est.co2_absorbed_ug - 8816.16).abs() < 1e-6);
        assert_eq!(est.total_population, 51_915_000);

        let expected_kg = (600_000_000_000.0 / 51_915_000.0) * 350_000.0;
        assert_eq!(est.city_daily_co2_kg, expected_kg);
        assert_eq!(
            est.leaves_needed,
            LeavesNeeded::Count((expected_kg * 1e9 / est.co2_absorbed_ug).ceil())
        );
        assert_eq!(est.leaves_needed, LeavesNeeded::Count(458_824_894_072_670.0));
    }

    #[test]
    fn stukii_absorbs_four_times() {
        let mut reference = ReferenceData::builtin();
        // Same density as 스투키 but no multiplier entry.
        reference.species.push(crate::reference::SpeciesEntry {
            name: "control".into(),
            density: 8675.1,
        });

        let base = estimate(&reference, &input("control", "4", "5", "3", "서울")).unwrap();
        let stukii = estimate(&reference, &input("스투키", "4", "5", "3", "서울")).unwrap();
        assert_eq!(stukii.total_stomata, base.total_stomata * 4.0);
        assert_eq!(stukii.co2_absorbed_ug, base.co2_absorbed_ug * 4.0);
        assert_eq!(stukii.total_area_cm2, base.total_area_cm2);
    }

    #[test]
    fn numeric_errors_come_first() {
        let err = estimate_builtin(&input("없는잎", "abc", "3", "1", "없는도시")).unwrap_err();
        assert_eq!(err, EstimateError::InvalidNumericInput);

        for (w, h, n) in [
            ("2", "x", "1"),
            ("2", "3", "1.5"),
            ("", "3", "1"),
            ("NaN", "3", "1"),
            ("inf", "3", "1"),
            ("2", "3", "0"),
            ("2", "3", "-1"),
            ("-2", "3", "1"),
        ] {
            assert_eq!(
                estimate_builtin(&input("깻잎", w, h, n, "서울")),
                Err(EstimateError::InvalidNumericInput),
                "{w} x {h} x {n}"
            );
        }
    }

    #[test]
    fn species_checked_before_city() {
        let err = estimate_builtin(&input("선인장", "1", "1", "1", "Atlantis")).unwrap_err();
        assert_eq!(err, EstimateError::UnknownSpecies("선인장".into()));

        let err = estimate_builtin(&input("깻잎", "1", "1", "1", "Atlantis")).unwrap_err();
        assert_eq!(err, EstimateError::UnknownCity("Atlantis".into()));
    }

    #[test]
    fn whitespace_around_numbers_is_ignored() {
        let est = estimate_builtin(&input("깻잎", " 2 ", "3.5\n", " 2", "서울")).unwrap();
        assert_eq!(est.total_area_cm2, 14.0);
    }

    #[test]
    fn zero_density_yields_sentinel() {
        let mut reference = ReferenceData::builtin();
        reference.species[0].density = 0.0;
        let name = reference.species[0].name.clone();
        let est = estimate(&reference, &input(&name, "2", "2", "1", "서울")).unwrap();
        assert_eq!(est.co2_absorbed_ug, 0.0);
        assert_eq!(est.leaves_needed, LeavesNeeded::NotComputable);
    }

    #[test]
    fn unit_choice_does_not_change_leaf_count() {
        let mut a = input("몬스테라", "10", "20", "5", "부산");
        let cm = estimate_builtin(&a).unwrap();
        a.area_unit = AreaUnit::SquareMeter;
        a.co2_unit = Co2Unit::Kilogram;
        let m = estimate_builtin(&a).unwrap();
        assert_eq!(cm.leaves_needed, m.leaves_needed);
        assert_eq!(m.total_area, 1000.0 / 10_000.0);
        assert_eq!(m.co2_absorbed, cm.co2_absorbed_ug * 1e-9);
    }

    #[test]
    fn tiny_leaf_count_exceeds_u64() {
        let est = estimate_builtin(&input("몬스테라", "0.01", "0.01", "1", "서울")).unwrap();
        let expected = (est.city_daily_co2_kg * 1e9 / est.co2_absorbed_ug).ceil();
        assert!(expected > u64::MAX as f64);
        assert_eq!(est.leaves_needed, LeavesNeeded::Count(expected));
    }

    #[test]
    fn overflowing_totals_are_rejected() {
        assert_eq!(
            estimate_builtin(&input("깻잎", "1e200", "1e200", "1", "서울")),
            Err(EstimateError::InvalidNumericInput)
        );
        // Subnormal uptake: positive, but the leaf count divides to infinity.
        assert_eq!(
            estimate_builtin(&input("깻잎", "1e-160", "1e-160", "1", "서울")),
            Err(EstimateError::InvalidNumericInput)
        );
    }

    #[test]
    fn largest_count_parses_and_beyond_is_rejected() {
        assert!(parse_dimensions("1", "1", "18446744073709551615").is_ok());
        assert_eq!(
            parse_dimensions("1", "1", "18446744073709551616"),
            Err(EstimateError::InvalidNumericInput)
        );
    }

    #[test]
    fn total_area_ignores_display_unit() {
        assert_eq!(compute_total_area_cm2(2.5, 4.0, 3), 30.0);
    }

    #[test]
    fn leaves_needed_rounds_up() {
        assert_eq!(leaves_needed(10.0, 3.0), LeavesNeeded::Count(4.0));
        assert_eq!(leaves_needed(9.0, 3.0), LeavesNeeded::Count(3.0));
        assert_eq!(leaves_needed(9.0, 0.0), LeavesNeeded::NotComputable);
    }

    #[test]
    fn input_deserialises_with_default_units() {
        let json = r#"{"species":"깻잎","width":"2","height":"3","count":"1","city":"세종"}"#;
        let parsed: EstimationInput = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.area_unit, AreaUnit::SquareCentimeter);
        assert_eq!(parsed.co2_unit, Co2Unit::Microgram);
    }
}

use std::fmt;
use std::str::FromStr;

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

use crate::estimator::{EstimateError, Estimation, LeavesNeeded};

/// Label language for the rendered result.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Language {
    #[default]
    Korean,
    English,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LanguageError {
    #[error("unsupported language '{0}' (expected ko or en)")]
    Unsupported(String),
}

impl FromStr for Language {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ko" | "kr" | "korean" => Ok(Language::Korean),
            "en" | "english" => Ok(Language::English),
            other => Err(LanguageError::Unsupported(other.to_string())),
        }
    }
}

/// One labeled line of the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportField {
    pub label: &'static str,
    pub value: String,
}

/// Pre-formatted, ordered result record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub fields: Vec<ReportField>,
}

struct Labels {
    species: &'static str,
    size: &'static str,
    count: &'static str,
    area: &'static str,
    stomata: &'static str,
    co2: &'static str,
    city: &'static str,
    city_co2: &'static str,
    leaves: &'static str,
    sheets: &'static str,
    stomata_suffix: &'static str,
    per_day: &'static str,
    not_computable: &'static str,
}

const KOREAN: Labels = Labels {
    species: "잎 종류",
    size: "잎 크기",
    count: "입력한 잎 개수",
    area: "총 면적",
    stomata: "총 기공 수",
    co2: "예상 CO₂ 흡수량",
    city: "도시",
    city_co2: "도시 하루 CO₂ 배출량",
    leaves: "도시 CO₂ 흡수 위해 필요한 잎 수",
    sheets: "장",
    stomata_suffix: "개",
    per_day: "일",
    not_computable: "계산 불가",
};

const ENGLISH: Labels = Labels {
    species: "Leaf species",
    size: "Leaf size",
    count: "Leaf count",
    area: "Total area",
    stomata: "Total stomata",
    co2: "Estimated CO₂ absorption",
    city: "City",
    city_co2: "City daily CO₂ emissions",
    leaves: "Leaves needed to absorb city CO₂",
    sheets: "sheets",
    stomata_suffix: "stomata",
    per_day: "day",
    not_computable: "not computable",
};

impl Language {
    fn labels(self) -> &'static Labels {
        match self {
            Language::Korean => &KOREAN,
            Language::English => &ENGLISH,
        }
    }

    /// Message shown in place of the result table.
    pub fn error_message(self, err: &EstimateError) -> String {
        match self {
            Language::English => err.to_string(),
            Language::Korean => match err {
                EstimateError::InvalidNumericInput => "숫자를 올바르게 입력해주세요.",
                EstimateError::UnknownSpecies(_) => "알 수 없는 잎 종류입니다.",
                EstimateError::UnknownCity(_) => "알 수 없는 도시입니다.",
            }
            .to_string(),
        }
    }
}

impl Report {
    pub fn from_estimation(est: &Estimation, lang: Language) -> Self {
        let l = lang.labels();
        let leaves = match est.leaves_needed {
            // Whole-valued, so `.0` precision prints the exact integer.
            LeavesNeeded::Count(n) => format!("{n:.0} {}", l.sheets),
            LeavesNeeded::NotComputable => match lang {
                Language::Korean => format!("{} {}", l.not_computable, l.sheets),
                Language::English => l.not_computable.to_string(),
            },
        };

        let field = |label, value: String| ReportField { label, value };
        Report {
            fields: vec![
                field(l.species, est.species.clone()),
                field(
                    l.size,
                    format!("{} x {} cm", echo_real(est.width_cm), echo_real(est.height_cm)),
                ),
                field(l.count, format!("{} {}", est.leaf_count, l.sheets)),
                field(l.area, format!("{:.2} {}", est.total_area, est.area_unit)),
                field(
                    l.stomata,
                    format!(
                        "{} {}",
                        format_grouped(est.total_stomata.trunc(), 0),
                        l.stomata_suffix
                    ),
                ),
                field(
                    l.co2,
                    format!(
                        "{} {}/{}",
                        format_grouped(est.co2_absorbed, 4),
                        est.co2_unit,
                        l.per_day
                    ),
                ),
                field(l.city, est.city.clone()),
                field(
                    l.city_co2,
                    format!("{} kg/{}", format_grouped(est.city_daily_co2_kg, 2), l.per_day),
                ),
                field(l.leaves, leaves),
            ],
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            writeln!(f, "{}: {}", field.label, field.value)?;
        }
        Ok(())
    }
}

// Serialised as a JSON object whose keys keep display order.
impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(field.label, &field.value)?;
        }
        map.end()
    }
}

/// Echo of a parsed real; always shows a fractional part (`2.0`, `2.5`).
///
/// Exponent form below 1e-4 and from 1e16 up, written `1e+16` / `1.5e-05`.
pub fn echo_real(v: f64) -> String {
    if !v.is_finite() || v == 0.0 {
        return format!("{v:?}");
    }
    let sci = format!("{v:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if (-4..16).contains(&exp) {
        let plain = format!("{v}");
        if plain.contains('.') {
            plain
        } else {
            format!("{plain}.0")
        }
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.abs())
    }
}

/// Fixed-point formatting with `,` between thousands.
pub fn format_grouped(value: f64, decimals: usize) -> String {
    let raw = format!("{value:.decimals$}");
    let (sign, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

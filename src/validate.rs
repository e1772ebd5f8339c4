//! Declarative validation of built record tables.
//!
//! A table is checked against a list of [`FieldSpec`] rules; every finding
//! becomes data in the returned [`ValidationReport`]. Validation never
//! fails on bad values, only on engine errors, and callers decide
//! whether a report blocks the write or is merely advisory.

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::Serialize;

use crate::error::ReportError;
use crate::schema::measure;

/// Expected primitive type of a validated column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int,
    Float,
    Str,
}

/// One declarative validation rule. Catalogues of these are data, supplied
/// per record kind; see the `records` module.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub dtype: FieldType,
    pub not_null: bool,
    pub allowed_values: Option<&'static [&'static str]>,
    pub range: Option<(f64, f64)>,
}

impl FieldSpec {
    pub const fn new(name: &'static str, dtype: FieldType, not_null: bool) -> Self {
        Self {
            name,
            dtype,
            not_null,
            allowed_values: None,
            range: None,
        }
    }

    pub const fn allowed(mut self, values: &'static [&'static str]) -> Self {
        self.allowed_values = Some(values);
        self
    }

    pub const fn range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }
}

/// Categorised validation findings, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub missing_columns: Vec<String>,
    pub type_errors: BTreeMap<String, String>,
    pub null_errors: BTreeMap<String, String>,
    pub value_errors: BTreeMap<String, Vec<String>>,
    pub range_errors: BTreeMap<String, String>,
    pub computed_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationReport {
    /// True when the report should stop a submission from being written:
    /// any missing column, type error or null violation, or any non-empty
    /// value/range/computed finding list.
    pub fn has_blocking_errors(&self) -> bool {
        if !self.missing_columns.is_empty() {
            return true;
        }
        if !self.type_errors.is_empty() || !self.null_errors.is_empty() {
            return true;
        }
        if self.value_errors.values().any(|v| !v.is_empty()) {
            return true;
        }
        if !self.range_errors.is_empty() {
            return true;
        }
        self.computed_errors.values().any(|v| !v.is_empty())
    }
}

/// Empty strings count as missing values everywhere in the validator.
fn is_null(value: &AnyValue) -> bool {
    match value {
        AnyValue::Null => true,
        AnyValue::String(s) => s.is_empty(),
        AnyValue::StringOwned(s) => s.is_empty(),
        _ => false,
    }
}

fn value_str(value: &AnyValue) -> String {
    match value {
        AnyValue::String(s) => (*s).to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Float64(f) => format!("{f}"),
        AnyValue::Float32(f) => format!("{f}"),
        other => format!("{other}"),
    }
}

fn to_f64(value: &AnyValue) -> Option<f64> {
    match value {
        AnyValue::Int8(v) => Some(f64::from(*v)),
        AnyValue::Int16(v) => Some(f64::from(*v)),
        AnyValue::Int32(v) => Some(f64::from(*v)),
        AnyValue::Int64(v) => Some(*v as f64),
        AnyValue::UInt32(v) => Some(f64::from(*v)),
        AnyValue::UInt64(v) => Some(*v as f64),
        AnyValue::Float32(v) => Some(f64::from(*v)),
        AnyValue::Float64(v) => Some(*v),
        AnyValue::String(s) => s.trim().parse().ok(),
        AnyValue::StringOwned(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn push_unique(seen: &mut Vec<String>, value: String) {
    if !seen.contains(&value) {
        seen.push(value);
    }
}

/// Validate a table against a field-spec catalogue.
///
/// Pure with respect to the caller: the frame is only read, all findings
/// land in the report. Running it twice on the same table yields the
/// same report.
pub fn validate(df: &DataFrame, specs: &[FieldSpec]) -> Result<ValidationReport, ReportError> {
    let mut report = ValidationReport::default();

    for spec in specs {
        let column = match df.column(spec.name) {
            Ok(c) => c,
            Err(_) => {
                report.missing_columns.push(spec.name.to_string());
                continue;
            }
        };

        let mut values: Vec<AnyValue> = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            values.push(column.get(i)?);
        }

        let null_count = values.iter().filter(|v| is_null(v)).count();
        if spec.not_null && null_count > 0 {
            report
                .null_errors
                .insert(spec.name.to_string(), format!("{null_count} Null values"));
        }

        // A fully empty column carries no type/value/range signal.
        if null_count == values.len() {
            continue;
        }

        let present: Vec<&AnyValue> = values.iter().filter(|v| !is_null(v)).collect();

        match spec.dtype {
            FieldType::Int => {
                let mut non_numeric: Vec<String> = Vec::new();
                let mut fractional: Vec<String> = Vec::new();
                for v in &present {
                    match v {
                        AnyValue::String(s) => {
                            if !s.chars().all(|c| c.is_ascii_digit()) {
                                push_unique(&mut non_numeric, (*s).to_string());
                            }
                        }
                        AnyValue::StringOwned(s) => {
                            if !s.chars().all(|c| c.is_ascii_digit()) {
                                push_unique(&mut non_numeric, s.to_string());
                            }
                        }
                        AnyValue::Float64(f) => {
                            if f.fract() != 0.0 {
                                push_unique(&mut fractional, format!("{f}"));
                            }
                        }
                        AnyValue::Float32(f) => {
                            if f.fract() != 0.0 {
                                push_unique(&mut fractional, format!("{f}"));
                            }
                        }
                        _ => {}
                    }
                }
                if !non_numeric.is_empty() {
                    report.type_errors.insert(
                        spec.name.to_string(),
                        format!(
                            "Invalid value(s) [{}] found in int field",
                            non_numeric.join(", ")
                        ),
                    );
                } else if !fractional.is_empty() {
                    report.type_errors.insert(
                        spec.name.to_string(),
                        format!(
                            "Float value(s) [{}] found in int field",
                            fractional.join(", ")
                        ),
                    );
                }
            }
            FieldType::Float => {
                let mut non_numeric: Vec<String> = Vec::new();
                for v in &present {
                    let bad = match v {
                        AnyValue::String(s) => s.trim().parse::<f64>().is_err(),
                        AnyValue::StringOwned(s) => s.trim().parse::<f64>().is_err(),
                        _ => false,
                    };
                    if bad {
                        push_unique(&mut non_numeric, value_str(v));
                    }
                }
                if !non_numeric.is_empty() {
                    report.type_errors.insert(
                        spec.name.to_string(),
                        format!(
                            "Invalid value(s) [{}] found in float field",
                            non_numeric.join(", ")
                        ),
                    );
                }
            }
            FieldType::Str => {}
        }

        if let Some(allowed) = spec.allowed_values {
            let mut invalid: Vec<String> = Vec::new();
            for v in &present {
                let repr = value_str(v);
                if repr != "None" && !allowed.contains(&repr.as_str()) {
                    push_unique(&mut invalid, repr);
                }
            }
            if !invalid.is_empty() {
                report.value_errors.insert(spec.name.to_string(), invalid);
            }
        }

        if let Some((min, max)) = spec.range {
            let out_of_range: Vec<String> = present
                .iter()
                .filter_map(|v| to_f64(v).map(|f| (v, f)))
                .filter(|(_, f)| *f < min || *f > max)
                .map(|(v, _)| value_str(v))
                .collect();
            if !out_of_range.is_empty() {
                report.range_errors.insert(
                    spec.name.to_string(),
                    format!("Out of range values: [{}]", out_of_range.join(", ")),
                );
            }
        }
    }

    Ok(report)
}

// ── Computed checks ─────────────────────────────────────────────────────────

/// Length/weight parameters per species code: (a, b, tolerated relative
/// deviation) for the condition model `weight = a * length^b` (length in
/// cm, weight in g).
const LW_PARAMS: [(&str, f64, f64, f64); 4] = [
    ("126417", 0.0033, 3.259, 0.30),  // herring
    ("126735", 0.0005, 3.8264, 0.35), // capelin
    ("126439", 0.004, 3.1535, 0.30),  // blue whiting
    ("127023", 0.004, 3.1535, 0.35),  // mackerel
];

/// Screen individual measurements for implausible weight-at-length.
///
/// Expects `measure_id`, `species_code`, `length` (cm) and `weight` (g)
/// columns; rows with missing values or unknown species are skipped.
/// Findings are meant to be merged into a report's `computed_errors`
/// under a "Biology consistency" key.
pub fn length_weight_screen(df: &DataFrame) -> Result<Vec<String>, ReportError> {
    let ids = df.column(measure::MEASURE_ID)?.str()?;
    let species = df.column(measure::SPECIES_CODE)?.str()?;
    let lengths = df.column(measure::LENGTH)?.as_materialized_series().f64()?;
    let weights = df.column(measure::WEIGHT)?.as_materialized_series().f64()?;

    let mut findings = Vec::new();
    for i in 0..df.height() {
        let (Some(code), Some(length), Some(weight)) =
            (species.get(i), lengths.get(i), weights.get(i))
        else {
            continue;
        };
        let Some((_, a, b, tolerance)) = LW_PARAMS.iter().find(|(c, ..)| *c == code) else {
            continue;
        };
        let expected = a * length.powf(*b);
        let deviation = (weight - expected).abs() / weight.max(expected);
        if deviation > *tolerance {
            let id = ids.get(i).unwrap_or("");
            findings.push(format!(
                "Measure {id} - Weight mismatch: Computed={expected:.2}, Reported={weight:.2}"
            ));
        }
    }

    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(columns: Vec<Column>) -> DataFrame {
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn missing_column_is_reported_without_halting_other_checks() {
        let df = frame(vec![Column::new("a".into(), vec![Some("x")])]);
        let specs = [
            FieldSpec::new("a", FieldType::Str, true),
            FieldSpec::new("b", FieldType::Str, true),
        ];
        let report = validate(&df, &specs).unwrap();
        assert_eq!(report.missing_columns, vec!["b".to_string()]);
        assert!(report.null_errors.is_empty());
        assert!(report.has_blocking_errors());
    }

    #[test]
    fn null_violation_reports_exact_count() {
        let df = frame(vec![Column::new(
            "a".into(),
            vec![Some("x"), None, Some(""), None],
        )]);
        let specs = [FieldSpec::new("a", FieldType::Str, true)];
        let report = validate(&df, &specs).unwrap();
        assert_eq!(report.null_errors["a"], "3 Null values");
    }

    #[test]
    fn fully_empty_column_skips_type_value_and_range_checks() {
        let df = frame(vec![Column::new("a".into(), vec![None::<&str>, Some("")])]);
        let specs = [FieldSpec::new("a", FieldType::Int, false)
            .allowed(&["1"])
            .range(0.0, 1.0)];
        let report = validate(&df, &specs).unwrap();
        assert!(report.type_errors.is_empty());
        assert!(report.value_errors.is_empty());
        assert!(report.range_errors.is_empty());
        assert!(!report.has_blocking_errors());
    }

    #[test]
    fn int_field_flags_non_digit_strings_and_fractional_floats() {
        let df = frame(vec![
            Column::new("a".into(), vec![Some("12"), Some("x3")]),
            Column::new("b".into(), vec![Some(2.0), Some(2.5)]),
        ]);
        let specs = [
            FieldSpec::new("a", FieldType::Int, false),
            FieldSpec::new("b", FieldType::Int, false),
        ];
        let report = validate(&df, &specs).unwrap();
        assert_eq!(report.type_errors["a"], "Invalid value(s) [x3] found in int field");
        assert_eq!(report.type_errors["b"], "Float value(s) [2.5] found in int field");
    }

    #[test]
    fn float_field_accepts_signed_and_exponential_numerals() {
        let df = frame(vec![Column::new(
            "a".into(),
            vec![Some("-1.5"), Some("2.1E3"), Some("abc")],
        )]);
        let specs = [FieldSpec::new("a", FieldType::Float, false)];
        let report = validate(&df, &specs).unwrap();
        assert_eq!(
            report.type_errors["a"],
            "Invalid value(s) [abc] found in float field"
        );
    }

    #[test]
    fn allowed_values_excludes_sentinel_none() {
        let df = frame(vec![Column::new(
            "a".into(),
            vec![Some("Y"), Some("None"), Some("Q")],
        )]);
        let specs = [FieldSpec::new("a", FieldType::Str, false).allowed(&["N", "Y"])];
        let report = validate(&df, &specs).unwrap();
        assert_eq!(report.value_errors["a"], vec!["Q".to_string()]);
    }

    #[test]
    fn range_is_inclusive_on_both_bounds() {
        let df = frame(vec![Column::new(
            "a".into(),
            vec![Some(0.0), Some(1.0), Some(1.01)],
        )]);
        let specs = [FieldSpec::new("a", FieldType::Float, false).range(0.0, 1.0)];
        let report = validate(&df, &specs).unwrap();
        assert_eq!(report.range_errors["a"], "Out of range values: [1.01]");
    }

    #[test]
    fn validate_is_idempotent() {
        let df = frame(vec![
            Column::new("a".into(), vec![Some("1"), Some("x"), None]),
            Column::new("b".into(), vec![Some(0.5), Some(3.0), None]),
        ]);
        let specs = [
            FieldSpec::new("a", FieldType::Int, true),
            FieldSpec::new("b", FieldType::Float, false).range(0.0, 1.0),
        ];
        let first = validate(&df, &specs).unwrap();
        let second = validate(&df, &specs).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn length_weight_screen_flags_outliers_only() {
        let df = frame(vec![
            Column::new(measure::MEASURE_ID.into(), vec![Some("m1"), Some("m2")]),
            Column::new(
                measure::SPECIES_CODE.into(),
                vec![Some("127023"), Some("127023")],
            ),
            // 36 cm mackerel: expected ≈ 0.004 * 36^3.1535 ≈ 319 g
            Column::new(measure::LENGTH.into(), vec![Some(36.0), Some(36.0)]),
            Column::new(measure::WEIGHT.into(), vec![Some(320.0), Some(40.0)]),
        ]);
        let findings = length_weight_screen(&df).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].contains("m2"));
    }
}

use polars::prelude::*;

use crate::error::ReportError;
use crate::records::{float_col, int_col, null_int_col, repeat_col, staging_cols, str_col, vocab};
use crate::schema::record_type;
use crate::validate::{FieldSpec, FieldType};

/// Leaf level: one row per individual biological measurement
/// (length, weight or age reading on a single fish).
#[derive(Debug, Clone)]
pub struct BiologicalVariable {
    pub unit_key: String,
    pub parent_key: String,
    pub national_fish_id: String,
    pub stratification: String,
    pub stratum_name: String,
    pub type_measured: String,
    pub value_measured: Option<String>,
    pub unit_or_scale: String,
    pub specimen_type: Option<String>,
    pub certainty_qualitative: String,
    pub conversion_factor: f64,
    pub type_assessment: String,
    pub number_total: Option<i64>,
    pub number_sampled: Option<i64>,
    pub selection_method: String,
}

impl BiologicalVariable {
    pub const COLUMNS: &'static [&'static str] = &[
        "BVid",
        "SAid",
        "BVrecordType",
        "BVnationalUniqueFishId",
        "BVstratification",
        "BVstratumName",
        "BVtypeMeasured",
        "BVvalueMeasured",
        "BVvalueUnitOrScale",
        "BVspecimenType",
        "BVcertaintyQualitative",
        "BVconversionFactorAssessment",
        "BVtypeAssessment",
        "BVnumberTotal",
        "BVnumberSampled",
        "BVselectionMethod",
    ];

    pub fn new(measure_id: &str, parent_key: &str, type_measured: &str, unit: &str) -> Self {
        Self {
            unit_key: format!("{measure_id}:{type_measured}"),
            parent_key: parent_key.to_string(),
            national_fish_id: measure_id.to_string(),
            stratification: "N".to_string(),
            stratum_name: "U".to_string(),
            type_measured: type_measured.to_string(),
            value_measured: None,
            unit_or_scale: unit.to_string(),
            specimen_type: None,
            certainty_qualitative: "Unknown".to_string(),
            conversion_factor: 1.0,
            type_assessment: type_measured.to_string(),
            number_total: None,
            number_sampled: None,
            selection_method: "Unknown".to_string(),
        }
    }

    pub fn frame(rows: &[Self]) -> Result<DataFrame, ReportError> {
        let n = rows.len();
        let [unit, parent] = staging_cols(
            rows.iter().map(|r| Some(r.unit_key.clone())).collect(),
            rows.iter().map(|r| Some(r.parent_key.clone())).collect(),
        );
        let df = DataFrame::new(vec![
            unit,
            parent,
            null_int_col("BVid", n),
            null_int_col("SAid", n),
            repeat_col("BVrecordType", record_type::BIOLOGICAL_VARIABLE, n),
            str_col(
                "BVnationalUniqueFishId",
                rows.iter().map(|r| Some(r.national_fish_id.clone())).collect(),
            ),
            str_col(
                "BVstratification",
                rows.iter().map(|r| Some(r.stratification.clone())).collect(),
            ),
            str_col(
                "BVstratumName",
                rows.iter().map(|r| Some(r.stratum_name.clone())).collect(),
            ),
            str_col(
                "BVtypeMeasured",
                rows.iter().map(|r| Some(r.type_measured.clone())).collect(),
            ),
            str_col(
                "BVvalueMeasured",
                rows.iter().map(|r| r.value_measured.clone()).collect(),
            ),
            str_col(
                "BVvalueUnitOrScale",
                rows.iter().map(|r| Some(r.unit_or_scale.clone())).collect(),
            ),
            str_col(
                "BVspecimenType",
                rows.iter().map(|r| r.specimen_type.clone()).collect(),
            ),
            str_col(
                "BVcertaintyQualitative",
                rows.iter()
                    .map(|r| Some(r.certainty_qualitative.clone()))
                    .collect(),
            ),
            float_col(
                "BVconversionFactorAssessment",
                rows.iter().map(|r| Some(r.conversion_factor)).collect(),
            ),
            str_col(
                "BVtypeAssessment",
                rows.iter().map(|r| Some(r.type_assessment.clone())).collect(),
            ),
            int_col("BVnumberTotal", rows.iter().map(|r| r.number_total).collect()),
            int_col(
                "BVnumberSampled",
                rows.iter().map(|r| r.number_sampled).collect(),
            ),
            str_col(
                "BVselectionMethod",
                rows.iter().map(|r| Some(r.selection_method.clone())).collect(),
            ),
        ])?;
        Ok(df)
    }

    pub fn field_specs() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("BVid", FieldType::Int, false),
            FieldSpec::new("SAid", FieldType::Int, false),
            FieldSpec::new("BVrecordType", FieldType::Str, true).allowed(&["BV"]),
            FieldSpec::new("BVnationalUniqueFishId", FieldType::Str, true),
            FieldSpec::new("BVstratification", FieldType::Str, true).allowed(vocab::YES_NO),
            FieldSpec::new("BVstratumName", FieldType::Str, true),
            FieldSpec::new("BVtypeMeasured", FieldType::Str, true).allowed(&[
                "Age",
                "LengthTotal",
                "Maturity",
                "Sex",
                "WeightLive",
                "WeightMeasured",
            ]),
            FieldSpec::new("BVvalueMeasured", FieldType::Str, true),
            FieldSpec::new("BVvalueUnitOrScale", FieldType::Str, true).allowed(&[
                "Agewr",
                "Ageyear",
                "Lengthmm",
                "NotApplicable",
                "Sex",
                "SMSF",
                "Weightg",
            ]),
            FieldSpec::new("BVspecimenType", FieldType::Str, false)
                .allowed(&["otolith", "scale", "vertebra"]),
            FieldSpec::new("BVcertaintyQualitative", FieldType::Str, true)
                .allowed(&["AQ1", "AQ2", "AQ3", "NotApplicable", "QS1", "QS2", "QS3", "Unknown"]),
            FieldSpec::new("BVconversionFactorAssessment", FieldType::Float, true)
                .range(0.1001, 10.0),
            FieldSpec::new("BVtypeAssessment", FieldType::Str, true).allowed(&[
                "Age",
                "LengthTotal",
                "Maturity",
                "Sex",
                "WeightLive",
                "WeightMeasured",
            ]),
            FieldSpec::new("BVnumberTotal", FieldType::Int, false),
            FieldSpec::new("BVnumberSampled", FieldType::Int, false),
            FieldSpec::new("BVselectionMethod", FieldType::Str, true)
                .allowed(vocab::SELECTION_METHODS),
        ]
    }
}

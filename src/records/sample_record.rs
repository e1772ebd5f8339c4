use polars::prelude::*;

use crate::error::ReportError;
use crate::records::{int_col, null_int_col, repeat_col, staging_cols, str_col, vocab};
use crate::schema::record_type;
use crate::validate::{FieldSpec, FieldType};

/// Sixth level: one row per sampled species within a sample unit.
/// Named `SampleRecord` to keep it apart from the raw sample
/// observations arriving from the observation source.
#[derive(Debug, Clone)]
pub struct SampleRecord {
    pub unit_key: String,
    pub parent_key: String,
    pub sequence_number: i64,
    pub stratification: String,
    pub stratum_name: String,
    pub species_code: Option<String>,
    pub catch_category: String,
    pub sex: String,
    pub unit_type: String,
    pub selection_method: String,
    pub unit_name: String,
    pub lower_hierarchy: String,
    pub sampler: String,
    pub sampled: String,
}

impl SampleRecord {
    pub const COLUMNS: &'static [&'static str] = &[
        "SAid",
        "SSid",
        "SArecordType",
        "SAsequenceNumber",
        "SAstratification",
        "SAstratumName",
        "SAspeciesCode",
        "SAcatchCategory",
        "SAsex",
        "SAunitType",
        "SAselectionMethod",
        "SAunitName",
        "SAlowerHierarchy",
        "SAsampler",
        "SAsampled",
    ];

    pub fn new(unit_key: &str, parent_key: &str, sample_id: &str, sequence_number: i64) -> Self {
        Self {
            unit_key: unit_key.to_string(),
            parent_key: parent_key.to_string(),
            sequence_number,
            stratification: "N".to_string(),
            stratum_name: "U".to_string(),
            species_code: None,
            catch_category: "Catch".to_string(),
            sex: "U".to_string(),
            unit_type: "Box".to_string(),
            selection_method: "NPJS".to_string(),
            unit_name: sample_id.to_string(),
            lower_hierarchy: "C".to_string(),
            sampler: "SelfSampling".to_string(),
            sampled: "Y".to_string(),
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
            null_int_col("SAid", n),
            null_int_col("SSid", n),
            repeat_col("SArecordType", record_type::SAMPLE, n),
            int_col(
                "SAsequenceNumber",
                rows.iter().map(|r| Some(r.sequence_number)).collect(),
            ),
            str_col(
                "SAstratification",
                rows.iter().map(|r| Some(r.stratification.clone())).collect(),
            ),
            str_col(
                "SAstratumName",
                rows.iter().map(|r| Some(r.stratum_name.clone())).collect(),
            ),
            str_col(
                "SAspeciesCode",
                rows.iter().map(|r| r.species_code.clone()).collect(),
            ),
            str_col(
                "SAcatchCategory",
                rows.iter().map(|r| Some(r.catch_category.clone())).collect(),
            ),
            str_col("SAsex", rows.iter().map(|r| Some(r.sex.clone())).collect()),
            str_col("SAunitType", rows.iter().map(|r| Some(r.unit_type.clone())).collect()),
            str_col(
                "SAselectionMethod",
                rows.iter().map(|r| Some(r.selection_method.clone())).collect(),
            ),
            str_col("SAunitName", rows.iter().map(|r| Some(r.unit_name.clone())).collect()),
            str_col(
                "SAlowerHierarchy",
                rows.iter().map(|r| Some(r.lower_hierarchy.clone())).collect(),
            ),
            str_col("SAsampler", rows.iter().map(|r| Some(r.sampler.clone())).collect()),
            str_col("SAsampled", rows.iter().map(|r| Some(r.sampled.clone())).collect()),
        ])?;
        Ok(df)
    }

    pub fn field_specs() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("SAid", FieldType::Int, false),
            FieldSpec::new("SSid", FieldType::Int, false),
            FieldSpec::new("SArecordType", FieldType::Str, true).allowed(&["SA"]),
            FieldSpec::new("SAsequenceNumber", FieldType::Int, true),
            FieldSpec::new("SAstratification", FieldType::Str, true).allowed(vocab::YES_NO),
            FieldSpec::new("SAstratumName", FieldType::Str, true),
            FieldSpec::new("SAspeciesCode", FieldType::Str, true),
            FieldSpec::new("SAcatchCategory", FieldType::Str, true)
                .allowed(&["BMS", "Catch", "Dis", "Lan", "RegDis"]),
            FieldSpec::new("SAsex", FieldType::Str, true)
                .allowed(&["F", "H", "I", "M", "T", "U", "X"]),
            FieldSpec::new("SAunitType", FieldType::Str, true).allowed(&[
                "Basket",
                "Box",
                "Container",
                "Haul",
                "Individuals",
                "Minutes",
                "Number",
                "Tray",
                "Weight",
            ]),
            FieldSpec::new("SAselectionMethod", FieldType::Str, true)
                .allowed(vocab::SELECTION_METHODS),
            FieldSpec::new("SAunitName", FieldType::Str, true),
            FieldSpec::new("SAlowerHierarchy", FieldType::Str, false)
                .allowed(&["A", "B", "C", "D"]),
            FieldSpec::new("SAsampler", FieldType::Str, false).allowed(vocab::SAMPLERS),
            FieldSpec::new("SAsampled", FieldType::Str, true).allowed(vocab::YES_NO),
        ]
    }
}

use polars::prelude::*;

use crate::error::ReportError;
use crate::records::{int_col, null_int_col, repeat_col, staging_cols, str_col, vocab};
use crate::schema::record_type;
use crate::validate::{FieldSpec, FieldType};

/// Root of the hierarchy: one row per sampling design submission.
#[derive(Debug, Clone)]
pub struct Design {
    pub unit_key: String,
    pub sampling_scheme: String,
    pub sampling_scheme_type: String,
    pub year: i64,
    pub stratum_name: String,
    pub hierarchy_correct: String,
    pub hierarchy: i64,
    pub sampled: String,
    pub non_response_collected: String,
    pub label: Option<String>,
}

impl Design {
    pub const COLUMNS: &'static [&'static str] = &[
        "DEid",
        "DErecordType",
        "DEsamplingScheme",
        "DEsamplingSchemeType",
        "DEyear",
        "DEstratumName",
        "DEhierarchyCorrect",
        "DEhierarchy",
        "DEsampled",
        "DEnonResponseCollected",
        "DElabel",
    ];

    pub fn new(year: i64, cruise_label: &str) -> Self {
        Self {
            unit_key: format!("DE-{cruise_label}"),
            sampling_scheme: "FO_Pelagic_At-sea".to_string(),
            sampling_scheme_type: "NatRouCF".to_string(),
            year,
            stratum_name: cruise_label.to_string(),
            hierarchy_correct: "Y".to_string(),
            hierarchy: 2,
            sampled: "Y".to_string(),
            non_response_collected: "N".to_string(),
            label: None,
        }
    }

    pub fn frame(rows: &[Self]) -> Result<DataFrame, ReportError> {
        let n = rows.len();
        let [unit, parent] = staging_cols(
            rows.iter().map(|r| Some(r.unit_key.clone())).collect(),
            vec![None; n],
        );
        let df = DataFrame::new(vec![
            unit,
            parent,
            null_int_col("DEid", n),
            repeat_col("DErecordType", record_type::DESIGN, n),
            str_col(
                "DEsamplingScheme",
                rows.iter().map(|r| Some(r.sampling_scheme.clone())).collect(),
            ),
            str_col(
                "DEsamplingSchemeType",
                rows.iter()
                    .map(|r| Some(r.sampling_scheme_type.clone()))
                    .collect(),
            ),
            int_col("DEyear", rows.iter().map(|r| Some(r.year)).collect()),
            str_col(
                "DEstratumName",
                rows.iter().map(|r| Some(r.stratum_name.clone())).collect(),
            ),
            str_col(
                "DEhierarchyCorrect",
                rows.iter()
                    .map(|r| Some(r.hierarchy_correct.clone()))
                    .collect(),
            ),
            int_col("DEhierarchy", rows.iter().map(|r| Some(r.hierarchy)).collect()),
            str_col("DEsampled", rows.iter().map(|r| Some(r.sampled.clone())).collect()),
            str_col(
                "DEnonResponseCollected",
                rows.iter()
                    .map(|r| Some(r.non_response_collected.clone()))
                    .collect(),
            ),
            str_col("DElabel", rows.iter().map(|r| r.label.clone()).collect()),
        ])?;
        Ok(df)
    }

    pub fn field_specs() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("DEid", FieldType::Int, false),
            FieldSpec::new("DErecordType", FieldType::Str, true).allowed(&["DE"]),
            FieldSpec::new("DEsamplingScheme", FieldType::Str, true)
                .allowed(&["FO_Pelagic_At-sea", "FO_Pelagic_On-shore"]),
            FieldSpec::new("DEsamplingSchemeType", FieldType::Str, true)
                .allowed(&["NatPilCF", "NatPilIB", "NatRouCF", "NatRouIB", "RegRouCF"]),
            FieldSpec::new("DEyear", FieldType::Int, true).range(1965.0, 2030.0),
            FieldSpec::new("DEstratumName", FieldType::Str, true),
            FieldSpec::new("DEhierarchyCorrect", FieldType::Str, true).allowed(vocab::YES_NO),
            FieldSpec::new("DEhierarchy", FieldType::Int, true).range(1.0, 13.0),
            FieldSpec::new("DEsampled", FieldType::Str, true).allowed(vocab::YES_NO),
            FieldSpec::new("DEnonResponseCollected", FieldType::Str, false).allowed(vocab::YES_NO),
            FieldSpec::new("DElabel", FieldType::Str, false),
        ]
    }
}

use polars::prelude::*;

use crate::error::ReportError;
use crate::records::{int_col, null_int_col, repeat_col, staging_cols, str_col, vocab};
use crate::schema::record_type;
use crate::validate::{FieldSpec, FieldType};

/// Fifth level: which species were selected for sampling within an
/// operation; one row per (operation, sample, species).
#[derive(Debug, Clone)]
pub struct SpeciesSelection {
    pub unit_key: String,
    pub parent_key: String,
    pub sequence_number: i64,
    pub stratification: String,
    pub stratum_name: String,
    pub clustering: String,
    pub cluster_name: String,
    pub catch_fraction: String,
    pub observation_type: String,
    pub sampler: String,
    pub species_list_name: Option<String>,
    pub use_for_calculate_zero: String,
    pub selection_method: String,
    pub unit_name: Option<String>,
    pub sampled: String,
}

impl SpeciesSelection {
    pub const COLUMNS: &'static [&'static str] = &[
        "SSid",
        "FOid",
        "SSrecordType",
        "SSsequenceNumber",
        "SSstratification",
        "SSstratumName",
        "SSclustering",
        "SSclusterName",
        "SScatchFraction",
        "SSobservationType",
        "SSsampler",
        "SSspeciesListName",
        "SSuseForCalculateZero",
        "SSselectionMethod",
        "SSunitName",
        "SSsampled",
    ];

    pub fn new(unit_key: &str, station_id: &str, sequence_number: i64) -> Self {
        Self {
            unit_key: unit_key.to_string(),
            parent_key: station_id.to_string(),
            sequence_number,
            stratification: "N".to_string(),
            stratum_name: "U".to_string(),
            clustering: "N".to_string(),
            cluster_name: "U".to_string(),
            catch_fraction: "Catch".to_string(),
            observation_type: "Visual".to_string(),
            sampler: "SelfSampling".to_string(),
            species_list_name: None,
            use_for_calculate_zero: "N".to_string(),
            selection_method: "FIXED".to_string(),
            unit_name: None,
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
            null_int_col("SSid", n),
            null_int_col("FOid", n),
            repeat_col("SSrecordType", record_type::SPECIES_SELECTION, n),
            int_col(
                "SSsequenceNumber",
                rows.iter().map(|r| Some(r.sequence_number)).collect(),
            ),
            str_col(
                "SSstratification",
                rows.iter().map(|r| Some(r.stratification.clone())).collect(),
            ),
            str_col(
                "SSstratumName",
                rows.iter().map(|r| Some(r.stratum_name.clone())).collect(),
            ),
            str_col(
                "SSclustering",
                rows.iter().map(|r| Some(r.clustering.clone())).collect(),
            ),
            str_col(
                "SSclusterName",
                rows.iter().map(|r| Some(r.cluster_name.clone())).collect(),
            ),
            str_col(
                "SScatchFraction",
                rows.iter().map(|r| Some(r.catch_fraction.clone())).collect(),
            ),
            str_col(
                "SSobservationType",
                rows.iter().map(|r| Some(r.observation_type.clone())).collect(),
            ),
            str_col("SSsampler", rows.iter().map(|r| Some(r.sampler.clone())).collect()),
            str_col(
                "SSspeciesListName",
                rows.iter().map(|r| r.species_list_name.clone()).collect(),
            ),
            str_col(
                "SSuseForCalculateZero",
                rows.iter()
                    .map(|r| Some(r.use_for_calculate_zero.clone()))
                    .collect(),
            ),
            str_col(
                "SSselectionMethod",
                rows.iter().map(|r| Some(r.selection_method.clone())).collect(),
            ),
            str_col("SSunitName", rows.iter().map(|r| r.unit_name.clone()).collect()),
            str_col("SSsampled", rows.iter().map(|r| Some(r.sampled.clone())).collect()),
        ])?;
        Ok(df)
    }

    pub fn field_specs() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("SSid", FieldType::Int, false),
            FieldSpec::new("FOid", FieldType::Int, false),
            FieldSpec::new("SSrecordType", FieldType::Str, true).allowed(&["SS"]),
            FieldSpec::new("SSsequenceNumber", FieldType::Int, true),
            FieldSpec::new("SSstratification", FieldType::Str, true).allowed(vocab::YES_NO),
            FieldSpec::new("SSstratumName", FieldType::Str, true),
            FieldSpec::new("SSclustering", FieldType::Str, true)
                .allowed(&["1C", "2C", "N", "S1C", "S2C"]),
            FieldSpec::new("SSclusterName", FieldType::Str, true),
            FieldSpec::new("SScatchFraction", FieldType::Str, true)
                .allowed(&["BMS", "Catch", "Dis", "Lan", "RegDis"]),
            FieldSpec::new("SSobservationType", FieldType::Str, true)
                .allowed(&["Imagery", "Sensor", "Visual"]),
            FieldSpec::new("SSsampler", FieldType::Str, false).allowed(vocab::SAMPLERS),
            FieldSpec::new("SSspeciesListName", FieldType::Str, true),
            FieldSpec::new("SSuseForCalculateZero", FieldType::Str, true).allowed(vocab::YES_NO),
            FieldSpec::new("SSselectionMethod", FieldType::Str, true)
                .allowed(vocab::SELECTION_METHODS),
            FieldSpec::new("SSunitName", FieldType::Str, true),
            FieldSpec::new("SSsampled", FieldType::Str, true).allowed(vocab::YES_NO),
        ]
    }
}

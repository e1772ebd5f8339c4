use polars::prelude::*;

use crate::error::ReportError;
use crate::records::{float_col, int_col, null_int_col, repeat_col, staging_cols, str_col, vocab};
use crate::schema::record_type;
use crate::validate::{FieldSpec, FieldType};

/// Fourth level: one row per matched haul (fishing operation) of a trip.
#[derive(Debug, Clone)]
pub struct FishingOperation {
    pub unit_key: String,
    pub parent_key: String,
    pub sequence_number: Option<i64>,
    pub stratification: String,
    pub stratum_name: String,
    pub clustering: String,
    pub cluster_name: String,
    pub sampler: String,
    pub aggregation_level: String,
    pub validity: String,
    pub catch_reg: String,
    pub start_date: Option<String>,
    pub start_time: Option<String>,
    pub end_date: Option<String>,
    pub end_time: Option<String>,
    pub duration: Option<i64>,
    pub start_lat: Option<f64>,
    pub start_lon: Option<f64>,
    pub stop_lat: Option<f64>,
    pub stop_lon: Option<f64>,
    pub area: Option<String>,
    pub metier6: Option<String>,
    pub gear: Option<String>,
    pub mesh_size: Option<i64>,
    pub selection_method: String,
    pub unit_name: String,
    pub sampled: String,
}

impl FishingOperation {
    pub const COLUMNS: &'static [&'static str] = &[
        "FOid",
        "FTid",
        "FOrecordType",
        "FOsequenceNumber",
        "FOstratification",
        "FOstratumName",
        "FOclustering",
        "FOclusterName",
        "FOsampler",
        "FOaggregationLevel",
        "FOvalidity",
        "FOcatchReg",
        "FOstartDate",
        "FOstartTime",
        "FOendDate",
        "FOendTime",
        "FOduration",
        "FOstartLat",
        "FOstartLon",
        "FOstopLat",
        "FOstopLon",
        "FOarea",
        "FOmetier6",
        "FOgear",
        "FOmeshSize",
        "FOselectionMethod",
        "FOunitName",
        "FOsampled",
    ];

    pub fn new(station_id: &str, trip_id: &str) -> Self {
        Self {
            unit_key: station_id.to_string(),
            parent_key: trip_id.to_string(),
            sequence_number: None,
            stratification: "N".to_string(),
            stratum_name: "U".to_string(),
            clustering: "N".to_string(),
            cluster_name: "U".to_string(),
            sampler: "SelfSampling".to_string(),
            aggregation_level: "H".to_string(),
            validity: "V".to_string(),
            catch_reg: "Lan".to_string(),
            start_date: None,
            start_time: None,
            end_date: None,
            end_time: None,
            duration: None,
            start_lat: None,
            start_lon: None,
            stop_lat: None,
            stop_lon: None,
            area: None,
            metier6: None,
            gear: None,
            mesh_size: None,
            selection_method: "NPJS".to_string(),
            unit_name: station_id.to_string(),
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
            null_int_col("FOid", n),
            null_int_col("FTid", n),
            repeat_col("FOrecordType", record_type::FISHING_OPERATION, n),
            int_col(
                "FOsequenceNumber",
                rows.iter().map(|r| r.sequence_number).collect(),
            ),
            str_col(
                "FOstratification",
                rows.iter().map(|r| Some(r.stratification.clone())).collect(),
            ),
            str_col(
                "FOstratumName",
                rows.iter().map(|r| Some(r.stratum_name.clone())).collect(),
            ),
            str_col(
                "FOclustering",
                rows.iter().map(|r| Some(r.clustering.clone())).collect(),
            ),
            str_col(
                "FOclusterName",
                rows.iter().map(|r| Some(r.cluster_name.clone())).collect(),
            ),
            str_col("FOsampler", rows.iter().map(|r| Some(r.sampler.clone())).collect()),
            str_col(
                "FOaggregationLevel",
                rows.iter().map(|r| Some(r.aggregation_level.clone())).collect(),
            ),
            str_col("FOvalidity", rows.iter().map(|r| Some(r.validity.clone())).collect()),
            str_col("FOcatchReg", rows.iter().map(|r| Some(r.catch_reg.clone())).collect()),
            str_col("FOstartDate", rows.iter().map(|r| r.start_date.clone()).collect()),
            str_col("FOstartTime", rows.iter().map(|r| r.start_time.clone()).collect()),
            str_col("FOendDate", rows.iter().map(|r| r.end_date.clone()).collect()),
            str_col("FOendTime", rows.iter().map(|r| r.end_time.clone()).collect()),
            int_col("FOduration", rows.iter().map(|r| r.duration).collect()),
            float_col("FOstartLat", rows.iter().map(|r| r.start_lat).collect()),
            float_col("FOstartLon", rows.iter().map(|r| r.start_lon).collect()),
            float_col("FOstopLat", rows.iter().map(|r| r.stop_lat).collect()),
            float_col("FOstopLon", rows.iter().map(|r| r.stop_lon).collect()),
            str_col("FOarea", rows.iter().map(|r| r.area.clone()).collect()),
            str_col("FOmetier6", rows.iter().map(|r| r.metier6.clone()).collect()),
            str_col("FOgear", rows.iter().map(|r| r.gear.clone()).collect()),
            int_col("FOmeshSize", rows.iter().map(|r| r.mesh_size).collect()),
            str_col(
                "FOselectionMethod",
                rows.iter().map(|r| Some(r.selection_method.clone())).collect(),
            ),
            str_col("FOunitName", rows.iter().map(|r| Some(r.unit_name.clone())).collect()),
            str_col("FOsampled", rows.iter().map(|r| Some(r.sampled.clone())).collect()),
        ])?;
        Ok(df)
    }

    pub fn field_specs() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("FOid", FieldType::Int, false),
            FieldSpec::new("FTid", FieldType::Int, false),
            FieldSpec::new("FOrecordType", FieldType::Str, true).allowed(&["FO"]),
            FieldSpec::new("FOsequenceNumber", FieldType::Int, true),
            FieldSpec::new("FOstratification", FieldType::Str, true).allowed(vocab::YES_NO),
            FieldSpec::new("FOstratumName", FieldType::Str, true),
            FieldSpec::new("FOclustering", FieldType::Str, true)
                .allowed(&["1C", "2C", "N", "S1C", "S2C"]),
            FieldSpec::new("FOclusterName", FieldType::Str, true),
            FieldSpec::new("FOsampler", FieldType::Str, false).allowed(vocab::SAMPLERS),
            FieldSpec::new("FOaggregationLevel", FieldType::Str, true).allowed(&["D", "H", "T"]),
            FieldSpec::new("FOvalidity", FieldType::Str, true).allowed(&["I", "N", "V"]),
            FieldSpec::new("FOcatchReg", FieldType::Str, true)
                .allowed(&["All", "Dis", "Lan", "None"]),
            FieldSpec::new("FOstartDate", FieldType::Str, false),
            FieldSpec::new("FOstartTime", FieldType::Str, false),
            FieldSpec::new("FOendDate", FieldType::Str, true),
            FieldSpec::new("FOendTime", FieldType::Str, false),
            FieldSpec::new("FOduration", FieldType::Int, false).range(1.0, 20000.0),
            FieldSpec::new("FOstartLat", FieldType::Float, false).range(-90.0, 90.0),
            FieldSpec::new("FOstartLon", FieldType::Float, false).range(-180.0, 180.0),
            FieldSpec::new("FOstopLat", FieldType::Float, false).range(-90.0, 90.0),
            FieldSpec::new("FOstopLon", FieldType::Float, false).range(-180.0, 180.0),
            FieldSpec::new("FOarea", FieldType::Str, false),
            FieldSpec::new("FOmetier6", FieldType::Str, false),
            FieldSpec::new("FOgear", FieldType::Str, false).allowed(&[
                "GNS", "LLS", "OTB", "OTM", "PS", "PTB", "PTM", "SDN", "SSC", "TBB",
            ]),
            FieldSpec::new("FOmeshSize", FieldType::Int, false).range(1.0, 1200.0),
            FieldSpec::new("FOselectionMethod", FieldType::Str, true)
                .allowed(vocab::SELECTION_METHODS),
            FieldSpec::new("FOunitName", FieldType::Str, true),
            FieldSpec::new("FOsampled", FieldType::Str, true).allowed(vocab::YES_NO),
        ]
    }
}

use polars::prelude::*;

use crate::error::ReportError;
use crate::records::{int_col, null_int_col, repeat_col, staging_cols, str_col, vocab};
use crate::schema::record_type;
use crate::validate::{FieldSpec, FieldType};

/// Third level: one row per fishing trip of the census population,
/// sampled or not. Built from the trip-reporting source joined with the
/// matched sampling information.
#[derive(Debug, Clone)]
pub struct FishingTrip {
    pub unit_key: String,
    pub parent_key: String,
    pub encrypted_vessel_code: Option<String>,
    pub sequence_number: i64,
    pub stratification: String,
    pub stratum_name: String,
    pub clustering: String,
    pub cluster_name: String,
    pub sampler: String,
    pub sampling_type: String,
    pub number_of_hauls: Option<i64>,
    pub departure_location: Option<String>,
    pub departure_date: Option<String>,
    pub arrival_location: Option<String>,
    pub arrival_date: Option<String>,
    pub number_total: Option<i64>,
    pub number_sampled: Option<i64>,
    pub selection_method: String,
    pub unit_name: String,
    pub sampled: String,
}

impl FishingTrip {
    pub const COLUMNS: &'static [&'static str] = &[
        "FTid",
        "SDid",
        "FTrecordType",
        "FTencryptedVesselCode",
        "FTsequenceNumber",
        "FTstratification",
        "FTstratumName",
        "FTclustering",
        "FTclusterName",
        "FTsampler",
        "FTsamplingType",
        "FTnumberOfHaulsOrSets",
        "FTdepartureLocation",
        "FTdepartureDate",
        "FTarrivalLocation",
        "FTarrivalDate",
        "FTnumberTotal",
        "FTnumberSampled",
        "FTselectionMethod",
        "FTunitName",
        "FTsampled",
    ];

    /// Defaults follow the self-sampling at-sea census programme; the
    /// caller fills in everything trip-specific.
    pub fn new(trip_id: &str, parent_key: &str, sequence_number: i64, sampled: bool) -> Self {
        Self {
            unit_key: trip_id.to_string(),
            parent_key: parent_key.to_string(),
            encrypted_vessel_code: None,
            sequence_number,
            stratification: "N".to_string(),
            stratum_name: "U".to_string(),
            clustering: "N".to_string(),
            cluster_name: "U".to_string(),
            sampler: "SelfSampling".to_string(),
            sampling_type: "AtSea".to_string(),
            number_of_hauls: None,
            departure_location: None,
            departure_date: None,
            arrival_location: None,
            arrival_date: None,
            number_total: None,
            number_sampled: None,
            selection_method: "CENSUS".to_string(),
            unit_name: trip_id.to_string(),
            sampled: if sampled { "Y" } else { "N" }.to_string(),
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
            null_int_col("FTid", n),
            null_int_col("SDid", n),
            repeat_col("FTrecordType", record_type::FISHING_TRIP, n),
            str_col(
                "FTencryptedVesselCode",
                rows.iter().map(|r| r.encrypted_vessel_code.clone()).collect(),
            ),
            int_col(
                "FTsequenceNumber",
                rows.iter().map(|r| Some(r.sequence_number)).collect(),
            ),
            str_col(
                "FTstratification",
                rows.iter().map(|r| Some(r.stratification.clone())).collect(),
            ),
            str_col(
                "FTstratumName",
                rows.iter().map(|r| Some(r.stratum_name.clone())).collect(),
            ),
            str_col(
                "FTclustering",
                rows.iter().map(|r| Some(r.clustering.clone())).collect(),
            ),
            str_col(
                "FTclusterName",
                rows.iter().map(|r| Some(r.cluster_name.clone())).collect(),
            ),
            str_col("FTsampler", rows.iter().map(|r| Some(r.sampler.clone())).collect()),
            str_col(
                "FTsamplingType",
                rows.iter().map(|r| Some(r.sampling_type.clone())).collect(),
            ),
            int_col(
                "FTnumberOfHaulsOrSets",
                rows.iter().map(|r| r.number_of_hauls).collect(),
            ),
            str_col(
                "FTdepartureLocation",
                rows.iter().map(|r| r.departure_location.clone()).collect(),
            ),
            str_col(
                "FTdepartureDate",
                rows.iter().map(|r| r.departure_date.clone()).collect(),
            ),
            str_col(
                "FTarrivalLocation",
                rows.iter().map(|r| r.arrival_location.clone()).collect(),
            ),
            str_col(
                "FTarrivalDate",
                rows.iter().map(|r| r.arrival_date.clone()).collect(),
            ),
            int_col("FTnumberTotal", rows.iter().map(|r| r.number_total).collect()),
            int_col(
                "FTnumberSampled",
                rows.iter().map(|r| r.number_sampled).collect(),
            ),
            str_col(
                "FTselectionMethod",
                rows.iter().map(|r| Some(r.selection_method.clone())).collect(),
            ),
            str_col("FTunitName", rows.iter().map(|r| Some(r.unit_name.clone())).collect()),
            str_col("FTsampled", rows.iter().map(|r| Some(r.sampled.clone())).collect()),
        ])?;
        Ok(df)
    }

    pub fn field_specs() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("FTid", FieldType::Int, false),
            FieldSpec::new("SDid", FieldType::Int, false),
            FieldSpec::new("FTrecordType", FieldType::Str, true).allowed(&["FT"]),
            FieldSpec::new("FTencryptedVesselCode", FieldType::Str, true),
            FieldSpec::new("FTsequenceNumber", FieldType::Int, true),
            FieldSpec::new("FTstratification", FieldType::Str, true).allowed(vocab::YES_NO),
            FieldSpec::new("FTstratumName", FieldType::Str, true),
            FieldSpec::new("FTclustering", FieldType::Str, true)
                .allowed(&["1C", "2C", "N", "S1C", "S2C"]),
            FieldSpec::new("FTclusterName", FieldType::Str, true),
            FieldSpec::new("FTsampler", FieldType::Str, false).allowed(vocab::SAMPLERS),
            FieldSpec::new("FTsamplingType", FieldType::Str, true).allowed(&["AtSea", "OnShore"]),
            FieldSpec::new("FTnumberOfHaulsOrSets", FieldType::Int, false).range(1.0, 300.0),
            FieldSpec::new("FTdepartureLocation", FieldType::Str, false),
            FieldSpec::new("FTdepartureDate", FieldType::Str, false),
            FieldSpec::new("FTarrivalLocation", FieldType::Str, true),
            FieldSpec::new("FTarrivalDate", FieldType::Str, true),
            FieldSpec::new("FTnumberTotal", FieldType::Int, false),
            FieldSpec::new("FTnumberSampled", FieldType::Int, false),
            FieldSpec::new("FTselectionMethod", FieldType::Str, true)
                .allowed(vocab::SELECTION_METHODS),
            FieldSpec::new("FTunitName", FieldType::Str, true),
            FieldSpec::new("FTsampled", FieldType::Str, true).allowed(vocab::YES_NO),
        ]
    }
}

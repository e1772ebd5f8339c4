//! Upstream collaborator interfaces and the typed rows they return.
//!
//! Every service the submission flow consumes (observation store, trip
//! reporting, vessel registry, geographic and gear-classification
//! lookups) is a trait passed by reference into the builder. Nothing in
//! this crate holds a process-wide service handle.

use chrono::NaiveDateTime;

use crate::error::ReportError;

/// A station visit reported by the observation programme.
#[derive(Debug, Clone)]
pub struct StationRow {
    pub cruise_id: String,
    pub station_id: String,
    pub station_date: Option<NaiveDateTime>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub vessel_no: Option<i64>,
}

/// A biological sample taken at a station.
#[derive(Debug, Clone)]
pub struct SampleObsRow {
    pub station_id: String,
    pub sample_id: String,
    pub target_assemblage: Option<String>,
}

/// One measurement on one fish within a sample.
#[derive(Debug, Clone)]
pub struct MeasureRow {
    pub measure_id: String,
    pub sample_id: String,
    pub species_no: Option<i64>,
    pub measure_type: Option<String>,
    /// Length in cm as recorded on deck.
    pub length: Option<f64>,
    /// Individual weight in grams.
    pub weight: Option<f64>,
    pub age: Option<i64>,
    pub otolith_type: Option<String>,
    pub sex_no: Option<i64>,
}

/// Taxonomic master data for a species number.
#[derive(Debug, Clone)]
pub struct SpeciesRow {
    pub species_no: i64,
    /// Aphia (WoRMS) code.
    pub aphia_code: Option<i64>,
    pub name: Option<String>,
}

/// Trip header resolved for a vessel around a station date.
#[derive(Debug, Clone)]
pub struct TripSummary {
    pub trip_id: String,
    pub departure: Option<NaiveDateTime>,
    pub landing: Option<NaiveDateTime>,
    pub departure_port_no: Option<i64>,
    pub landing_port_no: Option<i64>,
}

/// One trip of the census population for the target species.
#[derive(Debug, Clone)]
pub struct TripRow {
    pub trip_id: String,
    pub registration_no: Option<i64>,
    pub departure_date: Option<NaiveDateTime>,
    pub landing_date: Option<NaiveDateTime>,
    pub departure_port_no: Option<i64>,
    pub landing_port_no: Option<i64>,
    pub quantity: Option<f64>,
    pub stations_cnt: Option<i64>,
}

/// One reported haul (fishing operation) with gear attributes.
#[derive(Debug, Clone)]
pub struct HaulRow {
    pub fishing_station_id: String,
    pub trip_id: String,
    pub fishing_start: Option<NaiveDateTime>,
    pub fishing_end: Option<NaiveDateTime>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub latitude_end: Option<f64>,
    pub longitude_end: Option<f64>,
    pub fao_gear_code: Option<String>,
    pub mesh_size: Option<i64>,
}

/// Vessel master data from the national registry.
#[derive(Debug, Clone)]
pub struct VesselRow {
    pub registration_no: i64,
    /// Anonymised vessel code used in the output.
    pub vessel_id: Option<String>,
    pub home_port_no: Option<i64>,
    pub length: Option<f64>,
    pub power_kw: Option<f64>,
    pub brutto_weight_tons: Option<f64>,
}

// ── Collaborator traits ─────────────────────────────────────────────────────

/// The observation programme: cruises, stations, samples, measurements
/// and taxonomy.
pub trait ObservationSource {
    fn stations(&self, cruise_ids: &[String]) -> Result<Vec<StationRow>, ReportError>;
    fn samples(&self, station_ids: &[String]) -> Result<Vec<SampleObsRow>, ReportError>;
    fn measures(&self, sample_ids: &[String]) -> Result<Vec<MeasureRow>, ReportError>;
    fn species(&self, species_nos: &[i64]) -> Result<Vec<SpeciesRow>, ReportError>;
}

/// The independent trip-reporting chain (logbook system).
pub trait TripReportSource {
    /// Trip a vessel was on at the given instant, if any.
    fn trip_for(
        &self,
        vessel_no: i64,
        date: NaiveDateTime,
    ) -> Result<Option<TripSummary>, ReportError>;

    /// Every trip of the census population that landed the target
    /// species in the given year.
    fn population(&self, target_species_no: i64, year: i64) -> Result<Vec<TripRow>, ReportError>;

    /// All hauls for the given trips that targeted the species.
    fn hauls_for_target(
        &self,
        trip_ids: &[String],
        target_species_no: i64,
    ) -> Result<Vec<HaulRow>, ReportError>;
}

pub trait VesselRegistry {
    fn vessels(&self, registration_nos: &[i64]) -> Result<Vec<VesselRow>, ReportError>;
}

/// Geographic-area lookup: coordinates to reporting area code.
pub trait AreaLookup {
    fn area_code(&self, latitude: f64, longitude: f64) -> Result<Option<String>, ReportError>;
}

/// Gear-classification (metier) lookup. All four arguments must be
/// known; callers skip the lookup otherwise.
pub trait MetierLookup {
    fn metier(
        &self,
        area: &str,
        gear: &str,
        target_assemblage: &str,
        mesh_size: i64,
    ) -> Result<Option<String>, ReportError>;
}

/// National port number to international location code.
pub trait HarbourLookup {
    fn locode(&self, port_no: i64) -> Result<Option<String>, ReportError>;
}

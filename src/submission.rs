//! Builds one complete hierarchy submission from the upstream sources.
//!
//! The flow mirrors the sampling programme: fetch the observed stations
//! and samples, resolve each station to its reported fishing trip, match
//! stations to hauls by space-time proximity, enrich with area, gear and
//! harbour lookups, then construct and validate every level of the
//! hierarchy. The result is handed to the [`Assembler`] for writing;
//! blocking or advisory handling of the validation findings is the
//! caller's call.
//!
//! [`Assembler`]: crate::assembler::Assembler

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use polars::prelude::*;
use tracing::{debug, info};

use crate::assembler::{sequence_by_order, sequence_within, HierarchySubmission, LevelBatch};
use crate::error::ReportError;
use crate::matcher::{best_matches, match_closest_haul, MatchConfig};
use crate::records::{
    vessel_length_category, BiologicalVariable, Design, FishingOperation, FishingTrip,
    IndividualSpecies, Level, SampleRecord, SamplingDetails, SpeciesList, SpeciesSelection,
    VesselDetails,
};
use crate::schema::{haul, measure, sample, station};
use crate::sources::{
    AreaLookup, HarbourLookup, HaulRow, MeasureRow, MetierLookup, ObservationSource,
    SampleObsRow, SpeciesRow, StationRow, TripReportSource, TripSummary, VesselRegistry,
};
use crate::validate::length_weight_screen;

/// Who is reporting: country and institution codes stamped on the
/// sampling-details and reference listings.
#[derive(Debug, Clone)]
pub struct ReporterIdentity {
    pub country: String,
    pub institution: String,
}

/// What to build a submission for.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub cruise_ids: Vec<String>,
    pub cruise_label: String,
    pub year: i64,
    pub target_species_no: i64,
}

/// Orchestrates source fetches, matching, lookups and record building.
/// All collaborators are passed in by reference; the builder holds no
/// global state.
pub struct SubmissionBuilder<'a> {
    observations: &'a dyn ObservationSource,
    trip_reports: &'a dyn TripReportSource,
    vessels: &'a dyn VesselRegistry,
    areas: &'a dyn AreaLookup,
    metiers: &'a dyn MetierLookup,
    harbours: &'a dyn HarbourLookup,
    identity: ReporterIdentity,
    match_config: MatchConfig,
}

/// Station joined with its resolved trip and area code.
struct LinkedStation {
    row: StationRow,
    trip: Option<TripSummary>,
    area: Option<String>,
}

/// One kept candidate row after matching: a sample tied to its best haul.
struct MatchedSample {
    trip_id: String,
    station_id: String,
    sample_id: String,
    target_assemblage: Option<String>,
    fishing_station_id: String,
    fishing_start: Option<NaiveDateTime>,
    fishing_end: Option<NaiveDateTime>,
    tow_latitude: Option<f64>,
    tow_longitude: Option<f64>,
    tow_latitude_end: Option<f64>,
    tow_longitude_end: Option<f64>,
    fao_gear_code: Option<String>,
    mesh_size: Option<i64>,
    area: Option<String>,
    metier6: Option<String>,
}

impl<'a> SubmissionBuilder<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        observations: &'a dyn ObservationSource,
        trip_reports: &'a dyn TripReportSource,
        vessels: &'a dyn VesselRegistry,
        areas: &'a dyn AreaLookup,
        metiers: &'a dyn MetierLookup,
        harbours: &'a dyn HarbourLookup,
        identity: ReporterIdentity,
        match_config: MatchConfig,
    ) -> Self {
        Self {
            observations,
            trip_reports,
            vessels,
            areas,
            metiers,
            harbours,
            identity,
            match_config,
        }
    }

    /// Build and validate every level for one submission run.
    pub fn build(&self, request: &SubmissionRequest) -> Result<HierarchySubmission, ReportError> {
        let stations = self.observations.stations(&request.cruise_ids)?;
        let linked = self.link_stations(stations)?;

        let station_ids: Vec<String> = linked.iter().map(|s| s.row.station_id.clone()).collect();
        let samples = self.observations.samples(&station_ids)?;

        let trip_ids: Vec<String> = dedupe(
            linked
                .iter()
                .filter_map(|s| s.trip.as_ref().map(|t| t.trip_id.clone())),
        );
        let hauls = self
            .trip_reports
            .hauls_for_target(&trip_ids, request.target_species_no)?;
        info!(
            stations = linked.len(),
            samples = samples.len(),
            trips = trip_ids.len(),
            hauls = hauls.len(),
            "sources fetched"
        );

        let candidates = candidate_frame(&linked, &samples, &hauls)?;
        let scored = match_closest_haul(&candidates, &self.match_config)?;
        let kept = best_matches(&scored)?;
        debug!(candidates = candidates.height(), kept = kept.height(), "matching done");

        let mut matched = extract_matched(&kept)?;
        self.resolve_metiers(&mut matched)?;

        // Measurements and taxonomy for everything that was sampled.
        let sample_ids: Vec<String> = dedupe(matched.iter().map(|m| m.sample_id.clone()));
        let measures = self.observations.measures(&sample_ids)?;
        let species_nos: Vec<i64> = dedupe(measures.iter().filter_map(|m| m.species_no));
        let species = self.observations.species(&species_nos)?;
        let species_by_no: HashMap<i64, &SpeciesRow> =
            species.iter().map(|s| (s.species_no, s)).collect();

        // Census population and the vessels it touches.
        let population = self
            .trip_reports
            .population(request.target_species_no, request.year)?;
        let registration_nos: Vec<i64> = dedupe(
            population
                .iter()
                .filter_map(|t| t.registration_no)
                .chain(linked.iter().filter_map(|s| s.row.vessel_no)),
        );
        let vessel_rows = self.vessels.vessels(&registration_nos)?;
        let vessels_by_no: HashMap<i64, _> = vessel_rows
            .iter()
            .map(|v| (v.registration_no, v))
            .collect();

        let mut harbour_memo: HashMap<i64, Option<String>> = HashMap::new();
        let mut locode = |port_no: Option<i64>| -> Result<Option<String>, ReportError> {
            let Some(port_no) = port_no else {
                return Ok(None);
            };
            if let Some(cached) = harbour_memo.get(&port_no) {
                return Ok(cached.clone());
            }
            let code = self.harbours.locode(port_no)?;
            harbour_memo.insert(port_no, code.clone());
            Ok(code)
        };

        // ── Design and sampling details ─────────────────────────────────
        let design = Design::new(request.year, &request.cruise_label);
        let details = SamplingDetails::new(
            &design.unit_key,
            &self.identity.country,
            &self.identity.institution,
        );
        let details_key = details.unit_key.clone();

        // ── Fishing trips: the whole census population, sampled or not ──
        let samples_by_trip: HashMap<&str, Vec<&MatchedSample>> = {
            let mut map: HashMap<&str, Vec<&MatchedSample>> = HashMap::new();
            for m in &matched {
                map.entry(m.trip_id.as_str()).or_default().push(m);
            }
            map
        };
        let departure_keys: Vec<Option<NaiveDateTime>> =
            population.iter().map(|t| t.departure_date).collect();
        let trip_sequence = sequence_by_order(&departure_keys);
        let number_total = population.len() as i64;
        let number_sampled = population
            .iter()
            .filter(|t| samples_by_trip.contains_key(t.trip_id.as_str()))
            .count() as i64;

        let mut trips = Vec::with_capacity(population.len());
        for (trip, seq) in population.iter().zip(&trip_sequence) {
            let sampled = samples_by_trip.contains_key(trip.trip_id.as_str());
            let mut record = FishingTrip::new(&trip.trip_id, &details_key, *seq, sampled);
            record.encrypted_vessel_code = trip
                .registration_no
                .and_then(|no| vessels_by_no.get(&no))
                .and_then(|v| v.vessel_id.clone());
            record.number_of_hauls = trip.stations_cnt;
            record.departure_location =
                Some(locode(trip.departure_port_no)?.unwrap_or_else(|| "IS999".to_string()));
            record.departure_date = trip.departure_date.map(|d| d.format("%Y-%m-%d").to_string());
            record.arrival_location =
                Some(locode(trip.landing_port_no)?.unwrap_or_else(|| "IS999".to_string()));
            record.arrival_date = trip.landing_date.map(|d| d.format("%Y-%m-%d").to_string());
            record.number_total = Some(number_total);
            record.number_sampled = Some(number_sampled);
            trips.push(record);
        }

        // ── Fishing operations: one per matched haul, first match wins ──
        let mut operations: Vec<FishingOperation> = Vec::new();
        let mut seen_ops: HashSet<&str> = HashSet::new();
        for m in &matched {
            if !seen_ops.insert(m.fishing_station_id.as_str()) {
                continue;
            }
            let mut op = FishingOperation::new(&m.fishing_station_id, &m.trip_id);
            op.start_date = m.fishing_start.map(|d| d.format("%Y-%m-%d").to_string());
            op.start_time = m.fishing_start.map(|d| d.format("%H:%M").to_string());
            op.end_date = m.fishing_end.map(|d| d.format("%Y-%m-%d").to_string());
            op.end_time = m.fishing_end.map(|d| d.format("%H:%M").to_string());
            op.duration = match (m.fishing_start, m.fishing_end) {
                (Some(s), Some(e)) => Some((e - s).num_minutes()),
                _ => None,
            };
            op.start_lat = m.tow_latitude;
            op.start_lon = m.tow_longitude;
            op.stop_lat = m.tow_latitude_end;
            op.stop_lon = m.tow_longitude_end;
            op.area = m.area.clone();
            op.metier6 = m.metier6.clone();
            op.gear = m.fao_gear_code.clone();
            op.mesh_size = m.mesh_size;
            operations.push(op);
        }
        let op_sequence = sequence_within(operations.iter().map(|o| o.parent_key.clone()));
        for (op, seq) in operations.iter_mut().zip(op_sequence) {
            op.sequence_number = Some(seq);
        }

        // ── Species selections: per (operation, sample, species) ────────
        let measures_by_sample: HashMap<&str, Vec<&MeasureRow>> = {
            let mut map: HashMap<&str, Vec<&MeasureRow>> = HashMap::new();
            for m in &measures {
                map.entry(m.sample_id.as_str()).or_default().push(m);
            }
            map
        };

        let mut selections: Vec<SpeciesSelection> = Vec::new();
        let mut selection_seen: HashSet<(String, String, i64)> = HashSet::new();
        // First selection per (sample, species): the parent key for the
        // sample record of that pair. With accepted ties a sample can sit
        // under more than one operation; the first one wins.
        let mut first_selection: HashMap<(String, i64), String> = HashMap::new();
        let mut selection_scope: Vec<(String, String)> = Vec::new();
        for m in &matched {
            let Some(sample_measures) = measures_by_sample.get(m.sample_id.as_str()) else {
                continue;
            };
            for meas in sample_measures {
                let Some(species_no) = meas.species_no else {
                    continue;
                };
                let key = (m.fishing_station_id.clone(), m.sample_id.clone(), species_no);
                if !selection_seen.insert(key) {
                    continue;
                }
                let unit_key = format!("{}:{}:{}", m.fishing_station_id, m.sample_id, species_no);
                first_selection
                    .entry((m.sample_id.clone(), species_no))
                    .or_insert_with(|| unit_key.clone());
                let mut sel = SpeciesSelection::new(&unit_key, &m.fishing_station_id, 0);
                let name = species_by_no
                    .get(&species_no)
                    .and_then(|s| s.name.clone());
                sel.species_list_name = name.clone();
                sel.unit_name = name;
                selections.push(sel);
                selection_scope.push((m.fishing_station_id.clone(), m.sample_id.clone()));
            }
        }
        let selection_sequence = sequence_within(selection_scope.into_iter());
        for (sel, seq) in selections.iter_mut().zip(selection_sequence) {
            sel.sequence_number = seq;
        }

        // ── Sample records: per (sample, species), globally sequenced ───
        let mut pair_keys: Vec<(String, i64)> = dedupe(matched.iter().flat_map(|m| {
            measures_by_sample
                .get(m.sample_id.as_str())
                .into_iter()
                .flatten()
                .filter_map(|meas| meas.species_no.map(|no| (m.sample_id.clone(), no)))
        }));
        pair_keys.sort();
        let mut sample_records = Vec::with_capacity(pair_keys.len());
        for (i, (sample_id, species_no)) in pair_keys.iter().enumerate() {
            let Some(parent_key) = first_selection.get(&(sample_id.clone(), *species_no)) else {
                continue;
            };
            let unit_key = format!("{sample_id}:{species_no}");
            let mut rec = SampleRecord::new(&unit_key, parent_key, sample_id, i as i64 + 1);
            rec.species_code = species_by_no
                .get(species_no)
                .and_then(|s| s.aphia_code)
                .map(|c| c.to_string());
            sample_records.push(rec);
        }

        // ── Biological variables: explode each measurement ──────────────
        let kept_samples: HashSet<&str> = matched.iter().map(|m| m.sample_id.as_str()).collect();
        let mut total_by_sample: HashMap<&str, i64> = HashMap::new();
        let mut group_counts: HashMap<(&str, &str), i64> = HashMap::new();
        for m in &measures {
            if !kept_samples.contains(m.sample_id.as_str()) {
                continue;
            }
            *total_by_sample.entry(m.sample_id.as_str()).or_default() += 1;
            if let Some(kind) = m.measure_type.as_deref() {
                *group_counts.entry((m.sample_id.as_str(), kind)).or_default() += 1;
            }
        }

        let mut variables: Vec<BiologicalVariable> = Vec::new();
        for m in &measures {
            if !kept_samples.contains(m.sample_id.as_str()) {
                continue;
            }
            let Some(species_no) = m.species_no else {
                continue;
            };
            let parent_key = format!("{}:{}", m.sample_id, species_no);
            let kind = m.measure_type.as_deref().unwrap_or("");
            let tot = total_by_sample.get(m.sample_id.as_str()).copied();
            let grp = group_counts.get(&(m.sample_id.as_str(), kind)).copied();

            if matches!(kind, "LEN" | "OTOL") {
                if let Some(length) = m.length {
                    let mut bv =
                        BiologicalVariable::new(&m.measure_id, &parent_key, "LengthTotal", "Lengthmm");
                    bv.value_measured = Some(format_measure(length * 10.0));
                    bv.number_total = tot;
                    variables.push(bv);
                }
            }
            if kind == "OTOL" {
                if let Some(weight) = m.weight {
                    let mut bv = BiologicalVariable::new(
                        &m.measure_id,
                        &parent_key,
                        "WeightMeasured",
                        "Weightg",
                    );
                    bv.value_measured = Some(format_measure(weight));
                    bv.number_total = tot;
                    bv.number_sampled = grp;
                    variables.push(bv);
                }
                if let Some(age) = m.age {
                    let mut bv =
                        BiologicalVariable::new(&m.measure_id, &parent_key, "Age", "Ageyear");
                    bv.value_measured = Some(age.to_string());
                    bv.specimen_type = age_specimen(m.otolith_type.as_deref());
                    bv.number_total = tot;
                    bv.number_sampled = grp;
                    variables.push(bv);
                }
            }
        }

        // ── Reference listings ──────────────────────────────────────────
        let year = request.year;
        let mut vessel_details = Vec::with_capacity(vessel_rows.len());
        for v in &vessel_rows {
            let mut vd = VesselDetails::new(v.registration_no, year, &self.identity.country);
            vd.encrypted_vessel_code = v.vessel_id.clone();
            vd.home_port = locode(v.home_port_no)?;
            vd.length = v.length.map(|l| l.round() as i64);
            vd.length_category = v.length.map(|l| vessel_length_category(l).to_string());
            vd.power = v.power_kw.map(|p| p.round() as i64);
            vd.tonnage = v.brutto_weight_tons.map(|t| t.round() as i64);
            vessel_details.push(vd);
        }

        let mut species_lists = Vec::with_capacity(species.len());
        let mut individual_species = Vec::with_capacity(species.len());
        for s in &species {
            let mut sl = SpeciesList::new(
                s.species_no,
                year,
                &self.identity.country,
                &self.identity.institution,
            );
            sl.species_list_name = s.name.clone();
            species_lists.push(sl);
            individual_species.push(IndividualSpecies::new(s.species_no, s.aphia_code));
        }

        // ── Validate every level and attach the computed screen ─────────
        let mut variable_batch = LevelBatch::new(
            Level::BiologicalVariable,
            BiologicalVariable::frame(&variables)?,
        )?;
        let screened = length_weight_screen(&measures_frame(&measures, &species_by_no)?)?;
        if !screened.is_empty() {
            variable_batch
                .report
                .computed_errors
                .insert("Biology consistency".to_string(), screened);
        }

        let submission = HierarchySubmission {
            references: vec![
                LevelBatch::new(Level::VesselDetails, VesselDetails::frame(&vessel_details)?)?,
                LevelBatch::new(Level::SpeciesList, SpeciesList::frame(&species_lists)?)?,
                LevelBatch::new(
                    Level::IndividualSpecies,
                    IndividualSpecies::frame(&individual_species)?,
                )?,
            ],
            hierarchy: vec![
                LevelBatch::new(Level::Design, Design::frame(&[design])?)?,
                LevelBatch::new(Level::SamplingDetails, SamplingDetails::frame(&[details])?)?,
                LevelBatch::new(Level::FishingTrip, FishingTrip::frame(&trips)?)?,
                LevelBatch::new(Level::FishingOperation, FishingOperation::frame(&operations)?)?,
                LevelBatch::new(Level::SpeciesSelection, SpeciesSelection::frame(&selections)?)?,
                LevelBatch::new(Level::Sample, SampleRecord::frame(&sample_records)?)?,
                variable_batch,
            ],
        };

        info!(
            trips = trips.len(),
            operations = operations.len(),
            selections = selections.len(),
            samples = sample_records.len(),
            variables = variables.len(),
            blocked = submission.has_blocking_errors(),
            "submission built"
        );

        Ok(submission)
    }

    /// Resolve each station to its reported trip and its area code.
    fn link_stations(&self, stations: Vec<StationRow>) -> Result<Vec<LinkedStation>, ReportError> {
        let mut linked = Vec::with_capacity(stations.len());
        for row in stations {
            let trip = match (row.vessel_no, row.station_date) {
                (Some(vessel_no), Some(date)) => self.trip_reports.trip_for(vessel_no, date)?,
                _ => None,
            };
            let area = match (row.latitude, row.longitude) {
                (Some(lat), Some(lon)) => self.areas.area_code(lat, lon)?,
                _ => None,
            };
            linked.push(LinkedStation { row, trip, area });
        }
        Ok(linked)
    }

    /// Gear classification per distinct (area, gear, assemblage, mesh),
    /// memoised so each combination hits the lookup once.
    fn resolve_metiers(&self, matched: &mut [MatchedSample]) -> Result<(), ReportError> {
        let mut memo: HashMap<(String, String, String, i64), Option<String>> = HashMap::new();
        for m in matched.iter_mut() {
            let (Some(area), Some(gear), Some(assemblage), Some(mesh)) = (
                m.area.as_ref(),
                m.fao_gear_code.as_ref(),
                m.target_assemblage.as_ref(),
                m.mesh_size,
            ) else {
                continue;
            };
            let key = (area.clone(), gear.clone(), assemblage.clone(), mesh);
            let metier = match memo.get(&key) {
                Some(cached) => cached.clone(),
                None => {
                    let looked_up = self.metiers.metier(area, gear, assemblage, mesh)?;
                    memo.insert(key, looked_up.clone());
                    looked_up
                }
            };
            m.metier6 = metier;
        }
        Ok(())
    }
}

// ── Frame plumbing ──────────────────────────────────────────────────────────

fn datetime_column(name: &str, values: Vec<Option<NaiveDateTime>>) -> Result<Column, ReportError> {
    let micros: Vec<Option<i64>> = values
        .iter()
        .map(|v| v.map(|d| d.and_utc().timestamp_micros()))
        .collect();
    let series = Series::new(name.into(), micros)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;
    Ok(series.into())
}

/// Inner-join stations, samples and hauls on their shared keys into the
/// candidate table the matcher scores.
fn candidate_frame(
    linked: &[LinkedStation],
    samples: &[SampleObsRow],
    hauls: &[HaulRow],
) -> Result<DataFrame, ReportError> {
    let stations_df = DataFrame::new(vec![
        Column::new(
            station::STATION_ID.into(),
            linked
                .iter()
                .map(|s| Some(s.row.station_id.clone()))
                .collect::<Vec<_>>(),
        ),
        Column::new(
            station::FISHING_TRIP_ID.into(),
            linked
                .iter()
                .map(|s| s.trip.as_ref().map(|t| t.trip_id.clone()))
                .collect::<Vec<_>>(),
        ),
        datetime_column(
            station::STATION_DATE,
            linked.iter().map(|s| s.row.station_date).collect(),
        )?,
        Column::new(
            station::LATITUDE.into(),
            linked.iter().map(|s| s.row.latitude).collect::<Vec<_>>(),
        ),
        Column::new(
            station::LONGITUDE.into(),
            linked.iter().map(|s| s.row.longitude).collect::<Vec<_>>(),
        ),
        Column::new(
            station::AREA.into(),
            linked.iter().map(|s| s.area.clone()).collect::<Vec<_>>(),
        ),
    ])?;

    let samples_df = DataFrame::new(vec![
        Column::new(
            sample::STATION_ID.into(),
            samples
                .iter()
                .map(|s| Some(s.station_id.clone()))
                .collect::<Vec<_>>(),
        ),
        Column::new(
            sample::SAMPLE_ID.into(),
            samples
                .iter()
                .map(|s| Some(s.sample_id.clone()))
                .collect::<Vec<_>>(),
        ),
        Column::new(
            sample::TARGET_ASSEMBLAGE.into(),
            samples
                .iter()
                .map(|s| s.target_assemblage.clone())
                .collect::<Vec<_>>(),
        ),
    ])?;

    let hauls_df = DataFrame::new(vec![
        Column::new(
            haul::FISHING_TRIP_ID.into(),
            hauls.iter().map(|h| Some(h.trip_id.clone())).collect::<Vec<_>>(),
        ),
        Column::new(
            haul::FISHING_STATION_ID.into(),
            hauls
                .iter()
                .map(|h| Some(h.fishing_station_id.clone()))
                .collect::<Vec<_>>(),
        ),
        datetime_column(
            haul::FISHING_START,
            hauls.iter().map(|h| h.fishing_start).collect(),
        )?,
        datetime_column(haul::FISHING_END, hauls.iter().map(|h| h.fishing_end).collect())?,
        Column::new(
            haul::TOW_LATITUDE.into(),
            hauls.iter().map(|h| h.latitude).collect::<Vec<_>>(),
        ),
        Column::new(
            haul::TOW_LONGITUDE.into(),
            hauls.iter().map(|h| h.longitude).collect::<Vec<_>>(),
        ),
        Column::new(
            haul::TOW_LATITUDE_END.into(),
            hauls.iter().map(|h| h.latitude_end).collect::<Vec<_>>(),
        ),
        Column::new(
            haul::TOW_LONGITUDE_END.into(),
            hauls.iter().map(|h| h.longitude_end).collect::<Vec<_>>(),
        ),
        Column::new(
            haul::FAO_GEAR_CODE.into(),
            hauls.iter().map(|h| h.fao_gear_code.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            haul::MESH_SIZE.into(),
            hauls.iter().map(|h| h.mesh_size).collect::<Vec<_>>(),
        ),
    ])?;

    let merged = stations_df
        .lazy()
        .join(
            samples_df.lazy(),
            [col(station::STATION_ID)],
            [col(sample::STATION_ID)],
            JoinArgs::new(JoinType::Inner),
        )
        .join(
            hauls_df.lazy(),
            [col(station::FISHING_TRIP_ID)],
            [col(haul::FISHING_TRIP_ID)],
            JoinArgs::new(JoinType::Inner),
        )
        .collect()?;

    Ok(merged)
}

fn datetime_values(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDateTime>>, ReportError> {
    let series = df.column(name)?.as_materialized_series();
    let DataType::Datetime(unit, _) = series.dtype() else {
        return Err(ReportError::InvalidData(format!(
            "column '{name}' must be a datetime"
        )));
    };
    let unit = *unit;
    let physical = series.to_physical_repr();
    let values = physical.i64()?;
    Ok(values
        .into_iter()
        .map(|v| {
            v.and_then(|t| {
                let micros = match unit {
                    TimeUnit::Nanoseconds => t / 1000,
                    TimeUnit::Microseconds => t,
                    TimeUnit::Milliseconds => t * 1000,
                };
                chrono::DateTime::from_timestamp_micros(micros).map(|d| d.naive_utc())
            })
        })
        .collect())
}

fn str_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, ReportError> {
    Ok(df
        .column(name)?
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

fn extract_matched(kept: &DataFrame) -> Result<Vec<MatchedSample>, ReportError> {
    let trip_ids = str_values(kept, station::FISHING_TRIP_ID)?;
    let station_ids = str_values(kept, station::STATION_ID)?;
    let sample_ids = str_values(kept, sample::SAMPLE_ID)?;
    let assemblages = str_values(kept, sample::TARGET_ASSEMBLAGE)?;
    let haul_ids = str_values(kept, haul::FISHING_STATION_ID)?;
    let gear = str_values(kept, haul::FAO_GEAR_CODE)?;
    let areas = str_values(kept, station::AREA)?;
    let starts = datetime_values(kept, haul::FISHING_START)?;
    let ends = datetime_values(kept, haul::FISHING_END)?;
    let tow_lat = kept
        .column(haul::TOW_LATITUDE)?
        .as_materialized_series()
        .f64()?
        .clone();
    let tow_lon = kept
        .column(haul::TOW_LONGITUDE)?
        .as_materialized_series()
        .f64()?
        .clone();
    let tow_lat_end = kept
        .column(haul::TOW_LATITUDE_END)?
        .as_materialized_series()
        .f64()?
        .clone();
    let tow_lon_end = kept
        .column(haul::TOW_LONGITUDE_END)?
        .as_materialized_series()
        .f64()?
        .clone();
    let mesh = kept
        .column(haul::MESH_SIZE)?
        .as_materialized_series()
        .i64()?
        .clone();

    let mut out = Vec::with_capacity(kept.height());
    for i in 0..kept.height() {
        // Keyless rows cannot be placed in the hierarchy at all.
        let (Some(trip_id), Some(station_id), Some(sample_id), Some(haul_id)) = (
            trip_ids[i].clone(),
            station_ids[i].clone(),
            sample_ids[i].clone(),
            haul_ids[i].clone(),
        ) else {
            continue;
        };
        out.push(MatchedSample {
            trip_id,
            station_id,
            sample_id,
            target_assemblage: assemblages[i].clone(),
            fishing_station_id: haul_id,
            fishing_start: starts[i],
            fishing_end: ends[i],
            tow_latitude: tow_lat.get(i),
            tow_longitude: tow_lon.get(i),
            tow_latitude_end: tow_lat_end.get(i),
            tow_longitude_end: tow_lon_end.get(i),
            fao_gear_code: gear[i].clone(),
            mesh_size: mesh.get(i),
            area: areas[i].clone(),
            metier6: None,
        })
    }
    Ok(out)
}

/// Measure table for the length/weight screen: id, species aphia code,
/// length (cm), weight (g).
fn measures_frame(
    measures: &[MeasureRow],
    species_by_no: &HashMap<i64, &SpeciesRow>,
) -> Result<DataFrame, ReportError> {
    let df = DataFrame::new(vec![
        Column::new(
            measure::MEASURE_ID.into(),
            measures
                .iter()
                .map(|m| Some(m.measure_id.clone()))
                .collect::<Vec<_>>(),
        ),
        Column::new(
            measure::SPECIES_CODE.into(),
            measures
                .iter()
                .map(|m| {
                    m.species_no
                        .and_then(|no| species_by_no.get(&no))
                        .and_then(|s| s.aphia_code)
                        .map(|c| c.to_string())
                })
                .collect::<Vec<_>>(),
        ),
        Column::new(
            measure::LENGTH.into(),
            measures.iter().map(|m| m.length).collect::<Vec<_>>(),
        ),
        Column::new(
            measure::WEIGHT.into(),
            measures.iter().map(|m| m.weight).collect::<Vec<_>>(),
        ),
    ])?;
    Ok(df)
}

// ── Small helpers ───────────────────────────────────────────────────────────

fn dedupe<T: Eq + std::hash::Hash + Clone>(values: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Measurement values print without a trailing `.0` when integral.
fn format_measure(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Specimen type for an age reading, from the otolith-type code.
fn age_specimen(otolith_type: Option<&str>) -> Option<String> {
    match otolith_type {
        Some("OTOL") => Some("otolith".to_string()),
        Some("SCAL") => Some("scale".to_string()),
        Some("VERT") => Some("vertebra".to_string()),
        _ => None,
    }
}

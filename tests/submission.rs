//! End-to-end: fake sources → build → validate → assemble → export.

use chrono::{NaiveDate, NaiveDateTime};

use catch_reportkit::assembler::{Assembler, WriteMode};
use catch_reportkit::error::ReportError;
use catch_reportkit::exporter::export;
use catch_reportkit::matcher::MatchConfig;
use catch_reportkit::records::Level;
use catch_reportkit::sources::{
    AreaLookup, HarbourLookup, HaulRow, MeasureRow, MetierLookup, ObservationSource,
    SampleObsRow, SpeciesRow, StationRow, TripReportSource, TripRow, TripSummary,
    VesselRegistry, VesselRow,
};
use catch_reportkit::store::{MemoryStore, RecordStore};
use catch_reportkit::submission::{ReporterIdentity, SubmissionBuilder, SubmissionRequest};

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// A single cruise: two stations on trip T1, one haul whose midpoint
/// sits exactly on the first station, a census population of three
/// trips of which only T1 was sampled.
struct FakeWorld;

impl ObservationSource for FakeWorld {
    fn stations(&self, cruise_ids: &[String]) -> Result<Vec<StationRow>, ReportError> {
        assert_eq!(cruise_ids, ["MAKR-2024-C1".to_string()]);
        Ok(vec![
            StationRow {
                cruise_id: "MAKR-2024-C1".to_string(),
                station_id: "ST1".to_string(),
                station_date: Some(at(2, 12)),
                latitude: Some(64.0),
                longitude: Some(-22.0),
                vessel_no: Some(100),
            },
            StationRow {
                cruise_id: "MAKR-2024-C1".to_string(),
                station_id: "ST2".to_string(),
                station_date: Some(at(2, 13)),
                latitude: Some(64.1),
                longitude: Some(-22.1),
                vessel_no: Some(100),
            },
        ])
    }

    fn samples(&self, _station_ids: &[String]) -> Result<Vec<SampleObsRow>, ReportError> {
        Ok(vec![
            SampleObsRow {
                station_id: "ST1".to_string(),
                sample_id: "SMP1".to_string(),
                target_assemblage: Some("SPF".to_string()),
            },
            SampleObsRow {
                station_id: "ST2".to_string(),
                sample_id: "SMP2".to_string(),
                target_assemblage: Some("SPF".to_string()),
            },
        ])
    }

    fn measures(&self, sample_ids: &[String]) -> Result<Vec<MeasureRow>, ReportError> {
        // Only the winning station's sample carries measurements.
        assert!(sample_ids.contains(&"SMP1".to_string()));
        Ok(vec![
            MeasureRow {
                measure_id: "M1".to_string(),
                sample_id: "SMP1".to_string(),
                species_no: Some(101),
                measure_type: Some("LEN".to_string()),
                length: Some(36.0),
                weight: None,
                age: None,
                otolith_type: None,
                sex_no: None,
            },
            MeasureRow {
                measure_id: "M2".to_string(),
                sample_id: "SMP1".to_string(),
                species_no: Some(101),
                measure_type: Some("OTOL".to_string()),
                length: Some(36.5),
                weight: Some(320.0),
                age: Some(6),
                otolith_type: Some("OTOL".to_string()),
                sex_no: Some(1),
            },
        ])
    }

    fn species(&self, species_nos: &[i64]) -> Result<Vec<SpeciesRow>, ReportError> {
        assert_eq!(species_nos, [101]);
        Ok(vec![SpeciesRow {
            species_no: 101,
            aphia_code: Some(127023),
            name: Some("Atlantic mackerel".to_string()),
        }])
    }
}

impl TripReportSource for FakeWorld {
    fn trip_for(
        &self,
        vessel_no: i64,
        _date: NaiveDateTime,
    ) -> Result<Option<TripSummary>, ReportError> {
        Ok((vessel_no == 100).then(|| TripSummary {
            trip_id: "T1".to_string(),
            departure: Some(at(1, 6)),
            landing: Some(at(3, 18)),
            departure_port_no: Some(7),
            landing_port_no: Some(7),
        }))
    }

    fn population(&self, target_species_no: i64, year: i64) -> Result<Vec<TripRow>, ReportError> {
        assert_eq!((target_species_no, year), (30, 2024));
        let trip = |id: &str, reg: i64, dep: u32| TripRow {
            trip_id: id.to_string(),
            registration_no: Some(reg),
            departure_date: Some(at(dep, 6)),
            landing_date: Some(at(dep + 2, 18)),
            departure_port_no: Some(7),
            landing_port_no: Some(9),
            quantity: Some(120_000.0),
            stations_cnt: Some(4),
        };
        Ok(vec![trip("T1", 100, 1), trip("T2", 101, 2), trip("T3", 102, 3)])
    }

    fn hauls_for_target(
        &self,
        trip_ids: &[String],
        _target_species_no: i64,
    ) -> Result<Vec<HaulRow>, ReportError> {
        assert_eq!(trip_ids, ["T1".to_string()]);
        Ok(vec![HaulRow {
            fishing_station_id: "H1".to_string(),
            trip_id: "T1".to_string(),
            fishing_start: Some(at(2, 10)),
            fishing_end: Some(at(2, 14)),
            latitude: Some(64.0),
            longitude: Some(-22.0),
            latitude_end: Some(64.0),
            longitude_end: Some(-22.0),
            fao_gear_code: Some("OTM".to_string()),
            mesh_size: Some(80),
        }])
    }
}

impl VesselRegistry for FakeWorld {
    fn vessels(&self, registration_nos: &[i64]) -> Result<Vec<VesselRow>, ReportError> {
        Ok(registration_nos
            .iter()
            .map(|&no| VesselRow {
                registration_no: no,
                vessel_id: Some(format!("V{no}")),
                home_port_no: Some(7),
                length: Some(45.2),
                power_kw: Some(1800.0),
                brutto_weight_tons: Some(950.0),
            })
            .collect())
    }
}

impl AreaLookup for FakeWorld {
    fn area_code(&self, _latitude: f64, _longitude: f64) -> Result<Option<String>, ReportError> {
        Ok(Some("27.5.a".to_string()))
    }
}

impl MetierLookup for FakeWorld {
    fn metier(
        &self,
        area: &str,
        gear: &str,
        target_assemblage: &str,
        mesh_size: i64,
    ) -> Result<Option<String>, ReportError> {
        assert_eq!((area, gear, target_assemblage, mesh_size), ("27.5.a", "OTM", "SPF", 80));
        Ok(Some("OTM_SPF_>0_0_0".to_string()))
    }
}

impl HarbourLookup for FakeWorld {
    fn locode(&self, port_no: i64) -> Result<Option<String>, ReportError> {
        Ok(match port_no {
            7 => Some("ISREY".to_string()),
            _ => None,
        })
    }
}

fn build_world() -> catch_reportkit::assembler::HierarchySubmission {
    let world = FakeWorld;
    let builder = SubmissionBuilder::new(
        &world,
        &world,
        &world,
        &world,
        &world,
        &world,
        ReporterIdentity {
            country: "IS".to_string(),
            institution: "4766".to_string(),
        },
        MatchConfig::default(),
    );
    builder
        .build(&SubmissionRequest {
            cruise_ids: vec!["MAKR-2024-C1".to_string()],
            cruise_label: "MAKR-2024".to_string(),
            year: 2024,
            target_species_no: 30,
        })
        .unwrap()
}

#[test]
fn full_flow_builds_assembles_and_exports() {
    let submission = build_world();
    for (level, report) in submission.reports() {
        assert!(
            !report.has_blocking_errors(),
            "{:?} has findings: {report:?}",
            level
        );
    }

    let mut store = MemoryStore::new();
    let outcome = Assembler::new(&mut store)
        .write(&submission, WriteMode::Strict)
        .unwrap();
    assert!(!outcome.blocked);

    // Census: all three trips written, one sampled.
    let trips = store.select(Level::FishingTrip).unwrap();
    assert_eq!(trips.len(), 3);
    let sampled: Vec<&str> = trips
        .iter()
        .filter(|t| t["FTsampled"] == serde_json::json!("Y"))
        .map(|t| t["FTunitName"].as_str().unwrap())
        .collect();
    assert_eq!(sampled, ["T1"]);
    for t in &trips {
        assert_eq!(t["FTnumberTotal"], serde_json::json!(3));
        assert_eq!(t["FTnumberSampled"], serde_json::json!(1));
        assert_eq!(t["FTencryptedVesselCode"].as_str().unwrap().chars().next(), Some('V'));
    }

    // The operation hangs off the written T1.
    let t1_id = trips
        .iter()
        .find(|t| t["FTunitName"] == serde_json::json!("T1"))
        .and_then(|t| t["FTid"].as_i64())
        .unwrap();
    let ops = store.select(Level::FishingOperation).unwrap();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0]["FTid"].as_i64(), Some(t1_id));
    assert_eq!(ops[0]["FOgear"], serde_json::json!("OTM"));
    assert_eq!(ops[0]["FOmetier6"], serde_json::json!("OTM_SPF_>0_0_0"));
    assert_eq!(ops[0]["FOduration"], serde_json::json!(240));

    // One selection, one sample record, four variables (LEN length +
    // OTOL length/weight/age).
    assert_eq!(store.select(Level::SpeciesSelection).unwrap().len(), 1);
    let samples = store.select(Level::Sample).unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0]["SAspeciesCode"], serde_json::json!("127023"));
    let variables = store.select(Level::BiologicalVariable).unwrap();
    assert_eq!(variables.len(), 4);
    let kinds: Vec<&str> = variables
        .iter()
        .map(|v| v["BVtypeMeasured"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, ["LengthTotal", "LengthTotal", "WeightMeasured", "Age"]);
    // Lengths are reported in millimetres.
    assert_eq!(variables[0]["BVvalueMeasured"], serde_json::json!("360"));
    assert_eq!(variables[3]["BVspecimenType"], serde_json::json!("otolith"));

    // Export and check the depth-first shape.
    let dir = tempfile::tempdir().unwrap();
    let paths = export(&store, dir.path(), "makr2024").unwrap();

    let h2 = std::fs::read_to_string(&paths.hierarchy).unwrap();
    let kinds: Vec<&str> = h2.lines().map(|l| l.split(',').next().unwrap()).collect();
    assert_eq!(
        kinds,
        ["DE", "SD", "FT", "FO", "SS", "SA", "BV", "BV", "BV", "BV", "FT", "FT"]
    );

    let hvd = std::fs::read_to_string(&paths.vessel_details).unwrap();
    assert_eq!(hvd.lines().count(), 3);
    assert!(hvd.lines().all(|l| l.starts_with("VD,")));

    let hsl = std::fs::read_to_string(&paths.species_listing).unwrap();
    let hsl_kinds: Vec<&str> = hsl.lines().map(|l| l.split(',').next().unwrap()).collect();
    assert_eq!(hsl_kinds, ["SL", "IS"]);
}

#[test]
fn unsampled_trips_still_enter_the_census() {
    let submission = build_world();
    let trip_batch = submission
        .hierarchy
        .iter()
        .find(|b| b.level == Level::FishingTrip)
        .unwrap();
    assert_eq!(trip_batch.frame.height(), 3);
    let sampled = trip_batch
        .frame
        .column("FTsampled")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap().to_string())
        .collect::<Vec<_>>();
    assert_eq!(sampled, ["Y", "N", "N"]);
    // Departure-date ordering gives T1 sequence 1.
    let seq = trip_batch
        .frame
        .column("FTsequenceNumber")
        .unwrap()
        .as_materialized_series()
        .i64()
        .unwrap()
        .clone();
    assert_eq!(seq.get(0), Some(1));
    assert_eq!(seq.get(1), Some(2));
    assert_eq!(seq.get(2), Some(3));
}

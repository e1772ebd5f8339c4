//! Spatiotemporal matching of sampling stations to reported hauls.
//!
//! Stations and hauls come from independent reporting chains and share no
//! key beyond the fishing trip, so the best haul for each sampled station
//! is picked by space/time proximity: planar distance to the haul's tow
//! midpoint combined with the absolute time offset from the tow's
//! temporal midpoint, normalised over the whole candidate table and
//! rescaled per trip so the best candidate lands on exactly 1.0.

use std::collections::HashMap;

use polars::prelude::*;
use tracing::debug;

use crate::error::ReportError;
use crate::geo;
use crate::schema::{haul, matching, station};

/// Matcher weights. `time_weight` balances time against distance and must
/// lie in `[0, 1]`; 0 scores on distance alone, 1 on time alone.
#[derive(Debug, Clone, Copy)]
pub struct MatchConfig {
    time_weight: f64,
}

impl MatchConfig {
    pub fn new(time_weight: f64) -> Result<Self, ReportError> {
        if !(0.0..=1.0).contains(&time_weight) {
            return Err(ReportError::InvalidData(format!(
                "time_weight must be between 0 and 1, got {time_weight}"
            )));
        }
        Ok(Self { time_weight })
    }

    pub fn time_weight(&self) -> f64 {
        self.time_weight
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self { time_weight: 0.5 }
    }
}

fn seconds_per_unit(unit: TimeUnit) -> f64 {
    match unit {
        TimeUnit::Nanoseconds => 1e9,
        TimeUnit::Microseconds => 1e6,
        TimeUnit::Milliseconds => 1e3,
    }
}

/// Read a datetime column as seconds since the epoch, per row.
fn timestamp_seconds(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, ReportError> {
    let series = df.column(name)?.as_materialized_series();
    let DataType::Datetime(unit, _) = series.dtype() else {
        return Err(ReportError::InvalidData(format!(
            "column '{name}' must be a datetime, got {:?}",
            series.dtype()
        )));
    };
    let per_second = seconds_per_unit(*unit);
    let physical = series.to_physical_repr();
    let values = physical.i64()?;
    Ok(values
        .into_iter()
        .map(|v| v.map(|t| t as f64 / per_second))
        .collect())
}

/// Score every station×haul candidate row and append the proximity
/// columns: `spatial_distance` (m), `time_diff` (s), `score` and
/// `scaled_score`.
///
/// Rows missing a position or timestamp on either side are excluded from
/// scoring and keep nulls in all four columns; they pass through, they
/// are never dropped. Within each `fishing_trip_id` group the combined
/// score is inverse min-max rescaled to `[0, 1]`; a group whose scores
/// are all equal rescales every row to 1.0, so ties are accepted as
/// joint best matches rather than broken arbitrarily. If the trip column
/// is absent the whole table rescales as one group.
pub fn match_closest_haul(df: &DataFrame, config: &MatchConfig) -> Result<DataFrame, ReportError> {
    let height = df.height();

    let lat = df.column(station::LATITUDE)?.as_materialized_series().f64()?;
    let lon = df
        .column(station::LONGITUDE)?
        .as_materialized_series()
        .f64()?;
    let tow_lat = df
        .column(haul::TOW_LATITUDE)?
        .as_materialized_series()
        .f64()?;
    let tow_lon = df
        .column(haul::TOW_LONGITUDE)?
        .as_materialized_series()
        .f64()?;
    let tow_lat_end = df
        .column(haul::TOW_LATITUDE_END)?
        .as_materialized_series()
        .f64()?;
    let tow_lon_end = df
        .column(haul::TOW_LONGITUDE_END)?
        .as_materialized_series()
        .f64()?;

    let station_t = timestamp_seconds(df, station::STATION_DATE)?;
    let start_t = timestamp_seconds(df, haul::FISHING_START)?;
    let end_t = timestamp_seconds(df, haul::FISHING_END)?;

    // Pass 1: raw distance and time offset for rows with complete data.
    let mut spatial: Vec<Option<f64>> = Vec::with_capacity(height);
    let mut temporal: Vec<Option<f64>> = Vec::with_capacity(height);
    for i in 0..height {
        let complete = (
            lat.get(i),
            lon.get(i),
            tow_lat.get(i),
            tow_lon.get(i),
            tow_lat_end.get(i),
            tow_lon_end.get(i),
            station_t[i],
            start_t[i],
            end_t[i],
        );
        let (
            Some(lat),
            Some(lon),
            Some(t_lat),
            Some(t_lon),
            Some(t_lat_end),
            Some(t_lon_end),
            Some(obs_t),
            Some(start_t),
            Some(end_t),
        ) = complete
        else {
            spatial.push(None);
            temporal.push(None);
            continue;
        };

        let mid_lat = (t_lat + t_lat_end) / 2.0;
        let mid_lon = (t_lon + t_lon_end) / 2.0;
        let distance = geo::planar_distance(geo::project(lat, lon), geo::project(mid_lat, mid_lon));

        let mid_t = (start_t + end_t) / 2.0;
        let time_diff = (obs_t - mid_t).abs();

        spatial.push(Some(distance));
        temporal.push(Some(time_diff));
    }

    // Pass 2: normalise each measure by its observed maximum and combine.
    let s_max = spatial.iter().flatten().cloned().fold(0.0_f64, f64::max);
    let t_max = temporal.iter().flatten().cloned().fold(0.0_f64, f64::max);
    let w = config.time_weight;
    let scores: Vec<Option<f64>> = spatial
        .iter()
        .zip(&temporal)
        .map(|(s, t)| match (s, t) {
            (Some(s), Some(t)) => {
                let s_norm = if s_max > 0.0 { s / s_max } else { 0.0 };
                let t_norm = if t_max > 0.0 { t / t_max } else { 0.0 };
                Some((1.0 - w) * s_norm + w * t_norm)
            }
            _ => None,
        })
        .collect();

    // Pass 3: inverse min-max rescale per trip group.
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    if let Ok(trip) = df.column(station::FISHING_TRIP_ID) {
        let trip = trip.str()?;
        for (i, score) in scores.iter().enumerate() {
            if score.is_some() {
                if let Some(key) = trip.get(i) {
                    groups.entry(key.to_string()).or_default().push(i);
                }
            }
        }
    } else {
        let all: Vec<usize> = scores
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|_| i))
            .collect();
        if !all.is_empty() {
            groups.insert(String::new(), all);
        }
    }

    let mut scaled: Vec<Option<f64>> = vec![None; height];
    for rows in groups.values() {
        let group_scores: Vec<f64> = rows.iter().map(|&i| scores[i].unwrap_or(0.0)).collect();
        let min = group_scores.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = group_scores
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        for (&i, &s) in rows.iter().zip(&group_scores) {
            scaled[i] = if max == min {
                Some(1.0)
            } else {
                Some(1.0 - (s - min) / (max - min))
            };
        }
    }

    debug!(
        candidates = height,
        scored = scores.iter().flatten().count(),
        groups = groups.len(),
        "matched stations against hauls"
    );

    let out = df.hstack(&[
        Column::new(matching::SPATIAL_DISTANCE.into(), spatial),
        Column::new(matching::TIME_DIFF.into(), temporal),
        Column::new(matching::SCORE.into(), scores),
        Column::new(matching::SCALED_SCORE.into(), scaled),
    ])?;

    Ok(out)
}

/// Keep the winning candidate rows: a scaled score of exactly 1.0, or a
/// null score for rows that could not be compared at all (those stay so
/// the station is not silently lost downstream).
pub fn best_matches(df: &DataFrame) -> Result<DataFrame, ReportError> {
    let out = df
        .clone()
        .lazy()
        .filter(
            col(matching::SCALED_SCORE)
                .eq(lit(1.0))
                .or(col(matching::SCALED_SCORE).is_null()),
        )
        .collect()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt_column(name: &str, micros: Vec<Option<i64>>) -> Column {
        Series::new(name.into(), micros)
            .cast(&DataType::Datetime(TimeUnit::Microseconds, None))
            .unwrap()
            .into()
    }

    /// One haul per trip, two candidate stations each; timestamps in
    /// microseconds since epoch.
    fn candidates(
        trips: Vec<Option<&str>>,
        station_pos: Vec<(Option<f64>, Option<f64>)>,
        station_t: Vec<Option<i64>>,
        tow_start: Vec<(Option<f64>, Option<f64>)>,
        tow_end: Vec<(Option<f64>, Option<f64>)>,
        haul_t: Vec<(Option<i64>, Option<i64>)>,
    ) -> DataFrame {
        DataFrame::new(vec![
            Column::new(station::FISHING_TRIP_ID.into(), trips),
            Column::new(
                station::LATITUDE.into(),
                station_pos.iter().map(|p| p.0).collect::<Vec<_>>(),
            ),
            Column::new(
                station::LONGITUDE.into(),
                station_pos.iter().map(|p| p.1).collect::<Vec<_>>(),
            ),
            dt_column(station::STATION_DATE, station_t),
            Column::new(
                haul::TOW_LATITUDE.into(),
                tow_start.iter().map(|p| p.0).collect::<Vec<_>>(),
            ),
            Column::new(
                haul::TOW_LONGITUDE.into(),
                tow_start.iter().map(|p| p.1).collect::<Vec<_>>(),
            ),
            Column::new(
                haul::TOW_LATITUDE_END.into(),
                tow_end.iter().map(|p| p.0).collect::<Vec<_>>(),
            ),
            Column::new(
                haul::TOW_LONGITUDE_END.into(),
                tow_end.iter().map(|p| p.1).collect::<Vec<_>>(),
            ),
            dt_column(
                haul::FISHING_START,
                haul_t.iter().map(|t| t.0).collect::<Vec<_>>(),
            ),
            dt_column(
                haul::FISHING_END,
                haul_t.iter().map(|t| t.1).collect::<Vec<_>>(),
            ),
        ])
        .unwrap()
    }

    const T0: i64 = 1_717_200_000_000_000; // some mid-2024 instant, µs

    #[test]
    fn closest_station_scores_one_and_the_other_lower() {
        // Haul midpoint sits exactly on the first station in space and
        // time; the second station is offset by 0.1° and one hour.
        let df = candidates(
            vec![Some("T1"), Some("T1")],
            vec![(Some(64.0), Some(-22.0)), (Some(64.1), Some(-22.1))],
            vec![Some(T0), Some(T0 + 3_600_000_000)],
            vec![(Some(64.0), Some(-22.0)), (Some(64.0), Some(-22.0))],
            vec![(Some(64.0), Some(-22.0)), (Some(64.0), Some(-22.0))],
            vec![(Some(T0), Some(T0)), (Some(T0), Some(T0))],
        );
        let out = match_closest_haul(&df, &MatchConfig::default()).unwrap();
        let scaled = out
            .column(matching::SCALED_SCORE)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .clone();
        assert_eq!(scaled.get(0), Some(1.0));
        assert!(scaled.get(1).unwrap() < 1.0);

        // The winner also has the lowest raw combined score.
        let score = out
            .column(matching::SCORE)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .clone();
        assert!(score.get(0).unwrap() < score.get(1).unwrap());
    }

    #[test]
    fn equal_scores_within_a_trip_all_rescale_to_one() {
        // Two stations at the identical offset from the same haul
        // midpoint: a genuine tie, both must be accepted as best.
        let df = candidates(
            vec![Some("T1"), Some("T1")],
            vec![(Some(64.05), Some(-22.0)), (Some(64.05), Some(-22.0))],
            vec![Some(T0 + 60_000_000), Some(T0 + 60_000_000)],
            vec![(Some(64.0), Some(-22.0)), (Some(64.0), Some(-22.0))],
            vec![(Some(64.0), Some(-22.0)), (Some(64.0), Some(-22.0))],
            vec![(Some(T0), Some(T0)), (Some(T0), Some(T0))],
        );
        let out = match_closest_haul(&df, &MatchConfig::default()).unwrap();
        let scaled = out
            .column(matching::SCALED_SCORE)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .clone();
        let a = scaled.get(0).unwrap();
        let b = scaled.get(1).unwrap();
        assert!((a - 1.0).abs() < 1e-9, "got {a}");
        assert!((b - 1.0).abs() < 1e-9, "got {b}");
    }

    #[test]
    fn rows_with_missing_fields_pass_through_unscored() {
        let df = candidates(
            vec![Some("T1"), Some("T1")],
            vec![(Some(64.0), Some(-22.0)), (None, Some(-22.1))],
            vec![Some(T0), Some(T0)],
            vec![(Some(64.0), Some(-22.0)), (Some(64.0), Some(-22.0))],
            vec![(Some(64.0), Some(-22.0)), (Some(64.0), Some(-22.0))],
            vec![(Some(T0), Some(T0)), (Some(T0), Some(T0))],
        );
        let out = match_closest_haul(&df, &MatchConfig::default()).unwrap();
        assert_eq!(out.height(), 2);
        let scaled = out
            .column(matching::SCALED_SCORE)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .clone();
        assert_eq!(scaled.get(0), Some(1.0));
        assert_eq!(scaled.get(1), None);

        // best_matches keeps both the winner and the unscored row.
        let kept = best_matches(&out).unwrap();
        assert_eq!(kept.height(), 2);
    }

    #[test]
    fn groups_rescale_independently() {
        // T2's only candidate is far away in absolute terms but still the
        // best of its own trip, so it must also score 1.0.
        let df = candidates(
            vec![Some("T1"), Some("T1"), Some("T2")],
            vec![
                (Some(64.0), Some(-22.0)),
                (Some(64.2), Some(-22.0)),
                (Some(66.0), Some(-18.0)),
            ],
            vec![Some(T0), Some(T0), Some(T0)],
            vec![
                (Some(64.0), Some(-22.0)),
                (Some(64.0), Some(-22.0)),
                (Some(65.0), Some(-18.0)),
            ],
            vec![
                (Some(64.0), Some(-22.0)),
                (Some(64.0), Some(-22.0)),
                (Some(65.0), Some(-18.0)),
            ],
            vec![(Some(T0), Some(T0)), (Some(T0), Some(T0)), (Some(T0), Some(T0))],
        );
        let out = match_closest_haul(&df, &MatchConfig::default()).unwrap();
        let scaled = out
            .column(matching::SCALED_SCORE)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .clone();
        assert_eq!(scaled.get(0), Some(1.0));
        assert!(scaled.get(1).unwrap() < 1.0);
        assert_eq!(scaled.get(2), Some(1.0));
    }

    #[test]
    fn time_weight_outside_unit_interval_is_rejected() {
        assert!(MatchConfig::new(1.2).is_err());
        assert!(MatchConfig::new(-0.1).is_err());
        assert!(MatchConfig::new(0.0).is_ok());
        assert!(MatchConfig::new(1.0).is_ok());
    }
}

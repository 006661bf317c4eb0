//! CSV and KML exports
use kml::{
    types::{Geometry, Placemark, Point},
    Kml, KmlDocument, KmlWriter,
};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

use crate::{navigation::solutions::ReceiverSolution, orbit::SatelliteState, prelude::Error};

#[derive(Debug, Serialize)]
struct SatelliteRow {
    #[serde(rename = "satPRN")]
    sv: String,
    #[serde(rename = "GPS time")]
    gps_time: f64,
    #[serde(rename = "Sat.X")]
    x: f64,
    #[serde(rename = "Sat.Y")]
    y: f64,
    #[serde(rename = "Sat.Z")]
    z: f64,
    pseudorange: f64,
    cn0: f64,
}

#[derive(Debug, Serialize)]
struct SatelliteClockRow {
    #[serde(rename = "satPRN")]
    sv: String,
    #[serde(rename = "GPS time")]
    gps_time: f64,
    #[serde(rename = "Sat.bias")]
    clock_bias: f64,
    #[serde(rename = "Sat.X")]
    x: f64,
    #[serde(rename = "Sat.Y")]
    y: f64,
    #[serde(rename = "Sat.Z")]
    z: f64,
    pseudorange: f64,
    cn0: f64,
}

#[derive(Debug, Serialize)]
struct TrajectoryRow {
    #[serde(rename = "Pos.X")]
    x: f64,
    #[serde(rename = "Pos.Y")]
    y: f64,
    #[serde(rename = "Pos.Z")]
    z: f64,
    #[serde(rename = "Lat")]
    lat: f64,
    #[serde(rename = "Lon")]
    lon: f64,
    #[serde(rename = "Alt")]
    alt: f64,
}

/// Writes one row per [SatelliteState], indexed by satellite.
/// The satellite clock bias column is only emitted when `with_clock_bias` is set.
pub fn write_satellites<W: Write>(
    writer: W,
    states: &[SatelliteState],
    with_clock_bias: bool,
) -> Result<(), Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for state in states {
        let (sv, gps_time) = (state.sv.to_string(), state.gps_time);
        let (x, y, z) = (state.position[0], state.position[1], state.position[2]);
        let (pseudorange, cn0) = (state.pseudorange_m, state.cn0_dbhz);
        if with_clock_bias {
            wtr.serialize(SatelliteClockRow {
                sv,
                gps_time,
                clock_bias: state.clock_bias_s,
                x,
                y,
                z,
                pseudorange,
                cn0,
            })?;
        } else {
            wtr.serialize(SatelliteRow {
                sv,
                gps_time,
                x,
                y,
                z,
                pseudorange,
                cn0,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Writes receiver trajectory: ECEF [m] and geodetic (ddeg, m) coordinates
pub fn write_trajectory<W: Write>(writer: W, solutions: &[ReceiverSolution]) -> Result<(), Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    if solutions.is_empty() {
        wtr.write_record(["Pos.X", "Pos.Y", "Pos.Z", "Lat", "Lon", "Alt"])?;
    }
    for solution in solutions {
        let (lat, lon, alt) = solution.geodetic_ddeg();
        wtr.serialize(TrajectoryRow {
            x: solution.position[0],
            y: solution.position[1],
            z: solution.position[2],
            lat,
            lon,
            alt,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes receiver trajectory as KML point trail, one placemark per solution
pub fn write_kml<W: Write>(writer: W, solutions: &[ReceiverSolution]) -> Result<(), Error> {
    let placemarks = solutions
        .iter()
        .map(|solution| {
            let (lat, lon, alt) = solution.geodetic_ddeg();
            Kml::Placemark(Placemark {
                geometry: Some(Geometry::Point(Point::new(lon, lat, Some(alt)))),
                ..Default::default()
            })
        })
        .collect::<Vec<_>>();

    let document = Kml::KmlDocument(KmlDocument {
        elements: vec![Kml::Document {
            attrs: HashMap::new(),
            elements: placemarks,
        }],
        ..Default::default()
    });

    let mut writer = KmlWriter::from_writer(writer);
    writer.write(&document)?;
    Ok(())
}

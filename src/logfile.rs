//! Raw GNSS receiver log (Android GnssLogger text format)
use log::{debug, warn};
use std::collections::HashMap;
use std::io::Read;

use crate::prelude::{Constellation, Error, SV};

/// One "Raw" record: a single satellite tracked at one receiver clock instant.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMeasurement {
    /// Receiver hardware clock [ns]
    pub time_nanos: i64,
    /// Difference between hardware clock and GPS time [ns]
    pub full_bias_nanos: i64,
    /// Sub nanosecond part of the clock bias [ns]. 0 when not reported.
    pub bias_nanos: f64,
    /// Measurement time offset [ns]. 0 when not reported.
    pub time_offset_nanos: f64,
    /// Received satellite time [ns]
    pub received_sv_time_nanos: i64,
    pub received_sv_time_uncertainty_nanos: f64,
    pub pseudorange_rate_mps: f64,
    /// Carrier to noise density ratio [dB-Hz]
    pub cn0_dbhz: f64,
    pub svid: u8,
    /// Android constellation code
    pub constellation_type: u8,
}

impl RawMeasurement {
    /// Constellation described by the Android constellation code
    pub fn constellation(&self) -> Result<Constellation, Error> {
        match self.constellation_type {
            1 => Ok(Constellation::GPS),
            2 => Ok(Constellation::SBAS),
            3 => Ok(Constellation::Glonass),
            4 => Ok(Constellation::QZSS),
            5 => Ok(Constellation::BeiDou),
            6 => Ok(Constellation::Galileo),
            code => Err(Error::UnknownConstellation(code.to_string())),
        }
    }
    /// Satellite identifier
    pub fn sv(&self) -> Result<SV, Error> {
        Ok(SV {
            constellation: self.constellation()?,
            prn: self.svid,
        })
    }
}

/// One "Fix" record: position reported by the device itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    /// Fix provider (gps, network, fused..)
    pub provider: String,
    /// Latitude [ddeg]
    pub latitude_ddeg: f64,
    /// Longitude [ddeg]
    pub longitude_ddeg: f64,
    /// Altitude [m], when reported
    pub altitude_m: Option<f64>,
    /// UNIX timestamp [ms], when reported
    pub unix_time_ms: Option<i64>,
}

/// Content of a receiver log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GnssLog {
    /// Raw measurements, in order of appearance
    pub raw: Vec<RawMeasurement>,
    /// Device fixes, in order of appearance
    pub fixes: Vec<Fix>,
}

/// Column name to index table, described by a "# Raw" or "# Fix" header line
#[derive(Debug, Default)]
struct Header {
    columns: HashMap<String, usize>,
}

impl Header {
    fn new<'a>(names: impl Iterator<Item = &'a str>) -> Self {
        Self {
            columns: names
                .enumerate()
                .map(|(i, name)| (name.trim().to_string(), i))
                .collect(),
        }
    }
    /// Content of given column, None when column is not defined or empty
    fn get<'a>(&self, fields: &[&'a str], name: &str) -> Option<&'a str> {
        let index = self.columns.get(name)?;
        fields
            .get(*index)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
    fn require(&self, name: &str) -> Result<(), Error> {
        if self.columns.contains_key(name) {
            Ok(())
        } else {
            Err(Error::MissingColumn(name.to_string()))
        }
    }
}

const RAW_COLUMNS: [&str; 8] = [
    "TimeNanos",
    "FullBiasNanos",
    "ReceivedSvTimeNanos",
    "ReceivedSvTimeUncertaintyNanos",
    "PseudorangeRateMetersPerSecond",
    "Cn0DbHz",
    "Svid",
    "ConstellationType",
];

const FIX_COLUMNS: [&str; 3] = ["Provider", "LatitudeDegrees", "LongitudeDegrees"];

/// Parses a numerical field. Integer fields are sometimes
/// written in floating point notation.
fn parse_f64(line: usize, name: &str, content: &str) -> Result<f64, Error> {
    content.parse::<f64>().map_err(|e| Error::InvalidRecord {
        line,
        reason: format!("{}: {}", name, e),
    })
}

fn parse_i64(line: usize, name: &str, content: &str) -> Result<i64, Error> {
    match content.parse::<i64>() {
        Ok(value) => Ok(value),
        Err(_) => Ok(parse_f64(line, name, content)?.round() as i64),
    }
}

fn parse_u8(line: usize, name: &str, content: &str) -> Result<u8, Error> {
    let value = parse_i64(line, name, content)?;
    u8::try_from(value).map_err(|_| Error::InvalidRecord {
        line,
        reason: format!("{}: {} out of range", name, value),
    })
}

fn parse_raw(line: usize, header: &Header, fields: &[&str]) -> Result<RawMeasurement, Error> {
    let required = |name: &str| {
        header.get(fields, name).ok_or_else(|| Error::InvalidRecord {
            line,
            reason: format!("{}: empty field", name),
        })
    };
    let optional = |name: &str| -> Result<f64, Error> {
        match header.get(fields, name) {
            Some(content) => parse_f64(line, name, content),
            None => Ok(0.0),
        }
    };

    Ok(RawMeasurement {
        time_nanos: parse_i64(line, "TimeNanos", required("TimeNanos")?)?,
        full_bias_nanos: parse_i64(line, "FullBiasNanos", required("FullBiasNanos")?)?,
        bias_nanos: optional("BiasNanos")?,
        time_offset_nanos: optional("TimeOffsetNanos")?,
        received_sv_time_nanos: parse_i64(
            line,
            "ReceivedSvTimeNanos",
            required("ReceivedSvTimeNanos")?,
        )?,
        received_sv_time_uncertainty_nanos: parse_f64(
            line,
            "ReceivedSvTimeUncertaintyNanos",
            required("ReceivedSvTimeUncertaintyNanos")?,
        )?,
        pseudorange_rate_mps: parse_f64(
            line,
            "PseudorangeRateMetersPerSecond",
            required("PseudorangeRateMetersPerSecond")?,
        )?,
        cn0_dbhz: parse_f64(line, "Cn0DbHz", required("Cn0DbHz")?)?,
        svid: parse_u8(line, "Svid", required("Svid")?)?,
        constellation_type: parse_u8(line, "ConstellationType", required("ConstellationType")?)?,
    })
}

fn parse_fix(line: usize, header: &Header, fields: &[&str]) -> Result<Fix, Error> {
    let required = |name: &str| {
        header.get(fields, name).ok_or_else(|| Error::InvalidRecord {
            line,
            reason: format!("{}: empty field", name),
        })
    };
    let altitude_m = match header.get(fields, "AltitudeMeters") {
        Some(content) => Some(parse_f64(line, "AltitudeMeters", content)?),
        None => None,
    };
    let unix_time_ms = match header
        .get(fields, "UnixTimeMillis")
        .or_else(|| header.get(fields, "TimeInMs"))
    {
        Some(content) => Some(parse_i64(line, "UnixTimeMillis", content)?),
        None => None,
    };
    Ok(Fix {
        provider: required("Provider")?.to_string(),
        latitude_ddeg: parse_f64(line, "LatitudeDegrees", required("LatitudeDegrees")?)?,
        longitude_ddeg: parse_f64(line, "LongitudeDegrees", required("LongitudeDegrees")?)?,
        altitude_m,
        unix_time_ms,
    })
}

/// Parses receiver log content. "# Raw,..." and "# Fix,..." header lines
/// describe the columns of the "Raw,..." and "Fix,..." records that follow.
/// Any other line is ignored.
pub fn parse_log<R: Read>(reader: R) -> Result<GnssLog, Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut log = GnssLog::default();
    let mut raw_header = Option::<Header>::None;
    let mut fix_header = Option::<Header>::None;

    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        let fields = record.iter().collect::<Vec<_>>();
        let Some(tag) = fields.first().map(|s| s.trim()) else {
            continue;
        };

        if let Some(comment) = tag.strip_prefix('#') {
            if fields.len() < 2 {
                continue;
            }
            let header = Header::new(fields[1..].iter().copied());
            match comment.trim() {
                "Raw" => {
                    for name in RAW_COLUMNS {
                        header.require(name)?;
                    }
                    raw_header = Some(header);
                },
                "Fix" => {
                    for name in FIX_COLUMNS {
                        header.require(name)?;
                    }
                    fix_header = Some(header);
                },
                _ => {},
            }
            continue;
        }

        match tag {
            "Raw" => {
                let header = raw_header
                    .as_ref()
                    .ok_or_else(|| Error::MissingColumn("TimeNanos".to_string()))?;
                log.raw.push(parse_raw(line, header, &fields[1..])?);
            },
            "Fix" => match &fix_header {
                Some(header) => log.fixes.push(parse_fix(line, header, &fields[1..])?),
                None => warn!("line {}: fix record without header", line),
            },
            _ => {},
        }
    }

    debug!(
        "parsed {} raw measurements and {} fixes",
        log.raw.len(),
        log.fixes.len()
    );
    Ok(log)
}

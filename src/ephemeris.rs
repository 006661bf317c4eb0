//! Broadcast ephemeris records and their sources
use log::{debug, warn};
use std::{collections::HashMap, io::Read};

use crate::{
    clock::ClockModel,
    constants::WEEK_SECONDS,
    kepler::{Keplerian, Perturbations},
    prelude::{Epoch, Error, SV},
};

/// Broadcast ephemeris fields, as collected from an external source.
/// Every field is required for the record to be usable, see [EphemerisRecord].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EphemerisFields {
    pub sv: SV,
    pub t_oe: Option<f64>,
    pub sqrt_a: Option<f64>,
    pub delta_n: Option<f64>,
    pub m_0: Option<f64>,
    pub e: Option<f64>,
    pub omega: Option<f64>,
    pub i_0: Option<f64>,
    pub idot: Option<f64>,
    pub omega_0: Option<f64>,
    pub omega_dot: Option<f64>,
    pub cus: Option<f64>,
    pub cuc: Option<f64>,
    pub crs: Option<f64>,
    pub crc: Option<f64>,
    pub cis: Option<f64>,
    pub cic: Option<f64>,
    pub clock_bias: Option<f64>,
    pub clock_drift: Option<f64>,
    pub clock_drift_rate: Option<f64>,
    pub t_oc: Option<f64>,
}

impl EphemerisFields {
    /// Column names, as used in tabular broadcast data
    pub const COLUMNS: [&'static str; 20] = [
        "t_oe",
        "sqrtA",
        "deltaN",
        "M_0",
        "e",
        "omega",
        "i_0",
        "IDOT",
        "Omega_0",
        "OmegaDot",
        "C_us",
        "C_uc",
        "C_rs",
        "C_rc",
        "C_is",
        "C_ic",
        "SVclockBias",
        "SVclockDrift",
        "SVclockDriftRate",
        "t_oc",
    ];

    /// Builds [EphemerisFields] for this [SV] from a column lookup.
    pub fn from_lookup<F: Fn(&str) -> Option<f64>>(sv: SV, lookup: F) -> Self {
        Self {
            sv,
            t_oe: lookup("t_oe"),
            sqrt_a: lookup("sqrtA"),
            delta_n: lookup("deltaN"),
            m_0: lookup("M_0"),
            e: lookup("e"),
            omega: lookup("omega"),
            i_0: lookup("i_0"),
            idot: lookup("IDOT"),
            omega_0: lookup("Omega_0"),
            omega_dot: lookup("OmegaDot"),
            cus: lookup("C_us"),
            cuc: lookup("C_uc"),
            crs: lookup("C_rs"),
            crc: lookup("C_rc"),
            cis: lookup("C_is"),
            cic: lookup("C_ic"),
            clock_bias: lookup("SVclockBias"),
            clock_drift: lookup("SVclockDrift"),
            clock_drift_rate: lookup("SVclockDriftRate"),
            t_oc: lookup("t_oc"),
        }
    }
}

/// Validated broadcast ephemeris of one satellite.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct EphemerisRecord {
    pub sv: SV,
    /// Reference time of ephemeris, GPS time of week [s]
    pub t_oe: f64,
    pub keplerian: Keplerian,
    pub perturbations: Perturbations,
    pub clock: ClockModel,
}

fn required(value: Option<f64>, name: &'static str) -> Result<f64, Error> {
    value.ok_or(Error::MissingField(name))
}

impl TryFrom<&EphemerisFields> for EphemerisRecord {
    type Error = Error;
    fn try_from(fields: &EphemerisFields) -> Result<Self, Self::Error> {
        Ok(Self {
            sv: fields.sv,
            t_oe: required(fields.t_oe, "t_oe")?,
            keplerian: Keplerian {
                sqrt_a: required(fields.sqrt_a, "sqrtA")?,
                e: required(fields.e, "e")?,
                i_0: required(fields.i_0, "i_0")?,
                omega_0: required(fields.omega_0, "Omega_0")?,
                m_0: required(fields.m_0, "M_0")?,
                omega: required(fields.omega, "omega")?,
            },
            perturbations: Perturbations {
                dn: required(fields.delta_n, "deltaN")?,
                i_dot: required(fields.idot, "IDOT")?,
                omega_dot: required(fields.omega_dot, "OmegaDot")?,
                cus: required(fields.cus, "C_us")?,
                cuc: required(fields.cuc, "C_uc")?,
                cis: required(fields.cis, "C_is")?,
                cic: required(fields.cic, "C_ic")?,
                crs: required(fields.crs, "C_rs")?,
                crc: required(fields.crc, "C_rc")?,
            },
            clock: ClockModel {
                bias: required(fields.clock_bias, "SVclockBias")?,
                drift: required(fields.clock_drift, "SVclockDrift")?,
                drift_rate: required(fields.clock_drift_rate, "SVclockDriftRate")?,
                t_oc: required(fields.t_oc, "t_oc")?,
            },
        })
    }
}

/// Implement this trait to provide broadcast ephemerides.
pub trait EphemerisSource {
    /// Provide [EphemerisFields] for requested [SV], valid at given [Epoch]
    /// (GPST). Validation is left to the propagator, so an incomplete
    /// record is surfaced rather than silently dropped.
    fn ephemeris(&self, t: Epoch, sv: SV) -> Option<EphemerisFields>;
}

/// In memory [EphemerisSource], indexed by [SV] and
/// by absolute reference time (GPST seconds).
#[derive(Debug, Clone, Default)]
pub struct EphemerisStore {
    records: HashMap<SV, Vec<(f64, EphemerisFields)>>,
}

impl EphemerisStore {
    /// Inserts a new record, published for GPS week `week`
    pub fn insert(&mut self, week: u32, fields: EphemerisFields) {
        let toe = fields.t_oe.unwrap_or(0.0);
        let t_ref = week as f64 * WEEK_SECONDS + toe;
        let records = self.records.entry(fields.sv).or_default();
        records.push((t_ref, fields));
        records.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    }
    /// Number of records stored, all satellites included
    pub fn len(&self) -> usize {
        self.records.values().map(|v| v.len()).sum()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Loads records from CSV content: a "sv" column (like "G05"), a
    /// "week" column (GPS week) and one column per ephemeris field,
    /// named like [EphemerisFields::COLUMNS]. Empty cells are kept as
    /// missing fields.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self, Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| Error::MissingColumn(name.to_string()))
        };

        let sv_col = column("sv")?;
        let week_col = column("week")?;
        let columns = EphemerisFields::COLUMNS
            .iter()
            .filter_map(|name| headers.iter().position(|h| h == *name).map(|i| (*name, i)))
            .collect::<HashMap<_, _>>();

        for name in EphemerisFields::COLUMNS {
            if !columns.contains_key(name) {
                warn!("ephemeris column \"{}\" is not provided", name);
            }
        }

        let mut store = Self::default();

        for (index, result) in rdr.records().enumerate() {
            let record = result?;
            let line = index + 2;

            let invalid = |reason: String| Error::InvalidRecord { line, reason };

            let sv = record
                .get(sv_col)
                .unwrap_or_default()
                .parse::<SV>()
                .map_err(|e| invalid(format!("sv: {:?}", e)))?;

            let week = record
                .get(week_col)
                .unwrap_or_default()
                .parse::<u32>()
                .map_err(|e| invalid(format!("week: {}", e)))?;

            let mut values = HashMap::<&str, f64>::with_capacity(columns.len());
            for (name, col) in columns.iter() {
                let content = record.get(*col).unwrap_or_default();
                if content.is_empty() {
                    continue;
                }
                let value = content
                    .parse::<f64>()
                    .map_err(|e| invalid(format!("{}: {}", name, e)))?;
                values.insert(*name, value);
            }

            let fields = EphemerisFields::from_lookup(sv, |name| values.get(name).copied());
            store.insert(week, fields);
        }

        debug!("loaded {} ephemeris records", store.len());
        Ok(store)
    }
}

impl EphemerisSource for EphemerisStore {
    /// Most recent record published before `t`, otherwise the
    /// earliest record following `t`.
    fn ephemeris(&self, t: Epoch, sv: SV) -> Option<EphemerisFields> {
        let records = self.records.get(&sv)?;
        let t = t.to_gpst_seconds();
        records
            .iter()
            .rev()
            .find(|(t_ref, _)| *t_ref <= t)
            .or_else(|| records.first())
            .map(|(_, fields)| fields.clone())
    }
}

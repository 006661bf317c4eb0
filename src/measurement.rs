//! Raw measurements to pseudo ranges
use hifitime::{Duration, TimeScale};
use log::{debug, trace};

use crate::{
    constants::{SPEED_OF_LIGHT_M_S, WEEK_SECONDS},
    logfile::RawMeasurement,
    observation::Observation,
    prelude::{Constellation, Epoch, SV},
};

/// Time tagged pseudo range measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub sv: SV,
    /// Absolute GPS time tag
    pub epoch: Epoch,
    /// GPS week of reception
    pub week: u32,
    /// Reception time, GPS time of week [s]
    pub receive_tow_s: f64,
    /// Signal transmission time, GPS time of week [s]
    pub transmit_time_s: f64,
    /// Pseudo range, expressed in seconds
    pub pseudorange_s: f64,
    /// Carrier to noise density ratio [dB-Hz]
    pub cn0_dbhz: f64,
}

impl Measurement {
    /// Pseudo range [m]
    pub fn pseudorange_m(&self) -> f64 {
        self.pseudorange_s * SPEED_OF_LIGHT_M_S
    }
    /// Converts to [Observation]
    pub fn observation(&self) -> Observation {
        Observation::new(
            self.sv,
            self.pseudorange_m(),
            self.transmit_time_s,
            self.cn0_dbhz,
        )
    }
}

const WEEK_NANOS: i64 = WEEK_SECONDS as i64 * 1_000_000_000;

/// Absolute GPS time tag [ns] of a raw measurement
fn gps_time_nanos(raw: &RawMeasurement) -> i128 {
    (raw.time_nanos as i128 - raw.full_bias_nanos as i128) + raw.bias_nanos.round() as i128
}

/// Converts raw measurements of given [Constellation] to pseudo ranges.
/// Other constellations, and records with an unknown constellation, are dropped.
/// Reception times are all referenced to the clock bias of the first
/// record retained, while the GPS week is resolved per record so
/// week rollovers in the middle of a session are handled.
pub fn convert(raw: &[RawMeasurement], constellation: Constellation) -> Vec<Measurement> {
    let selected = raw
        .iter()
        .filter_map(|raw| match raw.sv() {
            Ok(sv) if sv.constellation == constellation => Some((sv, raw)),
            Ok(_) => None,
            Err(e) => {
                trace!("dropped raw measurement: {}", e);
                None
            },
        })
        .collect::<Vec<_>>();

    let Some((_, reference)) = selected.first() else {
        debug!("no {} measurement", constellation);
        return Vec::new();
    };

    let (full_bias_0, bias_0) = (reference.full_bias_nanos, reference.bias_nanos);

    let measurements = selected
        .iter()
        .filter_map(|(sv, raw)| {
            let epoch = Epoch::from_duration(
                Duration::from_total_nanoseconds(gps_time_nanos(raw)),
                TimeScale::GPST,
            );

            // integer part first: f64 cannot hold absolute GPS time to the ns
            let t_rx_nanos = raw.time_nanos - full_bias_0;
            let Ok(week) = u32::try_from(t_rx_nanos.div_euclid(WEEK_NANOS)) else {
                trace!("({}) - reception prior to GPS origin: dropped", sv);
                return None;
            };
            let receive_tow_s = t_rx_nanos.rem_euclid(WEEK_NANOS) as f64 * 1.0E-9
                + (raw.time_offset_nanos - bias_0) * 1.0E-9;

            let transmit_time_s =
                1.0E-9 * (raw.received_sv_time_nanos as f64 + raw.time_offset_nanos);

            Some(Measurement {
                sv: *sv,
                epoch,
                week,
                receive_tow_s,
                transmit_time_s,
                pseudorange_s: receive_tow_s - transmit_time_s,
                cn0_dbhz: raw.cn0_dbhz,
            })
        })
        .collect::<Vec<_>>();

    debug!("{} {} measurements", measurements.len(), constellation);
    measurements
}

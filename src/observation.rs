use itertools::Itertools;

use crate::prelude::{Epoch, Error, SV};

/// Pseudo range observation
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Observation {
    /// SV (signal emitter)
    pub sv: SV,
    /// Raw pseudo range [m]
    pub pseudorange_m: f64,
    /// Signal transmission time, GPS time of week [s]
    pub transmit_time_s: f64,
    /// Carrier to noise density ratio [dB-Hz]
    pub cn0_dbhz: f64,
}

impl Observation {
    /// Builds new [Observation]
    pub fn new(sv: SV, pseudorange_m: f64, transmit_time_s: f64, cn0_dbhz: f64) -> Self {
        Self {
            sv,
            pseudorange_m,
            transmit_time_s,
            cn0_dbhz,
        }
    }
}

/// Group of near simultaneous [Observation]s, each [SV] contributing once at most.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationEpoch {
    /// Index of this epoch in the session
    pub index: usize,
    /// Reception instant (GPST)
    pub epoch: Epoch,
    observations: Vec<Observation>,
}

impl ObservationEpoch {
    /// Builds new [ObservationEpoch]. Duplicate satellites are rejected:
    /// deduplicate before calling.
    pub fn new(index: usize, epoch: Epoch, observations: Vec<Observation>) -> Result<Self, Error> {
        if let Some(sv) = observations.iter().map(|obs| obs.sv).duplicates().next() {
            return Err(Error::DuplicateSatellite(sv));
        }
        Ok(Self {
            index,
            epoch,
            observations,
        })
    }
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }
    /// Satellites in sight, in order of observation
    pub fn satellites(&self) -> Vec<SV> {
        self.observations.iter().map(|obs| obs.sv).collect()
    }
    pub fn len(&self) -> usize {
        self.observations.len()
    }
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
    /// Copies and returns [ObservationEpoch] without given satellites
    pub fn without(&self, excluded: &[SV]) -> Self {
        Self {
            index: self.index,
            epoch: self.epoch,
            observations: self
                .observations
                .iter()
                .filter(|obs| !excluded.contains(&obs.sv))
                .copied()
                .collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::Constellation;

    fn gps(prn: u8) -> SV {
        SV {
            constellation: Constellation::GPS,
            prn,
        }
    }

    #[test]
    fn duplicate_rejection() {
        let t = Epoch::from_gpst_seconds(1.0E9);
        let observations = vec![
            Observation::new(gps(1), 2.1E7, 1000.0, 40.0),
            Observation::new(gps(2), 2.2E7, 1000.0, 35.0),
            Observation::new(gps(1), 2.1E7, 1000.0, 41.0),
        ];
        match ObservationEpoch::new(0, t, observations) {
            Err(Error::DuplicateSatellite(sv)) => assert_eq!(sv, gps(1)),
            other => panic!("should have failed, got {:?}", other),
        }
    }

    #[test]
    fn exclusion() {
        let t = Epoch::from_gpst_seconds(1.0E9);
        let epoch = ObservationEpoch::new(
            3,
            t,
            (1..=5)
                .map(|prn| Observation::new(gps(prn), 2.0E7, 1000.0, 40.0))
                .collect(),
        )
        .unwrap();

        assert_eq!(epoch.len(), 5);
        let reduced = epoch.without(&[gps(2), gps(4)]);
        assert_eq!(reduced.index, 3);
        assert_eq!(reduced.satellites(), vec![gps(1), gps(3), gps(5)]);
    }
}

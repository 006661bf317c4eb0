//! Epoch by epoch position solver
use log::{debug, error, info, warn};
use std::collections::HashMap;

use crate::{
    cfg::{Config, Weighting},
    ephemeris::{EphemerisFields, EphemerisSource},
    navigation::{
        lsq::solve_weighted,
        solutions::{validator::Validator, ReceiverSolution},
    },
    observation::ObservationEpoch,
    orbit::{elevation_azimuth, propagate_batch, SatelliteState},
    prelude::{Error, Vector3, SV},
};

/// Position Solver
#[derive(Debug, Clone)]
pub struct Solver {
    /// Solver configuration
    cfg: Config,
    /// Latest confirmed solution
    past: Option<ReceiverSolution>,
    /// Satellite states of the first epoch that was resolved
    first_states: Option<Vec<SatelliteState>>,
}

impl Solver {
    /// Builds new [Solver] using given [Config] preset
    pub fn new(cfg: Config) -> Self {
        if cfg.epoch.min_sv < 4 {
            warn!(
                "min_sv={}: epochs with less than 4 satellites will not be solved",
                cfg.epoch.min_sv
            );
        }
        if cfg.min_elevation_deg.is_some() && !cfg.warm_start {
            info!("elevation mask applies to the previous solution, whatever the seeding");
        }
        Self {
            cfg,
            past: None,
            first_states: None,
        }
    }
    /// Satellite states of the first epoch that was resolved,
    /// if any, in order of observation.
    pub fn first_states(&self) -> Option<&[SatelliteState]> {
        self.first_states.as_deref()
    }
    /// Latest confirmed solution
    pub fn last_solution(&self) -> Option<&ReceiverSolution> {
        self.past.as_ref()
    }
    /// Gathers one ephemeris per satellite in sight
    fn ephemerides<S: EphemerisSource>(
        &self,
        epoch: &ObservationEpoch,
        source: &S,
    ) -> Result<HashMap<SV, EphemerisFields>, Error> {
        epoch
            .observations()
            .iter()
            .map(|obs| {
                source
                    .ephemeris(epoch.epoch, obs.sv)
                    .map(|fields| (obs.sv, fields))
                    .ok_or(Error::MissingEphemeris(obs.sv))
            })
            .collect()
    }
    /// Applies elevation mask, once receiver position is known
    fn elevation_mask(&self, states: &mut Vec<SatelliteState>) {
        let (Some(min_elev), Some(past)) = (self.cfg.min_elevation_deg, &self.past) else {
            return;
        };
        states.retain(|state| {
            let (el, az) = elevation_azimuth(&state.position, &past.position);
            let retain = el >= min_elev;
            if !retain {
                debug!(
                    "({}) - elevation={:.2}° azimuth={:.2}°: below mask",
                    state.sv, el, az
                );
            }
            retain
        });
    }
    /// Position and bias the next epoch starts from
    fn seed(&self) -> (Vector3<f64>, f64) {
        match &self.past {
            Some(past) if self.cfg.warm_start => past.seed(),
            _ => (Vector3::zeros(), 0.0),
        }
    }
    /// Validates a [ReceiverSolution] and retains it as the latest confirmed
    /// solution: it then seeds the next epoch and positions the elevation mask.
    pub fn confirm(&mut self, solution: &ReceiverSolution) -> Result<(), Error> {
        Validator::validate(solution, &self.cfg.lsq)?;
        self.past = Some(solution.clone());
        Ok(())
    }
    /// Resolves a single [ObservationEpoch], from the latest confirmed solution.
    /// The returned solution is neither validated nor retained: call [Self::confirm]
    /// to do so when driving epochs one by one. Only the first satellite states
    /// are recorded here.
    pub fn resolve_epoch<S: EphemerisSource>(
        &mut self,
        epoch: &ObservationEpoch,
        source: &S,
    ) -> Result<ReceiverSolution, Error> {
        let t = epoch.epoch;
        let min_sv = self.cfg.epoch.min_sv.max(4);

        if epoch.len() < min_sv {
            return Err(Error::UnderdeterminedSystem(epoch.len()));
        }

        let ephemerides = self.ephemerides(epoch, source)?;
        let mut states = propagate_batch(&ephemerides, epoch.observations(), &self.cfg)?;

        if self.first_states.is_none() {
            self.first_states = Some(states.clone());
        }

        self.elevation_mask(&mut states);
        if states.len() < min_sv {
            return Err(Error::UnderdeterminedSystem(states.len()));
        }

        let positions = states.iter().map(|s| s.position).collect::<Vec<_>>();
        let pseudoranges = states.iter().map(|s| s.pseudorange_m).collect::<Vec<_>>();
        let weights = match self.cfg.lsq.weighting {
            Weighting::Uniform => None,
            Weighting::Cn0 => Some(
                states
                    .iter()
                    .map(|s| 10.0_f64.powf(s.cn0_dbhz / 10.0))
                    .collect::<Vec<_>>(),
            ),
        };

        let (x0, b0) = self.seed();
        let lsq = solve_weighted(
            &positions,
            &pseudoranges,
            weights.as_deref(),
            x0,
            b0,
            &self.cfg.lsq,
        )?;

        let sv = states.iter().map(|s| s.sv).collect();
        Ok(ReceiverSolution::new(Some(t), sv, lsq))
    }
    /// Resolves every [ObservationEpoch] with enough satellites in sight.
    /// Epochs that cannot be resolved are reported and skipped: they do
    /// not interrupt the session.
    pub fn resolve<S: EphemerisSource>(
        &mut self,
        epochs: &[ObservationEpoch],
        source: &S,
    ) -> Vec<ReceiverSolution> {
        let mut solutions = Vec::<ReceiverSolution>::with_capacity(epochs.len());

        for epoch in epochs {
            if epoch.len() < self.cfg.epoch.min_sv {
                debug!(
                    "epoch #{} ({:?}) - {} satellites in sight: skipped",
                    epoch.index,
                    epoch.epoch,
                    epoch.len()
                );
                continue;
            }
            match self.resolve_epoch(epoch, source) {
                Ok(solution) => {
                    if let Err(e) = self.confirm(&solution) {
                        warn!("epoch #{} ({:?}) - rejected: {}", epoch.index, epoch.epoch, e);
                        continue;
                    }
                    info!(
                        "epoch #{} ({:?}) - x={:.3} y={:.3} z={:.3} dt={:.6E}s ({} iterations)",
                        epoch.index,
                        epoch.epoch,
                        solution.position[0],
                        solution.position[1],
                        solution.position[2],
                        solution.dt(),
                        solution.iterations,
                    );
                    solutions.push(solution);
                },
                Err(e @ Error::MissingEphemeris(_)) | Err(e @ Error::MissingField(_)) => {
                    warn!("epoch #{} ({:?}) - skipped: {}", epoch.index, epoch.epoch, e);
                },
                Err(e) => {
                    error!("epoch #{} ({:?}) - failed: {}", epoch.index, epoch.epoch, e);
                },
            }
        }

        info!("{}/{} epochs resolved", solutions.len(), epochs.len());
        solutions
    }
}

//! Measurements to observation epochs
use log::{debug, trace};

use crate::{
    cfg::EpochOpts,
    measurement::Measurement,
    observation::{Observation, ObservationEpoch},
    prelude::{Constellation, Error},
};

/// Splits time ordered [Measurement]s into [ObservationEpoch]s: a new epoch
/// starts whenever the time tag jumps by more than `gap_ms` from the previous
/// measurement. Epoch indexes are cumulative from 0, so an epoch that ends up
/// empty still consumes its index. Within each epoch, only GPS measurements with
/// a pseudo range shorter than `max_pseudorange_s` are kept, each satellite once
/// (first measurement wins).
pub fn segment(
    measurements: &[Measurement],
    opts: &EpochOpts,
) -> Result<Vec<ObservationEpoch>, Error> {
    let mut epochs = Vec::<ObservationEpoch>::new();
    let mut group = Vec::<&Measurement>::new();
    let mut index = 0;

    for m in measurements {
        if let Some(prev) = group.last() {
            let gap_ms = (m.epoch - prev.epoch).to_seconds() * 1.0E3;
            if gap_ms > opts.gap_ms {
                epochs.push(build(index, &group, opts)?);
                group.clear();
                index += 1;
            }
        }
        group.push(m);
    }
    if !group.is_empty() {
        epochs.push(build(index, &group, opts)?);
    }

    debug!("{} epochs", epochs.len());
    Ok(epochs)
}

fn build(
    index: usize,
    group: &[&Measurement],
    opts: &EpochOpts,
) -> Result<ObservationEpoch, Error> {
    let t = group[0].epoch;
    let mut observations = Vec::<Observation>::with_capacity(group.len());

    for m in group {
        if m.sv.constellation != Constellation::GPS {
            continue;
        }
        if !(m.pseudorange_s < opts.max_pseudorange_s) {
            trace!(
                "epoch #{} ({}) - pseudo range {:.6}s: dropped",
                index,
                m.sv,
                m.pseudorange_s
            );
            continue;
        }
        if observations.iter().any(|obs| obs.sv == m.sv) {
            trace!("epoch #{} ({}) - duplicate: dropped", index, m.sv);
            continue;
        }
        observations.push(m.observation());
    }

    ObservationEpoch::new(index, t, observations)
}

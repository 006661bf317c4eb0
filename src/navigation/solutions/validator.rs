use log::debug;
use thiserror::Error;

use crate::{cfg::LsqOpts, navigation::solutions::ReceiverSolution};

#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    #[error("non finite solution")]
    NonFinite,
    #[error("gdop {0}: limit exceeded")]
    GDOPOutlier(f64),
}

/// [ReceiverSolution] validator
pub struct Validator {}

impl Validator {
    pub fn validate(solution: &ReceiverSolution, opts: &LsqOpts) -> Result<(), Error> {
        let finite = solution.position.iter().all(|x| x.is_finite())
            && solution.bias_m.is_finite()
            && solution.residual_norm.is_finite();
        if !finite {
            return Err(Error::NonFinite);
        }
        debug!(
            "gdop={:.3} pdop={:.3} tdop={:.3}",
            solution.dop.gdop, solution.dop.pdop, solution.dop.tdop
        );
        if let Some(max_gdop) = opts.max_gdop {
            if !(solution.dop.gdop <= max_gdop) {
                return Err(Error::GDOPOutlier(solution.dop.gdop));
            }
        }
        Ok(())
    }
}

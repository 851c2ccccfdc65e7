//! Named checks and the error they raise on mismatch.

use std::fmt::Display;

use loadcount_sim::{SimError, SimTime};

/// A failed check or a simulation error that stopped a scenario.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// An observed value differed from the expected one.
    #[error("check '{check}' failed at {time}: expected {expected}, observed {observed}")]
    Mismatch {
        /// Name of the violated check.
        check: String,
        /// Simulation time of the observation.
        time: SimTime,
        /// Expected value, formatted.
        expected: String,
        /// Observed value, formatted.
        observed: String,
    },

    /// The simulation itself failed.
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// Fails with [`CheckError::Mismatch`] unless `observed == expected`.
pub fn check_eq<T>(check: &str, time: SimTime, expected: T, observed: T) -> Result<(), CheckError>
where
    T: PartialEq + Display,
{
    if observed == expected {
        Ok(())
    } else {
        Err(CheckError::Mismatch {
            check: check.to_string(),
            time,
            expected: expected.to_string(),
            observed: observed.to_string(),
        })
    }
}

/// Fails with [`CheckError::Mismatch`] unless `condition` holds.
pub fn check_that(
    check: &str,
    time: SimTime,
    condition: bool,
    expected: impl Display,
    observed: impl Display,
) -> Result<(), CheckError> {
    if condition {
        Ok(())
    } else {
        Err(CheckError::Mismatch {
            check: check.to_string(),
            time,
            expected: expected.to_string(),
            observed: observed.to_string(),
        })
    }
}

/// Formats a byte the way the checks report it, e.g. `0xA5`.
pub fn hex(value: u8) -> String {
    format!("{value:#04X}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_eq_passes_on_match() {
        assert!(check_eq("same", SimTime::zero(), 3u8, 3u8).is_ok());
    }

    #[test]
    fn mismatch_display() {
        let err = check_eq("increment", SimTime::from_us(80), hex(0x06), hex(0x07)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "check 'increment' failed at 80 us: expected 0x06, observed 0x07"
        );
    }

    #[test]
    fn check_that_reports_values() {
        let err = check_that("no conflict", SimTime::zero(), false, "no X bits", "xxxx0000")
            .unwrap_err();
        assert!(matches!(
            err,
            CheckError::Mismatch { ref observed, .. } if observed == "xxxx0000"
        ));
    }

    #[test]
    fn sim_error_is_transparent() {
        let err = CheckError::from(SimError::TimeLimitExceeded { limit_fs: 5 });
        assert_eq!(err.to_string(), "time limit exceeded: 5 fs");
    }

    #[test]
    fn hex_format() {
        assert_eq!(hex(0xA5), "0xA5");
        assert_eq!(hex(0), "0x00");
    }
}

//! Measurement timing budget engine.
//!
//! The budget is the total microsecond duration of one ranging measurement,
//! apportioned across the enabled sequence steps plus fixed per-step
//! overheads. The read path sums what the device is currently configured to
//! do; the write path solves for the final-range timeout that makes the
//! sequence consume exactly the requested budget.

use crate::reg;
use crate::seq::{SequenceStepEnables, SequenceStepTimeouts};
use crate::timing::{encode_timeout, timeout_microseconds_to_mclks};
use crate::{Error, Vl53l0x};

// Fixed per-step overheads in microseconds, from the vendor reference. The
// vendor uses 1320 for the start overhead on the write path and 1910 on the
// read path; we use 1910 on both so that set(get()) is a fixed point.
const START_OVERHEAD: u32 = 1910;
const END_OVERHEAD: u32 = 960;
const MSRC_OVERHEAD: u32 = 660;
const TCC_OVERHEAD: u32 = 590;
const DSS_OVERHEAD: u32 = 690;
const PRE_RANGE_OVERHEAD: u32 = 660;
const FINAL_RANGE_OVERHEAD: u32 = 550;

const MIN_TIMING_BUDGET_US: u32 = 20000;

/// Budget consumed by everything except the final-range step itself:
/// start/end overhead plus each enabled step's timeout and overhead (DSS
/// counts double; MSRC only counts when DSS is disabled).
fn sequence_overhead_us(enables: SequenceStepEnables, timeouts: &SequenceStepTimeouts) -> u32 {
    let mut budget_us = START_OVERHEAD + END_OVERHEAD;

    if enables.tcc {
        budget_us += timeouts.msrc_dss_tcc_us + TCC_OVERHEAD;
    }

    if enables.dss {
        budget_us += 2 * (timeouts.msrc_dss_tcc_us + DSS_OVERHEAD);
    } else if enables.msrc {
        budget_us += timeouts.msrc_dss_tcc_us + MSRC_OVERHEAD;
    }

    if enables.pre_range {
        budget_us += timeouts.pre_range_us + PRE_RANGE_OVERHEAD;
    }

    budget_us
}

impl<I2C, D, E> Vl53l0x<I2C, D>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
    D: embedded_hal::delay::DelayNs,
{
    /// Get the measurement timing budget in microseconds. The result is also
    /// cached for re-application after parameter changes.
    ///
    /// based on VL53L0X_get_measurement_timing_budget_micro_seconds()
    ///
    /// # Errors
    /// Forwards any errors from the I2C bus.
    pub fn get_measurement_timing_budget(&mut self) -> Result<u32, E> {
        let enables = self.get_sequence_step_enables()?;
        let timeouts = self.get_sequence_step_timeouts(enables)?;

        let mut budget_us = sequence_overhead_us(enables, &timeouts);

        if enables.final_range {
            budget_us += timeouts.final_range_us + FINAL_RANGE_OVERHEAD;
        }

        self.measurement_timing_budget_us = budget_us; // store for internal reuse
        Ok(budget_us)
    }

    /// Set the measurement timing budget in microseconds, the time allowed
    /// for one measurement. A longer budget allows for more accurate
    /// measurements. The device default is about 33 ms; the minimum is 20 ms.
    ///
    /// based on VL53L0X_set_measurement_timing_budget_micro_seconds()
    ///
    /// # Errors
    /// [`Error::TimingBudgetTooShort`] if `budget_us` is below the 20 ms
    /// floor or leaves no room for the final-range step; in both cases no
    /// device state is modified. Bus errors are forwarded.
    pub fn set_measurement_timing_budget(&mut self, budget_us: u32) -> Result<(), Error<E>> {
        if budget_us < MIN_TIMING_BUDGET_US {
            return Err(Error::TimingBudgetTooShort);
        }

        let enables = self.get_sequence_step_enables()?;
        let timeouts = self.get_sequence_step_timeouts(enables)?;

        let mut used_budget_us = sequence_overhead_us(enables, &timeouts);

        if enables.final_range {
            used_budget_us += FINAL_RANGE_OVERHEAD;

            // "Note that the final range timeout is determined by the timing
            // budget and the sum of all other timeouts within the sequence.
            // If there is no room for the final range timeout, then an error
            // will be set. Otherwise the remaining time will be applied to
            // the final range."

            if used_budget_us > budget_us {
                // "Requested timeout too big."
                return Err(Error::TimingBudgetTooShort);
            }

            let final_range_timeout_us = budget_us - used_budget_us;

            // set_sequence_step_timeout() begin
            // (SequenceStepId == VL53L0X_SEQUENCESTEP_FINAL_RANGE)

            // "For the final range timeout, the pre-range timeout
            //  must be added. To do this both final and pre-range
            //  timeouts must be expressed in macro periods MClks
            //  because they have different vcsel periods."

            let mut final_range_timeout_mclks = timeout_microseconds_to_mclks(
                final_range_timeout_us,
                timeouts.final_range_vcsel_period_pclks,
            );

            if enables.pre_range {
                final_range_timeout_mclks += u32::from(timeouts.pre_range_mclks);
            }

            self.write_u16(
                reg::FINAL_RANGE_CONFIG_TIMEOUT_MACROP_HI,
                encode_timeout(final_range_timeout_mclks),
            )?;

            // set_sequence_step_timeout() end

            self.measurement_timing_budget_us = budget_us; // store for internal reuse
        }

        Ok(())
    }
}

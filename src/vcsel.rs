//! VCSEL pulse period get/set.
//!
//! Changing a period invalidates every timeout derived under the old period,
//! so the setter re-derives the affected step timeouts, re-applies the cached
//! timing budget, and re-runs phase calibration.

use crate::reg;
use crate::timing::{
    decode_vcsel_period, encode_timeout, encode_vcsel_period, timeout_microseconds_to_mclks,
};
use crate::{Error, VcselPeriodType, Vl53l0x};

impl<I2C, D, E> Vl53l0x<I2C, D>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
    D: embedded_hal::delay::DelayNs,
{
    /// Get the VCSEL pulse period in PCLKs for the given period type.
    ///
    /// based on VL53L0X_get_vcsel_pulse_period()
    ///
    /// # Errors
    /// Forwards any errors from the I2C bus.
    pub fn get_vcsel_pulse_period(&mut self, period_type: VcselPeriodType) -> Result<u8, E> {
        Ok(match period_type {
            VcselPeriodType::PreRange => {
                decode_vcsel_period(self.read(reg::PRE_RANGE_CONFIG_VCSEL_PERIOD)?)
            }
            VcselPeriodType::FinalRange => {
                decode_vcsel_period(self.read(reg::FINAL_RANGE_CONFIG_VCSEL_PERIOD)?)
            }
        })
    }

    /// Set the VCSEL pulse period for the given period type, in PCLKs.
    /// Longer periods increase the potential range of the sensor.
    /// Valid values are even numbers only:
    ///   pre-range: 12 to 18 (initialized default: 14)
    ///   final-range: 8 to 14 (initialized default: 10)
    ///
    /// based on VL53L0X_set_vcsel_pulse_period()
    ///
    /// # Errors
    /// [`Error::InvalidVcselPeriod`] for any other value, with no device
    /// state modified. Bus errors are forwarded.
    pub fn set_vcsel_pulse_period(
        &mut self,
        period_type: VcselPeriodType,
        period_pclks: u8,
    ) -> Result<(), Error<E>> {
        let enables = self.get_sequence_step_enables()?;
        let timeouts = self.get_sequence_step_timeouts(enables)?;

        // "Apply specific settings for the requested clock period"
        // "Re-calculate and apply timeouts, in macro periods"

        // "When the VCSEL period for the pre or final range is changed,
        // the corresponding timeout must be read from the device using
        // the current VCSEL period, then the new VCSEL period can be
        // applied. The timeout then must be written back to the device
        // using the new VCSEL period.
        //
        // For the MSRC timeout, the same applies - this timeout being
        // dependant on the pre-range vcsel period."

        match period_type {
            VcselPeriodType::PreRange => {
                // "Set phase check limits"
                let phase_high = match period_pclks {
                    12 => 0x18,
                    14 => 0x30,
                    16 => 0x40,
                    18 => 0x50,
                    _ => return Err(Error::InvalidVcselPeriod(period_pclks)),
                };
                self.write(reg::PRE_RANGE_CONFIG_VALID_PHASE_HIGH, phase_high)?;
                self.write(reg::PRE_RANGE_CONFIG_VALID_PHASE_LOW, 0x08)?;

                // apply new VCSEL period
                self.write(
                    reg::PRE_RANGE_CONFIG_VCSEL_PERIOD,
                    encode_vcsel_period(period_pclks),
                )?;

                // set_sequence_step_timeout() begin
                // (SequenceStepId == VL53L0X_SEQUENCESTEP_PRE_RANGE)

                let new_pre_range_timeout_mclks =
                    timeout_microseconds_to_mclks(timeouts.pre_range_us, period_pclks.into());

                self.write_u16(
                    reg::PRE_RANGE_CONFIG_TIMEOUT_MACROP_HI,
                    encode_timeout(new_pre_range_timeout_mclks),
                )?;

                // set_sequence_step_timeout() end

                // set_sequence_step_timeout() begin
                // (SequenceStepId == VL53L0X_SEQUENCESTEP_MSRC)

                let new_msrc_timeout_mclks =
                    timeout_microseconds_to_mclks(timeouts.msrc_dss_tcc_us, period_pclks.into());

                #[allow(clippy::cast_possible_truncation)]
                let msrc_reg = if new_msrc_timeout_mclks > 256 {
                    255
                } else {
                    new_msrc_timeout_mclks.saturating_sub(1) as u8
                };
                self.write(reg::MSRC_CONFIG_TIMEOUT_MACROP, msrc_reg)?;

                // set_sequence_step_timeout() end
            }
            VcselPeriodType::FinalRange => {
                // phase check limits plus the period-specific VCSEL width
                // and phasecal settings
                let (phase_high, vcsel_width, phasecal_timeout, phasecal_lim) = match period_pclks {
                    8 => (0x10, 0x02, 0x0C, 0x30),
                    10 => (0x28, 0x03, 0x09, 0x20),
                    12 => (0x38, 0x03, 0x08, 0x20),
                    14 => (0x48, 0x03, 0x07, 0x20),
                    _ => return Err(Error::InvalidVcselPeriod(period_pclks)),
                };
                self.write(reg::FINAL_RANGE_CONFIG_VALID_PHASE_HIGH, phase_high)?;
                self.write(reg::FINAL_RANGE_CONFIG_VALID_PHASE_LOW, 0x08)?;
                self.write(reg::GLOBAL_CONFIG_VCSEL_WIDTH, vcsel_width)?;
                self.write(reg::ALGO_PHASECAL_CONFIG_TIMEOUT, phasecal_timeout)?;
                self.write(0xFF, 0x01)?;
                self.write(reg::ALGO_PHASECAL_LIM, phasecal_lim)?;
                self.write(0xFF, 0x00)?;

                // apply new VCSEL period
                self.write(
                    reg::FINAL_RANGE_CONFIG_VCSEL_PERIOD,
                    encode_vcsel_period(period_pclks),
                )?;

                // set_sequence_step_timeout() begin
                // (SequenceStepId == VL53L0X_SEQUENCESTEP_FINAL_RANGE)

                // "For the final range timeout, the pre-range timeout
                //  must be added. To do this both final and pre-range
                //  timeouts must be expressed in macro periods MClks
                //  because they have different vcsel periods."

                let mut new_final_range_timeout_mclks =
                    timeout_microseconds_to_mclks(timeouts.final_range_us, period_pclks.into());

                if enables.pre_range {
                    new_final_range_timeout_mclks += u32::from(timeouts.pre_range_mclks);
                }

                self.write_u16(
                    reg::FINAL_RANGE_CONFIG_TIMEOUT_MACROP_HI,
                    encode_timeout(new_final_range_timeout_mclks),
                )?;

                // set_sequence_step_timeout() end
            }
        }

        // "Finally, the timing budget must be re-applied"
        self.set_measurement_timing_budget(self.measurement_timing_budget_us)?;

        // "Perform the phase calibration. This is needed after changing on
        // vcsel period."
        // VL53L0X_perform_phase_calibration() begin

        let sequence_config = self.read(reg::SYSTEM_SEQUENCE_CONFIG)?;
        self.write(reg::SYSTEM_SEQUENCE_CONFIG, 0x02)?;
        self.perform_single_ref_calibration(0x00)?;
        self.write(reg::SYSTEM_SEQUENCE_CONFIG, sequence_config)?;

        // VL53L0X_perform_phase_calibration() end

        Ok(())
    }
}

//! Ranging modes: single-shot, continuous back-to-back and continuous timed,
//! plus the result-ready polling and the interrupt-clear handshake.

use crate::reg;
use crate::{RangingMode, Vl53l0x, RANGE_TIMEOUT_MM};

impl<I2C, D, E> Vl53l0x<I2C, D>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
    D: embedded_hal::delay::DelayNs,
{
    /// Replay the stop variable captured during init through the device's
    /// internal register bank. Required before every measurement start; the
    /// purpose of the dance is undocumented.
    fn start_sequence(&mut self) -> Result<(), E> {
        self.write(0x80, 0x01)?;
        self.write(0xFF, 0x01)?;
        self.write(0x00, 0x00)?;
        self.write(0x91, self.stop_variable)?;
        self.write(0x00, 0x01)?;
        self.write(0xFF, 0x00)?;
        self.write(0x80, 0x00)
    }

    /// Start continuous ranging measurements. If `period_ms` is 0,
    /// continuous back-to-back mode is used (the sensor takes measurements
    /// as often as possible); otherwise, continuous timed mode is used, with
    /// the given inter-measurement period in milliseconds determining how
    /// often the sensor takes a measurement.
    ///
    /// based on VL53L0X_StartMeasurement()
    ///
    /// # Errors
    /// Forwards any errors from the I2C bus.
    pub fn start_continuous(&mut self, period_ms: u32) -> Result<(), E> {
        self.start_sequence()?;

        if period_ms != 0 {
            // continuous timed mode

            // VL53L0X_SetInterMeasurementPeriodMilliSeconds() begin

            let osc_calibrate_val = self.read_u16(reg::OSC_CALIBRATE_VAL)?;

            // a zero calibration value means the period is used raw
            let mut period = period_ms;
            if osc_calibrate_val != 0 {
                period *= u32::from(osc_calibrate_val);
            }

            self.write_u32(reg::SYSTEM_INTERMEASUREMENT_PERIOD, period)?;

            // VL53L0X_SetInterMeasurementPeriodMilliSeconds() end

            self.write(reg::SYSRANGE_START, 0x04)?; // VL53L0X_REG_SYSRANGE_MODE_TIMED
            self.mode = RangingMode::ContinuousTimed { period_ms };
        } else {
            // continuous back-to-back mode
            self.write(reg::SYSRANGE_START, 0x02)?; // VL53L0X_REG_SYSRANGE_MODE_BACKTOBACK
            self.mode = RangingMode::ContinuousBackToBack;
        }

        Ok(())
    }

    /// Stop continuous measurements and leave the device ready for a future
    /// start.
    ///
    /// based on VL53L0X_StopMeasurement()
    ///
    /// # Errors
    /// Forwards any errors from the I2C bus.
    pub fn stop_continuous(&mut self) -> Result<(), E> {
        self.write(reg::SYSRANGE_START, 0x01)?; // VL53L0X_REG_SYSRANGE_MODE_SINGLESHOT

        // the replay dance again, with the stop variable zeroed
        self.write(0xFF, 0x01)?;
        self.write(0x00, 0x00)?;
        self.write(0x91, 0x00)?;
        self.write(0x00, 0x01)?;
        self.write(0xFF, 0x00)?;

        self.mode = RangingMode::Idle;
        Ok(())
    }

    /// Return a range reading in millimeters when continuous mode is active.
    /// ([`Vl53l0x::read_range_single_millimeters`] also calls this after
    /// starting a single-shot measurement.)
    ///
    /// If the result-ready poll exceeds the configured I/O timeout, the
    /// sticky timeout flag is set and the [`RANGE_TIMEOUT_MM`] sentinel is
    /// returned instead of an error; the caller decides whether to retry.
    ///
    /// # Errors
    /// Forwards any errors from the I2C bus.
    pub fn read_range_continuous_millimeters(&mut self) -> Result<u16, E> {
        let mut elapsed_ms: u32 = 0;
        while self.read(reg::RESULT_INTERRUPT_STATUS)? & 0x07 == 0 {
            if self.io_timeout_ms != 0 && elapsed_ms >= self.io_timeout_ms {
                warn!("range poll timed out after {} ms", elapsed_ms);
                self.did_timeout = true;
                return Ok(RANGE_TIMEOUT_MM);
            }
            self.delay.delay_ms(1);
            elapsed_ms += 1;
        }

        // assumptions: Linearity Corrective Gain is 1000 (default);
        // fractional ranging is not enabled
        let range = self.read_u16(reg::RESULT_RANGE_STATUS + 10)?;

        self.clear_interrupt()?;

        Ok(range)
    }

    /// Perform a single-shot range measurement and return the reading in
    /// millimeters. Timeouts are reported through the sentinel and sticky
    /// flag, as in [`Vl53l0x::read_range_continuous_millimeters`].
    ///
    /// based on VL53L0X_PerformSingleRangingMeasurement()
    ///
    /// # Errors
    /// Forwards any errors from the I2C bus.
    pub fn read_range_single_millimeters(&mut self) -> Result<u16, E> {
        self.start_sequence()?;

        self.write(reg::SYSRANGE_START, 0x01)?;
        self.mode = RangingMode::SingleShotPending;

        // "Wait until start bit has been cleared"
        let mut elapsed_ms: u32 = 0;
        while self.read(reg::SYSRANGE_START)? & 0x01 != 0 {
            if self.io_timeout_ms != 0 && elapsed_ms >= self.io_timeout_ms {
                warn!("single-shot start bit never cleared");
                self.did_timeout = true;
                self.mode = RangingMode::Idle;
                return Ok(RANGE_TIMEOUT_MM);
            }
            self.delay.delay_ms(1);
            elapsed_ms += 1;
        }

        let range = self.read_range_continuous_millimeters()?;
        self.mode = RangingMode::Idle;
        Ok(range)
    }

    /// Clear the new-sample interrupt, verifying that the masked status
    /// actually drops to zero. Some devices need the clear bit toggled more
    /// than once; after 3 failed attempts the failure is logged and the
    /// measurement already read is still considered good.
    pub(crate) fn clear_interrupt(&mut self) -> Result<(), E> {
        for _ in 0..3 {
            self.write(reg::SYSTEM_INTERRUPT_CLEAR, 0x01)?;
            self.write(reg::SYSTEM_INTERRUPT_CLEAR, 0x00)?;
            if self.read(reg::RESULT_INTERRUPT_STATUS)? & 0x07 == 0 {
                return Ok(());
            }
        }

        error!("interrupt status not cleared after 3 attempts");
        Ok(())
    }
}

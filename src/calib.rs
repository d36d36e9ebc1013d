//! Reference SPAD discovery/selection and the two-phase (VHV + phase)
//! reference calibration sequence.
//!
//! SPAD calibration runs once during static init. The single-shot ref
//! calibration primitive is also re-run (phase only) after any VCSEL pulse
//! period change.

use crate::reg;
use crate::{Error, Vl53l0x};

/// Enable exactly `count` consecutive set bits of the 48-bit reference SPAD
/// map, starting at the type-dependent offset (aperture SPADs begin at bit
/// 12). Bits before the offset and bits past the quota are forced to zero.
/// Returns how many bits ended up enabled, which is less than `count` only
/// when the original map did not have enough set bits after the offset.
pub(crate) fn select_reference_spads(
    ref_spad_map: &mut [u8; 6],
    count: u8,
    type_is_aperture: bool,
) -> u8 {
    let first_spad_to_enable: u8 = if type_is_aperture { 12 } else { 0 };
    let mut spads_enabled: u8 = 0;

    for i in 0..48u8 {
        if i < first_spad_to_enable || spads_enabled == count {
            ref_spad_map[(i / 8) as usize] &= !(1 << (i % 8));
        } else if (ref_spad_map[(i / 8) as usize] >> (i % 8)) & 0x1 != 0 {
            spads_enabled += 1;
        }
    }

    spads_enabled
}

impl<I2C, D, E> Vl53l0x<I2C, D>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
    D: embedded_hal::delay::DelayNs,
{
    /// Get the reference SPAD count and type through the diagnostic bank:
    /// trigger an internal reference-SPAD measurement, busy-poll its status,
    /// and pull the result byte (count in the low 7 bits, aperture flag in
    /// bit 7).
    ///
    /// based on VL53L0X_get_info_from_device(), but only gets reference SPAD
    /// count and type
    pub(crate) fn get_spad_info(&mut self) -> Result<(u8, bool), Error<E>> {
        self.write(0x80, 0x01)?;
        self.write(0xFF, 0x01)?;
        self.write(0x00, 0x00)?;

        self.write(0xFF, 0x06)?;
        self.update(0x83, |data| *data |= 0x04)?;
        self.write(0xFF, 0x07)?;
        self.write(0x81, 0x01)?;

        self.write(0x80, 0x01)?;

        self.write(0x94, 0x6b)?;
        self.write(0x83, 0x00)?;

        let mut elapsed_ms: u32 = 0;
        while self.read(0x83)? == 0x00 {
            if self.io_timeout_ms != 0 && elapsed_ms >= self.io_timeout_ms {
                return Err(Error::Timeout);
            }
            self.delay.delay_ms(1);
            elapsed_ms += 1;
        }

        self.write(0x83, 0x01)?;
        let tmp = self.read(0x92)?;

        let count = tmp & 0x7f;
        let type_is_aperture = ((tmp >> 7) & 0x01) != 0;

        self.write(0x81, 0x00)?;
        self.write(0xFF, 0x06)?;
        self.update(0x83, |data| *data &= !0x04)?;
        self.write(0xFF, 0x01)?;
        self.write(0x00, 0x01)?;

        self.write(0xFF, 0x00)?;
        self.write(0x80, 0x00)?;

        Ok((count, type_is_aperture))
    }

    /// Discover the reference SPAD count/type and write back the adjusted
    /// 48-bit enable bitmap.
    ///
    /// based on VL53L0X_set_reference_spads() (assumes NVM values are valid)
    pub(crate) fn set_reference_spads(&mut self) -> Result<(), Error<E>> {
        let (spad_count, spad_type_is_aperture) = self.get_spad_info()?;

        // The SPAD map (RefGoodSpadMap) is read by VL53L0X_get_info_from_device()
        // in the API, but the same data seems to be more easily readable from
        // GLOBAL_CONFIG_SPAD_ENABLES_REF_0 through _6, so read it from there
        let mut ref_spad_map = [0u8; 6];
        self.read_many(reg::GLOBAL_CONFIG_SPAD_ENABLES_REF_0, &mut ref_spad_map)?;

        self.write(0xFF, 0x01)?;
        self.write(reg::DYNAMIC_SPAD_REF_EN_START_OFFSET, 0x00)?;
        self.write(reg::DYNAMIC_SPAD_NUM_REQUESTED_REF_SPAD, 0x2C)?;
        self.write(0xFF, 0x00)?;
        self.write(reg::GLOBAL_CONFIG_REF_EN_START_SELECT, 0xB4)?;

        let enabled = select_reference_spads(&mut ref_spad_map, spad_count, spad_type_is_aperture);
        debug!(
            "reference SPADs: {} of {} requested (aperture: {})",
            enabled, spad_count, spad_type_is_aperture
        );

        self.write_many(reg::GLOBAL_CONFIG_SPAD_ENABLES_REF_0, &ref_spad_map)?;

        Ok(())
    }

    /// Run one single-shot calibration phase: start with `vhv_init_byte`
    /// OR'd in, wait for the interrupt, clear it, stop.
    ///
    /// based on VL53L0X_perform_single_ref_calibration()
    pub(crate) fn perform_single_ref_calibration(
        &mut self,
        vhv_init_byte: u8,
    ) -> Result<(), Error<E>> {
        // VL53L0X_REG_SYSRANGE_MODE_START_STOP
        self.write(reg::SYSRANGE_START, 0x01 | vhv_init_byte)?;

        let mut elapsed_ms: u32 = 0;
        while self.read(reg::RESULT_INTERRUPT_STATUS)? & 0x07 == 0 {
            if self.io_timeout_ms != 0 && elapsed_ms >= self.io_timeout_ms {
                return Err(Error::Timeout);
            }
            self.delay.delay_ms(1);
            elapsed_ms += 1;
        }

        self.clear_interrupt()?;

        self.write(reg::SYSRANGE_START, 0x00)?;

        Ok(())
    }

    /// VHV then phase calibration, restoring the default sequence config
    /// afterwards.
    ///
    /// based on VL53L0X_perform_ref_calibration()
    pub(crate) fn perform_ref_calibration(&mut self) -> Result<(), Error<E>> {
        // -- VL53L0X_perform_vhv_calibration() begin
        self.write(reg::SYSTEM_SEQUENCE_CONFIG, 0x01)?;
        self.perform_single_ref_calibration(0x40)?;
        // -- VL53L0X_perform_vhv_calibration() end

        // -- VL53L0X_perform_phase_calibration() begin
        self.write(reg::SYSTEM_SEQUENCE_CONFIG, 0x02)?;
        self.perform_single_ref_calibration(0x00)?;
        // -- VL53L0X_perform_phase_calibration() end

        // "restore the previous Sequence Config"
        self.write(reg::SYSTEM_SEQUENCE_CONFIG, 0xE8)?;

        Ok(())
    }
}

//! Sequence step model: which of the TCC/DSS/MSRC/pre-range/final-range steps
//! are active, and their individual timeouts in MCLKs and microseconds.
//!
//! Both structs are recomputed from live register reads on every use; nothing
//! here is cached across calls.

use crate::reg;
use crate::timing::{decode_timeout, timeout_mclks_to_microseconds};
use crate::{VcselPeriodType, Vl53l0x};

#[allow(clippy::struct_excessive_bools)]
#[derive(Default, Clone, Copy)]
pub(crate) struct SequenceStepEnables {
    pub tcc: bool,
    pub msrc: bool,
    pub dss: bool,
    pub pre_range: bool,
    pub final_range: bool,
}

impl SequenceStepEnables {
    /// Unpack the SYSTEM_SEQUENCE_CONFIG bit fields: pre-range and
    /// final-range in the high bits (6, 7), the rest in the low bits (2..=4).
    pub(crate) fn from_config(sequence_config: u8) -> Self {
        Self {
            tcc: ((sequence_config >> 4) & 0x1) != 0,
            dss: ((sequence_config >> 3) & 0x1) != 0,
            msrc: ((sequence_config >> 2) & 0x1) != 0,
            pre_range: ((sequence_config >> 6) & 0x1) != 0,
            final_range: ((sequence_config >> 7) & 0x1) != 0,
        }
    }
}

#[derive(Default, Clone, Copy)]
pub(crate) struct SequenceStepTimeouts {
    pub pre_range_vcsel_period_pclks: u16,
    pub final_range_vcsel_period_pclks: u16,
    pub msrc_dss_tcc_mclks: u16,
    pub pre_range_mclks: u16,
    /// Net of the pre-range contribution when pre-range is enabled; the
    /// gross value must be restored before any register write.
    pub final_range_mclks: u16,
    pub msrc_dss_tcc_us: u32,
    pub pre_range_us: u32,
    pub final_range_us: u32,
}

impl<I2C, D, E> Vl53l0x<I2C, D>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
    D: embedded_hal::delay::DelayNs,
{
    /// based on VL53L0X_GetSequenceStepEnables()
    pub(crate) fn get_sequence_step_enables(&mut self) -> Result<SequenceStepEnables, E> {
        let sequence_config = self.read(reg::SYSTEM_SEQUENCE_CONFIG)?;
        Ok(SequenceStepEnables::from_config(sequence_config))
    }

    /// based on get_sequence_step_timeout(), but gets all timeouts instead of
    /// just the requested one, and also keeps the intermediate values
    pub(crate) fn get_sequence_step_timeouts(
        &mut self,
        enables: SequenceStepEnables,
    ) -> Result<SequenceStepTimeouts, E> {
        let mut timeouts = SequenceStepTimeouts::default();

        timeouts.pre_range_vcsel_period_pclks =
            self.get_vcsel_pulse_period(VcselPeriodType::PreRange)?.into();

        timeouts.msrc_dss_tcc_mclks = u16::from(self.read(reg::MSRC_CONFIG_TIMEOUT_MACROP)?) + 1;
        timeouts.msrc_dss_tcc_us = timeout_mclks_to_microseconds(
            timeouts.msrc_dss_tcc_mclks,
            timeouts.pre_range_vcsel_period_pclks,
        );

        timeouts.pre_range_mclks =
            decode_timeout(self.read_u16(reg::PRE_RANGE_CONFIG_TIMEOUT_MACROP_HI)?);
        timeouts.pre_range_us = timeout_mclks_to_microseconds(
            timeouts.pre_range_mclks,
            timeouts.pre_range_vcsel_period_pclks,
        );

        timeouts.final_range_vcsel_period_pclks = self
            .get_vcsel_pulse_period(VcselPeriodType::FinalRange)?
            .into();

        timeouts.final_range_mclks =
            decode_timeout(self.read_u16(reg::FINAL_RANGE_CONFIG_TIMEOUT_MACROP_HI)?);

        // A device reporting a final-range timeout shorter than the
        // pre-range one would underflow here; treat the net as zero.
        if enables.pre_range {
            timeouts.final_range_mclks = timeouts
                .final_range_mclks
                .saturating_sub(timeouts.pre_range_mclks);
        }

        timeouts.final_range_us = timeout_mclks_to_microseconds(
            timeouts.final_range_mclks,
            timeouts.final_range_vcsel_period_pclks,
        );

        Ok(timeouts)
    }
}

//! Device initialization: DataInit, StaticInit (reference SPAD selection,
//! tuning profile, interrupt config, timing budget) and the initial
//! reference calibration.

use crate::reg;
use crate::{Error, Vl53l0x};

impl<I2C, D, E> Vl53l0x<I2C, D>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
    D: embedded_hal::delay::DelayNs,
{
    /// Initialize the device. Must be called once before ranging; until it
    /// succeeds the device must not be treated as ready.
    ///
    /// # Errors
    /// [`Error::InvalidModelId`] if the device does not identify as a
    /// VL53L0X, [`Error::Timeout`] if SPAD discovery or reference
    /// calibration exceeds the configured I/O timeout, and any forwarded
    /// bus errors.
    pub fn init(&mut self) -> Result<(), Error<E>> {
        // check model ID register (value specified in datasheet)
        let model_id = self.read(reg::IDENTIFICATION_MODEL_ID)?;
        if model_id != 0xEE {
            return Err(Error::InvalidModelId(model_id));
        }

        // VL53L0X_DataInit() begin

        // sensor uses 1V8 mode for I/O by default; switch to 2V8 mode
        self.update(reg::VHV_CONFIG_PAD_SCL_SDA_EXTSUP_HV, |data| {
            *data |= 0x01; // set bit 0
        })?;

        // "Set I2C standard mode"
        self.write(0x88, 0x00)?;

        self.write(0x80, 0x01)?;
        self.write(0xFF, 0x01)?;
        self.write(0x00, 0x00)?;
        self.stop_variable = self.read(0x91)?;
        self.write(0x00, 0x01)?;
        self.write(0xFF, 0x00)?;
        self.write(0x80, 0x00)?;

        // disable SIGNAL_RATE_MSRC (bit 1) and SIGNAL_RATE_PRE_RANGE (bit 4)
        // limit checks
        self.update(reg::MSRC_CONFIG_CONTROL, |data| *data |= 0x12)?;

        // set final range signal rate limit to 0.25 MCPS (million counts
        // per second)
        self.set_signal_rate_limit(0.25)?;

        self.write(reg::SYSTEM_SEQUENCE_CONFIG, 0xFF)?;

        // VL53L0X_DataInit() end

        // VL53L0X_StaticInit() begin

        self.set_reference_spads()?;

        self.load_tuning_settings()?;

        // "Set interrupt config to new sample ready"
        // -- VL53L0X_SetGpioConfig() begin

        self.write(reg::SYSTEM_INTERRUPT_CONFIG_GPIO, 0x04)?;
        self.update(reg::GPIO_HV_MUX_ACTIVE_HIGH, |data| {
            *data &= !0x10; // active low
        })?;
        self.write(reg::SYSTEM_INTERRUPT_CLEAR, 0x01)?;

        // -- VL53L0X_SetGpioConfig() end

        let budget_us = self.get_measurement_timing_budget()?;
        debug!("default timing budget: {} us", budget_us);

        // "Disable MSRC and TCC by default"
        // MSRC = Minimum Signal Rate Check
        // TCC = Target CentreCheck
        self.write(reg::SYSTEM_SEQUENCE_CONFIG, 0xE8)?;

        // "Recalculate timing budget"
        self.set_measurement_timing_budget(budget_us)?;

        // VL53L0X_StaticInit() end

        self.perform_ref_calibration()?;

        trace!("init complete, stop variable {}", self.stop_variable);

        Ok(())
    }

    /// Set the return signal rate limit check value in units of MCPS (mega
    /// counts per second). "This represents the amplitude of the signal
    /// reflected from the target and detected by the device"; setting this
    /// limit presumably determines the minimum measurement necessary for the
    /// sensor to report a valid reading. Setting a lower limit increases the
    /// potential range of the sensor but also seems to increase the
    /// likelihood of getting an inaccurate reading because of unwanted
    /// reflections from objects other than the intended target.
    /// Defaults to 0.25 MCPS as initialized by the ST API and this library.
    ///
    /// # Errors
    /// [`Error::InvalidSignalRateLimit`] outside [0, 511.99] MCPS; bus
    /// errors are forwarded.
    pub fn set_signal_rate_limit(&mut self, limit_mcps: f32) -> Result<(), Error<E>> {
        if !(0.0..=511.99).contains(&limit_mcps) {
            return Err(Error::InvalidSignalRateLimit(limit_mcps));
        }

        // Q9.7 fixed point format (9 integer bits, 7 fractional bits)
        #[allow(clippy::cast_possible_truncation)]
        #[allow(clippy::cast_precision_loss)]
        #[allow(clippy::cast_sign_loss)]
        self.write_u16(
            reg::FINAL_RANGE_CONFIG_MIN_COUNT_RATE_RTN_LIMIT,
            (limit_mcps * ((1_u32 << 7_u32) as f32)) as u16,
        )?;
        Ok(())
    }

    /// Get the return signal rate limit check value in MCPS.
    ///
    /// # Errors
    /// Forwards any errors from the I2C bus.
    pub fn get_signal_rate_limit(&mut self) -> Result<f32, E> {
        let raw = self.read_u16(reg::FINAL_RANGE_CONFIG_MIN_COUNT_RATE_RTN_LIMIT)?;
        Ok(f32::from(raw) / 128.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Vl53l0x, DEFAULT_ADDRESS};
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock, Transaction};
    use std::vec;
    use std::vec::Vec;

    fn wr(register: u8, value: u8) -> Transaction {
        Transaction::write(DEFAULT_ADDRESS, vec![register, value])
    }

    fn rd(register: u8, value: u8) -> Transaction {
        Transaction::write_read(DEFAULT_ADDRESS, vec![register], vec![value])
    }

    fn rd16(register: u8, hi: u8, lo: u8) -> Transaction {
        Transaction::write_read(DEFAULT_ADDRESS, vec![register], vec![hi, lo])
    }

    // The six reads behind a timing budget computation: sequence config,
    // then the step timeouts in their fixed read order. All values except
    // the sequence config and the final-range timeout are the post-tuning
    // defaults (pre-range VCSEL 14 PCLKs, MSRC 0x25, pre-range 0x0096,
    // final-range VCSEL 10 PCLKs).
    fn budget_reads(sequence_config: u8, final_hi: u8, final_lo: u8) -> [Transaction; 6] {
        [
            rd(reg::SYSTEM_SEQUENCE_CONFIG, sequence_config),
            rd(reg::PRE_RANGE_CONFIG_VCSEL_PERIOD, 0x06),
            rd(reg::MSRC_CONFIG_TIMEOUT_MACROP, 0x25),
            rd16(reg::PRE_RANGE_CONFIG_TIMEOUT_MACROP_HI, 0x00, 0x96),
            rd(reg::FINAL_RANGE_CONFIG_VCSEL_PERIOD, 0x04),
            rd16(reg::FINAL_RANGE_CONFIG_TIMEOUT_MACROP_HI, final_hi, final_lo),
        ]
    }

    #[test]
    fn fresh_init_yields_the_vendor_default_timing_budget() {
        let mut transactions = Vec::new();

        // model ID check, 2V8 mode, I2C standard mode
        transactions.push(rd(reg::IDENTIFICATION_MODEL_ID, 0xEE));
        transactions.push(rd(reg::VHV_CONFIG_PAD_SCL_SDA_EXTSUP_HV, 0x00));
        transactions.push(wr(reg::VHV_CONFIG_PAD_SCL_SDA_EXTSUP_HV, 0x01));
        transactions.push(wr(0x88, 0x00));

        // stop variable capture
        transactions.extend([
            wr(0x80, 0x01),
            wr(0xFF, 0x01),
            wr(0x00, 0x00),
            rd(0x91, 0x3C),
            wr(0x00, 0x01),
            wr(0xFF, 0x00),
            wr(0x80, 0x00),
        ]);

        // limit checks off, 0.25 MCPS rate limit, all sequence steps on
        transactions.push(rd(reg::MSRC_CONFIG_CONTROL, 0x00));
        transactions.push(wr(reg::MSRC_CONFIG_CONTROL, 0x12));
        transactions.push(Transaction::write(
            DEFAULT_ADDRESS,
            vec![reg::FINAL_RANGE_CONFIG_MIN_COUNT_RATE_RTN_LIMIT, 0x00, 0x20],
        ));
        transactions.push(wr(reg::SYSTEM_SEQUENCE_CONFIG, 0xFF));

        // SPAD discovery through the diagnostic bank; the status poll
        // reports ready on the first read and NVM says 12 non-aperture SPADs
        transactions.extend([
            wr(0x80, 0x01),
            wr(0xFF, 0x01),
            wr(0x00, 0x00),
            wr(0xFF, 0x06),
            rd(0x83, 0x00),
            wr(0x83, 0x04),
            wr(0xFF, 0x07),
            wr(0x81, 0x01),
            wr(0x80, 0x01),
            wr(0x94, 0x6B),
            wr(0x83, 0x00),
            rd(0x83, 0x01),
            wr(0x83, 0x01),
            rd(0x92, 0x0C),
            wr(0x81, 0x00),
            wr(0xFF, 0x06),
            rd(0x83, 0x04),
            wr(0x83, 0x00),
            wr(0xFF, 0x01),
            wr(0x00, 0x01),
            wr(0xFF, 0x00),
            wr(0x80, 0x00),
        ]);

        // SPAD map read-back (all 48 available) and adjusted write
        transactions.push(Transaction::write_read(
            DEFAULT_ADDRESS,
            vec![reg::GLOBAL_CONFIG_SPAD_ENABLES_REF_0],
            vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
        ));
        transactions.extend([
            wr(0xFF, 0x01),
            wr(reg::DYNAMIC_SPAD_REF_EN_START_OFFSET, 0x00),
            wr(reg::DYNAMIC_SPAD_NUM_REQUESTED_REF_SPAD, 0x2C),
            wr(0xFF, 0x00),
            wr(reg::GLOBAL_CONFIG_REF_EN_START_SELECT, 0xB4),
        ]);
        transactions.push(Transaction::transaction_start(DEFAULT_ADDRESS));
        transactions.push(Transaction::write(
            DEFAULT_ADDRESS,
            vec![reg::GLOBAL_CONFIG_SPAD_ENABLES_REF_0],
        ));
        transactions.push(Transaction::write(
            DEFAULT_ADDRESS,
            vec![0xFF, 0x0F, 0x00, 0x00, 0x00, 0x00],
        ));
        transactions.push(Transaction::transaction_end(DEFAULT_ADDRESS));

        // tuning profile, applied verbatim
        for &(register, value) in crate::tuning::DEFAULT_TUNING_PROFILE {
            transactions.push(wr(register, value));
        }

        // interrupt config: new sample ready, active low
        transactions.push(wr(reg::SYSTEM_INTERRUPT_CONFIG_GPIO, 0x04));
        transactions.push(rd(reg::GPIO_HV_MUX_ACTIVE_HIGH, 0x10));
        transactions.push(wr(reg::GPIO_HV_MUX_ACTIVE_HIGH, 0x00));
        transactions.push(wr(reg::SYSTEM_INTERRUPT_CLEAR, 0x01));

        // default budget read with every step enabled and the tuning
        // profile's timeouts:
        //   msrc 0x25 -> 38 MCLKs @ 14 PCLKs = 2055 us
        //   pre-range 0x0096 -> 151 MCLKs @ 14 = 8087 us
        //   final-range 0x01FE -> 509 MCLKs gross, 358 net @ 10 = 13669 us
        //   1910 + 960 + (2055+590) + 2*(2055+690) + (8087+660) + (13669+550)
        //   = 33971, the vendor's "about 33 ms" default
        transactions.extend(budget_reads(0xFF, 0x01, 0xFE));

        // MSRC/TCC off, budget re-applied under the new sequence config:
        // 33971 - (1910 + 960 + 2*(2055+690) + 8087 + 660 + 550) = 16314 us
        // = 428 MCLKs @ 10, + 151 pre-range = 579, encoded 0x0290
        transactions.push(wr(reg::SYSTEM_SEQUENCE_CONFIG, 0xE8));
        transactions.extend(budget_reads(0xE8, 0x01, 0xFE));
        transactions.push(Transaction::write(
            DEFAULT_ADDRESS,
            vec![reg::FINAL_RANGE_CONFIG_TIMEOUT_MACROP_HI, 0x02, 0x90],
        ));

        // VHV then phase calibration, each completing on the first poll
        transactions.push(wr(reg::SYSTEM_SEQUENCE_CONFIG, 0x01));
        for vhv_init_byte in [0x40u8, 0x00] {
            transactions.extend([
                wr(reg::SYSRANGE_START, 0x01 | vhv_init_byte),
                rd(reg::RESULT_INTERRUPT_STATUS, 0x07),
                wr(reg::SYSTEM_INTERRUPT_CLEAR, 0x01),
                wr(reg::SYSTEM_INTERRUPT_CLEAR, 0x00),
                rd(reg::RESULT_INTERRUPT_STATUS, 0x00),
                wr(reg::SYSRANGE_START, 0x00),
            ]);
            if vhv_init_byte == 0x40 {
                transactions.push(wr(reg::SYSTEM_SEQUENCE_CONFIG, 0x02));
            }
        }
        transactions.push(wr(reg::SYSTEM_SEQUENCE_CONFIG, 0xE8));

        // read the budget back after init; the lossy timeout encoding
        // (577 gross MCLKs, 426 net = 16262 us) settles it at 33919 us
        transactions.extend(budget_reads(0xE8, 0x02, 0x90));

        let mut sensor = Vl53l0x::new(Mock::new(&transactions), NoopDelay);

        sensor.init().unwrap();
        assert_eq!(sensor.stop_variable, 0x3C);
        assert_eq!(sensor.measurement_timing_budget_us, 33_971);
        assert_eq!(sensor.get_measurement_timing_budget().unwrap(), 33_919);

        let (mut i2c, _) = sensor.release();
        i2c.done();
    }

    #[test]
    fn signal_rate_limit_round_trips_within_q9_7_granularity() {
        // 0.25 MCPS is 32 in Q9.7
        let transactions = [
            Transaction::write(
                DEFAULT_ADDRESS,
                vec![reg::FINAL_RANGE_CONFIG_MIN_COUNT_RATE_RTN_LIMIT, 0x00, 0x20],
            ),
            Transaction::write_read(
                DEFAULT_ADDRESS,
                vec![reg::FINAL_RANGE_CONFIG_MIN_COUNT_RATE_RTN_LIMIT],
                vec![0x00, 0x20],
            ),
        ];
        let mut sensor = Vl53l0x::new(Mock::new(&transactions), NoopDelay);

        sensor.set_signal_rate_limit(0.25).unwrap();
        let read_back = sensor.get_signal_rate_limit().unwrap();
        assert!((read_back - 0.25).abs() < 1.0 / 128.0);

        let (mut i2c, _) = sensor.release();
        i2c.done();
    }

    #[test]
    fn signal_rate_limit_rejects_out_of_range_values() {
        let mut sensor = Vl53l0x::new(Mock::new(&[]), NoopDelay);

        assert_eq!(
            sensor.set_signal_rate_limit(-0.1),
            Err(Error::InvalidSignalRateLimit(-0.1))
        );
        assert_eq!(
            sensor.set_signal_rate_limit(512.0),
            Err(Error::InvalidSignalRateLimit(512.0))
        );

        let (mut i2c, _) = sensor.release();
        i2c.done();
    }

    #[test]
    fn init_rejects_wrong_model_id() {
        let transactions = [Transaction::write_read(
            DEFAULT_ADDRESS,
            vec![reg::IDENTIFICATION_MODEL_ID],
            vec![0xAA],
        )];
        let mut sensor = Vl53l0x::new(Mock::new(&transactions), NoopDelay);

        assert_eq!(sensor.init(), Err(Error::InvalidModelId(0xAA)));

        let (mut i2c, _) = sensor.release();
        i2c.done();
    }
}

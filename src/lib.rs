#![doc = include_str!("../README.md")]
#![no_std]

#[cfg(test)]
extern crate std;

mod fmt; // must be first so the macros are in scope everywhere

mod budget;
mod bus;
mod calib;
mod init;
mod ranging;
mod reg;
mod seq;
mod timing;
mod tuning;
mod vcsel;

/// The default I2C address for the VL53L0X.
pub const DEFAULT_ADDRESS: u8 = 0b010_1001;

/// Sentinel distance returned when a ranging poll exceeds the I/O timeout.
pub const RANGE_TIMEOUT_MM: u16 = 65535;

/// Possible errors reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// An error occurred on the I2C bus.
    Bus(E),
    /// The model ID read from the device was invalid.
    InvalidModelId(u8),
    /// The signal rate limit was outside [0, 511.99] MCPS.
    InvalidSignalRateLimit(f32),
    /// The VCSEL pulse period was not one of the values the device accepts.
    InvalidVcselPeriod(u8),
    /// The requested timing budget was below the 20 ms floor, or left no
    /// room for the final-range step.
    TimingBudgetTooShort,
    /// A calibration poll exceeded the configured I/O timeout.
    Timeout,
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Error::Bus(err)
    }
}

/// Which VCSEL pulse period a get/set operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VcselPeriodType {
    /// The pre-range step's pulse period (valid even values: 12 to 18).
    PreRange,
    /// The final-range step's pulse period (valid even values: 8 to 14).
    FinalRange,
}

/// The ranging mode the device was last commanded into. Transitions only
/// through the explicit start/stop operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RangingMode {
    /// No measurement in progress.
    #[default]
    Idle,
    /// A single-shot measurement has been started and not yet read back.
    SingleShotPending,
    /// Continuous ranging, measurements taken as often as possible.
    ContinuousBackToBack,
    /// Continuous ranging with a fixed inter-measurement period.
    ContinuousTimed {
        /// Inter-measurement period in milliseconds.
        period_ms: u32,
    },
}

/// A VL53L0X driver session. Create one with [`Vl53l0x::new`], run
/// [`Vl53l0x::init`] once, then start ranging.
///
/// The session owns all mutable device state (address, the `stop_variable`
/// calibration byte replayed before every start, the cached timing budget and
/// the sticky timeout flag). It is single-threaded and blocking; share it
/// across threads only behind external serialization.
pub struct Vl53l0x<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,

    /// I/O timeout for busy-poll loops, in milliseconds. 0 disables the
    /// bound and the loops block indefinitely.
    io_timeout_ms: u32,
    /// Sticky flag, set by a ranging poll timeout and cleared only by
    /// [`Vl53l0x::timeout_occurred`].
    did_timeout: bool,

    /// Internal calibration byte read from the device during init and
    /// replayed verbatim before every measurement start.
    stop_variable: u8,
    /// Last-known measurement timing budget, re-applied whenever a VCSEL
    /// period change invalidates the derived final-range timeout.
    measurement_timing_budget_us: u32,

    mode: RangingMode,
}

impl<I2C, D, E> Vl53l0x<I2C, D>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
    D: embedded_hal::delay::DelayNs,
{
    /// Create a new driver session bound to the default device address.
    /// No bus traffic happens until [`Vl53l0x::init`] is called.
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            i2c,
            delay,
            address: DEFAULT_ADDRESS,

            io_timeout_ms: 0,
            did_timeout: false,

            stop_variable: 0,
            measurement_timing_budget_us: 0,

            mode: RangingMode::Idle,
        }
    }

    /// Release the underlying bus and delay.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// Change the device's I2C address. Subsequent traffic uses the new
    /// address.
    ///
    /// # Errors
    /// Forwards any errors from the I2C bus.
    pub fn set_address(&mut self, new_addr: u8) -> Result<(), E> {
        self.write(reg::I2C_SLAVE_DEVICE_ADDRESS, new_addr & 0x7F)?;
        self.address = new_addr;
        Ok(())
    }

    /// Set the I/O timeout bounding every busy-poll loop, in milliseconds.
    /// 0 (the default) disables the bound.
    pub fn set_timeout(&mut self, timeout_ms: u32) {
        self.io_timeout_ms = timeout_ms;
    }

    /// The configured I/O timeout in milliseconds.
    #[must_use]
    pub fn timeout(&self) -> u32 {
        self.io_timeout_ms
    }

    /// Did a ranging poll time out since the last call? Reading the flag
    /// clears it.
    pub fn timeout_occurred(&mut self) -> bool {
        let tmp = self.did_timeout;
        self.did_timeout = false;
        tmp
    }

    /// The ranging mode the device was last commanded into.
    #[must_use]
    pub fn ranging_mode(&self) -> RangingMode {
        self.mode
    }
}

//! Byte/word/dword and block register access against the addressed device.
//! Multi-byte values are big-endian on the wire.

use crate::Vl53l0x;

impl<I2C, D, E> Vl53l0x<I2C, D>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
    D: embedded_hal::delay::DelayNs,
{
    pub(crate) fn write(&mut self, register: u8, data: u8) -> Result<(), E> {
        self.i2c.write(self.address, &[register, data])
    }

    pub(crate) fn write_u16(&mut self, register: u8, data: u16) -> Result<(), E> {
        #[allow(clippy::cast_possible_truncation)]
        self.i2c
            .write(self.address, &[register, (data >> 8) as u8, data as u8])
    }

    pub(crate) fn write_u32(&mut self, register: u8, data: u32) -> Result<(), E> {
        #[allow(clippy::cast_possible_truncation)]
        self.i2c.write(
            self.address,
            &[
                register,
                (data >> 24) as u8,
                (data >> 16) as u8,
                (data >> 8) as u8,
                data as u8,
            ],
        )
    }

    pub(crate) fn write_many(&mut self, register: u8, data: &[u8]) -> Result<(), E> {
        self.i2c.transaction(
            self.address,
            &mut [
                embedded_hal::i2c::Operation::Write(&[register]),
                embedded_hal::i2c::Operation::Write(data),
            ],
        )
    }

    pub(crate) fn read(&mut self, register: u8) -> Result<u8, E> {
        let mut data = [0];
        self.i2c.write_read(self.address, &[register], &mut data)?;
        Ok(data[0])
    }

    pub(crate) fn read_u16(&mut self, register: u8) -> Result<u16, E> {
        let mut data = [0; 2];
        self.i2c.write_read(self.address, &[register], &mut data)?;
        Ok(u16::from(data[0]) << 8 | u16::from(data[1]))
    }

    pub(crate) fn read_many(&mut self, register: u8, data: &mut [u8]) -> Result<(), E> {
        self.i2c.write_read(self.address, &[register], data)
    }

    pub(crate) fn update(&mut self, register: u8, f: impl FnOnce(&mut u8)) -> Result<(), E> {
        let mut data = [0];
        self.i2c.write_read(self.address, &[register], &mut data)?;
        f(&mut data[0]);
        self.i2c.write(self.address, &[register, data[0]])
    }
}

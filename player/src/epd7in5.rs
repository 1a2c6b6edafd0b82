//! Waveshare 7.5" V2 (800x480) panel driver.
//!
//! Command constants and timings come from the vendor init script for the
//! UC8179-class controller. The driver is generic over `embedded-hal`
//! traits; the binary wires it to spidev/gpio-cdev on the Pi.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;
use log::debug;
use vsmp_core::display::{BUFFER_SIZE, Panel};
use vsmp_core::error::PlayerError;
use vsmp_core::framebuffer::Framebuffer;

const PANEL_SETTING: u8 = 0x00;
const POWER_SETTING: u8 = 0x01;
const POWER_OFF: u8 = 0x02;
const POWER_ON: u8 = 0x04;
const DEEP_SLEEP: u8 = 0x07;
const DATA_START_OLD: u8 = 0x10;
const DISPLAY_REFRESH: u8 = 0x12;
const DATA_START: u8 = 0x13;
const DUAL_SPI: u8 = 0x15;
const VCOM_AND_DATA_INTERVAL: u8 = 0x50;
const TCON_SETTING: u8 = 0x60;
const RESOLUTION_SETTING: u8 = 0x61;
const GET_STATUS: u8 = 0x71;

const SPI_CHUNK: usize = 4096;

pub struct Epd7in5<SPI, DC, RST, BUSY, DELAY> {
    spi: SPI,
    dc: DC,
    rst: RST,
    busy: BUSY,
    delay: DELAY,
}

impl<SPI, DC, RST, BUSY, DELAY> Epd7in5<SPI, DC, RST, BUSY, DELAY>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
    DELAY: DelayNs,
{
    pub fn new(spi: SPI, dc: DC, rst: RST, busy: BUSY, delay: DELAY) -> Self {
        Self {
            spi,
            dc,
            rst,
            busy,
            delay,
        }
    }

    /// Hardware reset pulse. Must complete before the first command.
    fn reset(&mut self) -> Result<(), PlayerError> {
        self.rst.set_high().map_err(|e| device_err("reset", e))?;
        self.delay.delay_ms(200);
        self.rst.set_low().map_err(|e| device_err("reset", e))?;
        self.delay.delay_ms(2);
        self.rst.set_high().map_err(|e| device_err("reset", e))?;
        self.delay.delay_ms(200);
        Ok(())
    }

    fn command(&mut self, command: u8) -> Result<(), PlayerError> {
        self.dc.set_low().map_err(|e| device_err("command", e))?;
        self.spi
            .write(&[command])
            .map_err(|e| device_err("command", e))
    }

    fn data(&mut self, data: &[u8]) -> Result<(), PlayerError> {
        self.dc.set_high().map_err(|e| device_err("data", e))?;
        for chunk in data.chunks(SPI_CHUNK) {
            self.spi.write(chunk).map_err(|e| device_err("data", e))?;
        }
        Ok(())
    }

    /// Poll the busy line until the panel reports idle. Commands sent
    /// while the panel is busy are undefined behaviour on real hardware.
    fn wait_idle(&mut self) -> Result<(), PlayerError> {
        debug!("e-Paper busy");
        loop {
            self.command(GET_STATUS)?;
            let idle = self.busy.is_high().map_err(|e| device_err("busy poll", e))?;
            if idle {
                break;
            }
        }
        self.delay.delay_ms(200);
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), PlayerError> {
        self.command(DISPLAY_REFRESH)?;
        self.delay.delay_ms(100);
        self.wait_idle()
    }
}

fn device_err(stage: &'static str, err: impl core::fmt::Debug) -> PlayerError {
    PlayerError::Device {
        stage,
        reason: format!("{err:?}"),
    }
}

impl<SPI, DC, RST, BUSY, DELAY> Panel for Epd7in5<SPI, DC, RST, BUSY, DELAY>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
    DELAY: DelayNs,
{
    fn init(&mut self) -> Result<(), PlayerError> {
        self.reset()?;

        self.command(POWER_SETTING)?;
        self.data(&[0x07, 0x07, 0x3F, 0x3F])?; // VGH=20V VGL=-20V VDH=15V VDL=-15V

        self.command(POWER_ON)?;
        self.delay.delay_ms(100);
        self.wait_idle()?;

        self.command(PANEL_SETTING)?;
        self.data(&[0x1F])?; // KW mode, LUT from OTP

        self.command(RESOLUTION_SETTING)?;
        self.data(&[0x03, 0x20, 0x01, 0xE0])?; // source 800, gate 480

        self.command(DUAL_SPI)?;
        self.data(&[0x00])?;

        self.command(VCOM_AND_DATA_INTERVAL)?;
        self.data(&[0x10, 0x07])?;

        self.command(TCON_SETTING)?;
        self.data(&[0x22])?;

        Ok(())
    }

    fn display(&mut self, frame: &Framebuffer) -> Result<(), PlayerError> {
        // 0 means "apply ink" on the wire, so every byte is inverted
        let inverted: Vec<u8> = frame.data().iter().map(|&byte| !byte).collect();
        self.command(DATA_START)?;
        self.data(&inverted)?;
        self.refresh()
    }

    fn clear(&mut self) -> Result<(), PlayerError> {
        // The controller refreshes from two RAM banks; blank both
        let blank = vec![0x00; BUFFER_SIZE];
        self.command(DATA_START_OLD)?;
        self.data(&blank)?;
        self.command(DATA_START)?;
        self.data(&blank)?;
        self.refresh()
    }

    fn sleep(&mut self) -> Result<(), PlayerError> {
        self.command(POWER_OFF)?;
        self.wait_idle()?;
        self.command(DEEP_SLEEP)?;
        self.data(&[0xA5])
    }
}

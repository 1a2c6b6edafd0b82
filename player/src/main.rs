use std::collections::HashSet;
use std::fs;

use anyhow::Context;
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::{CdevPin, Delay, SpidevDevice};
use log::{error, info, warn};
use vsmp_core::config::Config;
use vsmp_core::display::Panel;
use vsmp_core::engine::PlaybackEngine;
use vsmp_core::ledger::ProgressLedger;
use vsmp_core::selector::select_next;

use crate::epd7in5::Epd7in5;
use crate::ffmpeg::FfmpegFrameSource;
use crate::inventory::DirInventory;

mod epd7in5;
mod ffmpeg;
mod inventory;

// BCM pin assignment from the Waveshare HAT; chip select is CE0 on the
// spidev bus itself.
const RST_PIN: u32 = 17;
const DC_PIN: u32 = 25;
const BUSY_PIN: u32 = 24;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    info!("Movie directory is `{}`", config.movie_dir.display());
    fs::create_dir_all(&config.movie_dir)
        .with_context(|| format!("cannot create `{}`", config.movie_dir.display()))?;

    let ledger = ProgressLedger::new(&config.progress_log);
    ledger.ensure_exists()?;

    let inventory = DirInventory::new(&config.movie_dir);
    let mut source = FfmpegFrameSource::new(&config.extract_path);

    let mut panel = open_panel().context("cannot open the e-paper display")?;
    panel.init()?;
    panel.clear()?;

    let mut engine = PlaybackEngine::new(&config, &ledger, &mut source);

    // One non-fatal failure per item is tolerated; a second selection of
    // the same item would spin forever, so it ends the run instead.
    let mut failed = HashSet::new();
    while let Some(next) = select_next(&ledger, &inventory, config.resume_threshold)? {
        match engine.play(&next, &mut panel) {
            Ok(()) => {}
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                error!("Unable to play `{}`: {err}", next.display());
                if !failed.insert(next.clone()) {
                    warn!("`{}` failed twice, stopping playback", next.display());
                    break;
                }
            }
        }
    }

    if let Some(photo_dir) = &config.photo_dir {
        for photo in inventory::photos(photo_dir)? {
            match engine.show_photo(&photo, &mut panel) {
                Ok(()) => {}
                Err(err) if err.is_fatal() => return Err(err.into()),
                Err(err) => error!("Unable to display `{}`: {err}", photo.display()),
            }
        }
    }

    panel.sleep()?;
    info!("Playback complete");
    Ok(())
}

fn open_panel() -> anyhow::Result<Epd7in5<SpidevDevice, CdevPin, CdevPin, CdevPin, Delay>> {
    let mut chip = Chip::new("/dev/gpiochip0").context("open /dev/gpiochip0")?;
    let dc = CdevPin::new(
        chip.get_line(DC_PIN)?
            .request(LineRequestFlags::OUTPUT, 1, "vsmp-dc")?,
    )?;
    let rst = CdevPin::new(
        chip.get_line(RST_PIN)?
            .request(LineRequestFlags::OUTPUT, 1, "vsmp-rst")?,
    )?;
    let busy = CdevPin::new(
        chip.get_line(BUSY_PIN)?
            .request(LineRequestFlags::INPUT, 0, "vsmp-busy")?,
    )?;

    let mut spi = SpidevDevice::open("/dev/spidev0.0").context("open /dev/spidev0.0")?;
    spi.0.configure(
        &SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(4_000_000)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build(),
    )?;

    Ok(Epd7in5::new(spi, dc, rst, busy, Delay))
}

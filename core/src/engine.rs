use std::path::Path;
use std::thread;
use std::time::Duration;

use log::{debug, error, info};

use crate::config::Config;
use crate::display::Panel;
use crate::error::PlayerError;
use crate::formatter;
use crate::framebuffer::{self, HEIGHT, WIDTH};
use crate::ledger::ProgressLedger;
use crate::source::FrameSource;

/// Seek position of a frame index on the nominal 24 fps timeline.
///
/// Frame numbers are the persisted unit of progress, so they must stay
/// stable regardless of what the container claims its frame rate is.
pub fn frame_timestamp_ms(frame: u64) -> f64 {
    frame as f64 * (1000.0 / 24.0)
}

/// Steps through one media item at a time: persist progress, extract a
/// frame, format it, push it to the panel, wait, repeat.
pub struct PlaybackEngine<'a, S: FrameSource> {
    config: &'a Config,
    ledger: &'a ProgressLedger,
    source: &'a mut S,
}

impl<'a, S: FrameSource> PlaybackEngine<'a, S> {
    pub fn new(config: &'a Config, ledger: &'a ProgressLedger, source: &'a mut S) -> Self {
        Self {
            config,
            ledger,
            source,
        }
    }

    /// Play `media` from its resume point to exhaustion.
    ///
    /// Progress is persisted *before* each extraction, so a restart
    /// resumes at the frame that was being attempted, never after it.
    pub fn play(&mut self, media: &Path, panel: &mut impl Panel) -> Result<(), PlayerError> {
        info!("Input video is `{}`", media.display());

        if !media.is_file() {
            return Err(PlayerError::MediaUnavailable(media.to_path_buf()));
        }

        let frame_count = self.source.frame_count(media)?;
        info!("There are {frame_count} frames in this video");

        if self.config.always_restart {
            debug!("Resetting progress log for `{}`", media.display());
            self.ledger.set(media, 0, Some(frame_count))?;
        }

        let default = if frame_count >= self.config.long_video_cutoff {
            self.config.long_video_resume
        } else {
            0
        };
        let current = self.ledger.get(media, default);

        let remaining_secs = frame_count.saturating_sub(current) / self.config.frame_step
            * self.config.frame_delay;
        info!(
            "It's going to take {}h{}m{}s to play this video",
            remaining_secs / 3600,
            remaining_secs % 3600 / 60,
            remaining_secs % 60,
        );

        let mut frame = current;
        while frame < frame_count {
            self.ledger.set(media, frame, Some(frame_count))?;

            let still = self.source.extract_frame(media, frame)?;
            self.show_still(&still, panel).map_err(|err| {
                error!(
                    "Frame #{frame} of `{}` failed during display: {err}",
                    media.display()
                );
                err
            })?;

            thread::sleep(Duration::from_secs(self.config.frame_delay));
            frame += self.config.frame_step;
        }

        Ok(())
    }

    /// Show a photo and hold it on screen for the configured dwell time.
    pub fn show_photo(&mut self, photo: &Path, panel: &mut impl Panel) -> Result<(), PlayerError> {
        info!(
            "Displaying `{}` for {} seconds",
            photo.display(),
            self.config.photo_delay
        );
        self.show_still(photo, panel)?;
        thread::sleep(Duration::from_secs(self.config.photo_delay));
        Ok(())
    }

    fn show_still(&mut self, still: &Path, panel: &mut impl Panel) -> Result<(), PlayerError> {
        let image = image::open(still)?;
        let letterboxed = formatter::letterbox(&image, WIDTH as u32, HEIGHT as u32);
        let frame = framebuffer::encode(&letterboxed)?;
        panel.display(&frame)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use image::{GrayImage, Luma};

    use super::*;
    use crate::framebuffer::Framebuffer;
    use crate::test_support::TempDir;

    struct FakeSource {
        frames: u64,
        still: PathBuf,
        extracted: Vec<u64>,
        fail_at: Option<u64>,
    }

    impl FakeSource {
        fn new(dir: &TempDir, frames: u64) -> Self {
            let still = dir.path().join("still.png");
            GrayImage::from_pixel(800, 480, Luma([0xFF]))
                .save(&still)
                .unwrap();
            Self {
                frames,
                still,
                extracted: Vec::new(),
                fail_at: None,
            }
        }
    }

    impl FrameSource for FakeSource {
        fn frame_count(&mut self, _media: &Path) -> Result<u64, PlayerError> {
            Ok(self.frames)
        }

        fn extract_frame(&mut self, media: &Path, frame: u64) -> Result<PathBuf, PlayerError> {
            self.extracted.push(frame);
            if self.fail_at == Some(frame) {
                return Err(PlayerError::Extraction {
                    media: media.to_path_buf(),
                    frame,
                    reason: "boom".into(),
                });
            }
            Ok(self.still.clone())
        }
    }

    #[derive(Default)]
    struct FakePanel {
        displayed: usize,
    }

    impl Panel for FakePanel {
        fn init(&mut self) -> Result<(), PlayerError> {
            Ok(())
        }

        fn display(&mut self, _frame: &Framebuffer) -> Result<(), PlayerError> {
            self.displayed += 1;
            Ok(())
        }

        fn clear(&mut self) -> Result<(), PlayerError> {
            Ok(())
        }

        fn sleep(&mut self) -> Result<(), PlayerError> {
            Ok(())
        }
    }

    fn test_config(dir: &TempDir) -> Config {
        Config {
            movie_dir: dir.path().join("movies"),
            photo_dir: None,
            progress_log: dir.path().join("progress_log.json"),
            extract_path: dir.path().join("extract.png"),
            frame_step: 12,
            frame_delay: 0,
            photo_delay: 0,
            resume_threshold: 12,
            always_restart: false,
            long_video_cutoff: 10_000,
            long_video_resume: 2_000,
        }
    }

    fn touch_media(dir: &TempDir) -> PathBuf {
        let media = dir.path().join("movie.mp4");
        fs::write(&media, b"not really a video").unwrap();
        media
    }

    #[test]
    fn steps_from_zero_by_exactly_the_increment() {
        let dir = TempDir::new("engine-steps");
        let config = test_config(&dir);
        let ledger = ProgressLedger::new(&config.progress_log);
        let media = touch_media(&dir);
        let mut source = FakeSource::new(&dir, 40);
        let mut panel = FakePanel::default();

        PlaybackEngine::new(&config, &ledger, &mut source)
            .play(&media, &mut panel)
            .unwrap();

        assert_eq!(source.extracted, vec![0, 12, 24, 36]);
        assert_eq!(panel.displayed, 4);
        // The final record is within one step of the total, so the
        // selector will treat this item as played.
        assert_eq!(ledger.get(&media, 999), 36);
    }

    #[test]
    fn resumes_exactly_at_the_persisted_frame() {
        let dir = TempDir::new("engine-resume");
        let config = test_config(&dir);
        let ledger = ProgressLedger::new(&config.progress_log);
        let media = touch_media(&dir);
        ledger.set(&media, 7, Some(40)).unwrap();
        let mut source = FakeSource::new(&dir, 40);
        let mut panel = FakePanel::default();

        PlaybackEngine::new(&config, &ledger, &mut source)
            .play(&media, &mut panel)
            .unwrap();

        assert_eq!(source.extracted, vec![7, 19, 31]);
    }

    #[test]
    fn long_videos_default_to_the_late_resume_point() {
        let dir = TempDir::new("engine-long");
        let config = test_config(&dir);
        let ledger = ProgressLedger::new(&config.progress_log);
        let media = touch_media(&dir);
        let mut source = FakeSource::new(&dir, 10_008);
        let mut panel = FakePanel::default();

        PlaybackEngine::new(&config, &ledger, &mut source)
            .play(&media, &mut panel)
            .unwrap();

        assert_eq!(source.extracted.first(), Some(&2_000));
    }

    #[test]
    fn always_restart_forces_frame_zero() {
        let dir = TempDir::new("engine-restart");
        let mut config = test_config(&dir);
        config.always_restart = true;
        let ledger = ProgressLedger::new(&config.progress_log);
        let media = touch_media(&dir);
        ledger.set(&media, 500, Some(1_000)).unwrap();
        let mut source = FakeSource::new(&dir, 40);
        let mut panel = FakePanel::default();

        PlaybackEngine::new(&config, &ledger, &mut source)
            .play(&media, &mut panel)
            .unwrap();

        assert_eq!(source.extracted, vec![0, 12, 24, 36]);
    }

    #[test]
    fn failed_extraction_leaves_the_attempted_frame_persisted() {
        let dir = TempDir::new("engine-crash");
        let config = test_config(&dir);
        let ledger = ProgressLedger::new(&config.progress_log);
        let media = touch_media(&dir);
        let mut source = FakeSource::new(&dir, 120);
        source.fail_at = Some(24);
        let mut panel = FakePanel::default();

        let result = PlaybackEngine::new(&config, &ledger, &mut source).play(&media, &mut panel);

        assert!(matches!(result, Err(PlayerError::Extraction { frame: 24, .. })));
        assert_eq!(source.extracted, vec![0, 12, 24]);
        // Restarting resumes at the frame that was being attempted.
        assert_eq!(ledger.get(&media, 0), 24);
    }

    #[test]
    fn missing_media_is_reported_as_unavailable() {
        let dir = TempDir::new("engine-missing");
        let config = test_config(&dir);
        let ledger = ProgressLedger::new(&config.progress_log);
        let mut source = FakeSource::new(&dir, 40);
        let mut panel = FakePanel::default();

        let result = PlaybackEngine::new(&config, &ledger, &mut source)
            .play(&dir.path().join("gone.mp4"), &mut panel);

        assert!(matches!(result, Err(PlayerError::MediaUnavailable(_))));
        assert!(source.extracted.is_empty());
    }

    #[test]
    fn timestamps_assume_a_24fps_timeline() {
        assert_eq!(frame_timestamp_ms(0), 0.0);
        assert_eq!(frame_timestamp_ms(24), 1_000.0);
        assert!((frame_timestamp_ms(1) - 41.666_666).abs() < 0.001);
    }

    #[test]
    fn photos_are_letterboxed_and_displayed() {
        let dir = TempDir::new("engine-photo");
        let config = test_config(&dir);
        let ledger = ProgressLedger::new(&config.progress_log);
        let photo = dir.path().join("photo.png");
        GrayImage::from_pixel(400, 300, Luma([0x80]))
            .save(&photo)
            .unwrap();
        let mut source = FakeSource::new(&dir, 0);
        let mut panel = FakePanel::default();

        PlaybackEngine::new(&config, &ledger, &mut source)
            .show_photo(&photo, &mut panel)
            .unwrap();

        assert_eq!(panel.displayed, 1);
    }
}

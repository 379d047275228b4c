// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media file loading (images and videos).
//!
//! This module opens media files as frame sources and converts decoded
//! frames to RGBA buffers suitable for display in egui. Still images
//! are opened as one-frame videos; real video decoding goes through
//! OpenCV when the `video-opencv` feature is enabled.

use crate::error::{Error, Result};
use crate::models::metadata::VideoMetadata;
use std::path::Path;
use std::time::Duration;

/// Still image extensions opened as single-frame media.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// Video file extensions offered in the open dialog.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];

/// One decoded frame as tightly packed RGBA8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub index: u64,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Random-access frame provider backing a playback session.
pub trait FrameSource: Send {
    fn metadata(&self) -> &VideoMetadata;

    /// Decode the frame at `index`.
    fn read_frame(&mut self, index: u64) -> Result<Frame>;
}

/// Open a media file, picking a backend from its extension.
pub fn open_media(path: &Path) -> Result<Box<dyn FrameSource>> {
    if !path.exists() {
        return Err(Error::media(path, "file not found"));
    }
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Ok(Box::new(StillImageSource::open(path)?));
    }
    open_video(path)
}

#[cfg(feature = "video-opencv")]
fn open_video(path: &Path) -> Result<Box<dyn FrameSource>> {
    Ok(Box::new(opencv_source::OpenCvSource::open(path)?))
}

#[cfg(not(feature = "video-opencv"))]
fn open_video(path: &Path) -> Result<Box<dyn FrameSource>> {
    Err(Error::media(
        path,
        "video decoding is not available in this build (enable the video-opencv feature)",
    ))
}

/// A still image presented as a single-frame video.
pub struct StillImageSource {
    metadata: VideoMetadata,
    pixels: Vec<u8>,
}

impl StillImageSource {
    pub fn open(path: &Path) -> Result<Self> {
        let img = image::open(path).map_err(|e| Error::media(path, e))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::info!("Loaded image: {} ({}x{})", path.display(), width, height);
        Ok(Self {
            metadata: VideoMetadata::new(path.to_string_lossy(), 1.0, 1, width, height),
            pixels: rgba.into_raw(),
        })
    }
}

impl FrameSource for StillImageSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn read_frame(&mut self, index: u64) -> Result<Frame> {
        if index != 0 {
            return Err(Error::InvalidFrameIndex { frame: index, frame_count: 1 });
        }
        Ok(Frame {
            index,
            width: self.metadata.width,
            height: self.metadata.height,
            pixels: self.pixels.clone(),
        })
    }
}

/// Generated frames: a horizontal gradient whose red channel encodes the
/// frame index. Used for tests and demos without a decoder.
pub struct SyntheticSource {
    metadata: VideoMetadata,
    decode_delay: Duration,
}

impl SyntheticSource {
    pub fn new(frame_count: u64, width: u32, height: u32, frame_rate: f64) -> Self {
        Self {
            metadata: VideoMetadata::new("synthetic", frame_rate, frame_count, width, height),
            decode_delay: Duration::ZERO,
        }
    }

    /// Simulate a slow decoder.
    pub fn with_decode_delay(mut self, delay: Duration) -> Self {
        self.decode_delay = delay;
        self
    }
}

impl FrameSource for SyntheticSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn read_frame(&mut self, index: u64) -> Result<Frame> {
        if index >= self.metadata.frame_count {
            return Err(Error::InvalidFrameIndex {
                frame: index,
                frame_count: self.metadata.frame_count,
            });
        }
        if !self.decode_delay.is_zero() {
            std::thread::sleep(self.decode_delay);
        }
        let (width, height) = (self.metadata.width, self.metadata.height);
        let red = (index % 256) as u8;
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..height {
            for x in 0..width {
                let green = ((x as u64 * 255) / width.max(1) as u64) as u8;
                pixels.extend_from_slice(&[red, green, 96, 255]);
            }
        }
        Ok(Frame { index, width, height, pixels })
    }
}

#[cfg(feature = "video-opencv")]
mod opencv_source {
    use super::{Frame, FrameSource};
    use crate::error::{Error, Result};
    use crate::models::metadata::{AudioInfo, VideoMetadata};
    use opencv::{core::Mat, imgproc, prelude::*, videoio};
    use std::path::{Path, PathBuf};

    /// Video decoded through OpenCV's `VideoCapture`.
    pub struct OpenCvSource {
        path: PathBuf,
        capture: videoio::VideoCapture,
        metadata: VideoMetadata,
        next_index: u64,
    }

    impl OpenCvSource {
        pub fn open(path: &Path) -> Result<Self> {
            let capture = videoio::VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)
                .map_err(|e| Error::media(path, e))?;
            if !capture.is_opened().map_err(|e| Error::media(path, e))? {
                return Err(Error::media(path, "decoder could not open the file"));
            }

            let prop = |id: i32| capture.get(id).map_err(|e| Error::media(path, e));
            let frame_rate = prop(videoio::CAP_PROP_FPS)?;
            let frame_count = prop(videoio::CAP_PROP_FRAME_COUNT)?.max(0.0) as u64;
            let width = prop(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
            let height = prop(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
            if frame_count == 0 || frame_rate <= 0.0 {
                return Err(Error::media(path, "video reports no frames or no frame rate"));
            }

            let mut metadata = VideoMetadata::new(path.to_string_lossy(), frame_rate, frame_count, width, height);
            // Backends without audio support report zero.
            let sample_rate = capture.get(videoio::CAP_PROP_AUDIO_SAMPLES_PER_SECOND).unwrap_or(0.0);
            let channels = capture.get(videoio::CAP_PROP_AUDIO_TOTAL_CHANNELS).unwrap_or(0.0);
            if let Some(audio) = AudioInfo::from_reported(sample_rate, channels) {
                metadata = metadata.with_audio(audio);
            }

            log::info!(
                "Opened video {} ({}x{}, {} frames at {:.2} fps, audio {:?})",
                path.display(),
                width,
                height,
                frame_count,
                frame_rate,
                metadata.audio
            );
            Ok(Self {
                path: path.to_path_buf(),
                metadata,
                capture,
                next_index: 0,
            })
        }
    }

    impl FrameSource for OpenCvSource {
        fn metadata(&self) -> &VideoMetadata {
            &self.metadata
        }

        fn read_frame(&mut self, index: u64) -> Result<Frame> {
            let path = self.path.as_path();
            // Sequential reads skip the costly seek.
            if index != self.next_index {
                self.capture
                    .set(videoio::CAP_PROP_POS_FRAMES, index as f64)
                    .map_err(|e| Error::media(path, e))?;
            }
            let mut bgr = Mat::default();
            let ok = self.capture.read(&mut bgr).map_err(|e| Error::media(path, e))?;
            if !ok || bgr.empty() {
                return Err(Error::media(path, format!("no frame at index {}", index)));
            }
            let mut rgba = Mat::default();
            imgproc::cvt_color(&bgr, &mut rgba, imgproc::COLOR_BGR2RGBA, 0)
                .map_err(|e| Error::media(path, e))?;
            let pixels = rgba.data_bytes().map_err(|e| Error::media(path, e))?.to_vec();
            self.next_index = index + 1;
            Ok(Frame {
                index,
                width: rgba.cols() as u32,
                height: rgba.rows() as u32,
                pixels,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_frames() {
        let mut source = SyntheticSource::new(10, 4, 2, 25.0);
        let frame = source.read_frame(7).unwrap();
        assert_eq!(frame.index, 7);
        assert_eq!(frame.pixels.len(), 4 * 2 * 4);
        assert_eq!(frame.pixels[0], 7);
        assert!(matches!(source.read_frame(10), Err(Error::InvalidFrameIndex { .. })));
    }

    #[test]
    fn test_open_missing_file() {
        let err = open_media(Path::new("/no/such/video.mp4")).err().unwrap();
        assert!(matches!(err, Error::MediaOpenFailure { .. }));
    }

    #[test]
    fn test_still_image_is_single_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();

        let mut source = open_media(&path).unwrap();
        assert_eq!(source.metadata().frame_count, 1);
        assert_eq!((source.metadata().width, source.metadata().height), (3, 2));
        let frame = source.read_frame(0).unwrap();
        assert_eq!(&frame.pixels[..4], &[1, 2, 3, 255]);
        assert!(source.read_frame(1).is_err());
    }
}

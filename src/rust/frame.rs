use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use image::RgbImage;
use log::{debug, warn};

use crate::classifier::ClassifierError;

/// A single RGB camera frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    /// Wraps raw interleaved RGB8 pixels.
    ///
    /// # Errors
    /// `Capture` if the buffer length does not match `width * height * 3`
    /// or the frame has no pixels.
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ClassifierError> {
        let image = RgbImage::from_raw(width, height, pixels).ok_or_else(|| {
            ClassifierError::Capture(format!(
                "Pixel buffer does not match a {}x{} RGB frame",
                width, height
            ))
        })?;
        Self::try_from(image)
    }

    /// Decodes an image file into a frame
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|e| ClassifierError::Capture(format!("Failed to read frame {:?}: {}", path, e)))?
            .to_rgb8();
        debug!("Read {}x{} frame from {:?}", image.width(), image.height(), path);
        Self::try_from(image)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}

impl TryFrom<RgbImage> for Frame {
    type Error = ClassifierError;

    /// Fails with `Capture` for images without pixels
    fn try_from(image: RgbImage) -> Result<Self, Self::Error> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ClassifierError::Capture("Frame has no pixels".into()));
        }
        Ok(Self { image })
    }
}

/// Supplies the "current" frame of a video feed
pub trait FrameSource {
    /// Reads the current frame.
    ///
    /// # Errors
    /// `Capture` when no frame is available
    fn current_frame(&mut self) -> Result<Frame, ClassifierError>;
}

/// A camera stand-in that replays still images, one per capture.
///
/// Each call to [`current_frame`](FrameSource::current_frame) consumes the
/// next file; once the queue is exhausted captures fail.
#[derive(Debug, Clone, Default)]
pub struct StillFrames {
    pending: VecDeque<PathBuf>,
}

impl StillFrames {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            pending: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push(&mut self, path: impl Into<PathBuf>) {
        self.pending.push_back(path.into());
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl FrameSource for StillFrames {
    fn current_frame(&mut self) -> Result<Frame, ClassifierError> {
        match self.pending.pop_front() {
            Some(path) => Frame::open(path),
            None => {
                warn!("No frame available");
                Err(ClassifierError::Capture("No frame available".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgb_checks_buffer() {
        assert!(Frame::from_rgb(2, 2, vec![0; 12]).is_ok());
        assert!(matches!(
            Frame::from_rgb(2, 2, vec![0; 11]),
            Err(ClassifierError::Capture(_))
        ));
        assert!(Frame::from_rgb(0, 2, Vec::new()).is_err());
    }

    #[test]
    fn test_empty_image_is_not_a_frame() {
        assert!(matches!(
            Frame::try_from(RgbImage::new(0, 0)),
            Err(ClassifierError::Capture(_))
        ));
        assert!(Frame::try_from(RgbImage::new(5, 0)).is_err());
        let frame = Frame::try_from(RgbImage::new(3, 2)).unwrap();
        assert_eq!((frame.width(), frame.height()), (3, 2));
    }

    #[test]
    fn test_still_frames_replay_files() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("frame.png");
        RgbImage::from_pixel(4, 3, image::Rgb([200, 10, 10])).save(&path)?;

        let mut frames = StillFrames::new([&path]);
        let frame = frames.current_frame()?;
        assert_eq!((frame.width(), frame.height()), (4, 3));
        assert!(matches!(frames.current_frame(), Err(ClassifierError::Capture(_))));
        Ok(())
    }

    #[test]
    fn test_missing_file_is_capture_error() {
        let mut frames = StillFrames::new(["/nonexistent/frame.png"]);
        assert!(matches!(frames.current_frame(), Err(ClassifierError::Capture(_))));
    }
}

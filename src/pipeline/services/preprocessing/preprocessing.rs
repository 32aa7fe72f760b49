use crate::common::Scale;
use image::{imageops::FilterType, DynamicImage};
use tracing::debug;

/// Image handed to the recognition backends together with the factors that
/// map its coordinates back onto the submitted frame.
#[derive(Debug, Clone)]
pub struct PreparedFrame {
    pub image: DynamicImage,
    pub scale: Scale,
}

/// Bounds inference cost by shrinking frames whose larger side exceeds
/// `max_dimension`, keeping the aspect ratio.
#[derive(Debug, Clone, Copy)]
pub struct FrameResizer {
    max_dimension: u32,
}

impl FrameResizer {
    pub fn new(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }

    pub fn prepare(&self, image: DynamicImage) -> PreparedFrame {
        let (width, height) = (image.width(), image.height());
        if width <= self.max_dimension && height <= self.max_dimension {
            return PreparedFrame {
                image,
                scale: Scale::IDENTITY,
            };
        }

        let resized = image.resize(self.max_dimension, self.max_dimension, FilterType::Triangle);
        let scale = Scale::new(
            width as f32 / resized.width().max(1) as f32,
            height as f32 / resized.height().max(1) as f32,
        );
        debug!(
            "Downscaled frame from {}x{} to {}x{}",
            width,
            height,
            resized.width(),
            resized.height()
        );
        PreparedFrame {
            image: resized,
            scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::BoundingBox;
    use image::RgbImage;

    fn blank(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
    }

    #[test]
    fn small_frames_pass_through() {
        let prepared = FrameResizer::new(640).prepare(blank(640, 480));
        assert_eq!((prepared.image.width(), prepared.image.height()), (640, 480));
        assert_eq!(prepared.scale, Scale::IDENTITY);
    }

    #[test]
    fn large_frames_keep_aspect_ratio() {
        let prepared = FrameResizer::new(640).prepare(blank(1280, 960));
        assert_eq!((prepared.image.width(), prepared.image.height()), (640, 480));
        assert_eq!(prepared.scale, Scale::uniform(2.0));
    }

    #[test]
    fn tall_frames_are_bounded_by_height() {
        let prepared = FrameResizer::new(100).prepare(blank(50, 400));
        assert_eq!(prepared.image.height(), 100);
        assert!(prepared.image.width() <= 13);
    }

    #[test]
    fn uneven_downscale_maps_full_frame_box_back_exactly() {
        let prepared = FrameResizer::new(100).prepare(blank(50, 400));
        let (width, height) = (prepared.image.width() as i32, prepared.image.height() as i32);
        let bbox = BoundingBox::new(0, 0, width, height).scaled(prepared.scale);
        assert_eq!(bbox, BoundingBox::new(0, 0, 50, 400));
    }
}

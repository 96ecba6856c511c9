//! Media decoding and texture management
//!
//! [`MediaData`] is the decoded, CPU-side form of an image or GIF and can be
//! produced on any thread. [`Media`] is the uploaded form: one egui texture per
//! frame plus an [`Animation`] clock when there is more than one frame.

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;
use std::time::Duration;

use egui::{ColorImage, TextureHandle, TextureOptions};
use image::codecs::gif::GifDecoder;
use image::imageops::FilterType;
use image::{AnimationDecoder, DynamicImage, GenericImageView, RgbaImage};
use thiserror::Error;

use crate::animation::Animation;

/// Largest texture side we upload. Matches the downlevel limits the renderer
/// requests.
pub const MAX_TEXTURE_SIZE: u32 = 2048;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Failed to decode image: {0}")]
    ImageLoadError(#[from] image::ImageError),
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Animation has no frames")]
    NoFrames,
}

/// One decoded animation frame.
#[derive(Clone, Debug)]
pub struct AnimationFrame {
    pub image: RgbaImage,
    pub delay: Duration,
}

/// Decoded media, ready to be uploaded.
#[derive(Clone, Debug)]
pub enum MediaData {
    Still(RgbaImage),
    Frames(Vec<AnimationFrame>),
}

impl MediaData {
    /// Decode a still image (png, jpg, bmp, ...).
    pub fn still_from_path(path: impl AsRef<Path>) -> Result<Self, MediaError> {
        let img = image::open(path)?;
        Ok(Self::Still(limit_texture_size(img).to_rgba8()))
    }

    /// Decode an animated GIF from a file.
    pub fn gif_from_path(path: impl AsRef<Path>) -> Result<Self, MediaError> {
        let reader = BufReader::new(File::open(path)?);
        Self::gif_from_reader(reader)
    }

    /// Decode an animated GIF from memory (e.g. a downloaded body).
    pub fn gif_from_bytes(bytes: &[u8]) -> Result<Self, MediaError> {
        Self::gif_from_reader(Cursor::new(bytes))
    }

    fn gif_from_reader<R: Read>(reader: R) -> Result<Self, MediaError> {
        let decoder = GifDecoder::new(reader)?;
        let frames = decoder.into_frames().collect_frames()?;
        if frames.is_empty() {
            return Err(MediaError::NoFrames);
        }

        let frames = frames
            .into_iter()
            .map(|frame| {
                let (numer, denom) = frame.delay().numer_denom_ms();
                let delay_ms = if denom == 0 { 0 } else { numer / denom };
                let image = limit_texture_size(DynamicImage::ImageRgba8(frame.into_buffer()));
                AnimationFrame {
                    image: image.to_rgba8(),
                    delay: Duration::from_millis(delay_ms as u64),
                }
            })
            .collect();

        Ok(Self::Frames(frames))
    }

    /// First frame (or the still image).
    pub fn first_image(&self) -> &RgbaImage {
        match self {
            Self::Still(image) => image,
            Self::Frames(frames) => &frames[0].image,
        }
    }

    /// Natural size of the media in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.first_image().dimensions()
    }

    pub fn frame_count(&self) -> usize {
        match self {
            Self::Still(_) => 1,
            Self::Frames(frames) => frames.len(),
        }
    }

    /// Resample every frame so it fits inside `max_width` x `max_height`,
    /// keeping aspect. Small media is scaled up.
    pub fn scaled_to_fit(self, max_width: u32, max_height: u32) -> Self {
        let (width, height) = self.dimensions();
        let (target_w, target_h) = fit_within(width, height, max_width, max_height);
        if (target_w, target_h) == (width, height) {
            return self;
        }

        let resize = |image: RgbaImage| {
            image::imageops::resize(&image, target_w, target_h, FilterType::Triangle)
        };

        match self {
            Self::Still(image) => Self::Still(resize(image)),
            Self::Frames(frames) => Self::Frames(
                frames
                    .into_iter()
                    .map(|frame| AnimationFrame {
                        image: resize(frame.image),
                        delay: frame.delay,
                    })
                    .collect(),
            ),
        }
    }

    /// Small preview of the first frame, fitting inside `max_side` square.
    pub fn thumbnail(&self, max_side: u32) -> RgbaImage {
        let (width, height) = self.dimensions();
        let (w, h) = fit_within(width, height, max_side, max_side);
        image::imageops::resize(self.first_image(), w, h, FilterType::Triangle)
    }
}

/// Largest size with the same aspect ratio that fits inside the bounds.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let scale = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    let w = ((width as f64 * scale).round() as u32).clamp(1, max_width.max(1));
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_height.max(1));
    (w, h)
}

/// Clamp dimensions to the max texture size while maintaining aspect ratio.
fn clamp_to_max_size(width: u32, height: u32, max_size: u32) -> (u32, u32) {
    if width <= max_size && height <= max_size {
        return (width, height);
    }
    fit_within(width, height, max_size, max_size)
}

fn limit_texture_size(img: DynamicImage) -> DynamicImage {
    let (width, height) = img.dimensions();
    let (w, h) = clamp_to_max_size(width, height, MAX_TEXTURE_SIZE);
    if (w, h) == (width, height) {
        return img;
    }
    log::warn!(
        "Image {}x{} exceeds texture limit, downscaled to {}x{}",
        width,
        height,
        w,
        h
    );
    img.resize_exact(w, h, FilterType::Triangle)
}

/// Convert an RGBA buffer into an egui image.
pub fn color_image(image: &RgbaImage) -> ColorImage {
    let size = [image.width() as usize, image.height() as usize];
    ColorImage::from_rgba_unmultiplied(size, image.as_raw())
}

/// Uploaded media: textures for every frame and the playback clock.
pub struct Media {
    textures: Vec<TextureHandle>,
    animation: Option<Animation>,
    size: (u32, u32),
}

impl Media {
    /// Upload decoded media as egui textures named after `name`.
    pub fn upload(ctx: &egui::Context, name: &str, data: &MediaData) -> Self {
        let size = data.dimensions();
        match data {
            MediaData::Still(image) => Self {
                textures: vec![ctx.load_texture(name, color_image(image), TextureOptions::LINEAR)],
                animation: None,
                size,
            },
            MediaData::Frames(frames) => {
                let textures = frames
                    .iter()
                    .enumerate()
                    .map(|(i, frame)| {
                        ctx.load_texture(
                            format!("{}#{}", name, i),
                            color_image(&frame.image),
                            TextureOptions::LINEAR,
                        )
                    })
                    .collect();
                let animation = (frames.len() > 1)
                    .then(|| Animation::new(frames.iter().map(|frame| frame.delay)));
                log::debug!("Uploaded {} frames for {}", frames.len(), name);
                Self {
                    textures,
                    animation,
                    size,
                }
            }
        }
    }

    /// Advance the animation. Returns true when the visible frame changed.
    pub fn update(&mut self, delta: f32) -> bool {
        self.animation
            .as_mut()
            .map(|animation| animation.update(delta))
            .unwrap_or(false)
    }

    pub fn current_texture(&self) -> &TextureHandle {
        let index = self
            .animation
            .as_ref()
            .map(|animation| animation.current_frame())
            .unwrap_or(0);
        &self.textures[index.min(self.textures.len() - 1)]
    }

    pub fn is_animated(&self) -> bool {
        self.animation.is_some()
    }

    /// Natural size in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, Rgba};

    fn gif_bytes(frames: &[(u32, u32, u32)]) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut bytes);
            for (width, height, delay_ms) in frames {
                let buffer = RgbaImage::from_pixel(*width, *height, Rgba([200, 10, 10, 255]));
                let frame = Frame::from_parts(
                    buffer,
                    0,
                    0,
                    Delay::from_numer_denom_ms(*delay_ms, 1),
                );
                encoder.encode_frame(frame).expect("encode frame");
            }
        }
        bytes
    }

    #[test]
    fn test_gif_from_bytes_keeps_frames_and_delays() {
        let bytes = gif_bytes(&[(40, 20, 100), (40, 20, 200)]);
        let media = MediaData::gif_from_bytes(&bytes).expect("decode");

        assert_eq!(media.dimensions(), (40, 20));
        assert_eq!(media.frame_count(), 2);
        match media {
            MediaData::Frames(frames) => {
                assert_eq!(frames[0].delay, Duration::from_millis(100));
                assert_eq!(frames[1].delay, Duration::from_millis(200));
            }
            MediaData::Still(_) => panic!("expected frames"),
        }
    }

    #[test]
    fn test_garbage_is_not_a_gif() {
        assert!(MediaData::gif_from_bytes(b"definitely not a gif").is_err());
    }

    #[test]
    fn test_fit_within_keeps_aspect_both_ways() {
        assert_eq!(fit_within(1200, 800, 600, 600), (600, 400));
        assert_eq!(fit_within(100, 50, 600, 600), (600, 300));
        assert_eq!(fit_within(300, 900, 100, 100), (33, 100));
        assert_eq!(fit_within(600, 600, 600, 600), (600, 600));
    }

    #[test]
    fn test_clamp_to_max_size_only_shrinks() {
        assert_eq!(clamp_to_max_size(100, 80, 2048), (100, 80));
        assert_eq!(clamp_to_max_size(4096, 1024, 2048), (2048, 512));
    }

    #[test]
    fn test_scaled_to_fit_and_thumbnail() {
        let still = MediaData::Still(RgbaImage::new(1200, 300));
        let scaled = still.scaled_to_fit(600, 600);
        assert_eq!(scaled.dimensions(), (600, 150));
        assert_eq!(scaled.thumbnail(100).dimensions(), (100, 25));
    }

    #[test]
    fn test_upload_creates_texture_per_frame() {
        let ctx = egui::Context::default();
        let bytes = gif_bytes(&[(8, 8, 50), (8, 8, 50), (8, 8, 50)]);
        let data = MediaData::gif_from_bytes(&bytes).expect("decode");

        let mut media = Media::upload(&ctx, "test.gif", &data);
        assert!(media.is_animated());
        assert_eq!(media.size(), (8, 8));
        let first = media.current_texture().id();
        assert!(media.update(0.05));
        assert_ne!(media.current_texture().id(), first);
    }
}

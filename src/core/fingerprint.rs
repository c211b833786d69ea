use image::{DynamicImage, ImageBuffer, ImageReader, Pixel};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Image has no pixels: {path}")]
    Empty { path: PathBuf },
}

/// Mean intensity of each channel, in the image's native channel order.
///
/// Equality and hashing use the exact bit pattern of each mean, so two
/// fingerprints only match when every channel average is identical.
#[derive(Debug, Clone)]
pub struct Fingerprint(Vec<f64>);

impl Fingerprint {
    #[cfg(test)]
    pub(crate) fn new(means: Vec<f64>) -> Self {
        Self(means)
    }

    pub fn means(&self) -> &[f64] {
        &self.0
    }
}

impl PartialEq for Fingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Eq for Fingerprint {}

impl Hash for Fingerprint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for mean in &self.0 {
            mean.to_bits().hash(state);
        }
    }
}

/// Decode the image at `path` and compute its [`Fingerprint`].
///
/// The format is guessed from the file content, not the extension.
pub fn fingerprint(path: &Path) -> Result<Fingerprint, FingerprintError> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    fingerprint_image(&img).ok_or_else(|| FingerprintError::Empty {
        path: path.to_path_buf(),
    })
}

/// Per-channel means of a decoded image. `None` for a zero-pixel image.
pub fn fingerprint_image(img: &DynamicImage) -> Option<Fingerprint> {
    let means = match img {
        DynamicImage::ImageLuma8(buf) => channel_means(buf),
        DynamicImage::ImageLumaA8(buf) => channel_means(buf),
        DynamicImage::ImageRgb8(buf) => channel_means(buf),
        DynamicImage::ImageRgba8(buf) => channel_means(buf),
        DynamicImage::ImageLuma16(buf) => channel_means(buf),
        DynamicImage::ImageLumaA16(buf) => channel_means(buf),
        DynamicImage::ImageRgb16(buf) => channel_means(buf),
        DynamicImage::ImageRgba16(buf) => channel_means(buf),
        DynamicImage::ImageRgb32F(buf) => channel_means(buf),
        DynamicImage::ImageRgba32F(buf) => channel_means(buf),
        other => {
            if other.color().has_alpha() {
                channel_means(&other.to_rgba32f())
            } else {
                channel_means(&other.to_rgb32f())
            }
        }
    };
    means.map(Fingerprint)
}

fn channel_means<P>(buf: &ImageBuffer<P, Vec<P::Subpixel>>) -> Option<Vec<f64>>
where
    P: Pixel,
    P::Subpixel: Into<f64>,
{
    let count = u64::from(buf.width()) * u64::from(buf.height());
    if count == 0 {
        return None;
    }

    let mut sums = vec![0.0f64; usize::from(P::CHANNEL_COUNT)];
    for pixel in buf.pixels() {
        for (sum, &sample) in sums.iter_mut().zip(pixel.channels()) {
            *sum += sample.into();
        }
    }

    Some(sums.into_iter().map(|sum| sum / count as f64).collect())
}

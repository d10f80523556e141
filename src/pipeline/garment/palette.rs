use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use indexmap::IndexMap;
use tracing::debug;

use crate::config::GarmentThresholds;

/// Sentinel reported when no color could be extracted.
pub const UNKNOWN_COLOR: &str = "unknown";

/// Named reference colors used as fixed quantization centroids. Order matters:
/// an exact distance tie goes to the entry listed first.
pub const PALETTE: [(&str, [u8; 3]); 13] = [
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("blue", [0, 0, 255]),
    ("green", [0, 255, 0]),
    ("yellow", [255, 255, 0]),
    ("orange", [255, 165, 0]),
    ("purple", [128, 0, 128]),
    ("pink", [255, 192, 203]),
    ("brown", [139, 69, 19]),
    ("gray", [128, 128, 128]),
    ("navy", [0, 0, 128]),
    ("beige", [245, 245, 220]),
];

/// Name of the palette entry nearest to `pixel` by squared RGB distance.
pub fn closest_color(pixel: &Rgb<u8>) -> &'static str {
    let mut best = PALETTE[0].0;
    let mut best_distance = u32::MAX;

    for (name, reference) in PALETTE.iter() {
        let distance: u32 = pixel
            .0
            .iter()
            .zip(reference.iter())
            .map(|(a, b)| {
                let d = *a as i32 - *b as i32;
                (d * d) as u32
            })
            .sum();
        if distance < best_distance {
            best_distance = distance;
            best = *name;
        }
    }

    best
}

/// Frequency of one palette color among the sampled pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorVote {
    pub color: &'static str,
    pub count: u32,
}

/// Nearest-centroid vote over a downsampled, strided sample of the image.
#[derive(Debug, Clone)]
pub struct ColorQuantizer {
    size: u32,
    stride: usize,
    max_colors: usize,
}

impl Default for ColorQuantizer {
    fn default() -> Self {
        Self::from_thresholds(&GarmentThresholds::default())
    }
}

impl ColorQuantizer {
    pub fn from_thresholds(thresholds: &GarmentThresholds) -> Self {
        Self {
            size: thresholds.quantize_size.max(1),
            stride: thresholds.sample_stride.max(1),
            max_colors: thresholds.max_dominant_colors,
        }
    }

    /// Votes per palette color, most frequent first. Colors with equal counts
    /// keep the order in which they were first seen.
    pub fn votes(&self, image: &RgbImage) -> Vec<ColorVote> {
        if image.width() == 0 || image.height() == 0 {
            return Vec::new();
        }

        let small = imageops::resize(image, self.size, self.size, FilterType::CatmullRom);

        let mut counts: IndexMap<&'static str, u32> = IndexMap::new();
        for pixel in small.pixels().step_by(self.stride) {
            *counts.entry(closest_color(pixel)).or_insert(0) += 1;
        }

        let mut votes: Vec<ColorVote> = counts
            .into_iter()
            .map(|(color, count)| ColorVote { color, count })
            .collect();
        // stable sort keeps first-seen order among ties
        votes.sort_by(|a, b| b.count.cmp(&a.count));
        votes
    }

    /// Top palette colors by vote, or the single `"unknown"` sentinel when
    /// the image has nothing to sample.
    pub fn dominant_colors(&self, image: &RgbImage) -> Vec<String> {
        let votes = self.votes(image);
        if votes.is_empty() {
            debug!("No pixels to quantize, reporting unknown color");
            return vec![UNKNOWN_COLOR.to_string()];
        }

        votes
            .into_iter()
            .take(self.max_colors)
            .map(|vote| vote.color.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageBuffer;

    #[test]
    fn palette_entries_map_to_themselves() {
        for (name, rgb) in PALETTE.iter() {
            assert_eq!(closest_color(&Rgb(*rgb)), *name);
        }
    }

    #[test]
    fn near_red_maps_to_red() {
        assert_eq!(closest_color(&Rgb([250, 10, 5])), "red");
        assert_eq!(closest_color(&Rgb([20, 20, 30])), "black");
    }

    #[test]
    fn distance_tie_goes_to_first_palette_entry() {
        // (0, 0, 64) is exactly 64^2 from both black and navy
        assert_eq!(closest_color(&Rgb([0, 0, 64])), "black");
    }

    #[test]
    fn solid_image_has_single_dominant_color() {
        let img = ImageBuffer::from_pixel(300, 400, Rgb([255, 0, 0]));
        let colors = ColorQuantizer::default().dominant_colors(&img);
        assert_eq!(colors, vec!["red".to_string()]);
    }

    #[test]
    fn ranks_by_frequency_and_truncates_to_three() {
        // four horizontal bands with decreasing height
        let img = ImageBuffer::from_fn(150, 150, |_, y| match y {
            0..=59 => Rgb([0, 0, 255]),
            60..=99 => Rgb([255, 255, 255]),
            100..=129 => Rgb([0, 255, 0]),
            _ => Rgb([0, 0, 0]),
        });
        let quantizer = ColorQuantizer::default();

        let votes = quantizer.votes(&img);
        assert_eq!(votes.len(), 4);
        assert!(votes.windows(2).all(|w| w[0].count >= w[1].count));

        let colors = quantizer.dominant_colors(&img);
        assert_eq!(colors, vec!["blue", "white", "green"]);
    }

    #[test]
    fn quantization_is_deterministic() {
        let img = ImageBuffer::from_fn(211, 173, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
        });
        let quantizer = ColorQuantizer::default();
        assert_eq!(quantizer.dominant_colors(&img), quantizer.dominant_colors(&img));
    }

    #[test]
    fn fine_stripes_blend_to_gray() {
        let img = ImageBuffer::from_fn(300, 300, |x, _| {
            if x % 2 == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let colors = ColorQuantizer::default().dominant_colors(&img);
        assert_eq!(colors, vec!["gray".to_string()]);
    }

    #[test]
    fn empty_image_reports_unknown() {
        let img = RgbImage::new(0, 0);
        assert_eq!(ColorQuantizer::default().dominant_colors(&img), vec!["unknown"]);
    }
}

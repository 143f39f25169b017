use std::path::Path;

use image::RgbImage;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use super::Dimensions;

/// Lower half block; background paints the top half, foreground the bottom.
const HALF_BLOCK: &str = "▄";

/// Decode an image file and render it as half blocks.
pub fn image_lines(path: &Path, dim: Dimensions) -> Result<Vec<Line<'static>>, image::ImageError> {
    let img = image::open(path)?.to_rgb8();
    Ok(half_blocks(&img, dim))
}

/// Downsample into square sectors and emit one half-block cell per pair of
/// vertically stacked sectors. One row is kept for the `WxH` caption.
pub fn half_blocks(img: &RgbImage, dim: Dimensions) -> Vec<Line<'static>> {
    let (px_width, px_height) = img.dimensions();
    let caption = Line::from(format!("{px_width}x{px_height}"));

    let width_hb = dim.width as u32;
    let height_hb = dim.height.saturating_sub(1) as u32 * 2;
    if width_hb == 0 || height_hb == 0 || px_width == 0 || px_height == 0 {
        return vec![caption];
    }

    let sector = px_width
        .div_ceil(width_hb)
        .max(px_height.div_ceil(height_hb))
        .max(1);
    let width_sectors = px_width / sector;
    let mut height_sectors = px_height / sector;
    height_sectors -= height_sectors % 2;

    let mut lines = Vec::with_capacity(height_sectors as usize / 2 + 1);
    for sy in (0..height_sectors).step_by(2) {
        let spans: Vec<Span<'static>> = (0..width_sectors)
            .map(|sx| {
                let top = sector_mean(img, sx, sy, sector);
                let bottom = sector_mean(img, sx, sy + 1, sector);
                Span::styled(HALF_BLOCK, Style::default().bg(top).fg(bottom))
            })
            .collect();
        lines.push(Line::from(spans));
    }
    lines.push(caption);
    lines
}

fn sector_mean(img: &RgbImage, sx: u32, sy: u32, sector: u32) -> Color {
    let mut sums = [0u64; 3];
    for y in sy * sector..(sy + 1) * sector {
        for x in sx * sector..(sx + 1) * sector {
            let px = img.get_pixel(x, y);
            for (sum, channel) in sums.iter_mut().zip(px.0) {
                *sum += u64::from(channel);
            }
        }
    }
    let count = u64::from(sector * sector);
    Color::Rgb(
        (sums[0] / count) as u8,
        (sums[1] / count) as u8,
        (sums[2] / count) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn dim(width: usize, height: usize) -> Dimensions {
        Dimensions { width, height }
    }

    fn two_tone(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |_, y| {
            if y < height / 2 {
                Rgb([200, 0, 0])
            } else {
                Rgb([0, 0, 100])
            }
        })
    }

    #[test]
    fn top_and_bottom_sectors_become_bg_and_fg() {
        let lines = half_blocks(&two_tone(4, 4), dim(2, 2));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans.len(), 2);
        let cell = &lines[0].spans[0];
        assert_eq!(cell.content, HALF_BLOCK);
        assert_eq!(cell.style.bg, Some(Color::Rgb(200, 0, 0)));
        assert_eq!(cell.style.fg, Some(Color::Rgb(0, 0, 100)));
        assert_eq!(lines[1].spans[0].content, "4x4");
    }

    #[test]
    fn sectors_average_pixels() {
        let img = RgbImage::from_fn(2, 2, |x, _| if x == 0 { Rgb([0, 0, 0]) } else { Rgb([100, 50, 10]) });
        // A 1x2 window forces 2x2 sectors: one cell, but two half rows don't fit.
        let lines = half_blocks(&img, dim(1, 2));
        assert_eq!(lines.len(), 1);

        let img = RgbImage::from_fn(2, 4, |x, _| if x == 0 { Rgb([0, 0, 0]) } else { Rgb([100, 50, 10]) });
        let lines = half_blocks(&img, dim(1, 2));
        assert_eq!(lines[0].spans[0].style.bg, Some(Color::Rgb(50, 25, 5)));
    }

    #[test]
    fn output_fits_window() {
        let lines = half_blocks(&two_tone(640, 480), dim(20, 10));
        assert!(lines.len() <= 10);
        assert!(lines.iter().all(|l| l.spans.len() <= 20));
        assert_eq!(lines.last().unwrap().spans[0].content, "640x480");
    }

    #[test]
    fn degenerate_window_only_captions() {
        let lines = half_blocks(&two_tone(4, 4), dim(0, 10));
        assert_eq!(lines.len(), 1);
        let lines = half_blocks(&two_tone(4, 4), dim(10, 1));
        assert_eq!(lines.len(), 1);
    }
}

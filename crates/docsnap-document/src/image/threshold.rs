// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Adaptive (local mean) thresholding backed by a summed-area table.

use image::{GrayImage, Luma};

/// Binarize `gray` against the mean of a `block_size × block_size`
/// neighbourhood minus `c`.
///
/// A pixel becomes white (255) when it is brighter than `local_mean - c`,
/// otherwise black (0). Windows are clipped at the image border. An even
/// `block_size` is treated as the next odd size.
pub fn adaptive_threshold(gray: &GrayImage, block_size: u32, c: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let radius = block_size / 2;
    let integral = compute_integral_image(gray);

    GrayImage::from_fn(width, height, |x, y| {
        let local_mean = region_mean(&integral, width, height, x, y, radius);
        let value = gray.get_pixel(x, y).0[0] as f64;
        if value > local_mean - c as f64 {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Compute the integral (summed-area table) of a grayscale image.
///
/// `integral[y * (width+1) + x]` holds the sum of all pixels in `[0, x) × [0, y)`.
/// The table is `(width+1) x (height+1)` with a zero border.
fn compute_integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += gray.get_pixel(x, y).0[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

/// Mean pixel value of the square window of `radius` centred on `(cx, cy)`,
/// clipped to the image.
fn region_mean(integral: &[u64], img_width: u32, img_height: u32, cx: u32, cy: u32, radius: u32) -> f64 {
    let stride = (img_width + 1) as usize;

    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = (cx as usize + radius as usize + 1).min(img_width as usize);
    let y2 = (cy as usize + radius as usize + 1).min(img_height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    if area == 0.0 {
        return 128.0;
    }

    // S = I[y2][x2] - I[y1][x2] - I[y2][x1] + I[y1][x1]
    let sum = integral[y2 * stride + x2] as f64 - integral[y1 * stride + x2] as f64
        - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_of_uniform_image() {
        let gray = GrayImage::from_pixel(4, 3, Luma([10u8]));
        let table = compute_integral_image(&gray);
        // Bottom-right entry is the sum of every pixel.
        assert_eq!(*table.last().unwrap(), 4 * 3 * 10);
        assert!((region_mean(&table, 4, 3, 1, 1, 1) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn uniform_image_is_all_white() {
        // value (200) > mean (200) - c (5)
        let gray = GrayImage::from_pixel(16, 16, Luma([200u8]));
        let out = adaptive_threshold(&gray, 11, 5.0);
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn dark_text_on_uneven_background() {
        // Left half dim paper, right half bright paper, one dark stroke in each.
        let mut gray = GrayImage::from_fn(64, 32, |x, _| if x < 32 { Luma([90u8]) } else { Luma([220u8]) });
        for y in 10..22 {
            gray.put_pixel(12, y, Luma([40]));
            gray.put_pixel(48, y, Luma([150]));
        }
        let out = adaptive_threshold(&gray, 11, 10.0);

        // Both strokes come out black even though the right one is brighter
        // than the left background.
        assert_eq!(out.get_pixel(12, 16).0[0], 0);
        assert_eq!(out.get_pixel(48, 16).0[0], 0);
        // Paper away from the strokes and the seam stays white.
        assert_eq!(out.get_pixel(4, 4).0[0], 255);
        assert_eq!(out.get_pixel(58, 4).0[0], 255);
    }

    #[test]
    fn output_is_strictly_binary() {
        let gray = GrayImage::from_fn(40, 40, |x, y| Luma([((x * 7 + y * 3) % 256) as u8]));
        let out = adaptive_threshold(&gray, 21, 8.0);
        assert!(out.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }
}

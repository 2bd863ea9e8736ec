use anyhow::{Context, Result, anyhow};
use fast_image_resize as fir;
use ndarray::Array4;
use rayon::prelude::*;

use super::region::HandRegion;
use crate::types::{Frame, NUM_LANDMARKS};

pub const HANDPOSE_INPUT_SIZE: u32 = 224;
pub const PALM_INPUT_SIZE: u32 = 192;

/// How a frame was scaled and padded into a square model input.
#[derive(Clone, Debug)]
pub struct LetterboxInfo {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_w: u32,
    pub orig_h: u32,
}

/// Maps points of a rotated square crop back to frame pixels.
#[derive(Clone, Debug)]
pub struct CropTransform {
    pub region: HandRegion,
    pub output_size: u32,
    pub orig_w: u32,
    pub orig_h: u32,
}

impl CropTransform {
    /// Crop pixels per frame pixel is `output_size / side`; this is the inverse.
    pub fn scale(&self) -> f32 {
        self.region.side / self.output_size as f32
    }

    pub fn project(&self, x: f32, y: f32) -> (f32, f32) {
        let half = self.output_size as f32 / 2.0;
        let scale = self.scale();
        let (ox, oy) = self
            .region
            .rotate_offset((x - half) * scale, (y - half) * scale);
        (
            ox.clamp(0.0, (self.orig_w.saturating_sub(1)) as f32),
            oy.clamp(0.0, (self.orig_h.saturating_sub(1)) as f32),
        )
    }
}

fn check_buffer(frame: &Frame) -> Result<()> {
    let expected_len = (frame.width as usize)
        .saturating_mul(frame.height as usize)
        .saturating_mul(4);
    if frame.width == 0 || frame.height == 0 {
        return Err(anyhow!("empty frame {}x{}", frame.width, frame.height));
    }
    if frame.rgba.len() != expected_len {
        return Err(anyhow!(
            "frame buffer size mismatch: got {}, expected {}",
            frame.rgba.len(),
            expected_len
        ));
    }
    Ok(())
}

/// Resizes the frame to fit a `target_size` square keeping aspect ratio, pads
/// with black and returns an NHWC RGB tensor in `[0, 1]`.
pub fn prepare_letterboxed(frame: &Frame, target_size: u32) -> Result<(Array4<f32>, LetterboxInfo)> {
    check_buffer(frame)?;

    let scale = target_size as f32 / (frame.width.max(frame.height) as f32);
    let new_w = ((frame.width as f32 * scale).round() as u32).clamp(1, target_size);
    let new_h = ((frame.height as f32 * scale).round() as u32).clamp(1, target_size);

    let src_image = fir::images::Image::from_vec_u8(
        frame.width,
        frame.height,
        frame.rgba.clone(),
        fir::PixelType::U8x4,
    )?;
    let mut dst_image = fir::images::Image::new(new_w, new_h, fir::PixelType::U8x4);
    let resize_options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Interpolation(fir::FilterType::Bilinear));
    fir::Resizer::new()
        .resize(&src_image, &mut dst_image, Some(&resize_options))
        .context("fast resize failed")?;
    let resized = dst_image.into_vec();

    let side = target_size as usize;
    let pad_x = (side - new_w as usize) / 2;
    let pad_y = (side - new_h as usize) / 2;
    let src_stride = new_w as usize * 4;

    // Rows of the padded square; those outside the resized image stay black.
    let normalized: Vec<f32> = (0..side)
        .into_par_iter()
        .flat_map_iter(|row| {
            let src_row = row
                .checked_sub(pad_y)
                .filter(|r| *r < new_h as usize)
                .map(|r| &resized[r * src_stride..(r + 1) * src_stride]);
            (0..side).flat_map(move |col| {
                let px = src_row.and_then(|line| {
                    col.checked_sub(pad_x)
                        .filter(|c| *c < new_w as usize)
                        .map(|c| &line[c * 4..c * 4 + 3])
                });
                match px {
                    Some(rgb) => [
                        rgb[0] as f32 / 255.0,
                        rgb[1] as f32 / 255.0,
                        rgb[2] as f32 / 255.0,
                    ],
                    None => [0.0; 3],
                }
            })
        })
        .collect();

    let input = Array4::<f32>::from_shape_vec((1, side, side, 3), normalized)
        .map_err(|err| anyhow!("failed to build input tensor: {err}"))?;

    let letterbox = LetterboxInfo {
        scale,
        pad_x: pad_x as f32,
        pad_y: pad_y as f32,
        orig_w: frame.width,
        orig_h: frame.height,
    };

    Ok((input, letterbox))
}

/// Samples a rotated square `region` of the frame into an `output_size` NHWC tensor.
pub fn prepare_rotated_crop(
    frame: &Frame,
    region: &HandRegion,
    output_size: u32,
) -> Result<(Array4<f32>, CropTransform)> {
    check_buffer(frame)?;

    let transform = CropTransform {
        region: region.clone(),
        output_size,
        orig_w: frame.width,
        orig_h: frame.height,
    };
    let half = output_size as f32 / 2.0;
    let scale = transform.scale();

    let data: Vec<f32> = (0..output_size)
        .into_par_iter()
        .flat_map_iter(|y| {
            let dy = (y as f32 + 0.5 - half) * scale;
            let region = &transform.region;
            (0..output_size).flat_map(move |x| {
                let dx = (x as f32 + 0.5 - half) * scale;
                let (sx, sy) = region.rotate_offset(dx, dy);
                sample_rgb(frame, sx, sy)
            })
        })
        .collect();

    let size = output_size as usize;
    let array = Array4::<f32>::from_shape_vec((1, size, size, 3), data)
        .map_err(|err| anyhow!("failed to build rotated crop tensor: {err}"))?;

    Ok((array, transform))
}

pub fn decode_landmarks(flat: &[f32]) -> Result<Vec<[f32; 3]>> {
    if flat.len() < NUM_LANDMARKS * 3 {
        return Err(anyhow!(
            "unexpected landmarks length: got {}, need {}",
            flat.len(),
            NUM_LANDMARKS * 3
        ));
    }

    Ok(flat
        .chunks_exact(3)
        .take(NUM_LANDMARKS)
        .map(|c| [c[0], c[1], c[2]])
        .collect())
}

/// Bilinear RGB sample; outside the frame reads as black.
fn sample_rgb(frame: &Frame, x: f32, y: f32) -> [f32; 3] {
    if !x.is_finite() || !y.is_finite() {
        return [0.0; 3];
    }
    // Pixel centers sit at +0.5.
    let (x, y) = (x - 0.5, y - 0.5);
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);

    let fetch = |cx: f32, cy: f32| -> [f32; 3] {
        if cx < 0.0 || cy < 0.0 || cx >= frame.width as f32 || cy >= frame.height as f32 {
            return [0.0; 3];
        }
        let idx = (cy as usize * frame.width as usize + cx as usize) * 4;
        match frame.rgba.get(idx..idx + 3) {
            Some(px) => [
                px[0] as f32 / 255.0,
                px[1] as f32 / 255.0,
                px[2] as f32 / 255.0,
            ],
            None => [0.0; 3],
        }
    };

    let c00 = fetch(x0, y0);
    let c10 = fetch(x0 + 1.0, y0);
    let c01 = fetch(x0, y0 + 1.0);
    let c11 = fetch(x0 + 1.0, y0 + 1.0);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    std::array::from_fn(|c| lerp(lerp(c00[c], c10[c], fx), lerp(c01[c], c11[c], fx), fy))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Frame {
        let rgba = (0..width * height)
            .flat_map(|_| [rgb[0], rgb[1], rgb[2], 255])
            .collect();
        Frame::new(width, height, rgba)
    }

    #[test]
    fn letterbox_pads_short_side() {
        let frame = solid(64, 32, [255, 0, 0]);
        let (input, info) = prepare_letterboxed(&frame, 32).unwrap();

        assert_eq!(input.shape(), &[1, 32, 32, 3]);
        assert_relative_eq!(info.scale, 0.5);
        assert_eq!(info.pad_x, 0.0);
        assert_eq!(info.pad_y, 8.0);
        // Padding rows are black, content rows are red.
        assert_eq!(input[[0, 0, 10, 0]], 0.0);
        assert_relative_eq!(input[[0, 16, 10, 0]], 1.0);
        assert_eq!(input[[0, 16, 10, 1]], 0.0);
        assert_eq!(input[[0, 31, 10, 0]], 0.0);
    }

    #[test]
    fn letterbox_rejects_bad_buffer() {
        let frame = Frame::new(4, 4, vec![0; 10]);
        assert!(prepare_letterboxed(&frame, 32).is_err());
    }

    #[test]
    fn unrotated_crop_projects_center_to_region_center() {
        let frame = solid(200, 100, [0, 255, 0]);
        let region = HandRegion {
            center: (100.0, 50.0),
            side: 80.0,
            angle: 0.0,
        };
        let (input, transform) = prepare_rotated_crop(&frame, &region, 16).unwrap();

        assert_eq!(input.shape(), &[1, 16, 16, 3]);
        assert_relative_eq!(input[[0, 8, 8, 1]], 1.0);
        let (x, y) = transform.project(8.0, 8.0);
        assert_relative_eq!(x, 100.0);
        assert_relative_eq!(y, 50.0);
        let (x, _) = transform.project(16.0, 8.0);
        assert_relative_eq!(x, 140.0);
    }

    #[test]
    fn projection_clamps_to_frame() {
        let transform = CropTransform {
            region: HandRegion {
                center: (5.0, 5.0),
                side: 100.0,
                angle: 0.0,
            },
            output_size: 10,
            orig_w: 20,
            orig_h: 20,
        };
        assert_eq!(transform.project(0.0, 0.0), (0.0, 0.0));
        assert_eq!(transform.project(10.0, 10.0), (19.0, 19.0));
    }

    #[test]
    fn decode_needs_full_landmark_set() {
        assert!(decode_landmarks(&[0.0; 60]).is_err());
        let flat: Vec<f32> = (0..63 + 3).map(|v| v as f32).collect();
        let landmarks = decode_landmarks(&flat).unwrap();
        assert_eq!(landmarks.len(), NUM_LANDMARKS);
        assert_eq!(landmarks[20], [60.0, 61.0, 62.0]);
    }
}

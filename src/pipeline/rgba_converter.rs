use std::convert::TryFrom;

use anyhow::{Result, anyhow};
use rayon::prelude::*;
use yuv::{
    YuvBiPlanarImage, YuvConversionMode, YuvPackedImage, YuvRange, YuvStandardMatrix,
    yuv_nv12_to_rgba, yuyv422_to_rgba,
};
use zune_jpeg::{
    JpegDecoder,
    zune_core::{bytestream::ZCursor, colorspace::ColorSpace, options::DecoderOptions},
};

use crate::types::Frame;

/// Raw layouts a capture device may hand us.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Nv12,
    Yuyv,
    Mjpeg,
    Rgb,
    Bgr,
    Gray,
}

/// Converts one captured buffer into an RGBA frame.
pub fn convert_to_frame(format: PixelFormat, data: &[u8], width: u32, height: u32) -> Result<Frame> {
    let rgba = match format {
        PixelFormat::Nv12 => nv12_to_rgba(data, width, height)?,
        PixelFormat::Yuyv => yuyv_to_rgba(data, width, height)?,
        PixelFormat::Mjpeg => {
            let (rgba, width, height) = mjpeg_to_rgba(data, width, height)?;
            return Ok(Frame::new(width, height, rgba));
        }
        PixelFormat::Rgb => packed_to_rgba(data, width, height, PackedLayout::Rgb)?,
        PixelFormat::Bgr => packed_to_rgba(data, width, height, PackedLayout::Bgr)?,
        PixelFormat::Gray => packed_to_rgba(data, width, height, PackedLayout::Gray)?,
    };

    Ok(Frame::new(width, height, rgba))
}

fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

fn ensure_len(label: &str, data: &[u8], expected: usize) -> Result<()> {
    if data.len() < expected {
        return Err(anyhow!(
            "{label} buffer too small: got {}, expected {expected}",
            data.len()
        ));
    }
    Ok(())
}

fn nv12_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let y_plane_len = pixel_count(width, height);
    let uv_plane_len = y_plane_len / 2;
    ensure_len("NV12", data, y_plane_len + uv_plane_len)?;

    let image = YuvBiPlanarImage {
        y_plane: &data[..y_plane_len],
        y_stride: width,
        uv_plane: &data[y_plane_len..y_plane_len + uv_plane_len],
        uv_stride: width,
        width,
        height,
    };

    let mut rgba = vec![0u8; y_plane_len * 4];
    yuv_nv12_to_rgba(
        &image,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
        YuvConversionMode::Balanced,
    )
    .map_err(|err| anyhow!("NV12→RGBA failed: {err:?}"))?;

    Ok(rgba)
}

fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    ensure_len("YUYV", data, pixel_count(width, height) * 2)?;

    let packed = YuvPackedImage {
        yuy: data,
        yuy_stride: width * 2,
        width,
        height,
    };

    let mut rgba = vec![0u8; pixel_count(width, height) * 4];
    yuyv422_to_rgba(
        &packed,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
    )
    .map_err(|err| anyhow!("YUYV422→RGBA failed: {err:?}"))?;

    Ok(rgba)
}

/// Decodes an MJPEG payload. The encoded stream's own size wins over what the
/// driver reported, so the returned dimensions may differ from the inputs.
fn mjpeg_to_rgba(data: &[u8], width: u32, height: u32) -> Result<(Vec<u8>, u32, u32)> {
    let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::RGBA);
    let mut decoder = JpegDecoder::new_with_options(ZCursor::new(data), options);
    let rgba = decoder
        .decode()
        .map_err(|err| anyhow!("MJPEG decode failed: {err:?}"))?;

    let (width, height) = decoder
        .info()
        .map(|info| (info.width as u32, info.height as u32))
        .unwrap_or((width, height));

    let expected_len = usize::try_from(u64::from(width) * u64::from(height) * 4)
        .map_err(|_| anyhow!("MJPEG dimensions do not fit usize"))?;
    ensure_len("MJPEG decoded", &rgba, expected_len)?;

    Ok((rgba, width, height))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PackedLayout {
    Rgb,
    Bgr,
    Gray,
}

impl PackedLayout {
    fn bytes_per_pixel(self) -> usize {
        match self {
            PackedLayout::Rgb | PackedLayout::Bgr => 3,
            PackedLayout::Gray => 1,
        }
    }
}

fn packed_to_rgba(data: &[u8], width: u32, height: u32, layout: PackedLayout) -> Result<Vec<u8>> {
    let bpp = layout.bytes_per_pixel();
    let pixels = pixel_count(width, height);
    ensure_len(
        match layout {
            PackedLayout::Rgb => "RGB",
            PackedLayout::Bgr => "BGR",
            PackedLayout::Gray => "GRAY",
        },
        data,
        pixels * bpp,
    )?;

    let mut rgba = vec![0u8; pixels * 4];
    rgba.par_chunks_exact_mut(4)
        .zip(data[..pixels * bpp].par_chunks_exact(bpp))
        .for_each(|(dst, src)| {
            let [r, g, b] = match layout {
                PackedLayout::Rgb => [src[0], src[1], src[2]],
                PackedLayout::Bgr => [src[2], src[1], src[0]],
                PackedLayout::Gray => [src[0]; 3],
            };
            dst.copy_from_slice(&[r, g, b, 255]);
        });

    Ok(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgr_swaps_red_and_blue() {
        let frame = convert_to_frame(PixelFormat::Bgr, &[10, 20, 30, 1, 2, 3], 2, 1).unwrap();
        assert_eq!(frame.rgba, vec![30, 20, 10, 255, 3, 2, 1, 255]);
        assert_eq!(frame.size(), (2, 1));
    }

    #[test]
    fn gray_replicates_channels() {
        let frame = convert_to_frame(PixelFormat::Gray, &[9, 200], 1, 2).unwrap();
        assert_eq!(frame.rgba, vec![9, 9, 9, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn short_buffers_are_rejected() {
        assert!(convert_to_frame(PixelFormat::Rgb, &[1, 2, 3], 2, 1).is_err());
        assert!(convert_to_frame(PixelFormat::Yuyv, &[0; 4], 4, 4).is_err());
        assert!(convert_to_frame(PixelFormat::Nv12, &[0; 10], 4, 4).is_err());
    }

    #[test]
    fn yuyv_mid_gray_stays_gray() {
        // Two pixels: Y0 U Y1 V with neutral chroma.
        let frame = convert_to_frame(PixelFormat::Yuyv, &[128, 128, 128, 128], 2, 1).unwrap();
        for px in frame.rgba.chunks_exact(4) {
            for channel in &px[..3] {
                assert!(channel.abs_diff(128) <= 2, "channel {channel}");
            }
            assert_eq!(px[3], 255);
        }
    }
}

use anyhow::{Context, Result, anyhow};
use nokhwa::{
    Buffer, Camera,
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType},
};

use super::rgba_converter::{self, PixelFormat};
use crate::{config::CameraConfig, types::Frame};

// Prefer pixel formats that are widely supported on macOS (the built-in cameras
// often reject YUYV even though Nokhwa reports it).
const PREFERRED_PIXEL_FORMATS: &[FrameFormat] = &[
    FrameFormat::MJPEG,
    FrameFormat::YUYV,
    FrameFormat::NV12,
    FrameFormat::RAWRGB,
    FrameFormat::RAWBGR,
    FrameFormat::GRAY,
];

fn requested_formats(config: &CameraConfig) -> [RequestedFormat<'static>; 3] {
    let wanted = CameraFormat::new_from(config.width, config.height, FrameFormat::MJPEG, config.fps);
    [
        RequestedFormat::with_formats(
            RequestedFormatType::Closest(wanted),
            PREFERRED_PIXEL_FORMATS,
        ),
        RequestedFormat::with_formats(
            RequestedFormatType::AbsoluteHighestFrameRate,
            PREFERRED_PIXEL_FORMATS,
        ),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
    ]
}

/// Blocking capture from a single device. The stream is stopped on drop.
pub struct CameraCapture {
    camera: Camera,
}

impl CameraCapture {
    pub fn open(config: &CameraConfig) -> Result<Self> {
        let index = CameraIndex::Index(config.index);
        let mut last_err = None;

        for requested in requested_formats(config) {
            match Camera::new(index.clone(), requested) {
                Ok(mut camera) => match camera.open_stream() {
                    Ok(()) => {
                        let format = camera.camera_format();
                        log::info!(
                            "camera {} streaming {}x{} {:?} @ {}fps",
                            config.index,
                            format.width(),
                            format.height(),
                            format.format(),
                            format.frame_rate()
                        );
                        return Ok(Self { camera });
                    }
                    Err(err) => last_err = Some(err.into()),
                },
                Err(err) => last_err = Some(err.into()),
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("failed to open camera with any supported format")))
            .with_context(|| format!("failed to open camera {}", config.index))
    }

    /// Blocks until the next frame arrives and converts it to RGBA.
    pub fn read(&mut self) -> Result<Frame> {
        let buffer = self.camera.frame().context("camera frame read failed")?;
        convert_buffer(&buffer)
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        if let Err(err) = self.camera.stop_stream() {
            log::warn!("failed to stop camera stream: {err:?}");
        }
    }
}

fn convert_buffer(buffer: &Buffer) -> Result<Frame> {
    let resolution = buffer.resolution();
    let format = match buffer.source_frame_format() {
        FrameFormat::NV12 => PixelFormat::Nv12,
        FrameFormat::YUYV => PixelFormat::Yuyv,
        FrameFormat::MJPEG => PixelFormat::Mjpeg,
        FrameFormat::RAWRGB => PixelFormat::Rgb,
        FrameFormat::RAWBGR => PixelFormat::Bgr,
        FrameFormat::GRAY => PixelFormat::Gray,
    };

    rgba_converter::convert_to_frame(
        format,
        buffer.buffer(),
        resolution.width_x,
        resolution.height_y,
    )
    .context("failed to decode camera frame")
}

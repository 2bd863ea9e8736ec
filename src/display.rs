use anyhow::{Context, Result};
use minifb::{Key, Window, WindowOptions};

use crate::types::Frame;

const TARGET_FPS: usize = 60;

/// On-screen window showing annotated frames. Closes on `q` or when the user
/// closes it.
pub struct Display {
    window: Window,
    buffer: Vec<u32>,
}

impl Display {
    pub fn open(title: &str, width: u32, height: u32) -> Result<Self> {
        let mut window = Window::new(
            title,
            width as usize,
            height as usize,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )
        .with_context(|| format!("failed to open window \"{title}\""))?;
        window.set_target_fps(TARGET_FPS);

        Ok(Self {
            window,
            buffer: Vec::new(),
        })
    }

    pub fn show(&mut self, frame: &Frame) -> Result<()> {
        rgba_to_0rgb(&frame.rgba, &mut self.buffer);
        self.window
            .update_with_buffer(&self.buffer, frame.width as usize, frame.height as usize)
            .context("failed to present frame")
    }

    /// Polled once per frame, after [`Display::show`].
    pub fn should_close(&self) -> bool {
        !self.window.is_open() || self.window.is_key_down(Key::Q)
    }
}

fn rgba_to_0rgb(rgba: &[u8], out: &mut Vec<u32>) {
    out.clear();
    out.extend(
        rgba.chunks_exact(4)
            .map(|px| u32::from_be_bytes([0, px[0], px[1], px[2]])),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_rgb_into_low_bytes() {
        let mut out = vec![7];
        rgba_to_0rgb(&[0x12, 0x34, 0x56, 0xff, 1, 2, 3, 0], &mut out);
        assert_eq!(out, vec![0x0012_3456, 0x0001_0203]);
    }
}

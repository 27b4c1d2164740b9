// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Decoder adapter: camera frame in, QR text out.
//!
//! "No code in this frame" is the normal per-frame result and is `None`, not
//! an error.

/// Largest accepted frame side, in pixels.
pub const MAX_FRAME_SIDE: u32 = 4096;

/// Errors constructing a frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame dimensions must be non-zero")]
    Empty,
    #[error("frame {width}x{height} exceeds {MAX_FRAME_SIDE} pixels per side")]
    TooLarge { width: u32, height: u32 },
    #[error("RGBA buffer is {actual} bytes, expected {expected} for {width}x{height}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// One still video frame as tightly packed RGBA bytes.
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::Empty);
        }

        if width > MAX_FRAME_SIDE || height > MAX_FRAME_SIDE {
            return Err(FrameError::TooLarge { width, height });
        }

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or(FrameError::TooLarge { width, height })?;
        if rgba.len() != expected {
            return Err(FrameError::SizeMismatch {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }

        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Luma of the pixel at (x, y), ignoring alpha.
    fn luma(&self, x: usize, y: usize) -> u8 {
        let i = (y * self.width as usize + x) * 4;
        let (r, g, b) = (
            self.rgba[i] as u32,
            self.rgba[i + 1] as u32,
            self.rgba[i + 2] as u32,
        );
        ((r * 299 + g * 587 + b * 114) / 1000) as u8
    }
}

/// Anything that can find a text payload in a frame.
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, frame: &Frame) -> Option<String>;
}

/// QR decoder backed by `rqrr`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrDecoder;

impl FrameDecoder for QrDecoder {
    fn decode(&self, frame: &Frame) -> Option<String> {
        let mut image = rqrr::PreparedImage::prepare_from_greyscale(
            frame.width as usize,
            frame.height as usize,
            |x, y| frame.luma(x, y),
        );

        image
            .detect_grids()
            .into_iter()
            .find_map(|grid| match grid.decode() {
                Ok((_meta, content)) => Some(content),
                Err(e) => {
                    tracing::debug!(error = ?e, "QR grid found but not decodable");
                    None
                }
            })
    }
}

use bincode::{Decode, Encode};

/// One framebuffer pixel, laid out so that a `&[Color]` slice can be handed
/// to hosts as raw RGBA bytes via `bytemuck::cast_slice`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable, Encode, Decode)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    #[must_use]
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl Default for Color {
    #[inline]
    fn default() -> Self {
        Self::rgb(0, 0, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub enum TimingMode {
    #[default]
    Ntsc,
    Pal,
}

/// Receives one completed frame per video frame.
///
/// The buffer is row-major, `frame_size.width * frame_size.height` pixels
/// long, and only valid for the duration of the call.
pub trait FrameSink {
    fn frame_ready(&mut self, frame_buffer: &[Color], frame_size: FrameSize);
}

impl<F: FnMut(&[Color], FrameSize)> FrameSink for F {
    fn frame_ready(&mut self, frame_buffer: &[Color], frame_size: FrameSize) {
        self(frame_buffer, frame_size);
    }
}

/// A sink that discards every frame; useful for headless fast-forwarding.
pub fn null_frame_sink() -> impl FnMut(&[Color], FrameSize) {
    |_, _| {}
}

//! Host interface
//!
//! The machine core owns no window, mixer or clock; everything that
//! leaves the simulation goes through this trait. Callbacks fire only
//! at instruction boundaries, so the machine is always in a consistent
//! state when the host looks at it.

use std::time::Duration;

use crate::video::{Rgb, Video};

/// A borrowed view of the buffer the machine wants shown.
pub struct FrameView<'a> {
    pub(crate) video: &'a Video,
    pub(crate) buffer: usize,
}

impl FrameView<'_> {
    /// The resolved buffer index (0..=3).
    pub fn buffer_id(&self) -> u8 {
        self.buffer as u8
    }

    /// Paint the frame into a 320x200 24-bit surface through the active
    /// palette. Before the program selects its first palette this paints
    /// nothing; the original renders several frames in that state.
    pub fn render_to_surface(&self, surface: &mut [Rgb]) {
        self.video.render_to_surface(self.buffer, surface);
    }
}

/// What the machine needs from its surroundings.
///
/// Only frame presentation is mandatory; the audio hooks default to
/// no-ops so a silent host stays trivial.
pub trait Host {
    /// A frame is ready. The host should show it after `delay` (derived
    /// from the frame-duration register) to pace the simulation.
    fn buffer_ready(&mut self, frame: FrameView<'_>, delay: Duration);

    /// The currently shown buffer was redrawn outside the normal
    /// present path (a fill, copy or bitmap load hit the front buffer).
    fn buffer_changed(&mut self, frame: FrameView<'_>) {
        let _ = frame;
    }

    /// Play a sound sample on a channel. `data` is the raw sample
    /// resource; it stays valid for the duration of the call only.
    fn play_sound(&mut self, data: &[u8], frequency_hz: u16, volume: u8, channel: u8) {
        let _ = (data, frequency_hz, volume, channel);
    }

    /// Stop whatever plays on a channel.
    fn stop_channel(&mut self, channel: u8) {
        let _ = channel;
    }

    /// Start a music track at `position` with tempo `delay`.
    fn play_music(&mut self, data: &[u8], delay: u16, position: u8) {
        let _ = (data, delay, position);
    }

    /// Retune the tempo of the playing track.
    fn set_music_delay(&mut self, delay: u16) {
        let _ = delay;
    }

    fn stop_music(&mut self) {}
}

/// Host that ignores everything; for tests and headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl Host for NullHost {
    fn buffer_ready(&mut self, _frame: FrameView<'_>, _delay: Duration) {}
}

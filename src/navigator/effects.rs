//! Requests produced by the navigator for the host to carry out.

use alloc::vec::Vec;

use tracing::trace;

/// Everything one navigator entry point asks of the host, in the order it
/// should be carried out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    /// Snapshot of the selections, taken on first entry to the final page.
    pub finalized: Option<Vec<Vec<u32>>>,
    /// Stop any clip still playing before queueing new ones.
    pub stop: bool,
    /// Clips to queue, in order.
    pub clips: Vec<u32>,
    /// The screen to show, if it should be redrawn.
    pub frame: Option<Frame>,
    /// The outcome of a binding's selection steps.
    pub outcome: Option<Outcome>,
}

impl Effects {
    pub(crate) fn play(&mut self, clip_i: u32) {
        trace!(clip = clip_i, "requested clip");
        self.clips.push(clip_i);
    }

    /// Hand each request to the matching sink.
    pub fn publish(
        &self,
        audio: &mut dyn AudioSink,
        video: &mut dyn VideoSink,
        recorder: &mut dyn Recorder,
    ) {
        if let Some(selections) = &self.finalized {
            recorder.record(selections);
        }

        if self.stop {
            audio.stop();
        }
        for &clip_i in &self.clips {
            audio.play(clip_i);
        }

        if let Some(frame) = &self.frame {
            video.show(frame.layout_i);
            for paste in &frame.pastes {
                video.paste(paste.sprite_i, paste.slot_i);
            }
        }
    }
}

/// A page's screen with sprites pasted over its slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub layout_i: u32,
    pub pastes: Vec<Paste>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paste {
    pub sprite_i: u32,
    pub slot_i: u32,
}

/// Result of applying selection steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The steps took effect as requested.
    Default,
    /// Nothing changed: the option was already in the requested state.
    NoEffect,
    /// A toggle removed the option.
    ToggleOff,
    /// The group had no room for another selection.
    Full,
    /// The group was empty beforehand.
    Empty,
}

/// Receives audio requests.
pub trait AudioSink {
    /// Stop any clip in progress and discard queued clips.
    fn stop(&mut self) {}
    /// Queue a clip after any already queued.
    fn play(&mut self, _clip_i: u32) {}
}

/// Receives display requests.
pub trait VideoSink {
    /// Show the screen of a layout, replacing everything pasted before.
    fn show(&mut self, _layout_i: u32) {}
    /// Paste a sprite into a slot of the current layout.
    fn paste(&mut self, _sprite_i: u32, _slot_i: u32) {}
}

/// Receives the selections once voting ends.
pub trait Recorder {
    fn record(&mut self, _selections: &[Vec<u32>]) {}
}

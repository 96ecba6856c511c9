//! Frame timing for animated media

use std::time::Duration;

/// GIF frames with no delay play at this rate, like browsers do.
const ZERO_DELAY_FALLBACK: Duration = Duration::from_millis(100);
/// Shortest delay honoured between frames.
const MIN_FRAME_DELAY: Duration = Duration::from_millis(20);

/// Looping playback over a sequence of per-frame delays.
#[derive(Debug, Clone)]
pub struct Animation {
    delays: Vec<Duration>,
    current_frame: usize,
    /// Time spent on the current frame, in seconds
    time_accumulator: f32,
    playing: bool,
}

impl Animation {
    pub fn new(delays: impl IntoIterator<Item = Duration>) -> Self {
        let delays = delays
            .into_iter()
            .map(|delay| {
                if delay.is_zero() {
                    ZERO_DELAY_FALLBACK
                } else {
                    delay.max(MIN_FRAME_DELAY)
                }
            })
            .collect();

        Self {
            delays,
            current_frame: 0,
            time_accumulator: 0.0,
            playing: true,
        }
    }

    /// Advance by `delta` seconds. Returns true when the visible frame changed.
    pub fn update(&mut self, delta: f32) -> bool {
        if !self.playing || self.delays.len() <= 1 {
            return false;
        }

        let start = self.current_frame;
        self.time_accumulator += delta;

        loop {
            let frame_duration = self.delays[self.current_frame].as_secs_f32();
            if self.time_accumulator < frame_duration {
                break;
            }
            self.time_accumulator -= frame_duration;
            self.current_frame = (self.current_frame + 1) % self.delays.len();
        }

        self.current_frame != start
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn frame_count(&self) -> usize {
        self.delays.len()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn start(&mut self) {
        self.playing = true;
    }

    /// Time left until the next frame is due.
    pub fn time_to_next_frame(&self) -> Option<Duration> {
        if !self.playing || self.delays.len() <= 1 {
            return None;
        }
        let remaining = self.delays[self.current_frame].as_secs_f32() - self.time_accumulator;
        Some(Duration::from_secs_f32(remaining.max(0.0)))
    }
}

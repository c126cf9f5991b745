//! Playback position over a composition's frame range.
//!
//! The controller is a pure state machine: hosts feed it elapsed time and
//! receive the new frame plus the events that happened on the way, in a
//! fixed order. Nothing is pushed to listeners.

use crate::composition::Timeline;
use crate::config::PlaybackConfig;
use serde::{Deserialize, Serialize};

/// What happens when playback runs past a bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    /// Jump back to the opposite bound and keep the direction.
    #[default]
    Restart,
    /// Bounce off the bound and play the other way.
    Reverse,
}

/// Repeats after the first play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatCount {
    #[default]
    Infinite,
    Times(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Playback crossed a bound `crossings` times during one advance.
    Repeat { crossings: u32 },
    /// The repeat budget ran out; playback stopped at a bound.
    Completed,
}

/// Result of [`ProgressController::advance`].
#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    pub frame: f32,
    /// At most one `Repeat`, then at most one `Completed`.
    pub events: Vec<PlaybackEvent>,
}

impl Advance {
    pub fn completed(&self) -> bool {
        self.events.contains(&PlaybackEvent::Completed)
    }

    pub fn repeats(&self) -> u32 {
        self.events
            .iter()
            .map(|e| match e {
                PlaybackEvent::Repeat { crossings } => *crossings,
                PlaybackEvent::Completed => 0,
            })
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct ProgressController {
    timeline: Timeline,
    frame: f32,
    min_frame: f32,
    max_frame: f32,
    speed: f32,
    /// +1 or -1; flipped by `Reverse` repeats. The sign of `speed` applies on top.
    direction: f32,
    repeat_mode: RepeatMode,
    repeat_count: RepeatCount,
    repeats_done: u32,
    playing: bool,
}

impl ProgressController {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            frame: timeline.start,
            min_frame: timeline.start,
            max_frame: timeline.end,
            speed: 1.0,
            direction: 1.0,
            repeat_mode: RepeatMode::Restart,
            repeat_count: RepeatCount::Infinite,
            repeats_done: 0,
            playing: false,
        }
    }

    pub fn with_config(timeline: Timeline, config: &PlaybackConfig) -> Self {
        let mut controller = Self::new(timeline);
        controller.speed = config.speed;
        controller.repeat_mode = config.repeat_mode;
        controller.repeat_count = config.repeat_count;
        if config.autoplay {
            controller.play();
        }
        controller
    }

    pub fn frame(&self) -> f32 {
        self.frame
    }

    /// Position through the whole composition, as the renderer consumes it.
    pub fn progress(&self) -> f32 {
        self.timeline.progress(self.frame)
    }

    pub fn min_frame(&self) -> f32 {
        self.min_frame
    }

    pub fn max_frame(&self) -> f32 {
        self.max_frame
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat_mode = mode;
    }

    pub fn repeat_count(&self) -> RepeatCount {
        self.repeat_count
    }

    pub fn set_repeat_count(&mut self, count: RepeatCount) {
        self.repeat_count = count;
    }

    /// Starts from the bound playback heads away from.
    pub fn play(&mut self) {
        self.direction = 1.0;
        self.repeats_done = 0;
        self.frame = if self.heading() < 0.0 {
            self.max_frame
        } else {
            self.min_frame
        };
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Continues from the current frame and direction.
    pub fn resume(&mut self) {
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.direction = 1.0;
        self.repeats_done = 0;
        self.frame = if self.speed < 0.0 {
            self.max_frame
        } else {
            self.min_frame
        };
    }

    pub fn reverse_speed(&mut self) {
        self.speed = -self.speed;
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn set_frame(&mut self, frame: f32) {
        self.frame = frame.clamp(self.min_frame, self.max_frame);
    }

    pub fn set_progress(&mut self, progress: f32) {
        self.set_frame(self.timeline.frame(progress));
    }

    pub fn set_min_frame(&mut self, frame: f32) {
        self.set_min_and_max_frame(frame, self.max_frame);
    }

    pub fn set_max_frame(&mut self, frame: f32) {
        self.set_min_and_max_frame(self.min_frame, frame);
    }

    /// Bounds are kept inside the composition and ordered. The current frame
    /// is clamped into them; direction is left alone.
    pub fn set_min_and_max_frame(&mut self, min: f32, max: f32) {
        let min = min.clamp(self.timeline.start, self.timeline.end);
        let max = max.clamp(min, self.timeline.end);
        self.min_frame = min;
        self.max_frame = max;
        self.frame = self.frame.clamp(min, max);
    }

    pub fn set_min_progress(&mut self, progress: f32) {
        self.set_min_frame(self.progress_frame(progress));
    }

    pub fn set_max_progress(&mut self, progress: f32) {
        self.set_max_frame(self.progress_frame(progress));
    }

    fn progress_frame(&self, progress: f32) -> f32 {
        self.timeline.frame(progress).trunc()
    }

    /// +1 when the frame grows with time.
    fn heading(&self) -> f32 {
        if self.speed < 0.0 {
            -self.direction
        } else {
            self.direction
        }
    }

    fn remaining_repeats(&self) -> Option<u32> {
        match self.repeat_count {
            RepeatCount::Infinite => None,
            RepeatCount::Times(n) => Some(n.saturating_sub(self.repeats_done)),
        }
    }

    /// Moves playback forward by `delta_seconds` of wall time.
    ///
    /// Crossings of the bounds are counted arithmetically, so a long pause
    /// followed by one huge delta reports a single `Repeat` with the total
    /// count instead of one event per skipped cycle.
    pub fn advance(&mut self, delta_seconds: f32) -> Advance {
        let mut events = Vec::new();
        if !self.playing || !(delta_seconds > 0.0) || self.speed == 0.0 {
            return Advance {
                frame: self.frame,
                events,
            };
        }

        let heading = self.heading();
        let step = delta_seconds * self.speed.abs() * self.timeline.frame_rate;
        let next = self.frame + step * heading;
        let (ahead, behind) = if heading > 0.0 {
            (self.max_frame, self.min_frame)
        } else {
            (self.min_frame, self.max_frame)
        };
        let overshoot = (next - ahead) * heading;
        let remaining = self.remaining_repeats();

        if overshoot < 0.0 || (overshoot == 0.0 && remaining != Some(0)) {
            self.frame = next;
            return Advance { frame: next, events };
        }

        let span = self.max_frame - self.min_frame;
        // A zero-length range is crossed once per advance that reaches it.
        let crossings = if span > 0.0 {
            ((overshoot / span).ceil() as u32).max(1)
        } else {
            1
        };

        match remaining {
            Some(budget) if crossings > budget => {
                // Run out the budget, then stop on the bound the last pass heads to.
                let flips = self.repeat_mode == RepeatMode::Reverse && budget % 2 == 1;
                if flips {
                    self.direction = -self.direction;
                }
                self.frame = if flips { behind } else { ahead };
                self.repeats_done = self.repeats_done.saturating_add(budget);
                self.playing = false;
                if budget > 0 {
                    events.push(PlaybackEvent::Repeat { crossings: budget });
                }
                events.push(PlaybackEvent::Completed);
            }
            _ => {
                let rest = (overshoot - (crossings - 1) as f32 * span).clamp(0.0, span);
                self.frame = match self.repeat_mode {
                    RepeatMode::Restart => behind + rest * heading,
                    // Odd counts last bounced off the bound ahead.
                    RepeatMode::Reverse if crossings % 2 == 1 => {
                        self.direction = -self.direction;
                        ahead - rest * heading
                    }
                    RepeatMode::Reverse => behind + rest * heading,
                };
                self.repeats_done = self.repeats_done.saturating_add(crossings);
                events.push(PlaybackEvent::Repeat { crossings });
            }
        }

        tracing::trace!(frame = self.frame, ?events, "advanced playback");
        Advance {
            frame: self.frame,
            events,
        }
    }
}

use std::time::Instant;

use crate::animation::clip::BoundClip;
use crate::foundation::error::{RoomError, RoomResult};
use crate::rig::skeleton::Pose;

/// Playback state of one animated entity.
#[derive(Clone, Debug)]
pub struct AnimationState {
    clip: Option<BoundClip>,
    position: f32,
    rate: f32,
    looping: bool,
}

impl AnimationState {
    /// Start playing `clip` (if any) from time zero.
    pub fn new(clip: Option<BoundClip>, rate: f32, looping: bool) -> Self {
        Self {
            clip,
            position: 0.0,
            rate: if rate.is_finite() { rate.max(0.0) } else { 0.0 },
            looping,
        }
    }

    /// State with no clip; advancing it has no effect.
    pub fn idle() -> Self {
        Self::new(None, 0.0, true)
    }

    /// Current playback position in clip seconds.
    pub fn position(&self) -> f32 {
        self.position
    }

    /// Playback rate multiplier.
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Whether the clip wraps at its end.
    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Clip being played.
    pub fn clip(&self) -> Option<&BoundClip> {
        self.clip.as_ref()
    }

    /// Move the playback position by `delta * rate` seconds.
    ///
    /// Looping clips wrap; other clips hold their final pose.
    pub fn advance(&mut self, delta: f32) -> f32 {
        let Some(clip) = &self.clip else {
            return self.position;
        };
        let duration = clip.duration();
        if duration <= 0.0 || !delta.is_finite() || delta <= 0.0 {
            return self.position;
        }
        let next = self.position + delta * self.rate;
        self.position = if self.looping {
            next.rem_euclid(duration)
        } else {
            next.min(duration)
        };
        self.position
    }

    /// Write the pose at the current position into `pose`.
    pub fn apply(&self, pose: &mut Pose) {
        if let Some(clip) = &self.clip {
            clip.sample_into(self.position, pose);
        }
    }
}

/// Tick source shared by every animated viewport.
#[derive(Clone, Debug)]
pub enum FrameClock {
    /// Deterministic fixed step per tick.
    Fixed {
        /// Seconds per tick.
        step: f32,
        /// Ticks so far.
        frame: u64,
        /// Simulated seconds so far.
        elapsed: f64,
    },
    /// Real elapsed time between ticks.
    Wall {
        /// Instant of the previous tick.
        last: Option<Instant>,
        /// Ticks so far.
        frame: u64,
        /// Simulated seconds so far.
        elapsed: f64,
    },
}

impl FrameClock {
    /// Clock advancing by `step` seconds per tick.
    pub fn fixed(step: f32) -> RoomResult<Self> {
        if !step.is_finite() || step < 0.0 {
            return Err(RoomError::validation("clock step must be finite and >= 0"));
        }
        Ok(Self::Fixed {
            step,
            frame: 0,
            elapsed: 0.0,
        })
    }

    /// Clock advancing by measured wall time; the first tick has zero delta.
    pub fn wall() -> Self {
        Self::Wall {
            last: None,
            frame: 0,
            elapsed: 0.0,
        }
    }

    /// Advance one tick and return its delta in seconds.
    pub fn tick(&mut self) -> f32 {
        match self {
            Self::Fixed {
                step,
                frame,
                elapsed,
            } => {
                *frame += 1;
                *elapsed += f64::from(*step);
                *step
            }
            Self::Wall {
                last,
                frame,
                elapsed,
            } => {
                let now = Instant::now();
                let delta = last.map_or(0.0, |prev| now.duration_since(prev).as_secs_f32());
                *last = Some(now);
                *frame += 1;
                *elapsed += f64::from(delta);
                delta
            }
        }
    }

    /// Number of ticks so far.
    pub fn frame(&self) -> u64 {
        match self {
            Self::Fixed { frame, .. } | Self::Wall { frame, .. } => *frame,
        }
    }

    /// Total simulated seconds so far.
    pub fn elapsed(&self) -> f64 {
        match self {
            Self::Fixed { elapsed, .. } | Self::Wall { elapsed, .. } => *elapsed,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/driver.rs"]
mod tests;

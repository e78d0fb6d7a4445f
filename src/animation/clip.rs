//! Keyframed bone animation clips.
//!
//! Clips name their target bones; [`AnimationClip::bind`] resolves those names once against a
//! skeleton so sampling is a straight indexed pass.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::foundation::core::{Quat, Vec3};
use crate::foundation::error::{RoomError, RoomResult};
use crate::rig::skeleton::{Pose, Skeleton};

/// Keyframe interpolation mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Linear (slerp for rotations).
    #[default]
    Linear,
    /// Hold the previous keyframe.
    Step,
}

/// Keyframe values of one channel.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelValues {
    /// Local translations.
    Translation(Vec<Vec3>),
    /// Local rotations, `[x, y, z, w]`.
    Rotation(Vec<Quat>),
    /// Local scales.
    Scale(Vec<Vec3>),
}

impl ChannelValues {
    fn len(&self) -> usize {
        match self {
            Self::Translation(v) | Self::Scale(v) => v.len(),
            Self::Rotation(v) => v.len(),
        }
    }
}

/// Keyframes driving one property of one bone.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    /// Target bone name.
    pub bone: String,
    /// Keyframe times in seconds, strictly increasing.
    pub times: Vec<f32>,
    /// Keyframe values, one per time.
    pub values: ChannelValues,
    /// Interpolation between keyframes.
    pub interpolation: Interpolation,
}

/// Named set of channels with a common duration.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    name: String,
    channels: Vec<Channel>,
    duration: f32,
}

impl AnimationClip {
    /// Validate channels and derive the clip duration from the last keyframe.
    pub fn new(name: impl Into<String>, channels: Vec<Channel>) -> RoomResult<Self> {
        let name = name.into();
        let mut duration = 0.0f32;
        for ch in &channels {
            if ch.times.is_empty() {
                return Err(RoomError::validation(format!(
                    "clip '{name}': channel for '{}' has no keyframes",
                    ch.bone
                )));
            }
            if ch.times.len() != ch.values.len() {
                return Err(RoomError::validation(format!(
                    "clip '{name}': channel for '{}' has {} times but {} values",
                    ch.bone,
                    ch.times.len(),
                    ch.values.len()
                )));
            }
            if ch.times.iter().any(|t| !t.is_finite() || *t < 0.0)
                || ch.times.windows(2).any(|w| w[1] <= w[0])
            {
                return Err(RoomError::validation(format!(
                    "clip '{name}': channel for '{}' needs finite, increasing times",
                    ch.bone
                )));
            }
            if let Some(&last) = ch.times.last() {
                duration = duration.max(last);
            }
        }
        Ok(Self {
            name,
            channels,
            duration,
        })
    }

    /// Clip name as authored.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All channels.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Time of the last keyframe over all channels.
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Resolve channel targets against `skeleton`. Channels naming unknown bones are dropped.
    pub fn bind(self: &Arc<Self>, skeleton: &Skeleton) -> BoundClip {
        let mut targets = Vec::with_capacity(self.channels.len());
        let mut skipped = 0usize;
        for (ci, ch) in self.channels.iter().enumerate() {
            match skeleton.bone_index(&ch.bone) {
                Some(bone) => targets.push((ci, bone)),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(clip = %self.name, skipped, "clip channels target unknown bones");
        }
        BoundClip {
            clip: Arc::clone(self),
            targets,
        }
    }
}

/// A clip whose channels are resolved to bone indices of one skeleton.
#[derive(Clone, Debug)]
pub struct BoundClip {
    clip: Arc<AnimationClip>,
    targets: Vec<(usize, usize)>,
}

impl BoundClip {
    /// Underlying clip.
    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    /// Duration of the underlying clip.
    pub fn duration(&self) -> f32 {
        self.clip.duration
    }

    /// Number of channels that reached a bone.
    pub fn bound_channels(&self) -> usize {
        self.targets.len()
    }

    /// Write sampled values at `time` into `pose`. Untargeted bones are left as they are.
    pub fn sample_into(&self, time: f32, pose: &mut Pose) {
        for &(ci, bone) in &self.targets {
            let ch = &self.clip.channels[ci];
            let Some(local) = pose.local_mut(bone) else {
                continue;
            };
            let (i, f) = keyframe_span(&ch.times, time, ch.interpolation);
            match &ch.values {
                ChannelValues::Translation(v) => local.translation = lerp_at(v, i, f),
                ChannelValues::Scale(v) => local.scale = lerp_at(v, i, f),
                ChannelValues::Rotation(v) => local.rotation = slerp_at(v, i, f),
            }
        }
    }
}

/// Keyframe index and blend factor toward the next keyframe.
fn keyframe_span(times: &[f32], t: f32, interpolation: Interpolation) -> (usize, f32) {
    let last = times.len().saturating_sub(1);
    if times.is_empty() || t <= times[0] {
        return (0, 0.0);
    }
    if t >= times[last] {
        return (last, 0.0);
    }
    let next = times.partition_point(|&k| k <= t);
    let i = next - 1;
    match interpolation {
        Interpolation::Step => (i, 0.0),
        Interpolation::Linear => {
            let span = times[next] - times[i];
            (i, ((t - times[i]) / span).clamp(0.0, 1.0))
        }
    }
}

fn lerp_at(values: &[Vec3], i: usize, f: f32) -> Vec3 {
    match (values.get(i), values.get(i + 1)) {
        (Some(a), Some(b)) if f > 0.0 => a.lerp(*b, f),
        (Some(a), _) => *a,
        _ => Vec3::ZERO,
    }
}

fn slerp_at(values: &[Quat], i: usize, f: f32) -> Quat {
    match (values.get(i), values.get(i + 1)) {
        (Some(a), Some(b)) if f > 0.0 => a.slerp(*b, f).normalize(),
        (Some(a), _) => a.normalize(),
        _ => Quat::IDENTITY,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/clip.rs"]
mod tests;

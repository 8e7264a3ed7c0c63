use glam::{Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Linear,
    Step,
}

#[derive(Debug, Clone)]
pub enum ChannelValues {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

/// One animated property of one node.
#[derive(Debug, Clone)]
pub struct Channel {
    pub node: usize,
    pub interpolation: Interpolation,
    pub times: Vec<f32>,
    pub values: ChannelValues,
}

/// A sampled channel value, ready to be written onto a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelSample {
    Translation(Vec3),
    Rotation(Quat),
    Scale(Vec3),
}

/// Named, time-bounded animation track. Immutable once produced by an importer.
#[derive(Debug, Clone)]
pub struct Clip {
    pub name: String,
    pub duration: f32,
    pub channels: Vec<Channel>,
}

impl Clip {
    pub fn new(name: impl Into<String>, channels: Vec<Channel>) -> Self {
        let duration = channels
            .iter()
            .filter_map(|channel| channel.times.last().copied())
            .fold(0.0f32, f32::max);
        Self {
            name: name.into(),
            duration,
            channels,
        }
    }

    /// Samples every channel at `time`, clamped to the clip range.
    pub fn sample(&self, time: f32) -> Vec<(usize, ChannelSample)> {
        let time = time.clamp(0.0, self.duration);
        self.channels
            .iter()
            .filter_map(|channel| channel.sample(time).map(|sample| (channel.node, sample)))
            .collect()
    }
}

impl Channel {
    fn len(&self) -> usize {
        let values = match &self.values {
            ChannelValues::Translation(v) | ChannelValues::Scale(v) => v.len(),
            ChannelValues::Rotation(v) => v.len(),
        };
        values.min(self.times.len())
    }

    pub fn sample(&self, time: f32) -> Option<ChannelSample> {
        let count = self.len();
        if count == 0 {
            return None;
        }
        let (lo, hi, t) = keyframe_span(&self.times[..count], time);
        let t = match self.interpolation {
            Interpolation::Step => 0.0,
            Interpolation::Linear => t,
        };
        Some(match &self.values {
            ChannelValues::Translation(v) => ChannelSample::Translation(v[lo].lerp(v[hi], t)),
            ChannelValues::Scale(v) => ChannelSample::Scale(v[lo].lerp(v[hi], t)),
            ChannelValues::Rotation(v) => ChannelSample::Rotation(v[lo].slerp(v[hi], t).normalize()),
        })
    }
}

fn keyframe_span(times: &[f32], time: f32) -> (usize, usize, f32) {
    let last = times.len() - 1;
    if time <= times[0] {
        return (0, 0, 0.0);
    }
    if time >= times[last] {
        return (last, last, 0.0);
    }
    let hi = times.partition_point(|&k| k <= time).min(last);
    let lo = hi.saturating_sub(1);
    let span = times[hi] - times[lo];
    let t = if span > f32::EPSILON {
        (time - times[lo]) / span
    } else {
        0.0
    };
    (lo, hi, t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(node: usize, interpolation: Interpolation) -> Channel {
        Channel {
            node,
            interpolation,
            times: vec![0.0, 1.0, 2.0],
            values: ChannelValues::Translation(vec![
                Vec3::ZERO,
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(3.0, 0.0, 0.0),
            ]),
        }
    }

    #[test]
    fn duration_is_last_keyframe() {
        let clip = Clip::new("slide", vec![slide(0, Interpolation::Linear)]);
        assert_eq!(clip.duration, 2.0);
    }

    #[test]
    fn linear_sampling_interpolates_between_keys() {
        let clip = Clip::new("slide", vec![slide(0, Interpolation::Linear)]);
        let samples = clip.sample(1.5);
        assert_eq!(samples.len(), 1);
        match samples[0].1 {
            ChannelSample::Translation(v) => assert!((v.x - 2.0).abs() < 1e-6),
            _ => panic!("expected translation"),
        }
    }

    #[test]
    fn step_sampling_holds_previous_key() {
        let clip = Clip::new("slide", vec![slide(0, Interpolation::Step)]);
        match clip.sample(1.9)[0].1 {
            ChannelSample::Translation(v) => assert_eq!(v.x, 1.0),
            _ => panic!("expected translation"),
        }
    }

    #[test]
    fn sampling_past_the_end_clamps_to_last_frame() {
        let clip = Clip::new("slide", vec![slide(0, Interpolation::Linear)]);
        match clip.sample(50.0)[0].1 {
            ChannelSample::Translation(v) => assert_eq!(v.x, 3.0),
            _ => panic!("expected translation"),
        }
    }
}

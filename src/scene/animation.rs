use crate::assets::{ChannelSample, Clip};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    Empty,
    Idle,
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Playback {
    Stopped,
    Playing { clip: usize, time: f32 },
}

/// Drives at most one clip of the installed model. Playback clamps at the end.
#[derive(Debug)]
pub struct AnimationRig {
    clips: Vec<Arc<Clip>>,
    playback: Playback,
}

impl Default for AnimationRig {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationRig {
    pub fn new() -> Self {
        Self {
            clips: Vec::new(),
            playback: Playback::Stopped,
        }
    }

    /// Replaces the clip set and stops playback.
    pub fn bind(&mut self, clips: Vec<Arc<Clip>>) {
        log::debug!("animation rig bound to {} clip(s)", clips.len());
        self.clips = clips;
        self.playback = Playback::Stopped;
    }

    pub fn state(&self) -> AnimationState {
        match self.playback {
            _ if self.clips.is_empty() => AnimationState::Empty,
            Playback::Stopped => AnimationState::Idle,
            Playback::Playing { .. } => AnimationState::Playing,
        }
    }

    pub fn clips(&self) -> &[Arc<Clip>] {
        &self.clips
    }

    pub fn clip_names(&self) -> Vec<&str> {
        self.clips.iter().map(|clip| clip.name.as_str()).collect()
    }

    /// Starts `index` from time zero, replacing whatever was playing.
    pub fn play(&mut self, index: usize) -> bool {
        let Some(clip) = self.clips.get(index) else {
            log::debug!("no animation clip at index {}", index);
            return false;
        };
        log::info!("playing animation '{}' ({:.2}s)", clip.name, clip.duration);
        self.playback = Playback::Playing {
            clip: index,
            time: 0.0,
        };
        true
    }

    pub fn play_named(&mut self, name: &str) -> bool {
        match self.clips.iter().position(|clip| clip.name == name) {
            Some(index) => self.play(index),
            None => {
                log::debug!("no animation clip named '{}'", name);
                false
            }
        }
    }

    pub fn stop_all(&mut self) {
        self.playback = Playback::Stopped;
    }

    pub fn current_clip(&self) -> Option<&Arc<Clip>> {
        match self.playback {
            Playback::Playing { clip, .. } => self.clips.get(clip),
            Playback::Stopped => None,
        }
    }

    pub fn time(&self) -> Option<f32> {
        match self.playback {
            Playback::Playing { time, .. } => Some(time),
            Playback::Stopped => None,
        }
    }

    /// Advances by wall-clock `dt` seconds and returns the pose to apply.
    pub fn tick(&mut self, dt: f32) -> Option<Vec<(usize, ChannelSample)>> {
        let Playback::Playing { clip, time } = self.playback else {
            return None;
        };
        let clip_data = self.clips.get(clip)?;
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let next = (time + dt).min(clip_data.duration);
        self.playback = Playback::Playing { clip, time: next };
        Some(clip_data.sample(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{Channel, ChannelValues, Interpolation};
    use glam::Vec3;

    fn slide(name: &str, node: usize) -> Arc<Clip> {
        Arc::new(Clip::new(
            name,
            vec![Channel {
                node,
                interpolation: Interpolation::Linear,
                times: vec![0.0, 1.0],
                values: ChannelValues::Translation(vec![Vec3::ZERO, Vec3::X]),
            }],
        ))
    }

    #[test]
    fn state_follows_binding() {
        let mut rig = AnimationRig::new();
        assert_eq!(rig.state(), AnimationState::Empty);
        assert!(!rig.play(0));
        rig.bind(vec![slide("a", 0)]);
        assert_eq!(rig.state(), AnimationState::Idle);
        assert!(rig.play(0));
        assert_eq!(rig.state(), AnimationState::Playing);
        rig.bind(Vec::new());
        assert_eq!(rig.state(), AnimationState::Empty);
    }

    #[test]
    fn newer_play_wins() {
        let mut rig = AnimationRig::new();
        rig.bind(vec![slide("a", 0), slide("b", 1)]);
        rig.play(0);
        rig.tick(0.3);
        assert!(rig.play_named("b"));
        let pose = rig.tick(0.25).unwrap();
        assert_eq!(rig.current_clip().unwrap().name, "b");
        assert!((rig.time().unwrap() - 0.25).abs() < 1e-6);
        assert!(pose.iter().all(|(node, _)| *node == 1));
    }

    #[test]
    fn stop_all_prevents_advancing() {
        let mut rig = AnimationRig::new();
        rig.bind(vec![slide("a", 0)]);
        rig.play(0);
        rig.stop_all();
        assert_eq!(rig.tick(0.5), None);
        assert_eq!(rig.time(), None);
        assert_eq!(rig.state(), AnimationState::Idle);
    }

    #[test]
    fn playback_clamps_at_last_frame() {
        let mut rig = AnimationRig::new();
        rig.bind(vec![slide("a", 0)]);
        rig.play(0);
        rig.tick(0.75);
        let pose = rig.tick(5.0).unwrap();
        assert_eq!(rig.time(), Some(1.0));
        assert_eq!(pose, vec![(0, ChannelSample::Translation(Vec3::X))]);
        assert_eq!(rig.state(), AnimationState::Playing);
    }
}

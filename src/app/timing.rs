use std::time::{Duration, Instant};

/// Wall-clock frame cadence; `frame_dt` drives animation.
pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    last_stats_time: Option<Instant>,
    frame_count: u32,
    pub frame_dt: f32,
    fps: f32,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTiming {
    pub fn new() -> Self {
        Self {
            last_frame_time: None,
            last_stats_time: None,
            frame_count: 0,
            frame_dt: 1.0 / 60.0,
            fps: 0.0,
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Records a frame at `now` and returns the elapsed seconds since the previous one.
    pub fn update(&mut self, now: Instant) -> f32 {
        let dt_duration = if let Some(last) = self.last_frame_time {
            now.saturating_duration_since(last)
        } else {
            Duration::from_millis(16)
        };
        self.last_frame_time = Some(now);
        self.frame_dt = dt_duration.as_secs_f32().max(0.0);

        self.frame_count = self.frame_count.saturating_add(1);
        let stats_start = *self.last_stats_time.get_or_insert(now);
        let elapsed = now.saturating_duration_since(stats_start);
        if elapsed.as_secs_f32() >= 0.5 {
            self.fps = self.frame_count as f32 / elapsed.as_secs_f32();
            log::debug!(
                "{:.1} fps (cadence {:.2} ms)",
                self.fps,
                self.frame_dt * 1000.0
            );
            self.frame_count = 0;
            self.last_stats_time = Some(now);
        }
        self.frame_dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_assumes_sixty_hertz() {
        let mut timing = FrameTiming::new();
        let dt = timing.update(Instant::now());
        assert!((dt - 0.016).abs() < 1e-6);
    }

    #[test]
    fn dt_is_wall_clock_delta() {
        let start = Instant::now();
        let mut timing = FrameTiming::new();
        timing.update(start);
        let dt = timing.update(start + Duration::from_millis(250));
        assert!((dt - 0.25).abs() < 1e-4);
        assert_eq!(timing.update(start), 0.0);
    }

    #[test]
    fn fps_is_sampled_every_half_second() {
        let start = Instant::now();
        let mut timing = FrameTiming::new();
        for i in 0..=30 {
            timing.update(start + Duration::from_millis(i * 20));
        }
        assert!(timing.fps() > 0.0);
    }
}

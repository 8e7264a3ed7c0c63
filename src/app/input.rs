/// Pointer state for orbit dragging and wheel dolly.
#[derive(Default, Debug, Clone, Copy)]
pub struct PointerState {
    pub dragging: bool,
    last_position: Option<(f32, f32)>,
}

impl PointerState {
    pub fn handle_button(&mut self, pressed: bool) {
        self.dragging = pressed;
        if !pressed {
            self.last_position = None;
        }
    }

    /// Records a cursor move and returns the drag delta while the button is held.
    pub fn handle_move(&mut self, x: f32, y: f32) -> Option<(f32, f32)> {
        let previous = self.last_position.replace((x, y));
        if !self.dragging {
            return None;
        }
        previous.map(|(px, py)| (x - px, y - py))
    }

    pub fn handle_leave(&mut self) {
        self.last_position = None;
        self.dragging = false;
    }
}

/// Wheel delta to dolly steps; scrolling up moves the camera closer.
pub fn wheel_steps(delta_y: f32) -> f32 {
    if delta_y.is_finite() {
        delta_y.signum() * delta_y.abs().min(10.0)
    } else {
        0.0
    }
}

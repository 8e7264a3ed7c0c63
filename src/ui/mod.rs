use crate::scene::stage::ModelStats;
use glam::Vec3;
use std::time::{Duration, Instant};

pub const HELP_TEXT: &str =
    "Drag and drop a 3D model file (.obj, .stl, .gltf, .glb) or use the Load button";
pub const UNSUPPORTED_FORMAT_TEXT: &str =
    "Unsupported file format. Please use .obj, .stl, .gltf, or .glb files.";
pub const PARSE_FAILURE_TEXT: &str = "Error loading model. Please check the file format.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Help,
    Progress,
    Error,
}

/// One-line status area. Errors fall back to the help text after a timeout.
#[derive(Debug, Clone)]
pub struct StatusBanner {
    text: String,
    kind: BannerKind,
    shown_at: Option<Instant>,
    timeout: Duration,
}

impl StatusBanner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            text: HELP_TEXT.to_string(),
            kind: BannerKind::Help,
            shown_at: None,
            timeout,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> BannerKind {
        self.kind
    }

    pub fn show_error(&mut self, message: impl Into<String>, now: Instant) {
        self.text = message.into();
        self.kind = BannerKind::Error;
        self.shown_at = Some(now);
    }

    pub fn show_progress(&mut self, percent: u8) {
        self.text = format!("Loading... {}%", percent.min(100));
        self.kind = BannerKind::Progress;
        self.shown_at = None;
    }

    pub fn show_help(&mut self) {
        self.text = HELP_TEXT.to_string();
        self.kind = BannerKind::Help;
        self.shown_at = None;
    }

    /// Reverts an expired error. Returns whether the text changed.
    pub fn update(&mut self, now: Instant) -> bool {
        match self.shown_at {
            Some(at) if now.saturating_duration_since(at) >= self.timeout => {
                self.show_help();
                true
            }
            _ => false,
        }
    }
}

/// Contents of the model info panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub stats: ModelStats,
    pub dimensions: Option<Vec3>,
}

impl ModelInfo {
    pub fn lines(&self) -> Vec<String> {
        let s = &self.stats;
        let mut lines = vec![
            format!("Model: {}", self.name),
            format!("Vertices: {}", group_thousands(s.vertices)),
            format!("Faces: {}", group_thousands(s.faces)),
            format!(
                "Original Size: {:.2} × {:.2} × {:.2}",
                s.original_size.x, s.original_size.y, s.original_size.z
            ),
            format!("Scale Factor: {:.4}", s.scale_factor),
        ];
        if let Some(dims) = self.dimensions {
            lines.push(format!("Dimensions: {}", format_dimensions(dims)));
        }
        lines
    }
}

/// `w × h × d` with four decimals.
pub fn format_dimensions(dims: Vec3) -> String {
    format!("{:.4} × {:.4} × {:.4}", dims.x, dims.y, dims.z)
}

fn group_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

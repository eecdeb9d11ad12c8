//! Element entrance/attention animations and page transitions.

use serde::{Deserialize, Serialize};

/// Named animation presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnimationPreset {
    FadeIn,
    SlideInLeft,
    SlideInRight,
    SlideInUp,
    SlideInDown,
    Bounce,
    Pulse,
    Wiggle,
    Pop,
    RotateIn,
    Glow,
    ZoomIn,
    Flip,
    Shake,
    Float,
}

/// How many times a preset plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationCount {
    Times(u32),
    Infinite,
}

impl AnimationPreset {
    pub fn id(&self) -> &'static str {
        match self {
            AnimationPreset::FadeIn => "fadeIn",
            AnimationPreset::SlideInLeft => "slideInLeft",
            AnimationPreset::SlideInRight => "slideInRight",
            AnimationPreset::SlideInUp => "slideInUp",
            AnimationPreset::SlideInDown => "slideInDown",
            AnimationPreset::Bounce => "bounce",
            AnimationPreset::Pulse => "pulse",
            AnimationPreset::Wiggle => "wiggle",
            AnimationPreset::Pop => "pop",
            AnimationPreset::RotateIn => "rotateIn",
            AnimationPreset::Glow => "glow",
            AnimationPreset::ZoomIn => "zoomIn",
            AnimationPreset::Flip => "flip",
            AnimationPreset::Shake => "shake",
            AnimationPreset::Float => "float",
        }
    }

    /// Duration in seconds at 1x speed
    pub fn default_duration(&self) -> f64 {
        match self {
            AnimationPreset::Pop | AnimationPreset::ZoomIn => 0.4,
            AnimationPreset::Bounce
            | AnimationPreset::RotateIn
            | AnimationPreset::Flip
            | AnimationPreset::Shake => 0.6,
            AnimationPreset::Pulse => 1.0,
            AnimationPreset::Glow => 1.5,
            AnimationPreset::Float => 2.0,
            _ => 0.5,
        }
    }

    pub fn iteration_count(&self) -> IterationCount {
        match self {
            AnimationPreset::Pulse | AnimationPreset::Glow | AnimationPreset::Float => {
                IterationCount::Infinite
            }
            AnimationPreset::Wiggle => IterationCount::Times(3),
            _ => IterationCount::Times(1),
        }
    }
}

/// Allowed playback speed multipliers
pub const ANIMATION_SPEEDS: [f64; 8] = [0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];

/// Snap an arbitrary multiplier to the nearest allowed step
pub fn snap_speed(speed: f64) -> f64 {
    if !speed.is_finite() {
        return 1.0;
    }
    ANIMATION_SPEEDS
        .iter()
        .copied()
        .min_by(|a, b| (a - speed).abs().total_cmp(&(b - speed).abs()))
        .unwrap_or(1.0)
}

/// Animation attached to an element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "AnimationRecord")]
pub struct AnimationConfig {
    #[serde(rename = "type")]
    pub preset: AnimationPreset,
    pub speed: f64,
    pub delay: f64,
}

#[derive(Deserialize)]
struct AnimationRecord {
    #[serde(rename = "type")]
    preset: AnimationPreset,
    #[serde(default = "default_speed")]
    speed: f64,
    #[serde(default)]
    delay: f64,
}

fn default_speed() -> f64 {
    1.0
}

impl From<AnimationRecord> for AnimationConfig {
    fn from(record: AnimationRecord) -> Self {
        AnimationConfig::new(record.preset, record.speed, record.delay)
    }
}

impl AnimationConfig {
    pub fn new(preset: AnimationPreset, speed: f64, delay: f64) -> Self {
        Self {
            preset,
            speed: snap_speed(speed),
            delay: if delay.is_finite() { delay.max(0.0) } else { 0.0 },
        }
    }

    /// Playback description handed to the renderer
    pub fn css(&self) -> AnimationCss {
        let duration = self.preset.default_duration() / self.speed;
        AnimationCss {
            name: format!("rp-{}", self.preset.id()),
            duration: format!("{:.2}s", duration),
            delay: format!("{}s", self.delay),
            iteration_count: match self.preset.iteration_count() {
                IterationCount::Times(n) => n.to_string(),
                IterationCount::Infinite => "infinite".to_string(),
            },
            timing_function: "ease-out",
            fill_mode: "both",
        }
    }
}

/// Rendered animation properties
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationCss {
    pub name: String,
    pub duration: String,
    pub delay: String,
    pub iteration_count: String,
    pub timing_function: &'static str,
    pub fill_mode: &'static str,
}

/// Transition played when navigating between pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageTransition {
    #[default]
    None,
    Fade,
    SlideLeft,
    SlideRight,
    SlideUp,
    SlideDown,
}

use serde::{Deserialize, Serialize};

/// Ratios at or above this are low risk.
pub const LOW_RISK_THRESHOLD: f64 = 0.9;
/// Ratios at or above this (and below [`LOW_RISK_THRESHOLD`]) are medium risk.
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.7;

pub const LOW_RISK_FILL: (u8, u8, u8) = (34, 197, 94);
pub const MEDIUM_RISK_FILL: (u8, u8, u8) = (245, 158, 11);
pub const HIGH_RISK_FILL: (u8, u8, u8) = (239, 68, 68);
pub const HOVER_FILL: (u8, u8, u8) = (250, 204, 21);

pub const BASE_STROKE: (u8, u8, u8) = (255, 255, 255);
pub const ACTIVE_STROKE: (u8, u8, u8) = (30, 64, 175);
pub const BASE_STROKE_WIDTH: f64 = 0.8;
pub const ACTIVE_STROKE_WIDTH: f64 = 2.5;

const GOLDEN_ANGLE_DEG: f64 = 137.508;
const PASTEL_SATURATION: f64 = 0.45;
const PASTEL_LIGHTNESS: f64 = 0.84;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= LOW_RISK_THRESHOLD {
            Self::Low
        } else if ratio >= MEDIUM_RISK_THRESHOLD {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn color(self) -> (u8, u8, u8) {
        match self {
            Self::Low => LOW_RISK_FILL,
            Self::Medium => MEDIUM_RISK_FILL,
            Self::High => HIGH_RISK_FILL,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low risk",
            Self::Medium => "Medium risk",
            Self::High => "High risk",
        }
    }

    pub fn range_label(self) -> &'static str {
        match self {
            Self::Low => "≥ 0.90",
            Self::Medium => "0.70 – 0.89",
            Self::High => "< 0.70",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillKind {
    Risk(RiskLevel),
    Neutral,
    Hover,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillStyle {
    pub kind: FillKind,
    pub color: (u8, u8, u8),
    pub opacity: f64,
}

impl FillStyle {
    pub fn css(&self) -> String {
        rgba_css(self.color.0, self.color.1, self.color.2, self.opacity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: (u8, u8, u8),
    pub width: f64,
    pub glow: bool,
}

impl StrokeStyle {
    pub fn css(&self) -> String {
        rgba_css(self.color.0, self.color.1, self.color.2, 1.0)
    }
}

/// Fill for one region. Hover wins over everything; otherwise the ratio
/// bucket, otherwise a pastel picked by `neutral_order`.
pub fn resolve_fill(ratio: Option<f64>, neutral_order: usize, hovered: bool) -> FillStyle {
    if hovered {
        return FillStyle {
            kind: FillKind::Hover,
            color: HOVER_FILL,
            opacity: 0.95,
        };
    }
    match ratio.filter(|r| r.is_finite()).map(RiskLevel::from_ratio) {
        Some(level) => FillStyle {
            kind: FillKind::Risk(level),
            color: level.color(),
            opacity: 0.85,
        },
        None => FillStyle {
            kind: FillKind::Neutral,
            color: pastel_fill(neutral_order),
            opacity: 0.9,
        },
    }
}

/// Stroke for one region. Independent of the fill.
pub fn resolve_stroke(selected: bool, active: bool) -> StrokeStyle {
    if selected || active {
        StrokeStyle {
            color: ACTIVE_STROKE,
            width: ACTIVE_STROKE_WIDTH,
            glow: true,
        }
    } else {
        StrokeStyle {
            color: BASE_STROKE,
            width: BASE_STROKE_WIDTH,
            glow: false,
        }
    }
}

/// Deterministic pastel for data-less regions. Consecutive orders walk the hue
/// wheel by the golden angle so neighbours stay distinguishable.
pub fn pastel_fill(order: usize) -> (u8, u8, u8) {
    let hue = (order as f64 * GOLDEN_ANGLE_DEG).rem_euclid(360.0);
    hsl_to_rgb(hue, PASTEL_SATURATION, PASTEL_LIGHTNESS)
}

pub fn legend_entries() -> [(RiskLevel, &'static str, (u8, u8, u8)); 3] {
    [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High]
        .map(|level| (level, level.range_label(), level.color()))
}

/// Format RGBA as a CSS color string.
pub fn rgba_css(r: u8, g: u8, b: u8, a: f64) -> String {
    format!("rgba({r},{g},{b},{a})")
}

/// Convert HSL to RGB.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    if s.abs() < f64::EPSILON {
        let v = (l * 255.0).round() as u8;
        return (v, v, v);
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;
    let h = h / 360.0;

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    (
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    )
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

// Chart height fitting to the available viewport
use serde::Deserialize;

pub const MIN_CHART_HEIGHT: u32 = 220;

/// Geometry reported by the browser for the chart element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub struct Viewport {
    pub height: u32,
    pub top_offset: u32,
}

impl Viewport {
    pub fn new(height: u32, top_offset: u32) -> Self {
        Self { height, top_offset }
    }
}

/// Per-view height limits and the margin kept free below the chart.
/// Deserialized values go through [`WindowFit::new`], so `max_height` is
/// never below `min_height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "RawWindowFit")]
pub struct WindowFit {
    pub min_height: u32,
    pub max_height: u32,
    pub margin: u32,
}

#[derive(Deserialize)]
struct RawWindowFit {
    #[serde(default = "default_min_height")]
    min_height: u32,
    max_height: u32,
    margin: u32,
}

impl From<RawWindowFit> for WindowFit {
    fn from(raw: RawWindowFit) -> Self {
        WindowFit::new(raw.min_height, raw.max_height, raw.margin)
    }
}

fn default_min_height() -> u32 {
    MIN_CHART_HEIGHT
}

impl WindowFit {
    pub fn new(min_height: u32, max_height: u32, margin: u32) -> Self {
        Self {
            min_height,
            max_height: max_height.max(min_height),
            margin,
        }
    }

    pub fn height(&self, viewport: Viewport) -> u32 {
        let available =
            i64::from(viewport.height) - i64::from(viewport.top_offset) - i64::from(self.margin);
        available.clamp(i64::from(self.min_height), i64::from(self.max_height)) as u32
    }
}

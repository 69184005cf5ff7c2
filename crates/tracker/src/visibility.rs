//! Section-view triggering.
//!
//! A section fires once when at least half of it is inside the viewport
//! (viewport bottom pulled up by 100px). It must drop below the threshold
//! before it can fire again.

use std::collections::HashSet;

pub const VISIBILITY_THRESHOLD: f64 = 0.5;
pub const BOTTOM_MARGIN_PX: f64 = 100.0;

/// Axis-aligned rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);
        (right > left && bottom > top).then(|| Rect::new(left, top, right - left, bottom - top))
    }
}

/// Visible fraction of `element` within `root`, in `[0, 1]`.
pub fn intersection_ratio(element: &Rect, root: &Rect) -> f64 {
    let area = element.area();
    if area <= 0.0 {
        return 0.0;
    }
    element
        .intersection(root)
        .map_or(0.0, |visible| (visible.area() / area).clamp(0.0, 1.0))
}

/// Tracks which sections are currently counted as visible.
#[derive(Debug, Clone)]
pub struct SectionVisibility {
    threshold: f64,
    bottom_margin: f64,
    visible: HashSet<String>,
}

impl Default for SectionVisibility {
    fn default() -> Self {
        Self::new(VISIBILITY_THRESHOLD, BOTTOM_MARGIN_PX)
    }
}

impl SectionVisibility {
    pub fn new(threshold: f64, bottom_margin: f64) -> Self {
        Self {
            threshold,
            bottom_margin,
            visible: HashSet::new(),
        }
    }

    /// Viewport with the bottom margin applied.
    pub fn root(&self, viewport_width: f64, viewport_height: f64) -> Rect {
        Rect::new(
            0.0,
            0.0,
            viewport_width,
            (viewport_height - self.bottom_margin).max(0.0),
        )
    }

    /// Records a new ratio. Returns true if a section view should fire.
    pub fn update(&mut self, section: &str, ratio: f64) -> bool {
        if ratio >= self.threshold {
            self.visible.insert(section.to_string())
        } else {
            self.visible.remove(section);
            false
        }
    }

    /// Measures `element` against the viewport and records the result.
    pub fn observe(
        &mut self,
        section: &str,
        element: Rect,
        viewport_width: f64,
        viewport_height: f64,
    ) -> bool {
        let root = self.root(viewport_width, viewport_height);
        self.update(section, intersection_ratio(&element, &root))
    }

    pub fn is_visible(&self, section: &str) -> bool {
        self.visible.contains(section)
    }
}

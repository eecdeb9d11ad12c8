//! # Geometry Resolver
//!
//! Elements carry a creation geometry plus optional per-viewport overrides.
//! The resolver answers "where does this element render at viewport V":
//!
//! 1. an override stored for V wins verbatim;
//! 2. otherwise the nearest wider viewport with an override is scaled
//!    horizontally (`x` and `width`) by the ratio of reference widths;
//! 3. otherwise the creation geometry is used, scaled from the viewport it
//!    was created at. An element with no overrides at all renders its
//!    creation geometry unscaled.
//!
//! Vertical geometry (`y`, `height`) and rotation are never scaled.
//! Resolution is pure; only [`Document::generate_breakpoint_positions`]
//! writes derived boxes back into the override map.
//!
//! [`Document::generate_breakpoint_positions`]: crate::Document::generate_breakpoint_positions

use crate::model::Element;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Responsive viewport, ordered widest to narrowest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewportMode {
    Desktop,
    Tablet,
    Mobile,
}

impl ViewportMode {
    pub const ALL: [ViewportMode; 3] = [
        ViewportMode::Desktop,
        ViewportMode::Tablet,
        ViewportMode::Mobile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewportMode::Desktop => "desktop",
            ViewportMode::Tablet => "tablet",
            ViewportMode::Mobile => "mobile",
        }
    }

    /// Viewports wider than this one, nearest first
    pub fn wider(&self) -> impl Iterator<Item = ViewportMode> {
        let me = *self;
        Self::ALL.into_iter().rev().filter(move |mode| *mode < me)
    }

    /// Default canvas zoom when switching to this viewport
    pub fn default_zoom(&self) -> f64 {
        match self {
            ViewportMode::Desktop => 0.55,
            ViewportMode::Tablet => 0.75,
            ViewportMode::Mobile => 0.95,
        }
    }
}

impl fmt::Display for ViewportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desktop" => Ok(ViewportMode::Desktop),
            "tablet" => Ok(ViewportMode::Tablet),
            "mobile" => Ok(ViewportMode::Mobile),
            other => Err(format!(
                "Invalid viewport: {}. Use: desktop, tablet, or mobile",
                other
            )),
        }
    }
}

/// Axis-aligned box in section-relative pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
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

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Scale the horizontal axis, leaving vertical geometry untouched
    pub fn scale_horizontal(&self, ratio: f64) -> Self {
        Self {
            x: self.x * ratio,
            width: self.width * ratio,
            ..*self
        }
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Reference widths of the three viewports
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BreakpointTable {
    pub desktop: f64,
    pub tablet: f64,
    pub mobile: f64,
}

impl BreakpointTable {
    pub fn width(&self, mode: ViewportMode) -> f64 {
        match mode {
            ViewportMode::Desktop => self.desktop,
            ViewportMode::Tablet => self.tablet,
            ViewportMode::Mobile => self.mobile,
        }
    }
}

impl Default for BreakpointTable {
    fn default() -> Self {
        Self {
            desktop: 1200.0,
            tablet: 768.0,
            mobile: 375.0,
        }
    }
}

/// Stored per-viewport geometry overrides of one element
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Breakpoints(BTreeMap<ViewportMode, Rect>);

impl Breakpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, mode: ViewportMode) -> Option<&Rect> {
        self.0.get(&mode)
    }

    pub fn get_mut(&mut self, mode: ViewportMode) -> Option<&mut Rect> {
        self.0.get_mut(&mode)
    }

    pub fn set(&mut self, mode: ViewportMode, rect: Rect) {
        self.0.insert(mode, rect);
    }

    pub fn contains(&self, mode: ViewportMode) -> bool {
        self.0.contains_key(&mode)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ViewportMode, &Rect)> {
        self.0.iter().map(|(mode, rect)| (*mode, rect))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ViewportMode, &mut Rect)> {
        self.0.iter_mut().map(|(mode, rect)| (*mode, rect))
    }
}

/// Resolves effective element geometry for a viewport
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeometryResolver {
    table: BreakpointTable,
}

impl GeometryResolver {
    pub fn new(table: BreakpointTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &BreakpointTable {
        &self.table
    }

    /// Effective box of `element` at `mode`
    pub fn resolve(&self, element: &Element, mode: ViewportMode) -> Rect {
        match element.breakpoints.get(mode) {
            Some(rect) => *rect,
            None => self.derive(element, mode, self.table.width(mode)),
        }
    }

    /// Derived box at `mode`, ignoring any override stored for `mode` itself.
    ///
    /// `target_width` is the reference width the horizontal axis is scaled to.
    pub fn derive(&self, element: &Element, mode: ViewportMode, target_width: f64) -> Rect {
        for wider in mode.wider() {
            if let Some(source) = element.breakpoints.get(wider) {
                return source.scale_horizontal(target_width / self.table.width(wider));
            }
        }

        if element.breakpoints.is_empty() {
            return element.base;
        }

        element
            .base
            .scale_horizontal(target_width / self.table.width(element.origin))
    }
}

/// Estimate the height a block of text needs at a given width.
///
/// Uses an average glyph width of 0.55em and 16px of vertical padding.
pub fn estimate_text_height(content: &str, font_size: f64, line_height: f64, width: f64) -> f64 {
    let padding = 16.0;
    let avg_char_width = font_size * 0.55;
    let usable_width = width - padding;
    if usable_width <= 0.0 {
        return font_size * line_height;
    }

    let chars_per_line = (usable_width / avg_char_width).floor().max(1.0);
    let line_count = (content.chars().count() as f64 / chars_per_line).ceil();
    let line_height_px = font_size * line_height;
    (line_count * line_height_px + padding).max(line_height_px + padding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, ElementType};
    use crate::SectionId;

    fn element_at(mode: ViewportMode, rect: Rect) -> Element {
        let mut el = Element::new("el-1".into(), ElementType::Text, SectionId::from("s1"), rect, mode);
        el.breakpoints = Breakpoints::new();
        el.breakpoints.set(mode, rect);
        el
    }

    #[test]
    fn test_override_wins_verbatim() {
        let resolver = GeometryResolver::default();
        let mut el = element_at(ViewportMode::Desktop, Rect::new(100.0, 50.0, 400.0, 60.0));
        el.breakpoints.set(ViewportMode::Tablet, Rect::new(1.0, 2.0, 3.0, 4.0));

        assert_eq!(
            resolver.resolve(&el, ViewportMode::Tablet),
            Rect::new(1.0, 2.0, 3.0, 4.0)
        );
    }

    #[test]
    fn test_scales_horizontal_axis_from_nearest_wider_override() {
        let resolver = GeometryResolver::default();
        let el = element_at(ViewportMode::Desktop, Rect::new(120.0, 50.0, 600.0, 60.0));

        let tablet = resolver.resolve(&el, ViewportMode::Tablet);
        let ratio = 768.0 / 1200.0;
        assert_eq!(tablet.x, 120.0 * ratio);
        assert_eq!(tablet.width, 600.0 * ratio);
        assert_eq!(tablet.y, 50.0);
        assert_eq!(tablet.height, 60.0);
    }

    #[test]
    fn test_mobile_prefers_tablet_over_desktop() {
        let resolver = GeometryResolver::default();
        let mut el = element_at(ViewportMode::Desktop, Rect::new(120.0, 50.0, 600.0, 60.0));
        el.breakpoints.set(ViewportMode::Tablet, Rect::new(40.0, 10.0, 384.0, 80.0));

        let mobile = resolver.resolve(&el, ViewportMode::Mobile);
        let ratio = 375.0 / 768.0;
        assert_eq!(mobile.x, 40.0 * ratio);
        assert_eq!(mobile.width, 384.0 * ratio);
        assert_eq!(mobile.y, 10.0);
        assert_eq!(mobile.height, 80.0);
    }

    #[test]
    fn test_element_without_overrides_is_unscaled() {
        let resolver = GeometryResolver::default();
        let mut el = element_at(ViewportMode::Desktop, Rect::new(10.0, 20.0, 300.0, 100.0));
        el.breakpoints = Breakpoints::new();

        for mode in ViewportMode::ALL {
            assert_eq!(resolver.resolve(&el, mode), Rect::new(10.0, 20.0, 300.0, 100.0));
        }
    }

    #[test]
    fn test_creation_geometry_scaled_from_its_viewport() {
        let resolver = GeometryResolver::default();
        let el = element_at(ViewportMode::Mobile, Rect::new(15.0, 30.0, 300.0, 100.0));

        let desktop = resolver.resolve(&el, ViewportMode::Desktop);
        assert_eq!(desktop.width, 300.0 * 1200.0 / 375.0);
        assert_eq!(desktop.y, 30.0);
    }

    #[test]
    fn test_resolve_does_not_mutate() {
        let resolver = GeometryResolver::default();
        let el = element_at(ViewportMode::Desktop, Rect::new(120.0, 50.0, 600.0, 60.0));
        let before = el.clone();
        let _ = resolver.resolve(&el, ViewportMode::Mobile);
        assert_eq!(el, before);
    }

    #[test]
    fn test_wider_order() {
        let wider: Vec<_> = ViewportMode::Mobile.wider().collect();
        assert_eq!(wider, vec![ViewportMode::Tablet, ViewportMode::Desktop]);
        assert_eq!(ViewportMode::Desktop.wider().count(), 0);
    }

    #[test]
    fn test_text_height_grows_with_content() {
        let short = estimate_text_height("Hi", 16.0, 1.5, 300.0);
        let long = estimate_text_height(&"word ".repeat(100), 16.0, 1.5, 300.0);
        assert_eq!(short, 16.0 * 1.5 + 16.0);
        assert!(long > short);
    }
}

//! Viewer-to-server coordinate scaling.
//!
//! The viewer shows the remote screen shrunk (or grown) to fit its
//! display area while preserving aspect ratio. Pointer events must be
//! mapped back through the *current* factor before they are sent, never
//! a stale one; the client recomputes the transform on every frame and
//! on every viewer resize.

/// Maps between viewer coordinates and server screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleTransform {
    factor: f64,
}

impl ScaleTransform {
    /// The identity transform (1:1).
    pub fn identity() -> Self {
        Self { factor: 1.0 }
    }

    /// Compute the fit of an `img_w` x `img_h` frame into a
    /// `view_w` x `view_h` area: factor = min of the two axis ratios.
    ///
    /// Degenerate inputs (any dimension zero) yield the identity so a
    /// not-yet-laid-out viewer never produces garbage coordinates.
    pub fn fit(img_w: u32, img_h: u32, view_w: u32, view_h: u32) -> Self {
        if img_w == 0 || img_h == 0 || view_w == 0 || view_h == 0 {
            return Self::identity();
        }
        let factor = f64::min(
            view_w as f64 / img_w as f64,
            view_h as f64 / img_h as f64,
        );
        Self { factor }
    }

    /// The raw scale factor.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Scale a frame size down (or up) to its on-screen size.
    pub fn scaled_size(&self, width: u32, height: u32) -> (u32, u32) {
        (
            (width as f64 * self.factor) as u32,
            (height as f64 * self.factor) as u32,
        )
    }

    /// Map a pointer position in viewer coordinates to server screen
    /// coordinates: `round(p / factor)` on each axis.
    pub fn to_remote(&self, px: i32, py: i32) -> (i32, i32) {
        (
            (px as f64 / self.factor).round() as i32,
            (py as f64 / self.factor).round() as i32,
        )
    }
}

impl Default for ScaleTransform {
    fn default() -> Self {
        Self::identity()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_picks_the_smaller_ratio() {
        // 100x80 frame in a 200x160 viewer: both ratios are 2.0.
        let t = ScaleTransform::fit(100, 80, 200, 160);
        assert_eq!(t.factor(), 2.0);

        // Width-constrained: 1920x1080 into 960x1080.
        let t = ScaleTransform::fit(1920, 1080, 960, 1080);
        assert_eq!(t.factor(), 0.5);

        // Height-constrained.
        let t = ScaleTransform::fit(1000, 1000, 900, 450);
        assert_eq!(t.factor(), 0.45);
    }

    #[test]
    fn pointer_mapping_rounds() {
        let t = ScaleTransform::fit(100, 80, 200, 160);
        assert_eq!(t.to_remote(50, 40), (25, 20));

        let t = ScaleTransform::fit(1000, 1000, 300, 300);
        // 0.3 factor: viewer 10 → 33.33 → rounds to 33, viewer 11 → 36.67 → 37.
        assert_eq!(t.to_remote(10, 11), (33, 37));
    }

    #[test]
    fn scaled_size_truncates() {
        let t = ScaleTransform::fit(1000, 1000, 300, 300);
        assert_eq!(t.scaled_size(1000, 1000), (300, 300));
        let t = ScaleTransform::fit(3, 3, 2, 2);
        assert_eq!(t.scaled_size(3, 3), (2, 2));
    }

    #[test]
    fn degenerate_inputs_are_identity() {
        assert_eq!(ScaleTransform::fit(0, 80, 200, 160), ScaleTransform::identity());
        assert_eq!(ScaleTransform::fit(100, 80, 0, 0), ScaleTransform::identity());
        assert_eq!(ScaleTransform::identity().to_remote(42, 17), (42, 17));
    }
}

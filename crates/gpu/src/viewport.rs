use foundation::math::Vec2;

/// Pixel rectangle in CSS pixels, origin at the top-left corner.
#[derive(Debug, Copy, Clone, PartialEq)]
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

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    pub fn aspect(&self) -> f64 {
        if self.height <= 0.0 {
            1.0
        } else {
            self.width / self.height
        }
    }

    /// Normalized device coordinates of a point given in the same pixel space.
    pub fn to_ndc(&self, px: f64, py: f64) -> Vec2 {
        let w = self.width.max(1.0);
        let h = self.height.max(1.0);
        Vec2::new(((px - self.x) / w) * 2.0 - 1.0, -((py - self.y) / h) * 2.0 + 1.0)
    }

    /// `[x, y, width, height]` in device pixels, clamped to at least 1x1.
    pub fn to_physical(&self, device_pixel_ratio: f64) -> [u32; 4] {
        let s = device_pixel_ratio.max(0.0);
        [
            (self.x * s).round().max(0.0) as u32,
            (self.y * s).round().max(0.0) as u32,
            ((self.width * s).round() as u32).max(1),
            ((self.height * s).round() as u32).max(1),
        ]
    }
}

/// Observed size of the render surface.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            device_pixel_ratio: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
            device_pixel_ratio: if device_pixel_ratio > 0.0 {
                device_pixel_ratio
            } else {
                1.0
            },
        }
    }

    /// Applies an observed container size. Returns `true` if anything changed
    /// and the surface and projection need to be rebuilt.
    pub fn resize(&mut self, width: f64, height: f64, device_pixel_ratio: f64) -> bool {
        let next = Viewport::new(width, height, device_pixel_ratio);
        if next == *self {
            return false;
        }
        *self = next;
        true
    }

    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub fn aspect(&self) -> f64 {
        self.rect().aspect()
    }

    pub fn physical_size(&self) -> (u32, u32) {
        let [_, _, w, h] = self.rect().to_physical(self.device_pixel_ratio);
        (w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ndc_corners() {
        let r = Rect::new(0.0, 0.0, 200.0, 100.0);
        assert_eq!(r.to_ndc(0.0, 0.0), Vec2::new(-1.0, 1.0));
        assert_eq!(r.to_ndc(200.0, 100.0), Vec2::new(1.0, -1.0));
        assert_eq!(r.to_ndc(100.0, 50.0), Vec2::new(0.0, 0.0));
    }

    #[test]
    fn ndc_respects_rect_origin() {
        let right_half = Rect::new(100.0, 0.0, 100.0, 100.0);
        assert_eq!(right_half.to_ndc(150.0, 50.0), Vec2::new(0.0, 0.0));
    }

    #[test]
    fn resize_reports_changes_only() {
        let mut v = Viewport::new(800.0, 600.0, 1.0);
        assert!(!v.resize(800.0, 600.0, 1.0));
        assert!(v.resize(1000.0, 500.0, 2.0));
        assert_eq!(v.aspect(), 2.0);
        assert_eq!(v.physical_size(), (2000, 1000));
    }

    #[test]
    fn degenerate_sizes_are_clamped() {
        let v = Viewport::new(0.0, -3.0, 0.0);
        assert_eq!(v.width, 1.0);
        assert_eq!(v.height, 1.0);
        assert_eq!(v.device_pixel_ratio, 1.0);
    }
}

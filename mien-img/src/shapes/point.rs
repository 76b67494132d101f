#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointF32 {
    pub x: f32,
    pub y: f32,
}

impl PointF32 {
    pub fn new(x: f32, y: f32) -> PointF32 {
        PointF32 { x, y }
    }

    /// Rotate about `origin` by `theta` radians (clockwise on screen, y grows down).
    pub fn rotate(&mut self, origin: PointF32, theta: f32) -> PointF32 {
        let x = self.x - origin.x;
        let y = self.y - origin.y;

        let (sin, cos) = theta.sin_cos();
        self.x = x * cos - y * sin + origin.x;
        self.y = x * sin + y * cos + origin.y;

        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn assert_close(a: PointF32, b: PointF32) {
        assert!((a.x - b.x).abs() < 1e-4, "{a:?} != {b:?}");
        assert!((a.y - b.y).abs() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let origin = PointF32::new(10., 10.);
        let mut p = PointF32::new(20., 10.);
        p.rotate(origin, FRAC_PI_2);
        assert_close(p, PointF32::new(10., 20.));
    }

    #[test]
    fn test_rotate_there_and_back() {
        let origin = PointF32::new(3., -2.);
        let mut p = PointF32::new(7.5, 4.25);
        p.rotate(origin, 0.3).rotate(origin, -0.3);
        assert_close(p, PointF32::new(7.5, 4.25));
    }
}

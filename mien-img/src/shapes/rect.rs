use super::point::PointF32;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rect {
    // centerpoint
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RectF32 {
    // centerpoint
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl RectF32 {
    pub fn from_center(xc: f32, yc: f32, w: f32, h: f32) -> RectF32 {
        RectF32 { x: xc, y: yc, w, h }
    }

    pub fn adjust(&mut self, dx: f32, dy: f32, dw: f32, dh: f32) -> RectF32 {
        self.x += dx;
        self.y += dy;
        self.w = dw;
        self.h = dh;

        *self
    }

    pub fn scale(&mut self, scale_x: f32, scale_y: f32) -> RectF32 {
        self.x *= scale_x;
        self.y *= scale_y;
        self.w *= scale_x;
        self.h *= scale_y;

        *self
    }

    /// Snap to whole pixels, clipped to a `max_x` by `max_y` image. Negative sizes clip to empty.
    pub fn clip(&self, max_x: u32, max_y: u32) -> Rect {
        let left = (self.x - self.w / 2.).round().clamp(0., max_x as f32) as u32;
        let right = (self.x + self.w / 2.).round().clamp(0., max_x as f32) as u32;
        let top = (self.y - self.h / 2.).round().clamp(0., max_y as f32) as u32;
        let bottom = (self.y + self.h / 2.).round().clamp(0., max_y as f32) as u32;

        Rect::from_tl(
            left,
            top,
            right.saturating_sub(left),
            bottom.saturating_sub(top),
        )
    }
}

impl Rect {
    pub fn left(&self) -> u32 {
        self.x.saturating_sub(self.w / 2)
    }
    pub fn right(&self) -> u32 {
        self.left() + self.w
    }
    pub fn top(&self) -> u32 {
        self.y.saturating_sub(self.h / 2)
    }
    pub fn bottom(&self) -> u32 {
        self.top() + self.h
    }
    pub fn area(&self) -> u32 {
        self.w * self.h
    }

    pub fn center(&self) -> PointF32 {
        PointF32 {
            x: self.left() as f32 + self.w as f32 / 2.,
            y: self.top() as f32 + self.h as f32 / 2.,
        }
    }

    pub fn from_tl(x: u32, y: u32, w: u32, h: u32) -> Rect {
        Rect {
            x: x + w / 2,
            y: y + h / 2,
            w,
            h,
        }
    }

    pub fn scale_x(&mut self, mag: f32, max: u32) -> Rect {
        // Ensure we don't go <0 on x axis
        let new_w = self.w as f32 * mag;
        let new_l = (self.x as f32 - new_w / 2.).round().max(0.) as u32;
        let new_r = ((self.x as f32 + new_w / 2.).round() as u32).min(max);

        self.w = new_r.saturating_sub(new_l);
        self.x = new_l + self.w / 2;

        *self
    }

    pub fn scale_y(&mut self, mag: f32, max: u32) -> Rect {
        let new_h = self.h as f32 * mag;
        let new_t = (self.y as f32 - new_h / 2.).round().max(0.) as u32;
        let new_b = ((self.y as f32 + new_h / 2.).round() as u32).min(max);

        self.h = new_b.saturating_sub(new_t);
        self.y = new_t + self.h / 2;

        *self
    }

    pub fn scale(&mut self, mag: f32, max_x: u32, max_y: u32) -> Rect {
        self.scale_x(mag, max_x);
        self.scale_y(mag, max_y);

        *self
    }

    pub fn overlap_pct(&self, other: &Rect) -> f32 {
        let x_min = self.left().max(other.left());
        let x_max = self.right().min(other.right());
        let y_min = self.top().max(other.top());
        let y_max = self.bottom().min(other.bottom());

        let overlap_area = if x_min < x_max && y_min < y_max {
            (x_max - x_min) * (y_max - y_min)
        } else {
            0
        };

        let area_delta = self.area() + other.area() - overlap_area;

        if area_delta > 0 {
            overlap_area as f32 / area_delta as f32 * 100.
        } else {
            0.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tl_edges() {
        let r = Rect::from_tl(10, 20, 30, 40);
        assert_eq!(r.left(), 10);
        assert_eq!(r.right(), 40);
        assert_eq!(r.top(), 20);
        assert_eq!(r.bottom(), 60);
        assert_eq!(r.area(), 1200);
    }

    #[test]
    fn test_scale_clamps_to_image() {
        let mut r = Rect::from_tl(0, 0, 20, 20);
        r.scale(2., 25, 100);
        assert_eq!(r.left(), 0);
        assert_eq!(r.right(), 25);
        assert_eq!(r.top(), 0);
        assert_eq!(r.bottom(), 30);
    }

    #[test]
    fn test_overlap_pct() {
        let a = Rect::from_tl(0, 0, 10, 10);
        let b = Rect::from_tl(5, 0, 10, 10);
        let far = Rect::from_tl(50, 50, 10, 10);

        assert_eq!(a.overlap_pct(&a), 100.);
        assert!((a.overlap_pct(&b) - 50. / 150. * 100.).abs() < 1e-4);
        assert_eq!(a.overlap_pct(&far), 0.);
    }

    #[test]
    fn test_clip_rect_f32() {
        let r = RectF32::from_center(5., 50., 20., 10.).clip(100, 100);
        assert_eq!(r.left(), 0);
        assert_eq!(r.right(), 15);
        assert_eq!(r.top(), 45);
        assert_eq!(r.bottom(), 55);
    }

    #[test]
    fn test_clip_negative_size_is_empty() {
        let r = RectF32::from_center(8., 8., 1., 1.)
            .adjust(0., 0., -16., 16.)
            .scale(2., 2.)
            .clip(256, 256);
        assert_eq!(r.w, 0);
        assert_eq!(r.area(), 0);
    }
}

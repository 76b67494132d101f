use crate::shapes::rect::RectF32;

// SSD anchor layout of the BlazeFace short range model. Consecutive layers sharing a stride are
// merged onto one grid, so the stride 16 layers contribute 6 anchors per cell.
const STRIDES: [u32; 4] = [8, 16, 16, 16];
const ANCHORS_PER_LAYER: usize = 2;

pub const ANCHOR_COUNT: usize = 896;

/// Anchor centers in model input pixels. The model uses fixed size anchors, so every anchor is
/// 1x1 and the regressors carry absolute pixel sizes.
pub fn gen_anchors(width: u32, height: u32) -> Vec<RectF32> {
    let mut anchors = Vec::with_capacity(ANCHOR_COUNT);

    let mut layer = 0;
    while layer < STRIDES.len() {
        let stride = STRIDES[layer];
        let mut per_cell = 0;
        let mut last_same_stride = layer;
        while last_same_stride < STRIDES.len() && STRIDES[last_same_stride] == stride {
            per_cell += ANCHORS_PER_LAYER;
            last_same_stride += 1;
        }

        let rows = height.div_ceil(stride);
        let cols = width.div_ceil(stride);
        for y in 0..rows {
            for x in 0..cols {
                let xc = (x as f32 + 0.5) * stride as f32;
                let yc = (y as f32 + 0.5) * stride as f32;
                for _ in 0..per_cell {
                    anchors.push(RectF32::from_center(xc, yc, 1., 1.));
                }
            }
        }

        layer = last_same_stride;
    }

    anchors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_count() {
        assert_eq!(gen_anchors(128, 128).len(), ANCHOR_COUNT);
    }

    #[test]
    fn test_anchor_grid() {
        let anchors = gen_anchors(128, 128);

        // stride 8 grid, 2 per cell
        assert_eq!(anchors[0], RectF32::from_center(4., 4., 1., 1.));
        assert_eq!(anchors[1], anchors[0]);
        assert_eq!(anchors[2], RectF32::from_center(12., 4., 1., 1.));
        assert_eq!(anchors[32], RectF32::from_center(4., 12., 1., 1.));
        assert_eq!(anchors[511], RectF32::from_center(124., 124., 1., 1.));

        // stride 16 grid, 6 per cell
        assert_eq!(anchors[512], RectF32::from_center(8., 8., 1., 1.));
        assert_eq!(anchors[517], anchors[512]);
        assert_eq!(anchors[518], RectF32::from_center(24., 8., 1., 1.));
        assert_eq!(anchors[895], RectF32::from_center(120., 120., 1., 1.));
    }
}

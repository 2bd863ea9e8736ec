use super::super::common::PALM_INPUT_SIZE;

/// Anchor count of the 192x192 palm detector: 24x24x2 + 12x12x6.
pub const NUM_ANCHORS: usize = 2016;

// (stride, anchors per cell). Layers sharing a stride are merged, as the
// model's SSD head emits them.
const LAYERS: &[(u32, usize)] = &[(8, 2), (16, 6)];

/// Normalized `[cx, cy]` anchor centers in model output order.
pub fn generate_anchors() -> Vec<[f32; 2]> {
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);
    for &(stride, per_cell) in LAYERS {
        let cells = PALM_INPUT_SIZE / stride;
        for y in 0..cells {
            let cy = (y as f32 + 0.5) / cells as f32;
            for x in 0..cells {
                let cx = (x as f32 + 0.5) / cells as f32;
                anchors.extend(std::iter::repeat_n([cx, cy], per_cell));
            }
        }
    }
    anchors
}

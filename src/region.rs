use rand::Rng;

/// One seed region consumed by the kernel: a position and a color, both in
/// normalised [0, 1] coordinates.
///
/// The layout mirrors the WGSL storage struct
/// `struct Region { pos: vec2<f32>, color: vec3<f32> }`: `pos` at byte
/// offset 0, `color` at byte offset 16, stride 32. The explicit pad fields
/// keep the two vector sub-fields on 16-byte boundaries for every record in
/// a contiguous array.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Region {
    pub pos: [f32; 2],
    _pad0: [f32; 2],
    pub color: [f32; 3],
    _pad1: f32,
}

pub const REGION_STRIDE: usize = std::mem::size_of::<Region>();

const _: () = assert!(std::mem::size_of::<Region>() == 32);
const _: () = assert!(std::mem::size_of::<Region>() % 16 == 0);
const _: () = assert!(std::mem::offset_of!(Region, pos) == 0);
const _: () = assert!(std::mem::offset_of!(Region, color) == 16);

impl Region {
    pub fn new(pos: [f32; 2], color: [f32; 3]) -> Self {
        Self {
            pos,
            _pad0: [0.0; 2],
            color,
            _pad1: 0.0,
        }
    }
}

/// Generate `n` regions with every component drawn uniformly from [0, 1).
pub fn generate_regions(n: usize) -> Vec<Region> {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| {
            Region::new(
                [rng.r#gen::<f32>(), rng.r#gen::<f32>()],
                [rng.r#gen::<f32>(), rng.r#gen::<f32>(), rng.r#gen::<f32>()],
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_are_unit_range() {
        let regions = generate_regions(4096);
        assert_eq!(regions.len(), 4096);
        for r in &regions {
            for c in r.pos.iter().chain(r.color.iter()) {
                assert!((0.0..=1.0).contains(c), "component out of range: {c}");
            }
        }
    }

    #[test]
    fn zero_regions_is_empty() {
        assert!(generate_regions(0).is_empty());
    }

    #[test]
    fn byte_layout_matches_wgsl_stride() {
        let r = Region::new([0.25, 0.5], [1.0, 0.0, 0.75]);
        let bytes = bytemuck::bytes_of(&r);
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[0..4], &0.25f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &0.5f32.to_le_bytes());
        assert_eq!(&bytes[16..20], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[20..24], &0.0f32.to_le_bytes());
        assert_eq!(&bytes[24..28], &0.75f32.to_le_bytes());
    }

    #[test]
    fn array_is_contiguous_at_stride() {
        let regions = generate_regions(3);
        let bytes: &[u8] = bytemuck::cast_slice(&regions);
        assert_eq!(bytes.len(), 3 * REGION_STRIDE);
    }
}

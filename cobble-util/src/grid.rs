use glam::{IVec3, UVec3};

/// A cubic 3D array with power-of-two side length, indexed through a
/// wrapping origin offset. Panning the logical window only moves the
/// offset; the backing storage never shuffles.
#[derive(Debug, Clone)]
pub struct RingGrid3<T> {
    cells: Box<[T]>,
    bits: u32,
    offset: UVec3,
}

impl<T> RingGrid3<T> {
    /// `side` must be a power of two; the grid holds `side^3` cells.
    pub fn new(side: u32, mut fill: impl FnMut(UVec3) -> T) -> Self {
        assert!(side.is_power_of_two(), "ring grid side must be a power of two");
        let bits = side.trailing_zeros();
        let cells = (0..side.pow(3))
            .map(|i| {
                let x = i & (side - 1);
                let y = (i >> bits) & (side - 1);
                let z = i >> (bits * 2);
                fill(UVec3::new(x, y, z))
            })
            .collect();

        Self {
            cells,
            bits,
            offset: UVec3::ZERO,
        }
    }

    pub fn side(&self) -> u32 {
        1 << self.bits
    }

    fn mask(&self) -> u32 {
        self.side() - 1
    }

    fn linearize(&self, index: UVec3) -> usize {
        debug_assert!(
            index.x < self.side() && index.y < self.side() && index.z < self.side(),
            "ring grid index out of range: {index:?}"
        );
        let mask = self.mask();
        let x = (index.x + self.offset.x) & mask;
        let y = (index.y + self.offset.y) & mask;
        let z = (index.z + self.offset.z) & mask;
        (x | (y << self.bits) | (z << (self.bits * 2))) as usize
    }

    pub fn get(&self, index: UVec3) -> &T {
        &self.cells[self.linearize(index)]
    }

    pub fn get_mut(&mut self, index: UVec3) -> &mut T {
        let i = self.linearize(index);
        &mut self.cells[i]
    }

    /// Shifts the logical origin by `delta` cells. The cell formerly read as
    /// `index + delta` is afterwards read as `index`.
    pub fn shift(&mut self, delta: IVec3) {
        let mask = self.mask();
        let wrap = |offset: u32, d: i32| (offset.wrapping_add_signed(d)) & mask;
        self.offset = UVec3::new(
            wrap(self.offset.x, delta.x),
            wrap(self.offset.y, delta.y),
            wrap(self.offset.z, delta.z),
        );
    }
}

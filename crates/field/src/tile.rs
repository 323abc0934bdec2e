/// A contiguous run of depth layers written by one tile pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSpan {
    /// Absolute depth of the first layer in the tile.
    pub start_z: u32,
    /// Number of layers (color targets) in the tile.
    pub layers: u32,
}

/// Mapping from depth layers to (tile, sub-target) pairs under the device
/// cap on simultaneously writable color targets.
///
/// `tile = z / K`, `sub = z % K`; a full-depth write touches
/// `ceil(depth / K)` tiles and the final tile may be short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerTileMap {
    depth: u32,
    max_targets: u32,
}

impl LayerTileMap {
    pub fn new(depth: u32, max_targets: u32) -> Self {
        assert!(depth > 0, "tile map needs at least one layer");
        assert!(max_targets > 0, "tile map needs at least one target");
        Self { depth, max_targets }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The per-pass target cap K.
    pub fn max_targets(&self) -> u32 {
        self.max_targets
    }

    /// Number of tile passes needed for a full-depth write.
    pub fn tiles(&self) -> u32 {
        self.depth.div_ceil(self.max_targets)
    }

    /// The layer run of one tile.
    pub fn span(&self, tile: u32) -> TileSpan {
        assert!(tile < self.tiles(), "tile {tile} out of range");
        let start_z = tile * self.max_targets;
        TileSpan {
            start_z,
            layers: self.max_targets.min(self.depth - start_z),
        }
    }

    /// Locate a depth layer: (tile index, sub-target index).
    pub fn locate(&self, z: u32) -> (u32, u32) {
        assert!(z < self.depth, "layer {z} out of range");
        (z / self.max_targets, z % self.max_targets)
    }

    /// All tile spans in write order.
    pub fn spans(&self) -> impl Iterator<Item = TileSpan> + '_ {
        (0..self.tiles()).map(|t| self.span(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn reference_layout_300_layers_8_targets() {
        let map = LayerTileMap::new(300, 8);
        assert_eq!(map.tiles(), 38);
        assert_eq!(map.locate(0), (0, 0));
        assert_eq!(map.locate(7), (0, 7));
        assert_eq!(map.locate(8), (1, 0));
        assert_eq!(map.locate(299), (37, 3));
        // 37 full tiles of 8, one tail of 4.
        assert_eq!(map.span(0), TileSpan { start_z: 0, layers: 8 });
        assert_eq!(
            map.span(37),
            TileSpan {
                start_z: 296,
                layers: 4
            }
        );
    }

    #[test]
    fn locate_is_a_bijection_onto_valid_pairs() {
        let map = LayerTileMap::new(300, 8);
        let mut seen = HashSet::new();
        for z in 0..300 {
            let (tile, sub) = map.locate(z);
            assert!(tile < map.tiles());
            assert!(sub < map.span(tile).layers);
            assert!(seen.insert((tile, sub)), "duplicate pair for layer {z}");
        }
        let valid: usize = (0..map.tiles()).map(|t| map.span(t).layers as usize).sum();
        assert_eq!(seen.len(), valid);
    }

    #[test]
    fn exact_multiple_has_no_short_tail() {
        let map = LayerTileMap::new(64, 8);
        assert_eq!(map.tiles(), 8);
        assert!(map.spans().all(|s| s.layers == 8));
    }

    #[test]
    fn single_target_degenerates_to_one_layer_per_tile() {
        let map = LayerTileMap::new(5, 1);
        assert_eq!(map.tiles(), 5);
        for z in 0..5 {
            assert_eq!(map.locate(z), (z, 0));
        }
    }

    #[test]
    fn spans_cover_depth_in_order() {
        let map = LayerTileMap::new(23, 4);
        let mut next = 0;
        for span in map.spans() {
            assert_eq!(span.start_z, next);
            next += span.layers;
        }
        assert_eq!(next, 23);
    }

    #[test]
    #[should_panic]
    fn locate_rejects_out_of_range() {
        LayerTileMap::new(10, 4).locate(10);
    }
}

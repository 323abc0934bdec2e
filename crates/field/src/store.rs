use crate::tile::LayerTileMap;
use crate::volume::{FieldError, VolumeField};
use morphogen_common::GridExtent;
use morphogen_gpu::clear_targets;

enum Frames {
    Single(VolumeField),
    Double([VolumeField; 2]),
}

/// The owner of the volumetric state.
///
/// Double-buffered stores alternate two fields: `current` names the
/// readable one, and the flip happens exactly when a [`WritePass`] commits.
/// Single-buffered stores read and write the same field (acceptable only
/// for in-place operations such as clears).
pub struct VolumeStore {
    frames: Frames,
    current: usize,
    tile_map: LayerTileMap,
}

impl VolumeStore {
    /// Allocate a double-buffered store, optionally clearing both fields
    /// to a fill color.
    pub fn double(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        extent: GridExtent,
        max_targets: u32,
        fill: Option<wgpu::Color>,
    ) -> Result<Self, FieldError> {
        let a = VolumeField::allocate(device, extent, "field_a")?;
        let b = VolumeField::allocate(device, extent, "field_b")?;
        let tile_map = LayerTileMap::new(extent.depth, max_targets);
        if let Some(color) = fill {
            clear_field(device, queue, &a, &tile_map, color);
            clear_field(device, queue, &b, &tile_map, color);
        }
        Ok(Self {
            frames: Frames::Double([a, b]),
            current: 0,
            tile_map,
        })
    }

    /// Allocate a single-buffered store.
    pub fn single(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        extent: GridExtent,
        max_targets: u32,
        fill: Option<wgpu::Color>,
    ) -> Result<Self, FieldError> {
        let field = VolumeField::allocate(device, extent, "field")?;
        let tile_map = LayerTileMap::new(extent.depth, max_targets);
        if let Some(color) = fill {
            clear_field(device, queue, &field, &tile_map, color);
        }
        Ok(Self {
            frames: Frames::Single(field),
            current: 0,
            tile_map,
        })
    }

    pub fn extent(&self) -> GridExtent {
        self.current().extent()
    }

    pub fn tile_map(&self) -> &LayerTileMap {
        &self.tile_map
    }

    pub fn is_double(&self) -> bool {
        matches!(self.frames, Frames::Double(_))
    }

    /// The readable field holding the most recently completed state.
    pub fn current(&self) -> &VolumeField {
        match &self.frames {
            Frames::Single(field) => field,
            Frames::Double(pair) => &pair[self.current],
        }
    }

    /// Field by slot index, regardless of which one is current. Passes use
    /// this to build one bind group per ping-pong orientation up front.
    /// Single-buffered stores have only slot 0.
    pub fn field(&self, index: usize) -> &VolumeField {
        match &self.frames {
            Frames::Single(field) => field,
            Frames::Double(pair) => &pair[index],
        }
    }

    /// Index of the field a write pass would target; bind groups built per
    /// ping-pong orientation are selected by this.
    pub fn write_index(&self) -> usize {
        match &self.frames {
            Frames::Single(_) => 0,
            Frames::Double(_) => 1 - self.current,
        }
    }

    /// Open a write scope. The returned pass exposes the read and write
    /// fields; `current` flips only when the pass commits.
    pub fn begin_write(&mut self) -> WritePass<'_> {
        WritePass {
            store: self,
            committed: false,
        }
    }

    /// Reallocate at a new 2D footprint. Depth is fixed at allocation
    /// time, so the tile map never changes. Contents are discarded and
    /// passes built against the old fields must be rebuilt.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> Result<(), FieldError> {
        let extent = GridExtent::new(width, height, self.tile_map.depth());
        self.frames = match &self.frames {
            Frames::Single(_) => Frames::Single(VolumeField::allocate(device, extent, "field")?),
            Frames::Double(_) => Frames::Double([
                VolumeField::allocate(device, extent, "field_a")?,
                VolumeField::allocate(device, extent, "field_b")?,
            ]),
        };
        self.current = 0;
        Ok(())
    }

    /// Tiled clear of the write buffer (then flip, for double stores).
    pub fn clear(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, color: wgpu::Color) {
        let pass = self.begin_write();
        clear_field(device, queue, pass.write(), pass.tile_map(), color);
        pass.commit();
    }
}

/// Scope of one full-depth write operation.
///
/// Dropping the pass without [`WritePass::commit`] aborts: the previous
/// state stays readable and no flip occurs.
pub struct WritePass<'s> {
    store: &'s mut VolumeStore,
    committed: bool,
}

impl WritePass<'_> {
    /// The field to read from (the completed state).
    pub fn read(&self) -> &VolumeField {
        self.store.current()
    }

    /// The field to write into.
    pub fn write(&self) -> &VolumeField {
        match &self.store.frames {
            Frames::Single(field) => field,
            Frames::Double(pair) => &pair[1 - self.store.current],
        }
    }

    /// Which slot is being written; selects the ping-pong bind group.
    pub fn write_index(&self) -> usize {
        self.store.write_index()
    }

    pub fn tile_map(&self) -> &LayerTileMap {
        &self.store.tile_map
    }

    /// Mark the write complete. The flip happens at scope exit.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for WritePass<'_> {
    fn drop(&mut self) {
        if self.committed && matches!(self.store.frames, Frames::Double(_)) {
            self.store.current = 1 - self.store.current;
        }
    }
}

fn clear_field(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    field: &VolumeField,
    tile_map: &LayerTileMap,
    color: wgpu::Color,
) {
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("field_clear_encoder"),
    });
    for span in tile_map.spans() {
        let views: Vec<&wgpu::TextureView> = (span.start_z..span.start_z + span.layers)
            .map(|z| field.layer_view(z))
            .collect();
        clear_targets(&mut encoder, &views, color);
    }
    queue.submit(std::iter::once(encoder.finish()));
}

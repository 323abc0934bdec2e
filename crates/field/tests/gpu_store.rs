//! Allocation and buffer-flip behavior against a real device. Each test
//! skips when no adapter is available.

use morphogen_common::GridExtent;
use morphogen_field::{FieldError, VolumeField, VolumeStore};
use morphogen_gpu::GpuContext;

fn headless() -> Option<GpuContext> {
    match GpuContext::headless() {
        Ok(gpu) => Some(gpu),
        Err(e) => {
            eprintln!("skipping GPU test: {e}");
            None
        }
    }
}

#[test]
fn oversized_extent_is_reported_not_truncated() {
    let Some(gpu) = headless() else { return };
    let limit = gpu.device.limits().max_texture_array_layers;
    let result = VolumeField::allocate(
        &gpu.device,
        GridExtent::new(8, 8, limit + 1),
        "too_deep",
    );
    match result {
        Err(FieldError::ExtentExceedsLimit {
            axis, requested, ..
        }) => {
            assert_eq!(axis, "depth");
            assert_eq!(requested, limit + 1);
        }
        Ok(_) => panic!("allocation beyond device limits must fail"),
        Err(e) => panic!("unexpected error: {e}"),
    }
}

#[test]
fn zero_extent_is_rejected() {
    let Some(gpu) = headless() else { return };
    assert!(VolumeField::allocate(&gpu.device, GridExtent::new(0, 8, 8), "empty").is_err());
}

#[test]
fn fill_color_reaches_every_layer() {
    let Some(gpu) = headless() else { return };
    let fill = wgpu::Color {
        r: 1.0,
        g: 0.25,
        b: 0.0,
        a: 0.0,
    };
    let store = VolumeStore::double(
        &gpu.device,
        &gpu.queue,
        GridExtent::cube(16),
        gpu.max_targets(),
        Some(fill),
    )
    .expect("allocate");
    for z in [0, 7, 15] {
        let texels = store
            .current()
            .read_layer(&gpu.device, &gpu.queue, z)
            .expect("readback");
        assert_eq!(texels.len(), 256);
        for texel in texels {
            assert_eq!(texel[0], 1.0);
            assert_eq!(texel[1], 0.25);
        }
    }
}

#[test]
fn dropped_write_pass_does_not_flip() {
    let Some(gpu) = headless() else { return };
    let mut store = VolumeStore::double(
        &gpu.device,
        &gpu.queue,
        GridExtent::cube(8),
        gpu.max_targets(),
        None,
    )
    .expect("allocate");
    let before = store.write_index();
    {
        let _pass = store.begin_write();
        // Aborted: no commit.
    }
    assert_eq!(store.write_index(), before);

    let pass = store.begin_write();
    pass.commit();
    assert_ne!(store.write_index(), before);
}

#[test]
fn clear_writes_the_alternate_buffer_and_flips() {
    let Some(gpu) = headless() else { return };
    let first = wgpu::Color {
        r: 0.1,
        g: 0.2,
        b: 0.0,
        a: 0.0,
    };
    let second = wgpu::Color {
        r: 0.9,
        g: 0.8,
        b: 0.0,
        a: 0.0,
    };
    let mut store = VolumeStore::double(
        &gpu.device,
        &gpu.queue,
        GridExtent::cube(8),
        gpu.max_targets(),
        Some(first),
    )
    .expect("allocate");
    store.clear(&gpu.device, &gpu.queue, second);
    let texels = store
        .current()
        .read_layer(&gpu.device, &gpu.queue, 3)
        .expect("readback");
    for texel in texels {
        assert!((texel[0] - 0.9).abs() < 1e-6);
        assert!((texel[1] - 0.8).abs() < 1e-6);
    }
}

#[test]
fn resize_keeps_depth_and_tile_map() {
    let Some(gpu) = headless() else { return };
    let mut store = VolumeStore::double(
        &gpu.device,
        &gpu.queue,
        GridExtent::new(8, 8, 12),
        gpu.max_targets(),
        None,
    )
    .expect("allocate");
    let tiles = store.tile_map().tiles();
    store.resize(&gpu.device, 32, 24).expect("resize");
    assert_eq!(store.extent(), GridExtent::new(32, 24, 12));
    assert_eq!(store.tile_map().tiles(), tiles);
}

#[test]
fn single_buffered_store_never_flips() {
    let Some(gpu) = headless() else { return };
    let mut store = VolumeStore::single(
        &gpu.device,
        &gpu.queue,
        GridExtent::cube(8),
        gpu.max_targets(),
        None,
    )
    .expect("allocate");
    assert!(!store.is_double());
    let pass = store.begin_write();
    pass.commit();
    assert_eq!(store.write_index(), 0);
}

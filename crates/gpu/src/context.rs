/// Bytes per texel of the volumetric field format (rgba32float). The
/// per-pass target cap depends on it, so it lives with the cap derivation.
const FIELD_TEXEL_BYTES: u32 = 16;

/// Errors raised while acquiring the GPU.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("no compatible GPU adapter found")]
    AdapterUnavailable,
    #[error("required GPU capability missing: {0}")]
    MissingCapability(&'static str),
    #[error("device request failed: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// How many color targets a single pass may write, given the device limits
/// and the bytes-per-texel of the attachment format. Never below 1.
pub fn color_target_cap(limits: &wgpu::Limits, bytes_per_texel: u32) -> u32 {
    (limits.max_color_attachment_bytes_per_sample / bytes_per_texel)
        .min(limits.max_color_attachments)
        .max(1)
}

/// Owned device/queue plus the capability facts the passes need.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    adapter: wgpu::Adapter,
    max_targets: u32,
    features: wgpu::Features,
}

impl GpuContext {
    /// Acquire a device suitable for on-screen display.
    ///
    /// Requires float32-filterable texture sampling (the raycaster filters
    /// the rgba32float field); missing support is fatal at startup. Limits
    /// are requested at the adapter's own values so the simultaneous-target
    /// cap is not clamped to the conservative defaults.
    pub fn new(
        instance: &wgpu::Instance,
        surface: Option<&wgpu::Surface<'_>>,
    ) -> Result<Self, GpuError> {
        Self::request(instance, surface, true)
    }

    /// Acquire a device with no surface, for offscreen use and tests.
    /// Filterable float sampling is requested when available but not
    /// required; [`GpuContext::supports_filterable_field`] reports it.
    pub fn headless() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        Self::request(&instance, None, false)
    }

    fn request(
        instance: &wgpu::Instance,
        surface: Option<&wgpu::Surface<'_>>,
        require_filterable: bool,
    ) -> Result<Self, GpuError> {
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        }))
        .ok_or(GpuError::AdapterUnavailable)?;

        let filterable = adapter
            .features()
            .contains(wgpu::Features::FLOAT32_FILTERABLE);
        if require_filterable && !filterable {
            return Err(GpuError::MissingCapability(
                "float32-filterable texture sampling",
            ));
        }
        let features = if filterable {
            wgpu::Features::FLOAT32_FILTERABLE
        } else {
            wgpu::Features::empty()
        };

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("morphogen_device"),
                required_features: features,
                required_limits: adapter.limits(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let max_targets = color_target_cap(&device.limits(), FIELD_TEXEL_BYTES);
        let info = adapter.get_info();
        tracing::info!(
            "GPU initialized: {} ({} backend), {} simultaneous field targets",
            info.name,
            info.backend.to_str(),
            max_targets,
        );

        Ok(Self {
            device,
            queue,
            adapter,
            max_targets,
            features,
        })
    }

    /// The adapter the device was created from (surface configuration).
    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Simultaneously writable field layers per pass (the tiling cap K).
    pub fn max_targets(&self) -> u32 {
        self.max_targets
    }

    /// Whether the granted device can linearly filter the field texture.
    pub fn supports_filterable_field(&self) -> bool {
        self.features.contains(wgpu::Features::FLOAT32_FILTERABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_limited_by_bytes_per_sample() {
        let limits = wgpu::Limits {
            max_color_attachments: 8,
            max_color_attachment_bytes_per_sample: 64,
            ..Default::default()
        };
        // 64 bytes / 16-byte texels = 4 targets even though 8 attachments fit.
        assert_eq!(color_target_cap(&limits, 16), 4);
    }

    #[test]
    fn cap_limited_by_attachment_count() {
        let limits = wgpu::Limits {
            max_color_attachments: 4,
            max_color_attachment_bytes_per_sample: 256,
            ..Default::default()
        };
        assert_eq!(color_target_cap(&limits, 16), 4);
    }

    #[test]
    fn cap_never_zero() {
        let limits = wgpu::Limits {
            max_color_attachments: 8,
            max_color_attachment_bytes_per_sample: 8,
            ..Default::default()
        };
        assert_eq!(color_target_cap(&limits, 16), 1);
    }
}

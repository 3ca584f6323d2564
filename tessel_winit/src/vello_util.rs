// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! GPU devices and window surfaces for rendering Vello scenes.

use tessel_core::vello::{Error, wgpu};
use wgpu::util::{TextureBlitter, TextureBlitterBuilder};
use wgpu::{
    Adapter, BlendComponent, BlendFactor, BlendOperation, BlendState, Device, Instance, Limits,
    Queue, Surface, SurfaceConfiguration, SurfaceTarget, Texture, TextureFormat, TextureView,
};

/// The wgpu instance plus every device opened so far.
///
/// Windows share a device whenever its adapter can present to their surface.
pub(crate) struct RenderContext {
    instance: Instance,
    pub(crate) devices: Vec<DeviceHandle>,
}

pub(crate) struct DeviceHandle {
    adapter: Adapter,
    pub(crate) device: Device,
    pub(crate) queue: Queue,
}

impl RenderContext {
    pub(crate) fn new() -> Self {
        let instance = Instance::new(&wgpu::InstanceDescriptor::from_env_or_default());
        Self {
            instance,
            devices: Vec::new(),
        }
    }

    /// Create a surface presenting to `window`.
    pub(crate) async fn create_surface<'w>(
        &mut self,
        window: impl Into<SurfaceTarget<'w>>,
        width: u32,
        height: u32,
        present_mode: wgpu::PresentMode,
    ) -> Result<RenderSurface<'w>, Error> {
        let surface = self.instance.create_surface(window.into())?;
        let dev_id = self
            .device(&surface)
            .await
            .ok_or(Error::NoCompatibleDevice)?;

        let device_handle = &self.devices[dev_id];
        let format = surface
            .get_capabilities(&device_handle.adapter)
            .formats
            .into_iter()
            .find(|it| matches!(it, TextureFormat::Rgba8Unorm | TextureFormat::Bgra8Unorm))
            .ok_or(Error::UnsupportedSurfaceFormat)?;

        let config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode,
            desired_maximum_frame_latency: 2,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
        };
        let (target_texture, target_view) = create_targets(width, height, &device_handle.device);
        // Vello produces premultiplied output; the blit undoes that for opaque surfaces.
        let blitter = TextureBlitterBuilder::new(&device_handle.device, format)
            .blend_state(BlendState {
                alpha: BlendComponent::REPLACE,
                color: BlendComponent {
                    src_factor: BlendFactor::SrcAlpha,
                    dst_factor: BlendFactor::Zero,
                    operation: BlendOperation::Add,
                },
            })
            .build();
        let surface = RenderSurface {
            surface,
            config,
            dev_id,
            target_texture,
            target_view,
            blitter,
        };
        self.configure_surface(&surface);
        Ok(surface)
    }

    pub(crate) fn resize_surface(&self, surface: &mut RenderSurface<'_>, width: u32, height: u32) {
        let (texture, view) = create_targets(width, height, &self.devices[surface.dev_id].device);
        surface.target_texture = texture;
        surface.target_view = view;
        surface.config.width = width;
        surface.config.height = height;
        self.configure_surface(surface);
    }

    fn configure_surface(&self, surface: &RenderSurface<'_>) {
        let device = &self.devices[surface.dev_id].device;
        surface.surface.configure(device, &surface.config);
    }

    /// Index of a device that can present to `surface`, opening one if needed.
    async fn device(&mut self, surface: &Surface<'_>) -> Option<usize> {
        if let Some(index) = self
            .devices
            .iter()
            .position(|device| device.adapter.is_surface_supported(surface))
        {
            return Some(index);
        }
        let adapter = wgpu::util::initialize_adapter_from_env_or_default(&self.instance, Some(surface))
            .await
            .ok()?;
        let required_features = adapter.features() & wgpu::Features::CLEAR_TEXTURE;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("tessel"),
                required_features,
                required_limits: Limits::default(),
                ..Default::default()
            })
            .await
            .ok()?;
        tracing::info!(adapter = ?adapter.get_info().name, "opened GPU device");
        self.devices.push(DeviceHandle {
            adapter,
            device,
            queue,
        });
        Some(self.devices.len() - 1)
    }
}

/// Vello renders with a compute shader, which usually can't write to a surface texture
/// directly, so it renders into this intermediate texture which is then blitted.
fn create_targets(width: u32, height: u32, device: &Device) -> (Texture, TextureView) {
    let target_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("tessel target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
        format: TextureFormat::Rgba8Unorm,
        view_formats: &[],
    });
    let target_view = target_texture.create_view(&wgpu::TextureViewDescriptor::default());
    (target_texture, target_view)
}

/// A window's surface and the texture Vello renders into before presenting.
pub(crate) struct RenderSurface<'s> {
    pub(crate) surface: Surface<'s>,
    pub(crate) config: SurfaceConfiguration,
    pub(crate) dev_id: usize,
    target_texture: Texture,
    pub(crate) target_view: TextureView,
    pub(crate) blitter: TextureBlitter,
}

impl std::fmt::Debug for RenderSurface<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSurface")
            .field("config", &self.config)
            .field("dev_id", &self.dev_id)
            .field("target_texture", &self.target_texture)
            .finish_non_exhaustive()
    }
}

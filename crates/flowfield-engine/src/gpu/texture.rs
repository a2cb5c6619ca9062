use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::interop::{Owner, ResourceId, SharedToken, TokenRef};

/// A 3-D texture owned by the render pipeline, sampled by materials and
/// (after import) read by compute kernels.
#[derive(Debug)]
pub struct GraphicsTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    extent: wgpu::Extent3d,
    token: Arc<SharedToken>,
}

impl GraphicsTexture {
    pub const VOLUME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

    /// Uploads an `Rgba32Float` volume of `dims` texels (x fastest, then y, then z).
    pub fn volume(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        dims: [u32; 3],
        texels: &[[f32; 4]],
    ) -> Self {
        debug_assert_eq!(
            texels.len() as u64,
            dims.iter().map(|&d| d as u64).product::<u64>(),
            "texel count does not match volume dimensions"
        );

        let extent = wgpu::Extent3d {
            width: dims[0].max(1),
            height: dims[1].max(1),
            depth_or_array_layers: dims[2].max(1),
        };

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: extent,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D3,
                format: Self::VOLUME_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            bytemuck::cast_slice(texels),
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::D3),
            ..Default::default()
        });

        Self {
            texture,
            view,
            extent,
            token: SharedToken::new(label),
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn extent(&self) -> wgpu::Extent3d {
        self.extent
    }

    pub fn dims(&self) -> [u32; 3] {
        [
            self.extent.width,
            self.extent.height,
            self.extent.depth_or_array_layers,
        ]
    }

    pub fn id(&self) -> ResourceId {
        self.token.id()
    }

    pub fn label(&self) -> &str {
        self.token.label()
    }

    pub fn owner(&self) -> Owner {
        self.token.owner()
    }

    pub(crate) fn share(&self) -> TokenRef {
        SharedToken::downgrade(&self.token)
    }

    pub fn destroy(self) {
        log::debug!("destroying texture `{}` ({})", self.label(), self.id());
        self.texture.destroy();
    }
}

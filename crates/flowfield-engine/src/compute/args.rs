use super::{BindingKind, ComputeBuffer, ComputeError, ComputeImage, KernelBinding, KernelBuffer, KernelBufferKind};
use crate::interop::SharedAlias;

/// One positional resource argument.
#[derive(Debug, Clone, Copy)]
pub enum KernelArg<'a> {
    Shared(&'a ComputeBuffer),
    Private(&'a KernelBuffer),
    Image(&'a ComputeImage),
}

/// Shape of an argument, used to check it against the kernel's binding table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ArgKind {
    StorageBuffer,
    UniformBuffer,
    Texture(wgpu::TextureViewDimension),
    /// The packed scalar block.
    Scalars,
}

/// Kernel arguments for one dispatch, bound positionally.
///
/// Resources take bindings `0..n` in the order they were added. Scalars are
/// packed, in order, into a single uniform block bound right after the last
/// resource, so `.f32(a).f32(b)` matches `struct { a: f32, b: f32 }`.
#[derive(Debug, Default, Clone)]
pub struct KernelArgs<'a> {
    resources: Vec<KernelArg<'a>>,
    scalars: Vec<u32>,
}

impl<'a> KernelArgs<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Imported graphics buffer; acquired for the dispatch.
    pub fn buffer(mut self, buffer: &'a ComputeBuffer) -> Self {
        self.resources.push(KernelArg::Shared(buffer));
        self
    }

    /// Compute-private buffer.
    pub fn private(mut self, buffer: &'a KernelBuffer) -> Self {
        self.resources.push(KernelArg::Private(buffer));
        self
    }

    /// Imported graphics texture; acquired for the dispatch.
    pub fn image(mut self, image: &'a ComputeImage) -> Self {
        self.resources.push(KernelArg::Image(image));
        self
    }

    pub fn f32(mut self, v: f32) -> Self {
        self.scalars.push(v.to_bits());
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.scalars.push(v);
        self
    }

    pub fn resources(&self) -> &[KernelArg<'a>] {
        &self.resources
    }

    /// Everything that needs an interop acquire, in argument order.
    pub fn shared_aliases(&self) -> Vec<&'a dyn SharedAlias> {
        self.resources
            .iter()
            .filter_map(|arg| match *arg {
                KernelArg::Shared(b) => Some(b as &dyn SharedAlias),
                KernelArg::Image(i) => Some(i as &dyn SharedAlias),
                KernelArg::Private(_) => None,
            })
            .collect()
    }

    /// Scalar block bytes, padded to a 16-byte multiple. Empty when no scalars were added.
    pub fn scalar_bytes(&self) -> Vec<u8> {
        if self.scalars.is_empty() {
            return Vec::new();
        }
        let mut words = self.scalars.clone();
        words.resize(self.scalars.len().next_multiple_of(4), 0);
        bytemuck::cast_slice(&words).to_vec()
    }

    pub fn signature(&self) -> Vec<ArgKind> {
        let mut kinds: Vec<ArgKind> = self
            .resources
            .iter()
            .map(|arg| match arg {
                KernelArg::Shared(_) => ArgKind::StorageBuffer,
                KernelArg::Private(b) => match b.kind() {
                    KernelBufferKind::Storage => ArgKind::StorageBuffer,
                    KernelBufferKind::Uniform => ArgKind::UniformBuffer,
                },
                KernelArg::Image(_) => ArgKind::Texture(wgpu::TextureViewDimension::D3),
            })
            .collect();
        if !self.scalars.is_empty() {
            kinds.push(ArgKind::Scalars);
        }
        kinds
    }
}

/// Checks a positional argument signature against the kernel's binding table.
pub(crate) fn check_signature(
    bindings: &[KernelBinding],
    signature: &[ArgKind],
) -> Result<(), ComputeError> {
    if bindings.len() != signature.len() {
        return Err(ComputeError::ArgumentCount {
            expected: bindings.len(),
            given: signature.len(),
        });
    }

    for (index, (b, &given)) in bindings.iter().zip(signature).enumerate() {
        let ok = match (b.kind, given) {
            (BindingKind::StorageBuffer { .. }, ArgKind::StorageBuffer) => true,
            (BindingKind::UniformBuffer, ArgKind::UniformBuffer | ArgKind::Scalars) => true,
            (BindingKind::SampledTexture { dimension, .. }, ArgKind::Texture(d)) => dimension == d,
            _ => false,
        };
        if !ok {
            return Err(ComputeError::ArgumentMismatch {
                index,
                binding: b.binding,
                expected: b.kind,
                given,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle_bindings() -> Vec<KernelBinding> {
        [
            BindingKind::StorageBuffer { read_only: false },
            BindingKind::StorageBuffer { read_only: false },
            BindingKind::SampledTexture {
                dimension: wgpu::TextureViewDimension::D3,
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
            },
            BindingKind::UniformBuffer,
            BindingKind::UniformBuffer,
        ]
        .into_iter()
        .enumerate()
        .map(|(i, kind)| KernelBinding {
            binding: i as u32,
            kind,
        })
        .collect()
    }

    #[test]
    fn scalars_pack_in_order_and_pad() {
        let args = KernelArgs::new().f32(0.25).f32(2.0);
        let bytes = args.scalar_bytes();
        assert_eq!(bytes.len(), 16);
        let words: &[f32] = bytemuck::cast_slice(&bytes);
        assert_eq!(&words[..2], &[0.25, 2.0]);
        assert_eq!(args.signature(), vec![ArgKind::Scalars]);
    }

    #[test]
    fn no_scalars_means_no_block() {
        let args = KernelArgs::new();
        assert!(args.scalar_bytes().is_empty());
        assert!(args.signature().is_empty());
    }

    #[test]
    fn particle_signature_matches() {
        let sig = [
            ArgKind::StorageBuffer,
            ArgKind::StorageBuffer,
            ArgKind::Texture(wgpu::TextureViewDimension::D3),
            ArgKind::UniformBuffer,
            ArgKind::Scalars,
        ];
        check_signature(&particle_bindings(), &sig).unwrap();
    }

    #[test]
    fn swapped_arguments_are_reported_by_position() {
        let sig = [
            ArgKind::StorageBuffer,
            ArgKind::Texture(wgpu::TextureViewDimension::D3),
            ArgKind::StorageBuffer,
            ArgKind::UniformBuffer,
            ArgKind::Scalars,
        ];
        match check_signature(&particle_bindings(), &sig) {
            Err(ComputeError::ArgumentMismatch { index, binding, .. }) => {
                assert_eq!((index, binding), (1, 1));
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_arguments_are_counted() {
        let sig = [ArgKind::StorageBuffer];
        assert!(matches!(
            check_signature(&particle_bindings(), &sig),
            Err(ComputeError::ArgumentCount {
                expected: 5,
                given: 1
            })
        ));
    }
}

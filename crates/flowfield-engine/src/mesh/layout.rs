use super::MeshError;

/// Interleaved `f32` vertex attributes, given as component counts per location.
///
/// `{4, 4, 2}` describes three attributes at locations 0, 1 and 2 with a stride
/// of 10 floats.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeLayout {
    components: Vec<u32>,
}

impl AttributeLayout {
    pub fn new(components: &[u32]) -> Result<Self, MeshError> {
        if components.is_empty() {
            return Err(MeshError::EmptyLayout);
        }
        if let Some((index, &components)) = components
            .iter()
            .enumerate()
            .find(|(_, c)| !(1..=4).contains(*c))
        {
            return Err(MeshError::BadComponents { index, components });
        }
        Ok(Self {
            components: components.to_vec(),
        })
    }

    pub fn components(&self) -> &[u32] {
        &self.components
    }

    /// Floats per vertex.
    pub fn stride(&self) -> u32 {
        self.components.iter().sum()
    }

    pub fn stride_bytes(&self) -> u64 {
        self.stride() as u64 * std::mem::size_of::<f32>() as u64
    }

    pub fn vertex_count(&self, floats: usize) -> Result<u32, MeshError> {
        let stride = self.stride();
        if floats % stride as usize != 0 {
            return Err(MeshError::Misaligned {
                len: floats,
                stride,
            });
        }
        Ok((floats / stride as usize) as u32)
    }

    pub fn attributes(&self) -> Vec<wgpu::VertexAttribute> {
        let mut offset = 0u64;
        self.components
            .iter()
            .enumerate()
            .map(|(location, &n)| {
                let attr = wgpu::VertexAttribute {
                    format: match n {
                        1 => wgpu::VertexFormat::Float32,
                        2 => wgpu::VertexFormat::Float32x2,
                        3 => wgpu::VertexFormat::Float32x3,
                        _ => wgpu::VertexFormat::Float32x4,
                    },
                    offset,
                    shader_location: location as u32,
                };
                offset += n as u64 * 4;
                attr
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn particle_layout_has_ten_float_stride() {
        let layout = AttributeLayout::new(&[4, 4, 2]).unwrap();
        assert_eq!(layout.stride(), 10);
        assert_eq!(layout.stride_bytes(), 40);
        assert_eq!(layout.vertex_count(1000 * 10).unwrap(), 1000);

        let offsets: Vec<_> = layout.attributes().iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 16, 32]);
        assert_eq!(layout.attributes()[2].format, wgpu::VertexFormat::Float32x2);
    }

    #[test]
    fn rejects_bad_layouts() {
        assert_eq!(AttributeLayout::new(&[]), Err(MeshError::EmptyLayout));
        assert_eq!(
            AttributeLayout::new(&[4, 0]),
            Err(MeshError::BadComponents {
                index: 1,
                components: 0
            })
        );
        assert!(AttributeLayout::new(&[5]).is_err());
    }

    #[test]
    fn data_must_divide_by_stride() {
        let layout = AttributeLayout::new(&[4, 3]).unwrap();
        assert_eq!(
            layout.vertex_count(15),
            Err(MeshError::Misaligned { len: 15, stride: 7 })
        );
    }
}

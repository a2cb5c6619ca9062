use glam::Vec3;

use super::VectorField;

/// A swirl around the Y axis with a slight updraft, normalized per texel.
///
/// Used when no field file is configured.
pub fn vortex(dims: [u32; 3]) -> VectorField {
    let dims = dims.map(|d| d.max(2));
    let [nx, ny, nz] = dims;
    let coord = |i: u32, n: u32| i as f32 / (n - 1) as f32 * 2.0 - 1.0;

    let mut texels = Vec::with_capacity((nx * ny * nz) as usize);
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                let p = Vec3::new(coord(x, nx), coord(y, ny), coord(z, nz));
                let swirl = Vec3::new(-p.z, 0.0, p.x);
                let pull = -p * 0.3;
                let v = (swirl + pull + Vec3::new(0.0, 0.25 * (1.0 - p.y.abs()), 0.0))
                    .normalize_or_zero();
                texels.push([v.x, v.y, v.z, 1.0]);
            }
        }
    }

    VectorField {
        dims,
        min: Vec3::splat(-1.0),
        max: Vec3::ONE,
        texels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_every_texel() {
        let f = vortex([8, 4, 8]);
        assert_eq!(f.len(), 8 * 4 * 8);
        assert!(f.texels.iter().all(|t| t[3] == 1.0));
        let len = Vec3::from_slice(&f.at(0, 1, 0).unwrap()[..3]).length();
        assert!((len - 1.0).abs() < 1e-4);
    }
}

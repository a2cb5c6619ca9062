use rand::Rng;

/// Floats per particle record: position (4), velocity (4), age and lifetime.
pub const PARTICLE_STRIDE: usize = 10;
/// Component counts of the particle record as vertex attributes.
pub const PARTICLE_ATTRIBUTES: [u32; 3] = [4, 4, 2];
/// Upper bound of the initial lifetime.
pub const MAX_LIFETIME: f32 = 100.0;

/// Fresh particle records: random position in the unit cube, at rest, age zero.
pub fn seed_particles<R: Rng + ?Sized>(rng: &mut R, count: u32) -> Vec<f32> {
    let mut data = Vec::with_capacity(count as usize * PARTICLE_STRIDE);
    for _ in 0..count {
        data.extend_from_slice(&[
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            1.0,
            0.0,
            0.0,
            0.0,
            1.0,
            0.0,
            rng.gen_range(0.0..=MAX_LIFETIME),
        ]);
    }
    data
}

/// Per-particle RNG state for the kernel: two words each.
pub fn seed_rng_state<R: Rng + ?Sized>(rng: &mut R, count: u32) -> Vec<u32> {
    (0..count as usize * 2)
        // Zero would stall the kernel's xorshift.
        .map(|_| rng.gen_range(1..=u32::MAX))
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn records_follow_the_initial_distribution() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in [1u32, 2, 1000] {
            let data = seed_particles(&mut rng, n);
            assert_eq!(data.len(), n as usize * PARTICLE_STRIDE);

            for p in data.chunks_exact(PARTICLE_STRIDE) {
                assert!(p[..3].iter().all(|c| (-1.0..=1.0).contains(c)));
                assert_eq!(p[3], 1.0);
                assert_eq!(&p[4..8], &[0.0, 0.0, 0.0, 1.0]);
                assert_eq!(p[8], 0.0);
                assert!((0.0..=MAX_LIFETIME).contains(&p[9]));
            }
        }
    }

    #[test]
    fn stride_matches_attribute_layout() {
        assert_eq!(PARTICLE_ATTRIBUTES.iter().sum::<u32>() as usize, PARTICLE_STRIDE);
    }

    #[test]
    fn rng_state_has_two_nonzero_words_per_particle() {
        let mut rng = StdRng::seed_from_u64(1);
        let seeds = seed_rng_state(&mut rng, 500);
        assert_eq!(seeds.len(), 1000);
        assert!(seeds.iter().all(|&s| s != 0));
    }
}

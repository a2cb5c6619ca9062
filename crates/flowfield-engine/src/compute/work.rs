/// Workgroup grid for a 1-D item count.
///
/// Counts above the per-dimension group limit fold into a second dimension; the
/// kernel recovers the flat index as `gid.x + gid.y * num_workgroups.x * size_x`
/// and bounds-checks it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WorkSize {
    pub items: u32,
    pub groups: [u32; 3],
}

impl WorkSize {
    pub fn for_items(items: u32, workgroup_size: [u32; 3], max_groups_per_dim: u32) -> Self {
        let per_group = workgroup_size.iter().product::<u32>().max(1);
        let groups = items.div_ceil(per_group);
        if groups == 0 {
            return Self {
                items,
                groups: [0, 0, 0],
            };
        }

        let x = groups.min(max_groups_per_dim.max(1));
        Self {
            items,
            groups: [x, groups.div_ceil(x), 1],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.contains(&0)
    }

    /// Total invocations launched (at least `items`).
    pub fn invocations(&self, workgroup_size: [u32; 3]) -> u64 {
        let per_group: u64 = workgroup_size.iter().map(|&d| d as u64).product();
        self.groups.iter().map(|&g| g as u64).product::<u64>() * per_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WG: [u32; 3] = [64, 1, 1];

    #[test]
    fn small_counts_stay_one_dimensional() {
        let w = WorkSize::for_items(1000, WG, 65_535);
        assert_eq!(w.groups, [16, 1, 1]);
        assert!(w.invocations(WG) >= 1000);
    }

    #[test]
    fn exact_multiple_does_not_overshoot() {
        assert_eq!(WorkSize::for_items(128, WG, 65_535).groups, [2, 1, 1]);
    }

    #[test]
    fn large_counts_fold_into_y() {
        let w = WorkSize::for_items(10_000_000, WG, 65_535);
        assert_eq!(w.groups[0], 65_535);
        assert_eq!(w.groups[1], 3);
        assert!(w.invocations(WG) >= 10_000_000);
    }

    #[test]
    fn zero_items_is_empty() {
        let w = WorkSize::for_items(0, WG, 65_535);
        assert!(w.is_empty());
    }
}

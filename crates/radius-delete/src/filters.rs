//! Category filter mask.

use bitflags::bitflags;
use radius_world::Category;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Categories eligible for removal in one invocation.
    ///
    /// The low five bits match the numbering the host UI has always stored.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DeleteFilters: u32 {
        const NETWORKS = 1;
        const BUILDINGS = 1 << 1;
        const TREES = 1 << 2;
        const PLANTS = 1 << 3;
        const PROPS = 1 << 4;
        const SURFACES = 1 << 5;
    }
}

impl DeleteFilters {
    /// The bit controlling `category`, or empty for [`Category::Unknown`].
    #[must_use]
    pub const fn for_category(category: Category) -> Self {
        match category {
            Category::Network => Self::NETWORKS,
            Category::Building => Self::BUILDINGS,
            Category::Tree => Self::TREES,
            Category::Plant => Self::PLANTS,
            Category::Prop => Self::PROPS,
            Category::Surface => Self::SURFACES,
            Category::Unknown => Self::empty(),
        }
    }

    /// Whether `category` may be deleted under this mask.
    #[must_use]
    pub const fn allows(self, category: Category) -> bool {
        let bit = Self::for_category(category);
        !bit.is_empty() && self.contains(bit)
    }

    /// Toggle membership: clear `bits` if all of them are set, otherwise set them.
    #[must_use]
    pub fn toggled(self, bits: Self) -> Self {
        if self.contains(bits) {
            self.difference(bits)
        } else {
            self.union(bits)
        }
    }
}

impl Default for DeleteFilters {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_category_maps_to_one_bit() {
        for category in Category::ALL {
            let bit = DeleteFilters::for_category(category);
            if category == Category::Unknown {
                assert!(bit.is_empty());
            } else {
                assert_eq!(bit.bits().count_ones(), 1, "{category}");
            }
        }
    }

    #[test]
    fn test_allows_matches_mask_for_every_category() {
        for category in Category::ALL {
            for bits in 0..=DeleteFilters::all().bits() {
                let mask = DeleteFilters::from_bits_truncate(bits);
                let expected = category != Category::Unknown
                    && mask.contains(DeleteFilters::for_category(category));
                assert_eq!(mask.allows(category), expected, "{category} / {bits:#b}");
            }
        }
    }

    #[test]
    fn test_toggle() {
        let mask = DeleteFilters::NETWORKS | DeleteFilters::TREES;

        assert_eq!(mask.toggled(DeleteFilters::TREES), DeleteFilters::NETWORKS);
        assert_eq!(
            mask.toggled(DeleteFilters::PROPS),
            DeleteFilters::NETWORKS | DeleteFilters::TREES | DeleteFilters::PROPS
        );
        // Partially set group gets completed rather than cleared.
        assert_eq!(
            mask.toggled(DeleteFilters::TREES | DeleteFilters::PLANTS),
            DeleteFilters::NETWORKS | DeleteFilters::TREES | DeleteFilters::PLANTS
        );
    }

    #[test]
    fn test_legacy_numbering() {
        assert_eq!(DeleteFilters::NETWORKS.bits(), 1);
        assert_eq!(DeleteFilters::PROPS.bits(), 16);
        assert_eq!(DeleteFilters::from_bits_truncate(31), DeleteFilters::all() - DeleteFilters::SURFACES);
        assert_eq!(DeleteFilters::from_bits_truncate(0xFFFF_FFFF), DeleteFilters::all());
    }
}

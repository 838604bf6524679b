use crate::raster_enum;

raster_enum! {
    /// Land cover classes, identified by their ESA CCI class ids.
    pub enum Cover: default None {
        None = (0, "none"),
        RainfedCropland = (10, "rainfed_cropland"),
        HerbaceousCover = (11, "herbaceous_cover"),
        TreeOrShrubCover = (12, "tree_or_shrub_cover"),
        IrrigatedCropland = (20, "irrigated_cropland"),
        CroplandWithVegetation = (30, "cropland_with_vegetation"),
        VegetationWithCropland = (40, "vegetation_with_cropland"),
        BroadleafEvergreen = (50, "broadleaf_evergreen"),
        BroadleafDeciduous = (60, "broadleaf_deciduous"),
        BroadleafDeciduousClosed = (61, "broadleaf_deciduous_closed"),
        BroadleafDeciduousOpen = (62, "broadleaf_deciduous_open"),
        NeedleLeafEvergreen = (70, "needle_leaf_evergreen"),
        NeedleLeafEvergreenClosed = (71, "needle_leaf_evergreen_closed"),
        NeedleLeafEvergreenOpen = (72, "needle_leaf_evergreen_open"),
        NeedleLeafDeciduous = (80, "needle_leaf_deciduous"),
        NeedleLeafDeciduousClosed = (81, "needle_leaf_deciduous_closed"),
        NeedleLeafDeciduousOpen = (82, "needle_leaf_deciduous_open"),
        MixedLeafType = (90, "mixed_leaf_type"),
        TreeAndShrubWithHerbaceousCover = (100, "tree_and_shrub_with_herbaceous_cover"),
        HerbaceousCoverWithTreeAndShrub = (110, "herbaceous_cover_with_tree_and_shrub"),
        Shrubland = (120, "shrubland"),
        ShrublandEvergreen = (121, "shrubland_evergreen"),
        ShrublandDeciduous = (122, "shrubland_deciduous"),
        Grassland = (130, "grassland"),
        LichensAndMosses = (140, "lichens_and_mosses"),
        SparseVegetation = (150, "sparse_vegetation"),
        SparseTree = (151, "sparse_tree"),
        SparseShrub = (152, "sparse_shrub"),
        SparseHerbaceousCover = (153, "sparse_herbaceous_cover"),
        FreshFloodedForest = (160, "fresh_flooded_forest"),
        SalineFloodedForest = (170, "saline_flooded_forest"),
        FloodedVegetation = (180, "flooded_vegetation"),
        Urban = (190, "urban"),
        Bare = (200, "bare"),
        BareConsolidated = (201, "bare_consolidated"),
        BareUnconsolidated = (202, "bare_unconsolidated"),
        Water = (210, "water"),
        PermanentSnow = (220, "permanent_snow"),
    }
}

impl Cover {
    pub fn is_water(self) -> bool {
        self == Cover::Water
    }

    pub fn is_snow(self) -> bool {
        self == Cover::PermanentSnow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::RasterEnum;

    #[test]
    fn test_lookup_by_id() {
        assert_eq!(Cover::by_id(0), Cover::None);
        assert_eq!(Cover::by_id(61), Cover::BroadleafDeciduousClosed);
        assert_eq!(Cover::by_id(210), Cover::Water);
        assert_eq!(Cover::by_id(220), Cover::PermanentSnow);
    }

    #[test]
    fn test_unknown_id_is_none() {
        assert_eq!(Cover::by_id(13), Cover::None);
        assert_eq!(Cover::by_id(255), Cover::None);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<u8> = Cover::VARIANTS.iter().map(|c| c.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), Cover::VARIANTS.len());
    }

    #[test]
    fn test_names() {
        assert_eq!(Cover::Urban.name(), "urban");
        assert_eq!(Cover::DEFAULT, Cover::None);
        assert!(Cover::Water.is_water());
        assert!(!Cover::Bare.is_water());
    }
}

use crate::raster_enum;

/// USDA soil taxonomy order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoilOrder {
    None,
    Gelisol,
    Histosol,
    Spodosol,
    Andisol,
    Oxisol,
    Vertisol,
    Aridisol,
    Ultisol,
    Mollisol,
    Alfisol,
    Inceptisol,
    Entisol,
}

raster_enum! {
    /// USDA soil taxonomy suborder. Id 255 marks missing data.
    pub enum SoilSuborder: default None {
        None = (255, "none"),
        Ocean = (0, "ocean"),
        ShiftingSand = (1, "shifting_sand"),
        Rock = (2, "rock"),
        Ice = (3, "ice"),
        Histels = (5, "histels"),
        Turbels = (6, "turbels"),
        Orthels = (7, "orthels"),
        Folists = (10, "folists"),
        Fibrists = (11, "fibrists"),
        Hemists = (12, "hemists"),
        Saprists = (13, "saprists"),
        Aquods = (15, "aquods"),
        Cryods = (16, "cryods"),
        Humods = (17, "humods"),
        Orthods = (18, "orthods"),
        Gelods = (19, "gelods"),
        Aquands = (20, "aquands"),
        Cryands = (21, "cryands"),
        Torrands = (22, "torrands"),
        Xerands = (23, "xerands"),
        Vitrands = (24, "vitrands"),
        Ustands = (25, "ustands"),
        Udands = (26, "udands"),
        Gelands = (27, "gelands"),
        Aquox = (30, "aquox"),
        Torrox = (31, "torrox"),
        Ustox = (32, "ustox"),
        Perox = (33, "perox"),
        Udox = (34, "udox"),
        Aquerts = (40, "aquerts"),
        Cryerts = (41, "cryerts"),
        Xererts = (42, "xererts"),
        Torrerts = (43, "torrerts"),
        Usterts = (44, "usterts"),
        Uderts = (45, "uderts"),
        Cryids = (50, "cryids"),
        Salids = (51, "salids"),
        Durids = (52, "durids"),
        Gypsids = (53, "gypsids"),
        Argids = (54, "argids"),
        Calcids = (55, "calcids"),
        Cambids = (56, "cambids"),
        Aquults = (60, "aquults"),
        Humults = (61, "humults"),
        Udults = (62, "udults"),
        Ustults = (63, "ustults"),
        Xerults = (64, "xerults"),
        Borolls = (69, "borolls"),
        Albolls = (70, "albolls"),
        Aquolls = (71, "aquolls"),
        Rendolls = (72, "rendolls"),
        Xerolls = (73, "xerolls"),
        Cryolls = (74, "cryolls"),
        Ustolls = (75, "ustolls"),
        Udolls = (76, "udolls"),
        Gelolls = (77, "gelolls"),
        Aqualfs = (80, "aqualfs"),
        Cryalfs = (81, "cryalfs"),
        Ustalfs = (82, "ustalfs"),
        Xeralfs = (83, "xeralfs"),
        Udalfs = (84, "udalfs"),
        Udepts = (85, "udepts"),
        Gelepts = (86, "gelepts"),
        Ochrepts = (89, "ochrepts"),
        Aquepts = (90, "aquepts"),
        Anthrepts = (91, "anthrepts"),
        Cryepts = (92, "cryepts"),
        Ustepts = (93, "ustepts"),
        Xerepts = (94, "xerepts"),
        Aquents = (95, "aquents"),
        Arents = (96, "arents"),
        Psamments = (97, "psamments"),
        Fluvents = (98, "fluvents"),
        Orthents = (99, "orthents"),
    }
}

impl SoilSuborder {
    pub fn order(self) -> SoilOrder {
        use SoilSuborder::*;
        match self {
            None | Ocean | ShiftingSand | Rock | Ice => SoilOrder::None,
            Histels | Turbels | Orthels => SoilOrder::Gelisol,
            Folists | Fibrists | Hemists | Saprists => SoilOrder::Histosol,
            Aquods | Cryods | Humods | Orthods | Gelods => SoilOrder::Spodosol,
            Aquands
            | Cryands
            | Torrands
            | Xerands
            | Vitrands
            | Ustands
            | Udands
            | Gelands => SoilOrder::Andisol,
            Aquox | Torrox | Ustox | Perox | Udox => SoilOrder::Oxisol,
            Aquerts | Cryerts | Xererts | Torrerts | Usterts | Uderts => SoilOrder::Vertisol,
            Cryids | Salids | Durids | Gypsids | Argids | Calcids | Cambids => SoilOrder::Aridisol,
            Aquults | Humults | Udults | Ustults | Xerults => SoilOrder::Ultisol,
            Borolls
            | Albolls
            | Aquolls
            | Rendolls
            | Xerolls
            | Cryolls
            | Ustolls
            | Udolls => SoilOrder::Mollisol,
            Gelolls | Aqualfs | Cryalfs | Ustalfs | Xeralfs | Udalfs => SoilOrder::Alfisol,
            Udepts
            | Gelepts
            | Ochrepts
            | Aquepts
            | Anthrepts
            | Cryepts
            | Ustepts
            | Xerepts => SoilOrder::Inceptisol,
            Aquents | Arents | Psamments | Fluvents | Orthents => SoilOrder::Entisol,
        }
    }
}

//! Category resolution: raw replay ids → semantic categories.
//!
//! The lookup tables are intentionally partial. Only the units, buildings and
//! technologies that feed the tracked statistics are listed; every other id
//! resolves to `None` and is dropped by the caller.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// Raw numeric object/technology id as it appears in the replay stream.
pub type RawId = u32;

// ---------------------------------------------------------------------------
// Domains and subclasses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Economic,
    Military,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitClass {
    Worker,
    Infantry,
    Cavalry,
    Archer,
    Monk,
    Siege,
}

impl UnitClass {
    pub fn domain(self) -> Domain {
        match self {
            UnitClass::Worker => Domain::Economic,
            UnitClass::Infantry
            | UnitClass::Cavalry
            | UnitClass::Archer
            | UnitClass::Monk
            | UnitClass::Siege => Domain::Military,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingClass {
    Economic,
    Military,
    /// Walls and gates. Military domain, but counted in their own snapshot slot.
    Wall,
}

impl BuildingClass {
    pub fn domain(self) -> Domain {
        match self {
            BuildingClass::Economic => Domain::Economic,
            BuildingClass::Military | BuildingClass::Wall => Domain::Military,
        }
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum_macros::EnumIter,
    strum_macros::EnumCount,
    strum_macros::IntoStaticStr,
)]
pub enum Unit {
    Villager,
    Militia,
    Spearman,
    #[strum(serialize = "Eagle Scout")]
    Eagle,
    Knight,
    #[strum(serialize = "Scout Cavalry")]
    Scout,
    #[strum(serialize = "Camel Rider")]
    Camel,
    #[strum(serialize = "Battle Elephant")]
    BattleElephant,
    Archer,
    Skirmisher,
    #[strum(serialize = "Cavalry Archer")]
    CavalryArcher,
    Monk,
    Mangonel,
    #[strum(serialize = "Organ Gun")]
    OrganGun,
    #[strum(serialize = "Battering Ram")]
    BatteringRam,
    Trebuchet,
}

impl Unit {
    pub fn class(self) -> UnitClass {
        match self {
            Unit::Villager => UnitClass::Worker,
            Unit::Militia | Unit::Spearman | Unit::Eagle => UnitClass::Infantry,
            Unit::Knight | Unit::Scout | Unit::Camel | Unit::BattleElephant => UnitClass::Cavalry,
            Unit::Archer | Unit::Skirmisher | Unit::CavalryArcher => UnitClass::Archer,
            Unit::Monk => UnitClass::Monk,
            Unit::Mangonel | Unit::OrganGun | Unit::BatteringRam | Unit::Trebuchet => {
                UnitClass::Siege
            }
        }
    }

    pub fn domain(self) -> Domain {
        self.class().domain()
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum_macros::EnumIter,
    strum_macros::EnumCount,
    strum_macros::IntoStaticStr,
)]
pub enum Building {
    Dock,
    Farm,
    House,
    Mill,
    Market,
    #[strum(serialize = "Town Center")]
    TownCenter,
    #[strum(serialize = "Lumber Camp")]
    LumberCamp,
    #[strum(serialize = "Mining Camp")]
    MiningCamp,
    University,
    #[strum(serialize = "Archery Range")]
    ArcheryRange,
    Barracks,
    #[strum(serialize = "Siege Workshop")]
    SiegeWorkshop,
    Castle,
    Stable,
    #[strum(serialize = "Watch Tower")]
    WatchTower,
    Monastery,
    Blacksmith,
    #[strum(serialize = "Palisade Wall")]
    PalisadeWall,
    #[strum(serialize = "Stone Wall")]
    StoneWall,
    #[strum(serialize = "Fortified Wall")]
    FortifiedWall,
    Gate,
}

impl Building {
    pub fn class(self) -> BuildingClass {
        match self {
            Building::Dock
            | Building::Farm
            | Building::House
            | Building::Mill
            | Building::Market
            | Building::TownCenter
            | Building::LumberCamp
            | Building::MiningCamp
            | Building::University => BuildingClass::Economic,
            Building::ArcheryRange
            | Building::Barracks
            | Building::SiegeWorkshop
            | Building::Castle
            | Building::Stable
            | Building::WatchTower
            | Building::Monastery
            | Building::Blacksmith => BuildingClass::Military,
            Building::PalisadeWall
            | Building::StoneWall
            | Building::FortifiedWall
            | Building::Gate => BuildingClass::Wall,
        }
    }

    pub fn domain(self) -> Domain {
        self.class().domain()
    }

    /// The building whose position marks a player's starting location.
    pub fn is_town_center(self) -> bool {
        self == Building::TownCenter
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum_macros::EnumIter,
    strum_macros::EnumCount,
    strum_macros::IntoStaticStr,
)]
pub enum Technology {
    // Town center
    #[strum(serialize = "Feudal Age")]
    FeudalAge,
    #[strum(serialize = "Castle Age")]
    CastleAge,
    #[strum(serialize = "Imperial Age")]
    ImperialAge,
    Loom,
    #[strum(serialize = "Town Watch")]
    TownWatch,
    #[strum(serialize = "Town Patrol")]
    TownPatrol,
    Wheelbarrow,
    #[strum(serialize = "Hand Cart")]
    HandCart,
    // Mill
    #[strum(serialize = "Horse Collar")]
    HorseCollar,
    #[strum(serialize = "Heavy Plow")]
    HeavyPlow,
    // Lumber camp
    #[strum(serialize = "Double-Bit Axe")]
    DoubleBitAxe,
    #[strum(serialize = "Bow Saw")]
    BowSaw,
    // Mining camp
    #[strum(serialize = "Gold Mining")]
    GoldMining,
    #[strum(serialize = "Gold Shaft Mining")]
    GoldShaftMining,
    #[strum(serialize = "Stone Mining")]
    StoneMining,
    #[strum(serialize = "Stone Shaft Mining")]
    StoneShaftMining,
    // Blacksmith
    Forging,
    #[strum(serialize = "Iron Casting")]
    IronCasting,
    #[strum(serialize = "Blast Furnace")]
    BlastFurnace,
    Fletching,
    #[strum(serialize = "Bodkin Arrow")]
    BodkinArrow,
    Bracer,
    #[strum(serialize = "Scale Mail Armor")]
    ScaleMailArmor,
    #[strum(serialize = "Chain Mail Armor")]
    ChainMailArmor,
    #[strum(serialize = "Plate Mail Armor")]
    PlateMailArmor,
    #[strum(serialize = "Scale Barding Armor")]
    ScaleBardingArmor,
    #[strum(serialize = "Chain Barding Armor")]
    ChainBardingArmor,
    #[strum(serialize = "Plate Barding Armor")]
    PlateBardingArmor,
    #[strum(serialize = "Padded Archer Armor")]
    PaddedArcherArmor,
    #[strum(serialize = "Leather Archer Armor")]
    LeatherArcherArmor,
    #[strum(serialize = "Ring Archer Armor")]
    RingArcherArmor,
    // Archery range
    #[strum(serialize = "Thumb Ring")]
    ThumbRing,
    #[strum(serialize = "Parthian Tactics")]
    ParthianTactics,
    Crossbowman,
    Arbalester,
    #[strum(serialize = "Elite Skirmisher")]
    EliteSkirmisher,
    #[strum(serialize = "Imperial Skirmisher")]
    ImperialSkirmisher,
    #[strum(serialize = "Heavy Cavalry Archer")]
    HeavyCavalryArcher,
    // University
    Ballistics,
    // Barracks
    Arson,
    Supplies,
    Squires,
    Pikeman,
    Halberdier,
    #[strum(serialize = "Man-at-Arms")]
    ManAtArms,
    #[strum(serialize = "Long Swordsman")]
    LongSwordsman,
    #[strum(serialize = "Two-Handed Swordsman")]
    TwoHandedSwordsman,
    Champion,
    #[strum(serialize = "Eagle Warrior")]
    EagleWarrior,
    #[strum(serialize = "Elite Eagle Warrior")]
    EliteEagleWarrior,
    // Stable
    Bloodlines,
    Husbandry,
    #[strum(serialize = "Light Cavalry")]
    LightCavalry,
    Hussar,
    Cavalier,
    Paladin,
    #[strum(serialize = "Heavy Camel Rider")]
    HeavyCamelRider,
    #[strum(serialize = "Imperial Camel Rider")]
    ImperialCamelRider,
    #[strum(serialize = "Elite Battle Elephant")]
    EliteBattleElephant,
}

impl Technology {
    pub fn domain(self) -> Domain {
        match self {
            Technology::FeudalAge
            | Technology::CastleAge
            | Technology::ImperialAge
            | Technology::Loom
            | Technology::TownWatch
            | Technology::TownPatrol
            | Technology::Wheelbarrow
            | Technology::HandCart
            | Technology::HorseCollar
            | Technology::HeavyPlow
            | Technology::DoubleBitAxe
            | Technology::BowSaw
            | Technology::GoldMining
            | Technology::GoldShaftMining
            | Technology::StoneMining
            | Technology::StoneShaftMining => Domain::Economic,
            _ => Domain::Military,
        }
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryKind {
    Unit,
    Building,
    Technology,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Unit(Unit),
    Building(Building),
    Technology(Technology),
}

impl Category {
    pub fn kind(self) -> CategoryKind {
        match self {
            Category::Unit(_) => CategoryKind::Unit,
            Category::Building(_) => CategoryKind::Building,
            Category::Technology(_) => CategoryKind::Technology,
        }
    }

    pub fn domain(self) -> Domain {
        match self {
            Category::Unit(unit) => unit.domain(),
            Category::Building(building) => building.domain(),
            Category::Technology(tech) => tech.domain(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Unit(unit) => unit.name(),
            Category::Building(building) => building.name(),
            Category::Technology(tech) => tech.name(),
        }
    }
}

// ---------------------------------------------------------------------------
// Lookup tables
// ---------------------------------------------------------------------------

type Group<S, C> = (S, &'static [(RawId, C)]);

const UNIT_GROUPS: &[Group<UnitClass, Unit>] = &[
    (UnitClass::Worker, &[(83, Unit::Villager)]),
    (
        UnitClass::Infantry,
        &[(74, Unit::Militia), (93, Unit::Spearman), (751, Unit::Eagle)],
    ),
    (
        UnitClass::Cavalry,
        &[
            (38, Unit::Knight),
            (448, Unit::Scout),
            (329, Unit::Camel),
            (1132, Unit::BattleElephant),
        ],
    ),
    (
        UnitClass::Archer,
        &[(4, Unit::Archer), (7, Unit::Skirmisher), (39, Unit::CavalryArcher)],
    ),
    (UnitClass::Monk, &[(125, Unit::Monk)]),
    (
        UnitClass::Siege,
        &[
            (280, Unit::Mangonel),
            (1001, Unit::OrganGun),
            (1258, Unit::BatteringRam),
            (42, Unit::Trebuchet),
        ],
    ),
];

const BUILDING_GROUPS: &[Group<BuildingClass, Building>] = &[
    (
        BuildingClass::Economic,
        &[
            (51, Building::Dock),
            (50, Building::Farm),
            (70, Building::House),
            (68, Building::Mill),
            (84, Building::Market),
            (109, Building::TownCenter),
            (562, Building::LumberCamp),
            (584, Building::MiningCamp),
            (209, Building::University),
        ],
    ),
    (
        BuildingClass::Military,
        &[
            (10, Building::ArcheryRange),
            (12, Building::Barracks),
            (49, Building::SiegeWorkshop),
            (82, Building::Castle),
            (101, Building::Stable),
            (79, Building::WatchTower),
            (104, Building::Monastery),
            (103, Building::Blacksmith),
        ],
    ),
    (
        BuildingClass::Wall,
        &[
            (72, Building::PalisadeWall),
            (117, Building::StoneWall),
            (155, Building::FortifiedWall),
            (487, Building::Gate),
        ],
    ),
];

const TECHNOLOGY_GROUPS: &[Group<Domain, Technology>] = &[
    (
        Domain::Economic,
        &[
            (101, Technology::FeudalAge),
            (102, Technology::CastleAge),
            (103, Technology::ImperialAge),
            (22, Technology::Loom),
            (8, Technology::TownWatch),
            (280, Technology::TownPatrol),
            (213, Technology::Wheelbarrow),
            (249, Technology::HandCart),
            (14, Technology::HorseCollar),
            (13, Technology::HeavyPlow),
            (202, Technology::DoubleBitAxe),
            (203, Technology::BowSaw),
            (55, Technology::GoldMining),
            (182, Technology::GoldShaftMining),
            (278, Technology::StoneMining),
            (279, Technology::StoneShaftMining),
        ],
    ),
    (
        Domain::Military,
        &[
            (67, Technology::Forging),
            (68, Technology::IronCasting),
            (75, Technology::BlastFurnace),
            (199, Technology::Fletching),
            (200, Technology::BodkinArrow),
            (201, Technology::Bracer),
            (74, Technology::ScaleMailArmor),
            (76, Technology::ChainMailArmor),
            (77, Technology::PlateMailArmor),
            (81, Technology::ScaleBardingArmor),
            (82, Technology::ChainBardingArmor),
            (80, Technology::PlateBardingArmor),
            (211, Technology::PaddedArcherArmor),
            (212, Technology::LeatherArcherArmor),
            (219, Technology::RingArcherArmor),
            (437, Technology::ThumbRing),
            (436, Technology::ParthianTactics),
            (100, Technology::Crossbowman),
            (237, Technology::Arbalester),
            (98, Technology::EliteSkirmisher),
            (655, Technology::ImperialSkirmisher),
            (218, Technology::HeavyCavalryArcher),
            (93, Technology::Ballistics),
            (602, Technology::Arson),
            (716, Technology::Supplies),
            (215, Technology::Squires),
            (197, Technology::Pikeman),
            (429, Technology::Halberdier),
            (222, Technology::ManAtArms),
            (207, Technology::LongSwordsman),
            (217, Technology::TwoHandedSwordsman),
            (264, Technology::Champion),
            (384, Technology::EagleWarrior),
            (434, Technology::EliteEagleWarrior),
            (435, Technology::Bloodlines),
            (39, Technology::Husbandry),
            (254, Technology::LightCavalry),
            (428, Technology::Hussar),
            (209, Technology::Cavalier),
            (265, Technology::Paladin),
            (236, Technology::HeavyCamelRider),
            (521, Technology::ImperialCamelRider),
            (631, Technology::EliteBattleElephant),
        ],
    ),
];

/// Scan the groups in order and return the first category listed under `raw_id`.
fn lookup<S, C: Copy>(groups: &[Group<S, C>], raw_id: RawId) -> Option<C> {
    groups
        .iter()
        .flat_map(|(_, entries)| entries.iter())
        .find(|(id, _)| *id == raw_id)
        .map(|(_, category)| *category)
}

pub fn resolve_unit(raw_id: RawId) -> Option<Unit> {
    lookup(UNIT_GROUPS, raw_id)
}

pub fn resolve_building(raw_id: RawId) -> Option<Building> {
    lookup(BUILDING_GROUPS, raw_id)
}

pub fn resolve_technology(raw_id: RawId) -> Option<Technology> {
    lookup(TECHNOLOGY_GROUPS, raw_id)
}

/// Resolve a raw id within one kind. Ids are only unique per kind: `101` is a
/// stable as a building and Feudal Age as a technology.
pub fn resolve(raw_id: RawId, kind: CategoryKind) -> Option<Category> {
    match kind {
        CategoryKind::Unit => resolve_unit(raw_id).map(Category::Unit),
        CategoryKind::Building => resolve_building(raw_id).map(Category::Building),
        CategoryKind::Technology => resolve_technology(raw_id).map(Category::Technology),
    }
}

/// Reverse lookup, used to build fixtures and to render ids in reports.
pub fn raw_id_of(category: Category) -> Option<RawId> {
    fn find<S, C: PartialEq>(groups: &[Group<S, C>], wanted: &C) -> Option<RawId> {
        groups
            .iter()
            .flat_map(|(_, entries)| entries.iter())
            .find(|(_, category)| category == wanted)
            .map(|(id, _)| *id)
    }
    match category {
        Category::Unit(unit) => find(UNIT_GROUPS, &unit),
        Category::Building(building) => find(BUILDING_GROUPS, &building),
        Category::Technology(tech) => find(TECHNOLOGY_GROUPS, &tech),
    }
}

/// Every category of every kind, in declaration order.
pub fn all_categories() -> impl Iterator<Item = Category> {
    Unit::iter()
        .map(Category::Unit)
        .chain(Building::iter().map(Category::Building))
        .chain(Technology::iter().map(Category::Technology))
}

pub mod category;
pub mod company;
pub mod farm;
pub mod farmer_profile;
pub mod machinery;
pub mod paddy_variety;
pub mod poultry_house;
pub mod ruminant_pen;
pub mod season;

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::entity::EntityDescriptor;

/// Built-in master-data entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum EntityKind {
    Company,
    Farm,
    FarmerProfile,
    Category,
    Season,
    PaddyVariety,
    PoultryHouse,
    RuminantPen,
    Machinery,
}

impl EntityKind {
    pub fn descriptor(self) -> EntityDescriptor {
        match self {
            Self::Company => company::descriptor(),
            Self::Farm => farm::descriptor(),
            Self::FarmerProfile => farmer_profile::descriptor(),
            Self::Category => category::descriptor(),
            Self::Season => season::descriptor(),
            Self::PaddyVariety => paddy_variety::descriptor(),
            Self::PoultryHouse => poultry_house::descriptor(),
            Self::RuminantPen => ruminant_pen::descriptor(),
            Self::Machinery => machinery::descriptor(),
        }
    }
}

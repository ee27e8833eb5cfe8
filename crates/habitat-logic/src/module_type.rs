//! Module (room) types that can be placed on a habitat floor.
//!
//! The set of known types is closed, but names coming from mission files or a
//! remote service may not be in it. Those parse into [`ModuleType::Other`]
//! instead of failing, so lookups and rendering treat them uniformly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A room category, serialized as its snake_case name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModuleType {
    PrivateCrewQuarters,
    CommonKitchenAndMess,
    RadiationShelter,
    HygieneAndWaste,
    ExerciseArea,
    MedicalCare,
    CommandAndControl,
    Laboratory,
    StorageAndLogistics,
    LifeSupport,
    MaintenanceWorkshop,
    RecreationAndSocial,
    Airlock,
    FoodProduction,
    /// Walkway tiles. Placed like any module, never scored.
    Corridor,
    Other(String),
}

impl ModuleType {
    /// Every known type, corridor included.
    pub fn all() -> &'static [ModuleType] {
        &[
            ModuleType::PrivateCrewQuarters,
            ModuleType::CommonKitchenAndMess,
            ModuleType::RadiationShelter,
            ModuleType::HygieneAndWaste,
            ModuleType::ExerciseArea,
            ModuleType::MedicalCare,
            ModuleType::CommandAndControl,
            ModuleType::Laboratory,
            ModuleType::StorageAndLogistics,
            ModuleType::LifeSupport,
            ModuleType::MaintenanceWorkshop,
            ModuleType::RecreationAndSocial,
            ModuleType::Airlock,
            ModuleType::FoodProduction,
            ModuleType::Corridor,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            ModuleType::PrivateCrewQuarters => "private_crew_quarters",
            ModuleType::CommonKitchenAndMess => "common_kitchen_and_mess",
            ModuleType::RadiationShelter => "radiation_shelter",
            ModuleType::HygieneAndWaste => "hygiene_and_waste",
            ModuleType::ExerciseArea => "exercise_area",
            ModuleType::MedicalCare => "medical_care",
            ModuleType::CommandAndControl => "command_and_control",
            ModuleType::Laboratory => "laboratory",
            ModuleType::StorageAndLogistics => "storage_and_logistics",
            ModuleType::LifeSupport => "life_support",
            ModuleType::MaintenanceWorkshop => "maintenance_workshop",
            ModuleType::RecreationAndSocial => "recreation_and_social",
            ModuleType::Airlock => "airlock",
            ModuleType::FoodProduction => "food_production",
            ModuleType::Corridor => "corridor",
            ModuleType::Other(name) => name,
        }
    }

    /// Parse a type name. Unknown names are kept verbatim as `Other`.
    pub fn parse(name: &str) -> ModuleType {
        ModuleType::all()
            .iter()
            .find(|t| t.as_str() == name)
            .cloned()
            .unwrap_or_else(|| ModuleType::Other(name.to_string()))
    }

    pub fn is_corridor(&self) -> bool {
        matches!(self, ModuleType::Corridor)
    }

    /// Whether cells of this type take part in relationship scoring.
    pub fn is_scored(&self) -> bool {
        !self.is_corridor()
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ModuleType::Other(_))
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ModuleType {
    fn from(name: String) -> Self {
        match ModuleType::parse(&name) {
            ModuleType::Other(_) => ModuleType::Other(name),
            known => known,
        }
    }
}

impl From<&str> for ModuleType {
    fn from(name: &str) -> Self {
        ModuleType::parse(name)
    }
}

impl From<ModuleType> for String {
    fn from(t: ModuleType) -> Self {
        match t {
            ModuleType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

//! ## reactorsim-core::catalog
//! **Component kinds, their two-letter codes and behaviour parameters**
//!
//! The code table is the public contract of the simulator: layouts are
//! exchanged as lists of these codes, with `XX` marking an empty slot.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Code of an empty slot.
pub const EMPTY_CODE: &str = "XX";

/// Every component costs the same.
pub const COMPONENT_COST: u32 = 2;

/// All valid slot codes, empty slot first.
pub const ALL_CODES: [&str; 23] = [
    "XX", "VV", "VR", "VA", "VC", "VO", "EE", "EA", "ER", "EC", "C1", "C3", "C6", "CR", "CL",
    "U1", "U2", "U4", "NN", "NT", "PP", "PC", "PH",
];

/// A placeable reactor component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ComponentKind {
    HeatVent,
    ReactorHeatVent,
    AdvancedHeatVent,
    ComponentHeatVent,
    OverclockedHeatVent,
    HeatExchanger,
    AdvancedHeatExchanger,
    CoreHeatExchanger,
    ComponentHeatExchanger,
    CoolantCell10k,
    CoolantCell30k,
    CoolantCell60k,
    RshCondensator,
    LzhCondensator,
    UraniumCell,
    DualUraniumCell,
    QuadUraniumCell,
    NeutronReflector,
    ThickNeutronReflector,
    ReactorPlating,
    ContainmentReactorPlating,
    HeatCapacityReactorPlating,
}

/// How a component participates in a tick, with its tuning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Cools its own hull and optionally pulls heat out of the core.
    Vent {
        dissipation: i32,
        core_draw: i32,
        hull: i32,
    },
    /// Cools every heat-storing neighbour.
    SpreadVent { per_neighbor: i32 },
    /// Balances heat between itself, its neighbours and the core.
    Exchanger {
        adjacent_rate: i32,
        core_rate: i32,
        hull: i32,
    },
    /// Passive heat storage.
    Coolant { hull: i32 },
    /// Single-use heat sink.
    Condensator { capacity: i32 },
    /// Produces pulses, EU and heat.
    Fuel { cells: i32 },
    /// Bounces pulses back into adjacent fuel.
    Reflector { durability: i32 },
    /// Raises the core heat capacity.
    Plating { capacity_bonus: i32 },
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 22] = [
        ComponentKind::HeatVent,
        ComponentKind::ReactorHeatVent,
        ComponentKind::AdvancedHeatVent,
        ComponentKind::ComponentHeatVent,
        ComponentKind::OverclockedHeatVent,
        ComponentKind::HeatExchanger,
        ComponentKind::AdvancedHeatExchanger,
        ComponentKind::CoreHeatExchanger,
        ComponentKind::ComponentHeatExchanger,
        ComponentKind::CoolantCell10k,
        ComponentKind::CoolantCell30k,
        ComponentKind::CoolantCell60k,
        ComponentKind::RshCondensator,
        ComponentKind::LzhCondensator,
        ComponentKind::UraniumCell,
        ComponentKind::DualUraniumCell,
        ComponentKind::QuadUraniumCell,
        ComponentKind::NeutronReflector,
        ComponentKind::ThickNeutronReflector,
        ComponentKind::ReactorPlating,
        ComponentKind::ContainmentReactorPlating,
        ComponentKind::HeatCapacityReactorPlating,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            ComponentKind::HeatVent => "VV",
            ComponentKind::ReactorHeatVent => "VR",
            ComponentKind::AdvancedHeatVent => "VA",
            ComponentKind::ComponentHeatVent => "VC",
            ComponentKind::OverclockedHeatVent => "VO",
            ComponentKind::HeatExchanger => "EE",
            ComponentKind::AdvancedHeatExchanger => "EA",
            ComponentKind::CoreHeatExchanger => "ER",
            ComponentKind::ComponentHeatExchanger => "EC",
            ComponentKind::CoolantCell10k => "C1",
            ComponentKind::CoolantCell30k => "C3",
            ComponentKind::CoolantCell60k => "C6",
            ComponentKind::RshCondensator => "CR",
            ComponentKind::LzhCondensator => "CL",
            ComponentKind::UraniumCell => "U1",
            ComponentKind::DualUraniumCell => "U2",
            ComponentKind::QuadUraniumCell => "U4",
            ComponentKind::NeutronReflector => "NN",
            ComponentKind::ThickNeutronReflector => "NT",
            ComponentKind::ReactorPlating => "PP",
            ComponentKind::ContainmentReactorPlating => "PC",
            ComponentKind::HeatCapacityReactorPlating => "PH",
        }
    }

    /// Human readable name.
    pub const fn name(self) -> &'static str {
        match self {
            ComponentKind::HeatVent => "Heat Vent",
            ComponentKind::ReactorHeatVent => "Reactor Heat Vent",
            ComponentKind::AdvancedHeatVent => "Advanced Heat Vent",
            ComponentKind::ComponentHeatVent => "Component Heat Vent",
            ComponentKind::OverclockedHeatVent => "Overclocked Heat Vent",
            ComponentKind::HeatExchanger => "Heat Exchanger",
            ComponentKind::AdvancedHeatExchanger => "Advanced Heat Exchanger",
            ComponentKind::CoreHeatExchanger => "Reactor Heat Exchanger",
            ComponentKind::ComponentHeatExchanger => "Component Heat Exchanger",
            ComponentKind::CoolantCell10k => "10k Coolant Cell",
            ComponentKind::CoolantCell30k => "30k Coolant Cell",
            ComponentKind::CoolantCell60k => "60k Coolant Cell",
            ComponentKind::RshCondensator => "RSH-Condensator",
            ComponentKind::LzhCondensator => "LZH-Condensator",
            ComponentKind::UraniumCell => "Uranium Cell",
            ComponentKind::DualUraniumCell => "Dual Uranium Cell",
            ComponentKind::QuadUraniumCell => "Quad Uranium Cell",
            ComponentKind::NeutronReflector => "Neutron Reflector",
            ComponentKind::ThickNeutronReflector => "Thick Neutron Reflector",
            ComponentKind::ReactorPlating => "Reactor Plating",
            ComponentKind::ContainmentReactorPlating => "Containment Reactor Plating",
            ComponentKind::HeatCapacityReactorPlating => "Heat-Capacity Reactor Plating",
        }
    }

    pub const fn behavior(self) -> Behavior {
        match self {
            ComponentKind::HeatVent => Behavior::Vent {
                dissipation: 6,
                core_draw: 0,
                hull: 1000,
            },
            ComponentKind::ReactorHeatVent => Behavior::Vent {
                dissipation: 5,
                core_draw: 5,
                hull: 1000,
            },
            ComponentKind::AdvancedHeatVent => Behavior::Vent {
                dissipation: 12,
                core_draw: 0,
                hull: 1000,
            },
            ComponentKind::OverclockedHeatVent => Behavior::Vent {
                dissipation: 20,
                core_draw: 36,
                hull: 1000,
            },
            ComponentKind::ComponentHeatVent => Behavior::SpreadVent { per_neighbor: 4 },
            ComponentKind::HeatExchanger => Behavior::Exchanger {
                adjacent_rate: 12,
                core_rate: 4,
                hull: 2500,
            },
            ComponentKind::AdvancedHeatExchanger => Behavior::Exchanger {
                adjacent_rate: 24,
                core_rate: 8,
                hull: 5000,
            },
            ComponentKind::CoreHeatExchanger => Behavior::Exchanger {
                adjacent_rate: 0,
                core_rate: 72,
                hull: 2500,
            },
            ComponentKind::ComponentHeatExchanger => Behavior::Exchanger {
                adjacent_rate: 36,
                core_rate: 0,
                hull: 5000,
            },
            ComponentKind::CoolantCell10k => Behavior::Coolant { hull: 10_000 },
            ComponentKind::CoolantCell30k => Behavior::Coolant { hull: 30_000 },
            ComponentKind::CoolantCell60k => Behavior::Coolant { hull: 60_000 },
            ComponentKind::RshCondensator => Behavior::Condensator { capacity: 20_000 },
            ComponentKind::LzhCondensator => Behavior::Condensator { capacity: 100_000 },
            ComponentKind::UraniumCell => Behavior::Fuel { cells: 1 },
            ComponentKind::DualUraniumCell => Behavior::Fuel { cells: 2 },
            ComponentKind::QuadUraniumCell => Behavior::Fuel { cells: 4 },
            ComponentKind::NeutronReflector => Behavior::Reflector { durability: 10_000 },
            ComponentKind::ThickNeutronReflector => Behavior::Reflector { durability: 40_000 },
            ComponentKind::ReactorPlating => Behavior::Plating {
                capacity_bonus: 1000,
            },
            ComponentKind::ContainmentReactorPlating => Behavior::Plating {
                capacity_bonus: 500,
            },
            ComponentKind::HeatCapacityReactorPlating => Behavior::Plating {
                capacity_bonus: 1700,
            },
        }
    }

    /// Number of fuel cells this component contributes (0 for non-fuel).
    pub const fn fuel_cells(self) -> u32 {
        match self.behavior() {
            Behavior::Fuel { cells } => cells as u32,
            _ => 0,
        }
    }

    pub const fn is_fuel(self) -> bool {
        self.fuel_cells() > 0
    }

    pub const fn is_single_use_coolant(self) -> bool {
        matches!(self.behavior(), Behavior::Condensator { .. })
    }
}

static KINDS_BY_CODE: Lazy<HashMap<&'static str, ComponentKind>> =
    Lazy::new(|| ComponentKind::ALL.iter().map(|k| (k.code(), *k)).collect());

/// Parses a slot code. `XX` yields `Ok(None)`.
pub fn parse_code(code: &str) -> Result<Option<ComponentKind>, LayoutError> {
    if code == EMPTY_CODE {
        return Ok(None);
    }
    KINDS_BY_CODE
        .get(code)
        .copied()
        .map(Some)
        .ok_or_else(|| LayoutError::UnknownCode(code.to_string()))
}

/// Code for an optional slot content.
pub fn slot_code(slot: Option<ComponentKind>) -> &'static str {
    slot.map_or(EMPTY_CODE, ComponentKind::code)
}

impl FromStr for ComponentKind {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_code(s)?.ok_or_else(|| LayoutError::UnknownCode(s.to_string()))
    }
}

impl TryFrom<String> for ComponentKind {
    type Error = LayoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ComponentKind> for String {
    fn from(kind: ComponentKind) -> Self {
        kind.code().to_string()
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

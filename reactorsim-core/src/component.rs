//! ## reactorsim-core::component
//! **Per-slot component state and tick behaviour**
//!
//! Every component keeps a committed and a pending copy of its mutable
//! state. Ticks only touch the pending copy; the reactor decides when to
//! commit or roll back.

use crate::catalog::{Behavior, ComponentKind};
use crate::reactor::{Core, Grid, Phase};

/// EU generated for every neutron pulse a fuel cell or reflector receives.
pub const EU_PER_PULSE: i64 = 5;

/// Fuel stays active while its usage is at or below this value.
pub const MAX_FUEL_USAGE: i32 = 10_000;

/// Mutable state of a component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComponentState {
    /// Hull heat (vents, exchangers, coolant cells).
    pub heat: i32,
    /// Heat absorbed by a condensator.
    pub stored_heat: i32,
    /// Ticks of fuel burnt, or pulses absorbed by a reflector.
    pub usage: i32,
    pub destroyed: bool,
}

#[derive(Debug, Clone)]
pub struct Component {
    kind: ComponentKind,
    x: usize,
    y: usize,
    committed: ComponentState,
    pending: ComponentState,
}

impl Component {
    pub fn new(kind: ComponentKind, x: usize, y: usize) -> Self {
        Self {
            kind,
            x,
            y,
            committed: ComponentState::default(),
            pending: ComponentState::default(),
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn position(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    /// Pending state.
    pub fn state(&self) -> ComponentState {
        self.pending
    }

    pub fn committed_state(&self) -> ComponentState {
        self.committed
    }

    pub fn is_destroyed(&self) -> bool {
        self.pending.destroyed
    }

    pub fn can_store_heat(&self) -> bool {
        match self.kind.behavior() {
            Behavior::Vent { .. } | Behavior::Exchanger { .. } | Behavior::Coolant { .. } => true,
            Behavior::Condensator { capacity } => self.pending.stored_heat < capacity,
            _ => false,
        }
    }

    pub fn max_heat(&self) -> i32 {
        match self.kind.behavior() {
            Behavior::Vent { hull, .. }
            | Behavior::Exchanger { hull, .. }
            | Behavior::Coolant { hull } => hull,
            Behavior::Condensator { capacity } => capacity,
            _ => 0,
        }
    }

    /// Hull heat. Condensators always report zero.
    pub fn current_heat(&self) -> i32 {
        match self.kind.behavior() {
            Behavior::Vent { .. } | Behavior::Exchanger { .. } | Behavior::Coolant { .. } => {
                self.pending.heat
            }
            _ => 0,
        }
    }

    /// Adds (or removes, when negative) heat and returns the part that could
    /// not be applied.
    ///
    /// Overheating a hull destroys the component, leaves its heat untouched
    /// and returns a non-positive remainder.
    pub(crate) fn alter_heat(&mut self, delta: i32, core: &mut Core) -> i32 {
        match self.kind.behavior() {
            Behavior::Vent { hull, .. }
            | Behavior::Exchanger { hull, .. }
            | Behavior::Coolant { hull } => {
                let heat = self.pending.heat + delta;
                if heat > hull {
                    self.set_destroyed(core);
                    hull - heat + 1
                } else if heat < 0 {
                    self.pending.heat = 0;
                    heat
                } else {
                    self.pending.heat = heat;
                    0
                }
            }
            Behavior::Condensator { capacity } => {
                let absorbed = (capacity - self.pending.stored_heat).min(delta);
                self.pending.stored_heat += absorbed;
                delta - absorbed
            }
            _ => delta,
        }
    }

    /// Offers a neutron pulse; returns whether it was accepted.
    pub(crate) fn accept_pulse(&mut self, phase: Phase, core: &mut Core) -> bool {
        match self.kind.behavior() {
            Behavior::Fuel { .. } => {
                if self.pending.usage > MAX_FUEL_USAGE {
                    return false;
                }
                if phase == Phase::Power {
                    core.generate_eu(EU_PER_PULSE);
                }
                true
            }
            Behavior::Reflector { durability } => {
                if phase == Phase::Power {
                    core.generate_eu(EU_PER_PULSE);
                } else {
                    self.pending.usage += 1;
                    if self.pending.usage > durability {
                        self.set_destroyed(core);
                    }
                }
                true
            }
            _ => false,
        }
    }

    fn set_destroyed(&mut self, core: &mut Core) {
        if core.ignores_destruction() {
            return;
        }
        let was_destroyed = self.pending.destroyed;
        self.pending.destroyed = true;
        if !was_destroyed {
            core.component_destroyed();
        }
    }

    /// Runs one phase. The component's own slot is vacant in `grid` while
    /// this runs.
    pub(crate) fn tick(&mut self, phase: Phase, grid: &mut Grid, core: &mut Core) {
        match self.kind.behavior() {
            Behavior::Vent {
                dissipation,
                core_draw,
                ..
            } if phase == Phase::Heat => self.vent(dissipation, core_draw, core),
            Behavior::SpreadVent { per_neighbor } if phase == Phase::Heat => {
                for index in grid.neighbors(self.x, self.y).into_iter().flatten() {
                    if let Some(other) = grid.live_mut(index) {
                        if other.can_store_heat() {
                            other.alter_heat(-per_neighbor, core);
                        }
                    }
                }
            }
            // Exchangers balance heat in both phases.
            Behavior::Exchanger {
                adjacent_rate,
                core_rate,
                ..
            } => self.exchange(adjacent_rate, core_rate, grid, core),
            Behavior::Fuel { cells } => self.burn(cells, phase, grid, core),
            Behavior::Plating { capacity_bonus } if phase == Phase::Heat => {
                core.raise_max_heat(capacity_bonus)
            }
            _ => {}
        }
    }

    fn vent(&mut self, dissipation: i32, core_draw: i32, core: &mut Core) {
        if core_draw > 0 {
            let core_heat = core.heat();
            let drained = core_heat.min(core_draw);
            if self.alter_heat(drained, core) > 0 {
                return;
            }
            core.set_heat(core_heat - drained);
        }
        self.alter_heat(-dissipation, core);
    }

    fn exchange(&mut self, adjacent_rate: i32, core_rate: i32, grid: &mut Grid, core: &mut Core) {
        let mut own_delta = 0;
        let mut mean = self.current_heat() as f64 / self.max_heat() as f64;
        let mut shares = 1;

        if core_rate > 0 {
            shares += 1;
            mean += core.heat() as f64 / core.max_heat() as f64;
        }

        let mut acceptors = Vec::with_capacity(4);
        if adjacent_rate > 0 {
            for index in grid.neighbors(self.x, self.y).into_iter().flatten() {
                if let Some(other) = grid.live(index) {
                    if other.can_store_heat() {
                        acceptors.push(index);
                        let max = other.max_heat();
                        if max > 0 {
                            mean += other.current_heat() as f64 / max as f64;
                        }
                    }
                }
            }
        }

        mean /= (shares + acceptors.len()) as f64;

        for index in acceptors {
            if let Some(other) = grid.live_mut(index) {
                let add = ((mean * other.max_heat() as f64) as i32 - other.current_heat())
                    .clamp(-adjacent_rate, adjacent_rate);
                own_delta -= add;
                own_delta += other.alter_heat(add, core);
            }
        }

        if core_rate > 0 {
            let add = ((mean * core.max_heat() as f64) as i32 - core.heat())
                .clamp(-core_rate, core_rate);
            own_delta -= add;
            core.set_heat(core.heat() + add);
        }

        self.alter_heat(own_delta, core);
    }

    fn burn(&mut self, cells: i32, phase: Phase, grid: &mut Grid, core: &mut Core) {
        if self.pending.usage > MAX_FUEL_USAGE {
            return;
        }
        let neighbors = grid.neighbors(self.x, self.y);
        let base_pulses = 1 + cells / 2;

        for _ in 0..cells {
            match phase {
                Phase::Power => {
                    for _ in 0..base_pulses {
                        self.accept_pulse(phase, core);
                    }
                    for index in neighbors.into_iter().flatten() {
                        if let Some(other) = grid.live_mut(index) {
                            other.accept_pulse(phase, core);
                        }
                    }
                }
                Phase::Heat => {
                    let mut pulses = base_pulses;
                    for index in neighbors.into_iter().flatten() {
                        if let Some(other) = grid.live_mut(index) {
                            if other.accept_pulse(phase, core) {
                                pulses += 1;
                            }
                        }
                    }

                    let mut heat = triangular(pulses) * 4;
                    let acceptors: Vec<usize> = neighbors
                        .into_iter()
                        .flatten()
                        .filter(|&i| grid.live(i).is_some_and(Component::can_store_heat))
                        .collect();

                    let count = acceptors.len();
                    for (n, index) in acceptors.into_iter().enumerate() {
                        let share = heat / (count - n) as i32;
                        heat -= share;
                        if let Some(other) = grid.live_mut(index) {
                            heat += other.alter_heat(share, core);
                        }
                    }
                    if heat > 0 {
                        core.add_heat(heat);
                    }
                }
            }
        }

        if phase == Phase::Heat {
            self.pending.usage += 1;
        }
    }

    pub(crate) fn commit(&mut self) {
        self.committed = self.pending;
    }

    pub(crate) fn rollback(&mut self) {
        self.pending = self.committed;
    }

    /// Refuels cells, restores reflectors and empties condensators.
    pub(crate) fn reset_usage(&mut self) {
        match self.kind.behavior() {
            Behavior::Fuel { .. } | Behavior::Reflector { .. } => {
                self.pending.usage = 0;
                self.committed.usage = 0;
            }
            Behavior::Condensator { .. } => {
                self.pending.stored_heat = 0;
                self.committed.stored_heat = 0;
            }
            _ => {}
        }
    }
}

/// 1 + 2 + ... + n
fn triangular(n: i32) -> i32 {
    n * (n + 1) / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> Core {
        Core::new()
    }

    #[test]
    fn test_triangular() {
        assert_eq!(triangular(1), 1);
        assert_eq!(triangular(3), 6);
        assert_eq!(triangular(7), 28);
    }

    #[test]
    fn test_hull_heat_bounds() {
        let mut core = core();
        let mut vent = Component::new(ComponentKind::HeatVent, 0, 0);
        assert_eq!(vent.alter_heat(400, &mut core), 0);
        assert_eq!(vent.current_heat(), 400);
        assert_eq!(vent.alter_heat(-500, &mut core), -100);
        assert_eq!(vent.current_heat(), 0);
        assert!(!core.pending().component_failed);
    }

    #[test]
    fn test_hull_overheat_destroys() {
        let mut core = core();
        let mut vent = Component::new(ComponentKind::HeatVent, 0, 0);
        vent.alter_heat(990, &mut core);
        assert_eq!(vent.alter_heat(20, &mut core), 1000 - 1010 + 1);
        assert!(vent.is_destroyed());
        assert_eq!(vent.current_heat(), 990);
        assert!(core.pending().component_failed);
    }

    #[test]
    fn test_destruction_ignored_during_cooldown() {
        let mut core = core();
        core.set_ignore_destruction(true);
        let mut vent = Component::new(ComponentKind::HeatVent, 0, 0);
        vent.alter_heat(5000, &mut core);
        assert!(!vent.is_destroyed());
        assert!(!core.pending().component_failed);
    }

    #[test]
    fn test_condensator_absorbs_until_full() {
        let mut core = core();
        let mut cond = Component::new(ComponentKind::RshCondensator, 0, 0);
        assert!(cond.can_store_heat());
        assert_eq!(cond.alter_heat(19_990, &mut core), 0);
        assert_eq!(cond.alter_heat(25, &mut core), 15);
        assert!(!cond.can_store_heat());
        assert_eq!(cond.current_heat(), 0);
        assert_eq!(cond.max_heat(), 20_000);
        cond.reset_usage();
        assert!(cond.can_store_heat());
    }

    #[test]
    fn test_reflector_wears_out() {
        let mut core = core();
        let mut reflector = Component::new(ComponentKind::NeutronReflector, 0, 0);
        for _ in 0..10_000 {
            assert!(reflector.accept_pulse(Phase::Heat, &mut core));
        }
        assert!(!reflector.is_destroyed());
        reflector.accept_pulse(Phase::Heat, &mut core);
        assert!(reflector.is_destroyed());
        assert!(reflector.accept_pulse(Phase::Power, &mut core));
        assert_eq!(core.pending().eu_generated, EU_PER_PULSE);
    }

    #[test]
    fn test_commit_and_rollback() {
        let mut core = core();
        let mut cell = Component::new(ComponentKind::CoolantCell10k, 0, 0);
        cell.alter_heat(100, &mut core);
        cell.commit();
        cell.alter_heat(50, &mut core);
        assert_eq!(cell.current_heat(), 150);
        cell.rollback();
        assert_eq!(cell.current_heat(), 100);
        assert_eq!(cell.committed_state().heat, 100);
    }

    #[test]
    fn test_passive_components_refuse_heat() {
        let mut core = core();
        let mut plating = Component::new(ComponentKind::ReactorPlating, 0, 0);
        assert!(!plating.can_store_heat());
        assert_eq!(plating.alter_heat(10, &mut core), 10);
        assert!(!plating.accept_pulse(Phase::Heat, &mut core));
    }
}

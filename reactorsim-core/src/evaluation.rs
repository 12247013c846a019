//! ## reactorsim-core::evaluation
//! **Full reactor evaluation and mark classification**
//!
//! Runs a layout through a fuel cycle and, depending on how that ends,
//! through cooldown, run-to-finish and second-cycle experiments on
//! independent clones of the reactor.
//!
//! | Mark | Meaning                                                         |
//! |------|-----------------------------------------------------------------|
//! | 1    | runs forever without cooldown                                   |
//! | 2    | survives a known number of full cycles                          |
//! | 3    | fails after at least 10% of a cycle                             |
//! | 4    | components fail early, reactor survives 10% of a cycle anyway   |
//! | 5    | fails before 10% of a cycle                                     |

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::component::EU_PER_PULSE;
use crate::error::ReactorError;
use crate::layout::Layout;
use crate::reactor::{Reactor, SimulationLimits, StopConditions, StopReason};

/// Outcome of [`run_simulation`]. Field names serialise the same way the
/// JavaScript binding exposed them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResults {
    /// EU/t during operation divided by 5 and by the number of fuel cells.
    pub efficiency: f32,
    /// EU produced until the first run stopped.
    #[serde(rename = "totalEUPerCycle")]
    pub total_eu_per_cycle: f32,
    pub eu_per_tick: i64,
    /// Average EU/t including cooldown.
    #[serde(rename = "overallEUPerTick")]
    pub overall_eu_per_tick: i64,
    pub uses_single_use_coolant: bool,
    /// The cooldown hit the tick limit or stopped making progress.
    pub timed_out: bool,
    pub cooldown_ticks: u32,
    /// Length of a full cycle including cooldown; `None` when unknown.
    pub cycle_ticks: Option<u32>,
    pub mark: u8,
    pub num_iterations_before_failure: Option<u32>,
    pub ticks_until_meltdown: Option<u32>,
    pub ticks_until_component_failure: Option<u32>,
    pub total_cost: u32,
}

/// Evaluates `layout` on a fresh reactor.
pub fn run_simulation(
    layout: &Layout,
    limits: &SimulationLimits,
) -> Result<SimulationResults, ReactorError> {
    let mut reactor = Reactor::new(layout);
    evaluate(&mut reactor, limits)
}

/// Evaluates `reactor` in place. The reactor is left in the state of the
/// first run.
pub fn evaluate(
    reactor: &mut Reactor,
    limits: &SimulationLimits,
) -> Result<SimulationResults, ReactorError> {
    reactor.initialize();
    let mut results = SimulationResults {
        total_cost: reactor.total_cost(),
        ..Default::default()
    };

    if reactor.fuel_cells() == 0 {
        return Ok(results);
    }

    let first_stop = reactor.run_until(StopConditions::CYCLE, limits);
    if first_stop == StopReason::FuelUsed {
        reactor.commit();
    }
    debug!(?first_stop, tick = reactor.committed_state().tick, "first run finished");

    let first = reactor.committed_state();
    results.total_eu_per_cycle = first.eu_generated as f32;
    results.eu_per_tick = first.eu_generated.checked_div(first.tick as i64).unwrap_or(0);
    results.efficiency =
        results.eu_per_tick as f32 / EU_PER_PULSE as f32 / reactor.fuel_cells() as f32;
    results.uses_single_use_coolant = reactor.uses_single_use_coolant();

    match first_stop {
        StopReason::ComponentFailed => {
            results.num_iterations_before_failure = Some(0);
            results.ticks_until_component_failure = Some(first.tick);

            cool_down(&mut results, reactor, Cooldown::AFTER_FAILURE, limits)?;

            let mut finish = reactor.clone();
            finish.commit();
            let finish_stop = finish.run_until(StopConditions::RUN_TO_FINISH, limits);
            let finish_tick = finish.committed_state().tick;

            results.mark = if reached_tenth(first.tick, limits) {
                3
            } else if reached_tenth(finish_tick, limits) {
                4
            } else {
                5
            };
            if finish_stop == StopReason::Meltdown {
                results.ticks_until_meltdown = Some(finish_tick);
            }
        }
        StopReason::Meltdown => {
            results.num_iterations_before_failure = Some(0);
            results.ticks_until_meltdown = Some(first.tick);
            results.mark = if reached_tenth(first.tick, limits) { 3 } else { 5 };

            cool_down(&mut results, reactor, Cooldown::AFTER_MELTDOWN, limits)?;
        }
        StopReason::FuelUsed if first.total_heat <= 0 => {
            mark_one(&mut results, limits);
        }
        StopReason::FuelUsed => {
            cool_down(&mut results, reactor, Cooldown::AFTER_CYCLE, limits)?;

            // Same heat, fresh fuel: see whether a second cycle survives.
            let mut rerun = reactor.clone();
            rerun.reset_usage();
            match rerun.run_until(StopConditions::CYCLE, limits) {
                StopReason::Meltdown | StopReason::ComponentFailed => {
                    results.mark = 2;
                    results.num_iterations_before_failure = Some(1);
                }
                StopReason::FuelUsed => {
                    rerun.commit();
                    match min_cycles_until_failure(reactor, &rerun) {
                        Some(cycles) => {
                            results.mark = 2;
                            results.num_iterations_before_failure = Some(cycles);
                        }
                        None => mark_one(&mut results, limits),
                    }
                }
                reason => {
                    return Err(ReactorError::UnexpectedStop {
                        stage: "second cycle",
                        reason,
                    })
                }
            }
        }
        reason => {
            return Err(ReactorError::UnexpectedStop {
                stage: "first cycle",
                reason,
            })
        }
    }

    Ok(results)
}

/// How the cooldown clone is prepared and finished.
#[derive(Debug, Clone, Copy)]
struct Cooldown {
    stage: &'static str,
    rollback: bool,
    commit: bool,
}

impl Cooldown {
    const AFTER_FAILURE: Self = Self {
        stage: "cooldown after component failure",
        rollback: true,
        commit: true,
    };
    const AFTER_MELTDOWN: Self = Self {
        stage: "cooldown after meltdown",
        rollback: true,
        commit: false,
    };
    const AFTER_CYCLE: Self = Self {
        stage: "cooldown after cycle",
        rollback: false,
        commit: false,
    };
}

/// Pulls the fuel out of a copy of `reactor` and waits for it to cool.
fn cool_down(
    results: &mut SimulationResults,
    reactor: &Reactor,
    mode: Cooldown,
    limits: &SimulationLimits,
) -> Result<(), ReactorError> {
    let mut cooling = reactor.clone();
    if mode.rollback {
        cooling.rollback();
    }
    cooling.remove_fuel();
    cooling.set_ignore_component_destroyed(true);

    let stop = cooling.run_until(StopConditions::COOLDOWN, limits);
    if mode.commit {
        cooling.commit();
    }
    debug!(stage = mode.stage, ?stop, "cooldown finished");

    match stop {
        StopReason::CooledDown => {
            let cycle = cooling.committed_state().tick;
            results.cooldown_ticks = cycle.saturating_sub(reactor.pending_state().tick);
            results.cycle_ticks = Some(cycle);
            results.overall_eu_per_tick = (results.total_eu_per_cycle as i64)
                .checked_div(cycle as i64)
                .unwrap_or(0);
            Ok(())
        }
        StopReason::MaxTicks => {
            results.timed_out = true;
            results.cycle_ticks = None;
            Ok(())
        }
        reason => Err(ReactorError::UnexpectedStop {
            stage: mode.stage,
            reason,
        }),
    }
}

fn mark_one(results: &mut SimulationResults, limits: &SimulationLimits) {
    results.mark = 1;
    results.overall_eu_per_tick = results.eu_per_tick;
    results.cycle_ticks = Some(limits.fuel_ticks);
}

fn reached_tenth(tick: u32, limits: &SimulationLimits) -> bool {
    u64::from(tick) * 100 / u64::from(limits.fuel_ticks.max(1)) >= 10
}

/// Full cycles until `max` is exceeded, extrapolating from the heat after
/// the first and second cycle.
pub fn cycles_until_failure(first: i32, second: i32, max: i32) -> Option<u32> {
    let gain = second - first;
    if max <= 0 || gain <= 0 {
        return None;
    }
    u32::try_from((max - first - 1) / gain + 1).ok()
}

/// Smallest cycle count over the core and every component slot.
fn min_cycles_until_failure(first: &Reactor, second: &Reactor) -> Option<u32> {
    let core = cycles_until_failure(first.heat(), second.heat(), first.max_heat());
    let slots = first
        .slots()
        .iter()
        .zip(second.slots())
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => {
                cycles_until_failure(a.current_heat(), b.current_heat(), a.max_heat())
            }
            _ => None,
        });
    core.into_iter().chain(slots).min()
}

//! Interior gap ("hole") analysis.
//!
//! For every slot covered by at least one candidate the analyzer adds four
//! defined variables to the model:
//!
//! - `used`: some covering candidate is chosen
//! - `usage_before`: some earlier covered slot of the same day is used
//! - `usage_after`: some later covered slot of the same day is used
//! - `hole`: `¬used ∧ usage_before ∧ usage_after`
//!
//! Each day's analysis is confined to its envelope, the span between the
//! first and last covered slot. Holes inside the lunch window are rewarded,
//! all others penalized.

use super::builder::Coverage;
use super::config::{LunchWindow, SolveConfig};
use crate::calendar::{TimeChunk, Weekday};
use crate::cp::{CpModel, CpSolution, Literal, VarId};

/// Per-slot state read back from a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HoleRecord {
    pub slot: TimeChunk,
    pub used: bool,
    pub usage_before: bool,
    pub usage_after: bool,
    pub hole: bool,
    /// Objective weight of `hole` (negative inside lunch).
    pub weight: i64,
}

/// Variables of one analysed slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoleSlot {
    pub slot: TimeChunk,
    pub used: VarId,
    pub usage_before: VarId,
    pub usage_after: VarId,
    pub hole: VarId,
    pub weight: i64,
}

/// Inclusive span of covered slots on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    pub day: Weekday,
    pub first: TimeChunk,
    pub last: TimeChunk,
}

/// Result of [`HoleAnalyzer::analyze`]: the variables it added.
#[derive(Debug, Clone, Default)]
pub struct HoleAnalysis {
    /// Analysed slots, in slot order.
    pub slots: Vec<HoleSlot>,
    /// Envelopes of the days with coverage, Monday first.
    pub envelopes: Vec<Envelope>,
    /// Shared `false` constant used at envelope boundaries.
    pub false_var: Option<VarId>,
}

impl HoleAnalysis {
    /// `(hole, weight)` terms for the objective. Boundary slots can never
    /// be holes and are left out.
    pub fn objective_terms(&self) -> Vec<(VarId, i64)> {
        self.slots
            .iter()
            .filter(|s| Some(s.hole) != self.false_var && s.weight != 0)
            .map(|s| (s.hole, s.weight))
            .collect()
    }

    /// Reads the per-slot state out of a solution.
    pub fn records(&self, solution: &CpSolution) -> Vec<HoleRecord> {
        self.slots
            .iter()
            .map(|s| HoleRecord {
                slot: s.slot,
                used: solution.value(s.used),
                usage_before: solution.value(s.usage_before),
                usage_after: solution.value(s.usage_after),
                hole: solution.value(s.hole),
                weight: s.weight,
            })
            .collect()
    }
}

/// Adds hole variables and their definitions to a model.
#[derive(Debug, Clone, Copy)]
pub struct HoleAnalyzer {
    pub lunch: LunchWindow,
    pub penalty_outside_lunch: u32,
    pub reward_inside_lunch: u32,
}

impl HoleAnalyzer {
    pub fn from_config(config: &SolveConfig) -> Self {
        Self {
            lunch: config.lunch_window,
            penalty_outside_lunch: config.hole_penalty_outside_lunch,
            reward_inside_lunch: config.hole_reward_inside_lunch,
        }
    }

    /// Objective weight of a hole at `slot`.
    pub fn weight(&self, slot: TimeChunk) -> i64 {
        if self.lunch.contains(slot) {
            -(self.reward_inside_lunch as i64)
        } else {
            self.penalty_outside_lunch as i64
        }
    }

    /// Adds the hole variables for every covered slot of `coverage`.
    ///
    /// Definitions are emitted so each one only reads earlier ones: every
    /// `used` first, then the forward `usage_before` chain, the backward
    /// `usage_after` chain, and finally `hole`.
    pub fn analyze(&self, model: &mut CpModel, coverage: &Coverage) -> HoleAnalysis {
        let covered: Vec<(TimeChunk, Vec<VarId>)> = coverage
            .iter()
            .map(|(slot, entries)| (slot, entries.iter().map(|e| e.var).collect()))
            .collect();
        if covered.is_empty() {
            return HoleAnalysis::default();
        }

        let falsy = model.new_constant("false", false);
        let mut slots = Vec::with_capacity(covered.len());
        for (slot, _) in &covered {
            slots.push(HoleSlot {
                slot: *slot,
                used: model.new_bool_var(format!("used {slot}")),
                usage_before: falsy,
                usage_after: falsy,
                hole: falsy,
                weight: self.weight(*slot),
            });
        }
        for (hole_slot, (_, vars)) in slots.iter().zip(&covered) {
            model.add_or_equality(hole_slot.used, vars.iter().map(|&v| v.into()).collect());
        }

        let days = day_spans(&slots);
        let mut envelopes = Vec::with_capacity(days.len());
        for &(day, from, to) in &days {
            log::debug!(
                "{day}: first={}, last={} ({} covered slots)",
                slots[from].slot.clock(),
                slots[to - 1].slot.clock(),
                to - from
            );
            envelopes.push(Envelope {
                day,
                first: slots[from].slot,
                last: slots[to - 1].slot,
            });

            for i in from + 1..to {
                let prev = slots[i - 1];
                let var = model.new_bool_var(format!("usage_before {}", slots[i].slot));
                let mut literals: Vec<Literal> = vec![prev.used.into()];
                if prev.usage_before != falsy {
                    literals.push(prev.usage_before.into());
                }
                model.add_or_equality(var, literals);
                slots[i].usage_before = var;
            }
            for i in (from..to - 1).rev() {
                let next = slots[i + 1];
                let var = model.new_bool_var(format!("usage_after {}", slots[i].slot));
                let mut literals: Vec<Literal> = vec![next.used.into()];
                if next.usage_after != falsy {
                    literals.push(next.usage_after.into());
                }
                model.add_or_equality(var, literals);
                slots[i].usage_after = var;
            }
        }

        for hole_slot in slots.iter_mut() {
            if hole_slot.usage_before == falsy || hole_slot.usage_after == falsy {
                continue;
            }
            let var = model.new_bool_var(format!("hole {}", hole_slot.slot));
            model.add_and_equality(
                var,
                vec![
                    !hole_slot.used,
                    hole_slot.usage_before.into(),
                    hole_slot.usage_after.into(),
                ],
            );
            hole_slot.hole = var;
        }

        HoleAnalysis {
            slots,
            envelopes,
            false_var: Some(falsy),
        }
    }
}

/// `(day, from, to)` index ranges of `slots` sharing a weekday.
fn day_spans(slots: &[HoleSlot]) -> Vec<(Weekday, usize, usize)> {
    let mut spans: Vec<(Weekday, usize, usize)> = Vec::new();
    for (i, s) in slots.iter().enumerate() {
        let day = s.slot.weekday();
        match spans.last_mut() {
            Some((d, _, to)) if *d == day => *to = i + 1,
            _ => spans.push((day, i, i + 1)),
        }
    }
    spans
}

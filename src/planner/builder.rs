//! Placement model construction.

use super::config::SolveConfig;
use super::holes::{HoleAnalysis, HoleAnalyzer};
use crate::calendar::{TimeChunk, CHUNKS_PER_WEEK};
use crate::cp::{CpModel, VarId};
use crate::error::{PlanError, Result};
use crate::roster::{Candidate, Candidates, Roster};
use std::collections::HashSet;

/// One candidate registered at a slot it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverEntry {
    pub var: VarId,
    pub student: usize,
}

/// Inverted index: slot of the week → candidates whose lesson covers it.
#[derive(Debug, Clone)]
pub struct Coverage {
    cells: Vec<Vec<CoverEntry>>,
}

impl Default for Coverage {
    fn default() -> Self {
        Self::new()
    }
}

impl Coverage {
    pub fn new() -> Self {
        Self {
            cells: vec![Vec::new(); CHUNKS_PER_WEEK as usize],
        }
    }

    /// Registers `var` at every slot of `[start, start + duration)`.
    ///
    /// Slots past the end of the week are ignored.
    pub fn register(&mut self, var: VarId, student: usize, start: TimeChunk, duration: u32) {
        let from = start.index() as usize;
        let to = (from + duration as usize).min(self.cells.len());
        for cell in self.cells.iter_mut().take(to).skip(from) {
            cell.push(CoverEntry { var, student });
        }
    }

    /// Entries registered at `slot`.
    pub fn at(&self, slot: TimeChunk) -> &[CoverEntry] {
        self.cells.get(slot.index() as usize).map_or(&[], Vec::as_slice)
    }

    /// Whether any candidate covers `slot`.
    pub fn is_covered(&self, slot: TimeChunk) -> bool {
        !self.at(slot).is_empty()
    }

    /// Covered slots with their entries, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (TimeChunk, &[CoverEntry])> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(i, entries)| (TimeChunk::from_index(i as u32), entries.as_slice()))
    }

    /// Cross-student pairs sharing at least one slot, each pair once, in
    /// order of first shared slot.
    pub fn conflict_pairs(&self) -> Vec<(VarId, VarId)> {
        let mut seen = HashSet::new();
        let mut pairs = Vec::new();
        for entries in &self.cells {
            for (i, a) in entries.iter().enumerate() {
                for b in &entries[i + 1..] {
                    if a.student == b.student {
                        continue;
                    }
                    let pair = if a.var < b.var {
                        (a.var, b.var)
                    } else {
                        (b.var, a.var)
                    };
                    if seen.insert(pair) {
                        pairs.push(pair);
                    }
                }
            }
        }
        pairs
    }
}

/// Decision variables of one student.
#[derive(Debug, Clone, Default)]
pub struct StudentVars {
    /// One decision per candidate start, in expansion order.
    pub candidates: Vec<(Candidate, VarId)>,
    /// Omission decision, when skipping is allowed.
    pub skip: Option<VarId>,
}

/// A roster encoded as a boolean placement model.
///
/// Built once per solve and handed to a [`CpSolver`](crate::cp::CpSolver)
/// through [`PlannerModel::model`]. Keeps the mapping from variables back to
/// students for result extraction.
#[derive(Debug, Clone)]
pub struct PlannerModel {
    pub model: CpModel,
    /// Per-student decisions, in registration order.
    pub students: Vec<StudentVars>,
    pub coverage: Coverage,
    /// Hole bookkeeping, present when hole minimization is enabled.
    pub holes: Option<HoleAnalysis>,
}

impl PlannerModel {
    /// Encodes `roster` with the expanded `candidates` under `config`.
    ///
    /// Fails with [`PlanError::Configuration`] when a student has no
    /// candidate and skipping is disabled.
    pub fn build(roster: &Roster, candidates: &Candidates, config: &SolveConfig) -> Result<Self> {
        config.validate()?;
        let mut model = CpModel::new("lesson plan");
        let mut coverage = Coverage::new();
        let mut students = Vec::with_capacity(roster.len());

        for (index, student) in roster.students().iter().enumerate() {
            let offered = candidates.of(index);
            if offered.is_empty() && !config.allow_skip {
                return Err(PlanError::Configuration(format!(
                    "{} has no availability that fits a {} minute lesson",
                    student.name,
                    student.duration_minutes()
                )));
            }

            let mut vars = StudentVars::default();
            for candidate in offered {
                let var = model.new_bool_var(format!(
                    "{} at {} (+{})",
                    student.name,
                    candidate.slot,
                    student.duration_minutes()
                ));
                coverage.register(var, index, candidate.slot, student.duration);
                if config.enable_preference_minimization {
                    let cost = candidate.preference_index as i64
                        * config.availability_index_scale as i64
                        / student.priority_weight as i64;
                    if cost != 0 {
                        model.add_objective_term(var, cost);
                    }
                }
                vars.candidates.push((*candidate, var));
            }

            let mut group: Vec<VarId> = vars.candidates.iter().map(|(_, var)| *var).collect();
            if config.allow_skip {
                let skip = model.new_bool_var(format!("skip {}", student.name));
                model.add_objective_term(skip, config.skip_penalty as i64);
                group.push(skip);
                vars.skip = Some(skip);
            }
            model.add_exactly_one(group);
            students.push(vars);
        }

        let pairs = coverage.conflict_pairs();
        log::debug!(
            "{} candidates over {} students, {} conflict pairs",
            candidates.total(),
            roster.len(),
            pairs.len()
        );
        for (a, b) in pairs {
            model.add_conflict(a, b);
        }

        let holes = if config.enable_hole_minimization {
            let analysis = HoleAnalyzer::from_config(config).analyze(&mut model, &coverage);
            for (var, weight) in analysis.objective_terms() {
                model.add_objective_term(var, weight);
            }
            Some(analysis)
        } else {
            None
        };

        log::debug!(
            "model '{}': {} variables, {} constraints",
            model.name,
            model.var_count(),
            model.constraint_count()
        );
        Ok(Self {
            model,
            students,
            coverage,
            holes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Weekday;
    use crate::cp::Constraint;
    use crate::roster::{AvailabilityRange, ExpansionPolicy};

    fn at(hour: u32, minute: u32) -> TimeChunk {
        TimeChunk::from_weekday_time(Weekday::Monday, hour, minute).unwrap()
    }

    fn range(from: (u32, u32), to: (u32, u32)) -> AvailabilityRange {
        AvailabilityRange::new(at(from.0, from.1), at(to.0, to.1)).unwrap()
    }

    fn build(roster: &Roster, config: &SolveConfig) -> Result<PlannerModel> {
        let candidates = Candidates::expand(roster, &config.expansion)?;
        PlannerModel::build(roster, &candidates, config)
    }

    fn plain() -> SolveConfig {
        SolveConfig::default()
            .with_preference_minimization(false)
            .with_hole_minimization(false)
    }

    #[test]
    fn test_one_group_per_student() {
        let mut roster = Roster::new();
        roster.register(1, "A", 3, vec![range((9, 0), (10, 0))]).unwrap();
        roster.register(2, "B", 3, vec![range((9, 0), (10, 0))]).unwrap();

        let built = build(&roster, &plain()).unwrap();
        assert_eq!(built.students.len(), 2);
        assert_eq!(built.students[0].candidates.len(), 4);
        assert!(built.students[0].skip.is_none());
        let groups = built
            .model
            .constraints
            .iter()
            .filter(|c| matches!(c, Constraint::ExactlyOne { .. }))
            .count();
        assert_eq!(groups, 2);
        assert!(built.model.objective.is_none());
        assert!(built.model.validate().is_ok());
    }

    #[test]
    fn test_variable_names() {
        let mut roster = Roster::new();
        roster.register(1, "A", 3, vec![range((9, 0), (9, 30))]).unwrap();
        let built = build(&roster, &plain().with_allow_skip(true)).unwrap();
        let names: Vec<_> = built.model.bool_vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["A at MONDAY 09:00 (+30)", "skip A"]);
    }

    #[test]
    fn test_no_candidates_is_configuration_error() {
        let mut roster = Roster::new();
        roster.register(1, "A", 3, vec![range((9, 0), (9, 20))]).unwrap();
        assert!(matches!(
            build(&roster, &plain()),
            Err(PlanError::Configuration(_))
        ));

        let built = build(&roster, &plain().with_allow_skip(true)).unwrap();
        assert!(built.students[0].candidates.is_empty());
        assert!(built.students[0].skip.is_some());
    }

    #[test]
    fn test_conflicts_are_cross_student_and_unique() {
        let mut roster = Roster::new();
        // A at 09:00 or 09:10, B at 09:10; both A candidates overlap B.
        roster
            .register(1, "A", 2, vec![range((9, 0), (9, 30))])
            .unwrap();
        roster
            .register(2, "B", 2, vec![range((9, 10), (9, 30))])
            .unwrap();

        let built = build(&roster, &plain()).unwrap();
        let a0 = built.students[0].candidates[0].1;
        let a1 = built.students[0].candidates[1].1;
        let b0 = built.students[1].candidates[0].1;

        let conflicts: Vec<_> = built
            .model
            .constraints
            .iter()
            .filter_map(|c| match c {
                Constraint::Conflict { a, b } => Some((*a, *b)),
                _ => None,
            })
            .collect();
        assert_eq!(conflicts, vec![(a0, b0), (a1, b0)]);
    }

    #[test]
    fn test_preference_cost() {
        let mut roster = Roster::new();
        let ranges = vec![range((9, 0), (9, 30)), range((14, 0), (14, 30))];
        roster.register(1, "A", 3, ranges.clone()).unwrap();
        roster.register(2, "B", 3, ranges).unwrap();

        let config = plain()
            .with_preference_minimization(true)
            .with_availability_index_scale(10);
        let built = build(&roster, &config).unwrap();
        let terms = &built.model.objective.as_ref().unwrap().terms;
        let a_second = built.students[0].candidates[1].1;
        let b_second = built.students[1].candidates[1].1;
        // first wishes cost nothing and are left out
        assert_eq!(terms, &vec![(a_second, 10), (b_second, 5)]);
    }

    #[test]
    fn test_skip_cost_present_when_skipping() {
        let mut roster = Roster::new();
        roster.register(1, "A", 3, vec![range((9, 0), (9, 30))]).unwrap();
        let built = build(&roster, &plain().with_allow_skip(true).with_skip_penalty(42)).unwrap();
        let skip = built.students[0].skip.unwrap();
        assert_eq!(built.model.objective.as_ref().unwrap().terms, vec![(skip, 42)]);
    }

    #[test]
    fn test_coverage_index() {
        let mut coverage = Coverage::new();
        let v = VarId(0);
        coverage.register(v, 0, at(9, 0), 3);
        assert!(coverage.is_covered(at(9, 20)));
        assert!(!coverage.is_covered(at(9, 30)));
        assert_eq!(coverage.iter().count(), 3);

        let mut edge = Coverage::new();
        edge.register(v, 0, TimeChunk::from_index(CHUNKS_PER_WEEK - 1), 3);
        assert_eq!(edge.iter().count(), 1);
    }

    #[test]
    fn test_hole_analysis_attached() {
        let mut roster = Roster::new();
        roster.register(1, "A", 1, vec![range((9, 0), (9, 30))]).unwrap();
        let config = plain().with_hole_minimization(true);
        let built = build(&roster, &config).unwrap();
        assert!(built.holes.is_some());
        assert!(built.model.validate().is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let roster = Roster::new();
        let candidates = Candidates::expand(&roster, &ExpansionPolicy::default()).unwrap();
        let config = SolveConfig::default().with_step(0);
        assert!(PlannerModel::build(&roster, &candidates, &config).is_err());
    }
}

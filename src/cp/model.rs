//! CP model definition.

use super::variables::{BoolVar, Literal, VarId};
use crate::error::{PlanError, Result};

/// A constraint in the CP model.
///
/// Three shapes are supported: cardinality groups, pairwise conflicts and
/// boolean definitions (`target ⇔ OR/AND of literals`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Exactly one variable of the set is true.
    ExactlyOne { vars: Vec<VarId> },

    /// `a` true implies `b` false (and vice versa).
    Conflict { a: VarId, b: VarId },

    /// `target ⇔ literal_1 ∨ … ∨ literal_n`. An empty set defines false.
    OrEquality { target: VarId, literals: Vec<Literal> },

    /// `target ⇔ literal_1 ∧ … ∧ literal_n`. An empty set defines true.
    AndEquality { target: VarId, literals: Vec<Literal> },
}

impl Constraint {
    /// Variable defined by this constraint, for the equality shapes.
    pub fn target(&self) -> Option<VarId> {
        match self {
            Constraint::OrEquality { target, .. } | Constraint::AndEquality { target, .. } => {
                Some(*target)
            }
            _ => None,
        }
    }
}

/// Linear objective `Σ weight · var`, minimized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Objective {
    /// (variable, weight) pairs. Repeated variables add up.
    pub terms: Vec<(VarId, i64)>,
}

/// A boolean constraint model.
///
/// Built step by step by the caller and handed to a
/// [`CpSolver`](super::CpSolver) by reference. Holds no solver state.
///
/// # Examples
///
/// ```
/// use lesson_planner::cp::CpModel;
///
/// let mut model = CpModel::new("example");
/// let a = model.new_bool_var("a");
/// let b = model.new_bool_var("b");
/// model.add_exactly_one(vec![a, b]);
/// model.add_objective_term(a, 3);
/// model.add_objective_term(b, 1);
/// assert!(model.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CpModel {
    /// Model name.
    pub name: String,
    /// Boolean variables, indexed by [`VarId`].
    pub bool_vars: Vec<BoolVar>,
    /// Constraints.
    pub constraints: Vec<Constraint>,
    /// Objective function.
    pub objective: Option<Objective>,
}

impl CpModel {
    /// Creates a new empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a free boolean variable.
    pub fn new_bool_var(&mut self, name: impl Into<String>) -> VarId {
        self.push_var(BoolVar::new(name))
    }

    /// Adds a variable fixed to `value`.
    pub fn new_constant(&mut self, name: impl Into<String>, value: bool) -> VarId {
        self.push_var(BoolVar::fixed(name, value))
    }

    fn push_var(&mut self, var: BoolVar) -> VarId {
        self.bool_vars.push(var);
        VarId(self.bool_vars.len() - 1)
    }

    /// Convenience: exactly one of `vars` is true.
    pub fn add_exactly_one(&mut self, vars: Vec<VarId>) {
        self.constraints.push(Constraint::ExactlyOne { vars });
    }

    /// Convenience: `a ⇒ ¬b`.
    pub fn add_conflict(&mut self, a: VarId, b: VarId) {
        self.constraints.push(Constraint::Conflict { a, b });
    }

    /// Convenience: `target ⇔ OR(literals)`.
    pub fn add_or_equality(&mut self, target: VarId, literals: Vec<Literal>) {
        self.constraints
            .push(Constraint::OrEquality { target, literals });
    }

    /// Convenience: `target ⇔ AND(literals)`.
    pub fn add_and_equality(&mut self, target: VarId, literals: Vec<Literal>) {
        self.constraints
            .push(Constraint::AndEquality { target, literals });
    }

    /// Adds `weight · var` to the objective, creating it if needed.
    pub fn add_objective_term(&mut self, var: VarId, weight: i64) {
        self.objective
            .get_or_insert_with(Objective::default)
            .terms
            .push((var, weight));
    }

    /// Validates the model for consistency.
    ///
    /// Checks that every referenced variable exists, that a variable is
    /// defined by at most one equality, that defined variables are not
    /// fixed, and that every equality only reads variables that are either
    /// never defined or defined by an earlier equality.
    pub fn validate(&self) -> Result<()> {
        let n = self.bool_vars.len();
        let check = |id: VarId| -> Result<()> {
            if id.0 >= n {
                return Err(PlanError::ModelInvalid(format!(
                    "undefined variable #{} in model '{}'",
                    id.0, self.name
                )));
            }
            Ok(())
        };

        let mut defined_at: Vec<Option<usize>> = vec![None; n];
        for (position, constraint) in self.constraints.iter().enumerate() {
            match constraint {
                Constraint::ExactlyOne { vars } => vars.iter().try_for_each(|v| check(*v))?,
                Constraint::Conflict { a, b } => {
                    check(*a)?;
                    check(*b)?;
                }
                Constraint::OrEquality { target, literals }
                | Constraint::AndEquality { target, literals } => {
                    check(*target)?;
                    literals.iter().try_for_each(|l| check(l.var))?;
                    if defined_at[target.0].is_some() {
                        return Err(PlanError::ModelInvalid(format!(
                            "variable '{}' is defined twice",
                            self.bool_vars[target.0].name
                        )));
                    }
                    if self.bool_vars[target.0].fixed.is_some() {
                        return Err(PlanError::ModelInvalid(format!(
                            "fixed variable '{}' cannot be defined",
                            self.bool_vars[target.0].name
                        )));
                    }
                    defined_at[target.0] = Some(position);
                }
            }
        }

        // Definitions must only read inputs that are settled before them.
        for (position, constraint) in self.constraints.iter().enumerate() {
            if let Constraint::OrEquality { literals, .. }
            | Constraint::AndEquality { literals, .. } = constraint
            {
                for literal in literals {
                    if defined_at[literal.var.0].is_some_and(|at| at >= position) {
                        return Err(PlanError::ModelInvalid(format!(
                            "variable '{}' is read before it is defined",
                            self.bool_vars[literal.var.0].name
                        )));
                    }
                }
            }
        }

        if let Some(objective) = &self.objective {
            objective.terms.iter().try_for_each(|(v, _)| check(*v))?;
        }
        Ok(())
    }

    /// Returns the number of variables.
    pub fn var_count(&self) -> usize {
        self.bool_vars.len()
    }

    /// Returns the number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_creation() {
        let mut model = CpModel::new("test");
        let a = model.new_bool_var("a");
        let b = model.new_bool_var("b");
        model.add_exactly_one(vec![a, b]);
        model.add_conflict(a, b);
        model.add_objective_term(a, 5);

        assert_eq!(model.var_count(), 2);
        assert_eq!(model.constraint_count(), 2);
        assert_eq!(model.objective.as_ref().unwrap().terms, vec![(a, 5)]);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_undefined_variable() {
        let mut model = CpModel::new("test");
        model.add_exactly_one(vec![VarId(4)]);
        assert!(matches!(model.validate(), Err(PlanError::ModelInvalid(_))));
    }

    #[test]
    fn test_double_definition() {
        let mut model = CpModel::new("test");
        let a = model.new_bool_var("a");
        let t = model.new_bool_var("t");
        model.add_or_equality(t, vec![a.into()]);
        model.add_and_equality(t, vec![a.into()]);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_definition_order() {
        let mut model = CpModel::new("test");
        let a = model.new_bool_var("a");
        let t1 = model.new_bool_var("t1");
        let t2 = model.new_bool_var("t2");
        // t1 reads t2 before t2 is defined
        model.add_or_equality(t1, vec![t2.into()]);
        model.add_or_equality(t2, vec![a.into()]);
        assert!(model.validate().is_err());

        let mut ordered = CpModel::new("test");
        let a = ordered.new_bool_var("a");
        let t1 = ordered.new_bool_var("t1");
        let t2 = ordered.new_bool_var("t2");
        ordered.add_or_equality(t2, vec![a.into()]);
        ordered.add_and_equality(t1, vec![!t2, a.into()]);
        assert!(ordered.validate().is_ok());
    }

    #[test]
    fn test_fixed_target_rejected() {
        let mut model = CpModel::new("test");
        let f = model.new_constant("false", false);
        let a = model.new_bool_var("a");
        model.add_or_equality(f, vec![a.into()]);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_self_reference_rejected() {
        let mut model = CpModel::new("test");
        let t = model.new_bool_var("t");
        model.add_or_equality(t, vec![t.into()]);
        assert!(model.validate().is_err());
    }
}

//! Model-building context handed to constraint and optimizer functions.

use crate::cp::{BoolVar, CpModel, IntVar, LinearExpr, Lit};
use crate::models::Facilities;

use super::vars::ScheduleVars;

/// Read access to the facilities and variable tables, add-only access to
/// the constraint model.
///
/// A function holding a `ModelContext` can only narrow the search space;
/// the objective is set through [`Schedule::minimize`](super::Schedule::minimize).
pub struct ModelContext<'s> {
    facilities: &'s Facilities,
    vars: &'s ScheduleVars,
    model: &'s mut CpModel,
}

impl<'s> ModelContext<'s> {
    pub(crate) fn new(facilities: &'s Facilities, vars: &'s ScheduleVars, model: &'s mut CpModel) -> Self {
        Self {
            facilities,
            vars,
            model,
        }
    }

    /// The scheduling universe.
    pub fn facilities(&self) -> &'s Facilities {
        self.facilities
    }

    /// Decision and derived variable tables.
    pub fn vars(&self) -> &'s ScheduleVars {
        self.vars
    }

    /// Creates a component-scoped integer variable.
    pub fn new_int_var(&mut self, lo: i64, hi: i64, name: impl Into<String>) -> IntVar {
        self.model.new_int_var(lo, hi, name)
    }

    /// Creates a component-scoped boolean variable.
    pub fn new_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        self.model.new_bool_var(name)
    }

    /// Posts `lo ≤ expr ≤ hi`.
    pub fn add_linear(&mut self, expr: LinearExpr, lo: i64, hi: i64) {
        self.model.add_linear(expr, lo, hi);
    }

    /// Posts `lo ≤ expr ≤ hi` enforced by literals.
    pub fn add_linear_if(&mut self, expr: LinearExpr, lo: i64, hi: i64, enforce: &[Lit]) {
        self.model.add_linear_if(expr, lo, hi, enforce);
    }

    pub fn add_eq(&mut self, expr: LinearExpr, value: i64) {
        self.model.add_eq(expr, value);
    }

    pub fn add_le(&mut self, expr: LinearExpr, value: i64) {
        self.model.add_le(expr, value);
    }

    pub fn add_ge(&mut self, expr: LinearExpr, value: i64) {
        self.model.add_ge(expr, value);
    }

    pub fn add_clause(&mut self, lits: &[Lit]) {
        self.model.add_clause(lits);
    }

    pub fn add_implication(&mut self, a: impl Into<Lit>, b: impl Into<Lit>) {
        self.model.add_implication(a, b);
    }

    pub fn add_or_equivalence(&mut self, target: impl Into<Lit>, lits: &[Lit]) {
        self.model.add_or_equivalence(target, lits);
    }

    pub fn add_and_equivalence(&mut self, target: impl Into<Lit>, lits: &[Lit]) {
        self.model.add_and_equivalence(target, lits);
    }

    /// Posts `target ⇔ (expr ≥ k)`.
    pub fn add_at_least_equivalence(&mut self, target: impl Into<Lit>, expr: LinearExpr, k: i64) {
        self.model.add_at_least_equivalence(target, expr, k);
    }

    /// Posts `target ⇔ (expr ≤ k)`.
    pub fn add_at_most_equivalence(&mut self, target: impl Into<Lit>, expr: LinearExpr, k: i64) {
        self.model.add_at_most_equivalence(target, expr, k);
    }

    pub fn add_value_equivalence(&mut self, lit: impl Into<Lit>, var: IntVar, value: i64) {
        self.model.add_value_equivalence(lit, var, value);
    }

    pub fn add_all_different(&mut self, vars: &[IntVar]) {
        self.model.add_all_different(vars);
    }

    /// Number of constraints posted so far.
    pub fn constraint_count(&self) -> usize {
        self.model.constraint_count()
    }
}

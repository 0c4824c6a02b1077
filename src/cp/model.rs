//! Constraint model: integer/boolean variables, linear and boolean-logic
//! constraints, and an optional minimization objective.
//!
//! The model is a plain description. It never searches; any
//! [`CpSolver`](super::CpSolver) implementation consumes it. The API only
//! ever *adds* variables and constraints, so a component holding
//! `&mut CpModel` can restrict the search space but never relax it.
//!
//! # Reference
//! Rossi, van Beek, Walsh (2006), "Handbook of Constraint Programming", Ch. 3

use std::ops::Not;

/// Handle to an integer variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntVar(pub(crate) u32);

/// Handle to a boolean (0/1) variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoolVar(pub(crate) u32);

/// A boolean variable or its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lit {
    pub(crate) var: u32,
    pub(crate) negated: bool,
}

impl IntVar {
    /// Dense index of this variable inside its model.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl BoolVar {
    /// Dense index of this variable inside its model.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The positive literal of this variable.
    #[inline]
    pub fn lit(self) -> Lit {
        Lit {
            var: self.0,
            negated: false,
        }
    }

    /// Views this boolean as a 0/1 integer variable.
    #[inline]
    pub fn as_int(self) -> IntVar {
        IntVar(self.0)
    }
}

impl Lit {
    /// Index of the underlying variable.
    #[inline]
    pub fn var_index(self) -> usize {
        self.var as usize
    }

    /// Whether this literal is the negation of its variable.
    #[inline]
    pub fn is_negated(self) -> bool {
        self.negated
    }
}

impl Not for Lit {
    type Output = Lit;

    fn not(self) -> Lit {
        Lit {
            var: self.var,
            negated: !self.negated,
        }
    }
}

impl Not for BoolVar {
    type Output = Lit;

    fn not(self) -> Lit {
        !self.lit()
    }
}

impl From<BoolVar> for Lit {
    fn from(var: BoolVar) -> Self {
        var.lit()
    }
}

/// A linear expression `Σ coef·var + constant`.
///
/// Literal terms are normalized on insertion: a negated literal `¬x`
/// contributes `coef·(1 - x)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    pub(crate) terms: Vec<(u32, i64)>,
    pub(crate) constant: i64,
}

impl LinearExpr {
    /// Creates the empty expression (value 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// A constant expression.
    pub fn constant(value: i64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// Sum of integer variables, each with coefficient 1.
    pub fn sum_ints(vars: impl IntoIterator<Item = IntVar>) -> Self {
        let mut expr = Self::new();
        for var in vars {
            expr.add_int(var, 1);
        }
        expr
    }

    /// Sum of literals, each with coefficient 1.
    pub fn sum_lits<L: Into<Lit>>(lits: impl IntoIterator<Item = L>) -> Self {
        let mut expr = Self::new();
        for lit in lits {
            expr.add_lit(lit, 1);
        }
        expr
    }

    /// Adds `coef·var`.
    pub fn add_int(&mut self, var: IntVar, coef: i64) -> &mut Self {
        if coef != 0 {
            self.terms.push((var.0, coef));
        }
        self
    }

    /// Adds `coef·lit`.
    pub fn add_lit(&mut self, lit: impl Into<Lit>, coef: i64) -> &mut Self {
        let lit = lit.into();
        if coef == 0 {
            return self;
        }
        if lit.negated {
            self.constant += coef;
            self.terms.push((lit.var, -coef));
        } else {
            self.terms.push((lit.var, coef));
        }
        self
    }

    /// Adds a constant offset.
    pub fn add_constant(&mut self, value: i64) -> &mut Self {
        self.constant += value;
        self
    }

    /// Adds `coef·other`.
    pub fn add_scaled(&mut self, other: &LinearExpr, coef: i64) -> &mut Self {
        if coef == 0 {
            return self;
        }
        self.terms
            .extend(other.terms.iter().map(|&(v, c)| (v, c * coef)));
        self.constant += other.constant * coef;
        self
    }

    /// Builder: adds `coef·var`.
    pub fn with_int(mut self, var: IntVar, coef: i64) -> Self {
        self.add_int(var, coef);
        self
    }

    /// Builder: adds `coef·lit`.
    pub fn with_lit(mut self, lit: impl Into<Lit>, coef: i64) -> Self {
        self.add_lit(lit, coef);
        self
    }

    /// Whether the expression has no variable terms.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Number of variable terms (before merging duplicates).
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Evaluates the expression on a full assignment.
    pub fn evaluate(&self, values: &[i64]) -> i64 {
        self.terms
            .iter()
            .map(|&(v, c)| c * values[v as usize])
            .sum::<i64>()
            + self.constant
    }

    /// Merges duplicate variables and drops zero coefficients.
    pub(crate) fn normalized(&self) -> LinearExpr {
        let mut terms = self.terms.clone();
        terms.sort_unstable_by_key(|&(v, _)| v);
        let mut merged: Vec<(u32, i64)> = Vec::with_capacity(terms.len());
        for (v, c) in terms {
            match merged.last_mut() {
                Some(last) if last.0 == v => last.1 += c,
                _ => merged.push((v, c)),
            }
        }
        merged.retain(|&(_, c)| c != 0);
        LinearExpr {
            terms: merged,
            constant: self.constant,
        }
    }
}

/// Variable definition: initial domain and a debug name.
#[derive(Debug, Clone)]
pub(crate) struct VarDef {
    pub lo: i64,
    pub hi: i64,
    pub name: String,
}

/// A posted constraint.
#[derive(Debug, Clone)]
pub(crate) enum ModelConstraint {
    /// `lo ≤ expr ≤ hi`, active only when every enforcement literal holds.
    Linear {
        expr: LinearExpr,
        lo: i64,
        hi: i64,
        enforce: Vec<Lit>,
    },
    /// All listed variables take distinct values.
    AllDifferent(Vec<u32>),
    /// `lit ⇔ var = value`.
    ValueEquivalence { lit: Lit, var: u32, value: i64 },
    /// At least one literal is true.
    Clause(Vec<Lit>),
}

/// A constraint model under construction.
#[derive(Debug, Clone)]
pub struct CpModel {
    name: String,
    pub(crate) vars: Vec<VarDef>,
    pub(crate) constraints: Vec<ModelConstraint>,
    pub(crate) objective: Option<LinearExpr>,
}

impl CpModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: Vec::new(),
            constraints: Vec::new(),
            objective: None,
        }
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates an integer variable with domain `[lo, hi]`.
    pub fn new_int_var(&mut self, lo: i64, hi: i64, name: impl Into<String>) -> IntVar {
        let id = self.vars.len() as u32;
        self.vars.push(VarDef {
            lo,
            hi,
            name: name.into(),
        });
        IntVar(id)
    }

    /// Creates a boolean variable.
    pub fn new_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        BoolVar(self.new_int_var(0, 1, name).0)
    }

    /// Creates a boolean fixed to `value`.
    pub fn new_constant_bool(&mut self, value: bool) -> BoolVar {
        let v = i64::from(value);
        BoolVar(self.new_int_var(v, v, if value { "true" } else { "false" }).0)
    }

    /// Posts `lo ≤ expr ≤ hi`.
    pub fn add_linear(&mut self, expr: LinearExpr, lo: i64, hi: i64) {
        self.add_linear_if(expr, lo, hi, &[]);
    }

    /// Posts `lo ≤ expr ≤ hi`, enforced only when every literal in
    /// `enforce` is true.
    pub fn add_linear_if(&mut self, expr: LinearExpr, lo: i64, hi: i64, enforce: &[Lit]) {
        self.constraints.push(ModelConstraint::Linear {
            expr,
            lo,
            hi,
            enforce: enforce.to_vec(),
        });
    }

    /// Posts `expr = value`.
    pub fn add_eq(&mut self, expr: LinearExpr, value: i64) {
        self.add_linear(expr, value, value);
    }

    /// Posts `expr ≤ value`.
    pub fn add_le(&mut self, expr: LinearExpr, value: i64) {
        self.add_linear(expr, i64::MIN, value);
    }

    /// Posts `expr ≥ value`.
    pub fn add_ge(&mut self, expr: LinearExpr, value: i64) {
        self.add_linear(expr, value, i64::MAX);
    }

    /// Posts pairwise distinctness.
    pub fn add_all_different(&mut self, vars: &[IntVar]) {
        self.constraints
            .push(ModelConstraint::AllDifferent(vars.iter().map(|v| v.0).collect()));
    }

    /// Posts a disjunction: at least one literal is true.
    pub fn add_clause(&mut self, lits: &[Lit]) {
        self.constraints.push(ModelConstraint::Clause(lits.to_vec()));
    }

    /// Posts `a ⇒ b`.
    pub fn add_implication(&mut self, a: impl Into<Lit>, b: impl Into<Lit>) {
        let (a, b) = (a.into(), b.into());
        self.add_clause(&[!a, b]);
    }

    /// Posts `lit ⇔ (var = value)`.
    pub fn add_value_equivalence(&mut self, lit: impl Into<Lit>, var: IntVar, value: i64) {
        self.constraints.push(ModelConstraint::ValueEquivalence {
            lit: lit.into(),
            var: var.0,
            value,
        });
    }

    /// Posts `target ⇔ (l₁ ∨ … ∨ lₙ)`. An empty disjunction fixes `target`
    /// to false.
    pub fn add_or_equivalence(&mut self, target: impl Into<Lit>, lits: &[Lit]) {
        let target = target.into();
        let mut forward = Vec::with_capacity(lits.len() + 1);
        forward.push(!target);
        forward.extend_from_slice(lits);
        self.add_clause(&forward);
        for &lit in lits {
            self.add_clause(&[!lit, target]);
        }
    }

    /// Posts `target ⇔ (l₁ ∧ … ∧ lₙ)`.
    pub fn add_and_equivalence(&mut self, target: impl Into<Lit>, lits: &[Lit]) {
        let target = target.into();
        for &lit in lits {
            self.add_clause(&[!target, lit]);
        }
        let mut backward: Vec<Lit> = lits.iter().map(|&l| !l).collect();
        backward.push(target);
        self.add_clause(&backward);
    }

    /// Posts `target ⇔ (expr ≥ k)` as two enforced linear constraints.
    pub fn add_at_least_equivalence(&mut self, target: impl Into<Lit>, expr: LinearExpr, k: i64) {
        let target = target.into();
        self.add_linear_if(expr.clone(), k, i64::MAX, &[target]);
        self.add_linear_if(expr, i64::MIN, k.saturating_sub(1), &[!target]);
    }

    /// Posts `target ⇔ (expr ≤ k)`.
    pub fn add_at_most_equivalence(&mut self, target: impl Into<Lit>, expr: LinearExpr, k: i64) {
        let target = target.into();
        self.add_at_least_equivalence(!target, expr, k.saturating_add(1));
    }

    /// Sets the minimization objective, replacing any previous one.
    pub fn minimize(&mut self, expr: LinearExpr) {
        self.objective = Some(expr);
    }

    /// Whether an objective has been set.
    pub fn has_objective(&self) -> bool {
        self.objective.is_some()
    }

    /// Number of variables.
    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    /// Number of posted constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Debug name of a variable.
    pub fn var_name(&self, index: usize) -> Option<&str> {
        self.vars.get(index).map(|v| v.name.as_str())
    }

    /// Initial domain bounds of a variable.
    pub fn var_bounds(&self, var: IntVar) -> Option<(i64, i64)> {
        self.vars.get(var.index()).map(|v| (v.lo, v.hi))
    }

    /// Checks structural well-formedness: non-empty domains, in-range
    /// variable references, literals over 0/1 variables.
    ///
    /// Returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();
        let n = self.vars.len() as u32;

        for (i, def) in self.vars.iter().enumerate() {
            if def.lo > def.hi {
                problems.push(format!(
                    "variable {i} '{}' has empty domain [{}, {}]",
                    def.name, def.lo, def.hi
                ));
            }
        }

        let is_bool = |v: u32| {
            self.vars
                .get(v as usize)
                .is_some_and(|d| d.lo >= 0 && d.hi <= 1 && d.lo <= d.hi)
        };
        let check_lit = |lit: &Lit, problems: &mut Vec<String>| {
            if lit.var >= n {
                problems.push(format!("literal references unknown variable {}", lit.var));
            } else if !is_bool(lit.var) {
                problems.push(format!("literal over non-boolean variable {}", lit.var));
            }
        };

        for (ci, c) in self.constraints.iter().enumerate() {
            match c {
                ModelConstraint::Linear { expr, enforce, .. } => {
                    for &(v, _) in &expr.terms {
                        if v >= n {
                            problems.push(format!("constraint {ci} references unknown variable {v}"));
                        }
                    }
                    for lit in enforce {
                        check_lit(lit, &mut problems);
                    }
                }
                ModelConstraint::AllDifferent(vars) => {
                    for &v in vars {
                        if v >= n {
                            problems.push(format!("constraint {ci} references unknown variable {v}"));
                        }
                    }
                }
                ModelConstraint::ValueEquivalence { lit, var, .. } => {
                    check_lit(lit, &mut problems);
                    if *var >= n {
                        problems.push(format!("constraint {ci} references unknown variable {var}"));
                    }
                }
                ModelConstraint::Clause(lits) => {
                    for lit in lits {
                        check_lit(lit, &mut problems);
                    }
                }
            }
        }

        if let Some(obj) = &self.objective {
            for &(v, _) in &obj.terms {
                if v >= n {
                    problems.push(format!("objective references unknown variable {v}"));
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negated_literal_normalization() {
        let mut m = CpModel::new("t");
        let b = m.new_bool_var("b");
        let expr = LinearExpr::new().with_lit(!b, 3);
        // 3·(1 - b) = 3 - 3b
        assert_eq!(expr.constant, 3);
        assert_eq!(expr.terms, vec![(b.0, -3)]);
        assert_eq!(expr.evaluate(&[0]), 3);
        assert_eq!(expr.evaluate(&[1]), 0);
    }

    #[test]
    fn test_normalized_merges_duplicates() {
        let x = IntVar(0);
        let y = IntVar(1);
        let expr = LinearExpr::new()
            .with_int(y, 2)
            .with_int(x, 1)
            .with_int(y, -2)
            .with_int(x, 4);
        let n = expr.normalized();
        assert_eq!(n.terms, vec![(0, 5)]);
    }

    #[test]
    fn test_add_scaled() {
        let x = IntVar(0);
        let base = LinearExpr::new().with_int(x, 2).with_lit(!BoolVar(1), 1);
        let mut total = LinearExpr::constant(1);
        total.add_scaled(&base, 3);
        // 1 + 3·(2x + 1 - b)
        assert_eq!(total.evaluate(&[1, 0]), 1 + 3 * 3);
        assert_eq!(total.evaluate(&[0, 1]), 1);
    }

    #[test]
    fn test_validate_detects_problems() {
        let mut m = CpModel::new("t");
        let x = m.new_int_var(3, 1, "bad");
        m.add_value_equivalence(Lit { var: x.0, negated: false }, x, 1);
        m.add_clause(&[Lit { var: 99, negated: false }]);

        let problems = m.validate().unwrap_err();
        assert_eq!(problems.len(), 3);
    }

    #[test]
    fn test_validate_ok() {
        let mut m = CpModel::new("t");
        let x = m.new_int_var(0, 5, "x");
        let b = m.new_bool_var("b");
        m.add_value_equivalence(b, x, 2);
        m.add_at_least_equivalence(b, LinearExpr::sum_ints([x]), 2);
        m.minimize(LinearExpr::sum_ints([x]));
        assert!(m.validate().is_ok());
        assert_eq!(m.var_count(), 2);
        assert_eq!(m.constraint_count(), 3);
    }
}

//! Integer-programming engine over `good_lp` with the pure-Rust `microlp`
//! backend.
//!
//! Every model element is lowered to 0/1 integer-program form:
//!
//! | model element | lowering |
//! |---------------|----------|
//! | `lo ≤ expr ≤ hi` | two rows (infinite sides dropped) |
//! | enforced linear | big-M relaxation on the false enforcement literals |
//! | `lit ⇔ x = v` | one-hot indicators of `x`: `Σ z = 1`, `Σ v·z = x`, `lit = z_v` |
//! | all-different | `Σ z_v ≤ 1` per value over the one-hot indicators |
//! | clause | `Σ lits ≥ 1` |
//!
//! The backend has no cancellation hook, so the solve runs on its own
//! thread and the time limit bounds how long the caller waits.
//!
//! # Reference
//! Wolsey (1998), "Integer Programming", Ch. 1

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Instant;

use good_lp::{
    constraint, microlp, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use tracing::{debug, info, warn};

use super::model::{BoolVar, CpModel, IntVar, LinearExpr, Lit, ModelConstraint};
use super::solver::{CpSolution, CpSolver, SearchStats, SolveStatus, SolverConfig};

/// Largest domain that may be expanded into one-hot indicators.
const MAX_ONE_HOT: i64 = 4096;

/// Magnitude beyond which bounds count as infinite.
const INFINITE: i128 = 1 << 50;

/// The built-in solver: a MILP lowering solved by `microlp`.
///
/// Complete: given enough time it either proves infeasibility or returns
/// an optimal assignment. Deterministic for a fixed model.
///
/// # Example
/// ```
/// use u_league::cp::{CpModel, CpSolver, LinearExpr, MilpSolver, SolveStatus, SolverConfig};
///
/// let mut model = CpModel::new("demo");
/// let x = model.new_int_var(0, 5, "x");
/// let y = model.new_int_var(0, 5, "y");
/// model.add_ge(LinearExpr::sum_ints([x, y]), 4);
/// model.minimize(LinearExpr::new().with_int(x, 2).with_int(y, 1));
///
/// let solution = MilpSolver::new().solve(&model, &SolverConfig::default());
/// assert_eq!(solution.status, SolveStatus::Optimal);
/// assert_eq!(solution.objective, Some(4));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MilpSolver;

impl MilpSolver {
    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for MilpSolver {
    fn name(&self) -> &str {
        "milp"
    }

    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        let start = Instant::now();
        if let Err(problems) = model.validate() {
            warn!(model = model.name(), problems = problems.len(), "model is malformed");
            for p in &problems {
                debug!(problem = %p, "model problem");
            }
            return CpSolution::without_values(SolveStatus::ModelInvalid);
        }

        let lowered = match Lowering::lower(model) {
            Ok(lowered) => lowered,
            Err(reason) => {
                warn!(model = model.name(), %reason, "model cannot be lowered");
                return CpSolution::without_values(SolveStatus::ModelInvalid);
            }
        };
        let stats = SearchStats {
            columns: lowered.columns,
            rows: lowered.rows.len(),
            wall_time: Default::default(),
        };
        debug!(
            model = model.name(),
            columns = stats.columns,
            rows = stats.rows,
            "milp lowered"
        );

        let (tx, rx) = mpsc::channel();
        let spawned = std::thread::Builder::new()
            .name(format!("milp-{}", model.name()))
            .spawn(move || {
                let _ = tx.send(lowered.run());
            });
        if let Err(e) = spawned {
            warn!(error = %e, "cannot start solver thread");
            return CpSolution::without_values(SolveStatus::Unknown);
        }

        let mut solution = match rx.recv_timeout(config.time_limit) {
            Ok(Outcome::Solved(raw)) => {
                let values: Vec<i64> = raw.iter().map(|v| v.round() as i64).collect();
                let objective = model.objective.as_ref().map(|o| o.evaluate(&values));
                CpSolution::with_values(SolveStatus::Optimal, values, objective)
            }
            Ok(Outcome::Infeasible) => CpSolution::without_values(SolveStatus::Infeasible),
            Ok(Outcome::Failed(reason)) => {
                warn!(model = model.name(), %reason, "milp backend failed");
                CpSolution::without_values(SolveStatus::Unknown)
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    model = model.name(),
                    limit_ms = config.time_limit.as_millis() as u64,
                    "time limit reached without a solution"
                );
                CpSolution::without_values(SolveStatus::Unknown)
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!(model = model.name(), "solver thread exited without an answer");
                CpSolution::without_values(SolveStatus::Unknown)
            }
        };
        solution.stats = SearchStats {
            wall_time: start.elapsed(),
            ..stats
        };

        info!(
            model = model.name(),
            status = %solution.status,
            objective = ?solution.objective,
            elapsed_ms = solution.stats.wall_time.as_millis() as u64,
            "solve finished"
        );
        solution
    }
}

/// Backend answer, sent back from the solver thread.
enum Outcome {
    Solved(Vec<f64>),
    Infeasible,
    Failed(String),
}

/// A lowered row: `lo ≤ Σ coef·column + constant ≤ hi`.
struct Row {
    terms: Vec<(usize, i64)>,
    constant: i64,
    lo: Option<i64>,
    hi: Option<i64>,
}

/// Column kinds of the lowered program.
#[derive(Clone, Copy)]
enum Column {
    /// A model variable with its bounds.
    Model { lo: i64, hi: i64 },
    /// An auxiliary 0/1 indicator.
    Indicator,
}

/// A model translated into integer-program rows.
struct Lowering {
    model_vars: usize,
    columns: usize,
    kinds: Vec<Column>,
    rows: Vec<Row>,
    objective: Option<LinearExpr>,
    /// A constant row already violates its bounds.
    contradiction: bool,
}

impl Lowering {
    fn lower(model: &CpModel) -> Result<Self, String> {
        let mut lowering = Self {
            model_vars: model.vars.len(),
            columns: model.vars.len(),
            kinds: model
                .vars
                .iter()
                .map(|d| Column::Model { lo: d.lo, hi: d.hi })
                .collect(),
            rows: Vec::new(),
            objective: model.objective.as_ref().map(LinearExpr::normalized),
            contradiction: false,
        };

        // (var, value) → literal standing for `var = value`
        let mut one_hot: BTreeMap<(u32, i64), Lit> = BTreeMap::new();
        let mut expanded: BTreeSet<u32> = BTreeSet::new();
        for c in &model.constraints {
            match c {
                ModelConstraint::ValueEquivalence { lit, var, value } => {
                    expanded.insert(*var);
                    match one_hot.entry((*var, *value)) {
                        Entry::Occupied(e) => lowering.post_lit_eq(*e.get(), *lit),
                        Entry::Vacant(e) => {
                            e.insert(*lit);
                        }
                    }
                }
                ModelConstraint::AllDifferent(vars) => expanded.extend(vars.iter().copied()),
                _ => {}
            }
        }

        for &var in &expanded {
            let def = &model.vars[var as usize];
            if def.hi.saturating_sub(def.lo) >= MAX_ONE_HOT {
                return Err(format!("domain of '{}' is too wide for indicators", def.name));
            }
            let mut pick = LinearExpr::new();
            let mut value_of = LinearExpr::new().with_int(IntVar(var), -1);
            for v in def.lo..=def.hi {
                let lit = *one_hot
                    .entry((var, v))
                    .or_insert_with(|| lowering.new_indicator());
                pick.add_lit(lit, 1);
                value_of.add_lit(lit, v);
            }
            lowering.post(pick, Some(1), Some(1));
            lowering.post(value_of, Some(0), Some(0));
        }
        // Equivalences on values outside the domain force their literal false.
        for (&(var, value), &lit) in &one_hot {
            let def = &model.vars[var as usize];
            if value < def.lo || value > def.hi {
                lowering.post(LinearExpr::new().with_lit(lit, 1), Some(0), Some(0));
            }
        }

        for c in &model.constraints {
            match c {
                ModelConstraint::Linear { expr, lo, hi, enforce } => {
                    lowering.post_linear(expr, *lo, *hi, enforce)?;
                }
                ModelConstraint::AllDifferent(vars) => {
                    let values: BTreeSet<i64> = vars
                        .iter()
                        .flat_map(|&v| {
                            let d = &model.vars[v as usize];
                            d.lo..=d.hi
                        })
                        .collect();
                    for value in values {
                        let lits = vars.iter().filter_map(|&v| one_hot.get(&(v, value)).copied());
                        lowering.post(LinearExpr::sum_lits(lits), None, Some(1));
                    }
                }
                ModelConstraint::ValueEquivalence { .. } => {}
                ModelConstraint::Clause(lits) => {
                    lowering.post(LinearExpr::sum_lits(lits.iter().copied()), Some(1), None);
                }
            }
        }
        Ok(lowering)
    }

    fn new_indicator(&mut self) -> Lit {
        let id = self.columns as u32;
        self.columns += 1;
        self.kinds.push(Column::Indicator);
        BoolVar(id).lit()
    }

    fn post_lit_eq(&mut self, a: Lit, b: Lit) {
        self.post(LinearExpr::new().with_lit(a, 1).with_lit(b, -1), Some(0), Some(0));
    }

    fn post(&mut self, expr: LinearExpr, lo: Option<i64>, hi: Option<i64>) {
        let expr = expr.normalized();
        if expr.is_constant() {
            let c = expr.constant;
            if lo.is_some_and(|lo| c < lo) || hi.is_some_and(|hi| c > hi) {
                self.contradiction = true;
            }
            return;
        }
        self.rows.push(Row {
            terms: expr.terms.iter().map(|&(v, c)| (v as usize, c)).collect(),
            constant: expr.constant,
            lo,
            hi,
        });
    }

    /// Range of `expr` over the column bounds.
    fn expr_range(&self, expr: &LinearExpr) -> (i128, i128) {
        let mut lo = i128::from(expr.constant);
        let mut hi = lo;
        for &(v, c) in &expr.terms {
            let (vlo, vhi) = match self.kinds[v as usize] {
                Column::Model { lo, hi } => (i128::from(lo), i128::from(hi)),
                Column::Indicator => (0, 1),
            };
            let c = i128::from(c);
            let (a, b) = (c * vlo, c * vhi);
            lo += a.min(b);
            hi += a.max(b);
        }
        (lo, hi)
    }

    fn post_linear(&mut self, expr: &LinearExpr, lo: i64, hi: i64, enforce: &[Lit]) -> Result<(), String> {
        let expr = expr.normalized();
        let lo = (lo != i64::MIN).then_some(lo);
        let hi = (hi != i64::MAX).then_some(hi);
        if enforce.is_empty() {
            self.post(expr, lo, hi);
            return Ok(());
        }

        // Number of false enforcement literals; zero when all hold.
        let slack = LinearExpr::sum_lits(enforce.iter().map(|&l| !l));
        let (min, max) = self.expr_range(&expr);
        if min.abs() >= INFINITE || max.abs() >= INFINITE {
            return Err("enforced linear over unbounded terms".to_string());
        }
        if let Some(lo) = lo.filter(|&lo| i128::from(lo) > min) {
            // expr + M·slack ≥ lo, M = lo - min
            let big_m = i64::try_from(i128::from(lo) - min).map_err(|e| e.to_string())?;
            let mut row = expr.clone();
            row.add_scaled(&slack, big_m);
            self.post(row, Some(lo), None);
        }
        if let Some(hi) = hi.filter(|&hi| i128::from(hi) < max) {
            // expr - M·slack ≤ hi, M = max - hi
            let big_m = i64::try_from(max - i128::from(hi)).map_err(|e| e.to_string())?;
            let mut row = expr;
            row.add_scaled(&slack, -big_m);
            self.post(row, None, Some(hi));
        }
        Ok(())
    }

    /// Builds the `good_lp` problem and solves it. Runs on the solver thread.
    fn run(self) -> Outcome {
        if self.contradiction {
            return Outcome::Infeasible;
        }
        let mut vars = ProblemVariables::new();
        let columns: Vec<Variable> = self
            .kinds
            .iter()
            .map(|kind| match *kind {
                Column::Model { lo, hi } if lo >= 0 && hi <= 1 => vars.add(variable().binary()),
                Column::Model { lo, hi } => {
                    vars.add(variable().integer().min(lo as f64).max(hi as f64))
                }
                Column::Indicator => vars.add(variable().binary()),
            })
            .collect();

        let affine = |terms: &[(usize, i64)], constant: i64| -> Expression {
            let mut e = Expression::from(constant as f64);
            for &(v, c) in terms {
                e += c as f64 * columns[v];
            }
            e
        };

        let objective = match &self.objective {
            Some(obj) => {
                let terms: Vec<(usize, i64)> = obj.terms.iter().map(|&(v, c)| (v as usize, c)).collect();
                affine(&terms, obj.constant)
            }
            None => Expression::from(0.0),
        };
        let mut problem = vars.minimise(objective).using(microlp);

        // Boolean model variables with a fixed value.
        for (i, kind) in self.kinds.iter().enumerate() {
            if let Column::Model { lo, hi } = *kind {
                if lo >= 0 && hi <= 1 && lo == hi {
                    problem.add_constraint(constraint::eq(
                        Expression::from(columns[i]),
                        Expression::from(lo as f64),
                    ));
                }
            }
        }
        for row in &self.rows {
            let e = affine(&row.terms, row.constant);
            if let Some(lo) = row.lo {
                problem.add_constraint(constraint::geq(e.clone(), Expression::from(lo as f64)));
            }
            if let Some(hi) = row.hi {
                problem.add_constraint(constraint::leq(e, Expression::from(hi as f64)));
            }
        }

        match problem.solve() {
            Ok(solution) => Outcome::Solved(
                columns[..self.model_vars]
                    .iter()
                    .map(|&v| solution.value(v))
                    .collect(),
            ),
            Err(ResolutionError::Infeasible) => Outcome::Infeasible,
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }
}

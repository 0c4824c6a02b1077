//! Objective accumulator.
//!
//! Optimizers receive `&mut ObjectiveAccumulator` and may only append
//! weighted terms; there is no way to read what another optimizer added.
//! The accumulator is consumed by value, so the combined objective is
//! formed exactly once.

use crate::cp::{LinearExpr, Lit};

#[derive(Debug, Clone)]
struct ObjectiveTerm {
    label: String,
    weight: i64,
    expr: LinearExpr,
}

/// Append-only collection of weighted objective terms.
#[derive(Debug, Clone, Default)]
pub struct ObjectiveAccumulator {
    terms: Vec<ObjectiveTerm>,
}

impl ObjectiveAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `weight · expr`.
    pub fn add(&mut self, label: impl Into<String>, weight: i64, expr: LinearExpr) {
        self.terms.push(ObjectiveTerm {
            label: label.into(),
            weight,
            expr,
        });
    }

    /// Appends `weight` whenever `lit` holds.
    pub fn add_indicator(&mut self, label: impl Into<String>, weight: i64, lit: impl Into<Lit>) {
        self.add(label, weight, LinearExpr::new().with_lit(lit, 1));
    }

    /// Combines every term into one expression, or `None` when nothing
    /// was appended (a pure satisfaction problem).
    pub fn into_objective(self) -> Option<LinearExpr> {
        if self.terms.is_empty() {
            return None;
        }
        let mut total = LinearExpr::new();
        for term in &self.terms {
            total.add_scaled(&term.expr, term.weight);
        }
        tracing::debug!(
            terms = self.terms.len(),
            labels = ?self.terms.iter().map(|t| t.label.as_str()).collect::<Vec<_>>(),
            "objective combined"
        );
        Some(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::CpModel;

    #[test]
    fn test_empty_accumulator_has_no_objective() {
        assert!(ObjectiveAccumulator::new().into_objective().is_none());
    }

    #[test]
    fn test_weighted_sum() {
        let mut m = CpModel::new("t");
        let a = m.new_bool_var("a");
        let b = m.new_bool_var("b");
        let mut acc = ObjectiveAccumulator::new();
        acc.add_indicator("bye", 10, a);
        acc.add_indicator("late", 3, !b);
        let obj = acc.into_objective().unwrap();
        // 10a + 3(1 - b)
        assert_eq!(obj.evaluate(&[1, 0]), 13);
        assert_eq!(obj.evaluate(&[0, 1]), 0);
    }
}

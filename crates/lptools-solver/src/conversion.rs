use log::debug;

use crate::error::SolveError;
use crate::problem::{Comparison, LinearProgram, LpState, Objective};

impl LinearProgram {
    /// Rewrites the model into canonical form: a maximization where every
    /// constraint is `<=`. Does nothing unless the model is still `Undefined`.
    pub fn to_canonical_form(&mut self) -> Result<(), SolveError> {
        if self.state != LpState::Undefined {
            return Ok(());
        }
        self.validate()?;

        self.source_objective = self.objective;
        self.ensure_maximization();
        self.ensure_non_negative_rhs()?;
        self.convert_to_less_equal()?;
        self.state = LpState::Canonical;

        debug_assert!(self.validate().is_ok());
        debug!(
            "canonical form: {} constraints, {} variables",
            self.num_constraints, self.num_variables
        );
        Ok(())
    }

    /// Rewrites the model into slack form, canonicalizing first if needed.
    /// Every constraint becomes an equality over one extra slack column.
    pub fn to_slack_form(&mut self) -> Result<(), SolveError> {
        if self.state == LpState::Slack {
            return Ok(());
        }
        if self.state == LpState::Undefined {
            self.to_canonical_form()?;
        }
        self.validate()?;

        for row in 0..self.num_constraints {
            // Canonicalization leaves only `<=` rows; a `>=` row here would need a
            // surplus column and an artificial basis, which this solver does not build.
            debug_assert!(
                matches!(self.comparisons[row], Comparison::LessEq | Comparison::Less),
                "row {} reached slack form as {}",
                row,
                self.comparisons[row]
            );
            self.add_slack_variable(row);
        }
        self.state = LpState::Slack;

        debug_assert!(self.validate().is_ok());
        debug!(
            "slack form: {} constraints, {} variables ({} slack)",
            self.num_constraints,
            self.num_variables,
            self.slack_variable_names.len()
        );
        Ok(())
    }

    /// Turns a minimization into a maximization by negating the objective.
    /// The reported objective value is negated back after solving.
    pub fn ensure_maximization(&mut self) {
        if self.objective == Objective::Minimize {
            self.objective = Objective::Maximize;
            for coeff in &mut self.objective_coeff {
                *coeff = -*coeff;
            }
        }
    }

    /// Multiplies every row with a negative right-hand side by -1, flipping its comparison.
    pub fn ensure_non_negative_rhs(&mut self) -> Result<(), SolveError> {
        self.validate()?;
        let rows = self.rhs.iter_mut().zip(&mut self.constraint_coeff).zip(&mut self.comparisons);
        for ((rhs, coeffs), comparison) in rows {
            if *rhs < 0.0 {
                *rhs = -*rhs;
                negate_row(coeffs);
                *comparison = comparison.flipped();
            }
        }
        Ok(())
    }

    /// Replaces every row by equivalent `<=` rows. An equality becomes the pair
    /// `a·x <= b` and `-a·x <= -b`, so the row count can grow.
    pub fn convert_to_less_equal(&mut self) -> Result<(), SolveError> {
        self.validate()?;
        let mut coeffs = Vec::with_capacity(self.num_constraints);
        let mut rhs = Vec::with_capacity(self.num_constraints);

        let rows = std::mem::take(&mut self.constraint_coeff);
        for ((row, b), comparison) in rows.into_iter().zip(self.rhs.iter().copied()).zip(&self.comparisons) {
            match comparison {
                Comparison::LessEq | Comparison::Less => {
                    coeffs.push(row);
                    rhs.push(b);
                }
                Comparison::GreaterEq | Comparison::Greater => {
                    let mut negated = row;
                    negate_row(&mut negated);
                    coeffs.push(negated);
                    rhs.push(-b);
                }
                Comparison::Eq => {
                    let mut negated = row.clone();
                    negate_row(&mut negated);
                    coeffs.push(row);
                    rhs.push(b);
                    coeffs.push(negated);
                    rhs.push(-b);
                }
            }
        }

        self.num_constraints = coeffs.len();
        self.comparisons = vec![Comparison::LessEq; coeffs.len()];
        self.constraint_coeff = coeffs;
        self.rhs = rhs;
        Ok(())
    }

    /// Appends a column with +1 in `row` and 0 elsewhere, and makes `row` an equality.
    fn add_slack_variable(&mut self, row: usize) {
        let name = format!("s{}", self.slack_variable_names.len() + 1);
        debug!("adding slack column {} for row {}", name, row);

        self.slack_variable_names.push(name);
        self.objective_coeff.push(0.0);
        self.num_variables += 1;
        for (i, coeffs) in self.constraint_coeff.iter_mut().enumerate() {
            coeffs.push(if i == row { 1.0 } else { 0.0 });
        }
        self.comparisons[row] = Comparison::Eq;
    }
}

fn negate_row(row: &mut [f64]) {
    for value in row {
        *value = -*value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(
        objective: Objective,
        objective_coeff: Vec<f64>,
        rows: Vec<(Vec<f64>, Comparison, f64)>,
    ) -> LinearProgram {
        let names = (1..=objective_coeff.len()).map(|i| format!("x{}", i)).collect();
        let mut lp = LinearProgram::new(names, objective, objective_coeff);
        for (coeffs, comparison, rhs) in rows {
            lp.add_constraint(coeffs, comparison, rhs);
        }
        lp
    }

    #[test]
    fn test_to_canonical_form_minimize_with_ge() {
        let mut lp = program(
            Objective::Minimize,
            vec![1.0, 2.0],
            vec![
                (vec![1.0, 1.0], Comparison::GreaterEq, 10.0),
                (vec![2.0, 1.0], Comparison::LessEq, 15.0),
            ],
        );

        lp.to_canonical_form().unwrap();

        assert_eq!(lp.state, LpState::Canonical);
        assert_eq!(lp.objective, Objective::Maximize);
        assert_eq!(lp.objective_coeff, vec![-1.0, -2.0]);
        assert_eq!(lp.comparisons, vec![Comparison::LessEq, Comparison::LessEq]);
        assert_eq!(lp.constraint_coeff[0], vec![-1.0, -1.0]);
        assert_eq!(lp.rhs[0], -10.0);
        assert_eq!(lp.constraint_coeff[1], vec![2.0, 1.0]);
        assert_eq!(lp.rhs[1], 15.0);
    }

    #[test]
    fn test_canonical_form_of_canonical_input_only_flips_objective() {
        let rows = vec![
            (vec![1.0, 0.0], Comparison::LessEq, 4.0),
            (vec![3.0, 2.0], Comparison::LessEq, 18.0),
        ];
        let mut lp = program(Objective::Minimize, vec![3.0, 5.0], rows);
        let before = lp.clone();

        lp.to_canonical_form().unwrap();

        assert_eq!(lp.objective_coeff, vec![-3.0, -5.0]);
        assert_eq!(lp.constraint_coeff, before.constraint_coeff);
        assert_eq!(lp.rhs, before.rhs);
        assert_eq!(lp.comparisons, before.comparisons);
        assert_eq!(lp.num_constraints, before.num_constraints);
        assert_eq!(lp.num_variables, before.num_variables);
    }

    #[test]
    fn test_ensure_non_negative_rhs_flips_each_kind() {
        let mut lp = program(
            Objective::Maximize,
            vec![1.0, 1.0],
            vec![
                (vec![1.0, -2.0], Comparison::LessEq, -1.0),
                (vec![1.0, 1.0], Comparison::Less, -2.0),
                (vec![-1.0, 3.0], Comparison::GreaterEq, -3.0),
                (vec![2.0, 0.0], Comparison::Greater, -4.0),
                (vec![0.0, 1.0], Comparison::Eq, -5.0),
                (vec![1.0, 1.0], Comparison::LessEq, 6.0),
            ],
        );

        lp.ensure_non_negative_rhs().unwrap();

        assert_eq!(lp.rhs, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(
            lp.comparisons,
            vec![
                Comparison::GreaterEq,
                Comparison::Greater,
                Comparison::LessEq,
                Comparison::Less,
                Comparison::Eq,
                Comparison::LessEq,
            ]
        );
        assert_eq!(lp.constraint_coeff[0], vec![-1.0, 2.0]);
        assert_eq!(lp.constraint_coeff[2], vec![1.0, -3.0]);
        assert_eq!(lp.constraint_coeff[5], vec![1.0, 1.0]);
    }

    #[test]
    fn test_equality_becomes_two_opposite_rows() {
        let mut lp = program(
            Objective::Maximize,
            vec![1.0, 1.0],
            vec![
                (vec![1.0, 0.0], Comparison::LessEq, 4.0),
                (vec![1.0, 2.0], Comparison::Eq, 6.0),
                (vec![0.0, 1.0], Comparison::Greater, 1.0),
            ],
        );

        lp.convert_to_less_equal().unwrap();

        assert_eq!(lp.num_constraints, 4);
        assert!(lp.comparisons.iter().all(|c| *c == Comparison::LessEq));
        assert_eq!(lp.constraint_coeff[1], vec![1.0, 2.0]);
        assert_eq!(lp.constraint_coeff[2], vec![-1.0, -2.0]);
        assert_eq!(lp.rhs[1], 6.0);
        assert_eq!(lp.rhs[2], -6.0);
        assert_eq!(lp.constraint_coeff[3], vec![0.0, -1.0]);
        assert_eq!(lp.rhs[3], -1.0);
        assert!(lp.validate().is_ok());
    }

    #[test]
    fn test_to_slack_form() {
        let mut lp = program(
            Objective::Maximize,
            vec![1.0, 2.0],
            vec![
                (vec![1.0, 1.0], Comparison::LessEq, 10.0),
                (vec![2.0, 1.0], Comparison::LessEq, 15.0),
            ],
        );

        lp.to_slack_form().unwrap();

        assert_eq!(lp.state, LpState::Slack);
        assert_eq!(lp.num_variables, 4);
        assert_eq!(lp.slack_variable_names, vec!["s1", "s2"]);
        assert_eq!(lp.comparisons, vec![Comparison::Eq, Comparison::Eq]);
        assert_eq!(lp.objective_coeff, vec![1.0, 2.0, 0.0, 0.0]);
        assert_eq!(lp.constraint_coeff[0], vec![1.0, 1.0, 1.0, 0.0]);
        assert_eq!(lp.constraint_coeff[1], vec![2.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_slack_form_counts_rows_after_canonicalization() {
        let mut lp = program(
            Objective::Minimize,
            vec![1.0, 1.0],
            vec![
                (vec![1.0, 1.0], Comparison::Eq, 3.0),
                (vec![1.0, 0.0], Comparison::GreaterEq, 1.0),
            ],
        );

        lp.to_slack_form().unwrap();

        // the equality doubled, so three rows and three slack columns
        assert_eq!(lp.num_constraints, 3);
        assert_eq!(lp.num_variables, 2 + 3);
        assert_eq!(lp.slack_variable_names, vec!["s1", "s2", "s3"]);
        assert!(lp.comparisons.iter().all(|c| *c == Comparison::Eq));
        for (i, row) in lp.constraint_coeff.iter().enumerate() {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(row[2 + j], expected, "row {} slack column {}", i, j);
            }
        }
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let rows = vec![
            (vec![1.0, -1.0], Comparison::Eq, -2.0),
            (vec![3.0, 1.0], Comparison::Greater, 1.0),
        ];

        let mut once = program(Objective::Minimize, vec![2.0, 1.0], rows.clone());
        once.to_canonical_form().unwrap();
        let mut twice = program(Objective::Minimize, vec![2.0, 1.0], rows.clone());
        twice.to_canonical_form().unwrap();
        twice.to_canonical_form().unwrap();
        assert_eq!(once, twice);

        once.to_slack_form().unwrap();
        twice.to_slack_form().unwrap();
        twice.to_slack_form().unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_single_steps_reject_mismatched_lengths() {
        let mut lp = program(
            Objective::Maximize,
            vec![1.0, 1.0],
            vec![
                (vec![1.0, 0.0], Comparison::Eq, -1.0),
                (vec![0.0, 1.0], Comparison::LessEq, 2.0),
            ],
        );
        lp.rhs.pop();
        let before = lp.clone();

        assert!(matches!(
            lp.ensure_non_negative_rhs(),
            Err(SolveError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            lp.convert_to_less_equal(),
            Err(SolveError::DimensionMismatch { .. })
        ));
        // nothing was dropped or rewritten
        assert_eq!(lp, before);
    }

    #[test]
    fn test_canonical_form_rejects_ragged_rows() {
        let mut lp = program(
            Objective::Maximize,
            vec![1.0, 1.0],
            vec![(vec![1.0], Comparison::LessEq, 1.0)],
        );

        assert!(matches!(
            lp.to_canonical_form(),
            Err(SolveError::DimensionMismatch { .. })
        ));
        assert_eq!(lp.state, LpState::Undefined);
    }
}

use std::collections::BTreeMap;
use std::fmt;

use crate::error::SolveError;

/// Key under which [`LinearProgram::solution_map`] reports the objective value.
pub const OBJECTIVE_KEY: &str = "objective";

/// Optimization direction
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    Minimize,
    Maximize,
}

/// Comparison between a constraint's left-hand side and its right-hand side
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Equal (=)
    Eq,
    /// Less than (<), handled exactly like `LessEq`
    Less,
    /// Less than or equal (<=)
    LessEq,
    /// Greater than (>), handled exactly like `GreaterEq`
    Greater,
    /// Greater than or equal (>=)
    GreaterEq,
}

impl Comparison {
    /// Maps a statement token (`<`, `<=`, `>`, `>=`, `=`) to its comparison.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "<" => Some(Comparison::Less),
            "<=" => Some(Comparison::LessEq),
            ">" => Some(Comparison::Greater),
            ">=" => Some(Comparison::GreaterEq),
            "=" => Some(Comparison::Eq),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Less => "<",
            Comparison::LessEq => "<=",
            Comparison::Greater => ">",
            Comparison::GreaterEq => ">=",
        }
    }

    /// The comparison that holds after both sides are multiplied by -1.
    pub fn flipped(self) -> Self {
        match self {
            Comparison::LessEq => Comparison::GreaterEq,
            Comparison::GreaterEq => Comparison::LessEq,
            Comparison::Less => Comparison::Greater,
            Comparison::Greater => Comparison::Less,
            Comparison::Eq => Comparison::Eq,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// How far a model has been normalized. Only ever advances.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LpState {
    #[default]
    Undefined,
    Canonical,
    Slack,
}

/// A linear program, mutated in place by normalization and by the solver.
///
/// Variables are implicitly non-negative. Columns are ordered as
/// `variable_names` followed by `slack_variable_names`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LinearProgram {
    pub num_constraints: usize,
    pub num_variables: usize,
    /// Original decision variables, in order of first appearance
    pub variable_names: Vec<String>,
    /// Columns added by the slack transformation (`s1`, `s2`, ...)
    pub slack_variable_names: Vec<String>,
    pub objective: Objective,
    /// Direction the problem was stated in. Copied from `objective` when
    /// canonicalization starts; later stages leave it alone.
    pub source_objective: Objective,
    /// One coefficient per column
    pub objective_coeff: Vec<f64>,
    /// One comparison per row
    pub comparisons: Vec<Comparison>,
    /// `num_constraints` rows of `num_variables` entries
    pub constraint_coeff: Vec<Vec<f64>>,
    pub rhs: Vec<f64>,
    pub state: LpState,
    /// Column values followed by the objective value; set by a successful solve
    pub solution: Option<Vec<f64>>,
}

impl LinearProgram {
    pub fn new(variable_names: Vec<String>, objective: Objective, objective_coeff: Vec<f64>) -> Self {
        Self {
            num_constraints: 0,
            num_variables: variable_names.len(),
            variable_names,
            slack_variable_names: Vec::new(),
            objective,
            source_objective: objective,
            objective_coeff,
            comparisons: Vec::new(),
            constraint_coeff: Vec::new(),
            rhs: Vec::new(),
            state: LpState::Undefined,
            solution: None,
        }
    }

    pub fn add_constraint(&mut self, coefficients: Vec<f64>, comparison: Comparison, rhs: f64) {
        self.constraint_coeff.push(coefficients);
        self.comparisons.push(comparison);
        self.rhs.push(rhs);
        self.num_constraints += 1;
    }

    /// Number of decision variables excluding slack columns
    pub fn num_original_variables(&self) -> usize {
        self.variable_names.len()
    }

    /// Checks that every count agrees with the vectors and matrix it describes.
    pub fn validate(&self) -> Result<(), SolveError> {
        let named = self.variable_names.len() + self.slack_variable_names.len();
        check("variable names", self.num_variables, named)?;
        check("objective coefficients", self.num_variables, self.objective_coeff.len())?;
        check("comparisons", self.num_constraints, self.comparisons.len())?;
        check("right-hand sides", self.num_constraints, self.rhs.len())?;
        check("constraint rows", self.num_constraints, self.constraint_coeff.len())?;
        for (i, row) in self.constraint_coeff.iter().enumerate() {
            check(&format!("constraint row {}", i), self.num_variables, row.len())?;
        }
        Ok(())
    }

    /// Original variable values keyed by name, plus the objective under [`OBJECTIVE_KEY`].
    pub fn solution_map(&self) -> Result<BTreeMap<String, f64>, SolveError> {
        let values = self.solution.as_ref().ok_or(SolveError::SolutionUnavailable)?;
        let objective = *values.last().ok_or(SolveError::SolutionUnavailable)?;

        let mut map: BTreeMap<String, f64> = self
            .variable_names
            .iter()
            .cloned()
            .zip(values.iter().copied())
            .collect();
        map.insert(OBJECTIVE_KEY.to_string(), objective);
        Ok(map)
    }

    /// Objective value of the last successful solve, in the caller's direction.
    pub fn objective_value(&self) -> Option<f64> {
        self.solution.as_ref().and_then(|s| s.last().copied())
    }
}

fn check(field: &str, expected: usize, found: usize) -> Result<(), SolveError> {
    if expected == found {
        Ok(())
    } else {
        Err(SolveError::DimensionMismatch {
            field: field.to_string(),
            expected,
            found,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_builder_keeps_counts_consistent() {
        let mut lp = LinearProgram::new(names(&["x", "y"]), Objective::Maximize, vec![1.0, 2.0]);
        lp.add_constraint(vec![1.0, 1.0], Comparison::LessEq, 10.0);
        lp.add_constraint(vec![2.0, 1.0], Comparison::GreaterEq, 15.0);

        assert_eq!(lp.num_constraints, 2);
        assert_eq!(lp.num_variables, 2);
        assert_eq!(lp.state, LpState::Undefined);
        assert!(lp.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_short_row() {
        let mut lp = LinearProgram::new(names(&["x", "y"]), Objective::Maximize, vec![1.0, 2.0]);
        lp.add_constraint(vec![1.0], Comparison::LessEq, 10.0);

        match lp.validate() {
            Err(SolveError::DimensionMismatch { expected, found, .. }) => {
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("expected dimension mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_comparison_tokens() {
        for token in ["<", "<=", ">", ">=", "="] {
            let comparison = Comparison::from_token(token).unwrap();
            assert_eq!(comparison.to_string(), token);
        }
        assert_eq!(Comparison::from_token("=<"), None);
        assert_eq!(Comparison::from_token("=="), None);
    }

    #[test]
    fn test_flipped_table() {
        assert_eq!(Comparison::LessEq.flipped(), Comparison::GreaterEq);
        assert_eq!(Comparison::GreaterEq.flipped(), Comparison::LessEq);
        assert_eq!(Comparison::Less.flipped(), Comparison::Greater);
        assert_eq!(Comparison::Greater.flipped(), Comparison::Less);
        assert_eq!(Comparison::Eq.flipped(), Comparison::Eq);
    }

    #[test]
    fn test_solution_unavailable_before_solve() {
        let lp = LinearProgram::new(names(&["x1"]), Objective::Maximize, vec![1.0]);
        assert_eq!(lp.solution_map(), Err(SolveError::SolutionUnavailable));
        assert_eq!(lp.objective_value(), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_model_round_trips_through_json() {
        let mut lp = LinearProgram::new(names(&["x1", "x2"]), Objective::Minimize, vec![3.0, 5.0]);
        lp.add_constraint(vec![1.0, 0.0], Comparison::GreaterEq, 4.0);
        lp.add_constraint(vec![0.0, 2.0], Comparison::Less, 12.0);
        lp.state = LpState::Canonical;
        lp.solution = Some(vec![4.0, 0.0, 12.0]);

        let json = serde_json::to_string(&lp).unwrap();
        assert!(json.contains("\"GreaterEq\""), "{}", json);
        assert!(json.contains("\"Canonical\""), "{}", json);

        let back: LinearProgram = serde_json::from_str(&json).unwrap();
        assert_eq!(back, lp);
    }

    #[test]
    fn test_solution_map_skips_slack_columns() {
        let mut lp = LinearProgram::new(names(&["x1", "x2"]), Objective::Maximize, vec![3.0, 5.0]);
        lp.solution = Some(vec![2.0, 6.0, 2.0, 0.0, 0.0, 36.0]);

        let map = lp.solution_map().unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map["x1"], 2.0);
        assert_eq!(map["x2"], 6.0);
        assert_eq!(map[OBJECTIVE_KEY], 36.0);
    }
}

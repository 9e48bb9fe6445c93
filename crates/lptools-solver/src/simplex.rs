use std::fmt;

use log::{debug, info, trace};

use crate::error::SolveError;
use crate::problem::{LinearProgram, Objective};

/// Tolerance below which tableau entries are treated as zero
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Primal simplex solver using Bland's rule, starting from the slack basis
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum pivots before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Normalizes `problem` to slack form and solves it, storing the result in
    /// `problem.solution`. On failure the solution stays unset.
    pub fn solve(&self, problem: &mut LinearProgram) -> Result<(), SolveError> {
        problem.solution = None;
        check_tolerance(self.tolerance)?;

        let mut tableau = Tableau::new(problem)?.with_tolerance(self.tolerance);

        if !tableau.is_initially_feasible() {
            info!("slack basis has a negative right-hand side, problem is infeasible");
            return Err(SolveError::Infeasible);
        }

        let mut pivots = 0;
        loop {
            trace!("{}", tableau);

            let Some(pivot_col) = tableau.find_entering_variable() else {
                let solution = tableau.extract_solution(problem.source_objective);
                info!(
                    "optimal after {} pivots, objective {}",
                    pivots,
                    solution.last().copied().unwrap_or_default()
                );
                problem.solution = Some(solution);
                return Ok(());
            };

            let Some(pivot_row) = tableau.find_leaving_variable(pivot_col) else {
                info!("column {} has no leaving row, problem is unbounded", pivot_col);
                return Err(SolveError::Unbounded);
            };

            if pivots == self.max_iterations {
                return Err(SolveError::IterationLimit {
                    limit: self.max_iterations,
                });
            }

            debug!(
                "pivot {}: column {} enters, row {} (basic {}) leaves",
                pivots + 1,
                pivot_col,
                pivot_row,
                tableau.basic_variables[pivot_row]
            );
            tableau.perform_pivot(pivot_row, pivot_col);
            pivots += 1;
        }
    }
}

/// Rejects tolerances that would break the sign tests of the ratio and
/// entering-column searches (NaN compares false, negatives admit zeros).
pub fn check_tolerance(tol: f64) -> Result<(), SolveError> {
    if tol.is_finite() && tol >= 0.0 {
        Ok(())
    } else {
        Err(SolveError::InvalidTolerance { value: tol })
    }
}

/// Solves `problem` with the default [`Solver`] settings.
pub fn solve(problem: &mut LinearProgram) -> Result<(), SolveError> {
    Solver::new().solve(problem)
}

/// Dense simplex tableau. The last row holds the negated objective, the last
/// column the right-hand side.
#[derive(Debug, Clone)]
pub struct Tableau {
    data: Vec<Vec<f64>>,
    /// Column that is basic in each constraint row
    basic_variables: Vec<usize>,
    tolerance: f64,
}

impl Tableau {
    /// Builds the initial tableau over the slack basis, converting `problem`
    /// to slack form first if it is not there yet.
    pub fn new(problem: &mut LinearProgram) -> Result<Self, SolveError> {
        problem.to_slack_form()?;
        problem.validate()?;

        let m = problem.num_constraints;
        let n = problem.num_variables;
        let n_orig = problem.num_original_variables();

        let mut data = vec![vec![0.0; n + 1]; m + 1];
        for (i, row) in problem.constraint_coeff.iter().enumerate() {
            data[i][..n].copy_from_slice(row);
            data[i][n] = problem.rhs[i];
        }
        for (j, &coeff) in problem.objective_coeff.iter().enumerate() {
            data[m][j] = -coeff;
        }

        Ok(Self {
            data,
            basic_variables: (n_orig..n_orig + m).collect(),
            tolerance: DEFAULT_TOLERANCE,
        })
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.data
    }

    pub fn basic_variables(&self) -> &[usize] {
        &self.basic_variables
    }

    fn objective_row(&self) -> usize {
        self.data.len() - 1
    }

    fn rhs_col(&self) -> usize {
        self.data[0].len() - 1
    }

    /// True when every constraint row has a non-negative right-hand side, so
    /// the slack basis is a basic feasible solution.
    pub fn is_initially_feasible(&self) -> bool {
        let rhs_col = self.rhs_col();
        self.data[..self.objective_row()].iter().all(|row| row[rhs_col] >= 0.0)
    }

    /// First column whose objective-row entry is negative (Bland's rule), or
    /// `None` when the current basis is optimal.
    pub fn find_entering_variable(&self) -> Option<usize> {
        let obj_row = &self.data[self.objective_row()];
        obj_row[..self.rhs_col()]
            .iter()
            .position(|&coefficient| coefficient < -self.tolerance)
    }

    /// Minimum ratio test over rows with a positive entry in `pivot_col`. Ties
    /// keep the smallest row index. `None` means the column is unbounded.
    pub fn find_leaving_variable(&self, pivot_col: usize) -> Option<usize> {
        let rhs_col = self.rhs_col();
        let mut smallest_ratio = f64::INFINITY;
        let mut pivot_row = None;

        for (i, row) in self.data[..self.objective_row()].iter().enumerate() {
            let value = row[pivot_col];
            if value > self.tolerance {
                let ratio = row[rhs_col] / value;
                if ratio < smallest_ratio - self.tolerance {
                    smallest_ratio = ratio;
                    pivot_row = Some(i);
                }
            }
        }

        pivot_row
    }

    /// Gauss-Jordan step making `col` the unit vector at `row`, then records
    /// `col` as basic in `row`.
    pub fn perform_pivot(&mut self, row: usize, col: usize) {
        let pivot_val = self.data[row][col];
        for value in &mut self.data[row] {
            *value /= pivot_val;
        }

        let pivot_row = self.data[row].clone();
        for (i, other) in self.data.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = other[col];
            if factor == 0.0 {
                continue;
            }
            for (value, &p) in other.iter_mut().zip(&pivot_row) {
                *value -= factor * p;
            }
        }

        self.basic_variables[row] = col;
    }

    /// Reads the basic solution: one value per column (0 for non-basic
    /// columns), followed by the objective value. A minimization was solved
    /// as the maximization of its negation, so only the objective is negated back.
    pub fn extract_solution(&self, source_objective: Objective) -> Vec<f64> {
        let rhs_col = self.rhs_col();
        let mut solution = vec![0.0; rhs_col];

        for (row, &basic) in self.basic_variables.iter().enumerate() {
            solution[basic] = self.data[row][rhs_col];
        }

        let objective_value = self.data[self.objective_row()][rhs_col];
        solution.push(match source_objective {
            Objective::Minimize => -objective_value,
            Objective::Maximize => objective_value,
        });
        solution
    }
}

impl fmt::Display for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rhs_col = self.rhs_col();
        let header: Vec<String> = (0..=rhs_col)
            .map(|j| if j == rhs_col { "rhs".to_string() } else { format!("x{}", j + 1) })
            .collect();

        let mut widths: Vec<usize> = header.iter().map(String::len).collect();
        for row in &self.data {
            for (j, value) in row.iter().enumerate() {
                widths[j] = widths[j].max(format!("{:.2}", value).len());
            }
        }

        writeln!(f, "Simplex Tableau:")?;
        for (j, name) in header.iter().enumerate() {
            write!(f, "{:>width$} ", name, width = widths[j])?;
        }
        writeln!(f)?;
        for row in &self.data {
            for (j, value) in row.iter().enumerate() {
                write!(f, "{:>width$.2} ", value, width = widths[j])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

use lptools_solver::{LinearProgram, Objective};
use serde::{Deserialize, Serialize};

/// JSON form of a linear program, as read by [`crate::parse`] and written by [`to_statement`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_variables: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_constraints: Option<usize>,
    pub objective_function: ObjectiveFunction,
    /// One `lhs <op> rhs` string per constraint
    #[serde(default)]
    pub constraints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveFunction {
    /// `"minimize"` or `"maximize"`, case-insensitive
    pub objective: String,
    #[serde(rename = "equasion", alias = "equation")]
    pub equation: String,
}

impl ProblemStatement {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Writes a model back into statement form, at whatever stage of
/// normalization it is in. Slack columns are named after `slack_variable_names`.
///
/// The objective lists every column, zero coefficients included, so that
/// parsing the result yields the same variable set.
pub fn to_statement(lp: &LinearProgram) -> ProblemStatement {
    let names: Vec<&str> = lp
        .variable_names
        .iter()
        .chain(&lp.slack_variable_names)
        .map(String::as_str)
        .collect();

    let objective = match lp.objective {
        Objective::Minimize => "minimize",
        Objective::Maximize => "maximize",
    };

    let all_terms: Vec<(f64, &str)> = lp.objective_coeff.iter().copied().zip(names.iter().copied()).collect();

    let constraints = lp
        .constraint_coeff
        .iter()
        .zip(&lp.comparisons)
        .zip(&lp.rhs)
        .map(|((row, comparison), rhs)| {
            let terms: Vec<(f64, &str)> = row
                .iter()
                .copied()
                .zip(names.iter().copied())
                .filter(|(coeff, _)| *coeff != 0.0)
                .collect();
            format!("{} {} {}", equation(&terms), comparison, rhs)
        })
        .collect();

    ProblemStatement {
        number_of_variables: Some(lp.num_variables),
        number_of_constraints: Some(lp.num_constraints),
        objective_function: ObjectiveFunction {
            objective: objective.to_string(),
            equation: equation(&all_terms),
        },
        constraints,
    }
}

fn equation(terms: &[(f64, &str)]) -> String {
    let mut out = String::new();
    for (i, (coeff, name)) in terms.iter().enumerate() {
        let negative = coeff.is_sign_negative() && *coeff != 0.0;
        match (i, negative) {
            (0, false) => {}
            (0, true) => out.push('-'),
            (_, false) => out.push_str(" + "),
            (_, true) => out.push_str(" - "),
        }
        out.push_str(&format!("{}*{}", coeff.abs(), name));
    }
    out
}

use log::debug;
use lptools_solver::{Comparison, LinearProgram, Objective};
use thiserror::Error;

use crate::lexer::{Lexer, Span, Token, TokenKind};
use crate::statement::ProblemStatement;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid JSON statement: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid comparison operator: {0}")]
    InvalidComparison(String),
    #[error("Constraint {index} has no comparison operator")]
    MissingComparison { index: usize },
    #[error("Unexpected token: expected {expected}, found {found} at position {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("Variable {0} does not appear in the objective function")]
    UnknownVariable(String),
    #[error("{field} declared as {declared} but the statement has {found}")]
    CountMismatch {
        field: &'static str,
        declared: usize,
        found: usize,
    },
}

/// Parses a JSON problem statement into an unnormalized model.
pub fn parse(json: &str) -> Result<LinearProgram, ParseError> {
    let statement: ProblemStatement = serde_json::from_str(json)?;
    parse_statement(&statement)
}

/// Builds a model from an already deserialized statement.
///
/// Variables are the names of the objective function in order of first
/// appearance; constraints may only use those names.
pub fn parse_statement(statement: &ProblemStatement) -> Result<LinearProgram, ParseError> {
    let objective = if statement.objective_function.objective.eq_ignore_ascii_case("minimize") {
        Objective::Minimize
    } else {
        Objective::Maximize
    };

    let mut parser = ExpressionParser::new(&statement.objective_function.equation);
    let terms = parser.parse_expression()?;
    parser.expect_end()?;

    let mut names: Vec<String> = Vec::new();
    for (name, _) in &terms {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    check_count("numberOfVariables", statement.number_of_variables, names.len())?;
    check_count("numberOfConstraints", statement.number_of_constraints, statement.constraints.len())?;

    let objective_coeff = coefficients(&terms, &names)?;
    let mut lp = LinearProgram::new(names, objective, objective_coeff);

    for (index, source) in statement.constraints.iter().enumerate() {
        let mut parser = ExpressionParser::new(source);
        let terms = parser.parse_expression()?;
        let comparison = parser.parse_comparison(index)?;
        let rhs = parser.parse_signed_number()?;
        parser.expect_end()?;

        let coeffs = coefficients(&terms, &lp.variable_names)?;
        lp.add_constraint(coeffs, comparison, rhs);
    }

    debug!(
        "parsed statement: {} variables, {} constraints",
        lp.num_variables, lp.num_constraints
    );
    Ok(lp)
}

fn check_count(field: &'static str, declared: Option<usize>, found: usize) -> Result<(), ParseError> {
    match declared {
        Some(declared) if declared != found => Err(ParseError::CountMismatch {
            field,
            declared,
            found,
        }),
        _ => Ok(()),
    }
}

/// Dense coefficient row; repeated terms for one variable are summed.
fn coefficients(terms: &[(String, f64)], names: &[String]) -> Result<Vec<f64>, ParseError> {
    let mut coeffs = vec![0.0; names.len()];
    for (name, coeff) in terms {
        let idx = names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| ParseError::UnknownVariable(name.clone()))?;
        coeffs[idx] += coeff;
    }
    Ok(coeffs)
}

struct ExpressionParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExpressionParser {
    fn new(source: &str) -> Self {
        Self {
            tokens: Lexer::tokenize(source),
            pos: 0,
        }
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.current() {
            Some(t) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("{:?} '{}'", t.kind, t.text),
                span: t.span,
            },
            None => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: "end of input".to_string(),
                span: Span::new(0, 0),
            },
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.peek_kind() == kind {
            self.advance().ok_or_else(|| self.unexpected(expected))
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        self.expect(TokenKind::Eof, "end of expression").map(|_| ())
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        let token = self.expect(TokenKind::Number, "number")?;
        token
            .text
            .parse::<f64>()
            .map_err(|_| ParseError::InvalidNumber(token.text.clone()))
    }

    /// Optional `+`/`-`; returns the multiplier it stands for.
    fn parse_sign(&mut self) -> f64 {
        match self.peek_kind() {
            TokenKind::Plus => {
                self.advance();
                1.0
            }
            TokenKind::Minus => {
                self.advance();
                -1.0
            }
            _ => 1.0,
        }
    }

    /// `term (('+' | '-') term)*`, where the first term may carry a sign and
    /// a term is `[number] ['*'] name`. An empty expression is allowed.
    fn parse_expression(&mut self) -> Result<Vec<(String, f64)>, ParseError> {
        let mut terms = Vec::new();

        loop {
            match self.peek_kind() {
                TokenKind::Eof | TokenKind::Comparison => break,
                TokenKind::Plus | TokenKind::Minus => {}
                _ if terms.is_empty() => {}
                _ => return Err(self.unexpected("'+' or '-'")),
            }

            let sign = self.parse_sign();
            let coeff = if self.peek_kind() == TokenKind::Number {
                let value = self.parse_number()?;
                if self.peek_kind() == TokenKind::Star {
                    self.advance();
                }
                value
            } else {
                1.0
            };
            let name = self.expect(TokenKind::Ident, "variable name")?;
            terms.push((name.text, sign * coeff));
        }

        Ok(terms)
    }

    fn parse_comparison(&mut self, index: usize) -> Result<Comparison, ParseError> {
        match self.peek_kind() {
            TokenKind::Comparison => {
                let token = self.expect(TokenKind::Comparison, "comparison")?;
                Comparison::from_token(&token.text).ok_or(ParseError::InvalidComparison(token.text))
            }
            TokenKind::Eof => Err(ParseError::MissingComparison { index }),
            _ => Err(self.unexpected("comparison operator")),
        }
    }

    fn parse_signed_number(&mut self) -> Result<f64, ParseError> {
        let sign = self.parse_sign();
        Ok(sign * self.parse_number()?)
    }
}

//! COBRA methods built on top of the flux balance problem of a [`Model`]
//!
//! * [`variability::flux_variability_analysis`]: range of each flux at (near) optimum
//! * [`parsimonious::pfba`]: optimal flux distribution with minimal total flux
//! * [`geometric::geometric_fba`]: the central flux distribution among all optima
//!
//! [`Model`]: crate::metabolic_model::model::Model
pub mod geometric;
pub mod parsimonious;
pub mod variability;

pub use geometric::{geometric_fba, geometric_fba_default};
pub use parsimonious::pfba;
pub use variability::{flux_variability_analysis, FluxRange, FluxVariabilityResult};

use indexmap::IndexMap;
use thiserror::Error;

use crate::metabolic_model::model::ModelError;
use crate::optimize::objective::{ObjectiveSense, ObjectiveTerm};
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::solvers::Solver;
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Solve a problem, failing unless the solver reports an optimum
///
/// Returns the objective value and the full solution.
pub(crate) fn solve_to_optimality(
    problem: &Problem,
    solver: &dyn Solver,
) -> Result<(f64, ProblemSolution), FluxAnalysisError> {
    let solution = problem.solve(solver)?;
    match solution.objective_value {
        Some(value) if solution.status.is_optimal() => Ok((value, solution)),
        _ => Err(FluxAnalysisError::NotOptimal(solution.status)),
    }
}

/// Add a constraint keeping the current (linear) objective within `fraction_of_optimum`
/// of `optimum`
///
/// The bound is relaxed by `tolerance` so the optimum reported by an interior point
/// solver remains feasible.
pub(crate) fn constrain_objective(
    problem: &mut Problem,
    constraint_id: &str,
    fraction_of_optimum: f64,
    optimum: f64,
    tolerance: f64,
) -> Result<(), FluxAnalysisError> {
    if problem.objective().contains_quadratic() {
        return Err(FluxAnalysisError::NonLinearObjective);
    }
    // Merge repeated variables so the constraint has one term per variable
    let mut terms: IndexMap<String, f64> = IndexMap::new();
    for term in problem.objective().terms() {
        if let ObjectiveTerm::Linear { var, coef } = term {
            *terms.entry(var.clone()).or_insert(0.) += coef;
        }
    }
    let variables: Vec<&str> = terms.keys().map(String::as_str).collect();
    let coefficients: Vec<f64> = terms.values().copied().collect();
    let slack = (1. - fraction_of_optimum) * optimum.abs() + tolerance;
    let (lower_bound, upper_bound) = match problem.objective().sense() {
        ObjectiveSense::Maximize => (optimum - slack, f64::INFINITY),
        ObjectiveSense::Minimize => (f64::NEG_INFINITY, optimum + slack),
    };
    problem.add_new_inequality_constraint(
        constraint_id,
        &variables,
        &coefficients,
        lower_bound,
        upper_bound,
    )?;
    Ok(())
}

/// Check that a fraction of the optimum lies in [0, 1]
pub(crate) fn validate_fraction(fraction_of_optimum: f64) -> Result<(), FluxAnalysisError> {
    if (0. ..=1.).contains(&fraction_of_optimum) {
        Ok(())
    } else {
        Err(FluxAnalysisError::InvalidFraction(fraction_of_optimum))
    }
}

/// Errors raised by the flux analysis methods
#[derive(Error, Debug, Clone)]
pub enum FluxAnalysisError {
    /// The model could not be turned into a problem, or referenced reactions are missing
    #[error(transparent)]
    Model(#[from] ModelError),
    /// The underlying problem could not be modified or solved
    #[error(transparent)]
    Problem(#[from] ProblemError),
    /// A solve did not reach an optimum
    #[error("Optimization failed, solver status is {0}")]
    NotOptimal(OptimizationStatus),
    /// Fraction of optimum outside of [0, 1]
    #[error("The fraction of optimum must lie between 0 and 1, got {0}")]
    InvalidFraction(f64),
    /// The objective can't be held at its optimum with a linear constraint
    #[error("The objective contains quadratic terms and can't be constrained")]
    NonLinearObjective,
    /// Geometric FBA did not converge
    #[error(
        "The iterations have exceeded the maximum value of {0}. Please set a different \
         convergence tolerance and/or increase the maximum iterations"
    )]
    MaxTriesExceeded(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::constraint::Constraint;

    #[test]
    fn fraction_bounds() {
        assert!(validate_fraction(0.).is_ok());
        assert!(validate_fraction(1.).is_ok());
        assert!(matches!(
            validate_fraction(1.5),
            Err(FluxAnalysisError::InvalidFraction(_))
        ));
        assert!(validate_fraction(f64::NAN).is_err());
    }

    #[test]
    fn objective_constraint_bounds() {
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", None, 0., 10.).unwrap();
        problem.add_new_linear_objective_term("x", 2.).unwrap();
        problem.add_new_linear_objective_term("x", 1.).unwrap();
        constrain_objective(&mut problem, "keep", 0.5, 30., 0.).unwrap();
        match &problem.constraints()["keep"] {
            Constraint::Inequality {
                terms, lower_bound, ..
            } => {
                assert_eq!(terms.len(), 1);
                assert!((terms[0].coefficient - 3.).abs() < 1e-12);
                assert!((lower_bound - 15.).abs() < 1e-12);
            }
            Constraint::Equality { .. } => panic!("Objective constraint should be an inequality"),
        }
    }

    #[test]
    fn quadratic_objective_rejected() {
        let mut problem = Problem::new_minimization();
        problem.add_new_variable("x", None, 0., 10.).unwrap();
        problem.add_new_quadratic_objective_term("x", "x", 1.).unwrap();
        assert!(matches!(
            constrain_objective(&mut problem, "keep", 1., 0., 0.),
            Err(FluxAnalysisError::NonLinearObjective)
        ));
    }
}

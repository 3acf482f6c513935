//! Interfaces to the numerical solvers used for optimization problems
pub mod clarabel;

use thiserror::Error;

use crate::configuration::{Configuration, Solver as SolverChoice};
use crate::optimize::problem::Problem;
use crate::optimize::ProblemSolution;

/// A backend able to solve a [`Problem`]
pub trait Solver {
    /// Name of the solver, used in log output
    fn name(&self) -> &'static str;

    /// Whether quadratic objective terms are supported
    fn quadratic_objective_capable(&self) -> bool;

    /// Solve the problem
    ///
    /// A problem the solver could not solve to optimality is not an error, its status is
    /// reported in the returned [`ProblemSolution`]. Errors are reserved for problems the
    /// solver cannot even be set up for.
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError>;
}

/// Create the solver selected by the global configuration
pub fn configured_solver() -> Box<dyn Solver> {
    let configuration = Configuration::current();
    match configuration.solver {
        SolverChoice::Clarabel => Box::new(clarabel::ClarabelSolver::from_configuration(
            &configuration,
        )),
    }
}

/// Errors raised while setting up a solve
#[derive(Error, Debug, Clone)]
pub enum SolverError {
    /// The problem contains features the solver does not handle
    #[error("The {0} solver does not support this problem: {1}")]
    UnsupportedProblem(&'static str, String),
    /// The solver settings could not be created
    #[error("Invalid solver settings: {0}")]
    InvalidSettings(String),
}

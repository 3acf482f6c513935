//! Implements a solver interface for Clarabel
//!
//! Clarabel solves problems of the form
//!
//! ```text
//! minimize    1/2 x'Px + q'x
//! subject to  Ax + s = b,  s in K
//! ```
//!
//! Equality constraints and fixed variables become rows of the zero cone, every finite side
//! of an inequality constraint or variable bound becomes a row of the non-negative cone.
use ::clarabel::algebra::CscMatrix;
use ::clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use indexmap::IndexMap;
use nalgebra_sparse::{CooMatrix, CscMatrix as SparseCsc};
use tracing::{debug, warn};

use crate::configuration::Configuration;
use crate::optimize::constraint::Constraint;
use crate::optimize::objective::{ObjectiveSense, ObjectiveTerm};
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

const SOLVER_NAME: &str = "clarabel";

/// Interface to the Clarabel interior point solver
#[derive(Clone, Debug)]
pub struct ClarabelSolver {
    /// Print Clarabel's own iteration log
    pub verbose: bool,
    /// Maximum number of iterations per solve
    pub max_iterations: u32,
    /// Absolute and relative gap and feasibility tolerance
    pub accuracy: f64,
}

impl Default for ClarabelSolver {
    fn default() -> Self {
        ClarabelSolver {
            verbose: false,
            max_iterations: 200,
            accuracy: 1e-9,
        }
    }
}

impl ClarabelSolver {
    /// Create a solver using the limits of a [`Configuration`]
    pub fn from_configuration(configuration: &Configuration) -> Self {
        ClarabelSolver {
            max_iterations: configuration.max_iterations,
            ..Default::default()
        }
    }
}

/// A single row of the constraint matrix
struct Row {
    terms: Vec<(usize, f64)>,
    rhs: f64,
    /// Constraint the row came from, if its dual should be reported
    dual_id: Option<String>,
}

/// Rows split by the cone they belong to
#[derive(Default)]
struct Rows {
    equalities: Vec<Row>,
    inequalities: Vec<Row>,
}

impl Rows {
    fn push_equality(&mut self, terms: Vec<(usize, f64)>, rhs: f64, dual_id: Option<String>) {
        self.equalities.push(Row {
            terms,
            rhs,
            dual_id,
        });
    }

    /// Push `lower <= terms <= upper`, skipping infinite sides
    fn push_range(&mut self, terms: Vec<(usize, f64)>, lower: f64, upper: f64) {
        if upper.is_finite() {
            self.inequalities.push(Row {
                terms: terms.clone(),
                rhs: upper,
                dual_id: None,
            });
        }
        if lower.is_finite() {
            self.inequalities.push(Row {
                terms: terms.into_iter().map(|(col, coef)| (col, -coef)).collect(),
                rhs: -lower,
                dual_id: None,
            });
        }
    }
}

impl Solver for ClarabelSolver {
    fn name(&self) -> &'static str {
        SOLVER_NAME
    }

    fn quadratic_objective_capable(&self) -> bool {
        true
    }

    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let n = problem.num_variables();
        let rows = collect_rows(problem)?;
        let sign = match problem.objective().sense() {
            ObjectiveSense::Minimize => 1.,
            ObjectiveSense::Maximize => -1.,
        };

        // Objective
        let mut q = vec![0.; n];
        let mut p_entries = CooMatrix::new(n, n);
        for term in problem.objective().terms() {
            match term {
                ObjectiveTerm::Linear { var, coef } => {
                    q[column(problem, var)?] += sign * coef;
                }
                ObjectiveTerm::Quadratic { var1, var2, coef } => {
                    let (i, j) = (column(problem, var1)?, column(problem, var2)?);
                    // Only the upper triangle is given to Clarabel, and the 1/2 factor means a
                    // squared term needs a doubled coefficient
                    if i == j {
                        p_entries.push(i, i, 2. * sign * coef);
                    } else {
                        p_entries.push(i.min(j), i.max(j), sign * coef);
                    }
                }
            }
        }
        let p = to_clarabel(&p_entries);

        // Constraints
        let num_eq = rows.equalities.len();
        let num_ineq = rows.inequalities.len();
        let mut a_entries = CooMatrix::new(num_eq + num_ineq, n);
        let mut b = Vec::with_capacity(num_eq + num_ineq);
        for (row_index, row) in rows
            .equalities
            .iter()
            .chain(rows.inequalities.iter())
            .enumerate()
        {
            for &(col, coef) in &row.terms {
                a_entries.push(row_index, col, coef);
            }
            b.push(row.rhs);
        }
        let a = to_clarabel(&a_entries);
        let mut cones = Vec::new();
        if num_eq > 0 {
            cones.push(SupportedConeT::ZeroConeT(num_eq));
        }
        if num_ineq > 0 {
            cones.push(SupportedConeT::NonnegativeConeT(num_ineq));
        }

        let settings = DefaultSettingsBuilder::default()
            .verbose(self.verbose)
            .max_iter(self.max_iterations)
            .tol_gap_abs(self.accuracy)
            .tol_gap_rel(self.accuracy)
            .tol_feas(self.accuracy)
            .build()
            .map_err(|err| SolverError::InvalidSettings(err.to_string()))?;

        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        let status = convert_status(solver.solution.status);
        debug!(
            %status,
            iterations = solver.solution.iterations,
            "clarabel finished"
        );
        if !status.is_optimal() {
            warn!(%status, "clarabel did not find an optimal solution");
            return Ok(ProblemSolution::from_status(status));
        }

        let variable_values: IndexMap<String, f64> = problem
            .variables()
            .keys()
            .cloned()
            .zip(solver.solution.x.iter().copied())
            .collect();
        let dual_values: IndexMap<String, f64> = rows
            .equalities
            .iter()
            .zip(solver.solution.z.iter())
            .filter_map(|(row, z)| row.dual_id.clone().map(|id| (id, -sign * z)))
            .collect();
        let objective_value = problem.evaluate_objective(&variable_values);

        Ok(ProblemSolution {
            status,
            objective_value: Some(objective_value),
            variable_values: Some(variable_values),
            dual_values: Some(dual_values),
        })
    }
}

/// Translate the constraints and variable bounds of the problem into matrix rows
fn collect_rows(problem: &Problem) -> Result<Rows, SolverError> {
    let mut rows = Rows::default();
    for constraint in problem.constraints().values() {
        let terms = constraint
            .get_terms()
            .iter()
            .map(|t| Ok((column(problem, &t.variable)?, t.coefficient)))
            .collect::<Result<Vec<_>, SolverError>>()?;
        match constraint {
            Constraint::Equality { id, equals, .. } => {
                rows.push_equality(terms, *equals, Some(id.clone()))
            }
            Constraint::Inequality {
                id,
                lower_bound,
                upper_bound,
                ..
            } => {
                if lower_bound == upper_bound {
                    rows.push_equality(terms, *lower_bound, Some(id.clone()))
                } else {
                    rows.push_range(terms, *lower_bound, *upper_bound)
                }
            }
        }
    }
    for variable in problem.variables().values() {
        let terms = vec![(variable.index(), 1.)];
        if variable.is_fixed() {
            rows.push_equality(terms, variable.lower_bound(), None);
        } else {
            rows.push_range(terms, variable.lower_bound(), variable.upper_bound());
        }
    }
    Ok(rows)
}

fn column(problem: &Problem, variable_id: &str) -> Result<usize, SolverError> {
    problem
        .get_variable(variable_id)
        .map(|v| v.index())
        .ok_or_else(|| {
            SolverError::UnsupportedProblem(SOLVER_NAME, format!("unknown variable {}", variable_id))
        })
}

/// Compress triplets (summing duplicates) into Clarabel's CSC format
fn to_clarabel(entries: &CooMatrix<f64>) -> CscMatrix<f64> {
    let (nrows, ncols) = (entries.nrows(), entries.ncols());
    let (colptr, rowval, nzval) = SparseCsc::from(entries).disassemble();
    CscMatrix::new(nrows, ncols, colptr, rowval, nzval)
}

fn convert_status(status: SolverStatus) -> OptimizationStatus {
    match status {
        SolverStatus::Solved => OptimizationStatus::Optimal,
        SolverStatus::AlmostSolved => OptimizationStatus::AlmostOptimal,
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            OptimizationStatus::Infeasible
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
            OptimizationStatus::Unbounded
        }
        SolverStatus::NumericalError => OptimizationStatus::NumericalError,
        SolverStatus::MaxIterations
        | SolverStatus::MaxTime
        | SolverStatus::InsufficientProgress => OptimizationStatus::SolverHalted,
        _ => OptimizationStatus::Unoptimized,
    }
}

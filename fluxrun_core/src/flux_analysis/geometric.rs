//! Geometric flux balance analysis
//!
//! Among all optimal flux distributions, find the one at the center of the space of
//! alternate optima (Smallbone and Simeonidis, 2009,
//! [doi:10.1016/j.jtbi.2009.01.027](https://doi.org/10.1016/j.jtbi.2009.01.027)).
//!
//! Starting from the parsimonious problem, each iteration computes the flux ranges, then
//! minimizes the total distance of every flux from the middle of its range. The ranges at
//! that minimum are computed again, and the procedure repeats until every range is
//! narrower than `epsilon`.
use tracing::{debug, info};

use crate::configuration::Configuration;
use crate::flux_analysis::parsimonious::add_pfba;
use crate::flux_analysis::variability::{variability_of_problem, FluxVariabilityResult};
use crate::flux_analysis::{solve_to_optimality, FluxAnalysisError};
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::Reaction;
use crate::metabolic_model::solution::Solution;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::configured_solver;

/// Default convergence tolerance on the widest flux range
pub const DEFAULT_EPSILON: f64 = 1e-6;
/// Default maximum number of iterations
pub const DEFAULT_MAX_TRIES: usize = 200;

/// Ids of the distance variable and constraints tied to one reaction
struct DistanceTerms {
    variable: String,
    upper: String,
    lower: String,
}

impl DistanceTerms {
    fn new(reaction: &Reaction) -> Self {
        DistanceTerms {
            variable: format!("geometric_fba_{}", reaction.id),
            upper: format!("geometric_fba_upper_const_{}", reaction.id),
            lower: format!("geometric_fba_lower_const_{}", reaction.id),
        }
    }
}

/// Run geometric FBA with [`DEFAULT_EPSILON`] and [`DEFAULT_MAX_TRIES`]
pub fn geometric_fba_default(model: &Model) -> Result<Solution, FluxAnalysisError> {
    geometric_fba(model, DEFAULT_EPSILON, DEFAULT_MAX_TRIES)
}

/// Find the central optimal flux distribution of a model
///
/// # Parameters
/// - `model`: Model to analyse
/// - `epsilon`: Convergence tolerance, the widest flux range allowed at the end
/// - `max_tries`: Maximum number of iterations
///
/// # Returns
/// The flux distribution of the last iteration. Its objective value is the total distance
/// of the fluxes from the middle of their ranges.
///
/// # Errors
/// [`FluxAnalysisError::MaxTriesExceeded`] if the ranges are still wider than `epsilon`
/// after `max_tries` iterations, or any error from solving the intermediate problems.
pub fn geometric_fba(
    model: &Model,
    epsilon: f64,
    max_tries: usize,
) -> Result<Solution, FluxAnalysisError> {
    let solver = configured_solver();
    let solver = solver.as_ref();
    let tolerance = Configuration::current().tolerance;
    let reactions: Vec<&Reaction> = model.reactions.values().collect();

    let mut problem = model.to_problem()?;
    add_pfba(&mut problem, &reactions, 1.0, solver, tolerance)?;
    let mut fva = variability_of_problem(&problem, &reactions, 1.0, solver, tolerance)?;

    let terms: Vec<DistanceTerms> = reactions.iter().map(|rxn| DistanceTerms::new(rxn)).collect();
    add_distance_terms(&mut problem, &reactions, &terms, &fva, tolerance)?;
    let distance_variables: Vec<&str> = terms.iter().map(|t| t.variable.as_str()).collect();
    problem.set_linear_objective(
        ObjectiveSense::Minimize,
        &distance_variables,
        &vec![1.; distance_variables.len()],
    )?;

    let (_, mut solution) = solve_to_optimality(&problem, solver)?;
    fva = variability_of_problem(&problem, &reactions, 1.0, solver, tolerance)?;
    let mut delta = fva.max_width();
    let mut count = 1;
    debug!(iteration = count, delta, "geometric FBA iteration");

    while delta > epsilon && count < max_tries {
        update_distance_terms(&mut problem, &reactions, &terms, &fva, tolerance)?;
        solution = solve_to_optimality(&problem, solver)?.1;
        fva = variability_of_problem(&problem, &reactions, 1.0, solver, tolerance)?;
        delta = fva.max_width();
        count += 1;
        debug!(iteration = count, delta, "geometric FBA iteration");
    }
    if delta > epsilon {
        return Err(FluxAnalysisError::MaxTriesExceeded(max_tries));
    }

    info!(
        model = model.id.as_deref().unwrap_or(""),
        iterations = count,
        delta,
        "geometric FBA converged"
    );
    Ok(Solution::from_problem_solution(model, solution)?)
}

/// Add `g >= |v - center|` for every reaction flux `v`
///
/// `v - g <= center` and `v + g >= center`, with `g` no larger than half the range width
/// (plus `tolerance`, so rounding in the ranges never cuts off the current optimum).
fn add_distance_terms(
    problem: &mut Problem,
    reactions: &[&Reaction],
    terms: &[DistanceTerms],
    fva: &FluxVariabilityResult,
    tolerance: f64,
) -> Result<(), FluxAnalysisError> {
    for (rxn, term) in reactions.iter().zip(terms) {
        let (center, half_width) = center_of(fva, rxn, tolerance);
        let (flux_variables, signs) = rxn.flux_expression();
        let variables = [
            flux_variables[0].as_str(),
            flux_variables[1].as_str(),
            term.variable.as_str(),
        ];
        problem.add_new_variable(&term.variable, None, 0., half_width)?;
        problem.add_new_inequality_constraint(
            &term.upper,
            &variables,
            &[signs[0], signs[1], -1.],
            f64::NEG_INFINITY,
            center,
        )?;
        problem.add_new_inequality_constraint(
            &term.lower,
            &variables,
            &[signs[0], signs[1], 1.],
            center,
            f64::INFINITY,
        )?;
    }
    Ok(())
}

/// Move the distance constraints to the centers of the latest ranges
fn update_distance_terms(
    problem: &mut Problem,
    reactions: &[&Reaction],
    terms: &[DistanceTerms],
    fva: &FluxVariabilityResult,
    tolerance: f64,
) -> Result<(), FluxAnalysisError> {
    for (rxn, term) in reactions.iter().zip(terms) {
        let (center, half_width) = center_of(fva, rxn, tolerance);
        problem.update_variable_bounds(&term.variable, 0., half_width)?;
        problem.update_constraint_bounds(&term.upper, f64::NEG_INFINITY, center)?;
        problem.update_constraint_bounds(&term.lower, center, f64::INFINITY)?;
    }
    Ok(())
}

/// Center and padded half width of a reaction's range
fn center_of(fva: &FluxVariabilityResult, reaction: &Reaction, tolerance: f64) -> (f64, f64) {
    match fva.get(&reaction.id) {
        Some(range) => (range.center(), (range.width() / 2.).max(0.) + tolerance),
        None => (0., tolerance),
    }
}

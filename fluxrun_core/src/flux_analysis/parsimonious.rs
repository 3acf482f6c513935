//! Parsimonious flux balance analysis (pFBA)
use tracing::info;

use crate::configuration::Configuration;
use crate::flux_analysis::{
    constrain_objective, solve_to_optimality, validate_fraction, FluxAnalysisError,
};
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::Reaction;
use crate::metabolic_model::solution::Solution;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{configured_solver, Solver};

/// Id of the constraint holding the model objective at its optimum
const OBJECTIVE_CONSTRAINT_ID: &str = "pfba_old_objective";

/// Find the optimal flux distribution with the smallest total flux
///
/// The model objective is held within `fraction_of_optimum` of its optimum and the sum of
/// all forward and reverse fluxes is minimized. The objective value of the returned
/// solution is that total flux.
pub fn pfba(model: &Model, fraction_of_optimum: f64) -> Result<Solution, FluxAnalysisError> {
    validate_fraction(fraction_of_optimum)?;
    let solver = configured_solver();
    let mut problem = model.to_problem()?;
    let reactions: Vec<&Reaction> = model.reactions.values().collect();
    add_pfba(
        &mut problem,
        &reactions,
        fraction_of_optimum,
        solver.as_ref(),
        Configuration::current().tolerance,
    )?;
    let (total_flux, solution) = solve_to_optimality(&problem, solver.as_ref())?;
    info!(
        model = model.id.as_deref().unwrap_or(""),
        total_flux,
        "parsimonious FBA finished"
    );
    Ok(Solution::from_problem_solution(model, solution)?)
}

/// Turn a flux balance problem into its parsimonious version in place
pub(crate) fn add_pfba(
    problem: &mut Problem,
    reactions: &[&Reaction],
    fraction_of_optimum: f64,
    solver: &dyn Solver,
    tolerance: f64,
) -> Result<(), FluxAnalysisError> {
    let (optimum, _) = solve_to_optimality(problem, solver)?;
    constrain_objective(
        problem,
        OBJECTIVE_CONSTRAINT_ID,
        fraction_of_optimum,
        optimum,
        tolerance,
    )?;
    let variables: Vec<String> = reactions
        .iter()
        .flat_map(|rxn| [rxn.get_forward_id(), rxn.get_reverse_id()])
        .collect();
    let variables: Vec<&str> = variables.iter().map(String::as_str).collect();
    let coefficients = vec![1.; variables.len()];
    problem.set_linear_objective(ObjectiveSense::Minimize, &variables, &coefficients)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_models::create_test_model;

    #[test]
    fn minimal_total_flux() {
        let model = create_test_model("mini").unwrap();
        let solution = pfba(&model, 1.0).unwrap();
        // EX_a, UPTAKE, one unit through R1 + R2, and BIOMASS each carry 10
        assert!((solution.objective_value - 40.).abs() < 1e-4);
        let split = solution.flux("R1").unwrap() + solution.flux("R2").unwrap();
        assert!((split - 10.).abs() < 1e-4);
        assert!((solution.flux("BIOMASS").unwrap() - 10.).abs() < 1e-4);
    }

    #[test]
    fn rejects_bad_fraction() {
        let model = create_test_model("mini").unwrap();
        assert!(matches!(
            pfba(&model, 2.0),
            Err(FluxAnalysisError::InvalidFraction(_))
        ));
    }
}

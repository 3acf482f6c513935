//! Flux variability analysis
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::configuration::Configuration;
use crate::flux_analysis::{
    constrain_objective, solve_to_optimality, validate_fraction, FluxAnalysisError,
};
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::Reaction;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{configured_solver, Solver};

/// Id of the constraint holding the original objective near its optimum
const OBJECTIVE_CONSTRAINT_ID: &str = "fva_old_objective";

/// Smallest and largest flux a reaction can carry
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FluxRange {
    /// Minimum flux
    pub minimum: f64,
    /// Maximum flux
    pub maximum: f64,
}

impl FluxRange {
    /// Distance between the extremes
    pub fn width(&self) -> f64 {
        self.maximum - self.minimum
    }

    /// Midpoint of the range
    pub fn center(&self) -> f64 {
        (self.maximum + self.minimum) / 2.
    }
}

/// Flux ranges keyed by reaction id, in the order the reactions were analysed
#[derive(Clone, Debug, Default)]
pub struct FluxVariabilityResult {
    ranges: IndexMap<String, FluxRange>,
}

impl FluxVariabilityResult {
    /// Range of a reaction, None if it was not analysed
    pub fn get(&self, reaction_id: &str) -> Option<&FluxRange> {
        self.ranges.get(reaction_id)
    }

    /// Iterate over (reaction id, range) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FluxRange)> {
        self.ranges.iter()
    }

    /// Number of reactions analysed
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether no reaction was analysed
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Widest range of any reaction, zero when empty
    pub fn max_width(&self) -> f64 {
        self.ranges
            .values()
            .map(FluxRange::width)
            .fold(0., f64::max)
    }
}

/// Compute the minimum and maximum flux of reactions while the model's objective stays
/// within `fraction_of_optimum` of its optimum
///
/// # Parameters
/// - `model`: Model to analyse
/// - `reaction_ids`: Reactions to analyse, all reactions when None
/// - `fraction_of_optimum`: Fraction of the optimum the objective must reach, in [0, 1]
///
/// # Examples
/// ```rust
/// use fluxrun_core::flux_analysis::flux_variability_analysis;
/// use fluxrun_core::test_models::create_test_model;
/// let model = create_test_model("mini").unwrap();
/// let fva = flux_variability_analysis(&model, Some(&["R1"]), 1.0).unwrap();
/// assert!(fva.get("R1").unwrap().maximum > 9.99);
/// ```
pub fn flux_variability_analysis(
    model: &Model,
    reaction_ids: Option<&[&str]>,
    fraction_of_optimum: f64,
) -> Result<FluxVariabilityResult, FluxAnalysisError> {
    validate_fraction(fraction_of_optimum)?;
    let reactions: Vec<&Reaction> = match reaction_ids {
        Some(ids) => ids
            .iter()
            .map(|id| model.get_reaction(id))
            .collect::<Result<_, _>>()?,
        None => model.reactions.values().collect(),
    };
    let problem = model.to_problem()?;
    let solver = configured_solver();
    let result = variability_of_problem(
        &problem,
        &reactions,
        fraction_of_optimum,
        solver.as_ref(),
        Configuration::current().tolerance,
    )?;
    info!(
        model = model.id.as_deref().unwrap_or(""),
        reactions = result.len(),
        fraction_of_optimum,
        "flux variability analysis finished"
    );
    Ok(result)
}

/// Flux variability of `reactions` over any problem containing their flux variables
///
/// The problem's current objective is solved and held near its optimum, then each
/// reaction's net flux is minimized and maximized.
pub(crate) fn variability_of_problem(
    problem: &Problem,
    reactions: &[&Reaction],
    fraction_of_optimum: f64,
    solver: &dyn Solver,
    tolerance: f64,
) -> Result<FluxVariabilityResult, FluxAnalysisError> {
    let (optimum, _) = solve_to_optimality(problem, solver)?;
    let mut fva_problem = problem.clone();
    constrain_objective(
        &mut fva_problem,
        OBJECTIVE_CONSTRAINT_ID,
        fraction_of_optimum,
        optimum,
        tolerance,
    )?;

    let mut ranges = IndexMap::with_capacity(reactions.len());
    for rxn in reactions {
        let (variables, coefficients) = rxn.flux_expression();
        let variables = [variables[0].as_str(), variables[1].as_str()];
        fva_problem.set_linear_objective(ObjectiveSense::Minimize, &variables, &coefficients)?;
        let (minimum, _) = solve_to_optimality(&fva_problem, solver)?;
        fva_problem.update_objective_sense(ObjectiveSense::Maximize);
        let (maximum, _) = solve_to_optimality(&fva_problem, solver)?;
        debug!(reaction = %rxn.id, minimum, maximum, "flux range");
        ranges.insert(rxn.id.clone(), FluxRange { minimum, maximum });
    }
    Ok(FluxVariabilityResult { ranges })
}

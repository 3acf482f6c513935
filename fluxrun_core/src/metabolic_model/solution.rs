//! Flux distributions produced by optimizing a model
use std::fmt::{Display, Formatter};

use indexmap::IndexMap;

use crate::metabolic_model::model::{Model, ModelError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Result of optimizing a [`Model`]
#[derive(Clone, Debug)]
pub struct Solution {
    /// Status reported by the solver
    pub status: OptimizationStatus,
    /// Value of the objective that was optimized
    pub objective_value: f64,
    /// Net flux through each reaction, keyed by reaction id
    pub fluxes: IndexMap<String, f64>,
    /// Change in objective per unit of each metabolite's mass balance, keyed by metabolite id
    pub shadow_prices: IndexMap<String, f64>,
}

impl Solution {
    /// Collapse the forward and reverse variables of a solved problem into reaction fluxes
    pub(crate) fn from_problem_solution(
        model: &Model,
        solution: ProblemSolution,
    ) -> Result<Solution, ModelError> {
        let (objective_value, values) = match (solution.objective_value, solution.variable_values)
        {
            (Some(objective_value), Some(values)) if solution.status.is_optimal() => {
                (objective_value, values)
            }
            _ => return Err(ModelError::NotOptimal(solution.status)),
        };
        let fluxes = model
            .reactions
            .values()
            .map(|rxn| {
                let forward = values.get(&rxn.get_forward_id()).copied().unwrap_or(0.);
                let reverse = values.get(&rxn.get_reverse_id()).copied().unwrap_or(0.);
                (rxn.id.clone(), forward - reverse)
            })
            .collect();
        let duals = solution.dual_values.unwrap_or_default();
        let shadow_prices = model
            .metabolites
            .keys()
            .map(|met| (met.clone(), duals.get(met).copied().unwrap_or(0.)))
            .collect();
        Ok(Solution {
            status: solution.status,
            objective_value,
            fluxes,
            shadow_prices,
        })
    }

    /// Flux through a reaction, None for reactions not in the solution
    pub fn flux(&self, reaction_id: &str) -> Option<f64> {
        self.fluxes.get(reaction_id).copied()
    }
}

impl Display for Solution {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Solution {:.3} at {}>", self.objective_value, self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let solution = Solution {
            status: OptimizationStatus::Optimal,
            objective_value: 0.87392,
            fluxes: IndexMap::new(),
            shadow_prices: IndexMap::new(),
        };
        assert_eq!(solution.to_string(), "<Solution 0.874 at optimal>");
        assert_eq!(solution.flux("PGI"), None);
    }

    #[test]
    fn non_optimal_is_error() {
        let model = Model::new_empty();
        let res = Solution::from_problem_solution(
            &model,
            ProblemSolution::from_status(OptimizationStatus::Infeasible),
        );
        assert!(matches!(
            res,
            Err(ModelError::NotOptimal(OptimizationStatus::Infeasible))
        ));
    }
}

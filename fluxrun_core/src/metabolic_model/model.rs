//! This module provides the Model struct for representing an entire metabolic model
use indexmap::IndexMap;
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CscMatrix};
use thiserror::Error;
use tracing::{debug, info};

use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;
use crate::metabolic_model::solution::Solution;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::solvers::{configured_solver, Solver};
use crate::optimize::OptimizationStatus;

/// Represents a Genome Scale Metabolic Model
#[derive(Clone, Debug)]
pub struct Model {
    /// Map of reaction ids to Reaction Objects
    pub reactions: IndexMap<String, Reaction>,
    /// Map of gene ids to Gene Objects
    pub genes: IndexMap<String, Gene>,
    /// Map of metabolite ids to Metabolite Objects
    pub metabolites: IndexMap<String, Metabolite>,
    /// Map of reaction ids to objective function coefficients
    pub objective: IndexMap<String, f64>,
    /// Whether the objective is maximized or minimized
    pub objective_sense: ObjectiveSense,
    /// Id associated with the Model
    pub id: Option<String>,
    /// Compartments in the model
    ///
    /// An IndexMap<String, String> of {short name: long name}
    pub compartments: Option<IndexMap<String, String>>,
    /// A version identifier for the Model, stored as a string
    pub version: Option<String>,
}

impl Model {
    /// Create a model with no reactions, metabolites or genes, and a maximization objective
    pub fn new_empty() -> Self {
        Model {
            reactions: IndexMap::new(),
            genes: IndexMap::new(),
            metabolites: IndexMap::new(),
            objective: IndexMap::new(),
            objective_sense: ObjectiveSense::Maximize,
            id: None,
            compartments: None,
            version: None,
        }
    }

    /// Add a reaction to the model
    ///
    /// # Parameters
    /// - reaction: Reaction to add
    ///
    /// # Examples
    /// ```rust
    /// use fluxrun_core::metabolic_model::model::Model;
    /// use fluxrun_core::metabolic_model::reaction::ReactionBuilder;
    /// let mut model = Model::new_empty();
    /// let new_reaction = ReactionBuilder::default().id("new_reaction").build().unwrap();
    /// model.add_reaction(new_reaction);
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) {
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
    }

    /// Add a metabolite to the model
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        let id = metabolite.id.clone();
        self.metabolites.insert(id, metabolite);
    }

    /// Add a gene to the model
    ///
    /// # Examples
    /// ```rust
    /// use fluxrun_core::metabolic_model::gene::GeneBuilder;
    /// use fluxrun_core::metabolic_model::model::Model;
    /// let mut model = Model::new_empty();
    /// let new_gene = GeneBuilder::default().id("new_gene").build().unwrap();
    /// model.add_gene(new_gene);
    /// ```
    pub fn add_gene(&mut self, gene: Gene) {
        let id = gene.id.clone();
        self.genes.insert(id, gene);
    }

    /// Look up a reaction, failing if it is not part of the model
    pub fn get_reaction(&self, id: &str) -> Result<&Reaction, ModelError> {
        self.reactions
            .get(id)
            .ok_or_else(|| ModelError::UnknownReaction(id.to_string()))
    }

    /// Reactions exchanging metabolites with the environment
    pub fn boundary_reactions(&self) -> impl Iterator<Item = &Reaction> {
        self.reactions.values().filter(|rxn| rxn.is_boundary())
    }

    /// Sparse stoichiometric matrix, with one row per metabolite and one column per
    /// reaction, both in model order
    pub fn stoichiometric_matrix(&self) -> Result<CscMatrix<f64>, ModelError> {
        let mut entries = CooMatrix::new(self.metabolites.len(), self.reactions.len());
        for (col, rxn) in self.reactions.values().enumerate() {
            for (met, coef) in &rxn.metabolites {
                let row = self.metabolites.get_index_of(met).ok_or_else(|| {
                    ModelError::UnknownMetabolite {
                        reaction: rxn.id.clone(),
                        metabolite: met.clone(),
                    }
                })?;
                entries.push(row, col, *coef);
            }
        }
        Ok(CscMatrix::from(&entries))
    }

    /// Largest violation of the steady state assumption for a set of reaction fluxes
    ///
    /// Reactions missing from `fluxes` are taken to carry no flux.
    pub fn mass_balance_residual(&self, fluxes: &IndexMap<String, f64>) -> Result<f64, ModelError> {
        let stoichiometry = self.stoichiometric_matrix()?;
        let flux_vector = DVector::from_iterator(
            self.reactions.len(),
            self.reactions
                .keys()
                .map(|id| fluxes.get(id).copied().unwrap_or(0.)),
        );
        let mut balance = DVector::<f64>::zeros(self.metabolites.len());
        for (row, col, coef) in stoichiometry.triplet_iter() {
            balance[row] += coef * flux_vector[col];
        }
        Ok(balance.amax())
    }

    /// Build the flux balance analysis problem for this model
    ///
    /// Every reaction contributes a forward and a reverse variable (see
    /// [`Reaction::get_forward_id`] and [`Reaction::get_reverse_id`]), every metabolite a
    /// steady state constraint with the metabolite's id, and the objective is the weighted
    /// sum of net fluxes given by [`Model::objective`].
    pub fn to_problem(&self) -> Result<Problem, ModelError> {
        if self.objective.is_empty() {
            return Err(ModelError::EmptyObjective);
        }
        let mut problem = Problem::new(self.objective_sense);
        let mut balances: IndexMap<&str, (Vec<String>, Vec<f64>)> = IndexMap::new();
        for rxn in self.reactions.values() {
            if rxn.lower_bound > rxn.upper_bound {
                return Err(ModelError::InvalidBounds(rxn.id.clone()));
            }
            problem.add_new_variable(
                &rxn.get_forward_id(),
                Some(rxn.id.as_str()),
                rxn.get_forward_lower_bound(),
                rxn.get_forward_upper_bound(),
            )?;
            problem.add_new_variable(
                &rxn.get_reverse_id(),
                None,
                rxn.get_reverse_lower_bound(),
                rxn.get_reverse_upper_bound(),
            )?;
            let (variables, signs) = rxn.flux_expression();
            for (met, coef) in &rxn.metabolites {
                if !self.metabolites.contains_key(met) {
                    return Err(ModelError::UnknownMetabolite {
                        reaction: rxn.id.clone(),
                        metabolite: met.clone(),
                    });
                }
                let (vars, coefs) = balances.entry(met.as_str()).or_default();
                for (var, sign) in variables.iter().zip(signs) {
                    vars.push(var.clone());
                    coefs.push(sign * coef);
                }
            }
        }
        for met in self.metabolites.keys() {
            if let Some((vars, coefs)) = balances.get(met.as_str()) {
                let vars: Vec<&str> = vars.iter().map(String::as_str).collect();
                problem.add_new_equality_constraint(met, &vars, coefs, 0.)?;
            }
        }
        for (rxn_id, coefficient) in &self.objective {
            let rxn = self
                .reactions
                .get(rxn_id)
                .ok_or_else(|| ModelError::UnknownObjectiveReaction(rxn_id.clone()))?;
            let (variables, signs) = rxn.flux_expression();
            for (var, sign) in variables.iter().zip(signs) {
                problem.add_new_linear_objective_term(var, sign * coefficient)?;
            }
        }
        debug!(
            model = self.id.as_deref().unwrap_or(""),
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            "built flux balance problem"
        );
        Ok(problem)
    }

    /// Optimize the model's objective with the configured solver (flux balance analysis)
    ///
    /// Fails unless the solver finds an optimal solution.
    pub fn optimize(&self) -> Result<Solution, ModelError> {
        let solver = configured_solver();
        self.optimize_with(solver.as_ref())
    }

    /// Optimize the model's objective with a specific solver
    pub fn optimize_with(&self, solver: &dyn Solver) -> Result<Solution, ModelError> {
        let problem = self.to_problem()?;
        let solution = Solution::from_problem_solution(self, problem.solve(solver)?)?;
        info!(
            model = self.id.as_deref().unwrap_or(""),
            objective_value = solution.objective_value,
            "optimized model"
        );
        Ok(solution)
    }
}

/// Errors associated with building or optimizing a [`Model`]
#[derive(Error, Debug, Clone)]
pub enum ModelError {
    /// A reaction references a metabolite the model does not contain
    #[error("Reaction {reaction} references unknown metabolite {metabolite}")]
    UnknownMetabolite {
        /// Reaction with the bad reference
        reaction: String,
        /// The missing metabolite
        metabolite: String,
    },
    /// The objective references a reaction the model does not contain
    #[error("Objective references unknown reaction {0}")]
    UnknownObjectiveReaction(String),
    /// No reaction carries an objective coefficient
    #[error("The model has no objective")]
    EmptyObjective,
    /// A reaction was requested which the model does not contain
    #[error("Reaction {0} is not in the model")]
    UnknownReaction(String),
    /// A reaction has lower_bound > upper_bound
    #[error("Reaction {0} has a lower bound above its upper bound")]
    InvalidBounds(String),
    /// The solver did not report an optimal solution
    #[error("Optimization failed, solver status is {0}")]
    NotOptimal(OptimizationStatus),
    /// The optimization problem could not be built or solved
    #[error("Problem error: {0}")]
    Problem(#[from] ProblemError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::metabolite::MetaboliteBuilder;
    use crate::metabolic_model::reaction::ReactionBuilder;

    /// -> a -> b -> , with the uptake limited to 10
    fn linear_model() -> Model {
        let mut model = Model::new_empty();
        for met in ["a", "b"] {
            model.add_metabolite(MetaboliteBuilder::default().id(met).build().unwrap());
        }
        let reactions = [
            ("uptake", vec![("a", 1.)], 0., 10.),
            ("convert", vec![("a", -1.), ("b", 1.)], -1000., 1000.),
            ("drain", vec![("b", -1.)], 0., 1000.),
        ];
        for (id, mets, lb, ub) in reactions {
            model.add_reaction(
                ReactionBuilder::default()
                    .id(id)
                    .metabolites(mets.into_iter().map(|(m, c)| (m.to_string(), c)).collect())
                    .lower_bound(lb)
                    .upper_bound(ub)
                    .build()
                    .unwrap(),
            );
        }
        model.objective.insert("drain".to_string(), 1.);
        model
    }

    #[test]
    fn stoichiometric_matrix() {
        let model = linear_model();
        let s = model.stoichiometric_matrix().unwrap();
        assert_eq!((s.nrows(), s.ncols()), (2, 3));
        assert_eq!(s.nnz(), 4);
    }

    #[test]
    fn problem_shape() {
        let problem = linear_model().to_problem().unwrap();
        assert_eq!(problem.num_variables(), 6);
        assert_eq!(problem.num_constraints(), 2);
        assert_eq!(problem.objective().terms().len(), 2);
    }

    #[test]
    fn optimize_linear_model() {
        let model = linear_model();
        let solution = model.optimize().unwrap();
        assert!((solution.objective_value - 10.).abs() < 1e-5);
        assert!((solution.flux("convert").unwrap() - 10.).abs() < 1e-5);
        assert!(model.mass_balance_residual(&solution.fluxes).unwrap() < 1e-6);
    }

    #[test]
    fn residual_of_unbalanced_fluxes() {
        let model = linear_model();
        let fluxes = IndexMap::from([("uptake".to_string(), 3.), ("convert".to_string(), 1.)]);
        assert!((model.mass_balance_residual(&fluxes).unwrap() - 2.).abs() < 1e-12);
    }

    #[test]
    fn infeasible_model() {
        let mut model = linear_model();
        model.reactions.get_mut("drain").unwrap().lower_bound = 20.;
        assert!(matches!(
            model.optimize(),
            Err(ModelError::NotOptimal(OptimizationStatus::Infeasible))
        ));
    }

    #[test]
    fn bad_references() {
        let mut model = linear_model();
        model.objective.insert("missing".to_string(), 1.);
        assert!(matches!(
            model.to_problem(),
            Err(ModelError::UnknownObjectiveReaction(_))
        ));

        let mut model = linear_model();
        model
            .reactions
            .get_mut("drain")
            .unwrap()
            .metabolites
            .insert("ghost".to_string(), 1.);
        assert!(matches!(
            model.to_problem(),
            Err(ModelError::UnknownMetabolite { .. })
        ));
        assert!(model.stoichiometric_matrix().is_err());

        let mut model = linear_model();
        model.reactions.get_mut("convert").unwrap().lower_bound = 2000.;
        assert!(matches!(model.to_problem(), Err(ModelError::InvalidBounds(_))));
        assert!(model.get_reaction("nope").is_err());

        let mut model = linear_model();
        model.objective.clear();
        assert!(matches!(model.to_problem(), Err(ModelError::EmptyObjective)));
    }
}

//! Provides struct representing an optimization problem
use crate::optimize::constraint::Constraint;
use crate::optimize::objective::{Objective, ObjectiveSense, ObjectiveTerm};
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::variable::{Variable, VariableBuilder};
use crate::optimize::ProblemSolution;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

/// An optimization problem
#[derive(Debug, Clone)]
pub struct Problem {
    /// Objective to optimize
    objective: Objective,
    /// Variables of the optimization problem
    variables: IndexMap<String, Variable>,
    /// Constraints of the optimization problem
    constraints: IndexMap<String, Constraint>,
}

impl Problem {
    // region Creation Functions
    /// Create a new optimization problem
    pub fn new(objective_sense: ObjectiveSense) -> Self {
        Self {
            objective: Objective::new(objective_sense),
            variables: IndexMap::new(),
            constraints: IndexMap::new(),
        }
    }

    /// Create a new maximization problem
    pub fn new_maximization() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }

    /// Create a new minimization problem
    pub fn new_minimization() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }

    // endregion Creation Functions

    // region Accessors
    /// The problem's objective
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// Variables, in index order
    pub fn variables(&self) -> &IndexMap<String, Variable> {
        &self.variables
    }

    /// Constraints, in insertion order
    pub fn constraints(&self) -> &IndexMap<String, Constraint> {
        &self.constraints
    }

    /// Look up a variable by id
    pub fn get_variable(&self, id: &str) -> Option<&Variable> {
        self.variables.get(id)
    }

    /// Current number of variables in the problem
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Current number of constraints in the problem
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Type of problem, determined by the objective
    pub fn problem_type(&self) -> ProblemType {
        if self.objective.contains_quadratic() {
            ProblemType::QuadraticContinuous
        } else {
            ProblemType::LinearContinuous
        }
    }
    // endregion Accessors

    // region Update Objective Sense
    /// Update the objective sense of the problem
    pub fn update_objective_sense(&mut self, sense: ObjectiveSense) {
        self.objective.set_sense(sense);
    }
    // endregion Update Objective Sense

    // region Adding Variables
    /// Add a variable to the optimization problem
    pub fn add_variable(&mut self, mut variable: Variable) -> Result<(), ProblemError> {
        self.validate_variable(&variable)?;
        variable.index = self.variables.len();
        self.variables.insert(variable.id.clone(), variable);
        Ok(())
    }

    /// Create a new variable and add it to the optimization problem
    pub fn add_new_variable(
        &mut self,
        id: &str,
        name: Option<&str>,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        let mut builder = VariableBuilder::default();
        builder
            .id(id)
            .lower_bound(lower_bound)
            .upper_bound(upper_bound);
        if let Some(name) = name {
            builder.name(name);
        }
        let variable = builder
            .build()
            .map_err(|err| ProblemError::UnableToBuildVariable(err.to_string()))?;
        self.add_variable(variable)
    }
    // endregion Adding Variables

    // region Adding Constraints
    /// Add a constraint to the problem
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), ProblemError> {
        self.validate_constraint(&constraint)?;
        self.constraints
            .insert(constraint.get_id().to_string(), constraint);
        Ok(())
    }

    /// Create a new equality constraint and add it to the problem
    pub fn add_new_equality_constraint(
        &mut self,
        id: &str,
        variables: &[&str],
        coefficients: &[f64],
        equals: f64,
    ) -> Result<(), ProblemError> {
        self.add_constraint(Constraint::new_equality(id, variables, coefficients, equals))
    }

    /// Create a new inequality constraint and add it to the problem
    pub fn add_new_inequality_constraint(
        &mut self,
        id: &str,
        variables: &[&str],
        coefficients: &[f64],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        self.add_constraint(Constraint::new_inequality(
            id,
            variables,
            coefficients,
            lower_bound,
            upper_bound,
        ))
    }
    // endregion Adding Constraints

    // region Adding Objective Terms
    /// Add a new term to the objective
    pub fn add_objective_term(&mut self, objective_term: ObjectiveTerm) -> Result<(), ProblemError> {
        self.validate_objective_term(&objective_term)?;
        self.objective.add_term(objective_term);
        Ok(())
    }

    /// Add a new linear term to the objective using the variable id
    pub fn add_new_linear_objective_term(
        &mut self,
        variable_id: &str,
        coefficient: f64,
    ) -> Result<(), ProblemError> {
        self.add_objective_term(ObjectiveTerm::new_linear(variable_id, coefficient))
    }

    /// Add a new quadratic term to the objective using the variable ids
    pub fn add_new_quadratic_objective_term(
        &mut self,
        variable1: &str,
        variable2: &str,
        coefficient: f64,
    ) -> Result<(), ProblemError> {
        self.add_objective_term(ObjectiveTerm::new_quadratic(
            variable1,
            variable2,
            coefficient,
        ))
    }

    /// Replace the objective with a linear one
    pub fn set_linear_objective(
        &mut self,
        sense: ObjectiveSense,
        variables: &[&str],
        coefficients: &[f64],
    ) -> Result<(), ProblemError> {
        if let Some(missing) = variables.iter().find(|v| !self.variables.contains_key(**v)) {
            return Err(ProblemError::NonExistentVariablesInObjective(missing.to_string()));
        }
        self.objective.remove_all_terms();
        self.objective.set_sense(sense);
        self.objective.add_linear_terms(variables, coefficients);
        Ok(())
    }
    // endregion Adding Objective Terms

    // region Update Bounds
    /// Update the bounds of a variable
    pub fn update_variable_bounds(
        &mut self,
        id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        if lower_bound > upper_bound {
            return Err(ProblemError::InvalidVariableBounds(id.to_string()));
        }
        match self.variables.get_mut(id) {
            Some(var) => {
                var.lower_bound = lower_bound;
                var.upper_bound = upper_bound;
            }
            None => return Err(ProblemError::NonExistentVariable(id.to_string())),
        };
        Ok(())
    }

    /// Update the bounds of an inequality constraint
    pub fn update_constraint_bounds(
        &mut self,
        id: &str,
        new_lower_bound: f64,
        new_upper_bound: f64,
    ) -> Result<(), ProblemError> {
        if new_lower_bound > new_upper_bound {
            return Err(ProblemError::InvalidConstraintBounds(id.to_string()));
        }
        match self.constraints.get_mut(id) {
            Some(Constraint::Inequality {
                lower_bound,
                upper_bound,
                ..
            }) => {
                *lower_bound = new_lower_bound;
                *upper_bound = new_upper_bound;
                Ok(())
            }
            Some(Constraint::Equality { .. }) => {
                Err(ProblemError::NotAnInequalityConstraint(id.to_string()))
            }
            None => Err(ProblemError::NonExistentConstraint(id.to_string())),
        }
    }
    // endregion Update Bounds

    // region Remove Variables
    /// Remove a variable from the problem, will also remove it as a term from all constraints
    /// and any terms in the objective that include this variable
    pub fn delete_variable(&mut self, variable_id: &str) -> Result<(), ProblemError> {
        if self.variables.shift_remove(variable_id).is_none() {
            return Err(ProblemError::NonExistentVariable(variable_id.to_string()));
        }
        self.objective.remove_terms_with_variable(variable_id);
        self.constraints
            .values_mut()
            .for_each(|cons| cons.remove_variable(variable_id));
        self.fix_variable_indices();
        Ok(())
    }
    // endregion Remove Variables

    // region Remove Constraints
    /// Remove a constraint (by id) from the problem
    pub fn remove_constraint(&mut self, constraint_id: &str) -> Result<(), ProblemError> {
        match self.constraints.shift_remove(constraint_id) {
            Some(_) => Ok(()),
            None => Err(ProblemError::NonExistentConstraint(constraint_id.to_string())),
        }
    }
    // endregion Remove Constraints

    // region Remove Objective Terms
    /// Remove all terms from the objective
    pub fn remove_all_objective_terms(&mut self) {
        self.objective.remove_all_terms();
    }
    // endregion Remove Objective Terms

    // region Solving
    /// Value of the objective for the given variable values
    ///
    /// Variables missing from `values` are taken as zero.
    pub fn evaluate_objective(&self, values: &IndexMap<String, f64>) -> f64 {
        let value_of = |id: &str| values.get(id).copied().unwrap_or(0.);
        self.objective
            .terms()
            .iter()
            .map(|term| match term {
                ObjectiveTerm::Linear { var, coef } => coef * value_of(var),
                ObjectiveTerm::Quadratic { var1, var2, coef } => {
                    coef * value_of(var1) * value_of(var2)
                }
            })
            .sum()
    }

    /// Solve the problem with the given solver
    ///
    /// A quadratic objective is rejected up front if the solver only handles linear ones.
    pub fn solve(&self, solver: &dyn Solver) -> Result<ProblemSolution, ProblemError> {
        if self.problem_type() == ProblemType::QuadraticContinuous
            && !solver.quadratic_objective_capable()
        {
            return Err(SolverError::UnsupportedProblem(
                solver.name(),
                "quadratic objective".to_string(),
            )
            .into());
        }
        debug!(
            solver = solver.name(),
            variables = self.num_variables(),
            constraints = self.num_constraints(),
            "solving problem"
        );
        Ok(solver.solve(self)?)
    }
    // endregion Solving

    // region Validation Functions
    /// Check that a variable to be added is valid to add to this problem
    fn validate_variable(&self, variable: &Variable) -> Result<(), ProblemError> {
        if self.variables.contains_key(&variable.id) {
            return Err(ProblemError::VariableIdAlreadyExists(variable.id.clone()));
        };
        if variable.lower_bound > variable.upper_bound
            || variable.lower_bound.is_nan()
            || variable.upper_bound.is_nan()
        {
            return Err(ProblemError::InvalidVariableBounds(variable.id.clone()));
        }
        Ok(())
    }

    /// Check that a constraint to be added is valid to add to this Problem
    fn validate_constraint(&self, constraint: &Constraint) -> Result<(), ProblemError> {
        let id = constraint.get_id();
        if self.constraints.contains_key(id) {
            return Err(ProblemError::ConstraintAlreadyExists(id.to_string()));
        }
        if let Constraint::Inequality {
            lower_bound,
            upper_bound,
            ..
        } = constraint
        {
            if lower_bound > upper_bound {
                return Err(ProblemError::InvalidConstraintBounds(id.to_string()));
            }
        }
        if let Some(missing) = constraint
            .get_variables()
            .find(|v| !self.variables.contains_key(*v))
        {
            return Err(ProblemError::NonExistentVariablesInConstraint(
                missing.to_string(),
            ));
        }
        Ok(())
    }

    /// Check that an objective term to be added is valid to add to this Problem
    fn validate_objective_term(&self, objective_term: &ObjectiveTerm) -> Result<(), ProblemError> {
        let missing = match objective_term {
            ObjectiveTerm::Quadratic { var1, var2, .. } => [var1, var2]
                .into_iter()
                .find(|v| !self.variables.contains_key(*v)),
            ObjectiveTerm::Linear { var, .. } => {
                Some(var).filter(|v| !self.variables.contains_key(*v))
            }
        };
        match missing {
            Some(var) => Err(ProblemError::NonExistentVariablesInObjective(var.clone())),
            None => Ok(()),
        }
    }
    // endregion Validation Functions

    fn fix_variable_indices(&mut self) {
        self.variables
            .values_mut()
            .enumerate()
            .for_each(|(ind, var)| var.index = ind);
    }
}

/// Types of optimization problems
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProblemType {
    /// Problem with linear objectives and constraints, and continuous variables
    LinearContinuous,
    /// Problem with quadratic objective, linear constraints, and continuous variables
    QuadraticContinuous,
}

/// Errors associated with the Problem
#[derive(Error, Debug, Clone)]
pub enum ProblemError {
    /// Error when trying to add a variable with the same id as an existing variable
    #[error("Tried to add variable {0} with the same id as an existing variable")]
    VariableIdAlreadyExists(String),
    /// Error when trying to add variable with invalid bounds
    #[error("Tried to give variable {0} a lower_bound > upper_bound")]
    InvalidVariableBounds(String),
    /// Error when the variable builder rejects its input
    #[error("Unable to build variable: {0}")]
    UnableToBuildVariable(String),
    /// Error when trying to add a constraint with the same id as an existing constraint
    #[error("Tried to add constraint {0} with the same id as an existing constraint")]
    ConstraintAlreadyExists(String),
    /// Error when trying to add a constraint with invalid bounds
    #[error("Tried to give inequality constraint {0} a lower_bound > upper_bound")]
    InvalidConstraintBounds(String),
    /// Error when trying to add a constraint that contains variables not in the problem
    #[error("Tried to add a constraint with variable {0} which is not in the problem")]
    NonExistentVariablesInConstraint(String),
    /// Error when trying to add an objective term which includes variables not in the problem
    #[error("Tried adding an objective term with variable {0} which is not in the problem")]
    NonExistentVariablesInObjective(String),
    /// Error when trying to perform an update or drop on a variable that doesn't exist
    #[error("Tried to access variable {0} which doesn't exist")]
    NonExistentVariable(String),
    /// Error when trying to perform an update or drop on a constraint that doesn't exist
    #[error("Tried to access constraint {0} which doesn't exist")]
    NonExistentConstraint(String),
    /// Error when trying to update the bounds of an equality constraint
    #[error("Constraint {0} is an equality and has no bounds to update")]
    NotAnInequalityConstraint(String),
    /// Error raised by the solver
    #[error("Solver failed: {0}")]
    Solver(#[from] SolverError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_problem() {
        let max_problem = Problem::new_maximization();
        assert_eq!(max_problem.objective.sense, ObjectiveSense::Maximize);

        let min_problem = Problem::new_minimization();
        assert_eq!(min_problem.objective.sense, ObjectiveSense::Minimize);
    }

    #[test]
    fn update_objective_sense() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);
        problem.update_objective_sense(ObjectiveSense::Minimize);
        assert_eq!(problem.objective.sense, ObjectiveSense::Minimize);
        problem.update_objective_sense(ObjectiveSense::Maximize);
        assert_eq!(problem.objective.sense, ObjectiveSense::Maximize);
    }

    #[test]
    fn add_variables() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);

        problem.add_new_variable("x", None, 64., 100.).unwrap();
        let var = problem.get_variable("x").expect("Variable not added to problem");
        assert_eq!(var.index, 0);
        assert!((var.lower_bound - 64.0).abs() < 1e-25);
        assert!((var.upper_bound - 100.0).abs() < 1e-25);

        problem.add_new_variable("y", Some("why"), 0., 1.).unwrap();
        assert_eq!(problem.get_variable("y").unwrap().index, 1);
        assert_eq!(problem.problem_type(), ProblemType::LinearContinuous);
    }

    #[test]
    fn add_bad_variable() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);

        let res = problem.add_new_variable("x", None, 100., 64.);
        assert!(matches!(res, Err(ProblemError::InvalidVariableBounds(_))));

        problem.add_new_variable("x", None, 0., 1.).unwrap();
        let res = problem.add_new_variable("x", None, 0., 1.);
        assert!(matches!(res, Err(ProblemError::VariableIdAlreadyExists(_))));
    }

    #[test]
    fn add_constraint() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);
        problem.add_new_variable("x", None, 64., 100.).unwrap();
        problem.add_new_variable("y", None, 64., 100.).unwrap();

        problem
            .add_new_equality_constraint("test_equality", &["x", "y"], &[2., 3.], 200.)
            .unwrap();
        match problem.constraints.get("test_equality").unwrap() {
            Constraint::Equality { equals, .. } => assert!((equals - 200.).abs() < 1e-25),
            Constraint::Inequality { .. } => panic!("Incorrect constraint type added"),
        }

        problem
            .add_new_inequality_constraint("test_inequality", &["x", "y"], &[2., 3.], 100., 200.)
            .unwrap();
        match problem.constraints.get("test_inequality").unwrap() {
            Constraint::Inequality {
                lower_bound,
                upper_bound,
                ..
            } => {
                assert!((lower_bound - 100.).abs() < 1e-25);
                assert!((upper_bound - 200.).abs() < 1e-25);
            }
            Constraint::Equality { .. } => panic!("Incorrect constraint type added"),
        }
        assert_eq!(problem.num_constraints(), 2);

        // Same id again
        let res = problem.add_new_equality_constraint("test_equality", &["x"], &[1.], 0.);
        assert!(matches!(res, Err(ProblemError::ConstraintAlreadyExists(_))));
    }

    #[test]
    fn add_bad_constraint() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);
        problem.add_new_variable("x", None, 64., 100.).unwrap();
        problem.add_new_variable("y", None, 64., 100.).unwrap();

        let res = problem.add_new_inequality_constraint(
            "bad_constraint",
            &["x", "y"],
            &[2., 3.],
            200.,
            100.,
        );
        assert!(matches!(res, Err(ProblemError::InvalidConstraintBounds(_))));

        let res = problem.add_new_equality_constraint("ghost", &["x", "z"], &[1., 1.], 0.);
        assert!(matches!(
            res,
            Err(ProblemError::NonExistentVariablesInConstraint(v)) if v == "z"
        ));
    }

    #[test]
    fn objective_terms() {
        let mut problem = Problem::new_minimization();
        problem.add_new_variable("x", None, 0., 10.).unwrap();
        problem.add_new_linear_objective_term("x", 2.).unwrap();
        assert!(problem.add_new_linear_objective_term("y", 1.).is_err());
        problem.add_new_quadratic_objective_term("x", "x", 1.).unwrap();
        assert_eq!(problem.problem_type(), ProblemType::QuadraticContinuous);

        let mut values = IndexMap::new();
        values.insert("x".to_string(), 3.);
        assert!((problem.evaluate_objective(&values) - 15.).abs() < 1e-12);

        problem.remove_all_objective_terms();
        assert_eq!(problem.problem_type(), ProblemType::LinearContinuous);
    }

    #[test]
    fn delete_variable_reindexes() {
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", None, 0., 10.).unwrap();
        problem.add_new_variable("y", None, 0., 10.).unwrap();
        problem.add_new_variable("z", None, 0., 10.).unwrap();
        problem
            .add_new_inequality_constraint("c", &["x", "y", "z"], &[1., 1., 1.], 0., 5.)
            .unwrap();
        problem.add_new_linear_objective_term("y", 1.).unwrap();

        problem.delete_variable("y").unwrap();
        assert_eq!(problem.get_variable("z").unwrap().index, 1);
        assert_eq!(
            problem.constraints["c"].get_variables().collect::<Vec<_>>(),
            vec!["x", "z"]
        );
        assert!(problem.objective().terms().is_empty());
        assert!(matches!(
            problem.delete_variable("y"),
            Err(ProblemError::NonExistentVariable(_))
        ));
    }

    #[test]
    fn update_bounds() {
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", None, 0., 10.).unwrap();
        problem
            .add_new_inequality_constraint("ineq", &["x"], &[1.], 0., 5.)
            .unwrap();
        problem
            .add_new_equality_constraint("eq", &["x"], &[1.], 5.)
            .unwrap();

        problem.update_variable_bounds("x", 1., 2.).unwrap();
        assert!((problem.get_variable("x").unwrap().upper_bound - 2.).abs() < 1e-25);
        assert!(problem.update_variable_bounds("x", 3., 2.).is_err());

        problem.update_constraint_bounds("ineq", -1., 1.).unwrap();
        assert!(matches!(
            problem.update_constraint_bounds("eq", 0., 1.),
            Err(ProblemError::NotAnInequalityConstraint(_))
        ));
        assert!(matches!(
            problem.update_constraint_bounds("nope", 0., 1.),
            Err(ProblemError::NonExistentConstraint(_))
        ));

        problem.remove_constraint("eq").unwrap();
        assert_eq!(problem.num_constraints(), 1);
    }

    /// Solver that only takes linear problems and reports them unoptimized
    struct LinearOnly;

    impl Solver for LinearOnly {
        fn name(&self) -> &'static str {
            "linear only"
        }

        fn quadratic_objective_capable(&self) -> bool {
            false
        }

        fn solve(&self, _problem: &Problem) -> Result<ProblemSolution, SolverError> {
            Ok(ProblemSolution::from_status(
                crate::optimize::OptimizationStatus::Unoptimized,
            ))
        }
    }

    #[test]
    fn quadratic_objective_needs_capable_solver() {
        let mut problem = Problem::new_minimization();
        problem.add_new_variable("x", None, 0., 10.).unwrap();
        problem.add_new_linear_objective_term("x", 1.).unwrap();
        assert!(problem.solve(&LinearOnly).is_ok());

        problem.add_new_quadratic_objective_term("x", "x", 1.).unwrap();
        assert!(matches!(
            problem.solve(&LinearOnly),
            Err(ProblemError::Solver(SolverError::UnsupportedProblem("linear only", _)))
        ));
    }
}

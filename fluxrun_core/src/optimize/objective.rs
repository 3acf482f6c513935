//! Provides struct for representing an optimization problem's objective

/// Represents the Objective of an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Terms included in the objective (See [`ObjectiveTerm`])
    pub(crate) terms: Vec<ObjectiveTerm>,
    /// Sense of the objective (maximize, or minimize), see [`ObjectiveSense`]
    pub(crate) sense: ObjectiveSense,
}

impl Objective {
    /// Create a new empty objective, with a given sense
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            terms: Vec::new(),
            sense,
        }
    }

    /// Create a new empty maximization objective
    pub fn new_maximize() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }

    /// Create a new empty minimization objective
    pub fn new_minimize() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }

    /// Sense of the objective
    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    /// Terms of the objective
    pub fn terms(&self) -> &[ObjectiveTerm] {
        &self.terms
    }

    /// Change the sense of the objective
    pub fn set_sense(&mut self, sense: ObjectiveSense) {
        self.sense = sense;
    }

    /// Add a new term to the objective
    pub fn add_term(&mut self, term: ObjectiveTerm) {
        self.terms.push(term);
    }

    /// Add a series of linear terms to the objective function
    pub fn add_linear_terms(&mut self, variables: &[&str], coefficients: &[f64]) {
        self.terms.extend(
            variables
                .iter()
                .zip(coefficients)
                .map(|(var, coef)| ObjectiveTerm::new_linear(var, *coef)),
        );
    }

    /// Remove every term
    pub fn remove_all_terms(&mut self) {
        self.terms.clear();
    }

    /// Remove any term involving `variable_id`
    pub(crate) fn remove_terms_with_variable(&mut self, variable_id: &str) {
        self.terms.retain(|term| !term.involves(variable_id));
    }

    /// Whether any term is quadratic
    pub fn contains_quadratic(&self) -> bool {
        self.terms
            .iter()
            .any(|t| matches!(t, ObjectiveTerm::Quadratic { .. }))
    }

    /// The linear part of the objective as (variable id, coefficient) pairs
    pub fn linear_terms(&self) -> impl Iterator<Item = (&str, f64)> {
        self.terms.iter().filter_map(|t| match t {
            ObjectiveTerm::Linear { var, coef } => Some((var.as_str(), *coef)),
            ObjectiveTerm::Quadratic { .. } => None,
        })
    }
}

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    Maximize,
}

// region Objective Terms
/// A term in the objective
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectiveTerm {
    /// A quadratic term in the objective, `coef*var1*var2`
    Quadratic {
        /// First variable in the objective term
        var1: String,
        /// Second variable in the objective term
        var2: String,
        /// Coefficient for quadratic term
        coef: f64,
    },
    /// A linear term in the objective, `coef*var`
    Linear {
        /// Variable in objective term
        var: String,
        /// Coefficient for linear term
        coef: f64,
    },
}

impl ObjectiveTerm {
    /// Create a new quadratic objective term
    pub fn new_quadratic(var1: &str, var2: &str, coef: f64) -> Self {
        ObjectiveTerm::Quadratic {
            var1: var1.to_string(),
            var2: var2.to_string(),
            coef,
        }
    }

    /// Create a new linear objective term
    pub fn new_linear(var: &str, coef: f64) -> Self {
        ObjectiveTerm::Linear {
            var: var.to_string(),
            coef,
        }
    }

    fn involves(&self, variable_id: &str) -> bool {
        match self {
            ObjectiveTerm::Quadratic { var1, var2, .. } => var1 == variable_id || var2 == variable_id,
            ObjectiveTerm::Linear { var, .. } => var == variable_id,
        }
    }
}

// endregion Objective Terms

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadratic_detection() {
        let mut objective = Objective::new_minimize();
        objective.add_linear_terms(&["x", "y"], &[1., 2.]);
        assert!(!objective.contains_quadratic());
        objective.add_term(ObjectiveTerm::new_quadratic("x", "y", 3.));
        assert!(objective.contains_quadratic());
        objective.remove_terms_with_variable("y");
        assert!(!objective.contains_quadratic());
        assert_eq!(objective.linear_terms().collect::<Vec<_>>(), vec![("x", 1.)]);
    }
}

//! Module providing representation of optimization problem variables
use std::fmt::{Display, Formatter};

use derive_builder::Builder;

/// A continuous variable of an optimization problem
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Variable {
    /// Used to identify the variable (must be unique within a problem)
    #[builder(setter(into))]
    pub(crate) id: String,
    /// Human readable name
    #[builder(setter(into, strip_option), default = "None")]
    pub(crate) name: Option<String>,
    /// Lowest value the variable can take, may be `f64::NEG_INFINITY`
    #[builder(default = "f64::NEG_INFINITY")]
    pub(crate) lower_bound: f64,
    /// Highest value the variable can take, may be `f64::INFINITY`
    #[builder(default = "f64::INFINITY")]
    pub(crate) upper_bound: f64,
    /// Position of the variable in the problem, set when added to a problem
    #[builder(default = "0")]
    pub(crate) index: usize,
}

impl Variable {
    /// Identifier of the variable
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Lower bound of the variable
    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    /// Upper bound of the variable
    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    /// Position of the variable within its problem
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the variable is fixed to a single value
    pub(crate) fn is_fixed(&self) -> bool {
        self.lower_bound == self.upper_bound
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <= {} <= {}", self.lower_bound, name, self.upper_bound),
            None => write!(f, "{} <= {} <= {}", self.lower_bound, self.id, self.upper_bound),
        }
    }
}

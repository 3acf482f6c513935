//! Process wide defaults used when building models and solving problems
use std::sync::{LazyLock, RwLock};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Defaults shared by model construction and the solvers
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    /// Lower bound given to reactions built without an explicit one
    pub lower_bound: f64,
    /// Upper bound given to reactions built without an explicit one
    pub upper_bound: f64,
    /// Tolerance used for optimality and for deciding if a flux is zero
    pub tolerance: f64,
    /// Solver used by [`Model::optimize`](crate::metabolic_model::model::Model::optimize)
    /// and the flux analysis methods
    pub solver: Solver,
    /// Maximum number of interior point iterations allowed per solve
    pub max_iterations: u32,
}

impl Configuration {
    /// Get a copy of the current global configuration
    ///
    /// A poisoned lock still holds valid data, so it is read anyway.
    pub fn current() -> Configuration {
        match CONFIGURATION.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-07,
            solver: Solver::Clarabel,
            max_iterations: 200,
        }
    }
}

/// Enum used to specify the default solver to use
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Solver {
    /// Use the Clarabel interior point solver
    Clarabel,
}

pub(crate) fn default_lower_bound() -> f64 {
    Configuration::current().lower_bound
}

pub(crate) fn default_upper_bound() -> f64 {
    Configuration::current().upper_bound
}

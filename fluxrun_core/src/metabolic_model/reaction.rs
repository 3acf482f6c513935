//! This module provides a struct for representing reactions
use crate::configuration::{default_lower_bound, default_upper_bound};
use crate::utils::hashing::hash_as_hex_string;
use derive_builder::Builder;
use indexmap::IndexMap;

/// Represents a reaction in the metabolic model
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Reaction {
    /// Used to identify the reaction
    #[builder(setter(into))]
    pub id: String,
    /// Metabolite stoichiometry of the reaction, negative for consumed metabolites
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Gene Protein Reaction rule, as written in the model file
    #[builder(default = "String::new()")]
    pub gene_reaction_rule: String,
    /// Lower flux bound
    #[builder(default = "default_lower_bound()")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "default_upper_bound()")]
    pub upper_bound: f64,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
    /// Notes about the reaction
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Reaction Annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
}

impl Reaction {
    /// Determine the id to be associated with the forward reaction in the optimization problem
    ///
    /// # Note:
    /// The forward id is "{reaction_id}_forward"
    pub fn get_forward_id(&self) -> String {
        format!("{}_forward", &self.id)
    }

    /// Determine the id to be associated with the reverse reaction in the optimization problem
    ///
    /// # Note:
    /// The reverse id is "{reaction_id}_reverse_{hexidecimal hash of reaction_id}"
    pub fn get_reverse_id(&self) -> String {
        format!("{}_reverse_{}", &self.id, hash_as_hex_string(&self.id))
    }

    /// Determine the upper bound of the variable associated with the forward reaction
    pub(crate) fn get_forward_upper_bound(&self) -> f64 {
        self.upper_bound.max(0.)
    }

    /// Determine the lower bound of the variable associated with the forward reaction
    pub(crate) fn get_forward_lower_bound(&self) -> f64 {
        self.lower_bound.max(0.)
    }

    /// Determine the upper bound of the variable associated with the reverse reaction
    pub(crate) fn get_reverse_upper_bound(&self) -> f64 {
        (-self.lower_bound).max(0.)
    }

    /// Determine the lower bound of the variable associated with the reverse reaction
    pub(crate) fn get_reverse_lower_bound(&self) -> f64 {
        (-self.upper_bound).max(0.)
    }

    /// Variable ids and coefficients whose sum is the net flux through the reaction
    pub(crate) fn flux_expression(&self) -> ([String; 2], [f64; 2]) {
        ([self.get_forward_id(), self.get_reverse_id()], [1., -1.])
    }

    /// Whether the reaction can carry flux in both directions
    pub fn reversibility(&self) -> bool {
        self.lower_bound < 0. && self.upper_bound > 0.
    }

    /// Whether the reaction exchanges a metabolite with the environment
    ///
    /// Boundary reactions (exchanges, sinks and demands) have a single metabolite.
    pub fn is_boundary(&self) -> bool {
        self.metabolites.len() == 1
    }

    /// Human readable reaction equation using metabolite ids
    pub fn reaction_string(&self) -> String {
        let side = |sign: f64| {
            self.metabolites
                .iter()
                .filter(|(_, coef)| coef.signum() == sign)
                .map(|(met, coef)| {
                    if (coef.abs() - 1.).abs() < f64::EPSILON {
                        met.clone()
                    } else {
                        format!("{} {}", coef.abs(), met)
                    }
                })
                .collect::<Vec<_>>()
                .join(" + ")
        };
        let arrow = match (self.lower_bound < 0., self.upper_bound > 0.) {
            (true, true) => "<=>",
            (true, false) => "<--",
            _ => "-->",
        };
        format!("{} {} {}", side(-1.), arrow, side(1.))
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reaction(lower_bound: f64, upper_bound: f64) -> Reaction {
        ReactionBuilder::default()
            .id("PGI")
            .metabolites(IndexMap::from([
                ("g6p_c".to_string(), -1.),
                ("f6p_c".to_string(), 1.),
            ]))
            .lower_bound(lower_bound)
            .upper_bound(upper_bound)
            .build()
            .unwrap()
    }

    #[test]
    fn variable_ids() {
        let rxn = reaction(-1000., 1000.);
        assert_eq!(rxn.get_forward_id(), "PGI_forward");
        assert!(rxn.get_reverse_id().starts_with("PGI_reverse_"));
    }

    #[test]
    fn split_bounds_reversible() {
        let rxn = reaction(-5., 10.);
        assert!(rxn.reversibility());
        assert_eq!(
            (rxn.get_forward_lower_bound(), rxn.get_forward_upper_bound()),
            (0., 10.)
        );
        assert_eq!(
            (rxn.get_reverse_lower_bound(), rxn.get_reverse_upper_bound()),
            (0., 5.)
        );
    }

    #[test]
    fn split_bounds_forced() {
        // Forced forward flux
        let rxn = reaction(2., 10.);
        assert_eq!(
            (rxn.get_forward_lower_bound(), rxn.get_forward_upper_bound()),
            (2., 10.)
        );
        assert_eq!(
            (rxn.get_reverse_lower_bound(), rxn.get_reverse_upper_bound()),
            (0., 0.)
        );
        // Forced reverse flux
        let rxn = reaction(-10., -2.);
        assert_eq!(
            (rxn.get_forward_lower_bound(), rxn.get_forward_upper_bound()),
            (0., 0.)
        );
        assert_eq!(
            (rxn.get_reverse_lower_bound(), rxn.get_reverse_upper_bound()),
            (2., 10.)
        );
    }

    #[test]
    fn equation() {
        assert_eq!(reaction(-1000., 1000.).reaction_string(), "g6p_c <=> f6p_c");
        assert_eq!(reaction(0., 1000.).reaction_string(), "g6p_c --> f6p_c");
        let exchange = ReactionBuilder::default()
            .id("EX_glc__D_e")
            .metabolites(IndexMap::from([("glc__D_e".to_string(), -1.)]))
            .build()
            .unwrap();
        assert!(exchange.is_boundary());
        assert_eq!(exchange.reaction_string(), "glc__D_e <=>");
    }
}

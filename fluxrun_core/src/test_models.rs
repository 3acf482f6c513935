//! Small models bundled with the library, for examples, tests and benchmarks
use thiserror::Error;
use tracing::debug;

use crate::io::json::JsonError;
use crate::metabolic_model::model::Model;

/// Named models compiled into the library, as cobrapy JSON
const TEST_MODELS: [(&str, &str); 2] = [
    ("ecoli", include_str!("../test_data/ecoli.json")),
    ("mini", include_str!("../test_data/mini.json")),
];

/// Names accepted by [`create_test_model`]
pub fn available_test_models() -> Vec<&'static str> {
    TEST_MODELS.iter().map(|(name, _)| *name).collect()
}

/// Build one of the bundled models
///
/// * `"ecoli"`: central carbon metabolism of E. coli, growing on glucose (uptake limited
///   to 10) with a biomass objective
/// * `"mini"`: uptake of a single substrate converted to product by two parallel
///   reactions, so the optimum is not unique
///
/// # Examples
/// ```rust
/// use fluxrun_core::test_models::create_test_model;
/// let model = create_test_model("ecoli").unwrap();
/// assert!(model.reactions.contains_key("BIOMASS_Ecoli"));
/// assert!(create_test_model("textbook").is_err());
/// ```
pub fn create_test_model(name: &str) -> Result<Model, TestModelError> {
    let (_, json) = TEST_MODELS
        .iter()
        .find(|(model_name, _)| *model_name == name)
        .ok_or_else(|| TestModelError::UnknownModel(name.to_string()))?;
    let model = Model::from_json_str(json)?;
    debug!(
        name,
        reactions = model.reactions.len(),
        metabolites = model.metabolites.len(),
        "loaded test model"
    );
    Ok(model)
}

/// Errors raised when building a bundled model
#[derive(Error, Debug)]
pub enum TestModelError {
    /// No bundled model has the requested name
    #[error("No test model named {0:?}")]
    UnknownModel(String),
    /// The bundled JSON could not be turned into a model
    #[error("Bundled model is invalid: {0}")]
    Json(#[from] JsonError),
}

//! Runs a fixed constraint based modeling workflow on a bundled E. coli model: optimize
//! the model, report its exchange fluxes with flux ranges, then find the geometric FBA
//! flux distribution.
use std::io::Write;

use fluxrun_core::flux_analysis::{geometric_fba_default, FluxAnalysisError};
use fluxrun_core::metabolic_model::model::{Model, ModelError};
use fluxrun_core::summary::SummaryError;
use fluxrun_core::test_models::{create_test_model, TestModelError};
use thiserror::Error;
use tracing::info;

/// Name of the bundled model the workflow runs on
pub const TEST_MODEL: &str = "ecoli";
/// Written before the optimization and the flux variability summary
pub const FVA_HEADER: &str = "Running FVA==============";
/// Written before the geometric FBA result
pub const GEOMETRIC_FBA_HEADER: &str = "Running Geometric FBA ============";
/// Returned once every step has finished
pub const COMPLETED: u8 = 1;

/// Fraction of the optimum the flux ranges of the summary are computed at
const SUMMARY_FVA_FRACTION: f64 = 1.0;

/// Run the workflow on the [`TEST_MODEL`], writing the report to `out`
pub fn execute_workflow<W: Write>(out: &mut W) -> Result<u8, WorkflowError> {
    execute_workflow_for(TEST_MODEL, out)
}

/// Run the workflow on a named bundled model
///
/// An unknown name fails before anything is written.
pub fn execute_workflow_for<W: Write>(name: &str, out: &mut W) -> Result<u8, WorkflowError> {
    let model = create_test_model(name)?;
    execute_workflow_on(&model, out)
}

/// Run the workflow on a model
///
/// 1. write [`FVA_HEADER`]
/// 2. optimize the model
/// 3. write the summary of the model with flux ranges at the optimum
/// 4. write [`GEOMETRIC_FBA_HEADER`]
/// 5. run geometric FBA and write the one line form of its solution
///
/// Any failure stops the workflow, so the second header only appears once the model
/// could be optimized.
pub fn execute_workflow_on<W: Write>(model: &Model, out: &mut W) -> Result<u8, WorkflowError> {
    let model_id = model.id.as_deref().unwrap_or("");
    writeln!(out, "{}", FVA_HEADER)?;
    let solution = model.optimize()?;
    info!(
        model = model_id,
        objective_value = solution.objective_value,
        "optimized"
    );
    let summary = model.summary_of(&solution, Some(SUMMARY_FVA_FRACTION))?;
    write!(out, "{}", summary)?;

    writeln!(out, "{}", GEOMETRIC_FBA_HEADER)?;
    let central = geometric_fba_default(model)?;
    writeln!(out, "{}", central)?;
    out.flush()?;
    info!(model = model_id, "workflow completed");
    Ok(COMPLETED)
}

/// Errors that stop the workflow
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Unable to load the model")]
    Load(#[from] TestModelError),
    #[error("Unable to optimize the model")]
    Optimize(#[from] ModelError),
    #[error("Unable to summarize the model")]
    Summary(#[from] SummaryError),
    #[error("Geometric FBA failed")]
    GeometricFba(#[from] FluxAnalysisError),
    #[error("Unable to write the report")]
    Output(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_follow_each_other() {
        let mut out = Vec::new();
        assert_eq!(execute_workflow_for("mini", &mut out).unwrap(), COMPLETED);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(FVA_HEADER));
        let gfba = text.find(GEOMETRIC_FBA_HEADER).unwrap();
        assert!(gfba > text.find("Secretion").unwrap());
        assert!(text[gfba..].contains("<Solution "));
    }
}

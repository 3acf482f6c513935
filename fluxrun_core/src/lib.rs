//! Core of fluxrun, a crate for constraint based metabolic modeling.
//!
//! A [`Model`](metabolic_model::model::Model) is read from cobrapy style JSON (or taken
//! from the bundled [`test_models`]), turned into a linear [`Problem`](optimize::problem::Problem)
//! with one forward and one reverse variable per reaction, and solved with Clarabel.
//! On top of plain flux balance analysis, [`flux_analysis`] provides flux variability
//! analysis, parsimonious FBA and geometric FBA, and [`summary`] reports the exchange
//! fluxes of an optimal solution.
//!
//! # Examples
//! ```rust
//! use fluxrun_core::flux_analysis::geometric_fba_default;
//! use fluxrun_core::test_models::create_test_model;
//!
//! let model = create_test_model("mini").unwrap();
//! let solution = model.optimize().unwrap();
//! assert!((solution.objective_value - 10.).abs() < 1e-5);
//! let central = geometric_fba_default(&model).unwrap();
//! assert!((central.flux("R1").unwrap() - 5.).abs() < 1e-4);
//! ```
pub mod configuration;
pub mod flux_analysis;
pub mod io;
pub mod metabolic_model;
pub mod optimize;
pub mod summary;
pub mod test_models;
mod utils;

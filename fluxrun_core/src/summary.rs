//! Summary of a model's optimal solution: the objective and the metabolites exchanged
//! with the environment
use std::fmt::{Display, Formatter};

use thiserror::Error;
use tracing::debug;

use crate::configuration::Configuration;
use crate::flux_analysis::{flux_variability_analysis, FluxAnalysisError, FluxRange};
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::solution::Solution;

/// Fluxes with a smaller magnitude are reported as zero
const ZERO_FLUX: f64 = 1e-6;

/// One boundary reaction in the uptake or secretion table
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryRow {
    /// Metabolite exchanged by the reaction
    pub metabolite: String,
    /// Id of the boundary reaction
    pub reaction: String,
    /// Flux of the metabolite into the model, positive for uptake
    pub flux: f64,
    /// Range of `flux` over the near optimal solutions, when FVA was requested
    pub range: Option<FluxRange>,
    /// Number of carbon atoms in the metabolite
    pub carbon_number: u32,
    /// Share of the table's carbon flux carried by this row, in percent
    pub carbon_flux: f64,
}

/// Objective value and exchange fluxes of an optimized model
#[derive(Clone, Debug)]
pub struct ModelSummary {
    /// Objective written as `coefficient reaction` terms
    pub objective_expression: String,
    /// Optimal objective value
    pub objective_value: f64,
    /// Metabolites taken up, largest carbon flux first
    pub uptake: Vec<SummaryRow>,
    /// Metabolites secreted, largest carbon flux first
    pub secretion: Vec<SummaryRow>,
}

impl Model {
    /// Optimize the model and summarize the result
    ///
    /// # Parameters
    /// - `fva`: When given, the fraction of the optimum used to compute the range of every
    ///   boundary flux with flux variability analysis
    ///
    /// # Examples
    /// ```rust
    /// use fluxrun_core::test_models::create_test_model;
    /// let model = create_test_model("mini").unwrap();
    /// let summary = model.summary(None).unwrap();
    /// assert_eq!(summary.uptake[0].reaction, "EX_a");
    /// println!("{summary}");
    /// ```
    pub fn summary(&self, fva: Option<f64>) -> Result<ModelSummary, SummaryError> {
        let solution = self.optimize()?;
        self.summary_of(&solution, fva)
    }

    /// Summarize an existing solution of the model
    pub fn summary_of(
        &self,
        solution: &Solution,
        fva: Option<f64>,
    ) -> Result<ModelSummary, SummaryError> {
        let boundary: Vec<&str> = self.boundary_reactions().map(|r| r.id.as_str()).collect();
        let ranges = match fva {
            Some(fraction) => Some(flux_variability_analysis(self, Some(&boundary), fraction)?),
            None => None,
        };

        let range_threshold = range_threshold(solution, Configuration::current().tolerance);

        let mut uptake = Vec::new();
        let mut secretion = Vec::new();
        for rxn in self.boundary_reactions() {
            let Some((metabolite, coefficient)) = rxn.metabolites.first() else {
                continue;
            };
            // A boundary reaction produces `coefficient * v` of its metabolite, which is
            // positive when the metabolite enters the model
            let scale = *coefficient;
            let flux = scale * solution.flux(&rxn.id).unwrap_or(0.);
            let range = ranges
                .as_ref()
                .and_then(|r| r.get(&rxn.id))
                .map(|range| {
                    let (a, b) = (scale * range.minimum, scale * range.maximum);
                    FluxRange {
                        minimum: a.min(b),
                        maximum: a.max(b),
                    }
                });
            let row = SummaryRow {
                metabolite: metabolite.clone(),
                reaction: rxn.id.clone(),
                flux,
                range,
                carbon_number: self
                    .metabolites
                    .get(metabolite)
                    .map(|m| m.carbon_count())
                    .unwrap_or(0),
                carbon_flux: 0.,
            };
            if flux > ZERO_FLUX {
                uptake.push(row);
            } else if flux < -ZERO_FLUX {
                secretion.push(row);
            } else if let Some(range) = range {
                // Zero flux rows are only interesting if the flux could be non-zero
                if range.maximum > range_threshold {
                    uptake.push(row);
                } else if range.minimum < -range_threshold {
                    secretion.push(row);
                }
            }
        }
        finish_table(&mut uptake);
        finish_table(&mut secretion);
        debug!(
            uptake = uptake.len(),
            secretion = secretion.len(),
            "summarized model"
        );

        Ok(ModelSummary {
            objective_expression: self
                .objective
                .iter()
                .map(|(rxn, coef)| format!("{:?} {}", coef, rxn))
                .collect::<Vec<_>>()
                .join(" + "),
            objective_value: solution.objective_value,
            uptake,
            secretion,
        })
    }
}

/// Smallest range end that makes a zero flux row worth listing
///
/// The objective is only fixed up to `tolerance`, and a change of the objective moves
/// the fluxes by up to the ratio of the largest flux to the objective value. Range ends
/// within ten times that are solver noise.
fn range_threshold(solution: &Solution, tolerance: f64) -> f64 {
    let largest_flux = solution.fluxes.values().fold(0., |acc: f64, v| acc.max(v.abs()));
    let objective = solution.objective_value.abs().max(ZERO_FLUX);
    ZERO_FLUX.max(10. * tolerance * largest_flux / objective)
}

/// Fill in the carbon flux percentages and sort the rows
fn finish_table(rows: &mut [SummaryRow]) {
    let total: f64 = rows
        .iter()
        .map(|row| row.flux.abs() * row.carbon_number as f64)
        .sum();
    for row in rows.iter_mut() {
        row.carbon_flux = if total > 0. {
            100. * row.flux.abs() * row.carbon_number as f64 / total
        } else {
            0.
        };
    }
    rows.sort_by(|a, b| {
        b.carbon_flux
            .total_cmp(&a.carbon_flux)
            .then(b.flux.abs().total_cmp(&a.flux.abs()))
            .then(a.reaction.cmp(&b.reaction))
    });
}

/// Format a number with three significant digits
fn format_number(value: f64) -> String {
    if value.abs() < ZERO_FLUX {
        return "0".to_string();
    }
    let exponent = value.abs().log10().floor() as i32;
    if exponent < -4 {
        return format!("{:.2e}", value);
    }
    let decimals = (2 - exponent).max(0) as usize;
    let text = format!("{:.*}", decimals, value);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

/// Write one table with left aligned text and right aligned numbers
fn write_table(f: &mut Formatter<'_>, rows: &[SummaryRow], with_range: bool) -> std::fmt::Result {
    let mut header = vec!["Metabolite", "Reaction", "Flux"];
    if with_range {
        header.push("Range");
    }
    header.extend(["C-Number", "C-Flux"]);

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut cells = vec![
                row.metabolite.clone(),
                row.reaction.clone(),
                format_number(row.flux),
            ];
            if with_range {
                cells.push(match row.range {
                    Some(range) => format!(
                        "[{}; {}]",
                        format_number(range.minimum),
                        format_number(range.maximum)
                    ),
                    None => String::new(),
                });
            }
            cells.push(row.carbon_number.to_string());
            cells.push(format!("{:.2}%", row.carbon_flux));
            cells
        })
        .collect();

    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(col, title)| {
            cells
                .iter()
                .map(|row| row[col].len())
                .chain([title.len()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let write_row = |f: &mut Formatter<'_>, row: &[&str]| -> std::fmt::Result {
        let line = row
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(col, (cell, width))| {
                if col < 2 {
                    format!("{:<width$}", cell, width = width)
                } else {
                    format!("{:>width$}", cell, width = width)
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        writeln!(f, "{}", line.trim_end())
    };
    write_row(f, &header)?;
    for row in &cells {
        let row: Vec<&str> = row.iter().map(String::as_str).collect();
        write_row(f, &row)?;
    }
    Ok(())
}

impl Display for ModelSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let with_range = self
            .uptake
            .iter()
            .chain(&self.secretion)
            .any(|row| row.range.is_some());
        writeln!(f, "Objective")?;
        writeln!(f, "=========")?;
        writeln!(
            f,
            "{} = {}",
            self.objective_expression,
            format_number(self.objective_value)
        )?;
        writeln!(f)?;
        writeln!(f, "Uptake")?;
        writeln!(f, "------")?;
        write_table(f, &self.uptake, with_range)?;
        writeln!(f)?;
        writeln!(f, "Secretion")?;
        writeln!(f, "---------")?;
        write_table(f, &self.secretion, with_range)
    }
}

/// Errors raised while summarizing a model
#[derive(Error, Debug, Clone)]
pub enum SummaryError {
    /// The model could not be optimized
    #[error("Unable to optimize the model: {0}")]
    Model(#[from] ModelError),
    /// Flux variability analysis of the boundary reactions failed
    #[error("Unable to compute flux ranges: {0}")]
    FluxAnalysis(#[from] FluxAnalysisError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_models::create_test_model;

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(10.), "10");
        assert_eq!(format_number(-10.0000001), "-10");
        assert_eq!(format_number(0.6699), "0.67");
        assert_eq!(format_number(33.316), "33.3");
        assert_eq!(format_number(1000.), "1000");
        assert_eq!(format_number(1e-9), "0");
        assert_eq!(format_number(2.5e-5), "2.50e-5");
    }

    #[test]
    fn mini_without_ranges() {
        let model = create_test_model("mini").unwrap();
        let summary = model.summary(None).unwrap();
        assert!((summary.objective_value - 10.).abs() < 1e-5);
        assert_eq!(summary.objective_expression, "1.0 BIOMASS");

        assert_eq!(summary.uptake.len(), 1);
        let uptake = &summary.uptake[0];
        assert_eq!(uptake.metabolite, "a_e");
        assert!((uptake.flux - 10.).abs() < 1e-5);
        assert_eq!(uptake.carbon_number, 6);
        assert!((uptake.carbon_flux - 100.).abs() < 1e-9);
        assert!(uptake.range.is_none());

        // The objective drain is a boundary reaction too
        assert_eq!(summary.secretion.len(), 1);
        assert_eq!(summary.secretion[0].reaction, "BIOMASS");
        assert!((summary.secretion[0].flux + 10.).abs() < 1e-5);
    }

    #[test]
    fn mini_with_ranges() {
        let model = create_test_model("mini").unwrap();
        let summary = model.summary(Some(0.5)).unwrap();
        let range = summary.uptake[0].range.unwrap();
        assert!(range.minimum <= range.maximum);
        assert!((range.minimum - 5.).abs() < 1e-4);
        assert!((range.maximum - 10.).abs() < 1e-4);
    }

    #[test]
    fn report_layout() {
        let model = create_test_model("ecoli").unwrap();
        let text = model.summary(Some(1.0)).unwrap().to_string();
        let sections: Vec<usize> = ["Objective\n=========", "Uptake\n------", "Secretion\n---------"]
            .iter()
            .map(|section| text.find(section).unwrap())
            .collect();
        assert!(sections.windows(2).all(|w| w[0] < w[1]));
        assert!(text.contains("1.0 BIOMASS_Ecoli = "));
        assert!(text.contains("EX_glc__D_e"));
        assert!(text.contains("Range"));
    }

    #[test]
    fn ecoli_carbon_balance() {
        let model = create_test_model("ecoli").unwrap();
        let summary = model.summary(None).unwrap();
        let glucose = summary
            .uptake
            .iter()
            .find(|row| row.reaction == "EX_glc__D_e")
            .unwrap();
        assert!((glucose.flux - 10.).abs() < 1e-4);
        // Glucose is the only carbon source
        assert!((glucose.carbon_flux - 100.).abs() < 1e-6);
        let total: f64 = summary.secretion.iter().map(|row| row.carbon_flux).sum();
        assert!(summary.secretion.is_empty() || (total - 100.).abs() < 1e-6);
    }

    #[test]
    fn ecoli_exchange_directions() {
        let model = create_test_model("ecoli").unwrap();
        let summary = model.summary(None).unwrap();
        let reactions = |rows: &[SummaryRow]| -> Vec<String> {
            rows.iter().map(|row| row.reaction.clone()).collect()
        };
        let uptake = reactions(&summary.uptake[..]);
        let secretion = reactions(&summary.secretion[..]);
        for id in ["EX_glc__D_e", "EX_o2_e", "EX_nh4_e", "EX_pi_e"] {
            assert!(uptake.iter().any(|r| r == id), "{id} not taken up");
        }
        for id in ["EX_co2_e", "EX_h2o_e", "EX_h_e"] {
            assert!(secretion.iter().any(|r| r == id), "{id} not secreted");
        }
        assert!(summary.uptake.iter().all(|row| row.flux > 0.));
        assert!(summary.secretion.iter().all(|row| row.flux < 0.));
        let oxygen = summary.uptake.iter().find(|row| row.reaction == "EX_o2_e").unwrap();
        assert!((oxygen.flux - 32.456).abs() < 1e-2);
    }

    #[test]
    fn zero_flux_rows_need_a_real_range() {
        let model = create_test_model("ecoli").unwrap();
        let summary = model.summary(Some(1.0)).unwrap();
        // Acetate is not exchanged at the unique optimum
        assert!(summary
            .uptake
            .iter()
            .chain(&summary.secretion)
            .all(|row| row.reaction != "EX_ac_e"));
        assert!(!summary.to_string().contains("ac_e"));

        let solution = model.optimize().unwrap();
        let threshold = range_threshold(&solution, 1e-7);
        assert!(threshold > 3e-6);
        assert!(threshold < 1e-3);
    }
}

//! Module providing JSON IO for fluxrun Models, using the cobrapy JSON schema
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::{ReactionBuilder, ReactionBuilderError};
use crate::optimize::objective::ObjectiveSense;

// region JSON Model
/// Represents a JSON serialized model, used for reading and writing models in json format
#[derive(Serialize, Deserialize)]
struct JsonModel {
    metabolites: Vec<JsonMetabolite>,
    reactions: Vec<JsonReaction>,
    #[serde(default)]
    genes: Vec<JsonGene>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compartments: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct JsonMetabolite {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compartment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    charge: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonReaction {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    metabolites: IndexMap<String, f64>,
    lower_bound: f64,
    upper_bound: f64,
    #[serde(default)]
    gene_reaction_rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    objective_coefficient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subsystem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonGene {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}
// endregion JSON Model

// region Conversions
/* Notes and annotations are kept as JSON strings on the model objects. They are
loosely structured, so they are only unpacked again when writing. */
fn to_json_value(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

impl From<JsonGene> for Gene {
    fn from(g: JsonGene) -> Self {
        Self {
            id: g.id,
            name: g.name,
            notes: g.notes.map(|v| v.to_string()),
            annotation: g.annotation.map(|v| v.to_string()),
        }
    }
}

impl From<JsonMetabolite> for Metabolite {
    fn from(m: JsonMetabolite) -> Self {
        Self {
            id: m.id,
            name: m.name,
            compartment: m.compartment,
            charge: m.charge.unwrap_or_default(),
            formula: m.formula,
            notes: m.notes.map(|v| v.to_string()),
            annotation: m.annotation.map(|v| v.to_string()),
        }
    }
}

impl From<Gene> for JsonGene {
    fn from(g: Gene) -> Self {
        Self {
            id: g.id,
            name: g.name,
            notes: g.notes.map(to_json_value),
            annotation: g.annotation.map(to_json_value),
        }
    }
}

impl From<Metabolite> for JsonMetabolite {
    fn from(m: Metabolite) -> Self {
        Self {
            id: m.id,
            name: m.name,
            compartment: m.compartment,
            charge: Some(m.charge),
            formula: m.formula,
            notes: m.notes.map(to_json_value),
            annotation: m.annotation.map(to_json_value),
        }
    }
}

impl Model {
    /// Read a model from a cobrapy style JSON file
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Model, JsonError> {
        let model_str = fs::read_to_string(path.as_ref())
            .map_err(|err| JsonError::UnableToRead(format!("{}", err)))?;
        debug!(path = %path.as_ref().display(), "read JSON model");
        Model::from_json_str(&model_str)
    }

    /// Parse a model from a cobrapy style JSON string
    ///
    /// # Examples
    /// ```rust
    /// use fluxrun_core::metabolic_model::model::Model;
    /// let model = Model::from_json_str(
    ///     r#"{"metabolites": [{"id": "a"}],
    ///         "reactions": [{"id": "EX_a", "metabolites": {"a": -1.0},
    ///                        "lower_bound": -10.0, "upper_bound": 1000.0,
    ///                        "objective_coefficient": 1.0}]}"#,
    /// ).unwrap();
    /// assert_eq!(model.objective["EX_a"], 1.0);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Model, JsonError> {
        let json_model = serde_json::from_str::<JsonModel>(json)
            .map_err(|err| JsonError::UnableToParse(format!("{}", err)))?;
        Model::from_json(json_model)
    }

    /// Write the model to a cobrapy style JSON file
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), JsonError> {
        let model_string = self.to_json_string()?;
        fs::write(path, model_string)?;
        Ok(())
    }

    /// Serialize the model to a cobrapy style JSON string
    pub fn to_json_string(&self) -> Result<String, JsonError> {
        Ok(serde_json::to_string(&self.to_json())?)
    }

    fn from_json(json_model: JsonModel) -> Result<Self, JsonError> {
        let mut model = Model::new_empty();
        json_model
            .genes
            .into_iter()
            .for_each(|g| model.add_gene(Gene::from(g)));
        json_model
            .metabolites
            .into_iter()
            .for_each(|m| model.add_metabolite(Metabolite::from(m)));
        for rxn in json_model.reactions {
            let new_reaction = ReactionBuilder::default()
                .id(rxn.id.clone())
                .metabolites(rxn.metabolites)
                .name(rxn.name)
                .gene_reaction_rule(rxn.gene_reaction_rule)
                .lower_bound(rxn.lower_bound)
                .upper_bound(rxn.upper_bound)
                .subsystem(rxn.subsystem)
                .notes(rxn.notes.map(|v| v.to_string()))
                .annotation(rxn.annotation.map(|v| v.to_string()))
                .build()?;
            model.add_reaction(new_reaction);
            // Reactions with a zero coefficient don't take part in the objective
            match rxn.objective_coefficient {
                Some(coef) if coef != 0. => {
                    model.objective.insert(rxn.id, coef);
                }
                _ => {}
            }
        }
        model.objective_sense = ObjectiveSense::Maximize;
        model.id = json_model.id;
        model.compartments = json_model.compartments;
        model.version = json_model.version;
        Ok(model)
    }

    fn to_json(&self) -> JsonModel {
        let json_genes: Vec<JsonGene> = self.genes.values().map(|g| g.clone().into()).collect();
        let json_metabolites: Vec<JsonMetabolite> = self
            .metabolites
            .values()
            .map(|m| m.clone().into())
            .collect();
        let json_reactions: Vec<JsonReaction> = self
            .reactions
            .values()
            .map(|r| JsonReaction {
                id: r.id.clone(),
                name: r.name.clone(),
                metabolites: r.metabolites.clone(),
                lower_bound: r.lower_bound,
                upper_bound: r.upper_bound,
                gene_reaction_rule: r.gene_reaction_rule.clone(),
                objective_coefficient: self.objective.get(&r.id).copied(),
                subsystem: r.subsystem.clone(),
                notes: r.notes.clone().map(to_json_value),
                annotation: r.annotation.clone().map(to_json_value),
            })
            .collect();

        JsonModel {
            metabolites: json_metabolites,
            reactions: json_reactions,
            genes: json_genes,
            id: self.id.clone(),
            compartments: self.compartments.clone(),
            version: self.version.clone(),
        }
    }
}

/// Errors raised while reading or writing JSON models
#[derive(Error, Debug)]
pub enum JsonError {
    /// The file could not be read
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    /// The contents are not a valid model
    #[error("Unable to parse json due to {0}")]
    UnableToParse(String),
    /// A reaction entry is missing required fields
    #[error("Unable to build reaction")]
    UnableToBuildReaction(#[from] ReactionBuilderError),
    /// Serialization or deserialization failed
    #[error("Serde json error")]
    SerdeJson(#[from] serde_json::Error),
    /// The file could not be written
    #[error("Unable to write to file")]
    UnableToWrite(#[from] std::io::Error),
}

// endregion Conversions

#[cfg(test)]
mod json_tests {
    use super::*;

    #[test]
    fn json_metabolite() {
        let data = r#"{
"id":"glc__D_e",
"name":"D-Glucose",
"compartment":"e",
"charge":0,
"formula":"C6H12O6",
"notes":{
"original_bigg_ids":[
"glc_D_e"
]
},
"annotation":{
"bigg.metabolite":[
"glc__D"
],
"kegg.compound":[
"C00031"
],
"sbo":"SBO:0000247"
}
}"#;
        let met: JsonMetabolite = serde_json::from_str(data).unwrap();
        assert_eq!(met.id, "glc__D_e");
        assert_eq!(met.formula.as_deref(), Some("C6H12O6"));
        let model_met = Metabolite::from(met);
        assert_eq!(model_met.name.as_deref(), Some("D-Glucose"));
        assert_eq!(model_met.compartment.as_deref(), Some("e"));
        assert_eq!(model_met.charge, 0);
        assert_eq!(model_met.carbon_count(), 6);
        assert!(model_met.annotation.unwrap().contains("C00031"));
    }

    #[test]
    fn json_reaction() {
        let data = r#"{
"id":"PFK",
"name":"Phosphofructokinase",
"metabolites":{
"adp_c":1.0,
"atp_c":-1.0,
"f6p_c":-1.0,
"fdp_c":1.0,
"h_c":1.0
},
"lower_bound":0.0,
"upper_bound":1000.0,
"gene_reaction_rule":"b3916 or b1723",
"subsystem":"Glycolysis/Gluconeogenesis"
}"#;
        let reaction: JsonReaction = serde_json::from_str(data).unwrap();
        assert_eq!(reaction.id, "PFK");
        assert_eq!(reaction.metabolites.len(), 5);
        assert_eq!(reaction.metabolites["atp_c"], -1.0);
        assert_eq!(reaction.upper_bound, 1000.0);
        assert_eq!(reaction.gene_reaction_rule, "b3916 or b1723");
        assert!(reaction.objective_coefficient.is_none());
    }

    #[test]
    fn json_gene() {
        let data = r#"{"id":"b1241","name":"adhE","notes":{"original_bigg_ids":["b1241"]}}"#;
        let gene = Gene::from(serde_json::from_str::<JsonGene>(data).unwrap());
        assert_eq!(gene.id, "b1241");
        assert_eq!(gene.name.as_deref(), Some("adhE"));
        let back = JsonGene::from(gene);
        assert_eq!(back.notes.unwrap()["original_bigg_ids"][0], "b1241");
    }

    #[test]
    fn parse_failures() {
        assert!(matches!(
            Model::from_json_str("{not json"),
            Err(JsonError::UnableToParse(_))
        ));
        assert!(matches!(
            Model::read_json("/this/path/does/not/exist.json"),
            Err(JsonError::UnableToRead(_))
        ));
    }

    #[test]
    fn write_and_read_back() {
        let model = crate::test_models::create_test_model("mini").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mini.json");
        model.write_json(&path).unwrap();
        let read = Model::read_json(&path).unwrap();

        assert_eq!(read.id, model.id);
        assert_eq!(read.compartments, model.compartments);
        assert_eq!(read.objective, model.objective);
        assert_eq!(
            read.reactions.keys().collect::<Vec<_>>(),
            model.reactions.keys().collect::<Vec<_>>()
        );
        let ex = read.get_reaction("EX_a").unwrap();
        assert_eq!(ex.lower_bound, -10.);
        assert_eq!(ex.metabolites["a_e"], -1.);
        assert_eq!(read.metabolites["a_c"].formula.as_deref(), Some("C6H12O6"));
    }
}

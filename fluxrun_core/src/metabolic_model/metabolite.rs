//! This module provides the metabolite struct representing a metabolite

use std::hash::Hash;

use derive_builder::Builder;
use indexmap::IndexMap;

/// Represents a metabolite
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Metabolite {
    /// Used to identify the metabolite (must be unique)
    #[builder(setter(into))]
    pub id: String,
    /// Human Readable name of the metabolite
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Which compartment the metabolite is in
    #[builder(default = "None")]
    pub compartment: Option<String>,
    /// Electrical charge of the Metabolite
    #[builder(default = "0")]
    pub charge: i32,
    /// Chemical Formula of the metabolite
    #[builder(default = "None")]
    pub formula: Option<String>,
    /// Notes about the metabolite
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Metabolite annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
}

impl Metabolite {
    /// Count of each element in the chemical formula
    ///
    /// Elements are an uppercase letter optionally followed by lowercase letters, with an
    /// optional count (default 1). Anything else in the formula, such as an `R` group
    /// marker followed by a digit or a charge suffix, ends parsing at that point. So does a
    /// count that does not fit in a `u32`, alone or added to the element's earlier counts.
    ///
    /// # Examples
    /// ```rust
    /// use fluxrun_core::metabolic_model::metabolite::MetaboliteBuilder;
    /// let glucose = MetaboliteBuilder::default()
    ///     .id("glc__D_e")
    ///     .formula(Some("C6H12O6".to_string()))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(glucose.elements()["C"], 6);
    /// assert_eq!(glucose.carbon_count(), 6);
    /// ```
    pub fn elements(&self) -> IndexMap<String, u32> {
        let mut elements = IndexMap::new();
        let formula = match &self.formula {
            Some(formula) => formula.as_str(),
            None => return elements,
        };
        let mut chars = formula.chars().peekable();
        while let Some(c) = chars.next() {
            if !c.is_ascii_uppercase() {
                break;
            }
            let mut symbol = c.to_string();
            while let Some(&lower) = chars.peek() {
                if !lower.is_ascii_lowercase() {
                    break;
                }
                symbol.push(lower);
                chars.next();
            }
            let mut digits = String::new();
            while let Some(&digit) = chars.peek() {
                if !digit.is_ascii_digit() {
                    break;
                }
                digits.push(digit);
                chars.next();
            }
            let count = if digits.is_empty() {
                1
            } else {
                match digits.parse::<u32>() {
                    Ok(count) => count,
                    Err(_) => break,
                }
            };
            let total = elements.entry(symbol).or_insert(0u32);
            match total.checked_add(count) {
                Some(sum) => *total = sum,
                None => break,
            }
        }
        elements
    }

    /// Number of carbon atoms in the metabolite, zero if it has no formula
    pub fn carbon_count(&self) -> u32 {
        self.elements().get("C").copied().unwrap_or(0)
    }
}

impl Hash for Metabolite {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        // If the metabolite has an associated compartment, also hash by that
        if let Some(ref compartment) = self.compartment {
            compartment.hash(state)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_formula(formula: Option<&str>) -> Metabolite {
        MetaboliteBuilder::default()
            .id("m")
            .formula(formula.map(|f| f.to_string()))
            .build()
            .unwrap()
    }

    #[test]
    fn parse_formula() {
        let acetyl_coa = with_formula(Some("C23H34N7O17P3S"));
        let elements = acetyl_coa.elements();
        assert_eq!(elements["C"], 23);
        assert_eq!(elements["N"], 7);
        assert_eq!(elements["S"], 1);
        assert_eq!(acetyl_coa.carbon_count(), 23);
    }

    #[test]
    fn two_letter_elements() {
        let chloride = with_formula(Some("CoCl2"));
        let elements = chloride.elements();
        assert_eq!(elements["Co"], 1);
        assert_eq!(elements["Cl"], 2);
        assert_eq!(chloride.carbon_count(), 0);
    }

    #[test]
    fn missing_formula() {
        assert!(with_formula(None).elements().is_empty());
        assert_eq!(with_formula(Some("H")).carbon_count(), 0);
    }

    #[test]
    fn oversized_counts_end_parsing() {
        // Too large for a count at all
        let huge = with_formula(Some("H2C99999999999O6"));
        assert_eq!(huge.elements()["H"], 2);
        assert_eq!(huge.carbon_count(), 0);
        assert!(!huge.elements().contains_key("O"));

        // Each count fits but their sum does not
        let repeated = with_formula(Some("C4294967295C1N"));
        assert_eq!(repeated.carbon_count(), u32::MAX);
        assert!(!repeated.elements().contains_key("N"));
    }
}

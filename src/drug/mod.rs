//! Drug information as it travels over the wire and as it is displayed.
//!
//! The server is free to leave optional fields out. Everything is funnelled
//! through [`RawDrugInfo::normalize`] exactly once, at the response boundary,
//! so the rendering layer only ever sees a fully populated [`DrugInfo`].

use serde::{Deserialize, Serialize};

/// Shown for quantity, dosage and source when the server omits them
pub const PLACEHOLDER: &str = "N/A";

/// Shown when a body decodes but carries nothing we know how to display
pub const UNEXPECTED_RESPONSE: &str = "Unexpected response from the server.";

/// Request body sent to the `/ask` endpoint
#[derive(Debug, Clone, Serialize)]
pub struct AskRequest<'a> {
    pub question: &'a str,
}

/// Response body from the `/ask` endpoint, exactly as the server sent it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskResponse {
    pub error: Option<String>,
    pub brand: Option<RawDrugField>,
    pub generic: Option<RawDrugField>,
    pub alternatives: Option<Vec<RawDrugField>>,
    /// Free-text answer from servers that reply in prose
    pub answer: Option<String>,
}

/// Some servers send `"brand": "Tylenol"` instead of a full object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDrugField {
    Name(String),
    Info(RawDrugInfo),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDrugInfo {
    pub name: String,
    pub price: Option<f64>,
    pub quantity: Option<String>,
    pub dosage: Option<String>,
    pub description: Option<String>,
    pub source: Option<String>,
    pub retailer: Option<RawRetailer>,
    pub side_effects: Option<Vec<RawSideEffect>>,
    pub company: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRetailer {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSideEffect {
    pub name: String,
    pub severity: Option<String>,
}

/// A medication record with every display field filled in
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugInfo {
    pub name: String,
    pub price: f64,
    pub quantity: String,
    pub dosage: String,
    /// Empty when the server sent none; cards skip it
    pub description: String,
    pub source: String,
    pub retailer: Option<Retailer>,
    pub side_effects: Vec<SideEffect>,
    pub company: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Retailer {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideEffect {
    pub name: String,
    pub severity: String,
}

/// Brand drug plus whatever cheaper options the server found
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrugBundle {
    pub brand: DrugInfo,
    pub generic: Option<DrugInfo>,
    pub alternatives: Vec<DrugInfo>,
}

/// What one submitted question ended in
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Outcome {
    Bundle(DrugBundle),
    Answer(String),
    Error(String),
}

impl Outcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }
}

/// Trimmed value, or None if missing or blank
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl RawDrugInfo {
    /// Fill every optional field with its display default
    pub fn normalize(self) -> DrugInfo {
        let placeholder = || PLACEHOLDER.to_string();

        DrugInfo {
            name: self.name.trim().to_string(),
            price: self.price.filter(|p| p.is_finite()).unwrap_or(0.0),
            quantity: present(self.quantity).unwrap_or_else(placeholder),
            dosage: present(self.dosage).unwrap_or_else(placeholder),
            description: present(self.description).unwrap_or_default(),
            source: present(self.source).unwrap_or_else(placeholder),
            retailer: self.retailer.and_then(|r| {
                present(Some(r.name)).map(|name| Retailer {
                    name,
                    url: present(r.url),
                })
            }),
            side_effects: self
                .side_effects
                .unwrap_or_default()
                .into_iter()
                .map(|se| SideEffect {
                    name: se.name.trim().to_string(),
                    severity: present(se.severity).unwrap_or_else(placeholder),
                })
                .collect(),
            company: present(self.company),
        }
    }
}

impl RawDrugField {
    pub fn normalize(self) -> DrugInfo {
        match self {
            RawDrugField::Name(name) => RawDrugInfo {
                name,
                ..RawDrugInfo::default()
            }
            .normalize(),
            RawDrugField::Info(info) => info.normalize(),
        }
    }
}

impl AskResponse {
    /// Decide what to show: `error` wins over `brand`, which wins over `answer`
    pub fn into_outcome(self) -> Outcome {
        if let Some(error) = self.error {
            return Outcome::Error(error);
        }

        if let Some(brand) = self.brand {
            return Outcome::Bundle(DrugBundle {
                brand: brand.normalize(),
                generic: self.generic.map(RawDrugField::normalize),
                alternatives: self
                    .alternatives
                    .unwrap_or_default()
                    .into_iter()
                    .map(RawDrugField::normalize)
                    .collect(),
            });
        }

        match present(self.answer) {
            Some(answer) => Outcome::Answer(answer),
            None => Outcome::Error(UNEXPECTED_RESPONSE.to_string()),
        }
    }
}

use crate::error::Result;
use crate::style::ComputedStyle;
use serde::{Deserialize, Serialize};

/// One element of a document: its tag, its text content and its resolved style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSample {
    pub tag: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub style: ComputedStyle,
}

impl ElementSample {
    pub fn new(tag: impl Into<String>, text: impl Into<String>, style: ComputedStyle) -> Self {
        Self {
            tag: tag.into(),
            text: text.into(),
            style,
        }
    }
}

/// Every element of a page in document order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub elements: Vec<ElementSample>,
}

impl PageSnapshot {
    pub fn new(url: Option<String>) -> Self {
        Self {
            url,
            elements: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

use serde::{Deserialize, Serialize};

/// Target geometry of the control-code image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsmConfig {
    pub page_size: u32, // bytes per page, TEXT + DATA
    pub columns: u8,    // uC groups addressable by .attach_to_group
    pub max_pages: u32, // per column
}

impl Default for AsmConfig {
    fn default() -> Self {
        Self {
            page_size: 8192,
            columns: 4,
            max_pages: 256,
        }
    }
}

impl AsmConfig {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

use serde::{Deserialize, Serialize};

use crate::var_or;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct UiConfig {
    /// Copy every found payload to the clipboard
    pub auto_copy: bool,
    /// Open payloads that look like links in the browser
    pub open_links: bool,
}

impl UiConfig {
    pub(crate) fn from_vars(get: &impl Fn(&str) -> Option<String>) -> Self {
        Self {
            auto_copy: var_or(get, "AUTO_COPY", false),
            open_links: var_or(get, "OPEN_LINKS", false),
        }
    }
}

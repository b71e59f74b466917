use serde::{Deserialize, Serialize};

/// Per-client settings, normalized at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub modules: Vec<ModuleInfo>,
    #[serde(default = "default_enable_visualizations")]
    pub enable_visualizations: bool,
}

fn default_enable_visualizations() -> bool {
    true
}

impl ClientConfig {
    pub fn fallback(client: &str) -> Self {
        Self {
            client_name: client.to_string(),
            modules: Vec::new(),
            enable_visualizations: true,
        }
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawModule")]
pub struct ModuleInfo {
    pub name: String,
    pub description: Option<String>,
    /// Follow-up questions offered while deep-diving into this module.
    pub suggestions: Vec<String>,
}

impl ModuleInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            suggestions: Vec::new(),
        }
    }
}

// Config files list modules either as bare names or as records.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawModule {
    Name(String),
    Record {
        #[serde(default)]
        name: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        suggestions: Vec<String>,
    },
}

impl From<RawModule> for ModuleInfo {
    fn from(raw: RawModule) -> Self {
        match raw {
            RawModule::Name(name) => Self::named(name),
            RawModule::Record {
                name,
                description,
                suggestions,
            } => Self {
                name,
                description,
                suggestions,
            },
        }
    }
}

#![deny(missing_docs)]

//! # Project Configuration
//!
//! Describes which files of a generated project receive declarations when a
//! resource kind is added. Loaded from `weld.yaml`; every string is a template
//! expanded per kind (see [`ResourceKind::expand`]).
//!
//! ```yaml
//! layers:
//!   - name: repository
//!     file: src/repository/mod.rs
//!     interface: Repository
//!     struct: PgRepository
//!     returns: "{Kind}Repository"
//!     constructor: "{Kind}Repository::new(self.pool.clone())"
//!     import: "crate::repository::{kind}::{Kind}Repository"
//! schema:
//!   file: proto/api.proto
//!   service: ApiService
//!   imports: ["{kind}.proto"]
//! ```

use crate::error::{AppError, AppResult};
use crate::naming::ResourceKind;
use crate::patcher::{ImportSpec, TargetSpec};
use crate::schema::SchemaOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the project root.
pub const CONFIG_FILE: &str = "weld.yaml";

/// Conventions for one generated layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerConfig {
    /// Layer name, used to select layers on the command line.
    pub name: String,
    /// File edited for this layer, relative to the project root.
    pub file: String,
    /// Trait receiving the signature.
    pub interface: String,
    /// Struct receiving the factory method.
    #[serde(rename = "struct")]
    pub struct_name: String,
    /// Method name.
    #[serde(default = "default_method")]
    pub method: String,
    /// Return type of signature and factory.
    pub returns: String,
    /// Factory body expression.
    pub constructor: String,
    /// Doc comment for the new signature.
    #[serde(default)]
    pub doc: Option<String>,
    /// Path the factory needs in scope.
    #[serde(default)]
    pub import: Option<String>,
    /// Alias for `import`.
    #[serde(default)]
    pub alias: Option<String>,
}

/// Conventions for the schema service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    /// Schema file, relative to the project root.
    pub file: String,
    /// Service block receiving the methods.
    pub service: String,
    /// Imports the service needs for a kind.
    #[serde(default)]
    pub imports: Vec<String>,
    /// Indentation for an empty service block.
    #[serde(default = "default_indent")]
    pub indent: String,
    /// Suffix appended to the schema file name for its backup.
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,
}

/// The whole `weld.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Typed-source layers, applied in order.
    #[serde(default = "default_layers")]
    pub layers: Vec<LayerConfig>,
    /// Schema service, if the project has one.
    #[serde(default = "default_schema")]
    pub schema: Option<SchemaConfig>,
}

fn default_method() -> String {
    "{kind}".to_string()
}

fn default_indent() -> String {
    SchemaOptions::default().default_indent
}

fn default_backup_suffix() -> String {
    ".bak".to_string()
}

fn layer(name: &str, interface: &str, struct_name: &str, constructor: &str) -> LayerConfig {
    let title = {
        let mut chars = name.chars();
        chars
            .next()
            .map(|c| c.to_ascii_uppercase().to_string() + chars.as_str())
            .unwrap_or_default()
    };
    LayerConfig {
        name: name.to_string(),
        file: format!("src/{}/mod.rs", name),
        interface: interface.to_string(),
        struct_name: struct_name.to_string(),
        method: default_method(),
        returns: format!("{{Kind}}{}", title),
        constructor: constructor.to_string(),
        doc: Some(format!("Returns the {{kind}} {}.", name)),
        import: Some(format!("crate::{}::{{kind}}::{{Kind}}{}", name, title)),
        alias: None,
    }
}

fn default_layers() -> Vec<LayerConfig> {
    vec![
        layer(
            "repository",
            "Repository",
            "PgRepository",
            "{Kind}Repository::new(self.pool.clone())",
        ),
        layer(
            "service",
            "Service",
            "ServiceImpl",
            "{Kind}Service::new(self.repository.{kind}())",
        ),
        layer(
            "handler",
            "Handler",
            "Handlers",
            "{Kind}Handler::new(self.service.{kind}())",
        ),
    ]
}

fn default_schema() -> Option<SchemaConfig> {
    Some(SchemaConfig {
        file: "proto/api.proto".to_string(),
        service: "ApiService".to_string(),
        imports: vec!["{kind}.proto".to_string()],
        indent: default_indent(),
        backup_suffix: default_backup_suffix(),
    })
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            layers: default_layers(),
            schema: default_schema(),
        }
    }
}

impl ProjectConfig {
    /// Parses a YAML document.
    pub fn from_yaml(text: &str) -> AppResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Loads a configuration file.
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| AppError::Io(e).in_file(path))?;
        Self::from_yaml(&text).map_err(|e| e.in_file(path))
    }

    /// Loads `explicit` if given, else `root/weld.yaml` if present, else defaults.
    pub fn discover(root: &Path, explicit: Option<&Path>) -> AppResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = root.join(CONFIG_FILE);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "loading project config");
            Self::load(&candidate)
        } else {
            tracing::debug!("no project config; using built-in layers");
            Ok(Self::default())
        }
    }

    /// Layers whose name is in `names`, or all layers when `names` is empty.
    ///
    /// Unknown names are an error.
    pub fn select_layers(&self, names: &[String]) -> AppResult<Vec<&LayerConfig>> {
        if names.is_empty() {
            return Ok(self.layers.iter().collect());
        }
        names
            .iter()
            .map(|name| {
                self.layers
                    .iter()
                    .find(|layer| &layer.name == name)
                    .ok_or_else(|| AppError::Config(format!("Unknown layer '{}'", name)))
            })
            .collect()
    }
}

impl LayerConfig {
    /// The file this layer edits for `kind`.
    pub fn path(&self, root: &Path, kind: &ResourceKind) -> PathBuf {
        root.join(kind.expand(&self.file))
    }

    /// The injection request for `kind`.
    pub fn target(&self, kind: &ResourceKind) -> TargetSpec {
        TargetSpec {
            interface_name: kind.expand(&self.interface),
            struct_name: kind.expand(&self.struct_name),
            method_name: kind.expand(&self.method),
            return_type: kind.expand(&self.returns),
            doc_comment: self.doc.as_deref().map(|doc| kind.expand(doc)),
            constructor: kind.expand(&self.constructor),
            import: self.import.as_deref().map(|path| {
                let spec = ImportSpec::new(kind.expand(path));
                match self.alias.as_deref() {
                    Some(alias) => spec.with_alias(kind.expand(alias)),
                    None => spec,
                }
            }),
        }
    }
}

impl SchemaConfig {
    /// The schema file for `kind`.
    pub fn path(&self, root: &Path, kind: &ResourceKind) -> PathBuf {
        root.join(kind.expand(&self.file))
    }

    /// The service name for `kind`.
    pub fn service(&self, kind: &ResourceKind) -> String {
        kind.expand(&self.service)
    }

    /// Augmentation options for `kind`.
    pub fn options(&self, kind: &ResourceKind) -> SchemaOptions {
        SchemaOptions {
            default_indent: self.indent.clone(),
            imports: self.imports.iter().map(|i| kind.expand(i)).collect(),
        }
    }
}

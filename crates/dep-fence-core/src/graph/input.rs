//! JSON graph input (DTO layer).
//!
//! The accepted shape follows the module list produced by import-graph
//! tools such as dependency-cruiser:
//!
//! ```json
//! {
//!   "modules": [
//!     {
//!       "source": "src/services/user.ts",
//!       "dependencies": [{ "resolved": "src/repositories/user.ts" }]
//!     },
//!     { "source": "src/repositories/user.ts", "dependencies": [] },
//!     { "source": "node_modules/zod/index.js", "external": true }
//!   ]
//! }
//! ```
//!
//! Unknown fields are ignored so full cruise results can be passed through.

use serde::Deserialize;

use super::{DependencyGraph, GraphBuilder, GraphError, Module};

/// Raw JSON representation of a dependency graph.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphDto {
    /// All modules, each with its outgoing dependencies.
    #[serde(default)]
    pub modules: Vec<ModuleDto>,
}

/// Raw JSON representation of a module.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleDto {
    /// Module path.
    pub source: String,
    /// Outgoing dependencies.
    #[serde(default)]
    pub dependencies: Vec<DependencyDto>,
    /// Third-party or core-library module.
    #[serde(default, alias = "coreModule")]
    pub external: bool,
    /// Package boundary name.
    #[serde(default)]
    pub package: Option<String>,
}

/// Raw JSON representation of one dependency.
#[derive(Debug, Clone, Deserialize)]
pub struct DependencyDto {
    /// Resolved path of the depended-upon module.
    pub resolved: String,
}

impl GraphDto {
    /// Converts the DTO into a validated graph.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if a dependency points at a module that is
    /// not listed, or a module is listed twice.
    pub fn into_graph(self) -> Result<DependencyGraph, GraphError> {
        let mut builder = GraphBuilder::new();
        let mut edges = Vec::new();

        for dto in self.modules {
            let mut module = Module::new(dto.source).external(dto.external);
            if let Some(package) = dto.package {
                module = module.with_package(package);
            }
            for dep in dto.dependencies {
                edges.push((module.path().to_string(), dep.resolved));
            }
            builder.add_module(module);
        }

        for (from, to) in edges {
            builder.add_edge(from, to);
        }
        builder.build()
    }
}

/// Parses a dependency graph from JSON text.
///
/// # Errors
///
/// Returns [`GraphError::Json`] for malformed JSON, or any validation
/// error from [`GraphBuilder::build`].
pub fn graph_from_json(content: &str) -> Result<DependencyGraph, GraphError> {
    let dto: GraphDto = serde_json::from_str(content)?;
    dto.into_graph()
}

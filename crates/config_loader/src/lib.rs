//! Loads a [`FeederBlueprint`] from TOML or JSON and runs the blueprint
//! rules over it, so callers only ever see a blueprint that can be run.
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("feeder.toml")).unwrap();
//! println!("dimensions: {:?}", blueprint.catalog.dimensions);
//! ```

mod parser;
mod rules;

pub use contracts::FeederBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, choosing the format from its extension.
    pub fn load_from_path(path: &Path) -> Result<FeederBlueprint, ContractError> {
        let format = ConfigFormat::detect(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Decodes and validates an in-memory blueprint.
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<FeederBlueprint, ContractError> {
        let blueprint = format.decode(content)?;
        rules::validate(&blueprint)?;
        Ok(blueprint)
    }

    pub fn to_toml(blueprint: &FeederBlueprint) -> Result<String, ContractError> {
        ConfigFormat::Toml.encode(blueprint)
    }

    pub fn to_json(blueprint: &FeederBlueprint) -> Result<String, ContractError> {
        ConfigFormat::Json.encode(blueprint)
    }
}

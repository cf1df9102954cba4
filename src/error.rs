//! Typed outcomes for operations that can fail without aborting the frame.
//!
//! Loader internals work with `anyhow::Result`; everything that crosses a
//! component boundary is converted into one of the enums below so callers can
//! check what did not complete.

use thiserror::Error;

use crate::resources::AssetId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssetError {
    #[error("no asset with id {0} is registered")]
    Unknown(AssetId),

    #[error("asset id {0} is registered twice")]
    Duplicate(AssetId),

    #[error("asset {id} failed to load: {reason}")]
    LoadFailed { id: AssetId, reason: String },

    #[error("request for asset {0} was abandoned before it completed")]
    Abandoned(AssetId),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse manifest: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u32 },

    #[error("no environment is configured")]
    NoEnvironments,

    #[error("no environment is flagged as default")]
    NoDefaultEnvironment,

    #[error("no environment named '{0}'")]
    UnknownEnvironmentName(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EntityError {
    #[error("entity {0} has no asset configured")]
    NoAsset(u32),

    #[error("entity {entity} does not wait for asset {asset}")]
    NotAwaiting { entity: u32, asset: AssetId },

    #[error("asset {0} is not loaded")]
    AssetUnavailable(AssetId),

    #[error("entity {0} has no instance")]
    NotInstanced(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ScaleError {
    #[error("scale factor {factor} (target {target_height} m / source {source_height} m) is not a finite positive number")]
    Invalid {
        factor: f32,
        target_height: f32,
        source_height: f32,
    },
}

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("environment {0} does not exist")]
    UnknownEnvironment(u32),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Asset(#[from] AssetError),
}

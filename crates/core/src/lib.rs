pub mod config;
pub mod directory;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod index;
pub mod normalize;
pub mod params;
pub mod profile;
pub mod rfm;
pub mod snapshot;

pub use config::{AppConfig, ConfigError, ConfigOverrides, EngineConfig, LoadOptions, LogFormat};
pub use directory::Directories;
pub use domain::matching::{
    ClientSnapshotEntry, MatchDetail, MatchRecord, ParamTag, Snapshot, SnapshotChunk,
};
pub use domain::profile::ClientProfile;
pub use domain::task::{DateRange, ParameterConfig, TaskDefinition};
pub use domain::transaction::{RawAmount, RawTransaction, Transaction};
pub use engine::{FocusEngine, TaskEvaluation};
pub use errors::{ApplicationError, DomainError, InterfaceError, TaskValidationError};
pub use index::{ClientAggregate, ClientIndex};
pub use rfm::{RfmScore, Segment};

//! Walks a SyncSketch account (projects → reviews → items → comments),
//! printing a catalogue per level and descending into the record whose
//! name matches the configured keyword.

pub mod collection;
pub mod config;
pub mod core;
pub mod prelude;
pub mod record;
pub mod syncsketch;
pub mod utils;

pub use collection::{Collection, CollectionKind};
pub use config::{Args, Config, ConfigError, Credentials};
pub use crate::core::{run, walk_tree, Trail, WalkError, WalkOptions};
pub use record::{Record, RecordId};
pub use syncsketch::{Listing, RemoteServiceError, ReviewApi, SyncSketchClient};

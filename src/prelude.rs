pub use anyhow::Result as AnyhowResult;

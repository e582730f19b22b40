pub mod cli;
pub mod config;
pub mod error;
pub mod expander;
pub mod parser;
pub mod schema;
pub mod store;
pub mod ui;
pub mod writer;

pub use cli::{Cli, Commands};
pub use error::{Error, Result};
pub use store::{CoreStore, EditSession, SearchKind};
pub use ui::{Phase, SilentUi, Tally, Ui, UiApp};

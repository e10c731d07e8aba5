pub mod cli;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod remote;

pub use config::{ApiConfig, Config, ControllerConfig};
pub use controller::{
    Command, ControllerDriver, ControllerSettings, ResponseOutcome, SearchController, UiEvent,
    ViewSnapshot,
};
pub use error::{LexError, Result};
pub use remote::{
    ApiQuery, FetchError, FetchErrorKind, HttpSearchProvider, Item, ResponseEnvelope,
    SearchProvider,
};

//! Query engine of a "launch anything" box: turns one line of typed text into
//! a ranked list of things to run, open, calculate or search for.

pub mod cancel;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod markup;
pub mod matcher;
pub mod model;
pub mod sources;
pub mod state;

pub use config::{Config, SearchPath};
pub use cancel::{CancelToken, Generation};
pub use dispatcher::{Dispatcher, RankPolicy};
pub use model::{Entry, EntryKind, EntryList, Rank};
pub use state::Session;

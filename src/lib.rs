// Library exports for testing and potential library use
//
// The tree is owned by `app::App`; controllers borrow it explicitly. There
// are no module-level singletons apart from the debug log sink.

/// Application version (root crate version, for use by sub-crates).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[macro_use]
pub mod debug;

pub mod app;
pub mod cli;
pub mod error;
pub mod navigation;
pub mod persistence;
pub mod selection;
pub mod transfer;
pub mod tree;
pub mod view;

pub use app::App;
pub use error::{NotesError, Result};

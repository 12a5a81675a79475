//! # Kitbash Core
//!
//! Snippet catalog runtime for Kitbash: live previews of markup/style/script
//! fragment triples, plus the store, browsing, and export operations around
//! them.
//!
//! ## Features
//! - Tolerant preview rendering onto an isolated surface with scoped styles
//! - Sandboxed Luau script execution with fault containment per instance
//! - Full-rebuild lifecycle: activate, refresh, teardown, never patch in place
//! - Synthetic event dispatch and a logical timer clock for headless drives
//! - File-backed snippet store with built-in factory contents
//!
//! ## Example: preview one snippet
//! ```ignore
//! use kitbash_core::{PreviewController, PreviewLimits};
//! use kitbash_core::snippet::FragmentSet;
//!
//! let fragments = FragmentSet::new(
//!     r#"<button class="btn">Go</button>"#,
//!     ".btn { color: white; }",
//!     "container.on('.btn', 'click', function() print('hit') end)",
//! );
//!
//! let mut preview = PreviewController::new(PreviewLimits::default());
//! let status = preview.activate(&fragments);
//! assert!(status.is_ok());
//! preview.dispatch("click", ".btn", None).unwrap();
//! println!("{}", preview.html().unwrap());
//! preview.teardown();
//! ```
//!
//! ## Example: many previews on one page
//! ```ignore
//! use kitbash_core::PreviewHub;
//!
//! let hub = PreviewHub::default();
//! hub.activate("card-1", &fragments_a);
//! hub.activate("card-2", &fragments_b);
//! hub.close("card-1");
//! ```

pub mod catalog;
pub mod config;
pub mod defaults;
pub mod error;
pub mod export;
pub mod hub;
pub mod preview;
pub mod script;
pub mod snippet;
pub mod store;

// --- Core types ---
pub use config::{AppConfig, PreviewLimits};
pub use error::{ConfigError, StoreError};
pub use export::FragmentKind;
pub use hub::PreviewHub;
pub use preview::{PreviewController, PreviewState, PreviewStatus};
pub use script::{Executor, ScriptDiagnostic, ScriptPhase};
pub use snippet::{Category, FragmentSet, Snippet, SnippetDraft};
pub use store::{FileMedium, KvMedium, MemoryMedium, SnippetStore};

// Re-exported so hosts can match on surface errors without a direct
// kitbash-dom dependency.
pub use kitbash_dom::{DomError, DomResult};

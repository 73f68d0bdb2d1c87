//! Source acquisition for the toolchain builds.
//!
//! Every component lives in its own directory under a single home. Git
//! components are cloned from a preferred mirror and refreshed with a
//! dry-run fetch; archive components carry a `.version` marker that is
//! compared against the version compiled in here.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod hook;
pub mod mirror;
pub mod options;
pub mod retry;
pub mod system;
pub mod version;

pub use catalog::{component, SourceComponent, GIT_COMPONENTS, OPTIONAL_ARCHIVES, REQUIRED_ARCHIVES};
pub use engine::SourceEngine;
pub use error::{Result, SourceError};
pub use hook::PostFetch;
pub use mirror::{GitUrl, Mirror};
pub use options::{default_home, AcquireOptions, CloneStrategy};
pub use retry::with_retry;
pub use version::Freshness;

//! Emulation engine seam
//!
//! The harness never interprets pages itself. An [`Engine`] takes a generated
//! page and returns the ordered strings it emitted (one per alert-style
//! diagnostic call). Enumerating members, classifying callables and sorting
//! are the engine's job; the harness treats the sequence as opaque.

mod command;
mod replay;

pub use command::CommandEngine;
pub use replay::ReplayEngine;

use async_trait::async_trait;

use crate::common::Result;

/// Everything an engine needs to run one page
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    /// Test case identifier
    pub test: &'a str,
    /// Profile the engine should emulate
    pub profile: &'a str,
    /// Page markup
    pub html: &'a str,
}

/// An emulation engine that can run a page
#[async_trait]
pub trait Engine: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Run a page and return the emitted strings in emission order
    async fn run_page(&self, request: PageRequest<'_>) -> Result<Vec<String>>;
}

//! Vero language server.
//!
//! Keeps an [`document::EditorSession`] per connection: open buffers, the
//! workspace symbol registry and the active `vero.toml` settings. Serves
//! diagnostics, navigation, hover, outline, folding and semantic tokens.
//! Connects to editors via the `vero lsp` CLI subcommand over stdio.

pub mod config;
pub mod diagnostics;
pub mod document;
pub mod folding;
pub mod hover;
pub mod navigation;
pub mod position;
pub mod semantic_tokens;
pub mod server;
pub mod workspace;

/// Run the LSP server over stdio. This is the public entry point
/// called by `vero lsp`.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    server::run()
}

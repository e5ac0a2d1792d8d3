//! LSP server main loop with request/notification dispatch.
//!
//! Uses `lsp-server` (synchronous, crossbeam-based) for the transport.
//! One [`EditorSession`] per connection holds every piece of state.

use lsp_server::{Connection, Message, Notification, Response};
use lsp_types::notification::{
    DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument, DidSaveTextDocument,
    Notification as _, PublishDiagnostics,
};
use lsp_types::request::{
    DocumentSymbolRequest, FoldingRangeRequest, GotoDefinition, HoverRequest, References,
    SemanticTokensFullRequest,
};
use lsp_types::{
    DocumentSymbolResponse, FoldingRangeProviderCapability, GotoDefinitionResponse,
    HoverProviderCapability, OneOf, PublishDiagnosticsParams, SaveOptions, SemanticTokens,
    SemanticTokensFullOptions, SemanticTokensLegend, SemanticTokensOptions, SemanticTokensResult,
    ServerCapabilities, TextDocumentSyncCapability, TextDocumentSyncKind, TextDocumentSyncOptions,
    TextDocumentSyncSaveOptions, Uri,
};
use std::path::{Path, PathBuf};

use crate::config::{self, VeroConfig, CONFIG_FILE_NAME};
use crate::diagnostics;
use crate::document::EditorSession;
use crate::folding;
use crate::hover;
use crate::navigation::{self, uri_to_path};
use crate::semantic_tokens;

/// Run the LSP server over stdio until shutdown.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (connection, io_threads) = Connection::stdio();

    // ── Initialize handshake ──────────────────────────────────────────
    let server_capabilities = build_capabilities();
    let init_json = serde_json::to_value(&server_capabilities)?;
    let init_params: lsp_types::InitializeParams =
        serde_json::from_value(connection.initialize(init_json)?)?;

    // ── Index the workspace ───────────────────────────────────────────
    let mut workspace_root = extract_workspace_root(&init_params);
    let mut session = EditorSession::default();
    if let Some(root) = &workspace_root {
        load_workspace(&mut session, root);
    }

    // ── Main loop ─────────────────────────────────────────────────────
    for msg in &connection.receiver {
        match msg {
            Message::Request(req) => {
                if connection.handle_shutdown(&req)? {
                    break;
                }
                handle_request(&connection, &session, req)?;
            }
            Message::Notification(not) => {
                handle_notification(&connection, &mut session, &mut workspace_root, not)?;
            }
            Message::Response(_) => {}
        }
    }

    io_threads.join()?;
    tracing::info!("language server stopped");
    Ok(())
}

/// Read `vero.toml` under `root` and index every script below it. A broken
/// config falls back to defaults so the editor keeps working.
fn load_workspace(session: &mut EditorSession, root: &Path) {
    let config = config::discover(root).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "using default configuration");
        VeroConfig::default()
    });
    session.set_config(config);
    if let Err(e) = session.index_workspace(root) {
        tracing::warn!(error = %e, "workspace indexing failed");
    }
}

/// Extract workspace root path from InitializeParams.
#[allow(deprecated)] // root_path/root_uri are deprecated but still sent by some clients
fn extract_workspace_root(params: &lsp_types::InitializeParams) -> Option<PathBuf> {
    if let Some(folder) = params.workspace_folders.as_ref().and_then(|f| f.first()) {
        return Some(uri_to_path(&folder.uri));
    }
    if let Some(root_uri) = &params.root_uri {
        return Some(uri_to_path(root_uri));
    }
    params
        .root_path
        .as_ref()
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

fn build_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                    include_text: Some(false),
                })),
                ..Default::default()
            },
        )),
        semantic_tokens_provider: Some(
            lsp_types::SemanticTokensServerCapabilities::SemanticTokensOptions(
                SemanticTokensOptions {
                    full: Some(SemanticTokensFullOptions::Delta { delta: Some(false) }),
                    legend: SemanticTokensLegend {
                        token_types: semantic_tokens::TOKEN_TYPES.to_vec(),
                        token_modifiers: semantic_tokens::TOKEN_MODIFIERS.to_vec(),
                    },
                    ..Default::default()
                },
            ),
        ),
        definition_provider: Some(OneOf::Left(true)),
        references_provider: Some(OneOf::Left(true)),
        document_symbol_provider: Some(OneOf::Left(true)),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
        ..Default::default()
    }
}

fn handle_request(
    connection: &Connection,
    session: &EditorSession,
    req: lsp_server::Request,
) -> Result<(), Box<dyn std::error::Error>> {
    use lsp_types::request::Request as _;
    tracing::debug!(method = %req.method, "request");

    let result = if req.method == SemanticTokensFullRequest::METHOD {
        let params: lsp_types::SemanticTokensParams = serde_json::from_value(req.params)?;
        let content = document_content(session, &params.text_document.uri);
        let data = semantic_tokens::compute_semantic_tokens(&content, Some(session.registry()));
        serde_json::to_value(SemanticTokensResult::Tokens(SemanticTokens {
            result_id: None,
            data,
        }))?
    } else if req.method == GotoDefinition::METHOD {
        let params: lsp_types::GotoDefinitionParams = serde_json::from_value(req.params)?;
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let content = document_content(session, uri);
        let result = navigation::goto_definition(session, &uri_to_path(uri), position, &content)
            .map(GotoDefinitionResponse::Scalar);
        serde_json::to_value(result)?
    } else if req.method == References::METHOD {
        let params: lsp_types::ReferenceParams = serde_json::from_value(req.params)?;
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let content = document_content(session, uri);
        let refs = navigation::find_references(
            session,
            &uri_to_path(uri),
            position,
            &content,
            params.context.include_declaration,
        );
        let result: Option<Vec<lsp_types::Location>> =
            if refs.is_empty() { None } else { Some(refs) };
        serde_json::to_value(result)?
    } else if req.method == DocumentSymbolRequest::METHOD {
        let params: lsp_types::DocumentSymbolParams = serde_json::from_value(req.params)?;
        let uri = &params.text_document.uri;
        let content = document_content(session, uri);
        let syms = navigation::document_symbols(session, &uri_to_path(uri), &content);
        let result: Option<DocumentSymbolResponse> = if syms.is_empty() {
            None
        } else {
            Some(DocumentSymbolResponse::Nested(syms))
        };
        serde_json::to_value(result)?
    } else if req.method == HoverRequest::METHOD {
        let params: lsp_types::HoverParams = serde_json::from_value(req.params)?;
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let content = document_content(session, uri);
        serde_json::to_value(hover::compute_hover(
            session,
            &uri_to_path(uri),
            position,
            &content,
        ))?
    } else if req.method == FoldingRangeRequest::METHOD {
        let params: lsp_types::FoldingRangeParams = serde_json::from_value(req.params)?;
        let content = document_content(session, &params.text_document.uri);
        serde_json::to_value(folding::compute_folding_ranges(&content))?
    } else {
        let resp = Response::new_err(
            req.id,
            lsp_server::ErrorCode::MethodNotFound as i32,
            format!("method not found: {}", req.method),
        );
        connection.sender.send(Message::Response(resp))?;
        return Ok(());
    };

    let resp = Response::new_ok(req.id, result);
    connection.sender.send(Message::Response(resp))?;
    Ok(())
}

/// Buffer content for open documents, disk content otherwise.
fn document_content(session: &EditorSession, uri: &Uri) -> String {
    session.content(uri.as_str(), &uri_to_path(uri))
}

fn handle_notification(
    connection: &Connection,
    session: &mut EditorSession,
    workspace_root: &mut Option<PathBuf>,
    not: Notification,
) -> Result<(), Box<dyn std::error::Error>> {
    match not.method.as_str() {
        m if m == DidOpenTextDocument::METHOD => {
            let params: lsp_types::DidOpenTextDocumentParams = serde_json::from_value(not.params)?;
            let uri = params.text_document.uri;
            let path = uri_to_path(&uri);
            session.open(
                uri.as_str(),
                path.clone(),
                params.text_document.version,
                params.text_document.text,
            );

            // Editors that send no root get one inferred from the first file.
            if workspace_root.is_none() {
                if let Some(root) = infer_workspace_root(&path) {
                    load_workspace(session, &root);
                    *workspace_root = Some(root);
                }
            }

            let diags = open_diagnostics(session, &uri);
            publish_diagnostics(connection, uri, diags)?;
        }
        m if m == DidChangeTextDocument::METHOD => {
            let params: lsp_types::DidChangeTextDocumentParams =
                serde_json::from_value(not.params)?;
            let uri = params.text_document.uri;
            // FULL sync: last content change has the entire document
            if let Some(change) = params.content_changes.into_iter().last() {
                session.change(uri.as_str(), params.text_document.version, change.text);
            }
            let diags = open_diagnostics(session, &uri);
            publish_diagnostics(connection, uri, diags)?;
        }
        m if m == DidSaveTextDocument::METHOD => {
            let params: lsp_types::DidSaveTextDocumentParams = serde_json::from_value(not.params)?;
            let uri = params.text_document.uri;
            let path = uri_to_path(&uri);
            if path.file_name().is_some_and(|n| n == CONFIG_FILE_NAME) {
                if let Some(root) = workspace_root.as_deref() {
                    load_workspace(session, root);
                }
                return Ok(());
            }
            if session.get(uri.as_str()).is_none() {
                session.saved(&path);
            }
            let diags = open_diagnostics(session, &uri);
            publish_diagnostics(connection, uri, diags)?;
        }
        m if m == DidCloseTextDocument::METHOD => {
            let params: lsp_types::DidCloseTextDocumentParams = serde_json::from_value(not.params)?;
            session.close(params.text_document.uri.as_str());
            publish_diagnostics(connection, params.text_document.uri, Vec::new())?;
        }
        other => tracing::trace!(method = other, "ignored notification"),
    }
    Ok(())
}

fn open_diagnostics(session: &EditorSession, uri: &Uri) -> Vec<lsp_types::Diagnostic> {
    let content = document_content(session, uri);
    diagnostics::compute_diagnostics(session, &content)
}

/// Send `textDocument/publishDiagnostics` notification to the client.
fn publish_diagnostics(
    connection: &Connection,
    uri: Uri,
    diagnostics: Vec<lsp_types::Diagnostic>,
) -> Result<(), Box<dyn std::error::Error>> {
    let params = PublishDiagnosticsParams {
        uri,
        diagnostics,
        version: None,
    };
    let not = Notification::new(PublishDiagnostics::METHOD.to_string(), params);
    connection.sender.send(Message::Notification(not))?;
    Ok(())
}

/// Walk up from a file looking for `vero.toml` or a VCS root, falling back
/// to the file's directory.
pub fn infer_workspace_root(file_path: &Path) -> Option<PathBuf> {
    let start = file_path.parent()?;
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE_NAME).exists() || dir.join(".git").exists())
        .unwrap_or(start)
        .to_path_buf()
        .into()
}

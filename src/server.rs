//! MCP server exposing document search as tools.

use crate::state::IndexState;
use crate::tools::{SearchRequest, handle_rebuild, handle_search};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars::{self, JsonSchema, generate::SchemaSettings},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

/// MCP server for markdown documentation search
#[derive(Clone)]
pub struct SearchServer {
    /// Shared index state (current index, cache, corpus location)
    state: Arc<IndexState>,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for SearchServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchServer")
            .field("state", &self.state)
            .finish()
    }
}

#[tool_router]
impl SearchServer {
    /// Create a new SearchServer over the given index state.
    pub fn new(state: Arc<IndexState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    /// Get a reference to the shared IndexState.
    pub fn state(&self) -> &Arc<IndexState> {
        &self.state
    }

    #[tool(
        description = "Search the markdown documentation corpus. Returns the best-matching files ranked by TF-IDF relevance, each with a content snippet. Optional filters match keyword fields such as 'filename' exactly.",
        input_schema = inline_schema_for_type::<SearchRequest>()
    )]
    async fn search_docs(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> std::result::Result<String, String> {
        handle_search(&self.state, request).await
    }

    #[tool(
        description = "Rebuild the search index from the documentation directory and refresh the on-disk cache. Use after the documentation files change."
    )]
    async fn rebuild_index(&self) -> std::result::Result<String, String> {
        handle_rebuild(&self.state).await
    }
}

#[tool_handler]
impl ServerHandler for SearchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(Implementation::from_build_env())
            .with_instructions(
                "mdsearch: full-text search over a local markdown documentation corpus. \
                 The index is built on first use and cached on disk. \
                 Use search_docs to query and rebuild_index after the documents change."
                    .to_string(),
            )
    }
}

/// Generate an inline JSON schema for MCP tools
///
/// Sets `inline_subschemas = true` so nested types (like the filter map) are
/// rendered inline instead of as `$ref` definitions.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    let object = serde_json::to_value(schema).expect("failed to serialize schema");

    let json_object = match object {
        serde_json::Value::Object(object) => object,
        _ => panic!("Schema serialization produced non-object value"),
    };

    Arc::new(json_object)
}

//! MCP server implementation

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData, ServerHandler as RmcpServerHandler, tool, tool_handler, tool_router};
use serde_json::{Map, Value};

use crate::cache::{CacheTtlConfig, Invalidation};
use crate::connection::ConnectionManager;
use crate::constants::{DATATABLE_LIST_PREFIXES, MAX_SEARCH_ASSETS_LIMIT};
use crate::guard::{ResponseSizeGuard, render};
use crate::helpers::CommandParams;
use crate::types::{
    BatchQueryParams, CacheStatsReport, ClearCacheParams, CurveTableParams, DataAssetParams,
    DataCatalogParams, DataTableRowParams, DataTableSchemaParams, ImportDataTableParams,
    ListDataAssetsParams, ListDataTablesParams, ListGameplayTagsParams, PathFilterParams,
    QueryDataTableParams, RegisterGameplayTagParams, RegisterGameplayTagsParams,
    ResolveTagsParams, SearchAssetsParams, SearchDataTableContentParams, SetTranslationParams,
    StructSchemaParams, TranslationsParams, UpdateCurveTableRowParams, UpdateDataAssetParams,
    ValidateGameplayTagParams, WriteDataTableRowParams,
};
use crate::Error;

type ToolResult = std::result::Result<CallToolResult, ErrorData>;

pub struct ServerHandler {
    connection: Arc<ConnectionManager>,
    size_guard: ResponseSizeGuard,
    ttl: CacheTtlConfig,
    tool_router: ToolRouter<Self>,
}

impl Clone for ServerHandler {
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
            size_guard: self.size_guard,
            ttl: self.ttl,
            tool_router: Self::tool_router(),
        }
    }
}

impl fmt::Debug for ServerHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerHandler")
            .field("connection", &self.connection.config().address())
            .field("size_guard", &self.size_guard)
            .field("ttl", &self.ttl)
            .field("tool_router", &"<ToolRouter>")
            .finish()
    }
}

fn text(body: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(body)])
}

impl ServerHandler {
    pub fn new(connection: Arc<ConnectionManager>, size_guard: ResponseSizeGuard) -> Self {
        let ttl = connection.cache_config().ttl;
        Self {
            connection,
            size_guard,
            ttl,
            tool_router: Self::tool_router(),
        }
    }

    pub fn connection(&self) -> &Arc<ConnectionManager> {
        &self.connection
    }

    /// Turn a command outcome into a tool result.
    ///
    /// Data passes through the size guard. Connection failures and bad
    /// arguments become error text the agent can act on; anything else
    /// (remote rejection, malformed response) is an MCP error.
    fn respond(&self, tool: &str, outcome: crate::Result<Map<String, Value>>) -> ToolResult {
        match outcome {
            Ok(data) => {
                tracing::debug!(tool, "Tool completed");
                Ok(text(self.size_guard.format(data, tool)))
            }
            Err(Error::MalformedInput(msg)) => {
                tracing::debug!(tool, error = %msg, "Rejected tool arguments");
                Ok(CallToolResult::error(vec![Content::text(format!("Error: {msg}"))]))
            }
            Err(e) if e.is_connection_error() => {
                tracing::warn!(tool, error = %e, "Unreal Editor unreachable");
                Ok(CallToolResult::error(vec![Content::text(format!("Error: {e}"))]))
            }
            Err(e) => {
                tracing::warn!(tool, error = %e, "Tool failed");
                Err(ErrorData::from(e))
            }
        }
    }

    async fn run(&self, command: &str, params: CommandParams) -> crate::Result<Map<String, Value>> {
        let params = params.into_map();
        Ok(self.connection.execute(command, Some(&params)).await?.data)
    }

    async fn run_cached(
        &self,
        command: &str,
        params: CommandParams,
        ttl: Duration,
    ) -> crate::Result<Map<String, Value>> {
        let params = params.into_map();
        self.connection
            .execute_cached(command, Some(&params), ttl)
            .await
    }

    /// Drop cached listings whose row counts a mutation may have changed
    async fn invalidate_datatable_listings(&self) {
        for prefix in DATATABLE_LIST_PREFIXES {
            self.connection
                .invalidate_cache(&Invalidation::prefix(*prefix))
                .await;
        }
    }

    /// Run a command whose params may have failed to parse, optionally
    /// invalidating DataTable listings once the editor accepted it
    async fn run_parsed(
        &self,
        command: &str,
        params: crate::Result<CommandParams>,
        invalidate_listings: bool,
    ) -> crate::Result<Map<String, Value>> {
        let data = self.run(command, params?).await?;
        if invalidate_listings {
            self.invalidate_datatable_listings().await;
        }
        Ok(data)
    }
}

#[tool_router]
impl ServerHandler {
    #[tool(
        description = "Check connection status to Unreal Editor and get plugin, engine and project info. Use this to verify the bridge works before calling other tools."
    )]
    async fn get_status(&self) -> ToolResult {
        match self.connection.execute("get_status", None).await {
            Ok(envelope) => Ok(text(self.size_guard.format(envelope.data, "get_status"))),
            Err(e) if e.is_connection_error() => {
                Ok(text(format!("Not connected to Unreal Editor: {e}")))
            }
            Err(e) => Err(ErrorData::from(e)),
        }
    }

    #[tool(
        description = "List DataTables loaded in the Unreal Editor with name, path, row struct and row count. Composite tables are flagged with is_composite and list their parent_tables; read from composites, write to source tables."
    )]
    async fn list_datatables(
        &self,
        Parameters(params): Parameters<ListDataTablesParams>,
    ) -> ToolResult {
        let command = CommandParams::new().with_non_empty("path_filter", &params.path_filter);
        let outcome = self.run_cached("list_datatables", command, self.ttl.list).await;
        self.respond("list_datatables", outcome)
    }

    #[tool(
        description = "Get the row struct schema of a DataTable: fields, types, enum values and nested structs. Call before reading or writing rows."
    )]
    async fn get_datatable_schema(
        &self,
        Parameters(params): Parameters<DataTableSchemaParams>,
    ) -> ToolResult {
        let command = CommandParams::new()
            .with("table_path", params.table_path)
            .with("include_inherited", params.include_inherited);
        let outcome = self
            .run_cached("get_datatable_schema", command, self.ttl.schema)
            .await;
        self.respond("get_datatable_schema", outcome)
    }

    #[tool(
        description = "Query DataTable rows with optional wildcard or exact-name filtering, field selection and pagination. Use 'fields' on tables with heavy nested structs to keep responses small."
    )]
    async fn query_datatable(
        &self,
        Parameters(params): Parameters<QueryDataTableParams>,
    ) -> ToolResult {
        let mut command = CommandParams::new()
            .with("table_path", params.table_path)
            .with("limit", params.limit)
            .with("offset", params.offset);
        command = if params.row_names.is_empty() {
            command.with_non_empty("row_name_pattern", &params.row_name_pattern)
        } else {
            command.with_list("row_names", &params.row_names)
        };
        let command = command.with_list("fields", &params.fields);

        let outcome = self.run("query_datatable", command).await;
        self.respond("query_datatable", outcome)
    }

    #[tool(description = "Get a single DataTable row by its row name")]
    async fn get_datatable_row(
        &self,
        Parameters(params): Parameters<DataTableRowParams>,
    ) -> ToolResult {
        let command = CommandParams::new()
            .with("table_path", params.table_path)
            .with("row_name", params.row_name);
        let outcome = self.run("get_datatable_row", command).await;
        self.respond("get_datatable_row", outcome)
    }

    #[tool(
        description = "Get the schema of any UStruct by name, optionally with known TInstancedStruct subtypes"
    )]
    async fn get_struct_schema(
        &self,
        Parameters(params): Parameters<StructSchemaParams>,
    ) -> ToolResult {
        let command = CommandParams::new()
            .with("struct_name", params.struct_name)
            .with("include_subtypes", params.include_subtypes);
        let outcome = self
            .run_cached("get_struct_schema", command, self.ttl.schema)
            .await;
        self.respond("get_struct_schema", outcome)
    }

    #[tool(
        description = "Add a new row to a non-composite DataTable. row_data is a JSON object; TInstancedStruct fields need '_struct_type'. Marks the table dirty (unsaved)."
    )]
    async fn add_datatable_row(
        &self,
        Parameters(params): Parameters<WriteDataTableRowParams>,
    ) -> ToolResult {
        let command = CommandParams::new()
            .with("table_path", params.table_path)
            .with("row_name", params.row_name)
            .with_json("row_data", &params.row_data);
        let outcome = self.run_parsed("add_datatable_row", command, true).await;
        self.respond("add_datatable_row", outcome)
    }

    #[tool(
        description = "Update fields of an existing DataTable row; only fields present in row_data change. Composite tables resolve to the owning source table."
    )]
    async fn update_datatable_row(
        &self,
        Parameters(params): Parameters<WriteDataTableRowParams>,
    ) -> ToolResult {
        let command = CommandParams::new()
            .with("table_path", params.table_path)
            .with("row_name", params.row_name)
            .with_json("row_data", &params.row_data);
        let outcome = self
            .run_parsed("update_datatable_row", command, false)
            .await;
        self.respond("update_datatable_row", outcome)
    }

    #[tool(
        description = "Delete a row from a DataTable. Composite tables resolve to the owning source table."
    )]
    async fn delete_datatable_row(
        &self,
        Parameters(params): Parameters<DataTableRowParams>,
    ) -> ToolResult {
        let command = CommandParams::new()
            .with("table_path", params.table_path)
            .with("row_name", params.row_name);
        let outcome = self
            .run_parsed("delete_datatable_row", Ok(command), true)
            .await;
        self.respond("delete_datatable_row", outcome)
    }

    #[tool(
        description = "Case-insensitive substring search inside DataTable string field values (FString, FName, FText), one nested level deep"
    )]
    async fn search_datatable_content(
        &self,
        Parameters(params): Parameters<SearchDataTableContentParams>,
    ) -> ToolResult {
        let command = CommandParams::new()
            .with("table_path", params.table_path)
            .with("search_text", params.search_text)
            .with("limit", params.limit)
            .with_list("fields", &params.fields)
            .with_list("preview_fields", &params.preview_fields);
        let outcome = self.run("search_datatable_content", command).await;
        self.respond("search_datatable_content", outcome)
    }

    #[tool(
        description = "Bulk import rows into a non-composite DataTable. rows is a JSON array of {row_name, row_data}. Modes: create, upsert, replace."
    )]
    async fn import_datatable_json(
        &self,
        Parameters(params): Parameters<ImportDataTableParams>,
    ) -> ToolResult {
        let dry_run = params.dry_run;
        let command = CommandParams::new()
            .with("table_path", params.table_path)
            .with_json("rows", &params.rows)
            .map(|c| c.with("mode", params.mode.as_str()).with("dry_run", dry_run));
        let outcome = self
            .run_parsed("import_datatable_json", command, !dry_run)
            .await;
        self.respond("import_datatable_json", outcome)
    }

    #[tool(
        description = "Execute up to 20 data commands in a single round-trip. commands is a JSON array of {command, params?}."
    )]
    async fn batch_query(&self, Parameters(params): Parameters<BatchQueryParams>) -> ToolResult {
        let command = CommandParams::new().with_json("commands", &params.commands);
        let outcome = self.run_parsed("batch", command, false).await;
        self.respond("batch_query", outcome)
    }

    #[tool(
        description = "Resolve GameplayTags to the DataTable rows whose tag field contains them"
    )]
    async fn resolve_tags(&self, Parameters(params): Parameters<ResolveTagsParams>) -> ToolResult {
        let command = CommandParams::new()
            .with("table_path", params.table_path)
            .with("tag_field", params.tag_field)
            .with("tags", crate::helpers::split_list(&params.tags))
            .with_list("fields", &params.fields);
        let outcome = self.run("resolve_tags", command).await;
        self.respond("resolve_tags", outcome)
    }

    #[tool(
        description = "Overview of the project's data: DataTables, DataAssets, CurveTables and StringTables with counts"
    )]
    async fn get_data_catalog(
        &self,
        Parameters(params): Parameters<DataCatalogParams>,
    ) -> ToolResult {
        let command = CommandParams::new().with_non_empty("path_filter", &params.path_filter);
        let outcome = self
            .run_cached("get_data_catalog", command, self.ttl.catalog)
            .await;
        self.respond("get_data_catalog", outcome)
    }

    #[tool(description = "List registered GameplayTags, optionally filtered by prefix")]
    async fn list_gameplay_tags(
        &self,
        Parameters(params): Parameters<ListGameplayTagsParams>,
    ) -> ToolResult {
        let command = CommandParams::new().with_non_empty("prefix", &params.prefix);
        let outcome = self.run("list_gameplay_tags", command).await;
        self.respond("list_gameplay_tags", outcome)
    }

    #[tool(description = "Check whether a GameplayTag is registered and valid")]
    async fn validate_gameplay_tag(
        &self,
        Parameters(params): Parameters<ValidateGameplayTagParams>,
    ) -> ToolResult {
        let command = CommandParams::new().with("tag", params.tag);
        let outcome = self.run("validate_gameplay_tag", command).await;
        self.respond("validate_gameplay_tag", outcome)
    }

    #[tool(
        description = "Register a new GameplayTag in a Config/Tags .ini file (explicit ini_file, plugin prefix mapping, or GameplayTags.ini)"
    )]
    async fn register_gameplay_tag(
        &self,
        Parameters(params): Parameters<RegisterGameplayTagParams>,
    ) -> ToolResult {
        let command = CommandParams::new()
            .with("tag", params.tag)
            .with_non_empty("ini_file", &params.ini_file)
            .with_non_empty("dev_comment", &params.dev_comment);
        let outcome = self.run("register_gameplay_tag", command).await;
        self.respond("register_gameplay_tag", outcome)
    }

    #[tool(
        description = "Register several GameplayTags. tags is a JSON array of {tag, ini_file?, dev_comment?}."
    )]
    async fn register_gameplay_tags(
        &self,
        Parameters(params): Parameters<RegisterGameplayTagsParams>,
    ) -> ToolResult {
        let command = CommandParams::new().with_json("tags", &params.tags);
        let outcome = self
            .run_parsed("register_gameplay_tags", command, false)
            .await;
        self.respond("register_gameplay_tags", outcome)
    }

    #[tool(description = "List loaded DataAssets with name, path and class")]
    async fn list_data_assets(
        &self,
        Parameters(params): Parameters<ListDataAssetsParams>,
    ) -> ToolResult {
        let command = CommandParams::new()
            .with_non_empty("class_filter", &params.class_filter)
            .with_non_empty("path_filter", &params.path_filter);
        let outcome = self
            .run_cached("list_data_assets", command, self.ttl.list)
            .await;
        self.respond("list_data_assets", outcome)
    }

    #[tool(description = "Read all properties of a DataAsset")]
    async fn get_data_asset(&self, Parameters(params): Parameters<DataAssetParams>) -> ToolResult {
        let command = CommandParams::new().with("asset_path", params.asset_path);
        let outcome = self.run("get_data_asset", command).await;
        self.respond("get_data_asset", outcome)
    }

    #[tool(
        description = "Update DataAsset properties from a JSON object; dry_run previews {field, old_value, new_value} changes without applying them"
    )]
    async fn update_data_asset(
        &self,
        Parameters(params): Parameters<UpdateDataAssetParams>,
    ) -> ToolResult {
        let command = CommandParams::new()
            .with("asset_path", params.asset_path)
            .with_json("properties", &params.properties)
            .map(|c| c.with("dry_run", params.dry_run));
        let outcome = self.run_parsed("update_data_asset", command, false).await;
        self.respond("update_data_asset", outcome)
    }

    #[tool(
        description = "Search the Asset Registry by name substring, class and path prefix (limit at most 500)"
    )]
    async fn search_assets(
        &self,
        Parameters(params): Parameters<SearchAssetsParams>,
    ) -> ToolResult {
        let command = CommandParams::new()
            .with("limit", params.limit.min(MAX_SEARCH_ASSETS_LIMIT))
            .with_non_empty("query", &params.query)
            .with_non_empty("class_filter", &params.class_filter)
            .with_non_empty("path_filter", &params.path_filter);
        let outcome = self
            .run_cached("search_assets", command, self.ttl.search)
            .await;
        self.respond("search_assets", outcome)
    }

    #[tool(description = "List loaded CurveTables with row count and curve type")]
    async fn list_curve_tables(
        &self,
        Parameters(params): Parameters<PathFilterParams>,
    ) -> ToolResult {
        let command = CommandParams::new().with_non_empty("path_filter", &params.path_filter);
        let outcome = self
            .run_cached("list_curve_tables", command, self.ttl.list)
            .await;
        self.respond("list_curve_tables", outcome)
    }

    #[tool(description = "Get the curves of a CurveTable, optionally a single row")]
    async fn get_curve_table(
        &self,
        Parameters(params): Parameters<CurveTableParams>,
    ) -> ToolResult {
        let command = CommandParams::new()
            .with("table_path", params.table_path)
            .with_non_empty("row_name", &params.row_name);
        let outcome = self.run("get_curve_table", command).await;
        self.respond("get_curve_table", outcome)
    }

    #[tool(
        description = "Replace every key of a CurveTable row with the given JSON array of {time, value}"
    )]
    async fn update_curve_table_row(
        &self,
        Parameters(params): Parameters<UpdateCurveTableRowParams>,
    ) -> ToolResult {
        let command = CommandParams::new()
            .with("table_path", params.table_path)
            .with("row_name", params.row_name)
            .with_json("keys", &params.keys);
        let outcome = self
            .run_parsed("update_curve_table_row", command, false)
            .await;
        self.respond("update_curve_table_row", outcome)
    }

    #[tool(description = "List StringTable assets with name, path and namespace")]
    async fn list_string_tables(
        &self,
        Parameters(params): Parameters<PathFilterParams>,
    ) -> ToolResult {
        let command = CommandParams::new().with_non_empty("path_filter", &params.path_filter);
        let outcome = self
            .run_cached("list_string_tables", command, self.ttl.list)
            .await;
        self.respond("list_string_tables", outcome)
    }

    #[tool(description = "Get StringTable entries, optionally filtered by a key wildcard pattern")]
    async fn get_translations(
        &self,
        Parameters(params): Parameters<TranslationsParams>,
    ) -> ToolResult {
        let command = CommandParams::new()
            .with("string_table_path", params.string_table_path)
            .with_non_empty("key_pattern", &params.key_pattern);
        let outcome = self.run("get_translations", command).await;
        self.respond("get_translations", outcome)
    }

    #[tool(description = "Create or update one StringTable entry")]
    async fn set_translation(
        &self,
        Parameters(params): Parameters<SetTranslationParams>,
    ) -> ToolResult {
        let command = CommandParams::new()
            .with("string_table_path", params.string_table_path)
            .with("key", params.key)
            .with("text", params.text);
        let outcome = self.run("set_translation", command).await;
        self.respond("set_translation", outcome)
    }

    #[tool(description = "Report response cache hits, misses, hit rate and entry count")]
    async fn get_cache_stats(&self) -> ToolResult {
        let stats = self.connection.cache_stats().await;
        let report = CacheStatsReport {
            enabled: self.connection.cache_config().enabled,
            hits: stats.hits,
            misses: stats.misses,
            hit_rate: stats.hit_rate,
            entries: stats.entries,
        };
        let body = serde_json::to_value(&report)
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
        Ok(text(format!("{body:#}")))
    }

    #[tool(
        description = "Clear cached editor responses, all of them or only keys starting with a prefix such as 'list_datatables:'"
    )]
    async fn clear_cache(&self, Parameters(params): Parameters<ClearCacheParams>) -> ToolResult {
        let prefix = params.prefix.filter(|p| !p.is_empty());
        let invalidation = Invalidation::from(prefix.as_deref());
        let cleared = self.connection.invalidate_cache(&invalidation).await;

        tracing::info!(cleared, prefix = ?prefix, "Cleared response cache");

        let mut body = Map::new();
        body.insert("cleared".into(), Value::from(cleared));
        body.insert("prefix".into(), prefix.map_or(Value::Null, Value::from));
        Ok(text(render(&body)))
    }
}

#[tool_handler]
impl RmcpServerHandler for ServerHandler {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build()).with_instructions(
            "MCP server for the Unreal Editor data bridge. Provides tools to query and edit DataTables, GameplayTags, DataAssets, CurveTables, StringTables and assets in a running editor.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::connection::ConnectionConfig;

    fn handler_for(port: u16) -> ServerHandler {
        let config = ConnectionConfig {
            retry_delay: Duration::from_millis(10),
            ..ConnectionConfig::new("127.0.0.1", port)
        };
        let connection = Arc::new(ConnectionManager::new(config, CacheConfig::new()));
        ServerHandler::new(connection, ResponseSizeGuard::default())
    }

    async fn closed_port() -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    fn body(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| c.as_text().map(|t| t.text.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_get_status_not_connected_is_text() {
        let handler = handler_for(closed_port().await);
        let result = handler.get_status().await.unwrap();
        assert!(body(&result).starts_with("Not connected to Unreal Editor: Cannot connect"));
    }

    #[tokio::test]
    async fn test_connection_error_renders_error_text() {
        let handler = handler_for(closed_port().await);
        let result = handler
            .list_datatables(Parameters(ListDataTablesParams::default()))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(body(&result).starts_with("Error: Cannot connect to Unreal Editor"));
    }

    #[tokio::test]
    async fn test_invalid_json_argument_rejected_before_sending() {
        let handler = handler_for(closed_port().await);
        let result = handler
            .add_datatable_row(Parameters(WriteDataTableRowParams {
                table_path: "/Game/DT.DT".to_string(),
                row_name: "Row".to_string(),
                row_data: "{oops".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(body(&result).starts_with("Error: Invalid JSON in row_data"));
    }

    #[tokio::test]
    async fn test_cache_tools_are_local() {
        let handler = handler_for(closed_port().await);

        let stats = handler.get_cache_stats().await.unwrap();
        let stats: Value = serde_json::from_str(&body(&stats)).unwrap();
        assert_eq!(stats["enabled"], true);
        assert_eq!(stats["entries"], 0);

        let cleared = handler
            .clear_cache(Parameters(ClearCacheParams {
                prefix: Some(String::new()),
            }))
            .await
            .unwrap();
        let cleared: Value = serde_json::from_str(&body(&cleared)).unwrap();
        assert_eq!(cleared["cleared"], 0);
        assert_eq!(cleared["prefix"], Value::Null);
    }

    /// Fake editor replying to each command with `reply(command)`, recording commands
    async fn spawn_editor(
        reply: fn(&str) -> Value,
    ) -> (u16, Arc<std::sync::Mutex<Vec<String>>>) {
        use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);

        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let (read, mut write) = socket.into_split();
                    let mut lines = BufReader::new(read).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        let request: Value = serde_json::from_str(&line).unwrap();
                        let command = request["command"].as_str().unwrap().to_string();
                        let mut out = reply(&command).to_string();
                        log.lock().unwrap().push(command);
                        out.push('\n');
                        if write.write_all(out.as_bytes()).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        (port, seen)
    }

    fn editor_reply(command: &str) -> Value {
        match command {
            "list_datatables" => serde_json::json!({
                "success": true,
                "data": {"datatables": [{"name": "DT_Items", "row_count": 3}]}
            }),
            "add_datatable_row" => serde_json::json!({
                "success": true,
                "data": {"row_name": "New"}
            }),
            "query_datatable" => serde_json::json!({
                "success": true,
                "data": {"rows": (0..400).map(|i| serde_json::json!({"row": i, "pad": "x".repeat(40)})).collect::<Vec<_>>()}
            }),
            _ => serde_json::json!({
                "success": false,
                "error": {"message": "Table not found", "code": "NOT_FOUND"}
            }),
        }
    }

    #[tokio::test]
    async fn test_listing_cached_until_row_added() {
        let (port, seen) = spawn_editor(editor_reply).await;
        let handler = handler_for(port);

        for _ in 0..2 {
            let result = handler
                .list_datatables(Parameters(ListDataTablesParams::default()))
                .await
                .unwrap();
            assert!(body(&result).contains("DT_Items"));
        }
        assert_eq!(seen.lock().unwrap().len(), 1);

        handler
            .add_datatable_row(Parameters(WriteDataTableRowParams {
                table_path: "/Game/DT_Items.DT_Items".to_string(),
                row_name: "New".to_string(),
                row_data: "{\"Damage\": 5}".to_string(),
            }))
            .await
            .unwrap();

        handler
            .list_datatables(Parameters(ListDataTablesParams::default()))
            .await
            .unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            ["list_datatables", "add_datatable_row", "list_datatables"]
        );
    }

    #[tokio::test]
    async fn test_large_query_truncated_to_budget() {
        let (port, _) = spawn_editor(editor_reply).await;
        let connection = Arc::new(ConnectionManager::new(
            ConnectionConfig::new("127.0.0.1", port),
            CacheConfig::new(),
        ));
        let handler = ServerHandler::new(connection, ResponseSizeGuard::new(5_000));

        let result = handler
            .query_datatable(Parameters(QueryDataTableParams {
                table_path: "/Game/DT_Items.DT_Items".to_string(),
                row_name_pattern: String::new(),
                row_names: String::new(),
                fields: String::new(),
                limit: 400,
                offset: 0,
            }))
            .await
            .unwrap();
        let text = body(&result);
        assert!(text.chars().count() <= 5_000);

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["_truncated"]["original_count"], 400);
        let returned = value["rows"].as_array().unwrap().len();
        assert!(returned > 0 && returned < 400);
        assert_eq!(value["_truncated"]["returned_count"], returned);
    }

    #[tokio::test]
    async fn test_remote_failure_is_mcp_error() {
        let (port, _) = spawn_editor(editor_reply).await;
        let handler = handler_for(port);

        let err = handler
            .get_datatable_row(Parameters(DataTableRowParams {
                table_path: "/Game/Missing.Missing".to_string(),
                row_name: "Row".to_string(),
            }))
            .await
            .unwrap_err();
        assert!(err.message.contains("Table not found"));
    }

    #[test]
    fn test_tool_router_lists_every_tool() {
        let handler = handler_for(8742);
        let tools = handler.tool_router.list_all();
        let names: Vec<_> = tools.iter().map(|t| t.name.to_string()).collect();

        assert_eq!(names.len(), 30);
        for name in ["get_status", "batch_query", "search_assets", "clear_cache"] {
            assert!(names.iter().any(|n| n == name), "missing tool {name}");
        }
    }

    #[test]
    fn test_server_info_enables_tools() {
        let connection = Arc::new(ConnectionManager::new(
            ConnectionConfig::default(),
            CacheConfig::default(),
        ));
        let handler = ServerHandler::new(connection, ResponseSizeGuard::default());
        let info = handler.get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(format!("{handler:?}").contains("127.0.0.1:8742"));
    }
}

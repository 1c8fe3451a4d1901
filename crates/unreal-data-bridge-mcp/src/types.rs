//! Parameter types for MCP tools
//!
//! Optional string arguments default to empty and are left out of the command
//! sent to the editor. List arguments are comma-separated strings; structured
//! payloads (`row_data`, `rows`, ...) are JSON-encoded strings.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const fn default_true() -> bool {
    true
}

const fn default_query_limit() -> u32 {
    25
}

const fn default_search_content_limit() -> u32 {
    20
}

const fn default_search_assets_limit() -> u32 {
    50
}

/// Parameters for listing DataTables
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListDataTablesParams {
    #[serde(default)]
    #[schemars(
        description = "Optional prefix filter for asset paths. Example: '/Game/Data/Quests/'"
    )]
    pub path_filter: String,
}

/// Parameters for reading a DataTable row struct schema
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DataTableSchemaParams {
    #[schemars(
        description = "Full asset path to the DataTable. Example: '/Game/Data/Quests/DT_QuestDefinitions.DT_QuestDefinitions'"
    )]
    pub table_path: String,
    #[serde(default = "default_true")]
    #[schemars(description = "Include fields inherited from parent structs (default: true)")]
    pub include_inherited: bool,
}

/// Parameters for querying DataTable rows
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryDataTableParams {
    #[schemars(description = "Full asset path to the DataTable")]
    pub table_path: String,
    #[serde(default)]
    #[schemars(
        description = "Wildcard pattern for row names (* any chars, ? single char). Example: 'Quest_*'"
    )]
    pub row_name_pattern: String,
    /// Exact names take precedence over `row_name_pattern`
    #[serde(default)]
    #[schemars(
        description = "Comma-separated exact row names. When set, row_name_pattern, limit and offset are ignored"
    )]
    pub row_names: String,
    #[serde(default)]
    #[schemars(
        description = "Comma-separated field names to include. Leave empty for all fields. Example: 'Title,QuestType'"
    )]
    pub fields: String,
    #[serde(default = "default_query_limit")]
    #[schemars(description = "Maximum number of rows to return (default: 25)")]
    pub limit: u32,
    #[serde(default)]
    #[schemars(description = "Number of rows to skip for pagination (default: 0)")]
    pub offset: u32,
}

/// Identifies one DataTable row
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DataTableRowParams {
    #[schemars(description = "Full asset path to the DataTable")]
    pub table_path: String,
    #[schemars(description = "Row name/key. Example: 'Quest_Tutorial_01'")]
    pub row_name: String,
}

/// Parameters for reading a UStruct schema by name
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StructSchemaParams {
    #[schemars(
        description = "Struct name, 'F' prefix optional. Example: 'FRipQuestDefinition'"
    )]
    pub struct_name: String,
    #[serde(default)]
    #[schemars(description = "For TInstancedStruct base types, include known subtypes")]
    pub include_subtypes: bool,
}

/// Parameters for adding or updating a DataTable row
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WriteDataTableRowParams {
    #[schemars(description = "Full asset path to the DataTable")]
    pub table_path: String,
    #[schemars(description = "Row name/key")]
    pub row_name: String,
    #[schemars(
        description = "JSON object with row field values. For TInstancedStruct fields include '_struct_type'. Example: '{\"QuestName\": \"Test\", \"Difficulty\": 3}'"
    )]
    pub row_data: String,
}

/// Parameters for searching inside DataTable row values
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchDataTableContentParams {
    #[schemars(description = "Full asset path to the DataTable or CompositeDataTable")]
    pub table_path: String,
    #[schemars(description = "Case-insensitive substring to search for in string field values")]
    pub search_text: String,
    #[serde(default)]
    #[schemars(
        description = "Comma-separated field names (dot-paths allowed) to restrict the search to"
    )]
    pub fields: String,
    #[serde(default)]
    #[schemars(description = "Comma-separated top-level field names to include with each match")]
    pub preview_fields: String,
    #[serde(default = "default_search_content_limit")]
    #[schemars(description = "Maximum number of matching rows (default: 20)")]
    pub limit: u32,
}

/// How `import_datatable_json` treats existing rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Skip rows that already exist
    #[default]
    Create,
    /// Create or update
    Upsert,
    /// Clear the table first
    Replace,
}

impl ImportMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Upsert => "upsert",
            Self::Replace => "replace",
        }
    }
}

/// Parameters for bulk row import
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ImportDataTableParams {
    #[schemars(description = "Full asset path to a non-composite DataTable")]
    pub table_path: String,
    #[schemars(
        description = "JSON array of {row_name, row_data} objects. Example: '[{\"row_name\": \"Row1\", \"row_data\": {\"Field1\": \"value\"}}]'"
    )]
    pub rows: String,
    #[serde(default)]
    #[schemars(description = "Import mode: create (default), upsert, or replace")]
    pub mode: ImportMode,
    #[serde(default)]
    #[schemars(description = "Validate without writing (default: false)")]
    pub dry_run: bool,
}

/// Parameters for running several commands in one round-trip
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchQueryParams {
    #[schemars(
        description = "JSON array of {command, params?} objects, at most 20. Example: '[{\"command\": \"get_status\"}]'"
    )]
    pub commands: String,
}

/// Parameters for resolving GameplayTags to rows
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResolveTagsParams {
    #[schemars(description = "Full asset path to the DataTable to search")]
    pub table_path: String,
    #[schemars(description = "FGameplayTag or FGameplayTagContainer field to match against")]
    pub tag_field: String,
    #[schemars(
        description = "Comma-separated GameplayTags. Example: 'Patient.NPC.Maria,Patient.NPC.Viktor'"
    )]
    pub tags: String,
    #[serde(default)]
    #[schemars(description = "Comma-separated field names to include. Leave empty for all")]
    pub fields: String,
}

/// Parameters for the data catalog overview
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DataCatalogParams {
    #[serde(default)]
    #[schemars(description = "Optional prefix filter for asset paths")]
    pub path_filter: String,
}

/// Parameters for listing GameplayTags
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListGameplayTagsParams {
    #[serde(default)]
    #[schemars(description = "Only return tags starting with this prefix. Example: 'Quest.'")]
    pub prefix: String,
}

/// Parameters for validating a GameplayTag
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ValidateGameplayTagParams {
    #[schemars(description = "Tag string to validate. Example: 'Quest.Generic.1'")]
    pub tag: String,
}

/// Parameters for registering one GameplayTag
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RegisterGameplayTagParams {
    #[schemars(description = "Tag to register. Example: 'Quest.NewCategory.SubTag'")]
    pub tag: String,
    #[serde(default)]
    #[schemars(description = "Target .ini file relative to Config/. Leave empty for the default")]
    pub ini_file: String,
    #[serde(default)]
    #[schemars(description = "Developer comment for the tag entry")]
    pub dev_comment: String,
}

/// Parameters for registering several GameplayTags
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RegisterGameplayTagsParams {
    #[schemars(
        description = "JSON array of {tag, ini_file?, dev_comment?} objects. Example: '[{\"tag\": \"Quest.New.1\"}]'"
    )]
    pub tags: String,
}

/// Parameters for listing DataAssets
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListDataAssetsParams {
    #[serde(default)]
    #[schemars(description = "Optional class name filter, subclasses included")]
    pub class_filter: String,
    #[serde(default)]
    #[schemars(description = "Optional prefix filter for asset paths")]
    pub path_filter: String,
}

/// Identifies one DataAsset
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DataAssetParams {
    #[schemars(
        description = "Full asset path to the DataAsset. Example: '/Game/Products/DA_CyberArm_Mk1.DA_CyberArm_Mk1'"
    )]
    pub asset_path: String,
}

/// Parameters for updating DataAsset properties
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UpdateDataAssetParams {
    #[schemars(description = "Full asset path to the DataAsset")]
    pub asset_path: String,
    #[schemars(
        description = "JSON object of property names and new values. Example: '{\"BaseCost\": 5000}'"
    )]
    pub properties: String,
    #[serde(default)]
    #[schemars(description = "Preview changes without applying them (default: false)")]
    pub dry_run: bool,
}

/// Parameters for an asset registry search
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchAssetsParams {
    #[serde(default)]
    #[schemars(description = "Case-insensitive substring of asset names. Empty matches all")]
    pub query: String,
    #[serde(default)]
    #[schemars(description = "Optional class name filter. Example: 'UDataTable'")]
    pub class_filter: String,
    #[serde(default)]
    #[schemars(description = "Optional prefix filter for asset paths")]
    pub path_filter: String,
    #[serde(default = "default_search_assets_limit")]
    #[schemars(description = "Maximum number of results (default: 50, max: 500)")]
    pub limit: u32,
}

impl Default for SearchAssetsParams {
    fn default() -> Self {
        Self {
            query: String::new(),
            class_filter: String::new(),
            path_filter: String::new(),
            limit: default_search_assets_limit(),
        }
    }
}

/// Parameters for listing CurveTables or StringTables
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PathFilterParams {
    #[serde(default)]
    #[schemars(description = "Optional prefix filter for asset paths")]
    pub path_filter: String,
}

/// Parameters for reading a CurveTable
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CurveTableParams {
    #[schemars(description = "Full asset path to the CurveTable")]
    pub table_path: String,
    #[serde(default)]
    #[schemars(description = "Optional row name for a single curve. Leave empty for all curves")]
    pub row_name: String,
}

/// Parameters for replacing the keys of one curve
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UpdateCurveTableRowParams {
    #[schemars(description = "Full asset path to the CurveTable")]
    pub table_path: String,
    #[schemars(description = "Name of the curve row to update")]
    pub row_name: String,
    #[schemars(
        description = "JSON array of {time, value} objects replacing the whole curve. Example: '[{\"time\": 0.0, \"value\": 1.0}]'"
    )]
    pub keys: String,
}

/// Parameters for reading StringTable entries
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TranslationsParams {
    #[schemars(description = "Full asset path to the StringTable")]
    pub string_table_path: String,
    #[serde(default)]
    #[schemars(description = "Optional wildcard pattern for keys. Example: 'Menu_*'")]
    pub key_pattern: String,
}

/// Parameters for writing one StringTable entry
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetTranslationParams {
    #[schemars(description = "Full asset path to the StringTable")]
    pub string_table_path: String,
    #[schemars(description = "Translation key. Example: 'Menu_Play_Button'")]
    pub key: String,
    #[schemars(description = "Text value. Example: 'Start Game'")]
    pub text: String,
}

/// Parameters for clearing the response cache
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ClearCacheParams {
    #[serde(default)]
    #[schemars(
        description = "Only drop keys starting with this prefix, e.g. 'list_datatables:'. Leave empty to clear everything"
    )]
    pub prefix: Option<String>,
}

/// Cache statistics reported by `get_cache_stats`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatsReport {
    pub enabled: bool,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub entries: usize,
}

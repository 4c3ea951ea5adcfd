//! DuckDB query generation tool.
//!
//! Emits SQL text against the `social_media(post_id, timestamp, comments)`
//! table, where `comments` is a JSON array of `{stars: {useful, funny}}` objects.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, bail};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domains::tools::handlers::{Tool, ToolContext};

/// Parameters for the DuckDB query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DuckdbQueryParams {
    /// One of `posts_with_useful_comments`, `recent_posts`, `top_posts_by_comments`.
    pub query_type: String,

    /// Only include posts at or after this RFC 3339 timestamp.
    #[serde(default)]
    pub timestamp_filter: Option<String>,

    /// Minimum useful stars, or the row limit for ranking queries.
    #[serde(default)]
    pub numeric_filter: Option<i64>,

    /// `asc` or `desc`.
    #[serde(default)]
    pub sort_order: Option<String>,
}

/// Supported query shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    PostsWithUsefulComments,
    RecentPosts,
    TopPostsByComments,
}

impl QueryType {
    pub const ALL: [QueryType; 3] = [
        Self::PostsWithUsefulComments,
        Self::RecentPosts,
        Self::TopPostsByComments,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PostsWithUsefulComments => "posts_with_useful_comments",
            Self::RecentPosts => "recent_posts",
            Self::TopPostsByComments => "top_posts_by_comments",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|q| q.as_str() == wanted)
            .with_context(|| {
                let supported: Vec<_> = Self::ALL.iter().map(|q| q.as_str()).collect();
                format!(
                    "Unsupported query_type {s:?}, expected one of: {}",
                    supported.join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn parse(raw: Option<&str>, default: Self) -> anyhow::Result<Self> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(default);
        };
        match raw.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => bail!("sort_order must be asc or desc, got {raw:?}"),
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Generates DuckDB SQL for common social-media questions.
pub struct DuckdbQueryTool;

#[async_trait]
impl Tool for DuckdbQueryTool {
    const NAME: &'static str = "generate_duckdb_query";

    const DESCRIPTION: &'static str = "Write a DuckDB SQL query over the social_media table. query_type selects the question; \
         timestamp_filter, numeric_filter and sort_order refine it.";

    const PARAMETERS: &'static [&'static str] =
        &["query_type", "timestamp_filter", "numeric_filter", "sort_order"];

    type Params = DuckdbQueryParams;

    async fn run(
        &self,
        params: DuckdbQueryParams,
        _extras: Map<String, Value>,
        _ctx: &ToolContext,
    ) -> anyhow::Result<Value> {
        build_query(&params).map(Value::String)
    }
}

/// Render the SQL for `params`.
pub fn build_query(params: &DuckdbQueryParams) -> anyhow::Result<String> {
    let query_type: QueryType = params.query_type.parse()?;

    let since = params
        .timestamp_filter
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(normalize_timestamp)
        .transpose()?;
    let where_clause = since
        .map(|ts| format!("\nWHERE timestamp >= '{ts}'"))
        .unwrap_or_default();

    if let Some(n) = params.numeric_filter {
        if n < 0 {
            bail!("numeric_filter must not be negative, got {n}");
        }
    }

    let sql = match query_type {
        QueryType::PostsWithUsefulComments => {
            let min_useful = params.numeric_filter.unwrap_or(1);
            let order = SortOrder::parse(params.sort_order.as_deref(), SortOrder::Asc)?;
            format!(
                "SELECT post_id\n\
                 FROM (\n    \
                 SELECT post_id, UNNEST(json_extract(comments, '$[*].stars.useful')) AS useful\n    \
                 FROM social_media{indented}\n\
                 )\n\
                 WHERE CAST(useful AS INTEGER) >= {min_useful}\n\
                 GROUP BY post_id\n\
                 ORDER BY post_id {order};",
                indented = where_clause.replace('\n', "\n    "),
                order = order.sql(),
            )
        }
        QueryType::RecentPosts => {
            let order = SortOrder::parse(params.sort_order.as_deref(), SortOrder::Desc)?;
            let limit = params
                .numeric_filter
                .map(|n| format!("\nLIMIT {n}"))
                .unwrap_or_default();
            format!(
                "SELECT post_id, timestamp\nFROM social_media{where_clause}\nORDER BY timestamp {}{limit};",
                order.sql()
            )
        }
        QueryType::TopPostsByComments => {
            let order = SortOrder::parse(params.sort_order.as_deref(), SortOrder::Desc)?;
            let limit = params.numeric_filter.unwrap_or(10);
            format!(
                "SELECT post_id, json_array_length(comments) AS comment_count\n\
                 FROM social_media{where_clause}\n\
                 ORDER BY comment_count {}, post_id\n\
                 LIMIT {limit};",
                order.sql()
            )
        }
    };

    Ok(sql)
}

/// Validate an RFC 3339 timestamp and render it as UTC with milliseconds.
fn normalize_timestamp(raw: &str) -> anyhow::Result<String> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("timestamp_filter {raw:?} is not an RFC 3339 timestamp"))?;
    Ok(parsed
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true))
}

//! Phonetic sales analysis tool.
//!
//! Sales records spell the same city several ways ("Beijing", "Bejing").
//! City spellings are clustered by Soundex code before totals are computed.

use std::collections::BTreeSet;

use anyhow::Context;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{info, instrument};

use crate::domains::tools::handlers::{Tool, ToolContext};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the phonetic sales analysis tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PhoneticSalesParams {
    /// Path to a JSON array of `{city, product, sales}` records.
    /// Filled in from the uploaded file.
    #[serde(default)]
    pub file_path: Option<String>,

    /// Product to total, matched case-insensitively.
    pub product: String,

    /// City to total; any spelling that sounds the same is included.
    pub city: String,

    /// Only count transactions of at least this many units.
    #[serde(default)]
    pub min_units: u64,
}

#[derive(Debug, Deserialize)]
struct SalesRecord {
    city: String,
    product: String,
    #[serde(alias = "units")]
    sales: u64,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Totals units sold per product in a phonetically clustered city.
pub struct PhoneticSalesTool;

#[async_trait]
impl Tool for PhoneticSalesTool {
    const NAME: &'static str = "analyze_sales_with_phonetic_clustering";

    const DESCRIPTION: &'static str = "Count the units of a product sold in a city from an uploaded JSON sales file, \
         grouping misspelled city names that sound alike. Only transactions with at least min_units units are counted.";

    const PARAMETERS: &'static [&'static str] = &["file_path", "product", "city", "min_units"];

    const FILE_PARAMETER: Option<&'static str> = Some("file_path");

    type Params = PhoneticSalesParams;

    #[instrument(skip_all, fields(city = %params.city, product = %params.product))]
    async fn run(
        &self,
        params: PhoneticSalesParams,
        _extras: Map<String, Value>,
        _ctx: &ToolContext,
    ) -> anyhow::Result<Value> {
        let path = params.file_path.as_deref().context("No file path provided")?;

        let raw = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read sales file {path}"))?;
        let records: Vec<SalesRecord> =
            serde_json::from_slice(&raw).context("Sales file must be a JSON array of records")?;

        let target = soundex(&params.city)
            .with_context(|| format!("City name {:?} has no letters", params.city))?;

        let mut total_units = 0u64;
        let mut transactions = 0usize;
        let mut matched_spellings = BTreeSet::new();

        for record in &records {
            if soundex(&record.city).as_deref() != Some(target.as_str()) {
                continue;
            }
            matched_spellings.insert(record.city.trim().to_string());
            if record.product.trim().eq_ignore_ascii_case(params.product.trim())
                && record.sales >= params.min_units
            {
                total_units += record.sales;
                transactions += 1;
            }
        }

        info!(
            "{} units of {} in {} ({} spellings, {} transactions)",
            total_units,
            params.product,
            params.city,
            matched_spellings.len(),
            transactions
        );

        Ok(json!({
            "city": params.city,
            "product": params.product,
            "min_units": params.min_units,
            "total_units": total_units,
            "transactions": transactions,
            "matched_spellings": matched_spellings,
        }))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// American Soundex code of the letters in `word`, e.g. `R163` for "Robert".
pub fn soundex(word: &str) -> Option<String> {
    let mut letters = word
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase());

    let first = letters.next()?;
    let mut code = String::with_capacity(4);
    code.push(first);
    let mut last = soundex_digit(first);

    for c in letters {
        let digit = soundex_digit(c);
        if let Some(d) = digit {
            if digit != last {
                code.push(d);
                if code.len() == 4 {
                    break;
                }
            }
        }
        // H and W do not separate letters with the same code
        if !matches!(c, 'H' | 'W') {
            last = digit;
        }
    }

    while code.len() < 4 {
        code.push('0');
    }
    Some(code)
}

fn soundex_digit(c: char) -> Option<char> {
    match c {
        'B' | 'F' | 'P' | 'V' => Some('1'),
        'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => Some('2'),
        'D' | 'T' => Some('3'),
        'L' => Some('4'),
        'M' | 'N' => Some('5'),
        'R' => Some('6'),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn ctx() -> ToolContext {
        ToolContext::new(Arc::new(Config::default()))
    }

    fn params(file_path: Option<String>, min_units: u64) -> PhoneticSalesParams {
        PhoneticSalesParams {
            file_path,
            product: "Shoes".into(),
            city: "Beijing".into(),
            min_units,
        }
    }

    fn sales_file() -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"[
                {"city": "Beijing", "product": "Shoes", "sales": 120},
                {"city": "Bejing", "product": "shoes", "sales": 40},
                {"city": "Biejing", "product": "Shoes", "sales": 10},
                {"city": "Beijing", "product": "Bacon", "sales": 500},
                {"city": "Lagos", "product": "Shoes", "sales": 999}
            ]"#,
        )
        .unwrap();
        file
    }

    #[test]
    fn test_soundex_reference_codes() {
        assert_eq!(soundex("Robert").as_deref(), Some("R163"));
        assert_eq!(soundex("Rupert").as_deref(), Some("R163"));
        assert_eq!(soundex("Ashcraft").as_deref(), Some("A261"));
        assert_eq!(soundex("Tymczak").as_deref(), Some("T522"));
        assert_eq!(soundex("Pfister").as_deref(), Some("P236"));
        assert_eq!(soundex("Lee").as_deref(), Some("L000"));
        assert_eq!(soundex("123"), None);
    }

    #[test]
    fn test_soundex_clusters_misspellings() {
        assert_eq!(soundex("Beijing"), soundex("Bejing"));
        assert_eq!(soundex("Shanghai"), soundex("Shanghaii"));
        assert_ne!(soundex("Beijing"), soundex("Lagos"));
    }

    #[tokio::test]
    async fn test_totals_by_cluster() {
        let file = sales_file();
        let path = file.path().to_string_lossy().to_string();
        let value = PhoneticSalesTool
            .run(params(Some(path), 20), Map::new(), &ctx())
            .await
            .unwrap();

        assert_eq!(value["total_units"], 160);
        assert_eq!(value["transactions"], 2);
        assert_eq!(
            value["matched_spellings"],
            json!(["Beijing", "Bejing", "Biejing"])
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_reported_by_tool() {
        let err = PhoneticSalesTool
            .run(params(None, 0), Map::new(), &ctx())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No file path provided");
    }

    #[tokio::test]
    async fn test_malformed_sales_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{\"not\": \"a list\"}").unwrap();
        let path = file.path().to_string_lossy().to_string();
        let err = PhoneticSalesTool
            .run(params(Some(path), 0), Map::new(), &ctx())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("JSON array"));
    }
}

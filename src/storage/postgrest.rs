//! PostgREST (Supabase) table store over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};

use crate::types::{Record, TableName, Value};

use super::{StorageError, StorageResult, TableStore};

/// Connection settings for [`PostgrestTableStore`].
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Project URL, e.g. `https://abc.supabase.co`.
    pub url: String,
    /// Service or anon key; sent as `apikey` and bearer token.
    pub api_key: String,
    /// Always-true filter used for deletes, `column=operator.value`.
    /// PostgREST refuses unfiltered DELETE requests.
    pub delete_filter: String,
    /// Rows requested per page when reading a table. The server may cap
    /// pages lower (`max-rows`).
    pub page_size: usize,
    /// Column ordering paged reads; the delete filter column when unset.
    pub order_by: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Table store talking to a PostgREST endpoint (`/rest/v1/<table>`).
///
/// Reads page through the table with `limit`/`offset` in a stable column
/// order until an empty page comes back, so there is no ceiling on table
/// size and a server-side row cap only costs extra requests.
#[derive(Debug, Clone)]
pub struct PostgrestTableStore {
    client: Client,
    base: Url,
    api_key: String,
    delete_filter: (String, String),
    order_by: String,
    page_size: usize,
}

impl PostgrestTableStore {
    pub fn new(config: PostgrestConfig) -> StorageResult<Self> {
        let base = Url::parse(&config.url)
            .map_err(|e| StorageError::Config(format!("invalid url '{}': {e}", config.url)))?;
        if base.cannot_be_a_base() {
            return Err(StorageError::Config(format!(
                "url '{}' cannot be used as a base",
                config.url
            )));
        }
        if config.api_key.is_empty() {
            return Err(StorageError::Config("api key is empty".to_string()));
        }
        if config.page_size == 0 {
            return Err(StorageError::Config("page size must be positive".to_string()));
        }

        let delete_filter = parse_filter(&config.delete_filter)?;
        let order_by = match config.order_by {
            Some(column) if !column.trim().is_empty() => column,
            _ => delete_filter.0.clone(),
        };
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| StorageError::Http {
                operation: "client setup",
                source,
            })?;

        Ok(Self {
            client,
            base,
            api_key: config.api_key,
            delete_filter,
            order_by,
            page_size: config.page_size,
        })
    }

    fn table_url(&self, table: &TableName) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["rest", "v1", table.as_str()]);
        }
        url
    }

    fn page_url(&self, table: &TableName, offset: usize) -> Url {
        let mut url = self.table_url(table);
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", &format!("{}.asc", self.order_by))
            .append_pair("limit", &self.page_size.to_string())
            .append_pair("offset", &offset.to_string());
        url
    }

    async fn fetch_page(&self, table: &TableName, offset: usize) -> StorageResult<Vec<Record>> {
        let response = self
            .send("select", table, self.client.get(self.page_url(table, offset)))
            .await?;
        let page: Vec<serde_json::Map<String, serde_json::Value>> =
            response.json().await.map_err(|source| StorageError::Http {
                operation: "select",
                source,
            })?;

        crate::debug_event!("postgrest", "page", "{table} offset {offset}: {} rows", page.len());
        Ok(page.into_iter().map(record_from_json).collect())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(
        &self,
        operation: &'static str,
        table: &TableName,
        request: RequestBuilder,
    ) -> StorageResult<Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|source| StorageError::Http { operation, source })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(StorageError::Rejected {
            operation,
            table: table.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

/// Collect pages starting at offset 0 until one comes back empty. Each
/// offset advances by the rows actually returned.
async fn read_pages<F, Fut>(mut fetch: F) -> StorageResult<Vec<Record>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = StorageResult<Vec<Record>>>,
{
    let mut records = Vec::new();
    loop {
        let page = fetch(records.len()).await?;
        if page.is_empty() {
            return Ok(records);
        }
        records.extend(page);
    }
}

/// Split `column=operator.value` into a query pair.
fn parse_filter(filter: &str) -> StorageResult<(String, String)> {
    match filter.split_once('=') {
        Some((column, expr)) if !column.is_empty() && !expr.is_empty() => {
            Ok((column.to_string(), expr.to_string()))
        }
        _ => Err(StorageError::Config(format!(
            "delete filter '{filter}' must look like 'column=operator.value'"
        ))),
    }
}

fn record_to_json(record: &Record) -> serde_json::Value {
    serde_json::Value::Object(
        record
            .iter()
            .map(|(column, value)| (column.clone(), value.to_json()))
            .collect(),
    )
}

/// JSON/JSONB columns come back nested; keep them as their JSON text.
fn record_from_json(row: serde_json::Map<String, serde_json::Value>) -> Record {
    row.into_iter()
        .map(|(column, raw)| {
            let value = Value::from_json(&raw).unwrap_or_else(|| Value::Text(raw.to_string()));
            (column, value)
        })
        .collect()
}

#[async_trait]
impl TableStore for PostgrestTableStore {
    fn name(&self) -> &str {
        "postgrest"
    }

    async fn select_all(&self, table: &TableName) -> StorageResult<Vec<Record>> {
        read_pages(|offset| self.fetch_page(table, offset)).await
    }

    async fn delete_all(&self, table: &TableName) -> StorageResult<()> {
        let mut url = self.table_url(table);
        let (column, expr) = &self.delete_filter;
        url.query_pairs_mut().append_pair(column, expr);

        let request = self
            .client
            .delete(url)
            .header("Prefer", "return=minimal");
        self.send("delete", table, request).await?;
        Ok(())
    }

    async fn insert_many(&self, table: &TableName, records: &[Record]) -> StorageResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let body: Vec<serde_json::Value> = records.iter().map(record_to_json).collect();
        let request = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(&body);
        self.send("insert", table, request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> PostgrestConfig {
        PostgrestConfig {
            url: url.to_string(),
            api_key: "secret".to_string(),
            delete_filter: "id=not.is.null".to_string(),
            page_size: 1000,
            order_by: None,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_table_url() {
        let store = PostgrestTableStore::new(config("https://abc.supabase.co")).unwrap();
        let table = TableName::new("work orders").unwrap();
        assert_eq!(
            store.table_url(&table).as_str(),
            "https://abc.supabase.co/rest/v1/work%20orders"
        );

        let store = PostgrestTableStore::new(config("http://localhost:54321/")).unwrap();
        let table = TableName::new("equipment").unwrap();
        assert_eq!(
            store.table_url(&table).as_str(),
            "http://localhost:54321/rest/v1/equipment"
        );
    }

    #[test]
    fn test_page_url_is_ordered() {
        let store = PostgrestTableStore::new(config("https://abc.supabase.co")).unwrap();
        let table = TableName::new("equipment").unwrap();
        assert_eq!(
            store.page_url(&table, 2000).as_str(),
            "https://abc.supabase.co/rest/v1/equipment?select=*&order=id.asc&limit=1000&offset=2000"
        );

        let mut cfg = config("https://abc.supabase.co");
        cfg.order_by = Some("serial".to_string());
        let store = PostgrestTableStore::new(cfg).unwrap();
        assert!(store.page_url(&table, 0).as_str().contains("order=serial.asc"));
    }

    #[tokio::test]
    async fn test_pages_shorter_than_requested_keep_reading() {
        // Server caps pages at 2 rows whatever limit is asked for
        let rows: Vec<Record> = (0..5)
            .map(|i| Record::from_iter([("id".to_string(), Value::Int(i))]))
            .collect();
        let offsets = parking_lot::Mutex::new(Vec::new());

        let records = read_pages(|offset| {
            offsets.lock().push(offset);
            let page = rows[offset..(offset + 2).min(rows.len())].to_vec();
            async move { Ok(page) }
        })
        .await
        .unwrap();

        assert_eq!(records, rows);
        assert_eq!(*offsets.lock(), vec![0, 2, 4, 5]);
    }

    #[tokio::test]
    async fn test_page_error_stops_reading() {
        let result = read_pages(|offset| async move {
            if offset == 0 {
                Ok(vec![Record::new()])
            } else {
                Err(StorageError::Unavailable("gone".to_string()))
            }
        })
        .await;
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(PostgrestTableStore::new(config("not a url")).is_err());

        let mut cfg = config("https://abc.supabase.co");
        cfg.api_key.clear();
        assert!(PostgrestTableStore::new(cfg).is_err());

        let mut cfg = config("https://abc.supabase.co");
        cfg.delete_filter = "everything".to_string();
        assert!(PostgrestTableStore::new(cfg).is_err());
    }

    #[test]
    fn test_json_conversion() {
        let record = Record::from_iter([
            ("name".to_string(), Value::from("Pump1")),
            ("hours".to_string(), Value::Int(3)),
        ]);
        assert_eq!(
            record_to_json(&record),
            serde_json::json!({"name": "Pump1", "hours": 3})
        );

        let row = serde_json::json!({"id": 1, "meta": {"a": 1}});
        let serde_json::Value::Object(map) = row else {
            unreachable!()
        };
        let back = record_from_json(map);
        assert_eq!(back["id"], Value::Int(1));
        assert_eq!(back["meta"], Value::from(r#"{"a":1}"#));
    }
}

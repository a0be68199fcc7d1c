//! Response DTOs for `POST /query` and their normalisation into
//! [`MessageMetadata`].
//!
//! Backends disagree on key names: the generated query may arrive as
//! `sql_query` or `query`, optional fields may sit at the top level or
//! under a nested `metadata` object, and early backends answered with
//! `result` instead of `answer`. Everything is folded into one schema here.

use ragdesk_core::QueryError;
use ragdesk_core::session::{
    Answer, GeneratedQuery, MessageMetadata, QueryKind, QueryMode, Source, TabularData,
};
use serde::Deserialize;
use serde_json::{Map, Value};

const SCALAR_COLUMN: &str = "value";

#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(alias = "result")]
    answer: String,
    #[serde(flatten)]
    fields: OptionalFields,
    #[serde(default)]
    metadata: Option<Value>,
}

/// Optional keys, kept as raw JSON so a malformed value only drops that
/// field instead of the whole answer.
#[derive(Debug, Default, Deserialize)]
struct OptionalFields {
    #[serde(default)]
    sql_query: Option<Value>,
    #[serde(default)]
    query: Option<Value>,
    #[serde(default)]
    query_type: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    sources: Option<Value>,
}

impl OptionalFields {
    /// Reads the nested `metadata` object; any other shape counts as absent.
    fn from_nested(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::default(),
            Some(Value::Object(map)) => {
                serde_json::from_value(Value::Object(map)).unwrap_or_else(|e| {
                    tracing::warn!("Ignoring unreadable response metadata: {e}");
                    Self::default()
                })
            }
            Some(other) => {
                tracing::warn!("Ignoring non-object response metadata: {other}");
                Self::default()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SourceDto {
    Document {
        #[serde(alias = "page_content")]
        content: String,
        #[serde(default)]
        metadata: Option<Map<String, Value>>,
    },
    Text(String),
}

impl From<SourceDto> for Source {
    fn from(dto: SourceDto) -> Self {
        match dto {
            SourceDto::Document { content, metadata } => Source {
                content,
                metadata: metadata.unwrap_or_default(),
            },
            SourceDto::Text(content) => Source {
                content,
                metadata: Map::new(),
            },
        }
    }
}

/// Parses a 200 response body into an [`Answer`].
///
/// Only a non-JSON body or a missing `answer` is a decode error.
pub(crate) fn parse_answer(body: &str, mode: QueryMode) -> Result<Answer, QueryError> {
    let response: QueryResponse =
        serde_json::from_str(body).map_err(|e| QueryError::Decode(e.to_string()))?;
    Ok(response.normalize(mode))
}

impl QueryResponse {
    fn normalize(self, mode: QueryMode) -> Answer {
        let QueryResponse {
            answer,
            fields,
            metadata,
        } = self;
        let nested = OptionalFields::from_nested(metadata);

        let query = resolve_query(&fields, mode).or_else(|| resolve_query(&nested, mode));
        let data = present(fields.data)
            .or(present(nested.data))
            .and_then(table_from_json);
        let sources = present(fields.sources)
            .or(present(nested.sources))
            .map(sources_from_json)
            .unwrap_or_default();

        Answer {
            answer,
            metadata: MessageMetadata {
                query,
                data,
                sources,
            },
        }
    }
}

fn present(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

fn text_field<'a>(name: &str, value: &'a Option<Value>) -> Option<&'a str> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.trim()).filter(|s| !s.is_empty()),
        Some(other) => {
            tracing::warn!("Ignoring non-string '{}' in response: {}", name, other);
            None
        }
    }
}

fn resolve_query(fields: &OptionalFields, mode: QueryMode) -> Option<GeneratedQuery> {
    let sql_query = text_field("sql_query", &fields.sql_query);
    let query = text_field("query", &fields.query);
    let (text, from_sql_key) = match (sql_query, query) {
        (Some(text), _) => (text, true),
        (None, Some(text)) => (text, false),
        (None, None) => return None,
    };

    let kind = match text_field("query_type", &fields.query_type) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown query_type '{}', treating as sql", raw);
            QueryKind::Sql
        }),
        None if from_sql_key => QueryKind::Sql,
        None => match mode {
            QueryMode::Python => QueryKind::Python,
            _ => QueryKind::Sql,
        },
    };

    Some(GeneratedQuery {
        text: text.to_string(),
        kind,
    })
}

/// Keeps the citations that parse and drops the rest.
fn sources_from_json(value: Value) -> Vec<Source> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            tracing::warn!("Ignoring sources that are not a list: {other}");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<SourceDto>(item.clone()) {
            Ok(dto) => Some(Source::from(dto)),
            Err(_) => {
                tracing::warn!("Dropping unreadable source: {item}");
                None
            }
        })
        .collect()
}

/// Accepts record-oriented rows, a column-oriented object, or a list of
/// scalars. Any other shape is dropped.
fn table_from_json(value: Value) -> Option<TabularData> {
    match value {
        Value::Null => None,
        Value::Array(items) if items.iter().all(Value::is_object) => {
            let records = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect();
            Some(TabularData::from_records(records))
        }
        Value::Array(items) => Some(TabularData::from_columns(vec![(
            SCALAR_COLUMN.to_string(),
            items,
        )])),
        Value::Object(columns) => {
            let mut parsed = Vec::with_capacity(columns.len());
            for (name, values) in columns {
                match values {
                    Value::Array(values) => parsed.push((name, values)),
                    // pandas `to_dict()` shape: {column: {row_index: value}}
                    Value::Object(by_index) => {
                        parsed.push((name, by_index.into_iter().map(|(_, v)| v).collect()))
                    }
                    other => {
                        tracing::warn!("Ignoring data: column '{}' is not a list: {}", name, other);
                        return None;
                    }
                }
            }
            Some(TabularData::from_columns(parsed))
        }
        other => {
            tracing::warn!("Ignoring unsupported data shape: {other}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value, mode: QueryMode) -> Result<Answer, QueryError> {
        parse_answer(&value.to_string(), mode)
    }

    #[test]
    fn test_answer_only() {
        let answer = parse(json!({"answer": "42"}), QueryMode::Rag).unwrap();
        assert_eq!(answer.answer, "42");
        assert!(answer.metadata.is_empty());
    }

    #[test]
    fn test_result_alias() {
        let answer = parse(
            json!({"result": "Paris", "sources": ["doc one", "doc two"]}),
            QueryMode::Rag,
        )
        .unwrap();
        assert_eq!(answer.answer, "Paris");
        assert_eq!(answer.metadata.sources.len(), 2);
        assert_eq!(answer.metadata.sources[1].content, "doc two");
    }

    #[test]
    fn test_missing_answer_is_decode_error() {
        let err = parse(json!({"sql_query": "SELECT 1"}), QueryMode::Sql).unwrap_err();
        assert!(matches!(err, QueryError::Decode(_)));
    }

    #[test]
    fn test_non_json_is_decode_error() {
        let err = parse_answer("<html>502</html>", QueryMode::Sql).unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[test]
    fn test_sql_query_with_records() {
        let answer = parse(
            json!({
                "answer": "$1.2M",
                "sql_query": "SELECT SUM(amount) FROM sales",
                "data": [{"quarter": "Q1", "total": 1200000}]
            }),
            QueryMode::Sql,
        )
        .unwrap();

        let query = answer.metadata.query.unwrap();
        assert_eq!(query.kind, QueryKind::Sql);
        assert_eq!(query.text, "SELECT SUM(amount) FROM sales");

        let data = answer.metadata.data.unwrap();
        assert_eq!(data.columns(), ["quarter", "total"]);
        assert_eq!(data.rows()[0], vec![json!("Q1"), json!(1200000)]);
    }

    #[test]
    fn test_query_key_kind_follows_mode() {
        let answer = parse(json!({"answer": "ok", "query": "df.sum()"}), QueryMode::Python).unwrap();
        assert_eq!(answer.metadata.query.unwrap().kind, QueryKind::Python);

        let answer = parse(
            json!({"answer": "ok", "query": "df.sum()", "query_type": "PYTHON"}),
            QueryMode::Hybrid,
        )
        .unwrap();
        assert_eq!(answer.metadata.query.unwrap().kind, QueryKind::Python);
    }

    #[test]
    fn test_unknown_query_type_falls_back_to_sql() {
        let answer = parse(
            json!({"answer": "ok", "query": "MATCH (n) RETURN n", "query_type": "cypher"}),
            QueryMode::Hybrid,
        )
        .unwrap();
        assert_eq!(answer.metadata.query.unwrap().kind, QueryKind::Sql);
    }

    #[test]
    fn test_nested_metadata_shape() {
        let answer = parse(
            json!({
                "answer": "Top region is EU",
                "metadata": {
                    "query": "df.groupby('region').sum()",
                    "query_type": "python",
                    "data": {"region": {"0": "EU", "1": "US"}, "sales": {"0": 10, "1": 7}}
                }
            }),
            QueryMode::Python,
        )
        .unwrap();

        assert_eq!(answer.metadata.query.unwrap().kind, QueryKind::Python);
        let data = answer.metadata.data.unwrap();
        assert_eq!(data.columns(), ["region", "sales"]);
        assert_eq!(data.rows()[1], vec![json!("US"), json!(7)]);
    }

    #[test]
    fn test_top_level_wins_over_nested() {
        let answer = parse(
            json!({
                "answer": "ok",
                "sql_query": "SELECT 1",
                "metadata": {"query": "SELECT 2"}
            }),
            QueryMode::Sql,
        )
        .unwrap();
        assert_eq!(answer.metadata.query.unwrap().text, "SELECT 1");
    }

    #[test]
    fn test_blank_query_is_ignored() {
        let answer = parse(json!({"answer": "ok", "sql_query": "  ", "query": ""}), QueryMode::Sql)
            .unwrap();
        assert!(answer.metadata.query.is_none());
    }

    #[test]
    fn test_sources_with_metadata() {
        let answer = parse(
            json!({
                "answer": "See the report",
                "sources": [
                    {"content": "Q1 revenue grew", "metadata": {"source": "q1.pdf", "page": 3}},
                    {"page_content": "Churn fell"}
                ]
            }),
            QueryMode::Rag,
        )
        .unwrap();

        let sources = answer.metadata.sources;
        assert_eq!(sources[0].metadata.get("page"), Some(&json!(3)));
        assert_eq!(sources[1].content, "Churn fell");
        assert!(sources[1].metadata.is_empty());
    }

    #[test]
    fn test_scalar_list_becomes_single_column() {
        let answer = parse(json!({"answer": "ok", "data": [1, 2, 3]}), QueryMode::Sql).unwrap();
        let data = answer.metadata.data.unwrap();
        assert_eq!(data.columns(), ["value"]);
        assert_eq!(data.rows().len(), 3);
    }

    #[test]
    fn test_unsupported_data_shape_keeps_answer() {
        let answer = parse(
            json!({"answer": "Revenue was $1.2M", "data": "quarter,total\nQ1,1200000"}),
            QueryMode::Sql,
        )
        .unwrap();
        assert_eq!(answer.answer, "Revenue was $1.2M");
        assert!(answer.metadata.data.is_none());

        for data in [json!(42), json!(true), json!({"total": 5})] {
            let answer = parse(json!({"answer": "ok", "data": data}), QueryMode::Sql).unwrap();
            assert_eq!(answer.answer, "ok");
            assert!(answer.metadata.data.is_none());
        }
    }

    #[test]
    fn test_unreadable_sources_are_dropped() {
        let answer = parse(
            json!({
                "answer": "See docs",
                "sources": [
                    {"text": "chunk", "metadata": {}},
                    "plain citation",
                    {"content": "kept", "metadata": {"page": 1}}
                ]
            }),
            QueryMode::Rag,
        )
        .unwrap();
        assert_eq!(answer.answer, "See docs");
        let contents: Vec<&str> = answer
            .metadata
            .sources
            .iter()
            .map(|s| s.content.as_str())
            .collect();
        assert_eq!(contents, ["plain citation", "kept"]);

        let answer = parse(json!({"answer": "ok", "sources": "doc.pdf"}), QueryMode::Rag).unwrap();
        assert!(answer.metadata.sources.is_empty());
    }

    #[test]
    fn test_malformed_query_fields_are_ignored() {
        let answer = parse(
            json!({"answer": "ok", "sql_query": 7, "query": "SELECT 1", "metadata": "n/a"}),
            QueryMode::Sql,
        )
        .unwrap();
        let query = answer.metadata.query.unwrap();
        assert_eq!(query.text, "SELECT 1");
        assert_eq!(query.kind, QueryKind::Sql);
    }

    #[test]
    fn test_null_data_is_absent() {
        let answer = parse(json!({"answer": "ok", "data": null}), QueryMode::Sql).unwrap();
        assert!(answer.metadata.data.is_none());
    }
}

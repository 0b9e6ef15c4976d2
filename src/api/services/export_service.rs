//! Response export.
//!
//! Responses are flattened into one row per response and one column per
//! answerable question (follow-ups and section sub-questions included, in
//! tree order), after a fixed set of metadata columns. The JSON export
//! keeps the structure and embeds question metadata next to each answer.

use crate::models::localized::{DEFAULT_LOCALE, resolve};
use crate::models::{AnswerValue, Form, FormResponse, QuestionKind, walk_questions};
use crate::services::error::{ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Metadata columns preceding the question columns.
pub const METADATA_COLUMNS: [&str; 4] = ["Response ID", "Submitted At", "Responder", "Email"];

/// Separator used when a list answer is flattened into one cell.
pub const LIST_SEPARATOR: &str = "; ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// One exported question column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportColumn {
    pub question_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub question_type: String,
    pub order: i32,
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Flattened table: `headers` are the metadata columns followed by one
/// header per question column.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub columns: Vec<ExportColumn>,
    pub rows: Vec<Vec<String>>,
}

/// Columns for a form: every answerable, non-section question in tree
/// order, then any question ids answered but no longer on the form.
pub fn export_columns(form: &Form, responses: &[FormResponse]) -> Vec<ExportColumn> {
    let mut columns: Vec<ExportColumn> = walk_questions(&form.questions)
        .into_iter()
        .filter(|node| {
            node.question.kind.is_answerable()
                && !matches!(node.question.kind, QuestionKind::Section { .. })
        })
        .map(|node| ExportColumn {
            question_id: node.question.id.clone(),
            title: resolve(&node.question.title, Some(DEFAULT_LOCALE)).to_string(),
            question_type: node.question.kind.type_name().to_string(),
            order: node.question.order,
            depth: node.depth,
            parent_id: node.parent_id.map(str::to_string),
        })
        .collect();

    let mut known: HashSet<String> = walk_questions(&form.questions)
        .into_iter()
        .map(|node| node.question.id.clone())
        .collect();

    for response in responses {
        for answer in &response.answers {
            if known.insert(answer.question_id.clone()) {
                columns.push(ExportColumn {
                    question_id: answer.question_id.clone(),
                    title: answer.question_id.clone(),
                    question_type: "unknown".to_string(),
                    order: i32::MAX,
                    depth: 0,
                    parent_id: None,
                });
            }
        }
    }
    columns
}

pub fn build_table(form: &Form, responses: &[FormResponse]) -> ExportTable {
    let columns = export_columns(form, responses);

    let headers = METADATA_COLUMNS
        .iter()
        .map(|h| h.to_string())
        .chain(columns.iter().map(|c| c.title.clone()))
        .collect();

    let rows = responses
        .iter()
        .map(|response| {
            let answers = flatten_answers(response);
            let mut row = vec![
                response.id().to_string(),
                format_timestamp(response.submitted_at),
                response.responder.map(|u| u.to_string()).unwrap_or_default(),
                response.email.clone().unwrap_or_default(),
            ];
            row.extend(columns.iter().map(|c| {
                answers
                    .get(c.question_id.as_str())
                    .map(|v| format_value(v))
                    .unwrap_or_default()
            }));
            row
        })
        .collect();

    ExportTable {
        headers,
        columns,
        rows,
    }
}

/// Render the table as CSV text.
pub fn to_csv(table: &ExportTable) -> ServiceResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.headers).map_err(csv_error)?;
    for row in &table.rows {
        writer.write_record(row).map_err(csv_error)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ServiceError::Internal(format!("Failed to flush CSV: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| ServiceError::Internal(format!("CSV is not UTF-8: {}", e)))
}

fn csv_error(e: csv::Error) -> ServiceError {
    ServiceError::Internal(format!("Failed to write CSV: {}", e))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonExport {
    pub form_id: String,
    pub title: String,
    pub exported_at: DateTime<Utc>,
    pub questions: Vec<ExportColumn>,
    pub responses: Vec<JsonExportResponse>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonExportResponse {
    pub id: String,
    pub submitted_at: DateTime<Utc>,
    pub responder: Option<String>,
    pub email: Option<String>,
    pub answers: Vec<JsonExportAnswer>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonExportAnswer {
    pub question_id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: String,
    pub value: AnswerValue,
}

/// Structured export: one object per response with question metadata
/// embedded in each answer.
pub fn build_json(form: &Form, responses: &[FormResponse], now: DateTime<Utc>) -> JsonExport {
    let columns = export_columns(form, responses);
    let by_id: HashMap<&str, &ExportColumn> =
        columns.iter().map(|c| (c.question_id.as_str(), c)).collect();

    let responses = responses
        .iter()
        .map(|response| JsonExportResponse {
            id: response.id().to_string(),
            submitted_at: response.submitted_at,
            responder: response.responder.map(|u| u.to_string()),
            email: response.email.clone(),
            answers: response
                .answers
                .iter()
                .map(|answer| {
                    let column = by_id.get(answer.question_id.as_str());
                    let question_type = form
                        .find_question(&answer.question_id)
                        .map(|q| q.kind.type_name().to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    JsonExportAnswer {
                        question_id: answer.question_id.clone(),
                        question: column
                            .map(|c| c.title.clone())
                            .or_else(|| {
                                form.find_question(&answer.question_id)
                                    .map(|q| resolve(&q.title, Some(DEFAULT_LOCALE)).to_string())
                            })
                            .unwrap_or_else(|| answer.question_id.clone()),
                        question_type,
                        value: answer.value.clone(),
                    }
                })
                .collect(),
        })
        .collect();

    JsonExport {
        form_id: form.id().to_string(),
        title: resolve(&form.title, Some(DEFAULT_LOCALE)).to_string(),
        exported_at: now,
        questions: columns,
        responses,
    }
}

/// Answer values keyed by question id, with section maps expanded so that
/// sub-question answers can be looked up directly.
fn flatten_answers(response: &FormResponse) -> HashMap<&str, &AnswerValue> {
    let mut flat = HashMap::new();
    let mut stack: Vec<(&str, &AnswerValue)> = response
        .answers
        .iter()
        .map(|a| (a.question_id.as_str(), &a.value))
        .collect();

    while let Some((id, value)) = stack.pop() {
        if let AnswerValue::Map(entries) = value {
            stack.extend(entries.iter().map(|(k, v)| (k.as_str(), v)));
        }
        flat.entry(id).or_insert(value);
    }
    flat
}

/// Render one answer as a table cell.
pub fn format_value(value: &AnswerValue) -> String {
    match value {
        AnswerValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        AnswerValue::Number(n) => n.to_string(),
        AnswerValue::Text(s) => s.clone(),
        AnswerValue::List(items) => items.join(LIST_SEPARATOR),
        AnswerValue::Map(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// File name for a download, e.g. `responses-<form id>.csv`.
pub fn export_file_name(form: &Form, format: ExportFormat) -> String {
    format!("responses-{}.{}", form.id(), format.extension())
}

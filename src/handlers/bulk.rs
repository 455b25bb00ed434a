// Bulk upload handlers
// CSV upload running each row through the registration pipeline

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::auth::VerifiedUser;
use crate::error::ApiError;
use crate::handlers::vocabulary::register_word;
use crate::models::word::CreateWordRequest;
use crate::state::AppState;

/// Upper bound on data rows per upload; everything beyond it is rejected.
pub const MAX_BULK_ROWS: usize = 50;

const TEMPLATE_CSV: &str = "word,source_lang,target_lang,deck\n\
                            mariposa,es,en,animals\n\
                            lluvia,es,en,weather\n";

#[derive(Debug, Serialize)]
pub struct BulkRowResult {
    pub row: usize,
    pub word: String,
    pub success: bool,
    pub entry_id: Option<i32>,
    pub error: Option<String>,
}

/// Parses the uploaded CSV into per-row registration requests.
/// Expected header: `word,source_lang,target_lang[,deck]`.
pub fn parse_bulk_csv(data: &[u8]) -> Result<Vec<CreateWordRequest>, ApiError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| ApiError::Validation(format!("Invalid CSV: {}", e)))?
        .clone();

    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let word_col = column("word")
        .ok_or_else(|| ApiError::validation("CSV is missing the 'word' column"))?;
    let source_col = column("source_lang")
        .ok_or_else(|| ApiError::validation("CSV is missing the 'source_lang' column"))?;
    let target_col = column("target_lang")
        .ok_or_else(|| ApiError::validation("CSV is missing the 'target_lang' column"))?;
    let deck_col = column("deck");

    let mut requests = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| ApiError::Validation(format!("Invalid CSV row {}: {}", index + 1, e)))?;

        if requests.len() >= MAX_BULK_ROWS {
            return Err(ApiError::Validation(format!(
                "Bulk upload is limited to {} rows",
                MAX_BULK_ROWS
            )));
        }

        let field = |col: usize| record.get(col).unwrap_or("").to_string();

        requests.push(CreateWordRequest {
            word: field(word_col),
            source_lang: field(source_col),
            target_lang: field(target_col),
            context: None,
            deck: deck_col.map(field).filter(|d| !d.is_empty()),
            image_url: None,
        });
    }

    if requests.is_empty() {
        return Err(ApiError::validation("CSV contains no data rows"));
    }

    Ok(requests)
}

/// Upload a CSV of words
/// POST /api/vocabulary/bulk-upload
///
/// Rows are processed independently; one failing row does not abort the
/// batch, it just shows up in the per-row report.
pub async fn bulk_upload(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut data = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Invalid multipart upload: {}", e)))?
    {
        if field.name() == Some("file") || data.is_none() {
            data = Some(field.bytes().await.map_err(|e| {
                ApiError::Validation(format!("Failed to read uploaded file: {}", e))
            })?);
        }
    }

    let data = data.ok_or_else(|| ApiError::validation("No file was uploaded"))?;
    let requests = parse_bulk_csv(&data)?;

    info!(
        "Bulk upload of {} rows for user {}",
        requests.len(),
        user.id
    );

    let mut results = Vec::with_capacity(requests.len());
    let mut created = 0;

    for (index, request) in requests.iter().enumerate() {
        match register_word(&state, &user, request).await {
            Ok(user_word) => {
                created += 1;
                results.push(BulkRowResult {
                    row: index + 1,
                    word: request.word.clone(),
                    success: true,
                    entry_id: Some(user_word.id),
                    error: None,
                });
            }
            Err(e) => {
                warn!("Bulk upload row {} failed: {}", index + 1, e);
                results.push(BulkRowResult {
                    row: index + 1,
                    word: request.word.clone(),
                    success: false,
                    entry_id: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let failed = results.len() - created;
    info!(
        "Bulk upload finished for user {}: {} created, {} failed",
        user.id, created, failed
    );

    Ok((
        StatusCode::OK,
        Json(json!({
            "created": created,
            "failed": failed,
            "results": results
        })),
    ))
}

/// Download the CSV template for bulk upload
/// GET /api/vocabulary/bulk-upload-template
pub async fn bulk_upload_template() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"bulk_upload_template.csv\"".to_string(),
            ),
        ],
        TEMPLATE_CSV,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bulk_csv() {
        let csv = b"word,source_lang,target_lang,deck\n\
                    mariposa,es,en,animals\n\
                    lluvia,es,en,\n";

        let requests = parse_bulk_csv(csv).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].word, "mariposa");
        assert_eq!(requests[0].deck, Some("animals".to_string()));
        assert_eq!(requests[1].word, "lluvia");
        assert_eq!(requests[1].deck, None);
    }

    #[test]
    fn test_parse_bulk_csv_without_deck_column() {
        let csv = b"word,source_lang,target_lang\nmariposa,es,en\n";

        let requests = parse_bulk_csv(csv).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].deck, None);
    }

    #[test]
    fn test_parse_bulk_csv_header_is_case_insensitive() {
        let csv = b"Word,Source_Lang,TARGET_LANG\nmariposa,es,en\n";

        let requests = parse_bulk_csv(csv).unwrap();
        assert_eq!(requests[0].source_lang, "es");
    }

    #[test]
    fn test_parse_bulk_csv_rejects_missing_columns() {
        let csv = b"word,target_lang\nmariposa,en\n";
        assert!(parse_bulk_csv(csv).is_err());
    }

    #[test]
    fn test_parse_bulk_csv_rejects_empty_file() {
        assert!(parse_bulk_csv(b"word,source_lang,target_lang\n").is_err());
    }

    #[test]
    fn test_parse_bulk_csv_enforces_row_cap() {
        let mut csv = String::from("word,source_lang,target_lang\n");
        for i in 0..(MAX_BULK_ROWS + 1) {
            csv.push_str(&format!("word{},es,en\n", i));
        }

        assert!(parse_bulk_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_template_matches_expected_columns() {
        let requests = parse_bulk_csv(TEMPLATE_CSV.as_bytes()).unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.validate().is_ok()));
    }
}

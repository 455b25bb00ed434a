use chrono::{DateTime, Utc};
use serde::Serialize;

/// Audit record of one generated deck export.
/// `word_ids` keeps the exported entry ids comma-joined, matching what the
/// export file was built from.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadHistory {
    pub id: i32,
    pub deck_name: String,
    pub word_ids: String,
    pub file_path: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_history_serialization() {
        let entry = DownloadHistory {
            id: 3,
            deck_name: "animals".to_string(),
            word_ids: "1,2,5".to_string(),
            file_path: "media/generated_apkg/user_x/aiflashlang_animals_ab12cd34.apkg"
                .to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&entry).expect("Failed to serialize history entry");
        assert_eq!(json["deck_name"], "animals");
        assert_eq!(json["word_ids"], "1,2,5");
    }
}

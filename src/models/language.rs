use serde::{Deserialize, Serialize};

/// Reference data for a supported language pair endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub id: i32,
    pub code: String,
    pub name: String,
}

/// UI languages an account can pick as its preferred language.
/// Kept separate from the `languages` table, which drives vocabulary pairs.
pub const PREFERRED_LANGUAGES: [(&str, &str); 4] = [
    ("es", "Español"),
    ("en", "English"),
    ("fr-CA", "Français (Canada)"),
    ("pt-BR", "Português (Brasil)"),
];

pub fn is_supported_preferred_language(code: &str) -> bool {
    PREFERRED_LANGUAGES.iter().any(|(c, _)| *c == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_language_lookup() {
        assert!(is_supported_preferred_language("es"));
        assert!(is_supported_preferred_language("pt-BR"));
        assert!(!is_supported_preferred_language("pt-br"));
        assert!(!is_supported_preferred_language("tlh"));
    }

    #[test]
    fn test_language_serialization() {
        let language = Language {
            id: 1,
            code: "en".to_string(),
            name: "English".to_string(),
        };

        let json = serde_json::to_string(&language).expect("Failed to serialize language");
        assert_eq!(json, r#"{"id":1,"code":"en","name":"English"}"#);
    }
}

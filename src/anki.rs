use std::path::Path;

use genanki_rs::{Deck, Field, Model, Note, Package, Template};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::ApiError;
use crate::media::sanitize_file_name;

/// Stable note model id; changing it would make re-imported decks duplicate
/// their notes in Anki.
pub const FLASHLANG_MODEL_ID: i64 = 1607392319;

const CARD_CSS: &str = "
    .card {
        font-family: Arial;
        text-align: center;
        color: #333;
        background-color: #f9f9f9;
    }
";

/// One flashcard worth of resolved content, ready for packaging.
#[derive(Debug, Clone)]
pub struct DeckCard {
    pub word: String,
    pub translation: String,
    pub example: String,
    pub example_translation: String,
    pub word_audio: Option<String>,
    pub sentence_audio: Option<String>,
    pub image_url: Option<String>,
}

impl DeckCard {
    /// Field values in model order, with Anki sound/image markup applied.
    fn fields(&self) -> [String; 7] {
        [
            self.word.clone(),
            self.translation.clone(),
            self.example.clone(),
            self.example_translation.clone(),
            self.word_audio
                .as_deref()
                .map(sound_tag)
                .unwrap_or_default(),
            self.sentence_audio
                .as_deref()
                .map(sound_tag)
                .unwrap_or_default(),
            self.image_url
                .as_deref()
                .map(|url| format!("<img src='{}'>", url))
                .unwrap_or_default(),
        ]
    }
}

fn sound_tag(file_name: &str) -> String {
    // Anki expects bare file names inside [sound:...]
    let name = file_name.rsplit('/').next().unwrap_or(file_name);
    format!("[sound:{}]", name)
}

fn flashlang_model() -> Model {
    Model::new(
        FLASHLANG_MODEL_ID,
        "FlashLang Card Model",
        vec![
            Field::new("Word"),
            Field::new("Translation"),
            Field::new("Example"),
            Field::new("ExampleTranslation"),
            Field::new("WordAudio"),
            Field::new("SentenceAudio"),
            Field::new("Image"),
        ],
        vec![Template::new("FlashLang Card")
            .qfmt("<div style='font-size: 30px;'>{{Word}}</div><br>{{WordAudio}}")
            .afmt(
                "{{FrontSide}}<hr>\
                 <div style='font-size: 20px;'>{{Translation}}</div>\
                 <div style='margin-top: 10px;'>{{Example}}</div>\
                 <div style='color: gray;'>{{ExampleTranslation}}</div>\
                 {{SentenceAudio}}\
                 <div>{{Image}}</div>",
            )],
    )
    .css(CARD_CSS)
}

/// Deterministic deck id in Anki's expected range, derived from the deck
/// name so rebuilding the same deck updates it instead of duplicating it.
pub fn deck_id_for(deck_name: &str) -> i64 {
    let digest = Sha256::digest(deck_name.as_bytes());
    let raw = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) as i64;
    (1 << 30) + (raw % (1 << 30))
}

/// Short content hash over the backing content row keys of an export set.
/// Order-insensitive, so the same selection always maps to the same file.
pub fn content_hash(content_keys: &[String]) -> String {
    let mut sorted = content_keys.to_vec();
    sorted.sort();

    let digest = Sha256::digest(sorted.join("|").as_bytes());
    format!("{:x}", digest)[..8].to_string()
}

pub fn sanitize_deck_name(deck_name: &str) -> String {
    sanitize_file_name(&deck_name.trim().replace(' ', "_"))
}

pub fn package_file_name(deck_name: &str, hash: &str) -> String {
    format!("aiflashlang_{}_{}.apkg", sanitize_deck_name(deck_name), hash)
}

/// Builds the `.apkg` at `output`, embedding every referenced audio file
/// that exists under `audio_dir`.
pub fn build_package(
    deck_name: &str,
    owner: &str,
    cards: &[DeckCard],
    audio_dir: &Path,
    output: &Path,
) -> Result<(), ApiError> {
    let model = flashlang_model();
    let mut deck = Deck::new(
        deck_id_for(deck_name),
        &format!("AIflashLang {} - {}", deck_name, owner),
        "Generated by AI FlashLang",
    );

    let mut media_files: Vec<String> = Vec::new();

    for card in cards {
        let fields = card.fields();
        let note = Note::new(model.clone(), fields.iter().map(String::as_str).collect())
            .map_err(|e| {
                ApiError::Internal(anyhow::anyhow!("Anki note build failed: {}", e))
            })?;
        deck.add_note(note);

        for audio in [card.word_audio.as_deref(), card.sentence_audio.as_deref()]
            .into_iter()
            .flatten()
        {
            let path = audio_dir.join(audio);
            if path.exists() {
                media_files.push(path.to_string_lossy().into_owned());
            }
        }
    }

    media_files.sort();
    media_files.dedup();

    let output_str = output
        .to_str()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("Non-UTF8 export path")))?;

    let mut package = Package::new(
        vec![deck],
        media_files.iter().map(String::as_str).collect(),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("Anki package build failed: {}", e)))?;

    package
        .write_to_file(output_str)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Anki package write failed: {}", e)))?;

    info!(
        "Built Anki package {} ({} cards, {} media files)",
        output.display(),
        cards.len(),
        media_files.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(word: &str) -> DeckCard {
        DeckCard {
            word: word.to_string(),
            translation: format!("{}-en", word),
            example: format!("Una frase con {}.", word),
            example_translation: format!("A sentence with {}.", word),
            word_audio: Some(format!("{}_es-en_word.mp3", word)),
            sentence_audio: None,
            image_url: None,
        }
    }

    #[test]
    fn test_content_hash_is_order_insensitive() {
        let a = content_hash(&["s1".to_string(), "c2".to_string(), "s9".to_string()]);
        let b = content_hash(&["s9".to_string(), "s1".to_string(), "c2".to_string()]);
        let c = content_hash(&["s1".to_string(), "c2".to_string()]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 8);
    }

    #[test]
    fn test_deck_id_is_deterministic_and_in_range() {
        let id = deck_id_for("animals");
        assert_eq!(id, deck_id_for("animals"));
        assert_ne!(id, deck_id_for("travel"));
        assert!(id >= 1 << 30);
        assert!(id < 1 << 31);
    }

    #[test]
    fn test_package_file_name() {
        assert_eq!(
            package_file_name("my animals", "ab12cd34"),
            "aiflashlang_my_animals_ab12cd34.apkg"
        );
    }

    #[test]
    fn test_card_fields_markup() {
        let mut card = card("mariposa");
        card.sentence_audio = Some("mariposa_es-en_sentence.mp3".to_string());
        card.image_url = Some("https://example.com/m.png".to_string());

        let fields = card.fields();
        assert_eq!(fields[0], "mariposa");
        assert_eq!(fields[4], "[sound:mariposa_es-en_word.mp3]");
        assert_eq!(fields[5], "[sound:mariposa_es-en_sentence.mp3]");
        assert_eq!(fields[6], "<img src='https://example.com/m.png'>");
    }

    #[test]
    fn test_missing_media_renders_empty_fields() {
        let mut card = card("sol");
        card.word_audio = None;

        let fields = card.fields();
        assert_eq!(fields[4], "");
        assert_eq!(fields[5], "");
        assert_eq!(fields[6], "");
    }

    #[test]
    fn test_build_package_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let audio_dir = dir.path().join("audio");
        std::fs::create_dir_all(&audio_dir).unwrap();
        std::fs::write(audio_dir.join("mariposa_es-en_word.mp3"), b"ID3fake").unwrap();

        let output = dir.path().join("aiflashlang_animals_ab12cd34.apkg");
        build_package(
            "animals",
            "ana",
            &[card("mariposa"), card("sol")],
            &audio_dir,
            &output,
        )
        .unwrap();

        assert!(output.exists());
        assert!(std::fs::metadata(&output).unwrap().len() > 0);
    }
}

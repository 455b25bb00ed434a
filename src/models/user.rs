use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::language::is_supported_preferred_language;

/// 登録済みアカウントのドメインモデル。
/// `password_hash` と `verification_token` を含むため、レスポンスには
/// `UserProfile` へ変換してから載せる。
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub display_name: Option<String>,
    pub password_hash: String,
    pub preferred_language: String,
    pub avatar_url: Option<String>,
    pub is_premium: bool,
    pub is_verified: bool,
    pub verification_token: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of an account, safe to serialize into API responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub preferred_language: String,
    pub avatar_url: Option<String>,
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// 新規アカウントを未検証状態で組み立てる。
    /// UUID・検証トークン・タイムスタンプはここで採番する。
    pub fn new(
        email: String,
        username: String,
        display_name: Option<String>,
        password_hash: String,
        preferred_language: String,
    ) -> Self {
        let now = Utc::now();

        User {
            id: Uuid::new_v4(),
            email,
            username,
            display_name,
            password_hash,
            preferred_language,
            avatar_url: None,
            is_premium: false,
            is_verified: false,
            verification_token: Some(Uuid::new_v4()),
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            username: user.username.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            preferred_language: user.preferred_language.clone(),
            avatar_url: user.avatar_url.clone(),
            is_premium: user.is_premium,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
    pub preferred_language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub preferred_language: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendVerificationRequest {
    pub email: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), String> {
        // Validate email
        if self.email.trim().is_empty() {
            return Err("Email cannot be empty".to_string());
        }

        if !is_valid_email(self.email.trim()) {
            return Err("Invalid email format".to_string());
        }

        if self.email.len() > 255 {
            return Err("Email cannot exceed 255 characters".to_string());
        }

        // Validate username
        let username = self.username.trim();
        if username.len() < 3 {
            return Err("Username must be at least 3 characters".to_string());
        }

        if username.len() > 150 {
            return Err("Username cannot exceed 150 characters".to_string());
        }

        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || "._-".contains(c))
        {
            return Err(
                "Username may only contain letters, digits, dots, dashes and underscores"
                    .to_string(),
            );
        }

        // Validate password
        if self.password.len() < 8 {
            return Err("Password must be at least 8 characters".to_string());
        }

        if self.password.len() > 128 {
            return Err("Password cannot exceed 128 characters".to_string());
        }

        // Validate preferred language if provided
        if let Some(ref code) = self.preferred_language {
            if !is_supported_preferred_language(code) {
                return Err(format!("Unsupported preferred language '{}'", code));
            }
        }

        if let Some(ref display_name) = self.display_name {
            if display_name.len() > 100 {
                return Err("Display name cannot exceed 100 characters".to_string());
            }
        }

        Ok(())
    }

    pub fn get_normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }

    pub fn get_normalized_username(&self) -> String {
        self.username.trim().to_string()
    }

    /// トリム後に空なら None へ落とす。
    pub fn get_normalized_display_name(&self) -> Option<String> {
        self.display_name
            .as_ref()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
    }

    pub fn get_preferred_language(&self) -> String {
        self.preferred_language
            .clone()
            .unwrap_or_else(|| "es".to_string())
    }
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.display_name.is_none()
            && self.preferred_language.is_none()
            && self.avatar_url.is_none()
        {
            return Err(
                "At least one field (display_name, preferred_language or avatar_url) must be provided for update"
                    .to_string(),
            );
        }

        if let Some(ref display_name) = self.display_name {
            if display_name.len() > 100 {
                return Err("Display name cannot exceed 100 characters".to_string());
            }
        }

        if let Some(ref code) = self.preferred_language {
            if !is_supported_preferred_language(code) {
                return Err(format!("Unsupported preferred language '{}'", code));
            }
        }

        if let Some(ref avatar_url) = self.avatar_url {
            if avatar_url.len() > 500 {
                return Err("Avatar URL cannot exceed 500 characters".to_string());
            }
        }

        Ok(())
    }

    pub fn get_normalized_display_name(&self) -> Option<String> {
        self.display_name.as_ref().map(|n| n.trim().to_string())
    }

    pub fn get_normalized_avatar_url(&self) -> Option<String> {
        self.avatar_url.as_ref().map(|u| u.trim().to_string())
    }
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.current_password.is_empty() {
            return Err("Current password cannot be empty".to_string());
        }

        if self.new_password.len() < 8 {
            return Err("New password must be at least 8 characters".to_string());
        }

        if self.new_password.len() > 128 {
            return Err("New password cannot exceed 128 characters".to_string());
        }

        if self.new_password == self.current_password {
            return Err("New password must differ from the current password".to_string());
        }

        Ok(())
    }
}

/// シンプルなメールフォーマット検証。
/// 正規表現を使わず `split('@')` で最小限のルールだけ確認する。
pub fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();

    if parts.len() != 2 {
        return false;
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || local.len() > 64 {
        return false;
    }

    if domain.is_empty() || domain.len() > 253 {
        return false;
    }

    if !domain.contains('.') {
        return false;
    }

    let valid_chars = |c: char| c.is_alphanumeric() || ".-_+".contains(c);

    local.chars().all(valid_chars) && domain.chars().all(|c| c.is_alphanumeric() || ".-".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            email: "ana@example.com".to_string(),
            username: "ana".to_string(),
            password: "correcthorse".to_string(),
            display_name: Some("Ana".to_string()),
            preferred_language: Some("es".to_string()),
        }
    }

    #[test]
    fn test_register_request_validation() {
        assert!(register_request().validate().is_ok());

        let mut invalid_email = register_request();
        invalid_email.email = "not-an-email".to_string();
        assert!(invalid_email.validate().is_err());

        let mut short_password = register_request();
        short_password.password = "short".to_string();
        assert!(short_password.validate().is_err());

        let mut short_username = register_request();
        short_username.username = "ab".to_string();
        assert!(short_username.validate().is_err());

        let mut bad_language = register_request();
        bad_language.preferred_language = Some("xx".to_string());
        assert!(bad_language.validate().is_err());
    }

    #[test]
    fn test_register_request_normalization() {
        let request = RegisterRequest {
            email: "  Ana@Example.COM ".to_string(),
            username: " ana ".to_string(),
            password: "correcthorse".to_string(),
            display_name: Some("   ".to_string()),
            preferred_language: None,
        };

        assert_eq!(request.get_normalized_email(), "ana@example.com");
        assert_eq!(request.get_normalized_username(), "ana");
        assert_eq!(request.get_normalized_display_name(), None);
        assert_eq!(request.get_preferred_language(), "es");
    }

    #[test]
    fn test_update_profile_request_validation() {
        let valid = UpdateProfileRequest {
            display_name: Some("Ana Banana".to_string()),
            preferred_language: None,
            avatar_url: None,
        };
        assert!(valid.validate().is_ok());

        let empty = UpdateProfileRequest {
            display_name: None,
            preferred_language: None,
            avatar_url: None,
        };
        assert!(empty.validate().is_err());

        let bad_language = UpdateProfileRequest {
            display_name: None,
            preferred_language: Some("xx".to_string()),
            avatar_url: None,
        };
        assert!(bad_language.validate().is_err());
    }

    #[test]
    fn test_change_password_request_validation() {
        let valid = ChangePasswordRequest {
            current_password: "oldpassword".to_string(),
            new_password: "newpassword".to_string(),
        };
        assert!(valid.validate().is_ok());

        let same = ChangePasswordRequest {
            current_password: "samepassword".to_string(),
            new_password: "samepassword".to_string(),
        };
        assert!(same.validate().is_err());

        let short = ChangePasswordRequest {
            current_password: "oldpassword".to_string(),
            new_password: "short".to_string(),
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("test@example.com"));
        assert!(is_valid_email("user.name@domain.co.uk"));
        assert!(is_valid_email("user+tag@example.org"));

        assert!(!is_valid_email("invalid"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@domain"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_user_profile_hides_credentials() {
        let user = User {
            id: Uuid::new_v4(),
            email: "ana@example.com".to_string(),
            username: "ana".to_string(),
            display_name: None,
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$secret".to_string(),
            preferred_language: "es".to_string(),
            avatar_url: None,
            is_premium: false,
            is_verified: true,
            verification_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let profile = UserProfile::from(&user);
        let json = serde_json::to_string(&profile).expect("Failed to serialize profile");

        assert!(json.contains("ana@example.com"));
        assert!(!json.contains("argon2id"));
    }
}

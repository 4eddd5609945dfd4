use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The user's profile sections. Entry shapes are owned by the backend, so
/// each entry stays raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub projects: Vec<Value>,
    #[serde(default)]
    pub experiences: Vec<Value>,
    #[serde(default)]
    pub skills: Vec<Value>,
}

impl UserProfile {
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.experiences.is_empty() && self.skills.is_empty()
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdateRequest<'a> {
    pub user_uuid: &'a str,
    pub projects: &'a [Value],
    pub experiences: &'a [Value],
    pub skills: &'a [Value],
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdateResponse {
    pub message: Option<String>,
}

/// Best display title for a profile entry: a plain string, or the first
/// of the usual name-like keys.
pub fn entry_title(entry: &Value) -> String {
    const TITLE_KEYS: [&str; 6] = ["name", "title", "role", "company", "skill", "category"];

    if let Some(text) = entry.as_str() {
        return text.to_string();
    }
    TITLE_KEYS
        .iter()
        .find_map(|key| entry.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| entry.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_title_prefers_name_like_keys() {
        assert_eq!(entry_title(&json!("Rust")), "Rust");
        assert_eq!(entry_title(&json!({"title": "CLI tool", "x": 1})), "CLI tool");
        assert_eq!(
            entry_title(&json!({"company": "Acme", "role": "Intern"})),
            "Intern"
        );
        assert_eq!(entry_title(&json!({"years": 2})), "{\"years\":2}");
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let profile: UserProfile = serde_json::from_value(json!({"skills": ["Go"]})).unwrap();
        assert!(profile.projects.is_empty());
        assert_eq!(profile.skills, vec![json!("Go")]);
        assert!(!profile.is_empty());
    }
}

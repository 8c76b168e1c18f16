use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL of the remote nutrition API, including the version prefix.
    pub api_base_url: String,
    /// BCP 47 language tag sent as `Accept-Language` on every request.
    pub locale: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_base_url = std::env::var("API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8000/api/v1".into());
        let locale = std::env::var("MEALTRACK_LOCALE")
            .ok()
            .or_else(|| std::env::var("LANG").ok().and_then(|l| lang_to_locale(&l)))
            .unwrap_or_else(|| "en-US".into());
        Ok(Self {
            api_base_url,
            locale,
        })
    }
}

/// Turn a POSIX locale string like `ja_JP.UTF-8` into a language tag
/// (`ja-JP`). `C` and `POSIX` carry no language information.
fn lang_to_locale(lang: &str) -> Option<String> {
    let base = lang.split('.').next().unwrap_or(lang);
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lang_to_locale_strips_encoding_and_maps_separator() {
        assert_eq!(lang_to_locale("ja_JP.UTF-8"), Some("ja-JP".to_string()));
        assert_eq!(lang_to_locale("en_US"), Some("en-US".to_string()));
        assert_eq!(lang_to_locale("fr"), Some("fr".to_string()));
    }

    #[test]
    fn lang_to_locale_rejects_c_and_posix() {
        assert_eq!(lang_to_locale("C"), None);
        assert_eq!(lang_to_locale("C.UTF-8"), None);
        assert_eq!(lang_to_locale("POSIX"), None);
        assert_eq!(lang_to_locale(""), None);
    }
}

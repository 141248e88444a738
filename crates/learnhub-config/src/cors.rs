use std::env;

#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn from_env() -> Self {
        Self::from_value(env::var("ALLOWED_ORIGINS").ok().as_deref())
    }

    fn from_value(value: Option<&str>) -> Self {
        let allowed_origins = value
            .unwrap_or("http://localhost:3000,http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self { allowed_origins }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_origins() {
        let config = CorsConfig::from_value(None);
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:3000", "http://localhost:5173"]
        );
    }

    #[test]
    fn test_origins_are_trimmed_and_filtered() {
        let config = CorsConfig::from_value(Some(" https://admin.example.com , ,https://app.example.com"));
        assert_eq!(
            config.allowed_origins,
            vec!["https://admin.example.com", "https://app.example.com"]
        );
    }
}

use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::llm_client::DEFAULT_API_BASE;
use crate::parser::segmenter::{SegmenterConfig, DEFAULT_MAX_HEADING_CHARS, DEFAULT_SECTION_KEYWORDS};
use crate::scoring::DEFAULT_SCORE_CAP;

const DEFAULT_LLM_CALL_TIMEOUT_SECS: u64 = 30;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Per-call bound for every rewrite and embedding request.
    pub llm_call_timeout: Duration,
    pub match_score_cap: f64,
    pub segmenter: SegmenterConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let max_heading_chars = optional_env("HEADING_MAX_CHARS")
            .map(|v| v.parse::<usize>())
            .transpose()
            .context("HEADING_MAX_CHARS must be a positive integer")?
            .unwrap_or(DEFAULT_MAX_HEADING_CHARS);

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm_call_timeout: Duration::from_secs(
                optional_env("LLM_CALL_TIMEOUT_SECS")
                    .map(|v| v.parse::<u64>())
                    .transpose()
                    .context("LLM_CALL_TIMEOUT_SECS must be a whole number of seconds")?
                    .unwrap_or(DEFAULT_LLM_CALL_TIMEOUT_SECS),
            ),
            match_score_cap: parse_score_cap(optional_env("MATCH_SCORE_CAP").as_deref())?,
            segmenter: parse_segmenter(
                optional_env("SECTION_KEYWORDS").as_deref(),
                max_heading_chars,
            )?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_score_cap(raw: Option<&str>) -> Result<f64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_SCORE_CAP);
    };
    let cap: f64 = raw
        .trim()
        .parse()
        .context("MATCH_SCORE_CAP must be a number")?;
    if !(0.0..=100.0).contains(&cap) {
        return Err(anyhow!("MATCH_SCORE_CAP must be within 0..=100, got {cap}"));
    }
    Ok(cap)
}

/// `SECTION_KEYWORDS` is a comma-separated, ordered keyword list.
fn parse_segmenter(keywords: Option<&str>, max_heading_chars: usize) -> Result<SegmenterConfig> {
    if max_heading_chars == 0 {
        return Err(anyhow!("HEADING_MAX_CHARS must be greater than zero"));
    }
    let result = match keywords {
        Some(list) => SegmenterConfig::from_keywords(list.split(','), max_heading_chars),
        None => SegmenterConfig::from_keywords(DEFAULT_SECTION_KEYWORDS.iter(), max_heading_chars),
    };
    result.map_err(|e| anyhow!("Invalid SECTION_KEYWORDS: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::segmenter::SectionKind;

    #[test]
    fn test_default_segmenter_matches_builtin_list() {
        let config = parse_segmenter(None, DEFAULT_MAX_HEADING_CHARS).unwrap();
        assert_eq!(config, SegmenterConfig::default());
    }

    #[test]
    fn test_custom_keywords_are_parsed_in_order() {
        let config = parse_segmenter(Some(" Work History, skills ,,Side Projects"), 40).unwrap();
        let keywords: Vec<_> = config.headings.iter().map(|h| h.keyword.as_str()).collect();
        assert_eq!(keywords, ["work history", "skills", "side projects"]);
        assert_eq!(config.headings[2].section, SectionKind::Projects);
        assert_eq!(config.max_heading_chars, 40);
    }

    #[test]
    fn test_unmappable_keyword_is_rejected() {
        let err = parse_segmenter(Some("hobbies"), 50).unwrap_err();
        assert!(err.to_string().contains("SECTION_KEYWORDS"));
        assert!(parse_segmenter(None, 0).is_err());
    }

    #[test]
    fn test_score_cap_bounds() {
        assert_eq!(parse_score_cap(None).unwrap(), DEFAULT_SCORE_CAP);
        assert_eq!(parse_score_cap(Some("90")).unwrap(), 90.0);
        assert!(parse_score_cap(Some("120")).is_err());
        assert!(parse_score_cap(Some("high")).is_err());
    }
}

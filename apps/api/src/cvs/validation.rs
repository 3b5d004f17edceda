//! Boundary validation for CV saves. Runs before any policy or persistence
//! work so bad input never reaches the store.

use serde_json::Value;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_LABEL_LEN: usize = 50;
pub const MAX_HTML_BYTES: usize = 2 * 1024 * 1024;

pub const DEFAULT_TITLE: &str = "My CV";
pub const DEFAULT_INDUSTRY: &str = "general";
pub const DEFAULT_TEMPLATE: &str = "modern";

#[derive(Debug, Clone)]
pub struct ValidatedCvInput {
    pub title: String,
    pub industry: String,
    pub template: String,
    pub html: String,
    pub form_data: Option<Value>,
}

pub fn validate_cv_input(
    html_content: &str,
    title: Option<&str>,
    industry: Option<&str>,
    template: Option<&str>,
    form_data: Option<Value>,
) -> Result<ValidatedCvInput, String> {
    let html = html_content.trim();
    if html.is_empty() {
        return Err("html_content must not be empty".to_string());
    }
    if html.len() > MAX_HTML_BYTES {
        return Err(format!(
            "html_content exceeds the {}MB limit",
            MAX_HTML_BYTES / (1024 * 1024)
        ));
    }

    let title = defaulted(title, DEFAULT_TITLE);
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(format!("title must be at most {MAX_TITLE_LEN} characters"));
    }

    let industry = defaulted(industry, DEFAULT_INDUSTRY);
    if industry.chars().count() > MAX_LABEL_LEN {
        return Err(format!(
            "industry must be at most {MAX_LABEL_LEN} characters"
        ));
    }

    let template = defaulted(template, DEFAULT_TEMPLATE);
    if template.chars().count() > MAX_LABEL_LEN {
        return Err(format!(
            "template must be at most {MAX_LABEL_LEN} characters"
        ));
    }

    Ok(ValidatedCvInput {
        title,
        industry,
        template,
        html: html.to_string(),
        form_data,
    })
}

fn defaulted(value: Option<&str>, default: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let input = validate_cv_input("<p>x</p>", None, None, None, None).unwrap();
        assert_eq!(input.title, DEFAULT_TITLE);
        assert_eq!(input.industry, DEFAULT_INDUSTRY);
        assert_eq!(input.template, DEFAULT_TEMPLATE);
    }

    #[test]
    fn test_blank_title_falls_back_to_default() {
        let input = validate_cv_input("<p>x</p>", Some("   "), None, None, None).unwrap();
        assert_eq!(input.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_empty_html_rejected() {
        assert!(validate_cv_input("   ", None, None, None, None).is_err());
    }

    #[test]
    fn test_oversized_html_rejected() {
        let html = "a".repeat(MAX_HTML_BYTES + 1);
        assert!(validate_cv_input(&html, None, None, None, None).is_err());
    }

    #[test]
    fn test_html_at_limit_accepted() {
        let html = "a".repeat(MAX_HTML_BYTES);
        assert!(validate_cv_input(&html, None, None, None, None).is_ok());
    }

    #[test]
    fn test_overlong_title_rejected() {
        let title = "t".repeat(MAX_TITLE_LEN + 1);
        assert!(validate_cv_input("<p>x</p>", Some(&title), None, None, None).is_err());
    }

    #[test]
    fn test_overlong_labels_rejected() {
        let label = "l".repeat(MAX_LABEL_LEN + 1);
        assert!(validate_cv_input("<p>x</p>", None, Some(&label), None, None).is_err());
        assert!(validate_cv_input("<p>x</p>", None, None, Some(&label), None).is_err());
    }
}

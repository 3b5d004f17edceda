//! Generation semantics: authorize, call the external generator, charge
//! exactly one token for free-tier users.

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::generation::client::CvGenerator;
use crate::policy;
use crate::store::Store;

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedCv {
    pub html: String,
    /// Remaining credits for free users; `None` for Pro (unlimited).
    pub tokens_left: Option<i32>,
}

/// Generates a CV for the user. The token charge and the generation-counter
/// bump land together after a successful upstream call, so a failed call
/// never consumes a credit — at most one charge per generation.
pub async fn generate_cv(
    store: &dyn Store,
    generator: &dyn CvGenerator,
    user_id: &str,
    form_data: &Value,
    template: &str,
    industry: &str,
) -> Result<GeneratedCv, AppError> {
    let user = store
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

    if !policy::can_generate(&user).is_allowed() {
        return Err(AppError::Forbidden(
            "No generation credits remaining — upgrade to Pro for unlimited CVs".to_string(),
        ));
    }

    let html = generator
        .generate(form_data, template, industry)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let new_tokens = policy::tokens_after_generation(&user);
    store.record_generation(user_id, new_tokens).await?;

    info!("Generated CV for user {user_id} (template: {template})");
    Ok(GeneratedCv {
        html,
        tokens_left: if user.is_pro { None } else { Some(new_tokens) },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::client::GenerationError;
    use crate::store::memory::{test_user, MemStore};
    use async_trait::async_trait;
    use serde_json::json;

    struct CannedGenerator {
        fail: bool,
    }

    #[async_trait]
    impl CvGenerator for CannedGenerator {
        async fn generate(
            &self,
            _form_data: &Value,
            template: &str,
            _industry: &str,
        ) -> Result<String, GenerationError> {
            if self.fail {
                return Err(GenerationError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(format!("<html><body>{template}</body></html>"))
        }
    }

    #[tokio::test]
    async fn test_free_user_charged_one_token() {
        let store = MemStore::new();
        store.seed_user(test_user("u", false, 3));
        let generator = CannedGenerator { fail: false };

        let result = generate_cv(&store, &generator, "u", &json!({}), "modern", "software")
            .await
            .unwrap();
        assert_eq!(result.tokens_left, Some(2));
        assert!(result.html.contains("modern"));

        let user = store.user("u").unwrap();
        assert_eq!(user.tokens, 2);
        assert_eq!(user.total_generations, 1);
    }

    #[tokio::test]
    async fn test_pro_user_not_decremented() {
        let store = MemStore::new();
        store.seed_user(test_user("pro", true, 999));
        let generator = CannedGenerator { fail: false };

        let result = generate_cv(&store, &generator, "pro", &json!({}), "modern", "software")
            .await
            .unwrap();
        assert_eq!(result.tokens_left, None);
        assert_eq!(store.user("pro").unwrap().tokens, 999);
        assert_eq!(store.user("pro").unwrap().total_generations, 1);
    }

    #[tokio::test]
    async fn test_out_of_tokens_denied() {
        let store = MemStore::new();
        store.seed_user(test_user("u", false, 0));
        let generator = CannedGenerator { fail: false };

        let err = generate_cv(&store, &generator, "u", &json!({}), "modern", "software")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(store.user("u").unwrap().total_generations, 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_does_not_charge() {
        let store = MemStore::new();
        store.seed_user(test_user("u", false, 3));
        let generator = CannedGenerator { fail: true };

        let err = generate_cv(&store, &generator, "u", &json!({}), "modern", "software")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));

        let user = store.user("u").unwrap();
        assert_eq!(user.tokens, 3);
        assert_eq!(user.total_generations, 0);
    }

    #[tokio::test]
    async fn test_unknown_user_not_found() {
        let store = MemStore::new();
        let generator = CannedGenerator { fail: false };
        let err = generate_cv(&store, &generator, "ghost", &json!({}), "modern", "software")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

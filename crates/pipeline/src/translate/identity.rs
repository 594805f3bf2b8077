use async_trait::async_trait;

use super::TranslationBackend;

/// Test/dev translation backend. Makes no network call and produces a
/// deterministic, clearly-tagged pseudo-translation so tests can assert on
/// fan-out shape without a real translation model.
pub struct IdentityTranslationBackend;

#[async_trait]
impl TranslationBackend for IdentityTranslationBackend {
    async fn translate(&self, text: &str, _source: &str, target: &str) -> anyhow::Result<String> {
        Ok(format!("[{target}] {text}"))
    }

    fn name(&self) -> &str {
        "identity"
    }
}

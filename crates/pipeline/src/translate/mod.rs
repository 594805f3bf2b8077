pub mod identity;
pub mod remote_http;

use async_trait::async_trait;

/// Trait for pluggable translation backends.
///
/// `source` and `target` are model tags (Flores-style `xxx_Scrp`), already
/// resolved through the `LanguageRegistry` — backends never see short tags.
#[async_trait]
pub trait TranslationBackend: Send + Sync + 'static {
    async fn translate(&self, text: &str, source: &str, target: &str) -> anyhow::Result<String>;

    fn name(&self) -> &str;
}

use serde::{Deserialize, Serialize};

use super::block::CacheBlock;

/// Raiz do arquivo de cache de tradução que a view de revisão abre.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct TranslationCache {
    #[serde(default)]
    pub blocks: Vec<CacheBlock>,

    #[serde(default)]
    pub glossary_path: String,

    #[serde(default)]
    pub model_name: String,
}

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::block::CacheBlock;
use crate::model::cache::TranslationCache;

pub fn load(path: &Path) -> Result<TranslationCache, String> {
    if !path.exists() {
        return Err("cache file not found".to_string());
    }

    let data = fs::read_to_string(path).map_err(|e| e.to_string())?;

    let mut cache: TranslationCache =
        serde_json::from_str(&data).map_err(|e| format!("invalid cache file: {e}"))?;

    normalize(&mut cache);

    Ok(cache)
}

pub fn save(path: &Path, cache: &TranslationCache) -> Result<(), String> {
    let mut cache = cache.clone();
    normalize(&mut cache);

    let json = serde_json::to_string_pretty(&cache).map_err(|e| e.to_string())?;

    write_atomic(path, json.as_bytes())
}

/// Deixa o cache consistente: contagens de linhas atualizadas,
/// blocos sem duplicata de índice e ordenados.
pub fn normalize(cache: &mut TranslationCache) {
    for block in cache.blocks.iter_mut() {
        block.refresh_line_counts();
    }

    let mut by_index: HashMap<usize, CacheBlock> = HashMap::new();

    for block in cache.blocks.drain(..) {
        match by_index.get_mut(&block.index) {
            None => {
                by_index.insert(block.index, block);
            }
            Some(existing) => {
                let keep_new = pick_better(existing, &block);
                if keep_new {
                    *existing = block;
                }
            }
        }
    }

    let mut blocks: Vec<CacheBlock> = by_index.into_values().collect();
    blocks.sort_by_key(|b| b.index);

    cache.blocks = blocks;
}

fn pick_better(current: &CacheBlock, candidate: &CacheBlock) -> bool {
    let cur_empty = current.dst.trim().is_empty();
    let cand_empty = candidate.dst.trim().is_empty();

    if cur_empty && !cand_empty {
        return true;
    }
    if !cur_empty && cand_empty {
        return false;
    }

    candidate.dst.len() > current.dst.len()
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), String> {
    let tmp = tmp_path(path);

    if let Some(parent) = tmp.parent() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }

    fs::write(&tmp, bytes).map_err(|e| e.to_string())?;

    if path.exists() {
        fs::remove_file(path).map_err(|e| e.to_string())?;
    }

    fs::rename(&tmp, path).map_err(|e| e.to_string())?;

    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut p = path.to_path_buf();
    let file_name = match path.file_name().and_then(|s| s.to_str()) {
        Some(n) => n.to_string(),
        None => "cache".to_string(),
    };
    p.set_file_name(format!("{file_name}.tmp"));
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(index: usize, src: &str, dst: &str) -> CacheBlock {
        CacheBlock {
            index,
            src: src.to_string(),
            dst: dst.to_string(),
            src_lines: 0,
            dst_lines: 0,
            warnings: Vec::new(),
            cot: String::new(),
            retry_history: Vec::new(),
        }
    }

    #[test]
    fn normalize_sorts_blocks_by_index() {
        let mut cache = TranslationCache {
            blocks: vec![block(2, "c", "z"), block(0, "a", "x"), block(1, "b", "y")],
            ..Default::default()
        };

        normalize(&mut cache);

        let indices: Vec<usize> = cache.blocks.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn normalize_refreshes_line_counts() {
        let mut cache = TranslationCache {
            blocks: vec![block(0, "a\n\nb\n", "x\n\n\n")],
            ..Default::default()
        };

        normalize(&mut cache);

        assert_eq!(cache.blocks[0].src_lines, 2);
        assert_eq!(cache.blocks[0].dst_lines, 1);
    }

    #[test]
    fn duplicate_index_keeps_the_non_empty_translation() {
        let mut cache = TranslationCache {
            blocks: vec![block(0, "a", ""), block(0, "a", "tradução")],
            ..Default::default()
        };

        normalize(&mut cache);

        assert_eq!(cache.blocks.len(), 1);
        assert_eq!(cache.blocks[0].dst, "tradução");
    }

    #[test]
    fn duplicate_index_prefers_the_longer_translation() {
        let mut cache = TranslationCache {
            blocks: vec![block(0, "a", "curta"), block(0, "a", "tradução mais longa")],
            ..Default::default()
        };

        normalize(&mut cache);

        assert_eq!(cache.blocks.len(), 1);
        assert_eq!(cache.blocks[0].dst, "tradução mais longa");
    }

    #[test]
    fn duplicate_index_does_not_downgrade_to_empty() {
        let mut cache = TranslationCache {
            blocks: vec![block(0, "a", "tradução"), block(0, "a", "")],
            ..Default::default()
        };

        normalize(&mut cache);

        assert_eq!(cache.blocks[0].dst, "tradução");
    }

    #[test]
    fn cache_json_round_trip() {
        let json = r#"{
            "blocks": [
                { "index": 0, "src": "原文", "dst": "译文", "warnings": ["kana_residue"] }
            ],
            "glossaryPath": "glossaries/main.json",
            "modelName": "test-model"
        }"#;

        let mut cache: TranslationCache = serde_json::from_str(json).unwrap();
        normalize(&mut cache);

        assert_eq!(cache.blocks.len(), 1);
        assert_eq!(cache.blocks[0].src_lines, 1);
        assert_eq!(cache.glossary_path, "glossaries/main.json");
        assert_eq!(cache.model_name, "test-model");

        let v = serde_json::to_value(&cache).unwrap();
        assert_eq!(
            v.get("glossaryPath").and_then(|s| s.as_str()),
            Some("glossaries/main.json")
        );
    }
}

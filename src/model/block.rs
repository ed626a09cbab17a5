use serde::{Deserialize, Serialize};

/// Conta apenas linhas com conteúdo real (ignora linhas em branco).
pub fn content_lines(text: &str) -> usize {
    text.lines().filter(|l| !l.trim().is_empty()).count()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RetryRecord {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CacheBlock {
    pub index: usize,

    #[serde(default)]
    pub src: String,

    #[serde(default)]
    pub dst: String,

    #[serde(default)]
    pub src_lines: usize,

    #[serde(default)]
    pub dst_lines: usize,

    #[serde(default)]
    pub warnings: Vec<String>,

    #[serde(default)]
    pub cot: String,

    // Histórico de retries só aparece no arquivo quando existe.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retry_history: Vec<RetryRecord>,
}

impl CacheBlock {
    /// Recalcula src_lines/dst_lines a partir do texto atual.
    /// Retorna true quando alguma contagem mudou.
    pub fn refresh_line_counts(&mut self) -> bool {
        let src_lines = content_lines(&self.src);
        let dst_lines = content_lines(&self.dst);

        let changed = src_lines != self.src_lines || dst_lines != self.dst_lines;

        self.src_lines = src_lines;
        self.dst_lines = dst_lines;

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_lines_ignores_blank_lines() {
        assert_eq!(content_lines("a\n\nb\n"), 2);
        assert_eq!(content_lines("x\n\n\n"), 1);
        assert_eq!(content_lines(""), 0);
    }

    #[test]
    fn refresh_line_counts_reports_changes() {
        let mut block = CacheBlock {
            index: 0,
            src: "a\n\nb\n".to_string(),
            dst: "x\n\n\n".to_string(),
            src_lines: 0,
            dst_lines: 0,
            warnings: Vec::new(),
            cot: String::new(),
            retry_history: Vec::new(),
        };

        assert!(block.refresh_line_counts());
        assert_eq!(block.src_lines, 2);
        assert_eq!(block.dst_lines, 1);
        assert!(!block.refresh_line_counts());
    }

    #[test]
    fn retry_history_is_omitted_when_empty() {
        let mut block = CacheBlock {
            index: 1,
            src: "a".to_string(),
            dst: "b".to_string(),
            src_lines: 1,
            dst_lines: 1,
            warnings: Vec::new(),
            cot: String::new(),
            retry_history: Vec::new(),
        };

        let v = serde_json::to_value(&block).unwrap();
        assert!(v.get("retryHistory").is_none());
        assert_eq!(v.get("srcLines").and_then(|n| n.as_u64()), Some(1));

        block.retry_history.push(RetryRecord {
            reason: "glossary".to_string(),
        });

        let v = serde_json::to_value(&block).unwrap();
        assert!(v.get("retryHistory").is_some());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let block: CacheBlock = serde_json::from_str(r#"{ "index": 3 }"#).unwrap();
        assert_eq!(block.index, 3);
        assert!(block.src.is_empty());
        assert!(block.warnings.is_empty());
        assert!(block.retry_history.is_empty());
    }
}

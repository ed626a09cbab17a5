use serde::{Deserialize, Serialize};

use crate::model::block::{content_lines, CacheBlock};
use crate::model::glossary::GlossaryEntry;
use crate::services::glossary;
use crate::services::heuristics::{residue, similarity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QualityIssue {
    pub block_index: usize,
    pub code: String,
    pub severity: Severity,
    pub message: String,
}

pub struct CheckConfig<'a> {
    pub source_lang: &'a str,
    pub similarity_threshold: f64,
    pub residue_info_max: usize,
    pub line_diff_warn_abs: usize,
    pub line_diff_warn_ratio: f64,
}

impl<'a> CheckConfig<'a> {
    pub fn new(source_lang: &'a str) -> Self {
        CheckConfig {
            source_lang,
            similarity_threshold: 0.9,
            residue_info_max: 3,
            line_diff_warn_abs: 3,
            line_diff_warn_ratio: 0.2,
        }
    }
}

pub fn run(
    blocks: &[CacheBlock],
    glossary_entries: &[GlossaryEntry],
    cfg: &CheckConfig,
) -> Vec<QualityIssue> {
    let mut issues: Vec<QualityIssue> = Vec::new();

    for block in blocks {
        issues.extend(check_block(block, glossary_entries, cfg));
    }

    issues
}

pub fn check_block(
    block: &CacheBlock,
    glossary_entries: &[GlossaryEntry],
    cfg: &CheckConfig,
) -> Vec<QualityIssue> {
    let mut issues: Vec<QualityIssue> = Vec::new();

    let src = block.src.trim();
    let dst = block.dst.trim();

    // Checagem só faz sentido para blocos com texto original
    if src.is_empty() {
        return issues;
    }

    // Saída vazia suprime as demais checagens do bloco
    if dst.is_empty() {
        issues.push(QualityIssue {
            block_index: block.index,
            code: "empty_output".to_string(),
            severity: Severity::Error,
            message: "Tradução vazia para bloco com texto original".to_string(),
        });
        return issues;
    }

    // Resquício da escrita do idioma de origem na saída
    match cfg.source_lang {
        "ja" => {
            let count = residue::count_kana(dst);
            if count > 0 {
                issues.push(residue_issue(block.index, "kana_residue", "kana", count, cfg));
            }
        }
        "ko" => {
            let count = residue::count_hangeul(dst);
            if count > 0 {
                issues.push(residue_issue(block.index, "hangeul_residue", "hangeul", count, cfg));
            }
        }
        _ => {}
    }

    // Termos do glossário presentes no original e ausentes da tradução
    let report = glossary::detect_miss(src, dst, glossary_entries, &block.cot);
    if !report.missed.is_empty() {
        let mut message = format!(
            "Termos do glossário não aplicados: {}",
            report.missed.join(", ")
        );
        if !report.cot_found.is_empty() {
            message.push_str(&format!(" (presentes no CoT: {})", report.cot_found.join(", ")));
        }

        issues.push(QualityIssue {
            block_index: block.index,
            code: "glossary_missed".to_string(),
            severity: Severity::Warning,
            message,
        });
    }

    // Bloco inteiro praticamente igual ao original
    let ratio = similarity::calculate_similarity(src, dst);
    if ratio >= cfg.similarity_threshold {
        issues.push(QualityIssue {
            block_index: block.index,
            code: "high_similarity".to_string(),
            severity: Severity::Warning,
            message: format!("Tradução muito similar ao original (similaridade {ratio:.2})"),
        });
    }

    // Linhas individuais suspeitas de não tradução
    let lines = similarity::find_high_similarity_lines(&block.src, &block.dst);
    if !lines.is_empty() {
        let list = lines
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        issues.push(QualityIssue {
            block_index: block.index,
            code: "similar_lines".to_string(),
            severity: Severity::Warning,
            message: format!("Linhas possivelmente não traduzidas: {list}"),
        });
    }

    // Divergência na contagem de linhas com conteúdo
    let src_lines = content_lines(&block.src);
    let dst_lines = content_lines(&block.dst);

    if src_lines != dst_lines {
        let diff = src_lines.abs_diff(dst_lines);
        let ratio = diff as f64 / src_lines.max(1) as f64;

        let severity = if diff >= cfg.line_diff_warn_abs || ratio >= cfg.line_diff_warn_ratio {
            Severity::Warning
        } else {
            Severity::Info
        };

        issues.push(QualityIssue {
            block_index: block.index,
            code: "line_mismatch".to_string(),
            severity,
            message: format!(
                "Contagem de linhas divergente (origem {src_lines}, tradução {dst_lines})"
            ),
        });
    }

    issues
}

fn residue_issue(
    block_index: usize,
    code: &str,
    script: &str,
    count: usize,
    cfg: &CheckConfig,
) -> QualityIssue {
    let severity = if count <= cfg.residue_info_max {
        Severity::Info
    } else {
        Severity::Warning
    };

    QualityIssue {
        block_index,
        code: code.to_string(),
        severity,
        message: format!("Resquício de {script} na tradução ({count} caracteres)"),
    }
}

/// Contagem por código, na ordem da primeira ocorrência.
pub fn count_by_code(issues: &[QualityIssue]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();

    for issue in issues {
        match counts.iter_mut().find(|(code, _)| *code == issue.code) {
            Some((_, n)) => *n += 1,
            None => counts.push((issue.code.clone(), 1)),
        }
    }

    counts
}

/// Resumo compacto para log: "kana_residue x2, line_mismatch x1".
pub fn format_for_log(issues: &[QualityIssue]) -> String {
    count_by_code(issues)
        .iter()
        .map(|(code, n)| format!("{code} x{n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

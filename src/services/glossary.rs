use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::model::glossary::GlossaryEntry;
use crate::services::encoding;

#[derive(Debug, Serialize)]
pub struct GlossaryMissReport {
    pub missed: Vec<String>,
    pub cot_found: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GlossaryCoverage {
    pub passed: bool,
    pub output_coverage: f64,
    pub cot_coverage: f64,
    pub hit: usize,
    pub total: usize,
}

/// Carrega um glossário do disco.
///
/// - `.json`: objeto plano { "origem": "destino" }, ordem preservada
/// - `.txt`: uma entrada por linha, `chave=valor` ou `chave:valor`,
///   linhas em branco e comentários `#` ignorados
/// - outras extensões: glossário vazio
pub fn load(path: &Path) -> Result<Vec<GlossaryEntry>, String> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    let text = encoding::read_text_file(path)?;

    match ext.as_str() {
        "json" => parse_json(&text),
        "txt" => Ok(parse_lines(&text)),
        _ => Ok(Vec::new()),
    }
}

fn parse_json(text: &str) -> Result<Vec<GlossaryEntry>, String> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| format!("invalid glossary json: {e}"))?;

    let obj = value
        .as_object()
        .ok_or_else(|| "glossary json must be an object".to_string())?;

    let mut entries: Vec<GlossaryEntry> = Vec::with_capacity(obj.len());

    for (source, target) in obj {
        let target = match target.as_str() {
            Some(t) => t.trim(),
            None => continue,
        };

        push_entry(&mut entries, source.trim(), target);
    }

    Ok(entries)
}

fn parse_lines(text: &str) -> Vec<GlossaryEntry> {
    let mut entries: Vec<GlossaryEntry> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Tenta '=' primeiro, depois ':'.
        let (source, target) = if let Some((k, v)) = line.split_once('=') {
            (k, v)
        } else if let Some((k, v)) = line.split_once(':') {
            (k, v)
        } else {
            continue;
        };

        push_entry(&mut entries, source.trim(), target.trim());
    }

    entries
}

// Chave repetida atualiza a entrada existente, mantendo a posição original.
fn push_entry(entries: &mut Vec<GlossaryEntry>, source: &str, target: &str) {
    if source.is_empty() {
        return;
    }

    if let Some(existing) = entries.iter_mut().find(|e| e.source == source) {
        existing.target = target.to_string();
    } else {
        entries.push(GlossaryEntry {
            source: source.to_string(),
            target: target.to_string(),
        });
    }
}

/// Termos do glossário presentes no original mas ausentes da tradução.
///
/// Comparação por substring literal, sem normalização. Termos perdidos que
/// aparecem no chain-of-thought entram também em `cot_found` (o modelo
/// "considerou" o termo mas não o aplicou).
pub fn detect_miss(
    src: &str,
    dst: &str,
    glossary: &[GlossaryEntry],
    cot: &str,
) -> GlossaryMissReport {
    let mut missed = Vec::new();
    let mut cot_found = Vec::new();

    for entry in glossary {
        if entry.source.is_empty() || !src.contains(&entry.source) {
            continue;
        }

        if dst.contains(&entry.target) {
            continue;
        }

        missed.push(format!("{} → {}", entry.source, entry.target));

        if !cot.is_empty() && cot.contains(&entry.source) {
            cot_found.push(entry.source.clone());
        }
    }

    GlossaryMissReport { missed, cot_found }
}

/// Cobertura de glossário do bloco, em porcentagem.
///
/// Passa quando a cobertura na saída atinge `output_hit_threshold` ou a
/// cobertura no chain-of-thought atinge `cot_coverage_threshold`.
pub fn coverage(
    src: &str,
    dst: &str,
    glossary: &[GlossaryEntry],
    cot: &str,
    output_hit_threshold: f64,
    cot_coverage_threshold: f64,
) -> GlossaryCoverage {
    let in_source: Vec<&GlossaryEntry> = glossary
        .iter()
        .filter(|e| !e.source.is_empty() && src.contains(&e.source))
        .collect();

    let total = in_source.len();

    // Sem termos aplicáveis não há o que cobrar.
    if total == 0 {
        return GlossaryCoverage {
            passed: true,
            output_coverage: 100.0,
            cot_coverage: 100.0,
            hit: 0,
            total: 0,
        };
    }

    let hit = in_source.iter().filter(|e| dst.contains(&e.target)).count();

    let cot_hit = if cot.is_empty() {
        0
    } else {
        in_source.iter().filter(|e| cot.contains(&e.source)).count()
    };

    let output_coverage = hit as f64 * 100.0 / total as f64;
    let cot_coverage = cot_hit as f64 * 100.0 / total as f64;

    let passed =
        output_coverage >= output_hit_threshold || cot_coverage >= cot_coverage_threshold;

    GlossaryCoverage {
        passed,
        output_coverage,
        cot_coverage,
        hit,
        total,
    }
}

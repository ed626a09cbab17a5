use std::path::Path;

use serde_json::{json, Map, Value};

use crate::model::block::CacheBlock;
use crate::model::cache::TranslationCache;
use crate::model::glossary::GlossaryEntry;
use crate::services::heuristics::{residue, similarity};
use crate::services::{cache, glossary, quality};

mod command;
use command::Command;

fn get_cmd(req: &Value) -> &str {
    req.get("cmd").and_then(|v| v.as_str()).unwrap_or("")
}

fn get_id(req: &Value) -> Value {
    req.get("id").cloned().unwrap_or(Value::Null)
}

fn get_payload<'a>(req: &'a Value) -> &'a Value {
    static EMPTY: Value = Value::Null;
    req.get("payload").unwrap_or(&EMPTY)
}

fn get_str<'a>(payload: &'a Value, key: &str) -> &'a str {
    payload.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn ok(id: Value, payload: Value) -> String {
    json!({
        "id": id,
        "status": "ok",
        "payload": payload
    })
    .to_string()
}

fn err(id: Value, message: impl Into<String>) -> String {
    json!({
        "id": id,
        "status": "error",
        "message": message.into()
    })
    .to_string()
}

fn parse_blocks_from_payload(payload: &Value) -> Result<Vec<CacheBlock>, String> {
    let arr = payload
        .get("blocks")
        .and_then(|v| v.as_array())
        .ok_or_else(|| "payload.blocks must be an array".to_string())?;

    let mut blocks: Vec<CacheBlock> = Vec::with_capacity(arr.len());

    for (i, v) in arr.iter().cloned().enumerate() {
        match serde_json::from_value::<CacheBlock>(v) {
            Ok(b) => blocks.push(b),
            Err(e) => return Err(format!("invalid block at index {}: {}", i, e)),
        }
    }

    Ok(blocks)
}

// Glossário inline (objeto plano, na ordem do payload) ou via glossary_path.
fn parse_glossary_from_payload(payload: &Value) -> Result<Vec<GlossaryEntry>, String> {
    if let Some(obj) = payload.get("glossary").and_then(|v| v.as_object()) {
        let mut entries: Vec<GlossaryEntry> = Vec::with_capacity(obj.len());

        for (source, target) in obj {
            let target = match target.as_str() {
                Some(t) => t,
                None => continue,
            };
            if source.is_empty() {
                continue;
            }
            entries.push(GlossaryEntry {
                source: source.clone(),
                target: target.to_string(),
            });
        }

        return Ok(entries);
    }

    let path = get_str(payload, "glossary_path");
    if !path.is_empty() {
        return glossary::load(Path::new(path));
    }

    Ok(Vec::new())
}

fn issue_summary(issues: &[quality::QualityIssue]) -> Value {
    let mut by_code = Map::new();
    for (code, n) in quality::count_by_code(issues) {
        by_code.insert(code, json!(n));
    }

    json!({
        "total": issues.len(),
        "by_code": by_code,
        "log": quality::format_for_log(issues),
    })
}

pub fn handle(input: &str) -> String {
    let req: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(_) => {
            return json!({
                "status": "error",
                "message": "invalid json"
            })
            .to_string();
        }
    };

    let id = get_id(&req);
    let cmd_str = get_cmd(&req);
    let payload = get_payload(&req);

    let _cmd = Command::from(cmd_str);

    match cmd_str {
        "ping" => ok(id, json!({ "message": "murasaki-core alive" })),

        "check_text" => {
            let src = get_str(payload, "src");
            let dst = get_str(payload, "dst");
            let cot = get_str(payload, "cot");

            let entries = match parse_glossary_from_payload(payload) {
                Ok(v) => v,
                Err(e) => return err(id, e),
            };

            let report = glossary::detect_miss(src, dst, &entries, cot);

            ok(
                id,
                json!({
                    "similarity": similarity::calculate_similarity(src, dst),
                    "similar_lines": similarity::find_high_similarity_lines(src, dst),
                    "kana_residue": residue::count_kana(dst),
                    "hangeul_residue": residue::count_hangeul(dst),
                    "glossary": {
                        "missed": report.missed,
                        "cot_found": report.cot_found,
                    },
                }),
            )
        }

        "check_blocks" => {
            let blocks = match parse_blocks_from_payload(payload) {
                Ok(v) => v,
                Err(e) => return err(id, e),
            };

            let entries = match parse_glossary_from_payload(payload) {
                Ok(v) => v,
                Err(e) => return err(id, e),
            };

            let source_lang = payload
                .get("source_lang")
                .and_then(|v| v.as_str())
                .unwrap_or("ja");

            let mut cfg = quality::CheckConfig::new(source_lang);
            if let Some(t) = payload.get("similarity_threshold").and_then(|v| v.as_f64()) {
                cfg.similarity_threshold = t;
            }

            let issues = quality::run(&blocks, &entries, &cfg);
            let summary = issue_summary(&issues);

            ok(
                id,
                json!({
                    "issues": issues,
                    "summary": summary,
                }),
            )
        }

        "glossary.load" => {
            let path = get_str(payload, "path");
            if path.is_empty() {
                return err(id, "payload.path is required");
            }

            match glossary::load(Path::new(path)) {
                Ok(entries) => ok(
                    id,
                    json!({
                        "count": entries.len(),
                        "entries": entries,
                    }),
                ),
                Err(e) => err(id, e),
            }
        }

        "glossary.coverage" => {
            let src = get_str(payload, "src");
            let dst = get_str(payload, "dst");
            let cot = get_str(payload, "cot");

            let output_hit_threshold = payload
                .get("output_hit_threshold")
                .and_then(|v| v.as_f64())
                .unwrap_or(100.0);
            let cot_coverage_threshold = payload
                .get("cot_coverage_threshold")
                .and_then(|v| v.as_f64())
                .unwrap_or(80.0);

            let entries = match parse_glossary_from_payload(payload) {
                Ok(v) => v,
                Err(e) => return err(id, e),
            };

            let cov = glossary::coverage(
                src,
                dst,
                &entries,
                cot,
                output_hit_threshold,
                cot_coverage_threshold,
            );

            ok(id, serde_json::to_value(cov).unwrap_or(json!({})))
        }

        "cache.open" => {
            let path = get_str(payload, "path");
            if path.is_empty() {
                return err(id, "payload.path is required");
            }

            match cache::load(Path::new(path)) {
                Ok(c) => ok(id, json!({ "cache": c })),
                Err(e) => err(id, e),
            }
        }

        "cache.save" => {
            let path = get_str(payload, "path");
            if path.is_empty() {
                return err(id, "payload.path is required");
            }

            let cache_val = payload.get("cache").cloned().unwrap_or(Value::Null);
            if cache_val.is_null() {
                return err(id, "payload.cache is required");
            }

            let c: TranslationCache = match serde_json::from_value(cache_val) {
                Ok(v) => v,
                Err(e) => return err(id, format!("invalid payload.cache: {e}")),
            };

            match cache::save(Path::new(path), &c) {
                Ok(()) => ok(id, json!({ "saved": true })),
                Err(e) => err(id, e),
            }
        }

        "cache.update_block" => {
            let path = get_str(payload, "path");
            if path.is_empty() {
                return err(id, "payload.path is required");
            }

            let index = match payload.get("index").and_then(|v| v.as_u64()) {
                Some(i) => i as usize,
                None => return err(id, "payload.index is required"),
            };

            let dst = get_str(payload, "dst");
            let source_lang = payload
                .get("source_lang")
                .and_then(|v| v.as_str())
                .unwrap_or("ja");

            let mut c = match cache::load(Path::new(path)) {
                Ok(c) => c,
                Err(e) => return err(id, e),
            };

            // Glossário referenciado pelo próprio cache; falha aqui não
            // bloqueia a correção do bloco.
            let entries = if c.glossary_path.is_empty() {
                Vec::new()
            } else {
                match glossary::load(Path::new(&c.glossary_path)) {
                    Ok(v) => v,
                    Err(e) => {
                        eprintln!("[cache] failed to load glossary: {e}");
                        Vec::new()
                    }
                }
            };

            let cfg = quality::CheckConfig::new(source_lang);

            let (block_json, issues) = {
                let block = match c.blocks.iter_mut().find(|b| b.index == index) {
                    Some(b) => b,
                    None => return err(id, format!("block {index} not found in cache")),
                };

                block.dst = dst.to_string();
                block.refresh_line_counts();

                let issues = quality::check_block(block, &entries, &cfg);
                block.warnings = issues.iter().map(|i| i.code.clone()).collect();

                (json!(block.clone()), issues)
            };

            if let Err(e) = cache::save(Path::new(path), &c) {
                return err(id, e);
            }

            ok(
                id,
                json!({
                    "block": block_json,
                    "issues": issues,
                }),
            )
        }

        _ => err(id, "unknown command"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(response: &str) -> Value {
        serde_json::from_str(response).unwrap()
    }

    #[test]
    fn ping_answers_alive() {
        let resp = parse(&handle(r#"{ "id": 1, "cmd": "ping" }"#));
        assert_eq!(resp["status"], "ok");
        assert_eq!(resp["payload"]["message"], "murasaki-core alive");
    }

    #[test]
    fn malformed_json_is_an_error() {
        let resp = parse(&handle("{ nope"));
        assert_eq!(resp["status"], "error");
        assert_eq!(resp["message"], "invalid json");
    }

    #[test]
    fn unknown_command_is_an_error() {
        let resp = parse(&handle(r#"{ "id": 2, "cmd": "nope" }"#));
        assert_eq!(resp["status"], "error");
    }

    #[test]
    fn check_text_reports_all_detectors() {
        let req = r#"{
            "id": 3,
            "cmd": "check_text",
            "payload": {
                "src": "魔法の本\n次の行",
                "dst": "魔法の本\n另一行あ",
                "glossary": { "魔法": "Magic" }
            }
        }"#;

        let resp = parse(&handle(req));
        assert_eq!(resp["status"], "ok");

        let payload = &resp["payload"];
        assert_eq!(payload["similar_lines"], json!([1]));
        assert_eq!(payload["kana_residue"], json!(2));
        assert_eq!(payload["hangeul_residue"], json!(0));
        assert_eq!(payload["glossary"]["missed"], json!(["魔法 → Magic"]));
    }

    #[test]
    fn check_blocks_summarizes_issues() {
        let req = r#"{
            "id": 4,
            "cmd": "check_blocks",
            "payload": {
                "source_lang": "ja",
                "blocks": [
                    { "index": 0, "src": "原文のテキスト", "dst": "" }
                ]
            }
        }"#;

        let resp = parse(&handle(req));
        assert_eq!(resp["status"], "ok");
        assert_eq!(resp["payload"]["summary"]["total"], json!(1));
        assert_eq!(resp["payload"]["summary"]["by_code"]["empty_output"], json!(1));
        assert_eq!(resp["payload"]["summary"]["log"], "empty_output x1");
    }

    #[test]
    fn check_blocks_requires_a_block_array() {
        let resp = parse(&handle(r#"{ "id": 5, "cmd": "check_blocks", "payload": {} }"#));
        assert_eq!(resp["status"], "error");
    }

    #[test]
    fn cache_open_requires_a_path() {
        let resp = parse(&handle(r#"{ "id": 6, "cmd": "cache.open", "payload": {} }"#));
        assert_eq!(resp["status"], "error");
        assert_eq!(resp["message"], "payload.path is required");
    }

    #[test]
    fn glossary_coverage_uses_default_thresholds() {
        let req = r#"{
            "id": 7,
            "cmd": "glossary.coverage",
            "payload": {
                "src": "foo",
                "dst": "missing",
                "cot": "foo",
                "glossary": { "foo": "bar" }
            }
        }"#;

        let resp = parse(&handle(req));
        assert_eq!(resp["status"], "ok");
        assert_eq!(resp["payload"]["passed"], json!(true));
        assert_eq!(resp["payload"]["output_coverage"], json!(0.0));
        assert_eq!(resp["payload"]["cot_coverage"], json!(100.0));
    }
}

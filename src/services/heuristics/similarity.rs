use std::collections::HashSet;

use regex::Regex;

use super::residue;

/// Limiar de similaridade por linha para suspeitar de linha não traduzida.
pub const LINE_SIMILARITY_THRESHOLD: f64 = 0.9;

/// Linhas muito curtas (ex.: nome de um ideograma só) ficam de fora.
pub const MIN_LINE_CHARS: usize = 2;

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Razão de similaridade em [0, 1], insensível a whitespace.
///
/// Normaliza removendo todo whitespace e compara os conjuntos de
/// caracteres (Jaccard). Strings normalizadas iguais valem 1.0.
pub fn calculate_similarity(a: &str, b: &str) -> f64 {
    let norm_a = strip_whitespace(a);
    let norm_b = strip_whitespace(b);

    if norm_a == norm_b {
        return 1.0;
    }

    let set_a: HashSet<char> = norm_a.chars().collect();
    let set_b: HashSet<char> = norm_b.chars().collect();

    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }

    let intersection = set_a.intersection(&set_b).count();
    intersection as f64 / union as f64
}

/// Índices (1-based, crescentes) das linhas provavelmente não traduzidas.
///
/// Pareia linha a linha; linhas além do texto mais curto nunca são
/// marcadas. Uma linha só é marcada quando a similaridade passa do limiar
/// e ela sobrevive aos filtros de exclusão (tamanho mínimo sem pontuação,
/// padrão de nome de arquivo).
pub fn find_high_similarity_lines(src: &str, dst: &str) -> Vec<usize> {
    // Linhas tipo "1.jpg" são legitimamente idênticas nos dois lados.
    let filename_re = Regex::new(r"(?i)^[\w\-]+\.(jpg|jpeg|png|gif|bmp|webp|avif)$").unwrap();

    let mut flagged = Vec::new();

    for (i, (src_line, dst_line)) in src.lines().zip(dst.lines()).enumerate() {
        let src_line = src_line.trim();
        let dst_line = dst_line.trim();

        if residue::strip_punctuation(src_line).chars().count() < MIN_LINE_CHARS {
            continue;
        }

        if filename_re.is_match(src_line) {
            continue;
        }

        if calculate_similarity(src_line, dst_line) >= LINE_SIMILARITY_THRESHOLD {
            flagged.push(i + 1);
        }
    }

    flagged
}

use std::fs;
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::UTF_8;

/// Lê um arquivo de texto detectando a codificação.
///
/// Glossários vindos de ferramentas japonesas chegam com frequência em
/// Shift-JIS/CP932, então não dá para assumir UTF-8.
pub fn read_text_file(path: &Path) -> Result<String, String> {
    let bytes = fs::read(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    Ok(decode_bytes(&bytes))
}

pub fn decode_bytes(bytes: &[u8]) -> String {
    // BOM UTF-8 (EF BB BF)
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);

    let encoding = detector.guess(None, true);
    let (text, _, had_errors) = encoding.decode(bytes);

    // Palpite ruim: se UTF-8 decodifica limpo, fica com UTF-8.
    if had_errors && encoding != UTF_8 {
        let (utf8_text, _, utf8_errors) = UTF_8.decode(bytes);
        if !utf8_errors {
            return utf8_text.into_owned();
        }
    }

    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_utf8_bom() {
        let bytes = [0xEF, 0xBB, 0xBF, b'a', b'b', b'c'];
        assert_eq!(decode_bytes(&bytes), "abc");
    }

    #[test]
    fn decodes_plain_utf8() {
        assert_eq!(decode_bytes("魔法=Magic".as_bytes()), "魔法=Magic");
    }

    #[test]
    fn decodes_shift_jis() {
        let original = "これは日本語のテキストです。魔法の王国の物語が続きます。";
        let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode(original);
        assert_eq!(decode_bytes(&bytes), original);
    }
}

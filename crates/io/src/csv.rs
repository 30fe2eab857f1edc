// Delimited-text helpers: encoding resolution, delimiter sniffing, field decoding

use std::borrow::Cow;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use encoding_rs::Encoding;

/// How much of a voter file is sampled when sniffing its delimiter.
pub const SNIFF_BYTES: u64 = 64 * 1024;

/// Candidates in tie-break order.
const DELIMITERS: [u8; 3] = [b'|', b'\t', b','];

/// Map a configured label (`iso-8859-1`, `latin1`, `utf-8`, ...) to an encoding.
pub fn resolve_encoding(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}

/// Sniff the delimiter of a file from its first 64 KiB.
pub fn detect_delimiter(path: &Path, encoding: &'static Encoding) -> std::io::Result<u8> {
    let mut sample = Vec::new();
    File::open(path)?.take(SNIFF_BYTES).read_to_end(&mut sample)?;
    let (text, _) = encoding.decode_without_bom_handling(strip_utf8_bom(&sample));
    Ok(sniff_delimiter(&text))
}

/// Count `|`, tab and `,` on the first non-blank line; the most frequent wins.
///
/// Ties go to pipe, then tab, then comma. A line with none of them (or no
/// line at all) falls back to comma.
pub fn sniff_delimiter(content: &str) -> u8 {
    let Some(line) = content.lines().find(|l| !l.trim().is_empty()) else {
        return b',';
    };

    let mut best = b',';
    let mut best_count = 0usize;
    for delim in DELIMITERS {
        let count = line.bytes().filter(|&b| b == delim).count();
        if count > best_count {
            best = delim;
            best_count = count;
        }
    }
    best
}

/// Read file and convert to UTF-8 if needed (falls back to Windows-1252)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };

    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// Decode one field strictly. `None` means the bytes are not valid in
/// `encoding`.
pub fn decode_field<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> Option<Cow<'a, str>> {
    encoding.decode_without_bom_handling_and_without_replacement(bytes)
}

/// Decode one header cell, replacing anything undecodable.
pub fn decode_header(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, _) = encoding.decode_without_bom_handling(strip_utf8_bom(bytes));
    text.into_owned()
}

fn strip_utf8_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sniff_pipe_delimiter() {
        let content = "SOS_VOTERID|FIRST_NAME|LAST_NAME\nOH1|A|B\n";
        assert_eq!(sniff_delimiter(content), b'|');
    }

    #[test]
    fn test_sniff_tab_delimiter() {
        let content = "SOS_VOTERID\tFIRST_NAME\tLAST_NAME\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn test_sniff_comma_delimiter() {
        let content = "SOS_VOTERID,FIRST_NAME,LAST_NAME\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_most_frequent_wins() {
        // Commas inside a pipe-delimited header
        assert_eq!(sniff_delimiter("A,B|C|D\n"), b'|');
        assert_eq!(sniff_delimiter("A,B,C|D\n"), b',');
    }

    #[test]
    fn test_sniff_tie_prefers_pipe_then_tab() {
        assert_eq!(sniff_delimiter("A|B,C\n"), b'|');
        assert_eq!(sniff_delimiter("A\tB,C\n"), b'\t');
        assert_eq!(sniff_delimiter("A|B\tC\n"), b'|');
    }

    #[test]
    fn test_sniff_skips_blank_lines() {
        assert_eq!(sniff_delimiter("\n   \nA|B|C\n"), b'|');
    }

    #[test]
    fn test_sniff_no_candidates_defaults_to_comma() {
        assert_eq!(sniff_delimiter("SINGLECOLUMN\n"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn test_detect_delimiter_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("SWVF_1_22.txt");
        fs::write(&path, "\u{feff}SOS_VOTERID\tRESIDENTIAL_CITY\nOH1\tAKRON\n").unwrap();
        let latin1 = resolve_encoding("iso-8859-1").unwrap();
        assert_eq!(detect_delimiter(&path, latin1).unwrap(), b'\t');
    }

    #[test]
    fn test_resolve_encoding_labels() {
        assert_eq!(resolve_encoding("latin1"), Some(encoding_rs::WINDOWS_1252));
        assert_eq!(resolve_encoding(" ISO-8859-1 "), Some(encoding_rs::WINDOWS_1252));
        assert_eq!(resolve_encoding("utf-8"), Some(encoding_rs::UTF_8));
        assert_eq!(resolve_encoding("ebcdic"), None);
    }

    #[test]
    fn test_decode_field_strict() {
        let latin1 = resolve_encoding("iso-8859-1").unwrap();
        assert_eq!(decode_field(b"CAF\xC9", latin1).as_deref(), Some("CAFÉ"));
        assert_eq!(decode_field(b"CAF\xC9", encoding_rs::UTF_8), None);
        assert_eq!(decode_field("CAFÉ".as_bytes(), encoding_rs::UTF_8).as_deref(), Some("CAFÉ"));
    }

    #[test]
    fn test_decode_header_strips_bom() {
        assert_eq!(decode_header(b"\xEF\xBB\xBFSOS_VOTERID", encoding_rs::UTF_8), "SOS_VOTERID");
    }

    #[test]
    fn test_read_file_as_utf8_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("facilities.csv");
        fs::write(&path, b"po_name\nCAF\xC9 STATION\n").unwrap();
        assert_eq!(read_file_as_utf8(&path).unwrap(), "po_name\nCAFÉ STATION\n");

        fs::write(&path, "\u{feff}po_name\n").unwrap();
        assert_eq!(read_file_as_utf8(&path).unwrap(), "po_name\n");
    }
}

use std::io::{ErrorKind, Read};

use crate::utils::error::{ConversionError, Result};

const CHUNK_SIZE: usize = 64 * 1024;

/// Reads `reader` to the end in fixed-size chunks and fails with
/// `DecodingError` at the first byte sequence that is not UTF-8. Returns the
/// number of bytes read.
pub fn ensure_utf8<R: Read>(reader: &mut R, source: &str) -> Result<u64> {
    let mut chunk = vec![0u8; CHUNK_SIZE];
    // Bytes of a character split across two chunks wait here.
    let mut pending: Vec<u8> = Vec::with_capacity(CHUNK_SIZE + 4);
    let mut line = 1usize;
    let mut total = 0u64;

    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(ConversionError::InputUnreadableError {
                    path: source.to_string(),
                    reason: e.to_string(),
                })
            }
        };
        total += read as u64;
        pending.extend_from_slice(&chunk[..read]);

        let valid = match std::str::from_utf8(&pending) {
            Ok(_) => pending.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => {
                line += count_lines(&pending[..e.valid_up_to()]);
                return Err(invalid_utf8(source, line));
            }
        };
        line += count_lines(&pending[..valid]);
        pending.drain(..valid);
    }

    if pending.is_empty() {
        Ok(total)
    } else {
        Err(invalid_utf8(source, line))
    }
}

fn count_lines(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&byte| byte == b'\n').count()
}

fn invalid_utf8(source: &str, line: usize) -> ConversionError {
    ConversionError::DecodingError {
        message: format!("'{}' is not valid UTF-8 (line {})", source, line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_utf8_input_passes() {
        let text = "nombre,lat,lng\nJosé C. Paz,-34.51,-58.76\nÑandú,-34.6,-58.4\n";
        let size = ensure_utf8(&mut Cursor::new(text.as_bytes()), "puntos.csv").unwrap();
        assert_eq!(size, text.len() as u64);
    }

    #[test]
    fn test_latin1_row_is_reported_with_its_line() {
        let input = b"nombre,lat,lng\nok,-34.6,-58.4\nJos\xe9,-34.6,-58.4\n";
        let error = ensure_utf8(&mut Cursor::new(&input[..]), "puntos.csv").unwrap_err();
        match error {
            ConversionError::DecodingError { message } => {
                assert!(message.contains("puntos.csv"));
                assert!(message.contains("line 3"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_character_split_across_chunks() {
        let mut text = "a".repeat(CHUNK_SIZE - 1);
        text.push('é');
        text.push_str("\nfin\n");
        assert!(ensure_utf8(&mut Cursor::new(text.as_bytes()), "largo.csv").is_ok());
    }

    #[test]
    fn test_truncated_character_at_end() {
        let input = b"lat,lng\n-34.6,-58.4\n\xc3";
        assert!(matches!(
            ensure_utf8(&mut Cursor::new(&input[..]), "corto.csv"),
            Err(ConversionError::DecodingError { .. })
        ));
    }
}

//! Message chunking for Telegram's size limit.
//!
//! Telegram caps a message at 4096 characters. Rendered playbooks can exceed
//! that, so the document is split into transport-safe chunks: paragraph
//! boundaries first, then line boundaries. A single line longer than the
//! limit is emitted as its own oversized chunk rather than cut mid-line, so
//! an escape sequence is never split in half.

/// Telegram's hard message length limit.
pub const TELEGRAM_MAX_LEN: usize = 4096;

/// Default chunk limit, with a safety margin for MarkdownV2 escapes.
pub const CHUNK_LIMIT: usize = 3900;

/// Split `text` into ordered chunks of at most `max_len` bytes each.
///
/// Empty input yields no chunks; input at or under the limit yields exactly
/// one chunk equal to the trimmed input.
pub fn split_chunks(text: &str, max_len: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut cur = String::new();

    for para in text.split("\n\n") {
        let para = para.trim();
        if para.is_empty() {
            continue;
        }

        // Oversized paragraph: fall back to line boundaries.
        if para.len() > max_len {
            for line in para.lines() {
                let line = line.trim_end();
                if line.is_empty() {
                    continue;
                }
                if cur.is_empty() {
                    cur.push_str(line);
                } else if cur.len() + 1 + line.len() <= max_len {
                    cur.push('\n');
                    cur.push_str(line);
                } else {
                    flush(&mut chunks, &mut cur);
                    cur.push_str(line);
                }
            }
            flush(&mut chunks, &mut cur);
            continue;
        }

        if cur.is_empty() {
            cur.push_str(para);
        } else if cur.len() + 2 + para.len() <= max_len {
            cur.push_str("\n\n");
            cur.push_str(para);
        } else {
            flush(&mut chunks, &mut cur);
            cur.push_str(para);
        }
    }
    flush(&mut chunks, &mut cur);

    chunks
}

fn flush(chunks: &mut Vec<String>, cur: &mut String) {
    if !cur.trim().is_empty() {
        chunks.push(std::mem::take(cur));
    } else {
        cur.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(split_chunks("", 100).is_empty());
        assert!(split_chunks("   \n\n  ", 100).is_empty());
    }

    #[test]
    fn under_limit_is_single_chunk() {
        assert_eq!(split_chunks("hello", 100), vec!["hello"]);
    }

    #[test]
    fn exactly_at_limit_is_single_chunk() {
        let msg = "a".repeat(100);
        let chunks = split_chunks(&msg, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 100);
    }

    #[test]
    fn single_unbroken_line_over_limit_is_one_oversized_chunk() {
        let msg = "a".repeat(101);
        let chunks = split_chunks(&msg, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 101, "oversized line must not be truncated");
    }

    #[test]
    fn two_paragraphs_combined_over_limit_split_into_two() {
        let msg = format!("{}\n\n{}", "a".repeat(60), "b".repeat(60));
        let chunks = split_chunks(&msg, 100);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() <= 100));
        assert_eq!(chunks[0], "a".repeat(60));
        assert_eq!(chunks[1], "b".repeat(60));
    }

    #[test]
    fn paragraphs_pack_while_they_fit() {
        let msg = format!("{}\n\n{}\n\n{}", "a".repeat(30), "b".repeat(30), "c".repeat(80));
        let chunks = split_chunks(&msg, 100);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], format!("{}\n\n{}", "a".repeat(30), "b".repeat(30)));
        assert_eq!(chunks[1], "c".repeat(80));
    }

    #[test]
    fn oversized_paragraph_splits_on_lines() {
        let lines: Vec<String> = (0..10).map(|i| format!("line {i} {}", "x".repeat(20))).collect();
        let para = lines.join("\n");
        assert!(para.len() > 100);
        let chunks = split_chunks(&para, 100);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= 100));
        // No line was cut in half.
        let reassembled: Vec<&str> = chunks.iter().flat_map(|c| c.lines()).collect();
        assert_eq!(reassembled.len(), 10);
        for (got, want) in reassembled.iter().zip(lines.iter()) {
            assert_eq!(got, want);
        }
    }

    #[test]
    fn content_survives_modulo_seams() {
        let msg = format!("{}\n\n{}\n\n{}", "a".repeat(90), "b".repeat(90), "c".repeat(90));
        let chunks = split_chunks(&msg, 100);
        let joined = chunks.join("\n\n");
        assert_eq!(joined, msg);
    }
}

//! Markdown helpers and splitting of long embed text.

/// Longest description we put in one embed.
pub const MAX_MSG_LENGTH: usize = 2048;

pub fn bold(text: &str) -> String {
    format!("**{text}**")
}

pub fn code(text: &str) -> String {
    format!("`{text}`")
}

pub fn code_block(text: &str) -> String {
    format!("```{text}```")
}

/// Prefixes every line with ` > `.
pub fn quoted_text(text: &str) -> String {
    text.split('\n')
        .map(|line| format!(" > {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splits text into chunks of at most `max` characters, breaking on line
/// ends where possible and hard-splitting lines that are too long.
pub fn split_message(text: &str, max: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let mut rest: Vec<char> = line.chars().collect();
        rest.push('\n');

        while !rest.is_empty() {
            let room = max - current_len;
            if rest.len() <= room {
                current_len += rest.len();
                current.extend(rest.drain(..));
            } else if current_len > 0 && rest.len() <= max {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            } else {
                current.extend(rest.drain(..room));
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
        }
    }

    let last = current.trim_end_matches('\n');
    if !last.is_empty() {
        chunks.push(last.to_string());
    }
    chunks
        .into_iter()
        .map(|c| c.trim_end_matches('\n').to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_helpers() {
        assert_eq!(bold("Axe"), "**Axe**");
        assert_eq!(code("Piper"), "`Piper`");
        assert_eq!(code_block("/play x"), "```/play x```");
        assert_eq!(quoted_text("hi\nthere"), " > hi\n > there");
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(split_message("hello\nworld", 2048), vec!["hello\nworld"]);
    }

    #[test]
    fn test_split_on_lines() {
        let text = "aaaa\nbbbb\ncccc";
        assert_eq!(split_message(text, 10), vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn test_split_long_line() {
        let text = "x".repeat(25);
        let chunks = split_message(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_chunks_respect_limit_with_multibyte() {
        let text = "ä".repeat(30);
        let chunks = split_message(&text, 2048);
        assert_eq!(chunks, vec![text.clone()]);
        let chunks = split_message(&text, 7);
        assert!(chunks.iter().all(|c| c.chars().count() <= 7));
        assert_eq!(chunks.concat(), text);
    }
}

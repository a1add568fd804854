//! Text helpers for showing tracks in chat.

const TITLE_NOISE: &[&str] = &[
    " (official audio)",
    " (official video)",
    " (official music audio)",
    " (official music video)",
    " [official audio]",
    " [official video]",
    " [official music audio]",
    " [official music video]",
];

/// Formats seconds like `4h20m0s`, `3m5s` or `42s`. Unknown durations are `?`.
pub fn format_duration(seconds: Option<u64>) -> String {
    let Some(secs) = seconds else {
        return "?".to_string();
    };
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{}h{}m{}s", secs / 3600, secs % 3600 / 60, secs % 60)
    }
}

/// Drops "(Official Video)" style suffixes and decodes the HTML entities
/// that video APIs leave in titles.
pub fn format_title(title: &str) -> String {
    let mut title = title
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    for noise in TITLE_NOISE {
        // ASCII lowercasing keeps byte offsets aligned with the original.
        while let Some(pos) = title.to_ascii_lowercase().find(noise) {
            title.replace_range(pos..pos + noise.len(), "");
        }
    }

    title.trim().to_string()
}

/// Removes the characters that break markdown links.
pub fn strip_brackets(title: &str) -> String {
    title.chars().filter(|c| !"[]()".contains(*c)).collect()
}

/// ASCII bar for a volume between 0.0 and 1.0, e.g. `█████░░░░░░░░░░░░░░░`.
pub fn volume_bar(volume: f32) -> String {
    const LENGTH: usize = 20;
    let filled = ((volume.clamp(0.0, 1.0) * LENGTH as f32) as usize).min(LENGTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(LENGTH - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(None), "?");
        assert_eq!(format_duration(Some(42)), "42s");
        assert_eq!(format_duration(Some(185)), "3m5s");
        assert_eq!(format_duration(Some(4 * 3600 + 20 * 60)), "4h20m0s");
    }

    #[test]
    fn test_format_title() {
        assert_eq!(
            format_title("Rick Astley - Never Gonna Give You Up (Official Music Video)"),
            "Rick Astley - Never Gonna Give You Up"
        );
        assert_eq!(format_title("Simon &amp; Garfunkel [OFFICIAL AUDIO]"), "Simon & Garfunkel");
        assert_eq!(format_title("  &quot;Quoted&quot;  "), "\"Quoted\"");
        assert_eq!(format_title("Björk - Jóga (Official Video)"), "Björk - Jóga");
    }

    #[test]
    fn test_volume_bar() {
        assert_eq!(volume_bar(0.25), "█████░░░░░░░░░░░░░░░");
        assert_eq!(volume_bar(0.0), "░".repeat(20));
        assert_eq!(volume_bar(1.5), "█".repeat(20));
    }

    #[test]
    fn test_strip_brackets() {
        assert_eq!(strip_brackets("a [b] (c)"), "a b c");
    }
}

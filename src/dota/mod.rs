//! Dota 2 voice lines and the Shopkeeper's quiz, backed by a `dotabase`
//! SQLite file.

pub mod dotabase;
pub mod quiz;
pub mod voice_lines;

pub const EMBED_COLOR: u32 = 0xFF0000;

const DOTABASE_CDN: &str = "https://dotabase.dillerm.io/vpk";

/// Liquipedia page for a hero, item or announcer.
pub fn wiki_url(name: &str) -> String {
    format!(
        "https://liquipedia.net/dota2/{}",
        urlencoding::encode(&name.replace(' ', "_"))
    )
}

/// Dubbing wiki page for a voice actor.
pub fn fandom_url(name: &str) -> String {
    format!(
        "https://dubbing.fandom.com/wiki/{}",
        urlencoding::encode(&name.replace(' ', "_"))
    )
}

/// Absolute URL of a file from the game's vpk, e.g. `/sounds/vo/axe/axe_attack_01.mp3`.
pub fn dotabase_url(path: &str) -> String {
    format!("{DOTABASE_CDN}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wiki_url() {
        assert_eq!(
            wiki_url("Nature's Prophet"),
            "https://liquipedia.net/dota2/Nature%27s_Prophet"
        );
    }

    #[test]
    fn test_fandom_url() {
        assert_eq!(
            fandom_url("Dave Fennoy"),
            "https://dubbing.fandom.com/wiki/Dave_Fennoy"
        );
    }

    #[test]
    fn test_dotabase_url() {
        assert_eq!(
            dotabase_url("/sounds/vo/axe/axe_attack_01.mp3"),
            "https://dotabase.dillerm.io/vpk/sounds/vo/axe/axe_attack_01.mp3"
        );
    }
}

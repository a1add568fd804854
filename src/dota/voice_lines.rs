use poise::serenity_prelude as serenity;
use rand::Rng;
use serenity::builder::{CreateEmbed, CreateEmbedFooter, CreateMessage};
use tracing::info;

use super::dotabase::{Dotabase, Response, VoiceInfo};
use super::{dotabase_url, fandom_url, wiki_url, EMBED_COLOR};
use crate::audio::{Track, TrackSource};
use crate::utils::messaging::quoted_text;
use crate::utils::{author_voice_channel, embed};
use crate::{Data, Error};

pub const MAX_LIST_LENGTH: usize = 30;

const ANNOUNCER_ICON: &str = "/panorama//images/icon_announcer_psd.png";

#[derive(Debug, PartialEq)]
pub enum Lookup {
    /// Plain message: must equal a response.
    Exact(String),
    /// `dota <text>` or `any <text>`.
    Partial(String),
    /// `hero <name>`.
    Hero(String),
}

#[derive(Debug, PartialEq)]
pub struct Query {
    /// The message text without a trailing index or `list` prefix.
    pub text: String,
    /// 0-based pick from a trailing number.
    pub index: Option<usize>,
    /// 0-based start when listing.
    pub list_start: Option<i64>,
}

impl Query {
    pub fn parse(content: &str) -> Self {
        let (mut text, index) = split_index(content);

        let mut list_start = None;
        if text.to_lowercase().starts_with("list ") {
            text = text[5..].to_string();
            let mut start = 0;
            if let Some((first, rest)) = text.split_once(' ') {
                if first.starts_with(|c: char| c.is_ascii_digit()) {
                    if let Ok(n) = first.parse::<i64>() {
                        start = n - 1;
                        text = rest.to_string();
                    }
                }
            }
            list_start = Some(start);
        }

        Self {
            text,
            index,
            list_start,
        }
    }

    /// Lookups to try in order; the first with results wins.
    pub fn lookups(&self) -> Vec<Lookup> {
        if self.text.is_empty() {
            return Vec::new();
        }
        let mut lookups = vec![Lookup::Exact(self.text.clone())];
        let lower = self.text.to_lowercase();
        if let Some((_, rest)) = self.text.split_once(' ') {
            if lower.starts_with("dota ") || lower.starts_with("any ") {
                lookups.push(Lookup::Partial(rest.to_string()));
            } else if lower.starts_with("hero ") {
                lookups.push(Lookup::Hero(rest.to_string()));
            }
        }
        lookups
    }
}

/// Splits a trailing positive number off the text: `"dota haha 2"` gives
/// `("dota haha", Some(1))`.
fn split_index(text: &str) -> (String, Option<usize>) {
    if let Some((head, last)) = text.rsplit_once(' ').or(Some(("", text))) {
        if let Ok(n) = last.parse::<usize>() {
            if n >= 1 {
                return (head.to_string(), Some(n - 1));
            }
        }
    }
    (text.to_string(), None)
}

impl Lookup {
    pub fn run(&self, db: &Dotabase) -> rusqlite::Result<Vec<Response>> {
        match self {
            Self::Exact(text) => db.responses_exact(text),
            Self::Partial(text) => db.responses_containing(text),
            Self::Hero(name) => db.responses_by_hero(name),
        }
    }
}

/// The numbered list shown for `list` queries.
pub fn format_list(responses: &[Response], start: i64) -> Result<String, String> {
    let total = responses.len();
    if start < 0 {
        return Err(format!("Start index **{}** is less than 1.", start + 1));
    }
    let start = start as usize;
    if start >= total {
        return Err(format!(
            "Start index **{}** is greater than the number of responses ({total}).",
            start + 1
        ));
    }

    let mut msg = format!("Found {total} responses.");
    if total > MAX_LIST_LENGTH {
        if start == 0 {
            msg += &format!(" Showing the first **{MAX_LIST_LENGTH}**.");
        } else {
            msg += &format!(
                " Showing **{}** to **{}**.",
                start + 1,
                start + MAX_LIST_LENGTH
            );
        }
        msg += "\nUse `list [n] [command]` to list starting at a different index.";
    }

    for (i, response) in responses.iter().enumerate().skip(start).take(MAX_LIST_LENGTH) {
        let hero = response.hero.as_deref().unwrap_or("Unknown");
        msg += &format!("\n{}. **{}** ({hero})", i + 1, response.text);
    }
    Ok(msg)
}

/// ```text
/// **[Axe](wiki)** **([Jon St. John](fandom))** 🗣️
///
///  > Come and get it!
/// ```
pub fn response_text(voice: &VoiceInfo, response: &Response) -> String {
    let page = voice.url.as_deref().unwrap_or(&voice.name);
    let mut text = format!("**[{}]({})**", voice.name, wiki_url(page.trim_start_matches('/')));
    if let Some(actor) = &voice.voice_actor {
        text += &format!(" **([{actor}]({}))**", fandom_url(actor));
    }
    text += " 🗣️\n\n";
    text += &quoted_text(&response.text);
    text
}

fn find(db: &Dotabase, query: &Query) -> rusqlite::Result<Vec<Response>> {
    for lookup in query.lookups() {
        let responses = lookup.run(db)?;
        if !responses.is_empty() {
            return Ok(responses);
        }
    }
    Ok(Vec::new())
}

/// Listens for voice line requests from members sitting in a voice channel.
pub async fn handle_message(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<(), Error> {
    if msg.author.bot {
        return Ok(());
    }
    let (Some(guild_id), Some(db)) = (msg.guild_id, data.dotabase.as_ref()) else {
        return Ok(());
    };
    let Some(voice_channel) = author_voice_channel(ctx, guild_id, msg.author.id) else {
        return Ok(());
    };

    let query = Query::parse(&msg.content);
    let responses = find(db, &query)?;
    if responses.is_empty() {
        return Ok(());
    }

    if let Some(start) = query.list_start {
        let text = format_list(&responses, start).unwrap_or_else(|e| e);
        let e = CreateEmbed::new().description(text).color(EMBED_COLOR);
        msg.channel_id
            .send_message(&ctx.http, CreateMessage::new().embed(e))
            .await?;
        return Ok(());
    }

    let index = query
        .index
        .unwrap_or_else(|| rand::thread_rng().gen_range(0..responses.len()));
    let Some(response) = responses.get(index) else {
        let e = embed::error(&format!(
            "There are only {} responses for that line.",
            responses.len()
        ));
        msg.channel_id
            .send_message(&ctx.http, CreateMessage::new().embed(e))
            .await?;
        return Ok(());
    };

    let voice = match response.voice_id {
        Some(id) => db.voice(id)?,
        None => None,
    };
    let mut e = CreateEmbed::new().color(EMBED_COLOR).footer(
        CreateEmbedFooter::new(format!(
            "playing #{} out of {} responses",
            index + 1,
            responses.len()
        ))
        .icon_url(dotabase_url(ANNOUNCER_ICON)),
    );
    match &voice {
        Some(voice) => {
            e = e.description(response_text(voice, response));
            if let Some(image) = &voice.image {
                e = e.thumbnail(dotabase_url(image));
            }
        }
        None => e = e.description(quoted_text(&response.text)),
    }
    msg.channel_id
        .send_message(&ctx.http, CreateMessage::new().embed(e))
        .await?;

    info!(
        "playing voice line for {} in guild {guild_id}",
        msg.author.name
    );

    let manager = songbird::get(ctx).await.ok_or("songbird is not registered")?;
    let call = data.player.join(&manager, guild_id, voice_channel).await?;
    let mut track = Track::new("voice_line", TrackSource::Stream(dotabase_url(&response.mp3)));
    track.requester = msg.author.name.clone();
    data.player.enqueue(&call, guild_id, track, false).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(text: &str, hero: Option<&str>) -> Response {
        Response {
            text: text.to_string(),
            mp3: String::new(),
            voice_id: None,
            hero: hero.map(str::to_string),
        }
    }

    #[test]
    fn test_trailing_index() {
        let q = Query::parse("dota haha 2");
        assert_eq!(q.text, "dota haha");
        assert_eq!(q.index, Some(1));

        let q = Query::parse("Come and get it!");
        assert_eq!(q.index, None);
        assert_eq!(q.text, "Come and get it!");

        // Zero is part of the text, not a pick.
        let q = Query::parse("hero axe 0");
        assert_eq!(q.text, "hero axe 0");
        assert_eq!(q.index, None);
    }

    #[test]
    fn test_list_prefix() {
        let q = Query::parse("list hero juggernaut");
        assert_eq!(q.list_start, Some(0));
        assert_eq!(q.text, "hero juggernaut");

        let q = Query::parse("list 31 dota haha");
        assert_eq!(q.list_start, Some(30));
        assert_eq!(q.text, "dota haha");

        let q = Query::parse("hero axe");
        assert_eq!(q.list_start, None);
    }

    #[test]
    fn test_lookups() {
        assert_eq!(
            Query::parse("dota haha").lookups(),
            [
                Lookup::Exact("dota haha".into()),
                Lookup::Partial("haha".into())
            ]
        );
        assert_eq!(
            Query::parse("Any haha").lookups(),
            [
                Lookup::Exact("Any haha".into()),
                Lookup::Partial("haha".into())
            ]
        );
        assert_eq!(
            Query::parse("hero Crystal Maiden").lookups(),
            [
                Lookup::Exact("hero Crystal Maiden".into()),
                Lookup::Hero("Crystal Maiden".into())
            ]
        );
        assert_eq!(Query::parse("hello").lookups(), [Lookup::Exact("hello".into())]);
        assert!(Query::parse("3").lookups().is_empty());
    }

    #[test]
    fn test_format_list_short() {
        let responses = vec![response("Haha!", Some("Axe")), response("Hehe", None)];
        let text = format_list(&responses, 0).unwrap();
        assert_eq!(
            text,
            "Found 2 responses.\n1. **Haha!** (Axe)\n2. **Hehe** (Unknown)"
        );
    }

    #[test]
    fn test_format_list_long() {
        let responses: Vec<Response> = (0..40).map(|i| response(&format!("line {i}"), None)).collect();

        let first = format_list(&responses, 0).unwrap();
        assert!(first.starts_with("Found 40 responses. Showing the first **30**."));
        assert_eq!(first.matches("\n").count(), 31);

        let later = format_list(&responses, 35).unwrap();
        assert!(later.contains("Showing **36** to **65**."));
        assert!(later.ends_with("40. **line 39** (Unknown)"));
    }

    #[test]
    fn test_format_list_bad_start() {
        let responses = vec![response("Haha!", None)];
        assert_eq!(
            format_list(&responses, 5).unwrap_err(),
            "Start index **6** is greater than the number of responses (1)."
        );
        assert_eq!(
            format_list(&responses, -1).unwrap_err(),
            "Start index **0** is less than 1."
        );
    }

    #[test]
    fn test_response_text() {
        let voice = VoiceInfo {
            id: 1,
            name: "Axe".into(),
            image: None,
            url: Some("/Axe".into()),
            voice_actor: Some("Jon St. John".into()),
        };
        assert_eq!(
            response_text(&voice, &response("Come and get it!", Some("Axe"))),
            "**[Axe](https://liquipedia.net/dota2/Axe)** \
             **([Jon St. John](https://dubbing.fandom.com/wiki/Jon_St._John))** 🗣️\n\n > Come and get it!"
        );
    }

    #[test]
    fn test_lookup_against_dotabase() {
        let dir = tempfile::tempdir().unwrap();
        let db = Dotabase::open(crate::dota::dotabase::tests::fixture(dir.path())).unwrap();

        assert_eq!(find(&db, &Query::parse("Come and get it!")).unwrap().len(), 2);
        assert_eq!(find(&db, &Query::parse("any ice")).unwrap().len(), 1);
        assert_eq!(find(&db, &Query::parse("hero axe 2")).unwrap().len(), 3);
        assert!(find(&db, &Query::parse("nothing here")).unwrap().is_empty());
    }
}

use poise::CreateReply;
use serenity::builder::CreateEmbed;

use super::{guild_id, send_error};
use crate::audio::queue;
use crate::utils::embed;
use crate::utils::messaging::{bold, quoted_text};
use crate::{Context, Error};

const SEARCHING_COLOR: u32 = 0x3498DB;

async fn lyrics_impl(ctx: Context<'_>, song: Option<String>, artist: Option<String>) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let Some(genius) = &ctx.data().genius else {
        return send_error(ctx, "Lyrics are not available on this bot.").await;
    };

    let song = match song.filter(|s| !s.trim().is_empty()) {
        Some(song) => song,
        None => match queue::get_current(&ctx.data().player.queue_manager, guild_id).await {
            Some(track) => track.title,
            None => return send_error(ctx, "Nothing is playing, tell me a song name.").await,
        },
    };
    let artist = artist.unwrap_or_default();

    let mut searching = bold(&song);
    if !artist.is_empty() {
        searching += &format!(" by {}", bold(&artist));
    }
    let reply = ctx
        .send(
            CreateReply::default().embed(
                CreateEmbed::new()
                    .title("Searching for lyrics...")
                    .description(quoted_text(&searching))
                    .color(SEARCHING_COLOR),
            ),
        )
        .await?;

    let e = match genius.search(&song, &artist).await {
        Ok(Some(found)) => {
            let mut e = CreateEmbed::new()
                .title(found.display_title())
                .description(format!("Lyrics on [Genius]({})", found.url))
                .color(embed::SUCCESS_COLOR);
            if let Some(thumbnail) = &found.song_art_image_thumbnail_url {
                e = e.thumbnail(thumbnail);
            }
            e
        }
        Ok(None) => CreateEmbed::new()
            .title("Song not found:")
            .description(quoted_text(&bold(&song)))
            .color(embed::ERROR_COLOR),
        Err(e) => embed::error(&format!("Genius search failed: {e}")),
    };
    reply.edit(ctx, CreateReply::default().embed(e)).await?;

    Ok(())
}

/// Get lyrics from Genius
#[poise::command(slash_command, guild_only)]
pub async fn lyrics(
    ctx: Context<'_>,
    #[description = "Song name (default: current song)"] song: Option<String>,
    #[description = "Artist name"] artist: Option<String>,
) -> Result<(), Error> {
    lyrics_impl(ctx, song, artist).await
}

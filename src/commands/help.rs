use poise::CreateReply;
use serenity::builder::CreateEmbed;

use crate::utils::embed::INFO_COLOR;
use crate::{Context, Error};

const MUSIC_COMMANDS: &str = "\
`/play` (`/p`) - Play a song or add it to the queue
`/playnext` (`/pn`) - Add a song to the front of the queue
`/skip` (`/s`) - Skip the current song
`/stop` (`/st`) - Stop and leave the channel
`/queue` (`/q`) - Show the queue
`/pause` (`/pa`) - Pause
`/resume` (`/r`) - Resume
`/nowplaying` (`/np`) - Show the current song
`/loop` (`/l`) - Loop mode (off/song/queue)
`/shuffle` (`/sh`) - Shuffle the queue
`/remove` (`/rm`) - Remove a song from the queue
`/volume` (`/v`) - Volume (0-100)
`/lyrics` - Find the lyrics on Genius";

const SOURCES: &str = "\
Song names are searched on YouTube.
YouTube videos and playlists, Spotify tracks and playlists are accepted as links.";

async fn help_impl(ctx: Context<'_>) -> Result<(), Error> {
    let embed = CreateEmbed::new()
        .title("Music Bot")
        .field("Commands", MUSIC_COMMANDS, false)
        .field("Sources", SOURCES, false)
        .color(INFO_COLOR);

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Learn how to use this bot
#[poise::command(slash_command, guild_only)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    help_impl(ctx).await
}

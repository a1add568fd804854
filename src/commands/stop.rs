use super::{guild_id, send_error, songbird};
use crate::{Context, Error};

async fn stop_impl(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let songbird = songbird(ctx).await?;

    if songbird.get(guild_id).is_none() {
        return send_error(ctx, "I'm not in a voice channel.").await;
    }

    ctx.data().player.leave(&songbird, guild_id).await?;
    ctx.say("⏹️ Stopped the music and left the channel.").await?;

    Ok(())
}

/// Stop the music, clear the queue and leave
#[poise::command(slash_command, guild_only)]
pub async fn stop(ctx: Context<'_>) -> Result<(), Error> {
    stop_impl(ctx).await
}

/// Stop the music and leave (/stop shortcut)
#[poise::command(slash_command, guild_only)]
pub async fn st(ctx: Context<'_>) -> Result<(), Error> {
    stop_impl(ctx).await
}

use super::{guild_id, send_error};
use crate::audio::queue;
use crate::{Context, Error};

async fn resume_impl(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let player = &ctx.data().player;

    if !player.set_paused(guild_id, false).await? {
        return send_error(ctx, "Nothing is playing.").await;
    }
    let title = queue::get_current(&player.queue_manager, guild_id)
        .await
        .map_or_else(|| "the music".to_string(), |t| format!("**{}**", t.title));
    ctx.say(format!("▶️ Resumed {title}")).await?;

    Ok(())
}

/// Resume the paused song
#[poise::command(slash_command, guild_only)]
pub async fn resume(ctx: Context<'_>) -> Result<(), Error> {
    resume_impl(ctx).await
}

/// Resume the paused song (/resume shortcut)
#[poise::command(slash_command, guild_only)]
pub async fn r(ctx: Context<'_>) -> Result<(), Error> {
    resume_impl(ctx).await
}

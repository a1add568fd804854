use super::{guild_id, send_error};
use crate::audio::queue;
use crate::{Context, Error};

async fn pause_impl(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let player = &ctx.data().player;

    if !player.set_paused(guild_id, true).await? {
        return send_error(ctx, "Nothing is playing.").await;
    }
    let title = queue::get_current(&player.queue_manager, guild_id)
        .await
        .map_or_else(|| "the music".to_string(), |t| format!("**{}**", t.title));
    ctx.say(format!("⏸️ Paused {title}")).await?;

    Ok(())
}

/// Pause the current song
#[poise::command(slash_command, guild_only)]
pub async fn pause(ctx: Context<'_>) -> Result<(), Error> {
    pause_impl(ctx).await
}

/// Pause the current song (/pause shortcut)
#[poise::command(slash_command, guild_only)]
pub async fn pa(ctx: Context<'_>) -> Result<(), Error> {
    pause_impl(ctx).await
}

use super::{guild_id, send_error};
use crate::audio::queue;
use crate::{Context, Error};

async fn shuffle_impl(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;

    let count = queue::shuffle(&ctx.data().player.queue_manager, guild_id).await;
    if count == 0 {
        return send_error(ctx, "The queue is empty.").await;
    }
    ctx.say(format!("🔀 Shuffled {count} songs.")).await?;

    Ok(())
}

/// Shuffle the queue
#[poise::command(slash_command, guild_only)]
pub async fn shuffle(ctx: Context<'_>) -> Result<(), Error> {
    shuffle_impl(ctx).await
}

/// Shuffle the queue (/shuffle shortcut)
#[poise::command(slash_command, guild_only)]
pub async fn sh(ctx: Context<'_>) -> Result<(), Error> {
    shuffle_impl(ctx).await
}

use super::{guild_id, send_error};
use crate::audio::queue;
use crate::{Context, Error};

async fn remove_impl(ctx: Context<'_>, position: usize) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;

    match queue::remove_at(&ctx.data().player.queue_manager, guild_id, position).await {
        Some(track) => {
            ctx.say(format!("🗑️ Removed **{}** (#{position})", track.title))
                .await?;
        }
        None => send_error(ctx, &format!("There is no song at #{position}.")).await?,
    }

    Ok(())
}

/// Remove a song from the queue
#[poise::command(slash_command, guild_only)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Position in the queue"] position: usize,
) -> Result<(), Error> {
    remove_impl(ctx, position).await
}

/// Remove a song from the queue (/remove shortcut)
#[poise::command(slash_command, guild_only)]
pub async fn rm(
    ctx: Context<'_>,
    #[description = "Position in the queue"] position: usize,
) -> Result<(), Error> {
    remove_impl(ctx, position).await
}

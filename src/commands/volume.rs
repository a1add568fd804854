use poise::CreateReply;
use tracing::warn;

use super::{guild_id, send_error};
use crate::audio::queue;
use crate::utils::embed;
use crate::{Context, Error};

async fn volume_impl(ctx: Context<'_>, level: Option<u32>) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let queue_manager = &ctx.data().player.queue_manager;

    let Some(level) = level else {
        let volume = queue::get_volume(queue_manager, guild_id).await;
        ctx.send(CreateReply::default().embed(embed::volume(volume)))
            .await?;
        return Ok(());
    };
    if level > 100 {
        return send_error(ctx, "Volume must be between 0 and 100.").await;
    }

    let volume = queue::set_volume(queue_manager, guild_id, level as f32 / 100.0).await;
    if let Err(e) = ctx.data().db.set_guild_volume(guild_id.get(), volume) {
        warn!("could not save volume for {guild_id}: {e}");
    }
    ctx.send(CreateReply::default().embed(embed::volume(volume)))
        .await?;

    Ok(())
}

/// Show or set the volume
#[poise::command(slash_command, guild_only)]
pub async fn volume(
    ctx: Context<'_>,
    #[description = "Volume (0-100)"] level: Option<u32>,
) -> Result<(), Error> {
    volume_impl(ctx, level).await
}

/// Show or set the volume (/volume shortcut)
#[poise::command(slash_command, guild_only)]
pub async fn v(
    ctx: Context<'_>,
    #[description = "Volume (0-100)"] level: Option<u32>,
) -> Result<(), Error> {
    volume_impl(ctx, level).await
}

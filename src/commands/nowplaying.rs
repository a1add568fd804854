use poise::CreateReply;

use super::{guild_id, send_error};
use crate::audio::format::volume_bar;
use crate::audio::queue;
use crate::utils::{components, embed};
use crate::{Context, Error};

async fn nowplaying_impl(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let player = &ctx.data().player;

    let (current, upcoming) = queue::get_queue_list(&player.queue_manager, guild_id).await;
    let Some(track) = current else {
        return send_error(ctx, "Nothing is playing.").await;
    };

    let loop_mode = queue::get_loop_mode(&player.queue_manager, guild_id).await;
    let volume = queue::get_volume(&player.queue_manager, guild_id).await;
    let is_paused = player.is_paused(guild_id).await;

    let mut e = embed::now_playing(&track)
        .field("Loop", loop_mode.to_string(), true)
        .field(
            "Volume",
            format!("{} {}%", volume_bar(volume), (volume * 100.0).round() as u32),
            true,
        );
    if is_paused {
        e = e.title("⏸️ Paused");
    }

    ctx.send(
        CreateReply::default()
            .embed(e)
            .components(components::music_components(is_paused, &upcoming)),
    )
    .await?;

    Ok(())
}

/// Show the song that is playing
#[poise::command(slash_command, guild_only)]
pub async fn nowplaying(ctx: Context<'_>) -> Result<(), Error> {
    nowplaying_impl(ctx).await
}

/// Show the song that is playing (/nowplaying shortcut)
#[poise::command(slash_command, guild_only)]
pub async fn np(ctx: Context<'_>) -> Result<(), Error> {
    nowplaying_impl(ctx).await
}

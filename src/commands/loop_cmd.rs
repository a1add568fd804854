use super::{guild_id, send_error};
use crate::audio::{queue, LoopMode};
use crate::{Context, Error};

async fn loop_impl(ctx: Context<'_>, mode: String) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;

    let Ok(loop_mode) = mode.parse::<LoopMode>() else {
        return send_error(ctx, "Pick a mode: `off`, `song` or `queue`.").await;
    };
    let mode = queue::set_loop_mode(&ctx.data().player.queue_manager, guild_id, loop_mode).await;

    let emoji = match mode {
        LoopMode::Off => "➡️",
        LoopMode::Song => "🔂",
        LoopMode::Queue => "🔁",
    };
    ctx.say(format!("{emoji} Loop: **{mode}**")).await?;

    Ok(())
}

/// Set the loop mode
#[poise::command(slash_command, guild_only, rename = "loop")]
pub async fn loop_cmd(
    ctx: Context<'_>,
    #[description = "Loop mode (off/song/queue)"] mode: String,
) -> Result<(), Error> {
    loop_impl(ctx, mode).await
}

/// Set the loop mode (/loop shortcut)
#[poise::command(slash_command, guild_only)]
pub async fn l(
    ctx: Context<'_>,
    #[description = "Loop mode (off/song/queue)"] mode: String,
) -> Result<(), Error> {
    loop_impl(ctx, mode).await
}

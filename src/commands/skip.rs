use poise::CreateReply;
use serenity::builder::CreateEmbed;

use super::{current_call, guild_id, send_error};
use crate::audio::queue;
use crate::utils::{components, embed};
use crate::{Context, Error};

async fn skip_impl(ctx: Context<'_>, count: Option<usize>) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let count = count.unwrap_or(1).max(1);

    let Some(call) = current_call(ctx, guild_id).await? else {
        return send_error(ctx, "Nothing is playing.").await;
    };
    let Some(skipped) = ctx.data().player.skip(&call, guild_id, count).await else {
        return send_error(ctx, "Nothing is playing.").await;
    };

    let titles = skipped
        .skipped
        .iter()
        .map(|t| format!("**{}**", t.title))
        .collect::<Vec<_>>()
        .join(", ");

    let reply = match &skipped.next {
        Some((next, _)) => {
            let (_, upcoming) =
                queue::get_queue_list(&ctx.data().player.queue_manager, guild_id).await;
            CreateReply::default()
                .content(format!("⏭️ Skipped {titles}"))
                .embed(embed::now_playing(next))
                .components(components::music_components(false, &upcoming))
        }
        None => CreateReply::default().embed(
            CreateEmbed::new()
                .title("⏭️ Skipped")
                .description(format!("{titles}\nThe queue is empty."))
                .color(embed::INFO_COLOR),
        ),
    };
    ctx.send(reply).await?;

    Ok(())
}

/// Skip the current song
#[poise::command(slash_command, guild_only)]
pub async fn skip(
    ctx: Context<'_>,
    #[description = "How many songs to skip"] count: Option<usize>,
) -> Result<(), Error> {
    skip_impl(ctx, count).await
}

/// Skip the current song (/skip shortcut)
#[poise::command(slash_command, guild_only)]
pub async fn s(
    ctx: Context<'_>,
    #[description = "How many songs to skip"] count: Option<usize>,
) -> Result<(), Error> {
    skip_impl(ctx, count).await
}

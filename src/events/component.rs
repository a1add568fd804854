use poise::serenity_prelude as serenity;
use serenity::builder::{
    CreateActionRow, CreateEmbed, CreateInteractionResponse, CreateInteractionResponseMessage,
};
use serenity::model::application::ComponentInteraction;
use serenity::model::id::GuildId;

use crate::audio::queue;
use crate::utils::{author_voice_channel, components, embed};
use crate::{Data, Error};

async fn respond_ephemeral(
    ctx: &serenity::Context,
    interaction: &ComponentInteraction,
    message: &str,
) -> Result<(), Error> {
    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .embed(embed::error(message))
            .ephemeral(true),
    );
    interaction.create_response(&ctx.http, response).await?;
    Ok(())
}

async fn update_message(
    ctx: &serenity::Context,
    interaction: &ComponentInteraction,
    embed: CreateEmbed,
    components: Vec<CreateActionRow>,
) -> Result<(), Error> {
    let response = CreateInteractionResponse::UpdateMessage(
        CreateInteractionResponseMessage::new()
            .embed(embed)
            .components(components),
    );
    interaction.create_response(&ctx.http, response).await?;
    Ok(())
}

/// The now playing card for the guild's current state.
async fn now_playing_card(data: &Data, guild_id: GuildId) -> (CreateEmbed, Vec<CreateActionRow>) {
    let is_paused = data.player.is_paused(guild_id).await;
    let (current, upcoming) = queue::get_queue_list(&data.player.queue_manager, guild_id).await;
    match current {
        Some(track) => {
            let mut e = embed::now_playing(&track);
            if is_paused {
                e = e.title("⏸️ Paused");
            }
            (e, components::music_components(is_paused, &upcoming))
        }
        None => (
            embed::error("Nothing is playing."),
            components::music_components_disabled(),
        ),
    }
}

/// Buttons and the queue dropdown under now playing messages.
pub async fn handle(
    ctx: &serenity::Context,
    interaction: &ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    let Some(guild_id) = interaction.guild_id else {
        return Ok(());
    };
    let songbird = songbird::get(ctx).await.ok_or("songbird is not registered")?;

    let Some(call) = songbird.get(guild_id) else {
        respond_ephemeral(ctx, interaction, "I'm not in a voice channel.").await?;
        return Ok(());
    };
    let bot_channel = call.lock().await.current_channel();
    let user_channel = author_voice_channel(ctx, guild_id, interaction.user.id);
    let same_channel = match (bot_channel, user_channel) {
        (Some(bot), Some(user)) => bot.0.get() == user.get(),
        _ => false,
    };
    if !same_channel {
        respond_ephemeral(ctx, interaction, "You must be in my voice channel to do that.").await?;
        return Ok(());
    }

    let player = &data.player;
    match interaction.data.custom_id.as_str() {
        components::PAUSE | components::RESUME => {
            let pause = interaction.data.custom_id == components::PAUSE;
            player.set_paused(guild_id, pause).await?;
            let (e, rows) = now_playing_card(data, guild_id).await;
            update_message(ctx, interaction, e, rows).await?;
        }
        components::SKIP => {
            let next = player
                .skip(&call, guild_id, 1)
                .await
                .and_then(|skipped| skipped.next);
            match next {
                Some(_) => {
                    let (e, rows) = now_playing_card(data, guild_id).await;
                    update_message(ctx, interaction, e, rows).await?;
                }
                None => {
                    let e = CreateEmbed::new()
                        .title("⏭️ Skipped")
                        .description("The queue is empty.")
                        .color(embed::INFO_COLOR);
                    update_message(ctx, interaction, e, components::music_components_disabled())
                        .await?;
                }
            }
        }
        components::STOP => {
            player.leave(&songbird, guild_id).await?;
            let e = CreateEmbed::new()
                .title("⏹️ Stopped")
                .description("Cleared the queue and left the channel.")
                .color(embed::ERROR_COLOR);
            update_message(ctx, interaction, e, components::music_components_disabled()).await?;
        }
        components::QUEUE_SELECT => {
            let (e, rows) = now_playing_card(data, guild_id).await;
            update_message(ctx, interaction, e, rows).await?;
        }
        _ => {}
    }

    Ok(())
}

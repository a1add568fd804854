use poise::serenity_prelude as serenity;
use serenity::builder::{CreateEmbed, CreateEmbedFooter, CreateMessage, EditMessage};
use serenity::model::channel::{Message, Reaction, ReactionType};
use serenity::model::user::User;
use tracing::{debug, error, info};

use super::{check_length, footer, message_text, PREFIX};
use crate::audio::{Track, TrackSource};
use crate::utils::messaging::{quoted_text, split_message, MAX_MSG_LENGTH};
use crate::utils::{author_voice_channel, embed};
use crate::{Data, Error};

pub const REPLAY_EMOJI: &str = "🔄";

const HELP_COLOR: u32 = 0x9B59B6;
const PENDING_COLOR: u32 = 0x979C9F;
const SYNTHESIZING_COLOR: u32 = 0x3498DB;
const PLAYING_COLOR: u32 = 0x2ECC71;

/// `;help` or `;[voice] text` from a member.
pub async fn handle_message(ctx: &serenity::Context, msg: &Message, data: &Data) -> Result<(), Error> {
    if msg.author.bot || !msg.content.starts_with(PREFIX) || data.voices.is_none() {
        return Ok(());
    }

    if msg.content.trim() == format!("{PREFIX}help") {
        return send_help(ctx, msg, data).await;
    }

    speak(ctx, data, msg, &msg.author).await
}

/// A 🔄 on a spoken message plays it again for whoever reacted.
pub async fn handle_reaction(ctx: &serenity::Context, reaction: &Reaction, data: &Data) -> Result<(), Error> {
    if reaction.emoji != ReactionType::Unicode(REPLAY_EMOJI.to_string()) || data.voices.is_none() {
        return Ok(());
    }
    let user = reaction.user(ctx).await?;
    if user.bot {
        return Ok(());
    }
    let message = reaction.message(ctx).await?;
    if message.author.bot || !message.content.starts_with(PREFIX) {
        return Ok(());
    }

    if let Err(e) = reaction.delete(ctx).await {
        debug!("could not remove replay reaction: {e}");
    }
    speak(ctx, data, &message, &user).await
}

async fn send_help(ctx: &serenity::Context, msg: &Message, data: &Data) -> Result<(), Error> {
    let Some(voices) = &data.voices else {
        return Ok(());
    };
    for chunk in split_message(&voices.help_text(), MAX_MSG_LENGTH) {
        let e = CreateEmbed::new().description(chunk).color(HELP_COLOR);
        msg.channel_id
            .send_message(&ctx.http, CreateMessage::new().embed(e))
            .await?;
    }
    Ok(())
}

async fn fail(ctx: &serenity::Context, msg: &Message, text: &str) -> Result<(), Error> {
    msg.react(ctx, '❌').await?;
    msg.channel_id
        .send_message(&ctx.http, CreateMessage::new().embed(embed::error(text)))
        .await?;
    Ok(())
}

/// Speaks `msg` in the requester's voice channel, synthesizing it unless a
/// cached clip exists.
pub async fn speak(ctx: &serenity::Context, data: &Data, msg: &Message, requester: &User) -> Result<(), Error> {
    let Some(voices) = &data.voices else {
        return Ok(());
    };
    let Some(guild_id) = msg.guild_id else {
        return Ok(());
    };

    if let Err(e) = msg.delete_reactions(ctx).await {
        debug!("could not clear reactions on {}: {e}", msg.id);
    }

    if let Err(reason) = check_length(message_text(&msg.content)) {
        return fail(ctx, msg, &reason).await;
    }
    let Some((voice, text)) = voices.select(&msg.content, msg.id.get()) else {
        return fail(ctx, msg, "No voices are available.").await;
    };

    let path = voices.audio_path(msg.id.get(), voice);
    let cached = tokio::fs::try_exists(&path).await.unwrap_or(false);

    let replayed_by = (requester.id != msg.author.id || cached).then_some(requester.name.as_str());
    let cost = if cached {
        "$0 (cached!)".to_string()
    } else {
        voice.engine.cost(&text)
    };

    let mut e = CreateEmbed::new()
        .description(quoted_text(&text))
        .color(PENDING_COLOR)
        .footer(
            CreateEmbedFooter::new(footer(&voice.name, &msg.author.name, replayed_by, &cost))
                .icon_url(msg.author.face()),
        );
    if let Some(avatar) = &voice.avatar {
        e = e.thumbnail(avatar);
    }
    let mut reply = msg
        .channel_id
        .send_message(&ctx.http, CreateMessage::new().embed(e.clone()))
        .await?;
    msg.react(ctx, ReactionType::Unicode(REPLAY_EMOJI.to_string()))
        .await?;

    let Some(channel_id) = author_voice_channel(ctx, guild_id, requester.id) else {
        return fail(ctx, msg, "You must be in a voice channel to play a message.").await;
    };

    if !cached {
        e = e.color(SYNTHESIZING_COLOR);
        reply.edit(ctx, EditMessage::new().embed(e.clone())).await?;

        tokio::fs::create_dir_all(voices.cache_dir()).await?;
        info!("synthesizing {} with {} for {}", msg.id, voice.name, requester.name);
        if let Err(err) = voice.engine.synthesize(&text, &path).await {
            error!("speech synthesis failed for {}: {err}", msg.id);
            let _ = tokio::fs::remove_file(&path).await;
            reply
                .edit(ctx, EditMessage::new().embed(e.color(embed::ERROR_COLOR)))
                .await?;
            return fail(ctx, msg, &err.to_string()).await;
        }
    }

    let manager = songbird::get(ctx).await.ok_or("songbird is not registered")?;
    let call = data.player.join(&manager, guild_id, channel_id).await?;
    let mut track = Track::new(format!("{} ({})", text, voice.name), TrackSource::File(path));
    track.requester = requester.name.clone();
    data.player.enqueue(&call, guild_id, track, false).await;

    reply
        .edit(ctx, EditMessage::new().embed(e.color(PLAYING_COLOR)))
        .await?;
    Ok(())
}

use poise::serenity_prelude as serenity;
use poise::CreateReply;
use serenity::model::channel::ChannelType;
use serenity::model::id::{ChannelId, GuildId};
use tracing::warn;

use super::{guild_id, send_error, songbird};
use crate::audio::queue;
use crate::music::Resolved;
use crate::utils::{author_voice_channel, components, embed};
use crate::{Context, Error};

/// The channel to join: the one asked for, else the author's own.
fn target_channel(
    guild_id: GuildId,
    requested: Option<(GuildId, ChannelType, ChannelId)>,
    author: Option<ChannelId>,
) -> Result<ChannelId, &'static str> {
    match requested {
        Some((channel_guild, _, _)) if channel_guild != guild_id => {
            Err("That voice channel is in another server.")
        }
        Some((_, ChannelType::Voice | ChannelType::Stage, channel_id)) => Ok(channel_id),
        Some(_) => Err("That is not a voice channel."),
        None => author.ok_or("You must be in a voice channel to play music."),
    }
}

async fn play_impl(
    ctx: Context<'_>,
    query: String,
    voice_channel: Option<serenity::GuildChannel>,
    play_next: bool,
) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let Some(sources) = &ctx.data().music else {
        return send_error(ctx, "Music is not available on this bot.").await;
    };
    let requested = voice_channel.map(|c| (c.guild_id, c.kind, c.id));
    let author = author_voice_channel(ctx.serenity_context(), guild_id, ctx.author().id);
    let channel_id = match target_channel(guild_id, requested, author) {
        Ok(channel_id) => channel_id,
        Err(message) => return send_error(ctx, message).await,
    };

    ctx.defer().await?;

    let resolved = match sources.resolve(&query).await {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!("could not resolve {query}: {e}");
            return send_error(ctx, &format!("Could not find `{query}`: {e}")).await;
        }
    };

    let data = ctx.data();
    let player = &data.player;
    let restore_volume = queue::is_idle(&player.queue_manager, guild_id).await;
    let call = player.join(&*songbird(ctx).await?, guild_id, channel_id).await?;
    queue::set_announce_channel(&player.queue_manager, guild_id, ctx.channel_id()).await;
    if let Err(e) = data.db.set_music_channel(guild_id.get(), ctx.channel_id().get()) {
        warn!("could not save music channel for {guild_id}: {e}");
    }
    if restore_volume {
        match data.db.guild_volume(guild_id.get()) {
            Ok(Some(volume)) => {
                queue::set_volume(&player.queue_manager, guild_id, volume).await;
            }
            Ok(None) => {}
            Err(e) => warn!("could not read volume for {guild_id}: {e}"),
        }
    }

    let requester = ctx.author().name.clone();
    let (enqueued, reply) = match resolved {
        Resolved::Track(mut track) => {
            track.requester = requester;
            let enqueued = player.enqueue(&call, guild_id, track.clone(), play_next).await;
            let reply = match &enqueued.start {
                Some((started, _)) => embed::now_playing(started),
                None if enqueued.position > 0 => embed::added_to_queue(&track, enqueued.position),
                None => embed::error(&format!("Could not play {}.", track.title)),
            };
            (enqueued, reply)
        }
        Resolved::Playlist { name, url, tracks } => {
            if tracks.is_empty() {
                return send_error(ctx, &format!("The playlist {name} has no tracks.")).await;
            }
            let count = tracks.len();
            let tracks = tracks
                .into_iter()
                .map(|mut t| {
                    t.requester = requester.clone();
                    t
                })
                .collect();
            let enqueued = player.enqueue_many(&call, guild_id, tracks, play_next).await;
            (enqueued, embed::queued_playlist(&name, url.as_deref(), count))
        }
    };

    let (_, upcoming) = queue::get_queue_list(&player.queue_manager, guild_id).await;
    let playing = enqueued.start.is_some() || enqueued.position > 0;
    let rows = if playing {
        components::music_components(false, &upcoming)
    } else {
        Vec::new()
    };
    ctx.send(CreateReply::default().embed(reply).components(rows))
        .await?;

    Ok(())
}

/// Play a song or playlist from a search, YouTube or Spotify link
#[poise::command(slash_command, guild_only)]
pub async fn play(
    ctx: Context<'_>,
    #[description = "Song name or URL"] query: String,
    #[description = "Voice channel to play in (defaults to yours)"]
    #[channel_types("Voice", "Stage")]
    voice_channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    play_impl(ctx, query, voice_channel, false).await
}

/// Play a song or playlist (/play shortcut)
#[poise::command(slash_command, guild_only)]
pub async fn p(
    ctx: Context<'_>,
    #[description = "Song name or URL"] query: String,
    #[description = "Voice channel to play in (defaults to yours)"]
    #[channel_types("Voice", "Stage")]
    voice_channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    play_impl(ctx, query, voice_channel, false).await
}

/// Put a song at the front of the queue
#[poise::command(slash_command, guild_only)]
pub async fn playnext(
    ctx: Context<'_>,
    #[description = "Song name or URL"] query: String,
    #[description = "Voice channel to play in (defaults to yours)"]
    #[channel_types("Voice", "Stage")]
    voice_channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    play_impl(ctx, query, voice_channel, true).await
}

/// Put a song at the front of the queue (/playnext shortcut)
#[poise::command(slash_command, guild_only)]
pub async fn pn(
    ctx: Context<'_>,
    #[description = "Song name or URL"] query: String,
    #[description = "Voice channel to play in (defaults to yours)"]
    #[channel_types("Voice", "Stage")]
    voice_channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    play_impl(ctx, query, voice_channel, true).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_channel() {
        let guild = GuildId::new(1);
        let mine = ChannelId::new(10);
        let asked = ChannelId::new(20);

        assert_eq!(target_channel(guild, None, Some(mine)), Ok(mine));
        assert!(target_channel(guild, None, None).is_err());
        assert_eq!(
            target_channel(guild, Some((guild, ChannelType::Voice, asked)), Some(mine)),
            Ok(asked)
        );
        assert_eq!(
            target_channel(guild, Some((guild, ChannelType::Stage, asked)), None),
            Ok(asked)
        );
        assert!(target_channel(guild, Some((guild, ChannelType::Text, asked)), Some(mine)).is_err());
        assert!(
            target_channel(guild, Some((GuildId::new(2), ChannelType::Voice, asked)), Some(mine))
                .is_err()
        );
    }
}

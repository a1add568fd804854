use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use poise::serenity_prelude as serenity;
use serenity::model::id::{ChannelId, GuildId, UserId};
use songbird::Songbird;
use tracing::{info, warn};

use crate::audio::player::Player;
use crate::utils::listeners;
use crate::{Data, Error};

const CHECK_INTERVAL: Duration = Duration::from_secs(10);
const CHECKS_BEFORE_LEAVING: u32 = 6;

/// Guilds with a pending auto-leave countdown.
#[derive(Clone, Default)]
pub struct LeaveTimers {
    guilds: Arc<Mutex<HashSet<GuildId>>>,
}

impl LeaveTimers {
    /// Claims the countdown for `guild_id`. False when one is already running.
    pub fn try_start(&self, guild_id: GuildId) -> bool {
        self.guilds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(guild_id)
    }

    pub fn finish(&self, guild_id: GuildId) {
        self.guilds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&guild_id);
    }

    pub fn is_running(&self, guild_id: GuildId) -> bool {
        self.guilds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&guild_id)
    }
}

async fn bot_channel(songbird: &Songbird, guild_id: GuildId) -> Option<ChannelId> {
    let call = songbird.get(guild_id)?;
    let channel = call.lock().await.current_channel()?;
    Some(ChannelId::new(channel.0.get()))
}

/// True when the bot is still connected and nobody came back.
async fn still_alone(ctx: &serenity::Context, songbird: &Songbird, guild_id: GuildId) -> bool {
    match bot_channel(songbird, guild_id).await {
        Some(channel_id) => listeners(ctx, guild_id, channel_id) == 0,
        None => false,
    }
}

async fn countdown(
    ctx: serenity::Context,
    songbird: Arc<Songbird>,
    player: Player,
    timers: LeaveTimers,
    guild_id: GuildId,
) {
    for _ in 0..CHECKS_BEFORE_LEAVING {
        tokio::time::sleep(CHECK_INTERVAL).await;
        if !still_alone(&ctx, &songbird, guild_id).await {
            info!("listeners are back in {guild_id}, staying");
            timers.finish(guild_id);
            return;
        }
    }

    info!("leaving {guild_id}, nobody is listening");
    if let Err(e) = player.leave(&songbird, guild_id).await {
        warn!("could not leave {guild_id}: {e}");
    }
    timers.finish(guild_id);
}

/// The bot itself left voice, e.g. kicked or its channel was deleted.
fn bot_disconnected(bot_id: UserId, user_id: UserId, channel_id: Option<ChannelId>) -> bool {
    user_id == bot_id && channel_id.is_none()
}

/// Drops the session when the bot is disconnected and starts the auto-leave
/// countdown when the bot's channel has no listeners.
pub async fn handle(
    ctx: &serenity::Context,
    new: &serenity::VoiceState,
    data: &Data,
) -> Result<(), Error> {
    let Some(guild_id) = new.guild_id else {
        return Ok(());
    };
    let songbird = songbird::get(ctx).await.ok_or("songbird is not registered")?;

    if bot_disconnected(ctx.cache.current_user().id, new.user_id, new.channel_id) {
        info!("disconnected from voice in {guild_id}, dropping the session");
        data.player.stop_session(&songbird, guild_id).await;
        return Ok(());
    }

    if !still_alone(ctx, &songbird, guild_id).await || !data.leave_timers.try_start(guild_id) {
        return Ok(());
    }

    info!("no listeners left in {guild_id}, checking again every 10 seconds");
    tokio::spawn(countdown(
        ctx.clone(),
        songbird,
        data.player.clone(),
        data.leave_timers.clone(),
        guild_id,
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_timer_per_guild() {
        let timers = LeaveTimers::default();
        let guild = GuildId::new(1);

        assert!(timers.try_start(guild));
        assert!(!timers.try_start(guild));
        assert!(timers.try_start(GuildId::new(2)));

        let shared = timers.clone();
        shared.finish(guild);
        assert!(!timers.is_running(guild));
        assert!(timers.try_start(guild));
    }

    #[test]
    fn test_bot_disconnected() {
        let bot = UserId::new(1);
        let member = UserId::new(2);
        let channel = ChannelId::new(3);

        assert!(bot_disconnected(bot, bot, None));
        assert!(!bot_disconnected(bot, bot, Some(channel)));
        assert!(!bot_disconnected(bot, member, None));
    }
}

pub mod components;
pub mod embed;
pub mod messaging;

use poise::serenity_prelude as serenity;
use serenity::model::id::{ChannelId, GuildId, UserId};

/// Voice channel `user_id` currently sits in, from the cache.
pub fn author_voice_channel(
    ctx: &serenity::Context,
    guild_id: GuildId,
    user_id: UserId,
) -> Option<ChannelId> {
    let guild = ctx.cache.guild(guild_id)?;
    guild
        .voice_states
        .get(&user_id)
        .and_then(|vs| vs.channel_id)
}

/// Human members (not bots) in `channel_id`, from the cache.
pub fn listeners(ctx: &serenity::Context, guild_id: GuildId, channel_id: ChannelId) -> usize {
    let Some(guild) = ctx.cache.guild(guild_id) else {
        return 0;
    };
    guild
        .voice_states
        .values()
        .filter(|vs| vs.channel_id == Some(channel_id))
        .filter(|vs| {
            let is_bot = vs
                .member
                .as_ref()
                .map(|m| m.user.bot)
                .or_else(|| ctx.cache.user(vs.user_id).map(|u| u.bot));
            !is_bot.unwrap_or(false)
        })
        .count()
}

mod dota;
mod help;
mod image;
mod loop_cmd;
mod lyrics;
mod nowplaying;
mod pause;
mod play;
mod queue;
mod remove;
mod resume;
mod shuffle;
mod skip;
mod stop;
mod volume;

use std::sync::Arc;

use poise::CreateReply;
use serenity::model::id::GuildId;
use songbird::{Call, Songbird};
use tokio::sync::Mutex;

use crate::utils::embed;
use crate::{Context, Data, Error};

/// Commands of the music bot.
pub fn music() -> Vec<poise::Command<Data, Error>> {
    vec![
        help::help(),
        play::play(),
        play::p(),
        play::playnext(),
        play::pn(),
        skip::skip(),
        skip::s(),
        stop::stop(),
        stop::st(),
        queue::queue(),
        queue::q(),
        pause::pause(),
        pause::pa(),
        resume::resume(),
        resume::r(),
        nowplaying::nowplaying(),
        nowplaying::np(),
        loop_cmd::loop_cmd(),
        loop_cmd::l(),
        shuffle::shuffle(),
        shuffle::sh(),
        remove::remove(),
        remove::rm(),
        volume::volume(),
        volume::v(),
        lyrics::lyrics(),
    ]
}

/// Commands of the Dota bot.
pub fn dota() -> Vec<poise::Command<Data, Error>> {
    dota::all()
}

/// Commands of the voice bot. Speech itself is driven by `;` messages.
pub fn voice() -> Vec<poise::Command<Data, Error>> {
    image::all()
}

async fn send_error(ctx: Context<'_>, message: &str) -> Result<(), Error> {
    ctx.send(CreateReply::default().embed(embed::error(message)))
        .await?;
    Ok(())
}

async fn songbird(ctx: Context<'_>) -> Result<Arc<Songbird>, Error> {
    Ok(songbird::get(ctx.serenity_context())
        .await
        .ok_or("songbird is not registered")?)
}

/// The guild's voice connection, if the bot has one.
async fn current_call(ctx: Context<'_>, guild_id: GuildId) -> Result<Option<Arc<Mutex<Call>>>, Error> {
    Ok(songbird(ctx).await?.get(guild_id))
}

fn guild_id(ctx: Context<'_>) -> Result<GuildId, Error> {
    Ok(ctx.guild_id().ok_or("This command only works in a server.")?)
}

pub mod component;
pub mod voice_state;

use poise::serenity_prelude as serenity;

use crate::bot::{self, Variant};
use crate::dota::{quiz, voice_lines};
use crate::voice::handler as tts;
use crate::{Data, Error};

pub async fn handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::CacheReady { .. } => {
            bot::on_cache_ready(ctx, data.variant);
        }
        serenity::FullEvent::Message { new_message } => match data.variant {
            Variant::Dota => voice_lines::handle_message(ctx, new_message, data).await?,
            Variant::Voice => tts::handle_message(ctx, new_message, data).await?,
            Variant::Music => {}
        },
        serenity::FullEvent::ReactionAdd { add_reaction } => match data.variant {
            Variant::Dota => quiz::handle_reaction(ctx, add_reaction, data).await?,
            Variant::Voice => tts::handle_reaction(ctx, add_reaction, data).await?,
            Variant::Music => {}
        },
        serenity::FullEvent::VoiceStateUpdate { new, .. } => {
            voice_state::handle(ctx, new, data).await?;
        }
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Component(comp),
        } if data.variant == Variant::Music => {
            component::handle(ctx, comp, data).await?;
        }
        _ => {}
    }
    Ok(())
}

use poise::CreateReply;
use serenity::builder::CreateEmbed;

use crate::dota::EMBED_COLOR;
use crate::{Context, Error};

/// Set your OpenDota ID
#[poise::command(slash_command)]
pub async fn opendota_id(
    ctx: Context<'_>,
    #[description = "Your OpenDota ID (e.g. 1234567890)."] opendota_id: String,
) -> Result<(), Error> {
    let opendota_id = opendota_id.trim().to_string();
    ctx.data()
        .db
        .set_user_setting(ctx.author().id.get(), "opendota_id", &opendota_id)?;

    let e = CreateEmbed::new()
        .title("OpenDota ID")
        .description(format!("OpenDota ID set to {opendota_id}."))
        .color(EMBED_COLOR);
    ctx.send(CreateReply::default().embed(e).ephemeral(true))
        .await?;
    Ok(())
}

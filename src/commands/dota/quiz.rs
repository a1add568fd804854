use poise::CreateReply;
use serenity::builder::CreateEmbed;

use crate::dota::{quiz, EMBED_COLOR};
use crate::utils::embed;
use crate::{Context, Error};

async fn quiz_impl(ctx: Context<'_>) -> Result<(), Error> {
    if ctx.data().quiz_words.is_empty() {
        ctx.send(CreateReply::default().embed(embed::error("The quiz has no words to play with.")))
            .await?;
        return Ok(());
    }

    ctx.send(
        CreateReply::default().embed(
            CreateEmbed::new()
                .description("Starting the quiz!")
                .color(EMBED_COLOR),
        ),
    )
    .await?;
    quiz::run(ctx.serenity_context(), ctx.data(), ctx.channel_id()).await
}

/// Play the Shopkeeper's quiz
#[poise::command(slash_command, guild_only)]
pub async fn quiz(ctx: Context<'_>) -> Result<(), Error> {
    quiz_impl(ctx).await
}

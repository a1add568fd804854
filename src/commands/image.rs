use poise::serenity_prelude as serenity;
use poise::CreateReply;
use serenity::builder::{CreateAttachment, CreateEmbed, CreateEmbedFooter};
use tracing::{info, warn};

use crate::imagegen::{self, collage, ImageError, InlineImage};
use crate::utils::embed;
use crate::utils::messaging::code_block;
use crate::{Context, Data, Error};

const PENDING_COLOR: u32 = 0x3498DB;
const DEFAULT_COLLAGE_SIZE: usize = 25;

pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![image(), lowpoly(), chad(), troll(), remix(), last()]
}

/// Announces the request, generates the image and posts it.
async fn generate(
    ctx: Context<'_>,
    prompt: &str,
    avatar_of: Option<&serenity::User>,
    display_text: Option<String>,
) -> Result<(), Error> {
    let Some(gemini) = &ctx.data().gemini else {
        ctx.send(CreateReply::default().embed(embed::error("Image generation is not available.")))
            .await?;
        return Ok(());
    };

    let text = display_text
        .unwrap_or_else(|| format!("Generating image using Gemini AI: \n{}", code_block(prompt)));
    let announce = CreateEmbed::new()
        .description(text)
        .footer(CreateEmbedFooter::new(ctx.author().display_name()).icon_url(ctx.author().face()))
        .color(PENDING_COLOR);
    ctx.send(CreateReply::default().embed(announce)).await?;

    let path = imagegen::image_path(&ctx.data().config.image_dir, ctx.id());
    info!("generating image for {}: {prompt}", ctx.author().name);

    let result = async {
        let image: Option<InlineImage> = match avatar_of {
            Some(user) => Some(imagegen::fetch_avatar(&ctx.data().http_client, &user.face()).await?),
            None => None,
        };
        gemini.generate_image(prompt, image, &path).await
    }
    .await;

    if let Err(e) = result {
        warn!("image generation failed: {e}");
        ctx.send(
            CreateReply::default().embed(embed::error(&format!("Failed to generate image: {e}"))),
        )
        .await?;
        return Ok(());
    }

    info!("image saved to {}", path.display());
    let attachment = CreateAttachment::path(&path).await?;
    ctx.send(CreateReply::default().attachment(attachment)).await?;
    Ok(())
}

/// Generate an image using Gemini API.
#[poise::command(slash_command)]
pub async fn image(
    ctx: Context<'_>,
    #[description = "The prompt to generate an image from."] prompt: String,
) -> Result<(), Error> {
    generate(ctx, &prompt, None, None).await
}

/// Generate a low-poly image using Gemini API.
#[poise::command(slash_command)]
pub async fn lowpoly(
    ctx: Context<'_>,
    #[description = "The prompt to generate a low-poly image from."] prompt: String,
) -> Result<(), Error> {
    generate(ctx, &imagegen::lowpoly_prompt(&prompt), None, None).await
}

/// Generate a chad image using Gemini API.
#[poise::command(slash_command, guild_only)]
pub async fn chad(
    ctx: Context<'_>,
    #[description = "The user to generate a chad image of."] user: serenity::User,
) -> Result<(), Error> {
    let text = format!("Generating chad image of {}...", user.display_name());
    generate(ctx, imagegen::CHAD_PROMPT, Some(&user), Some(text)).await
}

/// Generate a troll image using Gemini API.
#[poise::command(slash_command, guild_only)]
pub async fn troll(
    ctx: Context<'_>,
    #[description = "The user to generate a troll image of."] user: serenity::User,
) -> Result<(), Error> {
    let text = format!("Generating {} as a troll...", user.display_name());
    generate(ctx, imagegen::TROLL_PROMPT, Some(&user), Some(text)).await
}

/// Generate a remix of a user's avatar using Gemini API.
#[poise::command(slash_command, guild_only)]
pub async fn remix(
    ctx: Context<'_>,
    #[description = "The user to generate a remix image of."] user: serenity::User,
    #[description = "The prompt to generate a remix image of."] prompt: String,
) -> Result<(), Error> {
    generate(ctx, &prompt, Some(&user), None).await
}

/// Create a collage of the most recent generated images.
#[poise::command(slash_command)]
pub async fn last(
    ctx: Context<'_>,
    #[description = "Number of recent images to include in collage (default: 25)"]
    #[min = 1]
    number: Option<usize>,
) -> Result<(), Error> {
    let number = number.unwrap_or(DEFAULT_COLLAGE_SIZE).max(1);
    let reply = ctx
        .send(
            CreateReply::default().embed(
                CreateEmbed::new()
                    .description(format!("Creating collage of {number} recent images..."))
                    .color(PENDING_COLOR),
            ),
        )
        .await?;

    let dir = ctx.data().config.image_dir.clone();
    let output = dir.join(format!("collage_{}.png", ctx.id()));
    let target = output.clone();
    let result = tokio::task::spawn_blocking(move || -> Result<(), ImageError> {
        let paths = collage::recent_images(&dir, number)?;
        collage::create_collage(&paths, &target)
    })
    .await?;

    if let Err(e) = result {
        warn!("collage failed: {e}");
        let e = CreateEmbed::new()
            .description(format!("Failed to create collage: {e}"))
            .color(embed::ERROR_COLOR);
        reply.edit(ctx, CreateReply::default().embed(e)).await?;
        return Ok(());
    }

    let attachment = CreateAttachment::path(&output).await?;
    ctx.send(CreateReply::default().attachment(attachment)).await?;
    if let Err(e) = tokio::fs::remove_file(&output).await {
        warn!("could not remove {}: {e}", output.display());
    }
    Ok(())
}

use poise::CreateReply;
use serenity::builder::CreateEmbed;

use crate::dota::EMBED_COLOR;
use crate::{Context, Error};

const COMMANDS: &str = "
`/quiz` - *Play the Shopkeeper's quiz*
`/gold` - *Check your gold balance*
`/top` - *List the top gold balances*
`/opendota_id` - *Set your OpenDota ID*
`[exact quote]` - *Play a voiceline*
`dota [partial quote]` - *Play a voiceline*
`dota [partial quote] [n]` - *Play voiceline n out of many*
`hero [hero]` - *Play a hero's voiceline*
`list [command]` - *List results for a command*
`list [n] [command]` - *List starting at an index*
";

const EXAMPLES: &str = "
`Ho ho.` - *Plays \"Ho ho. (Lifestealer)\"*
`Ha ha. 10` - *Plays \"Ha ha. (Invoker) (10 out of 17)\"*
`dota banana` - *Plays \"That's the biggest banana slug I've ever seen.\"*
`list hero Techies` - *List all Techies voice lines*
`list dota haha` - *List all voicelines containing \"haha\"*
";

/// Learn how to use this bot
#[poise::command(slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let e = CreateEmbed::new()
        .field("Commands", COMMANDS, false)
        .field("Examples", EXAMPLES, false)
        .color(EMBED_COLOR);
    ctx.send(CreateReply::default().embed(e)).await?;
    Ok(())
}

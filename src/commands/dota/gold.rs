use poise::CreateReply;
use serenity::builder::CreateEmbed;
use serenity::model::id::UserId;
use tracing::debug;

use crate::dota::EMBED_COLOR;
use crate::{Context, Error};

const TOP_USERS: usize = 10;
const TOP_THUMBNAIL: &str =
    "https://api.opendota.com/apps/dota2/images/abilities/alchemist_goblins_greed_md.png";

/// One line per user, best first, with medals for the top three.
pub fn leaderboard(users: &[(String, i64)]) -> String {
    users
        .iter()
        .enumerate()
        .map(|(i, (name, gold))| {
            let medal = match i {
                0 => " :crown:",
                1 => " :second_place:",
                2 => " :third_place:",
                _ => "",
            };
            format!("{}. **{name}**: {gold} *gold*{medal}\n", i + 1)
        })
        .collect()
}

/// Check your current gold balance
#[poise::command(slash_command)]
pub async fn gold(ctx: Context<'_>) -> Result<(), Error> {
    let gold: i64 = ctx
        .data()
        .db
        .get_user_setting(ctx.author().id.get(), "gold")?
        .unwrap_or(0);

    let e = CreateEmbed::new()
        .description(format!("<@{}>, you have **{gold}** *gold*", ctx.author().id))
        .color(EMBED_COLOR);
    ctx.send(CreateReply::default().embed(e)).await?;
    Ok(())
}

/// List users with the most gold
#[poise::command(slash_command)]
pub async fn top(ctx: Context<'_>) -> Result<(), Error> {
    let top = ctx.data().db.top_users("gold", TOP_USERS)?;

    let mut users = Vec::with_capacity(top.len());
    for (user_id, gold) in top {
        let name = match UserId::new(user_id).to_user(ctx.serenity_context()).await {
            Ok(user) => user.display_name().to_string(),
            Err(e) => {
                debug!("could not fetch user {user_id}: {e}");
                user_id.to_string()
            }
        };
        users.push((name, gold));
    }

    let e = CreateEmbed::new()
        .title("Top Users")
        .description(leaderboard(&users))
        .thumbnail(TOP_THUMBNAIL)
        .color(EMBED_COLOR);
    ctx.send(CreateReply::default().embed(e)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaderboard() {
        let users = vec![
            ("alice".to_string(), 12),
            ("bob".to_string(), 7),
            ("carol".to_string(), 3),
            ("dave".to_string(), 1),
        ];
        assert_eq!(
            leaderboard(&users),
            "1. **alice**: 12 *gold* :crown:\n\
             2. **bob**: 7 *gold* :second_place:\n\
             3. **carol**: 3 *gold* :third_place:\n\
             4. **dave**: 1 *gold*\n"
        );
        assert_eq!(leaderboard(&[]), "");
    }
}

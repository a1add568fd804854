//! The Shopkeeper's quiz: unscramble Dota names for gold.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use poise::serenity_prelude as serenity;
use rand::seq::SliceRandom;
use rand::Rng;
use serenity::builder::{CreateEmbed, CreateEmbedFooter, CreateMessage, EditMessage};
use serenity::model::id::ChannelId;
use tracing::{debug, info};

use super::dotabase::Dotabase;
use super::{dotabase_url, wiki_url, EMBED_COLOR};
use crate::store::{Database, StoreError};
use crate::{Data, Error};

pub const ROUND_TIME: Duration = Duration::from_secs(23);

pub const SHOPKEEPER_IMAGE: &str = "https://i.imgur.com/Xyf1VjQ.png";
const UNKNOWN_IMAGE: &str = "https://static.wikia.nocookie.net/dota2_gamepedia/images/5/5d/Unknown_Unit_icon.png/revision/latest/scale-to-width-down/128?cb=20170416184928";

/// Reacting with this on a results message starts a new quiz.
pub const NEW_QUIZ_EMOJI: &str = "🆕";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Heroes,
    Abilities,
    FacetAbilities,
    InnateAbilities,
    Facets,
    Items,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Heroes => "Heroes",
            Self::Abilities => "Abilities",
            Self::FacetAbilities => "Facet Abilities",
            Self::InnateAbilities => "Innate Abilities",
            Self::Facets => "Facets",
            Self::Items => "Items",
        };
        f.write_str(name)
    }
}

impl Category {
    fn thumbnail(&self) -> Option<String> {
        match self {
            Self::InnateAbilities => Some(dotabase_url(
                "/panorama/images/hud/facets/innate_icon_large_png.png",
            )),
            Self::FacetAbilities => Some(dotabase_url(
                "/panorama/images/spellicons/attribute_bonus_png.png",
            )),
            Self::Items => Some(SHOPKEEPER_IMAGE.to_string()),
            _ => None,
        }
    }
}

/// Removes quotes, turns dashes into spaces and uppercases.
pub fn prepare(text: &str) -> String {
    text.replace('\'', "").replace('-', " ").to_uppercase()
}

/// Shuffles all letters of `word`. Retries a few times when the shuffle
/// comes out unchanged.
pub fn scramble<R: Rng + ?Sized>(word: &str, rng: &mut R) -> String {
    let prepared = prepare(word);
    let mut chars: Vec<char> = prepared.chars().collect();
    for _ in 0..10 {
        chars.shuffle(rng);
        let scrambled: String = chars.iter().collect();
        if scrambled != prepared {
            return scrambled;
        }
    }
    chars.into_iter().collect()
}

/// Scrambles each word on its own, keeping the spaces in place.
pub fn easy_scramble<R: Rng + ?Sized>(word: &str, rng: &mut R) -> String {
    prepare(word)
        .split(' ')
        .map(|w| scramble(w, rng))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Clone, Debug, PartialEq)]
pub struct Word {
    pub text: String,
    pub category: Category,
    pub image: Option<String>,
    pub url: String,
    pub hint: Option<String>,
}

impl Word {
    fn new(text: &str, category: Category, image: Option<&str>, hint: Option<String>) -> Self {
        Self {
            text: text.to_string(),
            category,
            image: image.map(dotabase_url),
            url: wiki_url(text),
            hint: hint.filter(|h| !h.trim().is_empty()),
        }
    }

    /// Whether `guess` matches, ignoring case, quotes and dashes.
    pub fn check(&self, guess: &str) -> bool {
        prepare(guess.trim()) == prepare(&self.text)
    }

    /// The hint with the answer starred out.
    pub fn hint(&self) -> Option<String> {
        let hint = self.hint.as_ref()?;
        Some(hint.replace(&self.text, &"*".repeat(self.text.chars().count())))
    }
}

/// The quiz word pool: facets, heroes, abilities, then items.
pub fn load_words(db: &Dotabase) -> rusqlite::Result<Vec<Word>> {
    let heroes = db.heroes()?;
    let abilities = db.abilities()?;
    let facets = db.facets()?;
    let items = db.shop_items()?;

    let facet_words = facets
        .iter()
        .filter(|f| !f.name.trim().is_empty())
        .map(|f| {
            Word::new(
                &f.name,
                Category::Facets,
                f.icon.as_deref(),
                Some(format!("Hero: {}", f.hero)),
            )
        });

    let hero_words = heroes
        .iter()
        .filter(|h| !h.name.trim().is_empty())
        .map(|h| Word::new(&h.name, Category::Heroes, h.image.as_deref(), None));

    let ability_words = abilities
        .iter()
        .filter(|a| !a.name.contains('_') && !a.name.trim().is_empty())
        .map(|a| {
            let category = if a.innate {
                Category::InnateAbilities
            } else if a.from_facet {
                Category::FacetAbilities
            } else {
                Category::Abilities
            };
            let hint = a
                .lore
                .clone()
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| a.hero.clone());
            Word::new(&a.name, category, a.icon.as_deref(), Some(hint))
        });

    let item_words = items
        .iter()
        .filter(|i| !i.name.trim().is_empty())
        .map(|i| Word::new(&i.name, Category::Items, i.icon.as_deref(), i.lore.clone()));

    let words: Vec<Word> = facet_words
        .chain(hero_words)
        .chain(ability_words)
        .chain(item_words)
        .collect();

    info!(
        "loaded {} quiz words ({} heroes, {} abilities, {} facets, {} items)",
        words.len(),
        heroes.len(),
        abilities.len(),
        facets.len(),
        items.len()
    );
    Ok(words)
}

/// What a round reveals at one step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Phase {
    pub category: bool,
    pub easy: bool,
    pub hint: bool,
}

/// Hard scramble, then with the category, then with spaces in place, then
/// with the hint if the word has one.
pub fn phases(word: &Word) -> Vec<Phase> {
    let mut phases = vec![
        Phase::default(),
        Phase {
            category: true,
            ..Phase::default()
        },
        Phase {
            category: true,
            easy: true,
            hint: false,
        },
    ];
    if word.hint().is_some() {
        phases.push(Phase {
            category: true,
            easy: true,
            hint: true,
        });
    }
    phases
}

impl Phase {
    /// Embed description and footer for this phase.
    pub fn describe(&self, word: &Word, scrambled: &str) -> (String, Option<&'static str>) {
        let mut description = format!("**Unscramble:** {scrambled}");
        let mut footer = None;
        if self.category {
            description += &format!("\n**Category:** {} ", word.category);
            footer = Some("*Here's a hint!*");
        }
        if self.hint {
            if let Some(hint) = word.hint() {
                description += &format!("\n**Hint:** {hint} ");
            }
            footer = Some("*Here's another hint!*");
        }
        if self.easy {
            footer = Some("*Spaces are in their places!*");
        }
        (description, footer)
    }

    fn thumbnail(&self, word: &Word) -> String {
        self.category
            .then(|| word.category.thumbnail())
            .flatten()
            .unwrap_or_else(|| UNKNOWN_IMAGE.to_string())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Score {
    pub user_id: u64,
    pub name: String,
    pub gold: u64,
    pub correct: u64,
}

/// Gold won during one quiz, in order of first correct answer.
#[derive(Debug, Default)]
pub struct Scoreboard {
    scores: Vec<Score>,
}

impl Scoreboard {
    /// Credits a correct answer and returns the gold it earned.
    pub fn add(&mut self, user_id: u64, name: &str) -> u64 {
        let gold = 1;
        match self.scores.iter_mut().find(|s| s.user_id == user_id) {
            Some(score) => {
                score.gold += gold;
                score.correct += 1;
            }
            None => self.scores.push(Score {
                user_id,
                name: name.to_string(),
                gold,
                correct: 1,
            }),
        }
        gold
    }

    /// Winners (several on a tie) and everyone else. `None` when nobody
    /// scored.
    pub fn results_text(&self) -> Option<String> {
        let top = self.scores.iter().map(|s| s.gold).max()?;
        let (winners, losers): (Vec<&Score>, Vec<&Score>) =
            self.scores.iter().partition(|s| s.gold == top);

        let mut text = match winners.as_slice() {
            [winner] => format!(
                "Winner: **{}** earned **{top}** gold with {} answers!\n",
                winner.name, winner.correct
            ),
            _ => {
                let mut text = format!("It's a tie! The following players earned **{top}** gold:\n");
                for winner in &winners {
                    text += &format!(" -- {}\n", winner.name);
                }
                text
            }
        };

        if !losers.is_empty() {
            text += "Losers:\n";
            for loser in losers {
                text += &format!(
                    " -- {} got {} correct (**{}** gold)\n",
                    loser.name, loser.correct, loser.gold
                );
            }
        }
        Some(text)
    }
}

/// Adds to a user's stored `gold` and returns the new balance.
pub fn award_gold(db: &Database, user_id: u64, amount: u64) -> Result<i64, StoreError> {
    let gold = db.get_user_setting::<i64>(user_id, "gold")?.unwrap_or(0) + amount as i64;
    db.set_user_setting(user_id, "gold", &gold)?;
    Ok(gold)
}

/// Channels with a running quiz.
#[derive(Default)]
pub struct ActiveQuizzes {
    channels: Mutex<HashSet<ChannelId>>,
}

/// Marks a channel busy until dropped.
pub struct QuizGuard<'a> {
    active: &'a ActiveQuizzes,
    channel: ChannelId,
}

impl ActiveQuizzes {
    pub fn try_start(&self, channel: ChannelId) -> Option<QuizGuard<'_>> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels.insert(channel).then_some(QuizGuard {
            active: self,
            channel,
        })
    }

    pub fn is_running(&self, channel: ChannelId) -> bool {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&channel)
    }
}

impl Drop for QuizGuard<'_> {
    fn drop(&mut self) {
        self.active
            .channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.channel);
    }
}

fn round_embed(round: u32, description: &str, footer: Option<&str>, thumbnail: &str) -> CreateEmbed {
    let mut e = CreateEmbed::new()
        .title(format!("Shopkeeper's Quiz (round {round})"))
        .description(description)
        .thumbnail(thumbnail)
        .color(EMBED_COLOR);
    if let Some(footer) = footer {
        e = e.footer(CreateEmbedFooter::new(footer));
    }
    e
}

/// Plays rounds in `channel` until one goes unanswered, then posts the
/// results.
pub async fn run(ctx: &serenity::Context, data: &Data, channel: ChannelId) -> Result<(), Error> {
    let Some(_guard) = data.quizzes.try_start(channel) else {
        let e = CreateEmbed::new()
            .description("A quiz is in progress!")
            .color(EMBED_COLOR);
        channel.send_message(&ctx.http, CreateMessage::new().embed(e)).await?;
        return Ok(());
    };

    info!("starting quiz in channel {channel}");
    let mut pool = data.quiz_words.clone();
    let mut scoreboard = Scoreboard::default();
    let mut round = 1;

    while !pool.is_empty() {
        let word = {
            let index = rand::thread_rng().gen_range(0..pool.len());
            pool.swap_remove(index)
        };
        let started = Instant::now();

        let intro = CreateEmbed::new()
            .description(format!("Starting round **{round}**, sit tight!"))
            .color(EMBED_COLOR);
        let mut message = channel
            .send_message(&ctx.http, CreateMessage::new().embed(intro))
            .await?;

        let mut answer = None;
        let mut shown = (String::new(), None, UNKNOWN_IMAGE.to_string());
        for phase in phases(&word) {
            let scrambled = {
                let mut rng = rand::thread_rng();
                if phase.easy {
                    easy_scramble(&word.text, &mut rng)
                } else {
                    scramble(&word.text, &mut rng)
                }
            };
            let (description, footer) = phase.describe(&word, &scrambled);
            let thumbnail = phase.thumbnail(&word);
            message
                .edit(
                    ctx,
                    EditMessage::new().embed(round_embed(round, &description, footer, &thumbnail)),
                )
                .await?;
            shown = (description, footer, thumbnail);

            let expected = word.clone();
            answer = channel
                .await_reply(ctx)
                .timeout(ROUND_TIME)
                .filter(move |m| !m.author.bot && expected.check(&m.content))
                .next()
                .await;
            if answer.is_some() {
                break;
            }
        }

        let (mut description, _, mut thumbnail) = shown;
        description += &format!("\n**Answer**: [{}]({})", word.text, word.url);
        if let Some(image) = &word.image {
            thumbnail = image.clone();
        }

        let Some(answer) = answer else {
            message.react(ctx, '👎').await?;
            let e = round_embed(
                round,
                &description,
                Some("Nobody answered in time! Game over."),
                &thumbnail,
            );
            message.edit(ctx, EditMessage::new().embed(e)).await?;
            break;
        };

        answer.react(ctx, '👍').await?;
        let name = answer.author.display_name().to_string();
        let gold = scoreboard.add(answer.author.id.get(), &name);
        award_gold(&data.db, answer.author.id.get(), gold)?;
        let footer = format!(
            "✅ {name} 🪙 {gold} gold ⌚ {:.2} seconds",
            started.elapsed().as_secs_f64()
        );
        let e = round_embed(round, &description, Some(&footer), &thumbnail);
        message.edit(ctx, EditMessage::new().embed(e)).await?;

        round += 1;
    }

    let Some(results) = scoreboard.results_text() else {
        return Ok(());
    };
    let e = CreateEmbed::new()
        .title("Shopkeeper's Quiz Results")
        .description(results)
        .thumbnail(SHOPKEEPER_IMAGE)
        .footer(CreateEmbedFooter::new("To play again, press NEW or type /quiz"))
        .color(EMBED_COLOR);
    let message = channel
        .send_message(&ctx.http, CreateMessage::new().embed(e))
        .await?;
    message
        .react(ctx, serenity::ReactionType::Unicode(NEW_QUIZ_EMOJI.to_string()))
        .await?;
    Ok(())
}

/// 🆕 on one of the bot's messages starts a new quiz in that channel.
pub async fn handle_reaction(
    ctx: &serenity::Context,
    reaction: &serenity::Reaction,
    data: &Data,
) -> Result<(), Error> {
    let new_quiz = serenity::ReactionType::Unicode(NEW_QUIZ_EMOJI.to_string());
    if reaction.emoji != new_quiz {
        return Ok(());
    }
    let bot_id = ctx.cache.current_user().id;
    if reaction.user_id == Some(bot_id) {
        return Ok(());
    }
    let message = reaction.message(ctx).await?;
    if message.author.id != bot_id {
        return Ok(());
    }

    if let Err(e) = message.delete_reaction(ctx, Some(bot_id), new_quiz).await {
        debug!("could not remove {NEW_QUIZ_EMOJI} reaction: {e}");
    }
    run(ctx, data, message.channel_id).await
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn word(text: &str, category: Category, hint: Option<&str>) -> Word {
        Word::new(text, category, None, hint.map(str::to_string))
    }

    fn sorted(s: &str) -> Vec<char> {
        let mut chars: Vec<char> = s.chars().collect();
        chars.sort_unstable();
        chars
    }

    #[test]
    fn test_prepare() {
        assert_eq!(prepare("Nature's Prophet"), "NATURES PROPHET");
        assert_eq!(prepare("Anti-Mage"), "ANTI MAGE");
    }

    #[test]
    fn test_scramble_keeps_letters() {
        let mut rng = StdRng::seed_from_u64(3);
        let scrambled = scramble("Crystal Maiden", &mut rng);
        assert_eq!(sorted(&scrambled), sorted("CRYSTAL MAIDEN"));
        assert_ne!(scrambled, "CRYSTAL MAIDEN");
    }

    #[test]
    fn test_scramble_cannot_change() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(scramble("a", &mut rng), "A");
        assert_eq!(scramble("oo", &mut rng), "OO");
    }

    #[test]
    fn test_easy_scramble_keeps_spaces() {
        let mut rng = StdRng::seed_from_u64(9);
        let scrambled = easy_scramble("Eye of Skadi", &mut rng);
        let words: Vec<&str> = scrambled.split(' ').collect();
        assert_eq!(words.len(), 3);
        assert_eq!(sorted(words[0]), sorted("EYE"));
        assert_eq!(sorted(words[1]), sorted("OF"));
        assert_eq!(sorted(words[2]), sorted("SKADI"));
    }

    #[test]
    fn test_check() {
        let w = word("Nature's Prophet", Category::Heroes, None);
        assert!(w.check("natures prophet"));
        assert!(w.check("Nature's-Prophet "));
        assert!(!w.check("prophet"));
    }

    #[test]
    fn test_hint_is_censored() {
        let w = word("Blink Dagger", Category::Items, Some("The Blink Dagger teleports."));
        assert_eq!(w.hint().as_deref(), Some("The ************ teleports."));
        assert_eq!(word("Axe", Category::Heroes, None).hint(), None);
        assert_eq!(word("Axe", Category::Heroes, Some("  ")).hint(), None);
    }

    #[test]
    fn test_phases() {
        assert_eq!(phases(&word("Axe", Category::Heroes, None)).len(), 3);
        let with_hint = phases(&word("Frostbite", Category::Abilities, Some("Ice.")));
        assert_eq!(with_hint.len(), 4);
        assert!(with_hint[3].hint && with_hint[3].easy);
    }

    #[test]
    fn test_phase_describe() {
        let w = word("Frostbite", Category::Abilities, Some("Frostbite freezes."));
        let (text, footer) = Phase::default().describe(&w, "TFBSOITER");
        assert_eq!(text, "**Unscramble:** TFBSOITER");
        assert_eq!(footer, None);

        let phase = Phase {
            category: true,
            easy: true,
            hint: true,
        };
        let (text, footer) = phase.describe(&w, "TFBSOITER");
        assert_eq!(
            text,
            "**Unscramble:** TFBSOITER\n**Category:** Abilities \n**Hint:** ********* freezes. "
        );
        assert_eq!(footer, Some("*Spaces are in their places!*"));
    }

    #[test]
    fn test_category_thumbnail() {
        let w = word("Blink Dagger", Category::Items, None);
        let phase = Phase {
            category: true,
            ..Phase::default()
        };
        assert_eq!(phase.thumbnail(&w), SHOPKEEPER_IMAGE);
        assert_eq!(Phase::default().thumbnail(&w), UNKNOWN_IMAGE);
    }

    #[test]
    fn test_single_winner_results() {
        let mut board = Scoreboard::default();
        board.add(1, "alice");
        board.add(2, "bob");
        board.add(1, "alice");
        assert_eq!(
            board.results_text().unwrap(),
            "Winner: **alice** earned **2** gold with 2 answers!\n\
             Losers:\n -- bob got 1 correct (**1** gold)\n"
        );
    }

    #[test]
    fn test_tie_results() {
        let mut board = Scoreboard::default();
        board.add(1, "alice");
        board.add(2, "bob");
        assert_eq!(
            board.results_text().unwrap(),
            "It's a tie! The following players earned **1** gold:\n -- alice\n -- bob\n"
        );
    }

    #[test]
    fn test_no_results() {
        assert!(Scoreboard::default().results_text().is_none());
    }

    #[test]
    fn test_award_gold() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(award_gold(&db, 7, 1).unwrap(), 1);
        assert_eq!(award_gold(&db, 7, 1).unwrap(), 2);
        assert_eq!(db.get_user_setting::<i64>(7, "gold").unwrap(), Some(2));
    }

    #[test]
    fn test_one_quiz_per_channel() {
        let active = ActiveQuizzes::default();
        let channel = ChannelId::new(5);
        let guard = active.try_start(channel).unwrap();
        assert!(active.try_start(channel).is_none());
        assert!(active.try_start(ChannelId::new(6)).is_some());
        assert!(active.is_running(channel));
        drop(guard);
        assert!(!active.is_running(channel));
        assert!(active.try_start(channel).is_some());
    }

    #[test]
    fn test_load_words() {
        let dir = tempfile::tempdir().unwrap();
        let db = Dotabase::open(crate::dota::dotabase::tests::fixture(dir.path())).unwrap();
        let words = load_words(&db).unwrap();

        let names: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(
            names,
            [
                "Frozen Expanse",
                "Axe",
                "Crystal Maiden",
                "Berserker's Call",
                "Coat of Blood",
                "Frostbite",
                "Blink Dagger",
                "Trusty Shovel",
            ]
        );
        assert_eq!(words[0].hint.as_deref(), Some("Hero: Crystal Maiden"));
        assert_eq!(words[4].category, Category::InnateAbilities);
        assert_eq!(words[4].hint.as_deref(), Some("Axe"));
        assert_eq!(words[5].category, Category::FacetAbilities);
        assert_eq!(words[7].hint, None);
    }
}

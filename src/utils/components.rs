use serenity::builder::{
    CreateActionRow, CreateButton, CreateSelectMenu, CreateSelectMenuKind,
    CreateSelectMenuOption,
};
use serenity::model::application::ButtonStyle;

use crate::audio::format::format_duration;
use crate::audio::Track;

pub const PAUSE: &str = "music_pause";
pub const RESUME: &str = "music_resume";
pub const SKIP: &str = "music_skip";
pub const STOP: &str = "music_stop";
pub const QUEUE_SELECT: &str = "music_queue_select";

/// Discord allows at most 25 options in a select menu.
const MAX_OPTIONS: usize = 25;

fn pause_button(is_paused: bool) -> CreateButton {
    if is_paused {
        CreateButton::new(RESUME)
            .label("Resume")
            .emoji('▶')
            .style(ButtonStyle::Success)
    } else {
        CreateButton::new(PAUSE)
            .label("Pause")
            .emoji('⏸')
            .style(ButtonStyle::Primary)
    }
}

fn buttons(is_paused: bool, disabled: bool) -> CreateActionRow {
    let skip = CreateButton::new(SKIP)
        .label("Skip")
        .emoji('⏭')
        .style(ButtonStyle::Secondary);
    let stop = CreateButton::new(STOP)
        .label("Stop")
        .emoji('⏹')
        .style(ButtonStyle::Danger);

    CreateActionRow::Buttons(
        [pause_button(is_paused), skip, stop]
            .into_iter()
            .map(|b| b.disabled(disabled))
            .collect(),
    )
}

pub fn music_buttons(is_paused: bool) -> CreateActionRow {
    buttons(is_paused, false)
}

pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars - 3).collect();
        format!("{truncated}...")
    }
}

fn queue_select_menu(upcoming: &[Track]) -> CreateActionRow {
    let count = upcoming.len().min(MAX_OPTIONS);
    let options: Vec<CreateSelectMenuOption> = upcoming
        .iter()
        .take(MAX_OPTIONS)
        .enumerate()
        .map(|(i, track)| {
            let desc = match track.duration {
                Some(d) => format!("#{} · {}", i + 1, format_duration(Some(d))),
                None => format!("#{}", i + 1),
            };
            CreateSelectMenuOption::new(truncate(&track.title, 100), format!("queue_{i}"))
                .description(truncate(&desc, 100))
        })
        .collect();

    let placeholder = if upcoming.len() > MAX_OPTIONS {
        format!("Up next ({count} of {} tracks)", upcoming.len())
    } else {
        format!("Up next ({count} tracks)")
    };

    let menu = CreateSelectMenu::new(QUEUE_SELECT, CreateSelectMenuKind::String { options })
        .placeholder(placeholder);

    CreateActionRow::SelectMenu(menu)
}

/// Buttons plus, when tracks are waiting, a dropdown listing them.
pub fn music_components(is_paused: bool, upcoming: &[Track]) -> Vec<CreateActionRow> {
    let mut rows = vec![music_buttons(is_paused)];
    if !upcoming.is_empty() {
        rows.push(queue_select_menu(upcoming));
    }
    rows
}

pub fn music_components_disabled() -> Vec<CreateActionRow> {
    vec![buttons(false, true)]
}

use serenity::builder::{CreateEmbed, CreateEmbedFooter};

use crate::audio::format::{format_duration, volume_bar};
use crate::audio::Track;

pub const MUSIC_COLOR: u32 = 0x1DB954;
pub const INFO_COLOR: u32 = 0x5865F2;
pub const ERROR_COLOR: u32 = 0xED4245;
pub const SUCCESS_COLOR: u32 = 0x57F287;

pub const TRACKS_PER_PAGE: usize = 10;

fn duration_suffix(track: &Track) -> String {
    track
        .duration
        .map_or(String::new(), |d| format!(" `{}`", format_duration(Some(d))))
}

pub fn now_playing(track: &Track) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title("🎵 Now Playing")
        .description(track.link())
        .color(MUSIC_COLOR);

    if track.duration.is_some() {
        embed = embed.field("Duration", format_duration(track.duration), true);
    }
    if !track.requester.is_empty() {
        embed = embed.field("Requested by", &track.requester, true);
    }
    if let Some(thumbnail) = &track.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }
    embed
}

pub fn added_to_queue(track: &Track, position: usize) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title("✅ Added to Queue")
        .description(track.link())
        .color(INFO_COLOR);

    if track.duration.is_some() {
        embed = embed.field("Duration", format_duration(track.duration), true);
    }
    embed = embed.field("Position", format!("#{position}"), true);
    if let Some(thumbnail) = &track.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }
    embed
}

pub fn queued_playlist(name: &str, url: Option<&str>, count: usize) -> CreateEmbed {
    let title = match url {
        Some(url) => format!("[{name}]({url})"),
        None => name.to_string(),
    };
    CreateEmbed::new()
        .title("📃 Queued Playlist")
        .description(format!("{title}\n**{count}** tracks added"))
        .color(INFO_COLOR)
}

/// Total pages for `len` pending tracks; an empty queue still has one.
pub fn page_count(len: usize) -> usize {
    len.div_ceil(TRACKS_PER_PAGE).max(1)
}

pub fn queue_list(current: Option<&Track>, tracks: &[Track], page: usize) -> CreateEmbed {
    let total_pages = page_count(tracks.len());
    let page = page.clamp(1, total_pages);

    let mut description = String::new();

    if let Some(track) = current {
        description.push_str(&format!(
            "**Now playing:** {}{}\n\n",
            track.link(),
            duration_suffix(track)
        ));
    }

    if tracks.is_empty() {
        description.push_str("The queue is empty.");
    } else {
        let start = (page - 1) * TRACKS_PER_PAGE;
        for (i, track) in tracks.iter().enumerate().skip(start).take(TRACKS_PER_PAGE) {
            description.push_str(&format!(
                "**{}.** {}{}\n",
                i + 1,
                track.link(),
                duration_suffix(track)
            ));
        }
    }

    let total: u64 = tracks.iter().filter_map(|t| t.duration).sum();
    CreateEmbed::new()
        .title(format!("📋 Queue ({page}/{total_pages})"))
        .description(description)
        .color(INFO_COLOR)
        .footer(CreateEmbedFooter::new(format!(
            "{} tracks · {}",
            tracks.len(),
            format_duration(Some(total))
        )))
}

pub fn volume(volume: f32) -> CreateEmbed {
    CreateEmbed::new()
        .title("🔊 Volume")
        .description(format!(
            "{} {}%",
            volume_bar(volume),
            (volume * 100.0).round() as u32
        ))
        .color(INFO_COLOR)
}

pub fn error(message: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title("❌ Error")
        .description(message)
        .color(ERROR_COLOR)
}

pub fn success(message: &str) -> CreateEmbed {
    CreateEmbed::new().description(message).color(SUCCESS_COLOR)
}

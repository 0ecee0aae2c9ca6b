use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::CreateEmbed;
use std::time::Duration;

use super::button_controls;
use super::format_duration;
use super::guild_registry::StopSummary;
use super::music_manager::{MusicError, Queued};
use super::playback::QueueNotice;
use super::queue_manager::QueueSnapshot;
use crate::commands::music::audio_sources::track_metadata::TrackMetadata;

const SUCCESS_COLOR: u32 = 0x00ff00;
const ERROR_COLOR: u32 = 0xff0000;

/// Upcoming tracks listed before the rest are summarised.
const QUEUE_DISPLAY_LIMIT: usize = 10;

/// Discord rejects embeds whose description is longer than this.
const DESCRIPTION_LIMIT: usize = 4096;

/// Room kept at the end of the queue description for the summary lines.
const DESCRIPTION_FOOTER_RESERVE: usize = 96;

const TITLE_LIMIT: usize = 80;

/// Longer URLs are left out and the title is shown on its own.
const LINK_URL_LIMIT: usize = 512;

fn duration_label(duration: Option<Duration>) -> String {
    duration
        .map(format_duration)
        .unwrap_or_else(|| "Live".to_string())
}

/// Backslash-escapes everything Discord markdown would otherwise interpret.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '~' | '`' | '|' | '[' | ']' | '(' | ')' | '<' | '>') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A track title shortened and escaped for use inside markdown.
pub fn display_title(title: &str) -> String {
    let title = match title.char_indices().nth(TITLE_LIMIT) {
        Some((cut, _)) => format!("{}…", title[..cut].trim_end()),
        None => title.to_string(),
    };
    escape_markdown(&title)
}

fn track_link(track: &TrackMetadata) -> String {
    let title = display_title(&track.title);
    if track.url.is_empty() || track.url.chars().count() > LINK_URL_LIMIT {
        return title;
    }
    let url = track
        .url
        .replace('(', "%28")
        .replace(')', "%29")
        .replace(' ', "%20");
    format!("[{}]({})", title, url)
}

/// Create an embed describing a track that just started
pub fn now_playing(track: &TrackMetadata, upcoming: usize) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title("🎵 Now Playing")
        .description(format!("{}\nby {}", track_link(track), escape_markdown(&track.author)))
        .field("Duration", format!("`{}`", duration_label(track.duration)), true)
        .field("Requested by", format!("<@{}>", track.requested_by), true)
        .color(SUCCESS_COLOR);

    if upcoming > 0 {
        embed = embed.field("Up next", format!("`{} in queue`", upcoming), true);
    }
    if let Some(thumbnail) = &track.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }
    embed
}

/// Create a reply for a `play` request
pub fn queued(queued: &Queued) -> CreateReply {
    let embed = if queued.started {
        now_playing(&queued.track, 0)
    } else {
        let mut embed = CreateEmbed::new()
            .title("🎵 Added to Queue")
            .description(track_link(&queued.track))
            .field("Duration", format!("`{}`", duration_label(queued.track.duration)), true)
            .field("Position", format!("`#{}`", queued.position), true)
            .color(SUCCESS_COLOR);
        if let Some(thumbnail) = &queued.track.thumbnail {
            embed = embed.thumbnail(thumbnail);
        }
        embed
    };

    CreateReply::default()
        .embed(embed)
        .components(button_controls::create_music_control_buttons(false))
}

/// The body of the queue embed.
pub fn queue_description(snapshot: &QueueSnapshot) -> String {
    let mut description = String::new();

    match &snapshot.current {
        Some(track) => {
            let state = if snapshot.paused { "⏸️ Paused" } else { "🎵 Now Playing" };
            description.push_str(&format!("**{}**\n", state));
            description.push_str(&format!(
                "**{}** `{}`\n\n",
                track_link(track),
                duration_label(track.duration)
            ));
        }
        None => description.push_str("**🔇 Nothing playing**\n\n"),
    }

    if snapshot.pending.is_empty() {
        description.push_str("**📭 Nothing up next**");
        return description;
    }

    description.push_str(&format!("**📋 Up Next - {} tracks**\n", snapshot.pending.len()));
    let mut length = description.chars().count();
    let mut shown = 0;
    for (index, track) in snapshot.pending.iter().take(QUEUE_DISPLAY_LIMIT).enumerate() {
        let line = format!(
            "`{}.` {} `{}`\n",
            index + 1,
            track_link(track),
            duration_label(track.duration)
        );
        let line_length = line.chars().count();
        if length + line_length > DESCRIPTION_LIMIT - DESCRIPTION_FOOTER_RESERVE {
            break;
        }
        description.push_str(&line);
        length += line_length;
        shown += 1;
    }

    let hidden = snapshot.pending.len() - shown;
    if hidden > 0 {
        description.push_str(&format!("… and {} more\n", hidden));
    }

    let total: Duration = snapshot.pending.iter().filter_map(|track| track.duration).sum();
    if total.as_secs() > 0 {
        description.push_str(&format!("\n**⏱️ Total Duration:** `{}`", format_duration(total)));
    }

    description
}

/// Create an embed for the music queue
pub fn music_queue(snapshot: &QueueSnapshot) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("🎵 Music Queue")
                .description(queue_description(snapshot))
                .color(SUCCESS_COLOR),
        )
        .components(button_controls::create_music_control_buttons(snapshot.paused))
}

pub fn now_playing_reply(track: &TrackMetadata, paused: bool, upcoming: usize) -> CreateReply {
    let mut embed = now_playing(track, upcoming);
    if paused {
        embed = embed.title("⏸️ Paused");
    }
    CreateReply::default()
        .embed(embed)
        .components(button_controls::create_music_control_buttons(paused))
}

/// Create an embed for when a track is paused
pub fn paused(track: &TrackMetadata) -> CreateReply {
    success("⏸️ Paused", format!("Paused {}", track_link(track)))
}

/// Create an embed for when a track is resumed
pub fn resumed(track: &TrackMetadata) -> CreateReply {
    success("▶️ Resumed", format!("Resumed {}", track_link(track)))
}

/// Create an embed for when a track is skipped
pub fn skipped(track: &TrackMetadata) -> CreateReply {
    success("⏭️ Skipped", format!("Skipped {}", track_link(track)))
}

pub fn stopped(summary: &StopSummary) -> CreateReply {
    let description = match summary.cleared {
        0 => "Playback stopped and I left the voice channel".to_string(),
        1 => "Playback stopped, 1 queued track cleared".to_string(),
        n => format!("Playback stopped, {} queued tracks cleared", n),
    };
    success("⏹️ Stopped", description)
}

pub fn shuffled(count: usize) -> CreateReply {
    success("🔀 Shuffled", format!("Shuffled {} upcoming tracks", count))
}

/// Create an embed for when a track is removed from the queue
pub fn track_removed(track: &TrackMetadata, position: usize) -> CreateReply {
    success(
        "🗑️ Track Removed",
        format!("Removed {} from position #{}", track_link(track), position),
    )
}

fn success(title: &str, description: String) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title(title)
            .description(description)
            .color(SUCCESS_COLOR),
    )
}

pub fn error_embed(message: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title("❌ Error")
        .description(message)
        .color(ERROR_COLOR)
}

/// Create an ephemeral reply explaining why a music command failed
pub fn music_error(err: &MusicError) -> CreateReply {
    CreateReply::default()
        .embed(error_embed(&err.to_string()))
        .ephemeral(true)
}

/// The text of an unsolicited notice, as (title, description).
pub fn notice_text(notice: &QueueNotice) -> (String, String) {
    match notice {
        QueueNotice::NowPlaying { track, .. } => ("🎵 Now Playing".into(), track_link(track)),
        QueueNotice::PlaybackFailed { title } => (
            "⚠️ Playback Failed".into(),
            format!("Couldn't play **{}**, moving on", display_title(title)),
        ),
        QueueNotice::GaveUp { failures, dropped } => (
            "❌ Giving Up".into(),
            format!(
                "{} tracks in a row failed to play, so I cleared the remaining {} from the queue",
                failures, dropped
            ),
        ),
        QueueNotice::QueueEnded => (
            "📭 Queue Finished".into(),
            "That's everything! Add more with `/play`".into(),
        ),
        QueueNotice::IdleDisconnected => (
            "👋 Left Voice Channel".into(),
            "Left the voice channel after being idle".into(),
        ),
    }
}

/// Create an embed for an unsolicited notice
pub fn notice(notice: &QueueNotice) -> CreateEmbed {
    if let QueueNotice::NowPlaying { track, upcoming } = notice {
        return now_playing(track, *upcoming);
    }

    let (title, description) = notice_text(notice);
    let color = match notice {
        QueueNotice::PlaybackFailed { .. } | QueueNotice::GaveUp { .. } => ERROR_COLOR,
        _ => SUCCESS_COLOR,
    };
    CreateEmbed::new().title(title).description(description).color(color)
}

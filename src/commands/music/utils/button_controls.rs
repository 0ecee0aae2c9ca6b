use serenity::all::{ButtonStyle, CreateActionRow, CreateButton, ReactionType};

pub const PAUSE_RESUME_ID: &str = "music_pause_resume";
pub const SKIP_ID: &str = "music_skip";
pub const STOP_ID: &str = "music_stop";
pub const SHUFFLE_ID: &str = "music_shuffle";

/// A button press on one of the music controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicButton {
    PauseResume,
    Skip,
    Stop,
    Shuffle,
}

impl MusicButton {
    pub fn from_custom_id(custom_id: &str) -> Option<Self> {
        match custom_id {
            PAUSE_RESUME_ID => Some(Self::PauseResume),
            SKIP_ID => Some(Self::Skip),
            STOP_ID => Some(Self::Stop),
            SHUFFLE_ID => Some(Self::Shuffle),
            _ => None,
        }
    }
}

/// Creates a row of music control buttons. The first button offers whichever
/// of pause/resume applies.
pub fn create_music_control_buttons(paused: bool) -> Vec<CreateActionRow> {
    let pause_resume = CreateButton::new(PAUSE_RESUME_ID)
        .emoji(ReactionType::Unicode(
            if paused { "▶️" } else { "⏸️" }.to_string(),
        ))
        .style(ButtonStyle::Primary)
        .label(if paused { "Resume" } else { "Pause" });

    let skip = CreateButton::new(SKIP_ID)
        .emoji(ReactionType::Unicode("⏭️".to_string()))
        .style(ButtonStyle::Secondary)
        .label("Skip");

    let shuffle = CreateButton::new(SHUFFLE_ID)
        .emoji(ReactionType::Unicode("🔀".to_string()))
        .style(ButtonStyle::Secondary)
        .label("Shuffle");

    let stop = CreateButton::new(STOP_ID)
        .emoji(ReactionType::Unicode("⏹️".to_string()))
        .style(ButtonStyle::Danger)
        .label("Stop");

    vec![CreateActionRow::Buttons(vec![pause_resume, skip, shuffle, stop])]
}

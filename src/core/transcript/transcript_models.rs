// Transcript domain models - a captured snapshot of a ticket channel.
//
// The Discord layer fills these from message history; the renderer turns
// them into HTML/text documents. No serenity types cross this boundary.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct TranscriptAuthor {
    pub id: u64,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
    pub bot: bool,
}

#[derive(Debug, Clone)]
pub struct TranscriptEmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TranscriptEmbed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<u32>,
    pub fields: Vec<TranscriptEmbedField>,
    pub footer: Option<String>,
    pub thumbnail: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TranscriptAttachment {
    pub filename: String,
    pub url: String,
    pub size_bytes: u64,
}

/// How an attachment is presented in the HTML transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Video,
    Image,
    Audio,
    File,
}

impl TranscriptAttachment {
    pub fn kind(&self) -> AttachmentKind {
        let name = self.filename.to_lowercase();
        let has_ext = |exts: &[&str]| exts.iter().any(|e| name.ends_with(e));

        if has_ext(&[".mp4", ".webm", ".mov", ".avi", ".mkv"]) {
            AttachmentKind::Video
        } else if has_ext(&[".jpg", ".jpeg", ".png", ".gif", ".webp"]) {
            AttachmentKind::Image
        } else if has_ext(&[".mp3", ".wav", ".ogg", ".m4a"]) {
            AttachmentKind::Audio
        } else {
            AttachmentKind::File
        }
    }

    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

#[derive(Debug, Clone)]
pub struct TranscriptMessage {
    pub id: u64,
    pub author: TranscriptAuthor,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub embeds: Vec<TranscriptEmbed>,
    pub attachments: Vec<TranscriptAttachment>,
}

/// Header metadata shown at the top of a transcript.
#[derive(Debug, Clone)]
pub struct TranscriptContext {
    pub ticket_id: u32,
    pub guild_name: String,
    pub channel_name: String,
    pub creator_name: String,
    pub category_label: String,
    pub priority: String,
    pub status: String,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(filename: &str) -> TranscriptAttachment {
        TranscriptAttachment {
            filename: filename.to_string(),
            url: String::new(),
            size_bytes: 2 * 1024 * 1024,
        }
    }

    #[test]
    fn test_attachment_kind_classification() {
        assert_eq!(attachment("clip.MP4").kind(), AttachmentKind::Video);
        assert_eq!(attachment("shot.png").kind(), AttachmentKind::Image);
        assert_eq!(attachment("voice.ogg").kind(), AttachmentKind::Audio);
        assert_eq!(attachment("report.pdf").kind(), AttachmentKind::File);
        assert_eq!(attachment("no_extension").kind(), AttachmentKind::File);
    }

    #[test]
    fn test_size_mb() {
        assert!((attachment("a.bin").size_mb() - 2.0).abs() < f64::EPSILON);
    }
}

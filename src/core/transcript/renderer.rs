// Transcript renderers - pure string building, no I/O.
//
// Three outputs per archived ticket:
// - a Discord-styled HTML document,
// - a mobile-friendly plain-text document,
// - a line-oriented replay log (plus closure summary) that the reopen flow
//   parses back into messages.

use super::markdown::{escape_html, render_markdown};
use super::transcript_models::{
    AttachmentKind, TranscriptContext, TranscriptEmbed, TranscriptMessage,
};
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Inputs for the closure summary appended to the replay log.
#[derive(Debug, Clone)]
pub struct CloseSummary {
    pub ticket_id: u32,
    pub creator_id: u64,
    pub closed_by_id: u64,
    pub claimed_by_id: Option<u64>,
    pub category_label: String,
    pub priority: String,
    pub reopened_label: String,
    pub message_count: usize,
    pub note_count: usize,
    pub added_user_count: usize,
    pub created_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    pub duration: String,
}

const HTML_STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body {
    font-family: "Whitney", "Helvetica Neue", Helvetica, Arial, "Noto Color Emoji", sans-serif;
    background: #36393f;
    color: #dcddde;
    line-height: 1.375;
}
.transcript-container { max-width: 1200px; margin: 0 auto; background: #36393f; }
.header { background: #2f3136; padding: 15px; border-bottom: 1px solid #202225; }
.header h1 { color: #ffffff; font-size: 24px; margin-bottom: 10px; display: flex; align-items: center; }
.ticket-icon {
    background: #5865f2; color: white; border-radius: 50%;
    width: 40px; height: 40px; display: flex; align-items: center;
    justify-content: center; margin-right: 12px; font-weight: bold;
}
.header-info {
    display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
    gap: 15px; margin-top: 15px;
}
.info-item { background: #40444b; padding: 12px; border-radius: 6px; border-left: 4px solid #5865f2; }
.info-label { font-size: 12px; color: #b9bbbe; text-transform: uppercase; font-weight: 600; margin-bottom: 4px; }
.info-value { color: #ffffff; font-weight: 500; }
.messages { padding: 20px; }
.message { display: flex; margin-bottom: 20px; padding: 8px 0; }
.message:hover { background: rgba(4, 4, 5, 0.07); }
.avatar { width: 40px; height: 40px; border-radius: 50%; margin-right: 16px; flex-shrink: 0; }
.message-content { flex: 1; min-width: 0; }
.message-header { display: flex; align-items: baseline; margin-bottom: 4px; }
.username { font-weight: 500; color: #ffffff; margin-right: 8px; }
.bot-tag {
    background: #5865f2; color: #ffffff; font-size: 10px; font-weight: 500;
    padding: 1px 4px; border-radius: 3px; margin-right: 8px; text-transform: uppercase;
}
.timestamp { font-size: 12px; color: #72767d; margin-left: 8px; }
.message-text { color: #dcddde; word-wrap: break-word; white-space: pre-wrap; }
.message-text strong { font-weight: 600; color: #ffffff; }
.code-block, .message-text pre {
    background: #2f3136; color: #f8f8f2; padding: 8px 12px; border-radius: 4px;
    border-left: 4px solid #40444b; font-family: "Consolas", "Monaco", "Menlo", monospace;
    font-size: 14px; white-space: pre-wrap; overflow-x: auto; margin: 4px 0; position: relative;
}
.code-block[data-lang]:not([data-lang=""]):before {
    content: attr(data-lang); position: absolute; top: 2px; right: 8px;
    font-size: 10px; color: #72767d; text-transform: uppercase; font-weight: 600;
}
.inline-code {
    background: #2f3136; color: #f8f8f2; padding: 2px 4px; border-radius: 3px;
    font-family: "Consolas", "Monaco", "Menlo", monospace; font-size: 85%;
}
.spoiler { background: #202225; color: #202225; border-radius: 3px; padding: 0 2px; cursor: pointer; }
.spoiler:hover, .spoiler.revealed { color: #dcddde; background: #484c52; }
.mention { background: #414675; color: #dee0fc; padding: 0 2px; border-radius: 3px; font-weight: 500; }
.channel-mention { background: #414675; color: #00b0f4; padding: 0 2px; border-radius: 3px; font-weight: 500; }
.role-mention { background: #414675; color: #faa61a; padding: 0 2px; border-radius: 3px; font-weight: 500; }
.emoji { width: 22px; height: 22px; vertical-align: middle; object-fit: contain; margin: 0 1px; }
.discord-header { color: #ffffff; margin: 12px 0 8px 0; font-weight: 600; }
.quote-line {
    background: #2f3136; border-left: 4px solid #4f545c; margin: 4px 0;
    padding: 8px 12px; border-radius: 0 4px 4px 0; color: #b5b6b8; font-style: italic;
}
.discord-link { color: #00b0f4; text-decoration: none; word-break: break-all; }
.discord-link:hover { text-decoration: underline; }
.embed {
    border-left: 4px solid #5865f2; background: #2f3136; margin: 8px 0;
    border-radius: 0 4px 4px 0; padding: 16px; max-width: 520px;
}
.embed-title { color: #00b0f4; font-size: 16px; font-weight: 600; margin-bottom: 8px; }
.embed-description { color: #dcddde; font-size: 14px; margin-bottom: 8px; }
.embed-field { margin-bottom: 8px; }
.embed-field-name { color: #ffffff; font-size: 14px; font-weight: 600; margin-bottom: 2px; }
.embed-field-value { color: #dcddde; font-size: 14px; }
.embed-footer { color: #72767d; font-size: 12px; margin-top: 8px; }
.attachment {
    background: #2f3136; border: 1px solid #40444b; border-radius: 8px;
    padding: 16px; margin: 8px 0; max-width: 400px;
}
.attachment-name { color: #00b0f4; font-weight: 500; margin-bottom: 4px; }
.attachment-size { color: #72767d; font-size: 12px; }
.image-attachment { max-width: 500px; border-radius: 8px; margin: 8px 0; }
.video-attachment { max-width: 500px; border-radius: 8px; margin: 8px 0; }
.footer { background: #2f3136; padding: 20px; text-align: center; border-top: 1px solid #202225; margin-top: 40px; }
.footer-text { color: #72767d; font-size: 14px; }
@media (max-width: 768px) {
    .header { padding: 10px; }
    .header-info { grid-template-columns: 1fr; gap: 8px; margin-top: 10px; }
    .messages { padding: 10px 5px; }
    .avatar { width: 32px; height: 32px; margin-right: 12px; }
    .embed, .attachment { max-width: 100%; }
}
"#;

const HTML_SCRIPT: &str = r#"
document.addEventListener('DOMContentLoaded', function() {
    document.querySelectorAll('.spoiler').forEach(function(el) {
        el.addEventListener('click', function() { this.classList.toggle('revealed'); });
    });
});
"#;

/// Build the Discord-styled HTML transcript.
pub fn render_html_transcript(ctx: &TranscriptContext, messages: &[TranscriptMessage]) -> String {
    let mut html = String::with_capacity(16 * 1024);

    write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
         <meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>Ticket #{id} Transcript - {guild}</title>\n\
         <style>{style}</style>\n\
         <script>{script}</script>\n\
         </head>\n<body>\n<div class=\"transcript-container\">\n",
        id = ctx.ticket_id,
        guild = escape_html(&ctx.guild_name),
        style = HTML_STYLE,
        script = HTML_SCRIPT,
    )
    .unwrap();

    // Header info grid
    write!(
        html,
        "<div class=\"header\">\n\
         <h1><div class=\"ticket-icon\">🎫</div>Ticket #{id} Transcript</h1>\n\
         <div class=\"header-info\">\n",
        id = ctx.ticket_id
    )
    .unwrap();
    let info = [
        ("Server", ctx.guild_name.as_str()),
        ("Channel", ctx.channel_name.as_str()),
        ("Created By", ctx.creator_name.as_str()),
        ("Type", ctx.category_label.as_str()),
        ("Priority", ctx.priority.as_str()),
        ("Status", ctx.status.as_str()),
    ];
    for (label, value) in info {
        write!(
            html,
            "<div class=\"info-item\"><div class=\"info-label\">{}</div>\
             <div class=\"info-value\">{}</div></div>\n",
            label,
            escape_html(value)
        )
        .unwrap();
    }
    write!(
        html,
        "<div class=\"info-item\"><div class=\"info-label\">Messages</div>\
         <div class=\"info-value\">{}</div></div>\n\
         <div class=\"info-item\"><div class=\"info-label\">Generated</div>\
         <div class=\"info-value\">{}</div></div>\n\
         </div>\n</div>\n<div class=\"messages\">\n",
        messages.len(),
        ctx.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
    .unwrap();

    for msg in messages {
        render_html_message(&mut html, msg);
    }

    write!(
        html,
        "</div>\n<div class=\"footer\">\
         <div class=\"footer-text\">Discord Ticket Transcript</div>\
         </div>\n</div>\n</body>\n</html>\n"
    )
    .unwrap();

    html
}

fn render_html_message(html: &mut String, msg: &TranscriptMessage) {
    let timestamp = msg.timestamp.format("%m/%d/%Y %I:%M %p");
    let bot_tag = if msg.author.bot {
        "<span class=\"bot-tag\">BOT</span>"
    } else {
        ""
    };

    write!(
        html,
        "<div class=\"message\">\n\
         <img src=\"{avatar}\" alt=\"{name}\" class=\"avatar\">\n\
         <div class=\"message-content\">\n\
         <div class=\"message-header\">\
         <span class=\"username\">{name}</span>{bot_tag}\
         <span class=\"timestamp\">{timestamp}</span></div>\n",
        avatar = escape_html(&msg.author.avatar_url),
        name = escape_html(&msg.author.display_name),
    )
    .unwrap();

    if !msg.content.is_empty() {
        write!(
            html,
            "<div class=\"message-text\">{}</div>\n",
            render_markdown(&msg.content)
        )
        .unwrap();
    }

    for embed in &msg.embeds {
        render_html_embed(html, embed);
    }

    for attachment in &msg.attachments {
        let name = escape_html(&attachment.filename);
        let url = escape_html(&attachment.url);
        let size = attachment.size_mb();
        match attachment.kind() {
            AttachmentKind::Video => write!(
                html,
                "<div class=\"attachment\">\
                 <div class=\"attachment-name\">🎬 {name}</div>\
                 <div class=\"attachment-size\">{size:.2} MB</div>\
                 <video class=\"video-attachment\" controls preload=\"metadata\">\
                 <source src=\"{url}\" type=\"video/mp4\"></video></div>\n"
            )
            .unwrap(),
            AttachmentKind::Image => write!(
                html,
                "<div class=\"attachment\">\
                 <div class=\"attachment-name\">🖼️ {name}</div>\
                 <div class=\"attachment-size\">{size:.2} MB</div>\
                 <img class=\"image-attachment\" src=\"{url}\" alt=\"{name}\" loading=\"lazy\"></div>\n"
            )
            .unwrap(),
            AttachmentKind::Audio => write!(
                html,
                "<div class=\"attachment\">\
                 <div class=\"attachment-name\">🎵 {name}</div>\
                 <div class=\"attachment-size\">{size:.2} MB</div>\
                 <audio controls style=\"width: 100%; margin-top: 8px;\">\
                 <source src=\"{url}\" type=\"audio/mpeg\"></audio></div>\n"
            )
            .unwrap(),
            AttachmentKind::File => write!(
                html,
                "<div class=\"attachment\">\
                 <div class=\"attachment-name\">📎 {name}</div>\
                 <div class=\"attachment-size\">{size:.2} MB</div>\
                 <a href=\"{url}\" target=\"_blank\" class=\"discord-link\">📥 Download</a></div>\n"
            )
            .unwrap(),
        }
    }

    html.push_str("</div>\n</div>\n");
}

fn render_html_embed(html: &mut String, embed: &TranscriptEmbed) {
    let border = embed
        .color
        .map(|c| format!("#{c:06x}"))
        .unwrap_or_else(|| "#5865f2".to_string());
    write!(
        html,
        "<div class=\"embed\" style=\"border-left-color: {border};\">\n"
    )
    .unwrap();

    if let Some(title) = &embed.title {
        write!(html, "<div class=\"embed-title\">{}</div>\n", escape_html(title)).unwrap();
    }
    if let Some(desc) = &embed.description {
        write!(
            html,
            "<div class=\"embed-description\">{}</div>\n",
            render_markdown(desc)
        )
        .unwrap();
    }
    for field in &embed.fields {
        write!(
            html,
            "<div class=\"embed-field\">\
             <div class=\"embed-field-name\">{}</div>\
             <div class=\"embed-field-value\">{}</div></div>\n",
            escape_html(&field.name),
            render_markdown(&field.value)
        )
        .unwrap();
    }
    if let Some(footer) = &embed.footer {
        write!(html, "<div class=\"embed-footer\">{}</div>\n", escape_html(footer)).unwrap();
    }

    html.push_str("</div>\n");
}

/// Build the mobile-friendly text transcript.
pub fn render_text_transcript(ctx: &TranscriptContext, messages: &[TranscriptMessage]) -> String {
    let mut text = String::with_capacity(8 * 1024);
    let rule = "=".repeat(80);

    write!(
        text,
        "╔{border}╗\n║{title:^80}║\n╚{border}╝\n\n\
         🎫 Ticket ID: #{id}\n\
         🏢 Server: {guild}\n\
         📍 Channel: #{channel}\n\
         👤 Created By: {creator}\n\
         🏷️ Type: {category}\n\
         ⚡ Priority: {priority}\n\
         📊 Status: {status}\n\
         📝 Total Messages: {count}\n\
         🕐 Generated: {generated}\n\n\
         {rule}\nMESSAGE HISTORY\n{rule}\n\n",
        border = "═".repeat(80),
        title = "DISCORD TICKET TRANSCRIPT",
        id = ctx.ticket_id,
        guild = ctx.guild_name,
        channel = ctx.channel_name,
        creator = ctx.creator_name,
        category = ctx.category_label,
        priority = ctx.priority,
        status = ctx.status,
        count = messages.len(),
        generated = ctx.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
    .unwrap();

    for (i, msg) in messages.iter().enumerate() {
        write!(
            text,
            "\n[{n:03}] {ts}\n👤 {name}{bot} (ID: {id})\n",
            n = i + 1,
            ts = msg.timestamp.format("%m/%d/%Y %I:%M %p"),
            name = msg.author.display_name,
            bot = if msg.author.bot { " [BOT]" } else { "" },
            id = msg.author.id,
        )
        .unwrap();

        if !msg.content.is_empty() {
            // Backticks collide with Discord formatting when re-pasted.
            let content = msg.content.replace("```", "---").replace('`', "\"");
            writeln!(text, "💬 {content}").unwrap();
        }

        for embed in &msg.embeds {
            if let Some(title) = &embed.title {
                writeln!(text, "📄 EMBED: {title}").unwrap();
            }
            if let Some(desc) = &embed.description {
                let desc = if desc.len() > 200 {
                    format!("{}...", truncate_at_boundary(desc, 200))
                } else {
                    desc.clone()
                };
                writeln!(text, "   📝 {desc}").unwrap();
            }
        }

        for attachment in &msg.attachments {
            writeln!(
                text,
                "📎 ATTACHMENT: {} ({:.2} MB)\n   🔗 {}",
                attachment.filename,
                attachment.size_mb(),
                attachment.url
            )
            .unwrap();
        }

        writeln!(text, "{}", "-".repeat(40)).unwrap();
    }

    write!(text, "\n{rule}\nEND OF TRANSCRIPT\n{rule}").unwrap();
    text
}

/// One replay-log line per content-bearing message, in the format the
/// reopen flow parses: `[timestamp] user_id|username|display_name: content`.
pub fn render_replay_log(messages: &[TranscriptMessage]) -> String {
    let mut log = String::new();
    for msg in messages {
        let timestamp = msg.timestamp.format("%Y-%m-%d %H:%M:%S UTC");
        let author = format!(
            "{}|{}|{}",
            msg.author.id, msg.author.username, msg.author.display_name
        );

        if !msg.content.is_empty() {
            // Newlines would break the line-oriented format.
            let content = msg.content.replace('\n', " ");
            writeln!(log, "[{timestamp}] {author}: {content}").unwrap();
        }
        for embed in &msg.embeds {
            if let Some(title) = &embed.title {
                writeln!(log, "[{timestamp}] {author} sent embed: {title}").unwrap();
            }
        }
        for attachment in &msg.attachments {
            writeln!(
                log,
                "[{timestamp}] {author} sent attachment: {} ({})",
                attachment.filename, attachment.url
            )
            .unwrap();
        }
    }
    log
}

/// The closure summary block appended to the replay log.
pub fn render_close_summary(summary: &CloseSummary) -> String {
    let rule = "=".repeat(50);
    format!(
        "\n{rule}\nTICKET CLOSURE SUMMARY\n{rule}\n\
         Ticket ID: {id}\n\
         Created by: <@{creator}>\n\
         Closed by: <@{closer}>\n\
         Claimed by: {claimer}\n\
         Type: {category}\n\
         Priority: {priority}\n\
         Status: Closed\n\
         Reopened: {reopened}\n\
         Total messages: {messages}\n\
         Notes count: {notes}\n\
         Added users: {added}\n\
         Created at: {created}\n\
         Closed at: {closed}\n\
         Duration: {duration}\n\
         {rule}\n",
        id = summary.ticket_id,
        creator = summary.creator_id,
        closer = summary.closed_by_id,
        claimer = summary
            .claimed_by_id
            .map(|id| format!("<@{id}>"))
            .unwrap_or_else(|| "None".to_string()),
        category = summary.category_label,
        priority = summary.priority,
        reopened = summary.reopened_label,
        messages = summary.message_count,
        notes = summary.note_count,
        added = summary.added_user_count,
        created = summary.created_at.to_rfc3339(),
        closed = summary.closed_at.to_rfc3339(),
        duration = summary.duration,
    )
}

fn truncate_at_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::super::transcript_models::*;
    use super::*;

    fn context() -> TranscriptContext {
        TranscriptContext {
            ticket_id: 12345,
            guild_name: "Test Guild".to_string(),
            channel_name: "support-1".to_string(),
            creator_name: "alice".to_string(),
            category_label: "Support".to_string(),
            priority: "Medium".to_string(),
            status: "Open".to_string(),
            generated_at: Utc::now(),
        }
    }

    fn message(content: &str) -> TranscriptMessage {
        TranscriptMessage {
            id: 1,
            author: TranscriptAuthor {
                id: 7,
                username: "alice".to_string(),
                display_name: "Alice".to_string(),
                avatar_url: "https://cdn.example/avatar.png".to_string(),
                bot: false,
            },
            content: content.to_string(),
            timestamp: Utc::now(),
            embeds: Vec::new(),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn test_html_transcript_contains_header_and_messages() {
        let html = render_html_transcript(&context(), &[message("hello **world**")]);
        assert!(html.contains("Ticket #12345 Transcript"));
        assert!(html.contains("Test Guild"));
        assert!(html.contains("<strong>world</strong>"));
        assert!(html.contains("class=\"avatar\""));
        assert!(html.contains("</html>"));
    }

    #[test]
    fn test_html_escapes_author_and_guild_names() {
        let mut ctx = context();
        ctx.guild_name = "<script>alert(1)</script>".to_string();
        let mut msg = message("hi");
        msg.author.display_name = "<img>".to_string();

        let html = render_html_transcript(&ctx, &[msg]);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&lt;img&gt;"));
    }

    #[test]
    fn test_html_attachment_dispatch() {
        let mut msg = message("");
        msg.attachments = vec![
            TranscriptAttachment {
                filename: "clip.mp4".to_string(),
                url: "https://cdn.example/clip.mp4".to_string(),
                size_bytes: 1024,
            },
            TranscriptAttachment {
                filename: "shot.png".to_string(),
                url: "https://cdn.example/shot.png".to_string(),
                size_bytes: 1024,
            },
            TranscriptAttachment {
                filename: "notes.pdf".to_string(),
                url: "https://cdn.example/notes.pdf".to_string(),
                size_bytes: 1024,
            },
        ];

        let html = render_html_transcript(&context(), &[msg]);
        assert!(html.contains("<video"));
        assert!(html.contains("image-attachment"));
        assert!(html.contains("📥 Download"));
    }

    #[test]
    fn test_text_transcript_numbering_and_bot_tag() {
        let mut bot_msg = message("automated reply");
        bot_msg.author.bot = true;

        let text = render_text_transcript(&context(), &[message("first"), bot_msg]);
        assert!(text.contains("[001]"));
        assert!(text.contains("[002]"));
        assert!(text.contains("[BOT]"));
        assert!(text.contains("DISCORD TICKET TRANSCRIPT"));
        assert!(text.contains("END OF TRANSCRIPT"));
    }

    #[test]
    fn test_replay_log_format_roundtrips_with_parser() {
        let mut msg = message("help\nme");
        msg.embeds.push(TranscriptEmbed {
            title: Some("An Embed".to_string()),
            ..TranscriptEmbed::default()
        });

        let log = render_replay_log(&[msg]);
        let first_line = log.lines().next().unwrap();
        assert!(first_line.starts_with('['));
        assert!(first_line.contains("7|alice|Alice: help me"));
        assert!(log.contains("sent embed: An Embed"));
    }

    #[test]
    fn test_close_summary_fields() {
        let now = Utc::now();
        let summary = render_close_summary(&CloseSummary {
            ticket_id: 12345,
            creator_id: 7,
            closed_by_id: 8,
            claimed_by_id: None,
            category_label: "Support".to_string(),
            priority: "High".to_string(),
            reopened_label: "No".to_string(),
            message_count: 3,
            note_count: 1,
            added_user_count: 0,
            created_at: now,
            closed_at: now,
            duration: "5m".to_string(),
        });

        assert!(summary.contains("TICKET CLOSURE SUMMARY"));
        assert!(summary.contains("Ticket ID: 12345"));
        assert!(summary.contains("Claimed by: None"));
        assert!(summary.contains("Duration: 5m"));
    }
}

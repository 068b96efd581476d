// Server-side rendering of Discord-flavored markdown into transcript HTML.
//
// Covers the subset Discord messages actually use: code blocks, inline
// code, bold, italic, strikethrough, spoilers, user/channel/role mentions,
// custom emojis, headers, quote lines, bare links and line breaks. Code
// spans are lifted out before any other rule runs so their contents stay
// verbatim.

use regex::Regex;

macro_rules! regex {
    ($re:literal) => {{
        static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| Regex::new($re).expect("hardcoded regex"))
    }};
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render one message's content to HTML.
pub fn render_markdown(text: &str) -> String {
    let mut text = escape_html(text);

    // Lift code spans out so later rules cannot touch their contents.
    let mut stash: Vec<String> = Vec::new();

    text = regex!(r"(?s)```([a-zA-Z]*)\n?(.*?)```")
        .replace_all(&text, |caps: &regex::Captures| {
            let lang = &caps[1];
            let code = caps[2].trim();
            stash.push(format!(
                "<pre class=\"code-block\" data-lang=\"{lang}\">{code}</pre>"
            ));
            placeholder(stash.len() - 1)
        })
        .into_owned();

    text = regex!(r"`([^`\n]+)`")
        .replace_all(&text, |caps: &regex::Captures| {
            stash.push(format!("<code class=\"inline-code\">{}</code>", &caps[1]));
            placeholder(stash.len() - 1)
        })
        .into_owned();

    // Bold before italic so `**` pairs are consumed first.
    text = regex!(r"\*\*([^*\n]+?)\*\*")
        .replace_all(&text, "<strong>$1</strong>")
        .into_owned();
    text = regex!(r"__([^_\n]+?)__")
        .replace_all(&text, "<strong>$1</strong>")
        .into_owned();
    text = regex!(r"\*([^*\n]+?)\*")
        .replace_all(&text, "<em>$1</em>")
        .into_owned();
    text = regex!(r"_([^_\n]+?)_")
        .replace_all(&text, "<em>$1</em>")
        .into_owned();
    text = regex!(r"~~([^~\n]+?)~~")
        .replace_all(&text, "<s>$1</s>")
        .into_owned();
    text = regex!(r"\|\|([^|\n]+?)\|\|")
        .replace_all(&text, "<span class=\"spoiler\">$1</span>")
        .into_owned();

    // Bare links, before emoji images introduce URLs in attributes.
    text = regex!(r#"(https?://[^\s<"]+)"#)
        .replace_all(
            &text,
            "<a href=\"$1\" target=\"_blank\" class=\"discord-link\">$1</a>",
        )
        .into_owned();

    // Mentions were escaped above, so they match on their entity forms.
    text = regex!(r"&lt;@!?\d+&gt;")
        .replace_all(&text, "<span class=\"mention\">@User</span>")
        .into_owned();
    text = regex!(r"&lt;#\d+&gt;")
        .replace_all(&text, "<span class=\"channel-mention\">#channel</span>")
        .into_owned();
    text = regex!(r"&lt;@&amp;\d+&gt;")
        .replace_all(&text, "<span class=\"role-mention\">@role</span>")
        .into_owned();

    // Custom emojis: <a:name:id> animated, <:name:id> static.
    text = regex!(r"&lt;(a?):(\w+):(\d+)&gt;")
        .replace_all(&text, |caps: &regex::Captures| {
            let ext = if caps[1].is_empty() { "png" } else { "gif" };
            format!(
                "<img class=\"emoji\" src=\"https://cdn.discordapp.com/emojis/{id}.{ext}\" \
                 alt=\":{name}:\" title=\":{name}:\" loading=\"lazy\">",
                id = &caps[3],
                name = &caps[2],
            )
        })
        .into_owned();

    // Headers and quote lines anchor on line starts.
    text = regex!(r"(?m)^### (.+)$")
        .replace_all(&text, "<h3 class=\"discord-header\">$1</h3>")
        .into_owned();
    text = regex!(r"(?m)^## (.+)$")
        .replace_all(&text, "<h2 class=\"discord-header\">$1</h2>")
        .into_owned();
    text = regex!(r"(?m)^# (.+)$")
        .replace_all(&text, "<h1 class=\"discord-header\">$1</h1>")
        .into_owned();
    text = regex!(r"(?m)^&gt; (.+)$")
        .replace_all(&text, "<div class=\"quote-line\">$1</div>")
        .into_owned();

    text = text.replace('\n', "<br>");

    // Restore code spans.
    for (i, html) in stash.iter().enumerate() {
        text = text.replace(&placeholder(i), html);
    }

    text
}

fn placeholder(index: usize) -> String {
    // Private-use characters cannot appear in Discord message content.
    format!("\u{f8f0}{index}\u{f8f1}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>&"'"#),
            "&lt;b&gt;&amp;&quot;&#39;"
        );
    }

    #[test]
    fn test_bold_italic_strike_spoiler() {
        assert_eq!(render_markdown("**hi**"), "<strong>hi</strong>");
        assert_eq!(render_markdown("__hi__"), "<strong>hi</strong>");
        assert_eq!(render_markdown("*hi*"), "<em>hi</em>");
        assert_eq!(render_markdown("_hi_"), "<em>hi</em>");
        assert_eq!(render_markdown("~~hi~~"), "<s>hi</s>");
        assert_eq!(
            render_markdown("||secret||"),
            "<span class=\"spoiler\">secret</span>"
        );
    }

    #[test]
    fn test_code_block_with_language() {
        let html = render_markdown("```rust\nlet x = 1;\n```");
        assert_eq!(
            html,
            "<pre class=\"code-block\" data-lang=\"rust\">let x = 1;</pre>"
        );
    }

    #[test]
    fn test_markdown_inside_code_is_untouched() {
        let html = render_markdown("`**not bold**`");
        assert_eq!(
            html,
            "<code class=\"inline-code\">**not bold**</code>"
        );
        assert!(!html.contains("<strong>"));
    }

    #[test]
    fn test_code_content_is_escaped() {
        let html = render_markdown("`<script>`");
        assert_eq!(
            html,
            "<code class=\"inline-code\">&lt;script&gt;</code>"
        );
    }

    #[test]
    fn test_mentions() {
        assert_eq!(
            render_markdown("<@123>"),
            "<span class=\"mention\">@User</span>"
        );
        assert_eq!(
            render_markdown("<@!123>"),
            "<span class=\"mention\">@User</span>"
        );
        assert_eq!(
            render_markdown("<#456>"),
            "<span class=\"channel-mention\">#channel</span>"
        );
        assert_eq!(
            render_markdown("<@&789>"),
            "<span class=\"role-mention\">@role</span>"
        );
    }

    #[test]
    fn test_custom_emojis() {
        let html = render_markdown("<:wave:111>");
        assert!(html.contains("https://cdn.discordapp.com/emojis/111.png"));
        assert!(html.contains(":wave:"));

        let html = render_markdown("<a:dance:222>");
        assert!(html.contains("https://cdn.discordapp.com/emojis/222.gif"));
    }

    #[test]
    fn test_headers_and_quotes() {
        assert_eq!(
            render_markdown("# Title"),
            "<h1 class=\"discord-header\">Title</h1>"
        );
        assert_eq!(
            render_markdown("### Small"),
            "<h3 class=\"discord-header\">Small</h3>"
        );
        assert_eq!(
            render_markdown("> quoted"),
            "<div class=\"quote-line\">quoted</div>"
        );
    }

    #[test]
    fn test_links_and_linebreaks() {
        let html = render_markdown("see https://example.com/x\nnext line");
        assert!(html.contains(
            "<a href=\"https://example.com/x\" target=\"_blank\" class=\"discord-link\">"
        ));
        assert!(html.contains("<br>next line"));
    }

    #[test]
    fn test_emoji_urls_are_not_double_linked() {
        let html = render_markdown("<:wave:111>");
        assert!(!html.contains("<a href"));
    }
}

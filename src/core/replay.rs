// Replay parsing and pacing for reopened tickets.
//
// The close flow archives a line-oriented replay log; reopening parses it
// back into author/content records and re-sends them through a webhook.
// The parser here is pure; the webhook calls live in the Discord layer.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// How many archived messages a reopen will replay at most.
pub const MAX_REPLAY_MESSAGES: usize = 30;

/// A parsed replay-log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayMessage {
    pub user_id: u64,
    pub username: String,
    pub display_name: String,
    pub content: String,
}

/// Parse one replay-log line of the form
/// `[timestamp] user_id|username|display_name: content`.
///
/// Summary lines, embed/attachment notices and anything malformed yield
/// `None` and are skipped.
pub fn parse_replay_line(line: &str) -> Option<ReplayMessage> {
    let line = line.trim();
    if line.is_empty() || !line.starts_with('[') || line.starts_with("=====") {
        return None;
    }

    let rest = &line[line.find("] ")? + 2..];
    let (user_info, content) = rest.split_once(": ")?;

    let mut parts = user_info.splitn(3, '|');
    let user_id: u64 = parts.next()?.parse().ok()?;
    let username = parts.next()?.to_string();
    let display_name = parts.next()?.to_string();

    let content = content.trim();
    if content.is_empty() {
        return None;
    }

    Some(ReplayMessage {
        user_id,
        username,
        display_name,
        content: content.to_string(),
    })
}

/// Parse a whole replay log, keeping only the most recent
/// [`MAX_REPLAY_MESSAGES`] entries.
pub fn parse_replay_log(log: &str) -> Vec<ReplayMessage> {
    let messages: Vec<ReplayMessage> = log.lines().filter_map(parse_replay_line).collect();
    let skip = messages.len().saturating_sub(MAX_REPLAY_MESSAGES);
    messages.into_iter().skip(skip).collect()
}

/// Sliding-window rate limiter for webhook sends: at most `max_requests`
/// per `window`.
pub struct ReplayLimiter {
    max_requests: usize,
    window: Duration,
    requests: VecDeque<Instant>,
}

impl Default for ReplayLimiter {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

impl ReplayLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: VecDeque::new(),
        }
    }

    /// Sleep until another request fits the window, then record it.
    pub async fn wait_if_needed(&mut self) {
        let now = Instant::now();
        while let Some(front) = self.requests.front() {
            if now.duration_since(*front) >= self.window {
                self.requests.pop_front();
            } else {
                break;
            }
        }

        if self.requests.len() >= self.max_requests {
            let oldest = *self.requests.front().expect("nonempty at capacity");
            let wait = self.window.saturating_sub(now.duration_since(oldest));
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
            self.requests.pop_front();
        }

        self.requests.push_back(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_line() {
        let msg = parse_replay_line(
            "[2024-06-01 12:00:00 UTC] 123|alice|Alice W.: hello there",
        )
        .unwrap();
        assert_eq!(msg.user_id, 123);
        assert_eq!(msg.username, "alice");
        assert_eq!(msg.display_name, "Alice W.");
        assert_eq!(msg.content, "hello there");
    }

    #[test]
    fn test_content_may_contain_colons() {
        let msg = parse_replay_line("[ts] 1|a|A: note: check the logs").unwrap();
        assert_eq!(msg.content, "note: check the logs");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        assert!(parse_replay_line("").is_none());
        assert!(parse_replay_line("===== summary =====").is_none());
        assert!(parse_replay_line("no brackets here").is_none());
        assert!(parse_replay_line("[ts] missing-pipes: hi").is_none());
        assert!(parse_replay_line("[ts] notanid|a|A: hi").is_none());
        assert!(parse_replay_line("[ts] 1|a|A:    ").is_none());
    }

    #[test]
    fn test_parse_log_keeps_most_recent_messages() {
        let log: String = (0..40)
            .map(|i| format!("[ts] 1|a|A: message {i}\n"))
            .collect();

        let messages = parse_replay_log(&log);
        assert_eq!(messages.len(), MAX_REPLAY_MESSAGES);
        assert_eq!(messages[0].content, "message 10");
        assert_eq!(messages.last().unwrap().content, "message 39");
    }

    #[tokio::test(start_paused = true)]
    async fn test_limiter_delays_after_burst() {
        let mut limiter = ReplayLimiter::new(3, Duration::from_secs(2));

        let start = Instant::now();
        for _ in 0..3 {
            limiter.wait_if_needed().await;
        }
        // Burst fits the window without sleeping
        assert_eq!(start.elapsed(), Duration::ZERO);

        // The fourth request has to wait for the window to slide
        limiter.wait_if_needed().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}

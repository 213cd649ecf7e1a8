// Email rendering for alert events: subject, plain text and HTML bodies.

use super::traits::EmailMessage;
use crate::output::truncate_chars;
use crate::trends::{AlertEvent, AlertKind};

/// Prefix on every subject line so mail filters can route alerts.
pub const SUBJECT_PREFIX: &str = "[X Monitor]";

/// Render one alert event as an email to `to`.
pub fn render_alert(event: &AlertEvent, to: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: subject(event),
        text_body: text_body(event),
        html_body: html_body(event),
    }
}

pub fn subject(event: &AlertEvent) -> String {
    let headline = match event.kind {
        AlertKind::RapidGrowth => format!("{}/hour", format_rate(event.metric)),
        AlertKind::AbsoluteThreshold => {
            format!("{} engagements", format_count(event.current_total))
        }
    };
    format!(
        "{SUBJECT_PREFIX} {}: @{} ({headline})",
        event.kind.label(),
        event.post.author
    )
}

pub fn text_body(event: &AlertEvent) -> String {
    let post = &event.post;
    let mut body = String::new();

    body.push_str(&format!("{} alert for @{}\n", event.kind.label(), post.author));
    body.push_str(&"=".repeat(40));
    body.push_str("\n\n");
    body.push_str(&truncate_chars(&post.text, 280));
    body.push_str("\n\n");
    body.push_str(&format!(
        "Likes: {}  Reposts: {}  Replies: {}  Quotes: {}\n",
        format_count(post.likes.max(0) as u64),
        format_count(post.reposts.max(0) as u64),
        format_count(post.replies.max(0) as u64),
        format_count(post.quotes.max(0) as u64),
    ));
    body.push_str(&format!(
        "Total engagement: {}\n",
        format_count(event.current_total)
    ));
    if let Some(rate) = event.growth_rate() {
        let since = event
            .previous_total
            .map(|p| format!(" (up from {})", format_count(p)))
            .unwrap_or_default();
        body.push_str(&format!("Growth rate: {}/hour{since}\n", format_rate(rate)));
    }
    if let Some(keyword) = &post.matched_keyword {
        body.push_str(&format!("Matched keyword: {keyword}\n"));
    }
    body.push_str(&format!("Link: {}\n", post.url));
    body.push_str(&format!(
        "\nDetected at {}\n",
        event.detected_at.format("%Y-%m-%d %H:%M UTC")
    ));

    body
}

pub fn html_body(event: &AlertEvent) -> String {
    let post = &event.post;
    let accent = match event.kind {
        AlertKind::RapidGrowth => "#f59e0b",
        AlertKind::AbsoluteThreshold => "#10b981",
    };

    let mut metrics = format!(
        "<span>Likes: {}</span> &middot; <span>Reposts: {}</span> &middot; \
         <span>Replies: {}</span> &middot; <span>Quotes: {}</span> &middot; \
         <strong>Total: {}</strong>",
        format_count(post.likes.max(0) as u64),
        format_count(post.reposts.max(0) as u64),
        format_count(post.replies.max(0) as u64),
        format_count(post.quotes.max(0) as u64),
        format_count(event.current_total),
    );
    if let Some(rate) = event.growth_rate() {
        metrics.push_str(&format!(
            " &middot; <strong>Growth: {}/hour</strong>",
            format_rate(rate)
        ));
    }

    let keyword = post
        .matched_keyword
        .as_deref()
        .map(|k| format!(" | Matched: &quot;{}&quot;", escape_html(k)))
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html>\n\
         <html><body style=\"font-family: -apple-system, 'Segoe UI', Roboto, sans-serif;\">\n\
         <h2>X Trending Alert</h2>\n\
         <div style=\"border: 1px solid #ddd; border-left: 4px solid {accent}; border-radius: 8px; padding: 16px;\">\n\
         <div style=\"font-size: 12px; color: #666; text-transform: uppercase;\">{label}</div>\n\
         <p style=\"font-size: 16px;\">{text}</p>\n\
         <p style=\"color: #666;\">{metrics}</p>\n\
         <p><a href=\"{url}\" style=\"color: #1d9bf0;\">View @{author} on X</a>{keyword}</p>\n\
         </div>\n\
         <p style=\"color: #666; font-size: 12px;\">Sent by trendwatch at {detected}</p>\n\
         </body></html>\n",
        label = event.kind.label(),
        text = escape_html(&truncate_chars(&post.text, 280)),
        url = escape_html(&post.url),
        author = escape_html(&post.author),
        detected = event.detected_at.format("%Y-%m-%d %H:%M UTC"),
    )
}

/// Format an integer with thousands separators: 1234567 → "1,234,567".
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Round a rate to a whole number and format it like a count.
pub fn format_rate(rate: f64) -> String {
    if !rate.is_finite() || rate <= 0.0 {
        return "0".to_string();
    }
    format_count(rate.round() as u64)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count_separators() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_format_rate_rounds() {
        assert_eq!(format_rate(2499.6), "2,500");
        assert_eq!(format_rate(-3.0), "0");
        assert_eq!(format_rate(f64::NAN), "0");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"AI\" & 'ML'</b>"),
            "&lt;b&gt;&quot;AI&quot; &amp; &#39;ML&#39;&lt;/b&gt;"
        );
    }
}

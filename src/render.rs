use chrono::{ DateTime, Local, Utc };
use crate::models::chat::{ Message, MessageKind };

pub const THINKING: &str = "Assistant is thinking...";

pub fn format_time(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

pub fn label(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::User => "You",
        MessageKind::Assistant => "Assistant",
        MessageKind::Error => "Error",
    }
}

pub fn render_message(message: &Message) -> String {
    let mut out = format!("[{}] {}\n", format_time(message.timestamp()), label(message.kind()));
    for line in message.content().lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
    if let Some(model) = message.model() {
        out.push_str(&format!("  Model: {}\n", model));
    }
    out
}

pub fn banner(title: &str, subtitle: &str) -> String {
    let width = title.chars().count().max(subtitle.chars().count());
    let rule = "=".repeat(width);
    format!("{}\n{}\n{}\n{}\n", rule, title, subtitle, rule)
}

pub fn welcome(endpoint: &str) -> String {
    format!(
        "Start a conversation by typing a message below.\n\
         Enter sends, a trailing '\\' continues on the next line, /quit exits.\n\
         Connected to {}\n",
        endpoint
    )
}

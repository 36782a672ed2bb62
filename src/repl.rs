use crate::render::{ banner, render_message, welcome, THINKING };
use crate::session::{ ConversationSession, SessionEvent, SubmitOutcome };
use log::{ debug, error, warn };
use std::borrow::Cow;
use std::io;
use std::sync::Arc;
use tokio::io::{ AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt };
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

const QUIT: &str = "/quit";
const STILL_WAITING: &str = "Still waiting for the previous answer, message not sent.";

#[derive(Debug, PartialEq, Eq)]
enum LineInput {
    Continue,
    Submit(String),
    Quit,
}

/// Feeds one input line into `buffer`. A trailing backslash keeps the message
/// open so multi-line prompts can be typed.
fn push_line(buffer: &mut String, line: &str) -> LineInput {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if buffer.is_empty() && line.trim() == QUIT {
        return LineInput::Quit;
    }
    if let Some(head) = line.strip_suffix('\\') {
        buffer.push_str(head);
        buffer.push('\n');
        return LineInput::Continue;
    }
    buffer.push_str(line);
    LineInput::Submit(std::mem::take(buffer))
}

async fn write_event<W>(out: &mut W, event: SessionEvent) -> io::Result<()>
    where W: AsyncWrite + Unpin
{
    match event {
        SessionEvent::MessageAppended(message) => {
            out.write_all(render_message(&message).as_bytes()).await?;
        }
        SessionEvent::InFlightChanged(true) => {
            out.write_all(format!("  {}\n", THINKING).as_bytes()).await?;
        }
        SessionEvent::InFlightChanged(false) => {}
    }
    out.flush().await
}

async fn drain<W>(out: &mut W, events: &mut UnboundedReceiver<SessionEvent>) -> io::Result<()>
    where W: AsyncWrite + Unpin
{
    while let Ok(event) = events.try_recv() {
        write_event(out, event).await?;
    }
    Ok(())
}

/// Decodes one raw input line. Invalid UTF-8 is replaced rather than
/// rejected so a stray byte cannot end the conversation.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let text = String::from_utf8_lossy(raw);
    if matches!(text, Cow::Owned(_)) {
        warn!("Input line was not valid UTF-8, invalid bytes replaced");
    }
    text.into_owned()
}

async fn dispatch<W>(
    session: &Arc<ConversationSession>,
    pending: &mut Option<JoinHandle<SubmitOutcome>>,
    text: String,
    out: &mut W
) -> io::Result<()>
    where W: AsyncWrite + Unpin
{
    if text.trim().is_empty() {
        return Ok(());
    }
    if pending.as_ref().is_some_and(|h| !h.is_finished()) {
        out.write_all(format!("  {}\n", STILL_WAITING).as_bytes()).await?;
        return out.flush().await;
    }
    let session = session.clone();
    *pending = Some(tokio::spawn(async move { session.submit(&text).await }));
    Ok(())
}

pub async fn run_interactive<R, W>(
    session: Arc<ConversationSession>,
    mut input: R,
    mut out: W,
    title: &str,
    subtitle: &str
) -> io::Result<()>
    where R: AsyncBufRead + Unpin, W: AsyncWrite + Unpin
{
    let mut events = session.subscribe();
    let mut raw = Vec::new();
    let mut buffer = String::new();
    let mut pending: Option<JoinHandle<SubmitOutcome>> = None;
    let mut input_open = true;

    out.write_all(banner(title, subtitle).as_bytes()).await?;
    if session.is_empty() {
        out.write_all(welcome(session.endpoint()).as_bytes()).await?;
    }
    out.flush().await?;

    loop {
        if !input_open {
            if let Some(handle) = pending.take() {
                if let Err(e) = handle.await {
                    error!("Submission task failed: {}", e);
                }
            }
            drain(&mut out, &mut events).await?;
            break;
        }

        tokio::select! {
            // `raw` outlives the branch, so bytes read before a cancelled
            // poll are kept for the next one.
            read = input.read_until(b'\n', &mut raw) => {
                let at_eof = match read {
                    Ok(n) => n == 0 || !raw.ends_with(b"\n"),
                    Err(e) => {
                        error!("Failed to read input, closing: {}", e);
                        true
                    }
                };
                if !raw.is_empty() {
                    let line = decode_line(&raw);
                    raw.clear();
                    match push_line(&mut buffer, &line) {
                        LineInput::Continue => {}
                        LineInput::Quit => {
                            debug!("Quit requested");
                            input_open = false;
                            continue;
                        }
                        LineInput::Submit(text) => {
                            dispatch(&session, &mut pending, text, &mut out).await?;
                        }
                    }
                }
                if at_eof {
                    let leftover = std::mem::take(&mut buffer);
                    let leftover = leftover.strip_suffix('\n').unwrap_or(&leftover).to_string();
                    dispatch(&session, &mut pending, leftover, &mut out).await?;
                    input_open = false;
                }
            }
            Some(event) = events.recv() => {
                write_event(&mut out, event).await?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::chat::{ ChatClient, ClientError };
    use crate::models::chat::GenerateResponse;
    use crate::models::chat::MessageKind;
    use async_trait::async_trait;
    use std::time::Duration;

    struct FixedClient(Result<(), u16>);

    #[async_trait]
    impl ChatClient for FixedClient {
        async fn generate(&self, prompt: &str) -> Result<GenerateResponse, ClientError> {
            match self.0 {
                Ok(()) =>
                    Ok(GenerateResponse {
                        response: format!("echo: {}", prompt),
                        model_used: Some("demo-model".into()),
                    }),
                Err(code) => Err(ClientError::Status(code)),
            }
        }

        fn endpoint(&self) -> &str {
            "http://127.0.0.1:8000/api/generate/"
        }
    }

    struct SlowClient;

    #[async_trait]
    impl ChatClient for SlowClient {
        async fn generate(&self, prompt: &str) -> Result<GenerateResponse, ClientError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(GenerateResponse {
                response: format!("slow: {}", prompt),
                model_used: None,
            })
        }

        fn endpoint(&self) -> &str {
            "http://127.0.0.1:8000/api/generate/"
        }
    }

    async fn transcript(
        client: impl ChatClient + 'static,
        input: &[u8]
    ) -> (String, Arc<ConversationSession>) {
        let session = Arc::new(ConversationSession::new(Arc::new(client)));
        let mut out = Vec::new();
        run_interactive(session.clone(), input, &mut out, "Title", "Sub").await.unwrap();
        (String::from_utf8(out).unwrap(), session)
    }

    #[test]
    fn trailing_backslash_continues_the_message() {
        let mut buffer = String::new();
        assert_eq!(push_line(&mut buffer, "first\\"), LineInput::Continue);
        assert_eq!(push_line(&mut buffer, "second\r"), LineInput::Submit("first\nsecond".into()));
        assert!(buffer.is_empty());
    }

    #[test]
    fn quit_only_counts_at_message_start() {
        let mut buffer = String::new();
        assert_eq!(push_line(&mut buffer, " /quit "), LineInput::Quit);
        push_line(&mut buffer, "note\\");
        assert_eq!(push_line(&mut buffer, "/quit"), LineInput::Submit("note\n/quit".into()));
    }

    #[tokio::test]
    async fn prints_banner_welcome_and_exchange() {
        let (text, session) = transcript(FixedClient(Ok(())), b"hello\n").await;

        assert!(text.starts_with("=====\nTitle\nSub\n=====\n"));
        assert!(text.contains("Start a conversation"));
        assert!(text.contains("  hello\n"));
        assert!(text.contains(THINKING));
        assert!(text.contains("  echo: hello\n"));
        assert!(text.contains("  Model: demo-model\n"));
        assert_eq!(session.len(), 2);
        assert!(!session.is_in_flight());
    }

    #[tokio::test]
    async fn failure_is_rendered_as_error_message() {
        let (text, session) = transcript(FixedClient(Err(502)), b"hello\n").await;

        assert!(text.contains("] Error\n"));
        assert!(text.contains("HTTP error: 502"));
        assert_eq!(session.len(), 2);
    }

    #[tokio::test]
    async fn blank_lines_and_quit_send_nothing() {
        let (_, session) = transcript(FixedClient(Ok(())), b"\n   \n/quit\nhello\n").await;

        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_replaced_and_the_loop_keeps_going() {
        let (text, session) = transcript(FixedClient(Ok(())), b"caf\xe9\nhello\n").await;

        let messages = session.messages();
        assert_eq!(messages[0].kind(), MessageKind::User);
        assert_eq!(messages[0].content(), "caf\u{FFFD}");
        assert_eq!(messages.last().unwrap().kind(), MessageKind::Assistant);
        assert!(text.contains("echo: caf\u{FFFD}"));
        assert!(!session.is_in_flight());
    }

    #[tokio::test]
    async fn input_while_waiting_prints_notice_and_is_dropped() {
        let (text, session) = transcript(SlowClient, b"one\ntwo\n").await;

        assert!(text.contains(STILL_WAITING));
        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content(), "one");
        assert_eq!(messages[1].content(), "slow: one");
        assert!(!text.contains("  two\n"));
    }

    #[tokio::test]
    async fn continued_message_is_sent_when_input_ends() {
        let (_, session) = transcript(FixedClient(Ok(())), b"first\\\nsecond\\\n").await;

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content(), "first\nsecond");
    }

    #[tokio::test]
    async fn last_line_without_newline_is_sent() {
        let (_, session) = transcript(FixedClient(Ok(())), b"hello").await;

        assert_eq!(session.messages()[0].content(), "hello");
        assert_eq!(session.len(), 2);
    }
}

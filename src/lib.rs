pub mod models;
pub mod llm;
pub mod cli;
pub mod session;
pub mod render;
pub mod repl;

use cli::Args;
use llm::EndpointConfig;
use llm::chat::new_client;
use log::info;
use render::render_message;
use session::{ ConversationSession, IgnoreReason, SubmitOutcome };
use std::error::Error;
use std::sync::Arc;
use tokio::io::{ AsyncWrite, AsyncWriteExt, BufReader };

/// Submits `prompt` once and writes the resulting messages to `out`.
pub async fn run_once<W>(
    session: &ConversationSession,
    prompt: &str,
    out: &mut W
) -> Result<SubmitOutcome, Box<dyn Error + Send + Sync>>
    where W: AsyncWrite + Unpin
{
    let outcome = session.submit(prompt).await;
    if let SubmitOutcome::Ignored(reason) = &outcome {
        return Err(
            match reason {
                IgnoreReason::Blank => "Prompt is empty, nothing to send".into(),
                IgnoreReason::InFlight => "A request is already in flight".into(),
            }
        );
    }
    for message in session.messages() {
        out.write_all(render_message(&message).as_bytes()).await?;
    }
    out.flush().await?;
    Ok(outcome)
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Endpoint: {}", args.endpoint);
    info!("Mode: {}", if args.prompt.is_some() { "one-shot" } else { "interactive" });
    info!("-------------------------");

    let endpoint = EndpointConfig::parse(&args.endpoint)?;
    let session = Arc::new(ConversationSession::new(new_client(&endpoint)));
    let mut stdout = tokio::io::stdout();

    match args.prompt.as_deref() {
        Some(prompt) => {
            let outcome = run_once(&session, prompt, &mut stdout).await?;
            if outcome.is_failure() {
                return Err("The endpoint did not return an answer".into());
            }
        }
        None => {
            let stdin = BufReader::new(tokio::io::stdin());
            repl::run_interactive(session, stdin, stdout, &args.title, &args.subtitle).await?;
        }
    }

    Ok(())
}

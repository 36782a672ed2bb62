use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Endpoint Args ---
    /// URL of the generation endpoint that receives `{"prompt": ...}` POSTs
    #[arg(long, env = "CHAT_ENDPOINT", default_value = crate::llm::DEFAULT_ENDPOINT)]
    pub endpoint: String,

    // --- Mode Args ---
    /// Send a single prompt, print the exchange and exit instead of starting the interactive loop
    #[arg(short = 'p', long)]
    pub prompt: Option<String>,

    // --- Display Args ---
    /// Title shown in the banner of the interactive loop
    #[arg(long, env = "CHAT_TITLE", default_value = "GEN_Env-Climate AI")]
    pub title: String,

    /// Subtitle shown under the title
    #[arg(long, env = "CHAT_SUBTITLE", default_value = "Chat with your custom AI model")]
    pub subtitle: String,

    // --- General App Args ---
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}

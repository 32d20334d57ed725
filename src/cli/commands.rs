use clap::{Parser, Subcommand};

/// `herald` - scheduled publishing and engagement agent.
#[derive(Parser, Debug)]
#[command(name = "herald")]
#[command(version)]
#[command(
    about = "Publishes, engages, and reflects on a fixed heartbeat.",
    long_about = None
)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run heartbeats continuously until Ctrl-C
    Run,

    /// Run a single heartbeat and exit
    Once,

    /// Print accumulated state and recent activity
    Stats,

    /// Register or update a platform in platforms.json
    Init {
        /// Channel name, e.g. moltbook
        #[arg(long)]
        platform: String,

        /// API base URL, e.g. https://www.moltbook.com/api/v1
        #[arg(long)]
        base_url: String,

        /// API key (prompted for when omitted)
        #[arg(long)]
        api_key: Option<String>,

        /// The agent's account name, used to skip its own posts
        #[arg(long)]
        username: Option<String>,
    },
}

use clap::{Parser, Subcommand};

/// secretdrop: one-time secret exchange
#[derive(Parser)]
#[command(name = "secretdrop", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind (overrides SECRETS_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Work on the secrets file directly, without the server
    Secret {
        #[command(subcommand)]
        command: SecretCommands,
    },
}

#[derive(Subcommand)]
pub enum SecretCommands {
    /// Save a secret and print its id
    Save { plain_text: String },
    /// Print a secret and delete it
    Consume { id: String },
}

use clap::{Parser, Subcommand};

/// OpenMusic: playlist and authentication REST backend
#[derive(Parser)]
#[command(name = "openmusic", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind (overrides OPENMUSIC_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Apply pending database migrations and exit
    Migrate,

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a new user
    Add {
        #[arg(long)]
        username: String,
        #[arg(long, env = "OPENMUSIC_USER_PASSWORD")]
        password: String,
        #[arg(long)]
        fullname: String,
    },
}

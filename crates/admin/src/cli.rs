//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "musicly-admin", version, about = "Administer the Musicly audio catalog")]
pub struct Cli {
    /// Override `API_BASE_URL`.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Override `SESSION_FILE`.
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "MUSICLY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Set a new password using the token from a reset link.
    ResetPassword {
        #[arg(long)]
        token: String,
        #[arg(long, env = "MUSICLY_NEW_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, env = "MUSICLY_CONFIRM_PASSWORD", hide_env_values = true)]
        confirm: String,
    },
    Categories {
        #[command(subcommand)]
        action: CategoryCommand,
    },
    Albums {
        #[command(subcommand)]
        action: AlbumCommand,
    },
    /// Audio tracks (podcasts).
    Audios {
        #[command(subcommand)]
        action: AudioCommand,
    },
}

/// Operations every collection supports.
#[derive(Debug, Subcommand)]
pub enum CommonCommand {
    List(ListArgs),
    Delete {
        id: String,
    },
    /// Replace the thumbnail. Without `--file` nothing is sent.
    Thumbnail {
        id: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Search term matched against titles and slugs.
    #[arg(long, default_value = "")]
    pub search: String,
    /// Page offset; requires `PAGE_SIZE`.
    #[arg(long)]
    pub offset: Option<u32>,
}

#[derive(Debug, Args)]
pub struct DraftText {
    #[arg(long)]
    pub title_en: String,
    #[arg(long)]
    pub title_ar: String,
    #[arg(long)]
    pub description_en: String,
    #[arg(long)]
    pub description_ar: String,
    #[arg(long)]
    pub slug: String,
}

/// Title and description are replaced as a pair of both languages.
#[derive(Debug, Args)]
pub struct PatchText {
    #[arg(long, requires = "title_ar")]
    pub title_en: Option<String>,
    #[arg(long, requires = "title_en")]
    pub title_ar: Option<String>,
    #[arg(long, requires = "description_ar")]
    pub description_en: Option<String>,
    #[arg(long, requires = "description_en")]
    pub description_ar: Option<String>,
    #[arg(long)]
    pub slug: Option<String>,
}

#[derive(Debug, Args)]
pub struct AudioFlags {
    #[arg(long)]
    pub free: bool,
    #[arg(long)]
    pub published: bool,
    /// Media file to upload.
    #[arg(long)]
    pub audio: Option<PathBuf>,
    #[arg(long)]
    pub thumbnail: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum CategoryCommand {
    #[command(flatten)]
    Common(CommonCommand),
    Create {
        #[command(flatten)]
        text: DraftText,
        #[arg(long)]
        thumbnail: Option<PathBuf>,
    },
    Update {
        id: String,
        #[command(flatten)]
        text: PatchText,
    },
}

#[derive(Debug, Subcommand)]
pub enum AlbumCommand {
    #[command(flatten)]
    Common(CommonCommand),
    Create {
        #[command(flatten)]
        text: DraftText,
        /// Category id or slug.
        #[arg(long)]
        category: String,
        #[arg(long)]
        thumbnail: Option<PathBuf>,
    },
    Update {
        id: String,
        #[command(flatten)]
        text: PatchText,
        /// Category id or slug.
        #[arg(long)]
        category: Option<String>,
    },
    /// Show one album with its tracks.
    Show {
        slug: String,
    },
    /// Attach an existing audio to the album.
    AddAudio {
        slug: String,
        audio_id: String,
    },
    RemoveAudio {
        slug: String,
        audio_id: String,
    },
    /// Create a new audio directly under the album.
    CreateAudio {
        /// Album slug.
        album: String,
        #[command(flatten)]
        text: DraftText,
        #[command(flatten)]
        flags: AudioFlags,
    },
}

#[derive(Debug, Subcommand)]
pub enum AudioCommand {
    #[command(flatten)]
    Common(CommonCommand),
    Create {
        #[command(flatten)]
        text: DraftText,
        #[command(flatten)]
        flags: AudioFlags,
    },
    Update {
        id: String,
        #[command(flatten)]
        text: PatchText,
        #[arg(long)]
        free: Option<bool>,
        #[arg(long)]
        published: Option<bool>,
    },
    /// Print the stream URL of a track.
    Play {
        id: String,
    },
}

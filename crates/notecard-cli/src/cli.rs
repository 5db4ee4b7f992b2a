use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use notecard_core::format::Locale;

#[derive(Parser)]
#[command(name = "notecard")]
#[command(about = "Notes, semantic search and flashcards from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CLI profile name (API endpoint and stored session)
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Language for dates and relative times
    #[arg(long, global = true, value_name = "LOCALE", default_value = "zh-TW")]
    pub locale: Locale,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Sign in, inspect or end the session of a profile
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Check that the API is reachable
    Health,
    /// Manage notes
    Notes {
        #[command(subcommand)]
        command: NotesCommands,
    },
    /// Browse user profiles
    Users {
        #[command(subcommand)]
        command: UsersCommands,
    },
    /// Manage your own profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Generate flashcards (streamed as they are produced)
    Flashcards {
        #[command(subcommand)]
        command: FlashcardCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Notecard API base URL
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Page the OAuth flow should return to
        #[arg(long, value_name = "URL")]
        frontend_url: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Print the resolved profile configuration
    Show,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Start Google sign-in and print the URL to open
    Login {
        /// Where the OAuth flow should redirect (defaults to the profile frontend URL)
        #[arg(long, value_name = "URL")]
        redirect_url: Option<String>,
    },
    /// Store the tokens returned by the OAuth redirect
    Token {
        /// Access token (JWT)
        #[arg(long, value_name = "TOKEN")]
        access_token: String,
        /// Refresh token
        #[arg(long, value_name = "TOKEN")]
        refresh_token: Option<String>,
    },
    /// Show auth status for profile
    Status,
    /// Logout profile and clear stored tokens
    Logout,
}

#[derive(Subcommand)]
pub enum NotesCommands {
    /// List your notes
    List {
        #[command(flatten)]
        page: PageArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List notes other users made public
    Public {
        #[command(flatten)]
        page: PageArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single note
    Get {
        /// Note ID
        id: String,
        /// Render content as sanitized HTML
        #[arg(long)]
        html: bool,
        /// Output as JSON
        #[arg(long, conflicts_with = "html")]
        json: bool,
    },
    /// Create a note (content from arguments, stdin or $EDITOR)
    #[command(alias = "new")]
    Create {
        /// Note title
        #[arg(short, long)]
        title: String,
        /// Tags (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
        /// Make the note visible on the public listing
        #[arg(long)]
        public: bool,
        /// Note content
        content: Vec<String>,
    },
    /// Update a note; only the given fields change
    Update {
        /// Note ID
        id: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New content
        #[arg(short, long)]
        content: Option<String>,
        /// Replace tags (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Option<Vec<String>>,
        /// Change visibility
        #[arg(long, value_name = "BOOL")]
        public: Option<bool>,
        /// Open the current content in $EDITOR
        #[arg(long, conflicts_with = "content")]
        edit: bool,
    },
    /// Delete a note
    Delete {
        /// Note ID
        id: String,
    },
    /// Semantic search over your notes
    Search {
        /// Search query
        query: String,
        /// Minimum similarity (0..1)
        #[arg(long, default_value_t = notecard_core::api::DEFAULT_SEARCH_THRESHOLD)]
        threshold: f64,
        /// Maximum number of hits
        #[arg(short, long, default_value_t = notecard_core::api::DEFAULT_SEARCH_LIMIT)]
        limit: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum UsersCommands {
    /// List user profiles
    List {
        #[command(flatten)]
        page: PageArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a profile by username
    Show {
        username: String,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show your profile
    Show,
    /// Create your profile
    Create {
        #[command(flatten)]
        fields: ProfileArgs,
    },
    /// Update your profile
    Update {
        #[command(flatten)]
        fields: ProfileArgs,
    },
    /// Delete your profile
    Delete,
}

#[derive(Subcommand)]
pub enum FlashcardCommands {
    /// Generate flashcards about a topic
    Query {
        /// Topic or question
        query: Vec<String>,
        /// Print raw stream payloads as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Generate flashcards from existing notes
    Notes {
        /// Note IDs
        #[arg(required = true)]
        ids: Vec<String>,
        /// Print raw stream payloads as JSON lines
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Number of items to fetch
    #[arg(short, long, default_value_t = notecard_core::api::DEFAULT_PAGE_LIMIT)]
    pub limit: u32,
    /// Number of items to skip
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ProfileArgs {
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub display_name: Option<String>,
    #[arg(long, value_name = "URL")]
    pub avatar_url: Option<String>,
    /// Preferences as a JSON object
    #[arg(long, value_name = "JSON")]
    pub preferences: Option<String>,
}

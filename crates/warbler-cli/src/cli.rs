use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use warbler_types::{AccountId, PostId};

#[derive(Parser)]
#[command(
    name = "warbler",
    about = "Warbler: accounts, posts, follows, and likes",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Store location: `memory:`, `file:<path>`, or a bare path
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Act as this account (requires --password)
    #[arg(long = "as", global = true, value_name = "HANDLE")]
    pub login: Option<String>,

    /// Secret for --as, signup, and edit-profile
    #[arg(long, global = true, env = "WARBLER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an account and log in as it
    Signup(SignupArgs),
    /// Check credentials given with --as and --password
    Login,
    /// Publish a post
    Post(PostArgs),
    /// Show a post
    ShowPost(PostRef),
    /// Delete one of your posts
    DeletePost(PostRef),
    /// Follow an account
    Follow(AccountRef),
    /// Stop following an account
    Unfollow(AccountRef),
    /// Like a post
    Like(PostRef),
    /// Remove a like
    Unlike(PostRef),
    /// Like a post, or remove the like if already liked
    ToggleLike(PostRef),
    /// Your posts and posts of accounts you follow
    Timeline,
    /// Accounts an account follows
    Following(AccountRef),
    /// Accounts following an account
    Followers(AccountRef),
    /// Posts an account has liked
    Likes(AccountRef),
    /// List accounts, optionally filtered by handle
    Users(UsersArgs),
    /// Show an account and its posts
    ShowUser(AccountRef),
    /// Edit your profile (re-checks --password)
    EditProfile(EditProfileArgs),
    /// Row counts per table
    Stats,
}

#[derive(Args)]
pub struct SignupArgs {
    pub handle: String,
    pub contact: String,
    #[arg(long)]
    pub image_url: Option<String>,
}

#[derive(Args)]
pub struct PostArgs {
    pub body: String,
}

#[derive(Args)]
pub struct PostRef {
    pub id: PostId,
}

#[derive(Args)]
pub struct AccountRef {
    pub id: AccountId,
}

#[derive(Args)]
pub struct UsersArgs {
    /// Substring of the handle
    #[arg(short, long)]
    pub q: Option<String>,
}

#[derive(Args)]
pub struct EditProfileArgs {
    #[arg(long)]
    pub handle: Option<String>,
    #[arg(long)]
    pub contact: Option<String>,
    /// Empty resets to the default image
    #[arg(long)]
    pub image_url: Option<String>,
    /// Empty resets to the default header
    #[arg(long)]
    pub header_image_url: Option<String>,
    #[arg(long)]
    pub bio: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
}

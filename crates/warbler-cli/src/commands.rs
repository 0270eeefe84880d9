use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use tracing::debug;
use warbler_guard::{Guard, Session};
use warbler_store::InMemoryStore;
use warbler_types::{Account, AccountId, Post, ProfileUpdate};

use crate::cli::*;
use crate::config::WarblerConfig;

struct Ctx {
    guard: Guard<InMemoryStore>,
    session: Session,
    format: OutputFormat,
    password: Option<String>,
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = WarblerConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }
    let store = InMemoryStore::open(&config.database_url)
        .with_context(|| format!("opening store at {}", config.database_url))?;
    debug!(database_url = %config.database_url, timeline_limit = config.timeline_limit, "store opened");
    let guard = Guard::new(Arc::new(store), config.guard_config());

    let mut session = Session::anonymous();
    if let Some(handle) = &cli.login {
        let password = cli
            .password
            .as_deref()
            .context("--as requires --password")?;
        guard.login(&mut session, handle, password)?;
    }

    let mut ctx = Ctx {
        guard,
        session,
        format: cli.format,
        password: cli.password,
    };

    match cli.command {
        Command::Signup(args) => cmd_signup(&mut ctx, args),
        Command::Login => cmd_login(&ctx),
        Command::Post(args) => cmd_post(&ctx, args),
        Command::ShowPost(args) => {
            let post = ctx.guard.show_post(&ctx.session, args.id)?;
            emit_posts(&ctx, &[post])
        }
        Command::DeletePost(args) => {
            let post = ctx.guard.delete_post(&ctx.session, args.id)?;
            emit(&ctx, &post, || println!("{} Deleted post {}", "✓".green(), post.id.to_string().yellow()))
        }
        Command::Follow(args) => {
            let added = ctx.guard.follow(&ctx.session, args.id)?;
            report_edge(&ctx, added, format!("Following {}", args.id), format!("Already following {}", args.id))
        }
        Command::Unfollow(args) => {
            let removed = ctx.guard.unfollow(&ctx.session, args.id)?;
            report_edge(&ctx, removed, format!("Unfollowed {}", args.id), format!("Not following {}", args.id))
        }
        Command::Like(args) => {
            let added = ctx.guard.like(&ctx.session, args.id)?;
            report_edge(&ctx, added, format!("Liked post {}", args.id), format!("Already liked post {}", args.id))
        }
        Command::Unlike(args) => {
            let removed = ctx.guard.unlike(&ctx.session, args.id)?;
            report_edge(&ctx, removed, format!("Removed like on post {}", args.id), format!("Post {} was not liked", args.id))
        }
        Command::ToggleLike(args) => {
            let liked = ctx.guard.toggle_like(&ctx.session, args.id)?;
            let message = if liked { "Liked post" } else { "Removed like on post" };
            emit(&ctx, &liked, || println!("{} {} {}", "✓".green(), message, args.id.to_string().yellow()))
        }
        Command::Timeline => {
            let posts = ctx.guard.home_timeline(&ctx.session)?;
            emit_posts(&ctx, &posts)
        }
        Command::Following(args) => {
            let accounts = ctx.guard.following_of(&ctx.session, args.id)?;
            emit_accounts(&ctx, &accounts)
        }
        Command::Followers(args) => {
            let accounts = ctx.guard.followers_of(&ctx.session, args.id)?;
            emit_accounts(&ctx, &accounts)
        }
        Command::Likes(args) => {
            let posts = ctx.guard.liked_posts_of(&ctx.session, args.id)?;
            emit_posts(&ctx, &posts)
        }
        Command::Users(args) => {
            let accounts = ctx.guard.list_accounts(&ctx.session, args.q.as_deref())?;
            emit_accounts(&ctx, &accounts)
        }
        Command::ShowUser(args) => cmd_show_user(&ctx, args.id),
        Command::EditProfile(args) => cmd_edit_profile(&ctx, args),
        Command::Stats => cmd_stats(&ctx),
    }
}

fn cmd_signup(ctx: &mut Ctx, args: SignupArgs) -> anyhow::Result<()> {
    let password = ctx.password.as_deref().unwrap_or_default();
    let account = ctx.guard.signup(
        &mut ctx.session,
        &args.handle,
        &args.contact,
        password,
        args.image_url.as_deref(),
    )?;
    emit(ctx, &AccountView::from(&account), || {
        println!("{} Created account {}", "✓".green().bold(), render_account(&account));
    })
}

fn cmd_login(ctx: &Ctx) -> anyhow::Result<()> {
    let state = ctx.guard.resolve(&ctx.session)?;
    let id = state.account_id().context("no credentials given; use --as and --password")?;
    let account = ctx.guard.show_account(&ctx.session, id)?;
    emit(ctx, &AccountView::from(&account), || {
        println!("{} Hello, {}!", "✓".green().bold(), account.handle.bold());
    })
}

fn cmd_post(ctx: &Ctx, args: PostArgs) -> anyhow::Result<()> {
    let post = ctx.guard.create_post(&ctx.session, &args.body)?;
    emit(ctx, &post, || {
        println!("{} Posted {}", "✓".green().bold(), post.id.to_string().yellow());
    })
}

fn cmd_show_user(ctx: &Ctx, id: AccountId) -> anyhow::Result<()> {
    let account = ctx.guard.show_account(&ctx.session, id)?;
    let posts = ctx.guard.posts_of(&ctx.session, id)?;

    #[derive(Serialize)]
    struct Profile<'a> {
        account: AccountView<'a>,
        posts: &'a [Post],
    }

    let profile = Profile {
        account: AccountView::from(&account),
        posts: &posts,
    };
    emit(ctx, &profile, || {
        println!("{}", render_account(&account));
        if let Some(bio) = &account.bio {
            println!("  {bio}");
        }
        if let Some(location) = &account.location {
            println!("  {} {location}", "at".dimmed());
        }
        println!("  image: {}", account.image_ref.blue());
        println!("  header: {}", account.header_ref.blue());
        println!();
        posts.iter().for_each(|post| println!("{}", render_post(post)));
    })
}

fn cmd_edit_profile(ctx: &Ctx, args: EditProfileArgs) -> anyhow::Result<()> {
    let password = ctx
        .password
        .as_deref()
        .context("edit-profile requires --password")?;
    let update = ProfileUpdate {
        handle: args.handle,
        contact: args.contact,
        image_ref: args.image_url,
        header_ref: args.header_image_url,
        bio: args.bio,
        location: args.location,
    };
    if update.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }
    let account = ctx.guard.edit_profile(&ctx.session, password, &update)?;
    emit(ctx, &AccountView::from(&account), || {
        println!("{} Updated {}", "✓".green().bold(), render_account(&account));
    })
}

fn cmd_stats(ctx: &Ctx) -> anyhow::Result<()> {
    let stats = ctx.guard.store().stats()?;
    emit(ctx, &stats, || {
        println!("Accounts: {}", stats.accounts.to_string().bold());
        println!("Posts:    {}", stats.posts.to_string().bold());
        println!("Follows:  {}", stats.follows.to_string().bold());
        println!("Likes:    {}", stats.likes.to_string().bold());
    })
}

/// Account fields safe to print. The secret hash never leaves the store.
#[derive(Serialize)]
struct AccountView<'a> {
    id: AccountId,
    handle: &'a str,
    contact: &'a str,
    image_ref: &'a str,
    header_ref: &'a str,
    bio: Option<&'a str>,
    location: Option<&'a str>,
}

impl<'a> From<&'a Account> for AccountView<'a> {
    fn from(account: &'a Account) -> Self {
        Self {
            id: account.id,
            handle: &account.handle,
            contact: &account.contact,
            image_ref: &account.image_ref,
            header_ref: &account.header_ref,
            bio: account.bio.as_deref(),
            location: account.location.as_deref(),
        }
    }
}

fn emit<T: Serialize>(ctx: &Ctx, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
    match ctx.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(),
    }
    Ok(())
}

fn emit_accounts(ctx: &Ctx, accounts: &[Account]) -> anyhow::Result<()> {
    let views: Vec<AccountView<'_>> = accounts.iter().map(AccountView::from).collect();
    emit(ctx, &views, || {
        if accounts.is_empty() {
            println!("No accounts.");
        }
        accounts.iter().for_each(|a| println!("{}", render_account(a)));
    })
}

fn emit_posts(ctx: &Ctx, posts: &[Post]) -> anyhow::Result<()> {
    emit(ctx, &posts, || {
        if posts.is_empty() {
            println!("No posts.");
        }
        posts.iter().for_each(|p| println!("{}", render_post(p)));
    })
}

fn report_edge(ctx: &Ctx, changed: bool, done: String, unchanged: String) -> anyhow::Result<()> {
    emit(ctx, &changed, || {
        if changed {
            println!("{} {}", "✓".green(), done);
        } else {
            println!("{} {}", "·".dimmed(), unchanged);
        }
    })
}

fn render_account(account: &Account) -> String {
    format!(
        "{} {} <{}>",
        account.id.to_string().yellow(),
        account.handle.bold(),
        account.contact
    )
}

fn render_post(post: &Post) -> String {
    format!(
        "{}  {}  {}  {}",
        post.id.to_string().yellow(),
        post.created_at.format("%d %B %Y").to_string().dimmed(),
        post.account_id.to_string().cyan(),
        post.body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn run(db: &str, args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["warbler", "--database-url", db];
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv)?)
    }

    #[test]
    fn session_flow_against_a_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let db = format!("file:{}", dir.path().join("warbler.json").display());

        run(&db, &["signup", "alice", "alice@test.com", "--password", "password"]).unwrap();
        run(&db, &["signup", "bob", "bob@test.com", "--password", "password"]).unwrap();
        run(&db, &["post", "hello", "--as", "alice", "--password", "password"]).unwrap();
        run(&db, &["follow", "#1", "--as", "bob", "--password", "password"]).unwrap();
        run(&db, &["timeline", "--as", "bob", "--password", "password", "--format", "json"]).unwrap();

        let store = InMemoryStore::open(&db).unwrap();
        let stats = store.stats().unwrap();
        assert_eq!((stats.accounts, stats.posts, stats.follows), (2, 1, 1));
    }

    #[test]
    fn denied_and_missing_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let db = format!("file:{}", dir.path().join("warbler.json").display());
        run(&db, &["signup", "alice", "alice@test.com", "--password", "password"]).unwrap();

        let err = run(&db, &["post", "hello"]).unwrap_err();
        assert_eq!(err.to_string(), "Access unauthorized.");
        assert!(run(&db, &["show-post", "42"]).is_err());
        assert!(run(&db, &["login", "--as", "alice", "--password", "nope"]).is_err());
        assert!(run(&db, &["login", "--as", "alice"]).is_err());
        run(&db, &["login", "--as", "alice", "--password", "password"]).unwrap();
    }

    #[test]
    fn rejects_network_urls() {
        assert!(run("postgres://localhost/warbler", &["stats"]).is_err());
    }
}

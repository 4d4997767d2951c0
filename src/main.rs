mod cache;
mod config;
mod forum;
mod projection;
mod session;
#[cfg(test)]
mod testutil;
mod toggle;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cache::{KeyValueStore, MemoryStore, SqliteStore};
use forum::client::HttpForumClient;
use forum::types::PostOrder;
use projection::ProjectedPage;
use session::ForumSession;
use toggle::ToggleOutcome;

#[derive(Parser, Debug)]
#[command(name = "nosh")]
#[command(about = "Browse and like posts on the Nosh community forum")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/nosh/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Page to display (1-indexed)
  #[arg(short, long, default_value_t = 1)]
  page: usize,

  /// Feed ordering: new or popular
  #[arg(short, long, default_value = "new")]
  order: String,

  /// Filter by tag id
  #[arg(short, long)]
  tag: Option<u64>,

  /// Narrow the tag filter by a sub-tag id within the same family
  #[arg(long)]
  sub_tag: Option<u64>,

  /// Free-text search query
  #[arg(short, long)]
  search: Option<String>,

  /// Toggle your like on a post id after loading the feed
  #[arg(short, long)]
  like: Option<u64>,

  /// Discard cached posts and re-fetch before displaying
  #[arg(short, long)]
  refresh: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let config = config::Config::load(args.config.as_deref())?;
  let client = HttpForumClient::new(&config)?;

  if config.cache.ephemeral {
    run(ForumSession::new(&config, MemoryStore::new(), client), &args).await
  } else {
    run(
      ForumSession::new(&config, SqliteStore::open()?, client),
      &args,
    )
    .await
  }
}

async fn run<S: KeyValueStore>(
  mut session: ForumSession<S, HttpForumClient>,
  args: &Args,
) -> Result<()> {
  let order = parse_order(&args.order)?;

  if args.refresh {
    session.refresh(order).await;
  } else {
    session.load_page(order, args.page as u32).await;
  }

  if let Some(query) = &args.search {
    session.search(query).await;
  }

  let projector = session.projector_mut();
  projector.set_filter(args.tag);
  projector.set_sub_filter(args.sub_tag);
  projector.set_page(args.page);

  if let Some(post_id) = args.like {
    match session.toggle_like(post_id, None).await {
      ToggleOutcome::Committed { liked, likes } => {
        let verb = if liked { "Liked" } else { "Unliked" };
        println!("{} post {} ({} likes)", verb, post_id, likes);
      }
      ToggleOutcome::RolledBack => {
        println!("Could not update like on post {}; change reverted", post_id);
      }
      ToggleOutcome::Skipped => {
        println!("Post {} is not in the current feed", post_id);
      }
    }
  }

  print_page(&session.project());
  Ok(())
}

fn parse_order(order: &str) -> Result<PostOrder> {
  match order {
    "new" => Ok(PostOrder::Newest),
    "popular" => Ok(PostOrder::Popular),
    other => Err(eyre!("Unknown order {:?}, expected new or popular", other)),
  }
}

fn print_page(page: &ProjectedPage) {
  println!("Page {} of {} posts", page.page, page.total);
  for post in &page.items {
    let marker = if post.liked { "*" } else { " " };
    println!(
      "{:>6} {} {:>5}  {}  by {}",
      post.id, marker, post.likes, post.title, post.author.name
    );
  }
}

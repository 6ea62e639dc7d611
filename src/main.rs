use clap::{Parser, Subcommand};
use postindex::store::MetadataStore;
use postindex::update::ChangeSet;
use postindex::{git, scan, update, validate};
use rayon::prelude::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "postindex")]
#[command(about = "Chronological metadata index for a markdown weblog")]
#[command(long_about = "\
Chronological metadata index for a markdown weblog

Posts live under YEAR/MONTH directories; the index orders them by date and
links each to its predecessor and successor for sequential navigation:

  posts/
  ├── 2020/
  │   ├── 01/
  │   │   └── first-post.md        # date from frontmatter, else 2020-01-01
  │   └── 03/
  │       └── spring-notes.mdx
  └── 2021/
      └── 11/
          └── a-year-later.md

The index (post-index.json) is committed alongside the content. Workflow:

  generate    full rebuild; last-modified timestamps come from git history
  update      pre-commit hook; applies staged post changes incrementally
  validate    CI check; recomputes ground truth and diffs the index

Run all three from the repository root.")]
#[command(version)]
struct Cli {
    /// Content directory holding YEAR/MONTH/SLUG.{md,mdx} post files
    #[arg(long, default_value = "posts", global = true)]
    content: PathBuf,

    /// Path of the persisted metadata index
    #[arg(long, default_value = "post-index.json", global = true)]
    store: PathBuf,

    /// Repository root for git operations
    #[arg(long, default_value = ".", global = true)]
    repo: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the whole index from content files and git history
    Generate,
    /// Apply staged post changes to the index incrementally
    Update,
    /// Check the index against ground truth, reporting every discrepancy
    Validate,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate => generate(&cli),
        Command::Update => update(&cli),
        Command::Validate => validate(&cli),
    }
}

/// Full rebuild: scan everything, read git history for timestamps, write
/// the index.
fn generate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    println!("==> Checking git history");
    if git::is_shallow_repository(&cli.repo)? {
        return Err(
            "shallow clone: full git history is required for last-modified timestamps".into(),
        );
    }

    println!("==> Scanning {}", cli.content.display());
    let posts = scan::load_posts(&cli.content)?;
    println!("    {} posts", posts.len());

    println!("==> Reading last-modified timestamps");
    let pairs = posts
        .into_par_iter()
        .map(|post| {
            let path = post.rel_path(&cli.content);
            git::last_modified(&cli.repo, &path).map(|modified| (post, modified))
        })
        .collect::<Result<Vec<_>, _>>()?;

    println!("==> Linking chain");
    let store = MetadataStore::build(pairs);
    store.save(&cli.store)?;

    println!(
        "==> Wrote {} ({} posts)",
        cli.store.display(),
        store.posts.len()
    );
    Ok(())
}

/// Incremental update from staged changes. Meant to run as a pre-commit
/// hook: a no-op exits zero, a real update re-stages the index file.
fn update(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    println!("==> Checking staged changes");
    let staged = git::staged_changes(&cli.repo)?;

    let relevant = |paths: &[PathBuf]| {
        paths
            .iter()
            .filter(|p| scan::post_source_from_path(p, &cli.content).is_some())
            .count()
    };
    if relevant(&staged.changed) == 0 && relevant(&staged.deleted) == 0 {
        println!("    no staged posts, nothing to do");
        return Ok(());
    }

    let store = MetadataStore::load(&cli.store)?;
    let changes = ChangeSet::from_staged(&staged, &cli.content, &store)?;
    println!(
        "    {} added, {} edited, {} deleted",
        changes.added.len(),
        changes.edited.len(),
        changes.deleted.len()
    );

    let strategy = update::classify(&changes, &store);
    println!("==> Applying {strategy}");
    let next = update::apply(strategy, &changes, &store, &cli.content, chrono::Utc::now())?;

    next.save(&cli.store)?;
    git::stage(&cli.repo, &cli.store)?;

    println!(
        "==> Updated {} ({} posts)",
        cli.store.display(),
        next.posts.len()
    );
    Ok(())
}

/// Read-side check: recompute ground truth and diff the index against it.
fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    println!("==> Validating {}", cli.store.display());
    let store = MetadataStore::load(&cli.store)?;
    let posts = scan::load_posts(&cli.content)?;

    let discrepancies = validate::validate(&store, &posts);
    if discrepancies.is_empty() {
        println!("==> {} posts, index matches content", posts.len());
        return Ok(());
    }

    for discrepancy in &discrepancies {
        eprintln!("    {discrepancy}");
    }
    Err(format!(
        "validation failed with {} discrepancies (run `postindex update` or `postindex generate` to fix)",
        discrepancies.len()
    )
    .into())
}

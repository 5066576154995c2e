use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use svcs::areas::repository::Repository;
use svcs::commands::porcelain::log::LogOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "svcs",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "A local, content-addressed version-control engine",
    long_about = "svcs keeps content-addressed snapshots of a file tree in a local \
    repository, with branches and three-way merges.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
"
)]
struct Cli {
    /// Run as if started in this directory
    #[arg(short = 'C', global = true, value_name = "PATH")]
    directory: Option<PathBuf>,

    /// More log output on stderr (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
    },
    #[command(
        name = "add",
        about = "Stage files and directories for the next commit"
    )]
    Add {
        #[arg(index = 1, required = true, num_args = 1.., help = "Files or directories to stage")]
        paths: Vec<String>,
    },
    #[command(name = "commit", about = "Record the staged changes")]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(
        name = "status",
        about = "Show staged, unstaged and untracked files"
    )]
    Status {
        #[arg(long, help = "Print `XY path` lines for scripts")]
        porcelain: bool,
    },
    #[command(name = "log", about = "Show the commit history")]
    Log {
        #[arg(index = 1, help = "Revision to start from (HEAD by default)")]
        revision: Option<String>,
        #[arg(long, help = "One commit per line")]
        oneline: bool,
        #[arg(short = 'n', long = "max-count", help = "Show at most this many commits")]
        max_count: Option<usize>,
    },
    #[command(
        name = "diff",
        about = "List files changed between two revisions"
    )]
    Diff {
        #[arg(index = 1)]
        old: String,
        #[arg(index = 2)]
        new: String,
        #[arg(long = "diff-filter", help = "Only show these kinds of change (A, D, M)")]
        filter: Option<String>,
    },
    #[command(name = "branch", about = "Create, list or delete branches")]
    Branch {
        #[command(subcommand)]
        action: BranchAction,
    },
    #[command(
        name = "checkout",
        about = "Switch to a branch, or detach HEAD at a commit"
    )]
    Checkout {
        #[arg(index = 1)]
        target: String,
    },
    #[command(
        name = "merge",
        about = "Merge another branch or commit into the current branch"
    )]
    Merge {
        #[arg(index = 1)]
        source: String,
        #[arg(short, long, help = "Message for the merge commit")]
        message: Option<String>,
    },
    #[command(name = "clone", about = "Copy this repository into a new directory")]
    Clone {
        #[arg(index = 1)]
        target: PathBuf,
    },
    #[command(name = "add-ignore", about = "Append patterns to the ignore file")]
    AddIgnore {
        #[arg(index = 1, required = true, num_args = 1..)]
        patterns: Vec<String>,
    },
    #[command(name = "ls-files", about = "List working tree files that are not ignored")]
    LsFiles,
    #[command(
        name = "cat-file",
        about = "Print the content of an object",
        long_about = "This command prints the content of an object in the repository. \
        It accepts a full or abbreviated object id, or any revision naming a commit."
    )]
    CatFile {
        #[arg(index = 1, help = "The object to print")]
        object: String,
    },
}

#[derive(Subcommand)]
enum BranchAction {
    #[command(about = "Create a branch at a revision (HEAD by default)")]
    Create {
        #[arg(index = 1)]
        name: String,
        #[arg(index = 2)]
        start: Option<String>,
    },
    #[command(about = "List branches, marking the current one")]
    List {
        #[arg(short, long, help = "Show the commit each branch points to")]
        long: bool,
    },
    #[command(about = "Delete a branch other than the current one")]
    Delete {
        #[arg(index = 1)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let root = match cli.directory {
        Some(directory) => directory,
        None => std::env::current_dir()?,
    };
    let open = || Repository::open(&root, Box::new(std::io::stdout()));

    match cli.command {
        Commands::Init { path } => {
            let path = match path {
                Some(path) => root.join(path),
                None => root.clone(),
            };
            Repository::new(&path, Box::new(std::io::stdout()))?.init()?
        }
        Commands::Add { paths } => open()?.add(&paths).await?,
        Commands::Commit { message } => open()?.commit(&message).await?,
        Commands::Status { porcelain } => open()?.status(porcelain).await?,
        Commands::Log {
            revision,
            oneline,
            max_count,
        } => open()?.log(
            revision.as_deref(),
            &LogOptions { oneline, max_count },
        )?,
        Commands::Diff { old, new, filter } => open()?.diff(&old, &new, filter.as_deref())?,
        Commands::Branch { action } => {
            let repository = open()?;
            match action {
                BranchAction::Create { name, start } => {
                    repository.create_branch_command(&name, start.as_deref())?
                }
                BranchAction::List { long } => repository.list_branches_command(long)?,
                BranchAction::Delete { name } => repository.delete_branch_command(&name)?,
            }
        }
        Commands::Checkout { target } => open()?.checkout_command(&target).await?,
        Commands::Merge { source, message } => {
            open()?
                .merge_command(&source, message.as_deref())
                .await?
        }
        Commands::Clone { target } => {
            let target = std::env::current_dir()?.join(target);
            open()?.clone_command(&target)?
        }
        Commands::AddIgnore { patterns } => open()?.add_ignore(&patterns)?,
        Commands::LsFiles => open()?.ls_files()?,
        Commands::CatFile { object } => open()?.cat_file(&object)?,
    }

    Ok(())
}

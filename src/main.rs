use clap::{Parser, Subcommand};
use colored::Colorize;
use gitlet::Repository;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(
    name = "gitlet",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "A tiny version control system",
    long_about = "Gitlet keeps content-addressed snapshots of a working directory. \
    It supports a single line of history per branch with staging, commits and \
    prefix lookups of stored objects.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    /// Run as if started in this directory
    #[arg(short = 'C', long = "dir", global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "Creates the .gitlet store with the shared root commit and a main branch."
    )]
    Init,
    #[command(name = "add", about = "Stage a file for the next commit")]
    Add {
        #[arg(index = 1)]
        file: PathBuf,
    },
    #[command(
        name = "rm",
        about = "Stage the removal of a file",
        long_about = "Unstages a staged file, or stages the removal of a tracked file and deletes it from the working directory."
    )]
    Rm {
        #[arg(index = 1)]
        file: PathBuf,
    },
    #[command(name = "commit", about = "Record the staged changes")]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(name = "log", about = "Show first-parent history from HEAD")]
    Log,
    #[command(name = "status", about = "Show the working tree status")]
    Status,
    #[command(
        name = "branch",
        about = "List branches, or create one at HEAD",
        long_about = "Without a name, lists every branch and marks the current one. \
        With a name, creates the branch at the commit HEAD points to."
    )]
    Branch {
        #[arg(index = 1)]
        name: Option<String>,
    },
    #[command(
        name = "cat-file",
        about = "Print an object",
        long_about = "Resolves an abbreviated object ID (at least 7 characters) and prints the object."
    )]
    CatFile {
        #[arg(index = 1, help = "The object ID or a unique prefix of it")]
        oid: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gitlet=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let dir = match cli.dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let mut repository = Repository::new(&dir, Box::new(std::io::stdout()))?;

    match cli.command {
        Commands::Init => {
            repository.init()?;
        }
        Commands::Add { file } => {
            repository.add(&file)?;
        }
        Commands::Rm { file } => {
            repository.rm(&file)?;
        }
        Commands::Commit { message } => {
            repository.commit(&message)?;
        }
        Commands::Log => {
            repository.log()?;
        }
        Commands::Status => {
            repository.status()?;
        }
        Commands::Branch { name: Some(name) } => {
            let branch = repository.branch(&name)?;
            println!("Created branch {branch}");
        }
        Commands::Branch { name: None } => {
            repository.branches()?;
        }
        Commands::CatFile { oid } => {
            let (_, object) = repository.find_object(&oid)?;
            print!("{}", object.display());
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let is_corruption = err
                .downcast_ref::<gitlet::Error>()
                .is_some_and(gitlet::Error::is_corruption);
            eprintln!("{} {err}", "error:".red().bold());
            if is_corruption {
                eprintln!("{}", "the repository store is damaged; refusing to continue".red());
            }
            ExitCode::FAILURE
        }
    }
}

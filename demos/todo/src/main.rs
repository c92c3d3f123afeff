//! TomeDB Todo Demo
//!
//! A todo list kept in one TomeDB document.
//!
//! # Commands
//!
//! - `add` - Add a todo
//! - `list` - List open todos
//! - `done` - Mark a todo as done
//! - `remove` - Delete a todo
//!
//! Run with: cargo run -p todo_demo -- add "water plants"

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tomedb_core::{Database, Record};
use tracing_subscriber::EnvFilter;

/// Todo list backed by a single JSON document.
#[derive(Parser)]
#[command(name = "todo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path of the todo document
    #[arg(global = true, short, long, default_value = "todos.json")]
    file: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a todo
    Add {
        /// What needs doing
        title: String,
    },

    /// List todos
    List {
        /// Include finished todos
        #[arg(short, long)]
        all: bool,
    },

    /// Mark a todo as done
    Done {
        /// Id of the todo
        id: u64,
    },

    /// Delete a todo
    Remove {
        /// Id of the todo
        id: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let db = Database::load(&cli.file).await?;
    let todos = db.collection("todos");

    match cli.command {
        Commands::Add { title } => {
            let todo = todos
                .store(Record::new().with("title", title).with("done", false))
                .await?;
            println!("added {}", describe(&todo));
        }
        Commands::List { all } => {
            let listed = if all {
                todos.list()
            } else {
                todos.filter(|todo| !is_done(todo))
            };
            if listed.is_empty() {
                println!("nothing to do");
            }
            for todo in listed {
                let mark = if is_done(&todo) { "x" } else { " " };
                println!("[{mark}] {}", describe(&todo));
            }
        }
        Commands::Done { id } => {
            match todos
                .update_by_id(&Record::new().with("done", true), id)
                .await?
            {
                Some(todo) => println!("done {}", describe(&todo)),
                None => println!("no todo #{id}"),
            }
        }
        Commands::Remove { id } => match todos.delete(id).await? {
            Some(todo) => println!("removed {}", describe(&todo)),
            None => println!("no todo #{id}"),
        },
    }

    Ok(())
}

fn is_done(todo: &Record) -> bool {
    todo.get("done").and_then(|v| v.as_bool()).unwrap_or(false)
}

fn describe(todo: &Record) -> String {
    let id = todo.id().map(|id| id.as_u64()).unwrap_or(0);
    let title = todo
        .get("title")
        .and_then(|v| v.as_str())
        .unwrap_or("<untitled>");
    format!("#{id} {title}")
}

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use taproot::{LcsSolver, RadixTree, SuffixTree};

#[derive(Parser, Debug)]
#[command(name = "taproot", about = "Query word lists with a concurrent radix tree")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Autocomplete: list words starting with a prefix.
    Complete {
        /// Word list (one word per line).
        words: PathBuf,
        /// Prefix to complete.
        prefix: String,
        /// Maximum number of completions to print.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Substring search: list words containing a fragment.
    Contains {
        /// Word list (one word per line).
        words: PathBuf,
        /// Fragment to look for.
        fragment: String,
    },
    /// Longest common substring of two or more text files.
    Lcs {
        /// Input files, one document each.
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Complete {
            words,
            prefix,
            limit,
        } => run_complete(words, &prefix, limit).await?,
        Commands::Contains { words, fragment } => run_contains(words, &fragment).await?,
        Commands::Lcs { files } => run_lcs(files).await?,
    }

    Ok(())
}

async fn run_complete(words_path: PathBuf, prefix: &str, limit: usize) -> Result<()> {
    let tree = RadixTree::new();
    for (line_no, word) in read_words(&words_path)? {
        tree.put(&word, line_no)
            .await
            .with_context(|| format!("failed to index word '{word}'"))?;
    }

    for key in tree.keys_starting_with(prefix).take(limit) {
        println!("{key}");
    }
    Ok(())
}

async fn run_contains(words_path: PathBuf, fragment: &str) -> Result<()> {
    let tree: SuffixTree<usize> = SuffixTree::new();
    for (line_no, word) in read_words(&words_path)? {
        tree.put(&word, line_no)
            .await
            .with_context(|| format!("failed to index word '{word}'"))?;
    }

    for key in tree.keys_containing(fragment) {
        println!("{key}");
    }
    Ok(())
}

async fn run_lcs(files: Vec<PathBuf>) -> Result<()> {
    anyhow::ensure!(files.len() >= 2, "lcs needs at least two input files");

    let solver = LcsSolver::new();
    for path in &files {
        let document = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read document {}", path.display()))?;
        let document = document.trim();
        solver
            .add(document)
            .await
            .with_context(|| format!("failed to index document {}", path.display()))?;
    }

    match solver.longest_common_substring() {
        Some(common) => println!("{common}"),
        None => println!("(no common substring)"),
    }
    Ok(())
}

fn read_words(path: &PathBuf) -> Result<Vec<(usize, String)>> {
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("failed to open word list {}", path.display()))?,
    );

    let mut words = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let word = line?.trim().to_string();
        if word.is_empty() {
            continue;
        }
        words.push((line_no + 1, word));
    }
    Ok(words)
}

//! Minimal walkthrough: build a small index and query it three ways.

use taproot::{RadixTree, SuffixTree};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), taproot::TreeError> {
    let tree = RadixTree::new();
    for (word, frequency) in [
        ("tea", 120),
        ("team", 40),
        ("teapot", 12),
        ("test", 95),
        ("tester", 31),
        ("toast", 8),
    ] {
        tree.put(word, frequency).await?;
    }

    println!("completions for 'te':");
    for (word, frequency) in tree.key_value_pairs_for_keys_starting_with("te") {
        println!("  {word} ({frequency})");
    }

    println!("closest matches for 'tean':");
    for word in tree.closest_keys("tean") {
        println!("  {word}");
    }

    let substrings: SuffixTree<u32> = SuffixTree::new();
    substrings.put("teapot", 12).await?;
    substrings.put("toast", 8).await?;
    println!("words containing 'ea':");
    for word in substrings.keys_containing("ea") {
        println!("  {word}");
    }

    println!("\n{}", tree.pretty_print());
    Ok(())
}

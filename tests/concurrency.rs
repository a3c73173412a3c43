//! Concurrent readers and writers against one tree.

mod common;

use std::sync::Arc;

use common::assert_path_compressed;
use taproot::{RadixTree, WriteLock};

#[tokio::test]
async fn interleaved_writers_lose_no_updates() {
    // Two writers suspend at lock acquisition and resume in turn; both
    // keys must land regardless of the interleaving.
    let tree = Arc::new(RadixTree::new());

    let first = {
        let tree = Arc::clone(&tree);
        tokio::spawn(async move {
            tree.put("apple", 1).await.expect("put apple");
        })
    };
    let second = {
        let tree = Arc::clone(&tree);
        tokio::spawn(async move {
            tree.put("apricot", 2).await.expect("put apricot");
        })
    };

    first.await.expect("first writer");
    second.await.expect("second writer");

    assert_eq!(tree.get("apple"), Some(1));
    assert_eq!(tree.get("apricot"), Some(2));
    assert_eq!(tree.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_parallel_writers_all_land() {
    let tree = Arc::new(RadixTree::new());
    let words: Vec<String> = (0..64).map(|i| format!("key{i:03}")).collect();

    let mut tasks = Vec::new();
    for (i, word) in words.iter().cloned().enumerate() {
        let tree = Arc::clone(&tree);
        tasks.push(tokio::spawn(async move {
            tree.put(&word, i as i32).await.expect("put");
        }));
    }
    for task in tasks {
        task.await.expect("writer task");
    }

    assert_eq!(tree.len(), 64);
    for (i, word) in words.iter().enumerate() {
        assert_eq!(tree.get(word), Some(i as i32), "lost update for {word}");
    }
    assert_path_compressed(&tree);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_run_during_mutation_without_locking() {
    let tree = Arc::new(RadixTree::new());
    for i in 0..32 {
        tree.put(&format!("stable{i:02}"), i).await.expect("put");
    }

    let writer = {
        let tree = Arc::clone(&tree);
        tokio::spawn(async move {
            for round in 0..20 {
                for i in 0..16 {
                    let key = format!("churn{i:02}");
                    tree.put(&key, round * 100 + i).await.expect("put");
                }
                for i in 0..16 {
                    tree.remove(&format!("churn{i:02}")).await.expect("remove");
                }
            }
        })
    };

    let reader = {
        let tree = Arc::clone(&tree);
        tokio::spawn(async move {
            for _ in 0..200 {
                // Stable keys are always visible, whatever the churn.
                let stable: Vec<String> = tree.keys_starting_with("stable").collect();
                assert_eq!(stable.len(), 32);
                assert_eq!(tree.get("stable00"), Some(0));
                tokio::task::yield_now().await;
            }
        })
    };

    writer.await.expect("writer");
    reader.await.expect("reader");

    assert_eq!(tree.len(), 32);
    assert_path_compressed(&tree);
}

#[tokio::test]
async fn queued_writers_on_one_key_apply_in_fifo_order() {
    // Hold the lock directly, queue three writers behind it, and check
    // the last-served writer's value wins.
    let lock = Arc::new(WriteLock::new());
    let tree = Arc::new(RadixTree::new());

    let held = lock.acquire().await;
    let mut tasks = Vec::new();
    for value in 1..=3 {
        let task_lock = Arc::clone(&lock);
        let tree = Arc::clone(&tree);
        tasks.push(tokio::spawn(async move {
            let _guard = task_lock.acquire().await;
            tree.put("contended", value).await.expect("put");
        }));
        while lock.queued_writers() < value as usize {
            tokio::task::yield_now().await;
        }
    }

    drop(held);
    for task in tasks {
        task.await.expect("queued writer");
    }
    assert_eq!(tree.get("contended"), Some(3));
}

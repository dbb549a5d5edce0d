use cloudfiles_storage::queue::PendingQueue;
use std::path::Path;

#[test]
fn new_queue_is_empty() {
    let queue = PendingQueue::new();
    assert!(queue.is_empty());
    assert_eq!(queue.write_count(), 0);
    assert_eq!(queue.delete_count(), 0);
}

#[test]
fn queue_write_replaces_same_style() {
    let mut queue = PendingQueue::new();
    assert!(queue.queue_write("thumb", "/tmp/a.png").is_none());
    let previous = queue.queue_write("thumb", "/tmp/b.png");

    assert_eq!(previous.as_deref(), Some(Path::new("/tmp/a.png")));
    assert_eq!(queue.write_count(), 1);
    assert_eq!(queue.pending_write("thumb"), Some(Path::new("/tmp/b.png")));
    assert_eq!(queue.pending_write("original"), None);
}

#[test]
fn take_writes_returns_all_and_resets() {
    let mut queue = PendingQueue::new();
    queue.queue_write("original", "/tmp/o");
    queue.queue_write("thumb", "/tmp/t");

    let writes = queue.take_writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(queue.write_count(), 0);
    assert!(queue.pending_write("thumb").is_none());
}

#[test]
fn deletes_keep_queue_order() {
    let mut queue = PendingQueue::new();
    queue.queue_delete("z");
    queue.queue_delete("a");
    queue.queue_delete("m");
    assert_eq!(queue.pending_deletes(), ["z", "a", "m"]);

    let deletes = queue.take_deletes();
    assert_eq!(deletes, vec!["z", "a", "m"]);
    assert!(queue.is_empty());
}

#[test]
fn writes_and_deletes_are_independent() {
    let mut queue = PendingQueue::default();
    queue.queue_write("original", "/tmp/o");
    queue.queue_delete("old");

    queue.take_deletes();
    assert!(!queue.is_empty());
    assert_eq!(queue.write_count(), 1);
}

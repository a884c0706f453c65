// © 2019 3D Robotics. License: Apache-2.0
//! The Buffer actor: a bounded byte queue shared between one Reader
//! (producer) and the [`super::UrlSource`] (consumer), per §4.4.
//!
//! `read` never blocks: it replies with whatever is queued right now, which
//! may be empty without being EOF. `data` may block the Reader task when the
//! queue is at capacity — backpressure — by deferring its reply until room
//! opens up. Only one `data` call is ever in flight at a time (the Reader
//! awaits each reply before issuing the next), so a single deferred slot is
//! enough; the same is true of `finish`.

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, Notify};

use crate::source::ReadOutcome;

enum BufferMsg {
    Data { chunk: Bytes, reply: oneshot::Sender<()> },
    Finish { reply: oneshot::Sender<()> },
    Read { reply: oneshot::Sender<ReadOutcome> },
}

#[derive(Clone, Debug)]
pub struct BufferHandle {
    tx: mpsc::Sender<BufferMsg>,
    notify: Arc<Notify>,
}

impl BufferHandle {
    /// Producer side: enqueue a chunk, resolving once there is room for it.
    pub async fn data(&self, chunk: Bytes) {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(BufferMsg::Data { chunk, reply }).await.is_err() {
            return;
        }
        let _ = rx.await;
    }

    /// Producer side: signal no more `data` calls are coming.
    pub async fn finish(&self) {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(BufferMsg::Finish { reply }).await.is_err() {
            return;
        }
        let _ = rx.await;
    }

    /// Consumer side: never blocks. May return `Chunk(empty)` if nothing is
    /// queued yet and the producer hasn't finished — callers should wait on
    /// [`BufferHandle::notified`] before retrying.
    pub async fn read(&self) -> ReadOutcome {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(BufferMsg::Read { reply }).await.is_err() {
            return ReadOutcome::Eof;
        }
        rx.await.unwrap_or(ReadOutcome::Eof)
    }

    pub fn notified(&self) -> impl std::future::Future<Output = ()> + '_ {
        self.notify.notified()
    }
}

/// Spawns the actor task and returns the handle both sides share.
pub fn spawn(capacity: usize) -> BufferHandle {
    let (tx, rx) = mpsc::channel(8);
    let notify = Arc::new(Notify::new());
    tokio::spawn(run(rx, capacity, notify.clone()));
    BufferHandle { tx, notify }
}

async fn run(mut rx: mpsc::Receiver<BufferMsg>, capacity: usize, notify: Arc<Notify>) {
    let mut queue: VecDeque<Bytes> = VecDeque::new();
    let mut length = 0usize;
    let mut finished = false;
    let mut pending_data: Option<(Bytes, oneshot::Sender<()>)> = None;
    let mut pending_finish: Option<oneshot::Sender<()>> = None;

    while let Some(msg) = rx.recv().await {
        match msg {
            BufferMsg::Data { chunk, reply } => {
                if length < capacity && pending_data.is_none() {
                    length += chunk.len();
                    queue.push_back(chunk);
                    let _ = reply.send(());
                    notify.notify_waiters();
                } else {
                    pending_data = Some((chunk, reply));
                }
            }
            BufferMsg::Finish { reply } => {
                if pending_data.is_none() && queue.is_empty() {
                    finished = true;
                    let _ = reply.send(());
                    notify.notify_waiters();
                } else {
                    pending_finish = Some(reply);
                }
            }
            BufferMsg::Read { reply } => {
                if let Some(chunk) = queue.pop_front() {
                    length -= chunk.len();
                    let _ = reply.send(ReadOutcome::Chunk(chunk));
                } else if finished {
                    let _ = reply.send(ReadOutcome::Eof);
                } else {
                    let _ = reply.send(ReadOutcome::Chunk(Bytes::new()));
                }

                if length < capacity {
                    if let Some((chunk, data_reply)) = pending_data.take() {
                        length += chunk.len();
                        queue.push_back(chunk);
                        let _ = data_reply.send(());
                        notify.notify_waiters();
                    }
                }

                if pending_data.is_none() && queue.is_empty() {
                    if let Some(finish_reply) = pending_finish.take() {
                        finished = true;
                        let _ = finish_reply.send(());
                        notify.notify_waiters();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn reads_chunks_in_order_then_eof() {
        let handle = spawn(1024);
        handle.data(Bytes::from_static(b"one")).await;
        handle.data(Bytes::from_static(b"two")).await;

        // finish() doesn't resolve until the queue it left behind drains.
        let producer = handle.clone();
        let finish = tokio::spawn(async move { producer.finish().await });

        assert!(matches!(handle.read().await, ReadOutcome::Chunk(c) if c == "one"));
        assert!(matches!(handle.read().await, ReadOutcome::Chunk(c) if c == "two"));
        finish.await.unwrap();
        assert!(matches!(handle.read().await, ReadOutcome::Eof));
    }

    #[tokio::test]
    async fn read_before_any_data_is_empty_not_eof() {
        let handle = spawn(1024);
        assert!(matches!(handle.read().await, ReadOutcome::Chunk(c) if c.is_empty()));
    }

    #[tokio::test]
    async fn backpressure_defers_data_until_room_is_read() {
        let handle = spawn(4);
        handle.data(Bytes::from_static(b"abcd")).await; // fills capacity

        let producer = handle.clone();
        let second_write = tokio::spawn(async move {
            producer.data(Bytes::from_static(b"e")).await;
        });

        tokio::task::yield_now().await;
        assert!(!second_write.is_finished());

        assert!(matches!(handle.read().await, ReadOutcome::Chunk(c) if c == "abcd"));
        second_write.await.unwrap();
        assert!(matches!(handle.read().await, ReadOutcome::Chunk(c) if c == "e"));
    }

    #[tokio::test]
    async fn finish_is_deferred_while_the_queue_is_non_empty() {
        let handle = spawn(4);
        handle.data(Bytes::from_static(b"abcd")).await; // fills capacity

        let producer = handle.clone();
        let finish = tokio::spawn(async move {
            producer.finish().await;
        });

        tokio::task::yield_now().await;
        assert!(!finish.is_finished());

        assert!(matches!(handle.read().await, ReadOutcome::Chunk(c) if c == "abcd"));
        finish.await.unwrap();
        assert!(matches!(handle.read().await, ReadOutcome::Eof));
    }
}

//! Bounded, paced work queue between the frontier and a crawler plugin.
//!
//! Each plugin owns one queue. Publishing blocks while the queue is full, and
//! the single consumer stream waits the plugin's delay before every delivery,
//! so the plugin's call rate is bounded by the queue rather than by the
//! plugin itself.

use std::pin::Pin;

use futures::Stream;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::config::QueueConfig;
use crate::error::{Result, SeekerError};

/// Serialized frontier task.
pub type QueueTask = Vec<u8>;

/// Stream of deliveries from a work queue.
pub type TaskStream = Pin<Box<dyn Stream<Item = QueueTask> + Send>>;

pub struct WorkQueue {
    sender: mpsc::Sender<QueueTask>,
    receiver: Mutex<Option<mpsc::Receiver<QueueTask>>>,
    config: QueueConfig,
    stop: CancellationToken,
}

impl WorkQueue {
    pub fn new(config: QueueConfig) -> Self {
        let config = QueueConfig::new(config.delay, config.queue_size);
        let (sender, receiver) = mpsc::channel(config.queue_size);

        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
            config,
            stop: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> QueueConfig {
        self.config
    }

    /// Number of buffered tasks.
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enqueue a task, waiting while the queue is full.
    pub async fn publish(&self, task: QueueTask) -> Result<()> {
        self.sender
            .send(task)
            .await
            .map_err(|_| SeekerError::QueueClosed)
    }

    /// Take the delivery stream.
    ///
    /// Only one consumer is supported. The stream ends when `cancel` fires or
    /// `stop_consuming` is called.
    pub async fn start_consuming(&self, cancel: CancellationToken) -> Result<TaskStream> {
        let mut receiver = self
            .receiver
            .lock()
            .await
            .take()
            .ok_or(SeekerError::AlreadyConsuming)?;

        let delay = self.config.delay;
        let stop = self.stop.clone();

        let stream = async_stream::stream! {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = stop.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }

                let task = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = stop.cancelled() => break,
                    task = receiver.recv() => task,
                };

                match task {
                    Some(task) => yield task,
                    None => break,
                }
            }
        };

        Ok(Box::pin(stream))
    }

    /// End the delivery stream.
    pub fn stop_consuming(&self) {
        self.stop.cancel();
    }
}

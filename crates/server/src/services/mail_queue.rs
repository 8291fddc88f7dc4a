//! Background mail delivery.
//!
//! Handlers enqueue rendered mail and return immediately; a single tokio
//! worker delivers it. Each mail gets a bounded number of attempts with a
//! fixed pause between them. The worker exits once every [`MailQueue`]
//! handle has been dropped and the channel is drained.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::email::{EmailError, MailDelivery, OutgoingMail};

/// Attempts per mail before giving up.
pub const MAX_ATTEMPTS: u32 = 3;

/// Pause between attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum MailQueueError {
    /// The worker has stopped.
    #[error("mail queue is closed")]
    Closed,
}

/// Handle for enqueueing mail. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MailQueue {
    sender: mpsc::UnboundedSender<OutgoingMail>,
}

impl MailQueue {
    /// Start the worker with the default retry delay.
    pub fn spawn<D: MailDelivery>(delivery: D) -> (Self, JoinHandle<()>) {
        Self::spawn_with_delay(delivery, RETRY_DELAY)
    }

    /// Start the worker with a custom pause between attempts.
    pub fn spawn_with_delay<D: MailDelivery>(
        delivery: D,
        retry_delay: Duration,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let delivery = Arc::new(delivery);
        let worker = tokio::spawn(run_worker(delivery, receiver, retry_delay));
        info!("Mail queue worker started");
        (Self { sender }, worker)
    }

    /// Queue a mail for delivery. Never waits.
    ///
    /// # Errors
    ///
    /// Returns `MailQueueError::Closed` if the worker has stopped.
    pub fn enqueue(&self, mail: OutgoingMail) -> Result<(), MailQueueError> {
        debug!(to = %mail.to, subject = %mail.subject, "Mail enqueued");
        self.sender.send(mail).map_err(|_| MailQueueError::Closed)
    }

    /// Queue a freshly composed mail, logging if it could not be rendered or
    /// queued. Used after a save has already succeeded.
    pub fn send(&self, composed: Result<OutgoingMail, EmailError>) {
        let result = composed
            .map_err(|e| e.to_string())
            .and_then(|mail| self.enqueue(mail).map_err(|e| e.to_string()));

        if let Err(e) = result {
            error!(error = %e, "Failed to queue mail");
        }
    }
}

async fn run_worker<D: MailDelivery>(
    delivery: Arc<D>,
    mut receiver: mpsc::UnboundedReceiver<OutgoingMail>,
    retry_delay: Duration,
) {
    while let Some(mail) = receiver.recv().await {
        deliver_with_retry(delivery.as_ref(), &mail, retry_delay).await;
    }
    info!("Mail queue worker stopped");
}

/// Try to deliver one mail up to [`MAX_ATTEMPTS`] times. Returns whether it was delivered.
#[instrument(skip(delivery, mail, retry_delay), fields(to = %mail.to, subject = %mail.subject))]
pub async fn deliver_with_retry<D: MailDelivery>(
    delivery: &D,
    mail: &OutgoingMail,
    retry_delay: Duration,
) -> bool {
    for attempt in 1..=MAX_ATTEMPTS {
        match delivery.deliver(mail).await {
            Ok(()) => return true,
            Err(e) if attempt < MAX_ATTEMPTS => {
                warn!(attempt, error = %e, "Mail delivery failed, retrying");
                tokio::time::sleep(retry_delay).await;
            }
            Err(e) => {
                let event_id = sentry::capture_error(&e);
                error!(
                    attempt,
                    error = %e,
                    sentry_event_id = %event_id,
                    "Mail delivery failed, giving up"
                );
            }
        }
    }
    false
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    /// Fails the first `failures` calls, then records what it delivers.
    #[derive(Default)]
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
        delivered: Mutex<Vec<String>>,
    }

    impl MailDelivery for Arc<Flaky> {
        async fn deliver(&self, mail: &OutgoingMail) -> Result<(), EmailError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(EmailError::InvalidAddress(mail.to.clone()));
            }
            self.delivered.lock().unwrap().push(mail.subject.clone());
            Ok(())
        }
    }

    fn mail(subject: &str) -> OutgoingMail {
        OutgoingMail {
            to: "someone@people.test".into(),
            subject: subject.into(),
            text: String::new(),
            html: String::new(),
        }
    }

    #[tokio::test]
    async fn test_retries_until_delivered() {
        let flaky = Arc::new(Flaky {
            failures: 2,
            ..Flaky::default()
        });

        assert!(deliver_with_retry(&flaky, &mail("hi"), Duration::ZERO).await);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
        assert_eq!(*flaky.delivered.lock().unwrap(), ["hi"]);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let flaky = Arc::new(Flaky {
            failures: u32::MAX,
            ..Flaky::default()
        });

        assert!(!deliver_with_retry(&flaky, &mail("hi"), Duration::ZERO).await);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_worker_drains_queue_then_stops() {
        let flaky = Arc::new(Flaky::default());
        let (queue, worker) = MailQueue::spawn_with_delay(Arc::clone(&flaky), Duration::ZERO);

        queue.enqueue(mail("one")).unwrap();
        queue.enqueue(mail("two")).unwrap();
        drop(queue);
        worker.await.unwrap();

        assert_eq!(*flaky.delivered.lock().unwrap(), ["one", "two"]);
    }

    #[tokio::test]
    async fn test_send_skips_mail_that_failed_to_render() {
        let flaky = Arc::new(Flaky::default());
        let (queue, worker) = MailQueue::spawn_with_delay(Arc::clone(&flaky), Duration::ZERO);

        queue.send(Err(EmailError::InvalidAddress("nobody".into())));
        queue.send(Ok(mail("rendered")));
        drop(queue);
        worker.await.unwrap();

        assert_eq!(*flaky.delivered.lock().unwrap(), ["rendered"]);
    }
}

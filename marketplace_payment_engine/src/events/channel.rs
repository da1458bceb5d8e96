use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::sync::mpsc;

/// An async callback invoked once per published event.
pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// One half of a simple stateless pub-sub pair. The handler owns the receiving end of the channel and runs the
/// callback for each event on its own spawned task, so publishers never wait on consumers.
pub struct EventHandler<E: Send + Sync + 'static> {
    receiver: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { receiver, sender, handler }
    }

    /// Create a new producer handle feeding this handler.
    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer { sender: self.sender.clone() }
    }

    /// Drain the channel until every producer has been dropped. Run this on its own task.
    pub async fn start_handler(mut self) {
        debug!("📬️ Event handler started");
        // Drop our own sender so the loop ends once the last external producer goes away.
        drop(self.sender);
        while let Some(event) = self.receiver.recv().await {
            let handler = Arc::clone(&self.handler);
            tokio::spawn(async move {
                (handler)(event).await;
            });
        }
        debug!("📬️ Event handler shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Could not publish event: {e}");
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    #[tokio::test]
    async fn every_published_event_is_handled() {
        let _ = env_logger::try_init();
        let total = Arc::new(AtomicU64::new(0));
        let sum = Arc::clone(&total);
        let handler: Handler<u64> = Arc::new(move |v| {
            let sum = Arc::clone(&sum);
            Box::pin(async move {
                sum.fetch_add(v, Ordering::SeqCst);
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        let event_handler = EventHandler::new(4, handler);
        let producer = event_handler.subscribe();
        let publisher = tokio::spawn(async move {
            for v in 1..=10u64 {
                producer.publish_event(v).await;
            }
        });
        event_handler.start_handler().await;
        publisher.await.unwrap();
        // start_handler returns when producers are gone; give spawned handlers a beat to finish
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        assert_eq!(total.load(Ordering::SeqCst), 55);
    }
}

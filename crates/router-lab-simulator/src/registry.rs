use crate::error::DiagError;
use router_lab_abstract::ServerEvent;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Outbound half of a client channel.
///
/// Implementations must not block: a slow or vanished client can never stall
/// the sender.
pub trait ClientSink: Send + Sync {
    fn deliver(&self, event: &ServerEvent) -> Result<(), ChannelClosed>;
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("channel closed")]
pub struct ChannelClosed;

impl ClientSink for mpsc::UnboundedSender<ServerEvent> {
    fn deliver(&self, event: &ServerEvent) -> Result<(), ChannelClosed> {
        self.send(event.clone()).map_err(|_| ChannelClosed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    NoSuchClient,
}

/// Identifies one registration of a client id; a reconnect gets a new one.
pub type Generation = u64;

struct Channel {
    generation: Generation,
    sink: Arc<dyn ClientSink>,
}

#[derive(Default)]
struct Channels {
    next_generation: Generation,
    by_client: HashMap<String, Channel>,
}

/// Open channels keyed by client identifier.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<Mutex<Channels>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn channels(&self) -> MutexGuard<'_, Channels> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registering an identifier again replaces the previous channel.
    pub fn register(
        &self,
        client: impl Into<String>,
        sink: impl ClientSink + 'static,
    ) -> Generation {
        let client = client.into();
        let mut channels = self.channels();
        let generation = channels.next_generation;
        channels.next_generation += 1;

        let channel = Channel {
            generation,
            sink: Arc::new(sink),
        };
        if channels.by_client.insert(client.clone(), channel).is_some() {
            info!("Client {} reconnected, replacing its channel", client);
        }
        info!(
            "Client {} connected. Total connections: {}",
            client,
            channels.by_client.len()
        );
        generation
    }

    pub fn deregister(&self, client: &str) -> bool {
        self.remove_if(client, |_| true)
    }

    /// Deregisters `client` only while `generation` is still its current
    /// registration. A connection that closes after being replaced leaves the
    /// newer channel alone.
    pub fn release(&self, client: &str, generation: Generation) -> bool {
        self.remove_if(client, |channel| channel.generation == generation)
    }

    fn remove_if(&self, client: &str, matches: impl Fn(&Channel) -> bool) -> bool {
        let mut channels = self.channels();
        if !channels.by_client.get(client).is_some_and(matches) {
            return false;
        }
        channels.by_client.remove(client);
        info!(
            "Client {} disconnected. Total connections: {}",
            client,
            channels.by_client.len()
        );
        true
    }

    fn lookup(&self, client: &str) -> Option<(Generation, Arc<dyn ClientSink>)> {
        self.channels()
            .by_client
            .get(client)
            .map(|channel| (channel.generation, channel.sink.clone()))
    }

    pub fn send_to(&self, client: &str, event: &ServerEvent) -> Delivery {
        let Some((generation, sink)) = self.lookup(client) else {
            debug!("Dropping {} for unknown client {}", event.kind(), client);
            return Delivery::NoSuchClient;
        };
        match sink.deliver(event) {
            Ok(()) => Delivery::Delivered,
            Err(err) => {
                warn!("{}", DiagError::transport(client, err.to_string()));
                self.release(client, generation);
                Delivery::NoSuchClient
            }
        }
    }

    /// Best effort; returns how many channels accepted the event.
    pub fn broadcast(&self, event: &ServerEvent) -> usize {
        let targets: Vec<(String, Generation, Arc<dyn ClientSink>)> = self
            .channels()
            .by_client
            .iter()
            .map(|(id, channel)| (id.clone(), channel.generation, channel.sink.clone()))
            .collect();

        let mut delivered = 0;
        for (client, generation, sink) in targets {
            match sink.deliver(event) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    let failure = DiagError::transport(&client, err.to_string());
                    warn!("Broadcast skipped: {}", failure);
                    self.release(&client, generation);
                }
            }
        }
        delivered
    }

    pub fn contains(&self, client: &str) -> bool {
        self.channels().by_client.contains_key(client)
    }

    pub fn len(&self) -> usize {
        self.channels().by_client.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels().by_client.is_empty()
    }
}

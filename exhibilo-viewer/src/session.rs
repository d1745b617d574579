/// Runs loads in the background and feeds their progress back to the viewer
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::trace;

use crate::asset::AssetReference;
use crate::loader::AssetLoader;
use crate::state::{LoadToken, LoadUpdate, Viewer};

pub struct LoadSession {
    runtime: Handle,
    loader: Arc<AssetLoader>,
    updates: UnboundedSender<LoadUpdate>,
}

impl LoadSession {
    pub fn new(runtime: Handle, loader: AssetLoader) -> (Self, UnboundedReceiver<LoadUpdate>) {
        let (updates, receiver) = mpsc::unbounded_channel();
        let session = Self {
            runtime,
            loader: Arc::new(loader),
            updates,
        };
        (session, receiver)
    }

    pub fn loader(&self) -> &AssetLoader {
        &self.loader
    }

    /// Begin loading `reference`, superseding whatever was loading before
    pub fn start(&self, viewer: &mut Viewer, reference: AssetReference) -> (LoadToken, JoinHandle<()>) {
        let token = viewer.begin_load();
        (token, self.spawn(token, reference))
    }

    fn spawn(&self, token: LoadToken, reference: AssetReference) -> JoinHandle<()> {
        let loader = Arc::clone(&self.loader);
        let updates = self.updates.clone();

        self.runtime.spawn(async move {
            let phases = updates.clone();
            let result = loader
                .load(reference, |phase| {
                    let _ = phases.send(LoadUpdate::phase(token, phase));
                })
                .await;
            // the receiver is gone once the viewer shuts down
            let _ = updates.send(LoadUpdate::finished(token, result));
        })
    }
}

/// Apply every update already queued. Returns how many were applied.
pub fn drain(viewer: &mut Viewer, receiver: &mut UnboundedReceiver<LoadUpdate>) -> usize {
    let mut applied = 0;
    loop {
        match receiver.try_recv() {
            Ok(update) => {
                let token = update.token;
                if viewer.apply(update) {
                    applied += 1;
                } else {
                    trace!(?token, "dropped update from superseded load");
                }
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => return applied,
        }
    }
}

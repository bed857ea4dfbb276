use std::sync::{Arc, mpsc};
use std::thread;

use anyhow::Context;

use crate::assets::bitmap::ImageDecoder;
use crate::assets::video::{VideoEntity, build};
use crate::foundation::error::{SvgaError, SvgaResult};
use crate::format::decode::decode;

/// Outcome of polling a background load.
#[derive(Debug)]
pub(crate) enum LoadPoll {
    Pending,
    Ready(SvgaResult<VideoEntity>),
}

/// Decode + build running on a worker thread.
///
/// Dropping the handle drops the receiver; the worker's eventual result is then discarded.
#[derive(Debug)]
pub(crate) struct PendingLoad {
    rx: mpsc::Receiver<SvgaResult<VideoEntity>>,
}

impl PendingLoad {
    pub(crate) fn spawn(bytes: Vec<u8>, decoder: Arc<dyn ImageDecoder>) -> SvgaResult<Self> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("svga-load".to_owned())
            .spawn(move || {
                let res = decode(&bytes).and_then(|movie| build(movie, decoder));
                if tx.send(res).is_err() {
                    tracing::debug!("load finished after its player went away; result dropped");
                }
            })
            .context("spawn load worker thread")?;
        Ok(Self { rx })
    }

    pub(crate) fn poll(&self) -> LoadPoll {
        match self.rx.try_recv() {
            Ok(res) => LoadPoll::Ready(res),
            Err(mpsc::TryRecvError::Empty) => LoadPoll::Pending,
            Err(mpsc::TryRecvError::Disconnected) => LoadPoll::Ready(Err(SvgaError::Other(
                anyhow::anyhow!("load worker exited without a result"),
            ))),
        }
    }

    /// Block until the worker reports.
    pub(crate) fn wait(self) -> SvgaResult<VideoEntity> {
        self.rx
            .recv()
            .map_err(|_| SvgaError::Other(anyhow::anyhow!("load worker exited without a result")))?
    }
}

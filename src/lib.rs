use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::sync::atomic::AtomicBool;

use smol_str::SmolStr;

pub mod archive;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod facade;
pub mod index;
pub mod io;
pub mod platform;
pub mod resolver;
pub mod vendor;
pub mod version;

pub async fn spawn_blocking<T: Send + 'static>(
    f: impl FnOnce() -> anyhow::Result<T> + Send + 'static,
) -> anyhow::Result<T> {
    match tokio::task::spawn_blocking(f).await {
        Ok(r) => r,
        Err(_) => Err(anyhow::anyhow!("Failed to join spawned IO task")),
    }
}

pub struct HttpClient {
    client_inner: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> HttpClient {
        HttpClient {
            client_inner: reqwest::Client::new(),
        }
    }

    pub fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client_inner.get(url)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        HttpClient::new()
    }
}

pub enum Status {
    InProgress {
        name: SmolStr,
        progress_ratio: Option<(u64, u64)>,
    },
    Stopped,
}

static CANCELLED: AtomicBool = AtomicBool::new(false);

pub fn set_cancelled() {
    CANCELLED.store(true, std::sync::atomic::Ordering::Relaxed);
}

pub fn is_cancelled() -> bool {
    CANCELLED.load(std::sync::atomic::Ordering::Relaxed)
}

pub struct CancellableFuture<Fut> {
    inner: Fut,
}

impl<Fut> CancellableFuture<Fut> {
    pub fn new(inner: Fut) -> Self {
        CancellableFuture { inner }
    }
}

impl<Fut> Future for CancellableFuture<Fut>
where
    Fut: Future,
{
    type Output = Option<Fut::Output>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if is_cancelled() {
            Poll::Ready(None)
        } else {
            // TODO: is unsafe right?
            let inner = unsafe { self.map_unchecked_mut(|s| &mut s.inner) };
            match inner.poll(cx) {
                Poll::Ready(output) => Poll::Ready(Some(output)),
                Poll::Pending => Poll::Pending,
            }
        }
    }
}

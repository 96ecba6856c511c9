//! One-shot download of remote GIFs on a worker thread

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use std::time::Duration;

use deskpet_ui::{MediaData, MediaError, Point};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server answered {0}")]
    Status(StatusCode),
    #[error("Not a valid GIF: {0}")]
    Decode(#[from] MediaError),
}

/// A downloaded and decoded GIF, ready to upload.
pub struct FetchedGif {
    pub url: String,
    pub position: Point,
    pub data: MediaData,
}

pub type FetchResult = Result<FetchedGif, (String, FetchError)>;

/// Runs fetches in the background and hands results back to the frame loop.
pub struct RemoteFetcher {
    timeout: Duration,
    sender: Sender<FetchResult>,
    receiver: Receiver<FetchResult>,
    in_flight: usize,
}

impl RemoteFetcher {
    pub fn new(timeout: Duration) -> Self {
        let (sender, receiver) = channel();
        Self {
            timeout,
            sender,
            receiver,
            in_flight: 0,
        }
    }

    /// Start fetching `url`. The result is placed at `position` once decoded.
    pub fn fetch(&mut self, url: impl Into<String>, position: Point) {
        let url = url.into();
        let sender = self.sender.clone();
        let timeout = self.timeout;
        self.in_flight += 1;
        log::info!("Fetching {}", url);

        thread::spawn(move || {
            let result = download_gif(&url, timeout)
                .map(|data| FetchedGif {
                    url: url.clone(),
                    position,
                    data,
                })
                .map_err(|e| (url, e));
            // Receiver is gone when the app has quit
            let _ = sender.send(result);
        });
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Results that arrived since the last poll.
    pub fn poll(&mut self) -> Vec<FetchResult> {
        let results: Vec<_> = self.receiver.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(results.len());
        results
    }
}

/// GET `url` and decode the body as a GIF. Anything but 200 is an error.
pub fn download_gif(url: &str, timeout: Duration) -> Result<MediaData, FetchError> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent("deskpet remote gif")
        .build()?;

    let response = client.get(url).send()?;
    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::Status(status));
    }

    let bytes = response.bytes()?;
    log::debug!("Downloaded {} bytes from {}", bytes.len(), url);
    Ok(MediaData::gif_from_bytes(&bytes)?)
}

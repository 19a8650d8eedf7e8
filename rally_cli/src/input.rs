//! Console line reader.
//!
//! Reading stdin blocks, so a detached thread forwards each line over a
//! bounded channel and the host loop waits on it with a timeout. All
//! computer state stays on the host thread.

use std::io::BufRead;
use std::time::Duration;

use crossbeam_channel as xch;

/// What the host loop gets from one wait.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// Nothing typed within the wait.
    Idle,
    /// Input closed; treated as quit.
    Closed,
}

pub struct LineReader {
    rx: xch::Receiver<String>,
}

impl LineReader {
    pub fn spawn<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = xch::bounded(16);
        std::thread::spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(l) => {
                        if tx.send(l).is_err() {
                            tracing::debug!("input consumer gone, exiting reader");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "stdin read failed");
                        break;
                    }
                }
            }
            tracing::trace!("input reader exiting");
        });
        Self { rx }
    }

    /// Wait up to `timeout` for one line.
    pub fn wait(&self, timeout: Duration) -> Input {
        match self.rx.recv_timeout(timeout) {
            Ok(l) => Input::Line(l),
            Err(xch::RecvTimeoutError::Timeout) => Input::Idle,
            Err(xch::RecvTimeoutError::Disconnected) => Input::Closed,
        }
    }
}

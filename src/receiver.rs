//! Background packet receive loop and its delivery queue.
//!
//! Each connected TNC runs one dedicated reader thread that polls the
//! serial link, feeds a [`Deframer`](crate::framing::Deframer), and
//! publishes completed packets as hex-pair text into an unbounded queue.
//! Lifecycle is cooperative: a per-instance running flag checked at every
//! iteration, and a join with no timeout on stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, warn};

use crate::framing::Deframer;
use crate::hex;
use crate::transport::SerialLink;

/// Poll interval while the receive buffer is empty.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Arrival-ordered queue of decoded packets, filled by the receive worker
/// and drained opportunistically by the operator console. Enqueueing never
/// blocks the worker.
pub struct PacketQueue {
    tx: Sender<String>,
    rx: Receiver<String>,
}

impl PacketQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// Producer handle for a receive worker.
    pub(crate) fn sender(&self) -> Sender<String> {
        self.tx.clone()
    }

    /// Next packet in arrival order, or `None` when the queue is empty.
    pub fn pop(&self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

impl Default for PacketQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle handle for one TNC's receive worker.
#[derive(Default)]
pub struct ReceiveLoop {
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ReceiveLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawns the reader thread. Starting an already-running loop is
    /// refused with a warning.
    pub fn start<D>(&mut self, link: SerialLink, deframer: D, queue: Sender<String>)
    where
        D: Deframer + 'static,
    {
        if self.worker.is_some() {
            warn!("receive loop already running");
            return;
        }
        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        self.worker = Some(thread::spawn(move || {
            run_worker(link, deframer, queue, running);
            debug!("receive worker finished");
        }));
        debug!("receive loop started");
    }

    /// Clears the running flag and joins the worker, waiting as long as it
    /// takes. A worker that already ended on its own, or was never started,
    /// gets a warning instead.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        match self.worker.take() {
            Some(handle) => {
                if handle.is_finished() {
                    warn!("receive worker had already stopped");
                }
                if handle.join().is_err() {
                    error!("receive worker panicked");
                }
            }
            None => warn!("receive loop was not running"),
        }
    }
}

fn run_worker<D: Deframer>(
    link: SerialLink,
    mut deframer: D,
    queue: Sender<String>,
    running: Arc<AtomicBool>,
) {
    while link.is_open() && running.load(Ordering::SeqCst) {
        match link.read_byte() {
            Ok(Some(byte)) => {
                if let Some(packet) = deframer.push_byte(byte) {
                    publish(&queue, &packet);
                }
            }
            Ok(None) => {
                // The burst ran dry; this is the frame boundary for the
                // trailer scheme. Poll timeouts surface here too.
                if let Some(packet) = deframer.end_of_burst() {
                    publish(&queue, &packet);
                } else {
                    thread::sleep(POLL_INTERVAL);
                }
            }
            Err(e) => {
                error!("receive loop read failed: {e}");
                running.store(false, Ordering::SeqCst);
            }
        }
    }
    // Anything mid-accumulation dies with the deframer here, so a stopped
    // loop never publishes a partial frame.
}

fn publish(queue: &Sender<String>, packet: &[u8]) {
    let text = hex::to_hex_pairs(packet);
    debug!("received packet: {text}");
    // The device owns the receiving end for its whole lifetime, so a send
    // only fails once the device itself is gone.
    let _ = queue.send(text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::trailer::{encode_frame, TrailerDeframer};
    use crate::transport::MockPort;

    fn settle() {
        thread::sleep(Duration::from_millis(400));
    }

    #[test]
    fn queue_preserves_arrival_order() {
        let queue = PacketQueue::new();
        let sender = queue.sender();
        sender.send("aa".to_string()).unwrap();
        sender.send("bb".to_string()).unwrap();
        assert_eq!(queue.pop().as_deref(), Some("aa"));
        assert_eq!(queue.pop().as_deref(), Some("bb"));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn worker_publishes_validated_frames() {
        let link = SerialLink::new();
        let mock = MockPort::new();
        link.install(Box::new(mock.clone()));

        let queue = PacketQueue::new();
        let mut receive = ReceiveLoop::new();
        receive.start(link, TrailerDeframer::new(), queue.sender());

        mock.push_incoming(&encode_frame(&[0x01, 0x02]));
        settle();
        assert_eq!(queue.pop().as_deref(), Some("42 01 02"));
        assert_eq!(queue.pop(), None);

        receive.stop();
        assert!(!receive.is_running());
    }

    #[test]
    fn immediate_stop_publishes_nothing() {
        let link = SerialLink::new();
        let mock = MockPort::new();
        link.install(Box::new(mock.clone()));

        let queue = PacketQueue::new();
        let mut receive = ReceiveLoop::new();
        receive.start(link, TrailerDeframer::new(), queue.sender());
        // A partial frame is in flight when the stop lands.
        mock.push_incoming(&[0x42]);
        receive.stop();

        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn stop_without_start_only_warns() {
        let mut receive = ReceiveLoop::new();
        receive.stop();
        assert!(!receive.is_running());
    }

    #[test]
    fn loop_can_be_restarted_after_stop() {
        let link = SerialLink::new();
        let mock = MockPort::new();
        link.install(Box::new(mock.clone()));

        let queue = PacketQueue::new();
        let mut receive = ReceiveLoop::new();
        receive.start(link.clone(), TrailerDeframer::new(), queue.sender());
        receive.stop();

        receive.start(link, TrailerDeframer::new(), queue.sender());
        mock.push_incoming(&encode_frame(&[0x0A]));
        settle();
        assert_eq!(queue.pop().as_deref(), Some("42 0a"));
        receive.stop();
    }
}

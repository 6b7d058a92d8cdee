//! In-memory device for tests and demos.
//!
//! Outbound frames are reassembled into messages; an optional responder
//! turns each complete message into reply messages, which are queued as
//! inbound frames for the reader.
//!
//! # Example
//!
//! ```
//! use podwire::message::encode;
//! use podwire::protocol::split_message;
//! use podwire::transport::{MemoryDevice, Transport};
//!
//! let device = MemoryDevice::new();
//! device.open("pod").unwrap();
//! for frame in split_message(&encode::set_query(0)) {
//!     device.write(&frame.encode()).unwrap();
//! }
//! assert_eq!(device.written_messages().len(), 1);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use tracing::{debug, warn};

use super::{DeviceInfo, Transport};
use crate::error::{PodError, Result};
use crate::message::Assembler;
use crate::protocol::{split_message, RawFrame};

/// Reply generator: receives one complete outbound message and returns
/// the messages the device answers with.
pub type Responder = Box<dyn FnMut(&[u8]) -> Vec<Bytes> + Send>;

/// Default device listed by [`MemoryDevice::new`].
const DEFAULT_DEVICE: (&str, &str) = ("pod", "POD HD500X (memory)");

struct State {
    devices: Vec<DeviceInfo>,
    open: Option<String>,
    inbound: VecDeque<Bytes>,
    outbound: Assembler,
    frames: Vec<Bytes>,
    messages: Vec<Bytes>,
    responder: Option<Responder>,
    fail_open: bool,
    fail_write: bool,
    fail_close: bool,
}

impl State {
    fn queue_message(&mut self, msg: &Bytes) {
        for frame in split_message(msg) {
            self.inbound.push_back(frame.encode());
        }
    }

    fn on_frame(&mut self, data: &[u8]) {
        let frame = RawFrame::decode(Bytes::copy_from_slice(data));
        match self.outbound.push(&frame) {
            Ok(false) => {}
            Ok(true) => {
                let Some(msg) = std::mem::take(&mut self.outbound).into_message() else {
                    return;
                };
                debug!("Device received {}", msg.name());
                let data = msg.data().clone();
                self.messages.push(data.clone());
                if let Some(responder) = self.responder.as_mut() {
                    for reply in responder(&data[..]) {
                        self.queue_message(&reply);
                    }
                }
            }
            Err(e) => {
                warn!("Device dropped outbound frame: {}", e);
                self.outbound = Assembler::new();
            }
        }
    }
}

/// Scripted device. Clones share the same state.
#[derive(Clone)]
pub struct MemoryDevice {
    state: Arc<Mutex<State>>,
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self::with_devices(vec![DeviceInfo::new(DEFAULT_DEVICE.0, DEFAULT_DEVICE.1)])
    }

    pub fn with_devices(devices: Vec<DeviceInfo>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                devices,
                open: None,
                inbound: VecDeque::new(),
                outbound: Assembler::new(),
                frames: Vec::new(),
                messages: Vec::new(),
                responder: None,
                fail_open: false,
                fail_write: false,
                fail_close: false,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Install the reply generator.
    pub fn respond_with<F>(&self, responder: F)
    where
        F: FnMut(&[u8]) -> Vec<Bytes> + Send + 'static,
    {
        self.state().responder = Some(Box::new(responder));
    }

    /// Queue an unsolicited message, split into raw frames.
    pub fn push_message(&self, msg: &[u8]) {
        self.state().queue_message(&Bytes::copy_from_slice(msg));
    }

    /// Queue one raw read chunk as is.
    pub fn push_chunk(&self, chunk: Bytes) {
        self.state().inbound.push_back(chunk);
    }

    /// Complete messages written so far.
    pub fn written_messages(&self) -> Vec<Bytes> {
        self.state().messages.clone()
    }

    /// Raw frames written so far.
    pub fn written_frames(&self) -> Vec<Bytes> {
        self.state().frames.clone()
    }

    /// Chunks not read yet.
    pub fn pending_reads(&self) -> usize {
        self.state().inbound.len()
    }

    /// Simulate the device going away.
    pub fn disconnect(&self) {
        self.state().open = None;
    }

    pub fn fail_open(&self, fail: bool) {
        self.state().fail_open = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state().fail_write = fail;
    }

    pub fn fail_close(&self, fail: bool) {
        self.state().fail_close = fail;
    }
}

impl Default for MemoryDevice {
    fn default() -> Self {
        Self::new()
    }
}

fn io_error(msg: &str) -> PodError {
    PodError::Io(std::io::Error::new(std::io::ErrorKind::Other, msg.to_string()))
}

impl Transport for MemoryDevice {
    fn open(&self, device: &str) -> Result<()> {
        let mut state = self.state();
        if state.fail_open {
            return Err(io_error("device refused to open"));
        }
        if !state.devices.iter().any(|d| d.id == device) {
            return Err(PodError::NotFound(format!("device {}", device)));
        }
        state.open = Some(device.to_string());
        Ok(())
    }

    fn read(&self, max: usize) -> Result<Bytes> {
        let mut state = self.state();
        if state.open.is_none() {
            return Err(PodError::ConnectionClosed);
        }
        let Some(mut chunk) = state.inbound.pop_front() else {
            return Ok(Bytes::new());
        };
        if chunk.len() > max {
            let rest = chunk.split_off(max);
            state.inbound.push_front(rest);
        }
        Ok(chunk)
    }

    fn write(&self, data: &[u8]) -> Result<usize> {
        let mut state = self.state();
        if state.open.is_none() {
            return Err(PodError::ConnectionClosed);
        }
        if state.fail_write {
            return Err(io_error("write failed"));
        }
        state.frames.push(Bytes::copy_from_slice(data));
        state.on_frame(data);
        Ok(data.len())
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state();
        state.open = None;
        if state.fail_close {
            return Err(io_error("close failed"));
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state().open.is_some()
    }

    fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        Ok(self.state().devices.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{encode, MessageKind};
    use crate::protocol::{u32_at, FrameKind, MessageHeader};

    #[test]
    fn test_open_unknown_device() {
        let device = MemoryDevice::new();
        assert!(matches!(device.open("nope"), Err(PodError::NotFound(_))));
        assert!(!device.is_open());
        device.open("pod").unwrap();
        assert!(device.is_open());
    }

    #[test]
    fn test_read_requires_open() {
        let device = MemoryDevice::new();
        assert!(matches!(device.read(64), Err(PodError::ConnectionClosed)));
        device.open("pod").unwrap();
        assert!(device.read(64).unwrap().is_empty());
    }

    #[test]
    fn test_responder_replies_in_frames() {
        let device = MemoryDevice::new();
        device.respond_with(|msg| {
            let header = MessageHeader::decode(msg).unwrap();
            assert_eq!(header.subtype, 0x2800);
            vec![Bytes::from(vec![0u8; 130])]
        });
        device.open("pod").unwrap();
        for frame in split_message(&encode::set_query(2)) {
            device.write(&frame.encode()).unwrap();
        }

        let written = device.written_messages();
        assert_eq!(written.len(), 1);
        assert_eq!(u32_at(&written[0], 8).unwrap(), 2);

        assert_eq!(device.pending_reads(), 3);
        let first = RawFrame::decode(device.read(1000).unwrap());
        assert_eq!(first.kind(), FrameKind::Begin);
        assert_eq!(first.payload().len(), 60);
        let second = RawFrame::decode(device.read(1000).unwrap());
        assert_eq!(second.kind(), FrameKind::Continuation);
    }

    #[test]
    fn test_multi_frame_outbound_message() {
        let device = MemoryDevice::new();
        device.open("pod").unwrap();
        let dump = crate::message::testing::inbound(MessageKind::PresetLoad);
        let msg = encode::preset_set(&crate::model::Rig::new(), &dump, 0, 0, [b' '; 16]).unwrap();
        let frames = split_message(&msg);
        let count = frames.len();
        for frame in frames {
            device.write(&frame.encode()).unwrap();
        }
        assert_eq!(device.written_frames().len(), count);
        let written = device.written_messages();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].len(), 4108);
    }

    #[test]
    fn test_chunk_split_at_max() {
        let device = MemoryDevice::new();
        device.open("pod").unwrap();
        device.push_chunk(Bytes::from_static(b"abcdef"));
        assert_eq!(&device.read(4).unwrap()[..], b"abcd");
        assert_eq!(&device.read(4).unwrap()[..], b"ef");
    }

    #[test]
    fn test_disconnect_and_failures() {
        let device = MemoryDevice::new();
        device.fail_open(true);
        assert!(matches!(device.open("pod"), Err(PodError::Io(_))));
        device.fail_open(false);
        device.open("pod").unwrap();

        device.fail_writes(true);
        assert!(device.write(b"xxxx").is_err());

        device.disconnect();
        assert!(!device.is_open());
        assert!(matches!(device.write(b"xxxx"), Err(PodError::ConnectionClosed)));

        device.open("pod").unwrap();
        device.fail_close(true);
        assert!(device.close().is_err());
        assert!(!device.is_open());
    }
}

//! Framing of [`Message`]s on the diagnostic serial port.
//!
//! Each message is postcard encoded, COBS stuffed and terminated by a single zero byte.

use crate::{message::Message, warn};

/// Largest frame accepted, including the terminating zero.
pub const MAX_FRAME_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub enum FrameError {
    #[error("Serialization error")]
    Serialize,

    #[error("Deserialization error")]
    Deserialize,

    #[error("Frame longer than {} bytes", MAX_FRAME_LEN)]
    Oversize,
}

/// Encodes a message into `buffer`, returning the part of the buffer holding the frame.
pub fn encode<'a>(message: &Message, buffer: &'a mut [u8]) -> Result<&'a mut [u8], FrameError> {
    let len = buffer.len();
    postcard::to_slice_cobs(message, buffer).map_err(|_| {
        warn!("Failed to encode message into {} byte buffer", len);
        FrameError::Serialize
    })
}

#[cfg(feature = "std")]
pub fn encode_to_vec(message: &Message) -> Result<Vec<u8>, FrameError> {
    postcard::to_stdvec_cobs(message).map_err(|_| FrameError::Serialize)
}

/// Decodes a single frame, with or without its terminating zero. The frame is modified in place.
pub fn decode(frame: &mut [u8]) -> Result<Message, FrameError> {
    let len = frame.len();
    postcard::from_bytes_cobs(frame).map_err(|_| {
        warn!("Failed to decode message with {} bytes in buffer", len);
        FrameError::Deserialize
    })
}

/// Collects bytes from a serial stream into complete frames.
#[derive(Default)]
pub struct FrameAccumulator {
    buffer: heapless::Vec<u8, MAX_FRAME_LEN>,
    overflowed: bool,
}

impl FrameAccumulator {
    /// Adds one received byte, returning a decoded message (or why it could not be decoded) once
    /// a frame delimiter arrives.
    ///
    /// Bytes of a frame that grows past [`MAX_FRAME_LEN`] are dropped up to and including its
    /// delimiter, which then reports [`FrameError::Oversize`].
    pub fn push(&mut self, byte: u8) -> Option<Result<Message, FrameError>> {
        if byte == 0 {
            if self.overflowed {
                self.overflowed = false;
                return Some(Err(FrameError::Oversize));
            }

            if self.buffer.is_empty() {
                return None;
            }

            // Space for the delimiter is always kept free
            let _ = self.buffer.push(0);
            let result = decode(&mut self.buffer);
            self.buffer.clear();
            Some(result)
        } else {
            if self.overflowed {
                return None;
            }

            if self.buffer.len() >= MAX_FRAME_LEN - 1 {
                warn!("Discarding frame longer than {} bytes", MAX_FRAME_LEN);
                self.buffer.clear();
                self.overflowed = true;
                return None;
            }

            let _ = self.buffer.push(byte);
            None
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

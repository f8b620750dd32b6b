use crate::{constants::MAX_MESSAGE_LEN, error::ProtoError, messages::Message};

/// Encode a message into the payload of a single binary frame.
pub fn encode_message<T: Message>(msg: &T) -> Result<Vec<u8>, ProtoError> {
    let bytes = postcard::to_stdvec(msg)?;
    if bytes.len() > MAX_MESSAGE_LEN {
        return Err(ProtoError::PayloadTooLarge(bytes.len()));
    }
    Ok(bytes)
}

/// Decode one message from a binary frame. The frame must hold nothing else.
pub fn decode_message<T: Message>(frame: &[u8]) -> Result<T, ProtoError> {
    if frame.is_empty() {
        return Err(ProtoError::TooShort);
    }
    if frame.len() > MAX_MESSAGE_LEN {
        return Err(ProtoError::FrameTooLarge(frame.len()));
    }

    let (msg, rest) = postcard::take_from_bytes::<T>(frame)?;
    if !rest.is_empty() {
        return Err(ProtoError::LengthMismatch(rest.len()));
    }
    Ok(msg)
}

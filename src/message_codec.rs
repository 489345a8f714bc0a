//! Little-endian packed wire encoding for the TCP order-gateway frames
//! and the multicast public messages (spec §6). Grounded on the
//! teacher's `message_codec.rs` byte-offset discipline, rewritten to the
//! record layouts of [`crate::messages`] and to little-endian byte
//! order (the teacher's codec was big-endian; spec §6 mandates
//! little-endian).

use crate::messages::{ClientRequest, ClientResponse, MarketUpdate, PublicMessage, RequestFrame, ResponseFrame};
use crate::types::{ClientRequestType, ClientResponseType, MarketUpdateType, Side};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("buffer too small: need {need} bytes, have {have}")]
    BufferTooSmall { need: usize, have: usize },
    #[error("unknown tag {0} for {1}")]
    UnknownTag(u8, &'static str),
}

pub const CLIENT_REQUEST_SIZE: usize = 28;
pub const CLIENT_RESPONSE_SIZE: usize = 40;
pub const MARKET_UPDATE_SIZE: usize = 32;
pub const REQUEST_FRAME_SIZE: usize = 8 + CLIENT_REQUEST_SIZE;
pub const RESPONSE_FRAME_SIZE: usize = 8 + CLIENT_RESPONSE_SIZE;
pub const PUBLIC_MESSAGE_SIZE: usize = 8 + MARKET_UPDATE_SIZE;

fn need(buf_len: usize, size: usize) -> Result<(), CodecError> {
    if buf_len < size {
        Err(CodecError::BufferTooSmall {
            need: size,
            have: buf_len,
        })
    } else {
        Ok(())
    }
}

fn side_to_byte(side: Side) -> u8 {
    match side {
        Side::Invalid => 0,
        Side::Buy => 1,
        Side::Sell => 2,
    }
}

fn byte_to_side(b: u8) -> Result<Side, CodecError> {
    match b {
        0 => Ok(Side::Invalid),
        1 => Ok(Side::Buy),
        2 => Ok(Side::Sell),
        other => Err(CodecError::UnknownTag(other, "Side")),
    }
}

pub fn encode_client_request(req: &ClientRequest, out: &mut [u8]) -> Result<(), CodecError> {
    need(out.len(), CLIENT_REQUEST_SIZE)?;
    let mut off = 0;
    out[off] = req.kind as u8;
    off += 1;
    out[off..off + 4].copy_from_slice(&req.client_id.to_le_bytes());
    off += 4;
    out[off..off + 2].copy_from_slice(&req.ticker_id.to_le_bytes());
    off += 2;
    out[off..off + 8].copy_from_slice(&req.client_order_id.to_le_bytes());
    off += 8;
    out[off] = side_to_byte(req.side);
    off += 1;
    out[off..off + 8].copy_from_slice(&req.price.to_le_bytes());
    off += 8;
    out[off..off + 4].copy_from_slice(&req.qty.to_le_bytes());
    Ok(())
}

pub fn decode_client_request(buf: &[u8]) -> Result<ClientRequest, CodecError> {
    need(buf.len(), CLIENT_REQUEST_SIZE)?;
    let mut off = 0;
    let kind = match buf[off] {
        0 => ClientRequestType::Invalid,
        1 => ClientRequestType::New,
        2 => ClientRequestType::Cancel,
        other => return Err(CodecError::UnknownTag(other, "ClientRequestType")),
    };
    off += 1;
    let client_id = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
    off += 4;
    let ticker_id = u16::from_le_bytes(buf[off..off + 2].try_into().unwrap());
    off += 2;
    let client_order_id = u64::from_le_bytes(buf[off..off + 8].try_into().unwrap());
    off += 8;
    let side = byte_to_side(buf[off])?;
    off += 1;
    let price = i64::from_le_bytes(buf[off..off + 8].try_into().unwrap());
    off += 8;
    let qty = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
    Ok(ClientRequest {
        kind,
        client_id,
        ticker_id,
        client_order_id,
        side,
        price,
        qty,
    })
}

pub fn encode_client_response(resp: &ClientResponse, out: &mut [u8]) -> Result<(), CodecError> {
    need(out.len(), CLIENT_RESPONSE_SIZE)?;
    let mut off = 0;
    out[off] = resp.kind as u8;
    off += 1;
    out[off..off + 4].copy_from_slice(&resp.client_id.to_le_bytes());
    off += 4;
    out[off..off + 2].copy_from_slice(&resp.ticker_id.to_le_bytes());
    off += 2;
    out[off..off + 8].copy_from_slice(&resp.client_order_id.to_le_bytes());
    off += 8;
    out[off..off + 8].copy_from_slice(&resp.market_order_id.to_le_bytes());
    off += 8;
    out[off] = side_to_byte(resp.side);
    off += 1;
    out[off..off + 8].copy_from_slice(&resp.price.to_le_bytes());
    off += 8;
    out[off..off + 4].copy_from_slice(&resp.exec_qty.to_le_bytes());
    off += 4;
    out[off..off + 4].copy_from_slice(&resp.leaves_qty.to_le_bytes());
    Ok(())
}

pub fn decode_client_response(buf: &[u8]) -> Result<ClientResponse, CodecError> {
    need(buf.len(), CLIENT_RESPONSE_SIZE)?;
    let mut off = 0;
    let kind = match buf[off] {
        0 => ClientResponseType::Invalid,
        1 => ClientResponseType::Accepted,
        2 => ClientResponseType::Canceled,
        3 => ClientResponseType::Filled,
        4 => ClientResponseType::CancelRejected,
        other => return Err(CodecError::UnknownTag(other, "ClientResponseType")),
    };
    off += 1;
    let client_id = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
    off += 4;
    let ticker_id = u16::from_le_bytes(buf[off..off + 2].try_into().unwrap());
    off += 2;
    let client_order_id = u64::from_le_bytes(buf[off..off + 8].try_into().unwrap());
    off += 8;
    let market_order_id = u64::from_le_bytes(buf[off..off + 8].try_into().unwrap());
    off += 8;
    let side = byte_to_side(buf[off])?;
    off += 1;
    let price = i64::from_le_bytes(buf[off..off + 8].try_into().unwrap());
    off += 8;
    let exec_qty = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
    off += 4;
    let leaves_qty = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
    Ok(ClientResponse {
        kind,
        client_id,
        ticker_id,
        client_order_id,
        market_order_id,
        side,
        price,
        exec_qty,
        leaves_qty,
    })
}

pub fn encode_market_update(upd: &MarketUpdate, out: &mut [u8]) -> Result<(), CodecError> {
    need(out.len(), MARKET_UPDATE_SIZE)?;
    let mut off = 0;
    out[off] = upd.kind as u8;
    off += 1;
    out[off..off + 8].copy_from_slice(&upd.market_order_id.to_le_bytes());
    off += 8;
    out[off..off + 2].copy_from_slice(&upd.ticker_id.to_le_bytes());
    off += 2;
    out[off] = side_to_byte(upd.side);
    off += 1;
    out[off..off + 8].copy_from_slice(&upd.price.to_le_bytes());
    off += 8;
    out[off..off + 4].copy_from_slice(&upd.qty.to_le_bytes());
    off += 4;
    out[off..off + 8].copy_from_slice(&upd.priority.to_le_bytes());
    Ok(())
}

pub fn decode_market_update(buf: &[u8]) -> Result<MarketUpdate, CodecError> {
    need(buf.len(), MARKET_UPDATE_SIZE)?;
    let mut off = 0;
    let kind = match buf[off] {
        0 => MarketUpdateType::Invalid,
        1 => MarketUpdateType::Add,
        2 => MarketUpdateType::Modify,
        3 => MarketUpdateType::Cancel,
        4 => MarketUpdateType::Trade,
        5 => MarketUpdateType::Clear,
        6 => MarketUpdateType::SnapshotStart,
        7 => MarketUpdateType::SnapshotEnd,
        other => return Err(CodecError::UnknownTag(other, "MarketUpdateType")),
    };
    off += 1;
    let market_order_id = u64::from_le_bytes(buf[off..off + 8].try_into().unwrap());
    off += 8;
    let ticker_id = u16::from_le_bytes(buf[off..off + 2].try_into().unwrap());
    off += 2;
    let side = byte_to_side(buf[off])?;
    off += 1;
    let price = i64::from_le_bytes(buf[off..off + 8].try_into().unwrap());
    off += 8;
    let qty = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
    off += 4;
    let priority = u64::from_le_bytes(buf[off..off + 8].try_into().unwrap());
    Ok(MarketUpdate {
        kind,
        market_order_id,
        ticker_id,
        side,
        price,
        qty,
        priority,
    })
}

pub fn encode_request_frame(frame: &RequestFrame, out: &mut [u8]) -> Result<(), CodecError> {
    need(out.len(), REQUEST_FRAME_SIZE)?;
    out[0..8].copy_from_slice(&frame.seq.to_le_bytes());
    encode_client_request(&frame.request, &mut out[8..REQUEST_FRAME_SIZE])
}

pub fn decode_request_frame(buf: &[u8]) -> Result<RequestFrame, CodecError> {
    need(buf.len(), REQUEST_FRAME_SIZE)?;
    let seq = u64::from_le_bytes(buf[0..8].try_into().unwrap());
    let request = decode_client_request(&buf[8..REQUEST_FRAME_SIZE])?;
    Ok(RequestFrame { seq, request })
}

pub fn encode_response_frame(frame: &ResponseFrame, out: &mut [u8]) -> Result<(), CodecError> {
    need(out.len(), RESPONSE_FRAME_SIZE)?;
    out[0..8].copy_from_slice(&frame.seq.to_le_bytes());
    encode_client_response(&frame.response, &mut out[8..RESPONSE_FRAME_SIZE])
}

pub fn decode_response_frame(buf: &[u8]) -> Result<ResponseFrame, CodecError> {
    need(buf.len(), RESPONSE_FRAME_SIZE)?;
    let seq = u64::from_le_bytes(buf[0..8].try_into().unwrap());
    let response = decode_client_response(&buf[8..RESPONSE_FRAME_SIZE])?;
    Ok(ResponseFrame { seq, response })
}

pub fn encode_public_message(msg: &PublicMessage, out: &mut [u8]) -> Result<(), CodecError> {
    need(out.len(), PUBLIC_MESSAGE_SIZE)?;
    out[0..8].copy_from_slice(&msg.seq_num.to_le_bytes());
    encode_market_update(&msg.update, &mut out[8..PUBLIC_MESSAGE_SIZE])
}

pub fn decode_public_message(buf: &[u8]) -> Result<PublicMessage, CodecError> {
    need(buf.len(), PUBLIC_MESSAGE_SIZE)?;
    let seq_num = u64::from_le_bytes(buf[0..8].try_into().unwrap());
    let update = decode_market_update(&buf[8..PUBLIC_MESSAGE_SIZE])?;
    Ok(PublicMessage { seq_num, update })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClientRequestType, MarketUpdateType};

    #[test]
    fn client_request_round_trips() {
        let req = ClientRequest {
            kind: ClientRequestType::New,
            client_id: 7,
            ticker_id: 1,
            client_order_id: 1001,
            side: Side::Buy,
            price: 500,
            qty: 100,
        };
        let mut buf = [0u8; CLIENT_REQUEST_SIZE];
        encode_client_request(&req, &mut buf).unwrap();
        let decoded = decode_client_request(&buf).unwrap();
        assert_eq!(decoded.client_id, req.client_id);
        assert_eq!(decoded.client_order_id, req.client_order_id);
        assert_eq!(decoded.side, req.side);
        assert_eq!(decoded.price, req.price);
        assert_eq!(decoded.qty, req.qty);
    }

    #[test]
    fn market_update_round_trips_negative_price() {
        let upd = MarketUpdate {
            kind: MarketUpdateType::Add,
            market_order_id: 42,
            ticker_id: 3,
            side: Side::Sell,
            price: -17,
            qty: 9,
            priority: 5,
        };
        let mut buf = [0u8; MARKET_UPDATE_SIZE];
        encode_market_update(&upd, &mut buf).unwrap();
        let decoded = decode_market_update(&buf).unwrap();
        assert_eq!(decoded.price, -17);
        assert_eq!(decoded.market_order_id, 42);
    }

    #[test]
    fn decode_rejects_short_buffer() {
        let buf = [0u8; 4];
        assert!(matches!(
            decode_client_request(&buf),
            Err(CodecError::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn decode_rejects_unknown_tag() {
        let mut buf = [0u8; CLIENT_REQUEST_SIZE];
        buf[0] = 0xFF;
        assert!(matches!(
            decode_client_request(&buf),
            Err(CodecError::UnknownTag(0xFF, "ClientRequestType"))
        ));
    }
}

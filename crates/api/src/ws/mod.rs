//! WebSocket transport for the per-conversation chat channel.
//!
//! Each connection subscribes to the conversation's delivery group on
//! the [`ChatBus`](educonnect_messaging::ChatBus); outbound frames are
//! the bus's delivery events serialized as JSON, inbound frames are
//! chat messages fed into the messaging service.

mod handler;

pub use handler::chat_ws_handler;

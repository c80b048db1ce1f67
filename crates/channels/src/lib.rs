//! Channel-agnostic outbound contract.
//!
//! A channel (Feishu, Telegram, ...) implements [`ChannelOutboundAdapter`] so
//! the hosting framework can send text and media without knowing the
//! platform's primitives.

pub mod chunk;
pub mod outbound;

pub use outbound::{
    ChannelOutboundAdapter, ChunkerMode, DeliveryMode, DeliveryResult, MarkdownChunker,
    OutboundRequest, TextChunker,
};

//! Feishu / Lark outbound channel.
//!
//! [`FeishuOutbound`] implements the channel-agnostic outbound contract on
//! top of two narrow collaborators, a text sender and a media uploader.
//! [`FeishuClient`] is the HTTP implementation of both against the Feishu
//! Open Platform.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod fs;
pub mod outbound;
pub mod path;
pub mod runtime;
pub mod send;

pub use {
    client::FeishuClient,
    config::{FeishuAccountConfig, FeishuDomain},
    error::{Error, Result},
    outbound::FeishuOutbound,
    runtime::FeishuRuntime,
};

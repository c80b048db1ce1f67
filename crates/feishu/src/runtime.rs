use std::sync::Arc;

use chanbridge_channels::{MarkdownChunker, TextChunker};

/// Services the host runtime provides to the Feishu channel.
#[derive(Clone)]
pub struct FeishuRuntime {
    chunker: Arc<dyn TextChunker>,
}

impl FeishuRuntime {
    pub fn new(chunker: Arc<dyn TextChunker>) -> Self {
        Self { chunker }
    }

    pub fn chunker(&self) -> &dyn TextChunker {
        self.chunker.as_ref()
    }
}

impl Default for FeishuRuntime {
    fn default() -> Self {
        Self::new(Arc::new(MarkdownChunker))
    }
}

pub mod dify;
pub mod wakeword;

// Re-export commonly used types for convenience
pub use dify::{DifyAsr, DifyConfig, DifyError, DifyResult};
pub use wakeword::{
    RecognitionFragment, RecognitionMode, TranscriptAccumulator, UpstreamChannel, WakeEvent,
    WakePhraseSet, WakewordError, WakewordResult,
};

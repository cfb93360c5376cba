//! Analyzer adapters and their shared infrastructure: the fingerprint-keyed
//! result cache, the per-user AI usage limiter, and the tier registry the
//! engine dispatches through. Adapters are pure in `(text, context)` so
//! cached results are always safe to replay.

pub mod adapters;
pub mod analyzer;
pub mod cache;
pub mod clock;
pub mod fingerprint;
pub mod types;
pub mod usage;

pub use adapters::{
    AiClient, AiClientConfig, AiClientError, AiDetectAnalyzer, AiEnhanceAnalyzer, DeepAnalyzer,
    FastAnalyzer, SeoAnalyzer,
};
pub use analyzer::{Analyzer, AnalyzerRegistry, SharedAnalyzer, SourceTier};
pub use cache::{CacheStats, CacheStatsSnapshot, ResultCache};
pub use clock::{system_clock, Clock, SharedClock, SystemClock};
pub use fingerprint::fingerprint;
pub use types::{
    AnalyzerContext, CacheEntry, Category, DocumentMeta, RawFinding, Severity, TierFlags,
};
pub use usage::UsageLimiter;

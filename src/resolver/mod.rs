//! Resolver Module
//!
//! Signed-URL resolution for stored submission artefacts (voice recordings,
//! screenshots, operation logs).

mod fanout;
mod signer;

pub use fanout::{
    FanOutResolver, ResolvedUrls, ResolverConfig, SubmitRecord, DEFAULT_CONCURRENCY,
    DEFAULT_URL_TTL,
};
pub use signer::{HttpUrlSigner, SignerConfig, UrlSigner, PRIVATE_URL_PATH};

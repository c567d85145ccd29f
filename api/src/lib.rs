//! Typed client for the voxid voiceprint and emotion service.
//!
//! Every remote call goes through one [`Gateway`], which injects the
//! bearer token, classifies transport and status failures, clears the
//! session on expiry, and normalizes the service's response envelope
//! into typed results. Services are thin typed layers over it.

mod auth;
mod client;
mod emotion;
mod error;
mod gateway;
mod pipe;
mod session;
mod types;
mod upload;
mod voiceprint;

pub use auth::{AuthService, WxProfile};
pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL};
pub use emotion::{EmotionReport, EmotionService};
pub use error::{Error, Result};
pub use gateway::{
    Auth, Gateway, HttpRequest, RawResponse, ReqwestTransport, Transport, TransportError,
    UploadRequest,
};
pub use pipe::{PipeTransport, RecordedRequest};
pub use session::{Session, SessionHandle};
pub use types::Identity;
pub use upload::{UploadKind, UploadService, UploadTags, UploadedAudio};
pub use voiceprint::{
    HistoryEntry, RegisteredSample, VerifyOutcome, VoiceprintService, VoiceprintStatus,
};

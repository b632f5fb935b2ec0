//! # omegasync-client
//!
//! omegaUp API client. [`OmegaUpClient`] authenticates once and then
//! implements [`omegasync_core::Platform`], so the synchronizer can drive
//! it like any other backend.
//!
//! Every call is a form-encoded `POST /api/<kind>/<method>/`. Archive
//! uploads are sent as multipart and use the longer upload timeout.

mod client;
mod platform;

pub use client::{
    ClientConfig, Credentials, DEFAULT_METADATA_TIMEOUT, DEFAULT_UPLOAD_TIMEOUT, DEFAULT_URL,
    OmegaUpClient,
};

//! Error types for capture and decode operations.
//!
//! All fallible operations in this crate return [`SnifferError`] through the
//! [`Result`] alias. Errors carry structured context (device names, socket
//! addresses, parser keys) rather than free-form strings where possible.
//!
//! ## Error Categories
//!
//! - **Capture Errors**: device enumeration, open and read failures
//! - **Socket Errors**: relay socket bind/receive failures
//! - **Codec Errors**: wire codec failures while parsing a payload
//! - **Registry Errors**: conflicting parser registrations (fatal at startup)
//! - **Pipeline Errors**: payload channel shutdown, timeouts
//!
//! Malformed packet headers are deliberately *not* errors: classification
//! returns `None` on bad input so the hot path never allocates an error for
//! foreign traffic.

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

use crate::decode::FrameKind;

/// Result type alias for capture and decode operations.
pub type Result<T, E = SnifferError> = std::result::Result<T, E>;

/// Main error type for the capture pipeline.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SnifferError {
    #[error("capture failed on device '{device}': {reason}")]
    Capture {
        device: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("no capture device could be opened")]
    NoDevices,

    #[error("relay socket error on {addr}")]
    Socket {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("wire codec error in {context}: {details}")]
    Codec { context: String, details: String },

    #[error("conflicting parser registration for {kind:?} code {code}")]
    DuplicateParser { kind: FrameKind, code: u16 },

    #[error("payload channel closed")]
    ChannelClosed,

    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("provider is already running")]
    AlreadyRunning,

    #[error("{feature} requires the '{required_feature}' cargo feature")]
    FeatureDisabled { feature: String, required_feature: String },
}

impl SnifferError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            SnifferError::Capture { .. } => true,
            SnifferError::Socket { .. } => true,
            SnifferError::Timeout { .. } => true,
            SnifferError::NoDevices => false,
            SnifferError::Codec { .. } => false,
            SnifferError::DuplicateParser { .. } => false,
            SnifferError::ChannelClosed => false,
            SnifferError::AlreadyRunning => false,
            SnifferError::FeatureDisabled { .. } => false,
        }
    }

    /// Helper constructor for device capture errors.
    pub fn capture_failed(device: impl Into<String>, reason: impl Into<String>) -> Self {
        SnifferError::Capture { device: device.into(), reason: reason.into(), source: None }
    }

    /// Helper constructor for device capture errors with an underlying cause.
    pub fn capture_failed_with_source(
        device: impl Into<String>,
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        SnifferError::Capture {
            device: device.into(),
            reason: reason.into(),
            source: Some(source),
        }
    }

    /// Helper constructor for relay socket errors.
    pub fn socket_error(addr: SocketAddr, source: std::io::Error) -> Self {
        SnifferError::Socket { addr, source }
    }

    /// Helper constructor for wire codec errors.
    pub fn codec_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        SnifferError::Codec { context: context.into(), details: details.into() }
    }

    /// Helper constructor for a feature gate violation.
    pub fn feature_disabled(
        feature: impl Into<String>,
        required_feature: impl Into<String>,
    ) -> Self {
        SnifferError::FeatureDisabled {
            feature: feature.into(),
            required_feature: required_feature.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn loopback(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    }

    #[cfg(test)]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn error_messages_contain_their_context(
                device in "\\w+",
                reason in "[ -~]*",
                context in "\\w+",
                details in "[ -~]*",
                code in 0u16..1024,
                duration_ms in 1u64..60000u64
            ) {
                let capture = SnifferError::capture_failed(device.clone(), reason.clone());
                let msg = capture.to_string();
                prop_assert!(msg.contains(&device));
                prop_assert!(msg.contains(&reason));

                let codec = SnifferError::codec_error(context.clone(), details.clone());
                let msg = codec.to_string();
                prop_assert!(msg.contains(&context));
                prop_assert!(msg.contains(&details));

                let duplicate = SnifferError::DuplicateParser {
                    kind: FrameKind::Event,
                    code,
                };
                prop_assert!(duplicate.to_string().contains(&code.to_string()));

                let timeout = SnifferError::Timeout {
                    duration: Duration::from_millis(duration_ms),
                };
                prop_assert!(!timeout.to_string().is_empty());
            }

            #[test]
            fn socket_errors_preserve_their_source(port in 1u16..u16::MAX, reason in "[ -~]*") {
                let io_err = std::io::Error::other(reason.clone());
                let err = SnifferError::socket_error(super::loopback(port), io_err);

                let source = std::error::Error::source(&err);
                prop_assert!(source.is_some());
                prop_assert_eq!(source.unwrap().to_string(), reason);
            }
        }
    }

    #[test]
    fn error_traits_validation() {
        // Compile-time check: SnifferError must be Send + Sync + 'static
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<SnifferError>();

        let error = SnifferError::capture_failed("eth0", "open failed");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn retryable_classification() {
        assert!(SnifferError::capture_failed("eth0", "read error").is_retryable());
        assert!(
            SnifferError::socket_error(loopback(44444), std::io::Error::other("recv"))
                .is_retryable()
        );
        assert!(!SnifferError::NoDevices.is_retryable());
        assert!(
            !SnifferError::DuplicateParser { kind: FrameKind::Response, code: 35 }
                .is_retryable()
        );
        assert!(!SnifferError::ChannelClosed.is_retryable());
    }
}

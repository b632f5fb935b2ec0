//! Error taxonomy for synchronization runs.

use crate::model::{Relation, ResourceKind};

/// Errors raised while synchronizing a resource.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Network or HTTP failure. Never retried; re-running the sync recovers.
    #[error("Transport error: {message}")]
    Transport {
        /// What went wrong on the wire.
        message: String,
    },

    /// Credentials were rejected. Fatal to the whole run.
    #[error("Authentication failed: {message}")]
    Auth {
        /// Platform-provided reason.
        message: String,
    },

    /// The resource is absent and creation was not allowed.
    #[error("{kind} {alias} does not exist and --can-create was not given")]
    ResourceNotFound {
        /// Kind of the missing resource.
        kind: ResourceKind,
        /// Alias of the missing resource.
        alias: String,
    },

    /// The resource exists but the actor may not edit it.
    #[error("Not allowed to edit {kind} {alias}: {message}")]
    Permission {
        /// Kind of the resource.
        kind: ResourceKind,
        /// Alias of the resource.
        alias: String,
        /// Platform-provided reason.
        message: String,
    },

    /// One relation mutation failed. Logged and skipped.
    #[error("Failed to {action} {member} ({relation}): {source}")]
    SubresourceApply {
        /// Relation that was being reconciled.
        relation: Relation,
        /// The mutation that failed.
        action: &'static str,
        /// Identifier of the member.
        member: String,
        /// Underlying failure.
        source: Box<SyncError>,
    },

    /// The platform answered with a non-ok status.
    #[error("{endpoint} failed: {message}")]
    Remote {
        /// Endpoint that was called.
        endpoint: String,
        /// Platform error code, when reported.
        code: Option<u16>,
        /// Platform error message.
        message: String,
    },

    /// The desired state cannot be expressed as a platform call.
    #[error("Invalid resource: {message}")]
    InvalidResource {
        /// Why the resource is invalid.
        message: String,
    },
}

impl SyncError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn not_found(kind: ResourceKind, alias: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            kind,
            alias: alias.into(),
        }
    }

    pub fn permission(
        kind: ResourceKind,
        alias: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Permission {
            kind,
            alias: alias.into(),
            message: message.into(),
        }
    }

    pub fn remote(endpoint: impl Into<String>, code: Option<u16>, message: impl Into<String>) -> Self {
        Self::Remote {
            endpoint: endpoint.into(),
            code,
            message: message.into(),
        }
    }

    pub fn invalid_resource(message: impl Into<String>) -> Self {
        Self::InvalidResource {
            message: message.into(),
        }
    }

    /// Whether the error must stop the whole batch, not just one resource.
    pub fn is_fatal_to_run(&self) -> bool {
        match self {
            Self::Auth { .. } => true,
            Self::SubresourceApply { source, .. } => source.is_fatal_to_run(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_auth_errors_are_fatal_to_run() {
        assert!(SyncError::auth("bad password").is_fatal_to_run());
        assert!(!SyncError::transport("timeout").is_fatal_to_run());
        assert!(!SyncError::not_found(ResourceKind::Problem, "sumas").is_fatal_to_run());
        assert!(!SyncError::permission(ResourceKind::Contest, "oci", "denied").is_fatal_to_run());
    }

    #[test]
    fn test_wrapped_auth_error_is_fatal() {
        let err = SyncError::SubresourceApply {
            relation: Relation::Admins,
            action: "add",
            member: "bob".to_string(),
            source: Box::new(SyncError::auth("token expired")),
        };
        assert!(err.is_fatal_to_run());
    }

    #[test]
    fn test_not_found_message_names_resource() {
        let err = SyncError::not_found(ResourceKind::Contest, "oci-2024");
        assert_eq!(
            err.to_string(),
            "contest oci-2024 does not exist and --can-create was not given"
        );
    }
}

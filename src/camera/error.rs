use serde::Serialize;
use thiserror::Error;

use crate::providers::ProviderError;

/// Why a camera could not be acquired, classified by what the user has to do
/// about it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    #[error("camera capture unsupported: {reason}")]
    EnvironmentUnsupported { reason: String },

    #[error("camera access denied: {0}")]
    PermissionDenied(String),

    #[error("camera is in use by another application")]
    DeviceBusy,

    #[error("no camera found{}", detail_suffix(.detail))]
    NoCameraFound { detail: Option<String> },

    #[error("no camera satisfies the requested constraints: {constraint}")]
    ConstraintUnsatisfiable { constraint: String },
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

impl AcquisitionError {
    /// Only a missing secure context or camera capability is fatal; the
    /// other kinds can succeed on retry once the user acts.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AcquisitionError::EnvironmentUnsupported { .. })
    }

    pub fn user_message(&self) -> String {
        match self {
            AcquisitionError::EnvironmentUnsupported { .. } => {
                "Camera capture needs a secure (HTTPS or localhost) page in a browser that \
                 supports camera access. Open the link over HTTPS in Chrome or Safari."
                    .to_string()
            }
            AcquisitionError::PermissionDenied(_) => {
                "Camera access is blocked for this site. Set Camera to Allow in the site \
                 settings and reload."
                    .to_string()
            }
            AcquisitionError::DeviceBusy => {
                "The camera is being used by another app or tab. Close it and try again."
                    .to_string()
            }
            AcquisitionError::NoCameraFound { detail } => {
                let mut message = String::from(
                    "No camera could be opened. Check the browser and system camera \
                     permissions and close other apps using the camera.",
                );
                if let Some(detail) = detail {
                    message.push_str(&format!(" Reason: {detail}"));
                }
                message
            }
            AcquisitionError::ConstraintUnsatisfiable { .. } => {
                "The camera rejected every supported configuration. Free the camera and \
                 try again."
                    .to_string()
            }
        }
    }
}

impl From<ProviderError> for AcquisitionError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotAllowed(reason) | ProviderError::Security(reason) => {
                AcquisitionError::PermissionDenied(reason)
            }
            ProviderError::NotReadable => AcquisitionError::DeviceBusy,
            ProviderError::Overconstrained { constraint } => {
                AcquisitionError::ConstraintUnsatisfiable { constraint }
            }
            ProviderError::Unsupported => AcquisitionError::EnvironmentUnsupported {
                reason: "camera access unsupported".to_string(),
            },
            ProviderError::NotFound => AcquisitionError::NoCameraFound { detail: None },
            ProviderError::Other(reason) => AcquisitionError::NoCameraFound {
                detail: Some(reason),
            },
        }
    }
}

/// User-facing outcome of a failed negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub kind: &'static str,
    pub message: String,
    pub fatal: bool,
    #[serde(skip)]
    pub error: AcquisitionError,
}

impl From<AcquisitionError> for Diagnostic {
    fn from(error: AcquisitionError) -> Self {
        let kind = match &error {
            AcquisitionError::EnvironmentUnsupported { .. } => "environmentUnsupported",
            AcquisitionError::PermissionDenied(_) => "permissionDenied",
            AcquisitionError::DeviceBusy => "deviceBusy",
            AcquisitionError::NoCameraFound { .. } => "noCameraFound",
            AcquisitionError::ConstraintUnsatisfiable { .. } => "constraintUnsatisfiable",
        };
        Self {
            kind,
            message: error.user_message(),
            fatal: error.is_fatal(),
            error,
        }
    }
}

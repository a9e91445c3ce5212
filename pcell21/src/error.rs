//!
//! # Layout Result and Error Types
//!

// Local Imports
pub use crate::utils::{self, ErrorContext};

/// # [LayoutError] Result Type
pub type LayoutResult<T> = Result<T, LayoutError>;

///
/// # Layout Error Enumeration
///
pub enum LayoutError {
    /// Port name already present on a [crate::Cell]
    DuplicatePort(String),
    /// Named cell not found in an imported file
    ImportNotFound { cell: String, file: String },
    /// Malformed or out-of-bounds port descriptor
    PortDescriptorMismatch(String),
    /// Requested rename conflicts with an existing cell name
    RenameCollision(String),
    /// A path segment is too short for the bends at its two ends
    BendRadiusInfeasible {
        segment: usize,
        required: f64,
        available: f64,
    },
    /// Link endpoint not found, named `instance.port`
    UnknownPort(String),
    /// Link endpoint already used by an earlier link, named `instance.port`
    PortAlreadyLinked(String),
    /// Routing of a link failed
    RoutingFailed {
        link: String,
        source: Box<LayoutError>,
    },
    /// Cell found to (transitively) instantiate itself
    CyclicReference(String),
    /// Placement names an undeclared instance
    UnknownInstance(String),
    /// Linked ports of differing types
    IncompatiblePorts { from: String, to: String },
    /// Invalid path-template parameters or waypoints
    InvalidTrace(String),
    /// Two distinct cells of the same name in a library
    DuplicateCellName(String),
    /// Error Exporting to Foreign Format
    Export {
        message: String,
        stack: Vec<ErrorContext>,
    },
    /// Error Importing from Foreign Format
    Import {
        message: String,
        stack: Vec<ErrorContext>,
    },
    /// Boxed External Errors
    Boxed(Box<dyn std::error::Error + Send + Sync>),
    /// Uncategorized Error, with String Message
    Str(String),
    /// # [utils::Ptr] Locking
    /// Caused by trouble with a [utils::Ptr]: either deadlock, or panic while holding a lock.
    /// Generally caused by a [std::sync::PoisonError], which is not forwardable due to lifetime constraints.
    PtrLock,
}
impl LayoutError {
    /// Create a [LayoutError::Str] from anything String-convertible
    pub fn msg(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }
    /// Create an error-variant [Result] of our [LayoutError::Str] variant from anything String-convertible
    pub fn fail<T>(s: impl Into<String>) -> Result<T, Self> {
        Err(Self::msg(s))
    }
}
impl std::fmt::Debug for LayoutError {
    /// Display a [LayoutError]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LayoutError::DuplicatePort(name) => write!(f, "Duplicate Port: {}", name),
            LayoutError::ImportNotFound { cell, file } => {
                write!(f, "Cell {} not found in {}", cell, file)
            }
            LayoutError::PortDescriptorMismatch(msg) => {
                write!(f, "Port Descriptor Mismatch: {}", msg)
            }
            LayoutError::RenameCollision(name) => write!(f, "Rename Collision: {}", name),
            LayoutError::BendRadiusInfeasible {
                segment,
                required,
                available,
            } => write!(
                f,
                "Bend Radius Infeasible: segment {} requires length {}, has {}",
                segment, required, available
            ),
            LayoutError::UnknownPort(name) => write!(f, "Unknown Port: {}", name),
            LayoutError::PortAlreadyLinked(name) => write!(f, "Port Already Linked: {}", name),
            LayoutError::RoutingFailed { link, source } => {
                write!(f, "Routing Failed for link {}: \n - {:?}", link, source)
            }
            LayoutError::CyclicReference(name) => write!(f, "Cyclic Reference: {}", name),
            LayoutError::UnknownInstance(name) => write!(f, "Unknown Instance: {}", name),
            LayoutError::IncompatiblePorts { from, to } => {
                write!(f, "Incompatible Ports: {} and {}", from, to)
            }
            LayoutError::InvalidTrace(msg) => write!(f, "Invalid Trace: {}", msg),
            LayoutError::DuplicateCellName(name) => write!(f, "Duplicate Cell Name: {}", name),
            LayoutError::Export { message, stack } => {
                write!(f, "Export Error: \n - {} \n - {:?}", message, stack)
            }
            LayoutError::Import { message, stack } => {
                write!(f, "Import Error: \n - {} \n - {:?}", message, stack)
            }
            LayoutError::Boxed(err) => err.fmt(f),
            LayoutError::Str(err) => err.fmt(f),
            LayoutError::PtrLock => write!(f, "[std::sync::PoisonError]"),
        }
    }
}
impl std::fmt::Display for LayoutError {
    /// Display a [LayoutError]
    /// Delegates to the [Debug] implementation
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Boxed(e) => Some(&**e),
            Self::RoutingFailed { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

impl From<String> for LayoutError {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
impl From<&str> for LayoutError {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}
impl From<std::io::Error> for LayoutError {
    fn from(e: std::io::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<std::num::ParseFloatError> for LayoutError {
    fn from(e: std::num::ParseFloatError) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<utils::ser::Error> for LayoutError {
    fn from(e: utils::ser::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
/// [gds21::GdsError] is not [Send], so it is carried along in string form.
impl From<gds21::GdsError> for LayoutError {
    fn from(e: gds21::GdsError) -> Self {
        Self::Str(format!("{:?}", e))
    }
}
impl<T> From<std::sync::PoisonError<T>> for LayoutError {
    fn from(_e: std::sync::PoisonError<T>) -> Self {
        Self::PtrLock
    }
}
impl<T: std::error::Error + Send + Sync + 'static> From<Box<T>> for LayoutError {
    fn from(e: Box<T>) -> Self {
        Self::Boxed(e)
    }
}

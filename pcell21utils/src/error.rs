//!
//! # Error-Helper Utilities
//!
//! Shared by the tree-walkers (GDS import and export, port-file parsing),
//! each of which keeps a stack of [ErrorContext]s to report where it failed.
//!
//! ```rust
//! use pcell21utils::error::{ErrorContext, ErrorHelper, Unwrapper};
//!
//! /// A walker which reports its context-stack upon failure
//! struct Walker {
//!     ctx: Vec<ErrorContext>,
//! }
//! impl ErrorHelper for Walker {
//!     type Error = String;
//!     fn err(&self, msg: impl Into<String>) -> Self::Error {
//!         format!("{} ({:?})", msg.into(), self.ctx)
//!     }
//! }
//! impl Walker {
//!     fn walk(&self, cells: &[&str]) -> Result<usize, String> {
//!         let first = cells.first().unwrapper(self, "No cells")?;
//!         self.assert(!first.is_empty(), "Empty cell name")?;
//!         "42".parse::<usize>().unwrapper(self, "Bad number")
//!     }
//! }
//! let w = Walker { ctx: vec![ErrorContext::Cell("top".into())] };
//! assert_eq!(w.walk(&["top"]), Ok(42));
//! assert!(w.walk(&[]).is_err());
//! ```
//!

///
/// # Error Context
///
/// Where in a hierarchy-walk an error occurred.
/// Walkers push one of these on entering each level, and pop it on the way out.
///
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorContext {
    Library(String),
    Cell(String),
    Instance(String),
    /// An imported file
    File(String),
    /// A line of a text file, counted from one
    Line(usize),
    Geometry,
    Units,
}

///
/// # ErrorHelper
///
/// Implementers create their own `Error` in `err`, generally decorated with whatever
/// state they carry (e.g. an [ErrorContext] stack).
/// The remaining methods are provided.
///
pub trait ErrorHelper {
    type Error;

    /// Create and return a [Self::Error] value.
    fn err(&self, msg: impl Into<String>) -> Self::Error;
    /// Return failure
    fn fail<T>(&self, msg: impl Into<String>) -> Result<T, Self::Error> {
        Err(self.err(msg))
    }
    /// Unwrap the [Option] `opt` if it is [Some], and return our error if not.
    fn unwrap<T>(&self, opt: Option<T>, msg: impl Into<String>) -> Result<T, Self::Error> {
        match opt {
            Some(val) => Ok(val),
            None => self.fail(msg),
        }
    }
    /// Unwrap the [Result] `res`, replacing any error with our own.
    fn ok<T, E>(&self, res: Result<T, E>, msg: impl Into<String>) -> Result<T, Self::Error> {
        match res {
            Ok(val) => Ok(val),
            Err(_) => self.fail(msg),
        }
    }
    /// Assert a boolean condition. Returns through `self.fail` if it is not satisfied.
    fn assert(&self, b: bool, msg: impl Into<String>) -> Result<(), Self::Error> {
        match b {
            true => Ok(()),
            false => self.fail(msg),
        }
    }
}

///
/// # Unwrapper
///
/// Post-fix form of [ErrorHelper::unwrap] and [ErrorHelper::ok],
/// implemented for the standard [Option] and [Result]:
///
/// ```text
/// let cell = self.cells.get(name).unwrapper(self, "Cell not found")?;
/// ```
///
pub trait Unwrapper {
    type Ok;
    fn unwrapper<H>(self, helper: &H, msg: impl Into<String>) -> Result<Self::Ok, H::Error>
    where
        H: ErrorHelper;
}
impl<T> Unwrapper for Option<T> {
    type Ok = T;
    fn unwrapper<H>(self, helper: &H, msg: impl Into<String>) -> Result<T, H::Error>
    where
        H: ErrorHelper,
    {
        helper.unwrap(self, msg)
    }
}
impl<T, E> Unwrapper for Result<T, E> {
    type Ok = T;
    fn unwrapper<H>(self, helper: &H, msg: impl Into<String>) -> Result<T, H::Error>
    where
        H: ErrorHelper,
    {
        helper.ok(self, msg)
    }
}

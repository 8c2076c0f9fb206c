use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::ops::Deref;

pub type StrataResult<T> = Result<T, StrataError>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidConfig,
    InvalidParameter,
    Engine,
    Evaluation,
    Io,
    Parse,
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrString(Cow<'static, str>);

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T: Into<Cow<'static, str>>> From<T> for ErrString {
    fn from(v: T) -> Self {
        Self(v.into())
    }
}

#[derive(Debug)]
pub enum StrataError {
    InvalidConfig {
        message: ErrString,
    },
    InvalidParameter {
        message: ErrString,
    },
    Engine {
        message: ErrString,
    },
    Evaluation {
        message: ErrString,
    },
    Io {
        source: std::io::Error,
    },
    Parse {
        message: ErrString,
    },
    Context {
        context: ErrorContext,
        source: Box<StrataError>,
    },
}

impl StrataError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            Self::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            Self::Engine { .. } => ErrorCode::Engine,
            Self::Evaluation { .. } => ErrorCode::Evaluation,
            Self::Io { .. } => ErrorCode::Io,
            Self::Parse { .. } => ErrorCode::Parse,
            Self::Context { .. } => ErrorCode::Context,
        }
    }

    pub fn with_context(self, msg: impl Into<String>) -> Self {
        StrataError::Context {
            context: ErrorContext::new(msg),
            source: Box::new(self),
        }
    }
}

impl Display for StrataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { message } => write!(f, "Invalid configuration: {}", message),
            Self::InvalidParameter { message } => write!(f, "Invalid parameter: {}", message),
            Self::Engine { message } => write!(f, "Engine error: {}", message),
            Self::Evaluation { message } => write!(f, "Evaluation error: {}", message),
            Self::Io { source } => write!(f, "I/O error: {}", source),
            Self::Parse { message } => write!(f, "Parse error: {}", message),
            Self::Context {
                context, source, ..
            } => write!(f, "{}\nCaused by: {}", context, source),
        }
    }
}

impl std::error::Error for StrataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source } => Some(source),
            Self::Context { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StrataError {
    fn from(source: std::io::Error) -> Self {
        StrataError::Io { source }
    }
}

#[derive(Debug)]
pub struct ErrorContext {
    message: String,
}

impl ErrorContext {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl Display for ErrorContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ErrorContext {}

// Ergonomic Result extensions (context)
pub trait ResultExt<T> {
    fn context(self, msg: impl Into<String>) -> StrataResult<T>;
    fn with_context<F: FnOnce() -> String>(self, f: F) -> StrataResult<T>;
}

impl<T, E: Into<StrataError>> ResultExt<T> for Result<T, E> {
    fn context(self, msg: impl Into<String>) -> StrataResult<T> {
        self.map_err(|e| e.into().with_context(msg))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> StrataResult<T> {
        self.map_err(|e| e.into().with_context(f()))
    }
}

// Macros: err, bail, ensure
#[doc(hidden)]
pub mod __private {
    #[inline]
    #[cold]
    #[must_use]
    pub fn must_use<E>(e: E) -> E {
        e
    }
}

#[macro_export]
macro_rules! strata_err {
    (InvalidConfig: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::StrataError::InvalidConfig { message: format!($fmt, $($arg),*).into() })
    };
    (InvalidParameter: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::StrataError::InvalidParameter { message: format!($fmt, $($arg),*).into() })
    };
    (Engine: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::StrataError::Engine { message: format!($fmt, $($arg),*).into() })
    };
    (Evaluation: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::StrataError::Evaluation { message: format!($fmt, $($arg),*).into() })
    };
    (Parse: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::StrataError::Parse { message: format!($fmt, $($arg),*).into() })
    };
}

#[macro_export]
macro_rules! strata_bail {
    ($($tt:tt)+) => { return Err($crate::strata_err!($($tt)+)) };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($tt:tt)+) => {
        if !$cond { $crate::strata_bail!($($tt)+); }
    };
}

// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Error type shared by the dump and load paths.
//!
//! Error constructors are reached from every reader and writer call, so they
//! are marked `#[cold]` to keep the successful paths tight. Always build errors
//! through the constructor functions below rather than the enum variants.

use std::borrow::Cow;

use thiserror::Error;

/// Set `MARSHAL_PANIC_ON_ERROR=1` at compile time to panic where an error is created.
pub const PANIC_ON_ERROR: bool = option_env!("MARSHAL_PANIC_ON_ERROR").is_some();

#[inline(always)]
pub const fn should_panic_on_error() -> bool {
    PANIC_ON_ERROR
}

/// Error raised while dumping or loading a value graph.
///
/// # IMPORTANT: Always Use Static Constructor Functions
///
/// ```rust
/// use marshal_core::error::Error;
///
/// let err = Error::type_error("instance of IO needed");
/// let err = Error::bad_link("dump format error (unlinked)");
/// ```
///
/// ## Debug Mode: MARSHAL_PANIC_ON_ERROR
///
/// ```bash
/// RUST_BACKTRACE=1 MARSHAL_PANIC_ON_ERROR=1 cargo test
/// ```
///
/// With the flag set, every constructor panics with its message so the stack
/// trace points at the exact place the error was raised.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Major version mismatch, or any version mismatch in strict mode.
    #[error("{0}")]
    FormatVersion(Cow<'static, str>),

    /// The input ended before the value was complete.
    #[error("marshal data too short")]
    Truncated,

    /// An unknown type tag, or a tag that is illegal where it appeared.
    #[error("{0}")]
    MalformedTag(Cow<'static, str>),

    /// A varint whose byte count does not fit the codec word.
    #[error("{0}")]
    MalformedInteger(Cow<'static, str>),

    /// A back-reference to an ordinal that is unassigned or still pending.
    #[error("{0}")]
    BadLink(Cow<'static, str>),

    /// A class or module name that does not resolve.
    #[error("undefined class/module {0}")]
    UndefinedClass(Cow<'static, str>),

    /// A value that has the wrong kind for the place it was used.
    #[error("{0}")]
    TypeError(Cow<'static, str>),

    /// Structurally invalid input that is not covered by a narrower variant.
    #[error("{0}")]
    InvalidData(Cow<'static, str>),

    /// A value that cannot be represented in the stream.
    #[error("{0}")]
    Unsupported(Cow<'static, str>),

    /// The nesting depth limit was reached.
    #[error("{0}")]
    DepthExceed(Cow<'static, str>),

    /// Loaded struct members differ from the local struct definition.
    #[error("{0}")]
    StructMismatch(Cow<'static, str>),

    /// A container or instance variable table changed while it was being walked.
    #[error("{0}")]
    ConcurrentMutation(Cow<'static, str>),

    /// A hook called back into the engine that is currently running it.
    #[error("{0}")]
    Reentered(Cow<'static, str>),

    /// The byte source or sink failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A user hook failed with its own error.
    #[error(transparent)]
    Hook(anyhow::Error),
}

macro_rules! message_constructor {
    ($(#[$meta:meta])* $name:ident => $variant:ident) => {
        $(#[$meta])*
        #[inline(always)]
        #[cold]
        #[track_caller]
        pub fn $name<S: Into<Cow<'static, str>>>(s: S) -> Self {
            let err = Error::$variant(s.into());
            if PANIC_ON_ERROR {
                panic!("MARSHAL_PANIC_ON_ERROR: {}", err);
            }
            err
        }
    };
}

impl Error {
    message_constructor!(
        /// Creates a new [`Error::FormatVersion`].
        format_version => FormatVersion
    );
    message_constructor!(
        /// Creates a new [`Error::MalformedTag`].
        malformed_tag => MalformedTag
    );
    message_constructor!(
        /// Creates a new [`Error::MalformedInteger`].
        malformed_integer => MalformedInteger
    );
    message_constructor!(
        /// Creates a new [`Error::BadLink`].
        bad_link => BadLink
    );
    message_constructor!(
        /// Creates a new [`Error::UndefinedClass`] for the unresolved path.
        undefined_class => UndefinedClass
    );
    message_constructor!(
        /// Creates a new [`Error::TypeError`].
        ///
        /// # Example
        /// ```
        /// use marshal_core::error::Error;
        ///
        /// let err = Error::type_error(format!("{} is not enc_capable", "1"));
        /// assert_eq!(err.to_string(), "1 is not enc_capable");
        /// ```
        type_error => TypeError
    );
    message_constructor!(
        /// Creates a new [`Error::InvalidData`].
        invalid_data => InvalidData
    );
    message_constructor!(
        /// Creates a new [`Error::Unsupported`].
        unsupported => Unsupported
    );
    message_constructor!(
        /// Creates a new [`Error::DepthExceed`].
        depth_exceed => DepthExceed
    );
    message_constructor!(
        /// Creates a new [`Error::StructMismatch`].
        struct_mismatch => StructMismatch
    );
    message_constructor!(
        /// Creates a new [`Error::ConcurrentMutation`].
        concurrent_mutation => ConcurrentMutation
    );
    message_constructor!(
        /// Creates a new [`Error::Reentered`].
        reentered => Reentered
    );

    /// Creates a new [`Error::Truncated`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn truncated() -> Self {
        let err = Error::Truncated;
        if PANIC_ON_ERROR {
            panic!("MARSHAL_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Wraps an error raised by a user hook.
    ///
    /// # Example
    /// ```
    /// use marshal_core::error::Error;
    ///
    /// let err = Error::hook(anyhow::anyhow!("backing file is gone"));
    /// assert_eq!(err.to_string(), "backing file is gone");
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn hook<E: Into<anyhow::Error>>(err: E) -> Self {
        let err = Error::Hook(err.into());
        if PANIC_ON_ERROR {
            panic!("MARSHAL_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Maps an io failure from the byte source, treating early EOF as truncation.
    #[inline(never)]
    pub(crate) fn from_read(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::truncated()
        } else {
            Error::Io(err)
        }
    }
}

/// Ensures a condition is true; otherwise returns an [`enum@Error`].
///
/// # Examples
/// ```
/// use marshal_core::ensure;
/// use marshal_core::error::Error;
///
/// fn check_len(n: i64) -> Result<(), Error> {
///     ensure!(n >= 0, "negative array size (or size too big)");
///     ensure!(n < 1 << 20, Error::unsupported(format!("{} elements", n)));
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:literal) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data($msg));
        }
    };
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)));
        }
    };
}

/// Returns early with an [`Error::InvalidData`].
///
/// # Examples
/// ```
/// use marshal_core::bail;
/// use marshal_core::error::Error;
///
/// fn reject(tag: u8) -> Result<(), Error> {
///     bail!("dump format error (0x{:x})", tag);
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($crate::error::Error::invalid_data($err))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)))
    };
}

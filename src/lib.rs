/*
 * Copyright 2023 sukawasatoru
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! SQLite bindings where every blob and text binding states who owns the memory.
//!
//! [Statement::bind_blob] and [Statement::bind_text] make sqlite copy the value
//! ([Ownership::CopyNow]); the `bind_static_*` variants only accept `'static` data and let sqlite
//! read it in place ([Ownership::Borrow]). The raw destructor sentinels never leave this crate.

mod connection;
mod destructor;
mod error;
mod ffi;
mod statement;

pub use connection::{sqlite_version, Connection};
pub use destructor::Ownership;
pub use error::{Error, Result};
pub use statement::{Statement, Step, ValueType};

/// Project version number for squeal (`major.minor`).
///
/// Kept as a float for packaging tools, so minor versions that differ only in trailing zeros
/// (`0.1` and `0.10`) read back the same. Use [VERSION_STRING] to tell them apart.
pub const VERSION_NUMBER: f64 = 0.1;

/// Project version string for squeal.
pub const VERSION_STRING: &[u8] =
    concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION")).as_bytes();

/// Installs a `tracing_subscriber::fmt` subscriber unless the process already has one.
///
/// squeal never calls this itself; applications without their own subscriber may.
#[cfg(feature = "tracing-subscriber")]
pub fn init_tracing() {
    tracing_subscriber::fmt::try_init().ok();
}

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

use crate::ffi::{sqlite3, sqlite3_errmsg, sqlite3_errstr};
use std::ffi::{c_int, CStr, NulError};
use std::path::PathBuf;
use std::str::Utf8Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("sqlite error {code}: {message}")]
    Sqlite { code: c_int, message: String },

    #[error("string contains an interior nul byte")]
    Nul(#[from] NulError),

    #[error("text column is not valid UTF-8")]
    Utf8(#[from] Utf8Error),

    #[error("path is not valid UTF-8: {0:?}")]
    InvalidPath(PathBuf),

    #[error("index out of range: {0}")]
    OutOfRange(usize),
}

impl Error {
    /// Builds an error from the connection's last message.
    ///
    /// `db` may be null, in which case the generic text for `code` is used.
    pub(crate) unsafe fn from_db(db: *mut sqlite3, code: c_int) -> Self {
        let message = if db.is_null() {
            sqlite3_errstr(code)
        } else {
            sqlite3_errmsg(db)
        };

        let message = if message.is_null() {
            String::new()
        } else {
            CStr::from_ptr(message).to_string_lossy().into_owned()
        };

        Error::Sqlite { code, message }
    }

    /// The primary sqlite result code, if this error came from the engine.
    pub fn sqlite_code(&self) -> Option<c_int> {
        match self {
            Error::Sqlite { code, .. } => Some(*code),
            _ => None,
        }
    }
}

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

use crate::error::{Error, Result};
use crate::ffi::{
    sqlite3, sqlite3_changes, sqlite3_close, sqlite3_exec, sqlite3_last_insert_rowid,
    sqlite3_libversion, sqlite3_open_v2, sqlite3_prepare_v2, sqlite3_stmt, SQLITE_MISUSE,
    SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_READWRITE,
};
use crate::statement::Statement;
use std::ffi::{c_char, c_int, CStr, CString};
use std::path::Path;
use std::ptr::{null, null_mut};
use tracing::{debug, info, warn};

/// An open database handle.
pub struct Connection {
    db: *mut sqlite3,
}

impl Connection {
    /// Opens (or creates) the database file at `path`.
    #[tracing::instrument(skip_all)]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "open");

        let filename = path_to_cstring(path)?;
        let flags = (SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE) as c_int;

        let mut db: *mut sqlite3 = null_mut();
        unsafe {
            let ret = sqlite3_open_v2(filename.as_ptr(), &mut db, flags, null());
            if ret != SQLITE_OK as c_int {
                // sqlite3_open_v2 hands out a handle for the error message even on failure.
                let err = Error::from_db(db, ret);
                warn!(%ret, ?err, "open failed");
                sqlite3_close(db);
                return Err(err);
            }
        }

        Ok(Self { db })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Runs one or more `;`-separated statements without parameters.
    #[tracing::instrument(skip_all)]
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        debug!(%sql);

        let sql = CString::new(sql)?;
        unsafe {
            let ret = sqlite3_exec(self.db, sql.as_ptr(), None, null_mut(), null_mut());
            self.check(ret)
        }
    }

    /// Compiles a single statement.
    ///
    /// Anything other than whitespace after the first statement is rejected; use
    /// [Connection::execute_batch] for scripts.
    #[tracing::instrument(skip_all)]
    pub fn prepare(&self, sql: &str) -> Result<Statement<'_>> {
        debug!(%sql);

        let sql = CString::new(sql)?;
        let mut stmt: *mut sqlite3_stmt = null_mut();
        let mut tail: *const c_char = null();
        unsafe {
            let ret = sqlite3_prepare_v2(self.db, sql.as_ptr(), -1, &mut stmt, &mut tail);
            self.check(ret)?;
        }

        if stmt.is_null() {
            // whitespace or comment only.
            return Err(Error::Sqlite {
                code: SQLITE_MISUSE as c_int,
                message: "no statement to prepare".into(),
            });
        }

        // finalized on drop if the tail is rejected.
        let statement = Statement::new(self, stmt);

        let consumed = if tail.is_null() {
            sql.as_bytes().len()
        } else {
            tail as usize - sql.as_ptr() as usize
        };
        let rest = &sql.as_bytes()[consumed..];
        if !rest.iter().all(u8::is_ascii_whitespace) {
            return Err(Error::Sqlite {
                code: SQLITE_MISUSE as c_int,
                message: format!(
                    "only one statement can be prepared, found trailing: {}",
                    String::from_utf8_lossy(rest)
                ),
            });
        }

        Ok(statement)
    }

    pub fn last_insert_rowid(&self) -> i64 {
        unsafe { sqlite3_last_insert_rowid(self.db) }
    }

    /// Rows modified by the most recent INSERT, UPDATE or DELETE.
    pub fn changes(&self) -> usize {
        unsafe { sqlite3_changes(self.db) as usize }
    }

    pub(crate) fn handle(&self) -> *mut sqlite3 {
        self.db
    }

    fn check(&self, ret: c_int) -> Result<()> {
        if ret == SQLITE_OK as c_int {
            Ok(())
        } else {
            let err = unsafe { Error::from_db(self.db, ret) };
            warn!(%ret, ?err);
            Err(err)
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        debug!("close");

        let ret = unsafe { sqlite3_close(self.db) };
        if ret != SQLITE_OK as c_int {
            warn!(%ret, "failed to close the connection");
        }
    }
}

/// The version of the linked sqlite library, e.g. `3.45.1`.
pub fn sqlite_version() -> &'static str {
    unsafe { CStr::from_ptr(sqlite3_libversion()) }
        .to_str()
        .unwrap_or_default()
}

#[cfg(unix)]
fn path_to_cstring(path: &Path) -> Result<CString> {
    use std::os::unix::ffi::OsStrExt;

    Ok(CString::new(path.as_os_str().as_bytes())?)
}

#[cfg(not(unix))]
fn path_to_cstring(path: &Path) -> Result<CString> {
    match path.to_str() {
        Some(path) => Ok(CString::new(path)?),
        None => Err(Error::InvalidPath(path.to_path_buf())),
    }
}

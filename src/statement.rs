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

use crate::connection::Connection;
use crate::destructor::Ownership;
use crate::error::{Error, Result};
use crate::ffi::{
    sqlite3_bind_blob64, sqlite3_bind_double, sqlite3_bind_int64, sqlite3_bind_null,
    sqlite3_bind_parameter_count, sqlite3_bind_parameter_index, sqlite3_bind_text64,
    sqlite3_clear_bindings, sqlite3_column_blob, sqlite3_column_bytes, sqlite3_column_count,
    sqlite3_column_double, sqlite3_column_int64, sqlite3_column_text, sqlite3_column_type,
    sqlite3_finalize, sqlite3_reset, sqlite3_step, sqlite3_stmt, SQLITE_BLOB,
    SQLITE_DONE, SQLITE_FLOAT, SQLITE_INTEGER, SQLITE_NULL, SQLITE_OK, SQLITE_ROW, SQLITE_TEXT,
    SQLITE_UTF8,
};
use std::ffi::{c_char, c_int, c_uchar, c_void, CString};
use std::fmt::{Display, Formatter};
use std::slice;
use tracing::{debug, warn};

/// A prepared statement. Parameter indexes start at 1, column indexes at 0.
pub struct Statement<'conn> {
    conn: &'conn Connection,
    stmt: *mut sqlite3_stmt,
}

/// Outcome of [Statement::step].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    Row,
    Done,
}

/// https://www.sqlite.org/c3ref/c_blob.html
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueType {
    Integer,
    Float,
    Text,
    Blob,
    Null,
}

impl TryFrom<c_int> for ValueType {
    type Error = c_int;

    fn try_from(value: c_int) -> std::result::Result<Self, Self::Error> {
        match value as u32 {
            SQLITE_INTEGER => Ok(Self::Integer),
            SQLITE_FLOAT => Ok(Self::Float),
            SQLITE_TEXT => Ok(Self::Text),
            SQLITE_BLOB => Ok(Self::Blob),
            SQLITE_NULL => Ok(Self::Null),
            _ => Err(value),
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let data = match self {
            ValueType::Integer => "SQLITE_INTEGER",
            ValueType::Float => "SQLITE_FLOAT",
            ValueType::Text => "SQLITE_TEXT",
            ValueType::Blob => "SQLITE_BLOB",
            ValueType::Null => "SQLITE_NULL",
        };
        f.write_str(data)
    }
}

impl<'conn> Statement<'conn> {
    pub(crate) fn new(conn: &'conn Connection, stmt: *mut sqlite3_stmt) -> Self {
        Self { conn, stmt }
    }

    /// Binds a copy of `value`. The caller may drop or mutate the buffer right after this returns.
    pub fn bind_blob(&mut self, index: usize, value: &[u8]) -> Result<()> {
        unsafe { self.bind_blob_with(index, value, Ownership::CopyNow) }
    }

    /// Binds `value` without copying it.
    pub fn bind_static_blob(&mut self, index: usize, value: &'static [u8]) -> Result<()> {
        unsafe { self.bind_blob_with(index, value, Ownership::Borrow) }
    }

    /// Binds a copy of `value` as UTF-8 text.
    pub fn bind_text(&mut self, index: usize, value: &str) -> Result<()> {
        unsafe { self.bind_text_with(index, value, Ownership::CopyNow) }
    }

    /// Binds `value` as UTF-8 text without copying it.
    pub fn bind_static_text(&mut self, index: usize, value: &'static str) -> Result<()> {
        unsafe { self.bind_text_with(index, value, Ownership::Borrow) }
    }

    pub fn bind_i64(&mut self, index: usize, value: i64) -> Result<()> {
        let index = parameter(index)?;
        let ret = unsafe { sqlite3_bind_int64(self.stmt, index, value) };
        self.check(ret)
    }

    pub fn bind_f64(&mut self, index: usize, value: f64) -> Result<()> {
        let index = parameter(index)?;
        let ret = unsafe { sqlite3_bind_double(self.stmt, index, value) };
        self.check(ret)
    }

    pub fn bind_null(&mut self, index: usize) -> Result<()> {
        let index = parameter(index)?;
        let ret = unsafe { sqlite3_bind_null(self.stmt, index) };
        self.check(ret)
    }

    pub fn parameter_count(&self) -> usize {
        unsafe { sqlite3_bind_parameter_count(self.stmt) as usize }
    }

    /// Index of a named parameter such as `:name`, `@name` or `$name`.
    pub fn parameter_index(&self, name: &str) -> Result<Option<usize>> {
        let name = CString::new(name)?;
        let index = unsafe { sqlite3_bind_parameter_index(self.stmt, name.as_ptr()) };
        Ok(if index == 0 {
            None
        } else {
            Some(index as usize)
        })
    }

    /// # Safety
    ///
    /// With [Ownership::Borrow] the caller guarantees `value` stays valid and unchanged until the
    /// binding is replaced, cleared or the statement is finalized.
    unsafe fn bind_blob_with(
        &mut self,
        index: usize,
        value: &[u8],
        ownership: Ownership,
    ) -> Result<()> {
        debug!(%index, len = value.len(), %ownership, "bind blob");

        let index = parameter(index)?;

        let ret = sqlite3_bind_blob64(
            self.stmt,
            index,
            value.as_ptr().cast::<c_void>(),
            value.len() as u64,
            ownership.destructor(),
        );
        self.check(ret)
    }

    /// # Safety
    ///
    /// Same contract as [Statement::bind_blob_with].
    unsafe fn bind_text_with(
        &mut self,
        index: usize,
        value: &str,
        ownership: Ownership,
    ) -> Result<()> {
        debug!(%index, len = value.len(), %ownership, "bind text");

        let index = parameter(index)?;

        let ret = sqlite3_bind_text64(
            self.stmt,
            index,
            value.as_ptr().cast::<c_char>(),
            value.len() as u64,
            ownership.destructor(),
            SQLITE_UTF8 as c_uchar,
        );
        self.check(ret)
    }

    pub fn step(&mut self) -> Result<Step> {
        let ret = unsafe { sqlite3_step(self.stmt) };
        match ret as u32 {
            SQLITE_ROW => Ok(Step::Row),
            SQLITE_DONE => Ok(Step::Done),
            _ => Err(self.error(ret)),
        }
    }

    /// Rewinds the statement. Bindings are kept.
    pub fn reset(&mut self) -> Result<()> {
        let ret = unsafe { sqlite3_reset(self.stmt) };
        self.check(ret)
    }

    pub fn clear_bindings(&mut self) -> Result<()> {
        let ret = unsafe { sqlite3_clear_bindings(self.stmt) };
        self.check(ret)
    }

    pub fn column_count(&self) -> usize {
        unsafe { sqlite3_column_count(self.stmt) as usize }
    }

    pub fn column_type(&self, index: usize) -> Result<ValueType> {
        let index = self.column_index(index)?;
        let value = unsafe { sqlite3_column_type(self.stmt, index) };
        ValueType::try_from(value).map_err(|code| Error::Sqlite {
            code,
            message: format!("unknown column type {}", code),
        })
    }

    pub fn column_i64(&self, index: usize) -> Result<i64> {
        let index = self.column_index(index)?;
        Ok(unsafe { sqlite3_column_int64(self.stmt, index) })
    }

    pub fn column_f64(&self, index: usize) -> Result<f64> {
        let index = self.column_index(index)?;
        Ok(unsafe { sqlite3_column_double(self.stmt, index) })
    }

    /// The column as bytes, valid until the next [Statement::step] or [Statement::reset].
    pub fn column_blob(&self, index: usize) -> Result<&[u8]> {
        let index = self.column_index(index)?;
        unsafe {
            // pointer first, then length. https://www.sqlite.org/c3ref/column_blob.html
            let ptr = sqlite3_column_blob(self.stmt, index);
            let len = sqlite3_column_bytes(self.stmt, index);
            if ptr.is_null() {
                return Ok(&[]);
            }
            Ok(slice::from_raw_parts(ptr.cast::<u8>(), len as usize))
        }
    }

    /// The column as UTF-8 text, valid until the next [Statement::step] or [Statement::reset].
    pub fn column_text(&self, index: usize) -> Result<&str> {
        let index = self.column_index(index)?;
        let bytes = unsafe {
            let ptr = sqlite3_column_text(self.stmt, index);
            let len = sqlite3_column_bytes(self.stmt, index);
            if ptr.is_null() {
                return Ok("");
            }
            slice::from_raw_parts(ptr, len as usize)
        };
        Ok(std::str::from_utf8(bytes)?)
    }

    fn column_index(&self, index: usize) -> Result<c_int> {
        if index < self.column_count() {
            Ok(index as c_int)
        } else {
            Err(Error::OutOfRange(index))
        }
    }

    fn check(&self, ret: c_int) -> Result<()> {
        if ret == SQLITE_OK as c_int {
            Ok(())
        } else {
            Err(self.error(ret))
        }
    }

    fn error(&self, ret: c_int) -> Error {
        let err = unsafe { Error::from_db(self.conn.handle(), ret) };
        warn!(%ret, ?err);
        err
    }
}

/// Parameter indexes above `c_int::MAX` can never name a parameter.
fn parameter(index: usize) -> Result<c_int> {
    c_int::try_from(index).map_err(|_| Error::OutOfRange(index))
}

impl Drop for Statement<'_> {
    fn drop(&mut self) {
        unsafe {
            sqlite3_finalize(self.stmt);
        }
    }
}

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

//! Memory ownership policy for blob/text bindings.
//!
//! sqlite uses some magic function pointers to represent pre-defined destructor behavior.
//! They are pre-processor macros, so bindgen never emits them and they are spelled out here.
//!
//! https://www.sqlite.org/c3ref/c_static.html

use crate::ffi::sqlite3_destructor_type;
use std::ffi::c_void;
use std::fmt::{Display, Formatter};
use std::mem;

/// `SQLITE_STATIC`: the null destructor.
#[allow(non_snake_case)]
#[must_use]
fn SQLITE_STATIC() -> sqlite3_destructor_type {
    None
}

/// `SQLITE_TRANSIENT`: `-1` reinterpreted as a destructor.
///
/// Never called. sqlite compares it by address.
#[allow(non_snake_case)]
#[must_use]
fn SQLITE_TRANSIENT() -> sqlite3_destructor_type {
    Some(unsafe { mem::transmute::<isize, unsafe extern "C" fn(*mut c_void)>(-1_isize) })
}

/// Tells sqlite what to do with the memory behind a bound blob or text value.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Ownership {
    /// The memory outlives the statement. sqlite reads it in place and never frees it.
    Borrow,

    /// sqlite copies the memory before the bind call returns.
    #[default]
    CopyNow,
}

impl Ownership {
    pub(crate) fn destructor(self) -> sqlite3_destructor_type {
        match self {
            Ownership::Borrow => SQLITE_STATIC(),
            Ownership::CopyNow => SQLITE_TRANSIENT(),
        }
    }
}

impl Display for Ownership {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let data = match self {
            Ownership::Borrow => "SQLITE_STATIC",
            Ownership::CopyNow => "SQLITE_TRANSIENT",
        };
        f.write_str(data)
    }
}

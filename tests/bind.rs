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

use squeal::{sqlite_version, Connection, Error, Step, ValueType};

fn memory_db() -> Connection {
    let db = Connection::open_in_memory().unwrap();
    db.execute_batch("CREATE TABLE test (id INTEGER PRIMARY KEY, data BLOB, name TEXT)")
        .unwrap();
    db
}

#[test]
fn copied_blob_survives_source_drop() {
    let db = memory_db();

    let mut insert = db.prepare("INSERT INTO test (data) VALUES (?1)").unwrap();
    let source = vec![0xAB_u8; 4096];
    insert.bind_blob(1, &source).unwrap();
    drop(source);

    // reuse the freed region before sqlite reads the binding.
    let scribble = vec![0_u8; 4096];
    assert_eq!(Step::Done, insert.step().unwrap());
    drop(scribble);
    drop(insert);

    let rowid = db.last_insert_rowid();
    let mut select = db.prepare("SELECT data FROM test WHERE id = ?1").unwrap();
    select.bind_i64(1, rowid).unwrap();
    assert_eq!(Step::Row, select.step().unwrap());
    assert_eq!(ValueType::Blob, select.column_type(0).unwrap());
    assert_eq!(&[0xAB_u8; 4096][..], select.column_blob(0).unwrap());
    assert_eq!(Step::Done, select.step().unwrap());
}

#[test]
fn copied_text_survives_source_mutation() {
    let db = memory_db();

    let mut stmt = db.prepare("SELECT ?1").unwrap();
    let mut source = String::from("John Doe");
    stmt.bind_text(1, &source).unwrap();
    source.clear();
    source.push_str("Jane Roe");

    assert_eq!(Step::Row, stmt.step().unwrap());
    assert_eq!("John Doe", stmt.column_text(0).unwrap());
}

#[test]
fn copied_blob_is_not_aliased() {
    let db = Connection::open_in_memory().unwrap();

    let mut stmt = db.prepare("SELECT ?1").unwrap();
    let source = b"transient".to_vec();
    stmt.bind_blob(1, &source).unwrap();

    assert_eq!(Step::Row, stmt.step().unwrap());
    let value = stmt.column_blob(0).unwrap();
    assert_eq!(b"transient", value);
    assert_ne!(source.as_ptr(), value.as_ptr());
}

static STATIC_BLOB: &[u8] = b"static blob";

#[test]
fn static_blob_is_read_in_place() {
    let db = Connection::open_in_memory().unwrap();

    let mut stmt = db.prepare("SELECT ?1").unwrap();
    stmt.bind_static_blob(1, STATIC_BLOB).unwrap();

    assert_eq!(Step::Row, stmt.step().unwrap());
    let value = stmt.column_blob(0).unwrap();
    assert_eq!(STATIC_BLOB, value);
    assert_eq!(STATIC_BLOB.as_ptr(), value.as_ptr());
}

#[test]
fn static_text_round_trips_through_table() {
    let db = memory_db();

    let mut insert = db.prepare("INSERT INTO test (name) VALUES (:name)").unwrap();
    let index = insert.parameter_index(":name").unwrap().unwrap();
    insert.bind_static_text(index, "literal").unwrap();
    assert_eq!(Step::Done, insert.step().unwrap());
    assert_eq!(1, db.changes());
    drop(insert);

    let mut select = db.prepare("SELECT name FROM test").unwrap();
    assert_eq!(Step::Row, select.step().unwrap());
    assert_eq!(ValueType::Text, select.column_type(0).unwrap());
    assert_eq!("literal", select.column_text(0).unwrap());
}

#[test]
fn statement_can_be_reused_after_reset() {
    let db = memory_db();

    let mut insert = db.prepare("INSERT INTO test (name) VALUES (?1)").unwrap();
    assert_eq!(1, insert.parameter_count());
    for name in ["a", "b", "c"] {
        insert.bind_text(1, name).unwrap();
        assert_eq!(Step::Done, insert.step().unwrap());
        insert.reset().unwrap();
    }

    insert.clear_bindings().unwrap();
    assert_eq!(Step::Done, insert.step().unwrap());
    drop(insert);

    let mut select = db
        .prepare("SELECT count(*), count(name) FROM test")
        .unwrap();
    assert_eq!(Step::Row, select.step().unwrap());
    assert_eq!(4, select.column_i64(0).unwrap());
    assert_eq!(3, select.column_i64(1).unwrap());
}

#[test]
fn scalar_bindings() {
    let db = Connection::open_in_memory().unwrap();

    let mut stmt = db.prepare("SELECT ?1, ?2, ?3").unwrap();
    stmt.bind_i64(1, i64::MIN).unwrap();
    stmt.bind_f64(2, 1.5).unwrap();
    stmt.bind_null(3).unwrap();

    assert_eq!(Step::Row, stmt.step().unwrap());
    assert_eq!(3, stmt.column_count());
    assert_eq!(ValueType::Integer, stmt.column_type(0).unwrap());
    assert_eq!(i64::MIN, stmt.column_i64(0).unwrap());
    assert_eq!(ValueType::Float, stmt.column_type(1).unwrap());
    assert_eq!(1.5, stmt.column_f64(1).unwrap());
    assert_eq!(ValueType::Null, stmt.column_type(2).unwrap());
    assert!(stmt.column_blob(2).unwrap().is_empty());
}

#[test]
fn column_index_out_of_range() {
    let db = Connection::open_in_memory().unwrap();

    let mut stmt = db.prepare("SELECT 1").unwrap();
    assert_eq!(Step::Row, stmt.step().unwrap());
    assert!(matches!(stmt.column_i64(1), Err(Error::OutOfRange(1))));
}

#[test]
fn bind_index_out_of_range() {
    let db = Connection::open_in_memory().unwrap();

    let mut stmt = db.prepare("SELECT ?1").unwrap();
    let err = stmt.bind_blob(2, b"x").unwrap_err();
    // SQLITE_RANGE
    assert_eq!(Some(25), err.sqlite_code());
}

#[cfg(target_pointer_width = "64")]
#[test]
fn huge_parameter_index_is_rejected() {
    let db = Connection::open_in_memory().unwrap();

    let mut stmt = db.prepare("SELECT ?1").unwrap();
    stmt.bind_i64(1, 7).unwrap();

    let index = (1_usize << 32) + 1;
    assert!(matches!(stmt.bind_i64(index, 8), Err(Error::OutOfRange(i)) if i == index));
    assert!(matches!(stmt.bind_f64(index, 8.0), Err(Error::OutOfRange(_))));
    assert!(matches!(stmt.bind_null(index), Err(Error::OutOfRange(_))));
    assert!(matches!(stmt.bind_blob(index, b"x"), Err(Error::OutOfRange(_))));
    assert!(matches!(stmt.bind_text(index, "x"), Err(Error::OutOfRange(_))));

    // ?1 keeps its original value.
    assert_eq!(Step::Row, stmt.step().unwrap());
    assert_eq!(7, stmt.column_i64(0).unwrap());
}

#[test]
fn invalid_utf8_text_column() {
    let db = Connection::open_in_memory().unwrap();

    let mut stmt = db.prepare("SELECT CAST(x'ff' AS TEXT)").unwrap();
    assert_eq!(Step::Row, stmt.step().unwrap());
    assert_eq!(ValueType::Text, stmt.column_type(0).unwrap());
    assert!(matches!(stmt.column_text(0), Err(Error::Utf8(_))));
    assert_eq!(&[0xff_u8][..], stmt.column_blob(0).unwrap());
}

#[test]
fn prepare_rejects_trailing_statements() {
    let db = memory_db();

    let err = db.prepare("SELECT 1; DROP TABLE test").err().unwrap();
    // SQLITE_MISUSE
    assert_eq!(Some(21), err.sqlite_code());

    // the dropped statement never ran.
    let mut stmt = db.prepare("SELECT count(*) FROM test;  \n").unwrap();
    assert_eq!(Step::Row, stmt.step().unwrap());
    assert_eq!(0, stmt.column_i64(0).unwrap());
}

#[cfg(unix)]
#[test]
fn open_non_utf8_path_keeps_bytes() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let name = [
        format!("squeal-{}-", std::process::id()).as_bytes(),
        &b"\xff.sqlite3"[..],
    ]
    .concat();
    let path = std::env::temp_dir().join(OsStr::from_bytes(&name));
    let lossy = std::env::temp_dir().join(&*OsStr::from_bytes(&name).to_string_lossy());

    {
        let db = Connection::open(&path).unwrap();
        db.execute_batch("CREATE TABLE t (v)").unwrap();
    }

    assert!(path.exists());
    assert!(!lossy.exists());
    std::fs::remove_file(&path).ok();
}

#[test]
fn prepare_reports_engine_message() {
    let db = Connection::open_in_memory().unwrap();

    let err = db.prepare("SELECT * FROM missing").err().unwrap();
    match err {
        Error::Sqlite { code, message } => {
            // SQLITE_ERROR
            assert_eq!(1, code);
            assert!(message.contains("missing"), "{}", message);
        }
        _ => panic!("unexpected error: {:?}", err),
    }

    assert!(matches!(db.prepare("  "), Err(Error::Sqlite { .. })));
    assert!(matches!(db.prepare("SELECT '\0'"), Err(Error::Nul(_))));
}

#[test]
fn open_file_database() {
    let path = std::env::temp_dir().join(format!("squeal-{}.sqlite3", std::process::id()));
    {
        let db = Connection::open(&path).unwrap();
        db.execute_batch("CREATE TABLE t (v); INSERT INTO t VALUES (42);")
            .unwrap();
    }
    {
        let db = Connection::open(&path).unwrap();
        let mut stmt = db.prepare("SELECT v FROM t").unwrap();
        assert_eq!(Step::Row, stmt.step().unwrap());
        assert_eq!(42, stmt.column_i64(0).unwrap());
    }
    std::fs::remove_file(&path).ok();
}

#[test]
fn library_version_is_sqlite3() {
    assert!(sqlite_version().starts_with("3."));
}

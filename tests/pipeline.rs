use std::fs;
use std::path::Path;

use keepsake::backup::extract_from_backup;
use keepsake::pipeline;
use keepsake::{md5_hex, ChatStore, Config};
use rusqlite::{params, Connection};
use serde_json::{json, Value};
use tempfile::tempdir;

const DOMAIN: &str = "AppDomain-com.tencent.xin";

/// Writes a database to the content store and registers it in the manifest
fn add_database(
    backup: &Path,
    manifest: &Connection,
    file_id: &str,
    relative_path: &str,
    build: impl FnOnce(&Connection),
) {
    let shard = backup.join(&file_id[..2]);
    fs::create_dir_all(&shard).unwrap();
    let conn = Connection::open(shard.join(file_id)).unwrap();
    build(&conn);
    drop(conn);
    manifest
        .execute(
            "INSERT INTO Files (fileID, domain, relativePath, flags) VALUES (?, ?, ?, 1)",
            params![file_id, DOMAIN, relative_path],
        )
        .unwrap();
}

fn create_chat_table(conn: &Connection, table: &str) {
    conn.execute_batch(&format!(
        "CREATE TABLE \"{}\" (MesLocalID TEXT, CreateTime INTEGER, Message TEXT, Des INTEGER, Type INTEGER);",
        table
    ))
    .unwrap();
}

fn build_backup(backup: &Path, with_corrupt_shard: bool) {
    let manifest = Connection::open(backup.join("Manifest.db")).unwrap();
    manifest
        .execute_batch(
            "CREATE TABLE Files (fileID TEXT PRIMARY KEY, domain TEXT, relativePath TEXT, flags INTEGER, file BLOB);",
        )
        .unwrap();

    add_database(
        backup,
        &manifest,
        "c0ffee0000000000000000000000000000000001",
        "Documents/u1/DB/WCDB_Contact.sqlite",
        |conn| {
            conn.execute_batch(
                "CREATE TABLE Friend (userName TEXT, dbContactRemark BLOB, dbContactProfile BLOB);",
            )
            .unwrap();
            conn.execute(
                "INSERT INTO Friend VALUES (?, ?, ?)",
                params!["abc", b"Alice".to_vec(), Vec::<u8>::new()],
            )
            .unwrap();
        },
    );

    add_database(
        backup,
        &manifest,
        "5a5a000000000000000000000000000000000002",
        "Documents/u1/DB/message_1.sqlite",
        |conn| {
            let table = format!("Chat_{}", md5_hex("abc"));
            create_chat_table(conn, &table);
            conn.execute(
                &format!(
                    "INSERT INTO \"{}\" (MesLocalID, CreateTime, Message, Des, Type) VALUES ('m1', 1000, 'hi', 0, 1)",
                    table
                ),
                [],
            )
            .unwrap();
        },
    );

    if with_corrupt_shard {
        let file_id = "0bad000000000000000000000000000000000003";
        fs::create_dir_all(backup.join("0b")).unwrap();
        fs::write(
            backup.join("0b").join(file_id),
            b"garbage bytes that are certainly not an sqlite database header",
        )
        .unwrap();
        manifest
            .execute(
                "INSERT INTO Files (fileID, domain, relativePath, flags) VALUES (?, ?, ?, 1)",
                params![file_id, DOMAIN, "Documents/u1/DB/message_0.sqlite"],
            )
            .unwrap();

        add_database(
            backup,
            &manifest,
            "7e7e000000000000000000000000000000000004",
            "Documents/u1/DB/message_2.sqlite",
            |conn| {
                create_chat_table(conn, "Chat_feedface");
                conn.execute_batch(
                    "INSERT INTO Chat_feedface VALUES ('7', 50, 'who?', 1, 1);
                     INSERT INTO Chat_feedface VALUES ('8', 60, 'me', 0, 1);",
                )
                .unwrap();
            },
        );
    }
}

fn run_pipeline(backup: &Path, work: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let config = Config::default();
    let extracted = work.join("extracted");
    let parsed = work.join("parsed");
    extract_from_backup(backup, &extracted, &config, false).unwrap();
    pipeline::parse(&extracted, &parsed, &config).unwrap();
    (extracted, parsed)
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn single_contact_end_to_end() {
    let backup = tempdir().unwrap();
    let work = tempdir().unwrap();
    build_backup(backup.path(), false);

    let (extracted, parsed) = run_pipeline(backup.path(), work.path());
    assert!(extracted.join("u1/WCDB_Contact.sqlite").exists());
    assert!(extracted.join("u1/message_1.sqlite").exists());

    let key = md5_hex("abc");
    assert_eq!(
        read_json(&parsed.join("index.json")),
        json!([{
            "friend_id": "abc",
            "friend_name": "Alice",
            "message_count": 1,
            "file_uuid": key,
        }])
    );
    assert_eq!(
        read_json(&parsed.join("chats").join(format!("{}.json", key))),
        json!({
            "friend_id": "abc",
            "friend_name": "Alice",
            "messages": [{
                "id": "m1",
                "timestamp": "1970-01-01T00:16:40Z",
                "sender": "Alice",
                "content": "hi",
                "type": 1,
                "is_sender": false,
            }],
        })
    );
}

#[test]
fn rerun_is_byte_identical() {
    let backup = tempdir().unwrap();
    let work = tempdir().unwrap();
    build_backup(backup.path(), true);

    let (_, parsed) = run_pipeline(backup.path(), work.path());
    let index = fs::read(parsed.join("index.json")).unwrap();
    let store = ChatStore::new(&parsed);
    let chats: Vec<Vec<u8>> = store
        .load_index()
        .unwrap()
        .iter()
        .map(|e| fs::read(store.chat_path(&e.file_uuid)).unwrap())
        .collect();

    run_pipeline(backup.path(), work.path());
    assert_eq!(fs::read(parsed.join("index.json")).unwrap(), index);
    let again: Vec<Vec<u8>> = store
        .load_index()
        .unwrap()
        .iter()
        .map(|e| fs::read(store.chat_path(&e.file_uuid)).unwrap())
        .collect();
    assert_eq!(again, chats);
}

#[test]
fn corrupt_shard_and_unknown_table_keep_other_conversations() {
    let backup = tempdir().unwrap();
    let work = tempdir().unwrap();
    build_backup(backup.path(), true);

    let (_, parsed) = run_pipeline(backup.path(), work.path());
    let store = ChatStore::new(&parsed);
    let index = store.load_index().unwrap();
    assert_eq!(index.len(), 2);

    let alice = store.find("abc").unwrap().unwrap();
    assert_eq!(alice.message_count, 1);

    let unknown = index.iter().find(|e| e.friend_id != "abc").unwrap();
    assert!(unknown.friend_name.contains("Unknown"));
    assert!(unknown.friend_name.contains("feedface"));

    let conversation = store.load_conversation(&unknown.file_uuid).unwrap();
    assert_eq!(conversation.messages.len(), 2);
    assert_eq!(conversation.messages[0].sender, "Me");
    assert!(conversation.messages[0].is_sender);
    assert_eq!(conversation.messages[1].sender, unknown.friend_name);
}

#[test]
fn missing_input_directory_is_reported_before_writing() {
    let work = tempdir().unwrap();
    let parsed = work.path().join("parsed");
    let err = pipeline::parse(&work.path().join("absent"), &parsed, &Config::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<keepsake::KeepsakeError>(),
        Some(keepsake::KeepsakeError::InputMissing(_))
    ));
    assert!(!parsed.exists());
}

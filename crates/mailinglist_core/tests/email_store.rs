use mailinglist_core::db::open_db_in_memory;
use mailinglist_core::{
    EmailBatchQuery, EmailEntry, EmailRepository, EmailService, RepoError,
    SqliteEmailRepository,
};
use rusqlite::Connection;

fn emails(entries: &[EmailEntry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.email.as_str()).collect()
}

fn seed(repo: &SqliteEmailRepository<'_>, addrs: &[&str]) {
    for addr in addrs {
        repo.create(addr).unwrap();
    }
}

#[test]
fn create_then_get_returns_unconfirmed_subscribed_entry() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEmailRepository::new(&conn);

    let id = repo.create("new@x").unwrap();
    let loaded = repo.get("new@x").unwrap().unwrap();

    assert_eq!(loaded.id, id);
    assert_eq!(loaded.email, "new@x");
    assert_eq!(loaded.confirmed_at, None);
    assert!(!loaded.opt_out);
}

#[test]
fn create_trims_address_and_rejects_blank() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEmailRepository::new(&conn);

    repo.create("  padded@x ").unwrap();
    assert!(repo.get("padded@x").unwrap().is_some());

    let err = repo.create("   ").unwrap_err();
    assert!(matches!(err, RepoError::InvalidArgument(_)));
}

#[test]
fn duplicate_create_is_conflict_and_keeps_original_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEmailRepository::new(&conn);

    repo.create("dup@x").unwrap();
    let mut confirmed = repo.get("dup@x").unwrap().unwrap();
    confirmed.confirm(1_700_000_000);
    repo.update(&confirmed).unwrap();

    let err = repo.create("dup@x").unwrap_err();
    assert!(matches!(err, RepoError::Conflict(ref email) if email == "dup@x"));
    assert!(!err.is_storage_fault());

    let loaded = repo.get("dup@x").unwrap().unwrap();
    assert_eq!(loaded, confirmed);
}

#[test]
fn create_conflicts_with_opted_out_address() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEmailRepository::new(&conn);

    repo.create("gone@x").unwrap();
    assert!(repo.delete("gone@x").unwrap());

    let err = repo.create("gone@x").unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
}

#[test]
fn get_missing_address_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEmailRepository::new(&conn);

    assert_eq!(repo.get("nobody@x").unwrap(), None);
}

#[test]
fn update_overwrites_confirmation_and_opt_out_without_changing_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEmailRepository::new(&conn);

    let id = repo.create("upd@x").unwrap();
    let entry = EmailEntry {
        id: 9_999,
        email: "upd@x".to_string(),
        confirmed_at: Some(10_000),
        opt_out: true,
    };
    repo.update(&entry).unwrap();

    let loaded = repo.get("upd@x").unwrap().unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.confirmed_at, Some(10_000));
    assert!(loaded.opt_out);

    let cleared = EmailEntry {
        confirmed_at: None,
        opt_out: false,
        ..loaded
    };
    repo.update(&cleared).unwrap();
    let loaded = repo.get("upd@x").unwrap().unwrap();
    assert_eq!(loaded.confirmed_at, None);
    assert!(!loaded.opt_out);
}

#[test]
fn update_missing_address_inserts_it() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEmailRepository::new(&conn);

    let mut entry = EmailEntry::new("upsert@x");
    entry.confirm(0);
    repo.update(&entry).unwrap();

    let loaded = repo.get("upsert@x").unwrap().unwrap();
    assert!(loaded.id > 0);
    assert_eq!(loaded.confirmed_at, Some(0));
    assert!(!loaded.opt_out);
}

#[test]
fn delete_marks_opt_out_and_keeps_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEmailRepository::new(&conn);

    seed(&repo, &["keep@x", "drop@x"]);
    assert!(repo.delete("drop@x").unwrap());

    let loaded = repo.get("drop@x").unwrap().unwrap();
    assert!(loaded.opt_out);
    assert!(!loaded.is_active());

    let total: i64 = conn
        .query_row("SELECT COUNT(*) FROM emails;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(total, 2);

    let visible = repo.get_batch(&EmailBatchQuery::new(1, 10)).unwrap();
    assert_eq!(emails(&visible), vec!["keep@x"]);
}

#[test]
fn delete_missing_address_is_noop() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEmailRepository::new(&conn);

    assert!(!repo.delete("ghost@x").unwrap());
    assert_eq!(repo.get("ghost@x").unwrap(), None);
}

#[test]
fn batch_pages_follow_insert_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEmailRepository::new(&conn);
    seed(&repo, &["a@x", "b@x", "c@x", "d@x", "e@x"]);

    let page = |page, count| repo.get_batch(&EmailBatchQuery::new(page, count)).unwrap();

    assert_eq!(emails(&page(1, 2)), vec!["a@x", "b@x"]);
    assert_eq!(emails(&page(2, 2)), vec!["c@x", "d@x"]);
    assert_eq!(emails(&page(3, 2)), vec!["e@x"]);
    assert!(page(4, 2).is_empty());
}

#[test]
fn consecutive_pages_concatenate_to_double_page() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEmailRepository::new(&conn);
    seed(&repo, &["a@x", "b@x", "c@x", "d@x", "e@x", "f@x", "g@x"]);

    for count in 1..=4 {
        let mut joined = repo.get_batch(&EmailBatchQuery::new(1, count)).unwrap();
        joined.extend(repo.get_batch(&EmailBatchQuery::new(2, count)).unwrap());
        let double = repo.get_batch(&EmailBatchQuery::new(1, count * 2)).unwrap();

        assert_eq!(joined, double, "count={count}");
        assert!(joined.windows(2).all(|pair| pair[0].id < pair[1].id));
    }
}

#[test]
fn batch_skips_opted_out_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEmailRepository::new(&conn);
    seed(&repo, &["a@x", "b@x", "c@x", "d@x"]);
    repo.delete("b@x").unwrap();

    let first = repo.get_batch(&EmailBatchQuery::new(1, 2)).unwrap();
    let second = repo.get_batch(&EmailBatchQuery::new(2, 2)).unwrap();
    assert_eq!(emails(&first), vec!["a@x", "c@x"]);
    assert_eq!(emails(&second), vec!["d@x"]);
}

#[test]
fn batch_rejects_page_zero() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEmailRepository::new(&conn);
    seed(&repo, &["a@x"]);

    let err = repo.get_batch(&EmailBatchQuery::new(0, 2)).unwrap_err();
    assert!(matches!(err, RepoError::InvalidArgument(_)));
}

#[test]
fn invalid_opt_out_value_is_reported_as_invalid_data() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE emails (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            confirmed_at INTEGER,
            opt_out INTEGER NOT NULL DEFAULT 0
        );
        INSERT INTO emails (email, confirmed_at, opt_out) VALUES ('bad@x', NULL, 7);",
    )
    .unwrap();
    let repo = SqliteEmailRepository::new(&conn);

    let err = repo.get("bad@x").unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
    assert!(err.is_storage_fault());
}

#[test]
fn corrupt_row_mid_batch_fails_the_batch_and_connection_stays_usable() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEmailRepository::new(&conn);
    seed(&repo, &["a@x", "b@x", "c@x"]);
    conn.execute(
        "UPDATE emails SET confirmed_at = 'soon' WHERE email = 'b@x'",
        [],
    )
    .unwrap();

    let err = repo.get_batch(&EmailBatchQuery::new(1, 10)).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)), "{err}");
    assert!(err.is_storage_fault());

    conn.execute(
        "UPDATE emails SET confirmed_at = NULL WHERE email = 'b@x'",
        [],
    )
    .unwrap();
    let entries = repo.get_batch(&EmailBatchQuery::new(1, 10)).unwrap();
    assert_eq!(emails(&entries), vec!["a@x", "b@x", "c@x"]);
}

#[test]
fn service_returns_stored_state_after_writes() {
    let conn = open_db_in_memory().unwrap();
    let service = EmailService::new(SqliteEmailRepository::new(&conn));

    let created = service.create_email("svc@x").unwrap();
    assert_eq!(created.confirmed_at, None);
    assert!(!created.opt_out);

    let mut confirmed = created.clone();
    confirmed.confirm(10_000);
    let updated = service.update_email(&confirmed).unwrap().unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.confirmed_at, Some(10_000));

    let deleted = service.delete_email("svc@x").unwrap().unwrap();
    assert!(deleted.opt_out);
    assert_eq!(deleted.confirmed_at, Some(10_000));

    assert_eq!(service.delete_email("never@x").unwrap(), None);
    assert!(service
        .get_email_batch(&EmailBatchQuery::new(1, 5))
        .unwrap()
        .is_empty());
}

#[test]
fn entry_json_uses_null_for_unconfirmed() {
    let entry = EmailEntry::new("json@x");
    let value = serde_json::to_value(&entry).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "id": 0,
            "email": "json@x",
            "confirmed_at": null,
            "opt_out": false,
        })
    );
}

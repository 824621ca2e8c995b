use keepstock_core::db::open_db_in_memory;
use keepstock_core::presenter::qr_scan::{scan_container, SCAN_FAILED_MESSAGE};
use keepstock_core::{
    container_qr_payload, ContainerService, NewContainer, SqliteContainerRepository,
};
use uuid::Uuid;

#[test]
fn scanning_printed_label_resolves_container() {
    let conn = open_db_in_memory().unwrap();
    let service = ContainerService::new(SqliteContainerRepository::try_new(&conn).unwrap());
    let bin = service
        .create_container(NewContainer::named("Holiday lights"))
        .unwrap();

    let scanned = format!("  {}\n", container_qr_payload(bin.id));
    let state = scan_container(&conn, &scanned);
    let result = state.success().expect("success state");
    assert_eq!(result.container_id, bin.id);
    assert_eq!(result.container_name, "Holiday lights");
}

#[test]
fn scanning_label_for_deleted_container_names_the_id() {
    let conn = open_db_in_memory().unwrap();
    let missing = Uuid::new_v4();

    let state = scan_container(&conn, &container_qr_payload(missing));
    assert_eq!(
        state.error_message(),
        Some(format!("Scanned container {missing} was not found.").as_str())
    );
}

#[test]
fn unreadable_payloads_report_scan_failure() {
    let conn = open_db_in_memory().unwrap();

    for payload in [
        "",
        "https://example.com/container/abc",
        "keepingstock://container/not-a-uuid",
        "keepingstock://item/6f1c2a9e-3b1d-4c55-9a0e-2d7b8f0c1e42",
    ] {
        let state = scan_container(&conn, payload);
        assert_eq!(state.error_message(), Some(SCAN_FAILED_MESSAGE), "{payload}");
    }
}

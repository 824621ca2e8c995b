use keepstock_core::db::open_db_in_memory;
use keepstock_core::{
    ItemListQuery, ItemService, ItemServiceError, NewItem, SqliteItemRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn create_normalizes_and_deduplicates_tags() {
    let conn = open_db_in_memory().unwrap();
    let service = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());

    let item = service
        .create_item(NewItem {
            tags: vec![
                " Tools ".to_string(),
                "garage".to_string(),
                "TOOLS".to_string(),
            ],
            ..NewItem::named("Wrench")
        })
        .unwrap();

    assert_eq!(item.tags, vec!["garage", "tools"]);
    assert_eq!(tag_row_count(&conn), 2);
}

#[test]
fn blank_tag_is_rejected_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let service = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());

    let err = service
        .create_item(NewItem {
            tags: vec!["ok".to_string(), "  ".to_string()],
            ..NewItem::named("Wrench")
        })
        .unwrap_err();

    assert!(matches!(err, ItemServiceError::InvalidTag(_)));
    assert!(service
        .list_items(ItemListQuery::default())
        .unwrap()
        .items
        .is_empty());
    assert_eq!(tag_row_count(&conn), 0);
}

#[test]
fn set_item_tags_replaces_whole_set_and_shares_tag_rows() {
    let conn = open_db_in_memory().unwrap();
    let service = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());
    let first = service
        .create_item(NewItem {
            tags: vec!["camping".to_string(), "summer".to_string()],
            ..NewItem::named("Tent")
        })
        .unwrap();
    let second = service
        .create_item(NewItem {
            tags: vec!["Camping".to_string()],
            ..NewItem::named("Stove")
        })
        .unwrap();

    let retagged = service
        .set_item_tags(first.id, vec!["winter".to_string()])
        .unwrap();
    assert_eq!(retagged.tags, vec!["winter"]);

    let other = service.get_item(second.id).unwrap().unwrap();
    assert_eq!(other.tags, vec!["camping"]);
    assert_eq!(tag_row_count(&conn), 3);

    let cleared = service.set_item_tags(first.id, Vec::new()).unwrap();
    assert!(cleared.tags.is_empty());
}

#[test]
fn set_item_tags_on_unknown_item_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());

    let err = service
        .set_item_tags(Uuid::new_v4(), vec!["x".to_string()])
        .unwrap_err();
    assert!(matches!(err, ItemServiceError::ItemNotFound(_)));
}

#[test]
fn list_items_filters_by_single_tag_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let service = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());
    let tagged = service
        .create_item(NewItem {
            tags: vec!["kitchen".to_string()],
            ..NewItem::named("Whisk")
        })
        .unwrap();
    service.create_item(NewItem::named("Broom")).unwrap();

    let result = service
        .list_items(ItemListQuery {
            tag: Some(" KITCHEN ".to_string()),
            ..ItemListQuery::default()
        })
        .unwrap();

    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].id, tagged.id);
}

#[test]
fn deleting_item_drops_its_tag_links() {
    let conn = open_db_in_memory().unwrap();
    let service = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());
    let item = service
        .create_item(NewItem {
            tags: vec!["fragile".to_string()],
            ..NewItem::named("Vase")
        })
        .unwrap();

    service.delete_item(item.id).unwrap();

    let links: i64 = conn
        .query_row("SELECT COUNT(*) FROM item_tags;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(links, 0);
}

fn tag_row_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM tags;", [], |row| row.get(0))
        .unwrap()
}

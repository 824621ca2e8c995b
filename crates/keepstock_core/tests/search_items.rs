use keepstock_core::db::open_db_in_memory;
use keepstock_core::{
    search_items, ItemChanges, ItemSearchQuery, ItemService, ItemStatus, NewItem,
    SqliteItemRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn add(conn: &Connection, name: &str, description: Option<&str>, tags: &[&str]) -> Uuid {
    let service = ItemService::new(SqliteItemRepository::try_new(conn).unwrap());
    service
        .create_item(NewItem {
            description: description.map(str::to_string),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..NewItem::named(name)
        })
        .unwrap()
        .id
}

#[test]
fn text_search_matches_name_and_description_prefixes() {
    let conn = open_db_in_memory().unwrap();
    let drill = add(&conn, "Cordless drill", Some("yellow case"), &[]);
    let lamp = add(&conn, "Lamp", Some("spare drill bits inside"), &[]);
    add(&conn, "Hammer", None, &[]);

    let hits = search_items(&conn, &ItemSearchQuery::new("dri")).unwrap();
    let mut ids: Vec<Uuid> = hits.iter().map(|hit| hit.item_id).collect();
    ids.sort();
    let mut expected = vec![drill, lamp];
    expected.sort();
    assert_eq!(ids, expected);

    let narrowed = search_items(&conn, &ItemSearchQuery::new("drill yellow")).unwrap();
    assert_eq!(narrowed.len(), 1);
    assert_eq!(narrowed[0].item_id, drill);
    assert!(narrowed[0].snippet.contains('['));
}

#[test]
fn search_index_follows_edits_and_deletes() {
    let conn = open_db_in_memory().unwrap();
    let service = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());
    let id = add(&conn, "Thermos", None, &[]);

    service
        .update_item(
            id,
            ItemChanges {
                name: Some("Flask".to_string()),
                ..ItemChanges::default()
            },
        )
        .unwrap();
    assert!(search_items(&conn, &ItemSearchQuery::new("thermos"))
        .unwrap()
        .is_empty());
    assert_eq!(
        search_items(&conn, &ItemSearchQuery::new("flask"))
            .unwrap()
            .len(),
        1
    );

    service.delete_item(id).unwrap();
    assert!(search_items(&conn, &ItemSearchQuery::new("flask"))
        .unwrap()
        .is_empty());
}

#[test]
fn tag_and_status_filters_narrow_results() {
    let conn = open_db_in_memory().unwrap();
    let service = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());
    let red_box = add(&conn, "Red box", None, &["storage", "red"]);
    let blue_box = add(&conn, "Blue box", None, &["storage"]);
    service.check_out(blue_box).unwrap();

    let tagged = search_items(
        &conn,
        &ItemSearchQuery::new("box").with_tags(vec!["Storage".to_string(), "red".to_string()]),
    )
    .unwrap();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].item_id, red_box);

    let taken = search_items(
        &conn,
        &ItemSearchQuery::new("box").with_status(Some(ItemStatus::TakenOut)),
    )
    .unwrap();
    assert_eq!(taken.len(), 1);
    assert_eq!(taken[0].item_id, blue_box);
    assert_eq!(taken[0].status, ItemStatus::TakenOut);
}

#[test]
fn blank_text_lists_by_tags_or_returns_nothing() {
    let conn = open_db_in_memory().unwrap();
    add(&conn, "Zip ties", Some("assorted"), &["garage"]);
    add(&conn, "Anchors", None, &["garage"]);
    add(&conn, "Candles", None, &[]);

    assert!(search_items(&conn, &ItemSearchQuery::new("   "))
        .unwrap()
        .is_empty());

    let hits = search_items(
        &conn,
        &ItemSearchQuery::new("").with_tags(vec!["garage".to_string()]),
    )
    .unwrap();
    let names: Vec<&str> = hits.iter().map(|hit| hit.name.as_str()).collect();
    assert_eq!(names, vec!["Anchors", "Zip ties"]);
    assert_eq!(hits[0].snippet, "Anchors");
    assert_eq!(hits[1].snippet, "assorted");
}

#[test]
fn fts_operators_in_user_input_are_treated_as_text() {
    let conn = open_db_in_memory().unwrap();
    add(&conn, "Box (large)", None, &[]);

    let hits = search_items(&conn, &ItemSearchQuery::new("\"box OR NEAR(")).unwrap();
    assert!(hits.is_empty());

    let hits = search_items(&conn, &ItemSearchQuery::new("box")).unwrap();
    assert_eq!(hits.len(), 1);
}

#[test]
fn limit_caps_hit_count() {
    let conn = open_db_in_memory().unwrap();
    for index in 0..5 {
        add(&conn, &format!("Jar {index}"), None, &[]);
    }

    let mut query = ItemSearchQuery::new("jar");
    query.limit = 3;
    assert_eq!(search_items(&conn, &query).unwrap().len(), 3);

    query.limit = 0;
    assert_eq!(search_items(&conn, &query).unwrap().len(), 5);
}

#[test]
fn text_also_matches_tag_name_prefixes() {
    let conn = open_db_in_memory().unwrap();
    let hammer = add(&conn, "Hammer", None, &["tools"]);
    let toolbox = add(&conn, "Toolbox", Some("red metal"), &[]);
    add(&conn, "Lamp", None, &["lighting"]);

    let hits = search_items(&conn, &ItemSearchQuery::new("tool")).unwrap();
    let ids: Vec<Uuid> = hits.iter().map(|hit| hit.item_id).collect();
    assert_eq!(ids, vec![toolbox, hammer]);
    assert!(hits[0].snippet.contains('['));
    assert_eq!(hits[1].snippet, "Hammer");

    let mixed = search_items(&conn, &ItemSearchQuery::new("ham tools")).unwrap();
    assert_eq!(mixed.len(), 1);
    assert_eq!(mixed[0].item_id, hammer);
}

#[test]
fn control_characters_in_text_do_not_break_the_query() {
    let conn = open_db_in_memory().unwrap();
    let hammer = add(&conn, "Hammer", None, &[]);

    assert!(search_items(&conn, &ItemSearchQuery::new("\u{0}"))
        .unwrap()
        .is_empty());

    let hits = search_items(&conn, &ItemSearchQuery::new("ham\u{0}mer")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].item_id, hammer);
}

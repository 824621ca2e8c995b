use keepstock_core::db::open_db_in_memory;
use keepstock_core::presenter::container_screens::{load_container_browser, load_container_detail};
use keepstock_core::presenter::item_screens::{
    load_item_browser, load_item_detail, ItemBrowserFilter,
};
use keepstock_core::presenter::search_screen::{load_item_search, SEARCH_FAILED_MESSAGE};
use keepstock_core::presenter::{CONTAINER_NOT_FOUND_MESSAGE, ITEM_NOT_FOUND_MESSAGE};
use keepstock_core::service::container_service::DELETE_BLOCKED_REASON;
use keepstock_core::{
    container_qr_payload, ContainerScope, ContainerService, ItemSearchQuery, ItemService,
    NewContainer, NewItem, SqliteContainerRepository, SqliteItemRepository, UiState,
};
use rusqlite::Connection;
use uuid::Uuid;

struct Fixture {
    conn: Connection,
    garage: Uuid,
    shelf: Uuid,
    drill: Uuid,
    loose: Uuid,
}

fn fixture() -> Fixture {
    let conn = open_db_in_memory().unwrap();
    let (garage, shelf, drill, loose) = {
        let containers = ContainerService::new(SqliteContainerRepository::try_new(&conn).unwrap());
        let items = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());
        let garage = containers
            .create_container(NewContainer::named("Garage"))
            .unwrap();
        let shelf = containers
            .create_container(NewContainer::named("Top shelf").under(garage.id))
            .unwrap();
        let drill = items
            .create_item(NewItem {
                container_id: Some(shelf.id),
                tags: vec!["tools".to_string()],
                ..NewItem::named("Drill")
            })
            .unwrap();
        let loose = items
            .create_item(NewItem {
                tags: vec!["misc".to_string()],
                ..NewItem::named("Batteries")
            })
            .unwrap();
        (garage.id, shelf.id, drill.id, loose.id)
    };
    Fixture {
        conn,
        garage,
        shelf,
        drill,
        loose,
    }
}

#[test]
fn item_browser_lists_items_and_available_tags() {
    let fx = fixture();

    let state = load_item_browser(&fx.conn, &ItemBrowserFilter::default());
    let view = state.success().expect("success state");
    let names: Vec<&str> = view.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Batteries", "Drill"]);
    assert_eq!(view.available_tags, vec!["misc", "tools"]);
    assert_eq!(view.active_tag, None);

    let filtered = load_item_browser(&fx.conn, &ItemBrowserFilter::tag("TOOLS"));
    let view = filtered.success().expect("success state");
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].id, fx.drill);
    assert_eq!(view.active_tag.as_deref(), Some("tools"));
}

#[test]
fn item_detail_carries_container_path_and_status_label() {
    let fx = fixture();

    let state = load_item_detail(&fx.conn, fx.drill);
    let view = state.success().expect("success state");
    assert_eq!(view.item.id, fx.drill);
    assert_eq!(view.status_label, "Stored");
    assert_eq!(view.container_name(), Some("Top shelf"));
    let path: Vec<Uuid> = view.container_path.iter().map(|c| c.id).collect();
    assert_eq!(path, vec![fx.garage, fx.shelf]);

    let unsorted = load_item_detail(&fx.conn, fx.loose);
    assert_eq!(unsorted.success().unwrap().container_name(), None);
}

#[test]
fn missing_records_become_error_states() {
    let fx = fixture();

    let item = load_item_detail(&fx.conn, Uuid::new_v4());
    assert_eq!(item.error_message(), Some(ITEM_NOT_FOUND_MESSAGE));

    let detail = load_container_detail(&fx.conn, Uuid::new_v4());
    assert_eq!(detail.error_message(), Some(CONTAINER_NOT_FOUND_MESSAGE));

    let browser = load_container_browser(&fx.conn, Some(Uuid::new_v4()));
    assert_eq!(browser.error_message(), Some(CONTAINER_NOT_FOUND_MESSAGE));
}

#[test]
fn container_browser_top_level_shows_roots_and_unsorted_items() {
    let fx = fixture();

    let state = load_container_browser(&fx.conn, None);
    let view = state.success().expect("success state");
    assert!(view.current.is_none());
    assert!(view.path.is_empty());
    assert_eq!(view.containers.len(), 1);
    assert_eq!(view.containers[0].id, fx.garage);
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].id, fx.loose);
}

#[test]
fn container_browser_inside_container_shows_children_and_direct_items() {
    let fx = fixture();

    let garage = load_container_browser(&fx.conn, Some(fx.garage));
    let view = garage.success().expect("success state");
    assert_eq!(view.current.as_ref().map(|c| c.id), Some(fx.garage));
    assert_eq!(view.containers[0].id, fx.shelf);
    assert!(view.items.is_empty());

    let shelf = load_container_browser(&fx.conn, Some(fx.shelf));
    let view = shelf.success().expect("success state");
    assert_eq!(view.path.len(), 2);
    assert!(view.containers.is_empty());
    assert_eq!(view.items[0].id, fx.drill);
}

#[test]
fn container_detail_reports_counts_and_delete_guard() {
    let fx = fixture();

    let state = load_container_detail(&fx.conn, fx.garage);
    let view = state.success().expect("success state");
    assert_eq!(view.container_name, "Garage");
    assert_eq!(view.path, vec!["Garage"]);
    assert_eq!(view.subcontainer_count, 1);
    assert_eq!(view.item_count, 0);
    assert!(!view.can_delete);
    assert_eq!(view.delete_blocked_reason.as_deref(), Some(DELETE_BLOCKED_REASON));
    assert_eq!(view.qr_payload, container_qr_payload(fx.garage));

    let shelf = load_container_detail(&fx.conn, fx.shelf);
    let view = shelf.success().unwrap();
    assert_eq!(view.parent_container_id, Some(fx.garage));
    assert_eq!(view.path, vec!["Garage", "Top shelf"]);
    assert_eq!(view.item_count, 1);
}

#[test]
fn storage_failures_collapse_to_generic_messages() {
    let conn = Connection::open_in_memory().unwrap();

    let items = load_item_browser(&conn, &ItemBrowserFilter::default());
    assert_eq!(items.error_message(), Some("Failed to load items."));

    let detail = load_container_detail(&conn, Uuid::new_v4());
    assert_eq!(detail.error_message(), Some("Failed to load container."));

    let search = load_item_search(&conn, &ItemSearchQuery::new("drill"));
    assert_eq!(search.error_message(), Some(SEARCH_FAILED_MESSAGE));
}

#[test]
fn item_browser_text_matches_names_and_tags_within_a_container() {
    let fx = fixture();
    {
        let items = ItemService::new(SqliteItemRepository::try_new(&fx.conn).unwrap());
        items
            .create_item(NewItem {
                container_id: Some(fx.shelf),
                tags: vec!["power".to_string()],
                ..NewItem::named("Extension cord")
            })
            .unwrap();
        items
            .create_item(NewItem {
                tags: vec!["power".to_string()],
                ..NewItem::named("Power bank")
            })
            .unwrap();
    }

    let everywhere = load_item_browser(&fx.conn, &ItemBrowserFilter::text(" POW "));
    let view = everywhere.success().expect("success state");
    let names: Vec<&str> = view.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Extension cord", "Power bank"]);
    assert_eq!(view.active_text.as_deref(), Some("POW"));
    assert!(view.active_container.is_none());

    let on_shelf = load_item_browser(
        &fx.conn,
        &ItemBrowserFilter::text("o").within(ContainerScope::In(fx.shelf)),
    );
    let view = on_shelf.success().expect("success state");
    let names: Vec<&str> = view.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Drill", "Extension cord"]);
    assert_eq!(view.active_container.as_ref().map(|c| c.id), Some(fx.shelf));

    let missing = load_item_browser(
        &fx.conn,
        &ItemBrowserFilter::default().within(ContainerScope::In(Uuid::new_v4())),
    );
    assert_eq!(missing.error_message(), Some(CONTAINER_NOT_FOUND_MESSAGE));
}

#[test]
fn browsers_list_every_row_past_one_page() {
    let fx = fixture();
    {
        let items = ItemService::new(SqliteItemRepository::try_new(&fx.conn).unwrap());
        for index in 0..250 {
            items
                .create_item(NewItem {
                    container_id: Some(fx.garage),
                    ..NewItem::named(format!("Screw {index:03}"))
                })
                .unwrap();
        }
    }

    let all = load_item_browser(&fx.conn, &ItemBrowserFilter::default());
    assert_eq!(all.success().expect("success state").items.len(), 252);

    let garage = load_container_browser(&fx.conn, Some(fx.garage));
    let view = garage.success().expect("success state");
    assert_eq!(view.items.len(), 250);
    assert_eq!(view.items[0].name, "Screw 000");
    assert_eq!(view.items[249].name, "Screw 249");
}

#[test]
fn search_screen_wraps_hits() {
    let fx = fixture();

    let state = load_item_search(&fx.conn, &ItemSearchQuery::new("tools"));
    let view = state.success().expect("success state");
    assert_eq!(view.text, "tools");
    assert_eq!(view.hits.len(), 1);
    assert_eq!(view.hits[0].item_id, fx.drill);

    let empty = load_item_search(&fx.conn, &ItemSearchQuery::new("   "));
    assert!(empty.success().expect("success state").is_empty());
}

#[test]
fn states_serialize_with_state_tag() {
    let fx = fixture();

    let success = serde_json::to_value(load_item_detail(&fx.conn, fx.drill)).unwrap();
    assert_eq!(success["state"], "success");
    assert_eq!(success["data"]["item"]["status"], "stored");

    let error = serde_json::to_value(load_item_detail(&fx.conn, Uuid::new_v4())).unwrap();
    assert_eq!(error["state"], "error");
    assert_eq!(error["data"]["message"], ITEM_NOT_FOUND_MESSAGE);

    let loading: UiState<()> = UiState::default();
    assert_eq!(serde_json::to_value(loading).unwrap()["state"], "loading");
}

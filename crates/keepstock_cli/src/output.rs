//! Plain-text and JSON rendering of command results.

use anyhow::Result;
use keepstock_core::presenter::container_screens::ContainerDetailView;
use keepstock_core::presenter::item_screens::ItemDetailView;
use keepstock_core::presenter::qr_scan::QrScanResult;
use keepstock_core::presenter::search_screen::ItemSearchView;
use keepstock_core::presenter::ItemSummary;
use keepstock_core::{Container, ContainerId, Item, Tag, TagUsage};
use serde::Serialize;
use serde_json::json;

pub struct Printer {
    json: bool,
}

impl Printer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn container(&self, container: &Container) -> Result<()> {
        self.emit(container, || container_line(container))
    }

    pub fn containers(&self, containers: &[Container]) -> Result<()> {
        self.emit(&containers, || {
            if containers.is_empty() {
                return "no containers".to_string();
            }
            containers
                .iter()
                .map(container_line)
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    pub fn container_detail(&self, view: &ContainerDetailView) -> Result<()> {
        self.emit(view, || {
            let mut lines = vec![
                format!("{}  {}", view.container_id, view.container_name),
                format!("path: {}", view.path.join(" / ")),
                format!(
                    "contains: {} container(s), {} item(s)",
                    view.subcontainer_count, view.item_count
                ),
            ];
            if let Some(description) = &view.description {
                lines.push(format!("description: {description}"));
            }
            if let Some(image) = &view.image_path {
                lines.push(format!("image: {image}"));
            }
            if let Some(reason) = &view.delete_blocked_reason {
                lines.push(format!("delete: {reason}"));
            }
            lines.push(format!("qr: {}", view.qr_payload));
            lines.join("\n")
        })
    }

    pub fn qr_payload(&self, id: ContainerId, payload: &str) -> Result<()> {
        self.emit(&json!({ "container_id": id, "payload": payload }), || {
            payload.to_string()
        })
    }

    pub fn item(&self, item: &Item) -> Result<()> {
        self.emit(item, || item_line(item))
    }

    pub fn items(&self, items: &[Item]) -> Result<()> {
        self.emit(&items, || {
            if items.is_empty() {
                return "no items".to_string();
            }
            items.iter().map(item_line).collect::<Vec<_>>().join("\n")
        })
    }

    pub fn item_detail(&self, view: &ItemDetailView) -> Result<()> {
        self.emit(view, || {
            let item = &view.item;
            let location = if view.container_path.is_empty() {
                "unsorted".to_string()
            } else {
                view.container_path
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(" / ")
            };
            let mut lines = vec![
                format!("{}  {}", item.id, item.name),
                format!("status: {}", view.status_label),
                format!("location: {location}"),
            ];
            if let Some(description) = &item.description {
                lines.push(format!("description: {description}"));
            }
            if let Some(image) = &item.image_path {
                lines.push(format!("image: {image}"));
            }
            if !item.tags.is_empty() {
                lines.push(format!("tags: {}", item.tags.join(", ")));
            }
            lines.join("\n")
        })
    }

    pub fn tags(&self, tags: &[TagUsage]) -> Result<()> {
        self.emit(&tags, || {
            if tags.is_empty() {
                return "no tags".to_string();
            }
            tags.iter()
                .map(|usage| format!("{}  ({} item(s))", usage.tag.name, usage.item_count))
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    pub fn tag(&self, tag: &Tag, items: &[ItemSummary]) -> Result<()> {
        self.emit(&json!({ "tag": tag, "items": items }), || {
            let mut lines = vec![format!("{}  ({} item(s))", tag.name, items.len())];
            lines.extend(
                items
                    .iter()
                    .map(|item| format!("  {}  {}", item.id, item.name)),
            );
            lines.join("\n")
        })
    }

    pub fn search(&self, view: &ItemSearchView) -> Result<()> {
        self.emit(view, || {
            if view.is_empty() {
                return "no matches".to_string();
            }
            view.hits
                .iter()
                .map(|hit| format!("{}  {}  {}", hit.item_id, hit.name, hit.snippet))
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    pub fn scan(&self, result: &QrScanResult) -> Result<()> {
        self.emit(result, || {
            format!("{}  {}", result.container_id, result.container_name)
        })
    }

    pub fn done(&self, message: &str) -> Result<()> {
        self.emit(&json!({ "ok": true, "message": message }), || {
            message.to_string()
        })
    }

    fn emit<T: Serialize + ?Sized>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}

fn container_line(container: &Container) -> String {
    format!("{}  {}", container.id, container.name)
}

fn item_line(item: &Item) -> String {
    let marker = if item.is_taken_out() { "  [taken out]" } else { "" };
    let tags = if item.tags.is_empty() {
        String::new()
    } else {
        format!("  #{}", item.tags.join(" #"))
    };
    format!("{}  {}{marker}{tags}", item.id, item.name)
}

#[cfg(test)]
mod tests {
    use super::item_line;
    use keepstock_core::Item;

    #[test]
    fn item_line_marks_taken_out_items_and_lists_tags() {
        let mut item = Item::new("Drill").unwrap();
        item.tags = vec!["garage".to_string(), "tools".to_string()];
        item.check_out(1_700_000_000_000);

        let line = item_line(&item);
        assert!(line.contains("Drill  [taken out]"));
        assert!(line.ends_with("#garage #tools"));
    }
}

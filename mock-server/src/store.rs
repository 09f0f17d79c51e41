//! In-memory items/projects and the command interpreter behind `/sync`.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const INBOX_PROJECT_ID: &str = "1";

/// Ids handed out for created entities start here.
const FIRST_ID: u64 = 100;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub content: String,
    pub description: String,
    pub project_id: String,
    pub section_id: Option<String>,
    pub parent_id: Option<String>,
    pub priority: u8,
    pub checked: bool,
    pub child_order: i64,
    pub day_order: i64,
    pub labels: Vec<String>,
    pub due: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub color: Option<String>,
    pub is_favorite: bool,
    pub is_archived: bool,
}

/// One command as received on the wire.
#[derive(Clone, Debug, Deserialize)]
pub struct WireCommand {
    #[serde(rename = "type")]
    pub command_type: String,
    pub uuid: String,
    pub temp_id: Option<String>,
    #[serde(default)]
    pub args: Value,
}

/// Rejection of a single command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandError {
    pub code: i64,
    pub message: &'static str,
    pub http_code: u16,
}

pub const INVALID_TEMP_ID: CommandError = CommandError {
    code: 15,
    message: "Invalid temporary id",
    http_code: 400,
};
pub const ARGUMENT_MISSING: CommandError = CommandError {
    code: 19,
    message: "Required argument is missing",
    http_code: 400,
};
pub const INVALID_ARGUMENT: CommandError = CommandError {
    code: 20,
    message: "Invalid argument value",
    http_code: 400,
};
pub const PROJECT_NOT_FOUND: CommandError = CommandError {
    code: 21,
    message: "Project not found",
    http_code: 404,
};
pub const ITEM_NOT_FOUND: CommandError = CommandError {
    code: 22,
    message: "Item not found",
    http_code: 404,
};
pub const UNKNOWN_COMMAND: CommandError = CommandError {
    code: 30,
    message: "Unknown command",
    http_code: 400,
};

#[derive(Debug)]
pub struct Store {
    pub items: BTreeMap<String, Item>,
    pub projects: BTreeMap<String, Project>,
    next_id: u64,
}

impl Default for Store {
    fn default() -> Self {
        let mut projects = BTreeMap::new();
        projects.insert(
            INBOX_PROJECT_ID.to_string(),
            Project {
                id: INBOX_PROJECT_ID.to_string(),
                name: "Inbox".to_string(),
                parent_id: None,
                color: None,
                is_favorite: false,
                is_archived: false,
            },
        );
        Self {
            items: BTreeMap::new(),
            projects,
            next_id: FIRST_ID,
        }
    }
}

type Applied = Result<Option<String>, CommandError>;

impl Store {
    /// Apply one command. `mapping` holds the temp ids resolved earlier in the
    /// same request. Returns the id of a created entity, if any.
    pub fn apply(&mut self, cmd: &WireCommand, mapping: &HashMap<String, String>) -> Applied {
        if let Some(temp_id) = &cmd.temp_id {
            if temp_id.is_empty() || mapping.contains_key(temp_id) {
                return Err(INVALID_TEMP_ID);
            }
        }
        let args = Args {
            value: &cmd.args,
            mapping,
        };
        match cmd.command_type.as_str() {
            "item_add" => self.item_add(&args),
            "item_update" => self.item_update(&args),
            "item_delete" => self.item_delete(&args),
            "item_close" => self.item_close(&args),
            "item_complete" => self.item_set_checked(&args, true),
            "item_uncomplete" => self.item_set_checked(&args, false),
            "item_update_date_complete" => self.item_update_date_complete(&args),
            "item_move" => self.item_move(&args),
            "item_reorder" => self.item_reorder(&args),
            "item_update_day_orders" => self.item_update_day_orders(&args),
            "project_add" => self.project_add(&args),
            "project_update" => self.project_update(&args),
            "project_delete" => self.project_delete(&args),
            "project_archive" => self.project_set_archived(&args, true),
            "project_unarchive" => self.project_set_archived(&args, false),
            _ => Err(UNKNOWN_COMMAND),
        }
    }

    fn allocate_id(&mut self) -> String {
        let id = self.next_id;
        self.next_id += 1;
        id.to_string()
    }

    fn item_mut(&mut self, id: &str) -> Result<&mut Item, CommandError> {
        self.items.get_mut(id).ok_or(ITEM_NOT_FOUND)
    }

    fn existing_project(&self, id: String) -> Result<String, CommandError> {
        if self.projects.contains_key(&id) {
            Ok(id)
        } else {
            Err(PROJECT_NOT_FOUND)
        }
    }

    fn existing_item(&self, id: String) -> Result<String, CommandError> {
        if self.items.contains_key(&id) {
            Ok(id)
        } else {
            Err(ITEM_NOT_FOUND)
        }
    }

    fn item_add(&mut self, args: &Args) -> Applied {
        let content = args.required_str("content")?;
        if content.trim().is_empty() {
            return Err(INVALID_ARGUMENT);
        }
        let project_id = match args.id("project_id")? {
            Some(id) => self.existing_project(id)?,
            None => INBOX_PROJECT_ID.to_string(),
        };
        let parent_id = args.id("parent_id")?.map(|id| self.existing_item(id)).transpose()?;
        let priority = args.priority()?.unwrap_or(1);
        let child_order = match args.int("child_order")? {
            Some(order) => order,
            None => self.items.values().filter(|i| i.project_id == project_id).count() as i64 + 1,
        };

        let id = self.allocate_id();
        self.items.insert(
            id.clone(),
            Item {
                id: id.clone(),
                content: content.to_string(),
                description: args.str("description")?.unwrap_or_default().to_string(),
                project_id,
                section_id: args.id("section_id")?,
                parent_id,
                priority,
                checked: false,
                child_order,
                day_order: -1,
                labels: args.labels()?.unwrap_or_default(),
                due: args.value.get("due").cloned(),
            },
        );
        Ok(Some(id))
    }

    fn item_update(&mut self, args: &Args) -> Applied {
        let id = args.required_id("id")?;
        let content = args.str("content")?;
        let description = args.str("description")?;
        let priority = args.priority()?;
        let labels = args.labels()?;
        let due = args.value.get("due").cloned();

        let item = self.item_mut(&id)?;
        if let Some(content) = content {
            item.content = content.to_string();
        }
        if let Some(description) = description {
            item.description = description.to_string();
        }
        if let Some(priority) = priority {
            item.priority = priority;
        }
        if let Some(labels) = labels {
            item.labels = labels;
        }
        if let Some(due) = due {
            item.due = Some(due);
        }
        Ok(None)
    }

    fn item_delete(&mut self, args: &Args) -> Applied {
        let id = self.existing_item(args.required_id("id")?)?;
        let mut doomed = vec![id];
        while let Some(id) = doomed.pop() {
            self.items.remove(&id);
            doomed.extend(
                self.items
                    .values()
                    .filter(|item| item.parent_id.as_deref() == Some(id.as_str()))
                    .map(|item| item.id.clone()),
            );
        }
        Ok(None)
    }

    /// Recurring tasks move to their next occurrence instead of being checked.
    fn item_close(&mut self, args: &Args) -> Applied {
        let item = self.item_mut(&args.required_id("id")?)?;
        let recurring = item
            .due
            .as_ref()
            .and_then(|due| due.get("string"))
            .and_then(Value::as_str)
            .is_some_and(|s| s.starts_with("every"));
        if !recurring {
            item.checked = true;
        }
        Ok(None)
    }

    fn item_set_checked(&mut self, args: &Args, checked: bool) -> Applied {
        self.item_mut(&args.required_id("id")?)?.checked = checked;
        Ok(None)
    }

    fn item_update_date_complete(&mut self, args: &Args) -> Applied {
        let due = args.value.get("due").cloned();
        let item = self.item_mut(&args.required_id("id")?)?;
        if due.is_some() {
            item.due = due;
        }
        item.checked = false;
        Ok(None)
    }

    fn item_move(&mut self, args: &Args) -> Applied {
        let id = self.existing_item(args.required_id("id")?)?;
        let project_id = args.id("project_id")?;
        let section_id = args.id("section_id")?;
        let parent_id = args.id("parent_id")?;

        match (project_id, section_id, parent_id) {
            (Some(project_id), None, None) => {
                let project_id = self.existing_project(project_id)?;
                let item = self.item_mut(&id)?;
                item.project_id = project_id;
                item.parent_id = None;
                item.section_id = None;
            }
            (None, Some(section_id), None) => {
                let item = self.item_mut(&id)?;
                item.section_id = Some(section_id);
                item.parent_id = None;
            }
            (None, None, Some(parent_id)) => {
                if parent_id == id {
                    return Err(INVALID_ARGUMENT);
                }
                let project_id = self.items.get(&parent_id).ok_or(ITEM_NOT_FOUND)?.project_id.clone();
                let item = self.item_mut(&id)?;
                item.parent_id = Some(parent_id);
                item.project_id = project_id;
            }
            (None, None, None) => return Err(ARGUMENT_MISSING),
            _ => return Err(INVALID_ARGUMENT),
        }
        Ok(None)
    }

    fn item_reorder(&mut self, args: &Args) -> Applied {
        let entries = args.value.get("items").and_then(Value::as_array).ok_or(ARGUMENT_MISSING)?;
        let mut orders = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = Args {
                value: entry,
                mapping: args.mapping,
            };
            let id = self.existing_item(entry.required_id("id")?)?;
            let order = entry.int("child_order")?.ok_or(ARGUMENT_MISSING)?;
            orders.push((id, order));
        }
        for (id, order) in orders {
            self.item_mut(&id)?.child_order = order;
        }
        Ok(None)
    }

    fn item_update_day_orders(&mut self, args: &Args) -> Applied {
        let map = args
            .value
            .get("ids_to_orders")
            .and_then(Value::as_object)
            .ok_or(ARGUMENT_MISSING)?;
        let mut orders = Vec::with_capacity(map.len());
        for (id, order) in map {
            let id = self.existing_item(args.resolve(id))?;
            orders.push((id, order.as_i64().ok_or(INVALID_ARGUMENT)?));
        }
        for (id, order) in orders {
            self.item_mut(&id)?.day_order = order;
        }
        Ok(None)
    }

    fn project_add(&mut self, args: &Args) -> Applied {
        let name = args.required_str("name")?;
        if name.trim().is_empty() {
            return Err(INVALID_ARGUMENT);
        }
        let parent_id = args.id("parent_id")?.map(|id| self.existing_project(id)).transpose()?;
        let id = self.allocate_id();
        self.projects.insert(
            id.clone(),
            Project {
                id: id.clone(),
                name: name.to_string(),
                parent_id,
                color: args.str("color")?.map(str::to_string),
                is_favorite: args.bool("is_favorite")?.unwrap_or(false),
                is_archived: false,
            },
        );
        Ok(Some(id))
    }

    fn project_update(&mut self, args: &Args) -> Applied {
        let id = args.required_id("id")?;
        let name = args.str("name")?;
        let color = args.str("color")?;
        let is_favorite = args.bool("is_favorite")?;

        let project = self.projects.get_mut(&id).ok_or(PROJECT_NOT_FOUND)?;
        if let Some(name) = name {
            project.name = name.to_string();
        }
        if let Some(color) = color {
            project.color = Some(color.to_string());
        }
        if let Some(is_favorite) = is_favorite {
            project.is_favorite = is_favorite;
        }
        Ok(None)
    }

    fn project_delete(&mut self, args: &Args) -> Applied {
        let id = self.existing_project(args.required_id("id")?)?;
        if id == INBOX_PROJECT_ID {
            return Err(INVALID_ARGUMENT);
        }
        self.projects.remove(&id);
        self.items.retain(|_, item| item.project_id != id);
        Ok(None)
    }

    fn project_set_archived(&mut self, args: &Args, archived: bool) -> Applied {
        let id = args.required_id("id")?;
        if id == INBOX_PROJECT_ID {
            return Err(INVALID_ARGUMENT);
        }
        self.projects.get_mut(&id).ok_or(PROJECT_NOT_FOUND)?.is_archived = archived;
        Ok(None)
    }
}

/// Typed access to a command's `args` object.
struct Args<'a> {
    value: &'a Value,
    mapping: &'a HashMap<String, String>,
}

impl<'a> Args<'a> {
    /// Replace a temp id created earlier in the request by its real id.
    fn resolve(&self, id: &str) -> String {
        self.mapping.get(id).cloned().unwrap_or_else(|| id.to_string())
    }

    fn str(&self, key: &str) -> Result<Option<&'a str>, CommandError> {
        match self.value.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(INVALID_ARGUMENT),
        }
    }

    fn required_str(&self, key: &str) -> Result<&'a str, CommandError> {
        self.str(key)?.ok_or(ARGUMENT_MISSING)
    }

    fn id(&self, key: &str) -> Result<Option<String>, CommandError> {
        match self.value.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(self.resolve(s))),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(INVALID_ARGUMENT),
        }
    }

    fn required_id(&self, key: &str) -> Result<String, CommandError> {
        self.id(key)?.ok_or(ARGUMENT_MISSING)
    }

    fn int(&self, key: &str) -> Result<Option<i64>, CommandError> {
        match self.value.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v.as_i64().map(Some).ok_or(INVALID_ARGUMENT),
        }
    }

    fn bool(&self, key: &str) -> Result<Option<bool>, CommandError> {
        match self.value.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v.as_bool().map(Some).ok_or(INVALID_ARGUMENT),
        }
    }

    fn priority(&self) -> Result<Option<u8>, CommandError> {
        match self.int("priority")? {
            None => Ok(None),
            Some(p @ 1..=4) => Ok(Some(p as u8)),
            Some(_) => Err(INVALID_ARGUMENT),
        }
    }

    fn labels(&self) -> Result<Option<Vec<String>>, CommandError> {
        match self.value.get("labels") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(values)) => values
                .iter()
                .map(|v| v.as_str().map(str::to_string).ok_or(INVALID_ARGUMENT))
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(_) => Err(INVALID_ARGUMENT),
        }
    }
}

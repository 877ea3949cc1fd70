//! CLI command implementations

use crate::report::{Reporter, truncate};
use anyhow::{Result, anyhow, bail};
use colored::Colorize;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tabled::{Table, Tabled, settings::Style};
use twig_core::{
    Config, Error, FileStorage, LoggingObserver, StatusFilter, TodoRecord, TodoStore,
};

/// Resolved settings shared by every command
pub struct Context {
    config: Config,
    config_path: PathBuf,
    data_dir: PathBuf,
    json: bool,
}

impl Context {
    pub fn new(config_path: Option<PathBuf>, data_dir: Option<PathBuf>, json: bool) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => Config::default_path()?,
        };
        let config = Config::load(&config_path)?;
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => config.data_dir()?,
        };

        if !config.display.colors {
            colored::control::set_override(false);
        }

        tracing::debug!(
            config = %config_path.display(),
            data_dir = %data_dir.display(),
            "resolved paths"
        );

        Ok(Self {
            config,
            config_path,
            data_dir,
            json,
        })
    }

    /// Open the file-backed store with the output observers attached
    fn open_store(&self) -> Result<TodoStore<FileStorage>> {
        let storage = FileStorage::new(self.data_dir.clone())?;
        let mut store = TodoStore::open(storage, self.config.store_options());
        store.subscribe(LoggingObserver);
        if !self.json {
            store.subscribe(Reporter::new(self.config.display.max_task_length));
        }
        Ok(store)
    }

    fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(value)?);
        }
        Ok(())
    }
}

pub fn add(ctx: &Context, task: &str, due: Option<String>, parent: Option<String>) -> Result<()> {
    if task.trim().is_empty() {
        bail!("Task cannot be empty");
    }

    let mut store = ctx.open_store()?;
    if let Some(ref parent_id) = parent
        && store.get(parent_id).is_none()
    {
        return Err(Error::NotFound(parent_id.clone()).into());
    }

    let todo = store.add(task, due.as_deref(), parent.as_deref())?;
    ctx.print_json(&todo)
}

pub fn edit(ctx: &Context, id: &str, task: &str) -> Result<()> {
    if task.trim().is_empty() {
        bail!("Task cannot be empty");
    }

    let mut store = ctx.open_store()?;
    let todo = store
        .edit(id, task)?
        .ok_or_else(|| Error::NotFound(id.to_string()))?;
    ctx.print_json(&todo)
}

pub fn rm(ctx: &Context, id: &str) -> Result<()> {
    let mut store = ctx.open_store()?;
    let todo = store
        .delete(id)?
        .ok_or_else(|| Error::NotFound(id.to_string()))?;
    ctx.print_json(&todo)
}

pub fn done(ctx: &Context, id: &str) -> Result<()> {
    let mut store = ctx.open_store()?;
    let todo = store
        .toggle_status(id)?
        .ok_or_else(|| Error::NotFound(id.to_string()))?;
    ctx.print_json(&todo)
}

pub fn expand(ctx: &Context, id: &str) -> Result<()> {
    let mut store = ctx.open_store()?;
    if store.get(id).is_none() {
        return Err(Error::NotFound(id.to_string()).into());
    }

    match store.toggle_expanded(id)? {
        Some(todo) => ctx.print_json(&todo),
        None if ctx.json => ctx.print_json(&serde_json::Value::Null),
        None => {
            println!("{} has no subtasks", id.cyan());
            Ok(())
        }
    }
}

pub fn show(ctx: &Context, id: &str) -> Result<()> {
    let store = ctx.open_store()?;
    let todo = store
        .get(id)
        .ok_or_else(|| Error::NotFound(id.to_string()))?;

    if ctx.json {
        return ctx.print_json(todo);
    }

    let date_format = ctx.config.display.date_format.as_str();
    println!("{} {}", todo.id.cyan().bold(), todo.original_task.bold());
    println!();
    println!("Status:   {}", todo.status);
    println!("Due:      {}", todo.due_date.as_deref().unwrap_or("-"));
    println!("Priority: {}", todo.priority);
    if let Some(ref parent) = todo.parent_id {
        println!("Parent:   {}", parent);
    }
    println!("Created:  {}", todo.created_at.format(date_format));
    println!("Updated:  {}", todo.updated_at.format(date_format));

    let subtasks = store.subtasks_of(id);
    if !subtasks.is_empty() {
        println!();
        println!("{}", "Subtasks:".bold());
        for child in subtasks {
            print_row(child, 1, ctx.config.display.max_task_length);
        }
    }

    Ok(())
}

pub fn list(ctx: &Context, status: Option<String>, search: Option<String>) -> Result<()> {
    let store = ctx.open_store()?;
    let filter: StatusFilter = status
        .as_deref()
        .unwrap_or(&ctx.config.default_filter)
        .parse()?;
    let todos = store.filter(filter, search.as_deref());

    if ctx.json {
        return ctx.print_json(&todos);
    }
    if todos.is_empty() {
        println!("No todos found");
        return Ok(());
    }

    let visible: HashSet<&str> = todos.iter().map(|t| t.id.as_str()).collect();
    let max = ctx.config.display.max_task_length;

    for todo in &todos {
        // Subtasks of a listed parent are printed under it
        if let Some(ref parent) = todo.parent_id
            && visible.contains(parent.as_str())
        {
            continue;
        }
        print_row(todo, 0, max);

        if !todo.has_subtasks() {
            continue;
        }
        if todo.expanded || ctx.config.display.show_subtasks {
            for child_id in &todo.subtasks {
                if let Some(child) = todos.iter().find(|t| &t.id == child_id) {
                    print_row(child, 1, max);
                }
            }
        } else {
            println!(
                "    {}",
                format!("(+{} subtask(s))", todo.subtasks.len()).dimmed()
            );
        }
    }

    Ok(())
}

fn print_row(todo: &TodoRecord, depth: usize, max: usize) {
    let indent = "  ".repeat(depth);
    let check = if todo.completed {
        "[x]".green()
    } else {
        "[ ]".normal()
    };
    let task = truncate(&todo.original_task, max);
    let task = if todo.completed {
        task.dimmed()
    } else {
        task.normal()
    };
    match todo.due_date {
        Some(ref due) => println!(
            "{}{} {} {} {}",
            indent,
            check,
            todo.id.cyan(),
            task,
            format!("(due {})", due).yellow()
        ),
        None => println!("{}{} {} {}", indent, check, todo.id.cyan(), task),
    }
}

pub fn move_todo(ctx: &Context, id: &str, position: usize) -> Result<()> {
    let mut store = ctx.open_store()?;
    if store.get(id).is_none() {
        return Err(Error::NotFound(id.to_string()).into());
    }

    let mut order: Vec<String> = store
        .filter(StatusFilter::All, None)
        .iter()
        .map(|t| t.id.clone())
        .filter(|t| t != id)
        .collect();
    let index = position.saturating_sub(1).min(order.len());
    order.insert(index, id.to_string());

    store.reorder(order)?;
    ctx.print_json(store.order())
}

pub fn order(ctx: &Context, ids: Vec<String>) -> Result<()> {
    let mut store = ctx.open_store()?;
    let unknown: Vec<&String> = ids.iter().filter(|id| store.get(id).is_none()).collect();
    if !unknown.is_empty() {
        tracing::warn!(?unknown, "order names ids that are not in the list");
    }

    store.reorder(ids)?;
    ctx.print_json(store.order())
}

pub fn clear(ctx: &Context, yes: bool) -> Result<()> {
    let mut store = ctx.open_store()?;

    if store.is_empty() {
        if ctx.json {
            println!(r#"{{"cleared": 0}}"#);
        } else {
            println!("Nothing to clear");
        }
        return Ok(());
    }

    if !yes {
        println!(
            "{}",
            format!("This will remove all {} todo(s).", store.len()).red()
        );
        print!("Continue? [y/N] ");
        std::io::Write::flush(&mut std::io::stdout())?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted");
            return Ok(());
        }
    }

    let snapshot = store.clear_all()?;
    if ctx.json {
        println!(r#"{{"cleared": {}}}"#, snapshot.len());
    }
    Ok(())
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

pub fn stats(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let stats = store.statistics();

    if ctx.json {
        return ctx.print_json(&stats);
    }

    let rows = vec![
        StatRow {
            metric: "Total",
            value: stats.total.to_string(),
        },
        StatRow {
            metric: "Completed",
            value: stats.completed.to_string(),
        },
        StatRow {
            metric: "Pending",
            value: stats.pending.to_string(),
        },
        StatRow {
            metric: "Progress",
            value: format!("{}%", stats.completion_percentage),
        },
        StatRow {
            metric: "Including subtasks",
            value: format!(
                "{}/{}",
                stats.completed_including_subtasks, stats.total_including_subtasks
            ),
        },
    ];
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

/// Show current configuration
pub fn config_show(ctx: &Context) -> Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&ctx.config)?);
    } else {
        println!("{}", "Current configuration:".bold());
        println!();
        let content = toml::to_string_pretty(&ctx.config)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;
        print!("{}", content);
    }
    Ok(())
}

/// Print the config file location
pub fn config_path(ctx: &Context) -> Result<()> {
    if ctx.json {
        println!(
            "{}",
            serde_json::json!({
                "config": ctx.config_path,
                "data_dir": ctx.data_dir,
            })
        );
    } else {
        println!("config:   {}", ctx.config_path.display());
        println!("data dir: {}", ctx.data_dir.display());
    }
    Ok(())
}

/// Reset configuration to defaults
pub fn config_reset(ctx: &Context) -> Result<()> {
    if let Some(parent) = ctx.config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&ctx.config_path, Config::default_with_comments())?;
    println!("{} Configuration reset to defaults", "✓".green());
    Ok(())
}

/// Get a specific config value
pub fn config_get(ctx: &Context, key: &str) -> Result<()> {
    // Convert config to JSON for key lookup
    let config_json = serde_json::to_value(&ctx.config)?;

    let mut value = &config_json;
    for part in key.split('.') {
        value = value
            .get(part)
            .ok_or_else(|| anyhow!("Config key not found: {}", key))?;
    }

    if ctx.json {
        println!("{}", serde_json::to_string(value)?);
    } else {
        match value {
            serde_json::Value::String(s) => println!("{}", s),
            serde_json::Value::Bool(b) => println!("{}", b),
            serde_json::Value::Number(n) => println!("{}", n),
            serde_json::Value::Null => println!("null"),
            _ => println!("{}", serde_json::to_string_pretty(value)?),
        }
    }
    Ok(())
}

/// Set a config value
pub fn config_set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let mut config = ctx.config.clone();

    match key {
        "id_prefix" => {
            if value.is_empty() || value.contains(char::is_whitespace) {
                bail!("Invalid id prefix: {:?}", value);
            }
            config.id_prefix = value.to_string();
        }
        "data_dir" => config.data_dir = Some(PathBuf::from(value)),
        "default_filter" => {
            let filter: StatusFilter = value.parse()?;
            config.default_filter = filter.to_string();
        }
        "storage.todos_key" => config.storage.todos_key = value.to_string(),
        "storage.order_key" => config.storage.order_key = value.to_string(),
        "display.colors" => {
            config.display.colors = value
                .parse()
                .map_err(|_| anyhow!("Invalid boolean value: {}", value))?;
        }
        "display.date_format" => config.display.date_format = value.to_string(),
        "display.show_subtasks" => {
            config.display.show_subtasks = value
                .parse()
                .map_err(|_| anyhow!("Invalid boolean value: {}", value))?;
        }
        "display.max_task_length" => {
            config.display.max_task_length = value
                .parse()
                .map_err(|_| anyhow!("Invalid integer value: {}", value))?;
        }
        _ => bail!("Unknown config key: {}", key),
    }

    config.save(&ctx.config_path)?;
    println!("{} Set {} = {}", "✓".green(), key, value);
    Ok(())
}

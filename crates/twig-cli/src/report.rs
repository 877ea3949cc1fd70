//! Terminal output for store events

use colored::Colorize;
use twig_core::{Observer, TodoEvent, TodoRecord};

/// Prints a confirmation line for every store change
pub struct Reporter {
    max_task_length: usize,
}

impl Reporter {
    pub fn new(max_task_length: usize) -> Self {
        Self { max_task_length }
    }

    fn label(&self, todo: &TodoRecord) -> String {
        format!(
            "{} {}",
            todo.id.cyan(),
            truncate(&todo.original_task, self.max_task_length)
        )
    }
}

impl Observer for Reporter {
    fn on_event(&mut self, event: &TodoEvent) {
        let check = "✓".green();
        match event {
            TodoEvent::Added(todo) => match todo.parent_id {
                Some(ref parent) => {
                    println!("{} Added subtask {} under {}", check, self.label(todo), parent)
                }
                None => println!("{} Added {}", check, self.label(todo)),
            },
            TodoEvent::Updated(todo) => println!("{} Updated {}", check, self.label(todo)),
            TodoEvent::Deleted(todo) => {
                if todo.has_subtasks() {
                    println!(
                        "{} Deleted {} and {} subtask(s)",
                        check,
                        self.label(todo),
                        todo.subtasks.len()
                    );
                } else {
                    println!("{} Deleted {}", check, self.label(todo));
                }
            }
            TodoEvent::StatusChanged(todo) => {
                let status = if todo.completed {
                    todo.status.to_string().green()
                } else {
                    todo.status.to_string().yellow()
                };
                println!("{} Marked {} {}", check, self.label(todo), status);
            }
            TodoEvent::ExpansionChanged(todo) => {
                let verb = if todo.expanded { "Expanded" } else { "Collapsed" };
                println!("{} {} {}", check, verb, self.label(todo));
            }
            TodoEvent::Cleared(snapshot) => {
                println!("{} Cleared {} todo(s)", check, snapshot.len())
            }
            TodoEvent::Reordered(order) => {
                println!("{} Saved order of {} todo(s)", check, order.len())
            }
        }
    }
}

/// Cut `text` to `max` chars, marking the cut with "..."
pub fn truncate(text: &str, max: usize) -> String {
    if max < 4 || text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max - 3).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 80), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
        assert_eq!(truncate("ünïcödé text", 7), "ünïc...");
    }
}

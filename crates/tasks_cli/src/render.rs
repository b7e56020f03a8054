use tabled::settings::Style;
use tabled::{Table, Tabled};
use tasks_core::model::{TaskState, Todo};

#[derive(Tabled)]
struct TodoRow<'a> {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Text")]
    text: &'a str,
}

pub fn status_label(todo: &Todo) -> &'static str {
    if todo.completed { "completed" } else { "pending" }
}

pub fn summary_line(state: &TaskState) -> String {
    format!(
        "{} tasks, {} completed, {} pending",
        state.length(),
        state.completed(),
        state.pending()
    )
}

pub fn state_table(state: &TaskState) -> String {
    let rows = state.todos().iter().map(|todo| TodoRow {
        id: todo.id.0,
        status: status_label(todo),
        text: &todo.text,
    });
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    table.to_string()
}

pub fn state_plain(state: &TaskState) -> String {
    if state.todos().is_empty() {
        return format!("No tasks\n{}", summary_line(state));
    }
    format!("{}\n{}", state_table(state), summary_line(state))
}

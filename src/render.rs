use std::fmt::Write;

use taskdesk::core::task::Task;
use taskdesk::core::user::User;
use taskdesk::dashboard::Dashboard;

const HEADERS: [&str; 6] = ["No", "Id", "Title", "Description", "Deadline", "Status"];
const MAX_CELL: usize = 40;

fn cell(text: &str) -> String {
    let flat = text.replace(['\n', '\r', '\t'], " ");
    if flat.chars().count() > MAX_CELL {
        let mut cut: String = flat.chars().take(MAX_CELL - 1).collect();
        cut.push('…');
        cut
    } else {
        flat
    }
}

pub fn user_line(user: &User) -> String {
    match &user.email {
        Some(email) => format!("{} <{}>", user.name, email),
        None => user.name.clone(),
    }
}

pub fn task_line(task: &Task) -> String {
    format!("#{} {} (due {}, {})", task.id, task.title, task.deadline, task.status.label())
}

/// Greeting, task table and pagination footer.
pub fn dashboard(dashboard: &Dashboard) -> String {
    let page = dashboard.page();
    let mut out = String::new();

    let _ = writeln!(out, "Task Management System");
    if let Some(name) = dashboard.user_name() {
        let _ = writeln!(out, "Hello, {}", name);
    }
    if let Some(notice) = dashboard.notice() {
        let _ = writeln!(out, "! {}", notice);
    }
    let _ = writeln!(out);

    let rows: Vec<[String; 6]> = page
        .visible
        .iter()
        .enumerate()
        .map(|(i, task)| {
            [
                page.row_number(i).to_string(),
                cell(task.id.as_str()),
                cell(&task.title),
                cell(&task.description),
                cell(&task.deadline),
                cell(task.status.label()),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (w, value) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(value.chars().count());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    let _ = writeln!(out, "{}", line(&header));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", line(&rule));

    if rows.is_empty() {
        let _ = writeln!(out, "(no tasks)");
    }
    for row in &rows {
        let _ = writeln!(out, "{}", line(row));
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Rows per page: {}    {}    Page {} of {}",
        dashboard.view().rows_per_page(),
        page.range_label(),
        dashboard.view().current_page(),
        page.total_pages.max(1)
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_cells_are_cut() {
        let long = "x".repeat(100);
        let c = cell(&long);
        assert_eq!(c.chars().count(), MAX_CELL);
        assert!(c.ends_with('…'));
        assert_eq!(cell("two\nlines"), "two lines");
    }

    #[test]
    fn task_line_uses_status_label() {
        let task = Task {
            id: "4".into(),
            title: "Ship it".into(),
            description: String::new(),
            deadline: "2025-09-01".into(),
            status: taskdesk::core::task::TaskStatus::InProgress,
        };
        assert_eq!(task_line(&task), "#4 Ship it (due 2025-09-01, In Progress)");
    }

    #[test]
    fn empty_dashboard_renders_footer() {
        let out = dashboard(&Dashboard::new(10));
        assert!(out.contains("(no tasks)"));
        assert!(out.contains("0 - 0 of 0"));
        assert!(out.contains("Page 1 of 1"));
    }
}

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

mod render;

use taskdesk::api::ApiClient;
use taskdesk::auth::{self, LoginForm, RegisterForm};
use taskdesk::config::TaskdeskConfig;
use taskdesk::core::id::Id;
use taskdesk::core::task::TaskStatus;
use taskdesk::dashboard::{Dashboard, LoadState, Message, SubmitOutcome};
use taskdesk::form::FormField;
use taskdesk::session::FileSessionStore;

#[derive(Parser)]
#[command(name = "taskdesk", version, about = "Manage your tasks on a taskdesk server")]
struct Cli {
    /// Backend base URL (overrides config and TASKDESK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug messages to the journal
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TASKDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "TASKDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// List tasks, optionally filtered and paged
    List {
        #[arg(long, short)]
        search: Option<String>,
        #[arg(long, short, default_value_t = 1)]
        page: usize,
        /// Rows per page (10, 25, 50 or 100)
        #[arg(long, short, value_parser = parse_rows)]
        rows: Option<usize>,
    },
    /// Create a task
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// YYYY-MM-DD
        #[arg(long)]
        deadline: String,
        #[arg(long, default_value_t = TaskStatus::Pending)]
        status: TaskStatus,
    },
    /// Change fields of an existing task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        deadline: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Delete a task
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

fn parse_rows(s: &str) -> Result<usize, String> {
    let rows: usize = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if taskdesk::view::ROWS_PER_PAGE_OPTIONS.contains(&rows) {
        Ok(rows)
    } else {
        Err(format!(
            "rows per page must be one of {:?}",
            taskdesk::view::ROWS_PER_PAGE_OPTIONS
        ))
    }
}

/// Journal logger that passes this crate at info/debug and everything else at warn.
struct FilteredJournal {
    inner: systemd_journal_logger::JournalLog,
}

impl log::Log for FilteredJournal {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        if metadata.target().starts_with("taskdesk") {
            let max = if taskdesk::debug_logging() { log::LevelFilter::Debug } else { log::LevelFilter::Info };
            metadata.level() <= max
        } else {
            metadata.level() <= log::LevelFilter::Warn
        }
    }
    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            self.inner.log(record);
        }
    }
    fn flush(&self) {
        self.inner.flush();
    }
}

// Logging goes to the systemd user journal (`journalctl --user -t taskdesk -f`).
// Without a journal, logging stays off.
fn init_logging() {
    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => journal.with_syslog_identifier("taskdesk".to_string()),
        Err(_) => return,
    };
    if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
        // Global max must be Debug so taskdesk debug logs can pass through when enabled
        log::set_max_level(log::LevelFilter::Debug);
    }
}

fn confirm(prompt: &str) -> std::io::Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(TaskdeskConfig::default_path);
    let mut config = TaskdeskConfig::load(&config_path)?.with_env_overrides();
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }

    taskdesk::set_debug_logging(config.debug_logging || cli.debug);
    init_logging();

    let store = Arc::new(FileSessionStore::new(config.session_path()));
    let api = ApiClient::new(&config.api_base_url, store)?;

    match cli.command {
        Command::Login { email, password } => {
            let mut form = LoginForm::new(email, password);
            match form.submit(&api).await {
                Ok(session) => {
                    let name = session.user.map(|u| u.name).unwrap_or_default();
                    println!("Logged in. Welcome, {}!", name);
                }
                Err(_) => {
                    let message = form.error.as_deref().unwrap_or(auth::LOGIN_UNREACHABLE);
                    return Err(message.into());
                }
            }
        }

        Command::Register { name, email, password } => {
            let mut form = RegisterForm::new(name, email, password);
            if form.submit(&api).await.is_err() {
                for (field, messages) in &form.field_errors.fields {
                    for message in messages {
                        eprintln!("  {}: {}", field, message);
                    }
                }
                let message = form.error.clone().unwrap_or_else(|| "Registration failed".into());
                return Err(message.into());
            }
            println!("{}", auth::REGISTERED);
        }

        Command::Logout => {
            api.logout()?;
            println!("Logged out.");
        }

        Command::Whoami => match api.session().load()? {
            Some(session) => match session.user {
                Some(user) => println!("{}", render::user_line(&user)),
                None => println!("Logged in (no profile stored)"),
            },
            None => println!("Not logged in"),
        },

        Command::List { search, page, rows } => {
            let mut dashboard = Dashboard::new(rows.unwrap_or(config.rows_per_page));
            dashboard.mount(&api).await;
            if let LoadState::Failed(message) = dashboard.load_state() {
                return Err(message.clone().into());
            }
            if let Some(term) = search {
                dashboard.update(Message::SearchChanged(term));
            }
            dashboard.update(Message::GoToPage(page));
            print!("{}", render::dashboard(&dashboard));
        }

        Command::Add { title, description, deadline, status } => {
            let mut dashboard = Dashboard::new(config.rows_per_page);
            dashboard.update(Message::OpenCreate);
            dashboard.update(Message::FormFieldChanged(FormField::Title, title));
            dashboard.update(Message::FormFieldChanged(FormField::Description, description));
            dashboard.update(Message::FormFieldChanged(FormField::Deadline, deadline));
            dashboard.update(Message::FormStatusChanged(status));
            submit(&mut dashboard, &api).await?;
        }

        Command::Edit { id, title, description, deadline, status } => {
            let id = Id::from(id);
            let mut dashboard = Dashboard::new(config.rows_per_page);
            dashboard.mount(&api).await;
            if let LoadState::Failed(message) = dashboard.load_state() {
                return Err(message.clone().into());
            }
            dashboard.update(Message::OpenEdit(id));
            if let Some(notice) = dashboard.notice() {
                return Err(notice.to_string().into());
            }
            let fields = [
                (FormField::Title, title),
                (FormField::Description, description),
                (FormField::Deadline, deadline),
            ];
            for (field, value) in fields {
                if let Some(value) = value {
                    dashboard.update(Message::FormFieldChanged(field, value));
                }
            }
            if let Some(status) = status {
                dashboard.update(Message::FormStatusChanged(status));
            }
            submit(&mut dashboard, &api).await?;
        }

        Command::Delete { id, yes } => {
            let id = Id::from(id);
            if !yes && !confirm("Are you sure you want to delete this task?")? {
                println!("Cancelled.");
                return Ok(());
            }
            let mut dashboard = Dashboard::new(config.rows_per_page);
            if dashboard.delete(&api, &id).await.is_err() {
                let message = dashboard.notice().unwrap_or("Failed to delete task").to_string();
                return Err(message.into());
            }
            println!("Deleted task {}. {} tasks remaining.", id, dashboard.tasks().len());
        }
    }

    Ok(())
}

async fn submit(dashboard: &mut Dashboard, api: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    let heading = dashboard.form().map(|f| f.heading()).unwrap_or_default();
    match dashboard.submit_form(api).await {
        Ok(SubmitOutcome::Saved { task, refreshed }) => {
            match task {
                Some(task) => println!("{}: saved {}", heading, render::task_line(&task)),
                None => println!("{}: saved", heading),
            }
            if !refreshed {
                if let Some(notice) = dashboard.notice() {
                    eprintln!("warning: {}", notice);
                }
            }
            Ok(())
        }
        Ok(SubmitOutcome::NoForm) => Ok(()),
        Err(_) => {
            let message = dashboard
                .form()
                .and_then(|f| f.error.clone())
                .unwrap_or_else(|| "Failed to save task".to_string());
            Err(message.into())
        }
    }
}

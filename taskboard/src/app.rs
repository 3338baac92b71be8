//! Interactive shell: command parsing, dispatch, and text rendering.
//!
//! [`App`] owns the [`Session`] and the [`BoardStore`]. After every command
//! it checks the session's identity channel and explicitly loads or unloads
//! the board, so a login, logout or email change is fully settled before
//! the next command sees the board.

use tokio::sync::watch;

use taskboard_proto::board::{ListId, Task, TaskId, TaskList};
use taskboard_proto::user::UserId;

use crate::board::{BoardLimits, BoardStore, ListView};
use crate::session::Session;
use crate::storage::KeyValueStore;

/// Shown for board commands while nobody is signed in.
pub const LOGIN_PROMPT: &str = "Please log in to manage your tasks.";

const HELP: &str = "\
Commands:
  login <email>                       sign in (no password needed)
  signup <email> [name...]            create a profile and sign in
  logout                              sign out
  whoami                              show the signed-in profile
  profile <email> [name...]           change your email (and name, if given)
  show | lists                        show the board
  new-list <name...>                  create a list
  add <list> <title...>               add a task to a list
  done <list> <task>                  toggle a task's completion
  edit <list> <task> <field> [value]  set title, details or due (empty clears)
  move <list> <task> <dest-list>      move a task to the end of another list
  rm <list> <task>                    delete a task
  rm-list <list>                      delete a list and all its tasks
  help                                show this help
  quit                                exit
Lists and tasks are referenced by id or by their number on screen.";

/// Editable task field for [`Command::Edit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    /// The task title.
    Title,
    /// Free-text details.
    Details,
    /// Free-text due date.
    Due,
}

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sign in with an email.
    Login {
        /// Email to sign in with.
        email: String,
    },
    /// Create a profile and sign in.
    Signup {
        /// Email to sign in with.
        email: String,
        /// Display name (may be empty).
        name: String,
    },
    /// Sign out.
    Logout,
    /// Show the signed-in profile.
    WhoAmI,
    /// Change the signed-in profile.
    Profile {
        /// New email.
        email: String,
        /// New display name; `None` keeps the current one.
        name: Option<String>,
    },
    /// Render the board.
    Show,
    /// Create a list.
    NewList {
        /// List name.
        name: String,
    },
    /// Add a task to a list.
    AddTask {
        /// List reference.
        list: String,
        /// Task title.
        title: String,
    },
    /// Toggle a task's completion.
    Toggle {
        /// List reference.
        list: String,
        /// Task reference.
        task: String,
    },
    /// Replace one field of a task.
    Edit {
        /// List reference.
        list: String,
        /// Task reference.
        task: String,
        /// Field to set.
        field: TaskField,
        /// New value; empty clears optional fields.
        value: String,
    },
    /// Move a task to another list.
    Move {
        /// Source list reference.
        list: String,
        /// Task reference.
        task: String,
        /// Destination list reference.
        dest: String,
    },
    /// Delete a task.
    RemoveTask {
        /// List reference.
        list: String,
        /// Task reference.
        task: String,
    },
    /// Delete a list and its tasks.
    RemoveList {
        /// List reference.
        list: String,
    },
    /// Show usage.
    Help,
    /// Exit the shell.
    Quit,
}

/// Errors from [`Command::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The line was blank.
    #[error("empty command")]
    Empty,
    /// The first word is not a known command.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    /// A required argument is missing.
    #[error("usage: {0}")]
    Usage(&'static str),
    /// `edit` was given a field other than title, details or due.
    #[error("unknown field: {0} (expected title, details or due)")]
    UnknownField(String),
}

impl Command {
    /// Parses one input line.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for blank lines, unknown commands, unknown
    /// fields, or missing arguments.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let (word, rest) = next_word(line).ok_or(ParseError::Empty)?;
        let command = match word.to_ascii_lowercase().as_str() {
            "login" => {
                let (email, _) = next_word(rest).ok_or(ParseError::Usage("login <email>"))?;
                Self::Login {
                    email: email.to_string(),
                }
            }
            "signup" => {
                let (email, name) =
                    next_word(rest).ok_or(ParseError::Usage("signup <email> [name...]"))?;
                Self::Signup {
                    email: email.to_string(),
                    name: name.to_string(),
                }
            }
            "logout" => Self::Logout,
            "whoami" => Self::WhoAmI,
            "profile" => {
                let (email, name) =
                    next_word(rest).ok_or(ParseError::Usage("profile <email> [name...]"))?;
                Self::Profile {
                    email: email.to_string(),
                    name: (!name.is_empty()).then(|| name.to_string()),
                }
            }
            "show" | "lists" | "ls" => Self::Show,
            "new-list" => {
                if rest.is_empty() {
                    return Err(ParseError::Usage("new-list <name...>"));
                }
                Self::NewList {
                    name: rest.to_string(),
                }
            }
            "add" => {
                let (list, title) = next_word(rest)
                    .filter(|(_, title)| !title.is_empty())
                    .ok_or(ParseError::Usage("add <list> <title...>"))?;
                Self::AddTask {
                    list: list.to_string(),
                    title: title.to_string(),
                }
            }
            "done" | "toggle" => {
                let [list, task] = words(rest).ok_or(ParseError::Usage("done <list> <task>"))?;
                Self::Toggle { list, task }
            }
            "edit" => {
                const USAGE: &str = "edit <list> <task> <title|details|due> [value...]";
                let (list, rest) = next_word(rest).ok_or(ParseError::Usage(USAGE))?;
                let (task, rest) = next_word(rest).ok_or(ParseError::Usage(USAGE))?;
                let (field, value) = next_word(rest).ok_or(ParseError::Usage(USAGE))?;
                let field = match field.to_ascii_lowercase().as_str() {
                    "title" => TaskField::Title,
                    "details" | "notes" => TaskField::Details,
                    "due" | "due-date" => TaskField::Due,
                    _ => return Err(ParseError::UnknownField(field.to_string())),
                };
                Self::Edit {
                    list: list.to_string(),
                    task: task.to_string(),
                    field,
                    value: value.to_string(),
                }
            }
            "move" | "mv" => {
                let [list, task, dest] =
                    words(rest).ok_or(ParseError::Usage("move <list> <task> <dest-list>"))?;
                Self::Move { list, task, dest }
            }
            "rm" => {
                let [list, task] = words(rest).ok_or(ParseError::Usage("rm <list> <task>"))?;
                Self::RemoveTask { list, task }
            }
            "rm-list" => {
                let [list] = words(rest).ok_or(ParseError::Usage("rm-list <list>"))?;
                Self::RemoveList { list }
            }
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(ParseError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

/// Splits off the first whitespace-delimited word; the rest is trimmed.
fn next_word(input: &str) -> Option<(&str, &str)> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    Some((&input[..end], input[end..].trim_start()))
}

/// Reads at least `N` words; extra trailing words are ignored.
fn words<const N: usize>(input: &str) -> Option<[String; N]> {
    let mut iter = input.split_whitespace().map(str::to_string);
    let mut out: [String; N] = std::array::from_fn(|_| String::new());
    for slot in &mut out {
        *slot = iter.next()?;
    }
    Some(out)
}

/// The interactive board: session, board store, and identity wiring.
pub struct App<S: KeyValueStore + Clone> {
    session: Session<S>,
    board: BoardStore<S>,
    identity: watch::Receiver<Option<UserId>>,
    /// Whether the shell should exit.
    pub should_quit: bool,
}

impl<S: KeyValueStore + Clone> App<S> {
    /// Restores the signed-in user and loads their board.
    pub fn new(storage: S, limits: BoardLimits) -> Self {
        let session = Session::restore(storage.clone());
        let mut identity = session.subscribe();
        let mut board = BoardStore::new(storage, limits);
        let initial = identity.borrow_and_update().clone();
        if let Some(user) = initial {
            board.load(user);
        }
        Self {
            session,
            board,
            identity,
            should_quit: false,
        }
    }

    /// The session collaborator.
    #[must_use]
    pub const fn session(&self) -> &Session<S> {
        &self.session
    }

    /// The board store.
    #[must_use]
    pub const fn board(&self) -> &BoardStore<S> {
        &self.board
    }

    /// Parses and runs one input line, returning the lines to print.
    pub fn handle_line(&mut self, line: &str) -> Vec<String> {
        match Command::parse(line) {
            Ok(command) => self.execute(command),
            Err(ParseError::Empty) => Vec::new(),
            Err(e) => vec![e.to_string(), "Type `help` for commands.".to_string()],
        }
    }

    /// Runs a command, then settles any identity change it caused.
    pub fn execute(&mut self, command: Command) -> Vec<String> {
        tracing::debug!(?command, "executing command");
        let output = self.dispatch(command);
        self.sync_identity();
        output
    }

    /// Loads or unloads the board if the signed-in identity changed.
    fn sync_identity(&mut self) {
        if !self.identity.has_changed().unwrap_or(false) {
            return;
        }
        let user = self.identity.borrow_and_update().clone();
        match user {
            Some(user) => {
                self.board.load(user);
            }
            None => self.board.unload(),
        }
    }

    fn dispatch(&mut self, command: Command) -> Vec<String> {
        match command {
            Command::Help => HELP.lines().map(str::to_string).collect(),
            Command::Quit => {
                self.should_quit = true;
                vec!["Bye.".to_string()]
            }
            Command::Login { email } => match self.session.login(&email) {
                Ok(profile) => vec![format!("Logged in as {}.", profile.display_name())],
                Err(e) => vec![format!("Login failed: {e}")],
            },
            Command::Signup { email, name } => match self.session.signup(&name, &email) {
                Ok(profile) => vec![format!("Welcome, {}!", profile.display_name())],
                Err(e) => vec![format!("Signup failed: {e}")],
            },
            Command::Logout => match self.session.logout() {
                Ok(()) => vec!["Logged out.".to_string()],
                Err(e) => vec![format!("Logout failed: {e}")],
            },
            Command::WhoAmI => match self.session.current() {
                Some(profile) => vec![match &profile.name {
                    Some(name) => format!("{name} <{}>", profile.email),
                    None => profile.email.clone(),
                }],
                None => vec!["Not logged in.".to_string()],
            },
            Command::Profile { email, name } => {
                match self.session.update_profile(name.as_deref(), &email) {
                    Ok(_) => vec!["Profile updated successfully!".to_string()],
                    Err(e) => vec![format!("Profile update failed: {e}")],
                }
            }
            board_command => {
                if !self.board.is_loaded() {
                    return vec![LOGIN_PROMPT.to_string()];
                }
                self.dispatch_board(board_command)
                    .unwrap_or_else(|message| vec![message])
            }
        }
    }

    fn dispatch_board(&mut self, command: Command) -> Result<Vec<String>, String> {
        let lines = match command {
            Command::Show => self.render(),
            Command::NewList { name } => {
                let id = self.board.add_list(&name).map_err(|e| e.to_string())?;
                let list = self.list(&id)?;
                vec![format!(
                    "Created list {}: {}.",
                    self.board.lists().len(),
                    list.name
                )]
            }
            Command::AddTask { list, title } => {
                let list_id = self.resolve_list(&list)?;
                let task_id = self
                    .board
                    .add_task(&list_id, &title)
                    .map_err(|e| e.to_string())?;
                let list = self.list(&list_id)?;
                let title = list.task(&task_id).map_or("", |t| t.title.as_str());
                vec![format!("Added \"{title}\" to {}.", list.name)]
            }
            Command::Toggle { list, task } => {
                let list_id = self.resolve_list(&list)?;
                let task_id = self.resolve_task(&list_id, &task)?;
                let done = self
                    .board
                    .toggle_complete(&task_id, &list_id)
                    .map_err(|e| e.to_string())?;
                let title = self.task_title(&list_id, &task_id);
                vec![if done {
                    format!("Completed \"{title}\".")
                } else {
                    format!("Reopened \"{title}\".")
                }]
            }
            Command::Edit {
                list,
                task,
                field,
                value,
            } => {
                let list_id = self.resolve_list(&list)?;
                let task_id = self.resolve_task(&list_id, &task)?;
                let mut updated = self
                    .board
                    .task(&list_id, &task_id)
                    .cloned()
                    .ok_or_else(|| format!("No task `{task}`."))?;
                apply_field(&mut updated, field, value);
                self.board.update_task(updated).map_err(|e| e.to_string())?;
                vec![format!("Updated \"{}\".", self.task_title(&list_id, &task_id))]
            }
            Command::Move { list, task, dest } => {
                let list_id = self.resolve_list(&list)?;
                let task_id = self.resolve_task(&list_id, &task)?;
                let dest_id = self.resolve_list(&dest)?;
                let title = self.task_title(&list_id, &task_id);
                self.board
                    .move_task(&task_id, &list_id, &dest_id)
                    .map_err(|e| e.to_string())?;
                let dest_name = self.list(&dest_id)?.name.clone();
                vec![format!("Moved \"{title}\" to {dest_name}.")]
            }
            Command::RemoveTask { list, task } => {
                let list_id = self.resolve_list(&list)?;
                let task_id = self.resolve_task(&list_id, &task)?;
                let title = self.task_title(&list_id, &task_id);
                self.board
                    .delete_task(&list_id, &task_id)
                    .map_err(|e| e.to_string())?;
                vec![format!("Deleted \"{title}\".")]
            }
            Command::RemoveList { list } => {
                let list_id = self.resolve_list(&list)?;
                let (name, count) = {
                    let list = self.list(&list_id)?;
                    (list.name.clone(), list.tasks.len())
                };
                self.board
                    .delete_list(&list_id)
                    .map_err(|e| e.to_string())?;
                vec![format!("Deleted list \"{name}\" and its {count} task(s).")]
            }
            other => vec![format!("{other:?} is not a board command.")],
        };
        Ok(lines)
    }

    /// Renders the whole board, one block per list.
    #[must_use]
    pub fn render(&self) -> Vec<String> {
        if !self.board.is_loaded() {
            return vec![LOGIN_PROMPT.to_string()];
        }
        let lists = self.board.lists();
        if lists.is_empty() {
            return vec!["No lists yet. Create one with `new-list <name>`.".to_string()];
        }

        let mut lines = Vec::new();
        for (idx, list) in lists.iter().enumerate() {
            let view = ListView::of(list);
            lines.push(format!(
                "{}. {} ({}/{} done)",
                idx + 1,
                list.name,
                view.completed_count(),
                view.total()
            ));
            if view.total() == 0 {
                lines.push("     (no tasks)".to_string());
            }
            for (pos, task) in view.display_order().enumerate() {
                lines.push(render_task(pos + 1, task));
                if let Some(details) = task.details.as_deref().filter(|d| !d.is_empty()) {
                    lines.push(format!("         {details}"));
                }
            }
        }
        if self.board.persist_failures() > 0 {
            lines.push("Warning: some changes could not be saved.".to_string());
        }
        lines
    }

    fn list(&self, id: &ListId) -> Result<&TaskList, String> {
        self.board
            .list(id)
            .ok_or_else(|| format!("No list `{id}`."))
    }

    fn task_title(&self, list_id: &ListId, task_id: &TaskId) -> String {
        self.board
            .task(list_id, task_id)
            .map(|t| t.title.clone())
            .unwrap_or_default()
    }

    /// Resolves a list id or a 1-based list position. An exact id wins.
    fn resolve_list(&self, reference: &str) -> Result<ListId, String> {
        let lists = self.board.lists();
        lists
            .iter()
            .find(|l| l.id.as_str() == reference)
            .or_else(|| {
                reference
                    .parse::<usize>()
                    .ok()
                    .and_then(|pos| pos.checked_sub(1))
                    .and_then(|idx| lists.get(idx))
            })
            .map(|l| l.id.clone())
            .ok_or_else(|| format!("No list `{reference}`."))
    }

    /// Resolves a task id or a 1-based display position within a list. An
    /// exact id wins.
    fn resolve_task(&self, list_id: &ListId, reference: &str) -> Result<TaskId, String> {
        let list = self.list(list_id)?;
        let view = ListView::of(list);
        list.tasks
            .iter()
            .find(|t| t.id.as_str() == reference)
            .or_else(|| reference.parse::<usize>().ok().and_then(|pos| view.nth(pos)))
            .map(|t| t.id.clone())
            .ok_or_else(|| format!("No task `{reference}` in {}.", list.name))
    }
}

/// Empty values clear optional fields.
fn apply_field(task: &mut Task, field: TaskField, value: String) {
    match field {
        TaskField::Title => task.title = value,
        TaskField::Details => task.details = (!value.is_empty()).then_some(value),
        TaskField::Due => task.due_date = (!value.is_empty()).then_some(value),
    }
}

fn render_task(position: usize, task: &Task) -> String {
    let mark = if task.is_completed { 'x' } else { ' ' };
    let mut line = format!("   {position}. [{mark}] {}", task.title);
    if let Some(due) = task.due_date.as_deref().filter(|d| !d.is_empty()) {
        line.push_str(&format!("  (due: {due})"));
    }
    line
}

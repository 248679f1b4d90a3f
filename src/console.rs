//! Console front end
//!
//! Renders the tracker page as text and drives it from line commands:
//!
//! ```text
//! signin <username> <password>
//! signup <username> <password>
//! add <name> <amount>
//! delete <number|id>
//! signout
//! help
//! quit
//! ```
//!
//! The page is redrawn whenever the view reports a change, including
//! changes pushed by the live query while waiting for input.

use std::fmt::Write as _;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::auth::Credentials;
use crate::view::{
    Card, ExpenseApp, ExpenseForm, Page, CREATE_LABEL, DELETE_LABEL, LIST_HEADING,
    SIGN_OUT_LABEL,
};

const HELP: &str = "\
Commands:
  signin <username> <password>   Sign in
  signup <username> <password>   Create an account and sign in
  add <name> <amount>            Add an expense
  delete <number|id>             Delete an expense
  signout                        Sign out
  help                           Show this help
  quit                           Exit
";

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SignIn { username: String, password: String },
    SignUp { username: String, password: String },
    Add { name: String, amount: String },
    Delete(String),
    SignOut,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0} (try 'help')")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse one input line.
///
/// For `add`, the last word is the amount and everything before it is the
/// name, so names may contain spaces.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let mut words = line.split_whitespace();
    let verb = words.next().ok_or(CommandError::Empty)?;
    let rest: Vec<&str> = words.collect();

    match verb.to_ascii_lowercase().as_str() {
        "signin" | "login" => match rest.as_slice() {
            [username, password] => Ok(Command::SignIn {
                username: username.to_string(),
                password: password.to_string(),
            }),
            _ => Err(CommandError::Usage("signin <username> <password>")),
        },
        "signup" | "register" => match rest.as_slice() {
            [username, password] => Ok(Command::SignUp {
                username: username.to_string(),
                password: password.to_string(),
            }),
            _ => Err(CommandError::Usage("signup <username> <password>")),
        },
        "add" => match rest.split_last() {
            Some((amount, name)) if !name.is_empty() => Ok(Command::Add {
                name: name.join(" "),
                amount: amount.to_string(),
            }),
            _ => Err(CommandError::Usage("add <name> <amount>")),
        },
        "delete" | "rm" => match rest.as_slice() {
            [target] => Ok(Command::Delete(target.to_string())),
            _ => Err(CommandError::Usage("delete <number|id>")),
        },
        "signout" | "logout" => Ok(Command::SignOut),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

/// Render a page as text
pub fn render(page: &Page) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", page.title());

    match page {
        Page::SignIn(view) => {
            let _ = writeln!(out, "Sign in to continue: signin <username> <password>");
            let _ = writeln!(out, "No account yet? signup <username> <password>");
            if let Some(error) = &view.error {
                let _ = writeln!(out, "! {}", error);
            }
        }
        Page::Tracker(view) => {
            let _ = writeln!(out, "Signed in as {}  [{}]", view.username, SIGN_OUT_LABEL);
            let _ = writeln!(out, "New expense: add <name> <amount>  [{}]", CREATE_LABEL);
            if !view.form.is_empty() {
                let _ = writeln!(
                    out,
                    "  Pending: name={:?} amount={:?}",
                    view.form.name, view.form.amount
                );
            }
            if let Some(notice) = &view.notice {
                let _ = writeln!(out, "! {}", notice.message());
            }

            let _ = writeln!(out, "{}", LIST_HEADING);
            if view.cards.is_empty() {
                let _ = writeln!(out, "  (none)");
            }
            for (position, card) in view.cards.iter().enumerate() {
                let action = if card.can_delete() { DELETE_LABEL } else { "saving" };
                let _ = writeln!(
                    out,
                    "  {}. {}  {}  [{}]",
                    position + 1,
                    card.name,
                    card.amount,
                    action
                );
            }
            if !view.is_synced {
                let _ = writeln!(out, "  (syncing)");
            }
        }
    }

    out
}

/// Find the card a `delete` target refers to: a 1-based position, a key or
/// a record id
fn find_card(page: &Page, target: &str) -> Option<Card> {
    let cards = &page.tracker()?.cards;

    if let Ok(position) = target.parse::<usize>() {
        if let Some(card) = position.checked_sub(1).and_then(|i| cards.get(i)) {
            return Some(card.clone());
        }
    }

    cards
        .iter()
        .find(|card| card.key == target || card.id.as_deref() == Some(target))
        .cloned()
}

async fn say<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<(), ConsoleError> {
    output.write_all(text.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

/// Run one command. Returns `false` when the console should exit.
async fn execute<W: AsyncWrite + Unpin>(
    app: &ExpenseApp,
    command: Command,
    output: &mut W,
) -> Result<bool, ConsoleError> {
    match command {
        Command::SignIn { username, password } => {
            if let Err(e) = app.sign_in(Credentials::new(username, password)).await {
                say(output, &format!("Sign-in failed: {}\n", e)).await?;
            }
        }
        Command::SignUp { username, password } => {
            if let Err(e) = app.sign_up(Credentials::new(username, password)).await {
                say(output, &format!("Sign-up failed: {}\n", e)).await?;
            }
        }
        Command::Add { name, amount } => {
            app.set_form(ExpenseForm::new(name, amount)).await;
            if let Err(e) = app.submit().await {
                say(output, &format!("{}\n", e)).await?;
            }
        }
        Command::Delete(target) => {
            let page = app.page().await;
            let result = match find_card(&page, &target) {
                Some(card) => app.delete_card(&card).map(|_| ()),
                None if page.tracker().is_none() => app.delete(&target).map(|_| ()),
                None => {
                    say(output, &format!("No expense matches {}\n", target)).await?;
                    Ok(())
                }
            };
            if let Err(e) = result {
                say(output, &format!("{}\n", e)).await?;
            }
        }
        Command::SignOut => app.sign_out().await,
        Command::Help => say(output, HELP).await?,
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

/// Drive the page from `input` until it ends or the user quits
pub async fn run<R, W>(app: &ExpenseApp, input: R, mut output: W) -> Result<(), ConsoleError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut changes = app.changes();

    say(&mut output, &render(&app.page().await)).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }

                match parse_command(&line) {
                    Ok(command) => {
                        if !execute(app, command, &mut output).await? {
                            break;
                        }
                    }
                    Err(e) => say(&mut output, &format!("{}\n", e)).await?,
                }
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                changes.borrow_and_update();
                say(&mut output, &render(&app.page().await)).await?;
            }
        }
    }

    tracing::debug!("Console closed");
    Ok(())
}

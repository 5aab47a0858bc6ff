//! Interactive text menu over a catalog.
//!
//! # Responsibility
//! - Collect user input and translate menu choices into catalog calls.
//! - Report outcomes in plain text.
//!
//! # Invariants
//! - End of input ends the session cleanly; nothing is half-written because
//!   every catalog save is a single store transaction.
//! - Action failures are logged and reported; the loop keeps running.

use log::error;
use shelfkeep_core::{Catalog, CatalogError, RecordStore, Transition};
use std::io::{self, BufRead, Write};

const MENU: &str = "
Library Manager
===============
1) Add Book
2) Issue Book
3) Return Book
4) View All Books
5) Search
6) Exit
Choose an option (1-6): ";

/// Result of one menu interaction.
enum Flow {
    Continue,
    Exit,
    /// Input stream closed mid-session.
    Interrupted,
}

/// Prompt/response session bound to one catalog.
pub struct Menu<'a, S: RecordStore, R: BufRead, W: Write> {
    catalog: &'a mut Catalog<S>,
    input: R,
    output: W,
}

impl<'a, S: RecordStore, R: BufRead, W: Write> Menu<'a, S, R, W> {
    pub fn new(catalog: &'a mut Catalog<S>, input: R, output: W) -> Self {
        Self {
            catalog,
            input,
            output,
        }
    }

    /// Runs until the user exits or input ends.
    ///
    /// Only terminal I/O failures are returned; catalog errors are reported
    /// inline.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            let Some(choice) = self.prompt(MENU)? else {
                return self.interrupted();
            };

            let flow = match choice.trim() {
                "1" => self.add_book(),
                "2" => self.circulate(Circulation::Issue),
                "3" => self.circulate(Circulation::Return),
                "4" => self.view_all(),
                "5" => self.search(),
                "6" => {
                    writeln!(self.output, "Goodbye!")?;
                    Ok(Flow::Exit)
                }
                _ => {
                    writeln!(
                        self.output,
                        "Invalid choice. Enter a number between 1 and 6."
                    )?;
                    Ok(Flow::Continue)
                }
            };

            match flow {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => return Ok(()),
                Ok(Flow::Interrupted) => return self.interrupted(),
                Err(ActionError::Io(err)) => return Err(err),
                Err(ActionError::Catalog(err)) => self.report(&err)?,
            }
        }
    }

    fn add_book(&mut self) -> ActionResult {
        let Some(title) = self.prompt("Title: ")? else {
            return Ok(Flow::Interrupted);
        };
        let Some(author) = self.prompt("Author: ")? else {
            return Ok(Flow::Interrupted);
        };
        let Some(number) = self.prompt("Catalog number: ")? else {
            return Ok(Flow::Interrupted);
        };

        if [&title, &author, &number]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            writeln!(self.output, "All fields are required.")?;
            return Ok(Flow::Continue);
        }

        self.catalog.add_new(title, author, number)?;
        writeln!(self.output, "Book added successfully.")?;
        Ok(Flow::Continue)
    }

    fn circulate(&mut self, action: Circulation) -> ActionResult {
        let Some(number) = self.prompt(action.prompt())? else {
            return Ok(Flow::Interrupted);
        };

        let outcome = match action {
            Circulation::Issue => self.catalog.issue_by_key(&number)?,
            Circulation::Return => self.catalog.return_by_key(&number)?,
        };
        let message = match outcome {
            Transition::Applied => action.applied_message(),
            Transition::Unchanged => action.unchanged_message(),
            Transition::NotFound => "Book not found.",
        };
        writeln!(self.output, "{message}")?;
        Ok(Flow::Continue)
    }

    fn view_all(&mut self) -> ActionResult {
        let lines = self.catalog.display_all();
        if lines.is_empty() {
            writeln!(self.output, "No books in inventory.")?;
            return Ok(Flow::Continue);
        }
        for (number, line) in lines.iter().enumerate() {
            writeln!(self.output, "{}. {line}", number + 1)?;
        }
        Ok(Flow::Continue)
    }

    fn search(&mut self) -> ActionResult {
        let Some(kind) = self.prompt("Search by (t)itle or (c)atalog number? ")? else {
            return Ok(Flow::Interrupted);
        };
        let kind = kind.trim().to_lowercase();

        if kind.starts_with('t') {
            let Some(query) = self.prompt("Title query: ")? else {
                return Ok(Flow::Interrupted);
            };
            let hits = self.catalog.search_by_title(&query);
            if hits.is_empty() {
                writeln!(self.output, "No matches.")?;
            }
            for record in hits {
                writeln!(self.output, "{record}")?;
            }
        } else if kind.starts_with('c') {
            let Some(number) = self.prompt("Catalog number: ")? else {
                return Ok(Flow::Interrupted);
            };
            match self.catalog.search_by_catalog_number(&number) {
                Some(record) => writeln!(self.output, "{record}")?,
                None => writeln!(self.output, "Not found.")?,
            }
        } else {
            writeln!(self.output, "Unknown search type.")?;
        }
        Ok(Flow::Continue)
    }

    fn report(&mut self, err: &CatalogError) -> io::Result<()> {
        error!("event=menu_action module=cli status=error error={err}");
        match err {
            CatalogError::Persistence(_) => writeln!(
                self.output,
                "Warning: the change was applied but could not be saved ({err})."
            ),
            _ => writeln!(self.output, "{err}"),
        }
    }

    fn interrupted(&mut self) -> io::Result<()> {
        writeln!(self.output, "\nInput interrupted. Exiting.")?;
        Ok(())
    }

    /// Writes `text` and reads one line; `None` on end of input.
    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

#[derive(Clone, Copy)]
enum Circulation {
    Issue,
    Return,
}

impl Circulation {
    fn prompt(self) -> &'static str {
        match self {
            Self::Issue => "Catalog number to issue: ",
            Self::Return => "Catalog number to return: ",
        }
    }

    fn applied_message(self) -> &'static str {
        match self {
            Self::Issue => "Book issued.",
            Self::Return => "Book returned.",
        }
    }

    fn unchanged_message(self) -> &'static str {
        match self {
            Self::Issue => "Book is already issued.",
            Self::Return => "Book is already available.",
        }
    }
}

enum ActionError {
    Io(io::Error),
    Catalog(CatalogError),
}

impl From<io::Error> for ActionError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<CatalogError> for ActionError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

type ActionResult = Result<Flow, ActionError>;

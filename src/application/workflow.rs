//! The five-screen report workflow.
//!
//! ```text
//! login -> form -> confirmation -> searching -> results
//!           ^           |                          |
//!           +-- edit ---+                          |
//!           +------------- new search -------------+
//! ```
//!
//! The controller owns the record being filled in. Every mutation re-runs the
//! validator; the record is read-only from the confirmation screen onward.

use crate::domain::{
    format_national_id, format_phone, DomainError, EyeColor, Field, FormCheck,
    FormValidator, HairColor, Photo, Record, SearchBackend, SearchResult, SkinColor,
};
use crate::infrastructure::{CredentialCheck, CredentialSet};
use chrono::Local;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Which screen is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Form,
    Confirmation,
    Searching,
    Results,
}

/// The two inputs of the login screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Identifier,
    Secret,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("unknown user")]
    UnknownIdentifier,

    #[error("wrong password")]
    WrongSecret,

    #[error("{} required field(s) missing", .fields.len())]
    Incomplete { fields: Vec<Field> },

    #[error("not available on the {actual:?} screen")]
    WrongScreen { actual: Screen },

    #[error("a search is already running")]
    SearchInProgress,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl WorkflowError {
    /// The login input a credential error belongs to.
    pub fn login_field(&self) -> Option<LoginField> {
        match self {
            WorkflowError::UnknownIdentifier => Some(LoginField::Identifier),
            WorkflowError::WrongSecret => Some(LoginField::Secret),
            _ => None,
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

// The result lives inside the `Results` variant so it cannot outlive the
// results screen.
enum Stage {
    Login,
    Form,
    Confirmation,
    Searching { deadline: Instant },
    Results(SearchResult),
}

impl Stage {
    fn screen(&self) -> Screen {
        match self {
            Stage::Login => Screen::Login,
            Stage::Form => Screen::Form,
            Stage::Confirmation => Screen::Confirmation,
            Stage::Searching { .. } => Screen::Searching,
            Stage::Results(_) => Screen::Results,
        }
    }
}

pub struct Workflow {
    stage: Stage,
    record: Record,
    check: FormCheck,
    operator: Option<String>,
    credentials: CredentialSet,
    search_delay: Duration,
    backend: Box<dyn SearchBackend>,
}

impl Workflow {
    pub const DEFAULT_SEARCH_DELAY: Duration = Duration::from_secs(3);

    pub fn new(credentials: CredentialSet, backend: Box<dyn SearchBackend>) -> Self {
        let record = Record::default();
        let check = FormValidator::check(&record);
        Self {
            stage: Stage::Login,
            record,
            check,
            operator: None,
            credentials,
            search_delay: Self::DEFAULT_SEARCH_DELAY,
            backend,
        }
    }

    pub fn with_search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = delay;
        self
    }

    pub fn screen(&self) -> Screen {
        self.stage.screen()
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn form_check(&self) -> &FormCheck {
        &self.check
    }

    pub fn progress(&self) -> u8 {
        self.check.progress
    }

    /// Present only on the results screen.
    pub fn result(&self) -> Option<&SearchResult> {
        match &self.stage {
            Stage::Results(result) => Some(result),
            _ => None,
        }
    }

    /// Identifier of the logged-in operator.
    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    /// Time left before the running search completes.
    pub fn search_remaining(&self, now: Instant) -> Option<Duration> {
        match self.stage {
            Stage::Searching { deadline } => Some(deadline.saturating_duration_since(now)),
            _ => None,
        }
    }

    fn require_screen(&self, screen: Screen) -> WorkflowResult<()> {
        let actual = self.screen();
        if actual == screen {
            Ok(())
        } else {
            Err(WorkflowError::WrongScreen { actual })
        }
    }

    fn goto(&mut self, stage: Stage) {
        let from = self.screen();
        self.stage = stage;
        tracing::info!(?from, to = ?self.screen(), "screen transition");
    }

    pub fn login(&mut self, identifier: &str, secret: &str) -> WorkflowResult<()> {
        self.require_screen(Screen::Login)?;
        match self.credentials.check(identifier, secret) {
            CredentialCheck::Accepted => {
                self.operator = Some(identifier.to_string());
                self.goto(Stage::Form);
                Ok(())
            }
            CredentialCheck::UnknownIdentifier => {
                tracing::warn!("login rejected: unknown identifier");
                Err(WorkflowError::UnknownIdentifier)
            }
            CredentialCheck::WrongSecret => {
                tracing::warn!(identifier, "login rejected: wrong secret");
                Err(WorkflowError::WrongSecret)
            }
        }
    }

    /// Returns to the login screen and discards the record.
    pub fn logout(&mut self) -> WorkflowResult<()> {
        if self.screen() == Screen::Searching {
            return Err(WorkflowError::SearchInProgress);
        }
        self.operator = None;
        self.reset_record();
        self.goto(Stage::Login);
        Ok(())
    }

    fn reset_record(&mut self) {
        self.record = Record::default();
        self.revalidate();
    }

    fn revalidate(&mut self) {
        self.check = FormValidator::check(&self.record);
    }

    fn mutate<T>(&mut self, f: impl FnOnce(&mut Record) -> Result<T, DomainError>) -> WorkflowResult<T> {
        self.require_screen(Screen::Form)?;
        let out = f(&mut self.record)?;
        self.revalidate();
        Ok(out)
    }

    /// Sets a free-text field, masking national ID and phone values.
    pub fn set_text(&mut self, field: Field, value: &str) -> WorkflowResult<()> {
        let value = match field {
            Field::NationalId => format_national_id(value),
            Field::Phone => format_phone(value),
            _ => value.to_string(),
        };
        tracing::debug!(field = field.code(), "field updated");
        self.mutate(|r| r.set_text(field, value))
    }

    pub fn set_skin_color(&mut self, color: SkinColor) -> WorkflowResult<()> {
        self.mutate(|r| {
            r.skin_color = color;
            Ok(())
        })
    }

    pub fn set_hair_color(&mut self, color: HairColor) -> WorkflowResult<()> {
        self.mutate(|r| {
            r.hair_color = color;
            Ok(())
        })
    }

    pub fn set_eye_color(&mut self, color: EyeColor) -> WorkflowResult<()> {
        self.mutate(|r| {
            r.eye_color = color;
            Ok(())
        })
    }

    pub fn set_photo(&mut self, photo: Photo) -> WorkflowResult<()> {
        self.mutate(|r| {
            r.photo = Some(photo);
            Ok(())
        })
    }

    pub fn clear_photo(&mut self) -> WorkflowResult<()> {
        self.mutate(|r| {
            r.photo = None;
            Ok(())
        })
    }

    /// Appends an empty child slot and returns its index.
    pub fn add_child(&mut self) -> WorkflowResult<usize> {
        self.mutate(|r| {
            r.add_child();
            Ok(r.children().len() - 1)
        })
    }

    pub fn remove_child(&mut self, index: usize) -> WorkflowResult<()> {
        self.mutate(|r| r.remove_child(index))
    }

    pub fn set_child(&mut self, index: usize, value: &str) -> WorkflowResult<()> {
        self.mutate(|r| r.set_child(index, value.to_string()))
    }

    /// Moves to confirmation when the form is complete. Otherwise stays on
    /// the form and reports the fields in error in on-screen order.
    pub fn submit(&mut self) -> WorkflowResult<()> {
        self.require_screen(Screen::Form)?;
        self.revalidate();
        if self.check.is_valid() {
            self.goto(Stage::Confirmation);
            Ok(())
        } else {
            let fields = self.check.error_fields();
            tracing::debug!(missing = fields.len(), "submit blocked");
            Err(WorkflowError::Incomplete { fields })
        }
    }

    /// Back from confirmation to the form, keeping everything entered.
    pub fn edit(&mut self) -> WorkflowResult<()> {
        self.require_screen(Screen::Confirmation)?;
        self.goto(Stage::Form);
        Ok(())
    }

    /// Schedules the search to complete `search_delay` after `now`.
    pub fn start_search(&mut self, now: Instant) -> WorkflowResult<()> {
        match self.screen() {
            Screen::Confirmation => {
                self.goto(Stage::Searching {
                    deadline: now + self.search_delay,
                });
                Ok(())
            }
            Screen::Searching => Err(WorkflowError::SearchInProgress),
            actual => Err(WorkflowError::WrongScreen { actual }),
        }
    }

    /// Completes a due search. Returns `true` when this call moved the
    /// workflow to the results screen.
    pub fn poll(&mut self, now: Instant) -> bool {
        let due = matches!(self.stage, Stage::Searching { deadline } if now >= deadline);
        if !due {
            return false;
        }
        let today = Local::now().date_naive();
        let result = self.backend.search(&self.record, today);
        tracing::info!(found = result.found, items = result.items.len(), "search finished");
        self.goto(Stage::Results(result));
        true
    }

    /// Starts over with an empty record.
    pub fn new_search(&mut self) -> WorkflowResult<()> {
        self.require_screen(Screen::Results)?;
        self.reset_record();
        self.goto(Stage::Form);
        Ok(())
    }
}

//! Terminal-side state wrapped around the report workflow.
//!
//! [`App`] keeps what only the terminal needs (typed login text, the focused
//! form row, the photo path being typed, status line, help popup) and forwards
//! every change to the record through [`Workflow`]. It also hands finished
//! records and their search results to the [`RecordGateway`] when one is
//! attached.

use super::workflow::{LoginField, Screen, Workflow, WorkflowError};
use crate::domain::{Choice, Field, FieldKind, FoundItem, Photo, cycle_state};
use crate::infrastructure::{RecordGateway, RecordId, Session};
use std::path::Path;
use std::time::Instant;
use strum::IntoEnumIterator;

/// One editable row of the form. The children field expands into one row per
/// child slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormSlot {
    Field(Field),
    Child(usize),
}

impl FormSlot {
    pub fn field(self) -> Field {
        match self {
            FormSlot::Field(field) => field,
            FormSlot::Child(_) => Field::Children,
        }
    }
}

/// Text typed on the login screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub identifier: String,
    pub secret: String,
    pub focus: LoginField,
    /// The input flagged by the last failed attempt.
    pub error: Option<LoginField>,
}

impl LoginForm {
    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Identifier => &mut self.identifier,
            LoginField::Secret => &mut self.secret,
        }
    }
}

pub struct App {
    pub workflow: Workflow,
    gateway: Option<RecordGateway>,
    pub session: Session,
    pub login: LoginForm,
    /// Index into [`App::form_slots`].
    pub focus: usize,
    /// Path typed into the photo row, loaded on Enter.
    pub photo_input: String,
    /// Set after a blocked submit so the form highlights fields in error.
    pub show_errors: bool,
    pub status_message: Option<String>,
    /// Id the current record was stored under, once persisted.
    pub submitted_id: Option<RecordId>,
    /// Highlighted found item on the results screen.
    pub selected_item: usize,
    pub show_help: bool,
    pub help_scroll: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(workflow: Workflow, gateway: Option<RecordGateway>) -> Self {
        Self {
            workflow,
            gateway,
            session: Session::anonymous(),
            login: LoginForm::default(),
            focus: 0,
            photo_input: String::new(),
            show_errors: false,
            status_message: None,
            submitted_id: None,
            selected_item: 0,
            show_help: false,
            help_scroll: 0,
            should_quit: false,
        }
    }

    pub fn screen(&self) -> Screen {
        self.workflow.screen()
    }

    // Login screen

    pub fn login_input(&mut self, c: char) {
        self.login.focused_mut().push(c);
        self.login.error = None;
    }

    pub fn login_backspace(&mut self) {
        self.login.focused_mut().pop();
    }

    pub fn toggle_login_focus(&mut self) {
        self.login.focus = match self.login.focus {
            LoginField::Identifier => LoginField::Secret,
            LoginField::Secret => LoginField::Identifier,
        };
    }

    pub fn attempt_login(&mut self) {
        let identifier = self.login.identifier.clone();
        match self.workflow.login(&identifier, &self.login.secret) {
            Ok(()) => {
                self.session = Session::authenticated(identifier.clone());
                self.login = LoginForm::default();
                self.focus = 0;
                self.status_message = Some(format!("Bem-vindo, {identifier}"));
            }
            Err(err) => {
                self.login.error = err.login_field();
                if let Some(field) = self.login.error {
                    self.login.focus = field;
                }
                self.login.secret.clear();
                self.status_message = Some(match err {
                    WorkflowError::UnknownIdentifier => "Usuário não encontrado".to_string(),
                    WorkflowError::WrongSecret => "Senha incorreta".to_string(),
                    other => other.to_string(),
                });
            }
        }
    }

    pub fn logout(&mut self) {
        match self.workflow.logout() {
            Ok(()) => {
                tracing::info!(operator = self.session.identifier(), "logged out");
                self.session = Session::anonymous();
                self.reset_form_state();
                self.status_message = None;
            }
            Err(err) => self.report(err),
        }
    }

    // Form screen

    /// Every editable row, in display order.
    pub fn form_slots(&self) -> Vec<FormSlot> {
        let children = self.workflow.record().children().len();
        let mut slots = Vec::new();
        for field in Field::iter() {
            if field == Field::Children {
                slots.extend((0..children).map(FormSlot::Child));
            } else {
                slots.push(FormSlot::Field(field));
            }
        }
        slots
    }

    pub fn focused_slot(&self) -> FormSlot {
        let slots = self.form_slots();
        slots[self.focus.min(slots.len() - 1)]
    }

    pub fn focus_next(&mut self) {
        let len = self.form_slots().len();
        self.focus = (self.focus + 1) % len;
    }

    pub fn focus_prev(&mut self) {
        let len = self.form_slots().len();
        self.focus = (self.focus + len - 1) % len;
    }

    /// Moves focus to the first row belonging to `field`.
    pub fn focus_field(&mut self, field: Field) {
        if let Some(pos) = self.form_slots().iter().position(|s| s.field() == field) {
            self.focus = pos;
        }
    }

    fn focus_slot(&mut self, slot: FormSlot) {
        if let Some(pos) = self.form_slots().iter().position(|s| *s == slot) {
            self.focus = pos;
        }
    }

    /// Appends a character to the focused row.
    pub fn form_input(&mut self, c: char) {
        let result = match self.focused_slot() {
            FormSlot::Child(index) => {
                let mut value = self.workflow.record().children()[index].clone();
                value.push(c);
                self.workflow.set_child(index, &value)
            }
            FormSlot::Field(field) => match field.kind() {
                FieldKind::Photo => {
                    self.photo_input.push(c);
                    Ok(())
                }
                FieldKind::Choice => Ok(()),
                FieldKind::StateCode => {
                    let mut value = self.current_text(field);
                    value.push(c.to_ascii_uppercase());
                    self.workflow.set_text(field, &value)
                }
                FieldKind::Text | FieldKind::Masked | FieldKind::Children => {
                    let mut value = self.current_text(field);
                    value.push(c);
                    self.workflow.set_text(field, &value)
                }
            },
        };
        if let Err(err) = result {
            self.report(err);
        }
    }

    /// Deletes the last character of the focused row. Masked rows lose their
    /// last digit rather than a separator.
    pub fn form_backspace(&mut self) {
        let result = match self.focused_slot() {
            FormSlot::Child(index) => {
                let mut value = self.workflow.record().children()[index].clone();
                value.pop();
                self.workflow.set_child(index, &value)
            }
            FormSlot::Field(Field::Photo) => {
                self.photo_input.pop();
                Ok(())
            }
            FormSlot::Field(field) => match field.kind() {
                FieldKind::Choice => Ok(()),
                FieldKind::Masked => {
                    let mut digits: String = self
                        .current_text(field)
                        .chars()
                        .filter(char::is_ascii_digit)
                        .collect();
                    digits.pop();
                    self.workflow.set_text(field, &digits)
                }
                _ => {
                    let mut value = self.current_text(field);
                    value.pop();
                    self.workflow.set_text(field, &value)
                }
            },
        };
        if let Err(err) = result {
            self.report(err);
        }
    }

    fn current_text(&self, field: Field) -> String {
        self.workflow.record().text(field).unwrap_or_default().to_string()
    }

    /// Steps the focused choice or state row to its next/previous option.
    pub fn cycle_choice(&mut self, forward: bool) {
        let record = self.workflow.record();
        let (skin, hair, eye) = (record.skin_color, record.hair_color, record.eye_color);
        let result = match self.focused_slot().field() {
            Field::SkinColor => self.workflow.set_skin_color(skin.cycle(forward)),
            Field::HairColor => self.workflow.set_hair_color(hair.cycle(forward)),
            Field::EyeColor => self.workflow.set_eye_color(eye.cycle(forward)),
            field @ (Field::BirthState | Field::State) => {
                let next = cycle_state(&self.current_text(field), forward);
                self.workflow.set_text(field, next)
            }
            _ => Ok(()),
        };
        if let Err(err) = result {
            self.report(err);
        }
    }

    /// Loads the photo whose path was typed into the photo row.
    pub fn load_photo(&mut self) {
        let path = self.photo_input.trim().to_string();
        if path.is_empty() {
            self.status_message = Some("Informe o caminho da foto (JPEG ou PNG)".to_string());
            return;
        }
        match Photo::load(Path::new(&path)).map_err(WorkflowError::from) {
            Ok(photo) => {
                let name = photo.file_name.clone();
                match self.workflow.set_photo(photo) {
                    Ok(()) => {
                        self.photo_input.clear();
                        self.status_message = Some(format!("Foto carregada: {name}"));
                    }
                    Err(err) => self.report(err),
                }
            }
            Err(err) => {
                tracing::warn!(path = %path, error = %err, "photo rejected");
                self.report(err);
            }
        }
    }

    pub fn clear_photo(&mut self) {
        match self.workflow.clear_photo() {
            Ok(()) => self.status_message = Some("Foto removida".to_string()),
            Err(err) => self.report(err),
        }
    }

    /// Adds a child row and focuses it.
    pub fn add_child(&mut self) {
        match self.workflow.add_child() {
            Ok(index) => self.focus_slot(FormSlot::Child(index)),
            Err(err) => self.report(err),
        }
    }

    /// Removes the focused child row, if a child row is focused.
    pub fn remove_focused_child(&mut self) {
        if let FormSlot::Child(index) = self.focused_slot() {
            match self.workflow.remove_child(index) {
                Ok(()) => {
                    let remaining = self.workflow.record().children().len();
                    self.focus_slot(FormSlot::Child(index.min(remaining - 1)));
                }
                Err(err) => self.report(err),
            }
        }
    }

    pub fn submit_form(&mut self) {
        match self.workflow.submit() {
            Ok(()) => {
                self.show_errors = false;
                self.status_message = None;
            }
            Err(WorkflowError::Incomplete { fields }) => {
                self.show_errors = true;
                if let Some(first) = fields.first() {
                    self.focus_field(*first);
                }
                let labels: Vec<&str> = fields.iter().map(|f| f.label()).collect();
                self.status_message = Some(format!(
                    "Preencha os campos obrigatórios: {}",
                    labels.join(", ")
                ));
            }
            Err(err) => self.report(err),
        }
    }

    // Confirmation, searching and results

    pub fn edit_form(&mut self) {
        if let Err(err) = self.workflow.edit() {
            self.report(err);
        }
    }

    /// Starts the search and stores the record through the gateway.
    pub fn start_search(&mut self, now: Instant) {
        if let Err(err) = self.workflow.start_search(now) {
            self.report(err);
            return;
        }
        self.status_message = None;
        let Some(gateway) = &self.gateway else {
            return;
        };
        match gateway.submit(&self.session, self.workflow.record()) {
            Ok(id) => self.submitted_id = Some(id),
            Err(err) => {
                tracing::warn!(error = %err, "record not stored");
                self.status_message = Some(format!("Registro não salvo: {err}"));
            }
        }
    }

    /// Advances the search timer. Called on every event-loop tick.
    pub fn tick(&mut self, now: Instant) {
        if !self.workflow.poll(now) {
            return;
        }
        self.selected_item = 0;
        let (Some(gateway), Some(id), Some(result)) =
            (&self.gateway, self.submitted_id, self.workflow.result())
        else {
            return;
        };
        if let Err(err) = gateway.record_search_result(&self.session, id, result) {
            tracing::warn!(id, error = %err, "search result not stored");
            self.status_message = Some(format!("Resultado não salvo: {err}"));
        }
    }

    pub fn new_search(&mut self) {
        match self.workflow.new_search() {
            Ok(()) => {
                self.reset_form_state();
                self.status_message = None;
            }
            Err(err) => self.report(err),
        }
    }

    fn reset_form_state(&mut self) {
        self.focus = 0;
        self.photo_input.clear();
        self.show_errors = false;
        self.submitted_id = None;
        self.selected_item = 0;
    }

    pub fn select_next_item(&mut self) {
        let count = self.workflow.result().map_or(0, |r| r.items.len());
        if self.selected_item + 1 < count {
            self.selected_item += 1;
        }
    }

    pub fn select_prev_item(&mut self) {
        self.selected_item = self.selected_item.saturating_sub(1);
    }

    pub fn highlighted_item(&self) -> Option<&FoundItem> {
        self.workflow.result()?.items.get(self.selected_item)
    }

    /// Puts the highlighted item's link on the system clipboard.
    pub fn copy_selected_link(&mut self) {
        let Some(link) = self.highlighted_item().and_then(|item| item.link.clone()) else {
            self.status_message = Some("Nenhum link selecionado".to_string());
            return;
        };
        let copied = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(link.clone()));
        self.status_message = Some(match copied {
            Ok(()) => format!("Link copiado: {link}"),
            Err(err) => {
                tracing::warn!(error = %err, "clipboard unavailable");
                format!("Link: {link}")
            }
        });
    }

    fn report(&mut self, err: WorkflowError) {
        tracing::debug!(error = %err, "operation rejected");
        self.status_message = Some(err.to_string());
    }
}

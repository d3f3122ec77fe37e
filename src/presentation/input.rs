use crate::application::{App, FormSlot, Screen};
use crate::domain::Field;
use crossterm::event::{KeyCode, KeyModifiers};
use std::time::Instant;

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) && key == KeyCode::Char('c') {
            app.should_quit = true;
            return;
        }
        if app.show_help {
            Self::handle_help(app, key);
            return;
        }
        if key == KeyCode::F(1) {
            Self::open_help(app);
            return;
        }

        match app.screen() {
            Screen::Login => Self::handle_login(app, key),
            Screen::Form => Self::handle_form(app, key, modifiers),
            Screen::Confirmation => Self::handle_confirmation(app, key, modifiers),
            Screen::Searching => Self::handle_searching(app, key),
            Screen::Results => Self::handle_results(app, key, modifiers),
        }
    }

    fn open_help(app: &mut App) {
        app.show_help = true;
        app.help_scroll = 0;
    }

    fn handle_help(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q') => {
                app.show_help = false;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.help_scroll = app.help_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll += 1;
            }
            KeyCode::PageUp => {
                app.help_scroll = app.help_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                app.help_scroll += 5;
            }
            KeyCode::Home => {
                app.help_scroll = 0;
            }
            _ => {}
        }
    }

    fn handle_login(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => app.attempt_login(),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                app.toggle_login_focus();
            }
            KeyCode::Backspace => app.login_backspace(),
            KeyCode::Char(c) => app.login_input(c),
            KeyCode::Esc => app.should_quit = true,
            _ => {}
        }
    }

    fn handle_form(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            match key {
                KeyCode::Char('s') => app.submit_form(),
                KeyCode::Char('n') => app.add_child(),
                KeyCode::Char('d') => app.remove_focused_child(),
                KeyCode::Char('x') => app.clear_photo(),
                KeyCode::Char('l') => app.logout(),
                _ => {}
            }
            return;
        }

        match key {
            KeyCode::Tab | KeyCode::Down => app.focus_next(),
            KeyCode::BackTab | KeyCode::Up => app.focus_prev(),
            KeyCode::Left => app.cycle_choice(false),
            KeyCode::Right => app.cycle_choice(true),
            KeyCode::Enter => match app.focused_slot() {
                FormSlot::Field(Field::Photo) if !app.photo_input.trim().is_empty() => {
                    app.load_photo();
                }
                _ => app.focus_next(),
            },
            KeyCode::F(10) => app.submit_form(),
            KeyCode::Backspace => app.form_backspace(),
            KeyCode::Char(c) => app.form_input(c),
            KeyCode::Esc => app.status_message = None,
            _ => {}
        }
    }

    fn handle_confirmation(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) && key == KeyCode::Char('l') {
            app.logout();
            return;
        }
        match key {
            KeyCode::Enter | KeyCode::Char('b') => app.start_search(Instant::now()),
            KeyCode::Char('e') | KeyCode::Esc => app.edit_form(),
            KeyCode::Char('?') => Self::open_help(app),
            KeyCode::Char('q') => app.should_quit = true,
            _ => {}
        }
    }

    // The search cannot be cancelled; only quitting and help are available.
    fn handle_searching(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Char('?') => Self::open_help(app),
            KeyCode::Char('q') => app.should_quit = true,
            _ => {}
        }
    }

    fn handle_results(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) && key == KeyCode::Char('l') {
            app.logout();
            return;
        }
        match key {
            KeyCode::Up | KeyCode::Char('k') => app.select_prev_item(),
            KeyCode::Down | KeyCode::Char('j') => app.select_next_item(),
            KeyCode::Char('c') | KeyCode::Enter => app.copy_selected_link(),
            KeyCode::Char('n') => app.new_search(),
            KeyCode::Char('?') => Self::open_help(app),
            KeyCode::Char('q') => app.should_quit = true,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{LoginField, Workflow};
    use crate::domain::{FixedFoundSource, SimulatedSearch};
    use crate::infrastructure::CredentialSet;
    use std::time::Duration;

    fn app(found: bool) -> App {
        let credentials = CredentialSet::new().with_secret("Sigma", "AVANTE").unwrap();
        let workflow = Workflow::new(credentials, Box::new(SimulatedSearch::new(FixedFoundSource(found))))
            .with_search_delay(Duration::ZERO);
        App::new(workflow, None)
    }

    fn press(app: &mut App, key: KeyCode) {
        InputHandler::handle_key_event(app, key, KeyModifiers::NONE);
    }

    fn ctrl(app: &mut App, c: char) {
        InputHandler::handle_key_event(app, KeyCode::Char(c), KeyModifiers::CONTROL);
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn login(app: &mut App) {
        type_text(app, "Sigma");
        press(app, KeyCode::Tab);
        type_text(app, "AVANTE");
        press(app, KeyCode::Enter);
    }

    #[test]
    fn test_login_keys() {
        let mut app = app(true);
        type_text(&mut app, "Sigmx");
        press(&mut app, KeyCode::Backspace);
        type_text(&mut app, "a");
        assert_eq!(app.login.identifier, "Sigma");

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.login.focus, LoginField::Secret);
        type_text(&mut app, "AVANTE");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen(), Screen::Form);
    }

    #[test]
    fn test_q_is_typed_on_login() {
        let mut app = app(true);
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.login.identifier, "q");
        assert!(!app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits_anywhere() {
        let mut app = app(true);
        ctrl(&mut app, 'c');
        assert!(app.should_quit);
    }

    #[test]
    fn test_form_navigation_and_typing() {
        let mut app = app(true);
        login(&mut app);
        type_text(&mut app, "Ana");
        assert_eq!(app.workflow.record().full_name, "Ana");

        press(&mut app, KeyCode::Down);
        assert_eq!(app.focused_slot(), FormSlot::Field(Field::NationalId));
        type_text(&mut app, "123456");
        assert_eq!(app.workflow.record().national_id, "123.456");

        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.focused_slot(), FormSlot::Field(Field::NationalId));
    }

    #[test]
    fn test_ctrl_n_adds_child() {
        let mut app = app(true);
        login(&mut app);
        ctrl(&mut app, 'n');
        assert_eq!(app.focused_slot(), FormSlot::Child(1));
        type_text(&mut app, "Rui");
        assert_eq!(app.workflow.record().children()[1], "Rui");
        ctrl(&mut app, 'd');
        assert_eq!(app.workflow.record().children().len(), 1);
    }

    #[test]
    fn test_submit_blocked_then_full_walkthrough() {
        let mut app = app(false);
        login(&mut app);
        ctrl(&mut app, 's');
        assert_eq!(app.screen(), Screen::Form);
        assert_eq!(app.focused_slot(), FormSlot::Field(Field::FullName));

        type_text(&mut app, "Ana Souza");
        app.focus_field(Field::MotherName);
        type_text(&mut app, "Rita");
        for field in [Field::SkinColor, Field::HairColor, Field::EyeColor] {
            app.focus_field(field);
            press(&mut app, KeyCode::Right);
        }
        ctrl(&mut app, 's');
        assert_eq!(app.screen(), Screen::Confirmation);

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.screen(), Screen::Form);
        press(&mut app, KeyCode::F(10));
        assert_eq!(app.screen(), Screen::Confirmation);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen(), Screen::Searching);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.screen(), Screen::Searching);

        app.tick(Instant::now());
        assert_eq!(app.screen(), Screen::Results);
        assert!(!app.workflow.result().unwrap().found);

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.screen(), Screen::Form);
        assert!(app.workflow.record().full_name.is_empty());
    }

    #[test]
    fn test_help_popup_swallows_keys() {
        let mut app = app(true);
        press(&mut app, KeyCode::F(1));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('x'));
        assert!(app.login.identifier.is_empty());
        press(&mut app, KeyCode::Down);
        assert_eq!(app.help_scroll, 1);
        press(&mut app, KeyCode::Esc);
        assert!(!app.show_help);
    }

    #[test]
    fn test_question_mark_reopens_help_at_top() {
        let mut app = app(true);
        login(&mut app);
        type_text(&mut app, "Ana");
        app.focus_field(Field::MotherName);
        type_text(&mut app, "Rita");
        for field in [Field::SkinColor, Field::HairColor, Field::EyeColor] {
            app.focus_field(field);
            press(&mut app, KeyCode::Right);
        }
        ctrl(&mut app, 's');
        assert_eq!(app.screen(), Screen::Confirmation);

        press(&mut app, KeyCode::Char('?'));
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.help_scroll, 5);
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        assert_eq!(app.help_scroll, 0);
    }

    #[test]
    fn test_ctrl_l_logs_out() {
        let mut app = app(true);
        login(&mut app);
        type_text(&mut app, "Ana");
        ctrl(&mut app, 'l');
        assert_eq!(app.screen(), Screen::Login);
        assert!(app.workflow.record().full_name.is_empty());
    }
}

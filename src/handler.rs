use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Mode};

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Handle a key event according to the active mode.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    let mode = std::mem::take(&mut app.mode);
    match mode {
        Mode::Idle => handle_idle(app, key),
        Mode::Move | Mode::Copy => {
            let moving = mode == Mode::Move;
            // Pending until pasted or cancelled; other keys navigate as usual.
            app.mode = mode;
            match key.code {
                KeyCode::Char('p') if moving => app.paste_move(),
                KeyCode::Char('p') => app.paste_copy(),
                _ => handle_idle(app, key),
            }
        }
        Mode::DeleteConfirm => match key.code {
            KeyCode::Char('y') => app.delete_marked(),
            _ => {
                app.tree.clear_marks();
                handle_idle(app, key);
            }
        },
        Mode::GoPrefix(previous) => {
            app.mode = *previous;
            match key.code {
                KeyCode::Char('g') => app.tree.select_first(),
                _ => handle_key_event(app, key),
            }
        }
        input @ (Mode::RenameInput(_) | Mode::CreateFileInput(_) | Mode::CreateDirInput(_)) => {
            handle_input(app, input, key)
        }
    }
}

fn handle_idle(app: &mut App, key: KeyEvent) {
    if is_ctrl_c(&key) {
        app.quit();
        return;
    }
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Esc => app.cancel(),
        KeyCode::Char('j') | KeyCode::Down => app.tree.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.tree.select_previous(),
        KeyCode::Char('l') | KeyCode::Right => app.enter_selected(),
        KeyCode::Char('h') | KeyCode::Left => app.tree.leave(),
        KeyCode::Tab => {
            app.tree.toggle_mark_selected();
            app.tree.select_next();
        }
        KeyCode::BackTab => {
            app.tree.toggle_mark_selected();
            app.tree.select_previous();
        }
        KeyCode::Char('y') => app.start_copy(),
        KeyCode::Char('d') => app.start_move(),
        KeyCode::Char('D') => app.start_delete(),
        KeyCode::Char('r') => app.start_rename(),
        KeyCode::Char('a') => app.start_create_file(),
        KeyCode::Char('A') => app.start_create_dir(),
        KeyCode::Char('g') => {
            let previous = std::mem::take(&mut app.mode);
            app.mode = Mode::GoPrefix(Box::new(previous));
        }
        KeyCode::Char('G') => app.tree.select_last(),
        KeyCode::Char('H') => app.toggle_hidden(),
        KeyCode::Char('e') => app.edit_selected(),
        KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Enter => app.open_or_toggle_selected(),
        _ => {}
    }
}

/// Text entry for rename and create. Enter commits, Esc aborts.
fn handle_input(app: &mut App, mut mode: Mode, key: KeyEvent) {
    if is_ctrl_c(&key) {
        app.tree.clear_marks();
        return;
    }
    match key.code {
        KeyCode::Esc => app.tree.clear_marks(),
        KeyCode::Enter => match mode {
            Mode::RenameInput(name) => app.rename_marked(&name),
            Mode::CreateFileInput(name) => app.create_file(&name),
            Mode::CreateDirInput(name) => app.create_dir(&name),
            _ => {}
        },
        code => {
            if let Some(buf) = mode.input_mut() {
                match code {
                    KeyCode::Backspace => {
                        buf.pop();
                    }
                    KeyCode::Char(c) => buf.push(c),
                    _ => {}
                }
            }
            app.mode = mode;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{app_at, fixture};

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn chars(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn selected_name(app: &App) -> String {
        app.tree.selected_node().unwrap().name.clone()
    }

    #[test]
    fn quit_keys() {
        let dir = fixture();
        let mut app = app_at(dir.path());
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);

        let mut app = app_at(dir.path());
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }

    #[test]
    fn navigation_keys() {
        let dir = fixture();
        let mut app = app_at(dir.path());
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(selected_name(&app), "a.txt");
        press(&mut app, KeyCode::Char('G'));
        assert_eq!(selected_name(&app), "b.txt");
        press(&mut app, KeyCode::Up);
        assert_eq!(selected_name(&app), "a.txt");
    }

    #[test]
    fn go_prefix_selects_first() {
        let dir = fixture();
        let mut app = app_at(dir.path());
        press(&mut app, KeyCode::Char('G'));
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.mode, Mode::GoPrefix(Box::new(Mode::Idle)));
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.mode, Mode::Idle);
        assert_eq!(selected_name(&app), "sub");
    }

    #[test]
    fn go_prefix_falls_through_to_previous_mode() {
        let dir = fixture();
        let mut app = app_at(dir.path());
        press(&mut app, KeyCode::Char('G'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.mode, Mode::Copy);

        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.mode, Mode::Copy);
        assert_eq!(selected_name(&app), "sub");

        // Non-chord key goes to the copy mode: paste happens.
        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.mode, Mode::Idle);
        assert!(dir.path().join("sub").join("b.txt").exists());
    }

    #[test]
    fn copy_scenario_through_keys() {
        let dir = fixture();
        let mut app = app_at(dir.path());
        press(&mut app, KeyCode::Char('G'));
        press(&mut app, KeyCode::Char('y'));
        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Char('p'));

        assert_eq!(app.tree.marked_count(), 0);
        assert_eq!(selected_name(&app), "b.txt");
        assert!(dir.path().join("b.txt").exists());
    }

    #[test]
    fn move_mode_escape_clears_marks() {
        let dir = fixture();
        let mut app = app_at(dir.path());
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.mode, Mode::Move);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Idle);
        assert_eq!(app.tree.marked_count(), 0);
    }

    #[test]
    fn delete_confirm_yes() {
        let dir = fixture();
        let mut app = app_at(dir.path());
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('D'));
        assert_eq!(app.mode, Mode::DeleteConfirm);
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.mode, Mode::Idle);
        assert!(!dir.path().join("a.txt").exists());
        assert_eq!(selected_name(&app), "b.txt");
    }

    #[test]
    fn delete_confirm_other_key_cancels_and_is_handled() {
        let dir = fixture();
        let mut app = app_at(dir.path());
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('D'));
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.mode, Mode::Idle);
        assert_eq!(app.tree.marked_count(), 0);
        assert!(dir.path().join("a.txt").exists());
        assert_eq!(selected_name(&app), "b.txt");
    }

    #[test]
    fn rename_through_input_buffer() {
        let dir = fixture();
        let mut app = app_at(dir.path());
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('r'));
        for _ in 0.."a.txt".len() {
            press(&mut app, KeyCode::Backspace);
        }
        assert_eq!(app.mode, Mode::RenameInput(String::new()));
        chars(&mut app, "qz.md");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, Mode::Idle);
        assert!(dir.path().join("qz.md").exists());
        assert!(!dir.path().join("a.txt").exists());
        assert_eq!(app.tree.marked_count(), 0);
    }

    #[test]
    fn input_keys_are_text_not_commands() {
        let dir = fixture();
        let mut app = app_at(dir.path());
        press(&mut app, KeyCode::Char('a'));
        chars(&mut app, "qjk");
        assert!(!app.should_quit);
        assert_eq!(app.mode, Mode::CreateFileInput("qjk".into()));
        assert_eq!(selected_name(&app), "sub");
    }

    #[test]
    fn create_dir_with_empty_name_reports_error() {
        let dir = fixture();
        let mut app = app_at(dir.path());
        press(&mut app, KeyCode::Char('A'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Idle);
        assert_eq!(app.error.as_deref(), Some("Name must not be empty"));
    }

    #[test]
    fn create_dir_through_keys() {
        let dir = fixture();
        let mut app = app_at(dir.path());
        press(&mut app, KeyCode::Char('A'));
        chars(&mut app, "newdir");
        press(&mut app, KeyCode::Enter);
        assert!(dir.path().join("newdir").is_dir());
        assert!(app.error.is_none());
    }

    #[test]
    fn input_escape_aborts() {
        let dir = fixture();
        let mut app = app_at(dir.path());
        press(&mut app, KeyCode::Char('r'));
        chars(&mut app, "zzz");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Idle);
        assert_eq!(app.tree.marked_count(), 0);
        assert!(dir.path().join("sub").exists());
    }

    #[test]
    fn tab_marks_and_moves_down() {
        let dir = fixture();
        let mut app = app_at(dir.path());
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.tree.marked_count(), 2);
        assert_eq!(selected_name(&app), "b.txt");
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.tree.marked_count(), 3);
        assert_eq!(selected_name(&app), "a.txt");
    }

    #[test]
    fn help_toggle() {
        let dir = fixture();
        let mut app = app_at(dir.path());
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('?'));
        assert!(!app.show_help);
    }

    #[test]
    fn escape_clears_error() {
        let dir = fixture();
        let mut app = app_at(dir.path());
        app.set_error("boom");
        press(&mut app, KeyCode::Esc);
        assert!(app.error.is_none());
    }
}

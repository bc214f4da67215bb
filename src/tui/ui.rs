use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{MountView, NavSidebar, TitleBar, footer_entries, nav_entries};

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::Span;

const SIDEBAR_WIDTH: u16 = 24;

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState) {
    use Constraint::{Length, Min};
    let layout = Layout::vertical([Length(1), Min(0), Length(1), Length(3)]);
    let [title_area, main_area, error_area, address_area] = layout.areas(frame.area());

    let route_name = app
        .current_route
        .as_ref()
        .map(|r| r.name.clone())
        .unwrap_or_default();
    TitleBar::new(
        route_name,
        app.status_message.clone(),
        app.session_id.clone(),
        app.is_navigating(),
    )
    .render(frame, title_area);

    let full_bleed = app.current_route.as_ref().is_some_and(|r| r.full_bleed);
    let page_area = if full_bleed {
        main_area
    } else {
        let [nav_area, page_area] = Layout::horizontal([Length(SIDEBAR_WIDTH), Min(0)]).areas(main_area);
        NavSidebar {
            entries: nav_entries(app.router()),
            footer: footer_entries(app.router()),
            active_module: app.lifecycle.active_module_id(),
            selected: tui.nav_selected,
        }
        .render(frame, nav_area);
        page_area
    };

    MountView {
        snapshot: app.document.snapshot(),
    }
    .render(frame, page_area);

    if let Some(error) = &app.error {
        frame.render_widget(Span::styled(error.clone(), Style::default().fg(Color::Red)), error_area);
    }

    tui.address_bar.placeholder = app.current_fragment.clone();
    tui.address_bar.render(frame, address_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::{Action, update};
    use crate::test_support::test_app;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn screen(app: &App, tui: &mut TuiState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw_ui(f, app, tui)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_draw_mounted_page_with_sidebar() {
        let mut app = test_app();
        update(&mut app, Action::Navigate("#/topics/science".into()));
        app.lifecycle.navigate_path("#/topics/science").await.unwrap();

        let mut tui = TuiState::new();
        let text = screen(&app, &mut tui);
        assert!(text.contains("quizshell | Topics"));
        assert!(text.contains("Navigate"));
        assert!(text.contains("Topics: science"));
        assert!(text.contains("[#/quiz/optics]"));
        assert!(text.contains("#/topics/science"));
    }

    #[tokio::test]
    async fn test_full_bleed_hides_sidebar() {
        let mut app = test_app();
        update(&mut app, Action::Navigate("#/quiz/optics".into()));
        app.lifecycle.navigate_path("#/quiz/optics").await.unwrap();

        let text = screen(&app, &mut TuiState::new());
        assert!(!text.contains("Navigate"));
        assert!(text.contains("Question 1 of 2"));
    }

    #[test]
    fn test_error_line_shown() {
        let mut app = test_app();
        app.error = Some("failed to load module 'quiz'".into());
        let text = screen(&app, &mut TuiState::new());
        assert!(text.contains("failed to load module 'quiz'"));
    }
}

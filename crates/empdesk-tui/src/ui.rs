//! UI rendering with Ratatui.

use crate::app::{App, AppState, EditorFocus, InputGroup, InputMode, MenuItem, Screen, REGISTER_FIELDS};
use empdesk_core::{Employee, RecordEditor};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    prelude::*,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

const SELECTED_BG: Color = Color::Rgb(60, 60, 80);

/// Main render function.
pub fn render(frame: &mut Frame, app: &App) {
    if app.state == AppState::Quit {
        return;
    }

    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    match app.screen {
        Screen::Login => render_login(frame, app, chunks[0]),
        Screen::Register => render_register(frame, app, chunks[0]),
        Screen::ChangePassword => render_change_password(frame, app, chunks[0]),
        Screen::Dashboard => render_dashboard(frame, app, chunks[0]),
        Screen::Profile => render_profile(frame, app, chunks[0]),
        Screen::Forms => render_forms(frame, app, chunks[0]),
        Screen::FormEditor => render_form_editor(frame, app, chunks[0]),
        Screen::NewEmployee => render_new_employee(frame, app, chunks[0]),
        Screen::Employees => render_employees(frame, app, chunks[0]),
    }

    render_status(frame, app, chunks[1]);
}

/// Bottom line: key help, or the busy indicator.
fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.busy {
        Line::from(Span::styled(
            "working…",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))
    } else {
        Line::from(Span::styled(help_text(app), Style::default().fg(Color::DarkGray)))
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn help_text(app: &App) -> &'static str {
    match app.screen {
        Screen::Login => "Tab: next field | Enter: log in | Ctrl+R: register | Esc: quit",
        Screen::Register => "Tab: next field | Enter: register | Esc: back to login",
        Screen::ChangePassword => "Tab: next field | Enter: change password | Esc: back",
        Screen::Dashboard => "↑/↓: select | Enter or 1-6: open | q: quit",
        Screen::Profile => "r: reload | Esc: back | q: quit",
        Screen::Forms => "n: new form | Enter: edit | r: reload | Esc: back | q: quit",
        Screen::FormEditor => {
            "Tab: next | ←/→: type | Ctrl+N: add | Ctrl+D: remove | Ctrl+K/J: move | Enter: save | Esc: back"
        }
        Screen::NewEmployee if app.new_employee.editor.is_some() => {
            "Tab: next field | Enter: save | Esc: pick another form"
        }
        Screen::NewEmployee => "Type to filter | ↑/↓: select | Enter: pick form | Esc: back",
        Screen::Employees => match app.employees.mode {
            InputMode::Normal => {
                "←/→: page | /: search | c: clear search | Enter: edit | d: delete | Esc: back | q: quit"
            }
            InputMode::Search => "Type to search | Enter/Esc: done",
            InputMode::ConfirmDelete => "y: delete | n: cancel",
            InputMode::EditRecord => "Tab: next field | Enter: save | Esc: cancel",
        },
    }
}

fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    let dialog = centered_rect(50, 11, area);
    let inner = dialog_block(frame, " 🔐 empdesk - Login ", Color::Cyan, dialog);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // Notice
            Constraint::Length(2), // Username
            Constraint::Length(2), // Password
            Constraint::Length(2), // Error
        ])
        .split(inner);

    if let Some(ref notice) = app.login.notice {
        frame.render_widget(
            Paragraph::new(notice.as_str()).style(Style::default().fg(Color::Green)),
            chunks[0],
        );
    }
    render_inputs(frame, &app.login.inputs, &[chunks[1], chunks[2]]);
    render_error(frame, app.login.error.as_deref(), chunks[3]);
}

fn render_register(frame: &mut Frame, app: &App, area: Rect) {
    let dialog = centered_rect(60, 18, area);
    let inner = dialog_block(frame, " 📝 Register ", Color::Cyan, dialog);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .split(inner);

    for (index, field) in REGISTER_FIELDS.iter().enumerate() {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(chunks[index]);

        if let Some(input) = app.register.inputs.inputs.get(index) {
            let focused = app.register.inputs.focus == index;
            render_input(frame, &input.label, &input.display(), focused, rows[0]);
        }
        render_error(frame, app.register.errors.get(field).map(String::as_str), rows[1]);
    }

    let general = app
        .register
        .errors
        .get(&empdesk_core::auth::RegisterField::General)
        .map(String::as_str);
    render_error(frame, general, chunks[4]);
}

fn render_change_password(frame: &mut Frame, app: &App, area: Rect) {
    let dialog = centered_rect(50, 10, area);
    let inner = dialog_block(frame, " 🔑 Change Password ", Color::Cyan, dialog);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(2),
        ])
        .split(inner);

    render_inputs(frame, &app.password.inputs, &[chunks[0], chunks[1]]);
    if let Some(ref message) = app.password.message {
        frame.render_widget(
            Paragraph::new(message.as_str()).style(Style::default().fg(Color::Green)),
            chunks[2],
        );
    } else {
        render_error(frame, app.password.error.as_deref(), chunks[2]);
    }
}

fn render_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    let dialog = centered_rect(40, MenuItem::ALL.len() as u16 + 4, area);
    let inner = dialog_block(frame, " 🏢 empdesk ", Color::Cyan, dialog);

    let items: Vec<ListItem> = MenuItem::ALL
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let content = format!(" {}  {}", i + 1, item.title());
            ListItem::new(Line::from(content)).style(selected_style(i == app.menu_selected))
        })
        .collect();

    frame.render_widget(List::new(items), inner.inner(Margin::new(0, 1)));
}

fn render_profile(frame: &mut Frame, app: &App, area: Rect) {
    let dialog = centered_rect(50, 7, area);
    let inner = dialog_block(frame, " 👤 Profile ", Color::Cyan, dialog);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    if app.profile.loading {
        frame.render_widget(dim("Loading…"), chunks[0]);
    } else if let Some(ref error) = app.profile.error {
        render_error(frame, Some(error.as_str()), chunks[0]);
    } else if let Some(ref profile) = app.profile.profile {
        render_field(frame, "Username", &profile.username, chunks[0], Color::White);
        render_field(frame, "Email", &profile.email, chunks[1], Color::Green);
    }
}

fn render_forms(frame: &mut Frame, app: &App, area: Rect) {
    let inner = dialog_block(frame, " 🧩 Forms ", Color::Cyan, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    if app.forms.forms.is_empty() {
        let text = if app.forms.loading {
            "Loading…"
        } else {
            "No forms yet. Press n to create one."
        };
        frame.render_widget(dim(text).alignment(Alignment::Center), chunks[0]);
    } else {
        let items: Vec<ListItem> = app
            .forms
            .forms
            .iter()
            .enumerate()
            .map(|(i, form)| {
                let line = Line::from(vec![
                    Span::raw(format!("📄 {}", form.name)),
                    Span::styled(
                        format!("  ({} fields)", form.fields.len()),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]);
                ListItem::new(line).style(selected_style(i == app.forms.selected))
            })
            .collect();
        frame.render_widget(List::new(items), chunks[0]);
    }

    render_error(frame, app.forms.error.as_deref(), chunks[1]);
}

fn render_form_editor(frame: &mut Frame, app: &App, area: Rect) {
    let editor = &app.form_editor;
    let title = if editor.draft.is_new() {
        " 🛠 New Form "
    } else {
        " 🛠 Edit Form "
    };
    let inner = dialog_block(frame, title, Color::Cyan, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Name
            Constraint::Min(1),    // Fields
            Constraint::Length(1), // Message
        ])
        .split(inner);

    render_input(
        frame,
        "Form name",
        &editor.draft.name,
        editor.focus == EditorFocus::Name,
        chunks[0],
    );

    let items: Vec<ListItem> = editor
        .draft
        .fields()
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let focused = editor.focus == EditorFocus::Field(i);
            let label = if field.label.is_empty() {
                Span::styled("(no label)", Style::default().fg(Color::DarkGray))
            } else {
                Span::raw(field.label.clone())
            };
            let line = Line::from(vec![
                Span::styled(format!("{:>2}. ", i + 1), Style::default().fg(Color::DarkGray)),
                label,
                Span::styled(
                    format!("  ‹{}›", field.field_type.title()),
                    Style::default().fg(Color::Yellow),
                ),
            ]);
            ListItem::new(line).style(selected_style(focused))
        })
        .collect();

    let fields_block = Block::default()
        .title(Span::styled(" Fields ", Style::default().fg(Color::DarkGray)))
        .borders(Borders::TOP);
    frame.render_widget(List::new(items).block(fields_block), chunks[1]);

    if let Some(ref message) = editor.message {
        frame.render_widget(
            Paragraph::new(format!("✅ {message}")).style(Style::default().fg(Color::Green)),
            chunks[2],
        );
    } else {
        render_error(frame, editor.error.as_deref(), chunks[2]);
    }
}

fn render_new_employee(frame: &mut Frame, app: &App, area: Rect) {
    let screen = &app.new_employee;
    let Some(ref editor) = screen.editor else {
        render_form_picker(frame, app, area);
        return;
    };

    let inner = dialog_block(frame, " ➕ New Employee ", Color::Cyan, area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    render_record_fields(frame, editor, screen.focus, chunks[0]);

    if let Some(ref message) = screen.message {
        frame.render_widget(
            Paragraph::new(format!("✅ {message}")).style(Style::default().fg(Color::Green)),
            chunks[1],
        );
    } else {
        render_error(frame, screen.error.as_deref(), chunks[1]);
    }
}

fn render_form_picker(frame: &mut Frame, app: &App, area: Rect) {
    let screen = &app.new_employee;
    let inner = dialog_block(frame, " ➕ New Employee - Pick a Form ", Color::Magenta, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let input_line = Line::from(vec![
        Span::styled("▸ ", Style::default().fg(Color::Magenta)),
        Span::styled(&screen.filter, Style::default().fg(Color::White)),
        Span::styled("_", Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK)),
    ]);
    frame.render_widget(Paragraph::new(input_line), chunks[0]);

    let forms = screen.visible_forms(&app.forms.forms);
    if forms.is_empty() {
        let text = if app.forms.loading {
            "Loading…"
        } else if app.forms.forms.is_empty() {
            "No forms yet. Create one in the form builder."
        } else {
            "No results found"
        };
        frame.render_widget(dim(text).alignment(Alignment::Center), chunks[1]);
    } else {
        let items: Vec<ListItem> = forms
            .iter()
            .enumerate()
            .map(|(i, form)| {
                ListItem::new(Line::from(format!("📄 {}", form.name)))
                    .style(selected_style(i == screen.selected))
            })
            .collect();
        frame.render_widget(List::new(items), chunks[1]);
    }

    render_error(frame, app.forms.error.as_deref(), chunks[2]);
}

fn render_employees(frame: &mut Frame, app: &App, area: Rect) {
    let screen = &app.employees;
    let list = &screen.list;

    let inner = dialog_block(frame, " 👥 Employee Records ", Color::Cyan, area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Search
            Constraint::Min(1),    // Records
            Constraint::Length(1), // Pagination
            Constraint::Length(1), // Message
        ])
        .split(inner);

    let searching = screen.mode == InputMode::Search;
    let term = if searching {
        screen.search_input.as_str()
    } else {
        list.search()
    };
    let mut search_line = vec![
        Span::styled("🔍 ", Style::default().fg(Color::Magenta)),
        Span::styled(term, Style::default().fg(Color::White)),
    ];
    if searching {
        search_line.push(Span::styled(
            "_",
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(search_line)), chunks[0]);

    if list.records().is_empty() {
        let text = if screen.loading {
            "Loading…"
        } else {
            "No employees found"
        };
        frame.render_widget(dim(text).alignment(Alignment::Center), chunks[1]);
    } else {
        let items: Vec<ListItem> = list
            .records()
            .iter()
            .enumerate()
            .map(|(i, record)| {
                ListItem::new(record_line(record)).style(selected_style(i == screen.selected))
            })
            .collect();
        frame.render_widget(List::new(items), chunks[1]);
    }

    let arrow = |enabled: bool, text: &'static str| {
        let color = if enabled { Color::Cyan } else { Color::DarkGray };
        Span::styled(text, Style::default().fg(color))
    };
    let pagination = Line::from(vec![
        arrow(list.can_prev(), "◀ Prev"),
        Span::raw(format!("   Page {} of {}   ", list.page(), list.total_pages())),
        arrow(list.can_next(), "Next ▶"),
    ]);
    frame.render_widget(Paragraph::new(pagination).alignment(Alignment::Center), chunks[2]);

    if let Some(error) = list.error() {
        render_error(frame, Some(error), chunks[3]);
    } else if let Some(ref message) = screen.message {
        frame.render_widget(
            Paragraph::new(message.as_str()).style(Style::default().fg(Color::Green)),
            chunks[3],
        );
    }

    match screen.mode {
        InputMode::ConfirmDelete => render_confirm_overlay(frame, app, area),
        InputMode::EditRecord => render_record_overlay(frame, app, area),
        InputMode::Normal | InputMode::Search => {}
    }
}

/// One row of the list: every stored value, keys in order.
fn record_line(record: &Employee) -> Line<'_> {
    let mut spans = vec![Span::styled(
        format!("#{:<5}", record.id),
        Style::default().fg(Color::DarkGray),
    )];
    for (key, value) in &record.data {
        spans.push(Span::styled(format!("{key}: "), Style::default().fg(Color::DarkGray)));
        spans.push(Span::raw(format!("{value}  ")));
    }
    if let Some(created) = record.created_at {
        spans.push(Span::styled(
            created.format("%Y-%m-%d").to_string(),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn render_confirm_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let dialog = centered_rect(44, 5, area);
    frame.render_widget(Clear, dialog);
    let inner = dialog_block(frame, " Delete ", Color::Red, dialog);

    let id = app
        .employees
        .pending_delete
        .map(|confirmation| confirmation.id().to_string())
        .unwrap_or_default();
    let text = Paragraph::new(format!("Delete employee #{id}? (y/n)"))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(text, inner.inner(Margin::new(1, 1)));
}

fn render_record_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let screen = &app.employees;
    let Some(ref editor) = screen.editor else {
        return;
    };

    let rows = u16::try_from(editor.entries().len()).unwrap_or(u16::MAX);
    let height = rows.saturating_mul(2).saturating_add(5);
    let dialog_width = 60.min(area.width.saturating_sub(4));
    let dialog = centered_rect(dialog_width, height.min(area.height.saturating_sub(2)), area);
    frame.render_widget(Clear, dialog);
    let inner = dialog_block(frame, " ✏ Edit Employee ", Color::Magenta, dialog);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    render_record_fields(frame, editor, screen.editor_focus, chunks[0]);
    render_error(frame, screen.editor_error.as_deref(), chunks[1]);
}

/// Inputs of a record editor, one per key.
fn render_record_fields(frame: &mut Frame, editor: &RecordEditor, focus: usize, area: Rect) {
    let entries = editor.entries();
    if entries.is_empty() {
        frame.render_widget(dim("This form has no fields"), area);
        return;
    }

    // Only the rows that fit, scrolled so the focused one stays visible
    let visible = usize::from(area.height / 2).clamp(1, entries.len());
    let start = focus.saturating_sub(visible - 1).min(entries.len() - visible);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(2); visible])
        .split(area);

    let shown_entries = entries.iter().enumerate().skip(start).take(visible);
    for ((i, (key, value)), row) in shown_entries.zip(rows.iter()) {
        let field_type = editor.field_type(key);
        let shown = if field_type.is_secret() {
            "*".repeat(value.chars().count())
        } else {
            value.clone()
        };
        let label = format!("{key} ({})", field_type.title());
        render_input(frame, &label, &shown, i == focus, *row);
    }
}

/// Render each input of `group` into the matching area.
fn render_inputs(frame: &mut Frame, group: &InputGroup, areas: &[Rect]) {
    for (i, (input, area)) in group.inputs.iter().zip(areas).enumerate() {
        render_input(frame, &input.label, &input.display(), group.focus == i, *area);
    }
}

fn render_input(frame: &mut Frame, label: &str, value: &str, focused: bool, area: Rect) {
    let (marker, color) = if focused {
        ("▸ ", Color::Yellow)
    } else {
        ("  ", Color::White)
    };
    let mut spans = vec![
        Span::styled(format!("{marker}{label}: "), Style::default().fg(Color::DarkGray)),
        Span::styled(value.to_string(), Style::default().fg(color)),
    ];
    if focused {
        spans.push(Span::styled("_", Style::default().fg(color)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_field(frame: &mut Frame, label: &str, value: &str, area: Rect, color: Color) {
    let line = Line::from(vec![
        Span::styled(format!("{}: ", label), Style::default().fg(Color::DarkGray)),
        Span::styled(value, Style::default().fg(color)),
    ]);
    let paragraph = Paragraph::new(line);
    frame.render_widget(paragraph, area);
}

fn render_error(frame: &mut Frame, error: Option<&str>, area: Rect) {
    if let Some(error) = error {
        let error_msg = Paragraph::new(error)
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        frame.render_widget(error_msg, area);
    }
}

fn dim(text: &str) -> Paragraph<'_> {
    Paragraph::new(text).style(Style::default().fg(Color::DarkGray))
}

fn selected_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .bg(SELECTED_BG)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}

/// Draw a bordered block and return its inner area.
fn dialog_block(frame: &mut Frame, title: &str, color: Color, area: Rect) -> Rect {
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

/// Helper to create a centered rectangle.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, ChatState, InputField, LoginField, LoginState, Role, Sender, View};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let animation_frame = app.animation_frame;

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);

    match &mut app.view {
        View::Login(state) => render_login(state, frame, body_area),
        View::Chat(state) => render_chat(state, animation_frame, frame, body_area),
    }

    render_footer(&app.view, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Dobbe AI ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("AI for Dentists", Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_login(state: &LoginState, frame: &mut Frame, area: Rect) {
    // Centered card, like the browser layout.
    let card_width = 48.min(area.width.saturating_sub(2));
    let card_height = 14.min(area.height);
    let card = Rect::new(
        area.x + (area.width.saturating_sub(card_width)) / 2,
        area.y + (area.height.saturating_sub(card_height)) / 2,
        card_width,
        card_height,
    );

    let [tabs_area, title_area, id_area, password_area, message_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(card);

    frame.render_widget(role_tabs(state.tab), tabs_area);

    let title = Paragraph::new(Line::from(
        format!("{} Login", state.tab.as_str()).bold(),
    ));
    frame.render_widget(title, title_area);

    render_input(
        frame,
        id_area,
        " Login ID ",
        &state.login_id,
        state.focus == LoginField::LoginId,
        false,
    );
    render_input(
        frame,
        password_area,
        " Password ",
        &state.password,
        state.focus == LoginField::Password,
        true,
    );

    let message = Paragraph::new(state.message.as_str())
        .style(Style::default().fg(Color::Yellow))
        .wrap(Wrap { trim: true });
    frame.render_widget(message, message_area);
}

fn role_tabs(active: Role) -> Paragraph<'static> {
    let tab_style = |role: Role| {
        if role == active {
            Style::default().bg(Color::Blue).fg(Color::White).bold()
        } else {
            Style::default().fg(Color::Gray)
        }
    };

    Paragraph::new(Line::from(vec![
        Span::styled(" Patient ", tab_style(Role::Patient)),
        Span::raw(" "),
        Span::styled(" Doctor ", tab_style(Role::Doctor)),
    ]))
}

fn render_chat(state: &mut ChatState, animation_frame: u8, frame: &mut Frame, area: Rect) {
    let [sidebar_area, main_area] =
        Layout::horizontal([Constraint::Length(22), Constraint::Min(0)]).areas(area);

    render_sidebar(state.identity.role, frame, sidebar_area);

    let [chat_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(main_area);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(
            " Welcome {}: {} ",
            state.identity.role.as_str(),
            state.identity.login_id
        ));

    // The wrap math in scroll_to_bottom needs the inner dimensions.
    let inner = chat_block.inner(chat_area);
    state.chat_height = inner.height;
    state.chat_width = inner.width;

    let mut lines: Vec<Line> = Vec::new();
    for msg in &state.transcript {
        match msg.sender {
            Sender::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
            }
            Sender::Bot => {
                lines.push(Line::from(Span::styled(
                    "Bot:",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )));
            }
        }
        for line in msg.text.lines() {
            lines.push(Line::from(line.to_string()));
        }
        if msg.text.is_empty() {
            lines.push(Line::default());
        }
        lines.push(Line::default());
    }

    if state.loading {
        lines.push(Line::from(Span::styled(
            "Bot:",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        let dots = ".".repeat(animation_frame as usize + 1);
        lines.push(Line::from(Span::styled(
            format!("Bot is typing{}", dots),
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((state.scroll, 0));
    frame.render_widget(chat, chat_area);

    if state.input.text.is_empty() {
        let placeholder_block = input_block(" Message ", !state.loading);
        let placeholder = Paragraph::new("Type your message...")
            .style(Style::default().fg(Color::Gray))
            .block(placeholder_block);
        frame.render_widget(placeholder, input_area);
        if !state.loading {
            frame.set_cursor_position((input_area.x + 1, input_area.y + 1));
        }
    } else {
        render_input(
            frame,
            input_area,
            " Message ",
            &state.input,
            !state.loading,
            false,
        );
    }
}

fn render_sidebar(role: Role, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" {} Menu ", role.as_str()));

    let mut lines = vec![
        Line::from(" Dashboard"),
        Line::from(" Profile"),
        Line::from(" Appointments"),
    ];
    if role == Role::Doctor {
        lines.push(Line::from(" Patients"));
    }
    lines.push(Line::from(" Logout (Esc)"));

    if role == Role::Doctor {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            " 📊 Generate Report ",
            Style::default().bg(Color::Blue).fg(Color::White).bold(),
        )));
        lines.push(Line::from(Span::styled(
            "    Ctrl+R",
            Style::default().fg(Color::Gray),
        )));
    }

    let menu = Paragraph::new(Text::from(lines))
        .style(Style::default().fg(Color::Gray))
        .block(block);
    frame.render_widget(menu, area);
}

fn input_block(title: &str, focused: bool) -> Block<'_> {
    let border_color = if focused { Color::Yellow } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title.to_string())
}

fn render_input(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    field: &InputField,
    focused: bool,
    mask: bool,
) {
    let block = input_block(title, focused);

    // Keep the cursor visible by scrolling the text horizontally.
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 {
        0
    } else if field.cursor >= inner_width {
        field.cursor - inner_width + 1
    } else {
        0
    };

    let shown: String = if mask {
        "*".repeat(field.text.chars().count())
    } else {
        field.text.clone()
    };
    let visible: String = shown.chars().skip(scroll_offset).take(inner_width).collect();

    let input = Paragraph::new(visible)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if focused {
        let cursor_x = (field.cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(view: &View, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let (mode_text, mode_style) = match view {
        View::Login(_) => (" LOGIN ", Style::default().bg(Color::Blue).fg(Color::White)),
        View::Chat(state) => match state.identity.role {
            Role::Patient => (
                " PATIENT ",
                Style::default().bg(Color::Green).fg(Color::Black),
            ),
            Role::Doctor => (
                " DOCTOR ",
                Style::default().bg(Color::Magenta).fg(Color::White),
            ),
        },
    };

    let mut hints = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
    ];

    match view {
        View::Login(state) => {
            hints.extend(vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" login ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" field ", label_style),
                Span::styled(" Ctrl+T ", key_style),
                Span::styled(" role ", label_style),
            ]);
            if state.submitting {
                hints.push(Span::styled(" signing in... ", label_style));
            }
        }
        View::Chat(state) => {
            hints.extend(vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" ↑/↓ ", key_style),
                Span::styled(" scroll ", label_style),
            ]);
            if state.identity.role == Role::Doctor {
                hints.extend(vec![
                    Span::styled(" Ctrl+R ", key_style),
                    Span::styled(" report ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" Esc ", key_style),
                Span::styled(" logout ", label_style),
            ]);
        }
    }

    hints.extend(vec![
        Span::styled(" Ctrl+C ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    let footer = Paragraph::new(Line::from(hints)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

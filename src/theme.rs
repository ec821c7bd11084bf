use ratatui::style::{Color, Modifier, Style};

pub struct Theme {
    pub tab: Style,
    pub tab_active: Style,
    pub panel_border: Style,
    pub panel_title: Style,
    pub staged_title: Style,
    pub placeholder: Style,

    // Logs tab
    pub branch: Style,
    pub branch_selected: Style,
    pub commit_hash: Style,
    pub commit_ticket: Style,

    pub footer: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            tab: Style::default().fg(Color::Gray),
            tab_active: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_title: Style::default().add_modifier(Modifier::UNDERLINED),
            staged_title: Style::default()
                .fg(Color::Rgb(0xAC, 0xD8, 0xA9))
                .add_modifier(Modifier::UNDERLINED),
            placeholder: Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),

            branch: Style::default().fg(Color::White),
            branch_selected: Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            commit_hash: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            commit_ticket: Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),

            footer: Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
        }
    }
}

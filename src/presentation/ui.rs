use crate::application::{App, FormSlot, LoginField, Screen};
use crate::domain::{Choice, Field, FieldKind, FoundItemKind, Record};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, List, ListItem, Paragraph, Row, Table, Wrap},
};
use std::time::Instant;

pub fn render_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    match app.screen() {
        Screen::Login => render_login(f, app, chunks[1]),
        Screen::Form => render_form(f, app, chunks[1]),
        Screen::Confirmation => render_confirmation(f, app.workflow.record(), chunks[1]),
        Screen::Searching => render_searching(f, app, chunks[1]),
        Screen::Results => render_results(f, app, chunks[1]),
    }
    render_status_bar(f, app, chunks[2]);

    if app.show_help {
        render_help_popup(f, app.help_scroll);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let operator = app.session.identifier().unwrap_or("-");
    let header = Paragraph::new(format!(
        "Sigma Search - Busca de Pessoas Desaparecidas | Operador: {operator}"
    ))
    .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_login(f: &mut Frame, app: &App, area: Rect) {
    let outer = centered(area, 50, 10);
    f.render_widget(
        Block::default().borders(Borders::ALL).title("Acesso Restrito"),
        outer,
    );
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(0)])
        .split(outer);

    let masked = "*".repeat(app.login.secret.chars().count());
    let inputs = [
        (LoginField::Identifier, "Usuário", app.login.identifier.as_str()),
        (LoginField::Secret, "Senha", masked.as_str()),
    ];
    for (i, (field, title, value)) in inputs.into_iter().enumerate() {
        let style = if app.login.error == Some(field) {
            Style::default().fg(Color::Red)
        } else if app.login.focus == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let widget = Paragraph::new(value)
            .block(Block::default().borders(Borders::ALL).title(title).style(style));
        f.render_widget(widget, rows[i]);
    }
}

fn slot_value(app: &App, slot: FormSlot, focused: bool) -> String {
    let record = app.workflow.record();
    match slot {
        FormSlot::Child(index) => record.children()[index].clone(),
        FormSlot::Field(field) => match field {
            Field::SkinColor => format!("< {} >", record.skin_color.label()),
            Field::HairColor => format!("< {} >", record.hair_color.label()),
            Field::EyeColor => format!("< {} >", record.eye_color.label()),
            Field::Photo => match (&record.photo, focused) {
                (_, true) if !app.photo_input.is_empty() => format!("Caminho: {}", app.photo_input),
                (Some(photo), _) => format!(
                    "{} ({}, {} KB)",
                    photo.file_name,
                    photo.mime.as_str(),
                    photo.bytes().len().div_ceil(1024)
                ),
                (None, true) => "Digite o caminho do arquivo e tecle Enter".to_string(),
                (None, false) => "Nenhuma foto".to_string(),
            },
            _ => record.text(field).unwrap_or_default().to_string(),
        },
    }
}

fn slot_label(slot: FormSlot) -> String {
    match slot {
        FormSlot::Child(index) => format!("{} {}", Field::Children.label(), index + 1),
        FormSlot::Field(field) if field.is_required() => format!("{} *", field.label()),
        FormSlot::Field(field) => field.label().to_string(),
    }
}

fn render_form(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let progress = app.workflow.progress();
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progresso do formulário"))
        .gauge_style(Style::default().fg(Color::Green))
        .percent(u16::from(progress))
        .label(format!("{progress}%"));
    f.render_widget(gauge, chunks[0]);

    let slots = app.form_slots();
    let check = app.workflow.form_check();
    let visible = chunks[1].height.saturating_sub(2) as usize;
    let focus = app.focus.min(slots.len() - 1);
    let offset = (focus + 1).saturating_sub(visible);

    let rows: Vec<Row> = slots
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, slot)| {
            let focused = i == focus;
            let in_error = app.show_errors && check.has_error(slot.field());
            let label_style = if in_error {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Yellow)
            };
            let value_style = if focused {
                Style::default().bg(Color::Blue).fg(Color::White)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(slot_label(*slot)).style(label_style),
                Cell::from(slot_value(app, *slot, focused)).style(value_style),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(24), Constraint::Min(10)])
        .block(Block::default().borders(Borders::ALL).title("Dados da Pessoa Desaparecida"))
        .column_spacing(1);
    f.render_widget(table, chunks[1]);
}

fn summary_line(label: &str, value: impl Into<String>) -> Line<'static> {
    let value = value.into();
    let value = if value.trim().is_empty() { "-".to_string() } else { value };
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(Color::Yellow)),
        Span::raw(value),
    ])
}

fn render_confirmation(f: &mut Frame, record: &Record, area: Rect) {
    let children: Vec<&str> = record
        .children()
        .iter()
        .map(String::as_str)
        .filter(|c| !c.trim().is_empty())
        .collect();
    let photo = record.photo.as_ref().map_or("Nenhuma".to_string(), |p| p.file_name.clone());

    let lines = vec![
        summary_line(Field::FullName.label(), record.full_name.clone()),
        summary_line(Field::NationalId.label(), record.national_id.clone()),
        summary_line(Field::Photo.label(), photo),
        summary_line(Field::MotherName.label(), record.mother_name.clone()),
        summary_line(Field::FatherName.label(), record.father_name.clone()),
        summary_line(Field::Phone.label(), record.phone.clone()),
        summary_line(
            "Naturalidade",
            format!("{}/{}", record.birth_city, record.birth_state),
        ),
        summary_line("Endereço", record.formatted_address()),
        summary_line(Field::Spouse.label(), record.spouse.clone()),
        summary_line(Field::Children.label(), children.join(", ")),
        summary_line(Field::SkinColor.label(), record.skin_color.label()),
        summary_line(Field::HairColor.label(), record.hair_color.label()),
        summary_line(Field::EyeColor.label(), record.eye_color.label()),
        summary_line(Field::Height.label(), record.height.clone()),
        summary_line(Field::Weight.label(), record.weight.clone()),
        summary_line(Field::Notes.label(), record.notes.clone()),
    ];

    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Confirme os dados"))
        .wrap(Wrap { trim: true });
    f.render_widget(widget, area);
}

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

fn render_searching(f: &mut Frame, app: &App, area: Rect) {
    let remaining = app.workflow.search_remaining(Instant::now()).unwrap_or_default();
    let frame = (remaining.as_millis() / 250) as usize % SPINNER.len();
    let name = &app.workflow.record().full_name;
    let text = vec![
        Line::from(format!("{} Buscando informações sobre {name}...", SPINNER[frame])),
        Line::from(""),
        Line::from(format!("Tempo restante: {:.1}s", remaining.as_secs_f32())),
    ];
    let widget = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Buscando"));
    f.render_widget(widget, centered(area, 60, 7));
}

fn render_results(f: &mut Frame, app: &App, area: Rect) {
    let Some(result) = app.workflow.result() else {
        return;
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Min(4),
            Constraint::Length(result.recommendations.len() as u16 * 2 + 2),
        ])
        .split(area);

    let subject = &result.subject;
    let (title, color) = if result.found {
        ("Informações encontradas", Color::Green)
    } else {
        ("Nenhuma informação encontrada", Color::Red)
    };
    let photo = if subject.photo_preview.is_some() { "anexada" } else { "não informada" };
    let summary = vec![
        summary_line("Nome", subject.name.clone()),
        summary_line("Idade", subject.age.clone()),
        summary_line("Altura", subject.height.clone()),
        summary_line("Cabelo", subject.hair_color.clone()),
        summary_line("Foto", photo),
    ];
    let summary_widget = Paragraph::new(summary).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(Style::default().fg(color)),
    );
    f.render_widget(summary_widget, chunks[0]);

    let items: Vec<ListItem> = result
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let icon = match item.kind {
                FoundItemKind::Location => "[Local]",
                FoundItemKind::Social => "[Social]",
            };
            let mut lines = vec![
                Line::from(vec![
                    Span::styled(format!("{icon} "), Style::default().fg(Color::Cyan)),
                    Span::styled(item.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(format!("  {}", item.timestamp)),
                ]),
                Line::from(format!("  {}", item.description)),
            ];
            if let (Some(link), text) = (&item.link, &item.link_text) {
                let platform = item.platform.as_deref().map(|p| format!(" ({p})")).unwrap_or_default();
                lines.push(Line::from(format!(
                    "  {}{platform}: {link}",
                    text.as_deref().unwrap_or("Link")
                )));
            }
            let style = if i == app.selected_item {
                Style::default().bg(Color::Blue).fg(Color::White)
            } else {
                Style::default()
            };
            ListItem::new(lines).style(style)
        })
        .collect();
    let list_title = format!("Itens encontrados | {}", subject.summary);
    f.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title(list_title)),
        chunks[1],
    );

    let recommendations: Vec<Line> = result
        .recommendations
        .iter()
        .flat_map(|r| {
            [
                Line::from(Span::styled(r.title.clone(), Style::default().fg(Color::Yellow))),
                Line::from(format!("  {}", r.description)),
            ]
        })
        .collect();
    f.render_widget(
        Paragraph::new(recommendations)
            .block(Block::default().borders(Borders::ALL).title("Recomendações")),
        chunks[2],
    );
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let hints = match app.screen() {
        Screen::Login => "Tab: alternar campo | Enter: entrar | F1: ajuda | Esc: sair",
        Screen::Form => match app.focused_slot() {
            FormSlot::Field(field) if field.kind() == FieldKind::Choice => {
                "←→: escolher | ↑↓: navegar | Ctrl+S: enviar | Ctrl+L: sair | F1: ajuda"
            }
            FormSlot::Field(field) if field.kind() == FieldKind::StateCode => {
                "←→: UF | ↑↓: navegar | Ctrl+S: enviar | F1: ajuda"
            }
            FormSlot::Field(Field::Photo) => "Enter: carregar foto | Ctrl+X: remover | ↑↓: navegar",
            FormSlot::Child(_) => "Ctrl+N: adicionar filho | Ctrl+D: remover | ↑↓: navegar",
            FormSlot::Field(_) => "↑↓/Tab: navegar | Ctrl+S: enviar | Ctrl+N: novo filho | F1: ajuda",
        },
        Screen::Confirmation => "Enter/b: iniciar busca | e/Esc: editar | q: sair",
        Screen::Searching => "Aguarde a conclusão da busca | q: sair",
        Screen::Results => "↑↓: selecionar | c: copiar link | n: nova busca | Ctrl+L: sair | q: sair",
    };
    let text = app.status_message.clone().unwrap_or_else(|| hints.to_string());
    let style = if app.status_message.is_some() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let status = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(style);
    f.render_widget(status, area);
}

fn render_help_popup(f: &mut Frame, scroll: usize) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);

    let help_lines: Vec<&str> = HELP_TEXT.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;

    let start_line = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(help_lines.len());

    let help_widget = Paragraph::new(help_lines[start_line..end_line].join("\n"))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Ajuda (linha {}/{})", start_line + 1, help_lines.len()))
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(help_widget, popup_area);
}

const HELP_TEXT: &str = r#"SIGMA SEARCH - AJUDA

=== LOGIN ===
Tab / ↑↓        Alternar entre usuário e senha
Enter           Entrar

=== FORMULÁRIO ===
↑↓ / Tab        Navegar entre os campos
←→              Escolher cor de pele, cabelo, olhos e UF
Enter           Próximo campo (no campo Foto: carregar o arquivo)
Ctrl+N          Adicionar filho
Ctrl+D          Remover o filho selecionado
Ctrl+X          Remover a foto
Ctrl+S / F10    Enviar o formulário
Ctrl+L          Sair da conta

Campos marcados com * são obrigatórios.
CPF e celular são formatados automaticamente.
A foto deve ser JPEG ou PNG com até 5 MB.

=== CONFIRMAÇÃO ===
Enter / b       Iniciar a busca
e / Esc         Voltar e editar

=== RESULTADOS ===
↑↓ / j k        Selecionar item
c / Enter       Copiar o link do item
n               Nova busca

=== GERAL ===
F1 / ?          Mostrar esta ajuda
Ctrl+C          Encerrar o programa
q               Encerrar (fora dos campos de texto)"#;

use glam::DVec3;
use ratatui::{
    buffer::Buffer,
    layout::{Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

use crate::app::{App, CachedPoint, Field, GLOBE_RADIUS};
use crate::geo::GeoPoint;
use crate::globe::{get_appearance, LAND};
use crate::solar::solar_noon;

const NEON_CYAN: Color = Color::Rgb(0, 255, 255);
const NEON_PINK: Color = Color::Rgb(255, 45, 149);
const NEON_YELLOW: Color = Color::Rgb(255, 215, 0);
const SUN_ORANGE: Color = Color::Rgb(255, 170, 40);
const HUD_DIM: Color = Color::Rgb(80, 80, 100);
const HUD_TEXT: Color = Color::Rgb(180, 200, 220);
const HUD_BG: Color = Color::Rgb(8, 8, 18);

// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f64 = 0.45;

/// Screen placement of the globe inside the widget area.
#[derive(Debug, Clone, Copy)]
struct Disc {
    area: Rect,
    cx: f64,
    cy: f64,
    r: f64,
}

impl Disc {
    fn new(area: Rect) -> Self {
        Self {
            area,
            cx: area.width as f64 / 2.0,
            cy: area.height as f64 / 2.0,
            r: area.height as f64 / 2.0 - 1.0,
        }
    }

    /// Screen cell for a view-space point, if it is in front of the globe or
    /// outside its silhouette.
    fn project(&self, view: DVec3) -> Option<(u16, u16)> {
        let off_disc = view.x * view.x + view.y * view.y > GLOBE_RADIUS * GLOBE_RADIUS;
        if view.z <= 0.0 && !off_disc {
            return None;
        }
        let x = (self.cx + view.x * self.r / CELL_ASPECT).round();
        let y = (self.cy - view.y * self.r).round();
        if x < 0.0 || y < 0.0 || x >= self.area.width as f64 || y >= self.area.height as f64 {
            return None;
        }
        Some((self.area.x + x as u16, self.area.y + y as u16))
    }
}

pub struct GlobeWidget<'a> {
    pub app: &'a mut App,
}

impl<'a> Widget for GlobeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = area.inner(Margin {
            vertical: 1,
            horizontal: 1,
        });
        if inner.width == 0 || inner.height == 0 {
            return;
        }
        let disc = Disc::new(inner);

        // View-space normals only change when the terminal is resized
        if self.app.last_width != inner.width || self.app.last_height != inner.height {
            self.app.last_width = inner.width;
            self.app.last_height = inner.height;
            self.app.projection_cache.clear();

            if disc.r > 0.0 {
                for y in 0..inner.height {
                    let dy = (y as f64 - disc.cy) / disc.r;
                    for x in 0..inner.width {
                        let dx = (x as f64 - disc.cx) / disc.r * CELL_ASPECT;
                        let d2 = dx * dx + dy * dy;
                        if d2 <= 1.0 {
                            self.app.projection_cache.push(CachedPoint {
                                screen_x: inner.x + x,
                                screen_y: inner.y + y,
                                view: DVec3::new(dx, -dy, (1.0 - d2).sqrt()),
                            });
                        }
                    }
                }
            }
        }

        let rotation = self.app.view_rotation();
        let to_world = rotation.inverse();

        for p in &self.app.projection_cache {
            let world = to_world * p.view;
            let illumination = self.app.terminator.illumination(world);
            let is_land = GeoPoint::from_cartesian(world)
                .map(|g| LAND.is_land(g))
                .unwrap_or(false);
            let (character, color) = get_appearance(is_land, illumination);

            if let Some(cell) = buf.cell_mut((p.screen_x, p.screen_y)) {
                cell.set_char(character).set_fg(color);
            }
        }

        let mut plot = |world: DVec3, ch: char, color: Color| {
            if let Some(pos) = disc.project(rotation * world) {
                if let Some(cell) = buf.cell_mut(pos) {
                    cell.set_char(ch).set_fg(color);
                }
            }
        };

        if let Some(path) = &self.app.flight_path {
            for point in &path.points {
                plot(*point, '•', NEON_YELLOW);
            }
            if let (Some(first), Some(last)) = (path.points.first(), path.points.last()) {
                plot(*first, '◆', NEON_PINK);
                plot(*last, '◆', NEON_CYAN);
            }
        }

        plot(
            self.app.terminator.sun_direction() * GLOBE_RADIUS,
            '☼',
            SUN_ORANGE,
        );

        // Breathing pulse on the home marker
        let home_char = if self.app.tick_count % 6 < 3 { '◈' } else { '◇' };
        plot(
            self.app.home.position.to_cartesian(GLOBE_RADIUS),
            home_char,
            Color::White,
        );
    }
}

fn fmt_lat(lat: f64) -> String {
    format!("{:.2}°{}", lat.abs(), if lat >= 0.0 { 'N' } else { 'S' })
}

fn fmt_lon(lon: f64) -> String {
    format!("{:.2}°{}", lon.abs(), if lon >= 0.0 { 'E' } else { 'W' })
}

fn panel(title: &str, color: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(Line::from(vec![
            Span::styled("┤ ", Style::default().fg(HUD_DIM)),
            Span::styled(title, Style::default().fg(color)),
            Span::styled(" ├", Style::default().fg(HUD_DIM)),
        ]))
        .border_style(Style::default().fg(color))
}

fn label(name: &str) -> Span<'static> {
    Span::styled(format!("{name:<5}"), Style::default().fg(HUD_DIM))
}

pub fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    let title = Line::from(vec![
        Span::styled("╡ ", Style::default().fg(HUD_DIM)),
        Span::styled(
            "DAYLINE",
            Style::default().fg(SUN_ORANGE).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            concat!(" v", env!("CARGO_PKG_VERSION"), " "),
            Style::default().fg(HUD_DIM),
        ),
        Span::styled("╞", Style::default().fg(HUD_DIM)),
    ]);

    let status_bar = Line::from(vec![
        Span::styled("╡ ", Style::default().fg(HUD_DIM)),
        Span::styled("☼", Style::default().fg(SUN_ORANGE)),
        Span::styled(
            format!(" {} {} ", fmt_lat(app.sun.latitude), fmt_lon(app.sun.longitude)),
            Style::default().fg(HUD_TEXT),
        ),
        Span::styled("│ ", Style::default().fg(HUD_DIM)),
        Span::styled(
            format!("AIRPORTS: {} ", app.dataset_status()),
            Style::default().fg(HUD_TEXT),
        ),
        Span::styled("╞", Style::default().fg(HUD_DIM)),
    ]);

    let block = Block::default()
        .title_top(title)
        .title_bottom(status_bar)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(NEON_CYAN))
        .style(Style::default().bg(HUD_BG));

    f.render_widget(block, area);

    let globe = GlobeWidget { app: &mut *app };
    f.render_widget(globe, area);

    render_sun_panel(f, app);

    render_route_panel(f, app);

    render_keybind_footer(f, app);

    if app.form.active {
        render_route_form(f, app);
    }
}

fn render_sun_panel(f: &mut Frame, app: &App) {
    let area = f.area();

    let noon = solar_noon(app.sim_time)
        .map(|t| t.format("%H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "--".to_string());

    let lines = vec![
        Line::from(vec![
            label("UTC"),
            Span::styled(
                app.sim_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                Style::default().fg(HUD_TEXT),
            ),
        ]),
        Line::from(vec![
            label("SUN"),
            Span::styled(
                format!("{} {}", fmt_lat(app.sun.latitude), fmt_lon(app.sun.longitude)),
                Style::default().fg(SUN_ORANGE),
            ),
        ]),
        Line::from(vec![label("NOON"), Span::styled(noon, Style::default().fg(HUD_TEXT))]),
        Line::from(vec![
            label("RATE"),
            Span::styled(
                format!("{}x", app.clock.scale()),
                Style::default().fg(HUD_TEXT),
            ),
            Span::styled(
                if app.auto_spin { "  spinning" } else { "  held" },
                Style::default().fg(HUD_DIM),
            ),
        ]),
    ];

    let panel_area = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: 36.min(area.width.saturating_sub(2)),
        height: (lines.len() as u16 + 2).min(area.height.saturating_sub(2)),
    };

    let widget = Paragraph::new(lines)
        .block(panel("SUN", SUN_ORANGE))
        .style(Style::default().fg(HUD_TEXT).bg(HUD_BG));

    f.render_widget(Clear, panel_area);
    f.render_widget(widget, panel_area);
}

fn render_route_panel(f: &mut Frame, app: &App) {
    let area = f.area();
    let mut lines = vec![Line::from(vec![
        label("DATA"),
        Span::styled(app.dataset_status(), Style::default().fg(HUD_TEXT)),
    ])];

    if let Some(path) = &app.flight_path {
        for (airport, color) in [(&path.departure, NEON_PINK), (&path.arrival, NEON_CYAN)] {
            lines.push(Line::from(vec![
                Span::styled(format!("{:<5}", airport.code), Style::default().fg(color)),
                Span::styled(
                    format!("{}, {}", airport.name, airport.city),
                    Style::default().fg(HUD_TEXT),
                ),
            ]));
        }
        lines.push(Line::from(vec![
            label("DIST"),
            Span::styled(
                format!("{:.0} km", path.distance_km()),
                Style::default().fg(NEON_YELLOW),
            ),
        ]));
    }

    let home = app.home.position;
    let (home_sky, sky_color) = if app.terminator.is_night(home.to_cartesian(GLOBE_RADIUS)) {
        ("☾ ", HUD_DIM)
    } else {
        ("☼ ", SUN_ORANGE)
    };
    let home_color = if app.home.resolved { NEON_CYAN } else { HUD_TEXT };
    lines.push(Line::from(vec![
        label("HOME"),
        Span::styled(home_sky, Style::default().fg(sky_color)),
        Span::styled(
            format!(
                "{} ({} {})",
                app.home.label,
                fmt_lat(home.latitude()),
                fmt_lon(home.longitude())
            ),
            Style::default().fg(home_color),
        ),
    ]));

    if let Some(status) = &app.status {
        lines.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(NEON_YELLOW),
        )));
    }

    let height = lines.len() as u16 + 2;
    let panel_area = Rect {
        x: area.x + 1,
        y: area.bottom().saturating_sub(height + 2), // +2 for keybind footer
        width: 56.min(area.width.saturating_sub(2)),
        height: height.min(area.height.saturating_sub(2)),
    };

    let widget = Paragraph::new(lines)
        .block(panel("ROUTE", NEON_CYAN))
        .style(Style::default().fg(HUD_TEXT).bg(HUD_BG));

    f.render_widget(Clear, panel_area);
    f.render_widget(widget, panel_area);
}

fn render_route_form(f: &mut Frame, app: &App) {
    let area = f.area();

    let field = |name: &str, value: &str, focused: bool| {
        let color = if focused { NEON_YELLOW } else { HUD_TEXT };
        vec![
            Span::styled(format!("{name:<5}"), Style::default().fg(HUD_DIM)),
            Span::styled(format!("[{value:<3}]"), Style::default().fg(color)),
        ]
    };

    let mut spans = field("FROM", &app.form.departure, app.form.focus == Field::Departure);
    spans.push(Span::raw("   "));
    spans.extend(field("TO", &app.form.arrival, app.form.focus == Field::Arrival));

    let form_width = 32;
    let form_area = Rect {
        x: area.x + area.width.saturating_sub(form_width) / 2,
        y: area.y + area.height.saturating_sub(3) / 2,
        width: form_width.min(area.width),
        height: 3.min(area.height),
    };

    let widget = Paragraph::new(Line::from(spans))
        .block(panel("FLIGHT", NEON_YELLOW))
        .style(Style::default().fg(Color::White).bg(HUD_BG));

    f.render_widget(Clear, form_area);
    f.render_widget(widget, form_area);

    // Cursor inside the focused field's brackets
    let (offset, len) = match app.form.focus {
        Field::Departure => (1 + 5 + 1, app.form.departure.len()),
        Field::Arrival => (1 + 5 + 5 + 3 + 5 + 1, app.form.arrival.len()),
    };
    f.set_cursor_position(ratatui::layout::Position::new(
        form_area.x + offset + len as u16,
        form_area.y + 1,
    ));
}

fn render_keybind_footer(f: &mut Frame, app: &App) {
    let area = f.area();

    let key = |k: &'static str| Span::styled(k, Style::default().fg(NEON_YELLOW));
    let dim = |t: &'static str| Span::styled(t, Style::default().fg(HUD_DIM));

    let legend = if app.form.active {
        Line::from(vec![
            dim(" ["),
            key("Tab"),
            dim("]Switch  ["),
            key("Enter"),
            dim("]Draw  ["),
            key("Esc"),
            dim("]Cancel"),
        ])
    } else {
        Line::from(vec![
            dim(" ["),
            key("Q"),
            dim("]uit  ["),
            key("F"),
            dim("]light  ["),
            key("←→"),
            dim("]Spin  ["),
            key("Space"),
            dim("]Hold  ["),
            key("+/-"),
            dim("]Time  ["),
            key("H"),
            dim("]ome  ["),
            key("C"),
            dim("]lear"),
        ])
    };

    let footer_area = Rect {
        x: area.x + 1,
        y: area.bottom().saturating_sub(2),
        width: area.width.saturating_sub(2),
        height: 1,
    };

    let footer = Paragraph::new(legend).style(Style::default().bg(HUD_BG));
    f.render_widget(footer, footer_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projects_front_points_and_hides_back_points() {
        let disc = Disc::new(Rect::new(0, 0, 80, 40));

        assert_eq!(disc.project(DVec3::new(0.0, 0.0, 1.0)), Some((40, 20)));
        assert_eq!(disc.project(DVec3::new(0.0, 0.0, -1.0)), None);

        // Above the limb but behind the centre plane is still visible.
        let limb = disc.project(DVec3::new(0.0, 1.02, -0.1)).unwrap();
        assert!(limb.1 < 2);
    }

    #[test]
    fn off_screen_points_are_dropped() {
        let disc = Disc::new(Rect::new(0, 0, 10, 6));
        assert_eq!(disc.project(DVec3::new(5.0, 0.0, 1.0)), None);
    }

    #[test]
    fn hemisphere_labels() {
        assert_eq!(fmt_lat(-23.44), "23.44°S");
        assert_eq!(fmt_lon(151.2), "151.20°E");
        assert_eq!(fmt_lon(-0.5), "0.50°W");
    }
}

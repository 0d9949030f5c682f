//! Directions screen: the confirmed route, leg by leg.
//!
//! Distances are straight-line (haversine), which is honest about what a
//! geocoder alone can know; turn-by-turn routing would need a routing
//! service.

use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Padding, Paragraph},
};

use crate::model::Waypoint;

/// The directions screen, scrollable when the route outgrows the window.
pub struct DirectionsScreen {
    lines: Vec<Line<'static>>,
    scroll_offset: usize,
}

impl DirectionsScreen {
    pub fn new(waypoints: &[Waypoint]) -> Self {
        Self {
            lines: route_lines(waypoints),
            scroll_offset: 0,
        }
    }

    pub fn on_scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    pub fn on_scroll_down(&mut self) {
        self.scroll_offset += 1;
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::vertical([
            Constraint::Length(3), // header
            Constraint::Min(0),    // route
            Constraint::Length(1), // help
        ])
        .split(area);

        let muted = Style::default().fg(Color::DarkGray);
        let highlight = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        let header = Paragraph::new(Line::from(Span::styled("Route", highlight)))
            .block(Block::default().padding(Padding::new(2, 0, 1, 0)));
        frame.render_widget(header, chunks[0]);

        let content_padding = Block::default().padding(Padding::new(2, 2, 0, 0));
        let inner = content_padding.inner(chunks[1]);
        let visible_height = usize::from(inner.height);
        let max_offset = self.lines.len().saturating_sub(visible_height);
        let offset = self.scroll_offset.min(max_offset);

        let window: Vec<Line> = self.lines[offset..]
            .iter()
            .take(visible_height)
            .cloned()
            .collect();
        frame.render_widget(Paragraph::new(window).block(content_padding), chunks[1]);

        let help = Paragraph::new(Line::from(Span::styled(
            " ↑↓ scroll  esc back",
            muted,
        )));
        frame.render_widget(help, chunks[2]);
    }
}

/// Formats the route into displayable lines: each waypoint with its
/// coordinates, the leg distance between consecutive waypoints, and a
/// straight-line total.
fn route_lines(waypoints: &[Waypoint]) -> Vec<Line<'static>> {
    let muted = Style::default().fg(Color::DarkGray);
    let normal = Style::default().fg(Color::Gray);
    let highlight = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);

    let mut lines = Vec::new();
    for (i, waypoint) in waypoints.iter().enumerate() {
        if i > 0 {
            let leg = waypoints[i - 1]
                .place
                .coordinates
                .distance_km(&waypoint.place.coordinates);
            lines.push(Line::from(Span::styled(
                format!("      ↓ {leg:.1} km"),
                muted,
            )));
        }
        lines.push(Line::from(vec![
            Span::styled(format!("{:<12}", waypoint.label), highlight),
            Span::styled(waypoint.place.address.clone(), normal),
        ]));
        lines.push(Line::from(Span::styled(
            format!(
                "            ({:.4}, {:.4})",
                waypoint.place.coordinates.latitude, waypoint.place.coordinates.longitude
            ),
            muted,
        )));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        format!("Straight-line total: {:.1} km", total_km(waypoints)),
        normal,
    )));
    lines
}

fn total_km(waypoints: &[Waypoint]) -> f64 {
    waypoints
        .windows(2)
        .map(|pair| pair[0].place.coordinates.distance_km(&pair[1].place.coordinates))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinates, Place};

    fn waypoint(label: &'static str, latitude: f64, longitude: f64) -> Waypoint {
        Waypoint {
            label,
            place: Place {
                address: format!("{label} address"),
                coordinates: Coordinates {
                    latitude,
                    longitude,
                },
            },
        }
    }

    #[test]
    fn total_is_the_sum_of_legs() {
        let route = [
            waypoint("Start", 48.8566, 2.3522),
            waypoint("First stop", 50.8503, 4.3517),
            waypoint("Second stop", 52.52, 13.405),
        ];

        let legs: Vec<f64> = route
            .windows(2)
            .map(|pair| {
                pair[0]
                    .place
                    .coordinates
                    .distance_km(&pair[1].place.coordinates)
            })
            .collect();

        assert_eq!(legs.len(), 2);
        assert!((total_km(&route) - legs.iter().sum::<f64>()).abs() < 1e-9);
        // Paris to Brussels to Berlin is roughly 915 km as the crow flies.
        assert!((850.0..=980.0).contains(&total_km(&route)));
    }

    #[test]
    fn single_waypoint_route_has_zero_total() {
        let route = [waypoint("Start", 48.8566, 2.3522)];
        assert!(total_km(&route).abs() < f64::EPSILON);
    }

    #[test]
    fn lines_include_legs_between_waypoints() {
        let route = [
            waypoint("Start", 48.8566, 2.3522),
            waypoint("First stop", 50.8503, 4.3517),
        ];

        // Two lines per waypoint, one leg line, a blank, and the total.
        assert_eq!(route_lines(&route).len(), 7);
    }

    #[test]
    fn scroll_up_saturates_at_zero() {
        let mut screen = DirectionsScreen::new(&[waypoint("Start", 1.0, 2.0)]);
        screen.on_scroll_up();
        assert_eq!(screen.scroll_offset, 0);
        screen.on_scroll_down();
        screen.on_scroll_up();
        assert_eq!(screen.scroll_offset, 0);
    }
}

use chrono::{DateTime, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use glam::{DQuat, DVec3};
use std::f64::consts::TAU;
use std::io;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{error, info, warn};

use crate::airports::{is_airport_code, AirportTable};
use crate::clock::SimClock;
use crate::config::Config;
use crate::error::{DatasetError, RouteError};
use crate::great_circle::FlightPath;
use crate::location::DeviceLocation;
use crate::solar::{subsolar_point, SubsolarPoint};
use crate::terminator::TerminatorPlane;

pub const GLOBE_RADIUS: f64 = 1.0;

// Radians per tick while auto-spinning, and per arrow key press.
const SPIN_STEP: f64 = 0.01;
const NUDGE_STEP: f64 = 0.15;

pub type DatasetResult = Result<AirportTable, DatasetError>;

pub enum Dataset {
    Loading(oneshot::Receiver<DatasetResult>),
    Ready(AirportTable),
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Departure,
    Arrival,
}

#[derive(Debug, Default)]
pub struct RouteForm {
    pub active: bool,
    pub departure: String,
    pub arrival: String,
    pub focus: Field,
}

impl RouteForm {
    fn focused(&mut self) -> &mut String {
        match self.focus {
            Field::Departure => &mut self.departure,
            Field::Arrival => &mut self.arrival,
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Field::Departure => Field::Arrival,
            Field::Arrival => Field::Departure,
        };
    }

    fn push(&mut self, c: char) {
        if !c.is_ascii_alphabetic() {
            return;
        }
        let field = self.focused();
        if field.len() < 3 {
            field.push(c.to_ascii_uppercase());
        }
        if self.focus == Field::Departure && self.departure.len() == 3 {
            self.focus = Field::Arrival;
        }
    }

    fn backspace(&mut self) {
        if self.focus == Field::Arrival && self.arrival.is_empty() {
            self.focus = Field::Departure;
        }
        self.focused().pop();
    }
}

/// A globe pixel in view space, cached until the terminal is resized.
pub struct CachedPoint {
    pub screen_x: u16,
    pub screen_y: u16,
    pub view: DVec3,
}

/// Everything the frame loop and the renderer share. Owned by `main`.
pub struct App {
    pub should_quit: bool,
    pub rotation_y: f64,
    pub auto_spin: bool,
    pub last_width: u16,
    pub last_height: u16,
    pub projection_cache: Vec<CachedPoint>,
    pub tick_count: u64,

    pub clock: SimClock,
    pub sim_time: DateTime<Utc>,
    pub sun: SubsolarPoint,
    pub terminator: TerminatorPlane,

    pub dataset: Dataset,
    pub flight_path: Option<FlightPath>,
    pub form: RouteForm,
    pub status: Option<String>,
    pub pending_route: Option<(String, String)>,

    pub home: DeviceLocation,
    path_samples: usize,
    path_radius: f64,
}

impl App {
    pub fn new(config: &Config, clock: SimClock, home: DeviceLocation, dataset: Dataset) -> Self {
        let now = clock.now();
        let sun = subsolar_point(now);
        let rotation_y = yaw_facing(home.position.to_cartesian(GLOBE_RADIUS));
        Self {
            should_quit: false,
            rotation_y,
            auto_spin: true,
            last_width: 0,
            last_height: 0,
            projection_cache: Vec::new(),
            tick_count: 0,
            clock,
            sim_time: now,
            sun,
            terminator: TerminatorPlane::from_subsolar(sun),
            dataset,
            flight_path: None,
            form: RouteForm::default(),
            status: None,
            pending_route: None,
            home,
            path_samples: config.path_samples,
            path_radius: GLOBE_RADIUS * (1.0 + config.path_altitude),
        }
    }

    pub fn tick(&mut self, now: DateTime<Utc>) {
        if self.auto_spin {
            self.rotation_y = (self.rotation_y + SPIN_STEP).rem_euclid(TAU);
        }
        self.tick_count = self.tick_count.wrapping_add(1);
        self.update_sun(now);
    }

    pub fn update_sun(&mut self, now: DateTime<Utc>) {
        self.sim_time = now;
        self.sun = subsolar_point(now);
        self.terminator = TerminatorPlane::from_subsolar(self.sun);
    }

    pub fn view_rotation(&self) -> DQuat {
        DQuat::from_rotation_y(self.rotation_y)
    }

    pub fn face(&mut self, world: DVec3) {
        self.rotation_y = yaw_facing(world);
    }

    /// Check the one-shot dataset fetch without blocking. Returns true when
    /// the state changed.
    pub fn poll_dataset(&mut self) -> bool {
        let polled = match &mut self.dataset {
            Dataset::Loading(receiver) => receiver.try_recv(),
            _ => return false,
        };

        self.dataset = match polled {
            Ok(Ok(table)) => {
                info!(airports = table.len(), "airport dataset ready");
                Dataset::Ready(table)
            }
            Ok(Err(e)) => {
                error!(error = %e, "airport dataset failed, routes disabled");
                Dataset::Unavailable
            }
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Closed) => {
                error!("airport dataset task ended without a result, routes disabled");
                Dataset::Unavailable
            }
        };

        if matches!(self.dataset, Dataset::Ready(_)) {
            if let Some((departure, arrival)) = self.pending_route.take() {
                self.submit_route(&departure, &arrival);
            }
        } else {
            self.status = Some(RouteError::DatasetUnavailable.to_string());
        }
        true
    }

    /// Look up both airports and replace the displayed path.
    pub fn request_route(&mut self, departure: &str, arrival: &str) -> Result<(), RouteError> {
        for code in [departure, arrival] {
            if !is_airport_code(code.trim()) {
                return Err(RouteError::InvalidCode(code.to_string()));
            }
        }

        let table = match &self.dataset {
            Dataset::Ready(table) => table,
            Dataset::Loading(_) => return Err(RouteError::DatasetLoading),
            Dataset::Unavailable => return Err(RouteError::DatasetUnavailable),
        };

        let lookup = |code: &str| {
            table
                .get(code)
                .cloned()
                .ok_or_else(|| RouteError::UnknownAirport(code.trim().to_ascii_uppercase()))
        };
        let from = lookup(departure)?;
        let to = lookup(arrival)?;

        let path = FlightPath::new(from, to, self.path_samples, self.path_radius);
        if let Some(mid) = path.points.get(path.points.len() / 2) {
            self.rotation_y = yaw_facing(*mid);
        }
        info!(
            departure = %path.departure.code,
            arrival = %path.arrival.code,
            km = path.distance_km().round(),
            "route drawn"
        );
        self.status = Some(format!(
            "{} → {}: {:.0} km",
            path.departure.code,
            path.arrival.code,
            path.distance_km()
        ));
        self.flight_path = Some(path);
        Ok(())
    }

    /// Like [`request_route`](Self::request_route) but reports failures in
    /// the status line instead of returning them.
    pub fn submit_route(&mut self, departure: &str, arrival: &str) {
        if let Err(e) = self.request_route(departure, arrival) {
            warn!(departure, arrival, error = %e, "route not drawn");
            self.status = Some(e.to_string());
        }
    }

    pub fn handle_events(&mut self) -> io::Result<()> {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                self.handle_key(key);
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.form.active {
            match key.code {
                KeyCode::Enter => self.submit_form(),
                KeyCode::Esc => {
                    self.form.active = false;
                }
                KeyCode::Tab | KeyCode::BackTab => self.form.toggle_focus(),
                KeyCode::Backspace => self.form.backspace(),
                KeyCode::Char(c) => self.form.push(c),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('f') | KeyCode::Enter => {
                self.form = RouteForm {
                    active: true,
                    ..RouteForm::default()
                };
            }
            KeyCode::Left => self.rotation_y = (self.rotation_y - NUDGE_STEP).rem_euclid(TAU),
            KeyCode::Right => self.rotation_y = (self.rotation_y + NUDGE_STEP).rem_euclid(TAU),
            KeyCode::Char(' ') => self.auto_spin = !self.auto_spin,
            KeyCode::Char('+') | KeyCode::Char('=') => self.clock.faster(),
            KeyCode::Char('-') => self.clock.slower(),
            KeyCode::Char('r') => self.clock.set_scale(1.0),
            KeyCode::Char('h') => {
                self.auto_spin = false;
                self.face(self.home.position.to_cartesian(GLOBE_RADIUS));
            }
            KeyCode::Char('c') => {
                if self.flight_path.take().is_some() {
                    self.status = Some("Route cleared".to_string());
                }
            }
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        if self.form.departure.len() != 3 || self.form.arrival.len() != 3 {
            self.status = Some("Enter two 3-letter airport codes".to_string());
            return;
        }
        self.form.active = false;
        let departure = self.form.departure.clone();
        let arrival = self.form.arrival.clone();
        self.submit_route(&departure, &arrival);
    }

    pub fn dataset_status(&self) -> String {
        match &self.dataset {
            Dataset::Loading(_) => "loading…".to_string(),
            Dataset::Ready(table) => format!("{} airports", table.len()),
            Dataset::Unavailable => "unavailable".to_string(),
        }
    }
}

/// Yaw that turns `p` to face the viewer (+Z in view space).
pub fn yaw_facing(p: DVec3) -> f64 {
    (-p.x).atan2(p.z).rem_euclid(TAU)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{GeoPoint, GREENWICH};
    use chrono::TimeZone;
    use crossterm::event::KeyModifiers;

    const AIRPORTS: &str = "\
3797,\"John F Kennedy International Airport\",\"New York\",\"United States\",\"JFK\",\"KJFK\",40.63980103,-73.77890015,13,-5,\"A\",\"America/New_York\",\"airport\",\"OurAirports\"
2279,\"Narita International Airport\",\"Tokyo\",\"Japan\",\"NRT\",\"RJAA\",35.7647018433,140.386001587,141,9,\"U\",\"Asia/Tokyo\",\"airport\",\"OurAirports\"
507,\"London Heathrow Airport\",\"London\",\"United Kingdom\",\"LHR\",\"EGLL\",51.4706,-0.461941,83,0,\"E\",\"Europe/London\",\"airport\",\"OurAirports\"
";

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 21, 12, 0, 0).unwrap()
    }

    fn app_with(dataset: Dataset) -> App {
        let home = DeviceLocation {
            position: GREENWICH,
            label: "Default".to_string(),
            resolved: false,
        };
        App::new(&Config::default(), SimClock::new(start(), 1.0), home, dataset)
    }

    fn ready_app() -> App {
        app_with(Dataset::Ready(AirportTable::parse(AIRPORTS)))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn starts_facing_home() {
        let app = ready_app();
        let view = app.view_rotation() * GREENWICH.to_cartesian(GLOBE_RADIUS);
        assert!(view.x.abs() < 1e-9);
        assert!(view.z > 0.0);
    }

    #[test]
    fn tick_spins_and_tracks_the_sun() {
        let mut app = ready_app();
        let before = app.rotation_y;
        let later = start() + chrono::TimeDelta::hours(6);
        app.tick(later);

        assert!((app.rotation_y - (before + SPIN_STEP).rem_euclid(TAU)).abs() < 1e-12);
        assert_eq!(app.sim_time, later);
        assert_eq!(app.sun, subsolar_point(later));
        assert_eq!(app.terminator, TerminatorPlane::from_subsolar(app.sun));

        app.auto_spin = false;
        let held = app.rotation_y;
        app.tick(later);
        assert_eq!(app.rotation_y, held);
    }

    #[test]
    fn route_request_builds_a_path() {
        let mut app = ready_app();
        app.request_route("jfk", "NRT").unwrap();

        let path = app.flight_path.as_ref().unwrap();
        assert_eq!(path.departure.code, "JFK");
        assert_eq!(path.arrival.code, "NRT");
        assert_eq!(path.points.len(), 101);
        let radius = GLOBE_RADIUS * 1.03;
        assert!(path.points.iter().all(|p| (p.length() - radius).abs() < 1e-9));
        assert!(app.status.as_deref().unwrap().starts_with("JFK → NRT"));
    }

    #[test]
    fn new_route_replaces_the_old_one() {
        let mut app = ready_app();
        app.request_route("JFK", "NRT").unwrap();
        app.request_route("LHR", "JFK").unwrap();
        let path = app.flight_path.as_ref().unwrap();
        assert_eq!(path.departure.code, "LHR");
        assert_eq!(path.arrival.code, "JFK");
    }

    #[test]
    fn unknown_airport_keeps_the_current_path() {
        let mut app = ready_app();
        app.request_route("JFK", "NRT").unwrap();

        assert_eq!(
            app.request_route("JFK", "ZZZ"),
            Err(RouteError::UnknownAirport("ZZZ".to_string()))
        );
        assert_eq!(app.flight_path.as_ref().unwrap().arrival.code, "NRT");

        app.submit_route("QQQ", "NRT");
        assert_eq!(app.status.as_deref(), Some("unknown airport QQQ"));
    }

    #[test]
    fn codes_must_be_three_letters() {
        let mut app = ready_app();
        assert_eq!(
            app.request_route("JF", "NRT"),
            Err(RouteError::InvalidCode("JF".to_string()))
        );
        assert_eq!(
            app.request_route("JFK", "N1T"),
            Err(RouteError::InvalidCode("N1T".to_string()))
        );
        assert!(app.flight_path.is_none());
    }

    #[test]
    fn routes_wait_for_the_dataset() {
        let (sender, receiver) = oneshot::channel();
        let mut app = app_with(Dataset::Loading(receiver));
        assert_eq!(app.request_route("JFK", "NRT"), Err(RouteError::DatasetLoading));

        app.pending_route = Some(("JFK".to_string(), "LHR".to_string()));
        assert!(!app.poll_dataset());

        sender.send(Ok(AirportTable::parse(AIRPORTS))).unwrap();
        assert!(app.poll_dataset());
        assert!(matches!(app.dataset, Dataset::Ready(_)));
        assert_eq!(app.flight_path.as_ref().unwrap().arrival.code, "LHR");
        assert!(app.pending_route.is_none());
        assert!(!app.poll_dataset());
    }

    #[test]
    fn failed_fetch_disables_routes() {
        let (sender, receiver) = oneshot::channel();
        let mut app = app_with(Dataset::Loading(receiver));
        sender.send(Err(DatasetError::Empty)).unwrap();

        assert!(app.poll_dataset());
        assert!(matches!(app.dataset, Dataset::Unavailable));
        assert_eq!(app.dataset_status(), "unavailable");
        assert_eq!(
            app.request_route("JFK", "NRT"),
            Err(RouteError::DatasetUnavailable)
        );
    }

    #[test]
    fn dropped_fetch_task_counts_as_failure() {
        let (sender, receiver) = oneshot::channel::<DatasetResult>();
        let mut app = app_with(Dataset::Loading(receiver));
        drop(sender);
        assert!(app.poll_dataset());
        assert!(matches!(app.dataset, Dataset::Unavailable));
    }

    #[test]
    fn route_form_flow() {
        let mut app = ready_app();
        press(&mut app, KeyCode::Char('f'));
        assert!(app.form.active);

        type_str(&mut app, "jf1kl");
        assert_eq!(app.form.departure, "JFK");
        assert_eq!(app.form.focus, Field::Arrival);
        assert_eq!(app.form.arrival, "L");

        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.form.focus, Field::Departure);
        assert_eq!(app.form.departure, "JF");

        type_str(&mut app, "k");
        type_str(&mut app, "nrtx");
        assert_eq!(app.form.arrival, "NRT");

        press(&mut app, KeyCode::Enter);
        assert!(!app.form.active);
        assert_eq!(app.flight_path.as_ref().unwrap().arrival.code, "NRT");
    }

    #[test]
    fn incomplete_form_stays_open() {
        let mut app = ready_app();
        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "LH");
        press(&mut app, KeyCode::Enter);
        assert!(app.form.active);
        assert!(app.flight_path.is_none());

        press(&mut app, KeyCode::Esc);
        assert!(!app.form.active);
        assert!(!app.should_quit);
    }

    #[test]
    fn view_keys() {
        let mut app = ready_app();
        press(&mut app, KeyCode::Char(' '));
        assert!(!app.auto_spin);

        press(&mut app, KeyCode::Char('+'));
        assert_eq!(app.clock.scale(), 60.0);
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.clock.scale(), 1.0);

        app.request_route("JFK", "NRT").unwrap();
        press(&mut app, KeyCode::Char('c'));
        assert!(app.flight_path.is_none());

        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Char('h'));
        assert!((app.rotation_y - yaw_facing(GREENWICH.to_cartesian(1.0))).abs() < 1e-12);

        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn yaw_facing_brings_points_to_the_front() {
        for (lat, lon) in [(0.0, 0.0), (35.0, 140.0), (-40.0, -70.0), (10.0, 179.0)] {
            let p = GeoPoint::new(lat, lon).unwrap().to_cartesian(1.0);
            let view = DQuat::from_rotation_y(yaw_facing(p)) * p;
            assert!(view.x.abs() < 1e-9, "{lat},{lon}");
            assert!(view.z > 0.0);
        }
    }
}

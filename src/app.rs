use crate::config::Config;
use crate::error::FetchError;
use crate::gesture::{self, PointerEvent, SwipeTracker};
use crate::icons::{self, IconStore};
use crate::location::{self, Coordinates, Geolocator, Location};
use crate::tabs::Tab;
use crate::view;
use crate::weather::{CurrentSlot, WeatherClient, WeatherSnapshot};
use iced::{event, Application, Command, Element, Event, Subscription, Theme};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Message {
    LocationResolved(Option<Coordinates>),
    PostalCodeChanged(String),
    PostalCodeSubmitted,
    CurrentFetched(u64, Result<CurrentSlot, FetchError>),
    ForecastFetched(u64, Result<Vec<WeatherSnapshot>, FetchError>),
    IconFetched(String, Result<Vec<u8>, FetchError>),
    TabSelected(Tab),
    Pointer(PointerEvent),
}

/// The request pair issued by the most recent fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchCycle {
    pub generation: u64,
    pub postal_code: String,
    pub coordinates: Coordinates,
}

#[derive(Serialize)]
struct DebugDump<'a> {
    location: &'a Location,
    cycle: Option<&'a FetchCycle>,
    current: &'a CurrentSlot,
    forecast: &'a [WeatherSnapshot],
}

pub struct WeatherApp {
    pub location: Location,
    pub current: CurrentSlot,
    pub forecast: Vec<WeatherSnapshot>,
    pub selected_tab: Tab,
    /// Generation of the latest fetch cycle; responses from older cycles
    /// are discarded.
    pub generation: u64,
    pub last_cycle: Option<FetchCycle>,
    pub icons: IconStore,
    pub show_debug_json: bool,
    swipe: SwipeTracker,
    icon_base_url: String,
    client: WeatherClient,
    http: reqwest::Client,
    geolocator: Arc<dyn Geolocator>,
}

impl WeatherApp {
    pub fn with_config(config: &Config) -> Self {
        Self {
            location: Location::new(&config.default_postal_code),
            current: CurrentSlot::default(),
            forecast: Vec::new(),
            selected_tab: Tab::default(),
            generation: 0,
            last_cycle: None,
            icons: IconStore::default(),
            show_debug_json: config.show_debug_json,
            swipe: SwipeTracker::new(config.swipe_threshold),
            icon_base_url: config.icon_base_url.clone(),
            client: WeatherClient::from_config(config),
            http: reqwest::Client::new(),
            geolocator: location::geolocator_from_config(&config.location),
        }
    }

    pub fn icon_url(&self, icon: &str) -> String {
        icons::icon_url(&self.icon_base_url, icon)
    }

    pub fn debug_json(&self) -> String {
        let dump = DebugDump {
            location: &self.location,
            cycle: self.last_cycle.as_ref(),
            current: &self.current,
            forecast: &self.forecast,
        };
        serde_json::to_string_pretty(&dump).unwrap_or_else(|e| format!("<unserializable: {}>", e))
    }

    /// Start a new cycle: both requests run independently and report back
    /// tagged with the new generation.
    fn start_fetch_cycle(&mut self) -> Command<Message> {
        self.generation += 1;
        let generation = self.generation;
        let postal_code = self.location.postal_code.clone();
        let coordinates = self.location.coordinates();

        tracing::debug!(
            "Starting fetch cycle {} for zip {:?} at {:.4}, {:.4}",
            generation,
            postal_code,
            coordinates.latitude,
            coordinates.longitude
        );

        self.last_cycle = Some(FetchCycle {
            generation,
            postal_code: postal_code.clone(),
            coordinates,
        });

        let client = self.client.clone();
        let current = Command::perform(
            async move { client.fetch_current(&postal_code).await },
            move |result| Message::CurrentFetched(generation, result),
        );

        let client = self.client.clone();
        let forecast = Command::perform(
            async move {
                client
                    .fetch_forecast(coordinates.latitude, coordinates.longitude)
                    .await
            },
            move |result| Message::ForecastFetched(generation, result),
        );

        Command::batch(vec![current, forecast])
    }

    fn fetch_icons(&self, codes: Vec<String>) -> Command<Message> {
        Command::batch(codes.into_iter().map(|code| {
            let url = self.icon_url(&code);
            Command::perform(icons::fetch_icon(self.http.clone(), url), move |result| {
                Message::IconFetched(code, result)
            })
        }))
    }

    fn is_stale(&self, generation: u64, what: &str) -> bool {
        let stale = generation != self.generation;
        if stale {
            tracing::debug!(
                "Discarding {} from cycle {} (latest is {})",
                what,
                generation,
                self.generation
            );
        }
        stale
    }
}

fn gesture_message(event: Event, status: event::Status) -> Option<Message> {
    gesture::pointer_event(event, status).map(Message::Pointer)
}

impl Application for WeatherApp {
    type Message = Message;
    type Theme = Theme;
    type Executor = iced::executor::Default;
    type Flags = Config;

    fn new(config: Config) -> (WeatherApp, Command<Message>) {
        let app = WeatherApp::with_config(&config);
        let command = Command::perform(
            location::resolve_coordinates(app.geolocator.clone()),
            Message::LocationResolved,
        );
        (app, command)
    }

    fn title(&self) -> String {
        String::from("Weatherlify")
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::LocationResolved(coordinates) => {
                if let Some(coordinates) = coordinates {
                    self.location.set_coordinates(coordinates);
                }
                self.start_fetch_cycle()
            }
            Message::PostalCodeChanged(value) => {
                self.location.set_postal_code(value);
                self.start_fetch_cycle()
            }
            Message::PostalCodeSubmitted => {
                tracing::info!("Applying zip code {:?}", self.location.postal_code);
                self.start_fetch_cycle()
            }
            Message::CurrentFetched(generation, result) => {
                if self.is_stale(generation, "current weather") {
                    return Command::none();
                }
                match result {
                    Ok(slot) => {
                        self.current = slot;
                        let missing = self.icons.claim_missing(self.current.snapshot());
                        self.fetch_icons(missing)
                    }
                    Err(e) => {
                        tracing::warn!("Current weather fetch failed: {}", e);
                        Command::none()
                    }
                }
            }
            Message::ForecastFetched(generation, result) => {
                if self.is_stale(generation, "forecast") {
                    return Command::none();
                }
                match result {
                    Ok(days) => {
                        self.forecast = days;
                        let missing = self.icons.claim_missing(&self.forecast);
                        self.fetch_icons(missing)
                    }
                    Err(e) => {
                        tracing::warn!("Forecast fetch failed: {}", e);
                        Command::none()
                    }
                }
            }
            Message::IconFetched(code, result) => {
                match result {
                    Ok(bytes) => self.icons.insert(code, bytes),
                    Err(e) => tracing::debug!("Icon {} unavailable: {}", code, e),
                }
                Command::none()
            }
            Message::TabSelected(tab) => {
                self.selected_tab = tab;
                Command::none()
            }
            Message::Pointer(event) => {
                if let Some(swipe) = self.swipe.handle(event) {
                    self.selected_tab = swipe.apply(self.selected_tab);
                }
                Command::none()
            }
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(gesture_message)
    }

    fn theme(&self) -> Theme {
        Theme::Light
    }

    fn view(&self) -> Element<Message> {
        view::view(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocationMode;
    use crate::tabs::panel_cards;
    use crate::weather::{fixtures, parse_current, parse_forecast};
    use iced::Point;

    const HOME: Coordinates = Coordinates {
        latitude: 38.84,
        longitude: -77.43,
    };

    fn app() -> WeatherApp {
        let mut config = Config::default();
        config.location.mode = LocationMode::Disabled;
        WeatherApp::with_config(&config)
    }

    fn ready() -> CurrentSlot {
        parse_current(&fixtures::current_ok().to_string()).unwrap()
    }

    fn forecast(days: usize) -> Vec<WeatherSnapshot> {
        parse_forecast(&fixtures::forecast(days).to_string()).unwrap()
    }

    #[test]
    fn location_resolution_starts_first_cycle() {
        let mut app = app();
        assert_eq!(app.generation, 0);
        assert!(app.last_cycle.is_none());

        let _ = app.update(Message::LocationResolved(Some(HOME)));

        assert_eq!(
            app.last_cycle,
            Some(FetchCycle {
                generation: 1,
                postal_code: "22093".into(),
                coordinates: HOME,
            })
        );
    }

    #[test]
    fn failed_location_keeps_default_coordinates() {
        let mut app = app();
        let _ = app.update(Message::LocationResolved(None));

        let cycle = app.last_cycle.unwrap();
        assert_eq!(cycle.coordinates.latitude, 0.0);
        assert_eq!(cycle.coordinates.longitude, 0.0);
    }

    #[test]
    fn postal_change_refetches_with_last_coordinates() {
        let mut app = app();
        let _ = app.update(Message::LocationResolved(Some(HOME)));
        let _ = app.update(Message::PostalCodeChanged("10001".into()));

        let cycle = app.last_cycle.clone().unwrap();
        assert_eq!(cycle.generation, 2);
        assert_eq!(cycle.postal_code, "10001");
        assert_eq!(cycle.coordinates, HOME);
        assert!(app
            .client
            .current_query(&cycle.postal_code)
            .contains(&("zip", "10001".to_string())));
    }

    #[test]
    fn submit_starts_cycle() {
        let mut app = app();
        let _ = app.update(Message::PostalCodeSubmitted);
        assert_eq!(app.generation, 1);
    }

    #[test]
    fn tab_changes_do_not_fetch() {
        let mut app = app();
        let _ = app.update(Message::LocationResolved(Some(HOME)));

        let _ = app.update(Message::TabSelected(Tab::Week));
        assert_eq!(app.selected_tab, Tab::Week);

        let _ = app.update(Message::Pointer(PointerEvent::ArrowLeft));
        assert_eq!(app.selected_tab, Tab::NextTwoDays);

        for event in [
            PointerEvent::Moved(Point::new(100.0, 200.0)),
            PointerEvent::Pressed,
            PointerEvent::Moved(Point::new(300.0, 205.0)),
            PointerEvent::Released,
        ] {
            let _ = app.update(Message::Pointer(event));
        }
        assert_eq!(app.selected_tab, Tab::Current);

        assert_eq!(app.generation, 1);
    }

    #[test]
    fn keys_and_drags_inside_the_postal_input_keep_the_tab() {
        use iced::{keyboard, mouse};

        let mut app = app();
        let _ = app.update(Message::LocationResolved(Some(HOME)));
        let _ = app.update(Message::TabSelected(Tab::NextTwoDays));
        let _ = app.update(Message::PostalCodeChanged("2209".into()));

        let captured = event::Status::Captured;
        let arrow = |named| {
            Event::Keyboard(keyboard::Event::KeyPressed {
                key: keyboard::Key::Named(named),
                location: keyboard::Location::Standard,
                modifiers: keyboard::Modifiers::default(),
                text: None,
            })
        };

        // Caret movement in the focused field.
        for named in [keyboard::key::Named::ArrowLeft, keyboard::key::Named::ArrowRight] {
            assert!(gesture_message(arrow(named), captured).is_none());
        }

        // Text selection drag that starts on the input.
        let moved = |x| {
            Event::Mouse(mouse::Event::CursorMoved {
                position: Point::new(x, 120.0),
            })
        };
        let drag = [
            (moved(400.0), event::Status::Ignored),
            (Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)), captured),
            (moved(250.0), event::Status::Ignored),
            (Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)), captured),
        ];
        for (event, status) in drag {
            if let Some(message) = gesture_message(event, status) {
                let _ = app.update(message);
            }
        }

        assert_eq!(app.selected_tab, Tab::NextTwoDays);
    }

    #[test]
    fn stale_responses_are_discarded() {
        let mut app = app();
        let _ = app.update(Message::LocationResolved(Some(HOME)));
        let _ = app.update(Message::PostalCodeChanged("10001".into()));

        let _ = app.update(Message::CurrentFetched(1, Ok(ready())));
        let _ = app.update(Message::ForecastFetched(1, Ok(forecast(7))));
        assert_eq!(app.current, CurrentSlot::Pending);
        assert!(app.forecast.is_empty());

        let _ = app.update(Message::CurrentFetched(2, Ok(ready())));
        let _ = app.update(Message::ForecastFetched(2, Ok(forecast(3))));
        assert!(app.current.snapshot().is_some());
        assert_eq!(app.forecast.len(), 3);
    }

    #[test]
    fn unavailable_current_renders_no_card() {
        let mut app = app();
        let _ = app.update(Message::PostalCodeSubmitted);
        let _ = app.update(Message::CurrentFetched(1, Ok(ready())));
        let _ = app.update(Message::PostalCodeSubmitted);
        let _ = app.update(Message::CurrentFetched(
            2,
            Ok(CurrentSlot::Unavailable { code: Some(404) }),
        ));

        assert!(panel_cards(Tab::Current, &app.current, &app.forecast).is_empty());
    }

    #[test]
    fn fetch_errors_keep_previous_state() {
        let mut app = app();
        let _ = app.update(Message::PostalCodeSubmitted);
        let _ = app.update(Message::CurrentFetched(1, Ok(ready())));
        let _ = app.update(Message::ForecastFetched(1, Ok(forecast(7))));

        let _ = app.update(Message::PostalCodeSubmitted);
        let _ = app.update(Message::CurrentFetched(
            2,
            Err(FetchError::Network("connection refused".into())),
        ));
        let _ = app.update(Message::ForecastFetched(
            2,
            Err(FetchError::Decode("expected value".into())),
        ));

        assert_eq!(app.current, ready());
        assert_eq!(app.forecast.len(), 7);
    }

    #[test]
    fn forecast_is_replaced_not_merged() {
        let mut app = app();
        let _ = app.update(Message::PostalCodeSubmitted);
        let _ = app.update(Message::ForecastFetched(1, Ok(forecast(7))));
        let _ = app.update(Message::PostalCodeSubmitted);
        let _ = app.update(Message::ForecastFetched(2, Ok(forecast(2))));

        assert_eq!(app.forecast.len(), 2);
    }

    #[test]
    fn icons_are_requested_once_per_code() {
        let mut app = app();
        let _ = app.update(Message::PostalCodeSubmitted);
        let _ = app.update(Message::CurrentFetched(1, Ok(ready())));
        assert!(app.icons.claim_missing(app.current.snapshot()).is_empty());

        let _ = app.update(Message::IconFetched("01d".into(), Ok(vec![1, 2, 3])));
        assert!(app.icons.get("01d").is_some());
        assert_eq!(
            app.icon_url("01d"),
            "http://openweathermap.org/img/wn/01d@2x.png"
        );
    }

    #[test]
    fn debug_json_includes_fetched_state() {
        let mut app = app();
        let _ = app.update(Message::PostalCodeSubmitted);
        let _ = app.update(Message::CurrentFetched(1, Ok(ready())));

        let dump: serde_json::Value = serde_json::from_str(&app.debug_json()).unwrap();
        assert_eq!(dump["location"]["postal_code"], "22093");
        assert_eq!(dump["cycle"]["generation"], 1);
        assert_eq!(dump["current"]["state"], "ready");
        assert_eq!(dump["current"]["description"], "clear sky");
    }
}
